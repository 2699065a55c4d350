/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! The run-length encoding used by object data.
//!
//! Each line of pixel IDs is encoded as a series of codes:
//!
//! | Bytes                     | Meaning                                  |
//! |---------------------------|------------------------------------------|
//! | `CC`                      | one pixel of color `CC` (non-zero)       |
//! | `00 00`                   | end of line                              |
//! | `00 0L`                   | `L` (1-63) pixels of color 0             |
//! | `00 4L LL`                | `L` (64-16383) pixels of color 0         |
//! | `00 8L CC`                | `L` (3-63) pixels of color `CC`          |
//! | `00 CL LL CC`             | `L` (64-16383) pixels of color `CC`      |


use thiserror::Error as ThisError;

/// The longest run a single code can describe.
pub const MAX_RUN_LENGTH: usize = 0x3FFF;

/// A specialized [`Result`](std::result::Result) type for run-length coding.
pub type RleResult<T> = Result<T, RleError>;

#[derive(ThisError, Clone, Debug, Eq, Hash, PartialEq)]
pub enum RleError {
    /// The data ends with pixels that were never closed by an end-of-line code.
    #[error("{pixels} pixels left over in an unterminated line")]
    UnterminatedLine {
        pixels: usize,
    },
    /// The data ends in the middle of a code.
    #[error("run-length code at offset {offset} is cut short")]
    TruncatedRun {
        offset: usize,
    },
    /// A line being encoded holds more than [`MAX_RUN_LENGTH`] pixels of one color in a row.
    #[error("object line too long")]
    LineTooLong,
    /// A decoded line runs past the declared width of its object.
    #[error("line {line} holds more than {width} pixels")]
    LineOverflow {
        line: usize,
        width: usize,
    },
    /// The data holds more lines than the declared height of its object.
    #[error("data holds more than {height} lines")]
    TooManyLines {
        height: usize,
    },
}

/// Decodes run-length encoded data into lines of pixel IDs.
///
/// Lines are not required to have equal lengths. Empty input yields no lines.
pub fn decode(data: &[u8]) -> RleResult<Vec<Vec<u8>>> {
    decode_lines(data, None)
}

/// Decodes run-length encoded data of an object declared as `width` by `height` pixels.
///
/// Lines may be shorter than `width` and there may be fewer than `height` of them, but a
/// line longer than `width` or a line past `height` fails before anything is allocated for it.
pub fn decode_bounded(data: &[u8], width: usize, height: usize) -> RleResult<Vec<Vec<u8>>> {
    decode_lines(data, Some((width, height)))
}

fn decode_lines(data: &[u8], bounds: Option<(usize, usize)>) -> RleResult<Vec<Vec<u8>>> {

    let mut lines = Vec::new();
    let mut line = Vec::new();
    let mut pos = 0;

    while pos < data.len() {

        let byte = data[pos];

        if byte != 0x00 {
            check_line(&line, 1, lines.len(), bounds)?;
            line.push(byte);
            pos += 1;
            continue
        }

        let flags = *data.get(pos + 1).ok_or(RleError::TruncatedRun { offset: pos })?;

        if flags == 0x00 {
            if let Some((_, height)) = bounds {
                if lines.len() == height {
                    return Err(RleError::TooManyLines { height })
                }
            }
            lines.push(std::mem::take(&mut line));
            pos += 2;
            continue
        }

        let extended = flags & 0x40 != 0;
        let colored = flags & 0x80 != 0;
        let needed = 2 + extended as usize + colored as usize;

        if pos + needed > data.len() {
            return Err(RleError::TruncatedRun { offset: pos })
        }

        let mut count = (flags & 0x3F) as usize;
        let mut next = pos + 2;

        if extended {
            count = (count << 8) | data[next] as usize;
            next += 1;
        }

        let color = if colored { data[next] } else { 0x00 };

        check_line(&line, count, lines.len(), bounds)?;
        line.resize(line.len() + count, color);
        pos += needed;
    }

    if !line.is_empty() {
        return Err(RleError::UnterminatedLine { pixels: line.len() })
    }

    Ok(lines)
}

fn check_line(
    line: &[u8],
    added: usize,
    index: usize,
    bounds: Option<(usize, usize)>,
) -> RleResult<()> {

    match bounds {
        Some((width, _)) if line.len() + added > width => {
            Err(RleError::LineOverflow { line: index, width })
        }
        Some((_, height)) if index >= height => {
            Err(RleError::TooManyLines { height })
        }
        _ => Ok(()),
    }
}

/// Encodes lines of pixel IDs, terminating every line with an end-of-line code.
pub fn encode(lines: &[Vec<u8>]) -> RleResult<Vec<u8>> {

    let mut output = Vec::<u8>::new();

    for line in lines {

        let mut byte = 0_u8;
        let mut count = 0_usize;

        for next_byte in line {
            if *next_byte == byte {
                count += 1;
            } else {
                output_rle_sequence(&mut output, byte, count)?;
                byte = *next_byte;
                count = 1;
            }
        }

        output_rle_sequence(&mut output, byte, count)?;
        output.push(0x00);
        output.push(0x00);
    }

    Ok(output)
}

fn output_rle_sequence(output: &mut Vec<u8>, byte: u8, count: usize) -> RleResult<()> {

    if byte == 0x00 {
        match count {
            0 => {
            }
            1 ..= 63 => {
                output.push(0x00);
                output.push(count as u8);
            }
            64 ..= MAX_RUN_LENGTH => {
                output.push(0x00);
                output.push(0x40 | (count >> 8) as u8);
                output.push((count & 0xFF) as u8);
            }
            _ => {
                return Err(RleError::LineTooLong)
            }
        }
    } else {
        match count {
            0 => {
            }
            1 => {
                output.push(byte);
            }
            2 => {
                output.push(byte);
                output.push(byte);
            }
            3 ..= 63 => {
                output.push(0x00);
                output.push(0x80 | count as u8);
                output.push(byte);
            }
            64 ..= MAX_RUN_LENGTH => {
                output.push(0x00);
                output.push(0xC0 | (count >> 8) as u8);
                output.push((count & 0xFF) as u8);
                output.push(byte);
            }
            _ => {
                return Err(RleError::LineTooLong)
            }
        }
    }

    Ok(())
}
