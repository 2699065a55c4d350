/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use pgsdecode::format_timestamp;
use std::io::{Result as IoResult, Write};

/// One numbered subtitle of a SubRip file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SrtEntry {
    pub index: usize,
    /// Start in milliseconds.
    pub start: u32,
    /// End in milliseconds.
    pub end: u32,
    pub text: String,
}

pub fn write_srt<W: Write>(output: &mut W, entries: &[SrtEntry]) -> IoResult<()> {

    for entry in entries.iter() {
        writeln!(output, "{}", entry.index)?;
        writeln!(
            output,
            "{} --> {}",
            format_timestamp(entry.start),
            format_timestamp(entry.end),
        )?;
        writeln!(output, "{}", entry.text)?;
        writeln!(output)?;
    }

    Ok(())
}
