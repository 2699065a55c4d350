/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use std::{
    io::{Error as IoError, Write},
    process::{Command, ExitStatus, Stdio},
    string::FromUtf8Error,
};
use thiserror::Error as ThisError;

pub type OcrResult<T> = Result<T, OcrError>;

#[derive(ThisError, Debug)]
pub enum OcrError {
    #[error("could not run the OCR engine")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("OCR engine exited with {status}: {message}")]
    EngineFailed {
        status: ExitStatus,
        message: String,
    },
    #[error("OCR engine produced text that is not UTF-8")]
    InvalidText {
        #[from]
        source: FromUtf8Error,
    },
}

/// Turns an image into text.
pub trait Recognizer: Send + Sync {
    /// Recognizes the text shown by a PNG image.
    fn recognize(&self, png: &[u8]) -> OcrResult<String>;
}

/// Runs the `tesseract` executable, feeding it the image on standard input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TesseractCommand {
    pub program: String,
    pub language: String,
    /// Tesseract's page segmentation mode. Mode 6 treats the image as a single block of text.
    pub page_segmentation: u8,
}

impl TesseractCommand {

    pub fn new(program: &str, language: &str) -> Self {
        Self {
            program: program.to_string(),
            language: language.to_string(),
            page_segmentation: 6,
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--psm".to_string(),
            self.page_segmentation.to_string(),
        ]
    }
}

impl Recognizer for TesseractCommand {

    fn recognize(&self, png: &[u8]) -> OcrResult<String> {

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(png)?;
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(
                OcrError::EngineFailed {
                    status: output.status,
                    message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }
            )
        }

        Ok(clean_text(&String::from_utf8(output.stdout)?))
    }
}

/// Trims every line and drops the empty ones.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
