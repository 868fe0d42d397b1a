// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Error types for LEF parsing

use std::fmt;
use std::io;

/// Result type for LEF parsing operations
pub type LefResult<T> = Result<T, LefError>;

/// Error types that can occur while reading a LEF file
#[derive(Debug)]
pub enum LefError {
    /// The input file could not be read
    Io { file: String, source: io::Error },
    /// Lexical or block-structure fault, reported with the offending position
    Syntax {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },
    /// A block's closing name does not match its opening name
    NameMismatch {
        file: String,
        line: u32,
        column: u32,
        kind: &'static str,
        expected: String,
        found: String,
    },
    /// Walker and grammar went out of sync; a defect, not malformed input
    Internal { message: String },
    /// An empty list of input files was supplied
    NoInput,
}

impl LefError {
    pub(crate) fn syntax(
        file: &str,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        LefError::Syntax {
            file: file.to_string(),
            line,
            column,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        LefError::Internal {
            message: message.into(),
        }
    }
}

impl fmt::Display for LefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LefError::Io { file, source } => write!(f, "failed to read {file}: {source}"),
            LefError::Syntax {
                file,
                line,
                column,
                message,
            } => write!(f, "{file}:{line}:{column}: {message}"),
            LefError::NameMismatch {
                file,
                line,
                column,
                kind,
                expected,
                found,
            } => write!(
                f,
                "{file}:{line}:{column}: mismatched END for {kind} {expected}: found {found:?}"
            ),
            LefError::Internal { message } => write!(f, "internal parser fault: {message}"),
            LefError::NoInput => write!(f, "no LEF files provided"),
        }
    }
}

impl std::error::Error for LefError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LefError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
