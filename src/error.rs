//! Centralised error hierarchy for the **Grus interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here. This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::debug;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GrusError {
    /// Lexical (scanner) error with source position information.
    #[error("[line {line}, column {column}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,

        /// Byte column within that line.
        column: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}, column {column}] Error: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// Static-analysis or resolution failure (e.g. early-binding errors).
    #[error("[line {line}, column {column}] Error: {message}")]
    Resolve {
        message: String,
        line: usize,
        column: usize,
    },

    /// Runtime evaluation error.
    #[error("{0}")]
    Runtime(String),

    /// Wrapper around `std::io::Error` (transparent). Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl GrusError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: {}:{}, msg={}", line, column, message);

        GrusError::Lex {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: {}:{}, msg={}", line, column, message);

        GrusError::Parse {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: {}:{}, msg={}", line, column, message);

        GrusError::Resolve {
            message,
            line,
            column,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GrusError>;
