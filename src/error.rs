//! Error types for the bus-to-PWL converter.
//!
//! This module provides a unified error type [`BusError`] that covers
//! all error conditions that can occur during bus file parsing, waveform
//! synthesis, and trace verification.

use std::path::Path;

use thiserror::Error;

/// Result type alias using [`BusError`].
pub type Result<T> = std::result::Result<T, BusError>;

/// Unified error type for all bus file operations.
#[derive(Error, Debug)]
pub enum BusError {
    // ============ Literal and Declaration Errors ============
    /// Unparseable numeric, magnitude or vector token
    #[error("Invalid literal '{token}' at line {line}: {message}")]
    InvalidLiteral {
        line: usize,
        token: String,
        message: String,
    },

    /// Bad bus-slice syntax in a signal declaration
    #[error("Malformed declaration '{token}' at line {line}: {message}")]
    MalformedDeclaration {
        line: usize,
        token: String,
        message: String,
    },

    /// Structural error in the bus file grammar
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    // ============ Vector Expansion Errors ============
    /// Two range tokens on one line generate different row counts
    #[error("Inconsistent range span at line {line}: '{token}' yields {found} rows, expected {expected}")]
    InconsistentRangeSpan {
        line: usize,
        token: String,
        expected: usize,
        found: usize,
    },

    /// A row's expanded width does not match the declared column count
    #[error("Column count mismatch at line {line}: vector is {found} bits wide, {expected} signals declared")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A range value needs more bits than the range token declares
    #[error("Range '{token}' at line {line} needs more than {nbits} bits")]
    RangeOverflow {
        line: usize,
        token: String,
        nbits: u32,
    },

    /// Outputs block does not cover the same number of rows as the inputs
    #[error("Outputs block has {outputs} rows but signals block has {inputs}")]
    RowCountMismatch { inputs: usize, outputs: usize },

    // ============ Parameter Errors ============
    /// A required parameter was never set
    #[error("Required parameter '{name}' was not found in bus file")]
    MissingRequiredParameter { name: String },

    /// A parameter holds a value outside its valid domain
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// Adjacent transitions would overlap within one bit interval
    #[error("Transition overlap: '{name}' of {risefall:e}s is more than half of bittime {bittime:e}s")]
    TransitionOverlap {
        name: String,
        risefall: f64,
        bittime: f64,
    },

    // ============ Verification Errors ============
    /// Verification requested for a bus file with no outputs block
    #[error("No outputs block found in bus file")]
    MissingOutputs,

    /// Malformed simulation trace
    #[error("Trace error at line {line}: {message}")]
    TraceError { line: usize, message: String },

    /// An expected output node is absent from the trace
    #[error("Signal '{name}' not found in trace")]
    TraceSignalNotFound { name: String },

    // ============ I/O Errors ============
    /// Error reading an input file
    #[error("Failed to read '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing an output file
    #[error("Failed to write '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl BusError {
    /// Create an invalid literal error
    pub fn invalid_literal(line: usize, token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLiteral {
            line,
            token: token.into(),
            message: message.into(),
        }
    }

    /// Create a malformed declaration error
    pub fn malformed(line: usize, token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDeclaration {
            line,
            token: token.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create a trace error
    pub fn trace(line: usize, message: impl Into<String>) -> Self {
        Self::TraceError {
            line,
            message: message.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingRequiredParameter { name: name.into() }
    }

    /// Attach a source line to errors raised by line-agnostic helpers.
    ///
    /// Only errors whose line is still unset (0) are rewritten.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::InvalidLiteral {
                line: 0,
                token,
                message,
            } => Self::InvalidLiteral {
                line,
                token,
                message,
            },
            Self::MalformedDeclaration {
                line: 0,
                token,
                message,
            } => Self::MalformedDeclaration {
                line,
                token,
                message,
            },
            other => other,
        }
    }

    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        Self::FileWriteError {
            path: path.display().to_string(),
            source,
        }
    }
}
