//! Error types for OBJ parsing and affine transforms.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Failure category shared by parser and transformer errors.
///
/// Front ends branch on this to pick a message instead of matching every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedFormat,
    IoFailure,
    MalformedVertex,
    MalformedFacet,
    BufferOverrun,
    AllocationFailure,
    InvalidScale,
}

/// Errors raised while loading an `.obj` file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The path was empty.
    #[error("no input path given")]
    EmptyPath,

    /// The file name does not carry the `.obj` extension.
    #[error("file '{path}' is not in .obj format")]
    UnsupportedFormat { path: PathBuf },

    /// The file could not be opened.
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or rewinding the input failed midway.
    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),

    /// A `v` line did not hold three fully numeric coordinates.
    #[error("line {line}: malformed vertex '{text}'")]
    MalformedVertex { line: usize, text: String },

    /// An `f` line held a token that is not a vertex index.
    #[error("line {line}: malformed facet index '{token}'")]
    MalformedFacet { line: usize, token: String },

    /// More vertex lines were found than the counting pass saw.
    #[error("line {line}: vertex {index} is out of bounds for a buffer of {capacity}")]
    BufferOverrun {
        line: usize,
        index: usize,
        capacity: usize,
    },

    /// A buffer could not be allocated or grown.
    #[error("failed to allocate {what} for {elements} elements")]
    AllocationFailure { what: &'static str, elements: usize },
}

impl ParseError {
    /// Category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPath => ErrorKind::InvalidInput,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Open { .. } | Self::Read(_) => ErrorKind::IoFailure,
            Self::MalformedVertex { .. } => ErrorKind::MalformedVertex,
            Self::MalformedFacet { .. } => ErrorKind::MalformedFacet,
            Self::BufferOverrun { .. } => ErrorKind::BufferOverrun,
            Self::AllocationFailure { .. } => ErrorKind::AllocationFailure,
        }
    }
}

/// Errors raised by the affine transform operations.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// The matrix has no column for the axis the operation touches.
    #[error("matrix with {columns} columns has no {axis} axis")]
    MissingAxis { axis: char, columns: usize },

    /// Scaling by zero collapses the model.
    #[error("scale factor cannot be zero")]
    ZeroScale,

    /// An operation string could not be understood.
    #[error("invalid transform '{0}'")]
    InvalidOp(String),
}

impl TransformError {
    /// Category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAxis { .. } | Self::InvalidOp(_) => ErrorKind::InvalidInput,
            Self::ZeroScale => ErrorKind::InvalidScale,
        }
    }
}
