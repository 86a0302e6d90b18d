//! Error types for rasterlab

use std::fmt;
use std::io;

/// Result type for rasterlab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in rasterlab operations
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Invalid TIFF format
    InvalidFormat(String),

    /// Invalid byte order
    InvalidByteOrder(u16),

    /// Invalid TIFF magic number
    InvalidMagic(u16),

    /// Missing required tag
    MissingTag(u16),

    /// Unsupported feature
    Unsupported(String),

    /// Invalid IFD or data offset
    InvalidOffset(u64),

    /// Out of bounds access
    OutOfBounds(String),

    /// Zero or oversized grid dimensions
    InvalidDimensions(String),

    /// Empty or inverted value range
    InvalidRange(String),

    /// Grid shape disagrees with its coordinate sequences
    ShapeMismatch {
        /// (rows, cols) implied by the coordinate sequences
        expected: (usize, usize),
        /// (rows, cols) of the grid
        found: (usize, usize),
    },

    /// Chunk shape cannot be laid over the raster
    InvalidChunkShape(String),

    /// Stored sample type differs from the requested element type
    TypeMismatch {
        /// Requested element type
        expected: String,
        /// Type found in the file
        found: String,
    },

    /// Malformed coordinate reference system identifier
    InvalidCrs(String),

    /// Configuration could not be loaded
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            Error::InvalidByteOrder(value) => write!(f, "Invalid byte order: 0x{:04X}", value),
            Error::InvalidMagic(value) => write!(f, "Invalid TIFF magic number: {}", value),
            Error::MissingTag(tag) => write!(f, "Missing required tag: {}", tag),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            Error::InvalidOffset(offset) => write!(f, "Invalid offset: {}", offset),
            Error::OutOfBounds(msg) => write!(f, "Out of bounds: {}", msg),
            Error::InvalidDimensions(msg) => write!(f, "Invalid dimensions: {}", msg),
            Error::InvalidRange(msg) => write!(f, "Invalid value range: {}", msg),
            Error::ShapeMismatch { expected, found } => write!(
                f,
                "Shape mismatch: coordinates describe {} x {} but grid is {} x {}",
                expected.0, expected.1, found.0, found.1
            ),
            Error::InvalidChunkShape(msg) => write!(f, "Invalid chunk shape: {}", msg),
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, file holds {}", expected, found)
            }
            Error::InvalidCrs(value) => write!(f, "Invalid CRS identifier: {:?}", value),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}
