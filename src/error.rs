//! Unified error type for the veilmap library.
//!
//! Library code uses `MapError`; configuration parsing keeps `anyhow::Result`
//! for convenience.
//!
//! # Error Categories
//!
//! - **Io**: File system operations on cache/precomputed files (fatal; a
//!   silently missing cache would produce silently wrong positions)
//! - **Format**: Invalid cache file format (magic bytes, version mismatch)
//! - **Validation**: Inconsistent mapper parameters, reported once at startup
//!
//! Per-read degeneracies (too few informative k-mers, oversized buckets) are
//! NOT errors: they degrade that read to a no-call and never abort the batch.

use std::fmt;
use std::path::PathBuf;

/// Unified error type for the veilmap library.
#[derive(Debug)]
pub enum MapError {
    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Invalid file format (magic bytes, version, structure).
    Format { path: PathBuf, detail: String },

    /// Validation error (inconsistent parameters, violated data invariants).
    Validation(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            MapError::Format { path, detail } => {
                write!(f, "Invalid format in '{}': {}", path.display(), detail)
            }
            MapError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Io {
            path: PathBuf::new(),
            operation: "unknown",
            source: err,
        }
    }
}

/// Convenience type alias for Results using MapError.
pub type Result<T> = std::result::Result<T, MapError>;

impl MapError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a format error.
    pub fn format(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        MapError::Format {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        MapError::Validation(msg.into())
    }
}
