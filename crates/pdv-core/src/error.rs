//! Unified error type for the pdv crates
//!
//! [`PdvError`] separates the failures the comparison pipeline cares about:
//! configuration mistakes and schema mismatches abort a run before any output
//! is written, while render failures are isolated to a single artifact by the
//! driver.
//!
//! # Example
//!
//! ```ignore
//! use pdv_core::{PdvError, PdvResult, StatisticsMode};
//!
//! fn parse(mode: &str) -> PdvResult<StatisticsMode> {
//!     mode.parse()
//! }
//! ```

use thiserror::Error;

/// Unified error type for all pdv operations.
#[derive(Error, Debug)]
pub enum PdvError {
    /// I/O errors (file access, directory creation)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown mode strings, colors, extensions or processor names
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset versions disagree on metric names or value kinds
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Malformed tables (length mismatches, duplicate identifiers)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A comparison frame cannot be drawn (empty frame, single version scatter matrix)
    #[error("Render error: {0}")]
    Render(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using PdvError.
pub type PdvResult<T> = Result<T, PdvError>;

impl From<anyhow::Error> for PdvError {
    fn from(err: anyhow::Error) -> Self {
        PdvError::Other(err.to_string())
    }
}

impl From<String> for PdvError {
    fn from(s: String) -> Self {
        PdvError::Other(s)
    }
}

impl From<&str> for PdvError {
    fn from(s: &str) -> Self {
        PdvError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for PdvError {
    fn from(err: serde_json::Error) -> Self {
        PdvError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_the_value() {
        let err = PdvError::Config("unknown statistics mode 'median'".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("median"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PdvError = io_err.into();
        assert!(matches!(err, PdvError::Io(_)));
    }

    #[test]
    fn question_mark_operator_propagates() {
        fn inner() -> PdvResult<()> {
            Err(PdvError::SchemaMismatch("test".into()))
        }

        fn outer() -> PdvResult<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(PdvError::SchemaMismatch(_))));
    }
}
