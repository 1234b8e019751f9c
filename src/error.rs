//! Error types for series construction, conversion and persistence.

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type covering every failure mode of the crate.
///
/// All errors are raised synchronously at the call that detects them; nothing
/// is retried internally, and no partially built object is left behind when a
/// constructor or converter fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A series was built with inconsistent pieces (mismatched array lengths,
    /// malformed GTIs, an invalid bin width, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unknown persistence format, or a table that cannot be interpreted
    /// (e.g. the reference column is missing).
    #[error("format error: {0}")]
    Format(String),

    /// Invalid method keyword passed to the rebinning routine.
    #[error("unrecognized method: {0}; use 'sum' or 'mean'")]
    UnrecognizedMethod(String),

    /// A time value that matches none of the supported representations.
    #[error("unknown time format: {0}")]
    UnrecognizedTimeFormat(String),

    /// No GTI is long enough to hold a single chunk of the requested length.
    #[error("no GTI is equal to or longer than the chunk length {0}")]
    Segmentation(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    DataFrame(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Create an unrecognized-method error.
    pub fn unrecognized_method(method: impl Into<String>) -> Self {
        Self::UnrecognizedMethod(method.into())
    }

    /// Create an unrecognized-time-format error.
    pub fn unrecognized_time_format(message: impl Into<String>) -> Self {
        Self::UnrecognizedTimeFormat(message.into())
    }

    /// Create a segmentation error for the given chunk length.
    pub fn segmentation(chunk_length: f64) -> Self {
        Self::Segmentation(chunk_length)
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("lengths of time and counts must be equal");
        assert!(err.to_string().contains("configuration error"));

        let err = Error::unrecognized_method("median");
        assert!(err.to_string().contains("median"));

        let err = Error::segmentation(512.0);
        assert!(err.to_string().contains("512"));
    }
}
