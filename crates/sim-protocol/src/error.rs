//! Error types for restricted SIM access parsing and encoding

use thiserror::Error;

/// Errors that can occur while parsing command text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Command does not start with the `+CRSM=` marker
    #[error("missing command marker: {0:?}")]
    MissingMarker(String),

    /// Wrong number of comma-separated fields after the marker
    #[error("expected 5 fields, found {found}")]
    FieldCount { found: usize },

    /// Field is not a decimal number in range for its width
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Dialing number contains a character outside 0-9, *, #
    #[error("invalid dialing digit: {0:?}")]
    InvalidDigit(char),

    /// Encoded value does not fit the fixed-size field it goes into
    #[error("{what} too long: {len} > {max}")]
    TooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },
}
