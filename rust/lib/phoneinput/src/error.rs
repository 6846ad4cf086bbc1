use phoneinput_flux::StateError;
use thiserror::Error;

use crate::field::Field;

/// Failures reported on the operation-error channel.
///
/// Errors travel through the store like any other value, hence `Clone` and
/// `PartialEq`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneInputError {
    /// The country-code provider failed. The message is kept verbatim.
    #[error("{0}")]
    Fetch(String),

    /// A write trigger was used before its backend wired it.
    #[error("write sink for '{0}' is not initialized")]
    SinkUninitialized(Field),

    /// No tokio runtime was available to run the fetch on.
    #[error("async runtime unavailable: {0}")]
    Runtime(String),

    #[error(transparent)]
    State(#[from] StateError),

    /// Country-code data could not be decoded.
    #[error("invalid country code data: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for PhoneInputError {
    fn from(err: serde_json::Error) -> Self {
        PhoneInputError::Decode(err.to_string())
    }
}
