use thiserror::Error;

/// Failure reading or addressing state.
///
/// Reads never panic: a missing value, a value of the wrong type and a path
/// that cannot be parsed are all reported through this type so callers can
/// pick a fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("no value at path '{0}'")]
    NotFound(String),

    #[error("value at path '{path}' is not a {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
    },

    #[error("malformed path: {0}")]
    MalformedPath(String),
}
