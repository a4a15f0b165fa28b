//! Error types for the feature codec.

use thiserror::Error;

use cartograph_core::EncodingError;

use crate::container::ContainerError;

/// Result type for feature codec operations.
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Errors raised by the feature codec.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A builder was asked to serialize while violating a structural
    /// invariant. This is a caller bug, not a data problem.
    #[error("invalid builder state: {0}")]
    InvalidBuilder(String),

    /// The input bytes do not form a valid feature. Fatal for this feature;
    /// the caller may skip to the next one.
    #[error("malformed feature: {0}")]
    Malformed(String),

    /// The geometry container failed while supplying an outer stream.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl From<EncodingError> for FeatureError {
    fn from(err: EncodingError) -> Self {
        match err {
            // Stream failures surface as container errors untouched; every
            // other decode failure means the feature bytes are bad.
            EncodingError::Io(io) => Self::Container(ContainerError::Io(io)),
            other => Self::Malformed(other.to_string()),
        }
    }
}
