//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while decoding the binary encodings in this crate.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The input ended in the middle of a value.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A varint continued past the width of its target type.
    #[error("varint exceeds {0}-bit range")]
    VarintOverflow(u32),

    /// An underlying stream failed while supplying bytes.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}
