//! # Error Types
//!
//! Errors raised by the leaf primitives. Both are caller-usage errors and
//! carry the offending input verbatim.

use thiserror::Error;

/// A malformed dotted selection key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The key was the empty string.
    #[error("field path must not be empty")]
    Empty,

    /// The key contained an empty segment (`"a..b"`, `".a"`, `"a."`).
    #[error("field path '{0}' contains an empty segment")]
    EmptySegment(String),
}

/// Rendering a document as text failed.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
