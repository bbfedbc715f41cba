//! # Document Encoding — Structured Output to Text
//!
//! A projected document is an ordered `serde_json` object. This module is
//! the single place where such a document becomes text, so every textual
//! rendering in the workspace shares one set of rules.
//!
//! ## Encodings
//!
//! - [`Encoding::Compact`] — JSON with compact separators, keys in
//!   document (schema field) order.
//! - [`Encoding::Pretty`] — the same, indented for humans.
//! - [`Encoding::Canonical`] — RFC 8785 (JSON Canonicalization Scheme) via
//!   `serde_jcs`: sorted keys, compact separators, deterministic bytes.
//!   Use it when two renderings of the same document must compare equal
//!   byte-for-byte regardless of field order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EncodeError;

/// How a document is rendered as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Compact JSON, document order.
    #[default]
    Compact,
    /// Indented JSON, document order.
    Pretty,
    /// RFC 8785 canonical JSON, sorted keys.
    Canonical,
}

impl Encoding {
    /// Returns the encoding identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Canonical => "canonical",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a document as text.
///
/// # Errors
///
/// Returns `EncodeError::Serialization` if the value cannot be serialized.
/// `serde_json::Value` trees built from finite numbers always serialize.
pub fn encode(document: &Value, encoding: Encoding) -> Result<String, EncodeError> {
    let text = match encoding {
        Encoding::Compact => serde_json::to_string(document)?,
        Encoding::Pretty => serde_json::to_string_pretty(document)?,
        Encoding::Canonical => serde_jcs::to_string(document)?,
    };
    Ok(text)
}
