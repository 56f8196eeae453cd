//! Property codec: tagged, persistable encoding for arbitrary values.
//!
//! Checkpointed property values survive arbitrary runtime types through a
//! tagged representation: values claimed by a registered [`NativeCodec`]
//! are stored as opaque bytes under the codec's type name; everything else
//! is stored as structured JSON bytes under its JSON type name. Decoding
//! walks an ordered fallback chain (native codec, then generic structured
//! decode, then plain UTF-8 string) so checkpoints written by older runtimes
//! (or with codecs that no longer resolve) still restore without error.

mod bytes;
mod registry;

pub use bytes::{base64_bytes, base64_opt};
pub use registry::{CodecRegistry, NativeCodec};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a stored property value was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyEncoding {
    /// Opaque bytes produced by a registered native codec.
    Native,
    /// Structured JSON bytes.
    Structured,
}

impl fmt::Display for PropertyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "NATIVE"),
            Self::Structured => write!(f, "STRUCTURED"),
        }
    }
}

/// One persisted property: the stable on-disk/on-wire 4-tuple.
///
/// The `(name, declared_type, encoding, value)` shape is a compatibility
/// contract: checkpoints written by older versions must keep restoring,
/// which is what the decode fallback chain in [`CodecRegistry`] guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProperty {
    /// The property name.
    pub name: String,
    /// The declared type of the stored value.
    pub declared_type: String,
    /// How `value` was encoded.
    pub encoding: PropertyEncoding,
    /// The encoded bytes.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

/// Returns the JSON type name used as the declared type for structured
/// encodings.
#[must_use]
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) => {
            if n.is_f64() {
                "float"
            } else {
                "integer"
            }
        }
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
