//! Native codec registry and the ordered decode fallback chain.

use super::{json_type_name, PropertyEncoding, StoredProperty};
use crate::errors::CodecError;
use parking_lot::RwLock;
use std::sync::Arc;

/// A codec providing an opaque binary representation for values of one
/// runtime type.
///
/// Registration replaces runtime reflection: a value is natively encodable
/// exactly when some registered codec claims it, and a declared type name
/// "resolves" at restore time exactly when a codec with that name is
/// registered. A codec must only claim values it can own end to end; a
/// value no codec claims falls through to structured encoding.
pub trait NativeCodec: Send + Sync {
    /// The fully qualified type name written as the declared type.
    fn type_name(&self) -> &str;

    /// Returns true if this codec owns the given value.
    fn claims(&self, value: &serde_json::Value) -> bool;

    /// Encodes a claimed value to opaque bytes.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if the value cannot be encoded; callers fall
    /// back to structured encoding.
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, CodecError>;

    /// Decodes bytes previously produced by [`NativeCodec::encode`].
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if the bytes cannot be decoded; callers fall
    /// back to a generic structured decode.
    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, CodecError>;
}

/// Registry of native codecs, consulted in registration order.
///
/// An empty registry is valid: every property then takes the structured
/// path, and every stored native property takes the generic-decode
/// fallback.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<Vec<Arc<dyn NativeCodec>>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native codec.
    pub fn register(&self, codec: Arc<dyn NativeCodec>) {
        self.codecs.write().push(codec);
    }

    /// Returns the number of registered codecs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    /// Returns true if no codecs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }

    /// Finds the first registered codec claiming the value.
    fn native_for(&self, value: &serde_json::Value) -> Option<Arc<dyn NativeCodec>> {
        self.codecs
            .read()
            .iter()
            .find(|codec| codec.claims(value))
            .cloned()
    }

    /// Resolves a declared type name to its codec.
    fn by_name(&self, type_name: &str) -> Option<Arc<dyn NativeCodec>> {
        self.codecs
            .read()
            .iter()
            .find(|codec| codec.type_name() == type_name)
            .cloned()
    }

    /// Encodes a property value into its persistable tagged form.
    ///
    /// A claimed value is encoded natively under the codec's type name; a
    /// native-encode failure downgrades to structured. Everything else is
    /// structured JSON bytes under the value's JSON type name.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` only on an unrecoverable structured-encoding
    /// fault, which aborts the enclosing checkpoint capture.
    pub fn encode_property(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<StoredProperty, CodecError> {
        if let Some(codec) = self.native_for(value) {
            match codec.encode(value) {
                Ok(bytes) => {
                    return Ok(StoredProperty {
                        name: name.to_string(),
                        declared_type: codec.type_name().to_string(),
                        encoding: PropertyEncoding::Native,
                        value: bytes,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        property = name,
                        declared_type = codec.type_name(),
                        %error,
                        "native encoding failed, falling back to structured"
                    );
                }
            }
        }

        let bytes = serde_json::to_vec(value)?;
        Ok(StoredProperty {
            name: name.to_string(),
            declared_type: json_type_name(value).to_string(),
            encoding: PropertyEncoding::Structured,
            value: bytes,
        })
    }

    /// Decodes a stored property through the ordered fallback chain.
    ///
    /// Native encoding with a resolvable declared type decodes natively;
    /// otherwise (unresolvable type, or native/structured decode failure)
    /// a generic structured decode is attempted; as the last resort the raw
    /// bytes are read as a plain string. The chain is total: decoding never
    /// fails, it only degrades.
    #[must_use]
    pub fn decode_property(&self, stored: &StoredProperty) -> serde_json::Value {
        if stored.encoding == PropertyEncoding::Native {
            if let Some(codec) = self.by_name(&stored.declared_type) {
                match codec.decode(&stored.value) {
                    Ok(value) => return value,
                    Err(error) => {
                        tracing::warn!(
                            property = %stored.name,
                            declared_type = %stored.declared_type,
                            %error,
                            "native decoding failed, trying structured decode"
                        );
                    }
                }
            } else {
                tracing::debug!(
                    property = %stored.name,
                    declared_type = %stored.declared_type,
                    "declared type does not resolve, trying structured decode"
                );
            }
        }

        match serde_json::from_slice(&stored.value) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(
                    property = %stored.name,
                    declared_type = %stored.declared_type,
                    %error,
                    "structured decode failed, restoring as plain string"
                );
                serde_json::Value::String(String::from_utf8_lossy(&stored.value).into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Test codec for `{"x": f64, "y": f64}` points, packed as two LE f64s.
    struct PointCodec;

    impl NativeCodec for PointCodec {
        fn type_name(&self) -> &str {
            "geometry.point"
        }

        fn claims(&self, value: &serde_json::Value) -> bool {
            value.get("x").and_then(serde_json::Value::as_f64).is_some()
                && value.get("y").and_then(serde_json::Value::as_f64).is_some()
        }

        fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, CodecError> {
            let x = value
                .get("x")
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| CodecError::native_encode(self.type_name(), "missing x"))?;
            let y = value
                .get("y")
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| CodecError::native_encode(self.type_name(), "missing y"))?;

            let mut bytes = x.to_le_bytes().to_vec();
            bytes.extend_from_slice(&y.to_le_bytes());
            Ok(bytes)
        }

        fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, CodecError> {
            if bytes.len() != 16 {
                return Err(CodecError::native_decode(self.type_name(), "expected 16 bytes"));
            }
            let mut x = [0u8; 8];
            let mut y = [0u8; 8];
            x.copy_from_slice(&bytes[..8]);
            y.copy_from_slice(&bytes[8..]);
            Ok(serde_json::json!({
                "x": f64::from_le_bytes(x),
                "y": f64::from_le_bytes(y),
            }))
        }
    }

    #[test]
    fn test_structured_round_trip() {
        let registry = CodecRegistry::new();
        let stored = registry.encode_property("count", &serde_json::json!(5)).unwrap();

        assert_eq!(stored.encoding, PropertyEncoding::Structured);
        assert_eq!(stored.declared_type, "integer");
        assert_eq!(registry.decode_property(&stored), serde_json::json!(5));
    }

    #[test]
    fn test_native_round_trip() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(PointCodec));

        let point = serde_json::json!({"x": 1.5, "y": -2.0});
        let stored = registry.encode_property("origin", &point).unwrap();

        assert_eq!(stored.encoding, PropertyEncoding::Native);
        assert_eq!(stored.declared_type, "geometry.point");
        assert_eq!(stored.value.len(), 16);
        assert_eq!(registry.decode_property(&stored), point);
    }

    #[test]
    fn test_unclaimed_value_stays_structured() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(PointCodec));

        let stored = registry
            .encode_property("tag", &serde_json::json!("x"))
            .unwrap();
        assert_eq!(stored.encoding, PropertyEncoding::Structured);
        assert_eq!(stored.declared_type, "string");
    }

    #[test]
    fn test_unresolvable_native_type_falls_back_to_structured_decode() {
        let registry = CodecRegistry::new();
        let stored = StoredProperty {
            name: "origin".to_string(),
            declared_type: "geometry.point".to_string(),
            encoding: PropertyEncoding::Native,
            value: b"{\"x\":1.0,\"y\":2.0}".to_vec(),
        };

        // No codec registered: the bytes happen to be valid JSON, so the
        // generic structured decode recovers the value.
        assert_eq!(
            registry.decode_property(&stored),
            serde_json::json!({"x": 1.0, "y": 2.0})
        );
    }

    #[test]
    fn test_unreadable_bytes_restore_as_plain_string() {
        let registry = CodecRegistry::new();
        let stored = StoredProperty {
            name: "legacy".to_string(),
            declared_type: "com.example.Missing".to_string(),
            encoding: PropertyEncoding::Native,
            value: b"opaque legacy payload".to_vec(),
        };

        assert_eq!(
            registry.decode_property(&stored),
            serde_json::json!("opaque legacy payload")
        );
    }

    #[test]
    fn test_corrupt_native_bytes_degrade_through_the_chain() {
        let registry = CodecRegistry::new();
        registry.register(Arc::new(PointCodec));

        let stored = StoredProperty {
            name: "origin".to_string(),
            declared_type: "geometry.point".to_string(),
            encoding: PropertyEncoding::Native,
            value: b"short".to_vec(),
        };

        // Native decode rejects the length, structured decode rejects the
        // bytes, the string fallback wins.
        assert_eq!(
            registry.decode_property(&stored),
            serde_json::json!("short")
        );
    }
}
