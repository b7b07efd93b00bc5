//! Process-wide codec registry.
//!
//! Formats are looked up by string identifier. Registration is explicit and
//! idempotent; looking up an unregistered format fails with a descriptive
//! error rather than falling back to any default.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use super::{CodecError, Decode, ENV_VAR, Encode, EnvCodec, JSON, JsonCodec, TOML, TomlCodec, YAML, YamlCodec};

#[derive(Default, Clone)]
struct CodecEntry {
    decoder: Option<Arc<dyn Decode>>,
    encoder: Option<Arc<dyn Encode>>,
}

fn registry() -> &'static RwLock<HashMap<String, CodecEntry>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, CodecEntry>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register (or replace) the decoder for a format.
pub fn register_decoder(format: &str, decoder: Arc<dyn Decode>) {
    let mut entries = registry().write().unwrap_or_else(|e| e.into_inner());
    entries.entry(format.to_string()).or_default().decoder = Some(decoder);
}

/// Register (or replace) the encoder for a format.
pub fn register_encoder(format: &str, encoder: Arc<dyn Encode>) {
    let mut entries = registry().write().unwrap_or_else(|e| e.into_inner());
    entries.entry(format.to_string()).or_default().encoder = Some(encoder);
}

/// Register the built-in codecs: JSON, YAML, and TOML (both directions) and
/// the decode-only environment-variable codec.
///
/// Call this once from the entry point before building a configuration
/// instance. Calling it again is a no-op apart from re-registering the same
/// codecs.
pub fn register_defaults() {
    register_decoder(JSON, Arc::new(JsonCodec));
    register_encoder(JSON, Arc::new(JsonCodec));
    register_decoder(YAML, Arc::new(YamlCodec));
    register_encoder(YAML, Arc::new(YamlCodec));
    register_decoder(TOML, Arc::new(TomlCodec));
    register_encoder(TOML, Arc::new(TomlCodec));
    register_decoder(ENV_VAR, Arc::new(EnvCodec));
}

/// Look up the decoder for a format.
pub fn decoder(format: &str) -> Result<Arc<dyn Decode>, CodecError> {
    let entries = registry().read().unwrap_or_else(|e| e.into_inner());
    entries
        .get(format)
        .and_then(|entry| entry.decoder.clone())
        .ok_or_else(|| CodecError::NoDecoder(format.to_string()))
}

/// Look up the encoder for a format.
pub fn encoder(format: &str) -> Result<Arc<dyn Encode>, CodecError> {
    let entries = registry().read().unwrap_or_else(|e| e.into_inner());
    entries
        .get(format)
        .and_then(|entry| entry.encoder.clone())
        .ok_or_else(|| CodecError::NoEncoder(format.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_format_fails_lookup() {
        let err = decoder("definitely-not-registered").map(|_| ()).unwrap_err();
        assert_eq!(
            err,
            CodecError::NoDecoder("definitely-not-registered".to_string())
        );
        let err = encoder("definitely-not-registered").map(|_| ()).unwrap_err();
        assert_eq!(
            err,
            CodecError::NoEncoder("definitely-not-registered".to_string())
        );
    }

    #[test]
    fn test_register_defaults_is_idempotent() {
        register_defaults();
        register_defaults();

        assert!(decoder(JSON).is_ok());
        assert!(encoder(YAML).is_ok());
        assert!(decoder(TOML).is_ok());
        assert!(decoder(ENV_VAR).is_ok());
        // The env-var codec is decode-only.
        assert!(encoder(ENV_VAR).is_err());
    }
}
