use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use config_model::ConfigValue;

use crate::error::{Result, StoreError};

/// Encodes values on their way to storage and decodes them on the way back.
///
/// The store never persists a [`ConfigValue`] directly; everything passes
/// through the codec immediately before insert and immediately after
/// retrieval. Deployments that need encryption at rest put their cipher
/// behind this trait; tests substitute [`JsonCodec`].
pub trait ValueCodec: Send + Sync {
    fn encode(&self, value: &ConfigValue) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<ConfigValue>;
}

/// Plain JSON bytes, no at-rest protection.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn encode(&self, value: &ConfigValue) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<ConfigValue> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Codec(e.to_string()))
    }
}

/// JSON wrapped in base64. An opaque-at-rest stand-in with the same shape a
/// real encrypting codec would have.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl ValueCodec for Base64Codec {
    fn encode(&self, value: &ConfigValue) -> Result<Vec<u8>> {
        let json = JsonCodec.encode(value)?;
        Ok(STANDARD.encode(json).into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<ConfigValue> {
        let json = STANDARD
            .decode(bytes)
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        JsonCodec.decode(&json)
    }
}
