//! `/sync/1.0` envelope framing (§4.A row "SYNC_*", §6).
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rumorcast_config::Config;
use rumorcast_crypto::hash::Sha256;

use crate::store::StoreKey;
use crate::sync::{SyncRequest, SyncResponse};

/// Errors parsing a `/sync/1.0` envelope.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SyncWireError {
    /// The envelope bytes are not valid UTF-8 JSON, or lack the outer
    /// `{type, version, payload}` shape.
    #[error("sync envelope schema failure: {0}")]
    SchemaInvalid(String),
    /// `serialized_size > max_message_size`.
    #[error("sync message too large: {0} bytes")]
    MessageTooLarge(usize),
    /// An unsupported envelope version.
    #[error("unsupported sync envelope version: {0}")]
    UnsupportedVersion(String),
    /// A `roots` key did not match any known store.
    #[error("unknown store key: {0}")]
    UnknownStoreKey(String),
    /// A root hash was not valid hex.
    #[error("invalid root hash: {0}")]
    InvalidRootHash(String),
}

const SUPPORTED_VERSION: &str = "1.0";

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: String,
    version: String,
    payload: Value,
    #[serde(default)]
    timestamp: Option<i64>,
}

fn parse_roots(roots: &Value) -> Result<BTreeMap<StoreKey, Sha256>, SyncWireError> {
    let map = roots
        .as_object()
        .ok_or_else(|| SyncWireError::SchemaInvalid("roots must be an object".into()))?;
    let mut out = BTreeMap::new();
    for (name, value) in map {
        let key = StoreKey::from_wire_name(name).ok_or_else(|| SyncWireError::UnknownStoreKey(name.clone()))?;
        let hex = value
            .as_str()
            .ok_or_else(|| SyncWireError::InvalidRootHash(name.clone()))?;
        let root = Sha256::from_hex(hex).map_err(|_| SyncWireError::InvalidRootHash(hex.to_string()))?;
        out.insert(key, root);
    }
    Ok(out)
}

/// Parse a `SYNC_REQUEST` envelope's bytes into a [`SyncRequest`].
pub fn parse_sync_request(bytes: &[u8], config: &Config) -> Result<SyncRequest, SyncWireError> {
    if bytes.len() > config.max_message_size {
        return Err(SyncWireError::MessageTooLarge(bytes.len()));
    }
    let envelope: WireEnvelope =
        serde_json::from_slice(bytes).map_err(|e| SyncWireError::SchemaInvalid(e.to_string()))?;
    if envelope.version != SUPPORTED_VERSION {
        return Err(SyncWireError::UnsupportedVersion(envelope.version));
    }
    if envelope.kind != "SYNC_REQUEST" {
        return Err(SyncWireError::SchemaInvalid(format!("unexpected type {}", envelope.kind)));
    }
    let roots = envelope
        .payload
        .get("roots")
        .ok_or_else(|| SyncWireError::SchemaInvalid("missing roots".into()))?;
    Ok(SyncRequest { roots: parse_roots(roots)? })
}

/// Serialize a [`SyncRequest`] into a `SYNC_REQUEST` envelope.
pub fn encode_sync_request(request: &SyncRequest, timestamp: i64) -> Vec<u8> {
    let roots: BTreeMap<&str, String> = request
        .roots
        .iter()
        .map(|(k, v)| (k.wire_name(), v.to_hex()))
        .collect();
    let envelope = serde_json::json!({
        "type": "SYNC_REQUEST",
        "version": SUPPORTED_VERSION,
        "payload": {"roots": roots},
        "timestamp": timestamp,
    });
    serde_json::to_vec(&envelope).expect("envelope is plain JSON")
}

/// Serialize a [`SyncResponse`] into a `SYNC_RESPONSE` envelope. Entries are
/// base64-free: they are forwarded as JSON strings over raw bytes encoded
/// with `serde_json`'s default lossy behavior is avoided by hex-encoding.
pub fn encode_sync_response(response: &SyncResponse, timestamp: i64) -> Vec<u8> {
    let entries: BTreeMap<&str, Vec<String>> = response
        .entries
        .iter()
        .map(|(k, batch)| (k.wire_name(), batch.iter().map(hex::encode).collect()))
        .collect();
    let envelope = serde_json::json!({
        "type": "SYNC_RESPONSE",
        "version": SUPPORTED_VERSION,
        "payload": {"missingEntries": entries},
        "timestamp": timestamp,
    });
    serde_json::to_vec(&envelope).expect("envelope is plain JSON")
}

/// Parse a `SYNC_RESPONSE` envelope's bytes into a [`SyncResponse`].
pub fn parse_sync_response(bytes: &[u8], config: &Config) -> Result<SyncResponse, SyncWireError> {
    if bytes.len() > config.max_message_size {
        return Err(SyncWireError::MessageTooLarge(bytes.len()));
    }
    let envelope: WireEnvelope =
        serde_json::from_slice(bytes).map_err(|e| SyncWireError::SchemaInvalid(e.to_string()))?;
    if envelope.version != SUPPORTED_VERSION {
        return Err(SyncWireError::UnsupportedVersion(envelope.version));
    }
    if envelope.kind != "SYNC_RESPONSE" {
        return Err(SyncWireError::SchemaInvalid(format!("unexpected type {}", envelope.kind)));
    }
    let missing = envelope
        .payload
        .get("missingEntries")
        .ok_or_else(|| SyncWireError::SchemaInvalid("missing missingEntries".into()))?
        .as_object()
        .ok_or_else(|| SyncWireError::SchemaInvalid("missingEntries must be an object".into()))?;

    let mut entries = BTreeMap::new();
    for (name, batch) in missing {
        let key = StoreKey::from_wire_name(name).ok_or_else(|| SyncWireError::UnknownStoreKey(name.clone()))?;
        let batch = batch
            .as_array()
            .ok_or_else(|| SyncWireError::SchemaInvalid(format!("{name} batch must be an array")))?;
        let mut decoded = Vec::with_capacity(batch.len());
        for item in batch {
            let s = item
                .as_str()
                .ok_or_else(|| SyncWireError::SchemaInvalid(format!("{name} entry must be a string")))?;
            let bytes = hex::decode(s).map_err(|_| SyncWireError::SchemaInvalid(format!("{name} entry not hex")))?;
            decoded.push(bytes);
        }
        entries.insert(key, decoded);
    }
    Ok(SyncResponse { entries })
}
