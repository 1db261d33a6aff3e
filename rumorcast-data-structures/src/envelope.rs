//! Envelope & Validator (§4.A).
//!
//! Parses and schema-checks one gossip envelope into a concrete [`Operation`].
//! Deduplication by nullifier is a separate, stateful step; see
//! [`crate::dedup::NullifierSeenSet`].
use serde::Deserialize;
use serde_json::Value;

use rumorcast_config::Config;

use crate::error::EnvelopeError;
use crate::identifiers::{Commitment, Nullifier, RumorId};
use crate::op::{Join, Operation};
use crate::rumor::{Rumor, Topic};
use crate::tombstone::{Tombstone, TombstoneReason};
use crate::vote::{Choice, Prediction, Vote};

/// The outer envelope shape common to every topic (§6): `{type, version,
/// payload, timestamp?}`.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    version: String,
    payload: Value,
    #[serde(default)]
    timestamp: Option<i64>,
}

const SUPPORTED_VERSION: &str = "1.0";

/// Parse the outer envelope shape and check the version, without looking at
/// `payload` yet. Exposed so the anti-entropy sync path (which handles the
/// `SYNC_REQUEST`/`SYNC_RESPONSE` types, never logged as an [`Operation`])
/// can reuse the same framing.
pub fn parse_outer(bytes: &[u8], config: &Config) -> Result<(String, Value, Option<i64>), EnvelopeError> {
    if bytes.len() > config.max_message_size {
        return Err(EnvelopeError::MessageTooLarge {
            size: bytes.len(),
            limit: config.max_message_size,
        });
    }
    let raw: RawEnvelope = serde_json::from_slice(bytes)
        .map_err(|e| EnvelopeError::SchemaInvalid(e.to_string()))?;
    if raw.version != SUPPORTED_VERSION {
        return Err(EnvelopeError::UnsupportedVersion(raw.version));
    }
    Ok((raw.kind, raw.payload, raw.timestamp))
}

fn get_str<'a>(payload: &'a Value, field: &'static str) -> Result<&'a str, EnvelopeError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or(EnvelopeError::MissingField(field))
}

fn get_f64(payload: &Value, field: &'static str) -> Result<f64, EnvelopeError> {
    payload
        .get(field)
        .and_then(Value::as_f64)
        .ok_or(EnvelopeError::MissingField(field))
}

fn get_u64(payload: &Value, field: &'static str) -> Result<u64, EnvelopeError> {
    payload
        .get(field)
        .and_then(Value::as_u64)
        .ok_or(EnvelopeError::MissingField(field))
}

fn zk_proof_nullifier(payload: &Value) -> Result<Nullifier, EnvelopeError> {
    let proof = payload
        .get("zkProof")
        .ok_or(EnvelopeError::MissingField("zkProof"))?;
    let nullifier = proof
        .get("nullifier")
        .and_then(Value::as_str)
        .ok_or(EnvelopeError::MissingField("zkProof.nullifier"))?;
    Ok(Nullifier(nullifier.to_string()))
}

/// Like [`zk_proof_nullifier`], but also requires `zkProof.merkleRoot`, as
/// RUMOR's payload table does (VOTE/TOMBSTONE only require `nullifier`).
fn zk_proof_nullifier_and_root(payload: &Value) -> Result<Nullifier, EnvelopeError> {
    let nullifier = zk_proof_nullifier(payload)?;
    let proof = payload
        .get("zkProof")
        .ok_or(EnvelopeError::MissingField("zkProof"))?;
    proof
        .get("merkleRoot")
        .and_then(Value::as_str)
        .ok_or(EnvelopeError::MissingField("zkProof.merkleRoot"))?;
    Ok(nullifier)
}

fn parse_topic(value: &str) -> Result<Topic, EnvelopeError> {
    match value {
        "administration" => Ok(Topic::Administration),
        "safety" => Ok(Topic::Safety),
        "events" => Ok(Topic::Events),
        "academic" => Ok(Topic::Academic),
        "facilities" => Ok(Topic::Facilities),
        "general" => Ok(Topic::General),
        other => Err(EnvelopeError::InvalidEnumValue {
            field: "topic",
            value: other.to_string(),
        }),
    }
}

fn parse_choice(value: &str) -> Result<Choice, EnvelopeError> {
    match value {
        "TRUE" => Ok(Choice::True),
        "FALSE" => Ok(Choice::False),
        "UNVERIFIED" => Ok(Choice::Unverified),
        other => Err(EnvelopeError::InvalidEnumValue {
            field: "vote",
            value: other.to_string(),
        }),
    }
}

fn parse_reason(value: &str) -> Result<TombstoneReason, EnvelopeError> {
    match value {
        "retracted" => Ok(TombstoneReason::Retracted),
        "duplicate" => Ok(TombstoneReason::Duplicate),
        "community_flagged" => Ok(TombstoneReason::CommunityFlagged),
        "admin_removal" => Ok(TombstoneReason::AdminRemoval),
        other => Err(EnvelopeError::InvalidEnumValue {
            field: "reason",
            value: other.to_string(),
        }),
    }
}

fn parse_prediction(payload: &Value, config: &Config) -> Result<(Prediction, f64), EnvelopeError> {
    let prediction = payload
        .get("prediction")
        .ok_or(EnvelopeError::MissingField("prediction"))?;
    let t = prediction.get("TRUE").and_then(Value::as_f64).unwrap_or(0.0);
    let f = prediction.get("FALSE").and_then(Value::as_f64).unwrap_or(0.0);
    let u = prediction
        .get("UNVERIFIED")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let prediction = Prediction::new(t, f, u);
    let sum = prediction.sum();
    if (sum - 1.0).abs() > config.prediction_sum_tolerance {
        return Err(EnvelopeError::PredictionSumOutOfTolerance { sum });
    }
    Ok((prediction, sum))
}

fn validate_rumor(payload: &Value, timestamp: i64, config: &Config) -> Result<Operation, EnvelopeError> {
    let text = get_str(payload, "text")?;
    if text.chars().count() > config.max_rumor_text_len {
        return Err(EnvelopeError::TextTooLong {
            len: text.chars().count(),
            limit: config.max_rumor_text_len,
        });
    }
    let topic = parse_topic(get_str(payload, "topic")?)?;
    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .unwrap_or_else(|| content_address(text));
    let author_nullifier = zk_proof_nullifier_and_root(payload)?;

    Ok(Operation::Rumor(Rumor {
        id: RumorId(id),
        text: text.to_string(),
        topic,
        author_nullifier,
        timestamp,
    }))
}

/// Content-address a rumor by hashing its text, used when a RUMOR payload
/// omits an explicit `id`.
fn content_address(text: &str) -> String {
    rumorcast_crypto::hash::calculate_sha256(text.as_bytes()).to_hex()
}

fn validate_vote(payload: &Value, timestamp: i64, config: &Config) -> Result<Operation, EnvelopeError> {
    let rumor_id = get_str(payload, "rumorId")?.to_string();
    let choice = parse_choice(get_str(payload, "vote")?)?;
    let (prediction, _sum) = parse_prediction(payload, config)?;
    let stake_amount = get_u64(payload, "stakeAmount")?;
    if stake_amount < 1 {
        return Err(EnvelopeError::MissingField("stakeAmount"));
    }
    let voter_nullifier = zk_proof_nullifier(payload)?;

    Ok(Operation::Vote(Vote {
        rumor_id: RumorId(rumor_id),
        voter_nullifier,
        choice,
        prediction,
        stake_amount,
        timestamp,
    }))
}

fn validate_join(payload: &Value, timestamp: i64) -> Result<Operation, EnvelopeError> {
    let commitment = get_str(payload, "commitment")?.to_string();
    let dkim = payload
        .get("dkimProof")
        .ok_or(EnvelopeError::MissingDkimDomain)?;
    let _domain = dkim
        .get("domain")
        .and_then(Value::as_str)
        .ok_or(EnvelopeError::MissingDkimDomain)?;
    // The nullifier is minted by the identity collaborator from the DKIM
    // proof; the core only needs it to key the reputation account, not to
    // re-derive it (that verification is out of scope, §1).
    let nullifier = payload
        .get("nullifier")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .unwrap_or_else(|| commitment.clone());

    Ok(Operation::Join(Join {
        commitment: Commitment(commitment),
        nullifier: Nullifier(nullifier),
        timestamp,
    }))
}

fn validate_tombstone(payload: &Value, timestamp: i64) -> Result<Operation, EnvelopeError> {
    let rumor_id = get_str(payload, "rumorId")?.to_string();
    let reason = parse_reason(get_str(payload, "reason")?)?;
    let author_nullifier = zk_proof_nullifier(payload)?;

    Ok(Operation::Tombstone(Tombstone {
        rumor_id: RumorId(rumor_id),
        reason,
        author_nullifier,
        timestamp,
    }))
}

/// Validate and parse one gossip envelope received on `topic` into an
/// [`Operation`]. Returns `Err` on any schema, size or enum violation; the
/// caller is responsible for dropping silently on the gossip path and
/// surfacing an error code only on a local API (§7).
pub fn validate(topic: &str, bytes: &[u8], config: &Config) -> Result<Operation, EnvelopeError> {
    let (kind, payload, timestamp) = parse_outer(bytes, config)?;
    let timestamp = timestamp.unwrap_or(0);

    match (topic, kind.as_str()) {
        (_, "RUMOR") => validate_rumor(&payload, timestamp, config),
        (_, "VOTE") => validate_vote(&payload, timestamp, config),
        (_, "JOIN") => validate_join(&payload, timestamp),
        (_, "TOMBSTONE") => validate_tombstone(&payload, timestamp),
        (_, other) => Err(EnvelopeError::InvalidEnumValue {
            field: "type",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn accepts_well_formed_rumor() {
        let bytes = br#"{
            "type": "RUMOR", "version": "1.0", "timestamp": 100,
            "payload": {"text": "dining hall closes early", "topic": "facilities",
                        "zkProof": {"nullifier": "n1", "merkleRoot": "r1"}}
        }"#;
        let op = validate("/rumors/1.0", bytes, &cfg()).unwrap();
        assert!(matches!(op, Operation::Rumor(_)));
    }

    #[test]
    fn rejects_rumor_text_too_long() {
        let text = "x".repeat(2001);
        let body = serde_json::json!({
            "type": "RUMOR", "version": "1.0", "timestamp": 1,
            "payload": {"text": text, "topic": "general",
                        "zkProof": {"nullifier": "n1"}}
        });
        let bytes = serde_json::to_vec(&body).unwrap();
        let err = validate("/rumors/1.0", &bytes, &cfg()).unwrap_err();
        assert!(matches!(err, EnvelopeError::TextTooLong { .. }));
    }

    #[test]
    fn rejects_rumor_missing_merkle_root() {
        let body = serde_json::json!({
            "type": "RUMOR", "version": "1.0",
            "payload": {"text": "hi", "topic": "general",
                        "zkProof": {"nullifier": "n1"}}
        });
        let bytes = serde_json::to_vec(&body).unwrap();
        let err = validate("/rumors/1.0", &bytes, &cfg()).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingField("zkProof.merkleRoot")));
    }

    #[test]
    fn rejects_invalid_topic() {
        let body = serde_json::json!({
            "type": "RUMOR", "version": "1.0",
            "payload": {"text": "hi", "topic": "not-a-topic",
                        "zkProof": {"nullifier": "n1"}}
        });
        let bytes = serde_json::to_vec(&body).unwrap();
        let err = validate("/rumors/1.0", &bytes, &cfg()).unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidEnumValue { .. }));
    }

    #[test]
    fn accepts_vote_within_prediction_tolerance() {
        let body = serde_json::json!({
            "type": "VOTE", "version": "1.0", "timestamp": 5,
            "payload": {"rumorId": "r1", "vote": "TRUE",
                        "prediction": {"TRUE": 0.9, "FALSE": 0.05, "UNVERIFIED": 0.06},
                        "stakeAmount": 2,
                        "zkProof": {"nullifier": "n2"}}
        });
        let bytes = serde_json::to_vec(&body).unwrap();
        let op = validate("/votes/1.0", &bytes, &cfg()).unwrap();
        assert!(matches!(op, Operation::Vote(_)));
    }

    #[test]
    fn rejects_vote_outside_prediction_tolerance() {
        let body = serde_json::json!({
            "type": "VOTE", "version": "1.0",
            "payload": {"rumorId": "r1", "vote": "TRUE",
                        "prediction": {"TRUE": 0.5, "FALSE": 0.0, "UNVERIFIED": 0.0},
                        "stakeAmount": 1,
                        "zkProof": {"nullifier": "n2"}}
        });
        let bytes = serde_json::to_vec(&body).unwrap();
        let err = validate("/votes/1.0", &bytes, &cfg()).unwrap_err();
        assert!(matches!(err, EnvelopeError::PredictionSumOutOfTolerance { .. }));
    }

    #[test]
    fn rejects_oversized_message() {
        let mut cfg = cfg();
        cfg.max_message_size = 8;
        let bytes = br#"{"type":"RUMOR","version":"1.0","payload":{}}"#;
        let err = validate("/rumors/1.0", bytes, &cfg).unwrap_err();
        assert!(matches!(err, EnvelopeError::MessageTooLarge { .. }));
    }

    #[test]
    fn rejects_unsupported_version() {
        let bytes = br#"{"type":"RUMOR","version":"2.0","payload":{}}"#;
        let err = validate("/rumors/1.0", bytes, &cfg()).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnsupportedVersion(_)));
    }

    #[test]
    fn accepts_join() {
        let body = serde_json::json!({
            "type": "JOIN", "version": "1.0",
            "payload": {"commitment": "c1", "dkimProof": {"domain": "university.edu"}}
        });
        let bytes = serde_json::to_vec(&body).unwrap();
        let op = validate("/identity/1.0", &bytes, &cfg()).unwrap();
        assert!(matches!(op, Operation::Join(_)));
    }

    #[test]
    fn accepts_tombstone() {
        let body = serde_json::json!({
            "type": "TOMBSTONE", "version": "1.0",
            "payload": {"rumorId": "r1", "reason": "retracted",
                        "zkProof": {"nullifier": "n1"}}
        });
        let bytes = serde_json::to_vec(&body).unwrap();
        let op = validate("/tombstone/1.0", &bytes, &cfg()).unwrap();
        assert!(matches!(op, Operation::Tombstone(_)));
    }
}
