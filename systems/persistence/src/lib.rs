#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-line text encoding of [`SaveSnapshot`] values.
//!
//! An encoded save reads `tower:v<version>:<digest>:<payload>`, where the
//! payload is the snapshot as JSON in unpadded base64 and the digest is the
//! first eight bytes of the payload's SHA-256 in lowercase hex.
//!
//! Payloads are read field by field: a malformed field falls back to its
//! default and a malformed collection entry is skipped, so one damaged record
//! never discards the rest of a save.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use medusa_tower_core::{
    ChangeStateRecord, CushionRecord, PuzzleRecord, SaveSnapshot, SAVE_VERSION,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SAVE_DOMAIN: &str = "tower";
const FIELD_DELIMITER: char = ':';
const DIGEST_BYTES: usize = 8;

/// Errors raised while decoding a save string.
#[derive(Debug, Error)]
pub enum SaveCodecError {
    /// The string was empty or whitespace only.
    #[error("save data was empty")]
    EmptyPayload,
    /// A segment was missing.
    #[error("save data is missing its {0}")]
    MissingSegment(&'static str),
    /// The domain prefix was not recognised.
    #[error("save prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version segment could not be parsed.
    #[error("save version '{0}' is not valid")]
    InvalidVersion(String),
    /// The digest did not match the payload.
    #[error("save digest '{found}' does not match the payload digest '{expected}'")]
    DigestMismatch {
        /// Digest carried by the save string.
        found: String,
        /// Digest computed from the payload.
        expected: String,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode save payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The JSON payload could not be parsed.
    #[error("could not parse save payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Encodes and decodes save strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct SaveCodec;

impl SaveCodec {
    /// Encodes a snapshot into a single line.
    ///
    /// # Errors
    ///
    /// Returns [`SaveCodecError::InvalidPayload`] when the snapshot cannot be
    /// serialised.
    pub fn encode(snapshot: &SaveSnapshot) -> Result<String, SaveCodecError> {
        let json = serde_json::to_vec(snapshot)?;
        let payload = STANDARD_NO_PAD.encode(json);
        let digest = digest(&payload);
        Ok(format!(
            "{SAVE_DOMAIN}:v{}:{digest}:{payload}",
            snapshot.version
        ))
    }

    /// Decodes a save string produced by [`SaveCodec::encode`].
    ///
    /// Snapshots written by newer builds load their known fields only.
    ///
    /// # Errors
    ///
    /// Returns a [`SaveCodecError`] describing the first malformed segment.
    pub fn decode(value: &str) -> Result<SaveSnapshot, SaveCodecError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SaveCodecError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
        let domain = parts.next().ok_or(SaveCodecError::MissingSegment("prefix"))?;
        let version = parts
            .next()
            .ok_or(SaveCodecError::MissingSegment("version"))?;
        let found = parts
            .next()
            .ok_or(SaveCodecError::MissingSegment("digest"))?;
        let payload = parts
            .next()
            .ok_or(SaveCodecError::MissingSegment("payload"))?;

        if domain != SAVE_DOMAIN {
            return Err(SaveCodecError::InvalidPrefix(domain.to_owned()));
        }
        let version = version
            .strip_prefix('v')
            .and_then(|number| number.parse::<u32>().ok())
            .ok_or_else(|| SaveCodecError::InvalidVersion(version.to_owned()))?;
        if version > SAVE_VERSION {
            log::warn!("save version {version} is newer than {SAVE_VERSION}");
        }

        let expected = digest(payload);
        if found != expected {
            return Err(SaveCodecError::DigestMismatch {
                found: found.to_owned(),
                expected,
            });
        }

        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let mut snapshot = lenient_snapshot(serde_json::from_slice(&bytes)?);
        snapshot.version = version;
        Ok(snapshot)
    }

    /// Decodes a save string, starting fresh when it is unusable.
    #[must_use]
    pub fn decode_or_fresh(value: &str) -> SaveSnapshot {
        match Self::decode(value) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                log::warn!("discarding unreadable save: {error}");
                SaveSnapshot::default()
            }
        }
    }
}

fn lenient_snapshot(value: Value) -> SaveSnapshot {
    let Value::Object(mut root) = value else {
        log::warn!("save payload is not an object, starting fresh");
        return SaveSnapshot::default();
    };
    let mut change_state = object(&mut root, "change_state");
    let mut puzzles = object(&mut root, "puzzles");
    let mut cushion = object(&mut root, "cushion");

    SaveSnapshot {
        version: field(&mut root, "version"),
        change_state: ChangeStateRecord {
            elevators: entries(&mut change_state, "elevators"),
            modifiers: entries(&mut change_state, "modifiers"),
        },
        puzzles: PuzzleRecord {
            pieces: entries(&mut puzzles, "pieces"),
            sets: entries(&mut puzzles, "sets"),
        },
        statues: entries(&mut root, "statues"),
        cushion: CushionRecord {
            remaining: field(&mut cushion, "remaining"),
            redirects: entries(&mut cushion, "redirects"),
        },
        avatar: field(&mut root, "avatar"),
        arrivals: entries(&mut root, "arrivals"),
        unlocked_magic: entries(&mut root, "unlocked_magic"),
        killed_snakes: entries(&mut root, "killed_snakes"),
    }
}

fn object(parent: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match parent.remove(key) {
        Some(Value::Object(map)) => map,
        Some(other) => {
            log::warn!("save field {key} is not an object: {other}");
            Map::new()
        }
        None => Map::new(),
    }
}

fn field<T: DeserializeOwned + Default>(parent: &mut Map<String, Value>, key: &str) -> T {
    let Some(value) = parent.remove(key) else {
        return T::default();
    };
    serde_json::from_value(value).unwrap_or_else(|error| {
        log::warn!("save field {key} is unreadable: {error}");
        T::default()
    })
}

fn entries<T: DeserializeOwned>(parent: &mut Map<String, Value>, key: &str) -> Vec<T> {
    let values = match parent.remove(key) {
        Some(Value::Array(values)) => values,
        Some(other) => {
            log::warn!("save field {key} is not a list: {other}");
            return Vec::new();
        }
        None => return Vec::new(),
    };
    values
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value(value)
                .map_err(|error| log::warn!("skipping unreadable {key} entry: {error}"))
                .ok()
        })
        .collect()
}

fn digest(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher
        .finalize()
        .iter()
        .take(DIGEST_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
