//! Opaque token payloads.
//!
//! The engine carries `payload` as an uninterpreted string; typed encode and
//! decode helpers live here so call sites can layer structure on top per
//! token type. Decoding is deliberately forgiving: a malformed payload
//! degrades to `None` (the token renders with its raw display text), it
//! never aborts a render or parse pass.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Content, Run};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("run carries no payload")]
    Missing,
    #[error("payload failed to encode: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("payload failed to decode: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a typed payload into its opaque string form.
pub fn encode<T: Serialize>(value: &T) -> Result<String, PayloadError> {
    serde_json::to_string(value).map_err(PayloadError::Encode)
}

impl Run {
    /// Decode the payload, or `None` when absent or malformed.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Option<T> {
        match self.try_decode_payload() {
            Ok(value) => Some(value),
            Err(PayloadError::Missing) => None,
            Err(err) => {
                tracing::debug!(
                    target: "content.payload",
                    token_type = self.token_type(),
                    data = self.data(),
                    error = %err,
                    "payload decode failed"
                );
                None
            }
        }
    }

    /// Decode the payload, surfacing the failure cause.
    pub fn try_decode_payload<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        let raw = self.payload().ok_or(PayloadError::Missing)?;
        serde_json::from_str(raw).map_err(PayloadError::Decode)
    }
}

impl Content {
    /// Fill in missing payloads for every token of `token_type` from a
    /// `data -> payload` map. Tokens that already carry a non-empty payload
    /// are left alone; when nothing changes the original content is
    /// returned untouched.
    ///
    /// Use case: a server round-trip only preserves `type + data +
    /// displayText`, and the business layer wants token views to see the
    /// richer fields again.
    pub fn backfill_payload(
        &self,
        token_type: &str,
        payload_by_data: &HashMap<String, String>,
    ) -> Content {
        if self.runs.is_empty() {
            return self.clone();
        }
        let mut changed = false;
        let runs = self
            .runs
            .iter()
            .map(|run| {
                if !run.is_token() || run.token_type() != token_type {
                    return run.clone();
                }
                if run.payload().is_some_and(|p| !p.is_empty()) {
                    return run.clone();
                }
                match payload_by_data.get(run.data()) {
                    Some(payload) if !payload.is_empty() => {
                        changed = true;
                        run.clone().with_payload(Some(payload.clone()))
                    }
                    _ => run.clone(),
                }
            })
            .collect();
        if changed { Content::new(runs) } else { self.clone() }
    }

    /// Typed variant of [`Self::backfill_payload`]: values are serde-encoded
    /// into the opaque string form first. Values that fail to encode are
    /// skipped.
    pub fn backfill_payload_typed<T: Serialize>(
        &self,
        token_type: &str,
        payload_by_data: &HashMap<String, T>,
    ) -> Content {
        let encoded: HashMap<String, String> = payload_by_data
            .iter()
            .filter_map(|(data, value)| Some((data.clone(), encode(value).ok()?)))
            .collect();
        self.backfill_payload(token_type, &encoded)
    }
}
