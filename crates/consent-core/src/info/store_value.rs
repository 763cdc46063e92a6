//! Durable store encoding for [`ConsentInfo`]
//!
//! Stored values are JSON:
//!
//! ```text
//! absent / null                              -> {Unknown, None}
//! true | false                               -> {Accepted | Rejected, None}   (legacy)
//! {"consentState": 1, "consentString": "s"}  -> {Accepted, Some("s")}
//! ```
//!
//! Writers only ever produce the record form.

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::{ConsentInfo, ConsentState};

pub const CONSENT_STATE_KEY: &str = "consentState";
pub const CONSENT_STRING_KEY: &str = "consentString";

/// A stored value whose shape is not one of the known encodings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Invalid stored consent value: {0}")]
    Unrecognized(Value),
}

#[derive(Deserialize)]
struct StoredRecord {
    #[serde(rename = "consentState")]
    consent_state: Number,
    #[serde(rename = "consentString", default)]
    consent_string: Option<String>,
}

/// Encode a value for the store. The dirty flag is not persisted.
pub fn compose(info: &ConsentInfo) -> Value {
    let mut record = Map::new();
    record.insert(
        CONSENT_STATE_KEY.to_string(),
        Value::from(info.consent_state.code()),
    );
    if let Some(consent_string) = &info.consent_string {
        record.insert(
            CONSENT_STRING_KEY.to_string(),
            Value::String(consent_string.clone()),
        );
    }
    Value::Object(record)
}

/// Decode a stored value. `None` (nothing stored) decodes to unknown.
pub fn decompose(value: Option<&Value>) -> Result<ConsentInfo, DecodeError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(ConsentInfo::unknown()),
        Some(value) => value,
    };

    match value {
        Value::Bool(true) => Ok(ConsentInfo::new(ConsentState::Accepted, None)),
        Value::Bool(false) => Ok(ConsentInfo::new(ConsentState::Rejected, None)),
        Value::Object(_) => {
            let record = StoredRecord::deserialize(value)
                .map_err(|_| DecodeError::Unrecognized(value.clone()))?;
            // Non-integral or out-of-range numbers are not valid codes.
            let consent_state = record
                .consent_state
                .as_i64()
                .map_or(ConsentState::Unknown, ConsentState::from_code);
            Ok(ConsentInfo::new(consent_state, record.consent_string))
        }
        _ => Err(DecodeError::Unrecognized(value.clone())),
    }
}
