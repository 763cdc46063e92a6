//! Remote update request contract
//!
//! When an instance's externally visible decision changes, the configured
//! `onUpdateHref` endpoint receives a credentialed POST:
//!
//! ```json
//! {
//!   "method": "POST",
//!   "credentials": "include",
//!   "body": {"consentInstanceId": "test", "consentState": true, "consentString": "abc"}
//! }
//! ```
//!
//! `consentState` and `consentString` are omitted when they carry no value.
//! The response is never consumed.

use std::sync::Arc;

use async_trait::async_trait;
use consent_core::{ConsentInfo, ConsentState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a [`ConsentTransport`].
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The request could not be sent
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The endpoint answered with a failure status
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Credentials {
    Include,
}

/// Body of an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestBody {
    pub consent_instance_id: String,
    /// `true` for accepted, `false` for rejected, absent otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_state: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_string: Option<String>,
}

impl UpdateRequestBody {
    pub fn from_info(instance_id: &str, info: &ConsentInfo) -> Self {
        Self {
            consent_instance_id: instance_id.to_string(),
            consent_state: info.consent_state.as_decision(),
            consent_string: info.consent_string.clone(),
        }
    }
}

/// Request options, shaped like a fetch init object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInit {
    pub method: Method,
    pub credentials: Credentials,
    pub body: UpdateRequestBody,
}

impl RequestInit {
    /// A credentialed POST carrying `body`.
    pub fn post(body: UpdateRequestBody) -> Self {
        Self {
            method: Method::Post,
            credentials: Credentials::Include,
            body,
        }
    }
}

/// Sends update requests. Fire-and-forget from the engine's point of view.
#[async_trait]
pub trait ConsentTransport: Send + Sync {
    async fn post(&self, url: &str, init: RequestInit) -> Result<(), TransportError>;
}

pub type SharedTransport = Arc<dyn ConsentTransport>;

/// Transport that drops every request. Used when the embedder has no
/// update endpoint at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransport;

#[async_trait]
impl ConsentTransport for NoopTransport {
    async fn post(&self, _url: &str, _init: RequestInit) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Whether moving from `previous` to `next` changes what the update
/// endpoint should know.
///
/// True when the new decision is accepted/rejected and differs from the
/// previous decision, or when a new defined string was recorded while the
/// state is accepted, rejected or dismissed.
pub fn should_notify(previous: &ConsentInfo, next: &ConsentInfo) -> bool {
    let decision = next.consent_state.as_decision();
    if decision.is_some() && decision != previous.consent_state.as_decision() {
        return true;
    }

    let string_changed =
        next.consent_string.is_some() && next.consent_string != previous.consent_string;
    let reportable_state = matches!(
        next.consent_state,
        ConsentState::Accepted | ConsentState::Rejected | ConsentState::Dismissed
    );
    string_changed && reportable_state
}
