//! Consent instance configuration

use serde::{Deserialize, Serialize};

use crate::error::{ConsentError, Result};

/// Per-instance configuration supplied at registration.
///
/// Parsed from the page's JSON consent config; keys this engine does not
/// use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    /// Endpoint notified with a POST when the consent decision changes.
    /// No request is sent when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update_href: Option<String>,
}

impl InstanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_update_href(mut self, href: impl Into<String>) -> Self {
        self.on_update_href = Some(href.into());
        self
    }

    /// Parse a JSON config object.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: InstanceConfig = serde_json::from_str(json)
            .map_err(|e| ConsentError::Config(format!("invalid instance config: {}", e)))?;
        if let Some(href) = &config.on_update_href {
            if href.trim().is_empty() {
                return Err(ConsentError::Config(
                    "onUpdateHref must not be empty".to_string(),
                ));
            }
        }
        Ok(config)
    }
}
