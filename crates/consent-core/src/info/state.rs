//! Consent state codes

use serde::{Deserialize, Serialize};

/// The recorded consent decision for one instance.
///
/// Codes are stable: they are persisted in the store and passed around by
/// callers holding raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i64", from = "i64")]
#[repr(u8)]
pub enum ConsentState {
    Accepted = 1,
    Rejected = 2,
    Dismissed = 3,
    NotRequired = 4,
    #[default]
    Unknown = 5,
}

impl ConsentState {
    /// All valid states, in code order.
    pub const ALL: [ConsentState; 5] = [
        ConsentState::Accepted,
        ConsentState::Rejected,
        ConsentState::Dismissed,
        ConsentState::NotRequired,
        ConsentState::Unknown,
    ];

    /// Map a raw code to a state. Out-of-range codes become `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ConsentState::Accepted,
            2 => ConsentState::Rejected,
            3 => ConsentState::Dismissed,
            4 => ConsentState::NotRequired,
            _ => ConsentState::Unknown,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    /// Accepted and rejected are decisive: once recorded they are not
    /// downgraded by a non-decisive observation.
    pub fn is_decisive(self) -> bool {
        matches!(self, ConsentState::Accepted | ConsentState::Rejected)
    }

    /// The externally visible decision: `Some(true)` for accepted,
    /// `Some(false)` for rejected, `None` otherwise.
    pub fn as_decision(self) -> Option<bool> {
        match self {
            ConsentState::Accepted => Some(true),
            ConsentState::Rejected => Some(false),
            _ => None,
        }
    }
}

impl From<i64> for ConsentState {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<i32> for ConsentState {
    fn from(code: i32) -> Self {
        Self::from_code(i64::from(code))
    }
}

impl From<ConsentState> for i64 {
    fn from(state: ConsentState) -> Self {
        state.code()
    }
}

impl std::fmt::Display for ConsentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConsentState::Accepted => "accepted",
            ConsentState::Rejected => "rejected",
            ConsentState::Dismissed => "dismissed",
            ConsentState::NotRequired => "not_required",
            ConsentState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
