//! Consent info model
//!
//! A [`ConsentInfo`] is the value tracked per consent instance: a state code,
//! an optional consent string and a dirty flag marking values that are not
//! yet known to be durable.
//!
//! [`merge`] combines a newly observed value with the held one:
//!
//! - accepted/rejected always win; other states only replace a non-decisive
//!   old state
//! - a defined string always wins (the empty string included); an undefined
//!   string keeps the old one

mod state;
mod store_value;

pub use state::ConsentState;
pub use store_value::{compose, decompose, DecodeError};

/// One consent instance's value.
///
/// Equality compares state and string only; the dirty flag is bookkeeping
/// and is ignored.
#[derive(Debug, Clone, Default, Eq)]
pub struct ConsentInfo {
    pub consent_state: ConsentState,
    /// `None` means no string is known. `Some("")` is an explicit clear.
    pub consent_string: Option<String>,
    pub is_dirty: bool,
}

impl ConsentInfo {
    /// Build a clean value. Integer codes outside the valid range become
    /// [`ConsentState::Unknown`].
    pub fn new(state: impl Into<ConsentState>, consent_string: Option<String>) -> Self {
        Self {
            consent_state: state.into(),
            consent_string,
            is_dirty: false,
        }
    }

    /// The `{Unknown, None}` value used when nothing is known.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn with_dirty(mut self, is_dirty: bool) -> Self {
        self.is_dirty = is_dirty;
        self
    }

    /// Structural equality over state and string.
    pub fn equals(&self, other: &ConsentInfo) -> bool {
        self.consent_state == other.consent_state && self.consent_string == other.consent_string
    }
}

impl PartialEq for ConsentInfo {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Merge `new_info` into `old_info`.
///
/// The result is dirty iff it differs from `old_info`.
pub fn merge(new_info: &ConsentInfo, old_info: &ConsentInfo) -> ConsentInfo {
    let consent_state = if new_info.consent_state.is_decisive()
        || !old_info.consent_state.is_decisive()
    {
        new_info.consent_state
    } else {
        old_info.consent_state
    };

    let consent_string = match &new_info.consent_string {
        Some(s) => Some(s.clone()),
        None => old_info.consent_string.clone(),
    };

    let merged = ConsentInfo::new(consent_state, consent_string);
    let changed = !merged.equals(old_info);
    merged.with_dirty(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info(state: ConsentState, s: Option<&str>) -> ConsentInfo {
        ConsentInfo::new(state, s.map(str::to_string))
    }

    #[test]
    fn test_new_normalizes_invalid_code() {
        let value = ConsentInfo::new(-1i32, Some("x".to_string()));
        assert_eq!(value.consent_state, ConsentState::Unknown);
        assert_eq!(value.consent_string.as_deref(), Some("x"));
        assert!(!value.is_dirty);
    }

    #[test]
    fn test_equality_ignores_dirty_flag() {
        let a = info(ConsentState::Accepted, Some("a"));
        let b = a.clone().with_dirty(true);
        assert!(a.equals(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_distinguishes_empty_and_missing_string() {
        assert_ne!(
            info(ConsentState::Accepted, None),
            info(ConsentState::Accepted, Some(""))
        );
    }

    #[test]
    fn test_decisive_state_overrides_anything() {
        for old in ConsentState::ALL {
            for new in [ConsentState::Accepted, ConsentState::Rejected] {
                let merged = merge(&info(new, None), &info(old, None));
                assert_eq!(merged.consent_state, new);
            }
        }
    }

    #[test]
    fn test_non_decisive_state_cannot_downgrade() {
        for old in [ConsentState::Accepted, ConsentState::Rejected] {
            for new in [
                ConsentState::Unknown,
                ConsentState::Dismissed,
                ConsentState::NotRequired,
            ] {
                let merged = merge(&info(new, None), &info(old, None));
                assert_eq!(merged.consent_state, old);
                assert!(!merged.is_dirty);
            }
        }
    }

    #[test]
    fn test_non_decisive_state_replaces_non_decisive() {
        let merged = merge(
            &info(ConsentState::NotRequired, None),
            &info(ConsentState::Dismissed, None),
        );
        assert_eq!(merged.consent_state, ConsentState::NotRequired);
        assert!(merged.is_dirty);
    }

    #[test]
    fn test_defined_string_overrides() {
        let merged = merge(
            &info(ConsentState::Dismissed, Some("new")),
            &info(ConsentState::Accepted, Some("old")),
        );
        assert_eq!(merged, info(ConsentState::Accepted, Some("new")));
        assert!(merged.is_dirty);

        let cleared = merge(
            &info(ConsentState::Accepted, Some("")),
            &info(ConsentState::Accepted, Some("old")),
        );
        assert_eq!(cleared, info(ConsentState::Accepted, Some("")));
        assert!(cleared.is_dirty);
    }

    #[test]
    fn test_missing_string_keeps_old() {
        let merged = merge(
            &info(ConsentState::Rejected, None),
            &info(ConsentState::Accepted, Some("old")),
        );
        assert_eq!(merged, info(ConsentState::Rejected, Some("old")));
    }

    #[test]
    fn test_identical_merge_is_clean() {
        let old = info(ConsentState::Accepted, Some("s"));
        let merged = merge(&old.clone(), &old);
        assert_eq!(merged, old);
        assert!(!merged.is_dirty);
    }
}
