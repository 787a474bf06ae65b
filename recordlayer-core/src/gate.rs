//! Per-record change gate for write minimization.
//!
//! A [`ChangeGate`] travels inside the record document it belongs to and
//! remembers the digest of the record's comparable view as of the last write,
//! plus the time the record content was last verified against external state.
//! The repository update path consults the gate to tell a real content change
//! apart from an idempotent re-save, and suppresses the modification stamp
//! for the latter.
//!
//! A record opts into gating by carrying a gate at construction time (see
//! [`crate::record::Record::change_gate`]); records without one are treated
//! as always-changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalValue;
use crate::checksum::Checksum;

/// Stored digest and verification state for one record.
///
/// Owned exclusively by the record it is embedded in and mutated only through
/// the record's own lifecycle calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeGate {
    /// Digest of the comparable view as of the last insert or content change.
    #[serde(default)]
    pub checksum: String,
    /// When the record content was last verified; `None` forces the next
    /// verification sweep to pick the record up.
    #[serde(default)]
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl ChangeGate {
    /// Creates a gate with no stored digest and verification pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the digest stored at the last insert or content change.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// True while the record awaits verification.
    pub fn needs_verification(&self) -> bool {
        self.last_verified_at.is_none()
    }

    /// Records a successful verification at the current time.
    pub fn mark_verified(&mut self) {
        self.last_verified_at = Some(Utc::now());
    }

    /// Unsets the verification stamp, forcing re-verification on the next
    /// check.
    pub fn clear_verification(&mut self) {
        self.last_verified_at = None;
    }

    /// Insert-path protocol: stores the digest of the initial view and leaves
    /// the record unverified so the next verification sweep includes it.
    ///
    /// An empty view stores the empty digest string, which disables gating
    /// until the record grows comparable content.
    pub fn prime(&mut self, view: &CanonicalValue) {
        self.checksum = if view.is_empty() {
            String::new()
        } else {
            Checksum::md5(view)
        };
        self.last_verified_at = None;
    }

    /// Update-path protocol: compares the digest of `view` against the stored
    /// one and reports whether the record content meaningfully changed.
    ///
    /// On change the new digest is stored and verification is cleared. An
    /// empty view disables gating and always reports a change, so callers
    /// never suppress a write they cannot prove redundant.
    pub fn observe(&mut self, view: &CanonicalValue) -> bool {
        if view.is_empty() {
            return true;
        }

        let digest = Checksum::md5(view);
        if digest == self.checksum {
            return false;
        }

        self.checksum = digest;
        self.last_verified_at = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str) -> CanonicalValue {
        [("name".to_string(), CanonicalValue::from(name))]
            .into_iter()
            .collect()
    }

    #[test]
    fn prime_stores_digest_and_leaves_unverified() {
        let mut gate = ChangeGate::new();
        gate.mark_verified();
        gate.prime(&view("alice"));

        assert_eq!(gate.checksum(), &Checksum::md5(&view("alice")));
        assert!(gate.needs_verification());
    }

    #[test]
    fn identical_view_reports_no_change_and_keeps_verification() {
        let mut gate = ChangeGate::new();
        gate.prime(&view("alice"));
        gate.mark_verified();

        assert!(!gate.observe(&view("alice")));
        assert!(!gate.needs_verification());
    }

    #[test]
    fn changed_view_updates_digest_and_clears_verification() {
        let mut gate = ChangeGate::new();
        gate.prime(&view("alice"));
        gate.mark_verified();

        assert!(gate.observe(&view("bob")));
        assert_eq!(gate.checksum(), &Checksum::md5(&view("bob")));
        assert!(gate.needs_verification());
    }

    #[test]
    fn empty_view_disables_gating() {
        let mut gate = ChangeGate::new();
        gate.prime(&CanonicalValue::Null);

        assert_eq!(gate.checksum(), "");
        assert!(gate.observe(&CanonicalValue::Null));
        assert!(gate.observe(&CanonicalValue::Null));
    }
}
