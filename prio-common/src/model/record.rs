//! Use-case records

use super::remote::RemoteRef;
use super::scheme::ScoringScheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Locally-generated opaque record identifier
///
/// Stable for the life of the record and never reused. Never sent to the
/// remote system; only `RemoteRef` identifiers cross that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short human-readable form, used as the temporary reference token in
    /// freshly created card descriptions until the remote short link exists.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One backlog item
///
/// The local record is the source of truth for factor values and text; any
/// linked remote card is a projection that may legitimately lag behind.
/// `score`, `effort`, and `value` are derived on read and never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub notes: String,
    /// Factor values keyed by scheme factor key
    #[serde(default)]
    pub factors: BTreeMap<String, u8>,
    /// Transient UI/operation flag, never persisted
    #[serde(skip)]
    pub selected: bool,
    /// True when the record originated from, or has been pushed to, the board
    #[serde(default)]
    pub imported: bool,
    /// Ownership link to a remote card, present only for imported/pushed rows
    #[serde(default)]
    pub remote: Option<RemoteRef>,
}

impl UseCaseRecord {
    /// New blank record with scheme-default factor values
    pub fn new(name: impl Into<String>, notes: impl Into<String>, scheme: &ScoringScheme) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            owner: String::new(),
            notes: notes.into(),
            factors: scheme.default_factors(),
            selected: false,
            imported: false,
            remote: None,
        }
    }

    /// Factor value with scheme-default fallback
    pub fn factor(&self, scheme: &ScoringScheme, key: &str) -> u8 {
        self.factors
            .get(key)
            .copied()
            .or_else(|| scheme.factor(key).map(|f| f.default))
            .unwrap_or(0)
    }
}

/// Whole-record patch: present fields replace, absent fields are preserved
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub owner: Option<String>,
    pub notes: Option<String>,
    /// Factor updates merged key-by-key into the existing map
    pub factors: BTreeMap<String, u8>,
}

impl RecordPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn factor(mut self, key: &str, value: u8) -> Self {
        self.factors.insert(key.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_gets_scheme_defaults() {
        let scheme = ScoringScheme::weighted();
        let r = UseCaseRecord::new("Triage", "", &scheme);
        assert_eq!(r.factors.get("impact"), Some(&3));
        assert_eq!(r.factors.len(), scheme.factors.len());
        assert!(!r.selected);
        assert!(r.remote.is_none());
    }

    #[test]
    fn test_record_ids_are_unique() {
        assert_ne!(RecordId::new(), RecordId::new());
    }

    #[test]
    fn test_short_id_is_eight_chars() {
        assert_eq!(RecordId::new().short().len(), 8);
    }

    #[test]
    fn test_selected_not_serialized() {
        let scheme = ScoringScheme::weighted();
        let mut r = UseCaseRecord::new("Triage", "", &scheme);
        r.selected = true;
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("selected"));
        let back: UseCaseRecord = serde_json::from_str(&json).unwrap();
        assert!(!back.selected);
    }
}
