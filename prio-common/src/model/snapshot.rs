//! Snapshot blob exchanged with storage collaborators
//!
//! A snapshot is the whole document: records, weights, and the theme flag.
//! Writes are full-document replace, not field-level patches.

use super::record::UseCaseRecord;
use super::weights::WeightConfig;
use serde::{Deserialize, Deserializer, Serialize};

/// The persisted document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub rows: Vec<UseCaseRecord>,
    /// The storage service writes an explicit `weights: null` into the
    /// never-saved sentinel document, so null must read as the default.
    #[serde(default, deserialize_with = "weights_or_default")]
    pub weights: WeightConfig,
    #[serde(default)]
    pub dark: bool,
}

fn weights_or_default<'de, D>(deserializer: D) -> Result<WeightConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<WeightConfig>::deserialize(deserializer)?.unwrap_or_default())
}

impl Snapshot {
    /// An empty snapshot is the storage backend's "no document yet" sentinel;
    /// it must not overwrite local state on load.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.weights.is_empty()
    }
}
