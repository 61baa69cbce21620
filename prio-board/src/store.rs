//! In-memory record store
//!
//! Owns the ordered record collection, the weight config, and the theme
//! flag. No I/O: every mutation publishes an `AppEvent` and the persistence
//! coordinator mirrors the store from the other side of the bus.
//!
//! The store also owns the remote-card index that keeps the "at most one
//! record per remote card" invariant: imports that collide on a card id
//! update the existing record in place, and `attach_remote` refuses to link
//! a card that a different record already owns.

use prio_common::codec;
use prio_common::events::{AppEvent, EventBus};
use prio_common::model::{
    RecordId, RecordPatch, RemoteCard, RemoteRef, ScoringScheme, Snapshot, UseCaseRecord,
    WeightConfig,
};
use prio_common::scoring::{self, Scored};
use prio_common::{Error, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// A record joined with its derived metrics for display
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: UseCaseRecord,
    pub score: u8,
    pub effort: f64,
    pub value: f64,
    /// Interpolated `#RRGGBB` score color
    pub color: String,
}

/// Sort key for display projections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Score,
    Name,
    Owner,
    Effort,
    Value,
    /// Sort on a raw factor value
    Factor(String),
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "score" => SortKey::Score,
            "name" => SortKey::Name,
            "owner" => SortKey::Owner,
            "effort" => SortKey::Effort,
            "value" => SortKey::Value,
            other => SortKey::Factor(other.to_string()),
        })
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordered collection of use-case records
pub struct RecordStore {
    records: Vec<UseCaseRecord>,
    /// remote card id -> owning record
    remote_index: HashMap<String, RecordId>,
    scheme: ScoringScheme,
    weights: WeightConfig,
    dark: bool,
    bus: EventBus,
}

impl RecordStore {
    pub fn new(scheme: ScoringScheme, bus: EventBus) -> Self {
        let weights = WeightConfig::default_for(&scheme);
        Self {
            records: Vec::new(),
            remote_index: HashMap::new(),
            scheme,
            weights,
            dark: false,
            bus,
        }
    }

    pub fn scheme(&self) -> &ScoringScheme {
        &self.scheme
    }

    pub fn weights(&self) -> &WeightConfig {
        &self.weights
    }

    pub fn dark(&self) -> bool {
        self.dark
    }

    pub fn records(&self) -> &[UseCaseRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&UseCaseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: RecordId) -> Result<&mut UseCaseRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::Validation(format!("unknown record {id}")))
    }

    // ========================================
    // Mutation
    // ========================================

    /// Insert a record at the top of the backlog
    pub fn add(&mut self, record: UseCaseRecord) -> RecordId {
        let id = record.id;
        if let Some(remote) = &record.remote {
            self.remote_index.insert(remote.card_id.clone(), id);
        }
        self.records.insert(0, record);
        self.bus.emit(AppEvent::RecordAdded { record_id: id });
        id
    }

    /// New blank record with scheme defaults, inserted at the top
    pub fn add_blank(&mut self) -> RecordId {
        self.add(UseCaseRecord::new("New Use Case", "", &self.scheme))
    }

    /// Whole-record patch: present fields replace, absent fields survive.
    /// Factor updates are clamped into scheme ranges; unknown keys dropped.
    pub fn patch(&mut self, id: RecordId, patch: RecordPatch) -> Result<()> {
        let scheme = self.scheme.clone();
        let record = self.get_mut(id)?;
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(owner) = patch.owner {
            record.owner = owner;
        }
        if let Some(notes) = patch.notes {
            record.notes = notes;
        }
        for (key, value) in patch.factors {
            if let Some(spec) = scheme.factor(&key) {
                record.factors.insert(key, spec.clamp(value));
            }
        }
        self.bus.emit(AppEvent::RecordUpdated { record_id: id });
        Ok(())
    }

    /// Flip the transient selection flag; never touches factor data
    pub fn set_selected(&mut self, id: RecordId, selected: bool) -> Result<()> {
        let record = self.get_mut(id)?;
        record.selected = selected;
        self.bus.emit(AppEvent::SelectionChanged {
            record_id: id,
            selected,
        });
        Ok(())
    }

    /// Remove a record locally. The linked remote card, if any, survives.
    pub fn remove(&mut self, id: RecordId) -> Result<()> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::Validation(format!("unknown record {id}")))?;
        let removed = self.records.remove(pos);
        if let Some(remote) = &removed.remote {
            self.remote_index.remove(&remote.card_id);
        }
        self.bus.emit(AppEvent::RecordRemoved { record_id: id });
        Ok(())
    }

    /// Set one factor weight
    pub fn set_weight(&mut self, key: &str, weight: f64) {
        self.weights.set(key, weight);
        self.bus.emit(AppEvent::WeightsChanged {
            key: key.to_string(),
            weight,
        });
    }

    pub fn set_dark(&mut self, dark: bool) {
        self.dark = dark;
        self.bus.emit(AppEvent::ThemeChanged { dark });
    }

    // ========================================
    // Remote linkage
    // ========================================

    /// Link a record to a remote card
    ///
    /// Any previous link owned by this record is released first. Linking a
    /// card that a *different* record owns is refused; that invariant is what
    /// prevents two records from shadowing one card.
    pub fn attach_remote(&mut self, id: RecordId, remote: RemoteRef) -> Result<()> {
        if let Some(owner) = self.remote_index.get(&remote.card_id) {
            if *owner != id {
                return Err(Error::Validation(format!(
                    "card {} already linked to record {owner}",
                    remote.card_id
                )));
            }
        }
        let record = self.get_mut(id)?;
        if let Some(old) = record.remote.take() {
            self.remote_index.remove(&old.card_id);
        }
        self.remote_index.insert(remote.card_id.clone(), id);
        let record = self.get_mut(id)?;
        record.remote = Some(remote);
        record.imported = true;
        self.bus.emit(AppEvent::RecordUpdated { record_id: id });
        Ok(())
    }

    /// Materialize a record from a remote card
    ///
    /// Factor values are decoded from the card description, falling back to
    /// scheme defaults when the marker is missing or corrupt. A card id that
    /// is already linked updates the existing record in place instead of
    /// inserting a duplicate.
    pub fn add_imported(&mut self, card: &RemoteCard) -> RecordId {
        let factors = match codec::decode(&card.desc) {
            Some(meta) => self.scheme.sanitize(&meta.factors),
            None => self.scheme.default_factors(),
        };
        let notes = codec::strip(&card.desc);
        let name = if card.name.is_empty() {
            "Card".to_string()
        } else {
            card.name.clone()
        };

        if let Some(&existing) = self.remote_index.get(&card.id) {
            // Remote card changed out from under us; the import overwrites.
            if let Ok(record) = self.get_mut(existing) {
                record.name = name;
                record.notes = notes;
                record.factors = factors;
                record.remote = Some(card.to_ref());
                record.imported = true;
            }
            self.bus.emit(AppEvent::RecordUpdated {
                record_id: existing,
            });
            return existing;
        }

        let mut record = UseCaseRecord::new(name, notes, &self.scheme);
        record.factors = factors;
        record.remote = Some(card.to_ref());
        record.imported = true;
        self.add(record)
    }

    // ========================================
    // Projections
    // ========================================

    /// Selected records, in display order
    pub fn selected(&self) -> Vec<UseCaseRecord> {
        self.records.iter().filter(|r| r.selected).cloned().collect()
    }

    /// Case-insensitive substring match over name + notes; empty query is
    /// the identity projection.
    pub fn search(&self, query: &str) -> Vec<&UseCaseRecord> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.name.to_lowercase().contains(&needle)
                    || r.notes.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// All records with derived metrics, in insertion order
    pub fn scored(&self) -> Vec<ScoredRecord> {
        self.records
            .iter()
            .map(|r| {
                let Scored {
                    score,
                    effort,
                    value,
                } = scoring::compute(&r.factors, &self.scheme, &self.weights);
                ScoredRecord {
                    record: r.clone(),
                    score,
                    effort,
                    value,
                    color: scoring::score_color(score),
                }
            })
            .collect()
    }

    /// Stable sort projection: string keys compare case-insensitively,
    /// numeric keys numerically; ties keep their prior relative order.
    pub fn sort_view(&self, key: &SortKey, direction: SortDirection) -> Vec<ScoredRecord> {
        let mut view = self.scored();
        view.sort_by(|a, b| {
            let ord = match key {
                SortKey::Score => a.score.cmp(&b.score),
                SortKey::Name => a
                    .record
                    .name
                    .to_lowercase()
                    .cmp(&b.record.name.to_lowercase()),
                SortKey::Owner => a
                    .record
                    .owner
                    .to_lowercase()
                    .cmp(&b.record.owner.to_lowercase()),
                SortKey::Effort => a.effort.total_cmp(&b.effort),
                SortKey::Value => a.value.total_cmp(&b.value),
                SortKey::Factor(k) => {
                    let scheme = &self.scheme;
                    a.record.factor(scheme, k).cmp(&b.record.factor(scheme, k))
                }
            };
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
        view
    }

    // ========================================
    // Snapshots
    // ========================================

    /// Whole-document snapshot for the persistence layer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rows: self.records.clone(),
            weights: self.weights.clone(),
            dark: self.dark,
        }
    }

    /// Replace local state with a loaded snapshot (remote wins on load)
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.records = snapshot.rows;
        self.weights = snapshot.weights;
        self.dark = snapshot.dark;
        self.remote_index = self
            .records
            .iter()
            .filter_map(|r| r.remote.as_ref().map(|rm| (rm.card_id.clone(), r.id)))
            .collect();
        self.bus.emit(AppEvent::SnapshotRestored {
            rows: self.records.len(),
        });
    }
}
