//! Data model for the prioritizer
//!
//! Records, scoring schemes, weight configurations, remote card types, and
//! the snapshot blob exchanged with storage collaborators.

mod record;
mod remote;
mod scheme;
mod snapshot;
mod weights;

pub use record::{RecordId, RecordPatch, UseCaseRecord};
pub use remote::{Board, BoardList, RemoteCard, RemoteRef};
pub use scheme::{FactorRole, FactorSpec, ScoringScheme};
pub use snapshot::Snapshot;
pub use weights::WeightConfig;
