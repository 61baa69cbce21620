//! Remote board entities
//!
//! Wire shapes for the card API (Trello field names preserved in serde
//! renames) plus the local ownership link to a remote card.

use serde::{Deserialize, Serialize};

/// Ownership link from a local record to a previously created remote card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRef {
    /// Long-lived card id, stable for the card's lifetime
    pub card_id: String,
    /// Short numeric id, assigned at creation where available
    #[serde(default)]
    pub short_id: Option<i64>,
    /// Short human-meaningful link token, assigned at creation
    #[serde(default)]
    pub short_link: Option<String>,
}

impl RemoteRef {
    pub fn new(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            short_id: None,
            short_link: None,
        }
    }

    /// Best identifier for embedding in a card description: the short link
    /// when the remote assigned one, otherwise the card id.
    pub fn ref_token(&self) -> &str {
        self.short_link.as_deref().unwrap_or(&self.card_id)
    }
}

/// Remote board (external entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
}

/// List within a remote board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub name: String,
}

/// Remote card (external entity, not owned by this system)
///
/// The description is user-edited free text and doubles as the transport for
/// the embedded metadata line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCard {
    pub id: String,
    #[serde(rename = "idShort", default)]
    pub short_id: Option<i64>,
    #[serde(rename = "shortLink", default)]
    pub short_link: Option<String>,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "idList", default)]
    pub list_id: String,
    /// Remote-owned position within the list
    #[serde(default)]
    pub pos: Option<f64>,
}

impl RemoteCard {
    /// The ownership link a local record should carry for this card
    pub fn to_ref(&self) -> RemoteRef {
        RemoteRef {
            card_id: self.id.clone(),
            short_id: self.short_id,
            short_link: self.short_link.clone(),
        }
    }
}
