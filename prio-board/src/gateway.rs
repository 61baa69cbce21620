//! Card gateway seam
//!
//! The remote board is modeled only through the narrow capability set
//! {list, create, update, move-to-top}. Everything above this trait works
//! against it, so the reconciler and order-synchronizer test suites run on a
//! recording double and never touch the network.

use async_trait::async_trait;
use prio_common::model::{Board, BoardList, RemoteCard};
use thiserror::Error;

/// Card gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<GatewayError> for prio_common::Error {
    fn from(e: GatewayError) -> Self {
        prio_common::Error::RemoteCall(e.to_string())
    }
}

/// Request body for card creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCard {
    pub list_id: String,
    pub name: String,
    pub desc: String,
    /// When set, the remote duplicates this card instead of creating a blank
    /// one (the copy-fallback path)
    pub source_card_id: Option<String>,
}

/// Partial update for an existing card; None fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCard {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub list_id: Option<String>,
}

/// Narrow remote card API
///
/// All operations are request/response; there are no subscriptions and no
/// transactional guarantees across calls.
#[async_trait]
pub trait CardGateway: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError>;

    async fn list_lists(&self, board_id: &str) -> Result<Vec<BoardList>, GatewayError>;

    async fn list_cards(&self, list_id: &str) -> Result<Vec<RemoteCard>, GatewayError>;

    async fn create_card(&self, req: CreateCard) -> Result<RemoteCard, GatewayError>;

    async fn update_card(&self, card_id: &str, req: UpdateCard)
        -> Result<RemoteCard, GatewayError>;

    /// Move a card to the top of its list; the only ordering primitive the
    /// remote exposes
    async fn move_card_to_top(&self, card_id: &str) -> Result<(), GatewayError>;
}
