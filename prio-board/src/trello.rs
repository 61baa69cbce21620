//! Trello card gateway
//!
//! Implements `CardGateway` against the Trello REST API. Authentication is
//! key/token query parameters on every request; responses are plain JSON.

use crate::gateway::{CardGateway, CreateCard, GatewayError, UpdateCard};
use async_trait::async_trait;
use prio_common::model::{Board, BoardList, RemoteCard};
use serde::de::DeserializeOwned;
use std::time::Duration;

const TRELLO_BASE_URL: &str = "https://api.trello.com/1";
const USER_AGENT: &str = concat!("prio-board/", env!("CARGO_PKG_VERSION"));

/// Trello API client
pub struct TrelloGateway {
    http_client: reqwest::Client,
    base_url: String,
    key: String,
    token: String,
}

impl TrelloGateway {
    pub fn new(key: String, token: String) -> Result<Self, GatewayError> {
        Self::with_base_url(TRELLO_BASE_URL.to_string(), key, token)
    }

    /// Point the client at a different base URL (proxy or test server)
    pub fn with_base_url(
        base_url: String,
        key: String,
        token: String,
    ) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            key,
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}/{path}", self.base_url))
            .query(&[("key", self.key.as_str()), ("token", self.token.as_str())])
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CardGateway for TrelloGateway {
    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError> {
        tracing::debug!("Listing boards");
        let req = self
            .request(reqwest::Method::GET, "members/me/boards")
            .query(&[("fields", "name")]);
        self.execute(req).await
    }

    async fn list_lists(&self, board_id: &str) -> Result<Vec<BoardList>, GatewayError> {
        tracing::debug!(board_id = %board_id, "Listing lists");
        let req = self
            .request(reqwest::Method::GET, &format!("boards/{board_id}/lists"))
            .query(&[("fields", "name")]);
        self.execute(req).await
    }

    async fn list_cards(&self, list_id: &str) -> Result<Vec<RemoteCard>, GatewayError> {
        tracing::debug!(list_id = %list_id, "Listing cards");
        let req = self.request(reqwest::Method::GET, &format!("lists/{list_id}/cards"));
        self.execute(req).await
    }

    async fn create_card(&self, req: CreateCard) -> Result<RemoteCard, GatewayError> {
        let mut request = self
            .request(reqwest::Method::POST, "cards")
            .query(&[
                ("idList", req.list_id.as_str()),
                ("name", req.name.as_str()),
                ("desc", req.desc.as_str()),
            ]);
        if let Some(source) = &req.source_card_id {
            // Duplicate the existing card; name/desc above still win.
            request = request.query(&[("idCardSource", source.as_str())]);
        }
        let card: RemoteCard = self.execute(request).await?;
        tracing::info!(
            card_id = %card.id,
            short_link = card.short_link.as_deref().unwrap_or("-"),
            copied = req.source_card_id.is_some(),
            "Created card"
        );
        Ok(card)
    }

    async fn update_card(
        &self,
        card_id: &str,
        req: UpdateCard,
    ) -> Result<RemoteCard, GatewayError> {
        let mut request = self.request(reqwest::Method::PUT, &format!("cards/{card_id}"));
        if let Some(name) = &req.name {
            request = request.query(&[("name", name.as_str())]);
        }
        if let Some(desc) = &req.desc {
            request = request.query(&[("desc", desc.as_str())]);
        }
        if let Some(list_id) = &req.list_id {
            request = request.query(&[("idList", list_id.as_str())]);
        }
        let card: RemoteCard = self.execute(request).await?;
        tracing::info!(card_id = %card_id, "Updated card");
        Ok(card)
    }

    async fn move_card_to_top(&self, card_id: &str) -> Result<(), GatewayError> {
        let req = self
            .request(reqwest::Method::PUT, &format!("cards/{card_id}"))
            .query(&[("pos", "top")]);
        let _: serde_json::Value = self.execute(req).await?;
        tracing::debug!(card_id = %card_id, "Moved card to top");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(TrelloGateway::new("k".into(), "t".into()).is_ok());
    }

    #[test]
    fn test_request_carries_credentials() {
        let gw = TrelloGateway::new("mykey".into(), "mytoken".into()).unwrap();
        let req = gw
            .request(reqwest::Method::GET, "members/me/boards")
            .build()
            .unwrap();
        let url = req.url().as_str();
        assert!(url.starts_with("https://api.trello.com/1/members/me/boards"));
        assert!(url.contains("key=mykey"));
        assert!(url.contains("token=mytoken"));
    }

    #[test]
    fn test_query_values_are_percent_encoded() {
        let gw = TrelloGateway::new("k".into(), "t".into()).unwrap();
        let req = gw
            .request(reqwest::Method::POST, "cards")
            .query(&[("name", "a b&c")])
            .build()
            .unwrap();
        assert!(req.url().as_str().contains("name=a+b%26c"));
    }
}
