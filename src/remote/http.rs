//! HTTP Board Client
//!
//! reqwest adapter for the board service under `{base_url}/api/v1`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::{json, Value};

use super::credential::CredentialStore;
use super::{wire, RemoteBoard, RemoteError};
use crate::config::ClientConfig;
use crate::domain::{BoardColumn, Config, Item};

pub struct HttpBoardClient {
    http: reqwest::Client,
    api_base: String,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpBoardClient {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status.as_u16(), message))
    }

    async fn get_json(&self, path: &str) -> Result<Value, RemoteError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteBoard for HttpBoardClient {
    async fn fetch_configs(&self, board_id: &str) -> Result<Vec<Config>, RemoteError> {
        let body = self
            .get_json("/integrations/monday/config/barcode")
            .await?;
        wire::decode_configs(board_id, body)
    }

    async fn fetch_items(&self, board_id: &str, limit: usize) -> Result<Vec<Item>, RemoteError> {
        let path = format!("/integrations/monday/boards/{}/items?limit={}", board_id, limit);
        let body = self.get_json(&path).await?;
        let items = wire::decode_items(board_id, body)?;
        log::debug!("Fetched {} items for board {}", items.len(), board_id);
        Ok(items)
    }

    async fn fetch_columns(&self, board_id: &str) -> Result<Vec<BoardColumn>, RemoteError> {
        let path = format!("/integrations/monday/boards/{}/columns", board_id);
        let body = self.get_json(&path).await?;
        wire::decode_columns(body)
    }

    async fn update_barcode(&self, item_id: &str, barcode: &str) -> Result<(), RemoteError> {
        let url = self.url(&format!("/integrations/monday/items/{}/barcode", item_id));
        self.send(self.http.post(url).json(&json!({ "barcode": barcode })))
            .await?;
        Ok(())
    }
}
