//! HTTP client for the stages/acquisitions REST API.

use super::{ApiResult, BoardApi};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::types::{BoardSnapshot, CardId, Column, ColumnId};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::instrument;

/// Extract a human-readable message from a JSON error body.
///
/// Tries `message`, then `error`, then falls back to the raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(err) = json.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
    }
    body.to_string()
}

#[derive(Serialize)]
struct OrderBody {
    order: u32,
}

#[derive(Serialize)]
struct CreateColumnBody<'a> {
    title: &'a str,
    order: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveCardBody<'a> {
    stage_id: &'a ColumnId,
}

/// [`BoardApi`] over HTTP with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpBoardApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    user: Option<String>,
}

impl HttpBoardApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            user: config.user.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn stage_url(&self, id: &ColumnId) -> String {
        self.url(&format!("/stages/{}", urlencoding::encode(id.as_str())))
    }

    fn acquisition_url(&self, id: &CardId) -> String {
        self.url(&format!("/acquisitions/{}", urlencoding::encode(id.as_str())))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map an HTTP response to an `ApiError` based on status code.
    async fn check_response(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);

        match status_code {
            401 => Err(ApiError::Unauthorized(message)),
            404 => Err(ApiError::NotFound(message)),
            409 => Err(ApiError::Conflict(message)),
            _ => Err(ApiError::Status {
                status: status_code,
                body: message,
            }),
        }
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = self.authorize(request).send().await?;
        Self::check_response(response).await
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    #[instrument(skip(self))]
    async fn fetch_board(&self) -> ApiResult<BoardSnapshot> {
        let response = self.send(self.client.get(self.url("/stages"))).await?;
        let body = response.text().await?;
        let columns: Vec<Column> = serde_json::from_str(&body)?;
        Ok(BoardSnapshot::sorted_by_order(columns))
    }

    #[instrument(skip(self), fields(column = %id))]
    async fn update_column_order(&self, id: &ColumnId, order: u32) -> ApiResult<()> {
        let request = self.client.patch(self.stage_url(id)).json(&OrderBody { order });
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_column(&self, title: &str, order: u32) -> ApiResult<Column> {
        let request = self
            .client
            .post(self.url("/stages"))
            .json(&CreateColumnBody { title, order });
        let body = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self), fields(column = %id))]
    async fn delete_column(&self, id: &ColumnId) -> ApiResult<()> {
        self.send(self.client.delete(self.stage_url(id))).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(card = %id))]
    async fn delete_card(&self, id: &CardId) -> ApiResult<()> {
        self.send(self.client.delete(self.acquisition_url(id))).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(card = %card, column = %column))]
    async fn move_card_to_column(&self, card: &CardId, column: &ColumnId) -> ApiResult<()> {
        let request = self
            .client
            .patch(self.acquisition_url(card))
            .json(&MoveCardBody { stage_id: column });
        self.send(request).await?;
        Ok(())
    }

    fn endpoint(&self) -> String {
        self.url("/stages")
    }

    fn identity(&self) -> Option<String> {
        self.user.clone()
    }
}
