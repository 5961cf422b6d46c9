//! reqwest-backed implementation of [`NoteApi`]
//!
//! See: https://coddingtonbear.github.io/obsidian-local-rest-api/

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};

use super::error::{ApiError, ApiResult};
use super::types::{ErrorBody, Note, NoteJson, ServerStatus, SimpleSearchHit};
use super::NoteApi;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const NOTE_JSON: &str = "application/vnd.olrapi.note+json";
const MARKDOWN: &str = "text/markdown";
const SEARCH_CONTEXT_LENGTH: u32 = 100;

/// Characters left unescaped by `encodeURIComponent`
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encode a vault path as a single URL segment (slashes included)
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_SEGMENT).to_string()
}

/// Client bound to a single REST API base URL
#[derive(Debug, Clone)]
pub struct ObsidianClient {
    client: Client,
    base_url: String,
}

impl ObsidianClient {
    /// Build a client for `base_url` authenticating with `api_key`
    ///
    /// Certificate validation is disabled: the plugin serves a self-signed
    /// certificate by default.
    pub fn new(base_url: &str, api_key: &str) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| ApiError::Client(format!("invalid API key: {}", e)))?;
        headers.insert(header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .user_agent(concat!("obsidian-mcp/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn vault_url(&self, note_path: &str) -> String {
        self.url(&format!("/vault/{}", encode_path(note_path)))
    }

    /// Turn non-2xx responses into [`ApiError::Status`]
    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();

        tracing::debug!(status = status.as_u16(), body = %body, "REST API returned an error");

        Err(ApiError::Status {
            status: status.as_u16(),
            code: parsed.error_code.unwrap_or(-1),
            message: parsed.message.unwrap_or_else(|| "<unknown>".to_string()),
        })
    }

    async fn fetch_note_json(&self, path: &str) -> ApiResult<NoteJson> {
        let response = self
            .client
            .get(self.vault_url(path))
            .header(header::ACCEPT, NOTE_JSON)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl NoteApi for ObsidianClient {
    async fn read_note(&self, path: &str) -> ApiResult<Note> {
        tracing::debug!(path, "Reading note");
        Ok(self.fetch_note_json(path).await?.into())
    }

    async fn search_notes(&self, query: &str) -> ApiResult<Vec<Note>> {
        tracing::debug!(query, "Searching notes");

        let response = self
            .client
            .post(self.url("/search/simple/"))
            .query(&[
                ("query", query.to_string()),
                ("contextLength", SEARCH_CONTEXT_LENGTH.to_string()),
            ])
            .send()
            .await?;

        let hits: Vec<SimpleSearchHit> = Self::check(response).await?.json().await?;
        Ok(hits.into_iter().map(Note::from).collect())
    }

    async fn write_note(&self, path: &str, content: &str) -> ApiResult<()> {
        tracing::debug!(path, bytes = content.len(), "Writing note");

        let response = self
            .client
            .put(self.vault_url(path))
            .header(header::CONTENT_TYPE, MARKDOWN)
            .body(content.to_string())
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn get_metadata(&self, path: &str) -> ApiResult<NoteJson> {
        self.fetch_note_json(path).await
    }

    async fn get_server_info(&self) -> ApiResult<ServerStatus> {
        let response = self.client.get(self.url("/")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
