use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::{json_type, DetailRecord, MediaKind, SearchResponse, SearchResultItem, SeasonDetail};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const CONNECT_TIMEOUT_SECS: u64 = 5;
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Outbound calls the lookup pipeline makes against the movie database.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn search(&self, kind: MediaKind, query: &str)
        -> Result<Vec<SearchResultItem>, UpstreamError>;
    async fn details(
        &self,
        kind: MediaKind,
        id: i64,
        append: &[&str],
    ) -> Result<DetailRecord, UpstreamError>;
    async fn person(&self, id: i64) -> Result<Value, UpstreamError>;
    async fn season(&self, show_id: i64, season_number: i64)
        -> Result<SeasonDetail, UpstreamError>;
    async fn episode(
        &self,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
        append: &[&str],
    ) -> Result<DetailRecord, UpstreamError>;
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TmdbClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            anyhow::bail!("TMDB access token cannot be empty");
        }
        let user_agent = format!("tmdb-lookup/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.tmdb_token.clone(),
            config.tmdb_base_url.clone(),
            config.upstream_timeout,
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(operation, path, "TMDB request");
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| transport_error(operation, e))?;
        if !status.is_success() {
            warn!(operation, status = status.as_u16(), "TMDB returned an error status");
            return Err(UpstreamError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        serde_json::from_str(&text).map_err(|e| UpstreamError::shape(operation, e.to_string()))
    }

    async fn get_record(
        &self,
        operation: &str,
        path: &str,
        append: &[&str],
    ) -> Result<DetailRecord, UpstreamError> {
        let query = append_query(append);
        let value: Value = self.get_json(operation, path, &query).await?;
        DetailRecord::from_value(operation, value)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
    ) -> Result<Vec<SearchResultItem>, UpstreamError> {
        let operation = format!("search {kind}");
        let params = [
            ("query", query.to_string()),
            ("include_adult", "false".to_string()),
        ];
        let data: SearchResponse = self
            .get_json(&operation, &format!("/search/{}", kind.as_path()), &params)
            .await?;
        Ok(data.results)
    }

    async fn details(
        &self,
        kind: MediaKind,
        id: i64,
        append: &[&str],
    ) -> Result<DetailRecord, UpstreamError> {
        let operation = format!("{kind} {id} details");
        self.get_record(&operation, &format!("/{}/{id}", kind.as_path()), append)
            .await
    }

    async fn person(&self, id: i64) -> Result<Value, UpstreamError> {
        let operation = format!("person {id}");
        let value: Value = self
            .get_json(&operation, &format!("/person/{id}"), &[])
            .await?;
        if !value.is_object() {
            return Err(UpstreamError::shape(
                operation,
                format!("expected a JSON object, got {}", json_type(&value)),
            ));
        }
        Ok(value)
    }

    async fn season(
        &self,
        show_id: i64,
        season_number: i64,
    ) -> Result<SeasonDetail, UpstreamError> {
        let operation = format!("tv {show_id} season {season_number}");
        self.get_json(
            &operation,
            &format!("/tv/{show_id}/season/{season_number}"),
            &[],
        )
        .await
    }

    async fn episode(
        &self,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
        append: &[&str],
    ) -> Result<DetailRecord, UpstreamError> {
        let operation = format!("tv {show_id} season {season_number} episode {episode_number}");
        self.get_record(
            &operation,
            &format!("/tv/{show_id}/season/{season_number}/episode/{episode_number}"),
            append,
        )
        .await
    }
}

fn append_query(append: &[&str]) -> Vec<(&'static str, String)> {
    if append.is_empty() {
        Vec::new()
    } else {
        vec![("append_to_response", append.join(","))]
    }
}

fn transport_error(operation: &str, source: reqwest::Error) -> UpstreamError {
    warn!(operation, "TMDB request failed: {}", source);
    if source.is_timeout() {
        UpstreamError::Timeout {
            operation: operation.to_string(),
        }
    } else {
        UpstreamError::Transport {
            operation: operation.to_string(),
            source,
        }
    }
}
