//! External store access.
//!
//! All persistent entities live in a hosted relational store exposed over a
//! PostgREST-style REST interface. `RestStore` speaks that dialect; the
//! `StoreBackend` trait keeps handlers independent of the transport so the
//! test suite can run against the in-memory [`mem::MemStore`].
//!
//! The server holds no authoritative copy of any row and caches nothing.

pub mod mem;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::models::{
    Client, ClientPatch, NewClient, NewProject, NewTask, Project, Task, TaskPatch, TaskStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("row not found: {0}")]
    NotFound(String),
    #[error("malformed store response: {0}")]
    Decode(String),
}

/// The store operations the API needs. One implementation per transport.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<Client>, StoreError>;
    async fn insert_client(&self, new: NewClient) -> Result<Client, StoreError>;
    async fn update_client(&self, id: i64, patch: ClientPatch) -> Result<Client, StoreError>;

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError>;

    async fn list_tasks(&self, project_id: Option<i64>) -> Result<Vec<Task>, StoreError>;
    async fn get_task(&self, id: i64) -> Result<Task, StoreError>;
    async fn insert_task(&self, new: NewTask) -> Result<Task, StoreError>;
    async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task, StoreError>;
    /// Count of task rows whose status is not `done`.
    async fn count_pending_tasks(&self) -> Result<u64, StoreError>;
}

// ─── RestStore ────────────────────────────────────────────────────────────────

/// PostgREST client for the hosted store.
///
/// Every request carries the project API key as both `apikey` and bearer
/// token, the way the hosted backend expects.
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))?,
        );
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// Cheap authenticated probe used by `agencyd doctor`. Hits the REST
    /// root, which needs no tables.
    pub async fn probe(&self) -> Result<(), StoreError> {
        let resp = self
            .http
            .get(format!("{}/rest/v1/", self.base_url))
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Rejected {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            })
        }
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: rest_error_message(&body),
            });
        }
        Ok(resp.json::<Vec<T>>().await?)
    }

    async fn one<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, StoreError> {
        self.rows::<T>(req)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(what.to_string()))
    }
}

/// PostgREST errors come back as `{"message": "..."}`. Relay just the
/// message when the body parses, the raw body otherwise.
fn rest_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl StoreBackend for RestStore {
    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.rows(
            self.http
                .get(self.table_url("clients"))
                .query(&[("select", "*"), ("order", "created_at.desc")]),
        )
        .await
    }

    async fn insert_client(&self, new: NewClient) -> Result<Client, StoreError> {
        self.one(
            self.http
                .post(self.table_url("clients"))
                .header("Prefer", "return=representation")
                .json(&[&new]),
            "inserted client",
        )
        .await
    }

    async fn update_client(&self, id: i64, patch: ClientPatch) -> Result<Client, StoreError> {
        self.one(
            self.http
                .patch(self.table_url("clients"))
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", "return=representation")
                .json(&patch),
            &format!("client {id}"),
        )
        .await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        // Embed the owning client's name alongside each project row.
        self.rows(
            self.http
                .get(self.table_url("projects"))
                .query(&[("select", "*,clients(name)"), ("order", "created_at.desc")]),
        )
        .await
    }

    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError> {
        self.one(
            self.http
                .post(self.table_url("projects"))
                .header("Prefer", "return=representation")
                .json(&[&new]),
            "inserted project",
        )
        .await
    }

    async fn list_tasks(&self, project_id: Option<i64>) -> Result<Vec<Task>, StoreError> {
        let mut req = self
            .http
            .get(self.table_url("tasks"))
            .query(&[("select", "*"), ("order", "created_at.asc")]);
        if let Some(pid) = project_id {
            req = req.query(&[("project_id", format!("eq.{pid}"))]);
        }
        self.rows(req).await
    }

    async fn get_task(&self, id: i64) -> Result<Task, StoreError> {
        self.one(
            self.http
                .get(self.table_url("tasks"))
                .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]),
            &format!("task {id}"),
        )
        .await
    }

    async fn insert_task(&self, new: NewTask) -> Result<Task, StoreError> {
        // New tasks always start in todo regardless of caller input.
        let row = serde_json::json!({
            "project_id": new.project_id,
            "title": new.title,
            "status": TaskStatus::Todo,
        });
        self.one(
            self.http
                .post(self.table_url("tasks"))
                .header("Prefer", "return=representation")
                .json(&[&row]),
            "inserted task",
        )
        .await
    }

    async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task, StoreError> {
        self.one(
            self.http
                .patch(self.table_url("tasks"))
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", "return=representation")
                .json(&patch),
            &format!("task {id}"),
        )
        .await
    }

    async fn count_pending_tasks(&self) -> Result<u64, StoreError> {
        // Exact-count head request: the total comes back in Content-Range
        // as `<range>/<total>`, no body.
        let resp = self
            .http
            .head(self.table_url("tasks"))
            .query(&[("select", "*"), ("status", "neq.done")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: String::new(),
            });
        }
        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Decode("missing Content-Range header".into()))?;
        parse_content_range_total(range)
    }
}

fn parse_content_range_total(range: &str) -> Result<u64, StoreError> {
    range
        .rsplit('/')
        .next()
        .and_then(|total| total.parse::<u64>().ok())
        .ok_or_else(|| StoreError::Decode(format!("unparseable Content-Range: {range}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_total_parses() {
        assert_eq!(parse_content_range_total("0-24/3021").unwrap(), 3021);
        assert_eq!(parse_content_range_total("*/0").unwrap(), 0);
        assert!(parse_content_range_total("*/*").is_err());
    }

    #[test]
    fn rest_error_message_prefers_message_field() {
        assert_eq!(
            rest_error_message(r#"{"message":"duplicate key"}"#),
            "duplicate key"
        );
        assert_eq!(rest_error_message("upstream exploded"), "upstream exploded");
    }
}
