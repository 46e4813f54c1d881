//! HTTP/JSON task store client.
//!
//! Talks to a `tasklist-store` server (or anything serving the same routes).
//! Each call is one request with its own timeout; the shared
//! [`reqwest::Client`] pools connections so concurrent calls are cheap.

use std::time::Duration;

use serde::Serialize;
use tasklist_proto::api::{
    CREATE_PATH, CreateTaskRequest, DELETE_PATH, DeleteTaskRequest, LIST_PATH, UPDATE_PATH,
    UpdateTaskRequest, decode_error_body, decode_task_list,
};
use tasklist_proto::task::{Task, TaskId};

use super::{StoreError, StoreKind, TaskStore};

/// [`TaskStore`] backed by the HTTP store API.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTaskStore {
    /// Create a client for the store at `base_url` (e.g. `http://127.0.0.1:3000`).
    ///
    /// A trailing `/` on `base_url` is ignored.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request and returns the raw body of a success response.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, StoreError> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    StoreError::Transport(format!("timed out after {:?}", self.timeout))
                } else {
                    StoreError::Transport(error.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| StoreError::Transport(error.to_string()))?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let message = decode_error_body(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        tracing::debug!(%status, %message, "store rejected request");
        Err(StoreError::status(status.as_u16(), message))
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<(), StoreError> {
        let request = self.client.request(method, self.url(path)).json(body);
        self.execute(request).await.map(drop)
    }
}

impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let body = self.execute(self.client.get(self.url(LIST_PATH))).await?;
        let list = decode_task_list(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(list.tasks)
    }

    async fn create(&self, text: &str) -> Result<(), StoreError> {
        let body = CreateTaskRequest {
            text: text.to_string(),
        };
        self.send_json(reqwest::Method::POST, CREATE_PATH, &body)
            .await
    }

    async fn update(&self, id: TaskId, text: &str) -> Result<(), StoreError> {
        let body = UpdateTaskRequest {
            id,
            text: text.to_string(),
        };
        self.send_json(reqwest::Method::PUT, UPDATE_PATH, &body)
            .await
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        self.send_json(reqwest::Method::DELETE, DELETE_PATH, &DeleteTaskRequest { id })
            .await
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Http
    }
}
