//! HTTP front end of the task store: routing, request validation, and
//! mapping table outcomes to status codes.
//!
//! Each route accepts exactly one method; any other method is answered with
//! `405` and a `{ "error": "Method Not Allowed" }` body. Bodies are parsed
//! as loose JSON so that missing or mistyped fields produce the store's own
//! `400` messages instead of extractor rejections.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use serde_json::Value;
use tasklist_proto::api::{
    CREATE_PATH, DELETE_PATH, ErrorBody, LIST_PATH, MessageBody, TaskList, UPDATE_PATH,
};
use tasklist_proto::task::{MAX_TASK_TEXT_LENGTH, TaskId, TextError, normalize_text};

use crate::store::{TableError, TaskTable};

/// A failure response: status code plus JSON error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::new(message),
        }
    }

    fn from_text(err: &TextError) -> Self {
        match err {
            TextError::Blank => Self::bad_request("Task text is required and cannot be empty."),
            TextError::TooLong { max } => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody::new(format!("Task text cannot exceed {max} characters.")),
            },
        }
    }

    /// Maps a table failure; `action` names the operation for 500 bodies.
    fn from_table(err: &TableError, action: &str) -> Self {
        match err {
            TableError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                body: ErrorBody::new("Task not found."),
            },
            TableError::Persist { .. } | TableError::Corrupt { .. } => {
                tracing::error!(error = %err, action, "store error");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: ErrorBody::new(format!("Failed to {action}")).with_details(err.to_string()),
                }
            }
        }
    }
}

impl ApiError {
    fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            body: ErrorBody::new("Method Not Allowed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Unwraps a JSON body, mapping malformed input to `400`.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(v)| v).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::bad_request("Request body must be a JSON object.")
    })
}

/// Extracts a non-zero integer `id` field.
fn task_id(body: &Value) -> ApiResult<TaskId> {
    body.get("id")
        .and_then(Value::as_i64)
        .filter(|id| *id != 0)
        .map(TaskId::new)
        .ok_or_else(|| ApiError::bad_request("Task ID is required and must be a number."))
}

/// Extracts and normalizes the `text` field.
fn task_text(body: &Value) -> ApiResult<&str> {
    let raw = body.get("text").and_then(Value::as_str).unwrap_or_default();
    normalize_text(raw, MAX_TASK_TEXT_LENGTH).map_err(|e| ApiError::from_text(&e))
}

/// `GET /api/getTasks`
async fn list_tasks(State(table): State<Arc<TaskTable>>) -> Json<TaskList> {
    let tasks = table.list().await;
    tracing::debug!(count = tasks.len(), "listing tasks");
    Json(TaskList { tasks })
}

/// `POST /api/addTask`
async fn add_task(
    State(table): State<Arc<TaskTable>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageBody>)> {
    let body = json_body(body)?;
    let text = task_text(&body)?;
    let task = table
        .create(text)
        .await
        .map_err(|e| ApiError::from_table(&e, "add task"))?;
    tracing::info!(id = %task.id, "task added");
    Ok((
        StatusCode::CREATED,
        Json(MessageBody::new("Task added successfully")),
    ))
}

/// `PUT /api/updateTask`
async fn update_task(
    State(table): State<Arc<TaskTable>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    let body = json_body(body)?;
    let id = task_id(&body)?;
    let text = task_text(&body)?;
    table
        .update(id, text)
        .await
        .map_err(|e| ApiError::from_table(&e, "update task"))?;
    tracing::info!(%id, "task updated");
    Ok(Json(MessageBody::new("Task updated successfully")))
}

/// `DELETE /api/deleteTask`
async fn delete_task(
    State(table): State<Arc<TaskTable>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    let body = json_body(body)?;
    let id = task_id(&body)?;
    table
        .delete(id)
        .await
        .map_err(|e| ApiError::from_table(&e, "delete task"))?;
    tracing::info!(%id, "task deleted");
    Ok(Json(MessageBody::new("Task deleted successfully")))
}

/// Answers a known route called with the wrong method.
async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Builds the store router over `table`.
pub fn router(table: Arc<TaskTable>) -> axum::Router {
    axum::Router::new()
        .route(LIST_PATH, get(list_tasks))
        .route(CREATE_PATH, post(add_task))
        .route(UPDATE_PATH, put(update_task))
        .route(DELETE_PATH, delete(delete_task))
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(table)
}

/// Start the store server with an empty in-memory table.
///
/// Binds to `addr` (use port 0 for an ephemeral port) and returns the bound
/// address together with the server task handle.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_table(addr, Arc::new(TaskTable::new())).await
}

/// Start the store server over an existing table.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn start_server_with_table(
    addr: &str,
    table: Arc<TaskTable>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(table);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "store server error");
        }
    });

    Ok((bound_addr, handle))
}
