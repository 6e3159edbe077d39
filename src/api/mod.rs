//! Remote Store Client
//!
//! Request/response access to the task-list service, organized by resource.

mod http;
mod lists;
mod memory;
mod tasks;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use http::HttpStore;
pub use lists::*;
pub use memory::MemoryStore;
pub use tasks::*;

/// Status used for failures that never produced an HTTP response
/// (transport errors, undecodable bodies)
pub const STATUS_CLIENT: u16 = 0;

/// Non-success outcome of a store request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct RemoteError {
    pub status: u16,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn client(err: impl std::fmt::Display) -> Self {
        Self::new(STATUS_CLIENT, err.to_string())
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(404, format!("{} not found", what))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// The four operations of the resource interface.
///
/// Paths are relative to the API root (`task-lists/3/tasks`). Failures are
/// never retried here; callers log them.
#[async_trait(?Send)]
pub trait RemoteStore {
    async fn fetch(&self, path: &str) -> RemoteResult<Value>;

    async fn create(&self, path: &str, body: Value) -> RemoteResult<Value>;

    /// Partial update: only the fields present in `patch` change
    async fn update(&self, path: &str, patch: Value) -> RemoteResult<Value>;

    async fn delete(&self, path: &str) -> RemoteResult<Value>;
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> RemoteResult<T> {
    serde_json::from_value(value).map_err(|e| {
        log::error!("[API] Unexpected response shape: {}", e);
        RemoteError::client(format!("invalid response from server: {}", e))
    })
}

pub(crate) fn encode<T: serde::Serialize>(args: &T) -> RemoteResult<Value> {
    serde_json::to_value(args).map_err(RemoteError::client)
}
