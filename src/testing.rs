//! Test stores

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{MemoryStore, RemoteResult, RemoteStore};

/// Memory store whose reads suspend once before answering, so a later
/// operation can start while a snapshot is still in flight
#[derive(Default)]
pub struct YieldingStore {
    pub inner: MemoryStore,
}

#[async_trait(?Send)]
impl RemoteStore for YieldingStore {
    async fn fetch(&self, path: &str) -> RemoteResult<Value> {
        tokio::task::yield_now().await;
        self.inner.fetch(path).await
    }

    async fn create(&self, path: &str, body: Value) -> RemoteResult<Value> {
        self.inner.create(path, body).await
    }

    async fn update(&self, path: &str, patch: Value) -> RemoteResult<Value> {
        self.inner.update(path, patch).await
    }

    async fn delete(&self, path: &str) -> RemoteResult<Value> {
        self.inner.delete(path).await
    }
}
