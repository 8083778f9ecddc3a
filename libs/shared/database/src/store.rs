use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::query::{Collection, Filter, ListQuery};
use crate::supabase::SupabaseStore;

/// Row-level operations every backing store provides.
///
/// Rows travel as JSON objects. The store owns `id` and `created_at`; callers
/// send only their own fields.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new row and return it with its server-assigned metadata.
    async fn insert(&self, collection: Collection, fields: Value) -> Result<Value, StoreError>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Value, StoreError>;

    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Value>, StoreError>;

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<usize, StoreError>;

    /// Merge `patch` into the row. Fails with `NotFound` when the row is absent.
    async fn update(&self, collection: Collection, id: Uuid, patch: Value) -> Result<Value, StoreError>;

    /// Merge `patch` into every row matching all `filters`, atomically per row,
    /// and return the updated rows. An empty result means nothing matched.
    async fn update_matching(
        &self,
        collection: Collection,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError>;
}

/// A stored row: server metadata kept apart from the editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for Record<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

/// Typed facade over whichever `DocumentStore` the deployment uses.
#[derive(Clone)]
pub struct Database {
    backend: Arc<dyn DocumentStore>,
}

impl Database {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match config.store_backend {
            StoreBackend::Supabase => Self::new(Arc::new(SupabaseStore::new(config))),
            StoreBackend::Memory => Self::memory(),
        }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend(&self) -> &Arc<dyn DocumentStore> {
        &self.backend
    }

    pub async fn create<F>(&self, collection: Collection, fields: &F) -> Result<Record<F>, StoreError>
    where
        F: Serialize + DeserializeOwned,
    {
        let row = self.backend.insert(collection, serde_json::to_value(fields)?).await?;
        let record: Record<F> = serde_json::from_value(row)?;
        debug!("Created {} record {}", collection, record.id);
        Ok(record)
    }

    pub async fn fetch<F>(&self, collection: Collection, id: Uuid) -> Result<Record<F>, StoreError>
    where
        F: DeserializeOwned,
    {
        let row = self.backend.get(collection, id).await?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn find<F>(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Record<F>>, StoreError>
    where
        F: DeserializeOwned,
    {
        let rows = self.backend.list(collection, query).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    pub async fn find_first<F>(&self, collection: Collection, query: ListQuery) -> Result<Option<Record<F>>, StoreError>
    where
        F: DeserializeOwned,
    {
        let mut rows = self.find(collection, &query.limit(1)).await?;
        Ok(rows.pop())
    }

    pub async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<usize, StoreError> {
        self.backend.count(collection, filters).await
    }

    pub async fn patch<F, P>(&self, collection: Collection, id: Uuid, patch: &P) -> Result<Record<F>, StoreError>
    where
        F: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let row = self.backend.update(collection, id, serde_json::to_value(patch)?).await?;
        Ok(serde_json::from_value(row)?)
    }

    /// Conditional update of one row: applied only while every `guard` filter
    /// still holds. `None` means the row is absent or the guard failed.
    pub async fn patch_where<F, P>(
        &self,
        collection: Collection,
        id: Uuid,
        guard: Vec<Filter>,
        patch: &P,
    ) -> Result<Option<Record<F>>, StoreError>
    where
        F: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let mut filters = vec![Filter::eq("id", id.to_string())];
        filters.extend(guard);

        let mut rows = self
            .backend
            .update_matching(collection, &filters, serde_json::to_value(patch)?)
            .await?;

        match rows.pop() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Bulk update; returns how many rows changed.
    pub async fn patch_matching<P>(&self, collection: Collection, filters: &[Filter], patch: &P) -> Result<usize, StoreError>
    where
        P: Serialize + ?Sized,
    {
        let rows = self
            .backend
            .update_matching(collection, filters, serde_json::to_value(patch)?)
            .await?;
        Ok(rows.len())
    }

    pub async fn remove(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        self.backend.delete(collection, id).await
    }
}
