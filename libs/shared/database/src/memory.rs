use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::query::{Collection, Filter, ListQuery};
use crate::store::DocumentStore;

#[derive(Default)]
struct Tables {
    rows: HashMap<Collection, Vec<Value>>,
    last_created: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing creation stamps keep "newest first" deterministic.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }
}

/// Process-local store for development runs and tests.
///
/// Every mutation happens under one write lock, so `update_matching` is a
/// true compare-and-set.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, fields: Value) -> Result<Value, StoreError> {
        let Value::Object(mut row) = fields else {
            return Err(StoreError::Malformed(format!(
                "{} rows must be JSON objects",
                collection
            )));
        };

        let mut tables = self.tables.write().await;
        let created_at = tables.next_timestamp();
        let id = Uuid::new_v4();

        row.insert("id".to_string(), Value::String(id.to_string()));
        row.insert(
            "created_at".to_string(),
            Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let row = Value::Object(row);
        tables.rows.entry(collection).or_default().push(row.clone());
        debug!("Inserted {} row {}", collection, id);

        Ok(row)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Value, StoreError> {
        let tables = self.tables.read().await;
        tables
            .rows
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| has_id(row, id)))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .rows
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(field(a, &order.field), field(b, &order.field))
                    .unwrap_or(Ordering::Equal);
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<usize, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rows
            .get(&collection)
            .map(|rows| rows.iter().filter(|row| matches_all(row, filters)).count())
            .unwrap_or(0))
    }

    async fn update(&self, collection: Collection, id: Uuid, patch: Value) -> Result<Value, StoreError> {
        let patch = patch_object(collection, patch)?;
        let mut tables = self.tables.write().await;
        let row = tables
            .rows
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|row| has_id(row, id)))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        merge(row, &patch);
        Ok(row.clone())
    }

    async fn update_matching(
        &self,
        collection: Collection,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let patch = patch_object(collection, patch)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.rows.get_mut(&collection) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| matches_all(row, filters)) {
            merge(row, &patch);
            updated.push(row.clone());
        }

        debug!("Updated {} {} rows", updated.len(), collection);
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.rows.entry(collection).or_default();
        let position = rows
            .iter()
            .position(|row| has_id(row, id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        rows.remove(position);
        Ok(())
    }
}

fn patch_object(collection: Collection, patch: Value) -> Result<Map<String, Value>, StoreError> {
    match patch {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Malformed(format!(
            "{} patches must be JSON objects",
            collection
        ))),
    }
}

fn merge(row: &mut Value, patch: &Map<String, Value>) {
    if let Value::Object(target) = row {
        for (key, value) in patch {
            if key == "id" || key == "created_at" {
                continue;
            }
            target.insert(key.clone(), value.clone());
        }
    }
}

fn has_id(row: &Value, id: Uuid) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
}

fn field<'a>(row: &'a Value, name: &str) -> &'a Value {
    row.get(name).unwrap_or(&Value::Null)
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| matches(row, filter))
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let actual = field(row, filter.field());
    match filter {
        Filter::Eq(_, expected) => values_equal(actual, expected),
        Filter::In(_, options) => options.iter().any(|option| values_equal(actual, option)),
        Filter::Gte(_, bound) => matches!(
            compare(actual, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Filter::Lte(_, bound) => matches!(
            compare(actual, bound),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_metadata() {
        let store = MemoryStore::new();
        let row = store
            .insert(Collection::Banners, json!({ "image_url": "a.png" }))
            .await
            .unwrap();

        assert!(row["id"].as_str().is_some());
        assert!(row["created_at"].as_str().is_some());
        assert_eq!(row["image_url"], "a.png");
    }

    #[tokio::test]
    async fn list_filters_orders_and_limits() {
        let store = MemoryStore::new();
        for (order, active) in [(2, true), (0, true), (1, false), (3, true)] {
            store
                .insert(
                    Collection::Banners,
                    json!({ "display_order": order, "is_active": active }),
                )
                .await
                .unwrap();
        }

        let query = ListQuery::new()
            .filter(Filter::eq("is_active", true))
            .order_asc("display_order")
            .limit(2);
        let rows = store.list(Collection::Banners, &query).await.unwrap();

        let orders: Vec<i64> = rows.iter().map(|r| r["display_order"].as_i64().unwrap()).collect();
        assert_eq!(orders, vec![0, 2]);
    }

    #[tokio::test]
    async fn newest_first_follows_insertion() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store
                .insert(Collection::Notifications, json!({ "n": n }))
                .await
                .unwrap();
        }

        let rows = store
            .list(Collection::Notifications, &ListQuery::newest_first())
            .await
            .unwrap();
        let ns: Vec<i64> = rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![4, 3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn range_filters_compare_iso_dates() {
        let store = MemoryStore::new();
        for date in ["2025-05-31", "2025-06-01", "2025-06-02"] {
            store
                .insert(Collection::Appointments, json!({ "preferred_date": date }))
                .await
                .unwrap();
        }

        let count = store
            .count(
                Collection::Appointments,
                &[Filter::gte("preferred_date", "2025-06-01")],
            )
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn update_matching_acts_as_compare_and_set() {
        let store = MemoryStore::new();
        let row = store
            .insert(Collection::Appointments, json!({ "status": "pending" }))
            .await
            .unwrap();
        let id = row["id"].as_str().unwrap().to_string();
        let guard = [Filter::eq("id", id.clone()), Filter::eq("status", "pending")];

        let first = store
            .update_matching(Collection::Appointments, &guard, json!({ "status": "confirmed" }))
            .await
            .unwrap();
        let second = store
            .update_matching(Collection::Appointments, &guard, json!({ "status": "declined" }))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(first[0]["status"], "confirmed");
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();

        let update = store
            .update(Collection::Patients, missing, json!({ "is_active": false }))
            .await;
        let delete = store.delete(Collection::Patients, missing).await;

        assert_matches!(update, Err(StoreError::NotFound { .. }));
        assert_matches!(delete, Err(StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_cannot_overwrite_metadata() {
        let store = MemoryStore::new();
        let row = store
            .insert(Collection::Flashcards, json!({ "title": "Water" }))
            .await
            .unwrap();
        let id = Uuid::parse_str(row["id"].as_str().unwrap()).unwrap();

        let updated = store
            .update(
                Collection::Flashcards,
                id,
                json!({ "id": "other", "title": "Hydration" }),
            )
            .await
            .unwrap();

        assert_eq!(updated["id"], row["id"]);
        assert_eq!(updated["title"], "Hydration");
    }
}
