use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::StoreError;
use crate::query::{Collection, Filter, ListQuery};
use crate::store::DocumentStore;

/// Thin PostgREST client authenticated with the project's service key.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.store_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client with timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_api_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| StoreError::Connectivity("Invalid Supabase API key".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| StoreError::Connectivity("Invalid Supabase API key".to_string()))?;

        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, extra_headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Exact row count for a filtered path, read from `Content-Range` without
    /// transferring the rows.
    pub async fn count(&self, path: &str) -> Result<usize, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::GET, path, None, Some(headers)).await?;
        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        content_range_total(range)
            .ok_or_else(|| StoreError::Malformed(format!("Unexpected Content-Range: '{}'", range)))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                502..=504 => StoreError::Connectivity(format!("Store gateway error ({})", status)),
                code => StoreError::Rejected {
                    status: code,
                    message: error_text,
                },
            });
        }

        Ok(response)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// `DocumentStore` backed by Supabase's REST interface.
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    fn table_path(collection: Collection, params: &[String]) -> String {
        if params.is_empty() {
            format!("/rest/v1/{}", collection.table_name())
        } else {
            format!("/rest/v1/{}?{}", collection.table_name(), params.join("&"))
        }
    }

    fn returning() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_filter(filter: &Filter) -> String {
    let condition = match filter {
        Filter::Eq(_, value) => format!("eq.{}", render_value(value)),
        Filter::In(_, values) => {
            let list: Vec<String> = values.iter().map(render_value).collect();
            format!("in.({})", list.join(","))
        }
        Filter::Gte(_, value) => format!("gte.{}", render_value(value)),
        Filter::Lte(_, value) => format!("lte.{}", render_value(value)),
    };

    format!("{}={}", filter.field(), urlencoding::encode(&condition))
}

/// Total from a PostgREST `Content-Range` such as `0-0/1500` or `*/0`.
fn content_range_total(range: &str) -> Option<usize> {
    range.rsplit_once('/')?.1.trim().parse().ok()
}

fn render_filters(filters: &[Filter]) -> Vec<String> {
    filters.iter().map(render_filter).collect()
}

fn id_filter(id: Uuid) -> String {
    render_filter(&Filter::eq("id", id.to_string()))
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn insert(&self, collection: Collection, fields: Value) -> Result<Value, StoreError> {
        let path = Self::table_path(collection, &[]);
        let mut rows: Vec<Value> = self
            .client
            .request_with_headers(Method::POST, &path, Some(fields), Some(Self::returning()))
            .await?;

        rows.pop().ok_or_else(|| {
            StoreError::Malformed(format!("Insert into {} returned no row", collection))
        })
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Value, StoreError> {
        let path = Self::table_path(collection, &[id_filter(id), "limit=1".to_string()]);
        let mut rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        rows.pop().ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Value>, StoreError> {
        let mut params = render_filters(&query.filters);

        if let Some(order) = &query.order {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push(format!("order={}.{}", order.field, direction));
        }
        if let Some(limit) = query.limit {
            params.push(format!("limit={}", limit));
        }

        let path = Self::table_path(collection, &params);
        self.client.request(Method::GET, &path, None).await
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<usize, StoreError> {
        let mut params = vec!["select=id".to_string(), "limit=1".to_string()];
        params.extend(render_filters(filters));

        let path = Self::table_path(collection, &params);
        self.client.count(&path).await
    }

    async fn update(&self, collection: Collection, id: Uuid, patch: Value) -> Result<Value, StoreError> {
        let path = Self::table_path(collection, &[id_filter(id)]);
        let mut rows: Vec<Value> = self
            .client
            .request_with_headers(Method::PATCH, &path, Some(patch), Some(Self::returning()))
            .await?;

        rows.pop().ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn update_matching(
        &self,
        collection: Collection,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let path = Self::table_path(collection, &render_filters(filters));
        self.client
            .request_with_headers(Method::PATCH, &path, Some(patch), Some(Self::returning()))
            .await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let path = Self::table_path(collection, &[id_filter(id)]);
        let rows: Vec<Value> = self
            .client
            .request_with_headers(Method::DELETE, &path, None, Some(Self::returning()))
            .await?;

        if rows.is_empty() {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}
