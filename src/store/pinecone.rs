//! Client for a Pinecone-compatible index data plane.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{MetadataFilter, QueryMatch, StoredVector};
use super::VectorStore;
use crate::{Error, ErrorContext, Result};

pub const API_KEY_ENV: &str = "PINECONE_API_KEY";

const DEFAULT_UPSERT_BATCH: usize = 100;

pub struct PineconeClient {
    http_client: reqwest::Client,
    index_host: String,
    api_key: String,
    upsert_batch_size: usize,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [StoredVector],
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_values: bool,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Deserialize)]
struct RawMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: IndexMap<String, serde_json::Value>,
}

impl RawMatch {
    fn into_match(self) -> QueryMatch {
        let metadata = self
            .metadata
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect();
        QueryMatch {
            id: self.id,
            score: self.score,
            metadata,
        }
    }
}

impl PineconeClient {
    pub fn builder() -> PineconeClientBuilder {
        PineconeClientBuilder::new()
    }

    pub fn index_host(&self) -> &str {
        &self.index_host
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        let endpoint = format!("{}{}", self.index_host.trim_end_matches('/'), path);
        let context = || {
            ErrorContext::new()
                .with_field_path(path.to_string())
                .with_source("pinecone")
        };
        let response = self
            .http_client
            .post(&endpoint)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::external_service("Vector store request failed", context(), e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            Error::external_service("Failed to read vector store response", context(), e)
        })?;
        if !status.is_success() {
            return Err(Error::external_service_with_context(
                format!("Vector store error ({}): {}", status, text),
                context(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl VectorStore for PineconeClient {
    async fn upsert(&self, vectors: &[StoredVector], namespace: &str) -> Result<usize> {
        let mut total = 0;
        for batch in vectors.chunks(self.upsert_batch_size) {
            let body = self
                .post("/vectors/upsert", &UpsertRequest { vectors: batch, namespace })
                .await?;
            let parsed: UpsertResponse = serde_json::from_str(&body)?;
            total += parsed.upserted_count;
        }
        debug!(namespace, count = total, "upserted vectors to index");
        Ok(total)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            namespace,
            include_values: false,
            include_metadata: true,
            filter: filter.filter(|f| !f.is_empty()).map(MetadataFilter::to_json),
        };
        let body = self.post("/query", &request).await?;
        let parsed: QueryResponse = serde_json::from_str(&body)?;
        Ok(parsed.matches.into_iter().map(RawMatch::into_match).collect())
    }

    fn name(&self) -> &'static str {
        "pinecone"
    }
}

pub struct PineconeClientBuilder {
    index_host: Option<String>,
    api_key: Option<String>,
    upsert_batch_size: usize,
    timeout_secs: u64,
}

impl PineconeClientBuilder {
    pub fn new() -> Self {
        Self {
            index_host: None,
            api_key: None,
            upsert_batch_size: DEFAULT_UPSERT_BATCH,
            timeout_secs: 30,
        }
    }

    pub fn index_host(mut self, host: impl Into<String>) -> Self {
        self.index_host = Some(host.into());
        self
    }
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
    pub fn upsert_batch_size(mut self, size: usize) -> Self {
        self.upsert_batch_size = size;
        self
    }
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<PineconeClient> {
        let index_host = self
            .index_host
            .ok_or_else(|| Error::configuration("Vector store index host required (store.index_host)"))?;
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| Error::configuration(format!("API key required ({})", API_KEY_ENV)))?;
        if self.upsert_batch_size == 0 {
            return Err(Error::configuration("upsert_batch_size must be at least 1"));
        }
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(PineconeClient {
            http_client,
            index_host,
            api_key,
            upsert_batch_size: self.upsert_batch_size,
        })
    }
}

impl Default for PineconeClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
