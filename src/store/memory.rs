use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::types::{MetadataFilter, QueryMatch, StoredVector};
use super::VectorStore;
use crate::embeddings::{magnitude, top_k_cosine_similarities};
use crate::{Error, ErrorContext, Result};

/// Process-local store ranked by exact cosine similarity.
///
/// Every vector in a namespace has the same dimension and a non-zero magnitude. An upsert that
/// would break this is rejected whole, so a bad write never leaves a namespace unqueryable.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    namespaces: RwLock<HashMap<String, IndexMap<String, StoredVector>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map(IndexMap::len)
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace).await == 0
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, vectors: &[StoredVector], namespace: &str) -> Result<usize> {
        let mut namespaces = self.namespaces.write().await;
        let mut dimension = namespaces
            .get(namespace)
            .and_then(|entries| entries.values().next())
            .map(|v| v.values.len());
        for (i, vector) in vectors.iter().enumerate() {
            if magnitude(&vector.values) == 0.0 {
                return Err(Error::zero_magnitude(format!(
                    "Vector '{}' has zero magnitude and cannot be ranked",
                    vector.id
                )));
            }
            let expected = *dimension.get_or_insert(vector.values.len());
            if vector.values.len() != expected {
                return Err(Error::invalid_argument_with_context(
                    format!(
                        "Vector '{}' has {} dimensions, namespace '{}' holds {}",
                        vector.id,
                        vector.values.len(),
                        namespace,
                        expected
                    ),
                    ErrorContext::new()
                        .with_field_path(format!("vectors[{}]", i))
                        .with_source("memory_store"),
                ));
            }
        }

        let entries = namespaces.entry(namespace.to_string()).or_default();
        for vector in vectors {
            entries.insert(vector.id.clone(), vector.clone());
        }
        tracing::debug!(namespace, count = vectors.len(), "upserted vectors");
        Ok(vectors.len())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let namespaces = self.namespaces.read().await;
        let Some(entries) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let candidates = entries
            .values()
            .filter(|v| filter.map(|f| f.matches(&v.metadata)).unwrap_or(true))
            .map(|v| (v.id.as_str(), v.values.as_slice()));
        let ranked = top_k_cosine_similarities(vector, candidates, top_k)?;

        Ok(ranked
            .into_iter()
            .map(|(id, score)| {
                let metadata = entries
                    .get(&id)
                    .map(|v| v.metadata.clone())
                    .unwrap_or_default();
                QueryMatch {
                    id,
                    score: score as f32,
                    metadata,
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
