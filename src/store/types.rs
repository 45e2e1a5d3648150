use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::types::VectorSource;

/// A vector as held by a store, with flat string metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVector {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
}

impl StoredVector {
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: IndexMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// One stored vector per named vector of `source`, each carrying the source's attributes as
    /// metadata.
    ///
    /// A source with a single vector keeps its id. With several, ids become `<id>/<name>/<n>`,
    /// where `n` counts the vectors stored under that name.
    pub fn from_source<S: VectorSource + ?Sized>(source: &S) -> Vec<StoredVector> {
        let named = source.named_vectors();
        let single = named.len() == 1;
        let id = source.id();
        let metadata: IndexMap<String, String> = source
            .attributes()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut seen: IndexMap<&str, usize> = IndexMap::new();
        named
            .into_iter()
            .map(|(name, values)| {
                let n = seen.entry(name).or_insert(0);
                let vector_id = if single {
                    id.to_string()
                } else {
                    format!("{}/{}/{}", id, name, n)
                };
                *n += 1;
                StoredVector {
                    id: vector_id,
                    values: values.to_vec(),
                    metadata: metadata.clone(),
                }
            })
            .collect()
    }
}

impl VectorSource for StoredVector {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    fn attributes(&self) -> Vec<(&str, &str)> {
        self.metadata
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn named_vectors(&self) -> Vec<(&str, &[f32])> {
        vec![("values", self.values.as_slice())]
    }
}

/// One query hit, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
}

/// Exact-match conditions on metadata; every condition must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: IndexMap<String, String>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, metadata: &IndexMap<String, String>) -> bool {
        self.conditions
            .iter()
            .all(|(k, v)| metadata.get(k).map(|m| m == v).unwrap_or(false))
    }

    /// Filter document in the `{"key": {"$eq": value}}` form used by hosted vector databases.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .conditions
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::json!({ "$eq": v })))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_all_conditions() {
        let v = StoredVector::new("a", vec![1.0])
            .with_metadata("Language", "en")
            .with_metadata("Text", "hello");
        let filter = MetadataFilter::new().field_eq("Language", "en");
        assert!(filter.matches(&v.metadata));
        assert!(!filter.clone().field_eq("Text", "bye").matches(&v.metadata));
        assert!(!MetadataFilter::new().field_eq("Missing", "x").matches(&v.metadata));
        assert!(MetadataFilter::new().matches(&v.metadata));
    }

    #[test]
    fn test_filter_json_shape() {
        let json = MetadataFilter::new().field_eq("Language", "de").to_json();
        assert_eq!(json, serde_json::json!({"Language": {"$eq": "de"}}));
    }

    #[test]
    fn test_from_record_with_several_vectors() {
        use crate::types::{MultiEmbeddingRecord, VectorData};

        let mut attributes = IndexMap::new();
        attributes.insert("Title".to_string(), "Heat".to_string());
        let mut record = MultiEmbeddingRecord::new("7", attributes);
        record.add_embedding("Overview", VectorData::with_id("a", vec![1.0, 0.0]));
        record.add_embedding("Overview", VectorData::with_id("b", vec![0.0, 1.0]));
        record.add_embedding("Title", VectorData::with_id("c", vec![0.5, 0.5]));

        let stored = StoredVector::from_source(&record);
        let ids: Vec<&str> = stored.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["7/Overview/0", "7/Overview/1", "7/Title/0"]);
        assert_eq!(stored[1].values, vec![0.0, 1.0]);
        assert!(stored.iter().all(|v| v.metadata["Title"] == "Heat"));
    }

    #[test]
    fn test_from_single_vector_source_keeps_id() {
        let original = StoredVector::new("doc_4", vec![0.25]).with_metadata("Text", "t");
        assert_eq!(StoredVector::from_source(&original), vec![original.clone()]);
    }

    #[test]
    fn test_stored_vector_as_source() {
        let v = StoredVector::new("doc_0", vec![0.5, 0.5]).with_metadata("Text", "hi");
        assert_eq!(v.attribute("Text"), Some("hi"));
        assert_eq!(VectorSource::id(&v), "doc_0");
        assert_eq!(v.named_vectors()[0].1, &[0.5f32, 0.5][..]);
    }
}
