//! Dataset records and the shared vector-source capability.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::embeddings::Embedding;
use crate::{Error, ErrorContext, Result};

/// A single stored vector, the unit kept per attribute of a [`MultiEmbeddingRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorData {
    pub id: String,
    pub values: Vec<f32>,
}

impl VectorData {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            values,
        }
    }

    pub fn with_id(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }
}

/// One dataset row: raw attribute text plus the embeddings computed for each attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiEmbeddingRecord {
    pub id: String,
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub vectors: IndexMap<String, Vec<VectorData>>,
}

impl MultiEmbeddingRecord {
    pub fn new(id: impl Into<String>, attributes: IndexMap<String, String>) -> Self {
        Self {
            id: id.into(),
            attributes,
            vectors: IndexMap::new(),
        }
    }

    pub fn add_embedding(&mut self, attribute: impl Into<String>, vector: VectorData) {
        self.vectors.entry(attribute.into()).or_default().push(vector);
    }

    pub fn attribute(&self, key: &str) -> Result<&str> {
        self.attributes.get(key).map(String::as_str).ok_or_else(|| {
            Error::not_found_with_context(
                format!("Attribute key '{}' not found in record attributes", key),
                ErrorContext::new()
                    .with_field_path(format!("{}.attributes.{}", self.id, key))
                    .with_source("record"),
            )
        })
    }

    /// First vector stored for `attribute`; a missing or empty entry is a lookup error.
    pub fn first_vector(&self, attribute: &str) -> Result<&[f32]> {
        self.vectors
            .get(attribute)
            .and_then(|list| list.first())
            .map(|v| v.values.as_slice())
            .ok_or_else(|| {
                Error::not_found_with_context(
                    format!("No vector data found for attribute key '{}'", attribute),
                    ErrorContext::new()
                        .with_field_path(format!("{}.vectors.{}", self.id, attribute))
                        .with_source("record"),
                )
            })
    }
}

/// Anything that can be viewed as an identified bundle of text attributes and named vectors.
///
/// Plain embeddings, dataset records, and vector-store entries all implement this.
/// [`StoredVector::from_source`](crate::store::StoredVector::from_source) flattens any of them
/// for a vector store.
pub trait VectorSource {
    fn id(&self) -> Cow<'_, str>;
    fn attribute(&self, key: &str) -> Option<&str>;
    fn attributes(&self) -> Vec<(&str, &str)>;
    fn named_vectors(&self) -> Vec<(&str, &[f32])>;
}

impl VectorSource for Embedding {
    fn id(&self) -> Cow<'_, str> {
        Cow::Owned(self.index().to_string())
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        (key == "text").then(|| self.text())
    }

    fn attributes(&self) -> Vec<(&str, &str)> {
        vec![("text", self.text())]
    }

    fn named_vectors(&self) -> Vec<(&str, &[f32])> {
        vec![("embedding", self.vector())]
    }
}

impl VectorSource for MultiEmbeddingRecord {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn attributes(&self) -> Vec<(&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn named_vectors(&self) -> Vec<(&str, &[f32])> {
        self.vectors
            .iter()
            .flat_map(|(name, list)| list.iter().map(move |v| (name.as_str(), v.values.as_slice())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MultiEmbeddingRecord {
        let mut attributes = IndexMap::new();
        attributes.insert("Title".to_string(), "Alien".to_string());
        attributes.insert("Genre".to_string(), "Horror".to_string());
        MultiEmbeddingRecord::new("row-0", attributes)
    }

    #[test]
    fn test_add_embedding_accumulates() {
        let mut rec = record();
        rec.add_embedding("Title", VectorData::new(vec![1.0, 0.0]));
        rec.add_embedding("Title", VectorData::new(vec![0.0, 1.0]));
        assert_eq!(rec.vectors["Title"].len(), 2);
        assert_eq!(rec.first_vector("Title").unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_missing_vector_is_not_found() {
        let rec = record();
        assert!(rec.first_vector("Title").unwrap_err().is_not_found());
    }

    #[test]
    fn test_empty_vector_list_is_not_found() {
        let mut rec = record();
        rec.vectors.insert("Title".to_string(), Vec::new());
        assert!(rec.first_vector("Title").unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_attribute_is_not_found() {
        let rec = record();
        assert_eq!(rec.attribute("Title").unwrap(), "Alien");
        assert!(rec.attribute("Year").unwrap_err().is_not_found());
    }

    #[test]
    fn test_attribute_order_preserved() {
        let rec = record();
        let keys: Vec<&str> = rec.attributes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Title", "Genre"]);
    }

    #[test]
    fn test_embedding_as_vector_source() {
        let emb = Embedding::new(3, "kitten", vec![0.5, 0.5]);
        assert_eq!(emb.id(), "3");
        assert_eq!(emb.attribute("text"), Some("kitten"));
        assert_eq!(emb.named_vectors(), vec![("embedding", &[0.5f32, 0.5][..])]);
    }

    #[test]
    fn test_record_json_shape() {
        let mut rec = record();
        rec.add_embedding("Title", VectorData::with_id("v1", vec![1.0]));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["id"], "row-0");
        assert_eq!(json["attributes"]["Title"], "Alien");
        assert_eq!(json["vectors"]["Title"][0]["id"], "v1");
    }
}
