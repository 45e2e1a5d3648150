//! JSON persistence of dataset records.

use std::path::Path;

use crate::types::MultiEmbeddingRecord;
use crate::{Error, ErrorContext, Result};

/// Write `records` as pretty-printed JSON, creating the parent directory if needed.
pub async fn save_records_json(records: &[MultiEmbeddingRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json).await?;
    tracing::info!(path = %path.display(), records = records.len(), "saved records");
    Ok(())
}

pub async fn load_records_json(path: impl AsRef<Path>) -> Result<Vec<MultiEmbeddingRecord>> {
    let path = path.as_ref();
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(Error::not_found_with_context(
            format!("Records file not found: {}", path.display()),
            ErrorContext::new()
                .with_field_path(path.display().to_string())
                .with_source("json"),
        ));
    }
    let bytes = tokio::fs::read(path).await?;
    let records: Vec<MultiEmbeddingRecord> = serde_json::from_slice(&bytes)?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VectorData;
    use indexmap::IndexMap;

    #[tokio::test]
    async fn test_save_then_load_preserves_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/records.json");

        let mut attributes = IndexMap::new();
        attributes.insert("Title".to_string(), "Heat".to_string());
        let mut record = MultiEmbeddingRecord::new("0", attributes);
        record.add_embedding("Title", VectorData::with_id("v0", vec![0.25, -0.5]));

        save_records_json(&[record.clone()], &path).await.unwrap();
        let loaded = load_records_json(&path).await.unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_records_json("/no/such/records.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_records_json(&path).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
