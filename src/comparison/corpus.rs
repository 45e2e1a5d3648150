//! Document sources for corpus comparisons.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, ErrorContext, Result};

/// A named piece of plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Supplies the documents of a corpus.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn documents(&self) -> Result<Vec<Document>>;
}

/// Every `*.txt` file directly inside a directory, ordered by file name.
///
/// Invalid UTF-8 is decoded with replacement characters rather than failing the corpus.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    dir: PathBuf,
}

impl DirectoryCorpus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn text_files(&self) -> Result<Vec<PathBuf>> {
        let not_found = |msg: String| {
            Error::not_found_with_context(
                msg,
                ErrorContext::new()
                    .with_field_path(self.dir.display().to_string())
                    .with_source("directory_corpus"),
            )
        };

        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            return Err(not_found(format!(
                "Document directory does not exist: {}",
                self.dir.display()
            )));
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_txt = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("txt"))
                .unwrap_or(false);
            if is_txt && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(not_found(format!(
                "No .txt documents found in {}",
                self.dir.display()
            )));
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl DocumentSource for DirectoryCorpus {
    async fn documents(&self) -> Result<Vec<Document>> {
        let files = self.text_files().await?;
        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let bytes = tokio::fs::read(&path).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(document = %name, "document is not valid UTF-8, replacing bad bytes");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            documents.push(Document::new(name, text));
        }
        tracing::debug!(dir = %self.dir.display(), count = documents.len(), "loaded corpus");
        Ok(documents)
    }
}

/// Documents held in memory, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    documents: Vec<Document>,
}

impl InMemoryCorpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }
}

#[async_trait]
impl DocumentSource for InMemoryCorpus {
    async fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_sorted_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "second").unwrap();
        std::fs::write(dir.path().join("a.txt"), "first").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let docs = DirectoryCorpus::new(dir.path()).documents().await.unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(docs[0].text, "first");
    }

    #[tokio::test]
    async fn test_invalid_utf8_document_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "good text").unwrap();
        std::fs::write(dir.path().join("b.txt"), [b'o', b'k', 0xFF, 0xFE, 0x00, 0x80]).unwrap();

        let docs = DirectoryCorpus::new(dir.path()).documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "good text");
        assert!(docs[1].text.starts_with("ok"));
        assert!(docs[1].text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_empty_dir_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectoryCorpus::new(dir.path()).documents().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_dir_is_not_found() {
        let err = DirectoryCorpus::new("/no/such/corpus/dir")
            .documents()
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_in_memory_keeps_insertion_order() {
        let mut corpus = InMemoryCorpus::new(vec![Document::new("z.txt", "last")]);
        corpus.push(Document::new("a.txt", "first"));
        let docs = tokio_test::block_on(corpus.documents()).unwrap();
        assert_eq!(docs[0].name, "z.txt");
        assert_eq!(docs[1].name, "a.txt");
    }
}
