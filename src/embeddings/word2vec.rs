//! Pretrained word vectors read from a local text file.
//!
//! Each line holds a word followed by its components, separated by spaces (the GloVe text
//! layout). A leading `count dimensions` line, as written by word2vec's text export, is skipped.
//! Lookups are lowercase; a phrase is the mean of the vectors of the words the model knows.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::provider::EmbeddingProvider;
use super::types::Embedding;
use super::vectors::{average_vectors, Vector};
use crate::{Error, ErrorContext, Result};

const PROGRESS_INTERVAL: usize = 10_000;

/// An in-memory word-vector table.
#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    vectors: HashMap<String, Vector>,
    dimensions: usize,
}

impl WordVectors {
    /// Load a vector file from disk. Large files are read line by line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::not_found_with_context(
                format!("Word vector file not found: {}", path.display()),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("word2vec"),
            ));
        }
        info!(path = %path.display(), "loading word vectors");
        let vectors = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!(words = vectors.len(), dimensions = vectors.dimensions, "word vectors loaded");
        Ok(vectors)
    }

    /// [`Self::load`] on the blocking thread pool.
    pub async fn load_async(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tokio::task::spawn_blocking(move || Self::load(path))
            .await
            .map_err(|e| Error::computation("Word vector loading task failed", e))?
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::default();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            if line_no % PROGRESS_INTERVAL == 0 {
                debug!(lines = line_no, "reading word vectors");
            }

            let parts: Vec<&str> = line.trim_end().split(' ').filter(|p| !p.is_empty()).collect();
            if parts.len() < 2 {
                continue;
            }
            if line_no == 1 && parts.len() == 2 && parts.iter().all(|p| p.parse::<usize>().is_ok()) {
                debug!("skipping word2vec header line");
                continue;
            }

            let mut vector = Vec::with_capacity(parts.len() - 1);
            for value in &parts[1..] {
                let component: f32 = value.parse().map_err(|_| {
                    Error::invalid_argument_with_context(
                        format!("Non-numeric vector component '{}'", value),
                        ErrorContext::new()
                            .with_field_path(format!("line {}", line_no))
                            .with_source("word2vec"),
                    )
                })?;
                vector.push(component);
            }
            if table.dimensions == 0 {
                table.dimensions = vector.len();
            } else if vector.len() != table.dimensions {
                return Err(Error::invalid_argument_with_context(
                    format!(
                        "Vector for '{}' has {} components, expected {}",
                        parts[0],
                        vector.len(),
                        table.dimensions
                    ),
                    ErrorContext::new()
                        .with_field_path(format!("line {}", line_no))
                        .with_source("word2vec"),
                ));
            }
            table.vectors.insert(parts[0].to_string(), vector);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The vector of a single word, looked up lowercase.
    pub fn word_vector(&self, word: &str) -> Result<Option<&[f32]>> {
        let word = word.trim();
        if word.is_empty() {
            return Err(Error::invalid_argument("Word cannot be empty"));
        }
        Ok(self.vectors.get(&word.to_lowercase()).map(Vec::as_slice))
    }

    /// Mean of the known words of `phrase`, or `None` when no word is known.
    pub fn phrase_vector(&self, phrase: &str) -> Option<Vector> {
        let lowered = phrase.to_lowercase();
        let known: Vec<&Vector> = lowered
            .split(' ')
            .filter(|w| !w.is_empty())
            .filter_map(|w| self.vectors.get(w))
            .collect();
        if known.is_empty() {
            return None;
        }
        average_vectors(&known).ok()
    }

    /// A word's own vector, or the phrase mean when `text` contains spaces.
    pub fn lookup(&self, text: &str) -> Result<Option<Vector>> {
        let text = text.trim();
        if text.contains(' ') {
            return Ok(self.phrase_vector(text));
        }
        Ok(self.word_vector(text)?.map(<[f32]>::to_vec))
    }
}

/// Serves embeddings from a [`WordVectors`] table.
///
/// Unknown inputs are a lookup error; use [`Word2VecProvider::known_inputs`] to drop them first.
#[derive(Debug, Clone)]
pub struct Word2VecProvider {
    vectors: Arc<WordVectors>,
}

impl Word2VecProvider {
    pub fn new(vectors: WordVectors) -> Self {
        Self {
            vectors: Arc::new(vectors),
        }
    }

    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(WordVectors::load_async(path).await?))
    }

    pub fn vectors(&self) -> &WordVectors {
        &self.vectors
    }

    /// The inputs that have a vector, in order. Each dropped input is logged.
    pub fn known_inputs(&self, inputs: &[String]) -> Vec<String> {
        inputs
            .iter()
            .filter(|input| match self.vectors.lookup(input) {
                Ok(Some(_)) => true,
                _ => {
                    warn!(input = %input, "no word vector, skipping");
                    false
                }
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for Word2VecProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let vector = self.vectors.lookup(text)?.ok_or_else(|| {
                Error::not_found_with_context(
                    format!("No word vector for '{}'", text),
                    ErrorContext::new()
                        .with_field_path(format!("texts[{}]", index))
                        .with_source("word2vec"),
                )
            })?;
            embeddings.push(Embedding::new(index, text.clone(), vector));
        }
        Ok(embeddings)
    }

    fn name(&self) -> &'static str {
        "word2vec"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "king 1.0 2.0 3.0\nqueen 3.0 2.0 1.0\nman -1 0 0.5\n";

    fn table() -> WordVectors {
        WordVectors::from_reader(Cursor::new(TABLE)).unwrap()
    }

    #[test]
    fn test_reads_glove_lines() {
        let vectors = table();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors.dimensions(), 3);
        assert_eq!(vectors.word_vector("KING").unwrap(), Some(&[1.0f32, 2.0, 3.0][..]));
        assert_eq!(vectors.word_vector("prince").unwrap(), None);
    }

    #[test]
    fn test_skips_word2vec_header_and_short_lines() {
        let text = "2 2\nalpha 0.5 0.25\n\nlonely\nbeta 1 1\r\n";
        let vectors = WordVectors::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.word_vector("beta").unwrap(), Some(&[1.0f32, 1.0][..]));
    }

    #[test]
    fn test_bad_component_reports_line() {
        let err = WordVectors::from_reader(Cursor::new("a 1 2\nb 1 x\n")).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.context().unwrap().field_path.as_deref(), Some("line 2"));
    }

    #[test]
    fn test_ragged_dimensions_rejected() {
        let err = WordVectors::from_reader(Cursor::new("a 1 2\nb 1 2 3\n")).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_blank_word_rejected() {
        assert!(table().word_vector("  ").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_phrase_averages_known_words() {
        let vectors = table();
        assert_eq!(vectors.phrase_vector("King and Queen"), Some(vec![2.0, 2.0, 2.0]));
        assert_eq!(vectors.phrase_vector("no such words"), None);
        assert_eq!(vectors.lookup("the man").unwrap(), Some(vec![-1.0, 0.0, 0.5]));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        assert!(WordVectors::load("/no/such/glove.txt").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_provider_embeds_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glove.txt");
        std::fs::write(&path, TABLE).unwrap();
        let provider = Word2VecProvider::from_path(&path).await.unwrap();

        let inputs: Vec<String> = ["king", "unicorn", "queen man"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let known = provider.known_inputs(&inputs);
        assert_eq!(known, vec!["king".to_string(), "queen man".to_string()]);

        let embeddings = provider.embed(&known).await.unwrap();
        assert_eq!(embeddings[1].index(), 1);
        assert_eq!(embeddings[1].vector(), &[1.0, 1.0, 0.75]);

        let err = provider.embed(&inputs).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
