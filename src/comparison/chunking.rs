//! Text cleaning and chunking ahead of embedding.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    #[default]
    Paragraph,
    Sentence,
    None,
}

impl std::str::FromStr for ChunkType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "paragraph" => Ok(Self::Paragraph),
            "sentence" => Ok(Self::Sentence),
            "none" => Ok(Self::None),
            other => Err(crate::Error::invalid_argument(format!(
                "Unknown chunk type '{}'",
                other
            ))),
        }
    }
}

/// Splits document text into embeddable pieces.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextChunker {
    chunk_type: ChunkType,
}

impl TextChunker {
    pub fn new(chunk_type: ChunkType) -> Self {
        Self { chunk_type }
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    /// Split and clean `text`. Empty chunks are dropped, so blank input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        match self.chunk_type {
            ChunkType::Paragraph => text
                .replace("\r\n", "\n")
                .split("\n\n")
                .map(clean_text)
                .filter(|c| !c.is_empty())
                .collect(),
            ChunkType::Sentence => split_sentences(&clean_text(text)),
            ChunkType::None => {
                let cleaned = clean_text(text);
                if cleaned.is_empty() {
                    Vec::new()
                } else {
                    vec![cleaned]
                }
            }
        }
    }
}

/// Drop control characters, collapse runs of whitespace to one space, and trim.
pub fn clean_text(text: &str) -> String {
    let visible: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    WHITESPACE.replace_all(&visible, " ").trim().to_string()
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // Keep the terminator, drop the whitespace after it.
        let end = m.start() + 1;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}
