//! Shared fixtures for integration tests: deterministic providers and a mock HTTP server.

#![allow(dead_code)]

use async_trait::async_trait;
use mockito::{Mock, Server, ServerGuard};
use semantic_analysis::embeddings::{Embedding, EmbeddingProvider};
use semantic_analysis::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Embeds text as its 26 letter counts (case-insensitive). Texts sharing letters score high.
#[derive(Default)]
pub struct LetterProvider {
    calls: AtomicUsize,
}

impl LetterProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 26];
    for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
        v[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for LetterProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, t)| Embedding::new(i, t.clone(), letter_vector(t)))
            .collect())
    }

    fn name(&self) -> &'static str {
        "letters"
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Create a mock for a JSON response to `POST path`
    pub async fn mock_json_response(&self, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Like [`Self::mock_json_response`] but only matching requests whose JSON body contains
    /// `partial`.
    pub async fn mock_json_matching(
        &self,
        path: &str,
        partial: serde_json::Value,
        body: &str,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_body(mockito::Matcher::PartialJson(partial))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

/// An OpenAI-format embeddings body with one vector per entry, indices in the given order.
pub fn embeddings_body(vectors: &[(usize, Vec<f32>)]) -> String {
    let data: Vec<serde_json::Value> = vectors
        .iter()
        .map(|(index, v)| serde_json::json!({"object": "embedding", "index": index, "embedding": v}))
        .collect();
    serde_json::json!({
        "object": "list",
        "data": data,
        "model": "text-embedding-3-small",
        "usage": {"prompt_tokens": 4, "total_tokens": 4}
    })
    .to_string()
}
