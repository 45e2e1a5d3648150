//! Embedding support.
//!
//! This module provides:
//! - The [`EmbeddingProvider`] seam and an OpenAI-compatible client
//! - A provider backed by pretrained word vectors from a local file
//! - Vector operations (cosine similarity, Euclidean distance, top-K ranking, averaging)
//! - Types for embedding requests and responses

mod client;
mod provider;
mod types;
mod vectors;
mod word2vec;

pub use client::{OpenAiEmbeddingClient, OpenAiEmbeddingClientBuilder};
pub use provider::{ensure_aligned, EmbeddingProvider};
pub use types::{Embedding, EmbeddingModel, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
pub use vectors::{
    average_vectors, cosine_similarity, dot_product, euclidean_distance, magnitude,
    top_k_cosine_similarities, Vector,
};
pub use word2vec::{Word2VecProvider, WordVectors};
