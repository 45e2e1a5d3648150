//! # semantic-analysis
//!
//! Semantic similarity analysis over text embeddings.
//!
//! ## Overview
//!
//! Words, phrases, documents and dataset fields are turned into embedding vectors by an
//! [`EmbeddingProvider`](embeddings::EmbeddingProvider) and compared with cosine similarity.
//! Results are exported as CSV tables, reduced to two dimensions for scatter plots, or used to
//! retrieve context for question answering whose output is then scored against a reference.
//!
//! ## Key Features
//!
//! - **Comparison**: words vs words, documents vs words, all documents pairwise, and dataset
//!   fields vs words via [`comparison::ComparisonEngine`]
//! - **Reduction**: PCA and t-SNE with min-max scaling to plot ranges via
//!   [`reduction::DimensionalityReducer`]
//! - **Projection**: end-to-end embed, reduce, export and plot via [`pipeline::ProjectionPipeline`]
//! - **Retrieval**: vector store seam with in-memory and hosted backends via [`store`]
//! - **Evaluation**: cosine and ROUGE-1/ROUGE-2 scoring via [`evaluation::AccuracyEvaluator`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use semantic_analysis::comparison::ComparisonEngine;
//! use semantic_analysis::embeddings::OpenAiEmbeddingClient;
//!
//! #[tokio::main]
//! async fn main() -> semantic_analysis::Result<()> {
//!     let client = OpenAiEmbeddingClient::builder().build()?;
//!     let engine = ComparisonEngine::new(Arc::new(client));
//!
//!     let a = vec!["cat".to_string(), "car".to_string()];
//!     let b = vec!["dog".to_string(), "truck".to_string(), "bus".to_string()];
//!     for point in engine.compare_words_vs_words(&a, &b).await? {
//!         println!("{} -> {:?}", point.label, point.best_match());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | YAML configuration with environment overrides |
//! | [`embeddings`] | Provider seam, OpenAI client, and vector math |
//! | [`comparison`] | Chunking, corpora, and similarity tables |
//! | [`reduction`] | PCA, t-SNE, and plot scaling |
//! | [`pipeline`] | Projection of word lists to scatter plots |
//! | [`plot`] | External plot rendering |
//! | [`evaluation`] | Cosine and ROUGE accuracy scoring |
//! | [`rag`] | Retrieval-augmented answering |
//! | [`store`] | Vector stores |
//! | [`io`] | CSV, JSON, and word-list files |
//! | [`types`] | Records and similarity plot points |

pub mod comparison;
pub mod config;
pub mod embeddings;
pub mod evaluation;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod rag;
pub mod reduction;
pub mod store;
pub mod types;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

pub use config::AnalysisConfig;
pub use types::{MultiEmbeddingRecord, SimilarityPlotPoint, VectorData};
