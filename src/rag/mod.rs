//! # RAG Module
//!
//! Retrieval-augmented generation: paragraphs are embedded into a
//! [`VectorStore`](crate::store::VectorStore), the closest ones are retrieved for a question, a
//! [`TextGenerator`] answers from them, and the answer is scored against a reference with
//! [`AccuracyEvaluator`](crate::evaluation::AccuracyEvaluator).

pub mod generator;
pub mod pipeline;

pub use generator::{build_prompt, OpenAiChatGenerator, OpenAiChatGeneratorBuilder, TextGenerator};
pub use pipeline::{RagCase, RagCaseResult, RagPipeline, SOURCE_KEY, TEXT_KEY};
