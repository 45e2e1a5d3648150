//! # Evaluation Module
//!
//! Accuracy scoring for retrieval-augmented generation: embedding cosine similarity plus
//! ROUGE-1/ROUGE-2 n-gram overlap between a generated answer and a reference answer.

pub mod accuracy;
pub mod rouge;

pub use accuracy::{AccuracyEvaluator, RagEvaluationResult};
pub use rouge::{ngrams, rouge_n, rouge_scores, tokenize};
