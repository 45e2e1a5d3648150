//! # Types Module
//!
//! Plain data containers shared by the comparison engine, the exporters, and the stores.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MultiEmbeddingRecord`] | Dataset row with attribute text and per-attribute vectors |
//! | [`VectorData`] | A single stored vector |
//! | [`VectorSource`] | Common view over embeddings, records, and store entries |
//! | [`SimilarityPlotPoint`] | One labelled row of a similarity table |

pub mod plot;
pub mod record;

pub use plot::SimilarityPlotPoint;
pub use record::{MultiEmbeddingRecord, VectorData, VectorSource};
