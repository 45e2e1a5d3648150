//! # Store Module
//!
//! The vector-store seam used for retrieval.
//!
//! | Implementation | Description |
//! |----------------|-------------|
//! | [`InMemoryVectorStore`] | Exact cosine ranking in process, for tests and small corpora |
//! | [`PineconeClient`] | HTTP client for a hosted index (`/vectors/upsert`, `/query`) |

mod memory;
mod pinecone;
mod types;

use async_trait::async_trait;

use crate::Result;

pub use memory::InMemoryVectorStore;
pub use pinecone::{PineconeClient, PineconeClientBuilder, API_KEY_ENV as PINECONE_API_KEY_ENV};
pub use types::{MetadataFilter, QueryMatch, StoredVector};

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace vectors by id. Returns how many were written.
    async fn upsert(&self, vectors: &[StoredVector], namespace: &str) -> Result<usize>;

    /// The `top_k` best matches for `vector`, best first.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>>;

    fn name(&self) -> &'static str;
}
