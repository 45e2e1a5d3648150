//! # Reduction Module
//!
//! Dimensionality reduction of embedding vectors for visualisation.
//!
//! | Method | Entry point |
//! |--------|-------------|
//! | Principal components | [`DimensionalityReducer::perform_pca`] |
//! | Neighbor embedding (t-SNE) | [`DimensionalityReducer::reduce_dimensions_using_neighbor_embedding`] |
//! | Plot scaling | [`DimensionalityReducer::min_max_scale`] |
//!
//! ```rust
//! use semantic_analysis::reduction::DimensionalityReducer;
//!
//! let vectors = vec![
//!     vec![1.0f32, 0.0, 0.5],
//!     vec![0.0, 1.0, 0.5],
//!     vec![0.5, 0.5, 0.0],
//! ];
//! let projected = DimensionalityReducer::new(2).perform_pca(&vectors).unwrap();
//! assert_eq!(projected.dim(), (3, 2));
//! ```

pub mod eigen;
pub mod pca;
pub mod scaling;
pub mod tsne;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::ReductionConfig;
use crate::{Error, ErrorContext, Result};

pub use pca::EigenOrder;
pub use scaling::{X_RANGE, Y_RANGE};
pub use tsne::{NeighborEmbeddingParams, TransformError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMethod {
    Pca,
    NeighborEmbedding,
}

impl ReductionMethod {
    pub const ALL: [ReductionMethod; 2] = [Self::Pca, Self::NeighborEmbedding];

    /// Short name used in output file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pca => "pca",
            Self::NeighborEmbedding => "tsne",
        }
    }
}

impl std::fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReductionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pca" => Ok(Self::Pca),
            "tsne" | "t-sne" | "neighbor_embedding" => Ok(Self::NeighborEmbedding),
            other => Err(Error::invalid_argument(format!(
                "Unknown reduction method '{}', expected 'pca' or 'tsne'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DimensionalityReducer {
    components: usize,
    eigen_order: EigenOrder,
    neighbor_params: NeighborEmbeddingParams,
}

impl DimensionalityReducer {
    pub fn new(components: usize) -> Self {
        Self {
            components,
            eigen_order: EigenOrder::default(),
            neighbor_params: NeighborEmbeddingParams::default(),
        }
    }

    pub fn from_config(config: &ReductionConfig) -> Self {
        Self::new(config.components)
            .with_eigen_order(config.eigen_order)
            .with_neighbor_params(config.neighbor_params())
    }

    pub fn with_eigen_order(mut self, order: EigenOrder) -> Self {
        self.eigen_order = order;
        self
    }

    pub fn with_neighbor_params(mut self, params: NeighborEmbeddingParams) -> Self {
        self.neighbor_params = params;
        self
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Project `vectors` (all of one dimensionality) onto the configured number of principal
    /// components. Output has one row per input vector.
    pub fn perform_pca<V: AsRef<[f32]>>(&self, vectors: &[V]) -> Result<Array2<f64>> {
        let data = to_matrix(vectors)?;
        pca::project(&data, self.components, self.eigen_order)
    }

    /// Embed `vectors` with t-SNE into `target_dims` dimensions (2 when `None`).
    ///
    /// Fewer than 2 target dimensions is rejected up front. Failures inside the transform are
    /// reported as [`Error::Computation`] with the underlying cause attached.
    pub fn reduce_dimensions_using_neighbor_embedding<V: AsRef<[f32]>>(
        &self,
        vectors: &[V],
        target_dims: Option<usize>,
    ) -> Result<Array2<f64>> {
        let target_dims = target_dims.unwrap_or(2);
        if target_dims < 2 {
            return Err(Error::invalid_argument_with_context(
                format!("Target dimensions must be at least 2, got {}", target_dims),
                ErrorContext::new()
                    .with_field_path("target_dims")
                    .with_source("neighbor_embedding"),
            ));
        }
        let data = to_matrix(vectors)?;
        tsne::neighbor_embedding(&data, target_dims, &self.neighbor_params)
            .map_err(|e| Error::computation("Neighbor embedding failed", e))
    }

    pub fn min_max_scale(&self, matrix: &Array2<f64>) -> Result<Array2<f64>> {
        scaling::min_max_scale(matrix)
    }

    /// Run `method` producing [`Self::components`] columns.
    pub fn reduce<V: AsRef<[f32]>>(
        &self,
        method: ReductionMethod,
        vectors: &[V],
    ) -> Result<Array2<f64>> {
        match method {
            ReductionMethod::Pca => self.perform_pca(vectors),
            ReductionMethod::NeighborEmbedding => {
                self.reduce_dimensions_using_neighbor_embedding(vectors, Some(self.components))
            }
        }
    }
}

impl Default for DimensionalityReducer {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Stack equal-length vectors into an `n x d` matrix.
pub fn to_matrix<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Array2<f64>> {
    let first = vectors.first().ok_or_else(|| {
        Error::invalid_argument_with_context(
            "No vectors to reduce",
            ErrorContext::new().with_source("reduction"),
        )
    })?;
    let d = first.as_ref().len();
    if d == 0 {
        return Err(Error::invalid_argument("Vectors must have at least one dimension"));
    }

    let mut flat = Vec::with_capacity(vectors.len() * d);
    for (i, v) in vectors.iter().enumerate() {
        let v = v.as_ref();
        if v.len() != d {
            return Err(Error::invalid_argument_with_context(
                format!("Vector {} has {} dimensions, expected {}", i, v.len(), d),
                ErrorContext::new()
                    .with_field_path(format!("vectors[{}]", i))
                    .with_source("reduction"),
            ));
        }
        flat.extend(v.iter().map(|x| f64::from(*x)));
    }
    Array2::from_shape_vec((vectors.len(), d), flat)
        .map_err(|e| Error::computation("Failed to assemble vector matrix", e))
}
