//! # Projection Pipeline
//!
//! Turns a list of words or phrases into labelled 2-D scatter plots.
//!
//! ```text
//! inputs → embed → reduce (PCA / t-SNE) → min-max scale → CSV → plot
//!                       │                                   │
//!                 per method                {prefix}_{method}_reduced.csv
//!                                           {prefix}_{method}_scatterplot.png
//! ```
//!
//! When a reduced CSV from an earlier run already holds exactly the same labels, embedding and
//! reduction are skipped for that method and only the plot is redrawn.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::embeddings::{ensure_aligned, EmbeddingProvider, Vector};
use crate::io::{export_reduced_csv, read_reduced_csv};
use crate::plot::PlotRenderer;
use crate::reduction::{DimensionalityReducer, ReductionMethod};
use crate::{Error, ErrorContext, Result};

/// What one method of a [`ProjectionPipeline::run`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionOutput {
    pub method: ReductionMethod,
    pub csv_path: PathBuf,
    /// `None` when no renderer is configured.
    pub plot_path: Option<PathBuf>,
    /// The CSV from a previous run was kept as is.
    pub reused: bool,
}

pub struct ProjectionPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    reducer: DimensionalityReducer,
    renderer: Option<Arc<dyn PlotRenderer>>,
    csv_dir: PathBuf,
    plot_dir: PathBuf,
    prefix: String,
    cancel: Option<CancellationToken>,
}

impl ProjectionPipeline {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        reducer: DimensionalityReducer,
        csv_dir: impl Into<PathBuf>,
        plot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            reducer,
            renderer: None,
            csv_dir: csv_dir.into(),
            plot_dir: plot_dir.into(),
            prefix: "openai".to_string(),
            cancel: None,
        }
    }

    /// Output directories and reduction settings taken from `config`.
    pub fn from_config(provider: Arc<dyn EmbeddingProvider>, config: &AnalysisConfig) -> Self {
        Self::new(
            provider,
            DimensionalityReducer::from_config(&config.reduction),
            config.paths.output_csv_dir.clone(),
            config.paths.output_plot_dir.clone(),
        )
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PlotRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn csv_path(&self, method: ReductionMethod) -> PathBuf {
        self.csv_dir
            .join(format!("{}_{}_reduced.csv", self.prefix, method))
    }

    pub fn plot_path(&self, method: ReductionMethod) -> PathBuf {
        self.plot_dir
            .join(format!("{}_{}_scatterplot.png", self.prefix, method))
    }

    fn check_cancelled(&self, stage: &str) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::cancelled(format!(
                "Projection cancelled before {}",
                stage
            ))),
            _ => Ok(()),
        }
    }

    /// Project `inputs` with each of `methods`, writing one CSV (and plot) per method.
    ///
    /// Inputs are embedded at most once per run, and only if some method cannot reuse its
    /// previous output.
    pub async fn run(
        &self,
        inputs: &[String],
        methods: &[ReductionMethod],
    ) -> Result<Vec<ProjectionOutput>> {
        if inputs.is_empty() {
            return Err(Error::invalid_argument_with_context(
                "No inputs to project",
                ErrorContext::new().with_source("projection"),
            ));
        }

        let mut vectors: Option<Vec<Vector>> = None;
        let mut outputs = Vec::with_capacity(methods.len());
        for &method in methods {
            let csv_path = self.csv_path(method);
            let reused = self.has_matching_output(&csv_path, inputs);
            if reused {
                info!(method = %method, path = %csv_path.display(), "inputs unchanged, reusing reduced coordinates");
            } else {
                if vectors.is_none() {
                    vectors = Some(self.embed(inputs).await?);
                }
                let embedded = vectors.as_deref().unwrap_or_default();
                self.check_cancelled("reduction")?;
                let reduced = self.reducer.reduce(method, embedded)?;
                let scaled = self.reducer.min_max_scale(&reduced)?;
                export_reduced_csv(&scaled, inputs, &csv_path)?;
            }

            let plot_path = match &self.renderer {
                Some(renderer) => {
                    self.check_cancelled("plotting")?;
                    let plot_path = self.plot_path(method);
                    renderer.render(&csv_path, &plot_path).await?;
                    Some(plot_path)
                }
                None => None,
            };
            outputs.push(ProjectionOutput {
                method,
                csv_path,
                plot_path,
                reused,
            });
        }
        Ok(outputs)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vector>> {
        self.check_cancelled("embedding")?;
        let embeddings = self.provider.embed(inputs).await?;
        ensure_aligned(inputs, &embeddings, self.provider.name())?;
        info!(provider = self.provider.name(), count = embeddings.len(), "embedded projection inputs");
        Ok(embeddings.into_iter().map(|e| e.into_vector()).collect())
    }

    fn has_matching_output(&self, csv_path: &Path, inputs: &[String]) -> bool {
        if !csv_path.is_file() {
            return false;
        }
        match read_reduced_csv(csv_path) {
            Ok((labels, matrix)) => labels == inputs && matrix.ncols() == self.reducer.components(),
            Err(e) => {
                warn!(path = %csv_path.display(), error = %e, "unreadable reduced CSV, recomputing");
                false
            }
        }
    }
}
