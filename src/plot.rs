//! Rendering reduced coordinates to images through an external plotting process.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::config::PlotConfig;
use crate::{Error, ErrorContext, Result};

#[async_trait]
pub trait PlotRenderer: Send + Sync {
    /// Draw the `label,x,y` CSV at `csv_path` into `image_path`.
    async fn render(&self, csv_path: &Path, image_path: &Path) -> Result<()>;
}

/// Runs `<interpreter> <script> <csv> <image>`.
#[derive(Debug, Clone)]
pub struct PythonPlotRenderer {
    interpreter: String,
    script: PathBuf,
}

impl PythonPlotRenderer {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }

    pub fn from_config(config: &PlotConfig) -> Self {
        Self::new(config.interpreter.clone(), config.script.clone())
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    Err(Error::not_found_with_context(
        format!("{} not found: {}", what, path.display()),
        ErrorContext::new()
            .with_field_path(path.display().to_string())
            .with_source("plot"),
    ))
}

#[async_trait]
impl PlotRenderer for PythonPlotRenderer {
    async fn render(&self, csv_path: &Path, image_path: &Path) -> Result<()> {
        require_file(&self.script, "Plot script")?;
        require_file(csv_path, "Coordinates CSV")?;
        if let Some(parent) = image_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let output = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(csv_path)
            .arg(image_path)
            .output()
            .await
            .map_err(|e| {
                Error::external_service(
                    format!("Failed to start plot interpreter '{}'", self.interpreter),
                    ErrorContext::new().with_source("plot"),
                    e,
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(output = %stdout.trim(), "plot script output");
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::external_service_with_context(
                format!("Plot script failed with {}", output.status),
                ErrorContext::new()
                    .with_details(stderr.trim().to_string())
                    .with_source("plot"),
            ));
        }
        tracing::info!(image = %image_path.display(), "rendered plot");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn setup(script_body: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("plot.sh");
        std::fs::write(&script, script_body).unwrap();
        let csv = dir.path().join("coords.csv");
        std::fs::write(&csv, "label,x,y\na,0,0\n").unwrap();
        (dir, script, csv)
    }

    #[tokio::test]
    async fn test_successful_render() {
        let (dir, script, csv) = setup("cp \"$1\" \"$2\"\n");
        let image = dir.path().join("plots/out.png");
        PythonPlotRenderer::new("sh", &script)
            .render(&csv, &image)
            .await
            .unwrap();
        assert!(image.exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_external_failure() {
        let (dir, script, csv) = setup("echo broken >&2\nexit 3\n");
        let err = PythonPlotRenderer::new("sh", &script)
            .render(&csv, &dir.path().join("out.png"))
            .await
            .unwrap_err();
        assert!(err.is_external_service());
        assert_eq!(err.context().and_then(|c| c.details.as_deref()), Some("broken"));
    }

    #[tokio::test]
    async fn test_missing_script_is_not_found() {
        let (dir, _, csv) = setup("");
        let err = PythonPlotRenderer::new("sh", dir.path().join("nope.py"))
            .render(&csv, &dir.path().join("out.png"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
