//! Principal component projection.

use ndarray::{s, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::eigen::symmetric_eigen;
use crate::{Error, ErrorContext, Result};

/// Which eigenvectors of the covariance matrix form the projection basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EigenOrder {
    /// The first components in the order the decomposition returns them (ascending eigenvalue).
    #[default]
    Decomposition,
    /// The components with the largest eigenvalues, largest first.
    DescendingVariance,
}

/// Project the rows of `data` onto `components` eigenvectors of its covariance matrix.
///
/// Columns are mean-centred and the covariance uses an `n - 1` denominator.
pub fn project(data: &Array2<f64>, components: usize, order: EigenOrder) -> Result<Array2<f64>> {
    let (n, d) = data.dim();
    if n < 2 {
        return Err(Error::invalid_argument_with_context(
            format!("PCA needs at least 2 vectors, got {}", n),
            ErrorContext::new().with_source("pca"),
        ));
    }
    if components == 0 || components > d {
        return Err(Error::invalid_argument_with_context(
            format!("Component count must be between 1 and {}, got {}", d, components),
            ErrorContext::new()
                .with_field_path("components")
                .with_source("pca"),
        ));
    }

    let mean = data
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::invalid_argument("PCA input has no rows"))?;
    let centered = data - &mean;
    let covariance = centered.t().dot(&centered) / (n as f64 - 1.0);

    let eig = symmetric_eigen(&covariance)?;
    let basis = match order {
        EigenOrder::Decomposition => eig.vectors.slice(s![.., ..components]).to_owned(),
        EigenOrder::DescendingVariance => eig
            .vectors
            .slice(s![.., d - components..; -1])
            .to_owned(),
    };

    tracing::debug!(
        samples = n,
        dimensions = d,
        components,
        order = ?order,
        "projecting onto covariance eigenvectors"
    );
    Ok(centered.dot(&basis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn variance(col: ndarray::ArrayView1<f64>) -> f64 {
        let mean = col.sum() / col.len() as f64;
        col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (col.len() as f64 - 1.0)
    }

    fn near_line() -> Array2<f64> {
        array![[1.0, 1.1], [2.0, 1.9], [3.0, 3.05], [4.0, 4.1], [5.0, 4.9]]
    }

    #[test]
    fn test_output_shape() {
        let data = array![[2.5, 2.4, 0.5], [0.5, 0.7, 1.0], [2.2, 2.9, 0.1], [1.9, 2.2, 0.3]];
        let out = project(&data, 2, EigenOrder::Decomposition).unwrap();
        assert_eq!(out.dim(), (4, 2));
    }

    #[test]
    fn test_decomposition_order_starts_with_smallest_variance() {
        let out = project(&near_line(), 2, EigenOrder::Decomposition).unwrap();
        assert!(variance(out.column(0)) < variance(out.column(1)));
    }

    #[test]
    fn test_descending_order_starts_with_largest_variance() {
        let out = project(&near_line(), 2, EigenOrder::DescendingVariance).unwrap();
        assert!(variance(out.column(0)) > variance(out.column(1)));
    }

    #[test]
    fn test_descending_single_component_captures_line() {
        let out = project(&near_line(), 1, EigenOrder::DescendingVariance).unwrap();
        let total = variance(near_line().column(0)) + variance(near_line().column(1));
        assert!(variance(out.column(0)) / total > 0.99);
    }

    #[test]
    fn test_projection_is_centred() {
        let out = project(&near_line(), 2, EigenOrder::Decomposition).unwrap();
        for col in out.columns() {
            assert!(col.sum().abs() < 1e-9);
        }
    }

    #[test]
    fn test_too_many_components_rejected() {
        let err = project(&near_line(), 3, EigenOrder::Decomposition).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_single_row_rejected() {
        let data = array![[1.0, 2.0]];
        assert!(project(&data, 1, EigenOrder::Decomposition)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_eigen_order_serde_names() {
        let json = serde_json::to_string(&EigenOrder::DescendingVariance).unwrap();
        assert_eq!(json, "\"descending_variance\"");
        let parsed: EigenOrder = serde_json::from_str("\"decomposition\"").unwrap();
        assert_eq!(parsed, EigenOrder::Decomposition);
    }
}
