//! Column-wise min-max scaling for plotting.

use ndarray::Array2;

use crate::{Error, ErrorContext, Result};

/// Target range for the first column.
pub const X_RANGE: (f64, f64) = (0.0, 536.0);
/// Target range for the second column.
pub const Y_RANGE: (f64, f64) = (-1.0, 1.0);

/// Rescale column 0 into [`X_RANGE`] and column 1 into [`Y_RANGE`]; further columns pass
/// through unchanged.
///
/// A constant column has no spread to scale, so every value in it maps to the lower bound of its
/// target range.
pub fn min_max_scale(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let (rows, cols) = matrix.dim();
    if cols < 2 {
        return Err(Error::invalid_argument_with_context(
            format!("Min-max scaling needs at least 2 columns, got {}", cols),
            ErrorContext::new().with_source("scaling"),
        ));
    }
    if rows == 0 {
        return Err(Error::invalid_argument_with_context(
            "Min-max scaling needs at least 1 row",
            ErrorContext::new().with_source("scaling"),
        ));
    }

    let mut scaled = matrix.clone();
    for (col, (lower, upper)) in [X_RANGE, Y_RANGE].into_iter().enumerate() {
        let column = matrix.column(col);
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        if span == 0.0 {
            tracing::warn!(column = col, value = min, "constant column, mapping to lower bound");
            scaled.column_mut(col).fill(lower);
            continue;
        }

        scaled
            .column_mut(col)
            .mapv_inplace(|v| (v - min) / span * (upper - lower) + lower);
    }
    Ok(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scales_first_two_columns() {
        let m = array![[1.0, 2.0], [3.0, 6.0], [5.0, 10.0]];
        let s = min_max_scale(&m).unwrap();
        assert_eq!(s[[0, 0]], 0.0);
        assert_eq!(s[[2, 0]], 536.0);
        assert_eq!(s[[1, 0]], 268.0);
        assert_eq!(s[[0, 1]], -1.0);
        assert_eq!(s[[2, 1]], 1.0);
        assert_eq!(s[[1, 1]], 0.0);
    }

    #[test]
    fn test_extra_columns_untouched() {
        let m = array![[0.0, 0.0, 7.0], [1.0, 1.0, -3.5]];
        let s = min_max_scale(&m).unwrap();
        assert_eq!(s[[0, 2]], 7.0);
        assert_eq!(s[[1, 2]], -3.5);
    }

    #[test]
    fn test_constant_column_maps_to_lower_bound() {
        let m = array![[4.0, 1.0], [4.0, 2.0], [4.0, 3.0]];
        let s = min_max_scale(&m).unwrap();
        assert!(s.column(0).iter().all(|v| *v == 0.0));
        assert!(s.iter().all(|v| v.is_finite()));
        assert_eq!(s[[2, 1]], 1.0);
    }

    #[test]
    fn test_single_column_rejected() {
        let m = array![[1.0], [2.0]];
        assert!(min_max_scale(&m).unwrap_err().is_invalid_argument());
    }
}
