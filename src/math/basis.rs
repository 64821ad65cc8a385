//! Polynomial basis for local trend fits.
//!
//! Each local fit is expressed in a centred, scaled time coordinate
//!
//! ```text
//! u = (t - t_centre) / half_width
//! ```
//!
//! so that `u ∈ [-1, 1]` over the window. Raw times are ~1e3 days (BTJD), and
//! powers of un-centred times make the design matrix badly conditioned. With the
//! centred coordinate the trend at `t_centre` is simply `β0`.

use nalgebra::DMatrix;

/// Build a `(n, order + 1)` design matrix of powers of the scaled coordinate.
pub fn poly_design(times: &[f64], centre: f64, half_width: f64, order: usize) -> DMatrix<f64> {
    let scale = if half_width.is_finite() && half_width > 0.0 {
        half_width
    } else {
        1.0
    };
    let cols = order + 1;
    let mut x = DMatrix::zeros(times.len(), cols);
    for (i, &t) in times.iter().enumerate() {
        let u = (t - centre) / scale;
        let mut p = 1.0;
        for j in 0..cols {
            x[(i, j)] = p;
            p *= u;
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_rows_are_powers_of_scaled_time() {
        let x = poly_design(&[1.0, 3.0], 2.0, 1.0, 2);
        assert_eq!(x.ncols(), 3);
        assert_eq!(x[(0, 0)], 1.0);
        assert_eq!(x[(0, 1)], -1.0);
        assert_eq!(x[(0, 2)], 1.0);
        assert_eq!(x[(1, 1)], 1.0);
    }

    #[test]
    fn degenerate_half_width_falls_back_to_unit_scale() {
        let x = poly_design(&[2.5], 2.0, 0.0, 1);
        assert_eq!(x[(0, 1)], 0.5);
    }
}
