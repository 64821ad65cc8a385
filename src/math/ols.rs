//! Least squares solver.
//!
//! The detrender repeatedly solves small linear regression problems of the form:
//!
//! ```text
//! minimize Σ (f_i - x_i^T β)^2
//! ```
//!
//! where `x_i` holds the powers of the (centred, scaled) sample time.
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when
//!   the design matrix is tall (more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The parameter dimension is tiny (`polyorder + 1` columns), so SVD cost is
//!   dominated by the window length.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Windows that straddle a short segment can be nearly degenerate, so try
    // progressively looser tolerances before giving up.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
