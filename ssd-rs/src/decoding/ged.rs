//! Generalized eigendecomposition of the signal/noise covariance pair.

use crate::error::{Error, Result};
use crate::linalg::{eigh_descending, pin_row_signs, pinv, to_array2, to_dmatrix};
use nalgebra::Cholesky;
use ndarray::{Array2, ArrayView2};

/// Solution of `A v = λ (A + B) v`.
#[derive(Debug, Clone, PartialEq)]
pub struct GedSolution {
    /// Eigenvalues in `[0, 1]` (relative signal power), descending.
    pub eigenvalues: Vec<f64>,
    /// One eigenvector per row, matching `eigenvalues`; largest-magnitude entry positive.
    pub filters: Array2<f64>,
}

/// Solves `A v = λ (A + B) v` for symmetric `A` (signal band) and `B` (noise flanks).
///
/// `A + B` is factored as `L Lᵀ`; the symmetric problem `L⁻¹ A L⁻ᵀ u = λ u` is solved and
/// mapped back with `v = L⁻ᵀ u`, so every `v` is `(A + B)`-normalised.
pub fn generalized_eigh(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<GedSolution> {
    let n = a.nrows();
    if a.dim() != (n, n) || b.dim() != (n, n) {
        return Err(Error::Linalg {
            reason: "generalized eigenproblem needs two square matrices of equal size",
        });
    }
    let a = to_dmatrix(a);
    let combined = &a + to_dmatrix(b);
    let chol = Cholesky::new(combined).ok_or(Error::NotPositiveDefinite { rank: n })?;
    let l = chol.l();

    let half = l
        .solve_lower_triangular(&a)
        .ok_or(Error::NotPositiveDefinite { rank: n })?;
    let c = l
        .solve_lower_triangular(&half.transpose())
        .ok_or(Error::NotPositiveDefinite { rank: n })?;
    let c = (&c + c.transpose()) * 0.5;

    let eig = eigh_descending(c)?;
    let v = l
        .tr_solve_lower_triangular(&eig.vectors)
        .ok_or(Error::NotPositiveDefinite { rank: n })?;

    let mut filters = to_array2(&v.transpose());
    pin_row_signs(&mut filters);
    Ok(GedSolution {
        eigenvalues: eig.values,
        filters,
    })
}

/// Spatial patterns of `filters` (`[components, channels]`): the rows of `pinv(filters)ᵀ`.
pub fn patterns_from_filters(filters: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    Ok(pinv(filters)?.reversed_axes())
}
