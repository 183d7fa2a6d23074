//! Dense linear-algebra helpers bridging ndarray and nalgebra.
//!
//! Matrices travel through the crate as ndarray `Array2`; decompositions run on nalgebra
//! `DMatrix`. The helpers here keep that conversion and the ordering/sign conventions of the
//! decompositions in one place.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, SymmetricEigen, SVD};
use ndarray::{Array2, ArrayView2, Axis};

/// Copy an ndarray matrix into a nalgebra one.
pub fn to_dmatrix(a: ArrayView2<'_, f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Copy a nalgebra matrix into an ndarray one.
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Replace `a` by `(a + aᵀ) / 2`.
pub fn symmetrize(a: &mut Array2<f64>) {
    let t = a.t().to_owned();
    *a += &t;
    *a *= 0.5;
}

fn ensure_all_finite(m: &DMatrix<f64>) -> Result<()> {
    if m.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::Linalg {
            reason: "matrix contains NaN or infinite entries",
        })
    }
}

/// Eigendecomposition of a symmetric matrix, eigenvalues descending.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedEigen {
    /// Eigenvalues, largest first.
    pub values: Vec<f64>,
    /// Matching unit eigenvectors, one per column.
    pub vectors: DMatrix<f64>,
}

/// Symmetric eigendecomposition with eigenvalues sorted in descending order.
///
/// The sort is stable, so equal eigenvalues keep the order the solver produced them in.
/// Eigenvector signs are not pinned; see [`pin_sign`].
pub fn eigh_descending(m: DMatrix<f64>) -> Result<SortedEigen> {
    if !m.is_square() {
        return Err(Error::Linalg {
            reason: "eigendecomposition requires a square matrix",
        });
    }
    ensure_all_finite(&m)?;
    let eig = SymmetricEigen::try_new(m, f64::EPSILON, 0).ok_or(Error::Linalg {
        reason: "symmetric eigendecomposition did not converge",
    })?;

    let n = eig.eigenvalues.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[j].total_cmp(&eig.eigenvalues[i]));

    let values = order.iter().map(|&i| eig.eigenvalues[i]).collect();
    let vectors = DMatrix::from_fn(n, n, |row, col| eig.eigenvectors[(row, order[col])]);
    Ok(SortedEigen { values, vectors })
}

/// Flip `v` so that its entry of largest magnitude is positive.
///
/// Ties on magnitude resolve to the first such entry.
pub fn pin_sign(v: &mut [f64]) {
    let mut best = 0;
    for (i, x) in v.iter().enumerate() {
        if x.abs() > v[best].abs() {
            best = i;
        }
    }
    if v.get(best).is_some_and(|x| *x < 0.0) {
        v.iter_mut().for_each(|x| *x = -*x);
    }
}

/// Apply [`pin_sign`] to every row of `a`.
pub fn pin_row_signs(a: &mut Array2<f64>) {
    for mut row in a.axis_iter_mut(Axis(0)) {
        let mut values = row.to_vec();
        pin_sign(&mut values);
        row.iter_mut().zip(values).for_each(|(dst, v)| *dst = v);
    }
}

/// Moore-Penrose pseudo-inverse.
///
/// Singular values below `max(σ) * max(rows, cols) * ε` are treated as zero.
pub fn pinv(a: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let m = to_dmatrix(a);
    ensure_all_finite(&m)?;
    let (rows, cols) = m.shape();
    if rows == 0 || cols == 0 {
        return Ok(Array2::zeros((cols, rows)));
    }
    let svd = SVD::try_new(m, true, true, f64::EPSILON, 0).ok_or(Error::Linalg {
        reason: "singular value decomposition did not converge",
    })?;
    let smax = svd.singular_values.max();
    let eps = smax * rows.max(cols) as f64 * f64::EPSILON;
    let inv = svd
        .pseudo_inverse(eps)
        .map_err(|reason| Error::Linalg { reason })?;
    Ok(to_array2(&inv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn conversions_preserve_layout() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let m = to_dmatrix(a.view());
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(to_array2(&m), a);
    }

    #[test]
    fn symmetrize_averages_off_diagonals() {
        let mut a = array![[1.0, 2.0], [4.0, 3.0]];
        symmetrize(&mut a);
        assert_eq!(a, array![[1.0, 3.0], [3.0, 3.0]]);
    }

    #[test]
    fn eigh_sorts_descending_and_reconstructs() {
        let a = array![[2.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 4.0]];
        let eig = eigh_descending(to_dmatrix(a.view())).expect("eigh");
        assert!(eig.values.windows(2).all(|w| w[0] >= w[1]));

        let v = &eig.vectors;
        let d = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(eig.values.clone()));
        let rebuilt = to_array2(&(v * d * v.transpose()));
        rebuilt
            .iter()
            .zip(a.iter())
            .for_each(|(r, x)| assert_abs_diff_eq!(r, x, epsilon = 1e-12));
    }

    #[test]
    fn eigh_rejects_non_finite_input() {
        let a = array![[1.0, f64::NAN], [f64::NAN, 1.0]];
        assert!(matches!(
            eigh_descending(to_dmatrix(a.view())),
            Err(Error::Linalg { .. })
        ));
    }

    #[test]
    fn pin_sign_makes_dominant_entry_positive() {
        let mut v = [0.1, -0.9, 0.3];
        pin_sign(&mut v);
        assert_eq!(v, [-0.1, 0.9, -0.3]);

        let mut tie = [-0.5, 0.5];
        pin_sign(&mut tie);
        assert_eq!(tie, [0.5, -0.5]);

        let mut rows = array![[0.0, -2.0], [3.0, 1.0]];
        pin_row_signs(&mut rows);
        assert_eq!(rows, array![[0.0, 2.0], [3.0, 1.0]]);
    }

    #[test]
    fn pinv_inverts_full_rank_and_handles_wide_matrices() {
        let a = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = pinv(a.view()).expect("pinv");
        let eye = a.dot(&inv);
        assert_abs_diff_eq!(eye, Array2::eye(2), epsilon = 1e-12);

        let wide = array![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let inv = pinv(wide.view()).expect("pinv");
        assert_eq!(inv.dim(), (3, 2));
        assert_abs_diff_eq!(wide.dot(&inv), Array2::eye(2), epsilon = 1e-12);
    }
}
