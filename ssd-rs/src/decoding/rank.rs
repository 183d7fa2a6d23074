//! Rank detection and whitening of rank-deficient covariance pairs.

use crate::error::{Error, Result};
use crate::linalg::{eigh_descending, symmetrize, to_dmatrix};
use ndarray::{Array2, ArrayView2};

/// How the generalized eigenproblem is posed for a given combined covariance.
#[derive(Debug, Clone, PartialEq)]
pub enum RankReduction {
    /// Full rank; covariances are used as they are.
    Full {
        /// Channel count.
        n_channels: usize,
    },
    /// Rank deficient; covariances are projected onto the retained principal subspace.
    Whitened {
        /// `[rank, channels]` projector with rows `u_i / sqrt(λ_i)`.
        whitener: Array2<f64>,
    },
}

impl RankReduction {
    /// Dimension of the eigenproblem.
    pub fn rank(&self) -> usize {
        match self {
            RankReduction::Full { n_channels } => *n_channels,
            RankReduction::Whitened { whitener } => whitener.nrows(),
        }
    }

    /// Whether the data were rank deficient.
    pub fn is_reduced(&self) -> bool {
        matches!(self, RankReduction::Whitened { .. })
    }

    /// Express a channel-space covariance in the reduced space, `W C Wᵀ`.
    pub fn reduce(&self, cov: ArrayView2<'_, f64>) -> Array2<f64> {
        match self {
            RankReduction::Full { .. } => cov.to_owned(),
            RankReduction::Whitened { whitener } => {
                let mut reduced = whitener.dot(&cov).dot(&whitener.t());
                symmetrize(&mut reduced);
                reduced
            }
        }
    }

    /// Map reduced-space filters (one per row) back to channel space, `V W`.
    pub fn back_project(&self, filters: ArrayView2<'_, f64>) -> Array2<f64> {
        match self {
            RankReduction::Full { .. } => filters.to_owned(),
            RankReduction::Whitened { whitener } => filters.dot(whitener),
        }
    }
}

/// Detects rank deficiency with a cutoff relative to the largest eigenvalue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankReducer {
    rank_tol: f64,
}

impl RankReducer {
    /// Eigenvalues at or below `rank_tol * λ_max` count as zero.
    pub fn new(rank_tol: f64) -> Self {
        Self { rank_tol }
    }

    /// Inspect `combined` (the sum of both band covariances).
    pub fn estimate(&self, combined: ArrayView2<'_, f64>) -> Result<RankReduction> {
        let n_channels = combined.nrows();
        let eig = eigh_descending(to_dmatrix(combined))?;
        let lambda_max = eig.values.first().copied().unwrap_or(0.0);
        if !lambda_max.is_finite() || lambda_max <= 0.0 {
            return Err(Error::DegenerateCovariance);
        }
        let cutoff = self.rank_tol * lambda_max;
        let rank = eig.values.iter().take_while(|&&l| l > cutoff).count();
        if rank == n_channels {
            return Ok(RankReduction::Full { n_channels });
        }

        tracing::info!(rank, n_channels, "covariance is rank deficient; whitening before the eigensolve");
        let whitener = Array2::from_shape_fn((rank, n_channels), |(i, j)| {
            eig.vectors[(j, i)] / eig.values[i].sqrt()
        });
        Ok(RankReduction::Whitened { whitener })
    }
}
