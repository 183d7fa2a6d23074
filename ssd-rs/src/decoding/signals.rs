use crate::error::{Error, Result};
use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, ArrayViewD, Axis, Ix2, Ix3};

/// Borrowed view of SSD input data.
#[derive(Debug, Clone, Copy)]
pub enum Signals<'a> {
    /// One recording, `[channels, samples]`.
    Continuous(ArrayView2<'a, f64>),
    /// Stack of equal-length trials, `[trials, channels, samples]`.
    Epoched(ArrayView3<'a, f64>),
}

impl<'a> Signals<'a> {
    /// Classify a dynamic-dimensional view; anything but 2-D or 3-D is rejected.
    pub fn from_dyn(x: ArrayViewD<'a, f64>) -> Result<Self> {
        let ndim = x.ndim();
        let signals = match ndim {
            2 => Signals::Continuous(
                x.into_dimensionality::<Ix2>()
                    .map_err(|_| Error::InputDimension { ndim })?,
            ),
            3 => Signals::Epoched(
                x.into_dimensionality::<Ix3>()
                    .map_err(|_| Error::InputDimension { ndim })?,
            ),
            _ => return Err(Error::InputDimension { ndim }),
        };
        if signals.n_epochs() == 0 || signals.n_channels() == 0 || signals.n_samples() == 0 {
            return Err(Error::InvalidArg {
                arg: "X".into(),
                reason: format!("data must not be empty, got shape {:?}", signals.shape()),
            });
        }
        Ok(signals)
    }

    /// Shape of the underlying array.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Signals::Continuous(x) => x.shape().to_vec(),
            Signals::Epoched(x) => x.shape().to_vec(),
        }
    }

    /// Number of trials; `1` for continuous data.
    pub fn n_epochs(&self) -> usize {
        match self {
            Signals::Continuous(_) => 1,
            Signals::Epoched(x) => x.len_of(Axis(0)),
        }
    }

    /// Number of channels (or components).
    pub fn n_channels(&self) -> usize {
        match self {
            Signals::Continuous(x) => x.nrows(),
            Signals::Epoched(x) => x.len_of(Axis(1)),
        }
    }

    /// Samples per trial.
    pub fn n_samples(&self) -> usize {
        match self {
            Signals::Continuous(x) => x.ncols(),
            Signals::Epoched(x) => x.len_of(Axis(2)),
        }
    }

    /// Every trial as a `[channels, samples]` view.
    pub fn epochs(&self) -> Vec<ArrayView2<'a, f64>> {
        match *self {
            Signals::Continuous(x) => vec![x],
            Signals::Epoched(x) => (0..x.len_of(Axis(0)))
                .map(|i| x.index_axis_move(Axis(0), i))
                .collect(),
        }
    }

    /// Run `f` on every trial and restack the results in this layout.
    ///
    /// `f` must return the same shape for every trial.
    pub fn map_epochs<F>(&self, mut f: F) -> Result<ArrayD<f64>>
    where
        F: FnMut(ArrayView2<'a, f64>) -> Result<Array2<f64>>,
    {
        match *self {
            Signals::Continuous(x) => Ok(f(x)?.into_dyn()),
            Signals::Epoched(_) => {
                let mapped = self.epochs().into_iter().map(&mut f).collect::<Result<Vec<_>>>()?;
                let (rows, cols) = mapped.first().map_or((0, 0), |m| m.dim());
                let mut out = Array3::zeros((mapped.len(), rows, cols));
                for (mut dst, src) in out.axis_iter_mut(Axis(0)).zip(&mapped) {
                    dst.assign(src);
                }
                Ok(out.into_dyn())
            }
        }
    }
}
