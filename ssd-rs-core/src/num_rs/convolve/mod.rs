use crate::{Error, Result};
use ndarray::{Array1, ArrayView1};
use num_traits::{Float, NumCast};
use rustfft::num_complex::Complex;
use rustfft::{FftNum, FftPlanner};

/// Convolution mode determines behavior near edges and output size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolveMode {
    /// Full convolution, output size is `in1.len() + in2.len() - 1`
    Full,
    /// Valid convolution, output size is `max(in1.len(), in2.len()) - min(in1.len(), in2.len()) + 1`
    Valid,
    /// Same convolution, output size is `max(in1.len(), in2.len())`
    Same,
}

/// Best effort parallel behaviour with numpy's convolve method, evaluated through the FFT so that
/// long FIR kernels stay cheap.
///
/// Returns the discrete, linear convolution of two one-dimensional sequences.
///
/// # Parameters
/// * `a` : (N,) [[array_like]]([ndarray::Array1])
///   Signal to be (linearly) convolved.
/// * `v` : (M,) [[array_like]]([ndarray::Array1])
///   Second one-dimensional input array.
/// * `mode` : [ConvolveMode]
///   [ConvolveMode::Full]:
///   This returns the convolution at each point of overlap, with an output shape of (N+M-1,).
///   At the end-points of the convolution, the signals do not overlap completely, and boundary
///   effects may be seen.
///
///   [ConvolveMode::Same]:
///   Mode 'same' returns output of length ``max(M, N)``, centred on the full output.
///   Boundary effects are still visible.
///
///   [ConvolveMode::Valid]:
///   Mode 'valid' returns output of length ``max(M, N) - min(M, N) + 1``.  The convolution
///   product is only given for points where the signals overlap completely.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use ssd_rs_core::num_rs::{convolve, ConvolveMode};
///
/// let a = array![1.0_f64, 2., 3.];
/// let v = array![0.0_f64, 1., 0.5];
///
/// let result = convolve(a.view(), v.view(), ConvolveMode::Same).unwrap();
/// let expected = [1., 2.5, 4.];
/// assert!(result.iter().zip(expected).all(|(r, e)| (r - e).abs() < 1e-12));
/// ```
pub fn convolve<T>(a: ArrayView1<T>, v: ArrayView1<T>, mode: ConvolveMode) -> Result<Array1<T>>
where
    T: FftNum + Float,
{
    if a.is_empty() {
        return Err(Error::InvalidArg {
            arg: "a".into(),
            reason: "input must be non-empty.".into(),
        });
    }
    if v.is_empty() {
        return Err(Error::InvalidArg {
            arg: "v".into(),
            reason: "input must be non-empty.".into(),
        });
    }

    let full = fft_full(a, v)?;
    let long = a.len().max(v.len());
    let short = a.len().min(v.len());
    let (start, len) = match mode {
        ConvolveMode::Full => (0, full.len()),
        ConvolveMode::Same => ((short - 1) / 2, long),
        ConvolveMode::Valid => (short - 1, long - short + 1),
    };
    Ok(Array1::from_iter(full.into_iter().skip(start).take(len)))
}

fn fft_full<T>(a: ArrayView1<T>, v: ArrayView1<T>) -> Result<Vec<T>>
where
    T: FftNum + Float,
{
    let out_len = a.len() + v.len() - 1;
    let nfft = out_len.next_power_of_two();
    let scale: T = <T as NumCast>::from(nfft).ok_or_else(|| Error::Conv {
        reason: format!("fft length {nfft} is not representable"),
    })?;

    let mut planner = FftPlanner::<T>::new();
    let forward = planner.plan_fft_forward(nfft);
    let inverse = planner.plan_fft_inverse(nfft);

    let mut lhs = vec![Complex::new(T::zero(), T::zero()); nfft];
    let mut rhs = vec![Complex::new(T::zero(), T::zero()); nfft];
    for (dst, src) in lhs.iter_mut().zip(a.iter()) {
        *dst = Complex::new(*src, T::zero());
    }
    for (dst, src) in rhs.iter_mut().zip(v.iter()) {
        *dst = Complex::new(*src, T::zero());
    }
    forward.process(&mut lhs);
    forward.process(&mut rhs);
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        *l = *l * *r;
    }
    inverse.process(&mut lhs);

    Ok(lhs.into_iter().take(out_len).map(|c| c.re / scale).collect())
}

#[cfg(test)]
mod linear_convolve {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn full() {
        let a = array![1., 2., 3.];
        let v = array![0., 1., 0.5];

        let expected = array![0., 1., 2.5, 4., 1.5];
        let result = convolve(a.view(), v.view(), ConvolveMode::Full).unwrap();
        assert_abs_diff_eq!(result, expected, epsilon = 1e-12);
    }

    #[test]
    fn same() {
        let a = array![1., 2., 3.];
        let v = array![0., 1., 0.5];

        let expected = array![1., 2.5, 4.];
        let result = convolve(a.view(), v.view(), ConvolveMode::Same).unwrap();
        assert_abs_diff_eq!(result, expected, epsilon = 1e-12);
    }

    #[test]
    fn valid() {
        let a = array![1., 2., 3.];
        let v = array![0., 1., 0.5];

        let expected = array![2.5];
        let result = convolve(a.view(), v.view(), ConvolveMode::Valid).unwrap();
        assert_abs_diff_eq!(result, expected, epsilon = 1e-12);
    }

    #[test]
    fn same_with_odd_kernel_is_centred() {
        let a = array![0., 0., 1., 0., 0., 0.];
        let v = array![0.25, 0.5, 0.25];

        let result = convolve(a.view(), v.view(), ConvolveMode::Same).unwrap();
        assert_abs_diff_eq!(result, array![0., 0.25, 0.5, 0.25, 0., 0.], epsilon = 1e-12);
    }

    #[test]
    fn rejects_empty_input() {
        let a = Array1::<f64>::zeros(0);
        let v = array![1.0];
        assert!(matches!(
            convolve(a.view(), v.view(), ConvolveMode::Full),
            Err(Error::InvalidArg { .. })
        ));
    }
}
