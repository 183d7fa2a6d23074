//! Numpy-like array routines.

mod convolve;

pub use convolve::*;
