//! Digital FIR filter design and zero-phase application.

/// Windowed-sinc FIR design.
pub mod design;

mod fir;

pub use fir::*;
