use super::{ConfigError, ExecInvariantViolation};

use ndarray::{ArrayBase, Data, DataMut, Ix1};

/// A single channel of input samples, borrowable as one contiguous slice.
pub trait Read1D<T> {
    /// Samples in order; strided storage is rejected.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// A caller-owned output buffer, borrowable as one contiguous slice.
pub trait Write1D<T> {
    /// Output slots in order; strided storage is rejected.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

/// Owned arrays and views alike; a channel row of a standard-layout `[channels, samples]`
/// matrix qualifies, a column does not.
impl<S, T> Read1D<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
{
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice().ok_or(ConfigError::NonContiguous { arg: "input" })
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

impl<S, T> Write1D<T> for ArrayBase<S, Ix1>
where
    S: DataMut<Elem = T>,
{
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut().ok_or(ConfigError::NonContiguous { arg: "output" })
    }
}

/// Borrow `out` as exactly `expected` writable slots.
pub(crate) fn bind_output<'a, T, O>(
    out: &'a mut O,
    arg: &'static str,
    expected: usize,
) -> Result<&'a mut [T], ExecInvariantViolation>
where
    O: Write1D<T> + ?Sized,
{
    let slots = out.write_slice_mut()?;
    if slots.len() == expected {
        Ok(slots)
    } else {
        Err(ExecInvariantViolation::LengthMismatch {
            arg,
            expected,
            got: slots.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Read1D, Write1D};
    use ndarray::{array, Array1, Array2};

    #[test]
    fn channel_rows_read_as_slices() {
        let data: Array2<f64> = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(data.row(1).read_slice(), Ok(&[4.0, 5.0, 6.0][..]));
    }

    #[test]
    fn channel_columns_are_rejected() {
        let data: Array2<f64> = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(
            data.column(0).read_slice(),
            Err(ConfigError::NonContiguous { arg: "input" })
        );
    }

    #[test]
    fn owned_buffers_are_writable() {
        let mut out = Array1::<f64>::zeros(3);
        out.write_slice_mut()
            .expect("owned array is contiguous")
            .copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(out, array![1.0, 2.0, 3.0]);

        let mut data = Array2::<f64>::zeros((2, 2));
        let mut column = data.column_mut(1);
        assert_eq!(
            column.write_slice_mut(),
            Err(ConfigError::NonContiguous { arg: "output" })
        );
    }
}
