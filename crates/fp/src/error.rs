use std::collections::TryReserveError;

use thiserror::Error;

/// Recoverable failures of the storage layer.
///
/// Mismatched primes and undefined encoding conversions are not represented here. Those are
/// integration errors and panic with a diagnostic instead.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("out of memory while allocating {entries} entries: {source}")]
    OutOfMemory {
        entries: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("dimensions inconsistent: {left} columns against {right} columns")]
    DimensionMismatch { left: usize, right: usize },

    #[error("entry ({row}, {column}) is out of bounds for a {rows} x {columns} matrix")]
    OutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },
}

pub type Result<T> = std::result::Result<T, MatrixError>;

impl MatrixError {
    /// Fail with [`MatrixError::DimensionMismatch`] unless the two widths agree.
    pub fn check_columns(left: usize, right: usize) -> Result<()> {
        if left == right {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { left, right })
        }
    }
}

/// The number of entries in `rows` rows of `stride` entries each. An overflowing product saturates
/// to `usize::MAX`, which [`try_zeroed`] and [`try_resize`] reject with a capacity overflow.
pub(crate) const fn storage_len(rows: usize, stride: usize) -> usize {
    rows.saturating_mul(stride)
}

/// Allocate a zeroed buffer of `len` entries, reporting allocation failure as a value.
pub(crate) fn try_zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|source| MatrixError::OutOfMemory {
            entries: len,
            source,
        })?;
    data.resize(len, T::default());
    Ok(data)
}

/// Grow or shrink `data` to exactly `len` entries, zero-filling new space. Shrinking to zero frees
/// the allocation, leaving an empty buffer rather than an error.
pub(crate) fn try_resize<T: Copy + Default>(data: &mut Vec<T>, len: usize) -> Result<()> {
    if len == 0 {
        *data = Vec::new();
        return Ok(());
    }
    if len > data.len() {
        data.try_reserve_exact(len - data.len())
            .map_err(|source| MatrixError::OutOfMemory {
                entries: len,
                source,
            })?;
        data.resize(len, T::default());
    } else {
        data.truncate(len);
        data.shrink_to_fit();
    }
    Ok(())
}
