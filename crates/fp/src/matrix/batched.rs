use std::fmt;

use super::{bytes::ByteRows, display_rows, Encoding, FieldMatrix};
use crate::{constants::BATCH_LANES, error::Result, prime::ValidPrime};

/// One byte per entry, with rows padded to a whole number of [`BATCH_LANES`]-entry batches. Row
/// operations run batch by batch with a branch-free reduction, which the compiler turns into vector
/// instructions. Every prime is supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchedMatrix {
    inner: ByteRows,
}

/// Reduction mod p of integers below 2^16 by a multiply and a shift.
///
/// With `m = floor(2^16 / p)` the estimate `q = (x * m) >> 16` is either `floor(x / p)` or one
/// less, so `x - q * p` lies in `[0, 2p)` and a single conditional subtraction finishes the job.
#[derive(Debug, Copy, Clone)]
struct Reducer {
    p: u32,
    m: u32,
}

impl Reducer {
    fn new(p: ValidPrime) -> Self {
        let p = p.as_u32();
        Self { p, m: (1 << 16) / p }
    }

    #[inline(always)]
    fn reduce(self, x: u32) -> u32 {
        debug_assert!(x < 1 << 16);
        let q = (x * self.m) >> 16;
        let r = x - q * self.p;
        r - self.p * (r >= self.p) as u32
    }
}

/// Fused multiply-add over whole batches, `target += coeff * source`. The entries are below p and
/// `coeff < p <= 251`, so every intermediate sum is below 2^16.
fn fma_batches(reducer: Reducer, target: &mut [u8], source: &[u8], coeff: u32) {
    for (t, s) in target
        .chunks_exact_mut(BATCH_LANES)
        .zip(source.chunks_exact(BATCH_LANES))
    {
        let mut lanes = [0u32; BATCH_LANES];
        for ((lane, &x), &y) in lanes.iter_mut().zip(t.iter()).zip(s) {
            *lane = x as u32 + coeff * y as u32;
        }
        for (x, &lane) in t.iter_mut().zip(&lanes) {
            *x = reducer.reduce(lane) as u8;
        }
    }
}

impl BatchedMatrix {
    fn fma(&mut self, target: usize, other: Option<&Self>, source: usize, coeff: u32, start: usize) {
        let coeff = coeff % self.prime().as_u32();
        if coeff == 0 {
            return;
        }
        let reducer = Reducer::new(self.prime());
        // Batches before the one containing `start` are zero in the source row.
        let first = (start.min(self.columns()) / BATCH_LANES) * BATCH_LANES;
        match other {
            Some(other) => {
                assert_eq!(self.prime(), other.prime());
                assert_eq!(self.columns(), other.columns());
                let t = self.inner.row_mut(target);
                fma_batches(reducer, &mut t[first..], &other.inner.row(source)[first..], coeff);
            }
            None => {
                let (t, s) = self.inner.split_rows(target, source);
                fma_batches(reducer, &mut t[first..], &s[first..], coeff);
            }
        }
    }
}

impl FieldMatrix for BatchedMatrix {
    const ENCODING: Encoding = Encoding::Batched;

    fn new(p: ValidPrime, rows: usize, columns: usize) -> Result<Self> {
        Ok(Self {
            inner: ByteRows::new(p, rows, columns, BATCH_LANES)?,
        })
    }

    fn prime(&self) -> ValidPrime {
        self.inner.p
    }

    fn rows(&self) -> usize {
        self.inner.rows
    }

    fn columns(&self) -> usize {
        self.inner.columns
    }

    fn stride(&self) -> usize {
        self.inner.stride
    }

    fn entry(&self, row: usize, column: usize) -> u32 {
        self.inner.entry(row, column)
    }

    fn set_entry(&mut self, row: usize, column: usize, value: u32) {
        self.inner.set_entry(row, column, value)
    }

    fn set_to_zero(&mut self) {
        self.inner.set_to_zero()
    }

    /// Skips whole zero batches before looking at individual entries. The padding is zero, so a hit
    /// is always a real column.
    fn first_nonzero(&self, row: usize) -> Option<(usize, u32)> {
        self.inner
            .row(row)
            .chunks_exact(BATCH_LANES)
            .enumerate()
            .filter(|(_, batch)| batch.iter().fold(0, |acc, &x| acc | x) != 0)
            .find_map(|(i, batch)| {
                batch
                    .iter()
                    .position(|&x| x != 0)
                    .map(|j| (i * BATCH_LANES + j, batch[j] as u32))
            })
    }

    fn add_row(&mut self, target: usize, source: usize, coeff: u32) {
        self.fma(target, None, source, coeff, 0)
    }

    fn add_row_tail(&mut self, target: usize, source: usize, coeff: u32, start_column: usize) {
        self.fma(target, None, source, coeff, start_column)
    }

    fn add_row_from(&mut self, target: usize, other: &Self, source: usize, coeff: u32) {
        self.fma(target, Some(other), source, coeff, 0)
    }

    fn add_row_from_tail(
        &mut self,
        target: usize,
        other: &Self,
        source: usize,
        coeff: u32,
        start_column: usize,
    ) {
        self.fma(target, Some(other), source, coeff, start_column)
    }

    fn copy_row_from(&mut self, target: usize, other: &Self, source: usize) {
        self.inner.copy_row_from(target, &other.inner, source)
    }

    fn copy_row_within(&mut self, target: usize, source: usize) {
        self.inner.copy_row_within(target, source)
    }

    fn resize_rows(&mut self, rows: usize) -> Result<()> {
        self.inner.resize_rows(rows)
    }
}

impl fmt::Display for BatchedMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        display_rows(self, f)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{constants::PRIMES, matrix::ByteMatrix};

    #[test]
    fn reducer_is_exact() {
        for &p in PRIMES.iter() {
            let reducer = Reducer::new(ValidPrime::new(p));
            let bound = (p - 1) + (p - 1) * (p - 1);
            for x in 0..=bound {
                assert_eq!(reducer.reduce(x), x % p, "x = {x}, p = {p}");
            }
        }
    }

    #[test]
    fn stride_is_a_whole_batch() {
        let p = ValidPrime::new(3);
        assert_eq!(BatchedMatrix::new(p, 1, 1).unwrap().stride(), BATCH_LANES);
        assert_eq!(BatchedMatrix::new(p, 1, 33).unwrap().stride(), 2 * BATCH_LANES);
    }

    #[test]
    fn pivot_in_second_batch() {
        let p = ValidPrime::new(5);
        let mut m = BatchedMatrix::new(p, 1, 100).unwrap();
        assert_eq!(m.first_nonzero(0), None);
        m.set_entry(0, 70, 3);
        m.set_entry(0, 99, 1);
        assert_eq!(m.first_nonzero(0), Some((70, 3)));
    }

    proptest! {
        #[test]
        fn agrees_with_generic(
            p in any::<ValidPrime>(),
            entries in proptest::collection::vec(any::<u32>(), 2 * 45),
            coeff in any::<u32>(),
            start in 0usize..45,
        ) {
            let rows: Vec<Vec<u32>> = entries.chunks(45).map(|r| r.to_vec()).collect();
            let mut rows = rows;
            // The tail operation may assume the source vanishes before `start`.
            for x in &mut rows[1][..start] {
                *x = 0;
            }
            let mut batched = BatchedMatrix::from_rows(p, &rows, 45).unwrap();
            let mut generic = ByteMatrix::from_rows(p, &rows, 45).unwrap();
            batched.add_row_tail(0, 1, coeff, start);
            generic.add_row_tail(0, 1, coeff, start);
            prop_assert_eq!(batched.to_rows(), generic.to_rows());
            prop_assert!(batched.is_reduced());
        }
    }
}
