use std::fmt;

use super::{bytes::ByteRows, display_rows, Encoding, FieldMatrix};
use crate::{error::Result, prime::ValidPrime};

/// The reference encoding: one byte per entry and plain scalar arithmetic. Every prime is
/// supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ByteMatrix {
    inner: ByteRows,
}

/// Rows are padded to a whole number of words.
const ALIGN: usize = 8;

/// `target[i] = (target[i] + coeff * source[i]) mod p` over the first `len` entries.
fn add_scaled(p: ValidPrime, target: &mut [u8], source: &[u8], coeff: u32, start: usize, len: usize) {
    let p = p.as_u32();
    for (t, &s) in target[start..len].iter_mut().zip(&source[start..len]) {
        *t = ((*t as u32 + coeff * s as u32) % p) as u8;
    }
}

impl FieldMatrix for ByteMatrix {
    const ENCODING: Encoding = Encoding::Generic;

    fn new(p: ValidPrime, rows: usize, columns: usize) -> Result<Self> {
        Ok(Self {
            inner: ByteRows::new(p, rows, columns, ALIGN)?,
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

    fn first_nonzero(&self, row: usize) -> Option<(usize, u32)> {
        let columns = self.columns();
        self.inner.row(row)[..columns]
            .iter()
            .position(|&x| x != 0)
            .map(|j| (j, self.inner.row(row)[j] as u32))
    }

    fn add_row(&mut self, target: usize, source: usize, coeff: u32) {
        self.add_row_tail(target, source, coeff, 0)
    }

    fn add_row_tail(&mut self, target: usize, source: usize, coeff: u32, start_column: usize) {
        let coeff = coeff % self.prime().as_u32();
        if coeff == 0 {
            return;
        }
        let (p, columns) = (self.prime(), self.columns());
        let (t, s) = self.inner.split_rows(target, source);
        add_scaled(p, t, s, coeff, start_column.min(columns), columns);
    }

    fn add_row_from(&mut self, target: usize, other: &Self, source: usize, coeff: u32) {
        self.add_row_from_tail(target, other, source, coeff, 0)
    }

    fn add_row_from_tail(
        &mut self,
        target: usize,
        other: &Self,
        source: usize,
        coeff: u32,
        start_column: usize,
    ) {
        assert_eq!(self.prime(), other.prime());
        assert_eq!(self.columns(), other.columns());
        let coeff = coeff % self.prime().as_u32();
        if coeff == 0 {
            return;
        }
        let (p, columns) = (self.prime(), self.columns());
        add_scaled(
            p,
            self.inner.row_mut(target),
            other.inner.row(source),
            coeff,
            start_column.min(columns),
            columns,
        );
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

impl fmt::Display for ByteMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        display_rows(self, f)
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn stride_is_word_aligned() {
        let p = ValidPrime::new(3);
        assert_eq!(ByteMatrix::new(p, 1, 1).unwrap().stride(), 8);
        assert_eq!(ByteMatrix::new(p, 1, 8).unwrap().stride(), 8);
        assert_eq!(ByteMatrix::new(p, 1, 9).unwrap().stride(), 16);
        assert_eq!(ByteMatrix::new(p, 0, 0).unwrap().stride(), 0);
    }

    #[test]
    fn row_operations() {
        let p = ValidPrime::new(7);
        let mut m = ByteMatrix::from_rows(p, &[vec![1, 2, 3], vec![6, 6, 6], vec![0, 0, 1]], 3)
            .unwrap();
        m.add_row(1, 0, 3);
        m.add_row(0, 2, 6);
        expect![[r#"
            [1, 2, 2]
            [2, 5, 1]
            [0, 0, 1]
        "#]]
        .assert_eq(&m.to_string());

        m.add_row_tail(1, 2, 1, 2);
        assert_eq!(m.to_rows()[1], vec![2, 5, 2]);

        m.copy_row_within(2, 0);
        assert_eq!(m.to_rows()[2], vec![1, 2, 2]);
    }

    #[test]
    fn padding_stays_zero() {
        let p = ValidPrime::new(5);
        let mut m = ByteMatrix::new(p, 2, 3).unwrap();
        m.set_entry(0, 2, 4);
        m.set_entry(1, 0, 3);
        m.add_row(1, 0, 4);
        for i in 0..2 {
            assert!(m.inner.row(i)[3..].iter().all(|&x| x == 0));
        }
    }
}
