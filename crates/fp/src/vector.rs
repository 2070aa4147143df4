//! Vectors over $\mathbb{F}_p$.
//!
//! An [`FpVector`] owns its entries. A [`RowView`] is a non-owning view onto one row of a matrix;
//! it borrows the matrix, so it cannot outlive it or be used across a resize.

use std::fmt;

use itertools::Itertools;

use crate::{matrix::FieldMatrix, prime::ValidPrime};

/// An owned vector over $\mathbb{F}_p$, one byte per entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FpVector {
    p: ValidPrime,
    entries: Vec<u8>,
}

impl FpVector {
    pub fn new(p: ValidPrime, len: usize) -> Self {
        Self {
            p,
            entries: vec![0; len],
        }
    }

    /// Build a vector from a list of integers, reducing each of them mod p.
    pub fn from_slice(p: ValidPrime, slice: &[u32]) -> Self {
        Self {
            p,
            entries: slice.iter().map(|&x| (x % p.as_u32()) as u8).collect(),
        }
    }

    pub fn prime(&self) -> ValidPrime {
        self.p
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> u32 {
        self.entries[index] as u32
    }

    pub fn set_entry(&mut self, index: usize, value: u32) {
        self.entries[index] = (value % self.p.as_u32()) as u8;
    }

    pub fn set_to_zero(&mut self) {
        self.entries.fill(0);
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|&x| x == 0)
    }

    /// Add `c * other` to `self`.
    pub fn add(&mut self, other: &Self, c: u32) {
        assert_eq!(self.p, other.p);
        assert_eq!(self.len(), other.len());
        let p = self.p;
        for (x, &y) in self.entries.iter_mut().zip_eq(&other.entries) {
            *x = p.sum(*x as u32, p.product(c, y as u32)) as u8;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|&x| x as u32)
    }

    pub fn iter_nonzero(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.iter().enumerate().filter(|&(_, x)| x != 0)
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl fmt::Display for FpVector {
    /// # Example
    /// ```
    /// # use fp::vector::FpVector;
    /// # use fp::prime::ValidPrime;
    /// let v = FpVector::from_slice(ValidPrime::new(3), &[1, 2, 4]);
    /// assert_eq!(&format!("{v}"), "[1, 2, 1]");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.iter().format(", "))
    }
}

/// A borrowed row of a matrix.
#[derive(Debug)]
pub struct RowView<'a, M: FieldMatrix> {
    matrix: &'a M,
    row: usize,
}

impl<M: FieldMatrix> Clone for RowView<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: FieldMatrix> Copy for RowView<'_, M> {}

impl<'a, M: FieldMatrix> RowView<'a, M> {
    pub(crate) fn new(matrix: &'a M, row: usize) -> Self {
        assert!(
            row < matrix.rows(),
            "row {row} out of range for a matrix with {} rows",
            matrix.rows()
        );
        Self { matrix, row }
    }

    pub fn prime(&self) -> ValidPrime {
        self.matrix.prime()
    }

    pub fn index(&self) -> usize {
        self.row
    }

    pub fn len(&self) -> usize {
        self.matrix.columns()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, column: usize) -> u32 {
        self.matrix.entry(self.row, column)
    }

    pub fn is_zero(&self) -> bool {
        self.matrix.first_nonzero(self.row).is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        let (matrix, row) = (self.matrix, self.row);
        (0..matrix.columns()).map(move |j| matrix.entry(row, j))
    }

    pub fn to_vector(&self) -> FpVector {
        FpVector::from_slice(self.prime(), &self.iter().collect::<Vec<_>>())
    }
}

impl<M: FieldMatrix> fmt::Display for RowView<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.iter().format(", "))
    }
}
