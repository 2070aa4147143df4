use std::fmt;

use super::{display_rows, Encoding, FieldMatrix};
use crate::{
    constants::BITS_PER_LIMB,
    error::{storage_len, try_resize, try_zeroed, Result},
    limb::{self, Limb},
    prime::{ValidPrime, TWO},
    simd,
};

/// Rows are padded to a whole number of 256-bit registers.
const LIMB_ALIGN: usize = 4;

/// A matrix over $\mathbb{F}_2$ with one bit per entry. Entry `j` of a row is bit `j % 64` of limb
/// `j / 64`, and adding two rows is a XOR of their limbs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedMatrix {
    rows: usize,
    columns: usize,
    /// Limbs per row.
    stride: usize,
    data: Vec<Limb>,
}

impl PackedMatrix {
    fn limbs(&self, row: usize) -> &[Limb] {
        assert!(row < self.rows, "row {row} out of range ({} rows)", self.rows);
        &self.data[row * self.stride..(row + 1) * self.stride]
    }

    fn limbs_mut(&mut self, row: usize) -> &mut [Limb] {
        assert!(row < self.rows, "row {row} out of range ({} rows)", self.rows);
        &mut self.data[row * self.stride..(row + 1) * self.stride]
    }

    fn check_column(&self, column: usize) {
        assert!(
            column < self.columns,
            "column {column} out of range ({} columns)",
            self.columns
        );
    }

    /// Iterate over the entries of a row, a whole limb at a time.
    pub fn row_bits(&self, row: usize) -> impl Iterator<Item = u32> + '_ {
        self.limbs(row)
            .iter()
            .flat_map(|&l| limb::unpack(l))
            .take(self.columns)
    }

    fn xor_rows(&mut self, target: usize, source: usize, start_column: usize) {
        assert_ne!(target, source, "cannot combine a row with itself");
        assert!(target < self.rows && source < self.rows);
        let stride = self.stride;
        let min_limb = start_column / BITS_PER_LIMB;
        let (t, s) = if target < source {
            let (head, tail) = self.data.split_at_mut(source * stride);
            (&mut head[target * stride..(target + 1) * stride], &tail[..stride])
        } else {
            let (head, tail) = self.data.split_at_mut(target * stride);
            (&mut tail[..stride], &head[source * stride..(source + 1) * stride])
        };
        simd::xor_limbs(t, s, min_limb);
    }
}

impl FieldMatrix for PackedMatrix {
    const ENCODING: Encoding = Encoding::Packed;

    /// # Panics
    /// Panics if `p` is not 2.
    fn new(p: ValidPrime, rows: usize, columns: usize) -> Result<Self> {
        assert_eq!(p, TWO, "The packed encoding only supports p = 2, not p = {p}");
        let stride = limb::round_up(limb::number(columns), LIMB_ALIGN);
        Ok(Self {
            rows,
            columns,
            stride,
            data: try_zeroed(storage_len(rows, stride))?,
        })
    }

    fn prime(&self) -> ValidPrime {
        TWO
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn stride(&self) -> usize {
        self.stride * BITS_PER_LIMB
    }

    fn entry(&self, row: usize, column: usize) -> u32 {
        self.check_column(column);
        let pair = limb::limb_bit_index_pair(column);
        ((self.limbs(row)[pair.limb] >> pair.bit_index) & 1) as u32
    }

    fn set_entry(&mut self, row: usize, column: usize, value: u32) {
        self.check_column(column);
        let pair = limb::limb_bit_index_pair(column);
        let limb = &mut self.limbs_mut(row)[pair.limb];
        *limb &= !(1 << pair.bit_index);
        *limb |= ((value & 1) as Limb) << pair.bit_index;
    }

    fn set_to_zero(&mut self) {
        self.data.fill(0);
    }

    fn first_nonzero(&self, row: usize) -> Option<(usize, u32)> {
        limb::first_set_bit(self.limbs(row)).map(|j| (j, 1))
    }

    fn add_row(&mut self, target: usize, source: usize, coeff: u32) {
        self.add_row_tail(target, source, coeff, 0)
    }

    fn add_row_tail(&mut self, target: usize, source: usize, coeff: u32, start_column: usize) {
        if coeff % 2 == 1 {
            self.xor_rows(target, source, start_column);
        }
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
        assert_eq!(self.columns, other.columns);
        if coeff % 2 == 1 {
            let min_limb = start_column / BITS_PER_LIMB;
            simd::xor_limbs(self.limbs_mut(target), other.limbs(source), min_limb);
        }
    }

    fn copy_row_from(&mut self, target: usize, other: &Self, source: usize) {
        assert_eq!(self.columns, other.columns);
        self.limbs_mut(target).copy_from_slice(other.limbs(source));
    }

    fn copy_row_within(&mut self, target: usize, source: usize) {
        assert!(target < self.rows && source < self.rows);
        let stride = self.stride;
        self.data
            .copy_within(source * stride..(source + 1) * stride, target * stride);
    }

    fn resize_rows(&mut self, rows: usize) -> Result<()> {
        try_resize(&mut self.data, storage_len(rows, self.stride))?;
        self.rows = rows;
        Ok(())
    }

    fn to_rows(&self) -> Vec<Vec<u32>> {
        (0..self.rows).map(|i| self.row_bits(i).collect()).collect()
    }
}

impl fmt::Display for PackedMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        display_rows(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ByteMatrix;

    #[test]
    #[should_panic(expected = "only supports p = 2")]
    fn rejects_odd_primes() {
        let _ = PackedMatrix::new(ValidPrime::new(3), 1, 1);
    }

    #[test]
    fn stride_is_register_aligned() {
        let m = PackedMatrix::new(TWO, 2, 65).unwrap();
        assert_eq!(m.stride, 4);
        assert_eq!(m.stride(), 256);
        let m = PackedMatrix::new(TWO, 2, 257).unwrap();
        assert_eq!(m.stride, 8);
    }

    #[test]
    fn xor_matches_byte_arithmetic() {
        let rows: Vec<Vec<u32>> = (0..3)
            .map(|i| (0..300).map(|j| ((i * 7 + j * j) % 3 == 0) as u32).collect())
            .collect();
        let mut packed = PackedMatrix::from_rows(TWO, &rows, 300).unwrap();
        let mut bytes = ByteMatrix::from_rows(TWO, &rows, 300).unwrap();
        for m in [&mut bytes as &mut dyn RowOps, &mut packed] {
            m.combine(0, 1);
            m.combine(2, 0);
            m.combine(1, 2);
        }
        assert_eq!(packed.to_rows(), bytes.to_rows());
        assert_eq!(packed.first_nonzero(1), bytes.first_nonzero(1));
    }

    trait RowOps {
        fn combine(&mut self, target: usize, source: usize);
    }

    impl<M: FieldMatrix> RowOps for M {
        fn combine(&mut self, target: usize, source: usize) {
            self.add_row(target, source, 1);
        }
    }

    #[test]
    fn even_coefficients_vanish() {
        let mut m = PackedMatrix::from_rows(TWO, &[vec![1, 0], vec![1, 1]], 2).unwrap();
        m.add_row(0, 1, 2);
        assert_eq!(m.to_rows(), vec![vec![1, 0], vec![1, 1]]);
        m.add_row(0, 1, 3);
        assert_eq!(m.to_rows(), vec![vec![0, 1], vec![1, 1]]);
    }
}
