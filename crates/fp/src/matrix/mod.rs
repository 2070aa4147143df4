//! Matrices over $\mathbb{F}_p$ in three physical encodings.
//!
//! Every encoding implements [`FieldMatrix`], which is the only interface the elimination
//! algorithms are written against. The encodings are
//!
//!  * [`ByteMatrix`]: one byte per entry, rows padded to a multiple of 8 bytes.
//!  * [`BatchedMatrix`]: one byte per entry, rows padded to a multiple of [`BATCH_LANES`] bytes and
//!    processed one batch at a time.
//!  * [`PackedMatrix`]: one bit per entry, only valid over $\mathbb{F}_2$.
//!
//! [`AnyMatrix`] is a tagged union of the three, used where the encoding is only known at runtime.
//!
//! Our matrices act on the right, so we think of vectors as row vectors. Row `i` of a matrix with
//! stride `s` occupies entries `[i * s, i * s + columns)` of the backing buffer, and the padding
//! `[columns, s)` of each row is always zero.

use std::{
    fmt,
    io::{self, Read, Write},
    str::FromStr,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::{
    error::{MatrixError, Result},
    prime::ValidPrime,
    vector::RowView,
};

mod any;
mod batched;
mod bytes;
mod generic;
mod packed;

pub use any::AnyMatrix;
pub use batched::BatchedMatrix;
pub use crate::constants::BATCH_LANES;
pub use generic::ByteMatrix;
pub use packed::PackedMatrix;

#[cfg(feature = "proptest")]
pub mod arbitrary;

/// The physical layout of a matrix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Generic,
    Batched,
    Packed,
}

impl Encoding {
    /// The fastest encoding available for a prime.
    pub fn preferred(p: ValidPrime) -> Self {
        if p == 2 {
            Self::Packed
        } else {
            Self::Batched
        }
    }

    /// Whether matrices over `p` can be stored in this encoding.
    pub fn supports(self, p: ValidPrime) -> bool {
        self != Self::Packed || p == 2
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Generic => "generic",
            Self::Batched => "batched",
            Self::Packed => "packed",
        })
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            "batched" | "simd" => Ok(Self::Batched),
            "packed" => Ok(Self::Packed),
            _ => Err(format!("Unknown matrix encoding: {s}")),
        }
    }
}

/// The operations every encoding provides. Entries are exchanged as `u32`s in the range `0..p`.
///
/// Methods taking row or column indices panic when they are out of range, with the exception of
/// [`FieldMatrix::get`] and [`FieldMatrix::set`] which report a [`MatrixError::OutOfBounds`].
pub trait FieldMatrix: Clone + fmt::Debug + PartialEq + Sized {
    const ENCODING: Encoding;

    /// A zero matrix. The stride is chosen by the encoding.
    fn new(p: ValidPrime, rows: usize, columns: usize) -> Result<Self>;

    fn prime(&self) -> ValidPrime;
    fn rows(&self) -> usize;
    fn columns(&self) -> usize;

    /// The number of entries reserved for each row. This is at least `columns()`.
    fn stride(&self) -> usize;

    fn entry(&self, row: usize, column: usize) -> u32;

    /// Set an entry. The value is reduced mod p.
    fn set_entry(&mut self, row: usize, column: usize, value: u32);

    /// Zero every entry in place.
    fn set_to_zero(&mut self);

    /// The column and value of the first nonzero entry of a row, if any.
    fn first_nonzero(&self, row: usize) -> Option<(usize, u32)>;

    /// `self[target] += coeff * self[source]`. The rows must be distinct.
    fn add_row(&mut self, target: usize, source: usize, coeff: u32);

    /// `self[target] += coeff * other[source]`.
    fn add_row_from(&mut self, target: usize, other: &Self, source: usize, coeff: u32);

    /// Overwrite `self[target]` with `other[source]`.
    fn copy_row_from(&mut self, target: usize, other: &Self, source: usize);

    /// Overwrite `self[target]` with `self[source]`.
    fn copy_row_within(&mut self, target: usize, source: usize);

    /// Change the number of rows. Rows `0..min(old, new)` are preserved in place and new rows are
    /// zero. Resizing to zero rows releases the backing buffer.
    fn resize_rows(&mut self, rows: usize) -> Result<()>;

    /// As [`FieldMatrix::add_row`], where every entry of `self[source]` before `start_column` is
    /// known to be zero. Encodings may use this to skip the leading part of the row.
    fn add_row_tail(&mut self, target: usize, source: usize, coeff: u32, start_column: usize) {
        let _ = start_column;
        self.add_row(target, source, coeff)
    }

    /// As [`FieldMatrix::add_row_from`], where every entry of `other[source]` before
    /// `start_column` is known to be zero.
    fn add_row_from_tail(
        &mut self,
        target: usize,
        other: &Self,
        source: usize,
        coeff: u32,
        start_column: usize,
    ) {
        let _ = start_column;
        self.add_row_from(target, other, source, coeff)
    }

    fn identity(p: ValidPrime, dim: usize) -> Result<Self> {
        let mut result = Self::new(p, dim, dim)?;
        result.make_identity();
        Ok(result)
    }

    /// Set a square matrix to the identity.
    fn make_identity(&mut self) {
        assert_eq!(
            self.rows(),
            self.columns(),
            "make_identity requires a square matrix"
        );
        self.set_to_zero();
        for i in 0..self.rows() {
            self.set_entry(i, i, 1);
        }
    }

    fn add_to_entry(&mut self, row: usize, column: usize, value: u32) {
        let p = self.prime();
        let old = self.entry(row, column);
        self.set_entry(row, column, p.sum(old, value % p.as_u32()));
    }

    fn get(&self, row: usize, column: usize) -> Result<u32> {
        self.check_bounds(row, column)?;
        Ok(self.entry(row, column))
    }

    fn set(&mut self, row: usize, column: usize, value: u32) -> Result<()> {
        self.check_bounds(row, column)?;
        self.set_entry(row, column, value);
        Ok(())
    }

    fn check_bounds(&self, row: usize, column: usize) -> Result<()> {
        if row < self.rows() && column < self.columns() {
            Ok(())
        } else {
            Err(MatrixError::OutOfBounds {
                row,
                column,
                rows: self.rows(),
                columns: self.columns(),
            })
        }
    }

    fn row(&self, row: usize) -> RowView<'_, Self> {
        RowView::new(self, row)
    }

    fn is_zero(&self) -> bool {
        (0..self.rows()).all(|i| self.first_nonzero(i).is_none())
    }

    /// Whether every entry is a value in the range `0..p`.
    fn is_reduced(&self) -> bool {
        let p = self.prime().as_u32();
        (0..self.rows()).all(|i| (0..self.columns()).all(|j| self.entry(i, j) < p))
    }

    /// `self += coeff * other`. Both matrices must have the same shape.
    fn add(&mut self, other: &Self, coeff: u32) -> Result<()> {
        assert_eq!(self.prime(), other.prime());
        MatrixError::check_columns(self.columns(), other.columns())?;
        MatrixError::check_columns(self.rows(), other.rows())?;
        let coeff = coeff % self.prime().as_u32();
        if coeff == 0 {
            return Ok(());
        }
        for i in 0..self.rows() {
            self.add_row_from(i, other, i, coeff);
        }
        Ok(())
    }

    /// Keep only the rows listed in `keep`, in that order. The indices must be strictly
    /// increasing, so that each kept row only ever moves up.
    fn shrink_to_rows(&mut self, keep: &[usize]) -> Result<()> {
        for (new, &old) in keep.iter().enumerate() {
            assert!(
                new <= old && old < self.rows(),
                "row index list must be strictly increasing and in range"
            );
            if new > 0 {
                assert!(keep[new - 1] < old, "row index list must be strictly increasing");
            }
            if new != old {
                self.copy_row_within(new, old);
            }
        }
        self.resize_rows(keep.len())
    }

    /// Build a matrix from a list of rows, reducing every entry mod p.
    fn from_rows(p: ValidPrime, rows: &[Vec<u32>], columns: usize) -> Result<Self> {
        let mut result = Self::new(p, rows.len(), columns)?;
        for (i, row) in rows.iter().enumerate() {
            MatrixError::check_columns(columns, row.len())?;
            for (j, &x) in row.iter().enumerate() {
                result.set_entry(i, j, x);
            }
        }
        Ok(result)
    }

    fn to_rows(&self) -> Vec<Vec<u32>> {
        (0..self.rows())
            .map(|i| self.row(i).iter().collect())
            .collect()
    }

    /// A deep copy that reports allocation failure instead of aborting.
    fn try_clone(&self) -> Result<Self> {
        self.convert()
    }

    /// Copy the entries into a matrix of another encoding, one entry at a time.
    ///
    /// # Panics
    /// Panics if the target encoding does not support the prime of `self`.
    fn convert<N: FieldMatrix>(&self) -> Result<N> {
        assert!(
            N::ENCODING.supports(self.prime()),
            "Cannot store a matrix over F_{} in the {} encoding",
            self.prime(),
            N::ENCODING
        );
        let mut result = N::new(self.prime(), self.rows(), self.columns())?;
        for i in 0..self.rows() {
            for j in 0..self.columns() {
                let x = self.entry(i, j);
                if x != 0 {
                    result.set_entry(i, j, x);
                }
            }
        }
        Ok(result)
    }

    /// Write the dimensions as little endian `u64`s followed by every entry as a byte.
    fn to_bytes(&self, buffer: &mut impl Write) -> io::Result<()> {
        buffer.write_u64::<LittleEndian>(self.rows() as u64)?;
        buffer.write_u64::<LittleEndian>(self.columns() as u64)?;
        for i in 0..self.rows() {
            for j in 0..self.columns() {
                buffer.write_u8(self.entry(i, j) as u8)?;
            }
        }
        Ok(())
    }

    fn from_bytes(p: ValidPrime, data: &mut impl Read) -> io::Result<Self> {
        let rows = data.read_u64::<LittleEndian>()? as usize;
        let columns = data.read_u64::<LittleEndian>()? as usize;
        let mut result = Self::new(p, rows, columns)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        for i in 0..rows {
            for j in 0..columns {
                let x = data.read_u8()? as u32;
                if x >= p.as_u32() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("entry {x} is not reduced mod {p}"),
                    ));
                }
                result.set_entry(i, j, x);
            }
        }
        Ok(result)
    }
}

/// The serde form of a matrix: a prime, a column count and a list of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseRows {
    pub p: ValidPrime,
    pub columns: usize,
    pub rows: Vec<Vec<u32>>,
}

impl DenseRows {
    pub fn from_matrix<M: FieldMatrix>(matrix: &M) -> Self {
        Self {
            p: matrix.prime(),
            columns: matrix.columns(),
            rows: matrix.to_rows(),
        }
    }

    pub fn to_matrix<M: FieldMatrix>(&self) -> Result<M> {
        M::from_rows(self.p, &self.rows, self.columns)
    }
}

/// Print one row per line.
pub(crate) fn display_rows<M: FieldMatrix>(matrix: &M, f: &mut fmt::Formatter) -> fmt::Result {
    for i in 0..matrix.rows() {
        writeln!(f, "{}", matrix.row(i))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use rstest::rstest;

    use super::*;

    macro_rules! encoding_tests {
        ($($name:ident: $ty:ty, $p:literal;)*) => {
            $(paste::paste! {
                mod [<$name _tests>] {
                    use super::*;

                    fn p() -> ValidPrime {
                        ValidPrime::new($p)
                    }

                    #[test]
                    fn new_is_zero_and_padded() {
                        let m = <$ty>::new(p(), 3, 70).unwrap();
                        assert_eq!(m.rows(), 3);
                        assert_eq!(m.columns(), 70);
                        assert!(m.stride() >= 70);
                        assert!(m.is_zero());
                    }

                    #[test]
                    fn entries_and_bounds() {
                        let mut m = <$ty>::new(p(), 2, 5).unwrap();
                        m.set(1, 4, 1).unwrap();
                        assert_eq!(m.get(1, 4).unwrap(), 1);
                        assert_eq!(m.first_nonzero(1), Some((4, 1)));
                        assert_eq!(m.first_nonzero(0), None);
                        assert!(matches!(
                            m.get(2, 0),
                            Err(MatrixError::OutOfBounds { row: 2, column: 0, rows: 2, columns: 5 })
                        ));
                        assert!(m.set(0, 5, 1).is_err());
                    }

                    #[test]
                    fn identity() {
                        let m = <$ty>::identity(p(), 4).unwrap();
                        for i in 0..4 {
                            for j in 0..4 {
                                assert_eq!(m.entry(i, j), (i == j) as u32);
                            }
                        }
                    }

                    #[test]
                    fn resize_preserves_prefix() {
                        let mut m = <$ty>::identity(p(), 3).unwrap();
                        m.resize_rows(5).unwrap();
                        assert_eq!(m.rows(), 5);
                        assert_eq!(m.to_rows()[..3], <$ty>::identity(p(), 3).unwrap().to_rows()[..]);
                        assert!(m.row(3).is_zero() && m.row(4).is_zero());
                        m.resize_rows(1).unwrap();
                        assert_eq!(m.to_rows(), vec![vec![1, 0, 0]]);
                        m.resize_rows(0).unwrap();
                        assert_eq!(m.rows(), 0);
                        assert!(m.to_rows().is_empty());
                        m.resize_rows(2).unwrap();
                        assert!(m.is_zero());
                    }

                    #[test]
                    fn shrink_to_rows() {
                        let rows: Vec<Vec<u32>> = (0..5u32).map(|i| vec![i % $p, 1, 0]).collect();
                        let mut m = <$ty>::from_rows(p(), &rows, 3).unwrap();
                        m.shrink_to_rows(&[1, 3, 4]).unwrap();
                        assert_eq!(m.to_rows(), vec![rows[1].clone(), rows[3].clone(), rows[4].clone()]);
                    }

                    #[test]
                    fn oversized_allocation_is_an_error() {
                        assert!(matches!(
                            <$ty>::new(p(), usize::MAX / 4, 64),
                            Err(MatrixError::OutOfMemory { .. })
                        ));

                        let mut m = <$ty>::new(p(), 1, 64).unwrap();
                        assert!(matches!(
                            m.resize_rows(usize::MAX / 2),
                            Err(MatrixError::OutOfMemory { .. })
                        ));
                        assert_eq!(m.rows(), 1);

                        let mut header = Vec::new();
                        header.extend((1u64 << 62).to_le_bytes());
                        header.extend(8u64.to_le_bytes());
                        let err = <$ty>::from_bytes(p(), &mut header.as_slice()).unwrap_err();
                        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
                    }

                    #[test]
                    fn bytes_round_trip() {
                        let m = <$ty>::from_rows(p(), &[vec![1, 0, 1], vec![0, 1, 1]], 3).unwrap();
                        let mut buffer = Vec::new();
                        m.to_bytes(&mut buffer).unwrap();
                        assert_eq!(buffer.len(), 16 + 6);
                        let n = <$ty>::from_bytes(p(), &mut buffer.as_slice()).unwrap();
                        assert_eq!(m, n);
                    }
                }
            })*
        };
    }

    encoding_tests! {
        generic_2: ByteMatrix, 2;
        generic_3: ByteMatrix, 3;
        batched_5: BatchedMatrix, 5;
        batched_251: BatchedMatrix, 251;
        packed_2: PackedMatrix, 2;
    }

    #[rstest]
    #[case(2, Encoding::Packed)]
    #[case(3, Encoding::Batched)]
    #[case(7, Encoding::Batched)]
    fn preferred_encoding(#[case] p: u32, #[case] encoding: Encoding) {
        assert_eq!(Encoding::preferred(ValidPrime::new(p)), encoding);
    }

    #[test]
    fn encoding_names() {
        for e in [Encoding::Generic, Encoding::Batched, Encoding::Packed] {
            assert_eq!(e.to_string().parse::<Encoding>(), Ok(e));
        }
        assert!("dense".parse::<Encoding>().is_err());
        assert_eq!(
            serde_json::from_str::<Encoding>("\"packed\"").unwrap(),
            Encoding::Packed
        );
    }

    #[rstest]
    #[case(ValidPrime::new(2))]
    #[case(ValidPrime::new(3))]
    #[case(ValidPrime::new(13))]
    fn add_scaled(#[case] p: ValidPrime) {
        let mut a = ByteMatrix::from_rows(p, &[vec![1, 2, 3], vec![4, 5, 6]], 3).unwrap();
        let b = ByteMatrix::from_rows(p, &[vec![1, 1, 1], vec![0, 1, 0]], 3).unwrap();
        a.add(&b, 2).unwrap();
        let expected: Vec<Vec<u32>> = vec![vec![3, 4, 5], vec![4, 7, 6]]
            .into_iter()
            .map(|r| r.into_iter().map(|x| x % p.as_u32()).collect())
            .collect();
        assert_eq!(a.to_rows(), expected);
        assert!(a.is_reduced());

        let c = ByteMatrix::new(p, 2, 4).unwrap();
        assert!(matches!(
            a.add(&c, 1),
            Err(MatrixError::DimensionMismatch { left: 3, right: 4 })
        ));
    }

    #[test]
    fn dense_rows_json() {
        let p = ValidPrime::new(3);
        let m = BatchedMatrix::from_rows(p, &[vec![1, 2], vec![0, 1]], 2).unwrap();
        let json = serde_json::to_string(&DenseRows::from_matrix(&m)).unwrap();
        expect![[r#"{"p":3,"columns":2,"rows":[[1,2],[0,1]]}"#]].assert_eq(&json);
        let back: DenseRows = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_matrix::<BatchedMatrix>().unwrap(), m);
    }

    #[test]
    fn from_rows_checks_width() {
        let p = ValidPrime::new(3);
        assert!(matches!(
            ByteMatrix::from_rows(p, &[vec![1, 2], vec![0]], 2),
            Err(MatrixError::DimensionMismatch { left: 2, right: 1 })
        ));
    }
}
