use std::{
    fmt,
    io::{self, Read, Write},
};

use super::{BatchedMatrix, ByteMatrix, Encoding, FieldMatrix, PackedMatrix};
use crate::{
    error::{MatrixError, Result},
    macros::dispatch_matrix,
    prime::ValidPrime,
};

/// A matrix whose encoding is chosen at runtime.
///
/// The variant always describes the current physical representation. Operations that change the
/// representation, such as [`AnyMatrix::add`] on mismatched encodings, replace the variant along
/// with the data.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyMatrix {
    Generic(ByteMatrix),
    Batched(BatchedMatrix),
    Packed(PackedMatrix),
}

impl AnyMatrix {
    /// A zero matrix in the given encoding.
    ///
    /// # Panics
    /// Panics if `encoding` is [`Encoding::Packed`] and `p` is not 2.
    pub fn new(encoding: Encoding, p: ValidPrime, rows: usize, columns: usize) -> Result<Self> {
        Ok(match encoding {
            Encoding::Generic => Self::Generic(ByteMatrix::new(p, rows, columns)?),
            Encoding::Batched => Self::Batched(BatchedMatrix::new(p, rows, columns)?),
            Encoding::Packed => Self::Packed(PackedMatrix::new(p, rows, columns)?),
        })
    }

    pub fn identity(encoding: Encoding, p: ValidPrime, dim: usize) -> Result<Self> {
        let mut result = Self::new(encoding, p, dim, dim)?;
        result.make_identity();
        Ok(result)
    }

    pub fn from_rows(
        encoding: Encoding,
        p: ValidPrime,
        rows: &[Vec<u32>],
        columns: usize,
    ) -> Result<Self> {
        Ok(match encoding {
            Encoding::Generic => Self::Generic(ByteMatrix::from_rows(p, rows, columns)?),
            Encoding::Batched => Self::Batched(BatchedMatrix::from_rows(p, rows, columns)?),
            Encoding::Packed => Self::Packed(PackedMatrix::from_rows(p, rows, columns)?),
        })
    }

    pub fn from_bytes(encoding: Encoding, p: ValidPrime, data: &mut impl Read) -> io::Result<Self> {
        Ok(match encoding {
            Encoding::Generic => Self::Generic(ByteMatrix::from_bytes(p, data)?),
            Encoding::Batched => Self::Batched(BatchedMatrix::from_bytes(p, data)?),
            Encoding::Packed => Self::Packed(PackedMatrix::from_bytes(p, data)?),
        })
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Generic(_) => Encoding::Generic,
            Self::Batched(_) => Encoding::Batched,
            Self::Packed(_) => Encoding::Packed,
        }
    }

    dispatch_matrix! {
        pub fn prime(&self) -> ValidPrime;
        pub fn rows(&self) -> usize;
        pub fn columns(&self) -> usize;
        pub fn stride(&self) -> usize;
        pub fn entry(&self, row: usize, column: usize) -> u32;
        pub fn get(&self, row: usize, column: usize) -> Result<u32>;
        pub fn first_nonzero(&self, row: usize) -> Option<(usize, u32)>;
        pub fn is_zero(&self) -> bool;
        pub fn is_reduced(&self) -> bool;
        pub fn to_rows(&self) -> Vec<Vec<u32>>;
        pub fn set_entry(&mut self, row: usize, column: usize, value: u32);
        pub fn set(&mut self, row: usize, column: usize, value: u32) -> Result<()>;
        pub fn add_to_entry(&mut self, row: usize, column: usize, value: u32);
        pub fn set_to_zero(&mut self);
        pub fn make_identity(&mut self);
        pub fn resize_rows(&mut self, rows: usize) -> Result<()>;
        pub fn shrink_to_rows(&mut self, keep: &[usize]) -> Result<()>;
    }

    pub fn to_bytes(&self, buffer: &mut impl Write) -> io::Result<()> {
        match self {
            Self::Generic(m) => m.to_bytes(buffer),
            Self::Batched(m) => m.to_bytes(buffer),
            Self::Packed(m) => m.to_bytes(buffer),
        }
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(match self {
            Self::Generic(m) => Self::Generic(m.try_clone()?),
            Self::Batched(m) => Self::Batched(m.try_clone()?),
            Self::Packed(m) => Self::Packed(m.try_clone()?),
        })
    }

    fn convert_from<M: FieldMatrix>(matrix: &M, encoding: Encoding) -> Result<Self> {
        Ok(match encoding {
            Encoding::Generic => Self::Generic(matrix.convert()?),
            Encoding::Batched => Self::Batched(matrix.convert()?),
            Encoding::Packed => Self::Packed(matrix.convert()?),
        })
    }

    /// A copy of this matrix in another encoding.
    ///
    /// # Panics
    /// Panics if the conversion is to [`Encoding::Packed`] and the prime is not 2.
    pub fn convert(&self, encoding: Encoding) -> Result<Self> {
        match self {
            Self::Generic(m) => Self::convert_from(m, encoding),
            Self::Batched(m) => Self::convert_from(m, encoding),
            Self::Packed(m) => Self::convert_from(m, encoding),
        }
    }

    /// Convert in place, replacing both the data and the variant. Converting to the current
    /// encoding does nothing.
    pub fn convert_in_place(&mut self, encoding: Encoding) -> Result<()> {
        if self.encoding() != encoding {
            *self = self.convert(encoding)?;
        }
        Ok(())
    }

    /// `self += coeff * other`.
    ///
    /// Matrices of the same encoding are added by that encoding. Otherwise, over $\mathbb{F}_2$ an
    /// even coefficient is a no-op, and in every other case `self` is first converted to the
    /// generic encoding and the sum is formed entry by entry.
    ///
    /// # Panics
    /// Panics if the primes differ.
    pub fn add(&mut self, other: &Self, coeff: u32) -> Result<()> {
        assert_eq!(
            self.prime(),
            other.prime(),
            "Adding matrices over different primes"
        );
        MatrixError::check_columns(self.columns(), other.columns())?;
        MatrixError::check_columns(self.rows(), other.rows())?;

        match (&mut *self, other) {
            (Self::Generic(x), Self::Generic(y)) => return x.add(y, coeff),
            (Self::Batched(x), Self::Batched(y)) => return x.add(y, coeff),
            (Self::Packed(x), Self::Packed(y)) => return x.add(y, coeff),
            _ => {}
        }

        let p = self.prime();
        if p == 2 && coeff % 2 == 0 {
            return Ok(());
        }
        self.convert_in_place(Encoding::Generic)?;
        let coeff = coeff % p.as_u32();
        for i in 0..other.rows() {
            for j in 0..other.columns() {
                let x = other.entry(i, j);
                if x != 0 {
                    self.add_to_entry(i, j, p.product(coeff, x));
                }
            }
        }
        Ok(())
    }
}

impl From<ByteMatrix> for AnyMatrix {
    fn from(m: ByteMatrix) -> Self {
        Self::Generic(m)
    }
}

impl From<BatchedMatrix> for AnyMatrix {
    fn from(m: BatchedMatrix) -> Self {
        Self::Batched(m)
    }
}

impl From<PackedMatrix> for AnyMatrix {
    fn from(m: PackedMatrix) -> Self {
        Self::Packed(m)
    }
}

impl fmt::Display for AnyMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Generic(m) => fmt::Display::fmt(m, f),
            Self::Batched(m) => fmt::Display::fmt(m, f),
            Self::Packed(m) => fmt::Display::fmt(m, f),
        }
    }
}
