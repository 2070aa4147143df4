//! Entry points for matrices whose encoding is only known at runtime.
//!
//! Each function dispatches to the engine for the encoding of its first matrix argument. A second
//! matrix in a different encoding is converted to that encoding first; when the second matrix is
//! mutated, its variant is replaced along with its data.

use std::{
    borrow::Cow,
    io::{self, Read, Write},
};

use byteorder::{ReadBytesExt, WriteBytesExt};
use fp::{
    matrix::{AnyMatrix, BatchedMatrix, ByteMatrix, Encoding, PackedMatrix},
    prime::ValidPrime,
    MatrixError,
};

use crate::{
    error::Result,
    lift::{lift, LiftMode},
    orthonormalize::{orthonormalize, Decomposition, EliminationBasis, OrthonormalizeOptions},
    progress::Sampler,
    quotient::quotient,
};

/// An [`EliminationBasis`] for a matrix in any encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyBasis {
    Generic(EliminationBasis<ByteMatrix>),
    Batched(EliminationBasis<BatchedMatrix>),
    Packed(EliminationBasis<PackedMatrix>),
}

impl AnyBasis {
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Generic(_) => Encoding::Generic,
            Self::Batched(_) => Encoding::Batched,
            Self::Packed(_) => Encoding::Packed,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Self::Generic(b) => b.rank(),
            Self::Batched(b) => b.rank(),
            Self::Packed(b) => b.rank(),
        }
    }

    pub fn pivots(&self) -> &[usize] {
        match self {
            Self::Generic(b) => b.pivots(),
            Self::Batched(b) => b.pivots(),
            Self::Packed(b) => b.pivots(),
        }
    }

    pub fn columns(&self) -> usize {
        match self {
            Self::Generic(b) => b.columns(),
            Self::Batched(b) => b.columns(),
            Self::Packed(b) => b.columns(),
        }
    }

    pub fn prime(&self) -> ValidPrime {
        match self {
            Self::Generic(b) => b.prime(),
            Self::Batched(b) => b.prime(),
            Self::Packed(b) => b.prime(),
        }
    }

    /// Writes the prime and the encoding as one byte each, followed by
    /// [`EliminationBasis::to_bytes`].
    pub fn to_bytes(&self, buffer: &mut impl Write) -> io::Result<()> {
        buffer.write_u8(self.prime().as_u32() as u8)?;
        buffer.write_u8(match self.encoding() {
            Encoding::Generic => 0,
            Encoding::Batched => 1,
            Encoding::Packed => 2,
        })?;
        match self {
            Self::Generic(b) => b.to_bytes(buffer),
            Self::Batched(b) => b.to_bytes(buffer),
            Self::Packed(b) => b.to_bytes(buffer),
        }
    }

    pub fn from_bytes(data: &mut impl Read) -> io::Result<Self> {
        let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidData, msg);
        let p = ValidPrime::try_from(data.read_u8()? as u32).map_err(|e| invalid(e.to_string()))?;
        Ok(match data.read_u8()? {
            0 => Self::Generic(EliminationBasis::from_bytes(p, data)?),
            1 => Self::Batched(EliminationBasis::from_bytes(p, data)?),
            2 if p == 2 => Self::Packed(EliminationBasis::from_bytes(p, data)?),
            tag => return Err(invalid(format!("invalid encoding tag {tag} for p = {p}"))),
        })
    }
}

/// The outputs of [`orthonormalize_any`]. The kernel and dual are in the encoding of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyDecomposition {
    pub rank: usize,
    pub kernel: Option<AnyMatrix>,
    pub dual: Option<AnyMatrix>,
    pub basis: Option<AnyBasis>,
}

impl AnyDecomposition {
    fn new<M: Into<AnyMatrix>>(
        d: Decomposition<M>,
        wrap: impl FnOnce(EliminationBasis<M>) -> AnyBasis,
    ) -> Self {
        Self {
            rank: d.rank,
            kernel: d.kernel.map(Into::into),
            dual: d.dual.map(Into::into),
            basis: d.basis.map(wrap),
        }
    }
}

pub fn orthonormalize_any(
    a: &mut AnyMatrix,
    options: OrthonormalizeOptions,
    sampler: &mut Sampler,
) -> Result<AnyDecomposition> {
    Ok(match a {
        AnyMatrix::Generic(a) => {
            AnyDecomposition::new(orthonormalize(a, options, sampler)?, AnyBasis::Generic)
        }
        AnyMatrix::Batched(a) => {
            AnyDecomposition::new(orthonormalize(a, options, sampler)?, AnyBasis::Batched)
        }
        AnyMatrix::Packed(a) => {
            AnyDecomposition::new(orthonormalize(a, options, sampler)?, AnyBasis::Packed)
        }
    })
}

/// Lift `l` against `a`, converting `l` to the encoding of `a` if they differ. Widths are checked
/// before any conversion.
pub fn lift_any(a: &mut AnyMatrix, l: &mut AnyMatrix, sampler: &mut Sampler) -> Result<AnyMatrix> {
    MatrixError::check_columns(a.columns(), l.columns())?;
    l.convert_in_place(a.encoding())?;
    Ok(match (a, l) {
        (AnyMatrix::Generic(a), AnyMatrix::Generic(l)) => {
            lift(LiftMode::Recompute(a), l, sampler)?.into()
        }
        (AnyMatrix::Batched(a), AnyMatrix::Batched(l)) => {
            lift(LiftMode::Recompute(a), l, sampler)?.into()
        }
        (AnyMatrix::Packed(a), AnyMatrix::Packed(l)) => {
            lift(LiftMode::Recompute(a), l, sampler)?.into()
        }
        _ => unreachable!("l was converted to the encoding of a"),
    })
}

/// Lift `l` against a cached basis, converting `l` to the encoding of the basis if they differ.
pub fn lift_cached_any(
    basis: &AnyBasis,
    l: &mut AnyMatrix,
    sampler: &mut Sampler,
) -> Result<AnyMatrix> {
    MatrixError::check_columns(basis.columns(), l.columns())?;
    l.convert_in_place(basis.encoding())?;
    Ok(match (basis, l) {
        (AnyBasis::Generic(b), AnyMatrix::Generic(l)) => {
            lift(LiftMode::Cached(b), l, sampler)?.into()
        }
        (AnyBasis::Batched(b), AnyMatrix::Batched(l)) => {
            lift(LiftMode::Cached(b), l, sampler)?.into()
        }
        (AnyBasis::Packed(b), AnyMatrix::Packed(l)) => {
            lift(LiftMode::Cached(b), l, sampler)?.into()
        }
        _ => unreachable!("l was converted to the encoding of the basis"),
    })
}

/// Take the quotient of `ker` by `im`. If the encodings differ, a converted copy of `im` is used.
pub fn quotient_any(ker: &mut AnyMatrix, im: &AnyMatrix, sampler: &mut Sampler) -> Result<()> {
    let im = if im.encoding() == ker.encoding() {
        Cow::Borrowed(im)
    } else {
        Cow::Owned(im.convert(ker.encoding())?)
    };
    match (ker, &*im) {
        (AnyMatrix::Generic(ker), AnyMatrix::Generic(im)) => quotient(ker, im, sampler),
        (AnyMatrix::Batched(ker), AnyMatrix::Batched(im)) => quotient(ker, im, sampler),
        (AnyMatrix::Packed(ker), AnyMatrix::Packed(im)) => quotient(ker, im, sampler),
        _ => unreachable!("im was converted to the encoding of ker"),
    }
}

#[cfg(test)]
mod tests {
    use fp::prime::TWO;

    use super::*;

    #[test]
    fn mixed_lift_converts_right_operand() {
        let mut a = AnyMatrix::from_rows(
            Encoding::Packed,
            TWO,
            &[vec![1, 1, 0], vec![0, 1, 1]],
            3,
        )
        .unwrap();
        let mut l = AnyMatrix::from_rows(Encoding::Generic, TWO, &[vec![1, 0, 1]], 3).unwrap();
        let r = lift_any(&mut a, &mut l, &mut Sampler::default()).unwrap();
        assert_eq!(l.encoding(), Encoding::Packed);
        assert_eq!(r.encoding(), Encoding::Packed);
        assert!(l.is_zero());
        assert_eq!(r.to_rows(), vec![vec![1, 1]]);
    }

    #[test]
    fn width_mismatch_keeps_encoding() {
        let mut a = AnyMatrix::from_rows(Encoding::Packed, TWO, &[vec![1, 1, 0]], 3).unwrap();
        let mut l = AnyMatrix::from_rows(Encoding::Generic, TWO, &[vec![1, 0]], 2).unwrap();
        assert!(lift_any(&mut a, &mut l, &mut Sampler::default()).is_err());
        assert_eq!(l.encoding(), Encoding::Generic);

        let basis = orthonormalize_any(&mut a, OrthonormalizeOptions::ALL, &mut Sampler::default())
            .unwrap()
            .basis
            .unwrap();
        assert_eq!(basis.columns(), 3);
        assert!(lift_cached_any(&basis, &mut l, &mut Sampler::default()).is_err());
        assert_eq!(l.encoding(), Encoding::Generic);
        assert_eq!(l.to_rows(), vec![vec![1, 0]]);
    }

    #[test]
    fn cached_lift_any() {
        let p = ValidPrime::new(3);
        let rows = vec![vec![1, 2, 0], vec![2, 1, 0], vec![0, 0, 1]];
        let mut a = AnyMatrix::from_rows(Encoding::Batched, p, &rows, 3).unwrap();
        let basis = orthonormalize_any(&mut a, OrthonormalizeOptions::ALL, &mut Sampler::default())
            .unwrap()
            .basis
            .unwrap();
        assert_eq!(basis.encoding(), Encoding::Batched);
        assert_eq!(basis.pivots(), &[0, 2]);

        let mut l = AnyMatrix::from_rows(Encoding::Generic, p, &[vec![2, 1, 1]], 3).unwrap();
        let r = lift_cached_any(&basis, &mut l, &mut Sampler::default()).unwrap();
        assert!(l.is_zero());
        assert_eq!(r.to_rows(), vec![vec![2, 0, 1]]);

        let mut buffer = Vec::new();
        basis.to_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..2], &[3, 1]);
        assert_eq!(AnyBasis::from_bytes(&mut buffer.as_slice()).unwrap(), basis);
        buffer[1] = 2;
        assert!(AnyBasis::from_bytes(&mut buffer.as_slice()).is_err());
    }

    #[test]
    fn mixed_quotient_keeps_image_untouched() {
        let p = ValidPrime::new(5);
        let im = AnyMatrix::from_rows(Encoding::Generic, p, &[vec![1, 0]], 2).unwrap();
        let mut ker =
            AnyMatrix::from_rows(Encoding::Batched, p, &[vec![3, 0], vec![1, 1]], 2).unwrap();
        quotient_any(&mut ker, &im, &mut Sampler::default()).unwrap();
        assert_eq!(ker.encoding(), Encoding::Batched);
        assert_eq!(im.encoding(), Encoding::Generic);
        assert_eq!(ker.to_rows(), vec![vec![0, 1]]);
    }
}
