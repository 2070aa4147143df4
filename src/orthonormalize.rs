//! Split a matrix into an independent image and a kernel.
//!
//! [`orthonormalize`] runs forward elimination on a matrix `A` in place. Each row is scanned for
//! its first nonzero entry, the pivot, and the pivot column is cleared from every later row. No
//! back substitution is performed, so the surviving rows are in forward echelon form: each has a
//! pivot column that no earlier surviving row uses as a pivot, and every later row vanishes in that
//! column.
//!
//! Rows that are zero by the time they are reached are linear combinations of earlier rows. The
//! combinations are read off a change-of-basis accumulator `U`, which starts as the identity and
//! receives every row operation applied to `A`. Row `i` of `U` always records which combination of
//! the original rows of `A` currently sits in row `i`.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use fp::{
    matrix::FieldMatrix,
    prime::{elimination_coefficient, ValidPrime},
};

use crate::{
    eliminate::{forward_eliminate, Pivot},
    error::Result,
    progress::Sampler,
};

/// Which optional outputs [`orthonormalize`] should produce.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct OrthonormalizeOptions {
    pub want_kernel: bool,
    pub want_dual: bool,
    pub want_basis: bool,
}

impl OrthonormalizeOptions {
    pub const KERNEL: Self = Self {
        want_kernel: true,
        want_dual: false,
        want_basis: false,
    };

    pub const ALL: Self = Self {
        want_kernel: true,
        want_dual: true,
        want_basis: true,
    };
}

/// The outputs of [`orthonormalize`]. The image itself is left in the input matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition<M> {
    /// The number of rows that survived.
    pub rank: usize,
    /// A basis of `{x : xA = 0}`, one row per row of `A` that was eliminated, expressed in the
    /// original rows of `A`.
    pub kernel: Option<M>,
    /// One row per kernel row. Writing `U` for the final change-of-basis accumulator, this holds
    /// the rows of `(U^-1)^T` at the eliminated positions, so that `kernel * dual^T` is the identity
    /// and each dual row is orthogonal to the combinations that produced the image.
    pub dual: Option<M>,
    pub basis: Option<EliminationBasis<M>>,
}

impl<M> Decomposition<M> {
    pub fn map<N>(self, mut f: impl FnMut(M) -> N) -> Decomposition<N> {
        Decomposition {
            rank: self.rank,
            kernel: self.kernel.map(&mut f),
            dual: self.dual.map(&mut f),
            basis: self.basis.map(|b| b.map(&mut f)),
        }
    }
}

/// The record of an elimination, enough to replay it against other rows without redoing it.
///
/// Row `k` of `image` is the `k`th surviving row, with pivot column `pivots[k]` and elimination
/// coefficient `coefficients[k]`. Row `k` of `preimage` expresses it in the original rows of the
/// eliminated matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EliminationBasis<M> {
    image: M,
    preimage: M,
    pivots: Vec<usize>,
    coefficients: Vec<u32>,
}

impl<M> EliminationBasis<M> {
    pub fn image(&self) -> &M {
        &self.image
    }

    pub fn preimage(&self) -> &M {
        &self.preimage
    }

    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    pub fn rank(&self) -> usize {
        self.pivots.len()
    }

    pub(crate) fn step(&self, k: usize) -> (usize, u32) {
        (self.pivots[k], self.coefficients[k])
    }

    pub fn map<N>(self, mut f: impl FnMut(M) -> N) -> EliminationBasis<N> {
        EliminationBasis {
            image: f(self.image),
            preimage: f(self.preimage),
            pivots: self.pivots,
            coefficients: self.coefficients,
        }
    }
}

impl<M: FieldMatrix> EliminationBasis<M> {
    fn collect(image: &M, accumulator: &M, pivots: &[Pivot]) -> fp::error::Result<Self> {
        let mut preimage = M::new(image.prime(), pivots.len(), accumulator.columns())?;
        for (k, pivot) in pivots.iter().enumerate() {
            preimage.copy_row_from(k, accumulator, pivot.row);
        }
        Ok(Self {
            image: image.try_clone()?,
            preimage,
            pivots: pivots.iter().map(|pivot| pivot.column).collect(),
            coefficients: pivots.iter().map(|pivot| pivot.coefficient).collect(),
        })
    }

    pub fn prime(&self) -> ValidPrime {
        self.image.prime()
    }

    /// The width of the rows this basis reduces.
    pub fn columns(&self) -> usize {
        self.image.columns()
    }

    /// The number of rows of the matrix this basis was computed from.
    pub fn source_rows(&self) -> usize {
        self.preimage.columns()
    }

    /// Writes the image and preimage with [`FieldMatrix::to_bytes`], followed by the pivot columns
    /// as little endian `u64`s.
    pub fn to_bytes(&self, buffer: &mut impl Write) -> io::Result<()> {
        self.image.to_bytes(buffer)?;
        self.preimage.to_bytes(buffer)?;
        for &pivot in &self.pivots {
            buffer.write_u64::<LittleEndian>(pivot as u64)?;
        }
        Ok(())
    }

    pub fn from_bytes(p: ValidPrime, data: &mut impl Read) -> io::Result<Self> {
        let image = M::from_bytes(p, data)?;
        let preimage = M::from_bytes(p, data)?;
        if preimage.rows() != image.rows() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "image and preimage have different numbers of rows",
            ));
        }
        let mut pivots = Vec::with_capacity(image.rows());
        let mut coefficients = Vec::with_capacity(image.rows());
        for k in 0..image.rows() {
            let pivot = data.read_u64::<LittleEndian>()? as usize;
            if image.first_nonzero(k).map(|(column, _)| column) != Some(pivot) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("row {k} does not have its pivot in column {pivot}"),
                ));
            }
            pivots.push(pivot);
            coefficients.push(elimination_coefficient(p, image.entry(k, pivot)));
        }
        Ok(Self {
            image,
            preimage,
            pivots,
            coefficients,
        })
    }
}

/// Forward eliminate `a` in place.
///
/// Afterwards `a` holds only its linearly independent rows, in the order they were kept. The
/// kernel, dual and basis are produced as requested by `options`.
///
/// If this returns an error, `a` may be left partially reduced.
#[tracing::instrument(skip_all, fields(rows = a.rows(), columns = a.columns(), p = %a.prime(), rank))]
pub fn orthonormalize<M: FieldMatrix>(
    a: &mut M,
    options: OrthonormalizeOptions,
    sampler: &mut Sampler,
) -> Result<Decomposition<M>> {
    let p = a.prime();
    let rows = a.rows();

    let mut accumulator = if options.want_kernel || options.want_basis {
        Some(M::identity(p, rows)?)
    } else {
        None
    };
    let mut dual = if options.want_dual {
        Some(M::identity(p, rows)?)
    } else {
        None
    };

    let elimination = forward_eliminate(
        a,
        accumulator.as_mut(),
        dual.as_mut(),
        sampler,
        |_, _, _| Ok(()),
    )?;
    let rank = elimination.pivots.len();

    let basis = match &accumulator {
        Some(u) if options.want_basis => Some(EliminationBasis::collect(a, u, &elimination.pivots)?),
        _ => None,
    };
    let kernel = match accumulator {
        Some(mut u) if options.want_kernel => {
            u.shrink_to_rows(&elimination.kernel_rows)?;
            Some(u)
        }
        _ => None,
    };
    let dual = match dual {
        Some(mut d) => {
            d.shrink_to_rows(&elimination.kernel_rows)?;
            Some(d)
        }
        None => None,
    };

    tracing::Span::current().record("rank", rank);
    tracing::debug!(kernel = elimination.kernel_rows.len(), "eliminated");

    Ok(Decomposition {
        rank,
        kernel,
        dual,
        basis,
    })
}
