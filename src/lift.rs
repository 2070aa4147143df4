//! Express rows in terms of the rows of another matrix.
//!
//! Lifting `L` against `A` eliminates, from every row of `L`, each pivot column of `A` in turn,
//! using the same pivot rows and coefficients as the forward elimination of `A` itself. The
//! multiples of the original rows of `A` that were subtracted are recorded in a result matrix `R`
//! with one row per row of `L`, so that afterwards
//!
//! ```text
//! L_original[i] = R[i] * A_original + L[i]
//! ```
//!
//! and `L[i]` is the residue. If a row of `L` lies in the row space of `A` its residue is zero and
//! the corresponding row of `R` is an exact preimage.

use fp::{matrix::FieldMatrix, MatrixError};

use crate::{
    eliminate::forward_eliminate,
    error::Result,
    orthonormalize::EliminationBasis,
    progress::Sampler,
};

/// Where the pivots come from.
#[derive(Debug)]
pub enum LiftMode<'a, M> {
    /// Eliminate this matrix now, reducing `L` in lockstep. The matrix is left holding its image,
    /// exactly as after [`orthonormalize`](crate::orthonormalize::orthonormalize).
    Recompute(&'a mut M),
    /// Replay an elimination recorded earlier. This gives the same result as recomputing it from the
    /// same matrix, without the cost of eliminating the matrix again.
    Cached(&'a EliminationBasis<M>),
}

/// Clear column `column` from every row of `l` using row `source` of `image`, and record the
/// multiples of row `source` of `preimage` that were taken away.
#[allow(clippy::too_many_arguments)]
fn reduce_rows<M: FieldMatrix>(
    l: &mut M,
    result: &mut M,
    image: &M,
    preimage: &M,
    source: usize,
    column: usize,
    coefficient: u32,
) {
    let p = l.prime();
    for r in 0..l.rows() {
        let entry = l.entry(r, column);
        if entry == 0 {
            continue;
        }
        let c = p.product(coefficient, entry);
        l.add_row_from_tail(r, image, source, c, column);
        result.add_row_from(r, preimage, source, p.neg(c));
    }
}

/// Reduce the rows of `l` in place and return the combinations that were used, one row per row of
/// `l`, expressed in the original rows of the matrix the pivots came from.
///
/// If this returns an error, `l` and, when recomputing, the eliminated matrix may be left partially
/// reduced.
#[tracing::instrument(skip_all, fields(rows = l.rows(), columns = l.columns(), p = %l.prime(), cached))]
pub fn lift<M: FieldMatrix>(mode: LiftMode<M>, l: &mut M, sampler: &mut Sampler) -> Result<M> {
    let p = l.prime();
    match mode {
        LiftMode::Recompute(a) => {
            tracing::Span::current().record("cached", false);
            assert_eq!(a.prime(), p, "Lifting against a matrix over a different prime");
            MatrixError::check_columns(a.columns(), l.columns())?;

            let rows = a.rows();
            let mut result = M::new(p, l.rows(), rows)?;
            let mut accumulator = M::identity(p, rows)?;
            forward_eliminate(
                a,
                Some(&mut accumulator),
                None,
                sampler,
                |a, accumulator, pivot| {
                    if let Some(accumulator) = accumulator {
                        reduce_rows(
                            l,
                            &mut result,
                            a,
                            accumulator,
                            pivot.row,
                            pivot.column,
                            pivot.coefficient,
                        );
                    }
                    Ok(())
                },
            )?;
            Ok(result)
        }
        LiftMode::Cached(basis) => {
            tracing::Span::current().record("cached", true);
            assert_eq!(basis.prime(), p, "Lifting against a basis over a different prime");
            MatrixError::check_columns(basis.columns(), l.columns())?;

            let mut result = M::new(p, l.rows(), basis.source_rows())?;
            let rank = basis.rank();
            for k in 0..rank {
                sampler.checkpoint(k, rank)?;
                let (column, coefficient) = basis.step(k);
                reduce_rows(
                    l,
                    &mut result,
                    basis.image(),
                    basis.preimage(),
                    k,
                    column,
                    coefficient,
                );
            }
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use fp::{
        matrix::{BatchedMatrix, ByteMatrix, PackedMatrix},
        prime::{ValidPrime, TWO},
    };

    use super::*;
    use crate::{
        orthonormalize::{orthonormalize, OrthonormalizeOptions},
        test_utils::{multiply, subtract},
    };

    fn example() -> (ValidPrime, Vec<Vec<u32>>, Vec<Vec<u32>>) {
        let p = ValidPrime::new(5);
        let a = vec![
            vec![1, 0, 2, 0],
            vec![2, 0, 4, 0],
            vec![0, 3, 1, 1],
            vec![1, 1, 0, 0],
        ];
        let l = vec![
            // 2 * a[0] + a[2]
            vec![2, 3, 0, 1],
            vec![0, 0, 0, 1],
            vec![0, 0, 0, 0],
        ];
        (p, a, l)
    }

    #[test]
    fn recompute_reconstructs_rows() {
        let (p, a_rows, l_rows) = example();
        let mut a = ByteMatrix::from_rows(p, &a_rows, 4).unwrap();
        let original_a = a.clone();
        let original_l = ByteMatrix::from_rows(p, &l_rows, 4).unwrap();
        let mut l = original_l.clone();

        let r = lift(LiftMode::Recompute(&mut a), &mut l, &mut Sampler::default()).unwrap();
        assert_eq!(r.rows(), 3);
        assert_eq!(r.columns(), 4);
        assert_eq!(a.rows(), 3);
        assert_eq!(subtract(&original_l, &multiply(&r, &original_a)), l);

        // The first and last rows lie in the row space.
        assert!(l.row(0).is_zero());
        assert!(l.row(2).is_zero());
        assert!(r.row(2).is_zero());
    }

    #[test]
    fn cached_matches_recompute() {
        let (p, a_rows, l_rows) = example();
        let mut a1 = BatchedMatrix::from_rows(p, &a_rows, 4).unwrap();
        let mut a2 = a1.clone();
        let mut l1 = BatchedMatrix::from_rows(p, &l_rows, 4).unwrap();
        let mut l2 = l1.clone();

        let r1 = lift(LiftMode::Recompute(&mut a1), &mut l1, &mut Sampler::default()).unwrap();
        let basis = orthonormalize(&mut a2, OrthonormalizeOptions::ALL, &mut Sampler::default())
            .unwrap()
            .basis
            .unwrap();
        let r2 = lift(LiftMode::Cached(&basis), &mut l2, &mut Sampler::default()).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(l1, l2);
        assert_eq!(a1, a2);
    }

    #[test]
    fn width_mismatch_is_checked_first() {
        let p = ValidPrime::new(3);
        let mut a = ByteMatrix::identity(p, 3).unwrap();
        let mut l = ByteMatrix::new(p, 2, 4).unwrap();
        let before = a.clone();
        let err = lift(LiftMode::Recompute(&mut a), &mut l, &mut Sampler::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::ReduceError::Matrix(MatrixError::DimensionMismatch { left: 3, right: 4 })
        ));
        assert_eq!(a, before);
    }

    #[test]
    fn packed_preimage() {
        let a_rows = vec![vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]];
        let mut a = PackedMatrix::from_rows(TWO, &a_rows, 3).unwrap();
        let original_a = a.clone();
        let mut l = PackedMatrix::from_rows(TWO, &[vec![1, 0, 1], vec![1, 1, 1]], 3).unwrap();
        let original_l = l.clone();
        let r = lift(LiftMode::Recompute(&mut a), &mut l, &mut Sampler::default()).unwrap();
        assert!(l.row(0).is_zero());
        assert_eq!(l.to_rows()[1], vec![0, 0, 1]);
        assert_eq!(subtract(&original_l, &multiply(&r, &original_a)), l);
    }
}
