use fp::{matrix::FieldMatrix, prime::elimination_coefficient, MatrixError};

use crate::{eliminate::forward_eliminate, error::Result, progress::Sampler};

/// Reduce `ker` to a basis of `span(ker) / (span(ker) ∩ span(im))`, in place.
///
/// `im` must already be in the forward echelon form produced by
/// [`orthonormalize`](crate::orthonormalize::orthonormalize): the first nonzero entry of each row
/// is its pivot, and every later row vanishes in that column. Zero rows of `im` are ignored.
///
/// The first pass clears the pivot columns of `im` from every row of `ker`. The second eliminates
/// `ker` against itself and keeps the rows that still have a pivot. [`PHASE_SENTINEL`] is reported
/// once in between.
///
/// If this returns an error, `ker` may be left partially reduced.
///
/// [`PHASE_SENTINEL`]: crate::progress::PHASE_SENTINEL
#[tracing::instrument(skip_all, fields(rows = ker.rows(), image = im.rows(), columns = ker.columns(), p = %ker.prime(), rank))]
pub fn quotient<M: FieldMatrix>(ker: &mut M, im: &M, sampler: &mut Sampler) -> Result<()> {
    let p = ker.prime();
    assert_eq!(im.prime(), p, "Taking a quotient by a matrix over a different prime");
    MatrixError::check_columns(ker.columns(), im.columns())?;

    let image_rows = im.rows();
    for r in 0..image_rows {
        sampler.checkpoint(r, image_rows)?;
        let Some((column, pivot)) = im.first_nonzero(r) else {
            continue;
        };
        let coefficient = elimination_coefficient(p, pivot);
        for k in 0..ker.rows() {
            let entry = ker.entry(k, column);
            if entry != 0 {
                ker.add_row_from_tail(k, im, r, p.product(coefficient, entry), column);
            }
        }
    }
    sampler.phase();

    let elimination = forward_eliminate(ker, None, None, sampler, |_, _, _| Ok(()))?;
    tracing::Span::current().record("rank", elimination.pivots.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use fp::{
        matrix::{BatchedMatrix, ByteMatrix},
        prime::ValidPrime,
    };

    use super::*;
    use crate::progress::PHASE_SENTINEL;

    #[test]
    fn quotient_by_subspace() {
        let p = ValidPrime::new(3);
        let im = ByteMatrix::from_rows(p, &[vec![1, 1, 0, 0], vec![0, 0, 1, 0]], 4).unwrap();
        let mut ker = ByteMatrix::from_rows(
            p,
            &[
                vec![2, 2, 1, 0],
                vec![1, 1, 0, 1],
                vec![0, 0, 0, 2],
                vec![0, 1, 0, 0],
            ],
            4,
        )
        .unwrap();
        quotient(&mut ker, &im, &mut Sampler::default()).unwrap();
        assert_eq!(ker.to_rows(), vec![vec![0, 0, 0, 1], vec![0, 1, 0, 0]]);
    }

    #[test]
    fn second_quotient_is_a_no_op() {
        let p = ValidPrime::new(7);
        let im = BatchedMatrix::from_rows(p, &[vec![0, 3, 1]], 3).unwrap();
        let mut ker =
            BatchedMatrix::from_rows(p, &[vec![1, 2, 3], vec![2, 4, 6], vec![0, 6, 2]], 3)
                .unwrap();
        quotient(&mut ker, &im, &mut Sampler::default()).unwrap();
        assert_eq!(ker.rows(), 1);
        let once = ker.clone();
        let empty = BatchedMatrix::new(p, 0, 3).unwrap();
        quotient(&mut ker, &empty, &mut Sampler::default()).unwrap();
        assert_eq!(ker, once);
    }

    #[test]
    fn sentinel_between_passes() {
        let p = ValidPrime::new(5);
        let im = ByteMatrix::identity(p, 2).unwrap();
        let mut ker = ByteMatrix::from_rows(p, &[vec![1, 1]], 2).unwrap();
        let mut reports = Vec::new();
        let mut sink = |x: f64| reports.push(x);
        quotient(
            &mut ker,
            &im,
            &mut Sampler::new(0).with_progress(&mut sink),
        )
        .unwrap();
        assert_eq!(ker.rows(), 0);
        assert_eq!(reports.iter().filter(|&&x| x == PHASE_SENTINEL).count(), 1);
        // Two image rows, the sentinel, then one kernel row.
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[2], PHASE_SENTINEL);
    }

    #[test]
    fn width_mismatch() {
        let p = ValidPrime::new(5);
        let im = ByteMatrix::identity(p, 3).unwrap();
        let mut ker = ByteMatrix::identity(p, 2).unwrap();
        assert!(quotient(&mut ker, &im, &mut Sampler::default()).is_err());
        assert_eq!(ker, ByteMatrix::identity(p, 2).unwrap());
    }
}
