//! The forward elimination loop shared by the three engines.

use fp::{matrix::FieldMatrix, prime::elimination_coefficient};

use crate::{error::Result, progress::Sampler};

/// One elimination step: row `row` (in the original numbering) had its first nonzero entry in
/// `column`, and `coefficient` is minus the inverse of that entry. Clearing `column` from a row
/// whose entry there is `e` means adding `coefficient * e` times the pivot row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Pivot {
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub(crate) coefficient: u32,
}

#[derive(Debug, Default)]
pub(crate) struct Elimination {
    pub(crate) pivots: Vec<Pivot>,
    /// Rows that were zero by the time they were scanned, in the original numbering.
    pub(crate) kernel_rows: Vec<usize>,
}

/// Moves kept rows to the front of a matrix while it is being scanned. The write position never
/// overtakes the scan position, so every row at or after the scan position is still unread.
#[derive(Debug, Default)]
pub(crate) struct RowCompactor {
    next: usize,
}

impl RowCompactor {
    /// Keep row `row`, which must be the row currently being scanned.
    pub(crate) fn keep<M: FieldMatrix>(&mut self, matrix: &mut M, row: usize) {
        debug_assert!(self.next <= row);
        if self.next != row {
            matrix.copy_row_within(self.next, row);
        }
        self.next += 1;
    }

    pub(crate) fn finish<M: FieldMatrix>(self, matrix: &mut M) -> fp::error::Result<()> {
        matrix.resize_rows(self.next)
    }
}

/// Forward eliminate `a` in place, leaving only the rows that had a pivot, in their original order.
///
/// Every row operation on `a` is mirrored on the change-of-basis accumulator `basis` if present.
/// If `dual` is present it receives the inverse transpose of each operation, so that at the end it
/// is the inverse transpose of `basis`.
///
/// `on_pivot` is called after the column of each pivot has been cleared from the rows below it,
/// with `a` and `basis` still in the original row numbering. At that point the pivot row of both is
/// final.
pub(crate) fn forward_eliminate<M, F>(
    a: &mut M,
    mut basis: Option<&mut M>,
    mut dual: Option<&mut M>,
    sampler: &mut Sampler,
    mut on_pivot: F,
) -> Result<Elimination>
where
    M: FieldMatrix,
    F: FnMut(&M, Option<&M>, &Pivot) -> Result<()>,
{
    let p = a.prime();
    let rows = a.rows();
    let mut compactor = RowCompactor::default();
    let mut result = Elimination::default();

    for i in 0..rows {
        sampler.checkpoint(i, rows)?;
        let Some((column, value)) = a.first_nonzero(i) else {
            result.kernel_rows.push(i);
            continue;
        };
        let coefficient = elimination_coefficient(p, value);
        for j in i + 1..rows {
            let entry = a.entry(j, column);
            if entry == 0 {
                continue;
            }
            let c = p.product(coefficient, entry);
            a.add_row_tail(j, i, c, column);
            if let Some(u) = basis.as_deref_mut() {
                u.add_row(j, i, c);
            }
            if let Some(d) = dual.as_deref_mut() {
                d.add_row(i, j, p.neg(c));
            }
        }
        let pivot = Pivot {
            row: i,
            column,
            coefficient,
        };
        on_pivot(a, basis.as_deref(), &pivot)?;
        result.pivots.push(pivot);
        compactor.keep(a, i);
    }
    compactor.finish(a)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use fp::{
        matrix::{BatchedMatrix, ByteMatrix},
        prime::ValidPrime,
    };

    use super::*;

    #[test]
    fn compactor_moves_rows_up() {
        let p = ValidPrime::new(5);
        let rows: Vec<Vec<u32>> = (0..6).map(|i| vec![i % 5, 1]).collect();
        let mut m = ByteMatrix::from_rows(p, &rows, 2).unwrap();
        let mut compactor = RowCompactor::default();
        for i in [1, 2, 4] {
            compactor.keep(&mut m, i);
        }
        compactor.finish(&mut m).unwrap();
        assert_eq!(m.to_rows(), vec![rows[1].clone(), rows[2].clone(), rows[4].clone()]);
    }

    #[test]
    fn pivots_and_kernel_rows() {
        let p = ValidPrime::new(3);
        let mut a = BatchedMatrix::from_rows(
            p,
            &[vec![0, 1, 1], vec![0, 2, 2], vec![1, 0, 0], vec![0, 0, 0]],
            3,
        )
        .unwrap();
        let mut seen = Vec::new();
        let result = forward_eliminate(&mut a, None, None, &mut Sampler::default(), |a, _, pivot| {
            seen.push(a.row(pivot.row).to_vector().to_vec());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![vec![0, 1, 1], vec![1, 0, 0]]);
        assert_eq!(result.kernel_rows, vec![1, 3]);
        assert_eq!(
            result.pivots,
            vec![
                Pivot { row: 0, column: 1, coefficient: 2 },
                Pivot { row: 2, column: 0, coefficient: 2 },
            ]
        );
        assert_eq!(a.to_rows(), vec![vec![0, 1, 1], vec![1, 0, 0]]);
    }
}
