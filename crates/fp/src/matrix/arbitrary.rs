//! Proptest strategies for matrices in every encoding.

use proptest::prelude::*;

use super::{AnyMatrix, BatchedMatrix, ByteMatrix, Encoding, FieldMatrix, PackedMatrix};
use crate::prime::{ValidPrime, TWO};

pub const MAX_ROWS: usize = 40;
pub const MAX_COLUMNS: usize = 100;

#[derive(Debug, Clone)]
pub struct MatrixArbParams {
    pub p: Option<ValidPrime>,
    pub rows: BoxedStrategy<usize>,
    pub columns: BoxedStrategy<usize>,
}

impl Default for MatrixArbParams {
    fn default() -> Self {
        Self {
            p: None,
            rows: (1..=MAX_ROWS).boxed(),
            columns: (1..=MAX_COLUMNS).boxed(),
        }
    }
}

/// A prime together with a list of rows of equal length, with entries in `0..p`.
pub fn arb_rows(args: MatrixArbParams) -> impl Strategy<Value = (ValidPrime, usize, Vec<Vec<u32>>)> {
    let p = match args.p {
        Some(p) => Just(p).boxed(),
        None => any::<ValidPrime>().boxed(),
    };
    (p, args.rows, args.columns).prop_flat_map(|(p, rows, columns)| {
        let row = proptest::collection::vec(0..p.as_u32(), columns);
        (
            Just(p),
            Just(columns),
            proptest::collection::vec(row, rows),
        )
    })
}

/// Rows where a fraction of them are random combinations of the others, so that elimination finds
/// a nontrivial kernel most of the time.
pub fn arb_dependent_rows(
    args: MatrixArbParams,
) -> impl Strategy<Value = (ValidPrime, usize, Vec<Vec<u32>>)> {
    arb_rows(args).prop_flat_map(|(p, columns, rows)| {
        let n = rows.len();
        let combos = proptest::collection::vec(
            (proptest::collection::vec(0..p.as_u32(), n), any::<prop::sample::Index>()),
            0..=n,
        );
        (Just(p), Just(columns), Just(rows), combos).prop_map(|(p, columns, mut rows, combos)| {
            for (coeffs, index) in combos {
                let target = index.index(rows.len());
                let mut new_row = vec![0; columns];
                for (source, &c) in rows.iter().zip(&coeffs) {
                    for (x, &y) in new_row.iter_mut().zip(source) {
                        *x = p.sum(*x, p.product(c, y));
                    }
                }
                rows[target] = new_row;
            }
            (p, columns, rows)
        })
    })
}

fn arb_matrix<M: FieldMatrix + 'static>(args: MatrixArbParams) -> BoxedStrategy<M> {
    arb_rows(args)
        .prop_filter_map("allocation failed", |(p, columns, rows)| {
            M::from_rows(p, &rows, columns).ok()
        })
        .boxed()
}

impl Arbitrary for ByteMatrix {
    type Parameters = MatrixArbParams;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        arb_matrix(args)
    }
}

impl Arbitrary for BatchedMatrix {
    type Parameters = MatrixArbParams;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        arb_matrix(args)
    }
}

impl Arbitrary for PackedMatrix {
    type Parameters = MatrixArbParams;
    type Strategy = BoxedStrategy<Self>;

    /// The prime in `args` is ignored, since packed matrices are always over $\mathbb{F}_2$.
    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        arb_matrix(MatrixArbParams {
            p: Some(TWO),
            ..args
        })
    }
}

impl Arbitrary for Encoding {
    type Parameters = ();
    type Strategy = proptest::sample::Select<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        proptest::sample::select(vec![Self::Generic, Self::Batched, Self::Packed])
    }
}

impl Arbitrary for AnyMatrix {
    type Parameters = MatrixArbParams;
    type Strategy = BoxedStrategy<Self>;

    /// An arbitrary matrix in an arbitrary encoding that supports its prime.
    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        (arb_rows(args), any::<Encoding>())
            .prop_filter_map("allocation failed", |((p, columns, rows), encoding)| {
                let encoding = if encoding.supports(p) {
                    encoding
                } else {
                    Encoding::preferred(p)
                };
                Self::from_rows(encoding, p, &rows, columns).ok()
            })
            .boxed()
    }
}
