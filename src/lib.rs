//! Linear algebra kernels for computations over the Steenrod algebra.
//!
//! Three engines operate on matrices over $\mathbb{F}_p$ from the [`fp`] crate:
//!
//!  * [`orthonormalize`](orthonormalize::orthonormalize) splits a matrix into an independent image
//!    and a kernel, optionally recording an [`EliminationBasis`] that can be replayed later.
//!  * [`lift`](lift::lift) expresses rows in terms of the rows of another matrix.
//!  * [`quotient`](quotient::quotient) reduces a spanning set modulo an echelon image.
//!
//! The engines are generic over [`FieldMatrix`](fp::matrix::FieldMatrix), and [`any`] provides the
//! same operations for an [`AnyMatrix`](fp::matrix::AnyMatrix) whose encoding is chosen at runtime.
//! Every engine takes a [`Sampler`] which decides how often it checks for cancellation and reports
//! progress.
//!
//! # Example
//! ```
//! use fp::{matrix::{BatchedMatrix, FieldMatrix}, prime::ValidPrime};
//! use steenrod_linalg::{orthonormalize, OrthonormalizeOptions, Sampler};
//!
//! let p = ValidPrime::new(3);
//! let mut a = BatchedMatrix::from_rows(p, &[vec![1, 2, 0], vec![2, 1, 0], vec![0, 0, 1]], 3)?;
//! let result = orthonormalize(&mut a, OrthonormalizeOptions::KERNEL, &mut Sampler::default())?;
//! assert_eq!(result.rank, 2);
//! assert_eq!(result.kernel.unwrap().to_rows(), vec![vec![1, 1, 0]]);
//! # Ok::<(), steenrod_linalg::ReduceError>(())
//! ```

pub mod any;
pub mod config;
mod eliminate;
pub mod error;
pub mod lift;
pub mod orthonormalize;
pub mod progress;
pub mod quotient;

pub use config::Config;
pub use error::ReduceError;
pub use lift::{lift, LiftMode};
pub use orthonormalize::{orthonormalize, Decomposition, EliminationBasis, OrthonormalizeOptions};
pub use progress::{CancelToken, Progress, Sampler, PHASE_SENTINEL};
pub use quotient::quotient;
