//! Storage for linear algebra over prime fields.
//!
//! This crate provides vectors and matrices over $\mathbb{F}_p$ for every prime `p` whose elements
//! fit in a byte, in three physical encodings that share the [`matrix::FieldMatrix`] interface.
//! The elimination algorithms themselves live in the `steenrod-linalg` crate and are written only
//! against that interface.

#![allow(clippy::many_single_char_names)]
#![allow(clippy::len_without_is_empty)]

mod constants;
pub(crate) mod limb;
mod macros;
pub(crate) mod simd;

pub mod error;
pub mod matrix;
pub mod prime;
pub mod vector;

pub use error::MatrixError;
