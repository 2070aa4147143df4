use fp::MatrixError;
use thiserror::Error;

/// Why an elimination did not finish.
///
/// None of the engines retry or roll back. After an error, matrices the call was mutating may be
/// partially reduced and should be rebuilt before they are used again.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("interrupted")]
    Interrupted,
}

impl ReduceError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, ReduceError>;
