//! Progress reporting and cooperative cancellation.
//!
//! The engines are long loops over rows. Every `2^k` rows they pass through a [`Sampler`]
//! checkpoint, which polls a [`CancelToken`] and reports a fraction of the work done to a
//! [`Progress`] sink. Both are optional, and neither is consulted between checkpoints.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::{ReduceError, Result};

/// Reported once by the quotient engine between its two passes.
pub const PHASE_SENTINEL: f64 = -1.0;

pub const DEFAULT_SAMPLE_SHIFT: u32 = 6;

/// A shared flag asking a running elimination to stop. Clones refer to the same flag, so a token
/// can be handed to another thread and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// A sink for progress reports. Values are in `[0, 1]`, except for [`PHASE_SENTINEL`].
///
/// The call is synchronous, so a slow sink slows down the elimination.
pub trait Progress {
    fn report(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> Progress for F {
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Decides when a row loop checks for cancellation and reports progress.
pub struct Sampler<'a> {
    mask: usize,
    progress: Option<&'a mut dyn Progress>,
    cancel: Option<&'a CancelToken>,
}

impl std::fmt::Debug for Sampler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("mask", &self.mask)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Default for Sampler<'_> {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SHIFT)
    }
}

impl<'a> Sampler<'a> {
    /// Check every `2^shift` rows.
    ///
    /// # Panics
    /// Panics if `2^shift` does not fit in a `usize`.
    pub fn new(shift: u32) -> Self {
        assert!(shift < usize::BITS, "sample shift {shift} is too large");
        Self {
            mask: (1 << shift) - 1,
            progress: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a mut dyn Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Called at the top of the iteration for `row` out of `total`. On sampled rows this fails with
    /// [`ReduceError::Interrupted`] if cancellation was requested, and otherwise reports the eased
    /// fraction `1 - (1 - row / total)^2`.
    #[inline]
    pub fn checkpoint(&mut self, row: usize, total: usize) -> Result<()> {
        if row & self.mask != 0 {
            return Ok(());
        }
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            tracing::warn!(row, total, "elimination cancelled");
            return Err(ReduceError::Interrupted);
        }
        if let Some(progress) = self.progress.as_mut() {
            let remaining = 1.0 - row as f64 / total.max(1) as f64;
            progress.report(1.0 - remaining * remaining);
        }
        Ok(())
    }

    /// Mark the end of one pass of a multi-pass algorithm.
    pub fn phase(&mut self) {
        if let Some(progress) = self.progress.as_mut() {
            progress.report(PHASE_SENTINEL);
        }
    }
}
