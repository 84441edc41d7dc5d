//! Serial or rayon-parallel evaluation of independent samples.
//!
//! Height sampling and raster baking are per-sample pure functions, so they
//! may run on all cores. Work is split into fixed-size batches; a
//! [`CancelToken`] is checked between batches only. Results never depend on
//! the execution mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of samples evaluated between cancellation checks.
pub const BATCH_SIZE: usize = 4096;

/// How independent samples are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Evaluate on the calling thread.
    #[default]
    Serial,
    /// Spread batches across the rayon thread pool.
    Parallel,
}

/// Returned when a [`CancelToken`] fired before the work finished.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("generation cancelled")]
pub struct Cancelled;

/// Shared flag requesting that in-flight generation stop at the next batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Visible to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns `Err(Cancelled)` if cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Maps `f` over `items` batch by batch, preserving order.
pub fn map_batched<I, T, F>(
    items: &[I],
    mode: ExecutionMode,
    cancel: Option<&CancelToken>,
    f: F,
) -> Result<Vec<T>, Cancelled>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync,
{
    let mut out = Vec::with_capacity(items.len());
    for batch in items.chunks(BATCH_SIZE) {
        if let Some(token) = cancel {
            token.check()?;
        }
        match mode {
            ExecutionMode::Serial => out.extend(batch.iter().map(&f)),
            ExecutionMode::Parallel => {
                let mapped: Vec<T> = batch.par_iter().map(&f).collect();
                out.extend(mapped);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_agree() {
        let items: Vec<u64> = (0..10_000).collect();
        let serial = map_batched(&items, ExecutionMode::Serial, None, |x| x * 3 + 1).unwrap();
        let parallel = map_batched(&items, ExecutionMode::Parallel, None, |x| x * 3 + 1).unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(serial[9_999], 29_998);
    }

    #[test]
    fn test_cancelled_token_stops_work() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());

        let items = vec![1u32; 10];
        let result = map_batched(&items, ExecutionMode::Serial, Some(&token), |x| *x);
        assert_eq!(result, Err(Cancelled));
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u8> = Vec::new();
        let out = map_batched(&items, ExecutionMode::Parallel, None, |x| *x).unwrap();
        assert!(out.is_empty());
    }
}
