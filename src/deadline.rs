//! Per-request time budgets.

use crate::error::{Result, VidQueryError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// A point in time after which a request's remaining stages are abandoned.
///
/// A deadline without an instant never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline `budget` from now, or none when `budget` is `None`.
    pub fn after(budget: Option<Duration>) -> Self {
        Self {
            at: budget.map(|b| Instant::now() + b),
        }
    }

    pub fn none() -> Self {
        Self { at: None }
    }

    /// Time left before expiry, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Run `fut` within the remaining budget.
    ///
    /// Expiry drops the future and yields [`VidQueryError::Timeout`] naming `stage`.
    /// A stage reached after expiry is never polled.
    pub async fn run<F, T>(&self, stage: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.remaining() {
            None => fut.await,
            Some(left) if left.is_zero() => Err(VidQueryError::Timeout(stage.to_string())),
            Some(left) => tokio::time::timeout(left, fut)
                .await
                .map_err(|_| VidQueryError::Timeout(stage.to_string()))?,
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
