use std::{fmt, time::Duration};

use crate::{
    internal_events::{NonRetriableError, RetriesExhausted, RetryCancelled, RetryScheduled},
    shutdown::ShutdownSignal,
    webhdfs::TransferError,
};

/// Decides which errors are worth another attempt.
pub trait RetryLogic {
    type Error: fmt::Display;

    fn is_retriable_error(&self, error: &Self::Error) -> bool;
}

/// Retries transient WebHDFS failures: network errors, server errors, `408`
/// and `429`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransferRetryLogic;

impl RetryLogic for TransferRetryLogic {
    type Error = TransferError;

    fn is_retriable_error(&self, error: &TransferError) -> bool {
        error.is_transient()
    }
}

/// Bounded retries with exponential backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

/// The outcome of a retried call that did not succeed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The last error seen, after retries ran out or for a non-retriable error.
    Failed(E),
    /// A shutdown interrupted the backoff before the next attempt.
    Cancelled(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Failed(error) | RetryError::Cancelled(error) => error,
        }
    }
}

impl RetryPolicy {
    pub const fn new(attempts: usize, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            attempts,
            initial_backoff,
            max_backoff,
        }
    }

    /// A policy that never retries.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Backoff before retry number `retry`, counted from 1.
    pub fn backoff(&self, retry: usize) -> Duration {
        let exponent = u32::try_from(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(2u32.saturating_pow(exponent))
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Runs `f` until it succeeds, fails with a non-retriable error, or the
    /// retries run out.
    ///
    /// Backoff waits on `shutdown`; a trigger during a wait abandons the call
    /// with the last error.
    pub fn call<L, T, F>(
        &self,
        logic: &L,
        shutdown: &ShutdownSignal,
        operation: &str,
        mut f: F,
    ) -> Result<T, RetryError<L::Error>>
    where
        L: RetryLogic,
        F: FnMut() -> Result<T, L::Error>,
    {
        let mut retry = 0;
        loop {
            let error = match f() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !logic.is_retriable_error(&error) {
                emit!(NonRetriableError {
                    operation,
                    error: &error,
                });
                return Err(RetryError::Failed(error));
            }
            if retry >= self.attempts {
                emit!(RetriesExhausted {
                    operation,
                    attempts: retry + 1,
                    error: &error,
                });
                return Err(RetryError::Failed(error));
            }

            retry += 1;
            let backoff = self.backoff(retry);
            emit!(RetryScheduled {
                operation,
                attempt: retry,
                backoff,
                error: &error,
            });
            if shutdown.wait_timeout(backoff) {
                emit!(RetryCancelled {
                    operation,
                    attempt: retry,
                });
                return Err(RetryError::Cancelled(error));
            }
        }
    }
}
