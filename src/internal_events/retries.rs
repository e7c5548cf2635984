use std::{fmt::Display, time::Duration};

use metrics::counter;

use super::InternalEvent;

#[derive(Debug)]
pub struct RetryScheduled<'a, E> {
    pub operation: &'a str,
    pub attempt: usize,
    pub backoff: Duration,
    pub error: &'a E,
}

impl<E: Display> InternalEvent for RetryScheduled<'_, E> {
    fn emit(self) {
        warn!(
            message = "Retrying after error.",
            operation = self.operation,
            attempt = self.attempt,
            backoff_ms = self.backoff.as_millis() as u64,
            error = %self.error,
        );
        counter!(
            "webhdfs_retries_total",
            "operation" => self.operation.to_owned(),
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct RetriesExhausted<'a, E> {
    pub operation: &'a str,
    pub attempts: usize,
    pub error: &'a E,
}

impl<E: Display> InternalEvent for RetriesExhausted<'_, E> {
    fn emit(self) {
        error!(
            message = "Retries exhausted; giving up.",
            operation = self.operation,
            attempts = self.attempts,
            error = %self.error,
        );
    }
}

#[derive(Debug)]
pub struct NonRetriableError<'a, E> {
    pub operation: &'a str,
    pub error: &'a E,
}

impl<E: Display> InternalEvent for NonRetriableError<'_, E> {
    fn emit(self) {
        error!(
            message = "Encountered non-retriable error.",
            operation = self.operation,
            error = %self.error,
        );
    }
}

#[derive(Debug)]
pub struct RetryCancelled<'a> {
    pub operation: &'a str,
    pub attempt: usize,
}

impl InternalEvent for RetryCancelled<'_> {
    fn emit(self) {
        warn!(
            message = "Shutdown requested during retry backoff.",
            operation = self.operation,
            attempt = self.attempt,
        );
    }
}
