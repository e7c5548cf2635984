use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

/// Shared stop flag for a running block.
///
/// Cloned into the block and into whatever triggers the stop. Retry backoffs
/// sleep on it, so a trigger cuts a pending wait short instead of letting it
/// run out.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop and wakes every waiter. Idempotent.
    pub fn trigger(&self) {
        let (flag, condvar) = &*self.inner;
        *lock(flag) = true;
        condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *lock(&self.inner.0)
    }

    /// Sleeps for `timeout` or until triggered, whichever comes first.
    ///
    /// Returns `true` if the signal was triggered. A timeout too large to
    /// represent as a deadline waits for the trigger alone.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, condvar) = &*self.inner;
        let deadline = Instant::now().checked_add(timeout);
        let mut triggered = lock(flag);
        while !*triggered {
            triggered = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    condvar
                        .wait_timeout(triggered, deadline - now)
                        .map(|(guard, _)| guard)
                        .unwrap_or_else(|poisoned| poisoned.into_inner().0)
                }
                None => condvar
                    .wait(triggered)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
        *triggered
    }
}

fn lock(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(PoisonError::into_inner)
}
