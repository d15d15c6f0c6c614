//! Cancelable scheduled callbacks.
//!
//! The runtime has exactly two kinds of timers: periodic resource sampling and
//! request timeouts. Both are modelled as a [`ScheduledTask`] which owns a
//! [`CancellationToken`]; cancelling (or dropping) the task stops the callback
//! from firing again.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Handle to a callback scheduled on the tokio runtime.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct ScheduledTask {
    name: &'static str,
    token: CancellationToken,
}

impl ScheduledTask {
    /// Whether a tokio runtime is available on this thread to schedule on.
    ///
    /// Callers that must guarantee a timer fires check this first, since
    /// [`after`](Self::after) and [`every`](Self::every) are inert without one.
    #[must_use]
    pub fn runtime_available() -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    /// Run `callback` once after `delay`.
    ///
    /// If no tokio runtime is available the task is returned already
    /// cancelled and the callback never runs.
    pub fn after<F>(name: &'static str, delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(task = name, "No tokio runtime available, task not scheduled");
            token.cancel();
            return Self { name, token };
        };

        let child = token.clone();
        handle.spawn(async move {
            tokio::select! {
                biased;
                () = child.cancelled() => {
                    trace!(task = name, "Scheduled task cancelled");
                },
                () = tokio::time::sleep(delay) => {
                    if !child.is_cancelled() {
                        callback();
                    }
                },
            }
        });

        Self { name, token }
    }

    /// Run `callback` every `period`, starting one period from now.
    ///
    /// The task stops when cancelled or when the callback returns
    /// [`ControlFlow::Break`].
    pub fn every<F>(name: &'static str, period: Duration, mut callback: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(task = name, "No tokio runtime available, task not scheduled");
            token.cancel();
            return Self { name, token };
        };

        let child = token.clone();
        handle.spawn(async move {
            let start = tokio::time::Instant::now()
                .checked_add(period)
                .unwrap_or_else(tokio::time::Instant::now);
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = child.cancelled() => break,
                    _ = interval.tick() => {
                        if callback().is_break() {
                            child.cancel();
                            break;
                        }
                    },
                }
            }
            trace!(task = name, "Periodic task stopped");
        });

        Self { name, token }
    }

    /// Cancel the task. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task has been cancelled or has stopped itself.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The task's diagnostic name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
