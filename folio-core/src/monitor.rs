//! Deciding when a streamed response has finished generating.
//!
//! Text equality between polls is necessary but not sufficient: a stream
//! can look still between chunks. Completion therefore requires the
//! configured run of identical polls AND a clear busy-indicator probe.
//! Hitting the deadline is a normal outcome, not an error; only a dead
//! session aborts the loop.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use folio_common::Result;

use crate::clean::Cleaner;
use crate::extract::current_response;
use crate::snapshot::SnapshotSource;

/// Returned when the deadline passes before any text was ever observed.
pub const RESPONSE_TIMEOUT_SENTINEL: &str = "Response timeout - no content retrieved";

/// Fixed poll cadence. Faster polling buys little against per-tick
/// extraction cost; slower polling delays completion detection.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Busy cues checked once text has gone stable. A displayed match means
/// the stream is still running regardless of text equality.
pub const BUSY_INDICATOR_SELECTORS: &[&str] = &[
    "[class*='loading']",
    "[class*='typing']",
    "[class*='generating']",
    "[class*='spinner']",
    ".dots",
];

/// Caller-tunable knobs for one wait.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Consecutive identical polls required; the first sighting of a value
    /// counts as one. Clamped to at least 1.
    pub required_stable_ticks: u32,
    /// Overall deadline for the wait.
    pub max_wait: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            required_stable_ticks: 3,
            max_wait: Duration::from_secs(60),
        }
    }
}

impl WaitOptions {
    pub fn new(required_stable_ticks: u32, max_wait: Duration) -> Self {
        Self {
            required_stable_ticks,
            max_wait,
        }
    }
}

/// Terminal state of one wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Text went stable and the busy probe came back clear.
    Complete(String),
    /// Deadline hit; the last observed text is handed back as-is.
    TimedOut(String),
    /// Deadline hit before any poll recorded text.
    Empty,
}

impl WaitOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, WaitOutcome::Complete(_))
    }

    /// Flat string surface: the text, or the timeout sentinel for
    /// [`WaitOutcome::Empty`].
    pub fn into_text(self) -> String {
        match self {
            WaitOutcome::Complete(text) | WaitOutcome::TimedOut(text) => text,
            WaitOutcome::Empty => RESPONSE_TIMEOUT_SENTINEL.to_string(),
        }
    }
}

/// Runs the poll loop against a [`SnapshotSource`].
///
/// Reusable across waits; all per-wait state lives inside
/// [`await_completion`](ResponseWaiter::await_completion). The waiter owns a
/// [`CancellationToken`] so a host can abort a wait early from outside.
pub struct ResponseWaiter {
    options: WaitOptions,
    cleaner: Cleaner,
    cancel: CancellationToken,
}

impl ResponseWaiter {
    pub fn new(options: WaitOptions) -> Self {
        Self {
            options,
            cleaner: Cleaner::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Swap in a cleaner with non-default opening markers.
    pub fn with_cleaner(mut self, cleaner: Cleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Token a host can cancel to end the wait at the next tick.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Poll until the response settles, the deadline passes, or the token
    /// is cancelled. `Err` means the session itself became unusable.
    pub async fn await_completion(&self, source: &dyn SnapshotSource) -> Result<WaitOutcome> {
        let required = self.options.required_stable_ticks.max(1);
        let started = Instant::now();
        let mut last_text = String::new();
        let mut stable_ticks: u32 = 0;

        info!(
            target: "chat.wait",
            max_wait_secs = self.options.max_wait.as_secs(),
            required,
            "waiting for streamed response to settle"
        );

        while started.elapsed() < self.options.max_wait {
            if self.cancel.is_cancelled() {
                warn!(target: "chat.wait", "wait cancelled; returning last observed text");
                break;
            }

            let snapshot = source.snapshot().await?;
            let current = current_response(snapshot.as_ref(), &self.cleaner);

            if current == last_text {
                stable_ticks += 1;
                debug!(target: "chat.wait", stable_ticks, required, "response text unchanged");
            } else {
                debug!(
                    target: "chat.wait",
                    preview = %preview(&current),
                    "response text changed"
                );
                stable_ticks = 1;
                last_text = current;
            }

            if stable_ticks >= required {
                let busy = source.busy_indicator_visible().await.unwrap_or(false);
                if !busy {
                    info!(target: "chat.wait", "response appears complete");
                    return Ok(WaitOutcome::Complete(last_text));
                }
                debug!(target: "chat.wait", "text stable but busy indicator still visible");
            }

            tokio::select! {
                _ = sleep(POLL_INTERVAL) => {}
                _ = self.cancel.cancelled() => {}
            }
        }

        if last_text.is_empty() {
            warn!(target: "chat.wait", "wait ended with no content ever recorded");
            Ok(WaitOutcome::Empty)
        } else {
            warn!(
                target: "chat.wait",
                elapsed_secs = started.elapsed().as_secs(),
                "wait ended before the response settled; returning last text"
            );
            Ok(WaitOutcome::TimedOut(last_text))
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_text_surfaces_the_sentinel_only_for_empty() {
        assert_eq!(WaitOutcome::Complete("hi".into()).into_text(), "hi");
        assert_eq!(WaitOutcome::TimedOut("partial".into()).into_text(), "partial");
        assert_eq!(WaitOutcome::Empty.into_text(), RESPONSE_TIMEOUT_SENTINEL);
    }

    #[test]
    fn default_options_match_the_documented_tuning() {
        let options = WaitOptions::default();
        assert_eq!(options.required_stable_ticks, 3);
        assert_eq!(options.max_wait, Duration::from_secs(60));
        assert_eq!(POLL_INTERVAL, Duration::from_secs(1));
    }
}
