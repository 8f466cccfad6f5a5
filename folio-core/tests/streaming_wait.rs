//! Scripted-source tests for the streamed-response wait loop.
//!
//! Paused tokio time makes the 1 Hz cadence run instantly while keeping the
//! tick arithmetic exact, so every assertion below is about which tick the
//! loop acted on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use folio_common::{FolioError, Result};
use folio_core::{
    ResponseWaiter, Snapshot, SnapshotSource, StaticSnapshot, WaitOptions, WaitOutcome,
    NO_CONTENT_SENTINEL, RESPONSE_TIMEOUT_SENTINEL,
};

const ALPHA: &str = "The first draft of the streamed answer text.";
const BRAVO: &str = "A newer, longer draft of the streamed answer.";

/// Replays a fixed text per tick; repeats the last entry when exhausted.
/// An empty string scripts a tick with nothing extractable on the page.
struct ScriptedSource {
    script: Vec<&'static str>,
    polls: AtomicUsize,
    /// Busy probe answers `true` while the poll count is at or below this.
    busy_through: usize,
    busy_probe_fails: bool,
}

impl ScriptedSource {
    fn new(script: Vec<&'static str>) -> Self {
        Self {
            script,
            polls: AtomicUsize::new(0),
            busy_through: 0,
            busy_probe_fails: false,
        }
    }

    fn busy_through(mut self, ticks: usize) -> Self {
        self.busy_through = ticks;
        self
    }

    fn with_failing_busy_probe(mut self) -> Self {
        self.busy_probe_fails = true;
        self
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn snapshot(&self) -> Result<Box<dyn Snapshot + Send>> {
        let tick = self.polls.fetch_add(1, Ordering::SeqCst);
        let text = self
            .script
            .get(tick)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or("");

        let mut snap = StaticSnapshot::new();
        if !text.is_empty() {
            snap = snap.with_texts("[data-testid*='response']", [text]);
        }
        Ok(Box::new(snap))
    }

    async fn busy_indicator_visible(&self) -> Result<bool> {
        if self.busy_probe_fails {
            return Err(FolioError::Chat("indicator query failed".into()));
        }
        Ok(self.polls.load(Ordering::SeqCst) <= self.busy_through)
    }
}

/// Source whose session is already gone.
struct DeadSource;

#[async_trait]
impl SnapshotSource for DeadSource {
    async fn snapshot(&self) -> Result<Box<dyn Snapshot + Send>> {
        Err(FolioError::Chat("browser session closed".into()))
    }

    async fn busy_indicator_visible(&self) -> Result<bool> {
        Ok(false)
    }
}

fn waiter(ticks: u32, max_wait_secs: u64) -> ResponseWaiter {
    ResponseWaiter::new(WaitOptions::new(ticks, Duration::from_secs(max_wait_secs)))
}

#[tokio::test(start_paused = true)]
async fn completes_after_required_stable_ticks() {
    let source = ScriptedSource::new(vec![ALPHA, ALPHA, ALPHA]);
    let outcome = waiter(3, 60).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Complete(ALPHA.to_string()));
    assert_eq!(source.polls(), 3, "should fire exactly on the third tick");
}

#[tokio::test(start_paused = true)]
async fn text_change_resets_the_stability_count() {
    let source = ScriptedSource::new(vec![ALPHA, ALPHA, BRAVO, BRAVO, BRAVO]);
    let outcome = waiter(3, 60).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Complete(BRAVO.to_string()));
    assert_eq!(source.polls(), 5, "stability must restart when text changes");
}

#[tokio::test(start_paused = true)]
async fn busy_indicator_overrides_text_stability() {
    let source = ScriptedSource::new(vec![ALPHA, ALPHA, ALPHA, ALPHA]).busy_through(3);
    let outcome = waiter(3, 60).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Complete(ALPHA.to_string()));
    assert_eq!(
        source.polls(),
        4,
        "stable text must not complete while the busy cue is displayed"
    );
}

#[tokio::test(start_paused = true)]
async fn failing_busy_probe_is_treated_as_not_busy() {
    let source = ScriptedSource::new(vec![ALPHA, ALPHA, ALPHA]).with_failing_busy_probe();
    let outcome = waiter(3, 60).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Complete(ALPHA.to_string()));
}

#[tokio::test(start_paused = true)]
async fn deadline_returns_the_last_observed_text() {
    let source = ScriptedSource::new(vec![ALPHA, BRAVO, ALPHA]);
    let outcome = waiter(3, 3).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::TimedOut(ALPHA.to_string()));
    assert_eq!(outcome.into_text(), ALPHA);
    assert_eq!(source.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn deadline_with_no_polls_yields_the_timeout_sentinel() {
    let source = ScriptedSource::new(vec![ALPHA]);
    let outcome = waiter(3, 0).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Empty);
    assert_eq!(outcome.into_text(), RESPONSE_TIMEOUT_SENTINEL);
    assert_eq!(source.polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn pages_with_no_content_settle_on_the_extractor_sentinel() {
    // the no-match sentinel is ordinary text to the monitor: it stabilizes
    // and completes, superseding the monitor's own timeout sentinel
    let source = ScriptedSource::new(vec![""]);
    let outcome = waiter(3, 60).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Complete(NO_CONTENT_SENTINEL.to_string()));
    assert_eq!(source.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_ends_the_wait_early() {
    let source = ScriptedSource::new(vec![ALPHA]);
    let waiter = waiter(3, 60);
    waiter.cancellation_token().cancel();

    let outcome = waiter.await_completion(&source).await.unwrap();
    assert_eq!(outcome, WaitOutcome::Empty);
    assert_eq!(source.polls(), 0, "a cancelled wait should not poll");
}

#[tokio::test(start_paused = true)]
async fn dead_session_aborts_the_wait_with_an_error() {
    let err = waiter(3, 60)
        .await_completion(&DeadSource)
        .await
        .expect_err("driver loss must surface, not be swallowed");
    assert!(matches!(err, FolioError::Chat(_)));
}

#[tokio::test(start_paused = true)]
async fn a_single_required_tick_completes_immediately() {
    let source = ScriptedSource::new(vec![ALPHA]);
    let outcome = waiter(1, 60).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Complete(ALPHA.to_string()));
    assert_eq!(source.polls(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_required_ticks_is_clamped_to_one() {
    let source = ScriptedSource::new(vec![ALPHA]);
    let outcome = waiter(0, 60).await_completion(&source).await.unwrap();

    assert_eq!(outcome, WaitOutcome::Complete(ALPHA.to_string()));
    assert_eq!(source.polls(), 1);
}
