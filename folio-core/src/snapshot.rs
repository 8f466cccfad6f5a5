//! The boundary between the capture protocol and whatever renders the page.

use std::collections::HashMap;

use async_trait::async_trait;
use folio_common::Result;

/// Queryable view of the rendered chat surface at one poll tick.
///
/// A snapshot is owned data captured at one instant; the extractor never
/// reaches back into a live page through it.
pub trait Snapshot: Send {
    /// Visible text of every element matching `selector`, document order.
    /// Unmatched or unqueryable selectors yield an empty vec.
    fn select_texts(&self, selector: &str) -> Vec<String>;

    /// Visible text of up to `limit` trailing generic text-bearing
    /// elements, document order.
    fn tail_texts(&self, limit: usize) -> Vec<String>;
}

/// Supplies fresh snapshots of a live session at ~1 Hz.
///
/// Implementations swallow per-selector query failures into empty candidate
/// lists; `Err` from [`snapshot`](SnapshotSource::snapshot) is reserved for
/// an unusable session (browser gone), which aborts the wait loop.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Result<Box<dyn Snapshot + Send>>;

    /// Whether a loading/typing/spinner cue is currently displayed.
    /// Best-effort: the monitor treats `Err` as "not busy".
    async fn busy_indicator_visible(&self) -> Result<bool>;
}

/// Snapshot backed by plain maps.
///
/// The driver fills one per poll from live element queries; tests build
/// them directly.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshot {
    by_selector: HashMap<String, Vec<String>>,
    tail: Vec<String>,
}

impl StaticSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the texts matched by `selector`.
    pub fn insert(&mut self, selector: &str, texts: Vec<String>) {
        self.by_selector.insert(selector.to_string(), texts);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_texts<I, S>(mut self, selector: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_selector
            .insert(selector.to_string(), texts.into_iter().map(Into::into).collect());
        self
    }

    /// Record the trailing generic text elements, document order.
    pub fn with_tail<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tail = texts.into_iter().map(Into::into).collect();
        self
    }

    pub fn push_tail(&mut self, text: impl Into<String>) {
        self.tail.push(text.into());
    }
}

impl Snapshot for StaticSnapshot {
    fn select_texts(&self, selector: &str) -> Vec<String> {
        self.by_selector.get(selector).cloned().unwrap_or_default()
    }

    fn tail_texts(&self, limit: usize) -> Vec<String> {
        let skip = self.tail.len().saturating_sub(limit);
        self.tail[skip..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_selector_yields_no_candidates() {
        let snap = StaticSnapshot::new();
        assert!(snap.select_texts("[role='article']").is_empty());
    }

    #[test]
    fn tail_keeps_the_last_n_in_document_order() {
        let snap = StaticSnapshot::new().with_tail(["a", "b", "c", "d"]);
        assert_eq!(snap.tail_texts(2), vec!["c".to_string(), "d".to_string()]);
        assert_eq!(snap.tail_texts(10).len(), 4);
    }
}
