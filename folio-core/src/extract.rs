//! Pulling the current response text out of a page snapshot.
//!
//! Chat UIs rarely expose a stable "the answer lives here" hook, so
//! extraction tries a prioritized list of structural selectors and keeps the
//! longest text any of them matched. When none match at all it falls back to
//! scanning the trailing generic elements of the document for something that
//! reads like content rather than chrome.

use crate::char_len;
use crate::clean::Cleaner;
use crate::snapshot::Snapshot;

/// Returned when nothing on the page looks like response content.
pub const NO_CONTENT_SENTINEL: &str = "No response content found";

/// Response-bearing selectors, highest priority first. Priority only breaks
/// length ties: the longest candidate across all of them wins.
pub const RESPONSE_SELECTORS: &[&str] = &[
    "[data-testid*='response']",
    "[data-testid*='message']",
    "[role='article']",
    "[class*='message']:last-child",
    "[class*='response']:last-child",
    "[class*='chat-message']:last-child",
    ".message:last-child",
    ".chat-bubble:last-child",
    "[class*='ai-response']",
    "[class*='assistant-message']",
];

/// Selector the driver uses to collect trailing generic text elements.
pub const TAIL_SELECTOR: &str = "p, div, span";

/// How many trailing elements the fallback scan considers.
pub const TAIL_SCAN_LIMIT: usize = 20;

/// Minimum length for a fallback candidate to count as content.
const TAIL_MIN_CHARS: usize = 50;

/// Chrome fragments that disqualify a fallback candidate (case-insensitive).
const TAIL_DENYLIST: &[&str] = &[
    "ask about",
    "loading",
    "error",
    "sign in",
    "menu",
    "copy_all",
    "thumb_up",
    "thumb_down",
];

/// Best-guess raw response text for one snapshot.
///
/// Pure over the snapshot: same input, same output, no side effects.
/// Returns [`NO_CONTENT_SENTINEL`] when neither the selector pass nor the
/// trailing-element scan finds anything.
pub fn extract_response(snapshot: &dyn Snapshot) -> String {
    let mut best = String::new();

    for selector in RESPONSE_SELECTORS {
        for text in snapshot.select_texts(selector) {
            let text = text.trim();
            // strictly longer: ties keep the first-found candidate
            if char_len(text) > char_len(&best) {
                best = text.to_string();
            }
        }
    }

    if best.is_empty() {
        for text in snapshot.tail_texts(TAIL_SCAN_LIMIT).iter().rev() {
            let text = text.trim();
            let lower = text.to_lowercase();
            if char_len(text) > TAIL_MIN_CHARS
                && !TAIL_DENYLIST.iter().any(|skip| lower.contains(skip))
            {
                best = text.to_string();
                break;
            }
        }
    }

    if best.is_empty() {
        NO_CONTENT_SENTINEL.to_string()
    } else {
        best
    }
}

/// One poll's final text: extract, then clean, then re-apply the sentinel
/// if cleaning consumed everything.
pub fn current_response(snapshot: &dyn Snapshot, cleaner: &Cleaner) -> String {
    let cleaned = cleaner.clean(&extract_response(snapshot));
    if cleaned.is_empty() {
        NO_CONTENT_SENTINEL.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::StaticSnapshot;

    const LONG: &str = "This answer is comfortably longer than every other candidate in the snapshot.";

    #[test]
    fn longest_candidate_wins_across_selectors() {
        let snap = StaticSnapshot::new()
            .with_texts("[data-testid*='response']", ["short reply"])
            .with_texts("[role='article']", [LONG, "middle-sized answer text"]);
        assert_eq!(extract_response(&snap), LONG);
    }

    #[test]
    fn length_ties_keep_the_first_discovered() {
        // same length via both selectors; priority order decides
        let snap = StaticSnapshot::new()
            .with_texts("[data-testid*='response']", ["aaaa"])
            .with_texts("[role='article']", ["bbbb"]);
        assert_eq!(extract_response(&snap), "aaaa");
    }

    #[test]
    fn candidate_text_is_trimmed() {
        let snap =
            StaticSnapshot::new().with_texts("[data-testid*='message']", ["  padded reply  "]);
        assert_eq!(extract_response(&snap), "padded reply");
    }

    #[test]
    fn tail_scan_takes_the_last_substantial_element() {
        let substantial =
            "Trailing paragraph with enough prose in it to clear the fallback length bar.";
        let snap = StaticSnapshot::new().with_tail([
            "nav",
            substantial,
            "Loading more results for you, one moment please, almost there now friend...",
            "ok",
        ]);
        // reverse scan: "ok" too short, the loading line is denylisted,
        // the substantial paragraph wins
        assert_eq!(extract_response(&snap), substantial);
    }

    #[test]
    fn denylisted_fragments_disqualify_case_insensitively() {
        let snap = StaticSnapshot::new().with_tail([
            "Please Sign In to continue reading all of the content available on this page today.",
        ]);
        assert_eq!(extract_response(&snap), NO_CONTENT_SENTINEL);
    }

    #[test]
    fn empty_snapshot_yields_the_sentinel() {
        assert_eq!(extract_response(&StaticSnapshot::new()), NO_CONTENT_SENTINEL);
    }

    #[test]
    fn selector_hits_preempt_the_tail_scan() {
        let snap = StaticSnapshot::new()
            .with_texts(".message:last-child", ["selector candidate"])
            .with_tail([LONG]);
        assert_eq!(extract_response(&snap), "selector candidate");
    }

    #[test]
    fn current_response_sentinels_when_cleaning_consumes_everything() {
        let snap = StaticSnapshot::new().with_texts("[role='article']", ["thumb_up"]);
        let text = current_response(&snap, &Cleaner::default());
        assert_eq!(text, NO_CONTENT_SENTINEL);
    }
}
