//! Stripping UI chrome and echoed user input out of extracted text.
//!
//! Extraction grabs whole message containers, so the raw text often carries
//! action-button captions and the user's own question. Cleaning peels those
//! away through a ladder of heuristics, each tier a safety net for the one
//! before it; the worst case is the input handed back untouched. Cleaning
//! never fails.

use crate::char_len;

/// Action-button captions that ride along inside message containers.
const UI_ARTIFACTS: &[&str] = &[
    "copy_all",
    "thumb_up",
    "thumb_down",
    "share",
    "more_options",
    "like",
    "dislike",
];

/// Default phrases that mark where answer prose begins.
///
/// Deliberately generic: anything domain-specific belongs in caller
/// configuration via [`Cleaner::with_markers`].
pub const DEFAULT_OPENING_MARKERS: &[&str] = &[
    "Based on",
    "According to",
    "Here's",
    "Let me",
    "I can",
    "The answer",
    "To answer",
];

/// A line at least this long that doesn't end in `?` reads as answer prose.
const ANSWER_LINE_CHARS: usize = 50;

/// Paragraph fallback: first blank-line-separated chunk above this size.
const PARAGRAPH_CHARS: usize = 100;

/// First lines shorter than this are assumed to be the echoed question.
const QUESTION_LINE_CHARS: usize = 100;

/// Isolates answer prose from raw extracted text. Total: every tier
/// degrades to less-processed text instead of erroring.
#[derive(Debug, Clone)]
pub struct Cleaner {
    opening_markers: Vec<String>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::with_markers(DEFAULT_OPENING_MARKERS.iter().copied())
    }
}

impl Cleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the answer-opening marker list (case-sensitive matches).
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            opening_markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        // Tier 1: shave action captions off the end, repeatedly, since
        // several can stack ("... copy_all thumb_up").
        let mut working = text.trim().to_string();
        loop {
            let mut stripped = false;
            for artifact in UI_ARTIFACTS {
                if let Some(rest) = working.strip_suffix(artifact) {
                    working = rest.trim_end().to_string();
                    stripped = true;
                }
            }
            if !stripped {
                break;
            }
        }

        // Tier 2: drop whole lines that are nothing but captions, or short
        // lines that contain one.
        let kept: Vec<&str> = working
            .lines()
            .filter(|line| {
                let lower = line.trim().to_lowercase();
                if UI_ARTIFACTS.contains(&lower.as_str()) {
                    return false;
                }
                if char_len(&lower) < ANSWER_LINE_CHARS
                    && UI_ARTIFACTS.iter().any(|artifact| lower.contains(artifact))
                {
                    return false;
                }
                true
            })
            .collect();
        let working = kept.join("\n").trim().to_string();

        // Tier 3: echo removal. The first line that carries an opening
        // marker, or that is long prose not ending in "?", starts the
        // answer; everything above it is assumed to be the echoed question.
        let lines: Vec<&str> = working.lines().collect();
        let mut start = 0;
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if self
                .opening_markers
                .iter()
                .any(|marker| trimmed.contains(marker.as_str()))
            {
                start = i;
                break;
            }
            if char_len(trimmed) > ANSWER_LINE_CHARS && !trimmed.ends_with('?') {
                start = i;
                break;
            }
        }
        let mut cleaned = lines[start..].join("\n").trim().to_string();

        // Tier 4: echo removal left too little; take the first substantial
        // blank-line paragraph of the pre-tier-3 text instead.
        if char_len(&cleaned) < ANSWER_LINE_CHARS {
            for paragraph in working.split("\n\n") {
                let paragraph = paragraph.trim();
                if char_len(paragraph) > PARAGRAPH_CHARS {
                    cleaned = paragraph.to_string();
                    break;
                }
            }
        }

        // Tier 5: still nothing substantial. Drop just the first line when
        // it looks like the question; otherwise give the text back as-is.
        if char_len(&cleaned) < ANSWER_LINE_CHARS {
            if lines.len() > 1 {
                let first = lines[0].trim();
                if first.ends_with('?') || char_len(first) < QUESTION_LINE_CHARS {
                    cleaned = lines[1..].join("\n").trim().to_string();
                } else {
                    cleaned = working.clone();
                }
            } else {
                cleaned = working.clone();
            }
        }

        cleaned
    }
}
