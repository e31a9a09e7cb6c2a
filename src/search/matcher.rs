//! Per-message matching: decide whether one message matches, how, and build
//! the context snippet around a content match.
//!
//! Pure substring containment on the cleaned display text and the sender
//! name. No tokenization, no ranking, no regex.

use std::ops::Range;

use serde::Serialize;

use crate::model::message::Message;

use super::{MatchKind, SearchOptions};

/// Characters of context kept on each side of a content match.
pub const DEFAULT_CONTEXT_CHARS: usize = 50;

/// Marker added where a snippet was cut short.
pub const ELLIPSIS: &str = "…";

/// A window of display text around the first content match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    /// Window text, including leading/trailing ellipses when cut.
    pub text: String,
    /// Byte range of the matched substring inside `text`.
    pub highlight: Range<usize>,
}

impl Snippet {
    /// The matched substring, with its original casing.
    pub fn matched(&self) -> &str {
        &self.text[self.highlight.clone()]
    }

    /// Text before the match.
    pub fn before(&self) -> &str {
        &self.text[..self.highlight.start]
    }

    /// Text after the match.
    pub fn after(&self) -> &str {
        &self.text[self.highlight.end..]
    }

    /// Render with the match wrapped in `open`/`close` markers.
    pub fn highlighted(&self, open: &str, close: &str) -> String {
        format!("{}{open}{}{close}{}", self.before(), self.matched(), self.after())
    }
}

/// Result of checking one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub in_content: bool,
    pub in_sender: bool,
    /// Present only when the content matched.
    pub snippet: Option<Snippet>,
}

impl MatchOutcome {
    /// Category of the match. Only built when at least one side matched.
    pub fn kind(&self) -> MatchKind {
        match (self.in_content, self.in_sender) {
            (true, true) => MatchKind::Both,
            (true, false) => MatchKind::Content,
            _ => MatchKind::Sender,
        }
    }
}

/// Matching state prepared once per search.
///
/// Never called for system messages; the orchestrator filters those out.
#[derive(Debug, Clone)]
pub struct Matcher {
    query: String,
    in_content: bool,
    in_sender: bool,
    case_sensitive: bool,
    context_chars: usize,
}

impl Matcher {
    pub fn new(options: &SearchOptions, context_chars: usize) -> Self {
        let query = if options.case_sensitive {
            options.query.clone()
        } else {
            fold_case(&options.query)
        };
        Self {
            query,
            in_content: options.search_in_content,
            in_sender: options.search_in_sender,
            case_sensitive: options.case_sensitive,
            context_chars,
        }
    }

    /// Check one message. `None` when no enabled field contains the query.
    pub fn check(&self, message: &Message) -> Option<MatchOutcome> {
        let mut outcome = MatchOutcome {
            in_content: false,
            in_sender: false,
            snippet: None,
        };

        if self.in_content {
            let text = message.display_text();
            if let Some(range) = self.locate(&text) {
                outcome.in_content = true;
                outcome.snippet = Some(extract_snippet(&text, range, self.context_chars));
            }
        }

        if self.in_sender {
            outcome.in_sender = self.contains(message.sender_name());
        }

        (outcome.in_content || outcome.in_sender).then_some(outcome)
    }

    fn contains(&self, haystack: &str) -> bool {
        if self.case_sensitive {
            haystack.contains(self.query.as_str())
        } else {
            fold_case(haystack).contains(self.query.as_str())
        }
    }

    /// Char range of the first occurrence of the query in `text`.
    fn locate(&self, text: &str) -> Option<Range<usize>> {
        let query_chars = self.query.chars().count();

        if self.case_sensitive {
            let byte = text.find(self.query.as_str())?;
            let start = text[..byte].chars().count();
            return Some(start..start + query_chars);
        }

        let (folded, origin) = fold_case_with_origin(text);
        let byte = folded.find(self.query.as_str())?;
        let folded_start = folded[..byte].chars().count();
        let text_chars = text.chars().count();

        if query_chars == 0 {
            let at = origin.get(folded_start).copied().unwrap_or(text_chars);
            return Some(at..at);
        }
        let start = origin[folded_start];
        let end = origin[folded_start + query_chars - 1] + 1;
        Some(start..end)
    }
}

/// Lower-case char by char, so query and haystack fold the same way.
fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Fold case and record, for each folded char, the index of the source char.
fn fold_case_with_origin(text: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (index, ch) in text.chars().enumerate() {
        for lower in ch.to_lowercase() {
            folded.push(lower);
            origin.push(index);
        }
    }
    (folded, origin)
}

/// Cut a window of `context` chars each side of `matched` (a char range).
///
/// Text shorter than the window comes back whole, without ellipses.
pub fn extract_snippet(text: &str, matched: Range<usize>, context: usize) -> Snippet {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    let start = matched.start.saturating_sub(context);
    let end = matched.end.saturating_add(context).min(char_count);

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    let highlight_start = snippet.len() + bounds[matched.start] - bounds[start];
    let highlight_end = snippet.len() + bounds[matched.end] - bounds[start];
    snippet.push_str(&text[bounds[start]..bounds[end]]);
    if end < char_count {
        snippet.push_str(ELLIPSIS);
    }

    Snippet {
        text: snippet,
        highlight: highlight_start..highlight_end,
    }
}
