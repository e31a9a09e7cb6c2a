//! Conversation paging and console rendering.
//!
//! Paging is pure: [`paginate`] selects, orders and slices a conversation's
//! messages without touching the conversation itself. The [`render`]
//! module turns pages, lists and search results into text.

pub mod render;
pub mod theme;

use chrono::{DateTime, Utc};

use crate::config::ViewConfig;
use crate::model::conversation::Conversation;
use crate::model::message::Message;

/// How a conversation is paged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub show_system: bool,
    pub page_size: usize,
    pub newest_first: bool,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Used when a page size of 0 is requested.
pub const DEFAULT_PAGE_SIZE: usize = 20;

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            show_system: false,
            page_size: DEFAULT_PAGE_SIZE,
            newest_first: false,
            date_from: None,
            date_to: None,
        }
    }
}

impl ViewOptions {
    pub fn from_config(config: &ViewConfig) -> Self {
        Self {
            show_system: config.show_system,
            page_size: config.page_size,
            newest_first: config.newest_first,
            ..Self::default()
        }
    }

    fn effective_page_size(&self) -> usize {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Date bounds are inclusive; unparseable timestamps fail any bound.
    fn accepts(&self, message: &Message) -> bool {
        if !self.show_system && message.is_system() {
            return false;
        }
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }
        let Some(ts) = message.timestamp() else {
            return false;
        };
        self.date_from.is_none_or(|from| ts >= from) && self.date_to.is_none_or(|to| ts <= to)
    }
}

/// Messages visible under `options`, in display order.
pub fn visible_messages<'a>(conversation: &'a Conversation, options: &ViewOptions) -> Vec<&'a Message> {
    let mut messages: Vec<&Message> = conversation
        .messages
        .iter()
        .filter(|m| options.accepts(m))
        .collect();

    if options.newest_first {
        // Stable: equal or unparseable timestamps keep stored order,
        // and unparseable ones sink to the end.
        messages.sort_by_key(|m| std::cmp::Reverse(m.timestamp()));
    }
    messages
}

/// One page of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// 1-based page number after clamping.
    pub number: usize,
    pub total_pages: usize,
    /// Visible messages across all pages.
    pub total_messages: usize,
    /// 0-based index of the first message of this page among visible ones.
    pub offset: usize,
    pub messages: Vec<&'a Message>,
}

impl Page<'_> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }
}

/// Select page `requested` (1-based), clamped to the available range.
///
/// An empty conversation yields page 1 of 1 with no messages.
pub fn paginate<'a>(conversation: &'a Conversation, options: &ViewOptions, requested: usize) -> Page<'a> {
    let visible = visible_messages(conversation, options);
    let page_size = options.effective_page_size();
    let total_messages = visible.len();
    let total_pages = total_messages.div_ceil(page_size).max(1);
    let number = requested.clamp(1, total_pages);
    let offset = (number - 1) * page_size;
    let messages = visible
        .into_iter()
        .skip(offset)
        .take(page_size)
        .collect();

    Page {
        number,
        total_pages,
        total_messages,
        offset,
        messages,
    }
}

/// A command typed at the paging prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Prev,
    Goto(usize),
    Quit,
}

impl Navigation {
    /// Parse `n`/`next`, `p`/`prev`, `q`/`quit`, or a positive page number.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().to_lowercase();
        match input.as_str() {
            "n" | "next" => Some(Self::Next),
            "p" | "prev" => Some(Self::Prev),
            "q" | "quit" => Some(Self::Quit),
            other => other.parse::<usize>().ok().filter(|&n| n > 0).map(Self::Goto),
        }
    }

    /// Page to show next, or `None` to stop.
    pub fn apply(self, current: usize) -> Option<usize> {
        match self {
            Self::Next => Some(current + 1),
            Self::Prev => Some(current.saturating_sub(1).max(1)),
            Self::Goto(n) => Some(n),
            Self::Quit => None,
        }
    }
}
