//! Plain-text renderers for conversation lists, pages and search results.
//!
//! Everything writes to an `impl Write` so the CLI can target stdout and
//! tests can target a `Vec<u8>`.

use std::io::{self, Write};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::Theme;
use super::Page;
use crate::model::conversation::Conversation;
use crate::model::history::History;
use crate::model::message::Message;
use crate::search::SearchResult;

const NAME_WIDTH: usize = 40;
const LIST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Truncate to `max_width` display columns, ending with `...` when cut.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return s.chars().take(max_width).collect();
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width + 3 > max_width {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("...");
    result
}

/// Left-align in `width` display columns (format width counts chars, not columns).
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

/// Numbered table of conversations with participant and message counts.
pub fn write_conversation_list(
    out: &mut impl Write,
    history: &History,
    show_system: bool,
    theme: &Theme,
) -> io::Result<()> {
    if history.conversations.is_empty() {
        return writeln!(out, "No conversations found.");
    }

    let header = format!(
        "{:>4}  {}  {:>12}  {:>8}  {}",
        "#",
        pad("Name", NAME_WIDTH),
        "Participants",
        "Messages",
        "Last message"
    );
    writeln!(out, "{}", theme.table_header.apply(&header))?;
    writeln!(out, "{}", "-".repeat(UnicodeWidthStr::width(header.as_str())))?;

    for (i, conv) in history.conversations.iter().enumerate() {
        let last = conv
            .last_message_time()
            .map(|t| t.format(LIST_DATE_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:>4}  {}  {:>12}  {:>8}  {}",
            i + 1,
            pad(&truncate_str(conv.display_name(), NAME_WIDTH), NAME_WIDTH),
            conv.participant_count(),
            conv.message_count(show_system),
            last
        )?;
    }
    Ok(())
}

/// `=== name ===` followed by the page position line.
pub fn write_page_header(
    out: &mut impl Write,
    conversation: &Conversation,
    page: &Page<'_>,
    theme: &Theme,
) -> io::Result<()> {
    let title = format!("=== {} ===", conversation.display_name());
    writeln!(out, "{}", theme.title.apply(&title))?;
    let position = if page.total_messages == 0 {
        format!("Page {}/{} (no messages)", page.number, page.total_pages)
    } else {
        format!(
            "Page {}/{} (Messages {}-{} of {})",
            page.number,
            page.total_pages,
            page.offset + 1,
            page.offset + page.messages.len(),
            page.total_messages
        )
    };
    writeln!(out, "{}", theme.page_info.apply(&position))?;
    writeln!(out)
}

fn format_timestamp(message: &Message, date_format: &str) -> String {
    match message.timestamp() {
        Some(ts) => ts.format(date_format).to_string(),
        None => message.timestamp.clone(),
    }
}

/// One message: sender line, text, then attachment and preview notes.
pub fn write_message(
    out: &mut impl Write,
    message: &Message,
    date_format: &str,
    theme: &Theme,
) -> io::Result<()> {
    write!(
        out,
        "{} at {}",
        theme.sender.apply(message.sender_name()),
        theme.timestamp.apply(format_timestamp(message, date_format))
    )?;
    if !matches!(message.message_type.as_str(), "Text" | "RichText" | "") {
        write!(
            out,
            " {}",
            theme
                .message_type
                .apply(format!("[{}]", message.message_type))
        )?;
    }
    writeln!(out)?;

    let text = message.display_text();
    if !text.is_empty() {
        writeln!(out, "{text}")?;
    }
    let attachments = message.attachment_count();
    if attachments > 0 {
        writeln!(
            out,
            "{}",
            theme
                .attachment
                .apply(format!("[{attachments} attachment(s)]"))
        )?;
    }
    if message.has_url_preview() {
        writeln!(out, "{}", theme.url.apply("[URL preview]"))?;
    }
    writeln!(out)
}

/// Header, messages and the navigation hint for one page.
pub fn write_page(
    out: &mut impl Write,
    conversation: &Conversation,
    page: &Page<'_>,
    date_format: &str,
    theme: &Theme,
) -> io::Result<()> {
    write_page_header(out, conversation, page, theme)?;
    for message in &page.messages {
        write_message(out, message, date_format, theme)?;
    }
    Ok(())
}

/// Prompt text listing the navigation commands valid on this page.
pub fn navigation_hint(page: &Page<'_>) -> String {
    let mut parts = Vec::new();
    if page.has_next() {
        parts.push("[n]ext");
    }
    if page.has_prev() {
        parts.push("[p]rev");
    }
    parts.push("page number");
    parts.push("[q]uit");
    format!("{}: ", parts.join(", "))
}

/// Numbered search results with the highlighted match context.
pub fn write_search_results(
    out: &mut impl Write,
    results: &[SearchResult],
    date_format: &str,
    theme: &Theme,
) -> io::Result<()> {
    if results.is_empty() {
        return writeln!(out, "No results found.");
    }

    let title = format!("=== Search Results ({}) ===", results.len());
    writeln!(out, "{}", theme.title.apply(&title))?;
    writeln!(out)?;

    for (i, result) in results.iter().enumerate() {
        writeln!(
            out,
            "{} In: {}",
            theme.result_number.apply(format!("[{}]", i + 1)),
            theme.conversation.apply(&result.conversation_name)
        )?;
        writeln!(
            out,
            "{} at {} ({} match)",
            theme.sender.apply(result.message.sender_name()),
            theme
                .timestamp
                .apply(format_timestamp(&result.message, date_format)),
            result.kind.as_str()
        )?;
        if let Some(snippet) = &result.snippet {
            writeln!(
                out,
                "{} {}{}{}",
                theme.match_label.apply("Match:"),
                snippet.before(),
                theme.search_highlight.apply(snippet.matched()),
                snippet.after()
            )?;
        } else {
            let text = result.message.display_text();
            if !text.is_empty() {
                writeln!(out, "{}", truncate_str(&text, 100))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
