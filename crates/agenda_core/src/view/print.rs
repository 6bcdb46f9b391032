//! Plain-text print layout.

use super::render::AgendaView;
use std::fmt::Write;

const ITEM_INDENT: &str = "      ";
const UNTITLED: &str = "(untitled)";

/// Renders a view as a printable plain-text document.
///
/// Only titles, comments and completion states are emitted; controls are
/// ignored regardless of the view's mode.
pub fn render_plain_text(view: &AgendaView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.header.title.value);
    let _ = writeln!(out, "Date: {}", view.header.date.value);

    for (position, card) in view.topics.iter().enumerate() {
        out.push('\n');
        let _ = writeln!(
            out,
            "{} {}. {}",
            checkbox(card.completed),
            position + 1,
            display_title(card.title.value.as_str())
        );

        if !card.comment.value.trim().is_empty() {
            for line in card.comment.value.lines() {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, "{ITEM_INDENT}{line}");
                }
            }
        }

        for row in &card.subtopics {
            let _ = writeln!(
                out,
                "{ITEM_INDENT}{} {}",
                checkbox(row.completed),
                display_title(row.title.value.as_str())
            );
        }
    }

    out
}

fn checkbox(completed: bool) -> &'static str {
    if completed {
        "[x]"
    } else {
        "[ ]"
    }
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        UNTITLED
    } else {
        title
    }
}
