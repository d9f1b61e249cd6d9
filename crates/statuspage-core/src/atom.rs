//! Atom 1.0 rendering of a [`Feed`].

use crate::feed::{Feed, FeedEntry};
use crate::timestamp::complete_rfc3339;
use std::fmt::Write;

/// Render `feed` as an Atom document.
///
/// Entry `updated` values are completed to RFC 3339; entries without one
/// fall back to the feed's generation time, since Atom requires the element.
pub fn render_atom(feed: &Feed) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
    let _ = writeln!(out, "  <title>{}</title>", escape(&feed.title));
    let _ = writeln!(
        out,
        "  <link href=\"{}\" rel=\"self\"/>",
        escape(&feed.url)
    );
    let _ = writeln!(out, "  <id>{}</id>", escape(&feed.id));
    let _ = writeln!(out, "  <updated>{}</updated>", escape(&feed.updated));
    for entry in &feed.entries {
        render_entry(&mut out, entry, &feed.updated);
    }
    out.push_str("</feed>\n");
    out
}

fn render_entry(out: &mut String, entry: &FeedEntry, fallback_updated: &str) {
    let event = &entry.event;
    out.push_str("  <entry>\n");
    let _ = writeln!(out, "    <id>{}</id>", escape(&entry.feed_id));
    let _ = writeln!(
        out,
        "    <title>[{}] {}</title>",
        event.status(),
        escape(&event.title)
    );
    let _ = writeln!(
        out,
        "    <updated>{}</updated>",
        escape(
            &entry
                .updated
                .as_deref()
                .map_or_else(|| fallback_updated.to_string(), complete_rfc3339)
        )
    );
    for product in &event.products {
        let _ = writeln!(out, "    <category term=\"{}\"/>", escape(product));
    }
    let _ = writeln!(
        out,
        "    <content type=\"text\">{}</content>",
        escape(&entry_text(entry))
    );
    out.push_str("  </entry>\n");
}

fn entry_text(entry: &FeedEntry) -> String {
    let event = &entry.event;
    let mut text = event.body.trim_end().to_string();
    if let Some(start) = event.start() {
        let _ = write!(text, "\n\nStart: {start}");
    }
    if let Some(closed) = event.closed() {
        let _ = write!(text, "\nClosed: {closed}");
    }
    for update in &event.updates {
        let _ = write!(
            text,
            "\n\n{} {}\n{}",
            update.time,
            update.title,
            update.body.trim_end()
        );
    }
    text.trim_start().to_string()
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
