//! Record assembly on top of `mail-parser`.
//!
//! Multipart traversal, transfer decoding (quoted-printable, base64), and
//! RFC 2047 header decoding are delegated to `mail_parser::MessageParser`;
//! unknown transfer encodings pass through it verbatim, so hosts may see
//! gibberish for exotic encodings but never a dropped record. What lives
//! here is this crate's own policy: the hard checks that decide whether a
//! record is emitted at all, the binary-content guard, the
//! scaffold-stripped raw fallback, and the Gmail-label / thread-id wiring.

use chrono::Utc;
use mail_parser::{HeaderValue, Message, MessageParser};
use tracing::warn;

use crate::model::email::{EmailRecord, NO_SUBJECT, SIZE_CAP};
use crate::options::ParseOptions;
use crate::parser::labels;
use crate::parser::thread::{self, ThreadHints};

/// Minimum printable characters for the raw-body fallback to be kept.
const FALLBACK_MIN_PRINTABLE: usize = 20;

/// Parse one raw message block (optionally starting with its `From `
/// separator line) into a normalized record.
///
/// Returns `None` when the message does not parse or fails a hard check
/// (empty sender, sender without `@`, binary body under a placeholder
/// subject); the caller counts the skip and the stream continues.
pub fn parse_message(raw: &str, id: usize, options: &ParseOptions) -> Option<EmailRecord> {
    let message = skip_from_line(raw);

    let parser = MessageParser::default();
    let Some(msg) = parser.parse(message.as_bytes()) else {
        warn!(id, "message did not parse, skipping");
        return None;
    };

    // Sender: either empty (record rejected) or exactly one '@'.
    let (sender_name, sender) = sender_of(&msg);

    let subject = msg
        .subject()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| NO_SUBJECT.to_string());

    if sender.is_empty() && subject == NO_SUBJECT {
        warn!(id, "dropping record with no sender and no subject");
        return None;
    }
    if sender.is_empty() || sender.matches('@').count() != 1 {
        warn!(id, sender = %sender, "dropping record with malformed sender");
        return None;
    }

    let mut recipients = Vec::new();
    push_addresses(msg.to(), &mut recipients);
    push_addresses(msg.cc(), &mut recipients);

    let date = msg
        .date()
        .and_then(|d| chrono::DateTime::from_timestamp(d.to_timestamp(), 0))
        .unwrap_or_else(Utc::now);

    let mut body = msg.body_text(0).map(|s| s.into_owned()).unwrap_or_default();
    let html_body = msg.body_html(0).map(|s| s.into_owned());

    // Derive plain text from HTML when no text/plain part existed.
    if body.trim().is_empty() {
        if let Some(html) = &html_body {
            body = html_to_text(html);
        }
    }

    // Last resort: raw body with MIME scaffold lines stripped.
    if body.trim().is_empty() && html_body.is_none() {
        let fallback = strip_mime_scaffold(raw_body(message));
        if count_printable(&fallback) >= FALLBACK_MIN_PRINTABLE {
            body = fallback;
        }
    }

    // Binary-content guard: attachments leaking into the text stream.
    if looks_binary(&body, options.binary_guard_threshold) {
        if subject == NO_SUBJECT {
            warn!(id, "dropping record with binary body and no subject");
            return None;
        }
        body = String::new();
    }

    // A record must carry either a real subject or some body content.
    if subject == NO_SUBJECT && body.trim().is_empty() && html_body.is_none() {
        warn!(id, "dropping record with neither subject nor body");
        return None;
    }

    let gmail_labels = msg
        .header_raw("X-Gmail-Labels")
        .map(labels::parse_gmail_labels);

    let (is_read, is_starred, folder_id) = match &gmail_labels {
        Some(list) => {
            let (read, starred) = labels::flags_from_labels(list);
            (read, starred, labels::folder_id_from_labels(list))
        }
        None => (true, false, "inbox".to_string()),
    };

    let message_id = msg.message_id().map(wrap_id);

    let hints = ThreadHints {
        gmail_thread_id: msg.header_raw("X-Gm-Thrid"),
        topic: msg.header_raw("Thread-Topic"),
        first_reference: first_id(msg.references()),
        in_reply_to: first_id(msg.in_reply_to()),
    };
    let thread_id = thread::derive_thread_id(&hints, &subject);

    Some(EmailRecord {
        id,
        subject,
        sender,
        sender_name,
        recipients,
        date,
        body,
        html_body,
        size: raw.len().min(SIZE_CAP),
        is_read,
        is_starred,
        folder_id,
        labels: gmail_labels,
        thread_id,
        message_id,
        has_attachments: msg.attachment_count() > 0,
    })
}

/// Sender address and display name from a parsed message.
///
/// The address is lowercased; a missing or malformed mailbox yields an
/// empty address, which the hard checks then reject.
fn sender_of(msg: &Message<'_>) -> (Option<String>, String) {
    let Some(first) = msg.from().and_then(|a| a.first()) else {
        return (None, String::new());
    };
    let name = first
        .name()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let address = first
        .address()
        .map(|a| a.trim().to_lowercase())
        .unwrap_or_default();
    (name, address)
}

/// Append all addresses from a To/Cc list, lowercased, duplicates allowed.
fn push_addresses(list: Option<&mail_parser::Address<'_>>, out: &mut Vec<String>) {
    if let Some(address) = list {
        out.extend(
            address
                .iter()
                .filter_map(|a| a.address())
                .map(|a| a.to_lowercase()),
        );
    }
}

/// First message id from an In-Reply-To / References header value.
fn first_id<'a>(value: &'a HeaderValue<'a>) -> Option<&'a str> {
    match value {
        HeaderValue::Text(s) => Some(s.as_ref()),
        HeaderValue::TextList(list) => list.first().map(|s| s.as_ref()),
        _ => None,
    }
}

/// Re-wrap a bare message id in angle brackets (`mail-parser` strips them).
fn wrap_id(id: &str) -> String {
    format!("<{}>", id.trim().trim_matches(['<', '>']))
}

/// Everything after the first blank line of a raw message.
fn raw_body(text: &str) -> &str {
    let lf = text.find("\n\n").map(|p| p + 2);
    let crlf = text.find("\r\n\r\n").map(|p| p + 4);
    match (lf, crlf) {
        (Some(a), Some(b)) => &text[a.min(b)..],
        (Some(a), None) => &text[a..],
        (None, Some(b)) => &text[b..],
        (None, None) => "",
    }
}

/// Remove MIME scaffold lines (boundaries and part headers) from a raw body.
fn strip_mime_scaffold(body: &str) -> String {
    body.lines()
        .filter(|line| {
            let t = line.trim();
            !(t.starts_with("--")
                || t.to_lowercase().starts_with("content-")
                || t.to_lowercase().starts_with("mime-version"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn count_printable(s: &str) -> usize {
    s.chars().filter(|c| !c.is_whitespace()).count()
}

/// Heuristic check for attachment bytes that leaked into a text stream.
///
/// Signals: JFIF/Exif tokens in the first 100 bytes, base64 image prefixes
/// (`/9j/` for JPEG, `iVBOR` for PNG), `GIF8` magic, or more than
/// `threshold` non-printable ASCII (excluding CR/LF/TAB) in the first 200
/// bytes.
pub fn looks_binary(body: &str, threshold: f32) -> bool {
    let trimmed = body.trim_start();
    if trimmed.is_empty() {
        return false;
    }

    let head100: String = trimmed.chars().take(100).collect();
    if head100.contains("JFIF") || head100.contains("Exif") {
        return true;
    }
    if trimmed.starts_with("/9j/") || trimmed.starts_with("iVBOR") || trimmed.starts_with("GIF8") {
        return true;
    }

    let head200: Vec<u8> = trimmed.bytes().take(200).collect();
    if head200.is_empty() {
        return false;
    }
    let non_printable = head200
        .iter()
        .filter(|&&b| !(0x20..0x7F).contains(&b) && b != b'\r' && b != b'\n' && b != b'\t')
        .count();
    (non_printable as f32 / head200.len() as f32) > threshold
}

/// Skip the `From ` separator line at the start of MBOX message blocks.
///
/// Only a valid separator (day-of-week token present) is dropped; a bare
/// `From ` line is message content and stays put.
fn skip_from_line(data: &str) -> &str {
    let data = data.strip_prefix('\u{FEFF}').unwrap_or(data);
    if let Some(pos) = data.find('\n') {
        if crate::parser::mbox::is_separator_line(&data[..pos + 1]) {
            return &data[pos + 1..];
        }
    }
    data
}

/// Convert HTML to plain text: block tags become newlines, scripts and
/// styles are removed, remaining tags stripped, common entities decoded.
pub fn html_to_text(html: &str) -> String {
    let mut text = remove_tag_block(html, "script");
    text = remove_tag_block(&text, "style");

    for tag in &["<br>", "<br/>", "<br />", "<BR>"] {
        text = text.replace(tag, "\n");
    }
    for tag in &["p", "div", "tr", "li", "h1", "h2", "h3", "h4", "h5", "h6"] {
        text = text.replace(&format!("<{tag}>"), "\n");
        text = text.replace(&format!("<{tag} "), "\n<");
        text = text.replace(&format!("</{tag}>"), "\n");
    }

    // Strip all remaining tags
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result = result.replace("&amp;", "&");
    result = result.replace("&lt;", "<");
    result = result.replace("&gt;", ">");
    result = result.replace("&quot;", "\"");
    result = result.replace("&#39;", "'");
    result = result.replace("&apos;", "'");
    result = result.replace("&nbsp;", " ");
    result = result.replace("&#160;", " ");

    // Collapse runs of blank lines
    let mut cleaned = String::with_capacity(result.len());
    let mut prev_was_blank = false;
    for line in result.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !prev_was_blank {
                cleaned.push('\n');
                prev_was_blank = true;
            }
        } else {
            cleaned.push_str(trimmed);
            cleaned.push('\n');
            prev_was_blank = false;
        }
    }

    cleaned.trim().to_string()
}

/// Remove an entire tag block (e.g. `<script>…</script>`).
fn remove_tag_block(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut remaining = html;
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    while let Some(start) = remaining.to_lowercase().find(&open) {
        result.push_str(&remaining[..start]);
        let after = &remaining[start..];
        if let Some(end) = after.to_lowercase().find(&close) {
            remaining = &after[end + close.len()..];
        } else {
            remaining = "";
            break;
        }
    }
    result.push_str(remaining);
    result
}
