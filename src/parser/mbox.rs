//! Streaming MBOX parser.
//!
//! Splits a chunked byte stream into individual message blocks on `From `
//! separator lines, then hands each block to the MIME walker. Never loads
//! the entire archive into memory and is tolerant of malformed input.

use std::path::Path;

use tracing::warn;

use crate::archive::ParseResult;
use crate::error::{Result, SiftError};
use crate::model::{Contact, EmailRecord};
use crate::options::{ParseOptions, ProgressFn, ProgressGate, ProgressStage, ProgressUpdate, YIELD_EVERY};
use crate::parser::{labels, mime};
use crate::source::ByteSource;

/// Day-of-week tokens that must appear somewhere in a valid separator line.
const DAY_TOKENS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Streaming MBOX parser.
///
/// The separator check is two-stage: a line must start with `From ` AND
/// contain a day-of-week token. The prefix alone produces false positives
/// in message bodies quoting other emails.
pub struct MboxParser;

impl MboxParser {
    /// Parse a full MBOX archive into a [`ParseResult`].
    ///
    /// Emails are emitted in source order. Contacts are derived from
    /// senders when `options.extract_contacts` is set. Detectors run when
    /// their flags are set. A fatal error mid-stream leaves everything
    /// extracted so far in the result, alongside the error.
    pub fn parse(source: &ByteSource, options: &ParseOptions) -> ParseResult {
        Self::parse_with_progress(source, options, None)
    }

    /// [`MboxParser::parse`] with a host progress callback.
    pub fn parse_with_progress(
        source: &ByteSource,
        options: &ParseOptions,
        progress: Option<ProgressFn<'_>>,
    ) -> ParseResult {
        let mut result = ParseResult::default();

        let outcome = parse_records(source, options, progress, &mut |record| {
            result.stats.email_count += 1;
            result.emails.push(record);
            Ok(true)
        });

        match outcome {
            Ok(stats) => {
                result.stats.skipped_count = stats.skipped;
                result.stats.bytes_processed = stats.bytes;
            }
            Err(e) => {
                result.error = Some(e);
                return result;
            }
        }

        if options.extract_contacts {
            result.contacts = contacts_from_emails(&result.emails);
            result.stats.contact_count = result.contacts.len();
            if let Some(cb) = progress {
                cb(ProgressUpdate::new(
                    ProgressStage::ParsingContacts,
                    100,
                    format!("{} contacts", result.contacts.len()),
                ));
            }
        }

        crate::detect::apply_detectors(&mut result, options, progress);
        result
    }

    /// Parse while delivering records in batches as they are produced.
    ///
    /// `on_batch` receives slices of at most [`YIELD_EVERY`] records; the
    /// concatenation of all batches equals `parse(source).emails` (same
    /// records, same order). Returns the total record count.
    pub fn parse_streaming(
        source: &ByteSource,
        options: &ParseOptions,
        on_progress: Option<ProgressFn<'_>>,
        on_batch: &mut dyn FnMut(&[EmailRecord]),
    ) -> Result<usize> {
        let mut batch: Vec<EmailRecord> = Vec::with_capacity(YIELD_EVERY);
        let mut total = 0usize;

        parse_records(source, options, on_progress, &mut |record| {
            batch.push(record);
            total += 1;
            if batch.len() >= YIELD_EVERY {
                on_batch(&batch);
                batch.clear();
            }
            Ok(true)
        })?;

        if !batch.is_empty() {
            on_batch(&batch);
        }
        Ok(total)
    }

    /// Cheap sniff: does this file start with a valid MBOX separator line?
    pub fn is_mbox(path: impl AsRef<Path>) -> bool {
        let Ok(source) = ByteSource::open(path) else {
            return false;
        };
        let Ok(head) = source.peek(512) else {
            return false;
        };
        let text = String::from_utf8_lossy(&head);
        let first_line = text.lines().next().unwrap_or("");
        is_separator_line(first_line)
    }

    /// Parse an `X-Gmail-Labels` header value into normalized labels.
    pub fn parse_gmail_labels(header: &str) -> Vec<String> {
        labels::parse_gmail_labels(header)
    }

    /// Map an `X-Gmail-Labels` header value to folder ids, one per
    /// non-system label, deduplicated in order.
    ///
    /// Idempotent: feeding the output back in yields the same ids.
    pub fn folder_ids_from_labels(header: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for label in labels::parse_gmail_labels(header) {
            if labels::is_system_label(&label) {
                continue;
            }
            let id = labels::folder_id_from_labels(std::slice::from_ref(&label));
            if !id.is_empty() && !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

/// True when `line` is an MBOX message separator.
pub fn is_separator_line(line: &str) -> bool {
    let line = line.strip_prefix('\u{FEFF}').unwrap_or(line);
    line.starts_with("From ") && DAY_TOKENS.iter().any(|d| line.contains(d))
}

pub(crate) struct SplitStats {
    pub skipped: usize,
    pub bytes: u64,
}

/// Drive the chunk → split → MIME pipeline, invoking `sink` per record.
///
/// The sink returns `Ok(false)` to stop early. Cancellation and source
/// errors abort with the corresponding [`SiftError`].
pub(crate) fn parse_records(
    source: &ByteSource,
    options: &ParseOptions,
    progress: Option<ProgressFn<'_>>,
    sink: &mut dyn FnMut(EmailRecord) -> Result<bool>,
) -> Result<SplitStats> {
    let total_len = source.len()?;
    let mut reader = source.chunks(options.chunk_size)?;
    let mut gate = ProgressGate::default();

    let mut leftover = String::new();
    let mut pending_cr = false;
    let mut bytes: u64 = 0;
    let mut next_id = 0usize;
    let mut skipped = 0usize;
    let mut emitted_since_yield = 0usize;

    let mut deliver = |block: &str,
                       next_id: &mut usize,
                       skipped: &mut usize,
                       emitted_since_yield: &mut usize,
                       bytes: u64|
     -> Result<bool> {
        if options.cancelled() {
            return Err(SiftError::Cancelled);
        }
        if block.trim().is_empty() {
            return Ok(true);
        }
        match mime::parse_message(block, *next_id, options) {
            Some(record) => {
                *next_id += 1;
                *emitted_since_yield += 1;
                let keep_going = sink(record)?;
                // Host-yield checkpoint: report unconditionally every
                // YIELD_EVERY records so UIs can repaint.
                if *emitted_since_yield >= YIELD_EVERY {
                    *emitted_since_yield = 0;
                    if let Some(cb) = progress {
                        let pct = if total_len == 0 {
                            100
                        } else {
                            ((bytes.min(total_len) * 100) / total_len) as u8
                        };
                        cb(ProgressUpdate::new(
                            ProgressStage::ParsingEmails,
                            pct,
                            format!("{} emails parsed", *next_id),
                        ));
                    }
                }
                Ok(keep_going)
            }
            None => {
                *skipped += 1;
                Ok(true)
            }
        }
    };

    loop {
        if options.cancelled() {
            return Err(SiftError::Cancelled);
        }

        let Some(chunk) = reader.next_chunk()? else {
            break;
        };
        bytes += chunk.len() as u64;
        leftover.push_str(&normalize_newlines(&chunk, &mut pending_cr));

        // Reverse-scan for the last separator; everything before it is
        // flushable, everything from it onward becomes the new leftover.
        if let Some(last_sep) = rfind_separator(&leftover) {
            let flushable = leftover[..last_sep].to_string();
            leftover.drain(..last_sep);
            for block in split_blocks(&flushable) {
                if !deliver(block, &mut next_id, &mut skipped, &mut emitted_since_yield, bytes)? {
                    return Ok(SplitStats { skipped, bytes });
                }
            }
        }

        // Pathological single message: cap and emit early.
        if leftover.len() > options.max_message_size {
            warn!(
                size = leftover.len(),
                max = options.max_message_size,
                "message exceeds maximum size, emitting early"
            );
            let oversized = std::mem::take(&mut leftover);
            if !deliver(&oversized, &mut next_id, &mut skipped, &mut emitted_since_yield, bytes)? {
                return Ok(SplitStats { skipped, bytes });
            }
        }

        report_progress(progress, &mut gate, bytes, total_len, next_id);
    }

    if pending_cr {
        leftover.push('\n');
    }

    // Final chunk: everything flushes.
    for block in split_blocks(&leftover) {
        if !deliver(block, &mut next_id, &mut skipped, &mut emitted_since_yield, bytes)? {
            return Ok(SplitStats { skipped, bytes });
        }
    }

    if let Some(cb) = progress {
        cb(ProgressUpdate::new(
            ProgressStage::ParsingEmails,
            100,
            format!("{next_id} emails parsed"),
        ));
    }

    Ok(SplitStats { skipped, bytes })
}

fn report_progress(
    progress: Option<ProgressFn<'_>>,
    gate: &mut ProgressGate,
    bytes: u64,
    total: u64,
    count: usize,
) {
    let Some(cb) = progress else { return };
    let pct = if total == 0 {
        100
    } else {
        ((bytes.min(total) * 100) / total) as u8
    };
    if gate.should_report(pct) {
        cb(ProgressUpdate::new(
            ProgressStage::ParsingEmails,
            pct,
            format!("{count} emails parsed"),
        ));
    }
}

/// Split normalized text into message blocks at separator lines.
///
/// Bytes before the first separator form a preamble block: it flows through
/// the MIME walker like any other block, where the hard checks decide its
/// fate. Every input byte lands in exactly one block.
fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut block_start = 0usize;
    let mut offset = 0usize;
    let mut line_start = true;

    for line in text.split_inclusive('\n') {
        if line_start && offset > 0 && is_separator_line(line) {
            blocks.push(&text[block_start..offset]);
            block_start = offset;
        }
        line_start = line.ends_with('\n');
        offset += line.len();
    }

    if block_start < text.len() {
        blocks.push(&text[block_start..]);
    }
    blocks
}

/// Byte offset of the last separator line in `text`, if any.
fn rfind_separator(text: &str) -> Option<usize> {
    let mut candidate = None;
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        if is_separator_line(line) {
            candidate = Some(offset);
        }
        offset += line.len();
    }
    candidate
}

/// Normalize `\r\n` and bare `\r` line endings to `\n`.
///
/// A `\r` at the very end of a chunk is deferred via `pending_cr` until the
/// next chunk reveals whether a `\n` follows.
fn normalize_newlines(chunk: &str, pending_cr: &mut bool) -> String {
    let mut out = String::with_capacity(chunk.len());
    let mut chars = chunk.chars().peekable();

    if *pending_cr {
        out.push('\n');
        if chars.peek() == Some(&'\n') {
            chars.next();
        }
        *pending_cr = false;
    }

    while let Some(c) = chars.next() {
        if c == '\r' {
            match chars.peek() {
                Some('\n') => {
                    chars.next();
                    out.push('\n');
                }
                Some(_) => out.push('\n'),
                None => *pending_cr = true,
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Derive contacts from emitted records, keyed by lowercase sender.
pub(crate) fn contacts_from_emails(emails: &[EmailRecord]) -> Vec<Contact> {
    let mut map: std::collections::HashMap<String, Contact> = std::collections::HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for email in emails {
        if email.sender.is_empty() {
            continue;
        }
        match map.get_mut(&email.sender) {
            Some(contact) => contact.record_sighting(email.sender_name.as_deref(), email.date),
            None => {
                map.insert(
                    email.sender.clone(),
                    Contact::new(email.sender.clone(), email.sender_name.clone(), email.date),
                );
                order.push(email.sender.clone());
            }
        }
    }

    order.into_iter().filter_map(|k| map.remove(&k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_requires_day_token() {
        assert!(is_separator_line(
            "From user@example.com Thu Jan 04 10:00:00 2024\n"
        ));
        assert!(!is_separator_line("From user@example.com\n"));
        assert!(!is_separator_line("from user@example.com Thu\n"));
        assert!(!is_separator_line(">From user@example.com Thu\n"));
        assert!(!is_separator_line("Subject: From here Thu\n"));
    }

    #[test]
    fn test_split_blocks_two_messages() {
        let text = "From a@b.com Thu Jan 04 10:00:00 2024\nFrom: a@b.com\n\nbody one\n\
                    From c@d.com Fri Jan 05 10:00:00 2024\nFrom: c@d.com\n\nbody two\n";
        let blocks = split_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("body one"));
        assert!(blocks[1].contains("body two"));
    }

    #[test]
    fn test_split_blocks_invalid_from_is_body() {
        // "From " without a day token is body content, not a separator.
        let text = "From a@b.com Thu Jan 04 10:00:00 2024\nFrom: a@b.com\n\n\
                    From my perspective this is body\nmore body\n";
        let blocks = split_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("From my perspective"));
    }

    #[test]
    fn test_normalize_newlines_variants() {
        let mut pending = false;
        assert_eq!(normalize_newlines("a\r\nb\rc\nd", &mut pending), "a\nb\nc\nd");
        assert!(!pending);
    }

    #[test]
    fn test_normalize_newlines_straddling_crlf() {
        let mut pending = false;
        let first = normalize_newlines("line\r", &mut pending);
        assert_eq!(first, "line");
        assert!(pending);
        let second = normalize_newlines("\nnext", &mut pending);
        assert_eq!(second, "\nnext");
        assert!(!pending);
    }

    #[test]
    fn test_rfind_separator_picks_last() {
        let text = "From a@b.com Thu Jan 04 10:00:00 2024\nbody\n\
                    From c@d.com Fri Jan 05 10:00:00 2024\nbody\n";
        let pos = rfind_separator(text).unwrap();
        assert!(text[pos..].starts_with("From c@d.com"));
    }

    #[test]
    fn test_folder_ids_from_labels_idempotent() {
        let ids = MboxParser::folder_ids_from_labels("Inbox,My Project,Unread");
        assert_eq!(ids, vec!["inbox", "my-project"]);
        let again = MboxParser::folder_ids_from_labels(&ids.join(","));
        assert_eq!(again, ids);
    }

    #[test]
    fn test_parse_buffer_two_messages() {
        let mbox = "From a@b.com Thu Jan 04 10:00:00 2024\n\
                    From: Alice <a@b.com>\nSubject: One\nDate: Thu, 04 Jan 2024 10:00:00 +0000\n\n\
                    first body\n\n\
                    From c@d.com Fri Jan 05 10:00:00 2024\n\
                    From: Carol <c@d.com>\nSubject: Two\nDate: Fri, 05 Jan 2024 10:00:00 +0000\n\n\
                    second body\n";
        let source = ByteSource::Buffer(mbox.as_bytes().to_vec());
        let result = MboxParser::parse(&source, &ParseOptions::default());
        assert!(result.error.is_none());
        assert_eq!(result.emails.len(), 2);
        assert_eq!(result.emails[0].subject, "One");
        assert_eq!(result.emails[1].subject, "Two");
        assert_eq!(result.stats.email_count, 2);
        assert_eq!(result.contacts.len(), 2);
    }

    #[test]
    fn test_chunking_invariance() {
        let mbox = "From a@b.com Thu Jan 04 10:00:00 2024\n\
                    From: Alice <a@b.com>\nSubject: One\n\nfirst body\n\
                    From c@d.com Fri Jan 05 10:00:00 2024\n\
                    From: Carol <c@d.com>\nSubject: Two\n\nsecond body\n";
        let baseline = MboxParser::parse(
            &ByteSource::Buffer(mbox.as_bytes().to_vec()),
            &ParseOptions::default(),
        );
        for chunk_size in [1, 3, 7, 64, 4096] {
            let opts = ParseOptions {
                chunk_size: Some(chunk_size),
                ..Default::default()
            };
            let result =
                MboxParser::parse(&ByteSource::Buffer(mbox.as_bytes().to_vec()), &opts);
            assert_eq!(
                result.emails.len(),
                baseline.emails.len(),
                "chunk size {chunk_size}"
            );
            for (a, b) in result.emails.iter().zip(baseline.emails.iter()) {
                assert_eq!(a.subject, b.subject);
                assert_eq!(a.body, b.body);
            }
        }
    }

    #[test]
    fn test_cancellation_reports_cancelled() {
        let token = crate::options::CancelToken::new();
        token.cancel();
        let opts = ParseOptions {
            cancel: Some(token),
            ..Default::default()
        };
        let source = ByteSource::Buffer(b"From a@b.com Thu Jan 04 2024\n\nx\n".to_vec());
        let result = MboxParser::parse(&source, &opts);
        assert!(matches!(result.error, Some(SiftError::Cancelled)));
    }

    #[test]
    fn test_streaming_matches_parse() {
        let mut mbox = String::new();
        for i in 0..250 {
            mbox.push_str(&format!(
                "From u{i}@x.com Thu Jan 04 10:00:00 2024\n\
                 From: u{i}@x.com\nSubject: msg {i}\n\nbody {i}\n"
            ));
        }
        let opts = ParseOptions::default();
        let full = MboxParser::parse(&ByteSource::Buffer(mbox.as_bytes().to_vec()), &opts);

        let mut streamed: Vec<EmailRecord> = Vec::new();
        let mut batches = 0usize;
        let total = MboxParser::parse_streaming(
            &ByteSource::Buffer(mbox.as_bytes().to_vec()),
            &opts,
            None,
            &mut |batch| {
                batches += 1;
                streamed.extend_from_slice(batch);
            },
        )
        .unwrap();

        assert_eq!(total, full.emails.len());
        assert!(batches >= 3, "250 records should arrive in multiple batches");
        for (a, b) in streamed.iter().zip(full.emails.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.subject, b.subject);
        }
    }
}
