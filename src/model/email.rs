//! The normalized email record and per-parse statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder subject for messages without one.
pub const NO_SUBJECT: &str = "(No Subject)";

/// The reported `size` field is capped here; the cap is an observability
/// figure, never a truncation of content.
pub const SIZE_CAP: usize = 100_000;

/// A single normalized email, produced by the MBOX and OLM parsers alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Emission sequence number within the archive (0, 1, 2, …).
    /// Detection records reference emails only by this id.
    pub id: usize,

    /// Decoded subject; `(No Subject)` when the header is missing or empty.
    pub subject: String,

    /// Sender address, lowercased, angle brackets stripped.
    /// Always contains exactly one `@` — records that fail this are never emitted.
    pub sender: String,

    /// RFC 2047-decoded display name, when one was present.
    pub sender_name: Option<String>,

    /// Ordered recipient addresses (`To:` then `Cc:`); duplicates allowed.
    pub recipients: Vec<String>,

    /// Parsed date; falls back to the moment of parsing when the header is
    /// missing or malformed.
    pub date: DateTime<Utc>,

    /// Decoded plain-text body (possibly derived from stripped HTML).
    pub body: String,

    /// Decoded HTML body, when a `text/html` part was present.
    pub html_body: Option<String>,

    /// Raw message byte length, capped at [`SIZE_CAP`].
    pub size: usize,

    /// From Gmail labels (`unread` absent) or OLM read flags.
    pub is_read: bool,

    /// From the Gmail `starred` label or the OLM flagged property.
    pub is_starred: bool,

    /// Canonical folder name (see the Gmail label mapping table).
    pub folder_id: String,

    /// Normalized (lowercased) Gmail labels, when the header was present.
    pub labels: Option<Vec<String>>,

    /// Stable conversation identifier; provider-supplied when possible,
    /// otherwise synthesized from the normalized subject.
    pub thread_id: Option<String>,

    /// RFC 822 `Message-ID`, angle brackets included.
    pub message_id: Option<String>,

    /// True when any MIME part carries `Content-Disposition: attachment`.
    pub has_attachments: bool,
}

impl EmailRecord {
    /// Domain portion of the sender address (empty when malformed).
    pub fn sender_domain(&self) -> &str {
        self.sender.rsplit_once('@').map(|(_, d)| d).unwrap_or("")
    }
}

/// Counters accumulated over a single archive pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseStats {
    /// Number of emitted records. May be lower than the number of `From `
    /// separators due to dropped records.
    pub email_count: usize,
    /// Records dropped by hard checks or per-record parse failures.
    pub skipped_count: usize,
    /// Total source bytes consumed.
    pub bytes_processed: u64,
    /// Contacts derived from senders and address books.
    pub contact_count: usize,
}
