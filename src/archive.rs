//! Top-level archive parsing: format sniffing and the combined result type.

use serde::Serialize;

use crate::error::SiftError;
use crate::model::{
    CalendarEvent, Contact, DetectedAccount, DetectedNewsletter, DetectedPurchase,
    DetectedSubscription, EmailRecord, ParseStats,
};
use crate::options::{ParseOptions, ProgressFn};
use crate::parser::olm::ByteSourceRef;
use crate::parser::{MboxParser, OlmParser};
use crate::source::ByteSource;

/// ZIP local-file-header magic; an archive starting with it is treated as OLM.
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Everything extracted from one archive pass.
///
/// On a fatal error mid-stream, the vectors hold whatever was successfully
/// extracted up to that point and `error` carries the failure — the caller
/// chooses which to surface.
#[derive(Debug, Default, Serialize)]
pub struct ParseResult {
    pub emails: Vec<EmailRecord>,
    pub contacts: Vec<Contact>,
    pub calendar_events: Vec<CalendarEvent>,
    pub accounts: Vec<DetectedAccount>,
    pub purchases: Vec<DetectedPurchase>,
    pub subscriptions: Vec<DetectedSubscription>,
    pub newsletters: Vec<DetectedNewsletter>,
    pub stats: ParseStats,
    #[serde(skip)]
    pub error: Option<SiftError>,
}

impl ParseResult {
    /// True when the parse ran to completion.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Detected archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Mbox,
    Olm,
}

/// Sniff the archive format from its leading bytes.
pub fn sniff_format(source: &ByteSource) -> ArchiveFormat {
    match source.peek(4) {
        Ok(head) if head.as_slice() == ZIP_MAGIC => ArchiveFormat::Olm,
        _ => ArchiveFormat::Mbox,
    }
}

/// Parse an archive of either supported format.
///
/// ZIP-magic sources dispatch to the OLM decoder; everything else streams
/// through the MBOX parser. Detectors run according to `options`.
pub fn parse_archive(
    source: &ByteSource,
    options: &ParseOptions,
    progress: Option<ProgressFn<'_>>,
) -> ParseResult {
    match sniff_format(source) {
        ArchiveFormat::Olm => {
            OlmParser::parse_with_progress(&ByteSourceRef::from(source), options, progress)
        }
        ArchiveFormat::Mbox => MboxParser::parse_with_progress(source, options, progress),
    }
}
