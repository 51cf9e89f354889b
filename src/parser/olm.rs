//! OLM (Outlook for Mac) archive decoder.
//!
//! An OLM file is a ZIP container holding one XML document per message
//! under `com.microsoft.__Messages/`, plus address book and calendar XML.
//! Element names use the OPF-prefixed vocabulary (`OPFMessageCopySubject`,
//! `OPFContactCopyDisplayName`, …). Malformed XML entries are skipped
//! individually; ZIP-level corruption is fatal.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;
use zip::ZipArchive;

use crate::archive::ParseResult;
use crate::error::SiftError;
use crate::model::email::{EmailRecord, NO_SUBJECT, SIZE_CAP};
use crate::model::{CalendarEvent, Contact};
use crate::options::{ParseOptions, ProgressFn, ProgressStage, ProgressUpdate};
use crate::parser::thread::ThreadHints;
use crate::parser::{date, mbox, thread};

/// Decoder for OLM containers.
pub struct OlmParser;

impl OlmParser {
    /// Cheap sniff: a ZIP whose entries include the OLM message directory.
    pub fn is_olm(path: impl AsRef<Path>) -> bool {
        let Ok(file) = std::fs::File::open(path.as_ref()) else {
            return false;
        };
        let Ok(archive) = ZipArchive::new(file) else {
            return false;
        };
        let found = archive
            .file_names()
            .any(|name| name.contains("com.microsoft.__Messages"));
        found
    }

    /// Parse a full OLM archive into a [`ParseResult`].
    ///
    /// Messages are emitted in ascending numeric order of their
    /// `message_<n>.xml` entry names. Records share all invariants with the
    /// MBOX path; `folder_id` defaults to `inbox` (OLM has no Gmail-label
    /// analog). A contact is derived from every unique sender even when an
    /// explicit Contacts.xml entry exists.
    pub fn parse(source: &ByteSourceRef<'_>, options: &ParseOptions) -> ParseResult {
        Self::parse_with_progress(source, options, None)
    }

    /// [`OlmParser::parse`] with a host progress callback.
    pub fn parse_with_progress(
        source: &ByteSourceRef<'_>,
        options: &ParseOptions,
        progress: Option<ProgressFn<'_>>,
    ) -> ParseResult {
        let mut result = ParseResult::default();
        match source {
            ByteSourceRef::Path(path) => {
                let file = match std::fs::File::open(path) {
                    Ok(f) => f,
                    Err(e) => {
                        result.error = Some(SiftError::io(*path, e));
                        return result;
                    }
                };
                parse_zip(file, path, options, progress, &mut result);
            }
            ByteSourceRef::Buffer(buf) => {
                let cursor = Cursor::new(*buf);
                parse_zip(cursor, Path::new("<buffer>"), options, progress, &mut result);
            }
        }

        if result.error.is_none() {
            crate::detect::apply_detectors(&mut result, options, progress);
        }
        result
    }
}

/// Borrowed view of a byte source, so OLM parsing can reuse an already-read
/// buffer without cloning it.
pub enum ByteSourceRef<'a> {
    Path(&'a Path),
    Buffer(&'a [u8]),
}

impl<'a> From<&'a crate::source::ByteSource> for ByteSourceRef<'a> {
    fn from(source: &'a crate::source::ByteSource) -> Self {
        match source {
            crate::source::ByteSource::Path(p) => Self::Path(p),
            crate::source::ByteSource::Buffer(b) => Self::Buffer(b),
        }
    }
}

fn parse_zip<R: Read + Seek>(
    reader: R,
    path: &Path,
    options: &ParseOptions,
    progress: Option<ProgressFn<'_>>,
    result: &mut ParseResult,
) {
    let mut archive = match ZipArchive::new(reader) {
        Ok(a) => a,
        Err(e) => {
            result.error = Some(SiftError::MalformedArchive {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            return;
        }
    };

    if let Some(cb) = progress {
        cb(ProgressUpdate::new(
            ProgressStage::Extracting,
            0,
            format!("{} entries", archive.len()),
        ));
    }

    // Classify entries up front so messages can be ordered numerically.
    let mut messages: Vec<(u64, usize)> = Vec::new();
    let mut contact_entries: Vec<usize> = Vec::new();
    let mut calendar_entries: Vec<usize> = Vec::new();

    for i in 0..archive.len() {
        let name = match archive.by_index(i) {
            Ok(entry) => {
                if entry.is_dir() {
                    continue;
                }
                entry.name().to_string()
            }
            Err(e) => {
                warn!(index = i, error = %e, "unreadable zip entry, skipping");
                continue;
            }
        };

        if let Some(n) = message_number(&name) {
            messages.push((n, i));
        } else if is_contacts_entry(&name) {
            contact_entries.push(i);
        } else if is_calendar_entry(&name) {
            calendar_entries.push(i);
        }
    }
    messages.sort_by_key(|(n, _)| *n);

    if let Some(cb) = progress {
        cb(ProgressUpdate::new(
            ProgressStage::Extracting,
            100,
            format!("{} messages found", messages.len()),
        ));
    }

    // Messages, in ascending numeric order.
    let total = messages.len().max(1);
    for (done, (_, index)) in messages.iter().enumerate() {
        if options.cancelled() {
            result.error = Some(SiftError::Cancelled);
            return;
        }
        let Some(xml) = read_entry(&mut archive, *index) else {
            result.stats.skipped_count += 1;
            continue;
        };
        result.stats.bytes_processed += xml.len() as u64;
        match parse_message_xml(&xml, result.emails.len(), options) {
            Some(record) => {
                result.stats.email_count += 1;
                result.emails.push(record);
            }
            None => result.stats.skipped_count += 1,
        }
        if let Some(cb) = progress {
            if done % crate::options::YIELD_EVERY == 0 {
                let pct = ((done + 1) * 100 / total) as u8;
                cb(ProgressUpdate::new(
                    ProgressStage::ParsingEmails,
                    pct,
                    format!("{} emails parsed", result.emails.len()),
                ));
            }
        }
    }

    // Contacts: explicit address book entries first, then derived senders.
    let mut contacts: Vec<Contact> = Vec::new();
    for index in contact_entries {
        if let Some(xml) = read_entry(&mut archive, index) {
            contacts.extend(parse_contacts_xml(&xml));
        }
    }
    merge_sender_contacts(&mut contacts, &result.emails);
    result.stats.contact_count = contacts.len();
    result.contacts = contacts;
    if let Some(cb) = progress {
        cb(ProgressUpdate::new(
            ProgressStage::ParsingContacts,
            100,
            format!("{} contacts", result.stats.contact_count),
        ));
    }

    // Calendar events.
    for index in calendar_entries {
        if let Some(xml) = read_entry(&mut archive, index) {
            result.calendar_events.extend(parse_calendar_xml(&xml));
        }
    }
    if let Some(cb) = progress {
        cb(ProgressUpdate::new(
            ProgressStage::ParsingCalendar,
            100,
            format!("{} events", result.calendar_events.len()),
        ));
    }
}

/// Extract `n` from `com.microsoft.__Messages/…/message_<n>.xml`.
fn message_number(name: &str) -> Option<u64> {
    if !name.contains("com.microsoft.__Messages/") {
        return None;
    }
    let file = name.rsplit('/').next()?;
    let digits = file.strip_prefix("message_")?.strip_suffix(".xml")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn is_contacts_entry(name: &str) -> bool {
    name == "Address Book/Contacts.xml"
        || (name.contains("/Contacts/") && name.ends_with(".xml"))
}

fn is_calendar_entry(name: &str) -> bool {
    let file = name.rsplit('/').next().unwrap_or(name);
    file.starts_with("Calendar") && file.ends_with(".xml")
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, index: usize) -> Option<String> {
    let mut entry = match archive.by_index(index) {
        Ok(e) => e,
        Err(e) => {
            warn!(index, error = %e, "failed to open zip entry");
            return None;
        }
    };
    let mut buf = Vec::with_capacity(entry.size() as usize);
    if let Err(e) = entry.read_to_end(&mut buf) {
        warn!(index, error = %e, "failed to inflate zip entry");
        return None;
    }
    Some(String::from_utf8_lossy(&buf).into_owned())
}

/// Accumulated fields of one OLM message document.
#[derive(Default)]
struct OlmMessage {
    subject: String,
    body: String,
    html_body: Option<String>,
    sent_time: Option<DateTime<Utc>>,
    message_id: Option<String>,
    thread_topic: Option<String>,
    sender_address: Option<(Option<String>, String)>,
    recipients: Vec<String>,
    was_read: bool,
    is_flagged: bool,
    has_attachment: bool,
    raw_len: usize,
}

/// Parse one `message_<n>.xml` document into a normalized record.
///
/// Returns `None` for malformed XML or records failing the hard checks.
fn parse_message_xml(xml: &str, id: usize, options: &ParseOptions) -> Option<EmailRecord> {
    let mut msg = OlmMessage {
        raw_len: xml.len(),
        ..Default::default()
    };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Which address-list element we are inside, if any.
    #[derive(PartialEq)]
    enum AddrContext {
        None,
        Sender,
        Recipient,
    }
    let mut addr_ctx = AddrContext::None;
    let mut current: Vec<u8> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = e.name().as_ref().to_vec();
                match current.as_slice() {
                    b"OPFMessageCopySenderAddress" | b"OPFMessageCopyFromAddresses" => {
                        addr_ctx = AddrContext::Sender;
                    }
                    b"OPFMessageCopyToAddresses"
                    | b"OPFMessageCopyCCAddresses"
                    | b"OPFMessageCopyBCCAddresses" => {
                        addr_ctx = AddrContext::Recipient;
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"emailAddress" => {
                let mut address = None;
                let mut name = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"OPFContactEmailAddressAddress" => {
                            address = attr.unescape_value().ok().map(|v| v.to_lowercase());
                        }
                        b"OPFContactEmailAddressName" => {
                            name = attr.unescape_value().ok().map(|v| v.into_owned());
                        }
                        _ => {}
                    }
                }
                if let Some(addr) = address {
                    match addr_ctx {
                        AddrContext::Sender => {
                            if msg.sender_address.is_none() {
                                msg.sender_address = Some((name, addr));
                            }
                        }
                        AddrContext::Recipient => msg.recipients.push(addr),
                        AddrContext::None => {}
                    }
                }
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match current.as_slice() {
                    b"OPFMessageCopyBody" => msg.body = text.to_string(),
                    b"OPFMessageCopyHTMLBody" => msg.html_body = Some(text.to_string()),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                let Ok(text) = t.unescape() else { continue };
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match current.as_slice() {
                    b"OPFMessageCopySubject" => msg.subject = text.to_string(),
                    b"OPFMessageCopyBody" => msg.body = text.to_string(),
                    b"OPFMessageCopyHTMLBody" => msg.html_body = Some(text.to_string()),
                    b"OPFMessageCopySentTime" | b"OPFMessageCopyReceivedTime" => {
                        if msg.sent_time.is_none() {
                            msg.sent_time = date::parse_date(text);
                        }
                    }
                    b"OPFMessageCopyMessageID" => msg.message_id = Some(text.to_string()),
                    b"OPFMessageCopyThreadTopic" => msg.thread_topic = Some(text.to_string()),
                    b"OPFMessageGetWasRead" => msg.was_read = text == "1" || text == "true",
                    b"OPFMessageGetIsFlagged" => msg.is_flagged = text == "1" || text == "true",
                    b"OPFMessageGetHasAttachment" => {
                        msg.has_attachment = text == "1" || text == "true"
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                match name.as_ref() {
                    b"OPFMessageCopySenderAddress"
                    | b"OPFMessageCopyFromAddresses"
                    | b"OPFMessageCopyToAddresses"
                    | b"OPFMessageCopyCCAddresses"
                    | b"OPFMessageCopyBCCAddresses" => addr_ctx = AddrContext::None,
                    _ => {}
                }
                current.clear();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "malformed message XML, skipping");
                return None;
            }
        }
    }

    build_record(msg, id, options)
}

fn build_record(msg: OlmMessage, id: usize, options: &ParseOptions) -> Option<EmailRecord> {
    let (sender_name, sender) = msg.sender_address.unwrap_or((None, String::new()));

    let subject = if msg.subject.trim().is_empty() {
        NO_SUBJECT.to_string()
    } else {
        msg.subject.trim().to_string()
    };

    if sender.is_empty() && subject == NO_SUBJECT {
        return None;
    }
    if sender.is_empty() || sender.matches('@').count() != 1 {
        warn!(id, sender = %sender, "dropping OLM record with malformed sender");
        return None;
    }

    let mut body = msg.body;
    if body.trim().is_empty() {
        if let Some(html) = &msg.html_body {
            body = crate::parser::mime::html_to_text(html);
        }
    }
    if crate::parser::mime::looks_binary(&body, options.binary_guard_threshold) {
        if subject == NO_SUBJECT {
            return None;
        }
        body = String::new();
    }
    if subject == NO_SUBJECT && body.trim().is_empty() && msg.html_body.is_none() {
        return None;
    }

    // Thread id: OLM has no Gmail thread header; the thread topic feeds
    // the same derivation the MBOX path uses.
    let hints = ThreadHints {
        topic: msg.thread_topic.as_deref(),
        ..Default::default()
    };
    let thread_id = thread::derive_thread_id(&hints, &subject);

    Some(EmailRecord {
        id,
        subject,
        sender,
        sender_name,
        recipients: msg.recipients,
        date: msg.sent_time.unwrap_or_else(Utc::now),
        body,
        html_body: msg.html_body,
        size: msg.raw_len.min(SIZE_CAP),
        is_read: msg.was_read,
        is_starred: msg.is_flagged,
        folder_id: "inbox".to_string(),
        labels: None,
        thread_id,
        message_id: msg.message_id,
        has_attachments: msg.has_attachment,
    })
}

/// Parse an address book document into explicit contacts.
fn parse_contacts_xml(xml: &str) -> Vec<Contact> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut contacts = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut pending_name: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current = e.name().as_ref().to_vec(),
            Ok(Event::Text(t)) => {
                if current == b"OPFContactCopyDisplayName" {
                    if let Ok(text) = t.unescape() {
                        pending_name = Some(text.trim().to_string());
                    }
                }
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"emailAddress" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"OPFContactEmailAddressAddress" {
                        if let Ok(addr) = attr.unescape_value() {
                            let addr = addr.to_lowercase();
                            if addr.contains('@') {
                                contacts.push(Contact::new(
                                    addr,
                                    pending_name.take().filter(|n| !n.is_empty()),
                                    Utc::now(),
                                ));
                            }
                        }
                    }
                }
            }
            Ok(Event::End(_)) => current.clear(),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "malformed contacts XML, skipping rest");
                break;
            }
        }
    }
    contacts
}

/// Parse a calendar document into events.
fn parse_calendar_xml(xml: &str) -> Vec<CalendarEvent> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut events = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut pending = CalendarEvent {
        subject: String::new(),
        start_time: None,
        end_time: None,
        location: None,
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current = e.name().as_ref().to_vec(),
            Ok(Event::Text(t)) => {
                let Ok(text) = t.unescape() else { continue };
                let text = text.trim();
                match current.as_slice() {
                    b"OPFCalendarEventCopySummary" => pending.subject = text.to_string(),
                    b"OPFCalendarEventCopyStartTime" => {
                        pending.start_time = date::parse_date(text)
                    }
                    b"OPFCalendarEventCopyEndTime" => pending.end_time = date::parse_date(text),
                    b"OPFCalendarEventCopyLocation" => {
                        pending.location = Some(text.to_string())
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"appointment" && !pending.subject.is_empty() {
                    events.push(std::mem::replace(
                        &mut pending,
                        CalendarEvent {
                            subject: String::new(),
                            start_time: None,
                            end_time: None,
                            location: None,
                        },
                    ));
                }
                current.clear();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "malformed calendar XML, skipping rest");
                break;
            }
        }
    }
    events
}

/// Fold one derived contact per unique sender into the explicit list.
fn merge_sender_contacts(contacts: &mut Vec<Contact>, emails: &[EmailRecord]) {
    for derived in mbox::contacts_from_emails(emails) {
        match contacts.iter_mut().find(|c| c.email == derived.email) {
            Some(existing) => {
                existing.email_count += derived.email_count;
                if derived.last_seen > existing.last_seen {
                    existing.last_seen = derived.last_seen;
                }
                if derived.first_seen < existing.first_seen {
                    existing.first_seen = derived.first_seen;
                }
                if existing.name.is_none() {
                    existing.name = derived.name;
                }
            }
            None => contacts.push(derived),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<emails>
  <email>
    <OPFMessageCopySubject>Welcome to Netflix!</OPFMessageCopySubject>
    <OPFMessageCopyBody>Your account has been created. Start watching today.</OPFMessageCopyBody>
    <OPFMessageCopySentTime>2024-01-04T10:00:00</OPFMessageCopySentTime>
    <OPFMessageCopyMessageID>&lt;olm1@netflix.com&gt;</OPFMessageCopyMessageID>
    <OPFMessageGetWasRead>1</OPFMessageGetWasRead>
    <OPFMessageCopySenderAddress>
      <emailAddress OPFContactEmailAddressAddress="welcome@netflix.com" OPFContactEmailAddressName="Netflix"/>
    </OPFMessageCopySenderAddress>
    <OPFMessageCopyToAddresses>
      <emailAddress OPFContactEmailAddressAddress="user@example.com"/>
    </OPFMessageCopyToAddresses>
  </email>
</emails>"#;

    #[test]
    fn test_parse_message_xml() {
        let record = parse_message_xml(MESSAGE_XML, 0, &ParseOptions::default()).unwrap();
        assert_eq!(record.subject, "Welcome to Netflix!");
        assert_eq!(record.sender, "welcome@netflix.com");
        assert_eq!(record.sender_name.as_deref(), Some("Netflix"));
        assert_eq!(record.recipients, vec!["user@example.com"]);
        assert_eq!(record.folder_id, "inbox");
        assert!(record.is_read);
        assert_eq!(record.date.format("%Y-%m-%d").to_string(), "2024-01-04");
    }

    #[test]
    fn test_malformed_xml_skipped() {
        assert!(parse_message_xml("<email><unclosed", 0, &ParseOptions::default()).is_none());
    }

    #[test]
    fn test_message_number_extraction() {
        assert_eq!(
            message_number("com.microsoft.__Messages/Inbox/message_42.xml"),
            Some(42)
        );
        assert_eq!(message_number("com.microsoft.__Messages/message_7.xml"), Some(7));
        assert_eq!(message_number("com.microsoft.__Messages/message_.xml"), None);
        assert_eq!(message_number("Other/message_1.xml"), None);
    }

    #[test]
    fn test_entry_classification() {
        assert!(is_contacts_entry("Address Book/Contacts.xml"));
        assert!(is_contacts_entry("Accounts/Main/Contacts/c1.xml"));
        assert!(is_calendar_entry("Accounts/Main/Calendar.xml"));
        assert!(!is_calendar_entry("Accounts/Main/Notes.xml"));
    }

    #[test]
    fn test_contacts_xml() {
        let xml = r#"<contacts>
          <contact>
            <OPFContactCopyDisplayName>Jane Doe</OPFContactCopyDisplayName>
            <emailAddress OPFContactEmailAddressAddress="Jane@Example.com"/>
          </contact>
        </contacts>"#;
        let contacts = parse_contacts_xml(xml);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].email, "jane@example.com");
        assert_eq!(contacts[0].name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_sender_without_at_dropped() {
        let xml = r#"<email>
          <OPFMessageCopySubject>Hi</OPFMessageCopySubject>
          <OPFMessageCopySenderAddress>
            <emailAddress OPFContactEmailAddressAddress="not-an-address"/>
          </OPFMessageCopySenderAddress>
        </email>"#;
        assert!(parse_message_xml(xml, 0, &ParseOptions::default()).is_none());
    }
}
