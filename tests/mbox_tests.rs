//! Integration tests for the MBOX pipeline: splitting, MIME decoding,
//! Gmail labels, and streaming equivalence.

use std::path::Path;

use mailsift::parser::MboxParser;
use mailsift::{parse_archive, ByteSource, EmailRecord, ParseOptions};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse_fixture(name: &str) -> Vec<EmailRecord> {
    let source = ByteSource::open(fixture(name)).unwrap();
    let result = MboxParser::parse(&source, &ParseOptions::default());
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    result.emails
}

// ─── Basic splitting and decoding ───────────────────────────────────

#[test]
fn test_simple_mbox_count() {
    let emails = parse_fixture("simple.mbox");
    assert_eq!(emails.len(), 5, "simple.mbox should contain 5 messages");
}

#[test]
fn test_first_message_decoded() {
    let emails = parse_fixture("simple.mbox");
    let first = &emails[0];
    assert_eq!(first.sender, "john@x.com");
    assert_eq!(first.sender_name.as_deref(), Some("John Doe"));
    assert_eq!(first.subject, "Hello");
    assert!(first.body.contains("Hello World"), "QP body should decode");
    assert_eq!(first.message_id.as_deref(), Some("<msg001@x.com>"));
    assert_eq!(first.recipients, vec!["jane@y.com"]);
}

#[test]
fn test_encoded_words_in_from_and_subject() {
    let emails = parse_fixture("simple.mbox");
    let third = &emails[2];
    assert!(third.sender_name.as_deref().unwrap_or("").contains("Jos"));
    assert!(third.subject.contains("Caf"));
    assert!(third.subject.contains("le"));
}

#[test]
fn test_from_in_body_is_not_a_separator() {
    let emails = parse_fixture("simple.mbox");
    assert_eq!(emails.len(), 5);
    let fourth = &emails[3];
    assert_eq!(fourth.subject, "Message with From in body");
    assert!(
        fourth.body.contains("From here it only gets better"),
        "body should keep the non-separator From line, got: {}",
        fourth.body
    );
}

#[test]
fn test_multipart_alternative_both_bodies() {
    let emails = parse_fixture("simple.mbox");
    let fifth = &emails[4];
    assert!(fifth.body.contains("plain variant"));
    assert!(fifth.html_body.as_deref().unwrap_or("").contains("variant"));
    assert_eq!(fifth.recipients.len(), 2);
}

// ─── Gmail labels ──────────────────────────────────────────────────

#[test]
fn test_gmail_labels_applied() {
    let emails = parse_fixture("simple.mbox");
    let third = &emails[2];
    assert_eq!(third.folder_id, "inbox");
    assert!(!third.is_read);
    let labels = third.labels.as_ref().unwrap();
    assert!(labels.contains(&"receipts 2024".to_string()));
}

#[test]
fn test_folder_ids_subset_and_idempotent() {
    let predefined = ["inbox", "sent", "drafts", "spam", "trash", "archive"];
    for header in [
        "Inbox,Sent,Starred",
        "Trash,Opened",
        "Weird Label!,Category Promotions",
        "\"Quoted, Label\",Spam",
    ] {
        let ids = MboxParser::folder_ids_from_labels(header);
        for id in &ids {
            let kebab_ok = id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            assert!(
                predefined.contains(&id.as_str()) || kebab_ok,
                "unexpected folder id: {id}"
            );
        }
        assert_eq!(MboxParser::folder_ids_from_labels(&ids.join(",")), ids);
    }
}

// ─── Hard checks and the binary guard ──────────────────────────────

#[test]
fn test_binary_body_without_subject_dropped() {
    let source = ByteSource::open(fixture("binary.mbox")).unwrap();
    let result = MboxParser::parse(&source, &ParseOptions::default());
    assert_eq!(result.stats.email_count, 1);
    assert_eq!(result.stats.skipped_count, 1);
    assert_eq!(result.emails[0].subject, "After the drop");
}

#[test]
fn test_sender_invariant_holds() {
    for name in ["simple.mbox", "detectors.mbox", "binary.mbox"] {
        for email in parse_fixture(name) {
            assert_eq!(
                email.sender.matches('@').count(),
                1,
                "sender must contain exactly one @: {}",
                email.sender
            );
        }
    }
}

#[test]
fn test_invalid_leading_from_line_keeps_record_count() {
    // The first `From ` line lacks a day-of-week token, so it is not a
    // separator; the message still parses and the count matches the
    // well-formed rendition of the same archive.
    let malformed = "From x@y.com\n\
                     From: x@y.com\nSubject: Alpha\n\nalpha body\n\n\
                     From z@w.com Thu Jan 04 10:00:00 2024\n\
                     From: z@w.com\nSubject: Beta\n\nbeta body\n";
    let well_formed = "From x@y.com Wed Jan 03 10:00:00 2024\n\
                       From: x@y.com\nSubject: Alpha\n\nalpha body\n\n\
                       From z@w.com Thu Jan 04 10:00:00 2024\n\
                       From: z@w.com\nSubject: Beta\n\nbeta body\n";
    let a = MboxParser::parse(
        &ByteSource::Buffer(malformed.as_bytes().to_vec()),
        &ParseOptions::default(),
    );
    let b = MboxParser::parse(
        &ByteSource::Buffer(well_formed.as_bytes().to_vec()),
        &ParseOptions::default(),
    );
    assert_eq!(a.emails.len(), b.emails.len());
    assert_eq!(a.emails[0].subject, "Alpha");
    assert_eq!(a.emails[1].subject, "Beta");
}

// ─── Thread ids ────────────────────────────────────────────────────

#[test]
fn test_thread_ids_group_replies() {
    let emails = parse_fixture("simple.mbox");
    // Reply carries References; it should thread to the root message id.
    assert_eq!(emails[1].thread_id.as_deref(), Some("<msg001@x.com>"));
    // The root derives a synthetic subject thread.
    assert_eq!(emails[0].thread_id.as_deref(), Some("subject:hello"));
}

// ─── Streaming and chunking properties ─────────────────────────────

#[test]
fn test_streaming_equals_parse() {
    let opts = ParseOptions::default();
    let source = ByteSource::open(fixture("detectors.mbox")).unwrap();
    let full = MboxParser::parse(&source, &opts);

    let source2 = ByteSource::open(fixture("detectors.mbox")).unwrap();
    let mut streamed: Vec<EmailRecord> = Vec::new();
    let total = MboxParser::parse_streaming(&source2, &opts, None, &mut |batch| {
        streamed.extend_from_slice(batch)
    })
    .unwrap();

    assert_eq!(total, full.emails.len());
    assert_eq!(streamed.len(), full.emails.len());
    for (a, b) in streamed.iter().zip(full.emails.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.subject, b.subject);
        assert_eq!(a.sender, b.sender);
        assert_eq!(a.body, b.body);
    }
}

#[test]
fn test_chunk_size_invariance() {
    let bytes = std::fs::read(fixture("simple.mbox")).unwrap();
    let baseline = MboxParser::parse(
        &ByteSource::Buffer(bytes.clone()),
        &ParseOptions::default(),
    );
    for chunk_size in [1, 2, 17, 255, 4096] {
        let opts = ParseOptions {
            chunk_size: Some(chunk_size),
            ..Default::default()
        };
        let result = MboxParser::parse(&ByteSource::Buffer(bytes.clone()), &opts);
        assert_eq!(result.emails.len(), baseline.emails.len(), "chunk {chunk_size}");
        for (a, b) in result.emails.iter().zip(baseline.emails.iter()) {
            assert_eq!(a.subject, b.subject, "chunk {chunk_size}");
            assert_eq!(a.body, b.body, "chunk {chunk_size}");
        }
    }
}

// ─── Sniffing and dispatch ─────────────────────────────────────────

#[test]
fn test_is_mbox_sniff() {
    assert!(MboxParser::is_mbox(fixture("simple.mbox")));
    assert!(!MboxParser::is_mbox(fixture("missing.mbox")));
}

#[test]
fn test_parse_archive_on_mbox_path() {
    let source = ByteSource::open(fixture("simple.mbox")).unwrap();
    let result = parse_archive(&source, &ParseOptions::default(), None);
    assert!(result.is_complete());
    assert_eq!(result.emails.len(), 5);
    assert_eq!(result.contacts.len(), 5);
}

// ─── Contacts ──────────────────────────────────────────────────────

#[test]
fn test_contacts_derived_from_senders() {
    let source = ByteSource::open(fixture("detectors.mbox")).unwrap();
    let result = MboxParser::parse(&source, &ParseOptions::default());
    let blog = result
        .contacts
        .iter()
        .find(|c| c.email == "newsletter@blog.com")
        .unwrap();
    assert_eq!(blog.email_count, 3);
    assert_eq!(blog.name.as_deref(), Some("The Blog"));
}

#[test]
fn test_contacts_disabled() {
    let opts = ParseOptions {
        extract_contacts: false,
        ..Default::default()
    };
    let source = ByteSource::open(fixture("simple.mbox")).unwrap();
    let result = MboxParser::parse(&source, &opts);
    assert!(result.contacts.is_empty());
}

// ─── Progress reporting ────────────────────────────────────────────

#[test]
fn test_progress_reaches_completion() {
    use std::cell::RefCell;
    let stages: RefCell<Vec<mailsift::ProgressStage>> = RefCell::new(Vec::new());
    let on_progress = |update: mailsift::ProgressUpdate| {
        stages.borrow_mut().push(update.stage);
    };
    let source = ByteSource::open(fixture("simple.mbox")).unwrap();
    let result = MboxParser::parse_with_progress(&source, &ParseOptions::default(), Some(&on_progress));
    assert!(result.is_complete());
    let stages = stages.borrow();
    assert!(stages.contains(&mailsift::ProgressStage::ParsingEmails));
    assert!(stages.contains(&mailsift::ProgressStage::Complete));
}
