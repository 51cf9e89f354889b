//! Parser for individual `.eml` files (RFC 5322 messages without MBOX framing).

use std::path::Path;

use crate::error::{Result, SiftError};
use crate::model::EmailRecord;
use crate::options::ParseOptions;
use crate::parser::mime;

/// Parse a single `.eml` file into a normalized record.
///
/// An EML file is a bare RFC 5322 message (no `From ` separator). Returns
/// `Ok(None)` when the message fails the hard checks that would drop it
/// from an archive stream.
pub fn parse_eml(
    path: impl AsRef<Path>,
    id: usize,
    options: &ParseOptions,
) -> Result<Option<EmailRecord>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SiftError::FileNotFound(path.to_path_buf())
        } else {
            SiftError::io(path, e)
        }
    })?;

    let text = String::from_utf8_lossy(&data);
    Ok(mime::parse_message(&text, id, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_single_eml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("single.eml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            "From: Test Sender <sender@example.com>\n\
             To: rcpt@example.com\n\
             Subject: Single EML Test\n\
             Message-ID: <eml001@example.com>\n\
             Date: Thu, 04 Jan 2024 10:00:00 +0000\n\
             \n\
             Hello from a bare message.\n"
        )
        .unwrap();
        drop(f);

        let record = parse_eml(&path, 0, &ParseOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(record.subject, "Single EML Test");
        assert_eq!(record.sender, "sender@example.com");
        assert_eq!(record.sender_name.as_deref(), Some("Test Sender"));
        assert_eq!(record.message_id.as_deref(), Some("<eml001@example.com>"));
    }

    #[test]
    fn test_parse_eml_missing_file() {
        let err = parse_eml("/no/such/file.eml", 0, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SiftError::FileNotFound(_)));
    }
}
