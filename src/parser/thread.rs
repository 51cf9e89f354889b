//! Subject normalization and thread-id derivation.
//!
//! When provider-supplied conversation headers are missing, a synthetic
//! thread id is derived from the normalized subject so replies and forwards
//! of the same conversation still group together.

/// Reply/forward prefixes stripped during normalization, across several
/// languages (German `AW`, Swedish `SV`, Finnish `VS`, Dutch `Antw`,
/// Italian `R`).
const REPLY_PREFIXES: &[&str] = &[
    "re:", "fwd:", "fw:", "aw:", "sv:", "vs:", "antw:", "r:",
];

/// Provider-supplied threading evidence for one message.
///
/// The MBOX path fills these from parsed headers; the OLM path only ever
/// has a thread topic. Priority: `gmail_thread_id` > `topic` >
/// `first_reference` > `in_reply_to` > synthetic subject key.
#[derive(Debug, Default)]
pub struct ThreadHints<'a> {
    /// `X-Gm-Thrid` header value.
    pub gmail_thread_id: Option<&'a str>,
    /// `Thread-Topic` header (or the OLM thread-topic element).
    pub topic: Option<&'a str>,
    /// First token of the `References` chain.
    pub first_reference: Option<&'a str>,
    /// `In-Reply-To` message id.
    pub in_reply_to: Option<&'a str>,
}

/// Normalize a subject for threading: lowercase, reply/forward prefixes
/// stripped repeatedly until stable, whitespace collapsed.
///
/// Idempotent: `normalize_subject(normalize_subject(s)) == normalize_subject(s)`.
pub fn normalize_subject(subject: &str) -> String {
    let mut normalized = subject.trim().to_lowercase();

    // Keep removing prefixes until none match
    loop {
        let before = normalized.clone();

        for prefix in REPLY_PREFIXES {
            if normalized.starts_with(prefix) {
                normalized = normalized[prefix.len()..].trim_start().to_string();
            }
        }

        if before == normalized {
            break;
        }
    }

    // Collapse runs of whitespace into single spaces
    let words: Vec<&str> = normalized.split_whitespace().collect();
    words.join(" ")
}

/// Derive a stable thread id from the available evidence.
pub fn derive_thread_id(hints: &ThreadHints<'_>, subject: &str) -> Option<String> {
    if let Some(thrid) = nonempty(hints.gmail_thread_id) {
        return Some(thrid.to_string());
    }

    if let Some(topic) = hints.topic {
        let normalized = normalize_subject(topic);
        if !normalized.is_empty() {
            return Some(format!("topic:{}", kebab(&normalized)));
        }
    }

    if let Some(reference) = nonempty(hints.first_reference) {
        return Some(wrap(reference));
    }

    if let Some(parent) = nonempty(hints.in_reply_to) {
        return Some(wrap(parent));
    }

    let normalized = normalize_subject(subject);
    if normalized.is_empty() {
        return None;
    }
    Some(format!("subject:{}", kebab(&normalized)))
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Message-id tokens keep their RFC 822 angle-bracket presentation.
fn wrap(id: &str) -> String {
    format!("<{}>", id.trim_matches(['<', '>']))
}

fn kebab(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("-")
}
