//! Gmail label interpretation: `X-Gmail-Labels` parsing and folder mapping.

/// Labels Gmail applies automatically; never eligible as custom folders.
const SYSTEM_LABELS: &[&str] = &["opened", "unread", "starred", "important", "all mail"];

/// Maximum length of a kebab-cased custom folder id.
const CUSTOM_LABEL_MAX: usize = 50;

/// Parse an `X-Gmail-Labels` header value into normalized (lowercased) labels.
///
/// The value is comma-separated with double-quote escape support: a label
/// containing commas may be wrapped in `"…"`.
pub fn parse_gmail_labels(header: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in header.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                push_label(&mut labels, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_label(&mut labels, &current);

    labels
}

fn push_label(labels: &mut Vec<String>, raw: &str) {
    let label = raw.trim().to_lowercase();
    if !label.is_empty() {
        labels.push(label);
    }
}

/// Map normalized labels to a canonical folder id.
///
/// Priority: `inbox` > `sent` > `drafts` > `spam` > `trash` > first custom
/// label (kebab-cased) > `archive`.
pub fn folder_id_from_labels(labels: &[String]) -> String {
    if labels.iter().any(|l| l == "inbox") {
        return "inbox".to_string();
    }
    if labels.iter().any(|l| l == "sent" || l == "sent mail") {
        return "sent".to_string();
    }
    if labels.iter().any(|l| l == "draft" || l == "drafts") {
        return "drafts".to_string();
    }
    if labels.iter().any(|l| l == "spam") {
        return "spam".to_string();
    }
    if labels.iter().any(|l| l == "trash") {
        return "trash".to_string();
    }
    if let Some(custom) = labels.iter().find(|l| !is_system_label(l)) {
        return kebab_case_label(custom);
    }
    "archive".to_string()
}

/// True for labels Gmail manages itself (`category *` included).
pub fn is_system_label(label: &str) -> bool {
    SYSTEM_LABELS.contains(&label) || label.starts_with("category ") || label == "category"
}

/// Kebab-case a custom label: lowercase, `[^a-z0-9 -]` stripped, spaces to
/// hyphens, truncated to 50 chars.
pub fn kebab_case_label(label: &str) -> String {
    let cleaned: String = label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();
    let mut kebab: String = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    kebab.truncate(CUSTOM_LABEL_MAX);
    kebab
}

/// Derive `(is_read, is_starred)` from normalized labels.
pub fn flags_from_labels(labels: &[String]) -> (bool, bool) {
    let is_read = !labels.iter().any(|l| l == "unread");
    let is_starred = labels.iter().any(|l| l == "starred");
    (is_read, is_starred)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &str) -> Vec<String> {
        parse_gmail_labels(raw)
    }

    #[test]
    fn test_parse_simple_labels() {
        assert_eq!(
            labels("Inbox,Unread,Starred"),
            vec!["inbox", "unread", "starred"]
        );
    }

    #[test]
    fn test_parse_quoted_label_with_comma() {
        assert_eq!(
            labels("\"Receipts, 2024\",Inbox"),
            vec!["receipts, 2024", "inbox"]
        );
    }

    #[test]
    fn test_folder_priority_inbox_wins() {
        assert_eq!(
            folder_id_from_labels(&labels("Work,Sent,Inbox")),
            "inbox"
        );
    }

    #[test]
    fn test_folder_sent_variants() {
        assert_eq!(folder_id_from_labels(&labels("Sent Mail")), "sent");
        assert_eq!(folder_id_from_labels(&labels("Sent")), "sent");
    }

    #[test]
    fn test_folder_custom_label_kebab_cased() {
        assert_eq!(
            folder_id_from_labels(&labels("My Project! (2024)")),
            "my-project-2024"
        );
    }

    #[test]
    fn test_folder_system_labels_fall_through_to_archive() {
        assert_eq!(
            folder_id_from_labels(&labels("Opened,Category Promotions,Unread")),
            "archive"
        );
    }

    #[test]
    fn test_folder_empty_is_archive() {
        assert_eq!(folder_id_from_labels(&[]), "archive");
    }

    #[test]
    fn test_flags_from_labels() {
        assert_eq!(flags_from_labels(&labels("Inbox,Unread")), (false, false));
        assert_eq!(flags_from_labels(&labels("Inbox,Starred")), (true, true));
        assert_eq!(flags_from_labels(&labels("Inbox")), (true, false));
    }

    #[test]
    fn test_kebab_truncates_to_fifty() {
        let long = "x".repeat(80);
        assert_eq!(kebab_case_label(&long).len(), 50);
    }

    #[test]
    fn test_folder_mapping_idempotent() {
        // Mapping output fed back through normalization stays stable.
        let id = folder_id_from_labels(&labels("My Project"));
        assert_eq!(kebab_case_label(&id), id);
    }
}
