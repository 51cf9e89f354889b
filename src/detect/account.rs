//! Account sign-up detector.
//!
//! Scores an email for "user just created an account at service X" with an
//! additive 0–100 confidence: catalog domain +40, subject pattern +40, body
//! pattern +30, subject-extracted name +10 (when no catalog hit). A record
//! is emitted at confidence ≥ 70 with a known service name.

use std::collections::HashMap;

use regex::Regex;

use crate::detect::catalog::{self, ServiceEntry, SERVICE_CATALOG};
use crate::model::{DetectedAccount, EmailRecord, ServiceType};

/// Emission threshold.
const MIN_CONFIDENCE: u32 = 70;

/// Extracted service names must fall in this length range and start with an
/// alphabetic character.
const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=30;

/// Detector for service sign-up confirmations.
///
/// All patterns are compiled once at construction; the detector is
/// stateless across calls.
pub struct AccountDetector {
    subject_patterns: Vec<Regex>,
    body_patterns: Vec<Regex>,
    name_patterns: Vec<Regex>,
}

impl AccountDetector {
    pub fn new() -> Self {
        let subject_patterns = [
            r"(?i)^welcome to\b",
            r"(?i)^verify your .{0,30}(email|account)",
            r"(?i)^activate your .{0,30}account",
            r"(?i)^confirm your (email|account|registration)",
            r"(?i)email verification",
            r"(?i)^your .{0,30}account (has been|was) created",
            r"(?i)^complete your (registration|sign.?up)",
            r"(?i)^thanks for (signing up|joining|registering)",
            r"(?i)^account confirmation",
            r"(?i)^get started with\b",
        ];
        let body_patterns = [
            r"(?i)click .{0,40}to verify your email",
            r"(?i)your account has been (created|activated)",
            r"(?i)verification code[:\s]+\d{4,8}",
            r"(?i)confirm your email address",
            r"(?i)activate your account",
            r"(?i)welcome aboard",
            r"(?i)thanks for creating an account",
            r"(?i)complete your registration",
        ];
        // Case-insensitive lead-in, but the captured name must be capitalized.
        let name_patterns = [
            r"^(?i:welcome to) ([A-Z][\w+&'. -]{1,40})",
            r"(?i:thanks for (?:signing up|joining|registering)(?: (?:for|with))?) ([A-Z][\w+&'. -]{1,40})",
            r"^(?i:get started with) ([A-Z][\w+&'. -]{1,40})",
        ];

        Self {
            subject_patterns: compile(&subject_patterns),
            body_patterns: compile(&body_patterns),
            name_patterns: compile(&name_patterns),
        }
    }

    /// The built-in service catalog.
    pub fn known_services(&self) -> &'static [ServiceEntry] {
        SERVICE_CATALOG
    }

    /// Score a single email; `Some` at confidence ≥ 70 with a service name.
    pub fn detect(&self, email: &EmailRecord) -> Option<DetectedAccount> {
        let domain = email.sender_domain().to_string();
        let catalog_hit = catalog::service_for_domain(&domain);

        let mut score: u32 = 0;
        if catalog_hit.is_some() {
            score += 40;
        }
        if self
            .subject_patterns
            .iter()
            .any(|p| p.is_match(&email.subject))
        {
            score += 40;
        }
        if self.body_patterns.iter().any(|p| p.is_match(&email.body)) {
            score += 30;
        }

        let service_name = match catalog_hit {
            Some(entry) => Some(entry.name.to_string()),
            None => {
                let extracted = self.extract_service_name(&email.subject);
                if extracted.is_some() {
                    score += 10;
                }
                extracted
            }
        };

        let confidence = score.min(100);
        if confidence < MIN_CONFIDENCE {
            return None;
        }
        let service_name = service_name?;

        Some(DetectedAccount {
            service_name,
            signup_date: email.date,
            service_type: catalog_hit.map(|e| e.service_type).unwrap_or(ServiceType::Other),
            domain,
            email_count: 1,
            signup_email_id: email.id,
            confidence: confidence as u8,
        })
    }

    /// Detect across a whole archive, deduplicating case-insensitively on
    /// service name. The earliest signup date wins; every further hit
    /// increments `email_count`.
    pub fn detect_batch(&self, emails: &[EmailRecord]) -> Vec<DetectedAccount> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut accounts: Vec<DetectedAccount> = Vec::new();

        for email in emails {
            let Some(detected) = self.detect(email) else {
                continue;
            };
            let key = detected.service_name.to_lowercase();
            match by_name.get(&key) {
                Some(&idx) => {
                    let existing = &mut accounts[idx];
                    existing.email_count += 1;
                    if detected.signup_date < existing.signup_date {
                        existing.signup_date = detected.signup_date;
                        existing.signup_email_id = detected.signup_email_id;
                    }
                    existing.confidence = existing.confidence.max(detected.confidence);
                }
                None => {
                    by_name.insert(key, accounts.len());
                    accounts.push(detected);
                }
            }
        }

        accounts
    }

    /// Try the ordered name patterns against a subject line.
    fn extract_service_name(&self, subject: &str) -> Option<String> {
        for pattern in &self.name_patterns {
            if let Some(caps) = pattern.captures(subject) {
                let raw = caps.get(1)?.as_str();
                let name = raw.trim().trim_end_matches(['.', ',', '!', ' ']).to_string();
                if NAME_LEN.contains(&name.len())
                    && name.chars().next().is_some_and(|c| c.is_alphabetic())
                {
                    return Some(name);
                }
            }
        }
        None
    }
}

impl Default for AccountDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("invalid account pattern"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn email(id: usize, sender: &str, subject: &str, body: &str) -> EmailRecord {
        EmailRecord {
            id,
            subject: subject.to_string(),
            sender: sender.to_string(),
            sender_name: None,
            recipients: vec![],
            date: Utc.with_ymd_and_hms(2024, 1, 1 + id as u32, 0, 0, 0).unwrap(),
            body: body.to_string(),
            html_body: None,
            size: 0,
            is_read: true,
            is_starred: false,
            folder_id: "inbox".into(),
            labels: None,
            thread_id: None,
            message_id: None,
            has_attachments: false,
        }
    }

    #[test]
    fn test_catalog_plus_subject_detects() {
        let d = AccountDetector::new();
        let e = email(0, "welcome@netflix.com", "Welcome to Netflix!", "Start watching.");
        let account = d.detect(&e).unwrap();
        assert_eq!(account.service_name, "Netflix");
        assert_eq!(account.service_type, ServiceType::Streaming);
        assert!(account.confidence >= 80);
    }

    #[test]
    fn test_subject_alone_is_not_enough() {
        let d = AccountDetector::new();
        let e = email(0, "hi@unknownxyz.io", "Verify your email address", "plain text");
        assert!(d.detect(&e).is_none());
    }

    #[test]
    fn test_unknown_service_name_extracted_from_subject() {
        let d = AccountDetector::new();
        // subject +40, body +30, extracted name +10 = 80
        let e = email(
            0,
            "noreply@fancyapp.io",
            "Welcome to FancyApp!",
            "Your account has been created.",
        );
        let account = d.detect(&e).unwrap();
        assert_eq!(account.service_name, "FancyApp");
        assert_eq!(account.service_type, ServiceType::Other);
    }

    #[test]
    fn test_no_service_name_no_record() {
        let d = AccountDetector::new();
        // Scores high but no name can be derived: lowercase name is not captured.
        let e = email(
            0,
            "noreply@zzqqtop.io",
            "Verify your email account",
            "Your account has been created. Verification code: 123456",
        );
        assert!(d.detect(&e).is_none());
    }

    #[test]
    fn test_batch_dedupes_case_insensitively() {
        let d = AccountDetector::new();
        let emails = vec![
            email(0, "welcome@netflix.com", "Welcome to Netflix!", "enjoy"),
            email(1, "info@NETFLIX.com", "Verify your Netflix account", "activate your account"),
            email(2, "welcome@spotify.com", "Welcome to Spotify", "your account has been created"),
        ];
        let accounts = d.detect_batch(&emails);
        assert_eq!(accounts.len(), 2);
        let netflix = accounts.iter().find(|a| a.service_name == "Netflix").unwrap();
        assert_eq!(netflix.email_count, 2);
        // Earliest hit drives the signup date.
        assert_eq!(netflix.signup_email_id, 0);
    }

    #[test]
    fn test_batch_distinct_names() {
        let d = AccountDetector::new();
        let emails = vec![
            email(0, "welcome@netflix.com", "Welcome to Netflix!", ""),
            email(1, "welcome@github.com", "Welcome to GitHub", ""),
        ];
        let accounts = d.detect_batch(&emails);
        let mut names: Vec<String> = accounts.iter().map(|a| a.service_name.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), accounts.len());
    }

    #[test]
    fn test_name_length_bounds() {
        let d = AccountDetector::new();
        assert_eq!(d.extract_service_name("Welcome to A"), None);
        assert_eq!(
            d.extract_service_name("Welcome to Notion."),
            Some("Notion".to_string())
        );
        assert_eq!(
            d.extract_service_name("Thanks for joining Figma!"),
            Some("Figma".to_string())
        );
    }
}
