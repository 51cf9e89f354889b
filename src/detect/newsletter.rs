//! Newsletter and promotional-mail detector.
//!
//! Two independent 0–100 axes are scored per email: a newsletter score and
//! a promotional score. `is_promotional` wins ties — a promotional blast
//! with newsletter dressing is reported as promotional, not a newsletter.

use std::collections::HashMap;

use regex::{Regex, RegexSet};

use crate::detect::catalog;
use crate::model::{DetectedNewsletter, EmailRecord, NewsletterFrequency};

/// Score at which an axis qualifies.
const AXIS_THRESHOLD: u32 = 40;

/// Sender subdomains that mark bulk promotional infrastructure.
const PROMO_SUBDOMAINS: &[&str] = &[
    "promo.", "promotions.", "marketing.", "newsletter.", "news.", "email.", "mail.", "updates.",
    "offers.", "deals.",
];

/// Category returned by [`NewsletterDetector::categorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailCategory {
    Newsletter,
    Promotional,
    Regular,
}

/// Detector for newsletters and promotional senders.
pub struct NewsletterDetector {
    newsletter_subject: Vec<Regex>,
    promo_subject: Vec<Regex>,
    marketing_body: RegexSet,
    anchor_unsub: Regex,
    href_unsub: Regex,
    plain_unsub: Regex,
    list_unsub: Regex,
}

impl NewsletterDetector {
    pub fn new() -> Self {
        let newsletter_subject = compile(&[
            r"(?i)\bnewsletter\b",
            r"(?i)weekly digest",
            r"(?i)daily digest",
            r"(?i)monthly roundup",
            r"(?i)issue #?\d+",
            r"(?i)\bvol\.? \d+",
            r"(?i)this week in\b",
        ]);

        let promo_subject = compile(&[
            r"(?i)save \d+%",
            r"(?i)\d+% off",
            r"(?i)flash sale",
            r"(?i)limited time",
            r"(?i)exclusive offer",
            r"(?i)use code",
            r"(?i)black friday",
            r"(?i)cyber monday",
            r"(?i)free shipping",
        ]);

        let marketing_body = RegexSet::new([
            r"(?i)unsubscribe",
            r"(?i)manage (?:your )?preferences",
            r"(?i)view (?:this email )?in (?:your )?browser",
            r"(?i)copyright ©",
            r"(?i)all rights reserved",
            r"(?i)privacy policy",
        ])
        .expect("invalid marketing body patterns");

        // Anchor whose visible text mentions unsubscribing.
        let anchor_unsub = Regex::new(
            r#"(?is)<a[^>]+href=["']([^"']+)["'][^>]*>[^<]{0,100}unsubscribe"#,
        )
        .expect("invalid unsubscribe anchor pattern");

        // Any href whose URL itself names an unsubscribe/preferences path.
        let href_unsub = Regex::new(
            r#"(?i)href=["']([^"']*(?:unsubscribe|opt-out|email-preferences|manage-preferences)[^"']*)["']"#,
        )
        .expect("invalid unsubscribe href pattern");

        let plain_unsub = Regex::new(
            r"(?i)https?://[^\s<>'\x22]*(?:unsubscribe|opt-out|preferences)[^\s<>'\x22]*",
        )
        .expect("invalid plain unsubscribe pattern");

        let list_unsub = Regex::new(r"(?i)list-unsubscribe").expect("invalid list pattern");

        Self {
            newsletter_subject,
            promo_subject,
            marketing_body,
            anchor_unsub,
            href_unsub,
            plain_unsub,
            list_unsub,
        }
    }

    /// Classify an email as newsletter, promotional, or regular mail.
    pub fn categorize(&self, email: &EmailRecord) -> MailCategory {
        let scores = self.score(email);
        if scores.promotional >= AXIS_THRESHOLD {
            MailCategory::Promotional
        } else if scores.newsletter >= AXIS_THRESHOLD {
            MailCategory::Newsletter
        } else {
            MailCategory::Regular
        }
    }

    /// Score a single email; `Some` when either axis qualifies.
    pub fn detect(&self, email: &EmailRecord) -> Option<DetectedNewsletter> {
        let scores = self.score(email);
        let is_promotional = scores.promotional >= AXIS_THRESHOLD;
        let is_newsletter = scores.newsletter >= AXIS_THRESHOLD && !is_promotional;
        if !is_newsletter && !is_promotional {
            return None;
        }

        Some(DetectedNewsletter {
            sender_email: email.sender.clone(),
            sender_name: email.sender_name.clone(),
            email_count: 1,
            last_email_date: email.date,
            frequency: NewsletterFrequency::Irregular,
            unsubscribe_link: self.extract_unsubscribe_link(&self.link_haystack(email)),
            is_promotional,
        })
    }

    /// Detect across a whole archive, grouping by sender address.
    ///
    /// Frequency comes from average inter-arrival days within a group:
    /// ≤ 2 daily, ≤ 10 weekly, ≤ 45 monthly, else irregular.
    pub fn detect_batch(&self, emails: &[EmailRecord]) -> Vec<DetectedNewsletter> {
        let mut groups: HashMap<String, Vec<&EmailRecord>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for email in emails {
            if self.detect(email).is_none() {
                continue;
            }
            let key = email.sender.clone();
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(email);
        }

        order
            .into_iter()
            .filter_map(|sender| {
                let mut group = groups.remove(&sender)?;
                group.sort_by(|a, b| b.date.cmp(&a.date));
                Some(self.aggregate(sender, &group))
            })
            .collect()
    }

    fn aggregate(&self, sender: String, newest_first: &[&EmailRecord]) -> DetectedNewsletter {
        let newest = newest_first[0];
        let frequency = frequency_from_dates(newest_first);

        let unsubscribe_link = newest_first
            .iter()
            .find_map(|e| self.extract_unsubscribe_link(&self.link_haystack(e)));

        let domain = newest.sender_domain();
        let sender_name = newest_first
            .iter()
            .find_map(|e| e.sender_name.clone().filter(|n| !n.trim().is_empty()))
            .or_else(|| catalog::canonical_sender_name(domain).map(String::from))
            .or_else(|| Some(catalog::humanize_domain(domain)).filter(|n| !n.is_empty()));

        let is_promotional = self.score(newest).promotional >= AXIS_THRESHOLD;

        DetectedNewsletter {
            sender_email: sender,
            sender_name,
            email_count: newest_first.len(),
            last_email_date: newest.date,
            frequency,
            unsubscribe_link,
            is_promotional,
        }
    }

    /// Extract an unsubscribe URL from HTML or plain text.
    ///
    /// Ordered: anchors whose text mentions unsubscribing, hrefs whose URL
    /// names an unsubscribe path, then a plain-URL scan. Only `http(s)` is
    /// accepted; `javascript:` and `mailto:` are rejected.
    pub fn extract_unsubscribe_link(&self, content: &str) -> Option<String> {
        if let Some(caps) = self.anchor_unsub.captures(content) {
            if let Some(url) = accept_http(caps.get(1)?.as_str()) {
                return Some(url);
            }
        }
        if let Some(caps) = self.href_unsub.captures(content) {
            if let Some(url) = accept_http(caps.get(1)?.as_str()) {
                return Some(url);
            }
        }
        if let Some(m) = self.plain_unsub.find(content) {
            return accept_http(m.as_str());
        }
        None
    }

    fn link_haystack(&self, email: &EmailRecord) -> String {
        match &email.html_body {
            Some(html) => format!("{}\n{}", html, email.body),
            None => email.body.clone(),
        }
    }

    fn score(&self, email: &EmailRecord) -> AxisScores {
        let body = self.link_haystack(email);
        let marketing_hits = self.marketing_body.matches(&body).iter().count();
        let subdomain_hit = has_promo_subdomain(email.sender_domain());
        let unsub_link = self.extract_unsubscribe_link(&body).is_some();

        let mut newsletter: u32 = 0;
        if self
            .newsletter_subject
            .iter()
            .any(|p| p.is_match(&email.subject))
        {
            newsletter += 30;
        }
        newsletter += marketing_bonus(marketing_hits, 25, 15);
        if subdomain_hit {
            newsletter += 20;
        }
        if unsub_link {
            newsletter += 15;
        }
        if self.list_unsub.is_match(&body) {
            newsletter += 10;
        }

        let mut promotional: u32 = 0;
        if self
            .promo_subject
            .iter()
            .any(|p| p.is_match(&email.subject))
        {
            promotional += 35;
        }
        promotional += marketing_bonus(marketing_hits, 20, 10);
        if subdomain_hit {
            promotional += 20;
        }
        if unsub_link {
            promotional += 10;
        }

        AxisScores {
            newsletter: newsletter.min(100),
            promotional: promotional.min(100),
        }
    }
}

impl Default for NewsletterDetector {
    fn default() -> Self {
        Self::new()
    }
}

struct AxisScores {
    newsletter: u32,
    promotional: u32,
}

fn marketing_bonus(hits: usize, high: u32, low: u32) -> u32 {
    if hits >= 3 {
        high
    } else if hits >= 2 {
        low
    } else {
        0
    }
}

fn has_promo_subdomain(domain: &str) -> bool {
    PROMO_SUBDOMAINS.iter().any(|p| domain.starts_with(p))
}

fn accept_http(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let lower = trimmed.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Average inter-arrival gap over a newest-first group.
fn frequency_from_dates(newest_first: &[&EmailRecord]) -> NewsletterFrequency {
    let (Some(first), Some(last)) = (newest_first.first(), newest_first.last()) else {
        return NewsletterFrequency::Irregular;
    };
    if newest_first.len() < 2 {
        return NewsletterFrequency::Irregular;
    }
    let newest = first.date;
    let oldest = last.date;
    let span_days = (newest - oldest).num_days().abs() as f64;
    let avg = span_days / (newest_first.len() - 1) as f64;

    if avg <= 2.0 {
        NewsletterFrequency::Daily
    } else if avg <= 10.0 {
        NewsletterFrequency::Weekly
    } else if avg <= 45.0 {
        NewsletterFrequency::Monthly
    } else {
        NewsletterFrequency::Irregular
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("invalid newsletter pattern"))
        .collect()
}
