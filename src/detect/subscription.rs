//! Subscription detector.
//!
//! Two-stage qualification: one strong subject pattern qualifies outright;
//! otherwise two distinct body-pattern hits are required. Qualified emails
//! get an amount, a billing frequency from keyword scan, and a service name
//! resolved catalog-first.

use std::collections::HashMap;

use regex::{Regex, RegexSet};

use crate::detect::amount;
use crate::detect::catalog::{self, SubscriptionEntry, SUBSCRIPTION_CATALOG};
use crate::model::{DetectedSubscription, EmailRecord, SubscriptionFrequency};

/// Distinct body-pattern hits required when no subject pattern matches.
const BODY_HITS_REQUIRED: usize = 2;

/// Detector for recurring subscriptions and memberships.
pub struct SubscriptionDetector {
    subject_patterns: Vec<Regex>,
    body_patterns: RegexSet,
    name_patterns: Vec<Regex>,
    yearly: Regex,
    weekly: Regex,
}

impl SubscriptionDetector {
    pub fn new() -> Self {
        let subject_patterns = [
            r"(?i)subscription (?:confirmed|renewed|receipt)",
            r"(?i)your (?:monthly|yearly|annual) (?:subscription|membership|plan)",
            r"(?i)auto.?renew",
            r"(?i)recurring (?:payment|charge)",
            r"(?i)membership (?:renewal|confirmation)",
            r"(?i)your subscription (?:to|with)",
            r"(?i)subscription payment",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid subscription subject pattern"))
        .collect();

        let body_patterns = RegexSet::new([
            r"(?i)subscription plan:",
            r"(?i)billing period:",
            r"(?i)next billing date:",
            r"(?i)(?:monthly|annual|yearly) subscription",
            r"(?i)renews on",
            r"(?i)cancel anytime",
            r"(?i)manage your subscription",
            r"(?i)recurring (?:payment|charge)",
        ])
        .expect("invalid subscription body patterns");

        let name_patterns = [
            r"(?i)your subscription (?:to|with) (.{2,30}?)(?:\s+(?:has|is|will)|[.,!]|$)",
            r"(?i)your (.{2,30}?) (?:monthly |yearly |annual )?(?:subscription|membership|plan)\b",
            r"(?i)subscription to (.{2,30}?)(?:[.,!]|$)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid subscription name pattern"))
        .collect();

        Self {
            subject_patterns,
            body_patterns,
            name_patterns,
            yearly: Regex::new(r"(?i)yearly|annual|per year|/year").unwrap(),
            weekly: Regex::new(r"(?i)weekly|per week|/week").unwrap(),
        }
    }

    /// The built-in subscription catalog.
    pub fn known_services(&self) -> &'static [SubscriptionEntry] {
        SUBSCRIPTION_CATALOG
    }

    /// Score a single email; `Some` when it qualifies as a subscription.
    pub fn detect(&self, email: &EmailRecord) -> Option<DetectedSubscription> {
        let subject_hit = self
            .subject_patterns
            .iter()
            .any(|p| p.is_match(&email.subject));
        let body_hits = self.body_patterns.matches(&email.body).iter().count();

        if !subject_hit && body_hits < BODY_HITS_REQUIRED {
            return None;
        }

        let haystack = format!("{}\n{}", email.subject, email.body);
        let (monthly_amount, currency) = amount::extract_amount(&haystack)
            .unwrap_or((0.0, "USD".to_string()));

        let frequency = if self.yearly.is_match(&haystack) {
            SubscriptionFrequency::Yearly
        } else if self.weekly.is_match(&haystack) {
            SubscriptionFrequency::Weekly
        } else {
            SubscriptionFrequency::Monthly
        };

        let domain = email.sender_domain().to_string();
        let catalog_hit = catalog::subscription_for_domain(&domain);

        let (service_name, category) = match catalog_hit {
            Some(entry) => (entry.name.to_string(), entry.category.to_string()),
            None => {
                let name = self
                    .extract_service_name(&email.subject)
                    .or_else(|| self.extract_service_name(&email.body))
                    .or_else(|| email.sender_name.clone().filter(|n| !n.trim().is_empty()))
                    .unwrap_or_else(|| catalog::humanize_domain(&domain));
                (name, "other".to_string())
            }
        };

        if service_name.is_empty() {
            return None;
        }

        Some(DetectedSubscription {
            service_name,
            monthly_amount,
            currency,
            frequency,
            last_renewal_date: email.date,
            email_ids: vec![email.id],
            is_active: true,
            category,
        })
    }

    /// Detect across a whole archive, grouping case-insensitively by
    /// service name. The most recent email in a group drives the amount,
    /// frequency and renewal date; every hit appends its email id.
    pub fn detect_batch(&self, emails: &[EmailRecord]) -> Vec<DetectedSubscription> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut subs: Vec<DetectedSubscription> = Vec::new();

        for email in emails {
            let Some(detected) = self.detect(email) else {
                continue;
            };
            let key = detected.service_name.to_lowercase();
            match by_name.get(&key) {
                Some(&idx) => {
                    let existing = &mut subs[idx];
                    existing.email_ids.extend(detected.email_ids.iter());
                    if detected.last_renewal_date >= existing.last_renewal_date {
                        existing.last_renewal_date = detected.last_renewal_date;
                        existing.frequency = detected.frequency;
                        if detected.monthly_amount > 0.0 {
                            existing.monthly_amount = detected.monthly_amount;
                            existing.currency = detected.currency;
                        }
                    }
                }
                None => {
                    by_name.insert(key, subs.len());
                    subs.push(detected);
                }
            }
        }

        subs
    }

    fn extract_service_name(&self, text: &str) -> Option<String> {
        for pattern in &self.name_patterns {
            if let Some(caps) = pattern.captures(text) {
                let name = caps.get(1)?.as_str().trim().trim_end_matches(['.', ',']).to_string();
                if name.len() >= 2 && name.chars().next().is_some_and(|c| c.is_alphabetic()) {
                    return Some(name);
                }
            }
        }
        None
    }
}

impl Default for SubscriptionDetector {
    fn default() -> Self {
        Self::new()
    }
}
