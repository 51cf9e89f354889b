//! Contacts derived from archive senders and OLM address books.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person seen in the archive, keyed by lowercase address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Lowercased email address.
    pub email: String,
    /// Best-known display name (most recent non-empty wins).
    pub name: Option<String>,
    /// How many messages this address sent.
    pub email_count: usize,
    /// Date of the earliest message seen from this address.
    pub first_seen: DateTime<Utc>,
    /// Date of the most recent message seen from this address.
    pub last_seen: DateTime<Utc>,
}

impl Contact {
    pub fn new(email: String, name: Option<String>, date: DateTime<Utc>) -> Self {
        Self {
            email,
            name,
            email_count: 1,
            first_seen: date,
            last_seen: date,
        }
    }

    /// Fold another sighting of this address into the contact.
    pub fn record_sighting(&mut self, name: Option<&str>, date: DateTime<Utc>) {
        self.email_count += 1;
        if date < self.first_seen {
            self.first_seen = date;
        }
        if date >= self.last_seen {
            self.last_seen = date;
            if let Some(n) = name {
                if !n.is_empty() {
                    self.name = Some(n.to_string());
                }
            }
        }
        if self.name.is_none() {
            if let Some(n) = name {
                if !n.is_empty() {
                    self.name = Some(n.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sightings_track_range_and_name() {
        let d1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut c = Contact::new("a@b.com".into(), None, d2);
        c.record_sighting(Some("Alice"), d1);
        assert_eq!(c.email_count, 2);
        assert_eq!(c.first_seen, d1);
        assert_eq!(c.last_seen, d2);
        // Name filled from older sighting because none was known.
        assert_eq!(c.name.as_deref(), Some("Alice"));

        let d3 = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        c.record_sighting(Some("Alice Smith"), d3);
        assert_eq!(c.name.as_deref(), Some("Alice Smith"));
    }
}
