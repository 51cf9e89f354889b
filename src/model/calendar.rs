//! Calendar events extracted from OLM archives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single event from an OLM `Calendar.xml` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub subject: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
}
