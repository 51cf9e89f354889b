//! Parse options, progress reporting, and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Default chunk size when streaming from a file path (100 MiB).
pub const PATH_CHUNK_SIZE: usize = 100 * 1024 * 1024;

/// Default chunk size when slicing an in-memory buffer (5 MiB).
pub const BUFFER_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Buffers above this size stream at [`PATH_CHUNK_SIZE`] granularity instead
/// of being converted in one piece.
pub const LARGE_BUFFER_THRESHOLD: usize = 500 * 1024 * 1024;

/// Default cap on a single message before it is emitted early (100 MiB).
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// How many records between host-yield checkpoints.
pub const YIELD_EVERY: usize = 100;

/// Options controlling a single archive parse.
///
/// All detector flags default to `false`; contact extraction defaults to
/// `true` in both path and buffer mode.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Run the account sign-up detector over the parsed archive.
    pub detect_accounts: bool,
    /// Run the purchase detector.
    pub detect_purchases: bool,
    /// Run the subscription detector.
    pub detect_subscriptions: bool,
    /// Run the newsletter detector.
    pub detect_newsletters: bool,
    /// Derive contacts from message senders (MBOX; OLM always extracts).
    pub extract_contacts: bool,
    /// Override the source chunk size. `None` selects the per-mode default.
    pub chunk_size: Option<usize>,
    /// Cap on a single message's byte length before early emission.
    pub max_message_size: usize,
    /// Fraction of non-printable bytes (in the first 200) above which a body
    /// is treated as leaked binary content.
    pub binary_guard_threshold: f32,
    /// Host cancellation flag, checked between chunks and record emits.
    pub cancel: Option<CancelToken>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            detect_accounts: false,
            detect_purchases: false,
            detect_subscriptions: false,
            detect_newsletters: false,
            extract_contacts: true,
            chunk_size: None,
            max_message_size: MAX_MESSAGE_SIZE,
            binary_guard_threshold: 0.30,
            cancel: None,
        }
    }
}

impl ParseOptions {
    /// Enable all four detectors.
    pub fn with_all_detectors(mut self) -> Self {
        self.detect_accounts = true;
        self.detect_purchases = true;
        self.detect_subscriptions = true;
        self.detect_newsletters = true;
        self
    }

    /// True if any detector is enabled.
    pub fn any_detector(&self) -> bool {
        self.detect_accounts
            || self.detect_purchases
            || self.detect_subscriptions
            || self.detect_newsletters
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancel.as_ref().map(|c| c.is_cancelled()).unwrap_or(false)
    }
}

/// Shared cancellation flag the host may trip from another thread.
///
/// Cancellation is observed between chunks and between record emits; no
/// half-emitted record ever escapes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Pipeline stage reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Extracting,
    ParsingEmails,
    ParsingContacts,
    ParsingCalendar,
    Detecting,
    Complete,
}

/// A single progress report.
///
/// Reports fire at ≥1% intervals and at least every [`YIELD_EVERY`] records
/// so host UIs can repaint during large archives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: ProgressStage,
    /// Percentage in `[0, 100]`.
    pub progress: u8,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: ProgressStage, progress: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: progress.min(100),
            message: message.into(),
        }
    }
}

/// Progress callback signature used across the crate.
pub type ProgressFn<'a> = &'a dyn Fn(ProgressUpdate);

/// Tracks the last reported percentage so callers only fire at ≥1% steps.
#[derive(Debug, Default)]
pub(crate) struct ProgressGate {
    last: Option<u8>,
}

impl ProgressGate {
    /// Returns `true` when `pct` crosses a whole-percent boundary.
    pub(crate) fn should_report(&mut self, pct: u8) -> bool {
        match self.last {
            Some(prev) if pct <= prev => false,
            _ => {
                self.last = Some(pct);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_trips() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());

        let opts = ParseOptions {
            cancel: Some(token),
            ..Default::default()
        };
        assert!(opts.cancelled());
    }

    #[test]
    fn test_progress_gate_whole_percent_steps() {
        let mut gate = ProgressGate::default();
        assert!(gate.should_report(0));
        assert!(!gate.should_report(0));
        assert!(gate.should_report(1));
        assert!(!gate.should_report(1));
        assert!(gate.should_report(57));
    }

    #[test]
    fn test_progress_clamped_to_100() {
        let update = ProgressUpdate::new(ProgressStage::Complete, 255, "done");
        assert_eq!(update.progress, 100);
    }
}
