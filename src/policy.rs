//! Follow-up policy engine — the one piece of real decision logic.
//!
//! A policy maps status labels to a "days until due" interval. Evaluation is a
//! pure function over a contact, the policy, and an injected `today`, so tests
//! never depend on the wall clock.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::contact::Contact;

/// Reserved interval meaning "never follow up regardless of elapsed time".
pub const NEVER: i64 = -1;

/// Status→interval policy plus the missing-date behavior flag.
#[derive(Debug, Clone)]
pub struct FollowUpPolicy {
    intervals: HashMap<String, i64>,
    /// Whether a contact with no last-contacted date counts as due.
    /// The source system flip-flopped on this across revisions, so it is an
    /// explicit configuration choice. Defaults to `true` (the permissive
    /// variant: never-contacted contacts are always due).
    missing_date_means_due: bool,
}

impl FollowUpPolicy {
    pub fn new(intervals: HashMap<String, i64>) -> Self {
        Self {
            intervals,
            missing_date_means_due: true,
        }
    }

    /// Override the missing-date behavior.
    pub fn with_missing_date_due(mut self, due: bool) -> Self {
        self.missing_date_means_due = due;
        self
    }

    pub fn missing_date_means_due(&self) -> bool {
        self.missing_date_means_due
    }

    /// Decide whether `contact` is due for outreach as of `today`.
    ///
    /// Rules, in order:
    /// 1. Status absent or not in the map → not due.
    /// 2. Mapped interval is [`NEVER`] → not due.
    /// 3. No last-contacted date → the configured `missing_date_means_due`.
    /// 4. Else due iff whole calendar days elapsed ≥ interval.
    ///
    /// An unparsable date fails closed (not due) rather than erroring.
    pub fn is_due(&self, contact: &Contact, today: NaiveDate) -> bool {
        let Some(status) = contact.status.as_deref() else {
            debug!(contact = contact.display_name(), "No status, skipping");
            return false;
        };

        let Some(&interval) = self.intervals.get(status) else {
            debug!(
                contact = contact.display_name(),
                status, "Status not in policy map, skipping"
            );
            return false;
        };

        if interval == NEVER {
            return false;
        }

        let Some(raw) = contact.date_last_contacted.as_deref() else {
            if self.missing_date_means_due {
                debug!(
                    contact = contact.display_name(),
                    "No last-contacted date, considering for follow-up"
                );
            }
            return self.missing_date_means_due;
        };

        let Some(last_contacted) = parse_calendar_date(raw) else {
            warn!(
                contact = contact.display_name(),
                date = raw,
                "Unparsable last-contacted date, skipping"
            );
            return false;
        };

        // Calendar-day difference, not elapsed seconds / 86400 — time-of-day
        // and DST shifts must not move the boundary.
        let elapsed = today.signed_duration_since(last_contacted).num_days();
        if elapsed >= interval {
            true
        } else {
            debug!(
                contact = contact.display_name(),
                elapsed, interval, "Contacted recently, no follow-up needed yet"
            );
            false
        }
    }
}

/// Parse the date portion of a table date value.
///
/// The table returns either a plain `YYYY-MM-DD` or a full RFC 3339 timestamp;
/// only the leading calendar date matters for the policy.
fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
