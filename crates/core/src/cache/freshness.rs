//! Freshness evaluation for cached records.
//!
//! The capture time is read from the stored response's own `Date` header at
//! the moment of the check. A missing or unparseable header means the record
//! is not fresh.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::record::ResponseRecord;

/// When the record was captured, as far as its `Date` header says.
pub fn captured_at(record: &ResponseRecord) -> Option<DateTime<Utc>> {
    record.date()
}

/// Whether `now - captured < max_age` (strict).
pub fn is_fresh(record: &ResponseRecord, max_age: Duration, now: DateTime<Utc>) -> bool {
    let Some(captured) = captured_at(record) else {
        return false;
    };
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return true;
    };
    now.signed_duration_since(captured) < max_age
}
