use chrono::NaiveDate;
use tracing::debug;

use crate::models::record::{CanonicalRecord, DATE_FORMAT};
use crate::reconcile::normalize::clean;

/// Parsed first-contact date. Absent and malformed both give `None`.
fn contact_date(record: &CanonicalRecord) -> Option<NaiveDate> {
    let text = clean(record.first_contact_date.as_deref())?;
    match NaiveDate::parse_from_str(&text, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Ignoring malformed first contact date '{text}': {e}");
            None
        }
    }
}

/// Final report order: dated records oldest first, then undated ones in
/// their input order. Stable.
pub fn order(mut records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    records.sort_by_cached_key(|r| match contact_date(r) {
        Some(date) => (0u8, Some(date)),
        None => (1u8, None),
    });
    records
}
