//! Mail source: a JSON export of the mailbox plus the subject/date filter
//! the mailbox search would apply.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::models::mail::{MailItem, NO_CONTENT};

/// Which mails count as application correspondence.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Subject keywords, OR-ed, case-insensitive. Empty matches everything.
    pub terms: Vec<String>,
    pub since: Option<NaiveDate>,
}

impl SearchFilter {
    pub fn matches(&self, item: &MailItem) -> bool {
        self.matches_subject(&item.subject) && self.matches_date(item)
    }

    fn matches_subject(&self, subject: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let subject = subject.to_lowercase();
        self.terms
            .iter()
            .any(|term| subject.contains(&term.to_lowercase()))
    }

    /// Compares the local receive date, the same date the report prints.
    /// Mails without a receive time are kept; there is nothing to compare.
    fn matches_date(&self, item: &MailItem) -> bool {
        match (self.since, item.received_local()) {
            (Some(since), Some(received)) => received.date() >= since,
            _ => true,
        }
    }
}

/// Reads a JSON array of mails. Blank bodies are replaced by `(no content)`.
pub fn load_mail_export(path: &Path) -> Result<Vec<MailItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mail export {}", path.display()))?;
    let mut items: Vec<MailItem> = serde_json::from_str(&raw)
        .with_context(|| format!("Mail export {} is not a JSON list of mails", path.display()))?;

    for item in &mut items {
        let body = item.body.trim();
        item.body = if body.is_empty() {
            NO_CONTENT.to_string()
        } else {
            body.to_string()
        };
    }

    info!("Loaded {} mails from {}", items.len(), path.display());
    Ok(items)
}

/// Loads the export and keeps the mails the filter accepts, in export order.
pub fn fetch_mails(path: &Path, filter: &SearchFilter) -> Result<Vec<MailItem>> {
    let items = load_mail_export(path)?;
    let total = items.len();
    let matching: Vec<MailItem> = items.into_iter().filter(|m| filter.matches(m)).collect();
    info!("{} of {} mails match the search filter", matching.len(), total);
    Ok(matching)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Local, TimeZone};
    use std::io::Write;

    fn mail(subject: &str, received_at: Option<&str>) -> MailItem {
        MailItem {
            msg_id: 1,
            sender: "hr@example.com".to_string(),
            subject: subject.to_string(),
            msg_date: String::new(),
            body: "Hello".to_string(),
            received_at: received_at
                .map(|s| DateTime::<FixedOffset>::parse_from_rfc3339(s).unwrap()),
        }
    }

    fn filter(terms: &[&str], since: Option<(i32, u32, u32)>) -> SearchFilter {
        SearchFilter {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            since: since.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
        }
    }

    #[test]
    fn test_subject_terms_are_ored_case_insensitive() {
        let f = filter(&["bewerbung", "application"], None);
        assert!(f.matches(&mail("Ihre BEWERBUNG bei ABC", None)));
        assert!(f.matches(&mail("Your Application", None)));
        assert!(!f.matches(&mail("Newsletter", None)));
    }

    #[test]
    fn test_no_terms_matches_everything() {
        assert!(filter(&[], None).matches(&mail("anything", None)));
    }

    #[test]
    fn test_since_filters_by_day() {
        let f = filter(&[], Some((2026, 1, 5)));
        assert!(f.matches(&mail("x", Some("2026-01-06T12:00:00+01:00"))));
        assert!(!f.matches(&mail("x", Some("2026-01-03T12:00:00+01:00"))));
        assert!(f.matches(&mail("x", None)));
    }

    #[test]
    fn test_since_is_inclusive() {
        let f = filter(&[], Some((2026, 1, 5)));
        let at = |h: u32, m: u32, day: u32| {
            let mut item = mail("x", None);
            item.received_at = Some(
                Local
                    .with_ymd_and_hms(2026, 1, day, h, m, 0)
                    .single()
                    .unwrap()
                    .fixed_offset(),
            );
            item
        };
        assert!(f.matches(&at(0, 30, 5)));
        assert!(!f.matches(&at(23, 59, 4)));
    }

    #[test]
    fn test_since_uses_local_receive_date() {
        // Near midnight the sender's offset and the local clock can disagree
        // on the day; the filter must agree with the date the report prints.
        for raw in ["2026-01-04T23:30:00-11:00", "2026-01-05T00:30:00+14:00"] {
            let item = mail("x", Some(raw));
            let local_day = item.received_local().unwrap().date();
            let f = filter(&[], Some((2026, 1, 5)));
            assert_eq!(
                f.matches(&item),
                local_day >= NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_load_mail_export_fills_blank_bodies() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"msg_id": 1, "sender": "a", "subject": "Bewerbung", "msg_date": "d", "body": "  Hi  ", "received_at": "2026-01-06T09:00:00+01:00"}},
                {{"msg_id": 2, "subject": "Application", "body": "   "}}
            ]"#
        )
        .unwrap();

        let items = load_mail_export(file.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].body, "Hi");
        assert!(items[0].received_at.is_some());
        assert_eq!(items[1].body, NO_CONTENT);
        assert_eq!(items[1].received_at, None);
    }

    #[test]
    fn test_load_mail_export_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"not\": \"a list\"}}").unwrap();
        assert!(load_mail_export(file.path()).is_err());
    }

    #[test]
    fn test_fetch_mails_filters_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"msg_id": 1, "subject": "Bewerbung A"}},
                {{"msg_id": 2, "subject": "Spam"}},
                {{"msg_id": 3, "subject": "application B"}}
            ]"#
        )
        .unwrap();

        let items = fetch_mails(file.path(), &filter(&["bewerbung", "application"], None)).unwrap();
        let ids: Vec<u64> = items.iter().map(|m| m.msg_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
