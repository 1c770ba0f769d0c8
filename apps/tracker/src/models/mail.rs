use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Body text used when a message has nothing readable.
pub const NO_CONTENT: &str = "(no content)";

/// One fetched email in the simplified shape the pipeline works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailItem {
    pub msg_id: u64,
    /// Decoded `From` header.
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    /// Decoded `Date` header, kept verbatim for the model prompt.
    #[serde(default)]
    pub msg_date: String,
    #[serde(default)]
    pub body: String,
    /// Server-side receive time, if the mailbox reported one.
    #[serde(default)]
    pub received_at: Option<DateTime<FixedOffset>>,
}

impl MailItem {
    /// Receive time as local wall-clock time, which is what report dates use.
    pub fn received_local(&self) -> Option<NaiveDateTime> {
        self.received_at
            .map(|ts| ts.with_timezone(&Local).naive_local())
    }
}
