use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Outcome label the extraction model assigns to an application email.
/// The labels are the German terms used in the official report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Clear rejection.
    #[serde(rename = "Absage")]
    Rejection,
    /// Explicit invitation to an interview, meeting or call.
    #[serde(rename = "Einladung")]
    Invitation,
    /// Everything else: confirmations of receipt, status updates.
    #[serde(rename = "Zwischenstand")]
    InProgress,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Rejection, Outcome::Invitation, Outcome::InProgress];

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Rejection => "Absage",
            Outcome::Invitation => "Einladung",
            Outcome::InProgress => "Zwischenstand",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown outcome label '{0}'")]
pub struct UnknownOutcome(pub String);

impl FromStr for Outcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Outcome::ALL
            .into_iter()
            .find(|o| o.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownOutcome(trimmed.to_string()))
    }
}

/// One extraction result from a single email.
///
/// Produced once by the extractor and only read afterwards; reconciliation
/// builds new `CanonicalRecord`s instead of touching these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub employer_name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub applied_position: Option<String>,
    #[serde(default)]
    pub postal_address: Option<String>,
    #[serde(default)]
    pub result: Option<Outcome>,
    /// When the email was received. `None` is a valid state, not an error.
    #[serde(default)]
    pub observed_at: Option<NaiveDateTime>,
}

impl Observation {
    /// An observation carrying nothing but the receive timestamp.
    /// This is what a failed extraction produces.
    pub fn empty(observed_at: Option<NaiveDateTime>) -> Self {
        Self {
            observed_at,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.employer_name.is_none()
            && self.contact_person.is_none()
            && self.applied_position.is_none()
            && self.postal_address.is_none()
            && self.result.is_none()
    }
}
