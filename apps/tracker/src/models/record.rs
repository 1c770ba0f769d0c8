use serde::{Deserialize, Serialize};

use crate::models::observation::Outcome;

/// Date pattern used for `first_contact_date` and everywhere a date is
/// printed in the report.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// The merged record representing one employer (optionally one role).
///
/// Created once per group by the merge step. The address enrichment pass may
/// fill `postal_address` afterwards if it is still absent; nothing else
/// changes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub employer_name: Option<String>,
    pub contact_person: Option<String>,
    pub applied_position: Option<String>,
    pub postal_address: Option<String>,
    pub result: Option<Outcome>,
    /// Earliest real receive date in the group, formatted with [`DATE_FORMAT`].
    pub first_contact_date: Option<String>,
}
