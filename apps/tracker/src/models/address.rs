use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An address the user entered by hand, stored in the manual address DB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ManualPostalAddress {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl ManualPostalAddress {
    /// `"<street>, <postal_code> <city>"`
    pub fn to_one_line(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}
