// Postal address resolution for merged records.
// Runs after reconciliation; only fills addresses that are still missing.

pub mod enrich;
pub mod resolver;
