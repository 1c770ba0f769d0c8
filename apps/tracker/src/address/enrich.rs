use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::address::resolver::AddressError;
use crate::models::record::CanonicalRecord;
use crate::reconcile::normalize::clean;

/// Sources for a postal address, tried in declaration order.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn find_stored(&self, employer: &str) -> Result<Option<String>, AddressError>;
    async fn find_external(&self, employer: &str) -> Result<Option<String>, AddressError>;
    /// Asks the user and remembers the answer for later runs.
    async fn prompt_and_store(&self, employer: &str) -> Result<Option<String>, AddressError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub filled: usize,
    pub unresolved: usize,
    pub failed: usize,
}

async fn resolve(
    lookup: &dyn AddressLookup,
    employer: &str,
    interactive: bool,
) -> Result<Option<String>, AddressError> {
    if let Some(address) = clean(lookup.find_stored(employer).await?.as_deref()) {
        debug!("Address for '{employer}' found in manual store");
        return Ok(Some(address));
    }
    if let Some(address) = clean(lookup.find_external(employer).await?.as_deref()) {
        debug!("Address for '{employer}' found in company register");
        return Ok(Some(address));
    }
    if interactive {
        return Ok(clean(lookup.prompt_and_store(employer).await?.as_deref()));
    }
    Ok(None)
}

/// Fills `postal_address` on records that name an employer but have no address yet.
///
/// A lookup error leaves that record untouched and moves on.
pub async fn enrich_missing_addresses(
    records: &mut [CanonicalRecord],
    lookup: &dyn AddressLookup,
    interactive: bool,
) -> EnrichSummary {
    let mut summary = EnrichSummary::default();

    for record in records.iter_mut() {
        let Some(employer) = clean(record.employer_name.as_deref()) else {
            continue;
        };
        if clean(record.postal_address.as_deref()).is_some() {
            continue;
        }

        match resolve(lookup, &employer, interactive).await {
            Ok(Some(address)) => {
                record.postal_address = Some(address);
                summary.filled += 1;
            }
            Ok(None) => summary.unresolved += 1,
            Err(e) => {
                warn!("Address lookup for '{employer}' failed: {e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "Address enrichment: {} filled, {} unresolved, {} failed",
        summary.filled, summary.unresolved, summary.failed
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeLookup {
        stored: HashMap<&'static str, &'static str>,
        external: HashMap<&'static str, &'static str>,
        prompted: HashMap<&'static str, &'static str>,
        broken: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeLookup {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, source: &str, employer: &str) -> Result<(), AddressError> {
            self.calls.lock().unwrap().push(format!("{source}:{employer}"));
            if self.broken == Some(employer) {
                return Err(AddressError::Prompt("store offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AddressLookup for FakeLookup {
        async fn find_stored(&self, employer: &str) -> Result<Option<String>, AddressError> {
            self.record("stored", employer)?;
            Ok(self.stored.get(employer).map(|s| s.to_string()))
        }

        async fn find_external(&self, employer: &str) -> Result<Option<String>, AddressError> {
            self.record("external", employer)?;
            Ok(self.external.get(employer).map(|s| s.to_string()))
        }

        async fn prompt_and_store(&self, employer: &str) -> Result<Option<String>, AddressError> {
            self.record("prompt", employer)?;
            Ok(self.prompted.get(employer).map(|s| s.to_string()))
        }
    }

    fn rec(employer: Option<&str>, address: Option<&str>) -> CanonicalRecord {
        CanonicalRecord {
            employer_name: employer.map(str::to_string),
            postal_address: address.map(str::to_string),
            ..CanonicalRecord::default()
        }
    }

    #[tokio::test]
    async fn test_stored_wins_and_stops_chain() {
        let lookup = FakeLookup {
            stored: HashMap::from([("ABC GmbH", "Main St 1, 12345 Berlin")]),
            external: HashMap::from([("ABC GmbH", "ignored")]),
            ..FakeLookup::default()
        };
        let mut records = vec![rec(Some("ABC GmbH"), None)];

        let summary = enrich_missing_addresses(&mut records, &lookup, true).await;

        assert_eq!(records[0].postal_address.as_deref(), Some("Main St 1, 12345 Berlin"));
        assert_eq!(lookup.calls(), vec!["stored:ABC GmbH"]);
        assert_eq!(summary.filled, 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_external_then_prompt() {
        let lookup = FakeLookup {
            external: HashMap::from([("XYZ AG", "  Registerweg 5, 80331 München ")]),
            prompted: HashMap::from([("New Co", "Typed St 3, 11111 Köln")]),
            ..FakeLookup::default()
        };
        let mut records = vec![rec(Some("XYZ AG"), None), rec(Some("New Co"), None)];

        enrich_missing_addresses(&mut records, &lookup, true).await;

        assert_eq!(
            records[0].postal_address.as_deref(),
            Some("Registerweg 5, 80331 München")
        );
        assert_eq!(records[1].postal_address.as_deref(), Some("Typed St 3, 11111 Köln"));
        assert_eq!(
            lookup.calls(),
            vec![
                "stored:XYZ AG",
                "external:XYZ AG",
                "stored:New Co",
                "external:New Co",
                "prompt:New Co"
            ]
        );
    }

    #[tokio::test]
    async fn test_non_interactive_never_prompts() {
        let lookup = FakeLookup {
            prompted: HashMap::from([("New Co", "Typed St 3, 11111 Köln")]),
            ..FakeLookup::default()
        };
        let mut records = vec![rec(Some("New Co"), None)];

        let summary = enrich_missing_addresses(&mut records, &lookup, false).await;

        assert_eq!(records[0].postal_address, None);
        assert!(!lookup.calls().iter().any(|c| c.starts_with("prompt")));
        assert_eq!(summary.unresolved, 1);
    }

    #[tokio::test]
    async fn test_skips_records_without_employer_or_with_address() {
        let lookup = FakeLookup::default();
        let mut records = vec![
            rec(None, None),
            rec(Some("   "), None),
            rec(Some("ABC GmbH"), Some("Main St 1, 12345 Berlin")),
        ];

        let summary = enrich_missing_addresses(&mut records, &lookup, true).await;

        assert!(lookup.calls().is_empty());
        assert_eq!(summary, EnrichSummary::default());
        assert_eq!(records[2].postal_address.as_deref(), Some("Main St 1, 12345 Berlin"));
    }

    #[tokio::test]
    async fn test_lookup_error_leaves_record_untouched() {
        let lookup = FakeLookup {
            stored: HashMap::from([("Fine GmbH", "Ok St 1, 22222 Bonn")]),
            broken: Some("Broken AG"),
            ..FakeLookup::default()
        };
        let mut records = vec![
            CanonicalRecord {
                contact_person: Some("Erika Musterfrau".to_string()),
                ..rec(Some("Broken AG"), None)
            },
            rec(Some("Fine GmbH"), None),
        ];

        let summary = enrich_missing_addresses(&mut records, &lookup, true).await;

        assert_eq!(records[0].postal_address, None);
        assert_eq!(records[0].contact_person.as_deref(), Some("Erika Musterfrau"));
        assert_eq!(records[1].postal_address.as_deref(), Some("Ok St 1, 22222 Bonn"));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.filled, 1);
    }

    #[tokio::test]
    async fn test_employer_name_is_trimmed_before_lookup() {
        let lookup = FakeLookup {
            stored: HashMap::from([("ABC GmbH", "Main St 1, 12345 Berlin")]),
            ..FakeLookup::default()
        };
        let mut records = vec![rec(Some("  ABC GmbH "), None)];

        enrich_missing_addresses(&mut records, &lookup, true).await;

        assert_eq!(lookup.calls(), vec!["stored:ABC GmbH"]);
        assert!(records[0].postal_address.is_some());
    }
}
