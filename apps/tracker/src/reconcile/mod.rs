// Record reconciliation: observations in, one ordered canonical record per employer out.
// Normalize -> group -> merge each group -> order. Synchronous and pure apart
// from the title hook.

pub mod grouping;
pub mod merge;
pub mod normalize;
pub mod ordering;
pub mod title;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::observation::Observation;
use crate::models::record::CanonicalRecord;
use crate::reconcile::grouping::group;
use crate::reconcile::merge::merge;
use crate::reconcile::ordering::order;
use crate::reconcile::title::TitleResolver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Split one employer into several records when the applied positions differ.
    pub include_role_in_key: bool,
}

/// Deduplicates, merges and orders extraction results.
pub fn reconcile(
    observations: &[Observation],
    options: ReconcileOptions,
    titles: &dyn TitleResolver,
) -> Vec<CanonicalRecord> {
    if observations.is_empty() {
        return Vec::new();
    }

    let groups = group(observations, options.include_role_in_key);
    debug!(
        "Grouped {} observations into {} groups",
        observations.len(),
        groups.len()
    );

    let merged: Vec<CanonicalRecord> = groups
        .iter()
        .map(|g| {
            debug!("Merging group {} ({} members)", g.key.employer, g.members.len());
            merge(&g.members, titles)
        })
        .collect();

    let ordered = order(merged);
    info!(
        "Reconciled {} observations into {} records",
        observations.len(),
        ordered.len()
    );
    ordered
}
