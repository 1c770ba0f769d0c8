//! Merge Resolver: folds one group of observations into a `CanonicalRecord`.
//!
//! Field policy:
//! - employer, contact person, position, address: first present value from
//!   oldest to newest (the original application carries the details)
//! - result: newest observation, verbatim
//! - first contact date: earliest real receive timestamp
//!
//! A missing job title falls through to the injected [`TitleResolver`].

use chrono::NaiveDateTime;

use crate::models::observation::Observation;
use crate::models::record::{CanonicalRecord, DATE_FORMAT};
use crate::reconcile::normalize::clean;
use crate::reconcile::title::TitleResolver;

/// Ordering position of an observation. `Sentinel` sorts before every real
/// timestamp and is never formatted as a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EffectiveTimestamp {
    Sentinel,
    Observed(NaiveDateTime),
}

impl EffectiveTimestamp {
    pub fn of(observation: &Observation) -> Self {
        match observation.observed_at {
            Some(ts) => EffectiveTimestamp::Observed(ts),
            None => EffectiveTimestamp::Sentinel,
        }
    }

    pub fn real(self) -> Option<NaiveDateTime> {
        match self {
            EffectiveTimestamp::Observed(ts) => Some(ts),
            EffectiveTimestamp::Sentinel => None,
        }
    }
}

/// Newest first by effective timestamp; equal timestamps keep input order.
fn newest_first<'a>(members: &[&'a Observation]) -> Vec<&'a Observation> {
    let mut sorted = members.to_vec();
    // stable, so ties stay in input order
    sorted.sort_by(|a, b| EffectiveTimestamp::of(b).cmp(&EffectiveTimestamp::of(a)));
    sorted
}

fn first_present<'a, F>(oldest_first: &[&'a Observation], field: F) -> Option<String>
where
    F: Fn(&'a Observation) -> Option<&'a str>,
{
    oldest_first.iter().find_map(|o| clean(field(*o)))
}

fn oldest_wins<'a, F>(oldest_first: &[&'a Observation], newest: &'a Observation, field: F) -> Option<String>
where
    F: Fn(&'a Observation) -> Option<&'a str> + Copy,
{
    first_present(oldest_first, field).or_else(|| clean(field(newest)))
}

fn earliest_real_timestamp(members: &[&Observation]) -> Option<NaiveDateTime> {
    members
        .iter()
        .filter_map(|o| EffectiveTimestamp::of(o).real())
        .min()
}

/// Merges one group into a canonical record.
///
/// # Panics
///
/// Panics if `members` is empty. Groups produced by
/// [`group`](crate::reconcile::grouping::group) never are.
pub fn merge(members: &[&Observation], titles: &dyn TitleResolver) -> CanonicalRecord {
    assert!(!members.is_empty(), "merge called on an empty group");

    let newest_first = newest_first(members);
    let oldest_first: Vec<&Observation> = newest_first.iter().rev().copied().collect();
    let latest = newest_first[0];

    let employer_name = oldest_wins(&oldest_first, latest, |o| o.employer_name.as_deref());
    let contact_person = oldest_wins(&oldest_first, latest, |o| o.contact_person.as_deref());
    let applied_position = oldest_wins(&oldest_first, latest, |o| o.applied_position.as_deref())
        .or_else(|| clean(titles.resolve_missing_title(employer_name.as_deref()).as_deref()));
    let postal_address = oldest_wins(&oldest_first, latest, |o| o.postal_address.as_deref());

    let first_contact_date =
        earliest_real_timestamp(members).map(|ts| ts.format(DATE_FORMAT).to_string());

    CanonicalRecord {
        employer_name,
        contact_person,
        applied_position,
        postal_address,
        result: latest.result,
        first_contact_date,
    }
}
