//! Credential and label set deltas
//!
//! Credentials requested at launch layer on top of the template's own. Only the
//! ones the template does not already carry count as an override.

use std::collections::{BTreeMap, BTreeSet};

use tarmac_core::domain::resource::Credential;
use uuid::Uuid;

/// Requested credentials not already assigned, compared by id
///
/// Keeps request order and drops duplicates.
pub fn credential_delta(assigned: &[Credential], requested: &[Credential]) -> Vec<Credential> {
    let mut seen: BTreeSet<Uuid> = assigned.iter().map(|c| c.id).collect();
    requested
        .iter()
        .filter(|c| seen.insert(c.id))
        .cloned()
        .collect()
}

/// Requested ids not already assigned
pub fn id_delta(assigned: &[Uuid], requested: &[Uuid]) -> Vec<Uuid> {
    let mut seen: BTreeSet<Uuid> = assigned.iter().copied().collect();
    requested.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Assigned credentials followed by the accepted delta
pub fn effective_credentials(assigned: &[Credential], accepted: &[Credential]) -> Vec<Credential> {
    let mut credentials = assigned.to_vec();
    credentials.extend(credential_delta(assigned, accepted));
    credentials
}

/// Password fields still needed once the supplied passwords are taken into account
///
/// Keeps the first occurrence of each field.
pub fn passwords_needed(
    credentials: &[Credential],
    supplied: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    credentials
        .iter()
        .flat_map(|c| c.passwords_needed.iter())
        .filter(|field| !supplied.contains_key(field.as_str()))
        .filter(|field| seen.insert(field.as_str()))
        .cloned()
        .collect()
}
