//! Repository reconciliation: which source repositories get mirrored, and
//! under what destination name.
//!
//! The allow-list (white list) has priority: when it is non-empty it is
//! processed in its own order and the deny-list is never consulted. With no
//! allow-list, the source catalog is walked in catalog order minus the
//! deny-list. Names are compared byte-for-byte.

use std::collections::HashMap;

use tracing::warn;

use crate::config::RunSpec;
use crate::error::{MirrorError, Result};
use crate::model::{Catalog, Repository};

/// One repository slated for mirroring in this run.
#[derive(Debug, Clone)]
pub struct SyncUnit {
    pub repo: Repository,
    pub dest_name: String,
    /// Position within the run, for `(index/total)` progress reporting.
    pub index: usize,
}

/// The filter policies applied during reconciliation.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    deny: Vec<String>,
    allow: Vec<String>,
    renames: HashMap<String, String>,
}

impl FilterSet {
    pub fn new(deny: Vec<String>, allow: Vec<String>, renames: HashMap<String, String>) -> Self {
        Self {
            deny,
            allow,
            renames,
        }
    }

    pub fn from_spec(spec: &RunSpec) -> Self {
        Self::new(
            spec.deny_list.clone(),
            spec.allow_list.clone(),
            spec.renames.clone(),
        )
    }

    fn is_denied(&self, name: &str) -> bool {
        self.deny.iter().any(|n| n == name)
    }

    /// Destination name for a source repository; identity when unmapped.
    /// Renames are not applied transitively.
    fn dest_name(&self, name: &str) -> String {
        self.renames.get(name).cloned().unwrap_or_else(|| name.to_string())
    }
}

/// Compute the ordered list of Sync Units for this run.
///
/// Fails with a configuration error when two source repositories resolve to
/// the same destination name; nothing is processed in that case.
pub fn plan(catalog: &Catalog, filters: &FilterSet) -> Result<Vec<SyncUnit>> {
    let mut units = Vec::new();

    if !filters.allow.is_empty() {
        let total = filters.allow.len();
        for (i, name) in filters.allow.iter().enumerate() {
            match catalog.get(name) {
                Some(repo) => units.push(SyncUnit {
                    repo: repo.clone(),
                    dest_name: filters.dest_name(name),
                    index: units.len(),
                }),
                // A white-listed repository missing from the source is a
                // skip notice, not an error.
                None => warn!(
                    "({}/{}) source repo {} not found in source catalog, skip.",
                    i + 1,
                    total,
                    name
                ),
            }
        }
    } else {
        let total = catalog.len();
        for (i, repo) in catalog.iter().enumerate() {
            if filters.is_denied(&repo.name) {
                warn!(
                    "({}/{}) source repo {} is in black-list, skip.",
                    i + 1,
                    total,
                    repo.name
                );
                continue;
            }
            units.push(SyncUnit {
                repo: repo.clone(),
                dest_name: filters.dest_name(&repo.name),
                index: units.len(),
            });
        }
    }

    verify_unique_destinations(&units)?;
    Ok(units)
}

/// Two distinct source repositories must never push to the same destination
/// name; that is a configuration error and fails the run up front.
fn verify_unique_destinations(units: &[SyncUnit]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(units.len());
    for unit in units {
        if let Some(first) = seen.insert(&unit.dest_name, &unit.repo.name) {
            return Err(MirrorError::config(format!(
                "destination name {} is assigned to both {} and {}",
                unit.dest_name, first, unit.repo.name
            )));
        }
    }
    Ok(())
}
