//! Natural identity of a regulation: `(title, created_at, external_link)`.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::regulation::NewRegulation;

/// Deduplication key. Equality is exact: no case folding or trimming, and a
/// missing link is distinct from an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DedupKey {
    pub title: String,
    pub created_at: NaiveDate,
    pub external_link: Option<String>,
}

impl DedupKey {
    pub fn of(regulation: &NewRegulation) -> Self {
        Self {
            title: regulation.title.clone(),
            created_at: regulation.created_at,
            external_link: regulation.external_link.clone(),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = self.external_link.as_deref().unwrap_or("<null>");
        write!(f, "{} | {} | {}", self.title, self.created_at, link)
    }
}

/// Indices of records whose key already appeared earlier in the batch.
///
/// The first occurrence of each key is not reported.
pub fn repeated_in_batch(regulations: &[NewRegulation]) -> Vec<usize> {
    let mut first_seen: HashMap<DedupKey, usize> = HashMap::new();
    let mut repeated = Vec::new();
    for (index, regulation) in regulations.iter().enumerate() {
        let key = DedupKey::of(regulation);
        if first_seen.contains_key(&key) {
            repeated.push(index);
        } else {
            first_seen.insert(key, index);
        }
    }
    repeated
}
