// Lookup indices over canonical records
//
// Both indices are built once per reference-data generation and are read-only
// afterwards. Records carry the two tie-break inputs that do not live on the
// record itself: provider rank and load sequence.

pub mod exception;
pub mod prefix;

pub use exception::{CallRecord, ExceptionIndex};
pub use prefix::PrefixIndex;

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// A record plus its position in the tie-break order
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub record: T,
    /// Position of the record's provider in the priority list; lower wins
    pub provider_rank: usize,
    /// Load order; higher (more recently added) wins
    pub sequence: usize,
}

impl<T> Ranked<T> {
    pub fn new(record: T, provider_rank: usize, sequence: usize) -> Self {
        Self {
            record,
            provider_rank,
            sequence,
        }
    }

    /// Wrap records in load order with a single provider rank
    pub fn sequenced(records: impl IntoIterator<Item = T>) -> Vec<Self> {
        records
            .into_iter()
            .enumerate()
            .map(|(sequence, record)| Ranked::new(record, 0, sequence))
            .collect()
    }

    /// Tail of every tie-break key: better provider, then most recent
    pub(crate) fn precedence(&self) -> (Reverse<usize>, usize) {
        (Reverse(self.provider_rank), self.sequence)
    }
}

/// Configured provider order used to break ties between equal candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderPriority {
    order: Vec<String>,
}

impl ProviderPriority {
    pub fn new<S: AsRef<str>>(order: &[S]) -> Self {
        let mut seen = BTreeSet::new();
        Self {
            order: order
                .iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| seen.insert(p.clone()))
                .collect(),
        }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Rank for every provider in `present`. Listed providers keep their
    /// position; unlisted ones follow in name order.
    pub fn ranks<'a>(&self, present: impl IntoIterator<Item = &'a str>) -> HashMap<String, usize> {
        let mut ranks: HashMap<String, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        let unlisted: BTreeSet<&str> = present.into_iter().filter(|p| !ranks.contains_key(*p)).collect();
        for (i, p) in unlisted.into_iter().enumerate() {
            ranks.insert(p.to_string(), self.order.len() + i);
        }
        ranks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ranks() {
        let priority = ProviderPriority::new(&["clublog_xml", "cty_dat", "clublog_xml"]);
        assert_eq!(priority.order().len(), 2);

        let ranks = priority.ranks(["zeta", "cty_dat", "alpha"]);
        assert_eq!(ranks["clublog_xml"], 0);
        assert_eq!(ranks["cty_dat"], 1);
        assert_eq!(ranks["alpha"], 2);
        assert_eq!(ranks["zeta"], 3);
    }

    #[test]
    fn test_precedence_prefers_rank_then_sequence() {
        let a = Ranked::new((), 0, 1);
        let b = Ranked::new((), 1, 5);
        let c = Ranked::new((), 0, 2);
        assert!(a.precedence() > b.precedence());
        assert!(c.precedence() > a.precedence());
    }
}
