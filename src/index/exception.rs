// Exception Index
//
// Exact string lookup over call-specific records. Prefix-kind exceptions (the
// built-in KC4US block, for one) are matched by exact equality against
// truncations of the query, longest first. The same structure serves Clublog's
// zone exceptions and invalid operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::index::Ranked;
use crate::model::{Exception, ExceptionKind, InvalidOperation, Validity, ZoneException};

/// A record keyed by callsign with a validity window
pub trait CallRecord {
    fn call(&self) -> &str;
    fn validity(&self) -> &Validity;
    /// Matches calls that start with `call` rather than equal it
    fn is_prefix(&self) -> bool {
        false
    }
}

impl CallRecord for Exception {
    fn call(&self) -> &str {
        &self.call
    }
    fn validity(&self) -> &Validity {
        &self.validity
    }
    fn is_prefix(&self) -> bool {
        self.kind == ExceptionKind::Prefix
    }
}

impl CallRecord for ZoneException {
    fn call(&self) -> &str {
        &self.call
    }
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

impl CallRecord for InvalidOperation {
    fn call(&self) -> &str {
        &self.call
    }
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

#[derive(Debug)]
pub struct ExceptionIndex<T = Exception> {
    records: Vec<Ranked<T>>,
    exact: HashMap<String, Vec<usize>>,
    prefixed: HashMap<String, Vec<usize>>,
    longest_prefix: usize,
}

impl<T: CallRecord> ExceptionIndex<T> {
    pub fn build(records: Vec<Ranked<T>>) -> Self {
        let mut exact: HashMap<String, Vec<usize>> = HashMap::new();
        let mut prefixed: HashMap<String, Vec<usize>> = HashMap::new();
        let mut longest_prefix = 0;

        for (i, ranked) in records.iter().enumerate() {
            let call = ranked.record.call().to_string();
            if ranked.record.is_prefix() {
                longest_prefix = longest_prefix.max(call.len());
                prefixed.entry(call).or_default().push(i);
            } else {
                exact.entry(call).or_default().push(i);
            }
        }

        Self {
            records,
            exact,
            prefixed,
            longest_prefix,
        }
    }

    /// Build from plain records, all from one provider, in load order
    pub fn from_records(records: Vec<T>) -> Self {
        Self::build(Ranked::sequenced(records))
    }

    /// Best record for `call` valid at `at`; exact entries first, then
    /// prefix entries from the longest truncation down
    pub fn lookup(&self, call: &str, at: DateTime<Utc>) -> Option<&T> {
        self.lookup_ranked(call, at).map(|r| &r.record)
    }

    pub(crate) fn lookup_ranked(&self, call: &str, at: DateTime<Utc>) -> Option<&Ranked<T>> {
        if let Some(found) = self.exact.get(call).and_then(|ids| self.best(ids, at)) {
            return Some(found);
        }
        if self.prefixed.is_empty() {
            return None;
        }
        (1..=call.len().min(self.longest_prefix))
            .rev()
            .filter_map(|len| call.get(..len))
            .find_map(|head| self.prefixed.get(head).and_then(|ids| self.best(ids, at)))
    }

    fn best(&self, ids: &[usize], at: DateTime<Utc>) -> Option<&Ranked<T>> {
        ids.iter()
            .map(|&i| &self.records[i])
            .filter(|r| r.record.validity().contains(at))
            .max_by_key(|r| r.precedence())
    }

    /// Records listed for `call`, regardless of time
    pub fn entries(&self, call: &str) -> Vec<&T> {
        self.exact
            .get(call)
            .into_iter()
            .chain(self.prefixed.get(call))
            .flatten()
            .map(|&i| &self.records[i].record)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
