// Prefix Index
//
// Trie over pattern atoms. A node's children are keyed by atom, so a walk for
// one input character follows at most four edges: the literal plus the three
// character classes. Rules hang off the node where their pattern ends.
//
// lookup_best walks every path the input can take, keeps going after a match
// in case a longer rule exists, and returns the greatest valid candidate by
// (specificity, literal count, primary, provider rank, sequence).

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::index::Ranked;
use crate::model::{Atom, PrefixRule};

const CLASSES: [Atom; 3] = [Atom::Digit, Atom::Letter, Atom::Any];

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<Atom, usize>,
    rules: Vec<usize>,
}

/// Longest-match index over prefix rules
#[derive(Debug)]
pub struct PrefixIndex {
    nodes: Vec<Node>,
    rules: Vec<Ranked<PrefixRule>>,
}

type Key = (usize, usize, bool, Reverse<usize>, usize);

impl PrefixIndex {
    pub fn build(rules: Vec<Ranked<PrefixRule>>) -> Self {
        let mut nodes = vec![Node::default()];
        let mut kept = Vec::with_capacity(rules.len());

        for ranked in rules {
            if ranked.record.pattern.is_empty() {
                log::warn!("prefix index: ignoring empty pattern from {}", ranked.record.provider);
                continue;
            }
            let mut node = 0;
            for atom in ranked.record.pattern.atoms() {
                node = match nodes[node].children.get(atom) {
                    Some(&child) => child,
                    None => {
                        nodes.push(Node::default());
                        let child = nodes.len() - 1;
                        nodes[node].children.insert(*atom, child);
                        child
                    }
                };
            }
            nodes[node].rules.push(kept.len());
            kept.push(ranked);
        }

        log::debug!("prefix index: {} rules in {} nodes", kept.len(), nodes.len());
        Self { nodes, rules: kept }
    }

    /// Build from plain rules, all from one provider, in load order
    pub fn from_rules(rules: Vec<PrefixRule>) -> Self {
        Self::build(Ranked::sequenced(rules))
    }

    /// Most specific rule matching the start of `text` and valid at `at`
    pub fn lookup_best(&self, text: &str, at: DateTime<Utc>) -> Option<&PrefixRule> {
        self.lookup_ranked(text, at).map(|r| &r.record)
    }

    pub(crate) fn lookup_ranked(&self, text: &str, at: DateTime<Utc>) -> Option<&Ranked<PrefixRule>> {
        let chars: Vec<char> = text.chars().collect();
        let mut best: Option<(Key, &Ranked<PrefixRule>)> = None;
        let mut stack = vec![(0usize, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            for &i in &self.nodes[node].rules {
                let ranked = &self.rules[i];
                if !ranked.record.validity.contains(at) {
                    continue;
                }
                let candidate = key(ranked);
                if best.as_ref().map_or(true, |(k, _)| candidate > *k) {
                    best = Some((candidate, ranked));
                }
            }

            let Some(&c) = chars.get(depth) else {
                continue;
            };
            let children = &self.nodes[node].children;
            if let Some(&child) = children.get(&Atom::Literal(c)) {
                stack.push((child, depth + 1));
            }
            for class in CLASSES {
                if class.matches(c) {
                    if let Some(&child) = children.get(&class) {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }

        if let Some((_, ranked)) = &best {
            log::trace!("prefix {} -> {} ({})", text, ranked.record.pattern, ranked.record.adif);
        }
        best.map(|(_, ranked)| ranked)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn key(ranked: &Ranked<PrefixRule>) -> Key {
    let (rank, sequence) = ranked.precedence();
    let pattern = &ranked.record.pattern;
    (pattern.specificity(), pattern.literal_count(), ranked.record.primary, rank, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Overrides, Pattern, Validity};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn rule(pattern: Pattern, adif: u16) -> PrefixRule {
        PrefixRule {
            pattern,
            adif,
            overrides: Overrides::default(),
            validity: Validity::ALWAYS,
            primary: false,
            provider: "test".to_string(),
        }
    }

    #[test]
    fn test_longest_match_wins() {
        let index = PrefixIndex::from_rules(vec![
            rule(Pattern::literal("DL"), 230),
            rule(Pattern::literal("DL1"), 1),
        ]);
        let now = date(2024, 1, 1);
        assert_eq!(index.lookup_best("DL1ABC", now).map(|r| r.adif), Some(1));
        assert_eq!(index.lookup_best("DL2ABC", now).map(|r| r.adif), Some(230));
        assert_eq!(index.lookup_best("DA1ABC", now), None);
    }

    #[test]
    fn test_validity_window_filters() {
        let mut old = rule(Pattern::literal("Y2"), 229);
        old.validity = Validity::new(Some(date(2000, 1, 1)), Some(date(2010, 1, 1))).unwrap();
        let index = PrefixIndex::from_rules(vec![rule(Pattern::literal("Y"), 1), old]);

        assert_eq!(index.lookup_best("Y21ABC", date(2005, 6, 1)).map(|r| r.adif), Some(229));
        assert_eq!(index.lookup_best("Y21ABC", date(2015, 6, 1)).map(|r| r.adif), Some(1));
    }

    #[test]
    fn test_wildcards() {
        let index = PrefixIndex::from_rules(vec![
            rule(Pattern::literal("KG"), 291),
            rule(Pattern::with_wildcards("KG4@@"), 105),
            rule(Pattern::literal("KG4AA"), 7),
        ]);
        let now = date(2024, 1, 1);
        assert_eq!(index.lookup_best("KG4AB", now).map(|r| r.adif), Some(105));
        // A literal beats a wildcard of the same length
        assert_eq!(index.lookup_best("KG4AA", now).map(|r| r.adif), Some(7));
        assert_eq!(index.lookup_best("KG4ABC", now).map(|r| r.adif), Some(105));
        assert_eq!(index.lookup_best("KG41B", now).map(|r| r.adif), Some(291));
    }

    #[test]
    fn test_tie_break() {
        let mut primary = rule(Pattern::literal("UA"), 54);
        primary.primary = true;
        let index = PrefixIndex::build(vec![
            Ranked::new(rule(Pattern::literal("UA"), 15), 0, 1),
            Ranked::new(primary, 1, 0),
            Ranked::new(rule(Pattern::literal("R"), 100), 1, 2),
            Ranked::new(rule(Pattern::literal("R"), 101), 0, 3),
            Ranked::new(rule(Pattern::literal("R"), 102), 0, 4),
        ]);
        let now = date(2024, 1, 1);
        assert_eq!(index.lookup_best("UA3AB", now).map(|r| r.adif), Some(54));
        // Same provider rank: most recently added wins
        assert_eq!(index.lookup_best("R3AB", now).map(|r| r.adif), Some(102));
    }

    #[test]
    fn test_empty_pattern_ignored() {
        let index = PrefixIndex::from_rules(vec![rule(Pattern::literal(""), 1)]);
        assert!(index.is_empty());
        assert_eq!(index.lookup_best("DL1AB", date(2024, 1, 1)), None);
    }
}
