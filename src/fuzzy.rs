//! Approximate lookup by bounded Levenshtein distance.
//!
//! The search walks the tree with an explicit stack. For every edge it runs a
//! small bounded edit distance search between the rest of the query and the
//! edge label, and only descends into the child for the query positions that
//! can be reached within the remaining budget. Subtrees that are too far away
//! from the query are never visited.
use std::collections::HashMap;

use log::debug;

use crate::node::NodeRef;

/// A key found by [RadixTree::fuzzy_get](crate::RadixTree::fuzzy_get)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch<V> {
    pub key: String,
    pub value: V,
    /// Levenshtein distance between the query and the key
    pub distance: usize,
}

struct State<V> {
    node: NodeRef<V>,
    distance: usize,
    key: String,
    /// number of query chars consumed
    position: usize,
}

/// Find all values below `root` whose key is within `max_distance` edits of `query`.
///
/// Keys are matched relative to `root`, and reported with `prefix` prepended.
/// The result is sorted by distance, then by key.
pub(crate) fn fuzzy_search<V: Clone>(
    root: &NodeRef<V>,
    prefix: &str,
    query: &str,
    max_distance: usize,
) -> Vec<FuzzyMatch<V>> {
    let query: Vec<char> = query.chars().collect();
    let mut memo = Memo::default();
    let mut results: HashMap<String, (V, usize)> = HashMap::new();
    let mut stack = vec![State {
        node: root.clone(),
        distance: 0,
        key: prefix.to_owned(),
        position: 0,
    }];
    let mut visited = 0usize;
    while let Some(State {
        node,
        distance,
        key,
        position,
    }) = stack.pop()
    {
        visited += 1;
        let node = node.borrow();
        if let Some(value) = node.value() {
            // unmatched trailing query chars are deletions
            let total = distance + (query.len() - position);
            if total <= max_distance {
                results
                    .entry(key.clone())
                    .and_modify(|best| best.1 = best.1.min(total))
                    .or_insert_with(|| (value.clone(), total));
            }
        }
        for (label, child) in node.children() {
            let chars: Vec<char> = label.chars().collect();
            for (extra, position) in
                memo.within_distance(&query, &chars, max_distance - distance, position)
            {
                stack.push(State {
                    node: child.clone(),
                    distance: distance + extra,
                    key: format!("{}{}", key, label),
                    position,
                });
            }
        }
    }
    let mut results = results
        .into_iter()
        .map(|(key, (value, distance))| FuzzyMatch {
            key,
            value,
            distance,
        })
        .collect::<Vec<_>>();
    results.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.key.cmp(&b.key)));
    debug!(
        "fuzzy search visited {} nodes, found {} matches within {}",
        visited,
        results.len(),
        max_distance
    );
    results
}

/// Scratch space for [Memo::within_distance], reused across edges
#[derive(Default)]
struct Memo {
    /// minimum distance per (query position, label position), row major by query position
    table: Vec<usize>,
    stack: Vec<(usize, usize, usize)>,
}

impl Memo {
    /// All ways to consume the whole `label`, starting at query position `start`, with at most `budget` edits.
    ///
    /// Returns (edits, query position after the label) pairs, with the minimum edits per position.
    fn within_distance(
        &mut self,
        query: &[char],
        label: &[char],
        budget: usize,
        start: usize,
    ) -> Vec<(usize, usize)> {
        let rows = query.len() - start + 1;
        let cols = label.len() + 1;
        self.table.clear();
        self.table.resize(rows * cols, usize::MAX);
        let table = &mut self.table;
        let index = |ia: usize, ib: usize| (ia - start) * cols + ib;
        self.stack.clear();
        self.stack.push((0, start, 0));
        while let Some((distance, ia, ib)) = self.stack.pop() {
            let best = &mut table[index(ia, ib)];
            if *best <= distance {
                // dominated by an earlier visit
                continue;
            }
            *best = distance;
            if ib == label.len() {
                continue;
            }
            if ia < query.len() && query[ia] == label[ib] {
                // a match is never worse than any edit
                self.stack.push((distance, ia + 1, ib + 1));
                continue;
            }
            if distance >= budget {
                continue;
            }
            // label char missing from the query
            self.stack.push((distance + 1, ia, ib + 1));
            if ia < query.len() {
                // extra query char
                self.stack.push((distance + 1, ia + 1, ib));
                // substitution
                self.stack.push((distance + 1, ia + 1, ib + 1));
            }
        }
        (start..=query.len())
            .filter_map(|ia| {
                let distance = table[index(ia, label.len())];
                (distance != usize::MAX).then(|| (distance, ia))
            })
            .collect()
    }
}
