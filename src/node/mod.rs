//! Implementation of the radix tree node and associated plumbing
//!
//! A node is a sorted list of labeled edges plus an optional value. Sibling
//! labels never share a first char, so the edge that can continue a key is
//! found by a binary search on the first char of the remaining key.
//!
//! All traversals use explicit loops or stacks, so deep trees do not grow
//! the call stack.
use std::{cell::RefCell, fmt::Debug, rc::Rc};

use log::trace;

use crate::util::common_prefix;

pub(crate) mod iterators;
#[cfg(test)]
mod tests;

/// Shared handle to a node.
///
/// Prefix views alias subtrees of the tree they were created from, so nodes
/// are reference counted and mutated through a [RefCell].
pub(crate) type NodeRef<V> = Rc<RefCell<Node<V>>>;

#[derive(Debug)]
pub(crate) struct Node<V> {
    value: Option<V>,
    /// edges, sorted by label. Labels are non-empty and have distinct first chars.
    children: Vec<(String, NodeRef<V>)>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: Vec::new(),
        }
    }
}

impl<V> Node<V> {
    pub fn empty() -> NodeRef<V> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// A node with a single edge, used for partial edge views
    pub fn single(label: String, child: NodeRef<V>) -> NodeRef<V> {
        debug_assert!(!label.is_empty());
        Rc::new(RefCell::new(Self {
            value: None,
            children: vec![(label, child)],
        }))
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> &mut Option<V> {
        &mut self.value
    }

    pub fn children(&self) -> &[(String, NodeRef<V>)] {
        &self.children
    }

    /// true if the node has neither a value nor children
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }

    /// Index of the edge sharing the first char of `key`, or the insertion point for a new edge
    fn search(&self, key: &str) -> Result<usize, usize> {
        let c = key.chars().next();
        self.children
            .binary_search_by(|(label, _)| label.chars().next().cmp(&c))
    }

    /// The edge whose label is a prefix of `key`, if any
    fn edge_for(&self, key: &str) -> Option<(&str, &NodeRef<V>)> {
        let index = self.search(key).ok()?;
        let (label, child) = &self.children[index];
        if key.starts_with(label.as_str()) {
            Some((label, child))
        } else {
            None
        }
    }

    /// The edge whose label starts with `key`, if any
    pub fn edge_extending(&self, key: &str) -> Option<(&str, &NodeRef<V>)> {
        let index = self.search(key).ok()?;
        let (label, child) = &self.children[index];
        if label.starts_with(key) {
            Some((label, child))
        } else {
            None
        }
    }

    fn remove_edge(&mut self, label: &str) -> Option<NodeRef<V>> {
        let index = self.search(label).ok()?;
        if self.children[index].0 == label {
            Some(self.children.remove(index).1)
        } else {
            None
        }
    }
}

/// Free the subtree with an explicit stack instead of the default recursive drop.
///
/// Children that are still referenced from elsewhere, e.g. by a view, are left alone.
impl<V> Drop for Node<V> {
    fn drop(&mut self) {
        let mut stack = self
            .children
            .drain(..)
            .map(|(_, child)| child)
            .collect::<Vec<_>>();
        while let Some(child) = stack.pop() {
            if let Ok(cell) = Rc::try_unwrap(child) {
                let mut node = cell.into_inner();
                stack.extend(node.children.drain(..).map(|(_, child)| child));
            }
        }
    }
}

/// One step of a path recorded by [track_down]
pub(crate) struct Step<V> {
    /// the node the step starts from
    pub node: NodeRef<V>,
    /// the matched edge label, or for the last step of a failed search the unmatched rest of the key
    pub label: String,
}

/// Result of [track_down]
pub(crate) struct Trail<V> {
    pub found: Option<NodeRef<V>>,
    pub path: Vec<Step<V>>,
}

/// Find the node at `key` below `node`
pub(crate) fn lookup<V>(node: &NodeRef<V>, key: &str) -> Option<NodeRef<V>> {
    let mut node = node.clone();
    let mut rest = key;
    while !rest.is_empty() {
        let child = {
            let current = node.borrow();
            let (label, child) = current.edge_for(rest)?;
            rest = &rest[label.len()..];
            child.clone()
        };
        node = child;
    }
    Some(node)
}

/// Like [lookup], but also record the path taken.
///
/// If the search fails, the last step holds the node where it stopped and the
/// unmatched rest of the key.
pub(crate) fn track_down<V>(node: &NodeRef<V>, key: &str) -> Trail<V> {
    let mut path = Vec::new();
    let mut node = node.clone();
    let mut rest = key;
    while !rest.is_empty() {
        let next = node
            .borrow()
            .edge_for(rest)
            .map(|(label, child)| (label.to_owned(), child.clone()));
        match next {
            Some((label, child)) => {
                rest = &rest[label.len()..];
                path.push(Step { node, label });
                node = child;
            }
            None => {
                path.push(Step {
                    node,
                    label: rest.to_owned(),
                });
                return Trail { found: None, path };
            }
        }
    }
    Trail {
        found: Some(node),
        path,
    }
}

/// Find or create the node at `key` below `node`, splitting edges as needed
pub(crate) fn create_path<V>(node: &NodeRef<V>, key: &str) -> NodeRef<V> {
    let mut node = node.clone();
    let mut rest = key;
    while !rest.is_empty() {
        let next = {
            let mut current = node.borrow_mut();
            match current.search(rest) {
                Ok(index) => {
                    let (label, child) = &current.children[index];
                    let n = common_prefix(label, rest);
                    if n == label.len() {
                        // label is a prefix of the key, descend
                        let child = child.clone();
                        rest = &rest[n..];
                        child
                    } else {
                        // split the edge at the common prefix
                        let (label, child) = current.children.remove(index);
                        trace!("splitting edge {:?} at {}", label, n);
                        let mid = Node::single(label[n..].to_owned(), child);
                        current
                            .children
                            .insert(index, (label[..n].to_owned(), mid.clone()));
                        rest = &rest[n..];
                        mid
                    }
                }
                Err(index) => {
                    let leaf = Node::empty();
                    current.children.insert(index, (rest.to_owned(), leaf.clone()));
                    return leaf;
                }
            }
        };
        node = next;
    }
    node
}

/// What is left below a node after its value was taken
enum Remaining<V> {
    Nothing,
    Single(String, NodeRef<V>),
    Branch,
}

/// Remove the value at `key` below `root`, restoring the node invariants
pub(crate) fn remove<V>(root: &NodeRef<V>, key: &str) -> Option<V> {
    let Trail { found, path } = track_down(root, key);
    let node = found?;
    let (value, remaining) = {
        let mut guard = node.borrow_mut();
        let value = guard.value.take()?;
        let remaining = match guard.children.as_slice() {
            [] => Remaining::Nothing,
            [(label, child)] => Remaining::Single(label.clone(), child.clone()),
            _ => Remaining::Branch,
        };
        (value, remaining)
    };
    match remaining {
        Remaining::Nothing => cleanup(&path),
        Remaining::Single(label, child) => merge(&path, &label, child),
        Remaining::Branch => {}
    }
    Some(value)
}

/// Prune the edge at the end of `path` and every ancestor edge that leads to an empty node.
///
/// Stops at the first ancestor that still holds something. If that ancestor is
/// left with a single child and no value, it is merged into its parent edge.
fn cleanup<V>(path: &[Step<V>]) {
    let mut depth = path.len();
    while depth > 0 {
        let Step { node, label } = &path[depth - 1];
        let remaining = {
            let mut guard = node.borrow_mut();
            guard.remove_edge(label);
            trace!("pruned edge {:?}", label);
            match (guard.value.is_some(), guard.children.as_slice()) {
                (false, []) => Remaining::Nothing,
                (false, [(label, child)]) => Remaining::Single(label.clone(), child.clone()),
                _ => Remaining::Branch,
            }
        };
        match remaining {
            Remaining::Nothing => depth -= 1,
            Remaining::Single(label, child) => {
                merge(&path[..depth - 1], &label, child);
                return;
            }
            Remaining::Branch => return,
        }
    }
}

/// Replace the edge at the end of `path` and the sole edge below it by one concatenated edge.
///
/// A path of length 0 means the node is the root, which is allowed to have a single child.
fn merge<V>(path: &[Step<V>], label: &str, child: NodeRef<V>) {
    if let Some(Step { node, label: parent }) = path.last() {
        let mut guard = node.borrow_mut();
        if let Ok(index) = guard.search(parent) {
            let merged = format!("{}{}", parent, label);
            trace!("merging edges {:?} and {:?}", parent, label);
            guard.children[index] = (merged, child);
        }
    }
}

/// Number of values below `node`, including its own
pub(crate) fn count<V>(node: &NodeRef<V>) -> usize {
    let mut count = 0;
    let mut stack = vec![node.clone()];
    while let Some(node) = stack.pop() {
        let node = node.borrow();
        if node.value.is_some() {
            count += 1;
        }
        stack.extend(node.children.iter().map(|(_, child)| child.clone()));
    }
    count
}

/// Largest key and its value below `node`, with keys starting at `prefix`
pub(crate) fn last_entry<V: Clone>(node: &NodeRef<V>, prefix: &str) -> Option<(String, V)> {
    // (key, node, expanded). Children of an expanded node have been pushed already,
    // so only its own value is left to check.
    let mut stack = vec![(prefix.to_owned(), node.clone(), false)];
    while let Some((key, node, expanded)) = stack.pop() {
        let guard = node.borrow();
        if expanded {
            if let Some(value) = &guard.value {
                return Some((key, value.clone()));
            }
            continue;
        }
        if guard.value.is_some() {
            stack.push((key.clone(), node.clone(), true));
        }
        for (label, child) in &guard.children {
            stack.push((format!("{}{}", key, label), child.clone(), false));
        }
    }
    None
}

/// Render the node structure, one edge per line, indented by depth
pub(crate) fn structure<V: Debug>(node: &NodeRef<V>) -> String {
    let mut res = String::new();
    let mut stack = Vec::new();
    {
        let root = node.borrow();
        if let Some(value) = &root.value {
            res.push_str(&format!(":{:?}\n", value));
        }
        for (label, child) in root.children.iter().rev() {
            stack.push((0usize, label.clone(), child.clone()));
        }
    }
    while let Some((depth, label, node)) = stack.pop() {
        let guard = node.borrow();
        let indent = "  ".repeat(depth);
        match &guard.value {
            Some(value) => res.push_str(&format!("{}{}:{:?}\n", indent, label, value)),
            None => res.push_str(&format!("{}{}\n", indent, label)),
        }
        for (label, child) in guard.children.iter().rev() {
            stack.push((depth + 1, label.clone(), child.clone()));
        }
    }
    res
}
