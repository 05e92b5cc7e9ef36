use std::{
    cell::Cell,
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    rc::Rc,
};

use log::debug;

use crate::{
    error::{Error, Result},
    fuzzy::{fuzzy_search, FuzzyMatch},
    node::{
        self,
        iterators::{Iter, Keys, Values},
        Node, NodeRef, Trail,
    },
};

/// A string keyed map, stored as a radix tree.
///
/// A tree can also be a view of a part of another tree, created with
/// [RadixTree::at_prefix]. Views share storage with the tree they were created
/// from, so mutations through one are visible through the other.
///
/// Point operations ([get](Self::get), [set](Self::set), [delete](Self::delete), ...)
/// take keys relative to the view. Everything that yields keys yields full keys,
/// starting with the [prefix](Self::prefix) of the view.
pub struct RadixTree<V> {
    root: NodeRef<V>,
    /// concatenation of all edge labels from the true root to `root`
    prefix: String,
    /// bumped by every mutation of any view sharing storage with this one
    epoch: Rc<Cell<u64>>,
    /// (epoch, size) of the last size computation
    size: Cell<Option<(u64, usize)>>,
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RadixTree<V> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::view(Node::empty(), String::new(), Rc::new(Cell::new(0)))
    }

    fn view(root: NodeRef<V>, prefix: String, epoch: Rc<Cell<u64>>) -> Self {
        Self {
            root,
            prefix,
            epoch,
            size: Cell::new(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_root(root: NodeRef<V>) -> Self {
        Self::view(root, String::new(), Rc::new(Cell::new(0)))
    }

    /// The logical prefix of this view. Empty for a tree that is not a view.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn invalidate(&self) {
        self.epoch.set(self.epoch.get().wrapping_add(1));
    }

    /// True if `key` has a value
    pub fn has(&self, key: &str) -> bool {
        node::lookup(&self.root, key).map_or(false, |node| {
            let node = node.borrow();
            node.value().is_some()
        })
    }

    /// True if at least one key in the view starts with `prefix`
    pub fn has_prefix(&self, prefix: &str) -> bool {
        match node::track_down(&self.root, prefix) {
            Trail {
                found: Some(node), ..
            } => node::count(&node) > 0,
            Trail { path, .. } => path.last().map_or(false, |step| {
                step.node
                    .borrow()
                    .edge_extending(&step.label)
                    .map_or(false, |(_, child)| node::count(child) > 0)
            }),
        }
    }

    /// True if there are no values in the view
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Set the value for `key`, replacing the previous value if any
    pub fn set(&mut self, key: &str, value: V) -> &mut Self {
        let node = node::create_path(&self.root, key);
        *node.borrow_mut().value_mut() = Some(value);
        self.invalidate();
        self
    }

    /// Like [set](Self::set), but takes the key as bytes
    ///
    /// Fails with [Error::InvalidKeyType] if the key is not a utf8 string.
    pub fn try_set(&mut self, key: impl AsRef<[u8]>, value: V) -> Result<&mut Self> {
        let key = as_str(key.as_ref())?;
        Ok(self.set(key, value))
    }

    /// Set the value for `key` to the result of applying `f` to the previous value
    ///
    /// The previous value is removed from the tree while `f` runs, so if `f`
    /// panics the entry stays removed.
    pub fn update(&mut self, key: &str, f: impl FnOnce(Option<V>) -> V) -> &mut Self {
        // no borrow must be held while calling f, it might look at this tree
        let previous = self.remove(key);
        let value = f(previous);
        self.set(key, value)
    }

    /// Like [update](Self::update), but takes the key as bytes
    ///
    /// Fails with [Error::InvalidKeyType] if the key is not a utf8 string.
    pub fn try_update(
        &mut self,
        key: impl AsRef<[u8]>,
        f: impl FnOnce(Option<V>) -> V,
    ) -> Result<&mut Self> {
        let key = as_str(key.as_ref())?;
        Ok(self.update(key, f))
    }

    /// Remove the value for `key` and return it
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let res = node::remove(&self.root, key);
        if res.is_some() {
            self.invalidate();
        }
        res
    }

    /// Remove the value for `key`. Returns true if there was a value.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key).is_some()
    }

    /// Remove all values in the view.
    ///
    /// The root is reset in place, so the subtree is also cleared in every
    /// tree or view that shares it.
    pub fn clear(&mut self) {
        *self.root.borrow_mut() = Node::default();
        self.invalidate();
    }

    /// Number of values in the view.
    ///
    /// This is cached until the next mutation of any related view.
    pub fn size(&self) -> usize {
        let epoch = self.epoch.get();
        match self.size.get() {
            Some((cached, size)) if cached == epoch => size,
            _ => {
                let size = node::count(&self.root);
                debug!("recomputed size {} of view {:?}", size, self.prefix);
                self.size.set(Some((epoch, size)));
                size
            }
        }
    }

    /// A view of all keys starting with `prefix`.
    ///
    /// `prefix` is a full key prefix, so it must start with the prefix of this view.
    /// Existing nodes are shared with this tree. If `prefix` ends inside an edge,
    /// the view gets a fresh root with a single edge to the shared node below.
    pub fn at_prefix(&self, prefix: &str) -> Result<RadixTree<V>> {
        let rest = prefix
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| Error::PrefixMismatch {
                requested: prefix.to_owned(),
                prefix: self.prefix.clone(),
            })?;
        let root = match node::track_down(&self.root, rest) {
            Trail {
                found: Some(node), ..
            } => node,
            Trail { path, .. } => path
                .last()
                .and_then(|step| {
                    let node = step.node.borrow();
                    let (label, child) = node.edge_extending(&step.label)?;
                    debug!(
                        "synthesizing view node for {:?} inside edge {:?}",
                        prefix, label
                    );
                    Some(Node::single(
                        label[step.label.len()..].to_owned(),
                        child.clone(),
                    ))
                })
                .unwrap_or_else(Node::empty),
        };
        Ok(Self::view(root, prefix.to_owned(), self.epoch.clone()))
    }

    /// Print the node structure to the log, at debug level
    pub fn dump_tree(&self)
    where
        V: Debug,
    {
        debug!("tree at {:?}\n{}", self.prefix, self.structure());
    }

    /// The node structure, one edge per line, indented by depth
    pub fn structure(&self) -> String
    where
        V: Debug,
    {
        node::structure(&self.root)
    }
}

impl<V: Clone> RadixTree<V> {
    /// Get the value for `key`
    pub fn get(&self, key: &str) -> Option<V> {
        let node = node::lookup(&self.root, key)?;
        let node = node.borrow();
        node.value().cloned()
    }

    /// Iterate over all (key, value) pairs in key order
    pub fn entries(&self) -> Iter<V> {
        Iter::new(self.root.clone(), &self.prefix)
    }

    /// Same as [entries](Self::entries)
    pub fn iter(&self) -> Iter<V> {
        self.entries()
    }

    /// Iterate over all keys in order
    pub fn keys(&self) -> Keys<V> {
        Keys(self.entries())
    }

    /// Iterate over all values, in key order
    pub fn values(&self) -> Values<V> {
        Values::new(self.root.clone())
    }

    /// Call `f` for every (key, value) pair in key order
    pub fn for_each(&self, mut f: impl FnMut(&str, V)) {
        for (key, value) in self.entries() {
            f(&key, value);
        }
    }

    /// The entry with the smallest key
    pub fn first_entry(&self) -> Option<(String, V)> {
        self.entries().next()
    }

    /// The entry with the largest key
    pub fn last_entry(&self) -> Option<(String, V)> {
        node::last_entry(&self.root, &self.prefix)
    }

    /// All entries whose key is within `max_distance` edits of `query`, closest first.
    ///
    /// In a view, the query is matched against the part of the keys below the view.
    pub fn fuzzy_get(&self, query: &str, max_distance: usize) -> Vec<FuzzyMatch<V>> {
        fuzzy_search(&self.root, &self.prefix, query, max_distance)
    }
}

impl RadixTree<bool> {
    /// Store `true` at `key`
    pub fn insert_flag(&mut self, key: &str) -> &mut Self {
        self.set(key, true)
    }
}

fn as_str(key: &[u8]) -> Result<&str> {
    std::str::from_utf8(key).map_err(|cause| Error::invalid_key(key, cause))
}

impl<V: Clone + Debug> Debug for RadixTree<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

impl<'a, V: Clone> IntoIterator for &'a RadixTree<V> {
    type Item = (String, V);
    type IntoIter = Iter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K: AsRef<str>, V> Extend<(K, V)> for RadixTree<V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.set(key.as_ref(), value);
        }
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for RadixTree<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = RadixTree::new();
        tree.extend(iter);
        tree
    }
}

impl<V> From<BTreeMap<String, V>> for RadixTree<V> {
    fn from(map: BTreeMap<String, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<V> From<HashMap<String, V>> for RadixTree<V> {
    fn from(map: HashMap<String, V>) -> Self {
        map.into_iter().collect()
    }
}
