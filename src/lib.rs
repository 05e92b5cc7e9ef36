//! A string keyed map stored as a radix tree.
//!
//! Besides the usual map operations, the tree supports cheap views of all
//! keys with a common prefix, and approximate lookup of all keys within a
//! bounded Levenshtein distance of a query.
//!
//! ```
//! use radixmap::RadixTree;
//!
//! let mut tree = RadixTree::new();
//! tree.set("romane", 1).set("romanus", 2).set("romulus", 3);
//! assert_eq!(tree.get("romanus"), Some(2));
//!
//! let view = tree.at_prefix("roman").unwrap();
//! assert_eq!(view.keys().collect::<Vec<_>>(), vec!["romane", "romanus"]);
//!
//! let matches = tree.fuzzy_get("romanes", 1);
//! assert_eq!(matches[0].key, "romane");
//! ```
//!
//! The tree is not thread safe. Views share nodes through reference counted
//! cells, so a tree and its views can only be used from a single thread.
mod error;
mod fuzzy;
mod node;
mod tree;
mod util;

pub use error::{Error, Result};
pub use fuzzy::FuzzyMatch;
pub use node::iterators::{Iter, Keys, Values};
pub use tree::RadixTree;
pub use util::Hex;

#[cfg(test)]
#[macro_use]
extern crate maplit;


/// Create a [RadixTree] from a list of `key => value` pairs
///
/// ```
/// let tree = radixmap::radixtree! { "a" => 1, "ab" => 2 };
/// assert_eq!(tree.size(), 2);
/// ```
#[macro_export]
macro_rules! radixtree {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut tree = $crate::RadixTree::new();
        $(
            tree.set($key, $value);
        )*
        tree
    }};
}
