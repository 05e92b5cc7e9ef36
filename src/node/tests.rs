use proptest::prelude::*;
use std::collections::BTreeMap;

use super::{iterators::Iter, *};

fn arb_key() -> impl Strategy<Value = String> {
    proptest::strategy::Union::new_weighted(vec![
        (10, "[abcä]{0,6}"),
        (1, "[ab]{16,20}"),
    ])
}

fn arb_tree_contents() -> impl Strategy<Value = BTreeMap<String, u32>> {
    proptest::collection::btree_map(arb_key(), any::<u32>(), 0..20)
}

fn mk_node(contents: &BTreeMap<String, u32>) -> NodeRef<u32> {
    let root = Node::empty();
    for (key, value) in contents {
        *create_path(&root, key).borrow_mut().value_mut() = Some(*value);
    }
    root
}

fn to_btree_map(root: &NodeRef<u32>) -> BTreeMap<String, u32> {
    Iter::new(root.clone(), "").collect()
}

/// Check that sibling labels are sorted and share no prefix, and that no
/// node below the root is empty or a single child without a value.
fn check_invariants<V>(root: &NodeRef<V>) {
    let mut stack = vec![(root.clone(), true)];
    while let Some((node, is_root)) = stack.pop() {
        let node = node.borrow();
        if !is_root {
            assert!(
                node.value().is_some() || node.children().len() >= 2,
                "degenerate node below {:?}",
                node.children().iter().map(|(l, _)| l).collect::<Vec<_>>()
            );
        }
        for (label, _) in node.children() {
            assert!(!label.is_empty(), "empty edge label");
        }
        for pair in node.children().windows(2) {
            let (a, b) = (&pair[0].0, &pair[1].0);
            assert!(a < b, "labels not sorted: {:?} {:?}", a, b);
            assert_eq!(
                common_prefix(a, b),
                0,
                "labels share a prefix: {:?} {:?}",
                a,
                b
            );
        }
        for (_, child) in node.children() {
            stack.push((child.clone(), false));
        }
    }
}

fn scenario() -> NodeRef<u32> {
    mk_node(&btreemap! {
        "romane".to_owned() => 1,
        "romanus".to_owned() => 2,
        "romulus".to_owned() => 3,
        "rubens".to_owned() => 4,
        "ruber".to_owned() => 5,
    })
}

#[test]
fn insert_splits_edges() {
    let root = scenario();
    check_invariants(&root);
    assert_eq!(
        structure(&root),
        "r\n  om\n    an\n      e:1\n      us:2\n    ulus:3\n  ube\n    ns:4\n    r:5\n"
    );
}

#[test]
fn insertion_order_does_not_matter() {
    let entries = [
        ("ruber", 5),
        ("romulus", 3),
        ("rubens", 4),
        ("romanus", 2),
        ("romane", 1),
    ];
    let root = Node::empty();
    for (key, value) in entries {
        *create_path(&root, key).borrow_mut().value_mut() = Some(value);
    }
    check_invariants(&root);
    assert_eq!(structure(&root), structure(&scenario()));
}

#[test]
fn create_path_on_prefix_of_edge() {
    let root = mk_node(&btreemap! { "abcd".to_owned() => 1 });
    let node = create_path(&root, "ab");
    assert!(node.borrow().value().is_none());
    assert_eq!(structure(&root), "ab\n  cd:1\n");
    // existing node is returned, not split again
    assert!(Rc::ptr_eq(&node, &create_path(&root, "ab")));
}

#[test]
fn lookup_and_track_down() {
    let root = scenario();
    let node = lookup(&root, "romanus").unwrap();
    assert_eq!(node.borrow().value(), Some(&2));
    // inner node without value
    assert!(lookup(&root, "roman").is_some());
    // ends inside an edge
    assert!(lookup(&root, "roma").is_none());
    assert!(lookup(&root, "x").is_none());

    let trail = track_down(&root, "romanus");
    assert!(trail.found.is_some());
    let labels = trail.path.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["r", "om", "an", "us"]);

    let trail = track_down(&root, "romax");
    assert!(trail.found.is_none());
    let labels = trail.path.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["r", "om", "ax"]);
}

#[test]
fn remove_merges_single_child() {
    let root = scenario();
    assert_eq!(remove(&root, "romane"), Some(1));
    check_invariants(&root);
    assert_eq!(
        structure(&root),
        "r\n  om\n    anus:2\n    ulus:3\n  ube\n    ns:4\n    r:5\n"
    );
}

#[test]
fn remove_prefix_key_keeps_branch() {
    let root = mk_node(&btreemap! {
        "a".to_owned() => 1,
        "ab".to_owned() => 2,
        "ac".to_owned() => 3,
    });
    assert_eq!(remove(&root, "a"), Some(1));
    check_invariants(&root);
    assert_eq!(structure(&root), "a\n  b:2\n  c:3\n");
}

#[test]
fn remove_prefix_key_merges() {
    let root = mk_node(&btreemap! {
        "x".to_owned() => 0,
        "a".to_owned() => 1,
        "abc".to_owned() => 2,
    });
    assert_eq!(remove(&root, "a"), Some(1));
    check_invariants(&root);
    assert_eq!(structure(&root), "abc:2\nx:0\n");
}

#[test]
fn remove_prunes_empty_chain() {
    let root = mk_node(&btreemap! { "abc".to_owned() => 1 });
    assert_eq!(remove(&root, "abc"), Some(1));
    assert!(root.borrow().is_empty());
    assert_eq!(remove(&root, "abc"), None);
}

#[test]
fn remove_missing_is_noop() {
    let root = scenario();
    let before = structure(&root);
    assert_eq!(remove(&root, "rom"), None);
    assert_eq!(remove(&root, "romanes"), None);
    assert_eq!(remove(&root, "q"), None);
    assert_eq!(structure(&root), before);
}

#[test]
fn remove_root_value() {
    let root = mk_node(&btreemap! { "".to_owned() => 0, "a".to_owned() => 1 });
    assert_eq!(remove(&root, ""), Some(0));
    // the root may keep a single child
    assert_eq!(structure(&root), "a:1\n");
}

#[test]
fn count_and_last_entry() {
    let root = scenario();
    assert_eq!(count(&root), 5);
    assert_eq!(last_entry(&root, ""), Some(("ruber".to_owned(), 5)));
    assert_eq!(last_entry(&root, "x"), Some(("xruber".to_owned(), 5)));
    assert_eq!(last_entry(&Node::<u32>::empty(), ""), None);
    let root = mk_node(&btreemap! { "".to_owned() => 0 });
    assert_eq!(last_entry(&root, ""), Some(("".to_owned(), 0)));
}

proptest! {
    #[test]
    fn btreemap_tree_roundtrip(x in arb_tree_contents()) {
        let reference = x;
        let root = mk_node(&reference);
        check_invariants(&root);
        let actual = to_btree_map(&root);
        prop_assert_eq!(count(&root), reference.len());
        prop_assert_eq!(reference, actual);
    }

    #[test]
    fn remove_keeps_invariants(x in arb_tree_contents(), mask in any::<u32>()) {
        let mut reference = x;
        let root = mk_node(&reference);
        let removed = reference
            .keys()
            .enumerate()
            .filter(|(i, _)| mask & (1 << (i % 32)) != 0)
            .map(|(_, k)| k.clone())
            .collect::<Vec<_>>();
        for key in removed {
            let expected = reference.remove(&key);
            prop_assert_eq!(remove(&root, &key), expected);
            check_invariants(&root);
        }
        prop_assert_eq!(to_btree_map(&root), reference);
    }

    #[test]
    fn last_entry_is_max(x in arb_tree_contents()) {
        let root = mk_node(&x);
        let expected = x.iter().next_back().map(|(k, v)| (k.clone(), *v));
        prop_assert_eq!(last_entry(&root, ""), expected);
    }
}
