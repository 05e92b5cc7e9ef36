use super::NodeRef;

/// A node on the iteration stack, together with the position of the next child to visit
struct Frame<V> {
    /// length of the edge label that led to this node, to be popped from the key when done
    label_len: usize,
    node: NodeRef<V>,
    next: usize,
}

/// Iterator over keys and values of a [RadixTree](crate::RadixTree), in key order
///
/// The keys are constructed as the tree is traversed. Therefore iteration is slightly more expensive than
/// iterating over just values using [Values]
pub struct Iter<V> {
    path: String,
    stack: Vec<Frame<V>>,
    /// the root, until its own value has been looked at
    root: Option<NodeRef<V>>,
}

impl<V: Clone> Iter<V> {
    pub(crate) fn new(root: NodeRef<V>, prefix: &str) -> Self {
        Self {
            path: prefix.to_owned(),
            stack: Vec::new(),
            root: Some(root),
        }
    }
}

impl<V: Clone> Iterator for Iter<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            let value = root.borrow().value().cloned();
            self.stack.push(Frame {
                label_len: 0,
                node: root,
                next: 0,
            });
            if let Some(value) = value {
                return Some((self.path.clone(), value));
            }
        }
        while let Some(frame) = self.stack.last_mut() {
            let child = {
                let node = frame.node.borrow();
                node.children().get(frame.next).map(|(label, child)| {
                    self.path.push_str(label);
                    (label.len(), child.clone())
                })
            };
            match child {
                Some((label_len, node)) => {
                    frame.next += 1;
                    let value = node.borrow().value().cloned();
                    self.stack.push(Frame {
                        label_len,
                        node,
                        next: 0,
                    });
                    if let Some(value) = value {
                        return Some((self.path.clone(), value));
                    }
                }
                None => {
                    let label_len = frame.label_len;
                    self.stack.pop();
                    self.path.truncate(self.path.len() - label_len);
                }
            }
        }
        None
    }
}

/// Iterator over the keys of a [RadixTree](crate::RadixTree), in key order
pub struct Keys<V>(pub(crate) Iter<V>);

impl<V: Clone> Iterator for Keys<V> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, _)| key)
    }
}

/// Iterator over all tree values, in key order
///
/// This is more efficient than the key value pair iterator since it does not have to keep track of the keys.
pub struct Values<V> {
    /// nodes still to visit, in reverse order
    stack: Vec<NodeRef<V>>,
}

impl<V: Clone> Values<V> {
    pub(crate) fn new(root: NodeRef<V>) -> Self {
        Self { stack: vec![root] }
    }
}

impl<V: Clone> Iterator for Values<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            let node = node.borrow();
            self.stack
                .extend(node.children().iter().rev().map(|(_, child)| child.clone()));
            if let Some(value) = node.value() {
                return Some(value.clone());
            }
        }
        None
    }
}
