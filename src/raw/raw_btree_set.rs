use core::borrow::Borrow;

use alloc::vec::Vec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, SearchResult};

/// The tree-mutation engine backing `BTreeSet`.
///
/// All structural work is local to a node and its immediate parent and
/// siblings, reached through the per-node parent handle, and propagates
/// upward only while the parent itself overflows (insert) or underflows
/// (remove). The root node exists for the tree's entire lifetime; an empty
/// tree is a root leaf with zero keys.
pub(crate) struct RawBTreeSet<K, const M: usize> {
    /// Arena storing every node of the tree.
    nodes: Arena<Node<K>>,
    /// Handle to the root node. Replaced only by a root split or a root
    /// collapse.
    root: Handle,
    /// Number of keys in the tree.
    len: usize,
}

impl<K, const M: usize> RawBTreeSet<K, M> {
    /// Most keys a node may hold at rest.
    pub(crate) const MAX_KEYS: usize = 2 * M;
    /// Most children a node may hold at rest.
    pub(crate) const MAX_CHILDREN: usize = 2 * M + 1;

    pub(crate) fn new() -> Self {
        // Enforced at monomorphization: a bad degree is a compile error.
        const {
            assert!(M >= 1, "minimum degree must be at least 1");
            assert!(2 * M < usize::MAX / 2 - 1, "minimum degree is too large for index arithmetic");
        }

        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::new_leaf());
        Self {
            nodes,
            root,
            len: 0,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::new_leaf());
        self.len = 0;
    }

    pub(crate) fn root_handle(&self) -> Handle {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    /// Number of live nodes; exposed for structural assertions in tests.
    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<K: Ord, const M: usize> RawBTreeSet<K, M> {
    /// Root-to-leaf descent. Returns the node holding `key` and the key's
    /// index within it.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                SearchResult::Found(index) => return Some((current, index)),
                SearchResult::NotFound(index) => {
                    if node.is_leaf() {
                        return None;
                    }
                    current = node.child(index);
                }
            }
        }
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).is_some()
    }

    /// Returns the smallest key.
    pub(crate) fn first(&self) -> Option<&K> {
        if self.len == 0 {
            return None;
        }
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return Some(node.key(0));
            }
            current = node.child(0);
        }
    }

    /// Returns the largest key.
    pub(crate) fn last(&self) -> Option<&K> {
        if self.len == 0 {
            return None;
        }
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return Some(node.key(node.key_count() - 1));
            }
            current = node.child(node.child_count() - 1);
        }
    }

    /// Inserts `key`, or hands it back unchanged if an equal key is already
    /// present. The duplicate check happens during the descent, before any
    /// mutation.
    pub(crate) fn insert(&mut self, key: K) -> Result<(), K> {
        let mut current = self.root;
        let insert_at = loop {
            let node = self.nodes.get(current);
            match node.search(&key) {
                SearchResult::Found(_) => return Err(key),
                SearchResult::NotFound(index) => {
                    if node.is_leaf() {
                        break index;
                    }
                    current = node.child(index);
                }
            }
        };

        self.nodes.get_mut(current).insert_key(insert_at, key);
        self.len += 1;

        if self.nodes.get(current).key_count() > Self::MAX_KEYS {
            self.split(current);
        }
        Ok(())
    }

    /// Splits an overflowed node about its lower median and pushes the
    /// median into the parent, continuing upward while the parent overflows
    /// in turn. A root split grows the tree by one level.
    fn split(&mut self, mut handle: Handle) {
        loop {
            let node = self.nodes.get_mut(handle);
            debug_assert!(node.key_count() == Self::MAX_KEYS + 1, "`split()` - node has not overflowed!");

            let parent = node.parent();
            let index = node.index_in_parent();
            let (median, upper) = node.split_off_upper(M);

            let right = self.nodes.alloc(upper);
            self.relink_children(right, 0);

            match parent {
                None => {
                    let grown = self.nodes.alloc(Node::new_branch(median, handle, right));
                    self.relink_children(grown, 0);
                    self.root = grown;
                    return;
                }
                Some(parent) => {
                    let parent_node = self.nodes.get_mut(parent);
                    parent_node.insert_key(index, median);
                    parent_node.insert_child(index + 1, right);
                    self.relink_children(parent, index + 1);

                    if self.nodes.get(parent).key_count() <= Self::MAX_KEYS {
                        return;
                    }
                    handle = parent;
                }
            }
        }
    }

    /// Removes `key` if present. Keys found in internal nodes are replaced
    /// by their in-order successor; the leaf that gave the successor up is
    /// rebalanced if it fell below minimum occupancy.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                SearchResult::Found(index) => {
                    if node.is_leaf() {
                        self.nodes.get_mut(current).remove_key(index);
                        self.restore_leaf(current);
                    } else {
                        self.replace_with_successor(current, index);
                    }
                    self.len -= 1;
                    return true;
                }
                SearchResult::NotFound(index) => {
                    if node.is_leaf() {
                        return false;
                    }
                    current = node.child(index);
                }
            }
        }
    }

    /// Removes and returns the smallest key.
    pub(crate) fn pop_first(&mut self) -> Option<K> {
        if self.len == 0 {
            return None;
        }
        let mut current = self.root;
        while !self.nodes.get(current).is_leaf() {
            current = self.nodes.get(current).child(0);
        }
        let key = self.nodes.get_mut(current).remove_key(0);
        self.restore_leaf(current);
        self.len -= 1;
        Some(key)
    }

    /// Removes and returns the largest key.
    pub(crate) fn pop_last(&mut self) -> Option<K> {
        if self.len == 0 {
            return None;
        }
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                break;
            }
            current = node.child(node.child_count() - 1);
        }
        let node = self.nodes.get_mut(current);
        let key = node.remove_key(node.key_count() - 1);
        self.restore_leaf(current);
        self.len -= 1;
        Some(key)
    }

    /// Overwrites the key at `handle[index]` with the smallest key of its
    /// right subtree, taking that key out of its leaf.
    fn replace_with_successor(&mut self, handle: Handle, index: usize) {
        let mut leaf = self.nodes.get(handle).child(index + 1);
        while !self.nodes.get(leaf).is_leaf() {
            leaf = self.nodes.get(leaf).child(0);
        }

        let successor = self.nodes.get_mut(leaf).remove_key(0);
        self.nodes.get_mut(handle).replace_key(index, successor);
        self.restore_leaf(leaf);
    }

    /// Rebalances a leaf that may have dropped below minimum occupancy after
    /// losing a key. The root leaf is exempt; it may shrink to zero keys.
    fn restore_leaf(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        if node.key_count() < M && !node.is_root() {
            self.rebalance_leaf(handle);
        }
    }

    /// Leaf underflow repair: borrow from the left sibling, else from the
    /// right, else merge across the nearest separator.
    fn rebalance_leaf(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        debug_assert!(node.is_leaf() && !node.is_root(), "`rebalance_leaf()` - not a non-root leaf!");
        debug_assert!(node.key_count() + 1 == M);

        let parent = node.parent().expect("`rebalance_leaf()` - node has no parent!");
        let index = node.index_in_parent();
        let sibling_count = self.nodes.get(parent).child_count();

        if index > 0 {
            let left = self.nodes.get(parent).child(index - 1);
            if self.nodes.get(left).key_count() > M {
                // Rotate through the separator on the left: the separator
                // moves down to this node's front, the left sibling's
                // largest key moves up into the separator slot.
                let lent = self.nodes.get_mut(left).pop_key();
                let separator = self.nodes.get_mut(parent).replace_key(index - 1, lent);
                self.nodes.get_mut(handle).insert_key(0, separator);
                return;
            }
        }

        if index + 1 < sibling_count {
            let right = self.nodes.get(parent).child(index + 1);
            if self.nodes.get(right).key_count() > M {
                // Mirror image: separator moves down to this node's back,
                // the right sibling's smallest key moves up.
                let lent = self.nodes.get_mut(right).remove_key(0);
                let separator = self.nodes.get_mut(parent).replace_key(index, lent);
                self.nodes.get_mut(handle).push_key(separator);
                return;
            }
        }

        // Neither sibling can lend; fold two siblings into one. The left
        // member of the pair always absorbs the right one.
        if index > 0 {
            let left = self.nodes.get(parent).child(index - 1);
            self.merge_right(left);
        } else {
            self.merge_right(handle);
        }
    }

    /// Internal-node underflow repair. Same priority order as the leaf case,
    /// but every borrowed key drags the adjacent child pointer with it.
    fn rebalance_internal(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        debug_assert!(!node.is_leaf() && !node.is_root(), "`rebalance_internal()` - not a non-root internal node!");
        debug_assert!(node.key_count() + 1 == M);

        let parent = node.parent().expect("`rebalance_internal()` - node has no parent!");
        let index = node.index_in_parent();
        let sibling_count = self.nodes.get(parent).child_count();

        if index > 0 {
            let left = self.nodes.get(parent).child(index - 1);
            if self.nodes.get(left).key_count() > M {
                let left_node = self.nodes.get_mut(left);
                let lent_key = left_node.pop_key();
                let lent_child = left_node.pop_child();
                let separator = self.nodes.get_mut(parent).replace_key(index - 1, lent_key);

                let node = self.nodes.get_mut(handle);
                node.insert_key(0, separator);
                node.insert_child(0, lent_child);
                self.relink_children(handle, 0);
                return;
            }
        }

        if index + 1 < sibling_count {
            let right = self.nodes.get(parent).child(index + 1);
            if self.nodes.get(right).key_count() > M {
                let right_node = self.nodes.get_mut(right);
                let lent_key = right_node.remove_key(0);
                let lent_child = right_node.remove_child(0);
                self.relink_children(right, 0);
                let separator = self.nodes.get_mut(parent).replace_key(index, lent_key);

                let node = self.nodes.get_mut(handle);
                node.push_key(separator);
                node.push_child(lent_child);
                let last = self.nodes.get(handle).child_count() - 1;
                self.relink_children(handle, last);
                return;
            }
        }

        if index > 0 {
            let left = self.nodes.get(parent).child(index - 1);
            self.merge_right(left);
        } else {
            self.merge_right(handle);
        }
    }

    /// Folds `left`'s right sibling (and the separator between them) into
    /// `left`. Works for leaves and internal nodes alike: a leaf merge is
    /// the childless case.
    ///
    /// The parent loses one key and one child. If that empties a root, the
    /// merged node becomes the new root and the tree shrinks by one level;
    /// if it underflows a non-root parent, repair continues there.
    fn merge_right(&mut self, left: Handle) {
        let (parent, left_index) = {
            let node = self.nodes.get(left);
            (node.parent().expect("`merge_right()` - node has no parent!"), node.index_in_parent())
        };

        let parent_node = self.nodes.get_mut(parent);
        let separator = parent_node.remove_key(left_index);
        let right = parent_node.remove_child(left_index + 1);
        self.relink_children(parent, left_index + 1);

        let absorbed = self.nodes.take(right);
        let left_node = self.nodes.get_mut(left);
        let first_absorbed_child = left_node.child_count();
        left_node.merge_with_right(separator, absorbed);
        self.relink_children(left, first_absorbed_child);

        let parent_node = self.nodes.get(parent);
        if parent_node.is_root() {
            if parent_node.key_count() == 0 {
                // The merged node is the root's sole remaining child.
                debug_assert!(parent_node.child_count() == 1);
                self.nodes.free(parent);
                self.nodes.get_mut(left).set_parent(None, 0);
                self.root = left;
            }
        } else if parent_node.key_count() < M {
            self.rebalance_internal(parent);
        }
    }

    /// Rewrites the parent/index back-references of `handle`'s children from
    /// position `from` onward. Called after any edit that shifts a child
    /// list or moves children between nodes.
    fn relink_children(&mut self, handle: Handle, from: usize) {
        let mut index = from;
        while index < self.nodes.get(handle).child_count() {
            let child = self.nodes.get(handle).child(index);
            self.nodes.get_mut(child).set_parent(Some(handle), index);
            index += 1;
        }
    }

    /// Consumes the tree into an ascending vector of its keys.
    pub(crate) fn into_sorted_vec(mut self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len);
        self.drain_subtree(self.root, &mut keys);
        keys
    }

    fn drain_subtree(&mut self, handle: Handle, out: &mut Vec<K>) {
        let (keys, children) = self.nodes.take(handle).into_parts();
        if children.is_empty() {
            out.extend(keys);
            return;
        }

        let mut keys = keys.into_iter();
        let mut children = children.into_iter();
        let first = children.next().expect("`drain_subtree()` - internal node has no children!");
        self.drain_subtree(first, out);
        for child in children {
            out.push(keys.next().expect("`drain_subtree()` - key/child counts disagree!"));
            self.drain_subtree(child, out);
        }
    }
}

impl<K: Clone, const M: usize> Clone for RawBTreeSet<K, M> {
    /// Deep copy: every node is rebuilt in a fresh arena, parents before
    /// children, so all back-references land on the new handles.
    fn clone(&self) -> Self {
        fn clone_subtree<K: Clone>(
            source: &Arena<Node<K>>,
            target: &mut Arena<Node<K>>,
            handle: Handle,
            parent: Option<Handle>,
            index_in_parent: usize,
        ) -> Handle {
            let node = source.get(handle);
            let copy = target.alloc(Node::with_keys(node.keys().iter().cloned().collect(), parent, index_in_parent));
            for index in 0..node.child_count() {
                let child = clone_subtree(source, target, node.child(index), Some(copy), index);
                target.get_mut(copy).push_child(child);
            }
            copy
        }

        let mut nodes = Arena::new();
        let root = clone_subtree(&self.nodes, &mut nodes, self.root, None, 0);
        Self {
            nodes,
            root,
            len: self.len,
        }
    }
}
