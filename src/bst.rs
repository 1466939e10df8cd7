//! An ordered map implemented with a plain, unbalanced binary search tree.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::Index;

use crate::error::KeyNotFound;
use crate::node::{Link, LinkPtr, Node, NodePtr};

mod iter;
pub use iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};

/// An ordered map implemented with an unbalanced binary search tree.
///
/// Nodes are placed where the search ends and are never rotated, so the
/// height depends on the insertion order.
///
/// ```
/// use avl_bst::SearchTree;
/// let mut tree = SearchTree::new();
/// tree.insert(2, "two");
/// tree.insert(1, "one");
/// tree.insert(3, "three");
/// assert_eq!(tree.get(&1), Some(&"one"));
/// tree.remove(&2);
/// assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [1, 3]);
/// ```
pub struct SearchTree<K, V> {
    pub(crate) root: Link<K, V>,
    pub(crate) num_nodes: usize,
    marker: PhantomData<Box<Node<K, V>>>,
}

/// Result of the descent for a key to insert.
pub(crate) enum InsertPos<K, V> {
    /// A node with an equal key exists.
    Occupied(NodePtr<K, V>),
    /// Empty child slot of `parent` (or the root slot) to attach the new node to.
    Vacant(Link<K, V>, LinkPtr<K, V>),
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K: Ord, V> SearchTree<K, V> {
    /// Creates an empty tree.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
            marker: PhantomData,
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key)
            .map(|node_ptr| unsafe { &(*node_ptr.as_ptr()).value })
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key)
            .map(|node_ptr| unsafe { &mut (*node_ptr.as_ptr()).value })
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node_ptr| unsafe {
            let node = &*node_ptr.as_ptr();
            (&node.key, &node.value)
        })
    }

    /// Returns a reference to the value corresponding to the key,
    /// or `KeyNotFound` if the key is not in the map.
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(KeyNotFound)
    }

    /// Returns true if the map contains a value for the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present its value is overwritten in place,
    /// the stored key is kept, and the old value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.find_insert_pos(&key) {
            InsertPos::Occupied(mut node_ptr) => {
                Some(mem::replace(unsafe { &mut node_ptr.as_mut().value }, value))
            }
            InsertPos::Vacant(parent, link_ptr) => {
                Self::attach(parent, link_ptr, key, value);
                self.num_nodes += 1;
                self.refresh_heights(parent);
                None
            }
        }
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map.
    /// Returns the stored key and value if the key was previously in the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_ptr = self.find(key)?;
        let entry = self.remove_node(node_ptr);
        debug_assert!(self.find(key).is_none());
        Some(entry)
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.check_links(false);
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(node_ptr.as_ref().key.borrow()) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    pub(crate) fn find_insert_pos(&mut self, key: &K) -> InsertPos<K, V> {
        let mut parent: Link<K, V> = None;
        let mut link_ptr: LinkPtr<K, V> = unsafe { LinkPtr::new_unchecked(&mut self.root) };
        unsafe {
            while let Some(mut node_ptr) = *link_ptr.as_ref() {
                parent = Some(node_ptr);
                link_ptr = match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => return InsertPos::Occupied(node_ptr),
                    Ordering::Less => LinkPtr::new_unchecked(&mut node_ptr.as_mut().left),
                    Ordering::Greater => LinkPtr::new_unchecked(&mut node_ptr.as_mut().right),
                };
            }
        }
        InsertPos::Vacant(parent, link_ptr)
    }
}

impl<K, V> SearchTree<K, V> {
    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// The height is recomputed from scratch.
    pub fn height(&self) -> usize {
        crate::diagnostics::height(self.root)
    }

    /// Returns true if the heights of the two subtrees of every node differ by at most one.
    pub fn is_balanced(&self) -> bool {
        crate::diagnostics::is_balanced(self.root)
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.postorder(|node_ptr| unsafe {
            Node::destroy(node_ptr);
        });
        self.root = None;
        self.num_nodes = 0;
    }

    /// Returns the first key-value pair in the map, i.e. the one with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| unsafe {
            let node = &*Node::leftmost(root_ptr).as_ptr();
            (&node.key, &node.value)
        })
    }

    /// Returns the last key-value pair in the map, i.e. the one with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| unsafe {
            let node = &*Node::rightmost(root_ptr).as_ptr();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let node_ptr = Node::leftmost(self.root?);
        Some(self.remove_node(node_ptr))
    }

    /// Removes and returns the last key-value pair in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let node_ptr = Node::rightmost(self.root?);
        Some(self.remove_node(node_ptr))
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root, self.num_nodes)
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.root, self.num_nodes)
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.iter_mut())
    }

    /// Links a new node into the empty slot found by `find_insert_pos`.
    ///
    /// Takes no `&mut self`: reborrowing the tree would invalidate `link_ptr`.
    /// The caller counts the node once the slot is written.
    pub(crate) fn attach(
        parent: Link<K, V>,
        mut link_ptr: LinkPtr<K, V>,
        key: K,
        value: V,
    ) -> NodePtr<K, V> {
        let node_ptr = Node::create(parent, key, value);
        unsafe {
            debug_assert!(link_ptr.as_ref().is_none());
            *link_ptr.as_mut() = Some(node_ptr);
        }
        node_ptr
    }

    /// Unlinks the node, frees it and returns its payload.
    fn remove_node(&mut self, node_ptr: NodePtr<K, V>) -> (K, V) {
        let parent = self.unlink_node(node_ptr);
        self.refresh_heights(parent);
        unsafe { Node::destroy(node_ptr) }
    }

    /// Unlinks a node from the tree, swapping it with its predecessor first
    /// if it has two children.
    /// Returns the parent the node had when it was spliced out.
    fn unlink_node(&mut self, node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe {
            if node_ptr.as_ref().left.is_some() && node_ptr.as_ref().right.is_some() {
                if let Some(pred_ptr) = Node::predecessor(node_ptr) {
                    self.swap_nodes(node_ptr, pred_ptr);
                }
            }
        }
        self.splice(node_ptr)
    }

    /// Removes a node with at most one child from the tree, moving the child
    /// into its slot. The node itself is not freed.
    /// Returns the parent of the removed node.
    pub(crate) fn splice(&mut self, node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe {
            let node = node_ptr.as_ref();
            debug_assert!(node.left.is_none() || node.right.is_none());
            let child = node.left.or(node.right);
            let parent = node.parent;

            if let Some(mut child_ptr) = child {
                child_ptr.as_mut().parent = parent;
            }
            match parent {
                None => self.root = child,
                Some(mut parent_ptr) => {
                    if parent_ptr.as_ref().left == Some(node_ptr) {
                        parent_ptr.as_mut().left = child;
                    } else {
                        parent_ptr.as_mut().right = child;
                    }
                }
            }

            debug_assert!(self.num_nodes >= 1);
            self.num_nodes -= 1;
            parent
        }
    }

    /// Exchanges the positions of two nodes in the tree.
    ///
    /// Keys, values and per-node bookkeeping stay with their nodes; only the
    /// parent and child links (and the root link) change. Either node may be
    /// the direct parent of the other.
    pub(crate) fn swap_nodes(&mut self, mut n1: NodePtr<K, V>, mut n2: NodePtr<K, V>) {
        if n1 == n2 {
            return;
        }
        unsafe {
            let n1_parent = n1.as_ref().parent;
            let n1_left = n1.as_ref().left;
            let n1_right = n1.as_ref().right;
            let n1_is_left = Node::is_left_child(n1);

            let n2_parent = n2.as_ref().parent;
            let n2_left = n2.as_ref().left;
            let n2_right = n2.as_ref().right;
            let n2_is_left = Node::is_left_child(n2);

            mem::swap(&mut n1.as_mut().parent, &mut n2.as_mut().parent);
            mem::swap(&mut n1.as_mut().left, &mut n2.as_mut().left);
            mem::swap(&mut n1.as_mut().right, &mut n2.as_mut().right);

            // Adjacent nodes now point at themselves, turn those links around
            if n1_right == Some(n2) {
                n2.as_mut().right = Some(n1);
                n1.as_mut().parent = Some(n2);
            } else if n2_right == Some(n1) {
                n1.as_mut().right = Some(n2);
                n2.as_mut().parent = Some(n1);
            } else if n1_left == Some(n2) {
                n2.as_mut().left = Some(n1);
                n1.as_mut().parent = Some(n2);
            } else if n2_left == Some(n1) {
                n1.as_mut().left = Some(n2);
                n2.as_mut().parent = Some(n1);
            }

            // Fix back links of the surrounding nodes
            if let Some(mut parent_ptr) = n1_parent.filter(|&ptr| ptr != n2) {
                if n1_is_left {
                    parent_ptr.as_mut().left = Some(n2);
                } else {
                    parent_ptr.as_mut().right = Some(n2);
                }
            }
            for mut child_ptr in [n1_left, n1_right].into_iter().flatten() {
                if child_ptr != n2 {
                    child_ptr.as_mut().parent = Some(n2);
                }
            }

            if let Some(mut parent_ptr) = n2_parent.filter(|&ptr| ptr != n1) {
                if n2_is_left {
                    parent_ptr.as_mut().left = Some(n1);
                } else {
                    parent_ptr.as_mut().right = Some(n1);
                }
            }
            for mut child_ptr in [n2_left, n2_right].into_iter().flatten() {
                if child_ptr != n1 {
                    child_ptr.as_mut().parent = Some(n1);
                }
            }
        }

        if self.root == Some(n1) {
            self.root = Some(n2);
        } else if self.root == Some(n2) {
            self.root = Some(n1);
        }
    }

    /// Recomputes cached heights from the given node up to the root.
    fn refresh_heights(&mut self, start_from: Link<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            Node::adjust_height(node_ptr);
            current = unsafe { node_ptr.as_ref().parent };
        }
    }

    /// Copies the subtree rooted at `link`, including cached heights and balance factors.
    fn clone_subtree(link: Link<K, V>, parent: Link<K, V>) -> Link<K, V>
    where
        K: Clone,
        V: Clone,
    {
        link.map(|node_ptr| unsafe {
            let node = node_ptr.as_ref();
            let mut copy_ptr = Node::create(parent, node.key.clone(), node.value.clone());
            let left = Self::clone_subtree(node.left, Some(copy_ptr));
            let right = Self::clone_subtree(node.right, Some(copy_ptr));
            let copy = copy_ptr.as_mut();
            copy.left = left;
            copy.right = right;
            copy.height = node.height;
            copy.balance = node.balance;
            copy_ptr
        })
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn preorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    fn postorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(|_| {}, |_| {}, f);
    }

    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodePtr<K, V>),
        In: FnMut(NodePtr<K, V>),
        Post: FnMut(NodePtr<K, V>),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // Post order traversal is used for node deletion,
                        // so make sure not to use node pointer after postorder call.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().left } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            postorder(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            postorder(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<K, V> Drop for SearchTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Ord, V> Default for SearchTree<K, V> {
    /// Creates an empty tree.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for SearchTree<K, V> {
    /// Copies the tree node by node, so the clone has the same shape.
    fn clone(&self) -> Self {
        Self {
            root: Self::clone_subtree(self.root, None),
            num_nodes: self.num_nodes,
            marker: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SearchTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for SearchTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for SearchTree<K, V> {}

impl<K, Q, V> Index<&Q> for SearchTree<K, V>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        match self.try_get(key) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SearchTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for SearchTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        iter.into_iter().for_each(move |(key, value)| {
            self.insert(key, value);
        });
    }
}

impl<'a, K, V> IntoIterator for &'a SearchTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut SearchTree<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for SearchTree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
