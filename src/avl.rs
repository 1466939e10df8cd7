//! An ordered map implemented with an AVL tree.

use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::mem;
use std::ops::Index;

use crate::bst::{InsertPos, IntoIter, Iter, IterMut, Keys, SearchTree, Values, ValuesMut};
use crate::error::KeyNotFound;
use crate::node::{Link, Node, NodePtr};

/// An ordered map implemented with an AVL tree.
///
/// The plain search tree places and unlinks the nodes; after every insert and
/// remove the map walks from the changed position up to the root and rotates
/// wherever the subtree heights of a node differ by two.
///
/// ```
/// use avl_bst::AvlTreeMap;
/// let mut map = AvlTreeMap::new();
/// map.insert(0, "zero");
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.get(&1).is_none());
/// assert!(map.is_balanced());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AvlTreeMap<K, V> {
    tree: SearchTree<K, V>,
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            tree: SearchTree::new(),
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
        self.tree.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_mut(key)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_key_value(key)
    }

    /// Returns a reference to the value corresponding to the key,
    /// or `KeyNotFound` if the key is not in the map.
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.try_get(key)
    }

    /// Returns true if the map contains a value for the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present its value is overwritten and the old
    /// value is returned; the shape of the tree does not change.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.find_insert_pos(&key) {
            InsertPos::Occupied(mut node_ptr) => {
                Some(mem::replace(unsafe { &mut node_ptr.as_mut().value }, value))
            }
            InsertPos::Vacant(parent, link_ptr) => {
                SearchTree::attach(parent, link_ptr, key, value);
                self.tree.num_nodes += 1;
                self.rebalance(parent);
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
        let node_ptr = self.tree.find(key)?;
        let entry = self.remove_node(node_ptr);
        debug_assert!(self.tree.find(key).is_none());
        Some(entry)
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.tree.check_links(true);
    }
}

impl<K, V> AvlTreeMap<K, V> {
    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Returns true if the heights of the two subtrees of every node differ by at most one.
    ///
    /// Always true after a completed insert or remove.
    pub fn is_balanced(&self) -> bool {
        self.tree.is_balanced()
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the first key-value pair in the map, i.e. the one with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first_key_value()
    }

    /// Returns the last key-value pair in the map, i.e. the one with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last_key_value()
    }

    /// Removes and returns the first key-value pair in the map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let node_ptr = Node::leftmost(self.tree.root?);
        Some(self.remove_node(node_ptr))
    }

    /// Removes and returns the last key-value pair in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let node_ptr = Node::rightmost(self.tree.root?);
        Some(self.remove_node(node_ptr))
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.tree.iter_mut()
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.tree.keys()
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        self.tree.values()
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        self.tree.values_mut()
    }

    fn remove_node(&mut self, node_ptr: NodePtr<K, V>) -> (K, V) {
        unsafe {
            // A node with two children trades places with its predecessor,
            // which has no right child.
            if node_ptr.as_ref().left.is_some() && node_ptr.as_ref().right.is_some() {
                if let Some(pred_ptr) = Node::predecessor(node_ptr) {
                    self.swap_nodes(node_ptr, pred_ptr);
                }
            }
            let parent = self.tree.splice(node_ptr);
            // Parent node might be out of balance now
            self.rebalance(parent);
            Node::destroy(node_ptr)
        }
    }

    /// Exchanges the positions of two nodes together with their heights and balance factors.
    ///
    /// Height and balance describe a position, and the shape below both
    /// positions stays the same.
    fn swap_nodes(&mut self, mut n1: NodePtr<K, V>, mut n2: NodePtr<K, V>) {
        self.tree.swap_nodes(n1, n2);
        if n1 != n2 {
            unsafe {
                mem::swap(&mut n1.as_mut().height, &mut n2.as_mut().height);
                mem::swap(&mut n1.as_mut().balance, &mut n2.as_mut().balance);
            }
        }
    }

    /// Recomputes height and balance factor of a node from its children.
    fn update(mut node_ptr: NodePtr<K, V>) {
        Node::adjust_height(node_ptr);
        let balance = Node::height_difference(node_ptr);
        debug_assert!((-2..=2).contains(&balance));
        unsafe { node_ptr.as_mut().balance = balance as i8 };
    }

    fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            if let Some(mut right_ptr) = node_ptr.as_ref().right {
                right_ptr.as_mut().parent = node_ptr.as_ref().parent;
                match node_ptr.as_ref().parent {
                    None => self.tree.root = Some(right_ptr),
                    Some(mut parent_ptr) => {
                        if parent_ptr.as_ref().left == Some(node_ptr) {
                            parent_ptr.as_mut().left = Some(right_ptr);
                        } else {
                            parent_ptr.as_mut().right = Some(right_ptr);
                        }
                    }
                }

                node_ptr.as_mut().parent = Some(right_ptr);
                node_ptr.as_mut().right = right_ptr.as_ref().left;
                if let Some(mut right_left_ptr) = node_ptr.as_ref().right {
                    right_left_ptr.as_mut().parent = Some(node_ptr);
                }
                right_ptr.as_mut().left = Some(node_ptr);

                Self::update(node_ptr);
                Self::update(right_ptr);
            }
        }
    }

    fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            if let Some(mut left_ptr) = node_ptr.as_ref().left {
                left_ptr.as_mut().parent = node_ptr.as_ref().parent;
                match node_ptr.as_ref().parent {
                    None => self.tree.root = Some(left_ptr),
                    Some(mut parent_ptr) => {
                        if parent_ptr.as_ref().left == Some(node_ptr) {
                            parent_ptr.as_mut().left = Some(left_ptr);
                        } else {
                            parent_ptr.as_mut().right = Some(left_ptr);
                        }
                    }
                }

                node_ptr.as_mut().parent = Some(left_ptr);
                node_ptr.as_mut().left = left_ptr.as_ref().right;
                if let Some(mut left_right_ptr) = node_ptr.as_ref().left {
                    left_right_ptr.as_mut().parent = Some(node_ptr);
                }
                left_ptr.as_mut().right = Some(node_ptr);

                Self::update(node_ptr);
                Self::update(left_ptr);
            }
        }
    }

    /// Rebalances nodes starting from given position up to the root node.
    ///
    /// Every node on the way is visited, also after a rotation restored the
    /// height of its subtree.
    fn rebalance(&mut self, start_from: Link<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            self.rebalance_node(node_ptr);
            current = unsafe { node_ptr.as_ref().parent };
        }
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Resulting balance will be +1, 0 or -1 height difference between left and right subtree.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    fn rebalance_node(&mut self, node_ptr: NodePtr<K, V>) {
        Self::update(node_ptr);
        let (balance, left, right) = unsafe {
            let node = node_ptr.as_ref();
            (node.balance, node.left, node.right)
        };
        match (balance, left, right) {
            (2, Some(left_ptr), _) => {
                // Left-right case
                if Node::height_difference(left_ptr) < 0 {
                    self.rotate_left(left_ptr);
                }
                self.rotate_right(node_ptr);
            }
            (-2, _, Some(right_ptr)) => {
                // Right-left case
                if Node::height_difference(right_ptr) > 0 {
                    self.rotate_right(right_ptr);
                }
                self.rotate_left(node_ptr);
            }
            _ => {}
        }
    }
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    /// Creates an empty map.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V> Index<&Q> for AvlTreeMap<K, V>
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
        &self.tree[key]
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        iter.into_iter().for_each(move |(key, value)| {
            self.insert(key, value);
        });
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut AvlTreeMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for AvlTreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::AvlTreeMap;
    use crate::node::Link;

    /// (key, left key, right key, balance) for every node in preorder.
    fn shape<V>(map: &AvlTreeMap<i32, V>) -> Vec<(i32, Option<i32>, Option<i32>, i8)> {
        fn key_of<V>(link: Link<i32, V>) -> Option<i32> {
            link.map(|node_ptr| unsafe { node_ptr.as_ref().key })
        }
        let mut shape = Vec::new();
        map.tree.preorder(|node_ptr| unsafe {
            let node = node_ptr.as_ref();
            shape.push((node.key, key_of(node.left), key_of(node.right), node.balance));
        });
        shape
    }

    fn build(keys: &[i32]) -> AvlTreeMap<i32, ()> {
        let mut map = AvlTreeMap::new();
        for &key in keys {
            map.insert(key, ());
            map.check_consistency();
        }
        map
    }

    const BALANCED_123: [(i32, Option<i32>, Option<i32>, i8); 3] = [
        (20, Some(10), Some(30), 0),
        (10, None, None, 0),
        (30, None, None, 0),
    ];

    #[test]
    fn test_rotate_single() {
        assert_eq!(shape(&build(&[10, 20, 30])), BALANCED_123);
        assert_eq!(shape(&build(&[30, 20, 10])), BALANCED_123);
    }

    #[test]
    fn test_rotate_double() {
        assert_eq!(shape(&build(&[30, 10, 20])), BALANCED_123);
        assert_eq!(shape(&build(&[10, 30, 20])), BALANCED_123);
    }

    #[test]
    fn test_balance_factors() {
        let map = build(&[20, 10, 30, 5]);
        assert_eq!(
            shape(&map),
            [
                (20, Some(10), Some(30), 1),
                (10, Some(5), None, 1),
                (5, None, None, 0),
                (30, None, None, 0),
            ]
        );
    }

    #[test]
    fn test_remove_two_children() {
        let mut map = build(&[5, 3, 8, 1, 4, 7, 9, 2]);
        assert_eq!(map.remove(&5), Some(()));
        map.check_consistency();
        assert!(map.is_balanced());
        assert_eq!(shape(&map)[0].0, 4);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 7, 8, 9]);
    }

    #[test]
    fn test_remove_rotates() {
        //     20            30
        //    /  \          /  \
        //  10    30  ->  20    40
        //       /  \       \
        //      25   40      25
        let mut map = build(&[20, 10, 30, 25, 40]);
        map.remove(&10);
        map.check_consistency();
        assert_eq!(
            shape(&map),
            [
                (30, Some(20), Some(40), 1),
                (20, None, Some(25), -1),
                (25, None, None, 0),
                (40, None, None, 0),
            ]
        );
    }

    #[test]
    fn test_remove_single_node() {
        let mut map = build(&[1]);
        assert_eq!(map.remove(&1), Some(()));
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        map.check_consistency();
    }

    #[test]
    fn test_remove_root_with_child() {
        let mut map = build(&[1, 2]);
        map.remove(&1);
        map.check_consistency();
        assert_eq!(shape(&map), [(2, None, None, 0)]);
    }

    #[test]
    fn test_upsert_keeps_shape() {
        let mut map: AvlTreeMap<i32, i32> = (0..20).map(|key| (key, key)).collect();
        let before = shape(&map);
        assert_eq!(map.insert(7, 70), Some(7));
        assert_eq!(shape(&map), before);
        assert_eq!(map.len(), 20);
        for (key, value) in &map {
            assert_eq!(*value, if *key == 7 { 70 } else { *key });
        }
        map.check_consistency();
    }

    #[test]
    fn test_insert_into_fresh_maps() {
        // Covers the first insert into an empty root slot and inserts below a leaf.
        for len in 1..=16 {
            let mut map = AvlTreeMap::new();
            for key in 0..len {
                assert_eq!(map.insert(key, key * 10), None);
                map.check_consistency();
            }
            assert_eq!(map.len(), len as usize);
            assert_eq!(map.get(&(len - 1)), Some(&((len - 1) * 10)));
        }
    }
}
