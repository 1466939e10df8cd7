//! Iterators over the entries of a tree.
//!
//! Borrowing iterators walk the tree in order via successor and predecessor
//! links, starting from the minimum and the maximum node.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::SearchTree;
use crate::node::{Link, Node, NodePtr};

/// An iterator over the entries of a map, sorted by key.
pub struct Iter<'a, K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
    len: usize,
    marker: PhantomData<&'a Node<K, V>>,
}

/// A mutable iterator over the entries of a map, sorted by key.
pub struct IterMut<'a, K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
    len: usize,
    marker: PhantomData<&'a mut Node<K, V>>,
}

/// An iterator over the keys of a map, in sorted order.
pub struct Keys<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// An iterator over the values of a map, in order by key.
pub struct Values<'a, K, V> {
    iter: Iter<'a, K, V>,
}

/// A mutable iterator over the values of a map, in order by key.
pub struct ValuesMut<'a, K, V> {
    iter: IterMut<'a, K, V>,
}

/// An owning iterator over the entries of a map, sorted by key.
pub struct IntoIter<K, V> {
    tree: SearchTree<K, V>,
}

/// Advances `front` and returns the node it pointed to.
fn step_front<K, V>(front: &mut Link<K, V>, len: &mut usize) -> Option<NodePtr<K, V>> {
    if *len == 0 {
        return None;
    }
    let node_ptr = (*front)?;
    *front = Node::successor(node_ptr);
    *len -= 1;
    Some(node_ptr)
}

/// Moves `back` one step towards the front and returns the node it pointed to.
fn step_back<K, V>(back: &mut Link<K, V>, len: &mut usize) -> Option<NodePtr<K, V>> {
    if *len == 0 {
        return None;
    }
    let node_ptr = (*back)?;
    *back = Node::predecessor(node_ptr);
    *len -= 1;
    Some(node_ptr)
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(root: Link<K, V>, len: usize) -> Self {
        Self {
            front: root.map(Node::leftmost),
            back: root.map(Node::rightmost),
            len,
            marker: PhantomData,
        }
    }

    fn entry(node_ptr: NodePtr<K, V>) -> (&'a K, &'a V) {
        let node = unsafe { &*node_ptr.as_ptr() };
        (&node.key, &node.value)
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        step_front(&mut self.front, &mut self.len).map(Self::entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        step_back(&mut self.back, &mut self.len).map(Self::entry)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

// Auto derived clone seems to have an invalid type bound of K: Clone, V: Clone
impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            len: self.len,
            marker: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(super) fn new(root: Link<K, V>, len: usize) -> Self {
        Self {
            front: root.map(Node::leftmost),
            back: root.map(Node::rightmost),
            len,
            marker: PhantomData,
        }
    }

    fn entry(node_ptr: NodePtr<K, V>) -> (&'a K, &'a mut V) {
        let node = node_ptr.as_ptr();
        unsafe { (&(*node).key, &mut (*node).value) }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        step_front(&mut self.front, &mut self.len).map(Self::entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        step_back(&mut self.back, &mut self.len).map(Self::entry)
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<'a, K, V> Keys<'a, K, V> {
    pub(super) fn new(iter: Iter<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<'a, K, V> Values<'a, K, V> {
    pub(super) fn new(iter: Iter<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<'a, K, V> ValuesMut<'a, K, V> {
    pub(super) fn new(iter: IterMut<'a, K, V>) -> Self {
        Self { iter }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.iter.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

impl<K, V> IntoIter<K, V> {
    pub(super) fn new(tree: SearchTree<K, V>) -> Self {
        Self { tree }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.tree.iter()).finish()
    }
}
