use std::cmp;
use std::ptr::NonNull;

pub(crate) type NodePtr<K, V> = NonNull<Node<K, V>>;
pub(crate) type Link<K, V> = Option<NodePtr<K, V>>;
pub(crate) type LinkPtr<K, V> = NonNull<Link<K, V>>;

/// A tree node.
///
/// The tree owning the node owns it exclusively; `parent`, `left` and `right`
/// are plain navigation links.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: Link<K, V>,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    /// Edges on the longest downward path, a leaf has height 0.
    pub(crate) height: usize,
    /// Height of left subtree minus height of right subtree.
    /// Only maintained by the balanced tree.
    pub(crate) balance: i8,
}

impl<K, V> Node<K, V> {
    pub(crate) fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
            balance: 0,
        });
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    /// Releases the node and hands back its payload.
    ///
    /// # Safety
    ///
    /// `node_ptr` must come from `create` and must not be used afterwards.
    pub(crate) unsafe fn destroy(node_ptr: NodePtr<K, V>) -> (K, V) {
        let node = *Box::from_raw(node_ptr.as_ptr());
        (node.key, node.value)
    }

    /// Number of nodes on the longest path down the left subtree.
    pub(crate) fn left_height(node_ptr: NodePtr<K, V>) -> usize {
        unsafe {
            match node_ptr.as_ref().left {
                None => 0,
                Some(left_ptr) => left_ptr.as_ref().height + 1,
            }
        }
    }

    /// Number of nodes on the longest path down the right subtree.
    pub(crate) fn right_height(node_ptr: NodePtr<K, V>) -> usize {
        unsafe {
            match node_ptr.as_ref().right {
                None => 0,
                Some(right_ptr) => right_ptr.as_ref().height + 1,
            }
        }
    }

    /// Recomputes the cached height from the children.
    pub(crate) fn adjust_height(mut node_ptr: NodePtr<K, V>) {
        let height = cmp::max(Self::left_height(node_ptr), Self::right_height(node_ptr));
        unsafe { node_ptr.as_mut().height = height };
    }

    /// Balance factor computed from the cached child heights.
    pub(crate) fn height_difference(node_ptr: NodePtr<K, V>) -> isize {
        Self::left_height(node_ptr) as isize - Self::right_height(node_ptr) as isize
    }

    pub(crate) fn is_left_child(node_ptr: NodePtr<K, V>) -> bool {
        match Self::parent(node_ptr) {
            None => false,
            Some(parent_ptr) => Self::left(parent_ptr) == Some(node_ptr),
        }
    }

    // Link reads go through the raw pointer and must not create a `&Node`:
    // values handed out by `IterMut` stay borrowed while the walk goes on.

    pub(crate) fn parent(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe { (*node_ptr.as_ptr()).parent }
    }

    pub(crate) fn left(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe { (*node_ptr.as_ptr()).left }
    }

    pub(crate) fn right(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe { (*node_ptr.as_ptr()).right }
    }

    /// Leftmost node of the subtree rooted at `node_ptr`.
    pub(crate) fn leftmost(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        while let Some(left_ptr) = Self::left(node_ptr) {
            node_ptr = left_ptr;
        }
        node_ptr
    }

    /// Rightmost node of the subtree rooted at `node_ptr`.
    pub(crate) fn rightmost(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        while let Some(right_ptr) = Self::right(node_ptr) {
            node_ptr = right_ptr;
        }
        node_ptr
    }

    /// In-order successor.
    pub(crate) fn successor(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        if let Some(right_ptr) = Self::right(node_ptr) {
            return Some(Self::leftmost(right_ptr));
        }
        let mut current = node_ptr;
        let mut parent = Self::parent(current);
        while let Some(parent_ptr) = parent {
            if Self::right(parent_ptr) != Some(current) {
                break;
            }
            current = parent_ptr;
            parent = Self::parent(parent_ptr);
        }
        parent
    }

    /// In-order predecessor.
    pub(crate) fn predecessor(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        if let Some(left_ptr) = Self::left(node_ptr) {
            return Some(Self::rightmost(left_ptr));
        }
        let mut current = node_ptr;
        let mut parent = Self::parent(current);
        while let Some(parent_ptr) = parent {
            if Self::left(parent_ptr) != Some(current) {
                break;
            }
            current = parent_ptr;
            parent = Self::parent(parent_ptr);
        }
        parent
    }
}
