//! Height and balance diagnostics.
//!
//! These walk the whole subtree and never rely on cached heights, so they can
//! be used to verify the bookkeeping of the trees.

use std::cmp;

use crate::node::Link;

/// Number of nodes on the longest path from `link` down to a leaf, 0 for an empty subtree.
pub(crate) fn height<K, V>(link: Link<K, V>) -> usize {
    match link {
        None => 0,
        Some(node_ptr) => unsafe {
            let node = node_ptr.as_ref();
            1 + cmp::max(height(node.left), height(node.right))
        },
    }
}

/// Returns true if the subtree heights differ by at most one at every node of the subtree.
pub(crate) fn is_balanced<K, V>(link: Link<K, V>) -> bool {
    balanced_height(link).is_some()
}

/// Height of a balanced subtree, `None` as soon as an unbalanced node is found.
fn balanced_height<K, V>(link: Link<K, V>) -> Option<usize> {
    match link {
        None => Some(0),
        Some(node_ptr) => unsafe {
            let node = node_ptr.as_ref();
            let left_height = balanced_height(node.left)?;
            let right_height = balanced_height(node.right)?;
            if left_height.abs_diff(right_height) > 1 {
                return None;
            }
            Some(1 + cmp::max(left_height, right_height))
        },
    }
}

#[cfg(any(test, feature = "consistency_check"))]
mod consistency {
    use std::cmp;

    use crate::bst::SearchTree;
    use crate::node::Node;

    impl<K: Ord, V> SearchTree<K, V> {
        /// Asserts links, key order, cached heights and node count.
        /// With `check_balance` also asserts stored balance factors and the AVL condition.
        pub(crate) fn check_links(&self, check_balance: bool) {
            unsafe {
                // Check root link
                if let Some(root_node_ptr) = self.root {
                    assert!(root_node_ptr.as_ref().parent.is_none());
                }

                // Check tree nodes
                let mut num_nodes = 0;
                self.preorder(|node_ptr| {
                    let mut height = 0;

                    // Check link for left child node
                    if let Some(left_ptr) = node_ptr.as_ref().left {
                        assert!(left_ptr.as_ref().parent == Some(node_ptr));
                        assert!(left_ptr.as_ref().key < node_ptr.as_ref().key);
                        height = cmp::max(height, left_ptr.as_ref().height + 1);
                    }

                    // Check link for right child node
                    if let Some(right_ptr) = node_ptr.as_ref().right {
                        assert!(right_ptr.as_ref().parent == Some(node_ptr));
                        assert!(right_ptr.as_ref().key > node_ptr.as_ref().key);
                        height = cmp::max(height, right_ptr.as_ref().height + 1);
                    }

                    // Check cached height against children and against a full recount
                    assert_eq!(node_ptr.as_ref().height, height);
                    assert_eq!(super::height(Some(node_ptr)), height + 1);

                    if check_balance {
                        // Check balance factor and AVL condition (nearly balance)
                        let balance = Node::height_difference(node_ptr);
                        assert_eq!(node_ptr.as_ref().balance as isize, balance);
                        assert!((-1..=1).contains(&balance));
                    }

                    num_nodes += 1;
                });

                // Check number of nodes
                assert_eq!(num_nodes, self.num_nodes);
            }
        }
    }
}
