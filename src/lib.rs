//! An ordered map implemented with a binary search tree, and a variant kept
//! height balanced as an AVL tree.
//!
//! [`SearchTree`] is the plain search tree: nodes are linked where the search
//! ends, nodes with two children are removed by trading places with their
//! in-order predecessor first. [`AvlTreeMap`] builds on it and restores the
//! AVL condition after every insert and remove, so its height stays within
//! about 1.44 log2(n).
//!
//! ```
//! use avl_bst::AvlTreeMap;
//! let mut map = AvlTreeMap::new();
//! for key in [10, 20, 30] {
//!     map.insert(key, key * 2);
//! }
//! assert_eq!(map[&20], 40);
//! assert_eq!(map.height(), 2);
//! assert!(map.try_get(&25).is_err());
//! for (key, value) in &map {
//!     println!("{key} => {value}");
//! }
//! ```

mod avl;
pub mod bst;
mod diagnostics;
mod error;
mod node;

pub use avl::AvlTreeMap;
pub use bst::SearchTree;
pub use error::KeyNotFound;

#[cfg(test)]
mod proptests;
