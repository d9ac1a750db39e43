//! An ordered set backed by a red-black tree.
//!
//! The element order and the cleanup of removed elements are supplied by the
//! caller as a [`Comparator`] and a [`Destructor`]. By default elements are
//! ordered by [`Ord`] and dropped.
//!
//! ```
//! use core::ops::ControlFlow;
//! use rbtree::{Error, RedBlackTree};
//!
//! let mut tree = RedBlackTree::new();
//! for it in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.insert(it).unwrap();
//! }
//! assert_eq!(tree.insert(4).unwrap_err().error(), &Error::Duplicate);
//! tree.delete(&3).unwrap();
//! tree.delete(&8).unwrap();
//!
//! let mut items = Vec::new();
//! let _ = tree.for_each(|it| {
//!     items.push(*it);
//!     ControlFlow::<()>::Continue(())
//! });
//! assert_eq!(items, [1, 4, 5, 7, 9]);
//! ```

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod callbacks;
mod error;
mod node;
mod red_black_tree;

pub use callbacks::{Comparator, Destructor, DropElement, NaturalOrder};
pub use error::{Error, InsertError, Result};
pub use red_black_tree::RedBlackTree;
