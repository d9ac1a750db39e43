//! Elements, comparators and visitors that plug into [`rbtree::RedBlackTree`]
//! without it knowing anything about them.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod string;
pub mod vector;

pub use string::{compare_strings, concatenate, concatenate_all};
pub use vector::{compare_vectors, find_max_norm, Vector};
