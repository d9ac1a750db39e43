use core::fmt;
use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias for tree operations
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Reasons a tree operation can be refused.
///
/// A refused operation never modifies the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An element comparing equal is already stored in the tree
    #[error("an equal element is already in the tree")]
    Duplicate,

    /// No stored element compares equal to the given one
    #[error("element is not in the tree")]
    NotFound,

    /// Storage for a new node could not be allocated
    #[error("failed to allocate a tree node")]
    Alloc(#[from] TryReserveError),
}

/// Error returned by [`RedBlackTree::insert`], which hands the rejected
/// element back to the caller.
///
/// [`RedBlackTree::insert`]: crate::RedBlackTree::insert
pub struct InsertError<T> {
    error: Error,
    element: T,
}

impl<T> InsertError<T> {
    pub(crate) fn new(error: Error, element: T) -> Self {
        Self { error, element }
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn element(&self) -> &T {
        &self.element
    }

    pub fn into_element(self) -> T {
        self.element
    }
}

impl<T> fmt::Debug for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert rejected: {}", self.error)
    }
}

impl<T> std::error::Error for InsertError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<InsertError<T>> for Error {
    fn from(err: InsertError<T>) -> Self {
        err.error
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn insert_error_keeps_element() {
        let err = InsertError::new(Error::Duplicate, String::from("twice"));
        assert_eq!(err.error(), &Error::Duplicate);
        assert_eq!(err.element(), "twice");
        assert_eq!(
            err.to_string(),
            "insert rejected: an equal element is already in the tree"
        );
        assert!(err.source().is_some());
        assert_eq!(err.into_element(), "twice");
    }

    #[test]
    fn alloc_error_has_source() {
        let reserve = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
        let err = Error::from(reserve);
        assert!(matches!(err, Error::Alloc(_)));
        assert_eq!(err.to_string(), "failed to allocate a tree node");
        assert!(err.source().is_some());
        assert_eq!(Error::NotFound.to_string(), "element is not in the tree");
    }
}
