use core::cmp::Ordering;

/// Total order used to place elements in a [`RedBlackTree`].
///
/// The order must stay the same for the whole lifetime of the tree.
/// `Equal` is returned iff both arguments are the same element, two elements
/// comparing `Equal` can never be stored in one tree at the same time.
///
/// Any `Fn(&T, &T) -> Ordering` is a comparator.
///
/// [`RedBlackTree`]: crate::RedBlackTree
pub trait Comparator<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders elements by their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Cleanup action that receives every element the tree destroys.
///
/// It runs exactly once per element, when the element is removed by
/// [`delete`] or when the tree is cleared or dropped. Elements that were
/// rejected by [`insert`] or handed out by [`take`] never reach it.
///
/// Any `FnMut(T)` is a destructor.
///
/// [`delete`]: crate::RedBlackTree::delete
/// [`insert`]: crate::RedBlackTree::insert
/// [`take`]: crate::RedBlackTree::take
pub trait Destructor<T> {
    fn destroy(&mut self, element: T);
}

impl<T, F> Destructor<T> for F
where
    F: FnMut(T),
{
    #[inline]
    fn destroy(&mut self, element: T) {
        self(element)
    }
}

/// Simply drops the element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropElement;

impl<T> Destructor<T> for DropElement {
    #[inline]
    fn destroy(&mut self, element: T) {
        drop(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_callbacks() {
        let reverse = |a: &i32, b: &i32| b.cmp(a);
        assert_eq!(reverse.compare(&1, &2), Ordering::Greater);
        assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
        assert_eq!(NaturalOrder.compare(&"b", &"b"), Ordering::Equal);

        let mut seen = Vec::new();
        let mut collect = |element: i32| seen.push(element);
        collect.destroy(3);
        collect.destroy(1);
        assert_eq!(seen, [3, 1]);
    }
}
