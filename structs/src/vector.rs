use core::cmp::Ordering;
use core::ops::ControlFlow;

use log::debug;
use rbtree::{Destructor, RedBlackTree};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vector {
    components: Vec<f64>,
}

impl Vector {
    pub fn new(components: Vec<f64>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[f64] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Euclidean (L2) norm, `0.0` for an empty vector.
    pub fn norm(&self) -> f64 {
        self.components.iter().map(|c| c * c).sum::<f64>().sqrt()
    }
}

impl From<Vec<f64>> for Vector {
    fn from(components: Vec<f64>) -> Self {
        Self::new(components)
    }
}

impl<const N: usize> From<[f64; N]> for Vector {
    fn from(components: [f64; N]) -> Self {
        Self::new(components.to_vec())
    }
}

/// Orders vectors component by component.
///
/// The first component that differs decides. If one vector is a prefix of the
/// other, the shorter one is smaller. Components that are neither smaller nor
/// larger than each other (equal, or NaN) don't decide anything.
pub fn compare_vectors(a: &Vector, b: &Vector) -> Ordering {
    for (x, y) in a.components.iter().zip(&b.components) {
        if x < y {
            return Ordering::Less;
        }
        if x > y {
            return Ordering::Greater;
        }
    }

    a.len().cmp(&b.len())
}

/// Returns a copy of the vector with the largest norm.
///
/// Vectors are visited in ascending order and only a strictly larger norm
/// replaces the current maximum, so among equal norms the smallest vector
/// wins. Returns `None` for an empty tree.
pub fn find_max_norm<C, D>(tree: &RedBlackTree<Vector, C, D>) -> Option<Vector>
where
    D: Destructor<Vector>,
{
    let mut max: Option<(&Vector, f64)> = None;
    let _ = tree.for_each(|vector| {
        let norm = vector.norm();
        // a NaN norm never beats the current maximum
        if max.map_or(true, |(_, max_norm)| norm > max_norm) {
            max = Some((vector, norm));
        }
        ControlFlow::<()>::Continue(())
    });

    let (vector, norm) = max?;
    debug!("largest norm {norm} among {} vectors", tree.len());
    Some(vector.clone())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rbtree::DropElement;

    use super::*;

    fn tree_of(vectors: &[&[f64]]) -> RedBlackTree<Vector, fn(&Vector, &Vector) -> Ordering> {
        let mut tree = RedBlackTree::with_callbacks(
            compare_vectors as fn(&Vector, &Vector) -> Ordering,
            DropElement,
        );
        for v in vectors {
            tree.insert(Vector::new(v.to_vec())).unwrap();
        }
        tree
    }

    #[test]
    fn compare() {
        let v = |c: &[f64]| Vector::new(c.to_vec());
        assert_eq!(compare_vectors(&v(&[1.0, 2.0]), &v(&[1.0, 2.0])), Ordering::Equal);
        assert_eq!(compare_vectors(&v(&[1.0, 2.0]), &v(&[1.0, 3.0])), Ordering::Less);
        assert_eq!(compare_vectors(&v(&[2.0]), &v(&[1.0, 9.0])), Ordering::Greater);
        // prefix is smaller
        assert_eq!(compare_vectors(&v(&[1.0]), &v(&[1.0, 0.0])), Ordering::Less);
        assert_eq!(compare_vectors(&v(&[1.0, 0.0]), &v(&[1.0])), Ordering::Greater);
        assert_eq!(compare_vectors(&v(&[]), &v(&[])), Ordering::Equal);
        assert_eq!(compare_vectors(&v(&[]), &v(&[-5.0])), Ordering::Less);
    }

    #[test]
    fn norm() {
        assert_eq!(Vector::from([3.0, 4.0]).norm(), 5.0);
        assert_eq!(Vector::from([0.0, 0.0, 5.0]).norm(), 5.0);
        assert_eq!(Vector::from([-2.0]).norm(), 2.0);
        assert_eq!(Vector::default().norm(), 0.0);
    }

    #[test]
    fn max_norm() {
        let tree = tree_of(&[&[3.0, 4.0], &[1.0], &[0.0, 0.0, 5.0]]);

        // [0, 0, 5] comes first in the tree and [3, 4] doesn't beat it
        let max = find_max_norm(&tree).unwrap();
        assert_eq!(max.norm(), 5.0);
        assert_eq!(max, Vector::from([0.0, 0.0, 5.0]));

        let tree = tree_of(&[&[1.0, 1.0], &[-7.0], &[2.0, 2.0, 2.0]]);
        assert_eq!(find_max_norm(&tree), Some(Vector::from([-7.0])));
    }

    #[test]
    fn nan_norm_does_not_replace_max() {
        let tree = tree_of(&[&[5.0], &[6.0, f64::NAN]]);
        assert_eq!(find_max_norm(&tree), Some(Vector::from([5.0])));
    }

    #[test]
    fn max_norm_of_empty_tree() {
        let tree = tree_of(&[]);
        assert_eq!(find_max_norm(&tree), None);
    }

    #[test]
    fn vectors_are_ordered_in_tree() {
        let tree = tree_of(&[&[2.0], &[1.0, 5.0], &[1.0], &[0.5, 0.5, 0.5]]);

        let mut ordered = Vec::new();
        let _ = tree.for_each(|v| {
            ordered.push(v.components().to_vec());
            ControlFlow::<()>::Continue(())
        });
        assert_eq!(
            ordered,
            vec![vec![0.5, 0.5, 0.5], vec![1.0], vec![1.0, 5.0], vec![2.0]]
        );
    }

    proptest! {
        #[test]
        fn compare_is_antisymmetric(
            a in proptest::collection::vec(-100.0..100.0f64, 0..6),
            b in proptest::collection::vec(-100.0..100.0f64, 0..6),
        ) {
            let (a, b) = (Vector::new(a), Vector::new(b));
            prop_assert_eq!(compare_vectors(&a, &b), compare_vectors(&b, &a).reverse());
            prop_assert_eq!(compare_vectors(&a, &b) == Ordering::Equal, a == b);
        }
    }
}
