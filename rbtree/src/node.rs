use core::fmt;
use core::mem;
use core::ops::{Index, IndexMut};
use std::collections::TryReserveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[must_use]
    pub(crate) fn is_red(&self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[must_use]
    pub(crate) fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }
}

/// Which child slot of a parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Stable handle of a node inside an [`Arena`].
///
/// Handles stay valid until the node is released, after which the slot may be
/// handed out again to a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

pub(crate) struct Node<T> {
    pub(crate) element: T,
    pub(crate) color: Color,
    // Not owning, only used to walk back up during rotations and fixups.
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<T> Node<T> {
    /// New nodes are always red leaves.
    pub(crate) fn new(element: T, parent: Option<NodeId>) -> Self {
        Self {
            element,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}

enum Slot<T> {
    Occupied(Node<T>),
    // Vacant slots are chained into a free list through `next_free`.
    Vacant { next_free: Option<NodeId> },
}

/// Storage for the nodes of one tree.
///
/// Releasing a node never allocates. Allocating a node reuses the most
/// recently released slot before growing the backing vector.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<NodeId>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
        }
    }

    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve(capacity)?;
        Ok(Self {
            slots,
            free_head: None,
        })
    }

    /// Makes sure that the next [`allocate`] won't need to grow the storage.
    ///
    /// [`allocate`]: Arena::allocate
    pub(crate) fn try_reserve_one(&mut self) -> Result<(), TryReserveError> {
        match self.free_head {
            Some(_) => Ok(()),
            None => self.slots.try_reserve(1),
        }
    }

    pub(crate) fn allocate(&mut self, node: Node<T>) -> NodeId {
        match self.free_head {
            Some(id) => {
                self.free_head = match self.slots[id.0] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points to occupied {id:?}"),
                };
                self.slots[id.0] = Slot::Occupied(node);
                id
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Takes the node out of its slot and puts the slot on the free list.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<T> {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match mem::replace(&mut self.slots[id.0], vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(id);
                node
            }
            Slot::Vacant { .. } => panic!("{id:?} was released twice"),
        }
    }

    /// Swaps the elements of two distinct nodes, leaving links and colors in place.
    pub(crate) fn swap_elements(&mut self, a: NodeId, b: NodeId) {
        assert_ne!(a, b, "cannot swap a node's element with itself");
        let (lo, hi) = if a.0 < b.0 { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi.0);
        match (&mut head[lo.0], &mut tail[0]) {
            (Slot::Occupied(lo), Slot::Occupied(hi)) => mem::swap(&mut lo.element, &mut hi.element),
            _ => panic!("cannot swap elements of released nodes {a:?} and {b:?}"),
        }
    }

    /// Forgets every slot. Nodes that are still occupied are dropped in place.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
    }

    #[cfg(test)]
    pub(crate) fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Occupied(_)))
            .count()
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = Node<T>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling {id:?}"),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling {id:?}"),
        }
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("slots", &self.slots.len())
            .field("free_head", &self.free_head)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_slots_are_reused() {
        let mut arena = Arena::new();
        let a = arena.allocate(Node::new(1, None));
        let b = arena.allocate(Node::new(2, Some(a)));
        let c = arena.allocate(Node::new(3, Some(a)));
        assert_eq!(arena.occupied(), 3);

        assert_eq!(arena.release(b).element, 2);
        assert_eq!(arena.release(c).element, 3);
        assert_eq!(arena.occupied(), 1);

        // last released goes out first
        assert_eq!(arena.allocate(Node::new(4, None)), c);
        assert_eq!(arena.allocate(Node::new(5, None)), b);
        assert_eq!(arena[c].element, 4);
        assert_eq!(arena[b].element, 5);
        assert_eq!(arena[b].color, Color::Red);
    }

    #[test]
    fn swap_elements_keeps_links() {
        let mut arena = Arena::new();
        let a = arena.allocate(Node::new("a", None));
        let b = arena.allocate(Node::new("b", Some(a)));
        arena[a].right = Some(b);
        arena[a].color = Color::Black;

        arena.swap_elements(b, a);
        assert_eq!(arena[a].element, "b");
        assert_eq!(arena[b].element, "a");
        assert_eq!(arena[a].right, Some(b));
        assert_eq!(arena[b].parent, Some(a));
        assert!(arena[a].color.is_black());
        assert!(arena[b].color.is_red());
    }

    #[test]
    #[should_panic(expected = "dangling")]
    fn released_node_is_dangling() {
        let mut arena = Arena::new();
        let a = arena.allocate(Node::new(1, None));
        arena.release(a);
        let _ = &arena[a];
    }

    #[test]
    fn reserve_without_free_slots() {
        let mut arena = Arena::<u8>::new();
        arena.try_reserve_one().unwrap();
        let a = arena.allocate(Node::new(1, None));
        arena.release(a);
        // free slot available, nothing to reserve
        arena.try_reserve_one().unwrap();

        assert!(Arena::<u64>::try_with_capacity(usize::MAX).is_err());
    }
}
