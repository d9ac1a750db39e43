use core::cmp::Ordering;
use core::fmt;
use core::mem;
use core::ops::ControlFlow;

use log::{debug, trace};

use crate::callbacks::{Comparator, Destructor, DropElement, NaturalOrder};
use crate::error::{Error, InsertError, Result};
use crate::node::{Arena, Color, Node, NodeId, Side};

/// Where a node hangs in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodePos {
    Root,
    Child { parent: NodeId, side: Side },
}

enum Search {
    Found(NodeId),
    /// Child slot the element would be attached to, `None` for an empty tree.
    Vacant(Option<(NodeId, Side)>),
}

/// How a node with at most one child is taken out of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    /// A red node cannot have a single child, so it is a leaf.
    RedLeaf,
    /// A black node with one child, the child is necessarily red.
    BlackWithRedChild(NodeId),
    /// Removing it leaves a double-black hole that must be rebalanced.
    BlackLeaf,
}

/// The neighbourhood of a double-black position, `near` and `far` being the
/// sibling's children on the side of the position and away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DoubleBlack {
    RedSibling,
    /// Black sibling with black nephews under a red parent.
    RedParent,
    /// Black sibling with black nephews under a black parent.
    BlackParent,
    /// Black sibling, red near nephew and black far nephew.
    NearNephewRed,
    /// Black sibling with a red far nephew.
    FarNephewRed,
}

/// Outcome of a single double-black rebalancing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Done,
    Continue { parent: NodeId, side: Side },
}

/// An ordered set of elements kept balanced as a red-black tree.
///
/// Elements are ordered by the comparator `C`. Two elements comparing equal
/// are never stored together. Every element that the tree destroys, by
/// [`delete`], [`clear`] or on drop, is passed to the destructor `D` exactly
/// once.
///
/// Nodes live in an arena and refer to each other by index, the parent link
/// being a plain back-reference.
///
/// [`delete`]: RedBlackTree::delete
/// [`clear`]: RedBlackTree::clear
pub struct RedBlackTree<T, C = NaturalOrder, D = DropElement>
where
    D: Destructor<T>,
{
    // INVARIANTS:
    //  * `root` is `None` iff `len == 0`
    //  * `len` equals the number of nodes reachable from `root`
    nodes: Arena<T>,
    root: Option<NodeId>,
    len: usize,
    comparator: C,
    destructor: D,
}

impl<T, C, D> Drop for RedBlackTree<T, C, D>
where
    D: Destructor<T>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C, D> fmt::Debug for RedBlackTree<T, C, D>
where
    T: fmt::Debug,
    D: Destructor<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct NodeDebug<'a, T> {
            nodes: &'a Arena<T>,
            id: NodeId,
        }

        impl<T: fmt::Debug> fmt::Debug for NodeDebug<'_, T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let node = &self.nodes[self.id];
                let element = |id: Option<NodeId>| id.map(|id| &self.nodes[id].element);
                f.debug_struct("Node")
                    .field("element", &node.element)
                    .field("color", &node.color)
                    .field("parent", &element(node.parent))
                    .field("left", &element(node.left))
                    .field("right", &element(node.right))
                    .finish()
            }
        }

        struct TreeDebug<'a, T, C, D: Destructor<T>> {
            tree: &'a RedBlackTree<T, C, D>,
        }

        impl<T: fmt::Debug, C, D: Destructor<T>> fmt::Debug for TreeDebug<'_, T, C, D> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();
                if let Some(root) = self.tree.root {
                    let _ = self.tree.inorder_for_each_core(root, &mut |id| {
                        f.entry(&NodeDebug {
                            nodes: &self.tree.nodes,
                            id,
                        });
                        ControlFlow::<()>::Continue(())
                    });
                }
                f.finish()
            }
        }

        f.debug_struct("RedBlackTree")
            .field("len", &self.len)
            .field(
                "root",
                &self.root.map(|id| NodeDebug {
                    nodes: &self.nodes,
                    id,
                }),
            )
            .field("nodes", &TreeDebug { tree: self })
            .finish()
    }
}

impl<T: Ord> RedBlackTree<T> {
    /// Creates an empty tree ordered by [`Ord`] that drops removed elements.
    pub fn new() -> Self {
        Self::with_callbacks(NaturalOrder, DropElement)
    }
}

impl<T: Ord> Default for RedBlackTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C, D> RedBlackTree<T, C, D>
where
    D: Destructor<T>,
{
    /// Creates an empty tree ordered by `comparator` that passes destroyed
    /// elements to `destructor`.
    pub fn with_callbacks(comparator: C, destructor: D) -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
            comparator,
            destructor,
        }
    }

    /// Creates an empty tree with room for `capacity` elements.
    ///
    /// Fails with [`Error::Alloc`] if the storage cannot be allocated.
    pub fn try_with_capacity(capacity: usize, comparator: C, destructor: D) -> Result<Self> {
        Ok(Self {
            nodes: Arena::try_with_capacity(capacity)?,
            root: None,
            len: 0,
            comparator,
            destructor,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Calls `visitor` on every element in ascending order.
    ///
    /// The walk stops as soon as `visitor` returns [`ControlFlow::Break`], whose
    /// value is then returned. [`ControlFlow::Continue`] is returned only if
    /// every element was visited, which is immediately the case for an empty
    /// tree.
    ///
    /// ```
    /// use core::ops::ControlFlow;
    /// use rbtree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// for it in [4, 2, 5, 1, 3] {
    ///     tree.insert(it).unwrap();
    /// }
    ///
    /// let mut seen = Vec::new();
    /// let flow = tree.for_each(|&it| {
    ///     seen.push(it);
    ///     if it == 3 { ControlFlow::Break(it) } else { ControlFlow::Continue(()) }
    /// });
    /// assert_eq!(flow, ControlFlow::Break(3));
    /// assert_eq!(seen, [1, 2, 3]);
    /// ```
    pub fn for_each<'a, B, F>(&'a self, mut visitor: F) -> ControlFlow<B>
    where
        F: FnMut(&'a T) -> ControlFlow<B>,
    {
        match self.root {
            Some(root) => {
                self.inorder_for_each_core(root, &mut |id| visitor(&self.nodes[id].element))
            }
            None => ControlFlow::Continue(()),
        }
    }

    fn inorder_for_each_core<B, F>(&self, node: NodeId, f: &mut F) -> ControlFlow<B>
    where
        F: FnMut(NodeId) -> ControlFlow<B>,
    {
        if let Some(l) = self.nodes[node].left {
            self.inorder_for_each_core(l, f)?;
        }
        f(node)?;
        if let Some(r) = self.nodes[node].right {
            self.inorder_for_each_core(r, f)?;
        }
        ControlFlow::Continue(())
    }

    /// Destroys every element, leaving an empty tree that can be reused.
    ///
    /// Each subtree is torn down right side first, then its root element is
    /// passed to the destructor, then the left side.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            debug!("tearing down {} elements", self.len);
            self.destroy_subtree(root);
        }
        self.nodes.clear();
        self.len = 0;
    }

    fn destroy_subtree(&mut self, node: NodeId) {
        let Node {
            element,
            left,
            right,
            ..
        } = self.nodes.release(node);
        if let Some(r) = right {
            self.destroy_subtree(r);
        }
        self.destructor.destroy(element);
        if let Some(l) = left {
            self.destroy_subtree(l);
        }
    }

    /// Color of a possibly absent node, absent children count as black.
    #[inline]
    fn color_of(&self, node: Option<NodeId>) -> Color {
        node.map_or(Color::Black, |node| self.nodes[node].color)
    }

    #[inline]
    fn set_color(&mut self, node: NodeId, color: Color) {
        self.nodes[node].color = color;
    }

    fn pos(&self, node: NodeId) -> NodePos {
        match self.nodes[node].parent {
            None => NodePos::Root,
            Some(parent) => {
                let side = if self.nodes[parent].left == Some(node) {
                    Side::Left
                } else {
                    debug_assert_eq!(self.nodes[parent].right, Some(node));
                    Side::Right
                };
                NodePos::Child { parent, side }
            }
        }
    }

    fn min_of(&self, root: NodeId) -> NodeId {
        let mut x = root;
        while let Some(left) = self.nodes[x].left {
            x = left;
        }

        x
    }

    /// Replaces subtree `old` with subtree `new`.
    ///
    /// The parent of `old` (or the root if `old` was the root) points to `new`
    /// afterwards and `new` points back to that parent. `old` keeps its own
    /// parent link.
    fn replace_subtree(&mut self, old: NodeId, new: Option<NodeId>) {
        match self.pos(old) {
            NodePos::Root => self.root = new,
            NodePos::Child { parent, side } => self.nodes[parent].set_child(side, new),
        }
        if let Some(new) = new {
            self.nodes[new].parent = self.nodes[old].parent;
        }
    }

    /// Rotates the subtree rooted at `node` towards `side`, lifting the child on
    /// the opposite side into `node`'s place.
    fn rotate(&mut self, node: NodeId, side: Side) {
        match side {
            Side::Left => self.rotate_left(node),
            Side::Right => self.rotate_right(node),
        }
    }

    fn rotate_left(&mut self, node: NodeId) {
        //    p                       p
        //    |                       |
        // +-node-+               +-right-+
        // |      |      -->      |       |
        // a  +-right-+       +-node-+    c
        //    |       |       |      |
        //    b       c       a      b
        let Some(right) = self.nodes[node].right else {
            return;
        };

        // attach b to node
        let b = self.nodes[right].left;
        self.nodes[node].right = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(node);
        }

        // attach right to p
        self.replace_subtree(node, Some(right));

        // attach node to right
        self.nodes[right].left = Some(node);
        self.nodes[node].parent = Some(right);
    }

    fn rotate_right(&mut self, node: NodeId) {
        //         p              p
        //         |              |
        //     +-node-+       +-left-+
        //     |      |       |      |
        // +-left-+   c  -->  a  +-node-+
        // |      |              |      |
        // a      b              b      c
        let Some(left) = self.nodes[node].left else {
            return;
        };

        let b = self.nodes[left].right;
        self.nodes[node].left = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(node);
        }

        self.replace_subtree(node, Some(left));

        self.nodes[left].right = Some(node);
        self.nodes[node].parent = Some(left);
    }

    fn insert_fixup(&mut self, new_node: NodeId) {
        let mut node = new_node;
        loop {
            let mut parent = match self.nodes[node].parent {
                Some(parent) if self.nodes[parent].color.is_red() => parent,
                // either `node` is the root or its parent is black
                _ => break,
            };
            debug_assert!(self.nodes[node].color.is_red());

            // A red parent is never the root, so the grandparent exists.
            let NodePos::Child {
                parent: grand_parent,
                side: parent_side,
            } = self.pos(parent)
            else {
                unreachable!("red {parent:?} is the root")
            };
            debug_assert!(self.nodes[grand_parent].color.is_black());
            let uncle = self.nodes[grand_parent].child(parent_side.opposite());

            if self.color_of(uncle).is_red() {
                //     +--- gp:b ---+               +--- gp:r ---+
                //     |            |               |            |
                //  + p:r +      + u:r +   -->   + p:b +      + u:b +
                //  |     |      |     |         |     |      |     |
                // n:r   a:b    b:b   c:b       n:r   a:b    b:b   c:b
                //
                // Black height is unchanged but gp may now have a red parent,
                // so repeat with gp as the new node.
                trace!("insert fixup: red uncle, moving up to {grand_parent:?}");
                self.set_color(parent, Color::Black);
                if let Some(uncle) = uncle {
                    self.set_color(uncle, Color::Black);
                }
                self.set_color(grand_parent, Color::Red);
                node = grand_parent;
                continue;
            }

            let inner_child = NodePos::Child {
                parent,
                side: parent_side.opposite(),
            };
            if self.pos(node) == inner_child {
                //       +-- gp:b --+                 +-- gp:b --+
                //       |          |                 |          |
                //  +-- p:r --+    u:b  -->       +- n:r --+    u:b
                //  |         |                   |        |
                // a:b    +- n:r -+           +- p:r -+   c:b
                //        |       |           |       |
                //       b:b     c:b         a:b     b:b
                trace!("insert fixup: black uncle, {node:?} is an inner child");
                self.rotate(parent, parent_side);
                mem::swap(&mut parent, &mut node);
            }

            //           +-- gp:b --+            +----- p:b -----+
            //           |          |            |               |
            //      +-- p:r --+    u:b  -->   +- n:r -+     +- gp:r -+
            //      |         |               |       |     |        |
            //  +- n:r -+    c:b             a:b     b:b   c:b      u:b
            //
            // The parent is black now, which ends the loop.
            trace!("insert fixup: black uncle, rotating {grand_parent:?}");
            self.set_color(parent, Color::Black);
            self.set_color(grand_parent, Color::Red);
            self.rotate(grand_parent, parent_side.opposite());
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    /// Unlinks `node` and returns its element.
    ///
    /// A node with two children trades elements with its in-order successor
    /// first, and the successor's node is the one that leaves the tree.
    fn remove_node(&mut self, node: NodeId) -> T {
        let to_remove = match (self.nodes[node].left, self.nodes[node].right) {
            (Some(_), Some(right)) => {
                // minimum of the right subtree, it has no left child
                let successor = self.min_of(right);
                self.nodes.swap_elements(node, successor);
                successor
            }
            _ => node,
        };

        match self.removal(to_remove) {
            Removal::RedLeaf => {
                trace!("delete: red leaf {to_remove:?}");
                self.replace_subtree(to_remove, None);
            }
            Removal::BlackWithRedChild(child) => {
                trace!("delete: black {to_remove:?} with red child {child:?}");
                self.replace_subtree(to_remove, Some(child));
                self.set_color(child, Color::Black);
            }
            Removal::BlackLeaf => {
                let pos = self.pos(to_remove);
                self.replace_subtree(to_remove, None);
                if let NodePos::Child { parent, side } = pos {
                    trace!("delete: black leaf {to_remove:?}, rebalancing");
                    self.rebalance(parent, side);
                }
            }
        }

        self.len -= 1;
        self.nodes.release(to_remove).element
    }

    fn removal(&self, node: NodeId) -> Removal {
        let node = &self.nodes[node];
        debug_assert!(node.left.is_none() || node.right.is_none());
        match (node.color, node.left.or(node.right)) {
            (Color::Red, None) => Removal::RedLeaf,
            (Color::Black, None) => Removal::BlackLeaf,
            (Color::Black, Some(child)) => {
                debug_assert!(self.nodes[child].color.is_red());
                Removal::BlackWithRedChild(child)
            }
            (Color::Red, Some(_)) => unreachable!("red node with a single child"),
        }
    }

    /// Restores the black height after the child slot `side` of `parent` lost
    /// a black node.
    fn rebalance(&mut self, mut parent: NodeId, mut side: Side) {
        loop {
            match self.rebalance_step(parent, side) {
                Step::Done => break,
                Step::Continue {
                    parent: next_parent,
                    side: next_side,
                } => {
                    parent = next_parent;
                    side = next_side;
                }
            }
        }
    }

    fn double_black(&self, parent: NodeId, side: Side, sibling: NodeId) -> DoubleBlack {
        let sibling_node = &self.nodes[sibling];
        if sibling_node.color.is_red() {
            DoubleBlack::RedSibling
        } else if self.color_of(sibling_node.child(side.opposite())).is_red() {
            DoubleBlack::FarNephewRed
        } else if self.color_of(sibling_node.child(side)).is_red() {
            DoubleBlack::NearNephewRed
        } else if self.nodes[parent].color.is_red() {
            DoubleBlack::RedParent
        } else {
            DoubleBlack::BlackParent
        }
    }

    fn rebalance_step(&mut self, parent: NodeId, side: Side) -> Step {
        // Paths through `side` are one black short, so the other side holds at
        // least one black node and the sibling exists.
        let Some(sibling) = self.nodes[parent].child(side.opposite()) else {
            unreachable!("double-black {side:?} child of {parent:?} has no sibling")
        };

        let case = self.double_black(parent, side, sibling);
        trace!("delete fixup: {case:?} at {parent:?}, {side:?} side");
        match case {
            DoubleBlack::RedSibling => {
                //     +--- p:b ---+                    +--- s:b ---+
                //     |           |                    |           |
                //     x       +- s:r -+    -->     +- p:r -+      d:b
                //             |       |            |       |
                //            c:b     d:b           x      c:b
                //
                // Same deficit, but now under a red parent with a black sibling.
                debug_assert!(self.nodes[parent].color.is_black());
                self.set_color(parent, Color::Red);
                self.set_color(sibling, Color::Black);
                self.rotate(parent, side);
                Step::Continue { parent, side }
            }
            DoubleBlack::RedParent => {
                // The parent's black makes up for the missing one.
                self.set_color(sibling, Color::Red);
                self.set_color(parent, Color::Black);
                Step::Done
            }
            DoubleBlack::BlackParent => {
                // Both sides are short now, so the whole subtree is.
                self.set_color(sibling, Color::Red);
                match self.pos(parent) {
                    NodePos::Root => Step::Done,
                    NodePos::Child { parent, side } => Step::Continue { parent, side },
                }
            }
            DoubleBlack::NearNephewRed => {
                //     +--- p ---+                  +--- p ---+
                //     |         |                  |         |
                //     x     +- s:b -+    -->       x     +- c:b -+
                //           |       |                    |       |
                //          c:r     d:b                   e     +- s:r -+
                //                                              |       |
                //                                              f      d:b
                let Some(near) = self.nodes[sibling].child(side) else {
                    unreachable!("red near nephew of {parent:?} is missing")
                };
                self.set_color(near, Color::Black);
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, side.opposite());
                // the far nephew is red now
                Step::Continue { parent, side }
            }
            DoubleBlack::FarNephewRed => {
                //     +--- p:c ---+                     +--- s:c ---+
                //     |           |                     |           |
                //     x       +- s:b -+    -->      +- p:b -+      d:b
                //             |       |             |       |
                //             c      d:r            x       c
                let Some(far) = self.nodes[sibling].child(side.opposite()) else {
                    unreachable!("red far nephew of {parent:?} is missing")
                };
                let parent_color = self.nodes[parent].color;
                self.set_color(sibling, parent_color);
                self.set_color(parent, Color::Black);
                self.set_color(far, Color::Black);
                self.rotate(parent, side);
                Step::Done
            }
        }
    }
}

impl<T, C, D> RedBlackTree<T, C, D>
where
    C: Comparator<T>,
    D: Destructor<T>,
{
    fn search(&self, element: &T) -> Search {
        let mut slot = None;
        let mut maybe_node = self.root;
        while let Some(node) = maybe_node {
            let side = match self.comparator.compare(&self.nodes[node].element, element) {
                Ordering::Equal => return Search::Found(node),
                Ordering::Less => Side::Right,
                Ordering::Greater => Side::Left,
            };
            slot = Some((node, side));
            maybe_node = self.nodes[node].child(side);
        }

        Search::Vacant(slot)
    }

    fn find(&self, element: &T) -> Option<NodeId> {
        match self.search(element) {
            Search::Found(node) => Some(node),
            Search::Vacant(_) => None,
        }
    }

    /// Returns `true` if an element comparing equal to `element` is stored.
    pub fn contains(&self, element: &T) -> bool {
        self.find(element).is_some()
    }

    /// Returns the stored element comparing equal to `element`.
    pub fn get(&self, element: &T) -> Option<&T> {
        self.find(element).map(|node| &self.nodes[node].element)
    }

    /// Adds `element` to the tree.
    ///
    /// Fails with [`Error::Duplicate`] if an equal element is already stored,
    /// or with [`Error::Alloc`] if there's no memory for a new node. On
    /// failure the tree is left untouched, the destructor is not called and
    /// the element is handed back inside the error.
    pub fn insert(&mut self, element: T) -> Result<(), InsertError<T>> {
        let slot = match self.search(&element) {
            Search::Found(_) => {
                debug!("insert rejected, an equal element is already stored");
                return Err(InsertError::new(Error::Duplicate, element));
            }
            Search::Vacant(slot) => slot,
        };

        // nothing may be linked before the node storage is secured
        if let Err(err) = self.nodes.try_reserve_one() {
            debug!("insert rejected, cannot allocate a node: {err}");
            return Err(InsertError::new(err.into(), element));
        }

        let parent = slot.map(|(parent, _)| parent);
        let new_node = self.nodes.allocate(Node::new(element, parent));
        match slot {
            Some((parent, side)) => self.nodes[parent].set_child(side, Some(new_node)),
            None => self.root = Some(new_node),
        }

        self.len += 1;
        self.insert_fixup(new_node);
        Ok(())
    }

    /// Removes the element comparing equal to `element` and passes it to the
    /// destructor.
    ///
    /// Fails with [`Error::NotFound`], leaving the tree untouched, if there's
    /// no such element.
    pub fn delete(&mut self, element: &T) -> Result<()> {
        let Some(node) = self.find(element) else {
            debug!("delete rejected, element is not stored");
            return Err(Error::NotFound);
        };
        let removed = self.remove_node(node);
        self.destructor.destroy(removed);
        Ok(())
    }

    /// Removes the element comparing equal to `element` and returns it
    /// instead of destroying it.
    pub fn take(&mut self, element: &T) -> Option<T> {
        self.find(element).map(|node| self.remove_node(node))
    }

    /// Plain binary search tree insert, without any rebalancing.
    #[cfg(test)]
    fn insert_bst(&mut self, element: T) {
        let Search::Vacant(slot) = self.search(&element) else {
            return;
        };
        let new_node = self
            .nodes
            .allocate(Node::new(element, slot.map(|(parent, _)| parent)));
        self.set_color(new_node, Color::Black);
        match slot {
            Some((parent, side)) => self.nodes[parent].set_child(side, Some(new_node)),
            None => self.root = Some(new_node),
        }
        self.len += 1;
    }
}
