//! Red-black tree over arena-resident records.
//!
//! Records live in [`Arena`] slots addressed by stable [`NodeId`]
//! handles; the tree threads color and parent/left/right relations
//! through each slot, so the container itself never allocates per node
//! beyond the arena's backing storage. Ordering comes from a comparator
//! bound at construction instead of a per-call callback table.
//!
//! Invariants maintained after every completed public operation:
//!  1. every node is red or black,
//!  2. the root, if present, is black,
//!  3. every absent child counts as a black leaf,
//!  4. a red node has no red child,
//!  5. every path from a node down to an absent leaf crosses the same
//!     number of black nodes.
//!
//! Single-threaded by contract: no internal synchronization, and a
//! traversal cursor is invalidated by any structural mutation other
//! than removing the node the cursor was captured before.

#![cfg_attr(not(test), no_std)]

use core::cmp::Ordering;

use copse_arena::Arena;
pub use copse_arena::NodeId;
use static_assertions::assert_eq_size;

/// Node color.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Color {
    Red = 0,
    Black = 1,
}

assert_eq_size!(Color, u8);

/// Which child slot of a parent a node occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Ordering bound to a tree at construction.
///
/// `cmp` drives insertion (resident record against incoming record);
/// `cmp_key` drives lookup (resident record against an external key).
/// The two must agree on relative order, and no two records in one tree
/// may compare equal. Comparator state replaces the opaque context
/// value a callback-table design would thread through every call.
pub trait TreeOrd<T> {
    /// External key type accepted by [`RbTree::find`].
    type Key: ?Sized;

    fn cmp(&self, a: &T, b: &T) -> Ordering;

    fn cmp_key(&self, item: &T, key: &Self::Key) -> Ordering;
}

/// Natural ordering for `T: Ord`, keyed by the record itself.
#[derive(Debug, Default, Copy, Clone)]
pub struct Natural;

impl<T: Ord> TreeOrd<T> for Natural {
    type Key = T;

    fn cmp(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }

    fn cmp_key(&self, item: &T, key: &T) -> Ordering {
        item.cmp(key)
    }
}

#[derive(Debug)]
struct Node<T> {
    item: T,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Outcome of [`RbTree::insert`].
#[derive(Debug, PartialEq, Eq)]
pub enum Entry<T> {
    /// The record was linked into a fresh slot.
    New(NodeId),
    /// A record with an equal key is already resident. The rejected
    /// record is handed back and the tree is untouched.
    Existing(NodeId, T),
}

impl<T> Entry<T> {
    /// Id of the resident record, freshly linked or pre-existing.
    pub fn id(&self) -> NodeId {
        match *self {
            Entry::New(id) | Entry::Existing(id, _) => id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Entry::New(_))
    }
}

/// Self-balancing ordered container with stable record handles.
///
/// Worst-case O(log n) insert, lookup, and removal. The tree owns the
/// arena; callers address resident records by [`NodeId`] and get the
/// record back by value on removal.
#[derive(Debug)]
pub struct RbTree<T, O = Natural> {
    arena: Arena<Node<T>>,
    root: Option<NodeId>,
    ord: O,
}

impl<T, O: Default> Default for RbTree<T, O> {
    fn default() -> Self {
        Self::new(O::default())
    }
}

impl<T, O> RbTree<T, O> {
    pub fn new(ord: O) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            ord,
        }
    }

    pub fn with_capacity(capacity: usize, ord: O) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            root: None,
            ord,
        }
    }

    /// Number of resident records.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.item)
    }

    /// Mutable access to a resident record. The mutation must not move
    /// the record relative to its neighbors under the tree's ordering.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.item)
    }

    /// Structural parent of `id`, `None` at the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    /// First record in traversal order, `None` on an empty tree.
    pub fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost(root))
    }

    /// Last record in traversal order, `None` on an empty tree.
    pub fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.rightmost(root))
    }

    /// Deepest left descendant of `id`. O(height).
    pub fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    /// Deepest right descendant of `id`. O(height).
    pub fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.node(id).right {
            id = right;
        }
        id
    }

    /// In-order successor of `id`, `None` past the last record.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        debug_assert!(self.is_member(id));

        if let Some(right) = self.node(id).right {
            return Some(self.leftmost(right));
        }

        // Climb until the edge crossed comes up from a left child.
        let mut node = id;
        while let Some(parent) = self.node(node).parent {
            if self.node(parent).right == Some(node) {
                node = parent;
            } else {
                return Some(parent);
            }
        }
        None
    }

    /// In-order predecessor of `id`, `None` before the first record.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        debug_assert!(self.is_member(id));

        if let Some(left) = self.node(id).left {
            return Some(self.rightmost(left));
        }

        let mut node = id;
        while let Some(parent) = self.node(node).parent {
            if self.node(parent).left == Some(node) {
                node = parent;
            } else {
                return Some(parent);
            }
        }
        None
    }

    /// In-order iteration over `(id, record)` pairs.
    pub fn iter(&self) -> Iter<'_, T, O> {
        Iter {
            tree: self,
            cursor: self.first(),
        }
    }

    /// Attach `item` as a fresh red node in the empty `side` slot of
    /// `parent` (or as the root when `parent` is `None`), then
    /// rebalance. Building block for custom insertion variants such as
    /// multi-key indexes; [`RbTree::insert`] is the standard descent
    /// over it. The slot must be empty and the position must respect
    /// the tree's ordering.
    pub fn link(&mut self, item: T, parent: Option<NodeId>, side: Side) -> NodeId {
        let id = self.arena.insert(Node {
            item,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });

        match parent {
            Some(p) => match side {
                Side::Left => {
                    debug_assert!(self.node(p).left.is_none());
                    self.node_mut(p).left = Some(id);
                }
                Side::Right => {
                    debug_assert!(self.node(p).right.is_none());
                    self.node_mut(p).right = Some(id);
                }
            },
            None => {
                debug_assert!(self.root.is_none());
                self.root = Some(id);
            }
        }

        self.insert_fixup(id);
        id
    }

    /// Swap the record stored at `id` for `item`, keeping the node's
    /// structural position and color untouched. The caller warrants
    /// that `item` occupies the same ordering position as the record it
    /// displaces.
    pub fn replace(&mut self, id: NodeId, item: T) -> T {
        debug_assert!(self.is_member(id));
        core::mem::replace(&mut self.node_mut(id).item, item)
    }

    /// Detach the record at `id` and hand it back. `id` becomes stale.
    ///
    /// Removing an id that is not resident in this tree is a contract
    /// violation, checked in debug builds only.
    pub fn remove(&mut self, id: NodeId) -> T {
        debug_assert!(self.is_member(id));

        let left = self.node(id).left;
        let right = self.node(id).right;

        let spliced_color;
        let child;
        let mut fixup_parent;

        match (left, right) {
            (None, only) | (only, None) => {
                // At most one child: splice the node out directly.
                spliced_color = self.node(id).color;
                child = only;
                fixup_parent = self.node(id).parent;
                self.splice(id, child, fixup_parent);
            }
            (Some(_), Some(right)) => {
                // Two children: the in-order successor (leftmost of the
                // right subtree, never holding a left child) is spliced
                // out of its own position, then takes over this one.
                let succ = self.leftmost(right);
                spliced_color = self.node(succ).color;
                child = self.node(succ).right;
                fixup_parent = self.node(succ).parent;
                self.splice(succ, child, fixup_parent);

                if fixup_parent == Some(id) {
                    // The successor was the node's own right child; its
                    // former parent slot is the successor itself once
                    // the takeover completes.
                    fixup_parent = Some(succ);
                }

                // Read the victim's relations after the splice: the
                // splice may have rewritten its right child link.
                let (vcolor, vparent, vleft, vright) = {
                    let victim = self.node(id);
                    (victim.color, victim.parent, victim.left, victim.right)
                };

                {
                    let node = self.node_mut(succ);
                    node.color = vcolor;
                    node.parent = vparent;
                    node.left = vleft;
                    node.right = vright;
                }

                match vparent {
                    Some(p) => {
                        if self.node(p).left == Some(id) {
                            self.node_mut(p).left = Some(succ);
                        } else {
                            self.node_mut(p).right = Some(succ);
                        }
                    }
                    None => self.root = Some(succ),
                }
                if let Some(l) = vleft {
                    self.node_mut(l).parent = Some(succ);
                }
                if let Some(r) = vright {
                    self.node_mut(r).parent = Some(succ);
                }
            }
        }

        if spliced_color == Color::Black {
            // A black node left the tree; the vacated position is one
            // black short on every path through it.
            self.remove_fixup(child, fixup_parent);
        }

        self.arena.remove(id).item
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        &self.arena[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.arena[id]
    }

    /// Absent children count as black leaves.
    fn is_red(&self, id: Option<NodeId>) -> bool {
        match id {
            Some(id) => self.node(id).color == Color::Red,
            None => false,
        }
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    /// Membership probe backing the debug contract checks: the slot is
    /// occupied and climbing parents from `id` lands on this tree's
    /// root.
    fn is_member(&self, id: NodeId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        let mut node = id;
        while let Some(parent) = self.node(node).parent {
            node = parent;
        }
        self.root == Some(node)
    }

    /// Pivot `node` down-left; its right child takes its place. O(1),
    /// preserves in-order sequence, updates the root reference when the
    /// pivot was the root.
    fn rotate_left(&mut self, node: NodeId) {
        let pivot = match self.node(node).right {
            Some(pivot) => pivot,
            None => unreachable!("left rotation requires a right child"),
        };
        let inner = self.node(pivot).left;
        let parent = self.node(node).parent;

        // parent <-> pivot
        match parent {
            Some(p) => {
                if self.node(p).left == Some(node) {
                    self.node_mut(p).left = Some(pivot);
                } else {
                    self.node_mut(p).right = Some(pivot);
                }
            }
            None => self.root = Some(pivot),
        }
        self.node_mut(pivot).parent = parent;

        // node <-> pivot
        self.node_mut(node).parent = Some(pivot);
        self.node_mut(pivot).left = Some(node);

        // node <-> inner subtree
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(node);
        }
        self.node_mut(node).right = inner;
    }

    fn rotate_right(&mut self, node: NodeId) {
        let pivot = match self.node(node).left {
            Some(pivot) => pivot,
            None => unreachable!("right rotation requires a left child"),
        };
        let inner = self.node(pivot).right;
        let parent = self.node(node).parent;

        match parent {
            Some(p) => {
                if self.node(p).left == Some(node) {
                    self.node_mut(p).left = Some(pivot);
                } else {
                    self.node_mut(p).right = Some(pivot);
                }
            }
            None => self.root = Some(pivot),
        }
        self.node_mut(pivot).parent = parent;

        self.node_mut(node).parent = Some(pivot);
        self.node_mut(pivot).right = Some(node);

        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(node);
        }
        self.node_mut(node).left = inner;
    }

    /// Restore the coloring invariants after linking a red node.
    fn insert_fixup(&mut self, mut node: NodeId) {
        loop {
            let parent = match self.node(node).parent {
                Some(parent) if self.node(parent).color == Color::Red => parent,
                // Node is the root or hangs under a black parent.
                _ => break,
            };
            // A red parent is never the root, so the grandparent exists.
            let gparent = match self.node(parent).parent {
                Some(gparent) => gparent,
                None => unreachable!("red node at the root"),
            };

            if self.node(gparent).left == Some(parent) {
                let uncle = self.node(gparent).right;
                if self.is_red(uncle) {
                    // Red uncle: recolor and push the violation up two
                    // levels.
                    match uncle {
                        Some(uncle) => self.set_color(uncle, Color::Black),
                        None => unreachable!(),
                    }
                    self.set_color(parent, Color::Black);
                    self.set_color(gparent, Color::Red);
                    node = gparent;
                    continue;
                }

                // Inner child: rotate it out to the outer position.
                if self.node(parent).right == Some(node) {
                    self.rotate_left(parent);
                    node = parent;
                }
                let parent = match self.node(node).parent {
                    Some(parent) => parent,
                    None => unreachable!(),
                };
                let gparent = match self.node(parent).parent {
                    Some(gparent) => gparent,
                    None => unreachable!(),
                };
                self.set_color(parent, Color::Black);
                self.set_color(gparent, Color::Red);
                self.rotate_right(gparent);
                break;
            } else {
                let uncle = self.node(gparent).left;
                if self.is_red(uncle) {
                    match uncle {
                        Some(uncle) => self.set_color(uncle, Color::Black),
                        None => unreachable!(),
                    }
                    self.set_color(parent, Color::Black);
                    self.set_color(gparent, Color::Red);
                    node = gparent;
                    continue;
                }

                if self.node(parent).left == Some(node) {
                    self.rotate_right(parent);
                    node = parent;
                }
                let parent = match self.node(node).parent {
                    Some(parent) => parent,
                    None => unreachable!(),
                };
                let gparent = match self.node(parent).parent {
                    Some(gparent) => gparent,
                    None => unreachable!(),
                };
                self.set_color(parent, Color::Black);
                self.set_color(gparent, Color::Red);
                self.rotate_left(gparent);
                break;
            }
        }

        // Covers the loop exits that left a red root.
        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    /// Connect `node`'s only (possibly absent) child straight to its
    /// parent, or to the root slot.
    fn splice(&mut self, node: NodeId, child: Option<NodeId>, parent: Option<NodeId>) {
        match parent {
            Some(p) => {
                if self.node(p).left == Some(node) {
                    self.node_mut(p).left = child;
                } else {
                    self.node_mut(p).right = child;
                }
            }
            None => self.root = child,
        }
        if let Some(child) = child {
            self.node_mut(child).parent = parent;
        }
    }

    /// Redistribute black count after a black node was detached.
    /// `node` is the (possibly absent) child promoted into the vacated
    /// position, one black short on every path through it.
    fn remove_fixup(&mut self, mut node: Option<NodeId>, mut parent: Option<NodeId>) {
        while !self.is_red(node) {
            let p = match parent {
                Some(p) => p,
                // The deficit reached the root; dropping one black from
                // every path rebalances globally.
                None => break,
            };

            if self.node(p).left == node {
                let mut sibling = match self.node(p).right {
                    Some(sibling) => sibling,
                    None => unreachable!("black deficit implies a sibling"),
                };

                if self.node(sibling).color == Color::Red {
                    // Red sibling: rotate it above the parent, exposing
                    // a black sibling for the cases below.
                    self.rotate_left(p);
                    self.set_color(sibling, Color::Black);
                    self.set_color(p, Color::Red);
                    sibling = match self.node(p).right {
                        Some(sibling) => sibling,
                        None => unreachable!(),
                    };
                }

                let near = self.node(sibling).left;
                let far = self.node(sibling).right;

                if !self.is_red(near) && !self.is_red(far) {
                    // Both nephews black: recolor the sibling and push
                    // the deficit up. A red parent ends the loop and is
                    // blackened below.
                    self.set_color(sibling, Color::Red);
                    node = Some(p);
                    parent = self.node(p).parent;
                    continue;
                }

                let far = if !self.is_red(far) {
                    // Near nephew red: rotate it into the far slot.
                    let near = match near {
                        Some(near) => near,
                        None => unreachable!(),
                    };
                    self.rotate_right(sibling);
                    self.set_color(sibling, Color::Red);
                    self.set_color(near, Color::Black);
                    sibling = near;
                    match self.node(sibling).right {
                        Some(far) => far,
                        None => unreachable!(),
                    }
                } else {
                    match far {
                        Some(far) => far,
                        None => unreachable!(),
                    }
                };

                // Far nephew red: the sibling absorbs the parent's
                // color and the rotation repays the missing black.
                let pcolor = self.node(p).color;
                self.set_color(sibling, pcolor);
                self.set_color(p, Color::Black);
                self.set_color(far, Color::Black);
                self.rotate_left(p);

                node = self.root;
                break;
            } else {
                let mut sibling = match self.node(p).left {
                    Some(sibling) => sibling,
                    None => unreachable!("black deficit implies a sibling"),
                };

                if self.node(sibling).color == Color::Red {
                    self.rotate_right(p);
                    self.set_color(sibling, Color::Black);
                    self.set_color(p, Color::Red);
                    sibling = match self.node(p).left {
                        Some(sibling) => sibling,
                        None => unreachable!(),
                    };
                }

                let near = self.node(sibling).right;
                let far = self.node(sibling).left;

                if !self.is_red(near) && !self.is_red(far) {
                    self.set_color(sibling, Color::Red);
                    node = Some(p);
                    parent = self.node(p).parent;
                    continue;
                }

                let far = if !self.is_red(far) {
                    let near = match near {
                        Some(near) => near,
                        None => unreachable!(),
                    };
                    self.rotate_left(sibling);
                    self.set_color(sibling, Color::Red);
                    self.set_color(near, Color::Black);
                    sibling = near;
                    match self.node(sibling).left {
                        Some(far) => far,
                        None => unreachable!(),
                    }
                } else {
                    match far {
                        Some(far) => far,
                        None => unreachable!(),
                    }
                };

                let pcolor = self.node(p).color;
                self.set_color(sibling, pcolor);
                self.set_color(p, Color::Black);
                self.set_color(far, Color::Black);
                self.rotate_right(p);

                node = self.root;
                break;
            }
        }

        // Ordinary exits and the red-child-absorbs-the-deficit case.
        if let Some(node) = node {
            self.set_color(node, Color::Black);
        }
    }
}

impl<T, O: TreeOrd<T>> RbTree<T, O> {
    /// Insert `item`, or hand it back if a record with an equal key is
    /// already resident. The tree is left untouched on a duplicate.
    pub fn insert(&mut self, item: T) -> Entry<T> {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cursor = self.root;

        while let Some(id) = cursor {
            parent = Some(id);
            match self.ord.cmp(&self.node(id).item, &item) {
                Ordering::Greater => {
                    side = Side::Left;
                    cursor = self.node(id).left;
                }
                Ordering::Less => {
                    side = Side::Right;
                    cursor = self.node(id).right;
                }
                Ordering::Equal => return Entry::Existing(id, item),
            }
        }

        Entry::New(self.link(item, parent, side))
    }

    /// Look up the record matching `key`. Never mutates the tree.
    pub fn find(&self, key: &O::Key) -> Option<NodeId> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            match self.ord.cmp_key(&self.node(id).item, key) {
                Ordering::Greater => cursor = self.node(id).left,
                Ordering::Less => cursor = self.node(id).right,
                Ordering::Equal => return Some(id),
            }
        }
        None
    }
}

/// In-order iterator over a tree. Invalidated by structural mutation.
pub struct Iter<'a, T, O> {
    tree: &'a RbTree<T, O>,
    cursor: Option<NodeId>,
}

impl<'a, T, O> Iterator for Iter<'a, T, O> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = self.tree.next(id);
        Some((id, &self.tree.arena[id].item))
    }
}
