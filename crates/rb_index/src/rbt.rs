//! Ordered Index - Red-Black Tree
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::string::String;
use core::{cmp::Ordering, fmt, iter::FusedIterator};

use crate::{
    node::{Color, Direction, NodeId, Storage},
    Error, IndexKey, Result,
};

/// A red-black tree keyed by [IndexKey::Key].
///
/// Every node is owned by the tree's internal arena. Child links own, parent links only point
/// back up, so dropping the tree releases every node exactly once.
pub struct Rbt<D>
where
    D: IndexKey,
{
    storage: Storage<D>,
    root: Option<NodeId>,
}

impl<D> Rbt<D>
where
    D: IndexKey,
{
    /// Creates an empty red-black tree.
    pub const fn new() -> Self {
        Rbt { storage: Storage::new(), root: None }
    }

    /// Creates an empty red-black tree with room for `capacity` nodes before it reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Rbt { storage: Storage::with_capacity(capacity), root: None }
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Indicates whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of nodes the tree can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the black-height of the tree, counted as the black nodes on the leftmost path
    /// from the root down to an absent child.
    ///
    /// In a valid tree every root-to-leaf path carries this many black nodes.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(node) = current {
            if self.storage.is_black(Some(node)) {
                height += 1;
            }
            current = self.storage.left(Some(node));
        }
        height
    }

    /// Returns a handle to the root of the tree.
    pub fn root(&self) -> Option<NodeRef<'_, D>> {
        self.root.map(|id| NodeRef { storage: &self.storage, id })
    }

    /// Removes every element from the tree.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.root = None;
    }

    /// Adds a value into the tree. Adding a key that is already present is a no-op.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn insert(&mut self, data: D) {
        if self.try_insert(data).is_err() {
            log::debug!("Ignoring insert of a key that is already present.");
        }
    }

    /// Adds a value into the tree.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [AlreadyExists](Error::AlreadyExists) if the key already exists in the tree. The
    /// tree is left untouched in that case.
    ///
    pub fn try_insert(&mut self, data: D) -> Result<()> {
        let Some(root) = self.root else {
            let node = self.storage.add(data);
            self.storage.set_black(Some(node));
            self.root = Some(node);
            self.verify();
            return Ok(());
        };

        let (parent, dir) = self.find_slot(root, data.key()).ok_or(Error::AlreadyExists)?;
        let node = self.storage.add(data);
        self.storage.set_child(Some(parent), dir, Some(node));
        self.storage.set_parent(Some(node), Some(parent));

        self.fixup_add(node);
        self.storage.set_black(self.root);
        self.verify();
        Ok(())
    }

    /// Finds the empty child slot where `key` belongs, or `None` if `key` is already present.
    fn find_slot(&self, start: NodeId, key: &D::Key) -> Option<(NodeId, Direction)> {
        let mut current = start;
        loop {
            let dir = match key.cmp(self.storage.node(current).key()) {
                Ordering::Less => Direction::Left,
                Ordering::Greater => Direction::Right,
                Ordering::Equal => return None,
            };
            match self.storage.child(Some(current), dir) {
                Some(next) => current = next,
                None => return Some((current, dir)),
            }
        }
    }

    /// Searches for a key in the tree, returning a handle to its node if it exists.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn search(&self, key: &D::Key) -> Option<NodeRef<'_, D>> {
        self.get_node(key).map(|id| NodeRef { storage: &self.storage, id })
    }

    /// Searches for a value in the tree, returning it if it exists.
    pub fn get(&self, key: &D::Key) -> Option<&D> {
        self.get_node(key).map(|id| &self.storage.node(id).data)
    }

    /// Indicates whether `key` is present in the tree.
    pub fn contains(&self, key: &D::Key) -> bool {
        self.get_node(key).is_some()
    }

    /// Returns the first ordered value in the tree, `None` if the tree is empty.
    pub fn first(&self) -> Option<&D> {
        self.root.map(|root| &self.storage.node(self.storage.extreme(root, Direction::Left)).data)
    }

    /// Returns the last ordered value in the tree, `None` if the tree is empty.
    pub fn last(&self) -> Option<&D> {
        self.root.map(|root| &self.storage.node(self.storage.extreme(root, Direction::Right)).data)
    }

    /// Returns an iterator over the values of the tree in key order.
    pub fn iter(&self) -> Iter<'_, D> {
        Iter {
            storage: &self.storage,
            front: self.root.map(|root| self.storage.extreme(root, Direction::Left)),
            back: self.root.map(|root| self.storage.extreme(root, Direction::Right)),
            remaining: self.len(),
        }
    }

    fn get_node(&self, key: &D::Key) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(node) = current {
            match key.cmp(self.storage.node(node).key()) {
                Ordering::Equal => return Some(node),
                Ordering::Less => current = self.storage.left(Some(node)),
                Ordering::Greater => current = self.storage.right(Some(node)),
            }
        }
        None
    }

    /// Deletes a value from the tree. Deleting a key that is not present is a no-op.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    pub fn delete(&mut self, key: &D::Key) {
        if self.try_delete(key).is_err() {
            log::debug!("Ignoring delete of a key that is not present.");
        }
    }

    /// Deletes a value from the tree, returning it.
    ///
    /// # Time Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [NotFound](Error::NotFound) if the key does not exist in the tree.
    ///
    pub fn try_delete(&mut self, key: &D::Key) -> Result<D> {
        let node = self.get_node(key).ok_or(Error::NotFound)?;
        let data = self.remove_node(node);
        self.verify();
        Ok(data)
    }

    /// Unlinks `node`'s value from the tree and rebalances, returning the value.
    fn remove_node(&mut self, node: NodeId) -> D {
        // With two children, the successor's value is moved up into `node` and the successor,
        // which has no left child, is the node that is physically excised instead.
        let target = match (self.storage.left(Some(node)), self.storage.right(Some(node))) {
            (Some(_), Some(right)) => {
                let successor = self.storage.extreme(right, Direction::Left);
                self.storage.swap_data(node, successor);
                successor
            }
            _ => node,
        };

        let child = self.storage.left(Some(target)).or_else(|| self.storage.right(Some(target)));
        let parent = self.storage.parent(Some(target));
        let side = self.storage.side(target);

        self.storage.set_parent(child, parent);
        match side {
            Some(side) => self.storage.set_child(parent, side, child),
            None => self.root = child,
        }

        let color = self.storage.color(Some(target));
        let data = self.storage.delete(target);

        // Removing a red node never changes a black-height.
        if color == Color::Black {
            match (parent, side) {
                (Some(parent), Some(side)) => self.fixup_delete(child, parent, side),
                _ => self.storage.set_black(self.root),
            }
        }
        data
    }

    /// Rotates the subtree rooted at `node` so that `node` moves down towards `dir` and its child
    /// on the opposite side takes its place. Returns the new root of the subtree.
    ///
    /// Keys keep their order and colors are left for the caller to fix.
    fn rotate(&mut self, node: NodeId, dir: Direction) -> NodeId {
        let pivot = self.storage.child(Some(node), dir.opposite()).expect("Rotation pivot child must exist");
        let parent = self.storage.parent(Some(node));
        let side = self.storage.side(node);
        let inner = self.storage.child(Some(pivot), dir);

        self.storage.set_child(Some(node), dir.opposite(), inner);
        self.storage.set_parent(inner, Some(node));

        self.storage.set_child(Some(pivot), dir, Some(node));
        self.storage.set_parent(Some(node), Some(pivot));

        self.storage.set_parent(Some(pivot), parent);
        match side {
            Some(side) => self.storage.set_child(parent, side, Some(pivot)),
            None => self.root = Some(pivot),
        }

        log::trace!("Rotated {:?} around {:?}.", dir, node);
        pivot
    }

    /// Updates the tree after a node has been added, to meet the red-black tree properties.
    ///
    /// Entering each iteration the only possible violation is a red `node` under a red parent.
    fn fixup_add(&mut self, node: NodeId) {
        let mut node = node;
        loop {
            // The node is the root of the tree or its parent is black, no fixups needed.
            let Some(mut parent) = self.storage.parent(Some(node)) else {
                return;
            };
            if self.storage.is_black(Some(parent)) {
                return;
            }

            // A red parent is never the root, so the grandparent exists and is black.
            let grandparent = self.storage.parent(Some(parent)).expect("Parent is red, grandparent should exist");
            let parent_side = self.storage.side(parent).expect("Parent is red, grandparent should exist");
            let uncle = self.storage.sibling(parent);

            // Uncle is red: recolor parent, grandparent, uncle and push the violation up two levels.
            if self.storage.is_red(uncle) {
                log::trace!("Insert fixup: red uncle, recoloring.");
                self.storage.set_black(Some(parent));
                self.storage.set_black(uncle);
                self.storage.set_red(Some(grandparent));
                node = grandparent;
                continue;
            }

            // Uncle is black or absent.
            log::trace!("Insert fixup: uncle is {}, rotating.", if uncle.is_some() { "black" } else { "absent" });

            // An inner grandchild is first rotated into the outer position.
            if self.storage.side(node) == Some(parent_side.opposite()) {
                self.rotate(parent, parent_side);
                parent = node;
            }

            self.storage.set_black(Some(parent));
            self.storage.set_red(Some(grandparent));
            self.rotate(grandparent, parent_side.opposite());
            return;
        }
    }

    /// Updates the tree after a black node has been removed, to meet the red-black tree
    /// properties.
    ///
    /// `node` is the position carrying the extra black, hanging from `parent` on `side`. It may be
    /// absent when a leaf was removed, which is why the side is tracked explicitly rather than
    /// derived from the links.
    fn fixup_delete(&mut self, node: Option<NodeId>, parent: NodeId, side: Direction) {
        let (mut node, mut parent, mut side) = (node, parent, side);
        loop {
            // A red node absorbs the extra black.
            if self.storage.is_red(node) {
                break;
            }

            // The double-black side has a black-height of at least one on the sibling's side.
            let mut sibling = self
                .storage
                .child(Some(parent), side.opposite())
                .expect("Double-black position must have a sibling");

            // Red sibling: rotate it above the parent so the new sibling is black.
            if self.storage.is_red(Some(sibling)) {
                log::trace!("Delete fixup: red sibling.");
                self.storage.set_black(Some(sibling));
                self.storage.set_red(Some(parent));
                self.rotate(parent, side);
                sibling = self
                    .storage
                    .child(Some(parent), side.opposite())
                    .expect("Double-black position must have a sibling");
            }

            let inner = self.storage.child(Some(sibling), side);
            let outer = self.storage.child(Some(sibling), side.opposite());

            // Black sibling with two black children: move the extra black up to the parent.
            if self.storage.is_black(inner) && self.storage.is_black(outer) {
                log::trace!("Delete fixup: black sibling with black children.");
                self.storage.set_red(Some(sibling));
                node = Some(parent);
                match self.storage.side(parent) {
                    Some(parent_side) => {
                        side = parent_side;
                        parent = self.storage.parent(Some(parent)).expect("Non-root node must have a parent");
                    }
                    None => break,
                }
                continue;
            }

            // Black sibling with a red child. A red inner nephew is first rotated to the outside.
            if self.storage.is_black(outer) {
                log::trace!("Delete fixup: red inner nephew.");
                self.storage.set_black(inner);
                self.storage.set_red(Some(sibling));
                self.rotate(sibling, side.opposite());
                sibling = self
                    .storage
                    .child(Some(parent), side.opposite())
                    .expect("Double-black position must have a sibling");
            }

            log::trace!("Delete fixup: red outer nephew.");
            let parent_color = self.storage.color(Some(parent));
            let outer = self.storage.child(Some(sibling), side.opposite());
            self.storage.set_color(Some(sibling), parent_color);
            self.storage.set_black(Some(parent));
            self.storage.set_black(outer);
            self.rotate(parent, side);
            node = self.root;
            break;
        }
        self.storage.set_black(node);
    }

    /// Panics if the tree is broken. Only active with the `verify` feature.
    #[inline]
    fn verify(&self) {
        if cfg!(feature = "verify") {
            assert!(self.check(), "Red-black tree properties do not hold after mutation");
        }
    }

    /// Verifies every property of the tree: key ordering, a black root, no red node with a red
    /// parent, an equal number of black nodes on every root-to-leaf path, and parent links that
    /// mirror the child links.
    ///
    /// The first violation found is logged at `error` level.
    ///
    /// # Time Complexity
    ///
    /// O(n)
    ///
    pub fn check(&self) -> bool {
        let Some(root) = self.root else {
            return true;
        };
        if self.storage.parent(Some(root)).is_some() {
            log::error!("Root {:?} has a parent.", root);
            return false;
        }
        if self.storage.is_red(Some(root)) {
            log::error!("Root {:?} is red.", root);
            return false;
        }
        self.is_bst(self.root, None, None)
            && self.is_rbt(self.root, self.height(), Color::Black)
            && self.is_linked(root)
    }

    /// Checks that every key lies strictly between `min` and `max`.
    fn is_bst(&self, node: Option<NodeId>, min: Option<&D::Key>, max: Option<&D::Key>) -> bool {
        let Some(id) = node else {
            return true;
        };
        let key = self.storage.node(id).key();
        if min.is_some_and(|min| key <= min) || max.is_some_and(|max| key >= max) {
            log::error!("Node {:?} is out of key order.", id);
            return false;
        }
        self.is_bst(self.storage.left(node), min, Some(key)) && self.is_bst(self.storage.right(node), Some(key), max)
    }

    /// Checks that no red node has a red parent and that every path below `node` carries exactly
    /// `black_height` black nodes.
    fn is_rbt(&self, node: Option<NodeId>, black_height: usize, parent_color: Color) -> bool {
        let Some(id) = node else {
            if black_height != 0 {
                log::error!("Black-height differs between paths.");
            }
            return black_height == 0;
        };

        let color = self.storage.color(node);
        let remaining = match color {
            Color::Black => match black_height.checked_sub(1) {
                Some(remaining) => remaining,
                None => {
                    log::error!("Black-height differs between paths at {:?}.", id);
                    return false;
                }
            },
            Color::Red if parent_color == Color::Red => {
                log::error!("Red node {:?} has a red parent.", id);
                return false;
            }
            Color::Red => black_height,
        };

        self.is_rbt(self.storage.left(node), remaining, color) && self.is_rbt(self.storage.right(node), remaining, color)
    }

    /// Checks that each child's parent link points back at its parent.
    fn is_linked(&self, id: NodeId) -> bool {
        [self.storage.left(Some(id)), self.storage.right(Some(id))].into_iter().flatten().all(|child| {
            if self.storage.parent(Some(child)) != Some(id) {
                log::error!("Node {:?} does not link back to its parent {:?}.", child, id);
                return false;
            }
            self.is_linked(child)
        })
    }

    fn fmt_preorder(&self, node: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        D::Key: fmt::Display,
    {
        write!(f, "{}{}", self.storage.node(node).key(), self.storage.color(Some(node)).as_char())?;

        let children = [self.storage.left(Some(node)), self.storage.right(Some(node))];
        let mut children = children.into_iter().flatten().peekable();
        if children.peek().is_none() {
            return Ok(());
        }

        f.write_str(" {")?;
        let mut first = true;
        for child in children {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            self.fmt_preorder(child, f)?;
        }
        f.write_str("}")
    }
}

impl<D> Rbt<D>
where
    D: IndexKey,
    D::Key: fmt::Display,
{
    /// Returns a preorder dump of the tree, e.g. `2B {1B 4R {3B 6B {5R 7R}}}`.
    ///
    /// Each node is written as its key followed by `R` or `B`, followed by its present children
    /// enclosed in braces. An empty tree yields an empty string.
    pub fn visit(&self) -> String {
        alloc::format!("{self}")
    }
}

impl<D> Default for Rbt<D>
where
    D: IndexKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for Rbt<D>
where
    D: IndexKey,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rbt").field("len", &self.len()).field("height", &self.height()).finish()
    }
}

impl<D> fmt::Display for Rbt<D>
where
    D: IndexKey,
    D::Key: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_preorder(root, f),
            None => Ok(()),
        }
    }
}

impl<D> Extend<D> for Rbt<D>
where
    D: IndexKey,
{
    fn extend<I: IntoIterator<Item = D>>(&mut self, iter: I) {
        for data in iter {
            self.insert(data);
        }
    }
}

impl<D> FromIterator<D> for Rbt<D>
where
    D: IndexKey,
{
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        let mut rbt = Rbt::new();
        rbt.extend(iter);
        rbt
    }
}

impl<'a, D> IntoIterator for &'a Rbt<D>
where
    D: IndexKey,
{
    type Item = &'a D;
    type IntoIter = Iter<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A read-only handle to a node of a [Rbt], as returned by [Rbt::search].
pub struct NodeRef<'a, D>
where
    D: IndexKey,
{
    storage: &'a Storage<D>,
    id: NodeId,
}

impl<'a, D> NodeRef<'a, D>
where
    D: IndexKey,
{
    pub fn key(&self) -> &'a D::Key {
        self.storage.node(self.id).key()
    }

    pub fn data(&self) -> &'a D {
        &self.storage.node(self.id).data
    }

    pub fn color(&self) -> Color {
        self.storage.color(Some(self.id))
    }

    pub fn parent(&self) -> Option<NodeRef<'a, D>> {
        self.related(self.storage.parent(Some(self.id)))
    }

    pub fn left(&self) -> Option<NodeRef<'a, D>> {
        self.related(self.storage.left(Some(self.id)))
    }

    pub fn right(&self) -> Option<NodeRef<'a, D>> {
        self.related(self.storage.right(Some(self.id)))
    }

    fn related(&self, id: Option<NodeId>) -> Option<NodeRef<'a, D>> {
        id.map(|id| NodeRef { storage: self.storage, id })
    }
}

impl<D> Clone for NodeRef<'_, D>
where
    D: IndexKey,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for NodeRef<'_, D> where D: IndexKey {}

impl<D> fmt::Debug for NodeRef<'_, D>
where
    D: IndexKey,
    D::Key: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef").field("key", self.key()).field("color", &self.color()).finish()
    }
}

/// An in-order iterator over the values of a [Rbt].
pub struct Iter<'a, D>
where
    D: IndexKey,
{
    storage: &'a Storage<D>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, D> Iterator for Iter<'a, D>
where
    D: IndexKey,
{
    type Item = &'a D;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.front = self.storage.successor(id);
        self.remaining -= 1;
        Some(&self.storage.node(id).data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<D> DoubleEndedIterator for Iter<'_, D>
where
    D: IndexKey,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.back = self.storage.predecessor(id);
        self.remaining -= 1;
        Some(&self.storage.node(id).data)
    }
}

impl<D> ExactSizeIterator for Iter<'_, D> where D: IndexKey {}

impl<D> FusedIterator for Iter<'_, D> where D: IndexKey {}
