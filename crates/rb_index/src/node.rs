//! Ordered Index - Node and Node Storage for a Red-Black Tree
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::vec::Vec;

use crate::IndexKey;

/// The color of a node in a red-black tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// The single character used for the color in a structural dump.
    pub const fn as_char(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Black => 'B',
        }
    }
}

/// A side of a node. Rotations are named by the direction the pivot node moves down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Returns the mirror image of this direction.
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Index of a node inside of its [Storage].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

pub(crate) struct Node<D>
where
    D: IndexKey,
{
    pub data: D,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<D> Node<D>
where
    D: IndexKey,
{
    /// Creates a detached red node.
    pub fn new(data: D) -> Self {
        Node { data, color: Color::Red, parent: None, left: None, right: None }
    }

    pub fn key(&self) -> &D::Key {
        self.data.key()
    }

    fn child(&self, dir: Direction) -> Option<NodeId> {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    fn child_mut(&mut self, dir: Direction) -> &mut Option<NodeId> {
        match dir {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}

/// The arena that owns every node of a tree.
///
/// Vacated slots are recycled through a free list, so a [NodeId] is only meaningful while the
/// node it was handed out for is still linked into the tree.
pub(crate) struct Storage<D>
where
    D: IndexKey,
{
    /// The nodes, `None` marks a vacant slot.
    slots: Vec<Option<Node<D>>>,
    /// The number of live nodes.
    length: usize,
    /// Vacant slots available for reuse.
    available: Vec<NodeId>,
}

impl<D> Storage<D>
where
    D: IndexKey,
{
    /// Create an empty storage container.
    pub const fn new() -> Storage<D> {
        Storage { slots: Vec::new(), length: 0, available: Vec::new() }
    }

    /// Create an empty storage container with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Storage<D> {
        Storage { slots: Vec::with_capacity(capacity), length: 0, available: Vec::new() }
    }

    /// Get the number of nodes in the storage container.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Get the number of nodes the container can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Add a new red, detached node to the storage container.
    ///
    /// # Time Complexity
    ///
    /// O(1) amortized
    ///
    pub fn add(&mut self, data: D) -> NodeId {
        let node = Node::new(data);
        self.length += 1;
        match self.available.pop() {
            Some(id) => {
                self.slots[id.0] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Delete a node from the storage container, handing back its payload.
    ///
    /// The node must already be unlinked from the tree.
    ///
    /// # Time Complexity
    ///
    /// O(1)
    ///
    pub fn delete(&mut self, id: NodeId) -> D {
        let node = self.slots[id.0].take().expect("Deleted node must be live");
        self.available.push(id);
        self.length -= 1;
        node.data
    }

    /// Drops every node, keeping the allocation.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.available.clear();
        self.length = 0;
    }

    pub fn node(&self, id: NodeId) -> &Node<D> {
        self.slots[id.0].as_ref().expect("Linked node id refers to a vacant slot")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<D> {
        self.slots[id.0].as_mut().expect("Linked node id refers to a vacant slot")
    }

    /// Exchanges the payloads of two live nodes, leaving colors and links in place.
    pub fn swap_data(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let (low, high) = if a.0 < b.0 { (a.0, b.0) } else { (b.0, a.0) };
        let (head, tail) = self.slots.split_at_mut(high);
        let first = head[low].as_mut().expect("Linked node id refers to a vacant slot");
        let second = tail[0].as_mut().expect("Linked node id refers to a vacant slot");
        core::mem::swap(&mut first.data, &mut second.data);
    }

    // The accessors below accept an absent node so that fixup code can treat a missing child
    // the same way as a black leaf.

    pub fn color(&self, id: Option<NodeId>) -> Color {
        match id {
            Some(id) => self.node(id).color,
            None => Color::Black,
        }
    }

    pub fn is_red(&self, id: Option<NodeId>) -> bool {
        self.color(id) == Color::Red
    }

    pub fn is_black(&self, id: Option<NodeId>) -> bool {
        self.color(id) == Color::Black
    }

    pub fn set_color(&mut self, id: Option<NodeId>, color: Color) {
        if let Some(id) = id {
            self.node_mut(id).color = color;
        }
    }

    pub fn set_red(&mut self, id: Option<NodeId>) {
        self.set_color(id, Color::Red);
    }

    pub fn set_black(&mut self, id: Option<NodeId>) {
        self.set_color(id, Color::Black);
    }

    pub fn parent(&self, id: Option<NodeId>) -> Option<NodeId> {
        id.and_then(|id| self.node(id).parent)
    }

    pub fn set_parent(&mut self, id: Option<NodeId>, parent: Option<NodeId>) {
        if let Some(id) = id {
            self.node_mut(id).parent = parent;
        }
    }

    pub fn child(&self, id: Option<NodeId>, dir: Direction) -> Option<NodeId> {
        id.and_then(|id| self.node(id).child(dir))
    }

    pub fn left(&self, id: Option<NodeId>) -> Option<NodeId> {
        self.child(id, Direction::Left)
    }

    pub fn right(&self, id: Option<NodeId>) -> Option<NodeId> {
        self.child(id, Direction::Right)
    }

    pub fn set_child(&mut self, id: Option<NodeId>, dir: Direction, child: Option<NodeId>) {
        if let Some(id) = id {
            *self.node_mut(id).child_mut(dir) = child;
        }
    }

    /// Returns which side of its parent `id` hangs from, `None` for a root.
    pub fn side(&self, id: NodeId) -> Option<Direction> {
        let parent = self.node(id).parent?;
        if self.node(parent).left == Some(id) {
            Some(Direction::Left)
        } else if self.node(parent).right == Some(id) {
            Some(Direction::Right)
        } else {
            // Broken Tree, unrecoverable
            panic!("Node is not a child of its parent")
        }
    }

    /// Returns the other child of `id`'s parent.
    pub fn sibling(&self, id: NodeId) -> Option<NodeId> {
        let side = self.side(id)?;
        self.child(self.node(id).parent, side.opposite())
    }

    /// Returns the furthest node reachable from `id` by following `dir` links only.
    pub fn extreme(&self, id: NodeId, dir: Direction) -> NodeId {
        let mut current = id;
        while let Some(next) = self.node(current).child(dir) {
            current = next;
        }
        current
    }

    /// Returns the node that follows `id` in key order.
    ///
    /// This is the minimum of the right subtree if there is one, otherwise the nearest ancestor
    /// whose left subtree holds `id`.
    ///
    /// # Time Complexity
    ///
    /// O(log n) for a balanced tree.
    ///
    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.step(id, Direction::Right)
    }

    /// Returns the node that precedes `id` in key order.
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.step(id, Direction::Left)
    }

    fn step(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        if let Some(child) = self.node(id).child(dir) {
            return Some(self.extreme(child, dir.opposite()));
        }

        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).child(dir.opposite()) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }
}

impl<D> Default for Storage<D>
where
    D: IndexKey,
{
    fn default() -> Self {
        Self::new()
    }
}
