//! A `no_std` ordered-key index backed by a [Red-Black Tree](Rbt).
//!
//! The tree keeps its nodes in an owned arena and links them by index. Child links are the
//! owning direction of the tree, while each node's parent link is a plain back-reference used
//! only when walking upwards during rebalancing. Search, insertion and deletion all run in
//! O(log n), restoring the red-black properties through local rotations and recoloring only.
//!
//! We use a custom `IndexKey` trait for ordering the elements in the tree. A blanket
//! implementation is provided for all types that implement the `Ord` trait, so a tree of plain
//! keys behaves as an ordered set. Implement the trait for your own type to order it by a key
//! other than the type itself, which turns the tree into an ordered map.
//!
//! ## Features
//!
//! - `verify`: re-validates every red-black property after each completed insert or delete and
//!   panics on the first violation. Useful when hunting a fixup bug, far too slow otherwise.
//!
//! ## Benchmarks
//!
//! Benchmarks are available in the `benches` directory. They use 4096 entries of 32bit, 128bit,
//! and 384bit key sizes respectively:
//!
//! - Insertion: Time to completely fill the tree with random numbers.
//! - Search: Time it takes to search for every element in the tree once.
//! - Delete: Time it takes to delete every element in the tree.
//!
//! ## Examples
//!
//! ```rust
//! use rb_index::{Color, Rbt};
//!
//! let mut rbt: Rbt<u32> = Rbt::new();
//! for num in 1..=7 {
//!     rbt.insert(num);
//! }
//!
//! let root = rbt.search(&2).unwrap();
//! assert_eq!(root.color(), Color::Black);
//! assert!(rbt.check());
//!
//! rbt.delete(&3);
//! assert!(rbt.search(&3).is_none());
//! assert!(rbt.check());
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation. All rights reserved.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![no_std]
extern crate alloc;

mod node;
mod rbt;

pub use node::Color;
pub use rbt::{Iter, NodeRef, Rbt};

/// Public result type for the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Public error types for the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key was not found in the tree.
    NotFound,
    /// The key already exists in the tree.
    AlreadyExists,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::NotFound => write!(f, "key not found"),
            Error::AlreadyExists => write!(f, "key already exists"),
        }
    }
}

/// A trait to allow a type to use a different key than `self` for ordering.
pub trait IndexKey {
    /// The type used for ordering the elements in the tree.
    type Key: Ord;

    /// Returns the key.
    fn key(&self) -> &Self::Key;
}

impl<T> IndexKey for T
where
    T: Ord,
{
    type Key = Self;
    fn key(&self) -> &T {
        self
    }
}
