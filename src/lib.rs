//! Ordered set collections built on a B-tree with a compile-time minimum degree.
//!
//! This crate provides [`BTreeSet`], an ordered set whose node occupancy is
//! governed by a const-generic minimum degree `M`: every node holds at most
//! `2 * M` keys, and every node except the root holds at least `M`. Picking
//! `M` at compile time lets callers trade tree height against per-node work
//! for their workload, and makes the occupancy bounds part of the type.
//!
//! # Example
//!
//! ```
//! use mindeg_tree::BTreeSet;
//!
//! // A set with minimum degree 2: nodes hold between 2 and 4 keys.
//! let mut primes: BTreeSet<u32, 2> = BTreeSet::new();
//!
//! for p in [2, 3, 5, 7, 11, 13] {
//!     primes.insert(p);
//! }
//!
//! assert!(primes.contains(&7));
//! assert!(!primes.contains(&9));
//! assert_eq!(primes.len(), 6);
//!
//! // Duplicates are rejected, not replaced.
//! assert!(!primes.insert(11));
//!
//! primes.remove(&2);
//! assert_eq!(primes.first(), Some(&3));
//! ```
//!
//! # Implementation
//!
//! The tree is stored as an arena of nodes addressed by stable handles. Each
//! node records its parent handle and its own position in the parent's child
//! list, so the rebalancing steps of removal (borrowing from a sibling,
//! merging with a sibling) reach their neighbors through the parent without
//! any pointer aliasing. Keys live in every node, leaf and internal alike;
//! lookups are a single root-to-leaf descent with a binary search per node.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

extern crate alloc;

mod raw;

pub mod btree_set;

pub use btree_set::{BTreeSet, Iter, NodeRef};
