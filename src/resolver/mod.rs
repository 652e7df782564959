//! # Resolver Module
//!
//! Pairs an implementation tree with its contract tree.
//!
//! [`resolve`] walks a [`ContractRouter`](crate::contract::ContractRouter) and
//! an [`ImplRouter`] of the same shape and returns one [`ResolvedRoute`] per
//! contract route, tagged with the keys leading to it. Shape differences are
//! reported as [`ResolveError::StructuralMismatch`] at startup, never at
//! request time.
//!
//! An [`InitialisedRouter`] bundles a sub-contract with its implementation;
//! when mounted under a key, resolution continues with the bundled pair and
//! the key is kept in the prefix.

mod core;

pub use core::{
    resolve, ImplNode, ImplRouter, InitialisedRouter, Mismatch, ResolveError, ResolvedRoute,
};
