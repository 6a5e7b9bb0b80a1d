//! Small containers shared by the `vc_mapping` crates.
//!
//! - [`TypeIdMap`] / [`TypeIdSet`]: containers keyed by [`TypeId`](core::any::TypeId),
//!   hashed with a pass-through hasher since type ids are already hashes.
//! - [`hash`]: fixed-seed and no-op hash states, re-exports *hashbrown* and *foldhash*.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::{TypeIdMap, TypeIdSet};
