//! Lifetime-carrying pointers for offset based field access.
//!
//! The raw accessor of `vc_mapper` reads and writes struct fields through a
//! byte offset computed at mapper construction time. Working on raw pointers
//! directly makes the lifetimes of the instance being accessed invisible, so
//! this crate wraps them:
//!
//! **Ptr** and **PtrMut**
//!
//! [`Ptr<'a>`] and [`PtrMut<'a>`] are type-erased `&T` and `&mut T` equivalents.
//! Compared to raw pointers, they add a lifetime and optional alignment checks to
//! better approximate the safety of references. Offsetting them by a field offset
//! yields a pointer to the field with the same lifetime.
//!
//! **RawStorage**
//!
//! [`RawStorage`] is a heap allocation for a [`Layout`](core::alloc::Layout)
//! whose content is *not* initialized. It is the only way the mapper creates
//! instances without running a constructor. It frees the memory on drop but
//! never drops its content; the owner must track which parts were initialized.
#![expect(unsafe_code, reason = "Raw pointers are inherently unsafe.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod erased;
mod storage;

// -----------------------------------------------------------------------------
// Top-level exports

pub use erased::{Ptr, PtrMut};
pub use storage::RawStorage;
