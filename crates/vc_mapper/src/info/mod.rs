//! Compile-time type information consumed by mappers.
//!
//! ## Menu
//!
//! - [`Mapped`]: A trait for types with a [`TypeDescriptor`], implemented by `#[derive(Mapped)]`.
//!
//! - [`TypeDescriptor`]: Properties in declaration order, excluded fields and constructor of a struct.
//!     - [`PropertyInfo`]: A mapped field, its name, declared type, checked accessors and byte offset.
//!     - [`ExcludedField`]: A `#[mapped(skip)]` field, only initialized with `Default`.
//!     - [`PropertyFlags`]: Volatile, nullable, adapted and renamed markers.
//!
//! - [`TypeOps`]: Type-erased operations of any `'static` type, used to move values around.
//!     - [`ValueOps`]: The type-erased [`Mappable`](crate::Mappable) implementation.
//!
//! - [`NonGenericDescriptorCell`] and [`GenericDescriptorCell`]: static storage of descriptors.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod descriptor;
mod ops;
mod property;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{GenericDescriptorCell, NonGenericDescriptorCell};
pub use descriptor::TypeDescriptor;
pub use ops::{TypeOps, ValueOps};
pub use property::{ExcludedField, PropertyFlags, PropertyInfo};

use crate::mappable::Mappable;

// -----------------------------------------------------------------------------
// Mapped

/// A struct with a [`TypeDescriptor`].
///
/// Implemented by `#[derive(Mapped)]` together with [`Mappable`], whose
/// [`type_descriptor`](Mappable::type_descriptor) then returns
/// `Some(Self::descriptor())`.
pub trait Mapped: Mappable {
    /// Returns the descriptor, built on first access.
    fn descriptor() -> &'static TypeDescriptor;
}
