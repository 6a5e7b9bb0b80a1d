#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Code generated by `#[derive(Mapped)]` refers to `::vc_mapper`, this alias
// makes those paths valid inside the crate itself (tests and doc tests).
extern crate self as vc_mapper;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod context;
mod error;

pub mod access;
pub mod adapter;
pub mod factory;
pub mod format;
pub mod info;
pub mod kind;
pub mod mappable;
pub mod mapper;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use context::SerializationContext;
pub use error::{ConfigError, MapError, PropertyPath, ShapeError};
pub use factory::MapperFactory;
pub use info::Mapped;
pub use kind::Kind;
pub use mappable::Mappable;
pub use mapper::Mapper;
pub use value::{Value, ValueMap};

/// `#[derive(Mapped)]`, see the macro documentation for the attributes.
pub use vc_mapper_derive::Mapped;

/// The most commonly used items.
pub mod prelude {
    pub use crate::adapter::Adapter;
    pub use crate::format::Format;
    pub use crate::{Kind, MapError, Mappable, Mapped, Mapper, MapperFactory, Value, ValueMap};
}
