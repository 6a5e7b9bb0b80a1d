//! See the [`Mapped`] derive macro.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static MAPPED_ATTRIBUTE_NAME: &str = "mapped";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Mapped Derivation
///
/// `#[derive(Mapped)]` implements `Mapped` (the type descriptor) and
/// `Mappable` (written as an object, read back from a map) for a struct with
/// named fields. Every field is a property unless it is skipped; properties
/// keep their declaration order.
///
/// Enums, tuple structs, unit structs and types with lifetime parameters
/// are rejected.
///
/// ## Type Attributes
///
/// - `#[mapped(default)]`: the type implements `Default`, used as its
///   constructor by `CheckedAccess`.
/// - `#[mapped(auto_register)]`: collected by `MapperFactory::auto_register`.
///   Ignored for generic types and without the `auto_register` feature.
///
/// ```rust, ignore
/// #[derive(Mapped, Default)]
/// #[mapped(default, auto_register)]
/// struct Config {
///     name: String,
///     retries: u8,
/// }
/// ```
///
/// ## Field Attributes
///
/// - `#[mapped(skip)]`: not a property. The field type must implement
///   `Default`, which is used when an instance is created without a
///   constructor.
/// - `#[mapped(rename = "...")]`: the external name used by the default
///   naming policy.
/// - `#[mapped(adapted)]`: the field type is not `Mappable`, its value is
///   produced by the adapters registered on the factory.
/// - `#[mapped(default)]`: an absent value is filled with `Default::default()`
///   instead of the type's allocation default. Required for an adapted field
///   to be absent from the input.
///
/// ```rust, ignore
/// #[derive(Mapped)]
/// struct Reading {
///     #[mapped(rename = "station")]
///     station_name: String,
///     #[mapped(adapted, default)]
///     taken_at: Timestamp,
///     #[mapped(skip)]
///     cache: Option<Arc<str>>,
/// }
/// ```
///
/// ## Layout
///
/// Field offsets are computed with `core::mem::offset_of!` for `RawAccess`.
/// A `#[repr(packed)]` type gets no offsets, only `CheckedAccess` can map it.
#[proc_macro_derive(Mapped, attributes(mapped))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let mapped = match derive_data::MappedStruct::from_input(&ast) {
        Ok(mapped) => mapped,
        Err(err) => return err.into_compile_error().into(),
    };

    impls::impl_mapped_struct(&mapped).into()
}
