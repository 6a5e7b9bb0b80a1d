//! Paths of the `vc_mapper` items used by the generated code.
//!
//! Kept in one place so a change of the `vc_mapper` layout only touches
//! this module.

use proc_macro2::TokenStream;
use quote::quote;

// -----------------------------------------------------------------------------
// Crate Path

/// Get the access path to the `vc_mapper` crate.
///
/// 1. For crates that depend on `vc_mapper`, `::vc_mapper` is returned.
/// 2. For crates that depend on `vc_mapping`, `::vc_mapping::mapper` is returned.
/// 3. For crates that depend on `vc`, `::vc::mapper` is returned.
/// 4. Otherwise `::vc_mapper` is returned, which is also the path inside
///    `vc_mapper` itself (`extern crate self as vc_mapper`).
///
/// Reading the manifest is not free, the path is resolved once per
/// derive and passed around.
pub(crate) fn vc_mapper() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_mapper"))
}

// -----------------------------------------------------------------------------
// Items

#[inline(always)]
pub(crate) fn mapped_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::info::Mapped }
}

#[inline(always)]
pub(crate) fn mappable_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::Mappable }
}

#[inline(always)]
pub(crate) fn type_descriptor_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::info::TypeDescriptor }
}

#[inline(always)]
pub(crate) fn property_info_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::info::PropertyInfo }
}

#[inline(always)]
pub(crate) fn excluded_field_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::info::ExcludedField }
}

#[inline(always)]
pub(crate) fn non_generic_descriptor_cell_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::info::NonGenericDescriptorCell }
}

#[inline(always)]
pub(crate) fn generic_descriptor_cell_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::info::GenericDescriptorCell }
}

#[inline(always)]
pub(crate) fn kind_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::Kind }
}

#[inline(always)]
pub(crate) fn value_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::Value }
}

#[inline(always)]
pub(crate) fn object_ref_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::value::ObjectRef }
}

#[inline(always)]
pub(crate) fn map_error_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::MapError }
}

#[inline(always)]
pub(crate) fn serialization_context_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::SerializationContext }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn macro_exports_(vc_mapper_path: &syn::Path) -> TokenStream {
    quote! { #vc_mapper_path::__macro_exports }
}
