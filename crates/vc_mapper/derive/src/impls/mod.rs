// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod descriptor;
mod mappable;

use proc_macro2::TokenStream;
use quote::quote;
use vc_macro_utils::full_path::{FQAny, FQDefault};

use crate::derive_data::MappedStruct;

use auto_register::get_auto_register_impl;
use descriptor::impl_trait_mapped;
use mappable::impl_trait_mappable;

/// Generates every impl of `#[derive(Mapped)]`.
///
/// The output is wrapped in an anonymous const so helper items never leak
/// into the user's namespace.
pub(crate) fn impl_mapped_struct(mapped: &MappedStruct) -> TokenStream {
    let mapped_impl = impl_trait_mapped(mapped);
    let mappable_impl = impl_trait_mappable(mapped);
    let auto_register = get_auto_register_impl(mapped);

    quote! {
        const _: () = {
            #mapped_impl

            #mappable_impl

            #auto_register
        };
    }
}

/// The where clause of the generated impls.
///
/// For generic types every type parameter must be `'static` and each field
/// type gets the bound its property kind needs. Non-generic types keep
/// their own where clause, a missing bound is reported on the field.
pub(crate) fn where_clause(mapped: &MappedStruct) -> TokenStream {
    let generics = mapped.generics();
    let existing = generics
        .where_clause
        .as_ref()
        .map(|clause| clause.predicates.iter().collect::<Vec<_>>())
        .unwrap_or_default();

    if !mapped.impl_with_generic() {
        return if existing.is_empty() {
            TokenStream::new()
        } else {
            quote! { where #(#existing,)* }
        };
    }

    let mappable_ = crate::path::mappable_(mapped.vc_mapper_path());
    let params = generics.type_params().map(|param| &param.ident);
    let fields = mapped.fields().iter().map(|field| {
        let ty = field.ty;
        if field.is_skipped() {
            quote! { #ty: #FQAny + #FQDefault }
        } else if field.is_adapted() {
            match field.attrs.default {
                Some(_) => quote! { #ty: #FQAny + #FQDefault },
                None => quote! { #ty: #FQAny },
            }
        } else {
            match field.attrs.default {
                Some(_) => quote! { #ty: #mappable_ + #FQDefault },
                None => quote! { #ty: #mappable_ },
            }
        }
    });

    let any_ = FQAny;
    quote! {
        where
            #(#existing,)*
            #(#params: #any_,)*
            #(#fields,)*
    }
}
