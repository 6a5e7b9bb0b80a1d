use proc_macro2::TokenStream;
use quote::quote;
use vc_macro_utils::full_path::{FQDefault, FQOption, FQResult};

use crate::derive_data::MappedStruct;

/// Generate implementation code for `Mappable`.
///
/// A mapped struct is written as a `Value::Object` and read from a
/// `Value::Map` through its own mapper.
pub(crate) fn impl_trait_mappable(mapped: &MappedStruct) -> TokenStream {
    let vc_mapper_path = mapped.vc_mapper_path();
    let mapped_ = crate::path::mapped_(vc_mapper_path);
    let mappable_ = crate::path::mappable_(vc_mapper_path);
    let kind_ = crate::path::kind_(vc_mapper_path);
    let value_ = crate::path::value_(vc_mapper_path);
    let object_ref_ = crate::path::object_ref_(vc_mapper_path);
    let map_error_ = crate::path::map_error_(vc_mapper_path);
    let context_ = crate::path::serialization_context_(vc_mapper_path);
    let type_descriptor_ = crate::path::type_descriptor_(vc_mapper_path);

    let alloc_default = alloc_default_tokens(mapped, &mappable_);

    let ident = mapped.ident();
    let (impl_generics, ty_generics, _) = mapped.generics().split_for_impl();
    let where_clause = super::where_clause(mapped);

    quote! {
        impl #impl_generics #mappable_ for #ident #ty_generics #where_clause {
            const KIND: #kind_ = #kind_::Object;

            #[inline]
            fn to_value(&self) -> #value_<'_> {
                #value_::Object(#object_ref_::borrowed(self))
            }

            #[inline]
            fn into_value(self) -> #value_<'static> {
                #value_::Object(#object_ref_::owned(self))
            }

            #[inline]
            fn from_value(
                value: #value_<'static>,
                ctx: &#context_<'_>,
            ) -> #FQResult<Self, #map_error_> {
                ctx.deserialize_nested(value)
            }

            fn alloc_default() -> #FQOption<Self> {
                #alloc_default
            }

            #[inline]
            fn type_descriptor() -> #FQOption<&'static #type_descriptor_> {
                #FQOption::Some(<Self as #mapped_>::descriptor())
            }
        }
    }
}

/// Every field at its allocation default, `None` as soon as one has none.
fn alloc_default_tokens(mapped: &MappedStruct, mappable_: &TokenStream) -> TokenStream {
    // An adapted field is only defaultable with `#[mapped(default)]`.
    if mapped
        .properties()
        .any(|field| field.is_adapted() && field.attrs.default.is_none())
    {
        return quote! { #FQOption::None };
    }

    let fields = mapped.fields().iter().map(|field| {
        let ident = field.ident;
        let ty = field.ty;
        if field.is_skipped() || field.attrs.default.is_some() {
            quote! { #ident: <#ty as #FQDefault>::default() }
        } else {
            quote! { #ident: <#ty as #mappable_>::alloc_default()? }
        }
    });

    quote! {
        #FQOption::Some(Self {
            #(#fields,)*
        })
    }
}
