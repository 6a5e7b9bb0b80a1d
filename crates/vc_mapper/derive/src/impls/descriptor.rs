use proc_macro2::TokenStream;
use quote::quote;
use vc_macro_utils::full_path::FQAny;

use crate::derive_data::{MappedField, MappedStruct};

/// Generate implementation code for `Mapped`.
///
/// Similar to following:
///
/// ```ignore
/// #[allow(unsafe_code)]
/// impl Mapped for Foo {
///     fn descriptor() -> &'static TypeDescriptor {
///         static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
///         CELL.get_or_init(|| unsafe {
///             TypeDescriptor::new::<Self>("Foo", [
///                 PropertyInfo::new::<i32>("id", 0, |o| ..., |o| ...)
///                     .with_offset(offset_of!(Self, id)),
///             ])
///             .with_excluded([ExcludedField::new::<Cache>("cache").with_offset(...)])
///             .with_exhaustive_layout()
///         })
///     }
/// }
/// ```
pub(crate) fn impl_trait_mapped(mapped: &MappedStruct) -> TokenStream {
    let vc_mapper_path = mapped.vc_mapper_path();
    let mapped_ = crate::path::mapped_(vc_mapper_path);
    let type_descriptor_ = crate::path::type_descriptor_(vc_mapper_path);

    let descriptor_tokens = descriptor_tokens(mapped);

    let inner_cell_tokens = if mapped.impl_with_generic() {
        let cell = crate::path::generic_descriptor_cell_(vc_mapper_path);
        quote! {
            static CELL: #cell = #cell::new();
            CELL.get_or_insert::<Self>(|| {
                #descriptor_tokens
            })
        }
    } else {
        let cell = crate::path::non_generic_descriptor_cell_(vc_mapper_path);
        quote! {
            static CELL: #cell = #cell::new();
            CELL.get_or_init(|| {
                #descriptor_tokens
            })
        }
    };

    let ident = mapped.ident();
    let (impl_generics, ty_generics, _) = mapped.generics().split_for_impl();
    let where_clause = super::where_clause(mapped);

    quote! {
        #[allow(unsafe_code)]
        impl #impl_generics #mapped_ for #ident #ty_generics #where_clause {
            fn descriptor() -> &'static #type_descriptor_ {
                #inner_cell_tokens
            }
        }
    }
}

fn descriptor_tokens(mapped: &MappedStruct) -> TokenStream {
    let vc_mapper_path = mapped.vc_mapper_path();
    let type_descriptor_ = crate::path::type_descriptor_(vc_mapper_path);
    let property_info_ = crate::path::property_info_(vc_mapper_path);
    let excluded_field_ = crate::path::excluded_field_(vc_mapper_path);

    let type_name = {
        let name = mapped.ident().to_string();
        name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
    };

    let properties: Vec<_> = mapped
        .properties()
        .enumerate()
        .map(|(index, field)| property_tokens(mapped, &property_info_, index, field))
        .collect();
    let count = properties.len();

    let excluded: Vec<_> = mapped
        .excluded()
        .map(|field| {
            let ty = field.ty;
            let name = field.name();
            let offset = offset_tokens(mapped, field);
            quote! { #excluded_field_::new::<#ty>(#name) #offset }
        })
        .collect();

    let with_excluded = if excluded.is_empty() {
        TokenStream::new()
    } else {
        quote! { .with_excluded([#(#excluded),*]) }
    };

    // Without offsets `RawAccess` cannot build instances.
    let with_exhaustive = if mapped.is_packed() {
        TokenStream::new()
    } else {
        quote! { .with_exhaustive_layout() }
    };

    let with_constructor = mapped
        .attrs()
        .default
        .map(|_| quote! { .with_constructor::<Self>() });

    let descriptor = quote! {
        #type_descriptor_::new::<Self>(#type_name, {
            let properties: [#property_info_; #count] = [#(#properties),*];
            properties
        })
        #with_excluded
        #with_exhaustive
        #with_constructor
    };

    if mapped.is_packed() {
        descriptor
    } else {
        // Offsets come from `offset_of!` on this very type, and the fields
        // listed are all of its fields.
        quote! { unsafe { #descriptor } }
    }
}

fn property_tokens(
    mapped: &MappedStruct,
    property_info_: &TokenStream,
    index: usize,
    field: &MappedField,
) -> TokenStream {
    let ident = field.ident;
    let ty = field.ty;
    let name = field.name();

    let constructor = if field.is_adapted() {
        quote! { adapted }
    } else {
        quote! { new }
    };

    let with_rename = field
        .attrs
        .rename
        .as_ref()
        .map(|rename| quote! { .with_rename(#rename) });

    let with_default = field
        .attrs
        .default
        .map(|_| quote! { .with_default::<#ty>() });

    let with_offset = offset_tokens(mapped, field);

    quote! {
        #property_info_::#constructor::<#ty>(
            #name,
            #index,
            |owner| owner.downcast_ref::<Self>().map(|v| &v.#ident as &dyn #FQAny),
            |owner| owner.downcast_mut::<Self>().map(|v| &mut v.#ident as &mut dyn #FQAny),
        )
        #with_rename
        #with_default
        #with_offset
    }
}

fn offset_tokens(mapped: &MappedStruct, field: &MappedField) -> TokenStream {
    if mapped.is_packed() {
        return TokenStream::new();
    }
    let ident = field.ident;
    quote! { .with_offset(::core::mem::offset_of!(Self, #ident)) }
}
