use proc_macro2::TokenStream;
use quote::quote_spanned;

use crate::derive_data::MappedStruct;

/// Generate `auto_register` implementation
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(mapped: &MappedStruct) -> TokenStream {
    let Some(span) = mapped.attrs().auto_register else {
        return TokenStream::new();
    };
    // Invalid for generic types.
    if mapped.impl_with_generic() {
        return TokenStream::new();
    }

    let vc_mapper_path = mapped.vc_mapper_path();
    let macro_exports_ = crate::path::macro_exports_(vc_mapper_path);
    let mapped_ = crate::path::mapped_(vc_mapper_path);
    let ident = mapped.ident();

    quote_spanned! { span =>
        #macro_exports_::inventory::submit! {
            #macro_exports_::__AutoRegisterFunc(<#ident as #mapped_>::descriptor)
        }
    }
}

/// Generate `auto_register` implementation
#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &MappedStruct) -> TokenStream {
    TokenStream::new()
}
