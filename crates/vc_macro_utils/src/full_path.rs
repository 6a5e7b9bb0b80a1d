//! Fully qualified paths of std items, for code emitted by proc-macros.
//!
//! A user crate may shadow `Option`, `Box` and friends, so generated code
//! spells out `::core::option::Option` and so on. Each marker implements
//! [`ToTokens`] and can be used directly inside `quote!`.
//!
//! ```
//! # use vc_macro_utils::full_path::{FQBox, FQOption};
//! # use quote::quote;
//! let tokens = quote! { #FQOption<#FQBox<u8>> };
//! assert_eq!(
//!     tokens.to_string().replace(' ', ""),
//!     "::core::option::Option<::std::boxed::Box<u8>>",
//! );
//! ```

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};

macro_rules! full_path {
    ($(#[$doc:meta] $name:ident => $path:path;)*) => {
        $(
            #[$doc]
            #[derive(Clone, Copy, Debug)]
            pub struct $name;

            impl ToTokens for $name {
                fn to_tokens(&self, tokens: &mut TokenStream) {
                    quote!($path).to_tokens(tokens);
                }
            }
        )*
    };
}

full_path! {
    /// `::core::any::Any`
    FQAny => ::core::any::Any;
    /// `::std::boxed::Box`
    FQBox => ::std::boxed::Box;
    /// `::core::default::Default`
    FQDefault => ::core::default::Default;
    /// `::core::option::Option`
    FQOption => ::core::option::Option;
    /// `::core::result::Result`
    FQResult => ::core::result::Result;
}
