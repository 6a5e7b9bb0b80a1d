use proc_macro2::Span;
use syn::{Attribute, LitStr, Meta, meta::ParseNestedMeta};

use crate::MAPPED_ATTRIBUTE_NAME;

/// Reports a flag given twice.
fn set_flag(slot: &mut Option<Span>, meta: &ParseNestedMeta) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(meta.path.require_ident()?.span());
    Ok(())
}

fn mapped_attributes(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(MAPPED_ATTRIBUTE_NAME))
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// `#[mapped(...)]` on the type.
#[derive(Default, Debug)]
pub(crate) struct TypeAttributes {
    /// `#[mapped(default)]`
    pub default: Option<Span>,
    /// `#[mapped(auto_register)]`
    pub auto_register: Option<Span>,
}

impl TypeAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();
        for attr in mapped_attributes(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    set_flag(&mut result.default, &meta)
                } else if meta.path.is_ident("auto_register") {
                    set_flag(&mut result.auto_register, &meta)
                } else {
                    Err(meta.error("expected `default` or `auto_register`"))
                }
            })?;
        }
        Ok(result)
    }
}

/// Returns `true` for `#[repr(packed)]` and `#[repr(packed(N))]`.
pub(crate) fn is_packed(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("repr"))
        .any(|attr| {
            let Meta::List(list) = &attr.meta else {
                return false;
            };
            let mut packed = false;
            // Other `repr` arguments such as `align(8)` are skipped.
            let _ = list.parse_nested_meta(|meta| {
                packed |= meta.path.is_ident("packed");
                if meta.input.peek(syn::token::Paren) {
                    meta.input.parse::<proc_macro2::TokenTree>()?;
                }
                Ok(())
            });
            packed
        })
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// `#[mapped(...)]` on a field.
#[derive(Default, Debug)]
pub(crate) struct FieldAttributes {
    /// `#[mapped(skip)]`
    pub skip: Option<Span>,
    /// `#[mapped(adapted)]`
    pub adapted: Option<Span>,
    /// `#[mapped(default)]`
    pub default: Option<Span>,
    /// `#[mapped(rename = "...")]`
    pub rename: Option<LitStr>,
}

impl FieldAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();
        for attr in mapped_attributes(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    set_flag(&mut result.skip, &meta)
                } else if meta.path.is_ident("adapted") {
                    set_flag(&mut result.adapted, &meta)
                } else if meta.path.is_ident("default") {
                    set_flag(&mut result.default, &meta)
                } else if meta.path.is_ident("rename") {
                    if result.rename.is_some() {
                        return Err(meta.error("duplicate attribute"));
                    }
                    let name: LitStr = meta.value()?.parse()?;
                    if name.value().is_empty() {
                        return Err(syn::Error::new(name.span(), "the name cannot be empty"));
                    }
                    result.rename = Some(name);
                    Ok(())
                } else {
                    Err(meta.error("expected `skip`, `adapted`, `default` or `rename`"))
                }
            })?;
        }

        if let Some(span) = result.skip
            && (result.adapted.is_some() || result.default.is_some() || result.rename.is_some())
        {
            return Err(syn::Error::new(
                span,
                "`skip` cannot be combined with other attributes",
            ));
        }
        Ok(result)
    }
}
