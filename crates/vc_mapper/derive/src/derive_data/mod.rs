//! Parsing of the derive input.

// -----------------------------------------------------------------------------
// Modules

mod attributes;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use attributes::{FieldAttributes, TypeAttributes};

use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, GenericParam, Generics, Ident, Path, Type};

// -----------------------------------------------------------------------------
// MappedField

/// A named field of the derived struct.
pub(crate) struct MappedField<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub attrs: FieldAttributes,
}

impl MappedField<'_> {
    /// The field name without a raw identifier prefix.
    pub fn name(&self) -> String {
        let name = self.ident.to_string();
        match name.strip_prefix("r#") {
            Some(stripped) => stripped.to_string(),
            None => name,
        }
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        self.attrs.skip.is_some()
    }

    #[inline]
    pub fn is_adapted(&self) -> bool {
        self.attrs.adapted.is_some()
    }
}

// -----------------------------------------------------------------------------
// MappedStruct

/// A struct with named fields and its `#[mapped(...)]` attributes.
pub(crate) struct MappedStruct<'a> {
    vc_mapper_path: Path,
    ident: &'a Ident,
    generics: &'a Generics,
    attrs: TypeAttributes,
    packed: bool,
    fields: Vec<MappedField<'a>>,
}

impl<'a> MappedStruct<'a> {
    pub fn from_input(ast: &'a DeriveInput) -> syn::Result<Self> {
        let data = match &ast.data {
            Data::Struct(data) => data,
            Data::Enum(data) => {
                return Err(syn::Error::new(
                    data.enum_token.span(),
                    "`Mapped` cannot be derived for enums",
                ));
            }
            Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span(),
                    "`Mapped` cannot be derived for unions",
                ));
            }
        };

        let Fields::Named(named) = &data.fields else {
            return Err(syn::Error::new(
                ast.ident.span(),
                "`Mapped` requires a struct with named fields",
            ));
        };

        if let Some(lifetime) = ast.generics.params.iter().find_map(|param| match param {
            GenericParam::Lifetime(lifetime) => Some(lifetime),
            _ => None,
        }) {
            return Err(syn::Error::new(
                lifetime.span(),
                "`Mapped` types cannot have lifetime parameters",
            ));
        }

        let fields = named
            .named
            .iter()
            .map(|field| {
                Ok(MappedField {
                    // Named fields always have an ident.
                    ident: field.ident.as_ref().ok_or_else(|| {
                        syn::Error::new(field.span(), "expected a named field")
                    })?,
                    ty: &field.ty,
                    attrs: FieldAttributes::parse(&field.attrs)?,
                })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self {
            vc_mapper_path: crate::path::vc_mapper(),
            ident: &ast.ident,
            generics: &ast.generics,
            attrs: TypeAttributes::parse(&ast.attrs)?,
            packed: attributes::is_packed(&ast.attrs),
            fields,
        })
    }

    #[inline]
    pub fn vc_mapper_path(&self) -> &Path {
        &self.vc_mapper_path
    }

    #[inline]
    pub fn ident(&self) -> &Ident {
        self.ident
    }

    #[inline]
    pub fn generics(&self) -> &Generics {
        self.generics
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    /// `#[repr(packed)]`, fields have no usable offset.
    #[inline]
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    #[inline]
    pub fn impl_with_generic(&self) -> bool {
        !self.generics.params.is_empty()
    }

    /// Mapped fields in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &MappedField<'a>> {
        self.fields.iter().filter(|f| !f.is_skipped())
    }

    /// `#[mapped(skip)]` fields.
    pub fn excluded(&self) -> impl Iterator<Item = &MappedField<'a>> {
        self.fields.iter().filter(|f| f.is_skipped())
    }

    pub fn fields(&self) -> &[MappedField<'a>] {
        &self.fields
    }
}
