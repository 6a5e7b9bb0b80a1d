use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::info::{ExcludedField, PropertyInfo, TypeOps};
use crate::mappable::Mappable;

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Compile-time description of a mapped struct.
///
/// Generated by `#[derive(Mapped)]` and stored in a static cell, see
/// [`Mapped::descriptor`](crate::Mapped::descriptor). Properties are kept in
/// declaration order; it is the order every mapper writes them in.
///
/// # Examples
///
/// ```
/// use vc_mapper::Mapped;
///
/// #[derive(Mapped, Default)]
/// #[mapped(default)]
/// struct Point {
///     x: i32,
///     y: i32,
///     #[mapped(skip)]
///     dirty: bool,
/// }
///
/// let descriptor = Point::descriptor();
/// assert_eq!(descriptor.ident(), "Point");
///
/// let names: Vec<_> = descriptor.properties().iter().map(|p| p.name()).collect();
/// assert_eq!(names, ["x", "y"]);
/// assert_eq!(descriptor.excluded()[0].name(), "dirty");
/// assert!(descriptor.construct().is_some());
/// ```
pub struct TypeDescriptor {
    ops: TypeOps,
    ident: &'static str,
    properties: Box<[PropertyInfo]>,
    excluded: Box<[ExcludedField]>,
    construct: Option<fn() -> Box<dyn Any>>,
    exhaustive: bool,
}

impl TypeDescriptor {
    /// Creates a descriptor of `T` with the given properties.
    pub fn new<T: Mappable>(
        ident: &'static str,
        properties: impl IntoIterator<Item = PropertyInfo>,
    ) -> Self {
        Self {
            ops: TypeOps::of::<T>(),
            ident,
            properties: properties.into_iter().collect(),
            excluded: Box::new([]),
            construct: None,
            exhaustive: false,
        }
    }

    /// Sets the fields declared `#[mapped(skip)]`.
    pub fn with_excluded(mut self, excluded: impl IntoIterator<Item = ExcludedField>) -> Self {
        self.excluded = excluded.into_iter().collect();
        self
    }

    /// Uses `T::default()` to create instances, see [`CheckedAccess`].
    ///
    /// [`CheckedAccess`]: crate::access::CheckedAccess
    pub fn with_constructor<T: Any + Default>(mut self) -> Self {
        self.construct = Some(construct_default::<T>);
        self
    }

    /// Marks that properties and excluded fields together cover every field
    /// of the type, each with its offset.
    ///
    /// Only then may [`RawAccess`](crate::access::RawAccess) create instances
    /// without a constructor. Used by `#[derive(Mapped)]`.
    ///
    /// # Safety
    ///
    /// Every field of the type appears exactly once, as a property or an
    /// excluded field, with a correct offset, and the type has no other
    /// field and no invariant beyond its fields' own.
    #[doc(hidden)]
    #[expect(unsafe_code, reason = "Raw field access builds instances field by field.")]
    pub unsafe fn with_exhaustive_layout(mut self) -> Self {
        self.exhaustive = true;
        self
    }

    /// Returns the operations of the described type.
    #[inline]
    pub fn ops(&self) -> &TypeOps {
        &self.ops
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ops.type_id()
    }

    /// Returns the full type name, e.g. `my_crate::Point`.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.ops.type_name()
    }

    /// Returns the type name without path and generics, e.g. `Point`.
    #[inline]
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// Returns the properties in declaration order.
    #[inline]
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Returns the property with the given field name.
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Returns the excluded fields.
    #[inline]
    pub fn excluded(&self) -> &[ExcludedField] {
        &self.excluded
    }

    /// Runs the constructor, if the type has one.
    pub fn construct(&self) -> Option<Box<dyn Any>> {
        self.construct.map(|f| f())
    }

    #[inline]
    pub fn has_constructor(&self) -> bool {
        self.construct.is_some()
    }

    #[inline]
    pub fn is_exhaustive(&self) -> bool {
        self.exhaustive
    }
}

fn construct_default<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name())
            .field("properties", &self.properties)
            .field("excluded", &self.excluded)
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}
