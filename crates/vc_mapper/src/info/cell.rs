//! Static storage for [`TypeDescriptor`]s.
//!
//! `Mapped::descriptor` returns a `&'static TypeDescriptor` that is built on
//! first access. For non-generic types a [`NonGenericDescriptorCell`] (a
//! [`OnceLock`]) is enough. For generic types the `static` inside the function
//! is shared by every instantiation, so [`GenericDescriptorCell`] keeps one
//! leaked descriptor per [`TypeId`].

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use vc_utils::TypeIdMap;

use crate::info::TypeDescriptor;

/// Descriptor storage of a non-generic type.
///
/// ## Example
///
/// ```
/// use vc_mapper::{Kind, Mappable, MapError, SerializationContext, Value};
/// use vc_mapper::info::{Mapped, NonGenericDescriptorCell, TypeDescriptor};
/// use vc_mapper::value::ObjectRef;
///
/// struct Empty;
///
/// impl Mapped for Empty {
///     fn descriptor() -> &'static TypeDescriptor {
///         static CELL: NonGenericDescriptorCell = NonGenericDescriptorCell::new();
///         CELL.get_or_init(|| TypeDescriptor::new::<Self>("Empty", []))
///     }
/// }
///
/// impl Mappable for Empty {
///     const KIND: Kind = Kind::Object;
///
///     fn to_value(&self) -> Value<'_> {
///         Value::Object(ObjectRef::borrowed(self))
///     }
///     fn into_value(self) -> Value<'static> {
///         Value::Object(ObjectRef::owned(self))
///     }
///     fn from_value(value: Value<'static>, ctx: &SerializationContext<'_>) -> Result<Self, MapError> {
///         ctx.deserialize_nested(value)
///     }
///     fn type_descriptor() -> Option<&'static TypeDescriptor> {
///         Some(Self::descriptor())
///     }
/// }
///
/// assert!(Empty::descriptor().properties().is_empty());
/// ```
pub struct NonGenericDescriptorCell(OnceLock<TypeDescriptor>);

impl NonGenericDescriptorCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored descriptor, building it with `f` on first access.
    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> TypeDescriptor) -> &TypeDescriptor {
        self.0.get_or_init(f)
    }
}

/// Descriptor storage of a generic type.
///
/// ## Example
///
/// ```ignore
/// impl<T: Mappable> Mapped for Wrapper<T> {
///     fn descriptor() -> &'static TypeDescriptor {
///         static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
///         CELL.get_or_insert::<Self>(|| TypeDescriptor::new::<Self>("Wrapper", [/* ... */]))
///     }
/// }
/// ```
pub struct GenericDescriptorCell(RwLock<TypeIdMap<&'static TypeDescriptor>>);

impl GenericDescriptorCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns the descriptor stored for `G`, building it with `f` if absent.
    #[inline(always)]
    pub fn get_or_insert<G: Any + ?Sized>(
        &self,
        f: impl FnOnce() -> TypeDescriptor,
    ) -> &'static TypeDescriptor {
        // Separate to reduce code compilation times
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    #[inline(never)]
    fn get_or_insert_by_type_id(
        &self,
        type_id: TypeId,
        f: impl FnOnce() -> TypeDescriptor,
    ) -> &'static TypeDescriptor {
        match self.get_by_type_id(type_id) {
            Some(descriptor) => descriptor,
            None => self.insert_by_type_id(type_id, f()),
        }
    }

    #[inline(never)]
    fn get_by_type_id(&self, type_id: TypeId) -> Option<&'static TypeDescriptor> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
    }

    #[inline(never)]
    fn insert_by_type_id(&self, type_id: TypeId, value: TypeDescriptor) -> &'static TypeDescriptor {
        // A racing thread may have inserted first, its descriptor wins and
        // `value` is dropped without being leaked.
        let mut map = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *map.get_or_insert(type_id, || Box::leak(Box::new(value)))
    }
}
