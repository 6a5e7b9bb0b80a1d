use core::any::{Any, TypeId};
use core::fmt;

use bitflags::bitflags;

use crate::info::TypeOps;
use crate::mappable::Mappable;

// -----------------------------------------------------------------------------
// PropertyFlags

bitflags! {
    /// Static facts about a property, known when the descriptor is built.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// The declared type is an atomic, accessed with acquire/release.
        const VOLATILE = 1;
        /// The declared type accepts `Value::Null`.
        const NULLABLE = 1 << 1;
        /// Declared `#[mapped(adapted)]`, the value needs an adapter chain.
        const ADAPTED = 1 << 2;
        /// Declared with `#[mapped(rename = "...")]`.
        const RENAMED = 1 << 3;
    }
}

// -----------------------------------------------------------------------------
// PropertyInfo

/// A mapped field of a struct, generated by `#[derive(Mapped)]`.
///
/// Besides the name and declared type, a property carries two ways to reach
/// the field of an instance: checked accessors working on `&dyn Any`, and
/// the field's byte offset used by [`RawAccess`](crate::access::RawAccess).
///
/// # Examples
///
/// ```
/// use vc_mapper::Mapped;
///
/// #[derive(Mapped)]
/// struct Message {
///     #[mapped(rename = "body")]
///     text: String,
/// }
///
/// let property = Message::descriptor().property("text").unwrap();
/// assert_eq!(property.rename(), Some("body"));
/// assert!(property.offset().is_some());
///
/// let message = Message { text: "hi".into() };
/// let text = property.get(&message).and_then(|v| v.downcast_ref::<String>());
/// assert_eq!(text.map(String::as_str), Some("hi"));
/// ```
#[derive(Clone, Copy)]
pub struct PropertyInfo {
    name: &'static str,
    rename: Option<&'static str>,
    index: usize,
    // `None` when the owner layout does not allow direct access (`repr(packed)`).
    offset: Option<usize>,
    ops: TypeOps,
    flags: PropertyFlags,
    field_ref: fn(&dyn Any) -> Option<&dyn Any>,
    field_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
}

impl PropertyInfo {
    /// Creates a property of a [`Mappable`] type.
    ///
    /// `field_ref` and `field_mut` return `None` if the owner is not the
    /// type this property belongs to.
    pub fn new<T: Mappable>(
        name: &'static str,
        index: usize,
        field_ref: fn(&dyn Any) -> Option<&dyn Any>,
        field_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
    ) -> Self {
        let mut flags = PropertyFlags::empty();
        flags.set(PropertyFlags::VOLATILE, T::VOLATILE);
        flags.set(PropertyFlags::NULLABLE, T::NULLABLE);

        Self {
            name,
            rename: None,
            index,
            offset: None,
            ops: TypeOps::of::<T>(),
            flags,
            field_ref,
            field_mut,
        }
    }

    /// Creates a property whose type is only mapped through adapters.
    pub fn adapted<T: Any>(
        name: &'static str,
        index: usize,
        field_ref: fn(&dyn Any) -> Option<&dyn Any>,
        field_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
    ) -> Self {
        Self {
            name,
            rename: None,
            index,
            offset: None,
            ops: TypeOps::opaque::<T>(),
            flags: PropertyFlags::ADAPTED,
            field_ref,
            field_mut,
        }
    }

    /// Sets the external name override.
    pub fn with_rename(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self.flags |= PropertyFlags::RENAMED;
        self
    }

    /// Fills the field with `T::default()` when it is absent on input.
    pub fn with_default<T: Any + Default>(mut self) -> Self {
        self.ops = self.ops.with_default::<T>();
        self
    }

    /// Sets the byte offset of the field inside its owner.
    ///
    /// Used by `#[derive(Mapped)]`, which computes it with
    /// [`offset_of!`](core::mem::offset_of). [`RawAccess`](crate::access::RawAccess)
    /// reads and writes memory at this offset.
    ///
    /// # Safety
    ///
    /// `offset` must be the offset of a field of the declared type inside the
    /// type whose descriptor this property ends up in.
    #[doc(hidden)]
    #[expect(unsafe_code, reason = "The offset is trusted by raw field access.")]
    pub unsafe fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns the field name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the `#[mapped(rename = "...")]` override.
    #[inline]
    pub fn rename(&self) -> Option<&'static str> {
        self.rename
    }

    /// Returns the position among the mapped properties.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the byte offset of the field, if known.
    #[inline]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the operations of the declared type.
    #[inline]
    pub fn ops(&self) -> &TypeOps {
        &self.ops
    }

    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ops.type_id()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.ops.type_name()
    }

    #[inline]
    pub fn is_volatile(&self) -> bool {
        self.flags.contains(PropertyFlags::VOLATILE)
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.flags.contains(PropertyFlags::NULLABLE)
    }

    #[inline]
    pub fn is_adapted(&self) -> bool {
        self.flags.contains(PropertyFlags::ADAPTED)
    }

    /// Borrows the field of `owner`.
    ///
    /// Returns `None` if `owner` is not of the owning type.
    #[inline]
    pub fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.field_ref)(owner)
    }

    /// Mutably borrows the field of `owner`.
    #[inline]
    pub fn get_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.field_mut)(owner)
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("rename", &self.rename)
            .field("index", &self.index)
            .field("offset", &self.offset)
            .field("type_name", &self.type_name())
            .field("flags", &self.flags)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ExcludedField

/// A field declared `#[mapped(skip)]`.
///
/// It is never read or written by a mapper, but instances created without
/// a constructor still need it initialized, so its type must be `Default`.
#[derive(Clone, Copy, Debug)]
pub struct ExcludedField {
    name: &'static str,
    offset: Option<usize>,
    ops: TypeOps,
}

impl ExcludedField {
    pub fn new<T: Any + Default>(name: &'static str) -> Self {
        Self {
            name,
            offset: None,
            ops: TypeOps::opaque::<T>().with_default::<T>(),
        }
    }

    /// See [`PropertyInfo::with_offset`].
    ///
    /// # Safety
    ///
    /// `offset` must be the offset of a field of type `T` (as given to
    /// [`ExcludedField::new`]) inside the described type.
    #[doc(hidden)]
    #[expect(unsafe_code, reason = "The offset is trusted by raw field access.")]
    pub unsafe fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    #[inline]
    pub fn ops(&self) -> &TypeOps {
        &self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyFlags, PropertyInfo};
    use alloc::string::String;
    use core::any::Any;
    use core::sync::atomic::AtomicBool;

    struct Owner {
        name: String,
        ready: AtomicBool,
    }

    fn name_property() -> PropertyInfo {
        PropertyInfo::new::<String>(
            "name",
            0,
            |owner| owner.downcast_ref::<Owner>().map(|v| &v.name as &dyn Any),
            |owner| owner.downcast_mut::<Owner>().map(|v| &mut v.name as &mut dyn Any),
        )
    }

    #[test]
    fn flags() {
        let ready = PropertyInfo::new::<AtomicBool>(
            "ready",
            1,
            |owner| owner.downcast_ref::<Owner>().map(|v| &v.ready as &dyn Any),
            |owner| owner.downcast_mut::<Owner>().map(|v| &mut v.ready as &mut dyn Any),
        );
        assert!(ready.is_volatile());
        assert!(!ready.is_nullable());

        let renamed = name_property().with_rename("label");
        assert_eq!(renamed.flags(), PropertyFlags::RENAMED);
        assert_eq!(renamed.rename(), Some("label"));
        assert_eq!(renamed.name(), "name");
    }

    #[test]
    fn checked_accessors() {
        let property = name_property();
        let mut owner = Owner {
            name: String::from("before"),
            ready: AtomicBool::new(false),
        };

        let field = property.get_mut(&mut owner).unwrap();
        *field.downcast_mut::<String>().unwrap() = String::from("after");
        assert_eq!(owner.name, "after");

        assert!(property.get(&3_u32).is_none());
        assert!(!owner.ready.into_inner());
    }
}
