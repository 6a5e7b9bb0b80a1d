use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use crate::info::{Mapped, TypeDescriptor};

/// A nested mapped value handed to a format.
///
/// The format does not know the concrete type, it passes the object back to
/// [`SerializationContext::serialize_nested`](crate::SerializationContext::serialize_nested),
/// which finds the mapper through [`descriptor`](Self::descriptor).
pub struct ObjectRef<'a> {
    descriptor: &'static TypeDescriptor,
    inner: Inner<'a>,
}

enum Inner<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any>),
}

impl<'a> ObjectRef<'a> {
    /// Borrows a mapped value.
    #[inline]
    pub fn borrowed<T: Mapped>(value: &'a T) -> Self {
        Self {
            descriptor: T::descriptor(),
            inner: Inner::Borrowed(value),
        }
    }

    /// Takes ownership of a mapped value, e.g. the output of an adapter.
    #[inline]
    pub fn owned<T: Mapped>(value: T) -> ObjectRef<'static> {
        ObjectRef {
            descriptor: T::descriptor(),
            inner: Inner::Owned(Box::new(value)),
        }
    }

    /// The descriptor of the concrete type.
    #[inline]
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    /// The `TypeId` of the concrete type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.descriptor.type_id()
    }

    /// The value as `&dyn Any`.
    #[inline]
    pub fn as_any(&self) -> &dyn Any {
        match &self.inner {
            Inner::Borrowed(value) => *value,
            Inner::Owned(value) => &**value,
        }
    }

    /// Returns the value if it is of type `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Borrows the same object.
    #[inline]
    pub fn reborrow(&self) -> ObjectRef<'_> {
        ObjectRef {
            descriptor: self.descriptor,
            inner: Inner::Borrowed(self.as_any()),
        }
    }

    /// Returns `true` if the object is owned rather than borrowed.
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self.inner, Inner::Owned(_))
    }

    /// Takes the owned value out, or gives `self` back if it is borrowed.
    pub fn into_owned_any(self) -> Result<Box<dyn Any>, Self> {
        match self.inner {
            Inner::Owned(value) => Ok(value),
            inner @ Inner::Borrowed(_) => Err(Self {
                descriptor: self.descriptor,
                inner,
            }),
        }
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.descriptor.type_name())
    }
}
