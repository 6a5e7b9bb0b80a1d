use alloc::boxed::Box;

use super::Mappable;
use crate::context::SerializationContext;
use crate::error::MapError;
use crate::info::TypeDescriptor;
use crate::kind::Kind;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Option

/// `None` is [`Value::Null`], `Some(v)` is the representation of `v`.
impl<T: Mappable> Mappable for Option<T> {
    const KIND: Kind = T::KIND;
    const NULLABLE: bool = true;

    #[inline]
    fn to_value(&self) -> Value<'_> {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    #[inline]
    fn into_value(self) -> Value<'static> {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value<'static>, ctx: &SerializationContext<'_>) -> Result<Self, MapError> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value, ctx).map(Some),
        }
    }

    #[inline]
    fn alloc_default() -> Option<Self> {
        Some(None)
    }

    #[inline]
    fn type_descriptor() -> Option<&'static TypeDescriptor> {
        T::type_descriptor()
    }
}

// -----------------------------------------------------------------------------
// Box

impl<T: Mappable> Mappable for Box<T> {
    const KIND: Kind = T::KIND;
    const NULLABLE: bool = T::NULLABLE;

    #[inline]
    fn to_value(&self) -> Value<'_> {
        T::to_value(self)
    }

    #[inline]
    fn into_value(self) -> Value<'static> {
        T::into_value(*self)
    }

    fn from_value(value: Value<'static>, ctx: &SerializationContext<'_>) -> Result<Self, MapError> {
        T::from_value(value, ctx).map(Box::new)
    }

    fn alloc_default() -> Option<Self> {
        T::alloc_default().map(Box::new)
    }

    #[inline]
    fn type_descriptor() -> Option<&'static TypeDescriptor> {
        T::type_descriptor()
    }
}
