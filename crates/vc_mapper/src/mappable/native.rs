use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::{Mappable, integer, mismatch, sequence};
use crate::context::SerializationContext;
use crate::error::{MapError, ShapeError};
use crate::kind::{Kind, Primitive};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Primitives

macro_rules! impl_mappable_for_primitive {
    ($ty:ty, $kind:ident, $primitive:ident, |$value:ident| $from:expr) => {
        impl Mappable for $ty {
            const KIND: Kind = Kind::$kind;
            const PRIMITIVE: Option<Primitive> = Some(Primitive::$primitive);

            #[inline]
            fn to_value(&self) -> Value<'_> {
                Value::$kind(*self)
            }

            #[inline]
            fn into_value(self) -> Value<'static> {
                Value::$kind(self)
            }

            fn from_value(
                $value: Value<'static>,
                _: &SerializationContext<'_>,
            ) -> Result<Self, MapError> {
                $from
            }

            #[inline]
            fn alloc_default() -> Option<Self> {
                Some(<$ty>::default())
            }
        }
    };
}

impl_mappable_for_primitive!(bool, Bool, Bool, |value| match value {
    Value::Bool(v) => Ok(v),
    other => Err(mismatch(Kind::Bool, &other)),
});

impl_mappable_for_primitive!(i8, Byte, I8, |value| integer(&value, Kind::Byte));
impl_mappable_for_primitive!(i16, Short, I16, |value| integer(&value, Kind::Short));
impl_mappable_for_primitive!(i32, Int, I32, |value| integer(&value, Kind::Int));
impl_mappable_for_primitive!(i64, Long, I64, |value| integer(&value, Kind::Long));

impl_mappable_for_primitive!(f32, Float, F32, |value| match value {
    Value::Float(v) => Ok(v),
    other => other
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| mismatch(Kind::Float, &other)),
});

impl_mappable_for_primitive!(f64, Double, F64, |value| value
    .as_f64()
    .ok_or_else(|| mismatch(Kind::Double, &value)));

impl_mappable_for_primitive!(char, Char, Char, |value| match value {
    Value::Char(v) => Ok(v),
    Value::String(s) => {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ShapeError::out_of_range(format_args!("{s:?}"), "char").into()),
        }
    }
    other => Err(mismatch(Kind::Char, &other)),
});

// -----------------------------------------------------------------------------
// Unsigned integers, widened to the next signed category.

macro_rules! impl_mappable_for_unsigned {
    ($ty:ty, $kind:ident, $wide:ty) => {
        impl Mappable for $ty {
            const KIND: Kind = Kind::$kind;

            #[inline]
            fn to_value(&self) -> Value<'_> {
                Value::$kind(<$wide>::from(*self))
            }

            #[inline]
            fn into_value(self) -> Value<'static> {
                Value::$kind(<$wide>::from(self))
            }

            fn from_value(
                value: Value<'static>,
                _: &SerializationContext<'_>,
            ) -> Result<Self, MapError> {
                integer(&value, Kind::$kind)
            }

            #[inline]
            fn alloc_default() -> Option<Self> {
                Some(0)
            }
        }
    };
}

impl_mappable_for_unsigned!(u8, Short, i16);
impl_mappable_for_unsigned!(u16, Int, i32);
impl_mappable_for_unsigned!(u32, Long, i64);

// -----------------------------------------------------------------------------
// String

impl Mappable for String {
    const KIND: Kind = Kind::String;

    #[inline]
    fn to_value(&self) -> Value<'_> {
        Value::String(Cow::Borrowed(self))
    }

    #[inline]
    fn into_value(self) -> Value<'static> {
        Value::String(Cow::Owned(self))
    }

    fn from_value(value: Value<'static>, _: &SerializationContext<'_>) -> Result<Self, MapError> {
        match value {
            Value::String(s) => Ok(s.into_owned()),
            Value::Char(c) => Ok(c.to_string()),
            other => Err(mismatch(Kind::String, &other)),
        }
    }

    #[inline]
    fn alloc_default() -> Option<Self> {
        Some(String::new())
    }
}

// -----------------------------------------------------------------------------
// Array

impl<T: Mappable, const N: usize> Mappable for [T; N] {
    const KIND: Kind = Kind::Array;

    fn to_value(&self) -> Value<'_> {
        Value::Array(self.iter().map(T::to_value).collect())
    }

    fn into_value(self) -> Value<'static> {
        Value::Array(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value<'static>, ctx: &SerializationContext<'_>) -> Result<Self, MapError> {
        let items = sequence::<T>(value, ctx)?;
        let found = items.len();
        items
            .try_into()
            .map_err(|_| ShapeError::Length { expected: N, found }.into())
    }

    fn alloc_default() -> Option<Self> {
        let items = (0..N)
            .map(|_| T::alloc_default())
            .collect::<Option<Vec<T>>>()?;
        items.try_into().ok()
    }
}
