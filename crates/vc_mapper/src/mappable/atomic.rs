//! Atomics are the volatile category: raw access loads them with `Acquire`
//! and stores them with `Release`, the same orderings used here.

use core::sync::atomic::Ordering;

use super::Mappable;
use crate::context::SerializationContext;
use crate::error::MapError;
use crate::kind::{Kind, Primitive};
use crate::value::Value;

macro_rules! impl_mappable_for_atomic {
    ($(#[$meta:meta])* $ty:ident, $inner:ty, $kind:ident, $primitive:ident) => {
        $(#[$meta])*
        impl Mappable for core::sync::atomic::$ty {
            const KIND: Kind = Kind::$kind;
            const PRIMITIVE: Option<Primitive> = Some(Primitive::$primitive);
            const VOLATILE: bool = true;

            #[inline]
            fn to_value(&self) -> Value<'_> {
                Value::$kind(self.load(Ordering::Acquire))
            }

            #[inline]
            fn into_value(self) -> Value<'static> {
                Value::$kind(self.into_inner())
            }

            fn from_value(
                value: Value<'static>,
                ctx: &SerializationContext<'_>,
            ) -> Result<Self, MapError> {
                <$inner>::from_value(value, ctx).map(Self::new)
            }

            #[inline]
            fn alloc_default() -> Option<Self> {
                Some(Self::new(<$inner>::default()))
            }
        }
    };
}

impl_mappable_for_atomic!(#[cfg(target_has_atomic = "8")] AtomicBool, bool, Bool, Bool);
impl_mappable_for_atomic!(#[cfg(target_has_atomic = "8")] AtomicI8, i8, Byte, I8);
impl_mappable_for_atomic!(#[cfg(target_has_atomic = "16")] AtomicI16, i16, Short, I16);
impl_mappable_for_atomic!(#[cfg(target_has_atomic = "32")] AtomicI32, i32, Int, I32);
impl_mappable_for_atomic!(#[cfg(target_has_atomic = "64")] AtomicI64, i64, Long, I64);
