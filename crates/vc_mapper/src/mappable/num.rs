//! `NonZero` integers have no zero value, so they have no allocation
//! default: an absent `NonZero` property fails raw allocation.

use core::num::{NonZeroI8, NonZeroI16, NonZeroI32, NonZeroI64, NonZeroU8, NonZeroU16, NonZeroU32};

use super::Mappable;
use crate::context::SerializationContext;
use crate::error::{MapError, ShapeError};
use crate::kind::Kind;
use crate::value::Value;

macro_rules! impl_mappable_for_non_zero {
    ($ty:ty, $inner:ty) => {
        impl Mappable for $ty {
            const KIND: Kind = <$inner as Mappable>::KIND;

            #[inline]
            fn to_value(&self) -> Value<'_> {
                self.get().into_value()
            }

            #[inline]
            fn into_value(self) -> Value<'static> {
                self.get().into_value()
            }

            fn from_value(
                value: Value<'static>,
                ctx: &SerializationContext<'_>,
            ) -> Result<Self, MapError> {
                let v = <$inner>::from_value(value, ctx)?;
                <$ty>::new(v).ok_or_else(|| ShapeError::out_of_range(v, stringify!($ty)).into())
            }
        }
    };
}

impl_mappable_for_non_zero!(NonZeroI8, i8);
impl_mappable_for_non_zero!(NonZeroI16, i16);
impl_mappable_for_non_zero!(NonZeroI32, i32);
impl_mappable_for_non_zero!(NonZeroI64, i64);
impl_mappable_for_non_zero!(NonZeroU8, u8);
impl_mappable_for_non_zero!(NonZeroU16, u16);
impl_mappable_for_non_zero!(NonZeroU32, u32);
