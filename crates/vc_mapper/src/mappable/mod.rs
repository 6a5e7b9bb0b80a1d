//! Conversion between Rust types and [`Value`]s.
//!
//! ## Implemented Menu
//!
//! - native:
//!     - `bool`, `char`, `i8`-`i64`, `u8`-`u32`, `f32`, `f64`
//!     - `String`, `[T; N]`
//! - core:
//!     - `AtomicBool`, `AtomicI8`-`AtomicI64` (volatile properties)
//!     - `NonZero`: I8-I64, U8-U32 (no allocation default)
//!     - `Option<T>` (nullable properties)
//! - alloc:
//!     - `Box<T>`, `Vec<T>`, `BTreeMap<String, V>`
//! - std:
//!     - `HashMap<String, V, S>`
//! - vc_utils:
//!     - `hashbrown::HashMap<String, V, S>`
//! - this crate:
//!     - `ValueMap<'static>`
//!     - every `#[derive(Mapped)]` type
//!
//! `u64`, `usize` and `i128` have no lossless category and are not mappable;
//! use an [`Adapter`](crate::adapter::Adapter) to map them, e.g. to a `String`.

// -----------------------------------------------------------------------------
// Modules

mod atomic;
mod collections;
mod native;
mod num;
mod wrapper;

use alloc::vec::Vec;
use core::any::{Any, type_name};

use crate::context::SerializationContext;
use crate::error::{MapError, ShapeError};
use crate::info::TypeDescriptor;
use crate::kind::{Kind, Primitive};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Mappable

/// A type with a [`Value`] representation.
///
/// The associated constants classify the *declared* type, so a mapper can
/// pick its accessor path once, when it is built. The methods convert
/// instances.
///
/// Nested [`Mapped`](crate::Mapped) structs are represented as
/// [`Value::Object`] on the write path and arrive as [`Value::Map`] on the
/// read path; their `from_value` delegates to
/// [`SerializationContext::deserialize_nested`].
///
/// # Examples
///
/// ```
/// use vc_mapper::{Kind, Mappable, MapError, SerializationContext, Value};
///
/// struct Percent(u8);
///
/// impl Mappable for Percent {
///     const KIND: Kind = Kind::Short;
///
///     fn to_value(&self) -> Value<'_> {
///         self.0.into_value()
///     }
///     fn into_value(self) -> Value<'static> {
///         self.0.into_value()
///     }
///     fn from_value(value: Value<'static>, ctx: &SerializationContext<'_>) -> Result<Self, MapError> {
///         match u8::from_value(value, ctx)? {
///             v @ 0..=100 => Ok(Percent(v)),
///             v => Err(MapError::custom(format_args!("{v}% is not a percentage"))),
///         }
///     }
///     fn alloc_default() -> Option<Self> {
///         Some(Percent(0))
///     }
/// }
/// ```
pub trait Mappable: Any + Sized {
    /// The category values of this type are written as.
    const KIND: Kind;

    /// The in-memory representation, if it is exactly one of the eight
    /// primitives. Enables the non-boxing accessor path.
    const PRIMITIVE: Option<Primitive> = None;

    /// Accessed with acquire/release ordering, for atomics.
    const VOLATILE: bool = false;

    /// Accepts [`Value::Null`], for `Option`.
    const NULLABLE: bool = false;

    /// Borrows this value as a [`Value`].
    fn to_value(&self) -> Value<'_>;

    /// Converts this value into an owned [`Value`].
    fn into_value(self) -> Value<'static>;

    /// Rebuilds a value from its representation.
    ///
    /// A [`Value`] of the wrong category is a [`ShapeError::Mismatch`],
    /// a number that does not fit is a [`ShapeError::OutOfRange`].
    fn from_value(value: Value<'static>, ctx: &SerializationContext<'_>) -> Result<Self, MapError>;

    /// The value an absent property is left at when an instance is created
    /// without a constructor: zero, empty, `None`.
    ///
    /// `None` means there is no such value, an absent property of this type
    /// is a [`MapError::Allocation`].
    fn alloc_default() -> Option<Self> {
        None
    }

    /// The descriptor of a nested mapped type.
    fn type_descriptor() -> Option<&'static TypeDescriptor> {
        None
    }
}

// -----------------------------------------------------------------------------
// Helpers

#[cold]
#[inline(never)]
pub(crate) fn mismatch(expected: Kind, found: &Value<'_>) -> MapError {
    MapError::mismatch(expected, found.kind())
}

/// Any integer category, narrowed to `T` with a range check.
pub(crate) fn integer<T: TryFrom<i64>>(value: &Value<'_>, expected: Kind) -> Result<T, MapError> {
    let Some(v) = value.as_i64() else {
        return Err(mismatch(expected, value));
    };
    T::try_from(v).map_err(|_| ShapeError::out_of_range(v, type_name::<T>()).into())
}

/// The elements of an array.
pub(crate) fn sequence<T: Mappable>(
    value: Value<'static>,
    ctx: &SerializationContext<'_>,
) -> Result<Vec<T>, MapError> {
    match value {
        Value::Array(items) => items.into_iter().map(|v| T::from_value(v, ctx)).collect(),
        other => Err(mismatch(Kind::Array, &other)),
    }
}

#[cfg(test)]
mod tests {
    use crate::factory::MapperFactory;
    use crate::kind::Kind;
    use crate::mappable::Mappable;
    use crate::value::{Value, ValueMap};
    use crate::{MapError, ShapeError};
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::num::NonZeroI32;
    use core::sync::atomic::{AtomicBool, AtomicI16, Ordering};
    use std::collections::HashMap;

    fn from<T: Mappable>(value: Value<'static>) -> Result<T, MapError> {
        let factory = MapperFactory::new();
        T::from_value(value, &factory.context())
    }

    #[test]
    fn unsigned_widening() {
        assert_eq!(200_u8.to_value(), Value::Short(200));
        assert_eq!(u16::MAX.to_value(), Value::Int(65_535));
        assert_eq!(u32::MAX.into_value(), Value::Long(4_294_967_295));

        assert_eq!(from::<u8>(Value::Int(255)).unwrap(), 255);
        let err = from::<u8>(Value::Short(-1)).unwrap_err();
        assert!(matches!(err, MapError::Shape(ShapeError::OutOfRange { target: "u8", .. })));
    }

    #[test]
    fn integer_narrowing() {
        assert_eq!(from::<i8>(Value::Long(-128)).unwrap(), -128);
        assert!(from::<i16>(Value::Int(40_000)).is_err());
        assert_eq!(from::<i64>(Value::Byte(3)).unwrap(), 3);

        let err = from::<i32>(Value::from("3")).unwrap_err();
        assert!(matches!(
            err,
            MapError::Shape(ShapeError::Mismatch {
                expected: Kind::Int,
                found: Kind::String
            })
        ));
    }

    #[test]
    fn floats_and_chars() {
        assert_eq!(from::<f32>(Value::Double(0.25)).unwrap(), 0.25);
        assert_eq!(from::<f64>(Value::Int(2)).unwrap(), 2.0);
        assert_eq!(from::<char>(Value::from("x")).unwrap(), 'x');
        assert!(from::<char>(Value::from("xy")).is_err());
        assert_eq!(from::<String>(Value::Char('c')).unwrap(), "c");
    }

    #[test]
    fn arrays_check_length() {
        assert_eq!(
            from::<[i32; 2]>(Value::from(vec![1_i32, 2])).unwrap(),
            [1, 2]
        );
        let err = from::<[i32; 3]>(Value::from(vec![1_i32, 2])).unwrap_err();
        assert!(matches!(
            err,
            MapError::Shape(ShapeError::Length {
                expected: 3,
                found: 2
            })
        ));
        assert_eq!(<[String; 2]>::alloc_default(), Some([String::new(), String::new()]));
    }

    #[test]
    fn options_and_defaults() {
        assert_eq!(from::<Option<i32>>(Value::Null).unwrap(), None);
        assert_eq!(from::<Option<i32>>(Value::Int(4)).unwrap(), Some(4));
        assert_eq!(None::<i32>.to_value(), Value::Null);
        assert!(<Option<i32>>::NULLABLE);

        assert_eq!(<Option<i32>>::alloc_default(), Some(None));
        assert_eq!(<Vec<u8>>::alloc_default(), Some(Vec::new()));
        assert_eq!(NonZeroI32::alloc_default(), None);
        assert!(from::<NonZeroI32>(Value::Int(0)).is_err());
    }

    #[test]
    fn atomics() {
        let flag = AtomicBool::new(true);
        assert_eq!(flag.to_value(), Value::Bool(true));
        assert!(AtomicBool::VOLATILE);

        let level = from::<AtomicI16>(Value::Int(12)).unwrap();
        assert_eq!(level.load(Ordering::Relaxed), 12);
    }

    #[test]
    fn maps() {
        let mut scores = BTreeMap::new();
        scores.insert(String::from("b"), 2_i32);
        scores.insert(String::from("a"), 1_i32);

        let value = scores.to_value();
        let keys: Vec<_> = value.as_map().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);

        let back: HashMap<String, i64> = from(scores.into_value()).unwrap();
        assert_eq!(back.get("b"), Some(&2));

        let raw: ValueMap<'static> = from(back.into_value()).unwrap();
        assert_eq!(raw.len(), 2);
        assert!(from::<ValueMap<'static>>(Value::Int(1)).is_err());
    }
}
