//! Classification of values and declared types.
//!
//! Every dispatch decision of the engine is made on a [`Kind`]: which
//! accessor path a property compiles to, what a format writes, how an
//! incoming value is converted back.

use core::fmt;

use crate::mappable::Mappable;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Kind

/// The semantic category of a value.
///
/// A declared type is classified through [`Mappable::KIND`], a runtime value
/// through [`Value::kind`]. A null value is always [`Kind::Null`], whatever
/// its declared type.
///
/// # Examples
///
/// ```
/// use vc_mapper::{Kind, Value, kind};
///
/// assert_eq!(kind::classify::<i32>(), Kind::Int);
/// assert_eq!(kind::classify::<Option<String>>(), Kind::String);
/// assert_eq!(Value::from(None::<i32>).kind(), Kind::Null);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Kind {
    Null,
    Bool,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    /// A mapped type, written as a nested document.
    Object,
    Array,
    /// An ordered string-keyed map.
    Map,
    String,
}

impl Kind {
    /// Lowercase name used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Byte => "byte",
            Kind::Short => "short",
            Kind::Char => "char",
            Kind::Int => "int",
            Kind::Long => "long",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::String => "string",
        }
    }

    /// Returns `true` for the eight primitive categories.
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Kind::Bool
                | Kind::Byte
                | Kind::Short
                | Kind::Char
                | Kind::Int
                | Kind::Long
                | Kind::Float
                | Kind::Double
        )
    }

    /// Returns `true` for integer and floating point categories.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Kind::Byte | Kind::Short | Kind::Int | Kind::Long | Kind::Float | Kind::Double
        )
    }

    /// Returns `true` for [`Kind::Object`], [`Kind::Array`] and [`Kind::Map`].
    pub const fn is_composite(self) -> bool {
        matches!(self, Kind::Object | Kind::Array | Kind::Map)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Primitive

/// The exact in-memory representation of a primitive property.
///
/// [`Kind`] says how a value is written, `Primitive` says how it is stored.
/// `u16` is an [`Kind::Int`] but not a [`Primitive::I32`], so only types
/// whose layout matches get the raw accessor's direct load/store path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    Char,
    I32,
    I64,
    F32,
    F64,
}

impl Primitive {
    /// The category values of this representation are written as.
    pub const fn kind(self) -> Kind {
        match self {
            Primitive::Bool => Kind::Bool,
            Primitive::I8 => Kind::Byte,
            Primitive::I16 => Kind::Short,
            Primitive::Char => Kind::Char,
            Primitive::I32 => Kind::Int,
            Primitive::I64 => Kind::Long,
            Primitive::F32 => Kind::Float,
            Primitive::F64 => Kind::Double,
        }
    }
}

// -----------------------------------------------------------------------------
// Classification

/// Classifies a declared type.
#[inline(always)]
pub const fn classify<T: Mappable>() -> Kind {
    T::KIND
}

/// Classifies a runtime value, see [`Value::kind`].
#[inline(always)]
pub fn classify_value(value: &Value<'_>) -> Kind {
    value.kind()
}

#[cfg(test)]
mod tests {
    use super::{Kind, Primitive, classify, classify_value};
    use crate::value::{Value, ValueMap};
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::sync::atomic::AtomicI64;

    #[test]
    fn declared_types() {
        assert_eq!(classify::<bool>(), Kind::Bool);
        assert_eq!(classify::<i8>(), Kind::Byte);
        assert_eq!(classify::<u8>(), Kind::Short);
        assert_eq!(classify::<char>(), Kind::Char);
        assert_eq!(classify::<u16>(), Kind::Int);
        assert_eq!(classify::<u32>(), Kind::Long);
        assert_eq!(classify::<f32>(), Kind::Float);
        assert_eq!(classify::<f64>(), Kind::Double);
        assert_eq!(classify::<String>(), Kind::String);
        assert_eq!(classify::<Vec<i32>>(), Kind::Array);
        assert_eq!(classify::<ValueMap<'static>>(), Kind::Map);
        assert_eq!(classify::<Option<i64>>(), Kind::Long);
        assert_eq!(classify::<AtomicI64>(), Kind::Long);
    }

    #[test]
    fn runtime_values() {
        assert_eq!(classify_value(&Value::Null), Kind::Null);
        assert_eq!(classify_value(&Value::from(Some(3_i32))), Kind::Int);
        assert_eq!(classify_value(&Value::from(None::<String>)), Kind::Null);
        assert_eq!(classify_value(&Value::from("text")), Kind::String);
        assert_eq!(classify_value(&Value::Array(Vec::new())), Kind::Array);
    }

    #[test]
    fn categories() {
        assert!(Kind::Char.is_primitive());
        assert!(!Kind::String.is_primitive());
        assert!(Kind::Double.is_numeric());
        assert!(!Kind::Char.is_numeric());
        assert!(Kind::Map.is_composite());
        assert_eq!(Primitive::I16.kind(), Kind::Short);
        assert_eq!(Kind::Object.to_string(), "object");
    }
}
