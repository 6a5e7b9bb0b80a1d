//! The value model exchanged with formats.
//!
//! On the write path a [`Value`] may borrow from the instance being
//! serialized (`Value<'a>`), so strings are not copied and nested mapped
//! objects are passed as [`ObjectRef`]. On the read path a format produces an
//! owned `Value<'static>` tree made of scalars, arrays and [`ValueMap`]s only.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod map;
mod object;

// -----------------------------------------------------------------------------
// Exports

pub use map::ValueMap;
pub use object::ObjectRef;

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use crate::kind::Kind;

// -----------------------------------------------------------------------------
// Value

/// A classified value, see [`Kind`].
#[derive(Debug)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Cow<'a, str>),
    Array(Vec<Value<'a>>),
    Map(ValueMap<'a>),
    /// A nested mapped value, only produced on the write path.
    Object(ObjectRef<'a>),
}

impl<'a> Value<'a> {
    /// Classifies this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Byte(_) => Kind::Byte,
            Value::Short(_) => Kind::Short,
            Value::Char(_) => Kind::Char,
            Value::Int(_) => Kind::Int,
            Value::Long(_) => Kind::Long,
            Value::Float(_) => Kind::Float,
            Value::Double(_) => Kind::Double,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string content of a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the map of a [`Value::Map`].
    pub fn as_map(&self) -> Option<&ValueMap<'a>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the elements of a [`Value::Array`].
    pub fn as_array(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// A borrowing copy of this value, strings and objects are not cloned.
    pub fn reborrow(&self) -> Value<'_> {
        match self {
            Value::Null => Value::Null,
            Value::Bool(v) => Value::Bool(*v),
            Value::Byte(v) => Value::Byte(*v),
            Value::Short(v) => Value::Short(*v),
            Value::Char(v) => Value::Char(*v),
            Value::Int(v) => Value::Int(*v),
            Value::Long(v) => Value::Long(*v),
            Value::Float(v) => Value::Float(*v),
            Value::Double(v) => Value::Double(*v),
            Value::String(s) => Value::String(Cow::Borrowed(&**s)),
            Value::Array(items) => Value::Array(items.iter().map(Value::reborrow).collect()),
            Value::Map(map) => Value::Map(map.iter().map(|(k, v)| (k, v.reborrow())).collect()),
            Value::Object(object) => Value::Object(object.reborrow()),
        }
    }

    /// Any integer category widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v as i64),
            Value::Short(v) => Some(v as i64),
            Value::Int(v) => Some(v as i64),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Any numeric category as `f64`, integers may lose precision.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v as f64),
            Value::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }
}

impl PartialEq for Value<'_> {
    /// Structural equality. Objects are equal only if they are the same instance.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => core::ptr::addr_eq(a.as_any(), b.as_any()),
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl From<$ty> for Value<'_> {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    char => Char,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl<'a> From<&'a str> for Value<'a> {
    #[inline]
    fn from(value: &'a str) -> Self {
        Value::String(Cow::Borrowed(value))
    }
}

impl From<String> for Value<'_> {
    #[inline]
    fn from(value: String) -> Self {
        Value::String(Cow::Owned(value))
    }
}

impl<'a> From<ValueMap<'a>> for Value<'a> {
    #[inline]
    fn from(value: ValueMap<'a>) -> Self {
        Value::Map(value)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    #[inline]
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

impl<'a, T: Into<Value<'a>>> From<Vec<T>> for Value<'a> {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Value, ValueMap};
    use crate::kind::Kind;
    use alloc::string::String;
    use alloc::vec;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(3_i8), Value::Byte(3));
        assert_eq!(Value::from('x').kind(), Kind::Char);
        assert_eq!(Value::from(String::from("a")), Value::from("a"));
        assert_eq!(Value::from(vec![1_i32, 2]).as_array().map(<[_]>::len), Some(2));
        assert_eq!(Value::from(None::<bool>), Value::Null);
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Short(-4).as_i64(), Some(-4));
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::Long(7).as_f64(), Some(7.0));
        assert_eq!(Value::from("7").as_i64(), None);
    }

    #[test]
    fn map_equality_ignores_order() {
        let mut a = ValueMap::new();
        a.insert("x", Value::Int(1));
        a.insert("y", Value::Int(2));

        let mut b = ValueMap::new();
        b.insert("y", Value::Int(2));
        b.insert("x", Value::Int(1));

        assert_eq!(Value::Map(a), Value::Map(b));
    }
}
