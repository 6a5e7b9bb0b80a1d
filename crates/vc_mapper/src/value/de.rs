use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Formatter};

use serde_core::de::{Deserialize, Deserializer, Error, MapAccess, SeqAccess, Visitor};

use super::{Value, ValueMap};

/// A [`Visitor`] producing owned [`Value`]s.
///
/// Integers become [`Value::Int`] when they fit into `i32` and
/// [`Value::Long`] otherwise, every float becomes [`Value::Double`].
/// Typed conversion narrows them later, see `Mappable::from_value`.
struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value<'static>;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("any mappable value")
    }

    #[inline]
    fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(match i32::try_from(v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Long(v),
        })
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        match i64::try_from(v) {
            Ok(v) => self.visit_i64(v),
            Err(_) => Err(E::custom(format_args!("integer {v} is out of range for `i64`"))),
        }
    }

    #[inline]
    fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Value::Double(v))
    }

    #[inline]
    fn visit_char<E: Error>(self, v: char) -> Result<Self::Value, E> {
        Ok(Value::Char(v))
    }

    #[inline]
    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Value::String(Cow::Owned(String::from(v))))
    }

    #[inline]
    fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Value::String(Cow::Owned(v)))
    }

    #[inline]
    fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    #[inline]
    fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(item) = seq.next_element::<Value<'static>>()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut values = ValueMap::with_capacity(map.size_hint().unwrap_or_default());
        while let Some((key, value)) = map.next_entry::<String, Value<'static>>()? {
            values.insert(key, value);
        }
        Ok(Value::Map(values))
    }
}

impl<'de> Deserialize<'de> for Value<'static> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl<'de> Deserialize<'de> for ValueMap<'static> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match deserializer.deserialize_map(ValueVisitor)? {
            Value::Map(map) => Ok(map),
            other => Err(D::Error::custom(format_args!(
                "expected map, found {}",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::value::{Value, ValueMap};
    use alloc::vec::Vec;

    #[test]
    fn integers_are_narrowed() {
        let value: Value<'static> = serde_json::from_str("[1, -2147483649, 1.5, null]").unwrap();
        assert_eq!(
            value,
            Value::Array(alloc::vec![
                Value::Int(1),
                Value::Long(-2_147_483_649),
                Value::Double(1.5),
                Value::Null,
            ])
        );

        let err = serde_json::from_str::<Value<'static>>("18446744073709551615").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn maps_keep_order() {
        let map: ValueMap<'static> =
            serde_json::from_str(r#"{"z": true, "a": {"inner": "s"}}"#).unwrap();

        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, ["z", "a"]);
        let inner = map.get("a").and_then(Value::as_map).unwrap();
        assert_eq!(inner.get("inner"), Some(&Value::from("s")));

        assert!(serde_json::from_str::<ValueMap<'static>>("[1]").is_err());
    }
}
