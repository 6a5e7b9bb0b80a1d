//! A compact JSON format on top of `serde_json`.

use alloc::string::String;
use core::fmt::Write;

use crate::context::SerializationContext;
use crate::error::{MapError, ShapeError};
use crate::format::Format;
use crate::kind::Kind;
use crate::value::Value;

/// Compact JSON, written to a `String` and read from a `str`.
///
/// Integers and floats keep their category on the way out; on the way in
/// integers are narrowed to `int` when they fit and `long` otherwise, every
/// other number is a `double`. A `char` is written as a one character
/// string. NaN and infinite floats have no JSON form and fail with
/// [`ShapeError::OutOfRange`].
///
/// # Examples
///
/// ```
/// use vc_mapper::{Mapped, MapperFactory};
/// use vc_mapper::format::json::JsonFormat;
///
/// #[derive(Mapped, Debug, PartialEq)]
/// struct Message {
///     text: String,
/// }
///
/// let factory = MapperFactory::new();
/// let mapper = factory.create_or_get::<Message>().unwrap();
///
/// let message = Message { text: "Hello! World".into() };
/// let json = mapper.serialize_to_string(&message, &JsonFormat).unwrap();
/// assert_eq!(json, r#"{"text":"Hello! World"}"#);
///
/// assert_eq!(mapper.deserialize(json.as_str(), &JsonFormat).unwrap(), message);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormat;

impl JsonFormat {
    fn write_string(out: &mut String, s: &str) -> Result<(), MapError> {
        out.push_str(&serde_json::to_string(s)?);
        Ok(())
    }

    fn write_json(
        &self,
        out: &mut String,
        value: &Value<'_>,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError> {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Value::Byte(v) => write!(out, "{v}")?,
            Value::Short(v) => write!(out, "{v}")?,
            Value::Int(v) => write!(out, "{v}")?,
            Value::Long(v) => write!(out, "{v}")?,
            Value::Float(v) if !v.is_finite() => {
                return Err(ShapeError::out_of_range(v, "JSON").into());
            }
            Value::Double(v) if !v.is_finite() => {
                return Err(ShapeError::out_of_range(v, "JSON").into());
            }
            Value::Float(v) => out.push_str(&serde_json::to_string(v)?),
            Value::Double(v) => out.push_str(&serde_json::to_string(v)?),
            Value::Char(c) => {
                let mut buf = [0; 4];
                Self::write_string(out, c.encode_utf8(&mut buf))?;
            }
            Value::String(s) => Self::write_string(out, s)?,
            Value::Array(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index != 0 {
                        out.push(',');
                    }
                    self.write_json(out, item, ctx)?;
                }
                out.push(']');
            }
            Value::Map(map) => {
                out.push('{');
                for (index, (key, item)) in map.iter().enumerate() {
                    if index != 0 {
                        out.push(',');
                    }
                    Self::write_string(out, key)?;
                    out.push(':');
                    self.write_json(out, item, ctx)?;
                }
                out.push('}');
            }
            Value::Object(object) => ctx.serialize_nested(out, object, self)?,
        }
        Ok(())
    }
}

impl Format for JsonFormat {
    type Output = String;
    type Input = str;

    fn write_value(
        &self,
        out: &mut String,
        name: Option<&str>,
        _: Kind,
        value: &Value<'_>,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError> {
        if let Some(name) = name {
            Self::write_string(out, name)?;
            out.push(':');
        }
        self.write_json(out, value, ctx)
    }

    fn write_begin_object(&self, out: &mut String) -> Result<(), MapError> {
        out.push('{');
        Ok(())
    }

    fn write_field_separator(
        &self,
        out: &mut String,
        _: bool,
        last: bool,
    ) -> Result<(), MapError> {
        if !last {
            out.push(',');
        }
        Ok(())
    }

    fn write_end_object(&self, out: &mut String) -> Result<(), MapError> {
        out.push('}');
        Ok(())
    }

    fn read(&self, input: &str) -> Result<Value<'static>, MapError> {
        Ok(serde_json::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFormat;
    use crate::adapter::tests::{Celsius, CelsiusToKelvin, KelvinToText};
    use crate::format::Format;
    use crate::value::{Value, ValueMap};
    use crate::{MapError, MapperFactory, ShapeError};
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    fn write(value: &Value<'_>) -> String {
        let factory = MapperFactory::new();
        let mut out = String::new();
        JsonFormat
            .write_value(&mut out, None, value.kind(), value, &factory.context())
            .unwrap();
        out
    }

    #[test]
    fn scalars_and_escaping() {
        assert_eq!(write(&Value::Null), "null");
        assert_eq!(write(&Value::Long(-9)), "-9");
        assert_eq!(write(&Value::Float(0.5)), "0.5");
        assert_eq!(write(&Value::Char('"')), r#""\"""#);
        assert_eq!(write(&Value::from("a\nb")), r#""a\nb""#);
    }

    #[test]
    fn non_finite_floats() {
        let factory = MapperFactory::new();
        let ctx = factory.context();
        let values = [
            Value::Double(f64::NAN),
            Value::Float(f32::INFINITY),
            Value::Double(f64::NEG_INFINITY),
        ];
        for value in values {
            let mut out = String::new();
            let err = JsonFormat
                .write_value(&mut out, None, value.kind(), &value, &ctx)
                .unwrap_err();
            assert!(matches!(err, MapError::Shape(ShapeError::OutOfRange { .. })));
        }

        #[derive(crate::Mapped)]
        struct Ratio {
            value: f64,
        }

        let mapper = factory.create_or_get::<Ratio>().unwrap();
        let err = mapper
            .serialize_to_string(&Ratio { value: f64::NAN }, &JsonFormat)
            .unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn arrays_and_maps() {
        let mut map = ValueMap::new();
        map.insert("b", Value::from(vec![1_i32, 2]));
        map.insert("a", Value::Bool(true));
        assert_eq!(write(&Value::Map(map)), r#"{"b":[1,2],"a":true}"#);
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Station {
        name: String,
        #[mapped(adapted)]
        temperature: Celsius,
        samples: Vec<Point>,
    }

    #[test]
    fn documents() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Point>().unwrap();

        let json = mapper.serialize_to_string(&Point { x: 3, y: 4 }, &JsonFormat).unwrap();
        assert_eq!(json, r#"{"x":3,"y":4}"#);
        assert_eq!(mapper.deserialize(json.as_str(), &JsonFormat).unwrap(), Point { x: 3, y: 4 });
        assert_eq!(mapper.deserialize(r#"{"x":3}"#, &JsonFormat).unwrap(), Point { x: 3, y: 0 });

        let err = mapper.deserialize(r#"{"x":"3"}"#, &JsonFormat).unwrap_err();
        assert!(err.is_shape());
        let err = mapper.deserialize(r#"{"x":4294967296}"#, &JsonFormat).unwrap_err();
        assert!(matches!(err.root(), MapError::Shape(ShapeError::OutOfRange { .. })));
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Leaf {
        id: i32,
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Mid {
        leaf: Leaf,
        tags: Vec<Leaf>,
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Top {
        mid: Mid,
        name: String,
    }

    #[test]
    fn two_levels_deep() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Top>().unwrap();

        let top = Top {
            mid: Mid {
                leaf: Leaf { id: 1 },
                tags: vec![Leaf { id: 2 }, Leaf { id: 3 }],
            },
            name: String::from("t"),
        };
        let json = mapper.serialize_to_string(&top, &JsonFormat).unwrap();
        assert_eq!(
            json,
            r#"{"mid":{"leaf":{"id":1},"tags":[{"id":2},{"id":3}]},"name":"t"}"#
        );
        assert_eq!(mapper.deserialize(json.as_str(), &JsonFormat).unwrap(), top);

        // Too deep for a limit of one nested level.
        let shallow = MapperFactory::builder().max_depth(1).build();
        let mapper = shallow.create_or_get::<Top>().unwrap();
        let err = mapper.serialize_to_string(&top, &JsonFormat).unwrap_err();
        assert!(matches!(err.root(), MapError::DepthExceeded(1)));
        let err = mapper.deserialize(json.as_str(), &JsonFormat).unwrap_err();
        assert!(matches!(err.root(), MapError::DepthExceeded(1)));
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Tagged<T> {
        tag: T,
        count: u16,
    }

    #[test]
    fn generic_structs() {
        let factory = MapperFactory::new();

        let ints = factory.create_or_get::<Tagged<i32>>().unwrap();
        let json = ints
            .serialize_to_string(&Tagged { tag: 7, count: 2 }, &JsonFormat)
            .unwrap();
        assert_eq!(json, r#"{"tag":7,"count":2}"#);

        let texts = factory.create_or_get::<Tagged<String>>().unwrap();
        let value = texts.deserialize(r#"{"tag":"a","count":1}"#, &JsonFormat).unwrap();
        assert_eq!(value, Tagged { tag: String::from("a"), count: 1 });
        assert!(factory.cached_len() >= 2);
    }

    #[test]
    fn adapted_and_nested() {
        let factory = MapperFactory::builder()
            .adapter(CelsiusToKelvin)
            .adapter(KelvinToText)
            .build();
        let mapper = factory.create_or_get::<Station>().unwrap();

        let station = Station {
            name: String::from("north"),
            temperature: Celsius(0.0),
            samples: vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }],
        };
        let json = mapper.serialize_to_string(&station, &JsonFormat).unwrap();
        assert_eq!(
            json,
            r#"{"name":"north","temperature":"273.15K","samples":[{"x":1,"y":2},{"x":-3,"y":4}]}"#
        );
        assert_eq!(mapper.deserialize(json.as_str(), &JsonFormat).unwrap(), station);

        let mut existing = station;
        mapper
            .deserialize_into(r#"{"temperature":"283.15K"}"#, &mut existing, &JsonFormat)
            .unwrap();
        assert_eq!(existing.name, "north");
        assert_eq!(existing.samples.len(), 2);
        assert!((existing.temperature.0 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn read_keeps_order() {
        let value = JsonFormat.read(r#"{"y":4,"x":[3]}"#).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["y", "x"]);
        assert_eq!(map.get("y"), Some(&Value::Int(4)));
        assert!(JsonFormat.read("{").is_err());
    }
}
