use core::any::Any;

use super::TypeMapper;
use crate::context::SerializationContext;
use crate::error::{MapError, ShapeError};
use crate::format::Format;
use crate::kind::Kind;

impl TypeMapper {
    /// Writes a whole document.
    pub(crate) fn write<F: Format + ?Sized>(
        &self,
        out: &mut F::Output,
        value: &dyn Any,
        format: &F,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError> {
        format.write_begin(out)?;
        if self.descriptor.is_some() {
            self.write_object(out, value, format, ctx)?;
        } else {
            let ops = self.ops.value().ok_or_else(|| self.wrong_type())?;
            let value = ops.to_value(value)?;
            let kind = if value.is_null() {
                Kind::Null
            } else {
                ops.kind()
            };
            format.write_value(out, None, kind, &value, ctx)?;
        }
        format.write_end(out)
    }

    /// Writes `write_begin_object` to `write_end_object`.
    pub(crate) fn write_object<F: Format + ?Sized>(
        &self,
        out: &mut F::Output,
        value: &dyn Any,
        format: &F,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError> {
        if (*value).type_id() != self.ops.type_id() {
            return Err(self.wrong_type());
        }

        format.write_begin_object(out)?;
        let last = self.properties.len().saturating_sub(1);
        for (index, property) in self.properties.iter().enumerate() {
            let owner = self.owner_name();
            let field = property.info().name();
            let raw = property.read(value).map_err(|e| e.at(owner, field))?;
            let kind = if raw.is_null() {
                Kind::Null
            } else {
                property.kind()
            };
            format
                .write_value(out, Some(property.name()), kind, &raw, ctx)
                .map_err(|e| e.at(owner, field))?;
            format.write_field_separator(out, index == 0, index == last)?;
        }
        format.write_end_object(out)
    }

    #[cold]
    pub(super) fn wrong_type(&self) -> MapError {
        ShapeError::WrongType {
            expected: self.ops.type_name(),
        }
        .into()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::context::SerializationContext;
    use crate::format::Format;
    use crate::kind::Kind;
    use crate::value::Value;
    use crate::{MapError, MapperFactory};
    use alloc::format;
    use alloc::string::String;
    use alloc::vec::Vec;

    /// Records every call, nested objects included.
    struct Recorder;

    impl Format for Recorder {
        type Output = Vec<String>;
        type Input = ();

        fn write_begin(&self, out: &mut Vec<String>) -> Result<(), MapError> {
            out.push(String::from("begin"));
            Ok(())
        }

        fn write_value(
            &self,
            out: &mut Vec<String>,
            name: Option<&str>,
            kind: Kind,
            value: &Value<'_>,
            ctx: &SerializationContext<'_>,
        ) -> Result<(), MapError> {
            out.push(format!("value {} {kind}", name.unwrap_or("-")));
            if let Value::Object(object) = value {
                ctx.serialize_nested(out, object, self)?;
            }
            Ok(())
        }

        fn write_begin_object(&self, out: &mut Vec<String>) -> Result<(), MapError> {
            out.push(String::from("{"));
            Ok(())
        }

        fn write_field_separator(
            &self,
            out: &mut Vec<String>,
            first: bool,
            last: bool,
        ) -> Result<(), MapError> {
            out.push(format!("sep {first} {last}"));
            Ok(())
        }

        fn write_end_object(&self, out: &mut Vec<String>) -> Result<(), MapError> {
            out.push(String::from("}"));
            Ok(())
        }

        fn write_end(&self, out: &mut Vec<String>) -> Result<(), MapError> {
            out.push(String::from("end"));
            Ok(())
        }

        fn read(&self, _: &()) -> Result<Value<'static>, MapError> {
            Ok(Value::Null)
        }
    }

    #[derive(crate::Mapped)]
    struct Inner {
        level: u8,
    }

    #[derive(crate::Mapped)]
    struct Outer {
        name: Option<String>,
        inner: Inner,
        count: i64,
    }

    #[test]
    fn call_order_and_flags() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Outer>().unwrap();
        let outer = Outer {
            name: None,
            inner: Inner { level: 2 },
            count: 9,
        };

        let mut first = Vec::new();
        mapper.serialize(&mut first, &outer, &Recorder).unwrap();
        assert_eq!(
            first,
            [
                "begin",
                "{",
                "value name null",
                "sep true false",
                "value inner object",
                "{",
                "value level short",
                "sep true true",
                "}",
                "sep false false",
                "value count long",
                "sep false true",
                "}",
                "end",
            ]
        );

        let mut second = Vec::new();
        mapper.serialize(&mut second, &outer, &Recorder).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_values() {
        let factory = MapperFactory::new();
        let mut out = Vec::new();
        factory
            .create_or_get::<Vec<i32>>()
            .unwrap()
            .serialize(&mut out, &alloc::vec![1, 2], &Recorder)
            .unwrap();
        assert_eq!(out, ["begin", "value - array", "end"]);

        let mut out = Vec::new();
        factory
            .create_or_get::<Option<i32>>()
            .unwrap()
            .serialize(&mut out, &None, &Recorder)
            .unwrap();
        assert_eq!(out, ["begin", "value - null", "end"]);
    }
}
