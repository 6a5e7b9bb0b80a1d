use alloc::boxed::Box;
use core::any::Any;

use super::TypeMapper;
use crate::access::Target;
use crate::context::SerializationContext;
use crate::error::MapError;
use crate::kind::Kind;
use crate::value::{Value, ValueMap};

impl TypeMapper {
    /// Reads a new instance from a whole document.
    pub(crate) fn read_value(
        &self,
        value: Value<'static>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<dyn Any>, MapError> {
        if self.descriptor.is_some() {
            match value {
                Value::Map(map) => self.read_map(map, ctx),
                other => Err(MapError::mismatch(Kind::Object, other.kind())),
            }
        } else {
            let ops = self.ops.value().ok_or_else(|| self.wrong_type())?;
            ops.from_value(value, ctx)
        }
    }

    /// Reads a document into an existing instance.
    pub(crate) fn read_value_into(
        &self,
        value: Value<'static>,
        target: &mut dyn Any,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError> {
        if self.descriptor.is_some() {
            match value {
                Value::Map(map) => self.read_map_into(map, target, ctx),
                other => Err(MapError::mismatch(Kind::Object, other.kind())),
            }
        } else {
            let ops = self.ops.value().ok_or_else(|| self.wrong_type())?;
            self.ops.assign(target, ops.from_value(value, ctx)?)
        }
    }

    /// Builds a new instance, the fields absent from `map` are left at
    /// their allocation default.
    pub(crate) fn read_map(
        &self,
        mut map: ValueMap<'static>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<dyn Any>, MapError> {
        let descriptor = self.descriptor.ok_or_else(|| self.wrong_type())?;
        let mut allocation = self.strategy.allocate(descriptor)?;
        for property in self.properties.iter() {
            let Some(value) = take(&mut map, property.name(), property.is_nullable()) else {
                continue;
            };
            (property.setter)(allocation.target(), value, ctx)
                .map_err(|e| e.at(descriptor.ident(), property.info().name()))?;
        }
        allocation.finish()
    }

    /// Writes the properties present in `map` into `target`.
    pub(crate) fn read_map_into(
        &self,
        mut map: ValueMap<'static>,
        target: &mut dyn Any,
        ctx: &SerializationContext<'_>,
    ) -> Result<(), MapError> {
        let descriptor = self.descriptor.ok_or_else(|| self.wrong_type())?;
        if (*target).type_id() != self.ops.type_id() {
            return Err(self.wrong_type());
        }
        for property in self.properties.iter() {
            let Some(value) = take(&mut map, property.name(), property.is_nullable()) else {
                continue;
            };
            (property.setter)(Target::existing(&mut *target), value, ctx)
                .map_err(|e| e.at(descriptor.ident(), property.info().name()))?;
        }
        Ok(())
    }
}

/// Takes the value of a property, `None` if it is absent.
///
/// Unknown keys are ignored; a null for a property that does not accept it
/// counts as absent.
#[inline]
fn take(map: &mut ValueMap<'static>, name: &str, nullable: bool) -> Option<Value<'static>> {
    match map.take(name)? {
        Value::Null if !nullable => None,
        value => Some(value),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::access::CheckedAccess;
    use crate::value::{Value, ValueMap};
    use crate::{MapError, MapperFactory, ShapeError};
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::num::NonZeroU16;
    use core::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    #[derive(crate::Mapped, Debug, PartialEq, Default)]
    #[mapped(default)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Path {
        label: Option<String>,
        points: Vec<Point>,
        origin: Point,
    }

    #[derive(crate::Mapped)]
    struct Flags {
        ready: AtomicBool,
        hits: AtomicI64,
    }

    #[derive(crate::Mapped, Debug)]
    struct Port {
        number: NonZeroU16,
    }

    fn point(x: i32, y: i32) -> Value<'static> {
        Value::Map(ValueMap::from_iter([("x", Value::Int(x)), ("y", Value::Int(y))]))
    }

    #[test]
    fn missing_null_and_unknown_keys() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Point>().unwrap();

        let map = ValueMap::from_iter([
            ("x", Value::Int(3)),
            ("y", Value::Null),
            ("z", Value::Int(5)),
        ]);
        assert_eq!(mapper.deserialize_map(map).unwrap(), Point { x: 3, y: 0 });
    }

    #[test]
    fn nested_arrays_of_objects() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Path>().unwrap();

        let map = ValueMap::from_iter([
            ("label", Value::Null),
            ("points", Value::Array(vec![point(1, 2), point(3, 4)])),
            ("origin", point(0, -1)),
        ]);
        let path = mapper.deserialize_map(map).unwrap();
        assert_eq!(
            path,
            Path {
                label: None,
                points: vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }],
                origin: Point { x: 0, y: -1 },
            }
        );
    }

    #[test]
    fn errors_carry_the_property() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Path>().unwrap();

        let map = ValueMap::from_iter([("origin", Value::Int(1))]);
        let err = mapper.deserialize_map(map).unwrap_err();
        assert!(err.is_shape());

        let map = ValueMap::from_iter([(
            "points",
            Value::Array(vec![point(1, 2), Value::Map(ValueMap::from_iter([("x", Value::from("no"))]))]),
        )]);
        let err = mapper.deserialize_map(map).unwrap_err();
        assert!(matches!(err.root(), MapError::Shape(ShapeError::Mismatch { .. })));
        #[cfg(all(debug_assertions, feature = "debug"))]
        assert_eq!(
            err.path().map(|p| p.iter().collect::<Vec<_>>()),
            Some(vec![("Path", "points"), ("Point", "x")])
        );
    }

    #[test]
    fn into_existing() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Path>().unwrap();

        let mut path = Path {
            label: Some(String::from("old")),
            points: Vec::new(),
            origin: Point { x: 7, y: 7 },
        };
        let map = ValueMap::from_iter([("label", Value::from("new")), ("origin", point(1, 1))]);
        mapper.deserialize_map_into(map, &mut path).unwrap();
        assert_eq!(path.label.as_deref(), Some("new"));
        assert_eq!(path.origin, Point { x: 1, y: 1 });

        // `label` is nullable, an explicit null clears it.
        let map = ValueMap::from_iter([("label", Value::Null)]);
        mapper.deserialize_map_into(map, &mut path).unwrap();
        assert_eq!(path.label, None);
        assert_eq!(path.origin, Point { x: 1, y: 1 });
    }

    #[test]
    fn volatile_round_trip() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Flags>().unwrap();

        let map = ValueMap::from_iter([("ready", Value::Bool(true)), ("hits", Value::Long(1 << 40))]);
        let flags = mapper.deserialize_map(map).unwrap();
        assert!(flags.ready.load(Ordering::Acquire));
        assert_eq!(flags.hits.load(Ordering::Acquire), 1 << 40);

        let values: Vec<_> = mapper
            .properties()
            .iter()
            .map(|p| p.read(&flags).unwrap().as_i64())
            .collect();
        assert_eq!(values, [None, Some(1 << 40)]);
    }

    #[test]
    fn allocation_without_default() {
        let factory = MapperFactory::new();
        let mapper = factory.create_or_get::<Port>().unwrap();

        let err = mapper.deserialize_map(ValueMap::new()).unwrap_err();
        assert!(matches!(err.root(), MapError::Allocation { .. }));

        let map = ValueMap::from_iter([("number", Value::Int(8080))]);
        assert_eq!(mapper.deserialize_map(map).unwrap().number.get(), 8080);
    }

    #[test]
    fn checked_strategy() {
        let factory = MapperFactory::builder().strategy(CheckedAccess).build();

        let mapper = factory.create_or_get::<Point>().unwrap();
        assert_eq!(mapper.type_mapper().strategy_name(), "checked");
        let map = ValueMap::from_iter([("y", Value::Int(4))]);
        assert_eq!(mapper.deserialize_map(map).unwrap(), Point { x: 0, y: 4 });

        // No `#[mapped(default)]`, so no constructor.
        let mapper = factory.create_or_get::<Port>().unwrap();
        let map = ValueMap::from_iter([("number", Value::Int(1))]);
        let err = mapper.deserialize_map(map).unwrap_err();
        assert!(matches!(err.root(), MapError::Allocation { .. }));
    }
}
