use core::any::type_name;
use core::cell::Cell;
use core::fmt;

use crate::error::{ConfigError, MapError, ShapeError};
use crate::factory::MapperFactory;
use crate::format::Format;
use crate::kind::Kind;
use crate::mappable::Mappable;
use crate::value::{ObjectRef, Value};

// -----------------------------------------------------------------------------
// SerializationContext

/// State of one top-level serialize or deserialize call.
///
/// Formats receive it with every value they write and hand nested
/// [`ObjectRef`]s back through [`serialize_nested`](Self::serialize_nested);
/// [`Mappable::from_value`] implementations of mapped types call
/// [`deserialize_nested`](Self::deserialize_nested). Both resolve the
/// nested type's mapper from the owning factory and count the nesting
/// depth against `FactoryConfig::max_depth`.
///
/// Not `Sync`: a context belongs to the thread running the call.
pub struct SerializationContext<'f> {
    factory: &'f MapperFactory,
    depth: Cell<u32>,
}

impl<'f> SerializationContext<'f> {
    #[inline]
    pub(crate) fn new(factory: &'f MapperFactory) -> Self {
        Self {
            factory,
            depth: Cell::new(0),
        }
    }

    /// Returns the factory mappers are resolved from.
    #[inline]
    pub fn factory(&self) -> &'f MapperFactory {
        self.factory
    }

    /// Returns the current nesting depth, `0` at the top-level value.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Writes a nested object with its own mapper.
    ///
    /// Only `write_begin_object` to `write_end_object` is written, the
    /// document begin and end belong to the top-level call.
    pub fn serialize_nested<F: Format + ?Sized>(
        &self,
        out: &mut F::Output,
        object: &ObjectRef<'_>,
        format: &F,
    ) -> Result<(), MapError> {
        let _guard = self.enter()?;
        let mapper = self.factory.mapper_for(object.descriptor())?;
        mapper.write_object(out, object.as_any(), format, self)
    }

    /// Rebuilds a nested mapped value from a map.
    ///
    /// An owned [`Value::Object`] of type `T`, e.g. produced by an adapter, is
    /// taken as is.
    pub fn deserialize_nested<T: Mappable>(&self, value: Value<'static>) -> Result<T, MapError> {
        let wrong_type = || {
            MapError::from(ShapeError::WrongType {
                expected: type_name::<T>(),
            })
        };

        match value {
            Value::Map(map) => {
                let descriptor = T::type_descriptor()
                    .ok_or_else(|| ConfigError::MissingMapper(type_name::<T>().into()))?;
                let _guard = self.enter()?;
                let mapper = self.factory.mapper_for(descriptor)?;
                let instance = mapper.read_map(map, self)?;
                instance.downcast::<T>().map(|v| *v).map_err(|_| wrong_type())
            }
            Value::Object(object) => match object.into_owned_any() {
                Ok(instance) => instance.downcast::<T>().map(|v| *v).map_err(|_| wrong_type()),
                Err(_) => Err(wrong_type()),
            },
            other => Err(MapError::mismatch(Kind::Object, other.kind())),
        }
    }

    fn enter(&self) -> Result<DepthGuard<'_>, MapError> {
        let max = self.factory.config().max_depth;
        let depth = self.depth.get().saturating_add(1);
        if depth > max {
            return Err(MapError::DepthExceeded(max));
        }
        self.depth.set(depth);
        Ok(DepthGuard(&self.depth))
    }
}

impl fmt::Debug for SerializationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationContext")
            .field("depth", &self.depth.get())
            .finish_non_exhaustive()
    }
}

/// Leaves one nesting level on drop, also on the error path.
struct DepthGuard<'a>(&'a Cell<u32>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::factory::MapperFactory;
    use crate::value::{Value, ValueMap};
    use crate::{ConfigError, MapError};

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Leaf {
        id: i32,
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Branch {
        leaf: Leaf,
    }

    #[test]
    fn nested_maps_use_the_nested_mapper() {
        let factory = MapperFactory::new();
        let ctx = factory.context();

        let mut leaf = ValueMap::new();
        leaf.insert("id", Value::Int(4));
        let mut branch = ValueMap::new();
        branch.insert("leaf", Value::Map(leaf));

        let value: Branch = ctx.deserialize_nested(Value::Map(branch)).unwrap();
        assert_eq!(value, Branch { leaf: Leaf { id: 4 } });
        assert_eq!(ctx.depth(), 0);
        assert!(factory.cached_len() >= 2);
    }

    #[test]
    fn depth_guard() {
        let factory = MapperFactory::builder().max_depth(1).build();
        let ctx = factory.context();

        let leaf = || ValueMap::from_iter([("id", Value::Int(1))]);
        assert!(ctx.deserialize_nested::<Leaf>(Value::Map(leaf())).is_ok());

        let mut branch = ValueMap::new();
        branch.insert("leaf", Value::Map(leaf()));
        let err = ctx.deserialize_nested::<Branch>(Value::Map(branch)).unwrap_err();
        assert!(matches!(err.root(), MapError::DepthExceeded(1)));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn scalars_and_unmapped_types() {
        let factory = MapperFactory::new();
        let ctx = factory.context();

        assert!(ctx.deserialize_nested::<Leaf>(Value::Int(1)).unwrap_err().is_shape());
        let err = ctx
            .deserialize_nested::<i32>(Value::Map(ValueMap::new()))
            .unwrap_err();
        assert!(matches!(err, MapError::Config(ConfigError::MissingMapper(_))));
    }
}
