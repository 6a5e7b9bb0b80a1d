//! Compiled per-type mappers.
//!
//! A [`TypeMapper`] is built once per type by the
//! [`MapperFactory`](crate::MapperFactory): every property of the type's
//! descriptor is resolved to a [`MappedProperty`] holding its external name,
//! its classified kind, its adapter chain and the compiled accessors. After
//! that the mapper is immutable and shared as `Arc<TypeMapper>`.
//!
//! [`Mapper<T>`] is the typed handle given to callers.

// -----------------------------------------------------------------------------
// Modules

mod build;
mod de;
mod ser;

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;

use crate::access::{AccessStrategy, FieldGetter, Location, Target};
use crate::adapter::AdapterChain;
use crate::context::SerializationContext;
use crate::error::MapError;
use crate::factory::MapperFactory;
use crate::format::Format;
use crate::info::{PropertyInfo, TypeDescriptor, TypeOps};
use crate::kind::Kind;
use crate::mappable::Mappable;
use crate::value::{Value, ValueMap};

/// Writes a wire value into a property, adapter chain included.
pub(crate) type PropertySetter = Box<
    dyn Fn(Target<'_>, Value<'static>, &SerializationContext<'_>) -> Result<(), MapError>
        + Send
        + Sync,
>;

// -----------------------------------------------------------------------------
// MappedProperty

/// A property resolved for one mapper.
pub struct MappedProperty {
    info: &'static PropertyInfo,
    name: Cow<'static, str>,
    kind: Kind,
    nullable: bool,
    chain: AdapterChain,
    location: Location,
    getter: FieldGetter,
    setter: PropertySetter,
}

impl MappedProperty {
    /// The external name, as produced by the naming policy.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind of the written representation, after the adapter chain.
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns `true` if the written representation accepts [`Value::Null`].
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn info(&self) -> &'static PropertyInfo {
        self.info
    }

    #[inline]
    pub fn adapter_chain(&self) -> &AdapterChain {
        &self.chain
    }

    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Reads the property of `owner` as it is written.
    #[inline]
    pub fn read<'a>(&self, owner: &'a dyn Any) -> Result<Value<'a>, MapError> {
        (self.getter)(owner)
    }
}

impl fmt::Debug for MappedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedProperty")
            .field("name", &self.name)
            .field("field", &self.info.name())
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("adapters", &self.chain.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TypeMapper

/// The compiled mapper of one type.
///
/// Types with a [`TypeDescriptor`] are written as objects, property by
/// property; every other [`Mappable`] type is written as a single value.
pub struct TypeMapper {
    ops: TypeOps,
    descriptor: Option<&'static TypeDescriptor>,
    properties: Box<[MappedProperty]>,
    strategy: Arc<dyn AccessStrategy>,
}

impl TypeMapper {
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ops.type_id()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.ops.type_name()
    }

    /// The descriptor, `None` for types written as a single value.
    #[inline]
    pub fn descriptor(&self) -> Option<&'static TypeDescriptor> {
        self.descriptor
    }

    /// The properties in declaration order.
    #[inline]
    pub fn properties(&self) -> &[MappedProperty] {
        &self.properties
    }

    /// Returns the property with the given external name.
    pub fn property(&self, name: &str) -> Option<&MappedProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// The name of the accessor strategy the mapper was compiled with.
    #[inline]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// The type name used in property paths.
    fn owner_name(&self) -> &'static str {
        self.descriptor
            .map_or_else(|| self.ops.type_name(), TypeDescriptor::ident)
    }
}

impl fmt::Debug for TypeMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapper")
            .field("type_name", &self.type_name())
            .field("properties", &self.properties)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Mapper

/// A typed handle to the mapper of `T`.
///
/// Cheap to clone. It keeps the factory it was created by, nested types are
/// resolved from that factory.
///
/// # Examples
///
/// ```
/// use vc_mapper::{Mapped, MapperFactory, Value, ValueMap};
///
/// #[derive(Mapped, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let factory = MapperFactory::new();
/// let mapper = factory.create_or_get::<Point>().unwrap();
///
/// // `y` is absent and left at zero.
/// let map = ValueMap::from_iter([("x", Value::Int(3))]);
/// assert_eq!(mapper.deserialize_map(map).unwrap(), Point { x: 3, y: 0 });
///
/// let mut point = Point { x: 1, y: 2 };
/// let map = ValueMap::from_iter([("y", Value::Int(5))]);
/// mapper.deserialize_map_into(map, &mut point).unwrap();
/// assert_eq!(point, Point { x: 1, y: 5 });
/// ```
pub struct Mapper<T> {
    inner: Arc<TypeMapper>,
    factory: MapperFactory,
    marker: PhantomData<fn() -> T>,
}

impl<T: Mappable> Mapper<T> {
    #[inline]
    pub(crate) fn new(inner: Arc<TypeMapper>, factory: MapperFactory) -> Self {
        Self {
            inner,
            factory,
            marker: PhantomData,
        }
    }

    /// The type-erased mapper, shared with the factory's cache.
    #[inline]
    pub fn type_mapper(&self) -> &Arc<TypeMapper> {
        &self.inner
    }

    #[inline]
    pub fn factory(&self) -> &MapperFactory {
        &self.factory
    }

    /// The properties in declaration order.
    #[inline]
    pub fn properties(&self) -> &[MappedProperty] {
        self.inner.properties()
    }

    /// Writes `value` as one document.
    pub fn serialize<F: Format + ?Sized>(
        &self,
        out: &mut F::Output,
        value: &T,
        format: &F,
    ) -> Result<(), MapError> {
        let ctx = SerializationContext::new(&self.factory);
        self.inner.write(out, value, format, &ctx)
    }

    /// Writes `value` to a new string.
    pub fn serialize_to_string<F>(&self, value: &T, format: &F) -> Result<String, MapError>
    where
        F: Format<Output = String> + ?Sized,
    {
        let mut out = String::new();
        self.serialize(&mut out, value, format)?;
        Ok(out)
    }

    /// Reads a new instance.
    pub fn deserialize<F: Format + ?Sized>(
        &self,
        input: &F::Input,
        format: &F,
    ) -> Result<T, MapError> {
        let value = format.read(input)?;
        let ctx = SerializationContext::new(&self.factory);
        downcast(self.inner.read_value(value, &ctx)?)
    }

    /// Reads into an existing instance.
    ///
    /// Properties absent from the input keep their current value.
    pub fn deserialize_into<F: Format + ?Sized>(
        &self,
        input: &F::Input,
        target: &mut T,
        format: &F,
    ) -> Result<(), MapError> {
        let value = format.read(input)?;
        let ctx = SerializationContext::new(&self.factory);
        self.inner.read_value_into(value, target, &ctx)
    }

    /// Builds a new instance from a map, without a format.
    pub fn deserialize_map(&self, map: ValueMap<'static>) -> Result<T, MapError> {
        let ctx = SerializationContext::new(&self.factory);
        downcast(self.inner.read_value(Value::Map(map), &ctx)?)
    }

    /// Writes a map into an existing instance.
    pub fn deserialize_map_into(
        &self,
        map: ValueMap<'static>,
        target: &mut T,
    ) -> Result<(), MapError> {
        let ctx = SerializationContext::new(&self.factory);
        self.inner.read_value_into(Value::Map(map), target, &ctx)
    }
}

fn downcast<T: Any>(instance: Box<dyn Any>) -> Result<T, MapError> {
    instance.downcast::<T>().map(|v| *v).map_err(|_| {
        crate::ShapeError::WrongType {
            expected: core::any::type_name::<T>(),
        }
        .into()
    })
}

impl<T> Clone for Mapper<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            factory: self.factory.clone(),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Mapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mapper").field(&self.inner).finish()
    }
}
