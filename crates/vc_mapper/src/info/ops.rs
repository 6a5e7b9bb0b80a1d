use alloc::boxed::Box;
use core::alloc::Layout;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use crate::access::raw::SlotOps;
use crate::context::SerializationContext;
use crate::error::{MapError, ShapeError};
use crate::info::TypeDescriptor;
use crate::kind::{Kind, Primitive};
use crate::mappable::Mappable;
use crate::value::Value;

// -----------------------------------------------------------------------------
// TypeOps

/// Type-erased operations of a declared type.
///
/// Every property and every descriptor carries one. It is what lets the
/// engine move values of a type it only knows by [`TypeId`]: compare it with
/// an adapter's input, assign a boxed value to a field, fill an absent field
/// with a default. [`value`](Self::value) is only present for [`Mappable`]
/// types; fields of other types need an adapter.
///
/// # Examples
///
/// ```
/// use vc_mapper::{Kind, info::TypeOps};
///
/// let ops = TypeOps::of::<u16>();
/// assert_eq!(ops.value().map(|v| v.kind()), Some(Kind::Int));
///
/// struct Handle(usize);
/// assert!(TypeOps::opaque::<Handle>().value().is_none());
/// ```
#[derive(Clone, Copy)]
pub struct TypeOps {
    type_id: TypeId,
    type_name: &'static str,
    layout: Layout,
    slot: SlotOps,
    assign: fn(&mut dyn Any, Box<dyn Any>) -> Result<(), MapError>,
    value: Option<ValueOps>,
    default: Option<fn() -> Option<Box<dyn Any>>>,
}

impl TypeOps {
    /// Operations of a [`Mappable`] type.
    ///
    /// The default of an absent field is [`Mappable::alloc_default`].
    pub fn of<T: Mappable>() -> Self {
        Self {
            value: Some(ValueOps::of::<T>()),
            default: Some(erased_alloc_default::<T>),
            ..Self::opaque::<T>()
        }
    }

    /// Operations of a type without a value representation.
    pub fn opaque<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            layout: Layout::new::<T>(),
            slot: SlotOps::of::<T>(),
            assign: erased_assign::<T>,
            value: None,
            default: None,
        }
    }

    /// Uses `T::default()` for absent fields.
    ///
    /// `T` is expected to be the type these operations describe, a
    /// different type is reported as [`ShapeError::WrongType`] when used.
    pub fn with_default<T: Any + Default>(mut self) -> Self {
        self.default = Some(erased_default::<T>);
        self
    }

    /// Returns the `TypeId`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the full type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the memory layout.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns the value operations of a [`Mappable`] type.
    #[inline]
    pub fn value(&self) -> Option<&ValueOps> {
        self.value.as_ref()
    }

    /// Returns `true` if absent fields of this type can be filled.
    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Creates the default used for an absent field.
    ///
    /// Returns `None` if the type has none.
    pub fn make_default(&self) -> Option<Box<dyn Any>> {
        self.default.and_then(|f| f())
    }

    /// Overwrites `target` with `value`, dropping the old content.
    ///
    /// Both must be of this type.
    #[inline]
    pub fn assign(&self, target: &mut dyn Any, value: Box<dyn Any>) -> Result<(), MapError> {
        (self.assign)(target, value)
    }

    #[inline]
    pub(crate) fn slot(&self) -> &SlotOps {
        &self.slot
    }
}

impl fmt::Debug for TypeOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOps")
            .field("type_name", &self.type_name)
            .field("value", &self.value)
            .field("has_default", &self.default.is_some())
            .finish_non_exhaustive()
    }
}

fn erased_assign<T: Any>(target: &mut dyn Any, value: Box<dyn Any>) -> Result<(), MapError> {
    let wrong_type = || ShapeError::WrongType {
        expected: type_name::<T>(),
    };
    let target = target.downcast_mut::<T>().ok_or_else(wrong_type)?;
    let value = value.downcast::<T>().map_err(|_| wrong_type())?;
    *target = *value;
    Ok(())
}

fn erased_alloc_default<T: Mappable>() -> Option<Box<dyn Any>> {
    T::alloc_default().map(|v| Box::new(v) as Box<dyn Any>)
}

fn erased_default<T: Any + Default>() -> Option<Box<dyn Any>> {
    Some(Box::new(T::default()))
}

// -----------------------------------------------------------------------------
// ValueOps

/// Type-erased [`Mappable`] implementation of a type.
#[derive(Clone, Copy)]
pub struct ValueOps {
    kind: Kind,
    primitive: Option<Primitive>,
    volatile: bool,
    nullable: bool,
    descriptor: fn() -> Option<&'static TypeDescriptor>,
    to_value: for<'a> fn(&'a dyn Any) -> Option<Value<'a>>,
    into_value: fn(Box<dyn Any>) -> Result<Value<'static>, Box<dyn Any>>,
    from_value: fn(Value<'static>, &SerializationContext<'_>) -> Result<Box<dyn Any>, MapError>,
}

impl ValueOps {
    /// Value operations of `T`.
    pub fn of<T: Mappable>() -> Self {
        Self {
            kind: T::KIND,
            primitive: T::PRIMITIVE,
            volatile: T::VOLATILE,
            nullable: T::NULLABLE,
            descriptor: T::type_descriptor,
            to_value: erased_to_value::<T>,
            into_value: erased_into_value::<T>,
            from_value: erased_from_value::<T>,
        }
    }

    /// See [`Mappable::KIND`].
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// See [`Mappable::PRIMITIVE`].
    #[inline]
    pub fn primitive(&self) -> Option<Primitive> {
        self.primitive
    }

    /// See [`Mappable::VOLATILE`].
    #[inline]
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// See [`Mappable::NULLABLE`].
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// See [`Mappable::type_descriptor`].
    #[inline]
    pub fn descriptor(&self) -> Option<&'static TypeDescriptor> {
        (self.descriptor)()
    }

    /// Borrows `value` as a [`Value`].
    pub fn to_value<'a>(&self, value: &'a dyn Any) -> Result<Value<'a>, MapError> {
        (self.to_value)(value).ok_or_else(|| self.wrong_type())
    }

    /// Converts an owned value, e.g. the output of an adapter.
    pub fn into_value(&self, value: Box<dyn Any>) -> Result<Value<'static>, MapError> {
        (self.into_value)(value).map_err(|_| self.wrong_type())
    }

    /// Rebuilds a boxed value from its wire representation.
    #[inline]
    pub fn from_value(
        &self,
        value: Value<'static>,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<dyn Any>, MapError> {
        (self.from_value)(value, ctx)
    }

    #[cold]
    fn wrong_type(&self) -> MapError {
        MapError::Shape(ShapeError::WrongType {
            expected: self.kind.name(),
        })
    }
}

impl fmt::Debug for ValueOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOps")
            .field("kind", &self.kind)
            .field("primitive", &self.primitive)
            .field("volatile", &self.volatile)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

fn erased_to_value<T: Mappable>(value: &dyn Any) -> Option<Value<'_>> {
    value.downcast_ref::<T>().map(T::to_value)
}

fn erased_into_value<T: Mappable>(value: Box<dyn Any>) -> Result<Value<'static>, Box<dyn Any>> {
    value.downcast::<T>().map(|v| (*v).into_value())
}

fn erased_from_value<T: Mappable>(
    value: Value<'static>,
    ctx: &SerializationContext<'_>,
) -> Result<Box<dyn Any>, MapError> {
    T::from_value(value, ctx).map(|v| Box::new(v) as Box<dyn Any>)
}

#[cfg(test)]
mod tests {
    use super::TypeOps;
    use crate::kind::{Kind, Primitive};
    use crate::value::Value;
    use alloc::boxed::Box;
    use alloc::string::String;
    use core::any::Any;
    use core::num::NonZeroI32;
    use core::sync::atomic::AtomicI32;

    #[test]
    fn value_ops_follow_mappable() {
        let ops = TypeOps::of::<AtomicI32>();
        let value = ops.value().unwrap();
        assert_eq!(value.kind(), Kind::Int);
        assert_eq!(value.primitive(), Some(Primitive::I32));
        assert!(value.is_volatile());
        assert!(!value.is_nullable());

        let ops = TypeOps::of::<Option<String>>();
        assert!(ops.value().unwrap().is_nullable());
        assert_eq!(ops.value().unwrap().primitive(), None);
    }

    #[test]
    fn defaults() {
        let zero = TypeOps::of::<i32>().make_default().unwrap();
        assert_eq!(zero.downcast_ref::<i32>(), Some(&0));

        assert!(TypeOps::of::<NonZeroI32>().make_default().is_none());
        assert!(!TypeOps::opaque::<u64>().has_default());
        assert!(TypeOps::opaque::<u64>().with_default::<u64>().has_default());
    }

    #[test]
    fn assign_and_convert() {
        let ops = TypeOps::of::<String>();
        let mut target = String::from("old");
        ops.assign(&mut target, Box::new(String::from("new"))).unwrap();
        assert_eq!(target, "new");

        let err = ops.assign(&mut target, Box::new(3_i32)).unwrap_err();
        assert!(err.is_shape());

        let value = ops.value().unwrap();
        assert_eq!(value.to_value(&target as &dyn Any).unwrap(), Value::from("new"));
        assert!(value.to_value(&1_u8 as &dyn Any).is_err());
        assert_eq!(
            value.into_value(Box::new(String::from("boxed"))).unwrap(),
            Value::from("boxed")
        );
    }
}
