//! Pluggable field access.
//!
//! A mapper never touches instance memory itself, it compiles one getter
//! and one setter per property through the factory's [`AccessStrategy`]:
//!
//! - [`RawAccess`] (the default) reads and writes fields at their byte
//!   offset and creates instances without running a constructor.
//! - [`CheckedAccess`] goes through the safe accessors generated by
//!   `#[derive(Mapped)]` and creates instances with `Default`.

// -----------------------------------------------------------------------------
// Modules

mod checked;
pub(crate) mod raw;

// -----------------------------------------------------------------------------
// Exports

pub use checked::CheckedAccess;
pub use raw::RawAccess;

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::context::SerializationContext;
use crate::error::{ConfigError, MapError, ShapeError};
use crate::info::{PropertyInfo, TypeDescriptor, TypeOps};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Compiled accessors

/// Reads a property as a [`Value`].
pub type FieldGetter =
    Box<dyn for<'a> Fn(&'a dyn Any) -> Result<Value<'a>, MapError> + Send + Sync>;

/// Borrows a property, used as the input of an adapter chain.
pub type FieldRef =
    Box<dyn for<'a> Fn(&'a dyn Any) -> Result<&'a dyn Any, MapError> + Send + Sync>;

/// Writes a property.
pub type FieldSetter = Box<dyn Fn(Target<'_>, Incoming<'_>) -> Result<(), MapError> + Send + Sync>;

// These pin the higher-ranked signatures, a closure passed to `Box::new`
// directly would be inferred with one fixed lifetime.

#[inline]
pub(crate) fn make_getter<F>(f: F) -> FieldGetter
where
    F: for<'a> Fn(&'a dyn Any) -> Result<Value<'a>, MapError> + Send + Sync + 'static,
{
    Box::new(f)
}

#[inline]
pub(crate) fn make_ref<F>(f: F) -> FieldRef
where
    F: for<'a> Fn(&'a dyn Any) -> Result<&'a dyn Any, MapError> + Send + Sync + 'static,
{
    Box::new(f)
}

#[inline]
pub(crate) fn make_setter<F>(f: F) -> FieldSetter
where
    F: Fn(Target<'_>, Incoming<'_>) -> Result<(), MapError> + Send + Sync + 'static,
{
    Box::new(f)
}

// -----------------------------------------------------------------------------
// Location

/// Where a property lives, computed once by [`AccessStrategy::prepare`].
#[derive(Clone, Copy, Debug)]
pub struct Location {
    owner: &'static TypeDescriptor,
    property: &'static PropertyInfo,
    index: usize,
    token: usize,
}

impl Location {
    /// Creates a location of `property`, the `index`-th property of `owner`.
    ///
    /// `token` is opaque to the mapper, e.g. a byte offset.
    #[inline]
    pub fn new(
        owner: &'static TypeDescriptor,
        property: &'static PropertyInfo,
        index: usize,
        token: usize,
    ) -> Self {
        Self {
            owner,
            property,
            index,
            token,
        }
    }

    #[inline]
    pub fn owner(&self) -> &'static TypeDescriptor {
        self.owner
    }

    #[inline]
    pub fn property(&self) -> &'static PropertyInfo {
        self.property
    }

    /// Position of the property in [`TypeDescriptor::properties`].
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn token(&self) -> usize {
        self.token
    }

    /// Finds the position of `property` in `owner`.
    pub(crate) fn position(
        owner: &'static TypeDescriptor,
        property: &'static PropertyInfo,
    ) -> Option<usize> {
        owner
            .properties()
            .iter()
            .position(|p| core::ptr::eq(p, property))
    }

    #[cold]
    pub(crate) fn wrong_owner(&self) -> MapError {
        MapError::Shape(ShapeError::WrongType {
            expected: self.owner.type_name(),
        })
    }
}

// -----------------------------------------------------------------------------
// Incoming

/// A value about to be written by a [`FieldSetter`].
pub enum Incoming<'c> {
    /// A wire value, converted with the declared type's [`Mappable`] impl.
    ///
    /// [`Mappable`]: crate::Mappable
    Wire(Value<'static>, &'c SerializationContext<'c>),
    /// A value already of the declared type, e.g. restored by an adapter chain.
    Boxed(Box<dyn Any>),
}

impl Incoming<'_> {
    /// Converts to a boxed value of the type described by `ops`.
    pub fn into_boxed(self, ops: &TypeOps) -> Result<Box<dyn Any>, MapError> {
        match self {
            Incoming::Boxed(value) => Ok(value),
            Incoming::Wire(value, ctx) => match ops.value() {
                Some(value_ops) => value_ops.from_value(value, ctx),
                None => Err(ShapeError::WrongType {
                    expected: ops.type_name(),
                }
                .into()),
            },
        }
    }
}

impl fmt::Debug for Incoming<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incoming::Wire(value, _) => f.debug_tuple("Wire").field(value).finish(),
            Incoming::Boxed(_) => f.write_str("Boxed"),
        }
    }
}

// -----------------------------------------------------------------------------
// Target

/// The instance a [`FieldSetter`] writes into.
pub struct Target<'t>(TargetInner<'t>);

enum TargetInner<'t> {
    Existing(&'t mut dyn Any),
    Uninit(&'t mut raw::UninitInstance),
}

impl<'t> Target<'t> {
    /// A fully initialized instance, old field values are dropped on write.
    #[inline]
    pub fn existing(owner: &'t mut dyn Any) -> Self {
        Self(TargetInner::Existing(owner))
    }

    #[inline]
    pub(crate) fn uninit(instance: &'t mut raw::UninitInstance) -> Self {
        Self(TargetInner::Uninit(instance))
    }

    /// Returns the instance if it is fully initialized.
    #[inline]
    pub fn into_existing(self) -> Option<&'t mut dyn Any> {
        match self.0 {
            TargetInner::Existing(owner) => Some(owner),
            TargetInner::Uninit(_) => None,
        }
    }

    #[inline]
    pub(crate) fn into_inner(self) -> Result<&'t mut dyn Any, &'t mut raw::UninitInstance> {
        match self.0 {
            TargetInner::Existing(owner) => Ok(owner),
            TargetInner::Uninit(instance) => Err(instance),
        }
    }
}

// -----------------------------------------------------------------------------
// Allocation

/// An instance under construction, see [`AccessStrategy::allocate`].
pub struct Allocation(AllocationInner);

enum AllocationInner {
    Constructed(Box<dyn Any>),
    Uninit(raw::UninitInstance),
}

impl Allocation {
    /// An instance created by a constructor.
    #[inline]
    pub fn constructed(instance: Box<dyn Any>) -> Self {
        Self(AllocationInner::Constructed(instance))
    }

    #[inline]
    pub(crate) fn uninit(instance: raw::UninitInstance) -> Self {
        Self(AllocationInner::Uninit(instance))
    }

    /// The instance as a setter target.
    pub fn target(&mut self) -> Target<'_> {
        match &mut self.0 {
            AllocationInner::Constructed(instance) => Target::existing(&mut **instance),
            AllocationInner::Uninit(instance) => Target::uninit(instance),
        }
    }

    /// Completes the instance.
    ///
    /// Uninitialized instances fill their absent fields with defaults first,
    /// which fails if a field has none.
    pub fn finish(self) -> Result<Box<dyn Any>, MapError> {
        match self.0 {
            AllocationInner::Constructed(instance) => Ok(instance),
            AllocationInner::Uninit(instance) => instance.finish(),
        }
    }
}

// -----------------------------------------------------------------------------
// AccessStrategy

/// A way to read, write and create instances of mapped types.
///
/// A strategy is asked once per property, when a mapper is built: first
/// whether it [can access](Self::can_access) the property, then to
/// [prepare](Self::prepare) a [`Location`] from which the getter, reference
/// and setter closures are compiled. The closures are then called for every
/// instance.
pub trait AccessStrategy: Send + Sync + 'static {
    /// A short name used in errors.
    fn name(&self) -> &'static str;

    /// Returns `true` if this strategy can read and write `property`.
    fn can_access(&self, property: &PropertyInfo) -> bool;

    /// Computes the location of `property` inside `owner`.
    fn prepare(
        &self,
        owner: &'static TypeDescriptor,
        property: &'static PropertyInfo,
    ) -> Result<Location, ConfigError>;

    /// Compiles a reader returning the property as a [`Value`].
    ///
    /// Only called for properties of [`Mappable`](crate::Mappable) types.
    fn getter(&self, location: &Location) -> FieldGetter;

    /// Compiles a reader borrowing the property.
    fn reference(&self, location: &Location) -> FieldRef;

    /// Compiles a writer.
    fn setter(&self, location: &Location) -> FieldSetter;

    /// Starts a new instance of the described type.
    fn allocate(&self, descriptor: &'static TypeDescriptor) -> Result<Allocation, MapError>;
}

impl<S: AccessStrategy + ?Sized> AccessStrategy for Box<S> {
    #[inline]
    fn name(&self) -> &'static str {
        (**self).name()
    }

    #[inline]
    fn can_access(&self, property: &PropertyInfo) -> bool {
        (**self).can_access(property)
    }

    #[inline]
    fn prepare(
        &self,
        owner: &'static TypeDescriptor,
        property: &'static PropertyInfo,
    ) -> Result<Location, ConfigError> {
        (**self).prepare(owner, property)
    }

    #[inline]
    fn getter(&self, location: &Location) -> FieldGetter {
        (**self).getter(location)
    }

    #[inline]
    fn reference(&self, location: &Location) -> FieldRef {
        (**self).reference(location)
    }

    #[inline]
    fn setter(&self, location: &Location) -> FieldSetter {
        (**self).setter(location)
    }

    #[inline]
    fn allocate(&self, descriptor: &'static TypeDescriptor) -> Result<Allocation, MapError> {
        (**self).allocate(descriptor)
    }
}
