#![expect(unsafe_code, reason = "Offset based field access works on raw pointers.")]

use alloc::boxed::Box;
use core::alloc::Layout;
use core::any::{Any, TypeId};
use core::fmt;
use core::sync::atomic::Ordering;

use fixedbitset::FixedBitSet;
use vc_ptr::{Ptr, PtrMut, RawStorage};

use super::{
    AccessStrategy, Allocation, FieldGetter, FieldRef, FieldSetter, Incoming, Location, Target,
    make_getter, make_ref, make_setter,
};
use crate::error::{ConfigError, MapError, ShapeError};
use crate::info::{PropertyInfo, TypeDescriptor};
use crate::mappable::Mappable;

// -----------------------------------------------------------------------------
// SlotOps

/// Operations on a value of a known type behind a pointer.
///
/// Every function requires the pointer to be aligned for the described type,
/// and valid for the access it performs.
#[derive(Clone, Copy)]
pub(crate) struct SlotOps {
    as_any: for<'a> unsafe fn(Ptr<'a>) -> &'a dyn Any,
    write: unsafe fn(PtrMut<'_>, Box<dyn Any>) -> Result<(), Box<dyn Any>>,
    replace: unsafe fn(PtrMut<'_>, Box<dyn Any>) -> Result<(), Box<dyn Any>>,
    drop: unsafe fn(PtrMut<'_>),
    into_box: unsafe fn(RawStorage) -> Box<dyn Any>,
}

impl SlotOps {
    pub(crate) fn of<T: Any>() -> Self {
        Self {
            as_any: slot_as_any::<T>,
            write: slot_write::<T>,
            replace: slot_replace::<T>,
            drop: slot_drop::<T>,
            into_box: slot_into_box::<T>,
        }
    }
}

/// # Safety
/// `ptr` points to an initialized `T`.
unsafe fn slot_as_any<'a, T: Any>(ptr: Ptr<'a>) -> &'a dyn Any {
    // SAFETY: Guaranteed by the caller.
    unsafe { ptr.as_ref::<T>() }
}

/// # Safety
/// `ptr` points to an uninitialized slot for a `T`.
unsafe fn slot_write<T: Any>(ptr: PtrMut<'_>, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
    let value = value.downcast::<T>()?;
    // SAFETY: Guaranteed by the caller.
    unsafe { ptr.write::<T>(*value) };
    Ok(())
}

/// # Safety
/// `ptr` points to an initialized `T`.
unsafe fn slot_replace<T: Any>(ptr: PtrMut<'_>, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
    let value = value.downcast::<T>()?;
    // SAFETY: Guaranteed by the caller.
    drop(unsafe { ptr.replace::<T>(*value) });
    Ok(())
}

/// # Safety
/// `ptr` points to an initialized `T`, uninitialized afterwards.
unsafe fn slot_drop<T: Any>(ptr: PtrMut<'_>) {
    // SAFETY: Guaranteed by the caller.
    unsafe { ptr.drop_as::<T>() }
}

/// # Safety
/// `storage` was allocated for a `T` and is fully initialized.
unsafe fn slot_into_box<T: Any>(storage: RawStorage) -> Box<dyn Any> {
    // SAFETY: Guaranteed by the caller.
    unsafe { storage.assume_init::<T>() }
}

impl fmt::Debug for SlotOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SlotOps")
    }
}

// -----------------------------------------------------------------------------
// Field pointers

// Every pointer below is derived from an owner whose `TypeId` was checked
// against the descriptor, at an offset `checked_offset` validated against
// the owner's layout when the accessor was compiled.

#[inline]
fn field_ptr(owner: &dyn Any, owner_id: TypeId, offset: usize) -> Result<Ptr<'_>, MapError> {
    if (*owner).type_id() != owner_id {
        return Err(wrong_owner());
    }
    // SAFETY: In bounds, see above.
    Ok(unsafe { Ptr::from_ref(owner).byte_add(offset) })
}

#[inline]
fn field_ptr_mut(
    owner: &mut dyn Any,
    owner_id: TypeId,
    offset: usize,
) -> Result<PtrMut<'_>, MapError> {
    if (*owner).type_id() != owner_id {
        return Err(wrong_owner());
    }
    // SAFETY: In bounds, see above.
    Ok(unsafe { PtrMut::from_mut(owner).byte_add(offset) })
}

#[cold]
fn wrong_owner() -> MapError {
    MapError::custom("instance is not of the type the mapper was built for")
}

#[cold]
fn wrong_value(property: &PropertyInfo) -> MapError {
    MapError::Shape(ShapeError::WrongType {
        expected: property.type_name(),
    })
}

/// Stores a value of the declared type of `location`'s property.
fn store<T: Any>(target: Target<'_>, location: &Location, value: T) -> Result<(), MapError> {
    let owner_id = location.owner().type_id();
    let offset = location.token();
    match target.into_inner() {
        Ok(owner) => {
            let ptr = field_ptr_mut(owner, owner_id, offset)?;
            // SAFETY: The field of an initialized owner is initialized, `T`
            // is its declared type.
            drop(unsafe { ptr.replace::<T>(value) });
        }
        Err(instance) => {
            instance.check_owner(owner_id)?;
            let initialized = instance.written.put(location.index());
            let ptr = instance.slot(offset);
            if initialized {
                // SAFETY: Written before, so initialized.
                drop(unsafe { ptr.replace::<T>(value) });
            } else {
                // SAFETY: Not written yet, so uninitialized.
                unsafe { ptr.write::<T>(value) };
            }
        }
    }
    Ok(())
}

/// [`store`] for a boxed value, checked against the declared type.
fn store_boxed(
    target: Target<'_>,
    location: &Location,
    value: Box<dyn Any>,
) -> Result<(), MapError> {
    let property = location.property();
    let slot = property.ops().slot();
    let owner_id = location.owner().type_id();
    let offset = location.token();
    let stored = match target.into_inner() {
        Ok(owner) => {
            let ptr = field_ptr_mut(owner, owner_id, offset)?;
            // SAFETY: The field of an initialized owner is initialized, the
            // slot operations are those of its declared type.
            unsafe { (slot.replace)(ptr, value) }
        }
        Err(instance) => {
            instance.check_owner(owner_id)?;
            instance.write_boxed(location.index(), offset, property, value)
        }
    };
    stored.map_err(|_| wrong_value(property))
}

// -----------------------------------------------------------------------------
// Primitive fast path

/// Atomics accessed with acquire/release ordering.
trait AtomicPrimitive: Any {
    type Plain: Mappable + Copy;

    fn new(value: Self::Plain) -> Self;

    fn load(&self) -> Self::Plain;

    fn store(&self, value: Self::Plain);
}

macro_rules! impl_atomic_primitive {
    ($cfg:literal, $atomic:ident, $plain:ty) => {
        #[cfg(target_has_atomic = $cfg)]
        impl AtomicPrimitive for core::sync::atomic::$atomic {
            type Plain = $plain;

            #[inline]
            fn new(value: $plain) -> Self {
                Self::new(value)
            }

            #[inline]
            fn load(&self) -> $plain {
                self.load(Ordering::Acquire)
            }

            #[inline]
            fn store(&self, value: $plain) {
                self.store(value, Ordering::Release)
            }
        }
    };
}

impl_atomic_primitive!("8", AtomicBool, bool);
impl_atomic_primitive!("8", AtomicI8, i8);
impl_atomic_primitive!("16", AtomicI16, i16);
impl_atomic_primitive!("32", AtomicI32, i32);
impl_atomic_primitive!("64", AtomicI64, i64);

fn plain_getter<P: Mappable + Copy>(location: &Location) -> FieldGetter {
    let owner_id = location.owner().type_id();
    let offset = location.token();
    make_getter(move |owner| {
        let ptr = field_ptr(owner, owner_id, offset)?;
        // SAFETY: The declared type is `P`.
        let value = unsafe { *ptr.as_ref::<P>() };
        Ok(value.into_value())
    })
}

fn plain_setter<P: Mappable + Copy>(location: &Location) -> FieldSetter {
    let location = *location;
    make_setter(move |target, incoming| match incoming {
        Incoming::Wire(value, ctx) => store::<P>(target, &location, P::from_value(value, ctx)?),
        Incoming::Boxed(value) => store_boxed(target, &location, value),
    })
}

fn volatile_getter<A: AtomicPrimitive>(location: &Location) -> FieldGetter {
    let owner_id = location.owner().type_id();
    let offset = location.token();
    make_getter(move |owner| {
        let ptr = field_ptr(owner, owner_id, offset)?;
        // SAFETY: The declared type is `A`.
        let atomic = unsafe { ptr.as_ref::<A>() };
        Ok(atomic.load().into_value())
    })
}

fn volatile_setter<A: AtomicPrimitive>(location: &Location) -> FieldSetter {
    let location = *location;
    make_setter(move |target, incoming| {
        let value = match incoming {
            Incoming::Wire(value, ctx) => <A::Plain as Mappable>::from_value(value, ctx)?,
            Incoming::Boxed(value) => return store_boxed(target, &location, value),
        };
        match target.into_inner() {
            Ok(owner) => {
                let ptr = field_ptr(owner, location.owner().type_id(), location.token())?;
                // SAFETY: The declared type is `A`, initialized in an existing owner.
                unsafe { ptr.as_ref::<A>() }.store(value);
                Ok(())
            }
            Err(instance) => store::<A>(Target::uninit(instance), &location, A::new(value)),
        }
    })
}

/// Selects the accessor pair by the exact declared type.
///
/// Properties whose [`Primitive`](crate::kind::Primitive) does not belong to
/// one of these types take the boxing path.
fn primitive_accessors(location: &Location) -> Option<(FieldGetter, FieldSetter)> {
    let property = location.property();
    property.ops().value()?.primitive()?;
    let id = property.type_id();

    macro_rules! plain {
        ($($ty:ty),*) => {$(
            if id == TypeId::of::<$ty>() {
                return Some((plain_getter::<$ty>(location), plain_setter::<$ty>(location)));
            }
        )*};
    }

    macro_rules! volatile {
        ($($cfg:literal => $atomic:ident),*) => {$(
            #[cfg(target_has_atomic = $cfg)]
            if id == TypeId::of::<core::sync::atomic::$atomic>() {
                return Some((
                    volatile_getter::<core::sync::atomic::$atomic>(location),
                    volatile_setter::<core::sync::atomic::$atomic>(location),
                ));
            }
        )*};
    }

    plain!(bool, i8, i16, char, i32, i64, f32, f64);
    volatile!(
        "8" => AtomicBool,
        "8" => AtomicI8,
        "16" => AtomicI16,
        "32" => AtomicI32,
        "64" => AtomicI64
    );
    None
}

// -----------------------------------------------------------------------------
// UninitInstance

/// A heap instance whose fields are written one by one.
///
/// Tracks written fields, properties first then excluded fields, so that
/// dropping an unfinished instance only drops what was initialized.
pub(crate) struct UninitInstance {
    descriptor: &'static TypeDescriptor,
    storage: Option<RawStorage>,
    written: FixedBitSet,
}

impl UninitInstance {
    fn new(descriptor: &'static TypeDescriptor) -> Self {
        let len = descriptor.properties().len() + descriptor.excluded().len();
        Self {
            descriptor,
            storage: Some(RawStorage::new(descriptor.ops().layout())),
            written: FixedBitSet::with_capacity(len),
        }
    }

    #[inline]
    fn check_owner(&self, owner_id: TypeId) -> Result<(), MapError> {
        if self.descriptor.type_id() == owner_id {
            Ok(())
        } else {
            Err(wrong_owner())
        }
    }

    /// The slot at `offset`.
    ///
    /// Only called with offsets validated for the descriptor's layout.
    fn slot(&mut self, offset: usize) -> PtrMut<'_> {
        match &mut self.storage {
            // SAFETY: The offset lies inside the layout the storage was allocated with.
            Some(storage) => unsafe { storage.as_ptr_mut().byte_add(offset) },
            None => unreachable!("storage is only taken by `finish`"),
        }
    }

    fn write_boxed(
        &mut self,
        index: usize,
        offset: usize,
        property: &PropertyInfo,
        value: Box<dyn Any>,
    ) -> Result<(), Box<dyn Any>> {
        let slot = *property.ops().slot();
        let initialized = self.written.contains(index);
        let ptr = self.slot(offset);
        // SAFETY: `written` tracks whether the slot is initialized, the slot
        // operations are those of the declared type.
        unsafe {
            if initialized {
                (slot.replace)(ptr, value)?;
            } else {
                (slot.write)(ptr, value)?;
            }
        }
        self.written.insert(index);
        Ok(())
    }

    pub(super) fn finish(mut self) -> Result<Box<dyn Any>, MapError> {
        let descriptor = self.descriptor;
        let count = descriptor.properties().len();

        for (index, property) in descriptor.properties().iter().enumerate() {
            if self.written.contains(index) {
                continue;
            }
            let missing = || MapError::Allocation {
                type_name: descriptor.type_name(),
                reason: "an absent property has no default value",
            };
            let value = property.ops().make_default().ok_or_else(missing)?;
            let offset = property.offset().ok_or_else(missing)?;
            self.write_boxed(index, offset, property, value)
                .map_err(|_| wrong_value(property))
                .map_err(|e| e.at(descriptor.ident(), property.name()))?;
        }

        for (index, field) in descriptor.excluded().iter().enumerate() {
            let missing = || MapError::Allocation {
                type_name: descriptor.type_name(),
                reason: "an excluded field has no default value",
            };
            let value = field.ops().make_default().ok_or_else(missing)?;
            let offset = field.offset().ok_or_else(missing)?;
            let slot = *field.ops().slot();
            let ptr = self.slot(offset);
            // SAFETY: Excluded fields are only written here, once.
            unsafe { (slot.write)(ptr, value) }.map_err(|_| MapError::Allocation {
                type_name: descriptor.type_name(),
                reason: "an excluded field default has the wrong type",
            })?;
            self.written.insert(count + index);
        }

        match self.storage.take() {
            // SAFETY: Every field is initialized, the descriptor is exhaustive
            // and the storage was allocated with the descriptor's layout.
            Some(storage) => Ok(unsafe { (descriptor.ops().slot().into_box)(storage) }),
            None => unreachable!("storage is only taken by `finish`"),
        }
    }
}

impl Drop for UninitInstance {
    fn drop(&mut self) {
        let Some(mut storage) = self.storage.take() else {
            return;
        };
        let descriptor = self.descriptor;
        let count = descriptor.properties().len();
        for index in self.written.ones() {
            let (ops, offset) = match index.checked_sub(count) {
                None => {
                    let property = &descriptor.properties()[index];
                    (property.ops(), property.offset())
                }
                Some(excluded) => {
                    let field = &descriptor.excluded()[excluded];
                    (field.ops(), field.offset())
                }
            };
            let Some(offset) = offset else {
                continue;
            };
            // SAFETY: The field was written, so it is initialized, and is not
            // touched again before the storage is freed.
            unsafe { (ops.slot().drop)(storage.as_ptr_mut().byte_add(offset)) };
        }
    }
}

impl fmt::Debug for UninitInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UninitInstance")
            .field("type_name", &self.descriptor.type_name())
            .field("written", &self.written.count_ones(..))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Offset checks

#[cold]
fn rejected(owner: &'static TypeDescriptor, property: &'static PropertyInfo) -> ConfigError {
    ConfigError::StrategyRejected {
        strategy: "raw",
        owner: owner.type_name(),
        property: property.name(),
    }
}

/// `true` if a field of layout `field` at `offset` lies inside `owner`.
#[inline]
fn fits(offset: usize, field: Layout, owner: Layout) -> bool {
    offset
        .checked_add(field.size())
        .is_some_and(|end| end <= owner.size())
        && offset.is_multiple_of(field.align())
}

/// The byte offset of `location`.
///
/// A location can be built by anyone, so the index and offset it carries
/// must agree with the owner's descriptor before memory is touched.
fn checked_offset(location: &Location) -> Result<usize, ConfigError> {
    let owner = location.owner();
    let property = location.property();
    let offset = location.token();
    let valid = Location::position(owner, property) == Some(location.index())
        && property.offset() == Some(offset)
        && fits(offset, property.ops().layout(), owner.ops().layout());
    if valid {
        Ok(offset)
    } else {
        Err(rejected(owner, property))
    }
}

// -----------------------------------------------------------------------------
// RawAccess

/// Field access at byte offsets.
///
/// Properties of the eight primitive types, and of the matching atomics,
/// are read and written without boxing; atomics with acquire/release
/// ordering. Instances are created without a constructor: the fields read
/// from the input are written in place, every other field is filled with
/// its default (see [`Mappable::alloc_default`]), and a field without one
/// fails the allocation.
///
/// Only descriptors generated by `#[derive(Mapped)]` carry offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawAccess;

impl AccessStrategy for RawAccess {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn can_access(&self, property: &PropertyInfo) -> bool {
        property.offset().is_some()
    }

    fn prepare(
        &self,
        owner: &'static TypeDescriptor,
        property: &'static PropertyInfo,
    ) -> Result<Location, ConfigError> {
        let index = Location::position(owner, property).ok_or_else(|| rejected(owner, property))?;
        let offset = property.offset().ok_or_else(|| rejected(owner, property))?;
        let location = Location::new(owner, property, index, offset);
        checked_offset(&location)?;
        Ok(location)
    }

    fn getter(&self, location: &Location) -> FieldGetter {
        if let Err(err) = checked_offset(location) {
            return make_getter(move |_| Err(err.clone().into()));
        }
        if let Some((getter, _)) = primitive_accessors(location) {
            return getter;
        }
        let property = location.property();
        let owner_id = location.owner().type_id();
        let offset = location.token();
        let slot = *property.ops().slot();
        let value_ops = property.ops().value().copied();
        make_getter(move |owner| {
            let ptr = field_ptr(owner, owner_id, offset)?;
            // SAFETY: The slot operations are those of the declared type.
            let field = unsafe { (slot.as_any)(ptr) };
            match &value_ops {
                Some(ops) => ops.to_value(field),
                None => Err(wrong_value(property)),
            }
        })
    }

    fn reference(&self, location: &Location) -> FieldRef {
        if let Err(err) = checked_offset(location) {
            return make_ref(move |_| Err(err.clone().into()));
        }
        let owner_id = location.owner().type_id();
        let offset = location.token();
        let slot = *location.property().ops().slot();
        make_ref(move |owner| {
            let ptr = field_ptr(owner, owner_id, offset)?;
            // SAFETY: The slot operations are those of the declared type.
            Ok(unsafe { (slot.as_any)(ptr) })
        })
    }

    fn setter(&self, location: &Location) -> FieldSetter {
        if let Err(err) = checked_offset(location) {
            return make_setter(move |_, _| Err(err.clone().into()));
        }
        if let Some((_, setter)) = primitive_accessors(location) {
            return setter;
        }
        let location = *location;
        make_setter(move |target, incoming| {
            let value = incoming.into_boxed(location.property().ops())?;
            store_boxed(target, &location, value)
        })
    }

    fn allocate(&self, descriptor: &'static TypeDescriptor) -> Result<Allocation, MapError> {
        let owner = descriptor.ops().layout();
        let described = descriptor.is_exhaustive()
            && descriptor
                .properties()
                .iter()
                .all(|p| p.offset().is_some_and(|o| fits(o, p.ops().layout(), owner)))
            && descriptor
                .excluded()
                .iter()
                .all(|f| f.offset().is_some_and(|o| fits(o, f.ops().layout(), owner)));
        if !described {
            return Err(MapError::Allocation {
                type_name: descriptor.type_name(),
                reason: "the field layout is not fully described",
            });
        }
        Ok(Allocation::uninit(UninitInstance::new(descriptor)))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::RawAccess;
    use crate::access::{AccessStrategy, Incoming, Location, Target};
    use crate::factory::MapperFactory;
    use crate::info::Mapped;
    use crate::value::Value;
    use alloc::boxed::Box;
    use alloc::string::String;
    use core::num::NonZeroU8;
    use core::sync::atomic::{AtomicI32, Ordering};
    use alloc::sync::Arc;
    use core::sync::atomic::AtomicUsize;

    static DROPS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Tracked;

    impl Drop for Tracked {
        fn drop(&mut self) {
            DROPS.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[derive(crate::Mapped)]
    struct Sample {
        id: i64,
        label: String,
        level: AtomicI32,
        #[mapped(skip)]
        cache: Option<Arc<str>>,
    }

    #[derive(crate::Mapped)]
    struct Strict {
        count: NonZeroU8,
        name: String,
    }

    #[derive(crate::Mapped)]
    struct WithTracked {
        name: String,
        #[mapped(skip)]
        tracked: Tracked,
    }

    fn location<T: Mapped>(name: &str) -> Location {
        let descriptor = T::descriptor();
        let (index, property) = descriptor
            .properties()
            .iter()
            .enumerate()
            .find(|(_, p)| p.name() == name)
            .unwrap();
        let location = RawAccess.prepare(descriptor, property).unwrap();
        assert_eq!(location.index(), index);
        location
    }

    #[test]
    fn read_and_write_existing() {
        let mut sample = Sample {
            id: 7,
            label: String::from("old"),
            level: AtomicI32::new(3),
            cache: None,
        };
        let factory = MapperFactory::new();
        let ctx = factory.context();

        let id = location::<Sample>("id");
        assert_eq!(RawAccess.getter(&id)(&sample).unwrap(), Value::Long(7));
        RawAccess.setter(&id)(Target::existing(&mut sample), Incoming::Wire(Value::Int(9), &ctx))
            .unwrap();
        assert_eq!(sample.id, 9);

        let label = location::<Sample>("label");
        RawAccess.setter(&label)(
            Target::existing(&mut sample),
            Incoming::Boxed(Box::new(String::from("new"))),
        )
        .unwrap();
        assert_eq!(sample.label, "new");
        let err = RawAccess.setter(&label)(Target::existing(&mut sample), Incoming::Boxed(Box::new(1_u8)));
        assert!(err.unwrap_err().is_shape());

        let level = location::<Sample>("level");
        assert_eq!(RawAccess.getter(&level)(&sample).unwrap(), Value::Int(3));
        RawAccess.setter(&level)(Target::existing(&mut sample), Incoming::Wire(Value::Int(5), &ctx))
            .unwrap();
        assert_eq!(sample.level.load(Ordering::Relaxed), 5);

        let reference = RawAccess.reference(&label)(&sample).unwrap();
        assert_eq!(reference.downcast_ref::<String>().map(String::as_str), Some("new"));
        assert!(sample.cache.is_none());
    }

    #[derive(crate::Mapped, Debug, PartialEq)]
    struct Pair {
        a: i32,
        b: i32,
    }

    #[test]
    fn rejects_forged_locations() {
        let factory = MapperFactory::new();
        let ctx = factory.context();
        let descriptor = Pair::descriptor();
        let a = &descriptor.properties()[0];
        let mut pair = Pair { a: 1, b: 2 };

        // `a` pointing at the offset of `b`.
        let forged = Location::new(descriptor, a, 0, core::mem::offset_of!(Pair, b));
        let err = RawAccess.setter(&forged)(Target::existing(&mut pair), Incoming::Wire(Value::Int(99), &ctx))
            .unwrap_err();
        assert!(err.is_config());
        assert!(RawAccess.getter(&forged)(&pair).unwrap_err().is_config());
        assert_eq!(pair, Pair { a: 1, b: 2 });

        // Past the end of the owner.
        let outside = Location::new(descriptor, a, 0, 1 << 12);
        assert!(RawAccess.getter(&outside)(&pair).is_err());
        assert!(RawAccess.reference(&outside)(&pair).is_err());

        // Wrong index for the property.
        let shifted = Location::new(descriptor, a, 1, 0);
        assert!(RawAccess.getter(&shifted)(&pair).is_err());

        let valid = location::<Pair>("a");
        assert_eq!(RawAccess.getter(&valid)(&pair).unwrap(), Value::Int(1));
    }

    #[test]
    fn rejects_other_owner() {
        let id = location::<Sample>("id");
        assert!(RawAccess.getter(&id)(&5_i64).is_err());
    }

    #[test]
    fn allocate_fills_defaults() {
        let factory = MapperFactory::new();
        let ctx = factory.context();
        let descriptor = Sample::descriptor();

        let mut allocation = RawAccess.allocate(descriptor).unwrap();
        let label = location::<Sample>("label");
        RawAccess.setter(&label)(allocation.target(), Incoming::Wire(Value::from("raw"), &ctx))
            .unwrap();
        // Written twice, the first value is dropped.
        RawAccess.setter(&label)(allocation.target(), Incoming::Wire(Value::from("again"), &ctx))
            .unwrap();

        let sample = allocation.finish().unwrap().downcast::<Sample>().unwrap();
        assert_eq!(sample.id, 0);
        assert_eq!(sample.label, "again");
        assert_eq!(sample.level.load(Ordering::Relaxed), 0);
        assert!(sample.cache.is_none());
    }

    #[test]
    fn absent_field_without_default() {
        let factory = MapperFactory::new();
        let ctx = factory.context();

        let mut allocation = RawAccess.allocate(Strict::descriptor()).unwrap();
        let name = location::<Strict>("name");
        RawAccess.setter(&name)(allocation.target(), Incoming::Wire(Value::from("x"), &ctx))
            .unwrap();
        // `name` is dropped along with the unfinished instance.
        assert!(matches!(
            allocation.finish().unwrap_err().root(),
            crate::MapError::Allocation { .. }
        ));

        let mut allocation = RawAccess.allocate(Strict::descriptor()).unwrap();
        let count = location::<Strict>("count");
        RawAccess.setter(&count)(allocation.target(), Incoming::Wire(Value::Short(2), &ctx))
            .unwrap();
        RawAccess.setter(&name)(allocation.target(), Incoming::Wire(Value::from("y"), &ctx))
            .unwrap();
        let strict = allocation.finish().unwrap().downcast::<Strict>().unwrap();
        assert_eq!(strict.count.get(), 2);
        assert_eq!(strict.name, "y");
    }

    #[test]
    fn unfinished_instances_drop_written_fields() {
        let factory = MapperFactory::new();
        let ctx = factory.context();
        let before = DROPS.load(Ordering::Relaxed);

        let finished = {
            let allocation = RawAccess.allocate(WithTracked::descriptor()).unwrap();
            allocation.finish().unwrap()
        };
        assert_eq!(DROPS.load(Ordering::Relaxed), before);
        drop(finished);
        assert_eq!(DROPS.load(Ordering::Relaxed), before + 1);

        // Excluded fields are only written by `finish`, nothing to drop here.
        let mut allocation = RawAccess.allocate(WithTracked::descriptor()).unwrap();
        let name = location::<WithTracked>("name");
        RawAccess.setter(&name)(allocation.target(), Incoming::Wire(Value::from("n"), &ctx))
            .unwrap();
        drop(allocation);
        assert_eq!(DROPS.load(Ordering::Relaxed), before + 1);
    }
}
