use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

// -----------------------------------------------------------------------------
// Common methods

macro_rules! impl_ptr {
    ($ptr:ident) => {
        impl From<$ptr<'_>> for NonNull<u8> {
            #[inline(always)]
            fn from(ptr: $ptr<'_>) -> Self {
                ptr.0
            }
        }

        impl $ptr<'_> {
            /// Check if the pointer is aligned to type `T`.
            #[inline]
            pub fn is_aligned<T>(&self) -> bool {
                self.0.as_ptr().cast::<T>().is_aligned()
            }

            /// Checks alignment in debug mode only.
            #[cfg_attr(debug_assertions, track_caller)]
            #[cfg_attr(not(debug_assertions), inline(always))]
            pub fn debug_assert_aligned<T>(&self) {
                debug_assert!(
                    self.is_aligned::<T>(),
                    "pointer is not aligned. Address {:p} does not have alignment {} for type {}",
                    self.0,
                    align_of::<T>(),
                    core::any::type_name::<T>(),
                );
            }

            /// Moves the pointer forward by `count` bytes, usually a field offset.
            ///
            /// # Safety
            /// - The result must stay inside the allocation this pointer points into.
            /// - The resulting pointer must not outlive the lifetime of this pointer.
            #[inline]
            pub const unsafe fn byte_add(self, count: usize) -> Self {
                Self(
                    // SAFETY: The caller keeps the result inside the same allocation.
                    unsafe { self.0.add(count) },
                    PhantomData,
                )
            }
        }

        impl fmt::Pointer for $ptr<'_> {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Pointer::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $ptr<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($ptr), self.0)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Ptr

/// A type-erased shared pointer, similar to `&'a dyn Any` without the vtable.
///
/// - It must always point to a valid value of whatever the pointee type is.
/// - The lifetime `'a` accurately represents how long the pointer is valid for.
/// - Its target must not be changed while this pointer is alive.
///
/// # Examples
///
/// ```
/// # use vc_ptr::Ptr;
/// struct Pair {
///     a: u8,
///     b: u32,
/// }
///
/// let pair = Pair { a: 1, b: 7 };
/// let ptr = Ptr::from_ref(&pair);
///
/// let b = unsafe { ptr.byte_add(core::mem::offset_of!(Pair, b)) };
/// b.debug_assert_aligned::<u32>();
/// assert_eq!(unsafe { *b.as_ref::<u32>() }, 7);
/// # let _ = pair.a;
/// ```
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Ptr<'a>(NonNull<u8>, PhantomData<&'a u8>);

impl_ptr!(Ptr);

impl<'a> Ptr<'a> {
    /// Create a `Ptr` from a raw `NonNull<u8>` pointer.
    ///
    /// # Safety
    ///
    /// - The provided lifetime `'a` must be valid for the pointee.
    /// - `ptr` must point to a valid object of the intended pointee type.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> Ptr<'a> {
        Ptr(ptr, PhantomData)
    }

    /// Creates a `Ptr` from a reference with same lifetime.
    ///
    /// Trait objects are accepted, only the data address is kept.
    #[inline(always)]
    pub const fn from_ref<T: ?Sized>(val: &'a T) -> Ptr<'a> {
        Ptr(NonNull::from_ref(val).cast(), PhantomData)
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub const fn as_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Convert this [`Ptr`] into a `&T` with the same lifetime `'a`.
    ///
    /// # Safety
    ///
    /// - `Ptr` points to a valid, initialized object.
    /// - `T` must match the actual type of the pointee.
    /// - `Ptr` must be properly aligned for `T`.
    #[inline(always)]
    pub const unsafe fn as_ref<T>(self) -> &'a T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &*self.0.as_ptr().cast::<T>() }
    }
}

impl<'a, T: ?Sized> From<&'a T> for Ptr<'a> {
    #[inline]
    fn from(val: &'a T) -> Self {
        Self::from_ref(val)
    }
}

// -----------------------------------------------------------------------------
// PtrMut

/// A type-erased exclusive pointer, similar to `&'a mut dyn Any` without the vtable.
///
/// Unlike a reference, the pointee is allowed to be **uninitialized**: the
/// raw accessor uses it to fill fields of a freshly allocated instance. Which
/// methods are valid depends on that state, see [`write`](Self::write) and
/// [`replace`](Self::replace).
///
/// It cannot be cloned, and the caller must comply with Rust alias rules.
///
/// # Examples
///
/// ```
/// # use vc_ptr::PtrMut;
/// let mut x = 8i32;
/// let mut ptr = PtrMut::from_mut(&mut x);
///
/// ptr.debug_assert_aligned::<i32>();
/// let old = unsafe { ptr.replace::<i32>(10) };
/// assert_eq!(old, 8);
/// assert_eq!(x, 10);
/// ```
#[repr(transparent)]
pub struct PtrMut<'a>(NonNull<u8>, PhantomData<&'a mut u8>);

impl_ptr!(PtrMut);

impl<'a> PtrMut<'a> {
    /// Create a `PtrMut` from a raw `NonNull<u8>` pointer.
    ///
    /// # Safety
    ///
    /// - The data pointed to by this `ptr` must be valid for writes.
    /// - The provided lifetime `'a` must be valid for the pointee.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> PtrMut<'a> {
        PtrMut(ptr, PhantomData)
    }

    /// Creates a `PtrMut` from a mutable reference with same lifetime.
    #[inline(always)]
    pub const fn from_mut<T: ?Sized>(val: &'a mut T) -> PtrMut<'a> {
        PtrMut(NonNull::from_mut(val).cast(), PhantomData)
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Gets a [`Ptr`] from self with a **smaller** lifetime.
    #[inline(always)]
    pub const fn borrow(&self) -> Ptr<'_> {
        Ptr(self.0, PhantomData)
    }

    /// Gets a [`PtrMut`] from self with a **smaller** lifetime.
    ///
    /// Used to derive several field pointers from one base pointer in turn.
    #[inline(always)]
    pub const fn reborrow(&mut self) -> PtrMut<'_> {
        PtrMut(self.0, PhantomData)
    }

    /// Convert this [`PtrMut`] into a `&mut T` with the **same** lifetime.
    ///
    /// # Safety
    /// - The pointee must be an initialized `T`.
    /// - Self must be properly aligned for type `T`.
    #[inline(always)]
    pub const unsafe fn consume<T>(self) -> &'a mut T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &mut *self.0.as_ptr().cast::<T>() }
    }

    /// Writes `value` without reading or dropping the previous content.
    ///
    /// This is the only valid way to fill an uninitialized slot.
    ///
    /// # Safety
    /// - Self must be properly aligned for type `T` and valid for writes.
    /// - If the slot held an initialized value, it is leaked.
    #[inline(always)]
    pub unsafe fn write<T>(self, value: T) {
        // SAFETY: Aligned and writable, guaranteed by the caller.
        unsafe { ptr::write(self.0.as_ptr().cast::<T>(), value) }
    }

    /// Replaces the initialized `T` behind this pointer, returning the old value.
    ///
    /// # Safety
    /// - The pointee must be an initialized `T`.
    /// - Self must be properly aligned for type `T`.
    #[inline(always)]
    pub unsafe fn replace<T>(self, value: T) -> T {
        // SAFETY: Initialized and aligned, guaranteed by the caller.
        unsafe { ptr::replace(self.0.as_ptr().cast::<T>(), value) }
    }

    /// Drops the initialized `T` behind this pointer in place.
    ///
    /// # Safety
    /// - The pointee must be an initialized `T`, and must be treated as
    ///   uninitialized afterwards.
    /// - Self must be properly aligned for type `T`.
    #[inline(always)]
    pub unsafe fn drop_as<T>(self) {
        // SAFETY: Initialized and aligned, guaranteed by the caller.
        unsafe { ptr::drop_in_place(self.0.as_ptr().cast::<T>()) }
    }
}

impl<'a, T: ?Sized> From<&'a mut T> for PtrMut<'a> {
    #[inline]
    fn from(val: &'a mut T) -> Self {
        Self::from_mut(val)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Ptr, PtrMut};
    use alloc::string::String;
    use core::mem::offset_of;

    struct Sample {
        id: u64,
        name: String,
        flag: bool,
    }

    #[test]
    fn field_offsets() {
        let sample = Sample {
            id: 42,
            name: String::from("vc"),
            flag: true,
        };

        let base = Ptr::from_ref(&sample);
        unsafe {
            assert_eq!(*base.byte_add(offset_of!(Sample, id)).as_ref::<u64>(), 42);
            assert_eq!(base.byte_add(offset_of!(Sample, name)).as_ref::<String>(), "vc");
            assert!(*base.byte_add(offset_of!(Sample, flag)).as_ref::<bool>());
        }
    }

    #[test]
    fn replace_and_drop() {
        let mut sample = Sample {
            id: 1,
            name: String::from("old"),
            flag: false,
        };

        let mut base = PtrMut::from_mut(&mut sample);
        let old = unsafe {
            base.reborrow()
                .byte_add(offset_of!(Sample, name))
                .replace::<String>(String::from("new"))
        };
        unsafe {
            base.reborrow().byte_add(offset_of!(Sample, id)).write::<u64>(9);
        }

        assert_eq!(old, "old");
        assert_eq!(sample.name, "new");
        assert_eq!(sample.id, 9);
        assert!(!sample.flag);
    }
}
