use alloc::alloc::{alloc, dealloc, handle_alloc_error};
use alloc::boxed::Box;
use core::alloc::Layout;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr::NonNull;

use crate::{Ptr, PtrMut};

// -----------------------------------------------------------------------------
// RawStorage

/// An owned heap allocation whose content is uninitialized.
///
/// Dropping a `RawStorage` frees the memory but does **not** drop anything
/// inside it, because it does not know what (if anything) was initialized.
/// Once every byte that matters is written, [`assume_init`](Self::assume_init)
/// turns the storage into a regular `Box<T>`.
///
/// Zero-sized layouts do not allocate, a dangling aligned pointer is used.
///
/// # Examples
///
/// ```
/// # use vc_ptr::RawStorage;
/// struct Pair {
///     a: u32,
///     b: u32,
/// }
///
/// let mut storage = RawStorage::for_type::<Pair>();
/// unsafe {
///     let mut ptr = storage.as_ptr_mut();
///     ptr.reborrow().byte_add(core::mem::offset_of!(Pair, a)).write(1u32);
///     ptr.byte_add(core::mem::offset_of!(Pair, b)).write(2u32);
/// }
///
/// let pair: Box<Pair> = unsafe { storage.assume_init() };
/// assert_eq!((pair.a, pair.b), (1, 2));
/// ```
pub struct RawStorage {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: The storage owns its memory exclusively, like a `Box<[MaybeUninit<u8>]>`.
unsafe impl Send for RawStorage {}
// SAFETY: Shared access only hands out `Ptr`, which is read only.
unsafe impl Sync for RawStorage {}

impl RawStorage {
    /// Allocates uninitialized memory for `layout`.
    ///
    /// Aborts through [`handle_alloc_error`] if the allocator fails.
    pub fn new(layout: Layout) -> Self {
        let ptr = if layout.size() == 0 {
            // SAFETY: `align` is never zero.
            unsafe { NonNull::new_unchecked(core::ptr::without_provenance_mut(layout.align())) }
        } else {
            // SAFETY: `layout` has a non-zero size.
            let raw = unsafe { alloc(layout) };
            match NonNull::new(raw) {
                Some(ptr) => ptr,
                None => handle_alloc_error(layout),
            }
        };

        Self { ptr, layout }
    }

    /// Allocates uninitialized memory suitable for a `T`.
    #[inline]
    pub fn for_type<T>() -> Self {
        Self::new(Layout::new::<T>())
    }

    /// Returns the layout this storage was allocated with.
    #[inline]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns a shared pointer to the start of the storage.
    #[inline]
    pub const fn as_ptr(&self) -> Ptr<'_> {
        // SAFETY: The memory lives as long as `self`.
        unsafe { Ptr::new(self.ptr) }
    }

    /// Returns an exclusive pointer to the start of the storage.
    #[inline]
    pub const fn as_ptr_mut(&mut self) -> PtrMut<'_> {
        // SAFETY: The memory lives as long as `self`, and `&mut self` is exclusive.
        unsafe { PtrMut::new(self.ptr) }
    }

    /// Converts the storage into a `Box<T>`.
    ///
    /// # Safety
    /// - The storage must have been allocated with `Layout::new::<T>()`.
    /// - Every field of `T` must be initialized.
    pub unsafe fn assume_init<T>(self) -> Box<T> {
        debug_assert_eq!(self.layout, Layout::new::<T>());
        let this = ManuallyDrop::new(self);
        // SAFETY: The layout matches `T` and the content is initialized,
        // ownership of the memory moves to the box.
        unsafe { Box::from_raw(this.ptr.as_ptr().cast::<T>()) }
    }
}

impl Drop for RawStorage {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: Allocated in `new` with the same layout.
            unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
        }
    }
}

impl fmt::Debug for RawStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStorage")
            .field("ptr", &self.ptr)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::RawStorage;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::mem::offset_of;

    struct Record {
        tag: u8,
        items: Vec<u16>,
        label: String,
    }

    #[test]
    fn init_then_box() {
        let mut storage = RawStorage::for_type::<Record>();
        unsafe {
            let mut ptr = storage.as_ptr_mut();
            ptr.reborrow()
                .byte_add(offset_of!(Record, label))
                .write(String::from("raw"));
            ptr.reborrow()
                .byte_add(offset_of!(Record, items))
                .write(alloc::vec![1u16, 2]);
            ptr.byte_add(offset_of!(Record, tag)).write(3u8);
        }

        let record = unsafe { storage.assume_init::<Record>() };
        assert_eq!(record.tag, 3);
        assert_eq!(record.items, [1, 2]);
        assert_eq!(record.label, "raw");
    }

    #[test]
    fn zero_sized() {
        struct Empty;

        let storage = RawStorage::for_type::<Empty>();
        assert!(storage.as_ptr().is_aligned::<Empty>());
        let _empty: alloc::boxed::Box<Empty> = unsafe { storage.assume_init() };
    }

    #[test]
    fn drop_without_init() {
        // Only the memory is released, nothing is read.
        let storage = RawStorage::for_type::<Record>();
        drop(storage);
    }
}
