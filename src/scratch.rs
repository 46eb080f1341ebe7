//! Stack scratch space and the drop guards that keep the input slice whole on unwind.
//!
//! Elements are placed into scratch slots with a bitwise copy and leave them the same way. The
//! buffer itself never drops anything, the owner of every element is tracked by the caller and at
//! any point where `is_less` may panic a guard knows how to make the input slice whole again.

use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop, MaybeUninit};
use core::ptr;

/// Upper bound of stack memory used by a single scratch buffer, roughly one page.
pub(crate) const MAX_STACK_SIZE: usize = 4096;

/// Alignment of the scratch buffer. Types with a larger alignment never get scratch slots.
pub(crate) const ALIGN: usize = 64;

#[repr(C, align(64))]
struct AlignedBytes([u8; MAX_STACK_SIZE]);

/// Uninitialized stack storage for up to `Scratch::<T>::CAPACITY` values of `T`.
pub(crate) struct Scratch<T> {
    bytes: MaybeUninit<AlignedBytes>,
    _marker: PhantomData<T>,
}

impl<T> Scratch<T> {
    pub(crate) const CAPACITY: usize = if mem::size_of::<T>() == 0 || mem::align_of::<T>() > ALIGN
    {
        0
    } else {
        MAX_STACK_SIZE / mem::size_of::<T>()
    };

    #[inline(always)]
    pub(crate) fn new() -> Self {
        Self {
            bytes: MaybeUninit::uninit(),
            _marker: PhantomData,
        }
    }

    /// Base pointer of the slots, valid for `CAPACITY` reads and writes of `T`.
    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.bytes.as_mut_ptr() as *mut T
    }
}

/// When dropped, copies `len` elements from `src` into `dst`.
///
/// Used while `src` holds the only up-to-date copy of elements whose original slots in `dst` may
/// already have been overwritten.
pub(crate) struct CopyOnDrop<T> {
    pub(crate) src: *const T,
    pub(crate) dst: *mut T,
    pub(crate) len: usize,
}

impl<T> Drop for CopyOnDrop<T> {
    fn drop(&mut self) {
        // SAFETY: `src` and `dst` are valid for `len` elements and don't overlap. This is upheld
        // by every user of the guard.
        unsafe {
            ptr::copy_nonoverlapping(self.src, self.dst, self.len);
        }
    }
}

/// A single element moved out of a slice, and the position of the gap it has to be written back
/// to. Moving the gap around is how insertion, sift-down and cyclic permutations avoid swaps.
pub(crate) struct GapGuard<T> {
    pub(crate) pos: *mut T,
    pub(crate) value: ManuallyDrop<T>,
}

impl<T> Drop for GapGuard<T> {
    fn drop(&mut self) {
        // SAFETY: `pos` always points to the slot that currently holds a stale duplicate.
        unsafe {
            ptr::copy_nonoverlapping(&*self.value, self.pos, 1);
        }
    }
}
