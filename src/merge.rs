//! Stable in-place merge of two adjacent sorted runs, used to join a long presorted prefix with
//! the sorted remainder. Never allocates.

use core::cmp;
use core::ptr;

use crate::scratch::Scratch;

/// Merges non-decreasing runs `v[..mid]` and `v[mid..]` into `v`.
///
/// If the shorter run fits into a stack scratch buffer it is merged through the buffer. Otherwise
/// the runs are split around a pivot, the middle pieces exchanged with a rotation and both halves
/// merged recursively, until the pieces are small enough for the buffer.
pub(crate) fn merge<T, F>(v: &mut [T], mid: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let mut scratch = Scratch::<T>::new();
    merge_with_buf(v, mid, scratch.as_mut_ptr(), Scratch::<T>::CAPACITY, is_less);
}

fn merge_with_buf<T, F>(v: &mut [T], mid: usize, buf: *mut T, buf_len: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();

    if mid == 0 || mid >= len {
        return;
    }

    // The runs are already in order.
    if !is_less(&v[mid], &v[mid - 1]) {
        return;
    }

    if cmp::min(mid, len - mid) <= buf_len {
        // SAFETY: `buf` is valid for `buf_len` writes and doesn't alias `v`, and the shorter run
        // fits into it.
        unsafe {
            merge_buffered(v, mid, buf, is_less);
        }
        return;
    }

    // The pivot is the middle element of the longer run. After the rotation it sits at its final
    // position and is excluded from both recursive merges, so each of them is strictly shorter,
    // and at most 3/4 of `len`, independent of what `is_less` returns.
    if mid >= len - mid {
        let a = mid / 2;
        // Right run elements strictly less than the pivot go before it, equal ones stay after.
        let b = mid + v[mid..].partition_point(|r| is_less(r, &v[a]));

        v[a..b].rotate_left(mid - a);
        let pivot_pos = a + (b - mid);

        let (left, right) = v.split_at_mut(pivot_pos);
        merge_with_buf(left, a, buf, buf_len, is_less);
        merge_with_buf(&mut right[1..], mid - a - 1, buf, buf_len, is_less);
    } else {
        let b = mid + (len - mid) / 2;
        // Left run elements less than or equal to the pivot stay before it.
        let a = v[..mid].partition_point(|l| !is_less(&v[b], l));

        v[a..=b].rotate_left(mid - a);
        let pivot_pos = a + (b - mid);

        let (left, right) = v.split_at_mut(pivot_pos);
        merge_with_buf(left, a, buf, buf_len, is_less);
        merge_with_buf(&mut right[1..], mid - a, buf, buf_len, is_less);
    }
}

/// Merges non-decreasing runs `v[..mid]` and `v[mid..]` using `buf` as temporary storage, and
/// stores the result into `v[..]`.
///
/// # Safety
///
/// The two slices must be non-empty and `mid` must be in bounds. Buffer `buf` must be long enough
/// to hold a copy of the shorter slice. Also, `T` must not be a zero-sized type.
unsafe fn merge_buffered<T, F>(v: &mut [T], mid: usize, buf: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    let arr_ptr = v.as_mut_ptr();
    let (v_mid, v_end) = (arr_ptr.add(mid), arr_ptr.add(len));

    // The merge process first copies the shorter run into `buf`. Then it traces the newly copied
    // run and the longer run forwards (or backwards), comparing their next unconsumed elements and
    // copying the lesser (or greater) one into `v`.
    //
    // As soon as the shorter run is fully consumed, the process is done. If the longer run gets
    // consumed first, then we must copy whatever is left of the shorter run into the remaining
    // hole in `v`.
    //
    // Intermediate state of the process is always tracked by `hole`, which serves two purposes:
    // 1. Protects integrity of `v` from panics in `is_less`.
    // 2. Fills the remaining hole in `v` if the longer run gets consumed first.
    //
    // Panic safety:
    //
    // If `is_less` panics at any point during the process, `hole` will get dropped and fill the
    // hole in `v` with the unconsumed range in `buf`, thus ensuring that `v` still holds every
    // object it initially held exactly once.
    let mut hole;

    if mid <= len - mid {
        // The left run is shorter.
        ptr::copy_nonoverlapping(arr_ptr, buf, mid);
        hole = MergeHole {
            start: buf,
            end: buf.add(mid),
            dest: arr_ptr,
        };

        // Initially, these pointers point to the beginnings of their arrays.
        let left = &mut hole.start;
        let mut right = v_mid;
        let out = &mut hole.dest;

        while *left < hole.end && right < v_end {
            // Consume the lesser side.
            // If equal, prefer the left run to maintain stability.
            let to_copy = if is_less(&*right, &**left) {
                get_and_increment(&mut right)
            } else {
                get_and_increment(left)
            };
            ptr::copy_nonoverlapping(to_copy, get_and_increment(out), 1);
        }
    } else {
        // The right run is shorter.
        ptr::copy_nonoverlapping(v_mid, buf, len - mid);
        hole = MergeHole {
            start: buf,
            end: buf.add(len - mid),
            dest: v_mid,
        };

        // Initially, these pointers point past the ends of their arrays.
        let left = &mut hole.dest;
        let right = &mut hole.end;
        let mut out = v_end;

        while arr_ptr < *left && buf < *right {
            // Consume the greater side.
            // If equal, prefer the right run to maintain stability.
            let to_copy = if is_less(&*right.sub(1), &*left.sub(1)) {
                decrement_and_get(left)
            } else {
                decrement_and_get(right)
            };
            ptr::copy_nonoverlapping(to_copy, decrement_and_get(&mut out), 1);
        }
    }
    // Finally, `hole` gets dropped. If the shorter run was not fully consumed, whatever remains of
    // it will now be copied into the hole in `v`.

    unsafe fn get_and_increment<T>(ptr: &mut *mut T) -> *mut T {
        let old = *ptr;
        *ptr = ptr.add(1);
        old
    }

    unsafe fn decrement_and_get<T>(ptr: &mut *mut T) -> *mut T {
        *ptr = ptr.sub(1);
        *ptr
    }

    // When dropped, copies the range `start..end` into `dest..`.
    struct MergeHole<T> {
        start: *mut T,
        end: *mut T,
        dest: *mut T,
    }

    impl<T> Drop for MergeHole<T> {
        fn drop(&mut self) {
            // SAFETY: `T` is not a zero-sized type, and these are pointers into a slice's
            // elements.
            unsafe {
                let len = self.end.offset_from(self.start) as usize;
                ptr::copy_nonoverlapping(self.start, self.dest, len);
            }
        }
    }
}
