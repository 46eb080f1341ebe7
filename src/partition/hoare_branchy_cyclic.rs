use core::mem::ManuallyDrop;
use core::ptr;

use crate::scratch::GapGuard;

/// Partitions `v` into the elements less than `pivot` followed by the rest. Returns the number of
/// elements less than `pivot`.
///
/// Optimized for types that are expensive to move and comparison functions that are expensive
/// to call. Pairs of out-of-order elements are exchanged through a cyclic permutation, one copy
/// per element instead of the three a swap needs.
pub(super) fn partition<T, F>(v: &mut [T], pivot: &T, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    let arr_ptr = v.as_mut_ptr();

    // The first left wrong-side element is held by the guard. Until the loop ends the gap it
    // leaves behind travels between the two sides, and the guard fills it at the end, or
    // on unwind.
    let mut gap_guard_opt: Option<GapGuard<T>> = None;

    let mut l = 0;
    let mut r = len;

    // SAFETY: Every access happens at `l` or `r - 1` while `l < r` holds, and `0 <= l`,
    // `r <= len` hold for the whole loop. The gap is always either at `r` after the right side
    // has been moved, which is outside the window `l..r` that is scanned, or filled.
    unsafe {
        loop {
            // Find the first element greater than or equal to the pivot.
            while l < r && is_less(&*arr_ptr.add(l), pivot) {
                l += 1;
            }

            // Find the last element less than the pivot.
            while l < r && !is_less(&*arr_ptr.add(r - 1), pivot) {
                r -= 1;
            }

            // Are we done? With an inconsistent `is_less` both scans can stop on the same element.
            if l + 1 >= r {
                break;
            }

            r -= 1;

            let l_ptr = arr_ptr.add(l);
            let r_ptr = arr_ptr.add(r);

            // Swap the found pair of out-of-order elements via cyclic permutation.
            match gap_guard_opt.as_mut() {
                None => {
                    gap_guard_opt = Some(GapGuard {
                        pos: r_ptr,
                        value: ManuallyDrop::new(ptr::read(l_ptr)),
                    });
                }
                Some(gap_guard) => {
                    ptr::copy_nonoverlapping(l_ptr, gap_guard.pos, 1);
                    gap_guard.pos = r_ptr;
                }
            }

            ptr::copy_nonoverlapping(r_ptr, l_ptr, 1);

            l += 1;
        }
    }

    // `gap_guard_opt` goes out of scope and overwrites the last right wrong-side element with
    // the first left wrong-side element that was initially overwritten by the first right
    // wrong-side element.
    drop(gap_guard_opt);

    l
}
