use core::mem::{self, ManuallyDrop};
use core::ptr;

use crate::caps::{
    Capability, OrderKind, SmallSortKind, SMALL_SORT_GENERAL_SCRATCH_LEN,
    SMALL_SORT_NETWORK_SCRATCH_LEN,
};
use crate::scratch::{CopyOnDrop, GapGuard, Scratch};

/// Sorting networks work on blocks of this size.
const BATCH: usize = 8;

/// Two blocks, one ascending and one descending, form a bitonic sequence.
const BITONIC_BATCH: usize = BATCH * 2;

/// Sorts `v` using strategies optimized for small sizes. Callers only pass slices up to the
/// quicksort small-sort threshold.
#[inline(always)]
pub(crate) fn small_sort<T, F, O>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
    O: OrderKind,
{
    match Capability::<T, O>::SMALL_SORT {
        SmallSortKind::Network => small_sort_network(v, is_less),
        SmallSortKind::General => small_sort_general(v, is_less),
        SmallSortKind::Insertion => {
            if v.len() >= 2 {
                insertion_sort_shift_left(v, 1, is_less);
            }
        }
    }
}

// --- Sorting networks ---

#[inline(always)]
unsafe fn branchless_swap<T>(left: *mut T, right: *mut T, should_swap: bool) {
    // SAFETY: the caller must guarantee that `left` and `right` are valid for writes
    // and properly aligned, and part of the same allocation, and do not alias.

    // This is a branchless version of swap if.
    // The equivalent code with a branch would be:
    //
    // if should_swap {
    //     ptr::swap(left, right, 1);
    // }

    // The goal is to generate cmov instructions here.
    let left_swap = if should_swap { right } else { left };
    let right_swap = if should_swap { left } else { right };

    let right_swap_tmp = ManuallyDrop::new(ptr::read(right_swap));

    ptr::copy(left_swap, left, 1);
    ptr::copy_nonoverlapping(&*right_swap_tmp, right, 1);
}

/// Swap two values in the slice pointed to by `v_base` at the position `a_pos` and `b_pos` if the
/// value at position `b_pos` is less than the one at position `a_pos`.
#[inline(always)]
unsafe fn swap_if_less<T, F>(v_base: *mut T, a_pos: usize, b_pos: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    // SAFETY: the caller must guarantee that `a_pos` and `b_pos` each added to `v_base` yield
    // valid pointers into `v_base`, and are properly aligned, and part of the same allocation.
    let v_a = v_base.add(a_pos);
    let v_b = v_base.add(b_pos);

    // PANIC SAFETY: if is_less panics, nothing was moved yet and the slice is untouched.

    // Important to only swap if it is more and not if it is equal. is_less should return false for
    // equal, so we don't swap.
    let should_swap = is_less(&*v_b, &*v_a);
    branchless_swap(v_a, v_b, should_swap);
}

unsafe fn sort3_optimal<T, F>(v_base: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    swap_if_less(v_base, 1, 2, is_less);
    swap_if_less(v_base, 0, 2, is_less);
    swap_if_less(v_base, 0, 1, is_less);
}

unsafe fn sort4_optimal<T, F>(v_base: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    swap_if_less(v_base, 0, 1, is_less);
    swap_if_less(v_base, 2, 3, is_less);
    swap_if_less(v_base, 0, 2, is_less);
    swap_if_less(v_base, 1, 3, is_less);
    swap_if_less(v_base, 1, 2, is_less);
}

unsafe fn sort5_optimal<T, F>(v_base: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    swap_if_less(v_base, 0, 1, is_less);
    swap_if_less(v_base, 3, 4, is_less);
    swap_if_less(v_base, 2, 4, is_less);
    swap_if_less(v_base, 2, 3, is_less);
    swap_if_less(v_base, 0, 3, is_less);
    swap_if_less(v_base, 1, 4, is_less);
    swap_if_less(v_base, 0, 2, is_less);
    swap_if_less(v_base, 1, 3, is_less);
    swap_if_less(v_base, 1, 2, is_less);
}

unsafe fn sort6_optimal<T, F>(v_base: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    swap_if_less(v_base, 1, 2, is_less);
    swap_if_less(v_base, 4, 5, is_less);
    swap_if_less(v_base, 0, 2, is_less);
    swap_if_less(v_base, 3, 5, is_less);
    swap_if_less(v_base, 0, 1, is_less);
    swap_if_less(v_base, 3, 4, is_less);
    swap_if_less(v_base, 0, 3, is_less);
    swap_if_less(v_base, 1, 4, is_less);
    swap_if_less(v_base, 2, 5, is_less);
    swap_if_less(v_base, 2, 4, is_less);
    swap_if_less(v_base, 1, 3, is_less);
    swap_if_less(v_base, 2, 3, is_less);
}

unsafe fn sort7_optimal<T, F>(v_base: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    swap_if_less(v_base, 1, 2, is_less);
    swap_if_less(v_base, 3, 4, is_less);
    swap_if_less(v_base, 5, 6, is_less);
    swap_if_less(v_base, 0, 2, is_less);
    swap_if_less(v_base, 3, 5, is_less);
    swap_if_less(v_base, 4, 6, is_less);
    swap_if_less(v_base, 0, 1, is_less);
    swap_if_less(v_base, 4, 5, is_less);
    swap_if_less(v_base, 0, 4, is_less);
    swap_if_less(v_base, 1, 5, is_less);
    swap_if_less(v_base, 2, 6, is_less);
    swap_if_less(v_base, 0, 3, is_less);
    swap_if_less(v_base, 2, 5, is_less);
    swap_if_less(v_base, 1, 3, is_less);
    swap_if_less(v_base, 2, 4, is_less);
    swap_if_less(v_base, 2, 3, is_less);
}

unsafe fn sort8_optimal<T, F>(v_base: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    swap_if_less(v_base, 0, 1, is_less);
    swap_if_less(v_base, 2, 3, is_less);
    swap_if_less(v_base, 4, 5, is_less);
    swap_if_less(v_base, 6, 7, is_less);
    swap_if_less(v_base, 0, 2, is_less);
    swap_if_less(v_base, 1, 3, is_less);
    swap_if_less(v_base, 4, 6, is_less);
    swap_if_less(v_base, 5, 7, is_less);
    swap_if_less(v_base, 1, 2, is_less);
    swap_if_less(v_base, 5, 6, is_less);
    swap_if_less(v_base, 0, 4, is_less);
    swap_if_less(v_base, 1, 5, is_less);
    swap_if_less(v_base, 2, 6, is_less);
    swap_if_less(v_base, 3, 7, is_less);
    swap_if_less(v_base, 1, 4, is_less);
    swap_if_less(v_base, 3, 6, is_less);
    swap_if_less(v_base, 2, 4, is_less);
    swap_if_less(v_base, 3, 5, is_less);
    swap_if_less(v_base, 3, 4, is_less);
}

/// Sorts up to 8 elements with the optimal network for the exact length.
///
/// Optimal sorting networks see: https://bertdobbelaere.github.io/sorting_networks.html.
fn sort_up_to_8<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    assert!(len <= BATCH);

    let v_base = v.as_mut_ptr();

    // SAFETY: We checked the len, every network only touches indices below it.
    unsafe {
        match len {
            2 => swap_if_less(v_base, 0, 1, is_less),
            3 => sort3_optimal(v_base, is_less),
            4 => sort4_optimal(v_base, is_less),
            5 => sort5_optimal(v_base, is_less),
            6 => sort6_optimal(v_base, is_less),
            7 => sort7_optimal(v_base, is_less),
            8 => sort8_optimal(v_base, is_less),
            _ => {}
        }
    }
}

/// Sorts blocks of 8 alternating ascending and descending, so that every 16 elements form a
/// bitonic sequence. A trailing partial block is sorted descending if it follows an ascending
/// block and ascending otherwise.
fn enforce_order<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    let mut i = 0;

    while len - i >= BITONIC_BATCH {
        sort_up_to_8(&mut v[i..i + BATCH], is_less);
        sort_up_to_8(&mut v[i + BATCH..i + BITONIC_BATCH], &mut |a: &T, b: &T| {
            is_less(b, a)
        });
        i += BITONIC_BATCH;
    }

    if len - i >= BATCH {
        sort_up_to_8(&mut v[i..i + BATCH], is_less);
        sort_up_to_8(&mut v[i + BATCH..], &mut |a: &T, b: &T| is_less(b, a));
    } else {
        sort_up_to_8(&mut v[i..], is_less);
    }
}

/// Merges the bitonic sequence `src[..len]` into ascending order at `dst[..len]`.
///
/// Each step takes the lesser of the two ends, so both read pointers meet after `len - 1` steps
/// no matter what `is_less` returns.
///
/// SAFETY: `src` valid for `len` reads, `dst` valid for `len` writes, no overlap, `len > 0`.
unsafe fn merge_forward<T, F>(src: *const T, len: usize, dst: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    debug_assert!(len > 0);

    let mut left = src;
    let mut right = src.add(len - 1);
    let mut dst = dst;

    for _ in 1..len {
        let take_left = is_less(&*left, &*right);
        let from = if take_left { left } else { right };
        ptr::copy_nonoverlapping(from, dst, 1);
        left = left.add(take_left as usize);
        right = right.sub(!take_left as usize);
        dst = dst.add(1);
    }

    ptr::copy_nonoverlapping(left, dst, 1);
}

/// Like `merge_forward` but fills `dst[..len]` from the back, producing descending order.
///
/// SAFETY: see `merge_forward`.
unsafe fn merge_backward<T, F>(src: *const T, len: usize, dst: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    debug_assert!(len > 0);

    let mut left = src;
    let mut right = src.add(len - 1);
    let mut dst = dst.add(len - 1);

    for _ in 1..len {
        let take_left = is_less(&*left, &*right);
        let from = if take_left { left } else { right };
        ptr::copy_nonoverlapping(from, dst, 1);
        left = left.add(take_left as usize);
        right = right.sub(!take_left as usize);
        dst = dst.sub(1);
    }

    ptr::copy_nonoverlapping(left, dst, 1);
}

fn small_sort_network<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    // This implementation is tuned to be efficient for integer types.

    let len = v.len();

    if len <= BATCH {
        sort_up_to_8(v, is_less);
        return;
    }

    assert!(len <= SMALL_SORT_NETWORK_SCRATCH_LEN && len <= Scratch::<T>::CAPACITY);

    enforce_order(v, is_less);

    let mut scratch = Scratch::<T>::new();
    let scratch_base = scratch.as_mut_ptr();
    let v_base = v.as_mut_ptr();

    // SAFETY: scratch has room for `len` elements and doesn't alias `v`. As long as the merges
    // only read from `v`, `v` holds every element exactly once, so a panic in the first merges
    // needs no cleanup. The final merge writes into `v` and is guarded by copying the scratch
    // back, which holds every element exactly once at that point.
    unsafe {
        if len <= BITONIC_BATCH {
            merge_forward(v_base, len, scratch_base, is_less);
            ptr::copy_nonoverlapping(scratch_base, v_base, len);
        } else {
            merge_forward(v_base, BITONIC_BATCH, scratch_base, is_less);
            merge_backward(
                v_base.add(BITONIC_BATCH),
                len - BITONIC_BATCH,
                scratch_base.add(BITONIC_BATCH),
                is_less,
            );

            let guard = CopyOnDrop {
                src: scratch_base,
                dst: v_base,
                len,
            };
            merge_forward(scratch_base, len, v_base, is_less);
            mem::forget(guard);
        }
    }
}

// --- Stable merge based ---

/// Stable merge of `src[..mid]` and `src[mid..len]` into `dst[..len]`.
///
/// Every element is copied after its last comparison, so `dst` reflects anything `is_less`
/// observed.
///
/// SAFETY: `src` valid for `len` reads, `dst` valid for `len` writes, no overlap, `mid <= len`.
unsafe fn merge_move<T, F>(src: *const T, mid: usize, len: usize, dst: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let mut left = src;
    let left_end = src.add(mid);
    let mut right = left_end;
    let right_end = src.add(len);
    let mut dst = dst;

    while left < left_end && right < right_end {
        let take_right = is_less(&*right, &*left);
        let from = if take_right { right } else { left };
        ptr::copy_nonoverlapping(from, dst, 1);
        right = right.add(take_right as usize);
        left = left.add(!take_right as usize);
        dst = dst.add(1);
    }

    let left_rem = left_end.offset_from(left) as usize;
    ptr::copy_nonoverlapping(left, dst, left_rem);
    dst = dst.add(left_rem);

    let right_rem = right_end.offset_from(right) as usize;
    ptr::copy_nonoverlapping(right, dst, right_rem);
}

/// SAFETY: The caller MUST guarantee that `v_base` is valid for 4 reads and `dst` is valid
/// for 4 writes. The result will be stored in `dst[0..4]`.
unsafe fn sort4_stable<T, F>(v_base: *const T, dst: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    // By limiting select to picking pointers, we are guaranteed good cmov code-gen regardless of
    // type T layout. Further this only does 5 instead of 6 comparisons compared to a stable
    // transposition 4 element sorting-network. Also by only operating on pointers, we get optimal
    // element copy usage. Doing exactly 1 copy per element.

    // Stably create two pairs a <= b and c <= d.
    let c1 = is_less(&*v_base.add(1), &*v_base);
    let c2 = is_less(&*v_base.add(3), &*v_base.add(2));
    let a = v_base.add(c1 as usize);
    let b = v_base.add(!c1 as usize);
    let c = v_base.add(2 + c2 as usize);
    let d = v_base.add(2 + (!c2 as usize));

    // Compare (a, c) and (b, d) to identify max/min. We're left with two
    // unknown elements, but because we are a stable sort we must know which
    // one is leftmost and which one is rightmost.
    // c3, c4 | min max unknown_left unknown_right
    //  0,  0 |  a   d    b         c
    //  0,  1 |  a   b    c         d
    //  1,  0 |  c   d    a         b
    //  1,  1 |  c   b    a         d
    let c3 = is_less(&*c, &*a);
    let c4 = is_less(&*d, &*b);
    let min = select(c3, c, a);
    let max = select(c4, b, d);
    let unknown_left = select(c3, a, select(c4, c, b));
    let unknown_right = select(c4, d, select(c3, b, c));

    // Sort the last two unknown elements.
    let c5 = is_less(&*unknown_right, &*unknown_left);
    let lo = select(c5, unknown_right, unknown_left);
    let hi = select(c5, unknown_left, unknown_right);

    ptr::copy_nonoverlapping(min, dst, 1);
    ptr::copy_nonoverlapping(lo, dst.add(1), 1);
    ptr::copy_nonoverlapping(hi, dst.add(2), 1);
    ptr::copy_nonoverlapping(max, dst.add(3), 1);

    #[inline(always)]
    fn select<T>(cond: bool, if_true: *const T, if_false: *const T) -> *const T {
        if cond {
            if_true
        } else {
            if_false
        }
    }
}

/// SAFETY: The caller MUST guarantee that `v_base` is valid for 8 reads and writes, `scratch_base`
/// and `dst` MUST be valid for 8 writes. The result will be stored in `dst[0..8]`.
unsafe fn sort8_stable<T, F>(v_base: *mut T, scratch_base: *mut T, dst: *mut T, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    sort4_stable(v_base, scratch_base, is_less);
    sort4_stable(v_base.add(4), scratch_base.add(4), is_less);

    // The merge compares the copies in `scratch_base`, those are the ones that have to survive
    // should `is_less` panic.
    let guard = CopyOnDrop {
        src: scratch_base,
        dst: v_base,
        len: 8,
    };
    merge_move(scratch_base, 4, 8, dst, is_less);
    mem::forget(guard);
}

fn small_sort_general<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    // This implementation is tuned to be efficient for various types that are larger than u64.

    let len = v.len();

    if len < 2 {
        return;
    }

    assert!(len + 16 <= SMALL_SORT_GENERAL_SCRATCH_LEN && len + 16 <= Scratch::<T>::CAPACITY);

    let mut scratch = Scratch::<T>::new();
    let scratch_base = scratch.as_mut_ptr();
    let v_base = v.as_mut_ptr();
    let len_div_2 = len / 2;

    // SAFETY: scratch has room for `len + 16` elements and doesn't alias `v`. All offsets stay
    // below `len` for `v` and below `len + 16` for the scratch.
    unsafe {
        // Both halves are built in `scratch[..len]`. Each guard covers the part of its half that
        // lives in the scratch, those copies are the ones `is_less` has seen.
        let mut left_guard = CopyOnDrop {
            src: scratch_base,
            dst: v_base,
            len: 0,
        };
        let mut right_guard = CopyOnDrop {
            src: scratch_base.add(len_div_2),
            dst: v_base.add(len_div_2),
            len: 0,
        };

        let presorted_len = if mem::size_of::<T>() <= 16 && len >= 16 {
            sort8_stable(v_base, scratch_base.add(len), scratch_base, is_less);
            left_guard.len = 8;
            sort8_stable(
                v_base.add(len_div_2),
                scratch_base.add(len + 8),
                scratch_base.add(len_div_2),
                is_less,
            );
            right_guard.len = 8;

            8
        } else if len >= 8 {
            sort4_stable(v_base, scratch_base, is_less);
            left_guard.len = 4;
            sort4_stable(v_base.add(len_div_2), scratch_base.add(len_div_2), is_less);
            right_guard.len = 4;

            4
        } else {
            ptr::copy_nonoverlapping(v_base, scratch_base, 1);
            left_guard.len = 1;
            ptr::copy_nonoverlapping(v_base.add(len_div_2), scratch_base.add(len_div_2), 1);
            right_guard.len = 1;

            1
        };

        for (offset, desired_len, guard) in [
            (0, len_div_2, &mut left_guard),
            (len_div_2, len - len_div_2, &mut right_guard),
        ] {
            let src = v_base.add(offset);
            let dst = scratch_base.add(offset);

            for i in presorted_len..desired_len {
                ptr::copy_nonoverlapping(src.add(i), dst.add(i), 1);
                guard.len = i + 1;
                insert_tail(&mut *ptr::slice_from_raw_parts_mut(dst, i + 1), is_less);
            }
        }

        // `scratch[..len]` now holds both sorted halves, the guards cover all of it. It's faster
        // to merge directly into `v` and copy over the 'safe' elements of `scratch` into `v` only
        // if there was a panic.
        merge_move(scratch_base, len_div_2, len, v_base, is_less);

        mem::forget(left_guard);
        mem::forget(right_guard);
    }
}

// --- Insertion sort ---

/// Inserts `v[v.len() - 1]` into pre-sorted sequence `v[..v.len() - 1]` so that whole `v[..]`
/// becomes sorted.
pub(crate) fn insert_tail<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    assert!(v.len() >= 2);

    let v_base = v.as_mut_ptr();
    let i = v.len() - 1;

    // SAFETY: We checked that `v.len()` is at least 2.
    unsafe {
        let v_i = v_base.add(i);

        // It's important that we use v_i here. If this check is positive and we continue,
        // We want to make sure that no other copy of the value was seen by is_less.
        // Otherwise we would have to copy it back.
        if is_less(&*v_i, &*v_i.sub(1)) {
            // It's important, that we use tmp for comparison from now on. As it is the value that
            // will be copied back. And notionally we could have created a divergence if we copy
            // back the wrong value.
            // Intermediate state of the insertion process is always tracked by `gap`, which
            // serves two purposes:
            // 1. Protects integrity of `v` from panics in `is_less`.
            // 2. Fills the remaining gap in `v` in the end.
            //
            // Panic safety:
            //
            // If `is_less` panics at any point during the process, `gap` will get dropped and
            // fill the gap in `v` with `tmp`, thus ensuring that `v` still holds every object it
            // initially held exactly once.
            let mut gap = GapGuard {
                pos: v_i.sub(1),
                value: ManuallyDrop::new(ptr::read(v_i)),
            };
            ptr::copy_nonoverlapping(gap.pos, v_i, 1);

            // SAFETY: We know i is at least 1.
            for j in (0..(i - 1)).rev() {
                let v_j = v_base.add(j);
                if !is_less(&*gap.value, &*v_j) {
                    break;
                }

                ptr::copy_nonoverlapping(v_j, gap.pos, 1);
                gap.pos = v_j;
            }
            // `gap` gets dropped and thus copies `tmp` into the remaining gap in `v`.
        }
    }
}

/// Sort `v` assuming `v[..offset]` is already sorted.
pub(crate) fn insertion_sort_shift_left<T, F>(v: &mut [T], offset: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();

    // This would be a logic bug in other code.
    debug_assert!(offset != 0 && offset <= len);

    // Shift each element of the unsorted region v[i..] as far left as is needed to make v sorted.
    for i in offset..len {
        insert_tail(&mut v[..=i], is_less);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::panic::{self, AssertUnwindSafe};

    use rand::prelude::*;

    use crate::caps::{BuiltinOrder, CustomOrder};

    fn random_u32s(rng: &mut StdRng, len: usize, range: u32) -> Vec<u32> {
        (0..len).map(|_| rng.gen_range(0..range)).collect()
    }

    fn check_all_lens<S>(mut sort: S)
    where
        S: FnMut(&mut [u32]),
    {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for len in 0..=32 {
            for range in [2, 8, u32::MAX] {
                for _ in 0..50 {
                    let mut v = random_u32s(&mut rng, len, range);
                    let mut expected = v.clone();
                    expected.sort();

                    sort(&mut v);
                    assert_eq!(v, expected, "len: {len}");
                }
            }
        }
    }

    #[test]
    fn networks_zero_one_exhaustive() {
        // A comparator network sorts all inputs iff it sorts all 0-1 inputs.
        for len in 0..=BATCH {
            for bits in 0u32..(1 << len) {
                let mut v: Vec<u8> = (0..len).map(|i| ((bits >> i) & 1) as u8).collect();
                sort_up_to_8(&mut v, &mut |a, b| a < b);
                assert!(v.windows(2).all(|w| w[0] <= w[1]), "len: {len} bits: {bits:b}");
            }
        }
    }

    #[test]
    fn enforce_order_is_bitonic() {
        let mut v: Vec<u32> = (0..27).rev().collect();
        enforce_order(&mut v, &mut |a, b| a < b);

        assert!(v[0..8].windows(2).all(|w| w[0] <= w[1]));
        assert!(v[8..16].windows(2).all(|w| w[0] >= w[1]));
        assert!(v[16..24].windows(2).all(|w| w[0] <= w[1]));
        assert!(v[24..27].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn network() {
        check_all_lens(|v| small_sort_network(v, &mut |a, b| a < b));
    }

    #[test]
    fn general() {
        check_all_lens(|v| small_sort_general(v, &mut |a, b| a < b));

        let mut rng = StdRng::seed_from_u64(7);
        for len in 0..=32 {
            let mut v: Vec<String> = random_u32s(&mut rng, len, 100)
                .into_iter()
                .map(|x| x.to_string())
                .collect();
            let mut expected = v.clone();
            expected.sort();

            small_sort_general(&mut v, &mut |a, b| a < b);
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn insertion() {
        check_all_lens(|v| small_sort::<_, _, CustomOrder>(v, &mut |a, b| a < b));
        check_all_lens(|v| {
            if v.len() >= 2 {
                insertion_sort_shift_left(v, 1, &mut |a, b| a < b);
            }
        });
    }

    #[test]
    fn dispatch() {
        check_all_lens(|v| small_sort::<_, _, BuiltinOrder>(v, &mut |a, b| a < b));

        let mut v = vec![[5u8; 200], [1u8; 200], [3u8; 200]];
        small_sort::<_, _, CustomOrder>(&mut v, &mut |a, b| a < b);
        assert_eq!(v, [[1u8; 200], [3u8; 200], [5u8; 200]]);
    }

    #[test]
    fn general_panic_keeps_elements() {
        let mut rng = StdRng::seed_from_u64(99);

        for len in [2, 7, 8, 15, 16, 25, 32] {
            for panic_after in [0, 1, 5, 20, 60, 120] {
                let original: Vec<String> = random_u32s(&mut rng, len, 1000)
                    .into_iter()
                    .map(|x| format!("{x:04}"))
                    .collect();
                let mut v = original.clone();
                let mut count = 0;

                let res = panic::catch_unwind(AssertUnwindSafe(|| {
                    small_sort_general(&mut v, &mut |a: &String, b: &String| {
                        count += 1;
                        if count > panic_after {
                            panic!("comparison limit");
                        }
                        a < b
                    });
                }));

                let mut expected = original.clone();
                expected.sort();
                v.sort();
                assert_eq!(v, expected, "len: {len} res: {}", res.is_ok());
            }
        }
    }

    #[test]
    fn network_panic_keeps_elements() {
        let mut rng = StdRng::seed_from_u64(3);

        for len in [9, 16, 17, 32] {
            for panic_after in [0, 10, 40, 70, 100] {
                let original = random_u32s(&mut rng, len, u32::MAX);
                let mut v = original.clone();
                let mut count = 0;

                let _ = panic::catch_unwind(AssertUnwindSafe(|| {
                    small_sort_network(&mut v, &mut |a: &u32, b: &u32| {
                        count += 1;
                        if count > panic_after {
                            panic!("comparison limit");
                        }
                        a < b
                    });
                }));

                let mut expected = original.clone();
                expected.sort();
                v.sort();
                assert_eq!(v, expected);
            }
        }
    }
}
