//! Block partition that records comparison outcomes in 64 bit sets, inspired by Bitset Sort
//! https://github.com/minjaehwang/bitsetsort.
//!
//! Filling a bitset is free of branches that depend on `is_less`, which makes it a good fit for
//! small types under a cheap comparison. The swapping itself is panic-free.

use core::mem::ManuallyDrop;
use core::ptr;

use crate::bits::{clear_lowest_bit, count_trailing_zeros, highest_bit_index};

/// Elements per bitset block.
pub(crate) const BLOCK_SIZE: usize = u64::BITS as usize;

/// Scan elements `base_ptr[..block_len]` and build a bitset that has bit `i` set if
/// `is_swap_elem(base_ptr[i])`.
///
/// SAFETY: The caller must ensure that `base_ptr[..block_len]` is valid to read.
#[inline(always)]
unsafe fn fill_left_bitset<T>(
    block_len: usize,
    base_ptr: *const T,
    is_swap_elem: &mut impl FnMut(&T) -> bool,
) -> u64 {
    debug_assert!(block_len <= BLOCK_SIZE);

    let mut bitset = 0u64;

    for i in 0..block_len {
        let is_se = is_swap_elem(&*base_ptr.add(i));
        bitset |= (is_se as u64) << i;
    }

    bitset
}

/// Like `fill_left_bitset` but walking down from `last_ptr`, bit `i` describes `last_ptr - i`.
///
/// SAFETY: The caller must ensure that `last_ptr - (block_len - 1)..=last_ptr` is valid to read.
#[inline(always)]
unsafe fn fill_right_bitset<T>(
    block_len: usize,
    last_ptr: *const T,
    is_swap_elem: &mut impl FnMut(&T) -> bool,
) -> u64 {
    debug_assert!(block_len <= BLOCK_SIZE);

    let mut bitset = 0u64;

    for i in 0..block_len {
        let is_se = is_swap_elem(&*last_ptr.sub(i));
        bitset |= (is_se as u64) << i;
    }

    bitset
}

/// Swaps as many marked elements between the left block starting at `l_ptr` and the right block
/// ending at `r_last_ptr` as have a partner on the other side. Returns the updated bitsets, at
/// least one of them is zero.
///
/// SAFETY: The caller must ensure that each `l_ptr + i` and `r_last_ptr - i` for a set bit `i`
/// is valid to read and write, and that the two blocks don't overlap.
#[inline(always)]
unsafe fn swap_between_blocks<T>(
    l_ptr: *mut T,
    r_last_ptr: *mut T,
    mut l_bitmap: u64,
    mut r_bitmap: u64,
) -> (u64, u64) {
    // Instead of swapping one pair at the time, it is more efficient to perform a cyclic
    // permutation. This is not strictly equivalent to swapping, but produces a similar
    // result using fewer memory operations.
    //
    // Example cyclic permutation to swap A,B,C,D with W,X,Y,Z
    //
    // A -> TMP
    // Z -> A   | Z,B,C,D ___ W,X,Y,Z
    //
    // Loop iter 1
    // B -> Z   | Z,B,C,D ___ W,X,Y,B
    // Y -> B   | Z,Y,C,D ___ W,X,Y,B
    //
    // Loop iter 2
    // C -> Y   | Z,Y,C,D ___ W,X,C,B
    // X -> C   | Z,Y,X,D ___ W,X,C,B
    //
    // Loop iter 3
    // D -> X   | Z,Y,X,D ___ W,D,C,B
    // W -> D   | Z,Y,X,W ___ W,D,C,B
    //
    // TMP -> W | Z,Y,X,W ___ A,D,C,B
    if l_bitmap == 0 || r_bitmap == 0 {
        return (l_bitmap, r_bitmap);
    }

    let left = |l_bitmap: &mut u64| {
        let l_idx = count_trailing_zeros(*l_bitmap);
        *l_bitmap = clear_lowest_bit(*l_bitmap);
        l_ptr.add(l_idx)
    };

    let right = |r_bitmap: &mut u64| {
        let r_idx = count_trailing_zeros(*r_bitmap);
        *r_bitmap = clear_lowest_bit(*r_bitmap);
        r_last_ptr.sub(r_idx)
    };

    // The following code is panic-free, the temporary can't be observed.
    let mut left_ptr = left(&mut l_bitmap);
    let mut right_ptr = right(&mut r_bitmap);

    let tmp = ManuallyDrop::new(ptr::read(left_ptr));
    ptr::copy_nonoverlapping(right_ptr, left_ptr, 1);

    while l_bitmap != 0 && r_bitmap != 0 {
        left_ptr = left(&mut l_bitmap);
        ptr::copy_nonoverlapping(left_ptr, right_ptr, 1);
        right_ptr = right(&mut r_bitmap);
        ptr::copy_nonoverlapping(right_ptr, left_ptr, 1);
    }

    ptr::copy_nonoverlapping(&*tmp, right_ptr, 1);

    (l_bitmap, r_bitmap)
}

/// Partitions `v` into the elements less than `pivot` followed by the rest. Returns the number of
/// elements less than `pivot`.
pub(super) fn partition<T, F>(v: &mut [T], pivot: &T, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();

    // lt == less than, ge == greater or equal
    let mut l = 0;
    while l < len && is_less(&v[l], pivot) {
        l += 1;
    }

    let mut r = len;
    while l < r && !is_less(&v[r - 1], pivot) {
        r -= 1;
    }

    // Already partitioned. The second condition can only be hit by an inconsistent `is_less`.
    if r - l < 2 {
        return l;
    }

    // Swap the first pair found above. From here on `re` is the exclusive end of the unpartitioned
    // window `l..re`, and `l >= 1`.
    v.swap(l, r - 1);
    l += 1;
    let mut re = r - 1;

    let arr_ptr = v.as_mut_ptr();

    // Bit `i` of `l_bitmap` marks a ge element at `l + i`, bit `i` of `r_bitmap` marks a lt
    // element at `re - 1 - i`.
    let mut l_bitmap = 0u64;
    let mut r_bitmap = 0u64;

    // SAFETY: All blocks lie within `l..re`, which is a sub-range of `v` at all times. The left
    // and right blocks never overlap, because the loop only runs while the window holds two full
    // blocks and the partial step splits the remaining window between both sides.
    unsafe {
        while re - l >= 2 * BLOCK_SIZE {
            if l_bitmap == 0 {
                l_bitmap =
                    fill_left_bitset(BLOCK_SIZE, arr_ptr.add(l), &mut |elem| !is_less(elem, pivot));
            }

            if r_bitmap == 0 {
                r_bitmap = fill_right_bitset(BLOCK_SIZE, arr_ptr.add(re - 1), &mut |elem| {
                    is_less(elem, pivot)
                });
            }

            (l_bitmap, r_bitmap) =
                swap_between_blocks(arr_ptr.add(l), arr_ptr.add(re - 1), l_bitmap, r_bitmap);

            l += (l_bitmap == 0) as usize * BLOCK_SIZE;
            re -= (r_bitmap == 0) as usize * BLOCK_SIZE;
        }

        // Now, there is less than a block worth of elements on at least one of the sides. A
        // side that still has an unfinished bitset keeps its full block.
        let remaining_len = re - l;
        let (l_size, r_size) = if l_bitmap == 0 && r_bitmap == 0 {
            let l_size = remaining_len / 2;
            (l_size, remaining_len - l_size)
        } else if l_bitmap == 0 {
            debug_assert!(remaining_len >= BLOCK_SIZE);
            (remaining_len - BLOCK_SIZE, BLOCK_SIZE)
        } else {
            debug_assert!(remaining_len >= BLOCK_SIZE);
            (BLOCK_SIZE, remaining_len - BLOCK_SIZE)
        };

        if l_bitmap == 0 {
            l_bitmap = fill_left_bitset(l_size, arr_ptr.add(l), &mut |elem| !is_less(elem, pivot));
        }

        if r_bitmap == 0 {
            r_bitmap =
                fill_right_bitset(r_size, arr_ptr.add(re - 1), &mut |elem| is_less(elem, pivot));
        }

        (l_bitmap, r_bitmap) =
            swap_between_blocks(arr_ptr.add(l), arr_ptr.add(re - 1), l_bitmap, r_bitmap);

        l += (l_bitmap == 0) as usize * l_size;
        re -= (r_bitmap == 0) as usize * r_size;

        // At most one of the bitsets is non-empty, and its block is all that is left of the
        // window. Move its marked elements to the far end of the block, walking from the
        // highest bit down.
        if l_bitmap != 0 {
            debug_assert!(re - l == l_size);

            let mut lm1 = re - 1;
            while l_bitmap != 0 {
                let idx = highest_bit_index(l_bitmap);
                l_bitmap &= (1u64 << idx) - 1;
                ptr::swap(arr_ptr.add(l + idx), arr_ptr.add(lm1));
                lm1 -= 1;
            }

            l = lm1 + 1;
        } else if r_bitmap != 0 {
            debug_assert!(re - l == r_size);

            let r_last = re - 1;
            while r_bitmap != 0 {
                let idx = highest_bit_index(r_bitmap);
                r_bitmap &= (1u64 << idx) - 1;
                ptr::swap(arr_ptr.add(r_last - idx), arr_ptr.add(l));
                l += 1;
            }
        }
    }

    l
}
