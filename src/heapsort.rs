//! Heapsort, the worst-case fallback of the quicksort loop.

use core::cmp;
use core::mem::ManuallyDrop;
use core::ptr;

use crate::scratch::GapGuard;

/// Sorts `v` using heapsort, which guarantees *O*(*n* \* log(*n*)) worst-case.
///
/// Never inline this, it sits in the main hot-loop of the quicksort and is meant as unlikely
/// algorithmic fallback.
#[inline(never)]
pub(crate) fn heapsort<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();

    // A single loop does both phases. For `i >= len` it builds the heap bottom-up, starting at
    // node `len / 2`. For `i < len` it moves the current maximum to `v[i]` and restores the heap
    // in `v[..i]`.
    for i in (1..=len + len / 2).rev() {
        let sift_idx = if i >= len {
            i - len
        } else {
            v.swap(0, i);
            0
        };

        // `sift_idx` is either 0 or in `0..=len / 2`, which is always below `min(i, len)`.
        sift_down(&mut v[..cmp::min(i, len)], sift_idx, is_less);
    }
}

// This binary heap respects the invariant `parent >= child`.
//
// The element at `node` is moved into a gap guard and the gap travels down towards the leaves, so
// every level costs one copy instead of a swap.
fn sift_down<T, F>(v: &mut [T], mut node: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    assert!(node < len);

    let v_base = v.as_mut_ptr();

    // SAFETY: `node` and every `child` used below are checked to be in-bounds. The gap guard
    // always points at the slot whose content has been copied elsewhere, and writes the sifted
    // element back into it when dropped, also if `is_less` panics.
    unsafe {
        let mut gap = GapGuard {
            pos: v_base.add(node),
            value: ManuallyDrop::new(ptr::read(v_base.add(node))),
        };

        loop {
            // Children of `node`.
            let mut child = 2 * node + 1;
            if child >= len {
                break;
            }

            // Choose the greater child. The branch only guards the bounds and is highly
            // predictable, the comparison itself is branchless.
            if child + 1 < len {
                child += is_less(&*v_base.add(child), &*v_base.add(child + 1)) as usize;
            }

            // Stop if the invariant holds at `node`.
            if !is_less(&*gap.value, &*v_base.add(child)) {
                break;
            }

            ptr::copy_nonoverlapping(v_base.add(child), gap.pos, 1);
            gap.pos = v_base.add(child);
            node = child;
        }

        // `gap` gets dropped and writes the sifted element into its final position.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::panic::{self, AssertUnwindSafe};

    use rand::prelude::*;

    #[test]
    fn sorts() {
        let mut rng = StdRng::seed_from_u64(42);

        for len in (0..70).chain([255, 256, 1000, 4097]) {
            for range in [1, 3, 100, u32::MAX] {
                let mut v: Vec<u32> = (0..len).map(|_| rng.gen_range(0..range)).collect();
                let mut expected = v.clone();
                expected.sort();

                heapsort(&mut v, &mut |a, b| a < b);
                assert_eq!(v, expected);
            }
        }
    }

    #[test]
    fn comparisons_bounded() {
        for len in [100usize, 1000, 10_000] {
            let mut v: Vec<usize> = (0..len).rev().collect();
            let mut comparisons = 0usize;

            heapsort(&mut v, &mut |a, b| {
                comparisons += 1;
                a < b
            });

            assert!(v.windows(2).all(|w| w[0] <= w[1]));
            let log2 = (usize::BITS - len.leading_zeros()) as usize;
            assert!(comparisons <= 3 * len * log2, "len: {len} comparisons: {comparisons}");
        }
    }

    #[test]
    fn panic_keeps_elements() {
        let original: Vec<String> = (0..100).map(|x| format!("{}", (x * 37) % 100)).collect();

        for panic_after in [0, 10, 100, 400] {
            let mut v = original.clone();
            let mut count = 0;

            let res = panic::catch_unwind(AssertUnwindSafe(|| {
                heapsort(&mut v, &mut |a: &String, b: &String| {
                    count += 1;
                    if count > panic_after {
                        panic!("comparison limit");
                    }
                    a < b
                });
            }));

            assert!(res.is_err());

            let mut expected = original.clone();
            expected.sort();
            v.sort();
            assert_eq!(v, expected);
        }
    }
}
