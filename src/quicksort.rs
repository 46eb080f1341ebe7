use crate::caps::{CustomOrder, OrderKind};
use crate::heapsort::heapsort;
use crate::partition::partition;
use crate::pivot::choose_pivot;
use crate::smallsort::small_sort;

/// Slices up to this length are handed to the small-sort.
pub(crate) const SMALL_SORT_THRESHOLD: usize = 32;

/// Sorts `v` recursively.
///
/// If the slice had a predecessor in the original array, it is specified as `ancestor_pivot`.
///
/// `limit` is the number of allowed imbalanced partitions before switching to `heapsort`. If zero,
/// this function will immediately switch to heapsort.
pub(crate) fn quicksort<'a, T, F, O>(
    mut v: &'a mut [T],
    mut ancestor_pivot: Option<&'a T>,
    mut limit: u32,
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
    O: OrderKind,
{
    loop {
        if v.len() <= SMALL_SORT_THRESHOLD {
            small_sort::<T, F, O>(v, is_less);
            return;
        }

        // If too many bad pivot choices were made, simply fall back to heapsort in order to
        // guarantee `O(n * log(n))` worst-case.
        if limit == 0 {
            heapsort(v, is_less);
            return;
        }

        limit -= 1;

        // Choose a pivot, an approximate median of a sample that grows with the slice.
        let pivot_pos = choose_pivot(v, is_less);

        // If the chosen pivot is equal to the predecessor, then it's the smallest element in the
        // slice. Partition the slice into elements equal to and elements greater than the pivot.
        // This case is usually hit when the slice contains many duplicate elements.
        if let Some(p) = ancestor_pivot {
            if !is_less(p, &v[pivot_pos]) {
                // The reversed predicate is never a built-in order, this always takes the branchy
                // partition.
                let mid = partition::<T, _, CustomOrder>(v, pivot_pos, &mut |a, b| !is_less(b, a));

                // Continue sorting elements greater than the pivot. We know that mid contains the
                // pivot. So we can continue after mid.
                v = &mut v[(mid + 1)..];
                ancestor_pivot = None;
                continue;
            }
        }

        // Partition the slice.
        let mid = partition::<T, F, O>(v, pivot_pos, is_less);

        // Split the slice into `left`, `pivot`, and `right`.
        let (left, right) = v.split_at_mut(mid);
        let (pivot, right) = right.split_at_mut(1);
        let pivot = &pivot[0];

        // Recurse into the left side. We have a fixed recursion limit, testing shows no real
        // benefit for recursing into the shorter side.
        quicksort::<T, F, O>(left, ancestor_pivot, limit, is_less);

        // Continue with the right side.
        v = right;
        ancestor_pivot = Some(pivot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::prelude::*;

    use crate::bits::floor_log2;
    use crate::caps::BuiltinOrder;

    fn sort_counting<T: Ord, O: OrderKind>(v: &mut [T]) -> usize {
        let mut comparisons = 0;
        let limit = 2 * floor_log2(v.len());

        quicksort::<T, _, O>(v, None, limit, &mut |a, b| {
            comparisons += 1;
            a < b
        });

        comparisons
    }

    #[test]
    fn sorts_random() {
        let mut rng = StdRng::seed_from_u64(0x9e37_79b9);

        for len in [0, 1, 2, 31, 32, 33, 64, 100, 1000, 10_000] {
            for range in [2, 100, u64::MAX] {
                let original: Vec<u64> = (0..len).map(|_| rng.gen_range(0..range)).collect();
                let mut expected = original.clone();
                expected.sort();

                let mut v = original.clone();
                sort_counting::<_, BuiltinOrder>(&mut v);
                assert_eq!(v, expected);

                let mut v = original.clone();
                sort_counting::<_, CustomOrder>(&mut v);
                assert_eq!(v, expected);
            }
        }
    }

    #[test]
    fn equal_elements_linear() {
        // All elements equal: after the first partition every pivot equals its ancestor, and the
        // equal partition consumes the rest of the slice in a single step.
        for len in [100, 1000, 100_000] {
            let mut v = vec![7u32; len];
            let comparisons = sort_counting::<_, BuiltinOrder>(&mut v);
            assert!(comparisons < 4 * len, "len: {len} comparisons: {comparisons}");

            let mut v = vec![String::from("same"); len];
            let comparisons = sort_counting::<_, CustomOrder>(&mut v);
            assert!(comparisons < 4 * len, "len: {len} comparisons: {comparisons}");
        }
    }

    #[test]
    fn zero_limit_uses_heapsort() {
        let mut v: Vec<i32> = (0..500).rev().collect();
        quicksort::<_, _, BuiltinOrder>(&mut v, None, 0, &mut |a, b| a < b);
        assert!(v.windows(2).all(|w| w[0] <= w[1]));
    }
}
