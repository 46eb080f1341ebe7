//! Partitioning around a pivot.
//!
//! Two strategies are available. Small plain types under the built-in order use the branchless
//! block bitset partition, everything else uses the branchy cyclic Hoare partition which keeps
//! the number of comparisons and element moves low.

mod bitset;
mod hoare_branchy_cyclic;

use crate::caps::{Capability, OrderKind};

/// Takes the input slice `v` and re-arranges elements such that when the call returns normally
/// all elements that compare true for `is_less(elem, pivot)` where `pivot == v[pivot_pos]` are
/// on the left side of `v`, followed by the pivot, followed by the other elements, notionally
/// considered greater or equal to `pivot`.
///
/// Returns the final position of the pivot, which is the number of elements that compared true
/// for `is_less(elem, pivot)`.
///
/// If `is_less` does not implement a total order the resulting order and return value are
/// unspecified. All original elements will remain in `v` and any possible modifications via
/// interior mutability will be observable. Same is true if `is_less` panics.
pub(crate) fn partition<T, F, O>(v: &mut [T], pivot_pos: usize, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
    O: OrderKind,
{
    let len = v.len();

    if len == 0 {
        return 0;
    }

    assert!(pivot_pos < len);

    // Place the pivot at the beginning of slice.
    v.swap(0, pivot_pos);
    let (pivot, v_without_pivot) = v.split_at_mut(1);

    // A signature of the form `(v: &mut [T], pivot: &T)` guarantees that pivot and v can't alias.
    // Copying the pivot into a stack value instead would need a drop guard for types with
    // interior mutability.
    let pivot = &pivot[0];

    let num_lt = if Capability::<T, O>::BRANCHLESS_PARTITION {
        bitset::partition(v_without_pivot, pivot, is_less)
    } else {
        hoare_branchy_cyclic::partition(v_without_pivot, pivot, is_less)
    };

    debug_assert!(num_lt < len);

    // Place the pivot between the two partitions.
    v.swap(0, num_lt);

    num_lt
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::prelude::*;

    use crate::caps::{BuiltinOrder, CustomOrder};

    /// Checks the partition contract for `v` after partitioning around the element that ended up
    /// at `mid`.
    fn assert_partitioned<T: Ord + std::fmt::Debug>(v: &[T], mid: usize) {
        let pivot = &v[mid];

        assert!(v[..mid].iter().all(|x| x < pivot), "left side {v:?} mid: {mid}");
        assert!(v[mid + 1..].iter().all(|x| x >= pivot), "right side {v:?} mid: {mid}");
    }

    fn check_random<O: OrderKind>() {
        let mut rng = StdRng::seed_from_u64(0xdead_beef);

        for len in (1..300).chain([511, 1000, 4096]) {
            for range in [2, 16, u64::MAX] {
                let mut v: Vec<u64> = (0..len).map(|_| rng.gen_range(0..range)).collect();
                let mut expected = v.clone();
                expected.sort();

                let pivot_pos = rng.gen_range(0..len);
                let pivot = v[pivot_pos];
                let mid = partition::<_, _, O>(&mut v, pivot_pos, &mut |a, b| a < b);

                assert_eq!(v[mid], pivot);
                assert_partitioned(&v, mid);

                v.sort();
                assert_eq!(v, expected);
            }
        }
    }

    #[test]
    fn bitset_random() {
        assert!(Capability::<u64, BuiltinOrder>::BRANCHLESS_PARTITION);
        check_random::<BuiltinOrder>();
    }

    #[test]
    fn branchy_random() {
        assert!(!Capability::<u64, CustomOrder>::BRANCHLESS_PARTITION);
        check_random::<CustomOrder>();
    }

    #[test]
    fn reversed_predicate_puts_equal_left() {
        let mut v = vec![3, 1, 3, 5, 3, 2, 7, 3, 9, 3];
        let mid = partition::<_, _, CustomOrder>(&mut v, 0, &mut |a: &i32, b: &i32| !(b < a));

        assert_eq!(v[mid], 3);
        assert!(v[..mid].iter().all(|&x| x <= 3));
        assert!(v[mid + 1..].iter().all(|&x| x > 3));
        assert_eq!(mid, 6);
    }

    #[test]
    fn already_partitioned() {
        for strategy_is_bitset in [false, true] {
            let mut v: Vec<i32> = (0..500).collect();
            let mid = if strategy_is_bitset {
                partition::<_, _, BuiltinOrder>(&mut v, 250, &mut |a, b| a < b)
            } else {
                partition::<_, _, CustomOrder>(&mut v, 250, &mut |a, b| a < b)
            };

            assert_eq!(mid, 250);
            assert_partitioned(&v, mid);
        }
    }

    #[test]
    fn inconsistent_comparator() {
        let mut rng = StdRng::seed_from_u64(11);

        for len in [2, 33, 100, 257, 1000] {
            let mut v: Vec<u32> = (0..len).collect();
            let mut expected = v.clone();

            let mut coin = StdRng::seed_from_u64(len as u64);
            let pivot_pos = rng.gen_range(0..len as usize);
            partition::<_, _, BuiltinOrder>(&mut v, pivot_pos, &mut |_, _| coin.gen());
            partition::<_, _, CustomOrder>(&mut v, pivot_pos, &mut |_, _| coin.gen());

            v.sort();
            expected.sort();
            assert_eq!(v, expected);
        }
    }
}
