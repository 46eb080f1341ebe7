//! bitsort, an in-place unstable comparison sort.
//!
//! Quicksort with an adaptive pseudo-median pivot, a branchless bitset block partition for small
//! plain types, sorting networks for small sub-slices, and a heapsort fallback that bounds the
//! worst case to *O*(*n* \* log(*n*)). A long presorted prefix is detected up front and merged
//! with the sorted remainder.

use core::cmp::Ordering;
use core::mem;

mod bits;
mod caps;
mod heapsort;
mod merge;
mod partition;
mod pivot;
mod quicksort;
mod scratch;
mod smallsort;

use crate::bits::floor_log2;
use crate::caps::{BuiltinOrder, CustomOrder, OrderKind};

/// Sorts the slice, but might not preserve the order of equal elements.
///
/// This sort is unstable (i.e., may reorder equal elements), in-place
/// (i.e., does not allocate), and *O*(*n* \* log(*n*)) worst-case.
///
/// # Current implementation
///
/// Quicksort whose pivot is a recursive median of three over a sample that grows with the slice.
/// Slices of small plain types such as integers are partitioned with a branchless block partition
/// and finished with sorting networks. Too many unbalanced partitions switch to heapsort.
///
/// If the slice starts with a non-descending or strictly descending run that covers at least half
/// of it, only the rest is sorted and then merged with the run. Fully sorted and fully reversed
/// slices take `len - 1` comparisons.
///
/// # Examples
///
/// ```
/// let mut v = [-5, 4, 1, -3, 2];
///
/// bitsort::sort(&mut v);
/// assert!(v == [-5, -3, 1, 2, 4]);
/// ```
#[inline]
pub fn sort<T>(v: &mut [T])
where
    T: Ord,
{
    bitsort::<T, _, BuiltinOrder>(v, &mut |a, b| a.lt(b));
}

/// Sorts the slice in descending order, but might not preserve the order of equal elements.
///
/// Same as [`sort`] with the reverse ordering, and unlike `sort_by(v, |a, b| b.cmp(a))` it keeps
/// the fast paths for small plain types.
///
/// # Examples
///
/// ```
/// let mut v = [-5, 4, 1, -3, 2];
///
/// bitsort::sort_descending(&mut v);
/// assert!(v == [4, 2, 1, -3, -5]);
/// ```
#[inline]
pub fn sort_descending<T>(v: &mut [T])
where
    T: Ord,
{
    bitsort::<T, _, BuiltinOrder>(v, &mut |a, b| b.lt(a));
}

/// Sorts the slice with a comparator function, but might not preserve the order of equal
/// elements.
///
/// This sort is unstable (i.e., may reorder equal elements), in-place
/// (i.e., does not allocate), and *O*(*n* \* log(*n*)) worst-case.
///
/// The comparator function must define a total ordering for the elements in the slice. If
/// the ordering is not total, the order of the elements is unspecified. An order is a
/// total order if it is (for all `a`, `b` and `c`):
///
/// * total and antisymmetric: exactly one of `a < b`, `a == b` or `a > b` is true, and
/// * transitive, `a < b` and `b < c` implies `a < c`. The same must hold for both `==` and `>`.
///
/// Even with an invalid ordering the sort terminates, and the slice still holds every element
/// exactly once. The same holds if `compare` panics.
///
/// # Examples
///
/// ```
/// let mut v = [5, 4, 1, 3, 2];
/// bitsort::sort_by(&mut v, |a, b| a.cmp(b));
/// assert!(v == [1, 2, 3, 4, 5]);
///
/// // reverse sorting
/// bitsort::sort_by(&mut v, |a, b| b.cmp(a));
/// assert!(v == [5, 4, 3, 2, 1]);
/// ```
#[inline]
pub fn sort_by<T, F>(v: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    bitsort::<T, _, CustomOrder>(v, &mut |a, b| compare(a, b) == Ordering::Less);
}

/// Sorts the slice with a key extraction function, but might not preserve the order of equal
/// elements.
///
/// The key function is called for both sides of every comparison, keys are not cached.
///
/// # Examples
///
/// ```
/// let mut v = [-5i32, 4, 1, -3, 2];
///
/// bitsort::sort_by_key(&mut v, |k| k.abs());
/// assert!(v == [1, 2, -3, 4, -5]);
/// ```
#[inline]
pub fn sort_by_key<T, K, F>(v: &mut [T], mut f: F)
where
    F: FnMut(&T) -> K,
    K: Ord,
{
    bitsort::<T, _, CustomOrder>(v, &mut |a, b| f(a).lt(&f(b)));
}

/// Sorts the slice with a strict less-than predicate, but might not preserve the order of equal
/// elements.
///
/// `is_less(a, b)` must return `true` if and only if `a` is ordered before `b`. The requirements
/// on the ordering are the same as for [`sort_by`].
///
/// # Examples
///
/// ```
/// let mut v = [5.0f64, 4.0, 1.0, 3.0, 2.0];
///
/// bitsort::sort_by_less(&mut v, |a, b| a < b);
/// assert!(v == [1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
#[inline]
pub fn sort_by_less<T, F>(v: &mut [T], mut is_less: F)
where
    F: FnMut(&T, &T) -> bool,
{
    bitsort::<T, _, CustomOrder>(v, &mut is_less);
}

// --- IMPL ---

#[inline(never)]
fn bitsort<T, F, O>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
    O: OrderKind,
{
    // Sorting has no meaningful behavior on zero-sized types.
    if mem::size_of::<T>() == 0 {
        return;
    }

    let len = v.len();

    let (run_len, was_reversed) = find_existing_run(v, is_less);

    if run_len == len {
        if was_reversed {
            v.reverse();
        }
        return;
    }

    if run_len >= len - run_len {
        // The run is at least as long as the rest. Sort only the rest and merge both.
        if was_reversed {
            v[..run_len].reverse();
        }

        let limit = 2 * floor_log2(len - run_len);
        quicksort::quicksort::<T, F, O>(&mut v[run_len..], None, limit, is_less);

        merge::merge(v, run_len, is_less);
        return;
    }

    // Limit the number of imbalanced partitions to `2 * floor(log2(len))`.
    let limit = 2 * floor_log2(len);
    quicksort::quicksort::<T, F, O>(v, None, limit, is_less);
}

/// Finds a run of presorted elements starting at the beginning of the slice. Returns the length of
/// the run, and a bool denoting whether the run is strictly descending. Runs are either
/// non-descending or strictly descending, reversing the latter can't reorder equal elements.
fn find_existing_run<T, F>(v: &[T], is_less: &mut F) -> (usize, bool)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();

    if len < 2 {
        return (len, false);
    }

    let mut end = 2;

    if is_less(&v[1], &v[0]) {
        while end < len && is_less(&v[end], &v[end - 1]) {
            end += 1;
        }
        (end, true)
    } else {
        while end < len && !is_less(&v[end], &v[end - 1]) {
            end += 1;
        }
        (end, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::prelude::*;

    fn counting_sort_by_less<T: Ord>(v: &mut [T]) -> usize {
        let mut comparisons = 0;
        sort_by_less(v, |a, b| {
            comparisons += 1;
            a < b
        });
        comparisons
    }

    #[test]
    fn existing_run() {
        let mut less = |a: &i32, b: &i32| a < b;

        assert_eq!(find_existing_run(&[] as &[i32], &mut less), (0, false));
        assert_eq!(find_existing_run(&[3], &mut less), (1, false));
        assert_eq!(find_existing_run(&[1, 1, 2, 0], &mut less), (3, false));
        assert_eq!(find_existing_run(&[3, 2, 1, 1], &mut less), (3, true));
        assert_eq!(find_existing_run(&[2, 1], &mut less), (2, true));
        assert_eq!(find_existing_run(&[5, 5, 5], &mut less), (3, false));
    }

    #[test]
    fn run_fast_paths() {
        for len in [2usize, 10, 33, 1000] {
            let mut v: Vec<usize> = (0..len).collect();
            assert_eq!(counting_sort_by_less(&mut v), len - 1);
            assert!(v.iter().copied().eq(0..len));

            let mut v: Vec<usize> = (0..len).rev().collect();
            assert_eq!(counting_sort_by_less(&mut v), len - 1);
            assert!(v.iter().copied().eq(0..len));
        }
    }

    #[test]
    fn long_run_then_merge() {
        let mut rng = StdRng::seed_from_u64(7);

        for (run_len, rest_len) in [(40, 10), (600, 599), (5000, 3000), (100, 100)] {
            let tail: Vec<u64> = (0..rest_len).map(|_| rng.gen_range(0..1000)).collect();

            // Non-descending run.
            let mut v: Vec<u64> = (0..run_len as u64)
                .map(|x| x * 3)
                .chain(tail.iter().copied())
                .collect();
            let mut expected = v.clone();
            expected.sort();
            sort(&mut v);
            assert_eq!(v, expected);

            // Strictly descending run, through the general paths.
            let mut v: Vec<String> = (0..run_len)
                .rev()
                .map(|x| format!("{x:05}"))
                .chain(tail.iter().map(|x| format!("{x:05}")))
                .collect();
            let mut expected = v.clone();
            expected.sort();
            sort_by(&mut v, |a, b| a.cmp(b));
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn descending_and_keys() {
        let mut rng = StdRng::seed_from_u64(11);
        let original: Vec<i64> = (0..2000).map(|_| rng.gen_range(-500..500)).collect();

        let mut v = original.clone();
        sort_descending(&mut v);
        let mut expected = original.clone();
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(v, expected);

        let mut v = original.clone();
        sort_by_key(&mut v, |x| x.abs());
        assert!(v.windows(2).all(|w| w[0].abs() <= w[1].abs()));
    }

    #[test]
    fn zero_sized() {
        let mut v = [(); 100];
        let mut called = false;
        sort_by_less(&mut v, |_, _| {
            called = true;
            false
        });
        assert!(!called);
    }
}
