// Recursively select a pseudomedian if above this threshold.
const PSEUDO_MEDIAN_REC_THRESHOLD: usize = 64;

/// Selects a pivot from `v`. Algorithm taken from glidesort by Orson Peters.
///
/// This chooses a pivot by sampling an adaptive amount of points, approximating
/// the quality of a median of sqrt(n) elements.
pub(crate) fn choose_pivot<T, F>(v: &[T], is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    // We use unsafe code and raw pointers here because we're dealing with
    // heavy recursion. Passing safe slices around would involve a lot of
    // branches and function call overhead.

    let len = v.len();
    assert!(len >= 8);

    let len_div_8 = len / 8;
    let v_base = v.as_ptr();

    // SAFETY: a, b, c point to initialized regions of len_div_8 elements,
    // satisfying median3 and median3_rec's preconditions as v_base points
    // to an initialized region of n = len elements.
    unsafe {
        let a = v_base; // [0, floor(n * 1/8))
        let b = v_base.add(len_div_8 * 4); // [floor(n * 4/8), floor(n * 5/8))
        let c = v_base.add(len_div_8 * 7); // [floor(n * 7/8), n)

        let median = if len < PSEUDO_MEDIAN_REC_THRESHOLD {
            median3(&*a, &*b, &*c, is_less) as *const T
        } else {
            median3_rec(a, b, c, len_div_8, is_less)
        };

        median.offset_from(v_base) as usize
    }
}

/// Calculates an approximate median of 3 elements from sections a, b, c, or
/// recursively from an approximation of each, if they're large enough. By
/// dividing the size of each section by 8 when recursing we have logarithmic
/// recursion depth and overall sample from f(n) = 3*f(n/8) -> f(n) =
/// O(n^(log(3)/log(8))) ~= O(n^0.528) elements.
///
/// SAFETY: a, b, c must point to the start of initialized regions of memory of
/// at least n elements.
unsafe fn median3_rec<T, F>(
    mut a: *const T,
    mut b: *const T,
    mut c: *const T,
    n: usize,
    is_less: &mut F,
) -> *const T
where
    F: FnMut(&T, &T) -> bool,
{
    if n * 8 >= PSEUDO_MEDIAN_REC_THRESHOLD {
        let n8 = n / 8;
        a = median3_rec(a, a.add(n8 * 4), a.add(n8 * 7), n8, is_less);
        b = median3_rec(b, b.add(n8 * 4), b.add(n8 * 7), n8, is_less);
        c = median3_rec(c, c.add(n8 * 4), c.add(n8 * 7), n8, is_less);
    }
    median3(&*a, &*b, &*c, is_less)
}

/// Calculates the median of 3 elements.
#[inline(always)]
fn median3<'a, T, F>(a: &'a T, b: &'a T, c: &'a T, is_less: &mut F) -> &'a T
where
    F: FnMut(&T, &T) -> bool,
{
    // Compiler tends to make this branchless when sensible, and avoids the
    // third comparison when not.
    let x = is_less(a, b);
    let y = is_less(a, c);
    if x == y {
        // If x=y=0 then b, c <= a. In this case we want to return max(b, c).
        // If x=y=1 then a < b, c. In this case we want to return min(b, c).
        // By toggling the outcome of b < c using XOR x we get this behavior.
        let z = is_less(b, c);
        if z ^ x {
            c
        } else {
            b
        }
    } else {
        // Either c <= a < b or b <= a < c, thus a is our median.
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_three() {
        let perms = [
            [1, 2, 3],
            [1, 3, 2],
            [2, 1, 3],
            [2, 3, 1],
            [3, 1, 2],
            [3, 2, 1],
            [1, 1, 2],
            [2, 1, 1],
            [1, 2, 1],
            [4, 4, 4],
        ];

        for [a, b, c] in perms {
            let mut sorted = [a, b, c];
            sorted.sort();

            let mut comparisons = 0;
            let median = median3(&a, &b, &c, &mut |x: &i32, y: &i32| {
                comparisons += 1;
                x < y
            });

            assert_eq!(*median, sorted[1], "{a} {b} {c}");
            assert!(comparisons <= 3);
        }

        // The first element being the median only costs two comparisons.
        let mut comparisons = 0;
        median3(&2, &1, &3, &mut |x: &i32, y: &i32| {
            comparisons += 1;
            x < y
        });
        assert_eq!(comparisons, 2);
    }

    #[test]
    fn pivot_of_sorted_is_central() {
        for len in [8, 33, 63, 64, 100, 1000, 100_000] {
            let v: Vec<usize> = (0..len).collect();
            let pos = choose_pivot(&v, &mut |a, b| a < b);

            assert!(pos < len);
            assert_eq!(v[pos], pos);
            assert!(pos >= len / 4 && pos <= len * 3 / 4, "len: {len} pos: {pos}");

            let rev: Vec<usize> = (0..len).rev().collect();
            let pos = choose_pivot(&rev, &mut |a, b| a < b);
            assert!(pos >= len / 4 && pos <= len * 3 / 4, "len: {len} pos: {pos}");
        }
    }

    #[test]
    fn sample_count_grows_sublinear() {
        for (len, max_comparisons) in [(63, 3), (64, 12), (512, 39), (4096, 120)] {
            let v: Vec<u32> = (0u32..len).map(|x| x.wrapping_mul(2654435761) >> 7).collect();

            let mut comparisons = 0;
            choose_pivot(&v, &mut |a: &u32, b: &u32| {
                comparisons += 1;
                a < b
            });

            assert!(comparisons <= max_comparisons, "len: {len} comparisons: {comparisons}");
        }
    }
}
