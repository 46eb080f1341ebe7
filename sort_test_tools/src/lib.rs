//! Shared test bodies and input patterns for bitsort.

use std::cmp::Ordering;

/// The entry points a sort implementation has to provide to run the shared suite.
pub trait Sort {
    fn name() -> String;

    fn sort<T>(arr: &mut [T])
    where
        T: Ord;

    fn sort_descending<T>(arr: &mut [T])
    where
        T: Ord;

    fn sort_by<T, F>(arr: &mut [T], compare: F)
    where
        F: FnMut(&T, &T) -> Ordering;

    fn sort_by_key<T, K, F>(arr: &mut [T], f: F)
    where
        F: FnMut(&T) -> K,
        K: Ord;

    fn sort_by_less<T, F>(arr: &mut [T], is_less: F)
    where
        F: FnMut(&T, &T) -> bool;
}

pub mod patterns;
pub mod types;
