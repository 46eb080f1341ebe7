//! Type and comparator capabilities, used to pick the fast paths at monomorphization time.

use core::marker::PhantomData;
use core::mem;

use crate::scratch::MAX_STACK_SIZE;

/// Scratch slots needed by the general small-sort: the slice itself plus 16 for the presort.
pub(crate) const SMALL_SORT_GENERAL_SCRATCH_LEN: usize = 48;

/// Scratch slots needed by the sorting-network small-sort.
pub(crate) const SMALL_SORT_NETWORK_SCRATCH_LEN: usize = 32;

/// How the comparison function was obtained. Only orderings built from `Ord` are known to be
/// cheap and side-effect free, everything else takes the general paths. Crate private, so the set
/// of order kinds is closed.
pub(crate) trait OrderKind {
    const IS_BUILTIN: bool;
}

/// `Ord::lt` or its reverse.
pub(crate) struct BuiltinOrder;

/// A user provided closure.
pub(crate) struct CustomOrder;

impl OrderKind for BuiltinOrder {
    const IS_BUILTIN: bool = true;
}

impl OrderKind for CustomOrder {
    const IS_BUILTIN: bool = false;
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum SmallSortKind {
    Network,
    General,
    Insertion,
}

pub(crate) struct Capability<T, O>(PhantomData<(fn() -> T, O)>);

impl<T, O: OrderKind> Capability<T, O> {
    /// Small plain values under the built-in order, block bitset partition and sorting networks.
    pub(crate) const BRANCHLESS_PARTITION: bool =
        O::IS_BUILTIN && is_plain_data::<T>() && mem::size_of::<T>() <= mem::size_of::<u64>();

    pub(crate) const SORTING_NETWORK: bool = O::IS_BUILTIN
        && is_plain_data::<T>()
        && mem::size_of::<T>() <= 4 * mem::size_of::<usize>()
        && fits_scratch::<T>(SMALL_SORT_NETWORK_SCRATCH_LEN);

    pub(crate) const GENERAL_SCRATCH: bool = fits_scratch::<T>(SMALL_SORT_GENERAL_SCRATCH_LEN);

    pub(crate) const SMALL_SORT: SmallSortKind = if Self::SORTING_NETWORK {
        SmallSortKind::Network
    } else if Self::GENERAL_SCRATCH {
        SmallSortKind::General
    } else {
        SmallSortKind::Insertion
    };
}

/// Rust moves are always bitwise, what matters for the fast paths is that copies are cheap and
/// that there is no drop glue that could make a duplicate observable.
const fn is_plain_data<T>() -> bool {
    !mem::needs_drop::<T>()
}

const fn fits_scratch<T>(slots: usize) -> bool {
    mem::size_of::<T>() * slots <= MAX_STACK_SIZE && mem::align_of::<T>() <= crate::scratch::ALIGN
}
