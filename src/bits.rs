//! Bit twiddling helpers used by the bitset partition and the depth budget.

/// Index of the lowest set bit. `x` must not be zero.
#[inline(always)]
pub(crate) fn count_trailing_zeros(x: u64) -> usize {
    debug_assert!(x != 0);

    x.trailing_zeros() as usize
}

/// Number of zero bits above the highest set bit. `x` must not be zero.
#[inline(always)]
pub(crate) fn count_leading_zeros(x: u64) -> usize {
    debug_assert!(x != 0);

    x.leading_zeros() as usize
}

#[inline(always)]
pub(crate) fn clear_lowest_bit(x: u64) -> u64 {
    x & x.wrapping_sub(1)
}

/// Index of the highest set bit, used to walk a bitset from the top. `x` must not be zero.
#[inline(always)]
pub(crate) fn highest_bit_index(x: u64) -> usize {
    (u64::BITS as usize - 1) - count_leading_zeros(x)
}

/// `floor(log2(n))`, with `floor_log2(0) == 0`.
///
/// The binary OR by one is used to eliminate the zero-check in the logarithm.
#[inline(always)]
pub(crate) fn floor_log2(n: usize) -> u32 {
    (usize::BITS - 1) - (n | 1).leading_zeros()
}
