//! Fixed-point arithmetic for the quantized inference kernel.
//!
//! Numeric format, fixed at build time:
//!
//! - Activations, weights and biases are signed 8-bit codes with
//!   [`FRAC_BITS`] fractional bits (Q1.7): code `c` represents `c / 128`.
//! - The product of two codes carries `2 * FRAC_BITS` fractional bits and
//!   is summed in an `i32` accumulator at that product scale.
//! - A bias code seeds the accumulator widened by `<< FRAC_BITS`, aligning
//!   its binary point with the products.
//! - Narrowing back to a code is an arithmetic right shift by `FRAC_BITS`
//!   followed by saturation. The shift truncates toward negative infinity;
//!   this is the narrowing the weights were calibrated against, so it must
//!   not be swapped for round-to-nearest.

/// Total bit width of an activation/weight/bias code.
pub const ACT_BITS: u32 = 8;

/// Fractional bits of the code format.
pub const FRAC_BITS: u32 = 7;

/// Total bit width of the accumulator type.
pub const ACC_BITS: u32 = 32;

/// Widen a bias code to the accumulator's product scale.
#[inline(always)]
pub const fn widen_bias(bias: i8) -> i32 {
    (bias as i32) << FRAC_BITS
}

/// Narrow an accumulator value to an activation code.
///
/// Rule: arithmetic right shift by [`FRAC_BITS`] (truncation toward
/// negative infinity), then saturation to the i8 range. For every code `b`,
/// `narrow(widen_bias(b)) == b`.
#[inline(always)]
pub const fn narrow(acc: i32) -> i8 {
    let shifted = acc >> FRAC_BITS;
    if shifted > i8::MAX as i32 {
        i8::MAX
    } else if shifted < i8::MIN as i32 {
        i8::MIN
    } else {
        shifted as i8
    }
}

/// Worst-case accumulator magnitude for a stage with the given fan-in.
///
/// Each product is at most `128 * 128` in magnitude and the widened bias
/// contributes one more such term. The accumulator type must bound this
/// for the largest fan-in in the topology; `network` asserts it at compile
/// time, so wraparound is excluded statically rather than detected at
/// runtime.
pub const fn worst_case_accum(fan_in: usize) -> i64 {
    (fan_in as i64 + 1) * (128 * 128)
}
