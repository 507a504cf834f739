//! # Difficulty Engine
//!
//! Compact target encoding, epoch retargeting and chain work.
//!
//! The target is a CEILING: a lower target means a harder block and more
//! work. Retargeting raises the target when an epoch ran slow and lowers it
//! when the epoch ran fast, by at most [`MAX_ADJUSTMENT_FACTOR`] either way.

use super::chain_view::{ancestor_at, ChainView};
use crate::domain::{BlockRecord, ChainParams, RelayResult, MAX_ADJUSTMENT_FACTOR};
use primitive_types::{U256, U512};

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Expand compact `bits` into a full-width target.
///
/// `bits` is one exponent byte followed by a three-byte mantissa:
/// `target = mantissa * 256^(exponent - 3)`. A set sign bit yields zero.
pub fn bits_to_target(bits: u32) -> U256 {
    if bits & SIGN_BIT != 0 {
        return U256::zero();
    }

    let exponent = bits >> 24;
    let mantissa = bits & MANTISSA_MASK;

    if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else {
        U256::from(mantissa) << (8 * (exponent - 3))
    }
}

/// Compress a target into compact `bits`, truncating the mantissa.
pub fn target_to_bits(target: U256) -> u32 {
    let mut size = (target.bits() + 7) / 8;

    let mut compact = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3))).low_u32()
    };

    // Keep the mantissa's top bit clear so it does not read as a sign
    if compact & SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | ((size as u32) << 24)
}

/// Retargeted threshold after an epoch that took `actual_timespan` seconds.
pub fn retarget(old_target: U256, actual_timespan: i64, params: &ChainParams) -> U256 {
    let expected = i64::from(params.target_timespan);
    let factor = i64::from(MAX_ADJUSTMENT_FACTOR);
    let clamped = actual_timespan.clamp(expected / factor, expected * factor) as u64;

    let scaled: U512 = old_target.full_mul(U256::from(clamped)) / U512::from(expected as u64);
    let limit = U512::from(params.pow_limit);

    if scaled > limit {
        params.pow_limit
    } else {
        narrow(scaled)
    }
}

/// Target a child at `height` must declare, given its `parent`.
///
/// Inside an epoch the parent's target carries over. At a boundary the
/// completed epoch's timespan is measured from its first block to `parent`.
pub fn required_target<V: ChainView + ?Sized>(
    view: &V,
    parent: &BlockRecord,
    height: u64,
    params: &ChainParams,
) -> RelayResult<U256> {
    let parent_target = parent.header.target();
    if !params.is_retarget_height(height) {
        return Ok(parent_target);
    }

    let first = ancestor_at(view, parent, height - params.retarget_interval)?;
    let actual_timespan = i64::from(parent.header.time) - i64::from(first.header.time);
    let next = retarget(parent_target, actual_timespan, params);

    tracing::debug!(
        "Retarget at height {}: timespan {}s, bits {:#010x} -> {:#010x}",
        height,
        actual_timespan,
        parent.header.bits,
        target_to_bits(next)
    );

    Ok(next)
}

/// Compact form of [`required_target`]; the only form a header can declare.
pub fn required_bits<V: ChainView + ?Sized>(
    view: &V,
    parent: &BlockRecord,
    height: u64,
    params: &ChainParams,
) -> RelayResult<u32> {
    required_target(view, parent, height, params).map(target_to_bits)
}

/// Expected hashes to find a block at `target`: `2^256 / (target + 1)`.
pub fn work(target: U256) -> U256 {
    match target.checked_add(U256::one()) {
        // 2^256 / (t + 1) == (2^256 - (t + 1)) / (t + 1) + 1 == !t / (t + 1) + 1
        Some(divisor) => (!target / divisor).saturating_add(U256::one()),
        None => U256::one(),
    }
}

/// Work of `blocks_in_epoch` blocks sharing one target.
pub fn epoch_cumulative_work(target: U256, blocks_in_epoch: u64) -> U256 {
    work(target).saturating_mul(U256::from(blocks_in_epoch))
}

fn narrow(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}
