#![no_std]

mod error;
mod pool;
mod position;
mod tick;

pub use error::*;
pub use pool::*;
pub use position::*;
pub use tick::*;

/// Q96 constant (2^96), the scale of `sqrt_price_x96`
pub const Q96: u128 = 1 << 96;

/// Q64 constant (2^64), the scale of the per-liquidity fee growth accumulators
pub const Q64: u128 = 1 << 64;

/// Minimum tick index
/// Limited by u128 sqrt price representation
pub const MIN_TICK: i32 = -443636;

/// Maximum tick index
pub const MAX_TICK: i32 = 443636;

/// sqrt(1.0001^MIN_TICK) * 2^96, rounded up
pub const MIN_SQRT_RATIO: u128 = 18447090764788882728;

/// sqrt(1.0001^MAX_TICK) * 2^96, rounded up. Exclusive upper bound of the price domain.
pub const MAX_SQRT_RATIO: u128 = 340275971719517849884101479065584693834;

/// Fee amount in hundredths of a basis point (1e-6)
/// 100 = 0.01%, 500 = 0.05%, 3000 = 0.3%, 10000 = 1%
pub type Fee = u32;

/// Denominator of [`Fee`]
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Get tick spacing for a given fee tier
pub fn fee_to_tick_spacing(fee: Fee) -> Result<i32, PoolError> {
    match fee {
        100 => Ok(1),     // 0.01%
        500 => Ok(10),    // 0.05%
        3000 => Ok(60),   // 0.3%
        10000 => Ok(200), // 1%
        _ => Err(PoolError::InvalidFeeTier),
    }
}

/// Lowest tick usable as a position boundary for `tick_spacing`
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    (MIN_TICK / tick_spacing) * tick_spacing
}

/// Highest tick usable as a position boundary for `tick_spacing`
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

/// Calculate maximum liquidity per tick for a given tick spacing
pub fn max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = min_usable_tick(tick_spacing);
    let max_tick = max_usable_tick(tick_spacing);
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_tiers() {
        assert_eq!(fee_to_tick_spacing(100), Ok(1));
        assert_eq!(fee_to_tick_spacing(500), Ok(10));
        assert_eq!(fee_to_tick_spacing(3000), Ok(60));
        assert_eq!(fee_to_tick_spacing(10000), Ok(200));
        assert_eq!(fee_to_tick_spacing(0), Err(PoolError::InvalidFeeTier));
        assert_eq!(fee_to_tick_spacing(2500), Err(PoolError::InvalidFeeTier));
    }

    #[test]
    fn test_usable_ticks() {
        assert_eq!(min_usable_tick(60), -443580);
        assert_eq!(max_usable_tick(60), 443580);
        assert_eq!(min_usable_tick(1), MIN_TICK);
        assert_eq!(max_usable_tick(200), 443600);
    }

    #[test]
    fn test_max_liquidity_per_tick_shrinks_with_spacing() {
        assert!(max_liquidity_per_tick(1) < max_liquidity_per_tick(10));
        assert!(max_liquidity_per_tick(60) < max_liquidity_per_tick(200));
        // 14787 usable ticks at spacing 60
        assert_eq!(max_liquidity_per_tick(60), u128::MAX / 14787);
    }
}
