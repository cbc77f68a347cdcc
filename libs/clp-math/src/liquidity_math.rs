use crate::full_math::{mul_div, mul_div_u256, u128_from_u256};
use crate::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use clp_types::{PoolError, Q96};
use soroban_sdk::{Env, U256};

/// Largest liquidity that `amount0` and `amount1` can fund over
/// `[sqrt_ratio_a_x96, sqrt_ratio_b_x96]` at the current price. Rounds down.
pub fn get_liquidity_for_amounts(
    env: &Env,
    sqrt_price_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    amount0: u128,
    amount1: u128,
) -> Result<u128, PoolError> {
    let (lower, upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if lower == upper {
        return Err(PoolError::InvalidRange);
    }

    if sqrt_price_x96 <= lower {
        // Current price below range, only token0 needed
        liquidity_for_amount0(env, lower, upper, amount0)
    } else if sqrt_price_x96 < upper {
        // Current price in range, both tokens needed
        let liquidity0 = liquidity_for_amount0(env, sqrt_price_x96, upper, amount0)?;
        let liquidity1 = liquidity_for_amount1(env, lower, sqrt_price_x96, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        // Current price above range, only token1 needed
        liquidity_for_amount1(env, lower, upper, amount1)
    }
}

/// Token amounts represented by `liquidity` over a range at the current price.
///
/// Pass `round_up = true` for amounts the caller pays in (mint) and `false`
/// for amounts paid out (burn), so the pool is never under-collateralised.
pub fn get_amounts_for_liquidity(
    env: &Env,
    sqrt_price_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<(u128, u128), PoolError> {
    let (lower, upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_price_x96 <= lower {
        let amount0 = get_amount0_delta(env, lower, upper, liquidity, round_up)?;
        Ok((amount0, 0))
    } else if sqrt_price_x96 < upper {
        let amount0 = get_amount0_delta(env, sqrt_price_x96, upper, liquidity, round_up)?;
        let amount1 = get_amount1_delta(env, lower, sqrt_price_x96, liquidity, round_up)?;
        Ok((amount0, amount1))
    } else {
        let amount1 = get_amount1_delta(env, lower, upper, liquidity, round_up)?;
        Ok((0, amount1))
    }
}

/// Apply a signed delta to a liquidity amount
pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128, PoolError> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(PoolError::ArithmeticOverflow)
    } else {
        liquidity
            .checked_add(delta as u128)
            .ok_or(PoolError::ArithmeticOverflow)
    }
}

/// amount0 * (lower * upper / 2^96) / (upper - lower)
fn liquidity_for_amount0(
    env: &Env,
    lower: u128,
    upper: u128,
    amount0: u128,
) -> Result<u128, PoolError> {
    let intermediate = U256::from_u128(env, lower)
        .mul(&U256::from_u128(env, upper))
        .div(&U256::from_u128(env, Q96));
    let liquidity = mul_div_u256(env, &intermediate, amount0, upper - lower, false)?;
    u128_from_u256(&liquidity)
}

/// amount1 * 2^96 / (upper - lower)
fn liquidity_for_amount1(
    env: &Env,
    lower: u128,
    upper: u128,
    amount1: u128,
) -> Result<u128, PoolError> {
    mul_div(env, amount1, Q96, upper - lower)
}

fn sort(a: u128, b: u128) -> (u128, u128) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::get_sqrt_ratio_at_tick;
    use soroban_sdk::Env;

    fn range(env: &Env, lower: i32, upper: i32) -> (u128, u128) {
        (
            get_sqrt_ratio_at_tick(env, lower).unwrap(),
            get_sqrt_ratio_at_tick(env, upper).unwrap(),
        )
    }

    // === get_amounts_for_liquidity tests ===

    #[test]
    fn test_amounts_full_range_at_par() {
        let env = Env::default();
        let (lower, upper) = range(&env, -443580, 443580);
        assert_eq!(
            get_amounts_for_liquidity(&env, Q96, lower, upper, 1_000_000_000, true),
            Ok((1_000_000_000, 1_000_000_000))
        );
        assert_eq!(
            get_amounts_for_liquidity(&env, Q96, lower, upper, 1_000_000_000, false),
            Ok((999_999_999, 999_999_999))
        );
    }

    #[test]
    fn test_amounts_narrow_range() {
        let env = Env::default();
        let (lower, upper) = range(&env, -600, 600);
        assert_eq!(
            get_amounts_for_liquidity(&env, Q96, lower, upper, 1_000_000_000, true),
            Ok((29_553_011, 29_553_011))
        );
    }

    #[test]
    fn test_amounts_below_range_only_token0() {
        let env = Env::default();
        let (lower, upper) = range(&env, 60, 120);
        let (amount0, amount1) =
            get_amounts_for_liquidity(&env, Q96, lower, upper, 1_000_000_000, true).unwrap();
        assert!(amount0 > 0);
        assert_eq!(amount1, 0);
    }

    #[test]
    fn test_amounts_above_range_only_token1() {
        let env = Env::default();
        let (lower, upper) = range(&env, -120, -60);
        let (amount0, amount1) =
            get_amounts_for_liquidity(&env, Q96, lower, upper, 1_000_000_000, true).unwrap();
        assert_eq!(amount0, 0);
        assert!(amount1 > 0);
    }

    // === get_liquidity_for_amounts tests ===

    #[test]
    fn test_liquidity_for_amounts_limited_by_smaller_side() {
        let env = Env::default();
        let (lower, upper) = range(&env, -443580, 443580);
        assert_eq!(
            get_liquidity_for_amounts(&env, Q96, lower, upper, 5_000, 3_000),
            Ok(3_000)
        );
    }

    #[test]
    fn test_liquidity_for_amounts_funds_its_own_amounts() {
        let env = Env::default();
        let (lower, upper) = range(&env, -600, 600);
        let liquidity =
            get_liquidity_for_amounts(&env, Q96, lower, upper, 50_000_000, 40_000_000).unwrap();
        let (amount0, amount1) =
            get_amounts_for_liquidity(&env, Q96, lower, upper, liquidity, true).unwrap();
        assert!(amount0 <= 50_000_000);
        assert!(amount1 <= 40_000_000);
    }

    #[test]
    fn test_liquidity_for_amounts_out_of_range() {
        let env = Env::default();
        let (lower, upper) = range(&env, 60, 120);
        // Below range: token1 is irrelevant
        let liquidity = get_liquidity_for_amounts(&env, Q96, lower, upper, 1_000, 0).unwrap();
        assert!(liquidity > 0);
        assert_eq!(
            get_liquidity_for_amounts(&env, Q96, lower, upper, 0, 1_000),
            Ok(0)
        );
    }

    #[test]
    fn test_liquidity_for_amounts_empty_range() {
        let env = Env::default();
        assert_eq!(
            get_liquidity_for_amounts(&env, Q96, Q96, Q96, 1, 1),
            Err(PoolError::InvalidRange)
        );
    }

    // === add_delta tests ===

    #[test]
    fn test_add_delta() {
        assert_eq!(add_delta(100, 50), Ok(150));
        assert_eq!(add_delta(100, -50), Ok(50));
        assert_eq!(add_delta(100, -100), Ok(0));
        assert_eq!(add_delta(100, -101), Err(PoolError::ArithmeticOverflow));
        assert_eq!(add_delta(u128::MAX, 1), Err(PoolError::ArithmeticOverflow));
    }

    #[test]
    fn test_add_delta_min_i128() {
        // unsigned_abs handles i128::MIN without overflow
        assert_eq!(add_delta(1u128 << 127, i128::MIN), Ok(0));
    }
}
