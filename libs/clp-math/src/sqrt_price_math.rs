use crate::full_math::{div_u256, mul_div, mul_div_rounding_up, mul_div_u256};
use clp_types::{PoolError, Q96};
use soroban_sdk::{Env, U256};

/// Amount of token0 between two prices for `liquidity`:
/// L * 2^96 * (upper - lower) / (upper * lower)
///
/// `round_up` selects the direction; amounts owed to the pool round up,
/// amounts paid out round down.
pub fn get_amount0_delta(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, PoolError> {
    let (lower, upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if lower == 0 {
        return Err(PoolError::InvalidSqrtPrice);
    }
    if liquidity == 0 || lower == upper {
        return Ok(0);
    }

    let numerator1 = U256::from_u128(env, liquidity).mul(&U256::from_u128(env, Q96));
    let scaled = mul_div_u256(env, &numerator1, upper - lower, upper, round_up)?;
    div_u256(env, &scaled, &U256::from_u128(env, lower), round_up)
}

/// Amount of token1 between two prices for `liquidity`:
/// L * (upper - lower) / 2^96
pub fn get_amount1_delta(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, PoolError> {
    let (lower, upper) = sort(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if round_up {
        mul_div_rounding_up(env, liquidity, upper - lower, Q96)
    } else {
        mul_div(env, liquidity, upper - lower, Q96)
    }
}

/// Price after adding `amount_in` of the input token.
/// Rounds so the pool never gives away more than the input pays for.
pub fn get_next_sqrt_price_from_input(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount_in: u128,
    zero_for_one: bool,
) -> Result<u128, PoolError> {
    check_inputs(sqrt_price_x96, liquidity)?;

    if zero_for_one {
        next_sqrt_price_from_amount0_rounding_up(env, sqrt_price_x96, liquidity, amount_in, true)
    } else {
        next_sqrt_price_from_amount1_rounding_down(env, sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Price after removing `amount_out` of the output token
pub fn get_next_sqrt_price_from_output(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount_out: u128,
    zero_for_one: bool,
) -> Result<u128, PoolError> {
    check_inputs(sqrt_price_x96, liquidity)?;

    if zero_for_one {
        next_sqrt_price_from_amount1_rounding_down(env, sqrt_price_x96, liquidity, amount_out, false)
    } else {
        next_sqrt_price_from_amount0_rounding_up(env, sqrt_price_x96, liquidity, amount_out, false)
    }
}

fn check_inputs(sqrt_price_x96: u128, liquidity: u128) -> Result<(), PoolError> {
    if sqrt_price_x96 == 0 {
        return Err(PoolError::InvalidSqrtPrice);
    }
    if liquidity == 0 {
        return Err(PoolError::ZeroLiquidity);
    }
    Ok(())
}

/// ceil(N / (N / sqrt_price +- amount)) with N = L * 2^96
fn next_sqrt_price_from_amount0_rounding_up(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128, PoolError> {
    if amount == 0 {
        return Ok(sqrt_price_x96);
    }

    let numerator1 = U256::from_u128(env, liquidity).mul(&U256::from_u128(env, Q96));
    // N / sqrt_price < 2^160 and amount < 2^128, so the sum cannot overflow
    let base = numerator1.div(&U256::from_u128(env, sqrt_price_x96));
    let amount_256 = U256::from_u128(env, amount);

    let denominator = if add {
        base.add(&amount_256)
    } else {
        if base <= amount_256 {
            return Err(PoolError::InsufficientLiquidity);
        }
        base.sub(&amount_256)
    };

    div_u256(env, &numerator1, &denominator, true)
}

/// sqrt_price +- amount * 2^96 / L
fn next_sqrt_price_from_amount1_rounding_down(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128, PoolError> {
    if add {
        let quotient = mul_div(env, amount, Q96, liquidity)?;
        sqrt_price_x96
            .checked_add(quotient)
            .ok_or(PoolError::ArithmeticOverflow)
    } else {
        let quotient = mul_div_rounding_up(env, amount, Q96, liquidity)?;
        if sqrt_price_x96 <= quotient {
            return Err(PoolError::InsufficientLiquidity);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

fn sort(a: u128, b: u128) -> (u128, u128) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}
