use clp_types::PoolError;
use soroban_sdk::{Env, U256};

/// Multiply and divide with 256-bit intermediate precision (rounds down)
/// Returns (a * b) / denominator
pub fn mul_div(env: &Env, a: u128, b: u128, denominator: u128) -> Result<u128, PoolError> {
    if denominator == 0 {
        return Err(PoolError::DivisionByZero);
    }

    // Stay off the host when the product fits
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denominator);
    }

    let product = U256::from_u128(env, a).mul(&U256::from_u128(env, b));
    u128_from_u256(&product.div(&U256::from_u128(env, denominator)))
}

/// Multiply and divide with 256-bit intermediate precision (rounds up)
/// Returns ceil((a * b) / denominator)
pub fn mul_div_rounding_up(
    env: &Env,
    a: u128,
    b: u128,
    denominator: u128,
) -> Result<u128, PoolError> {
    if denominator == 0 {
        return Err(PoolError::DivisionByZero);
    }

    if let Some(product) = a.checked_mul(b) {
        return div_rounding_up(product, denominator);
    }

    let product = U256::from_u128(env, a).mul(&U256::from_u128(env, b));
    div_u256(env, &product, &U256::from_u128(env, denominator), true)
}

/// Computes `a * b / denominator` for a 256-bit `a` without forming the
/// full product, so it cannot trap as long as the result fits 256 bits.
pub fn mul_div_u256(
    env: &Env,
    a: &U256,
    b: u128,
    denominator: u128,
    round_up: bool,
) -> Result<U256, PoolError> {
    if denominator == 0 {
        return Err(PoolError::DivisionByZero);
    }

    let d = U256::from_u128(env, denominator);
    let b_256 = U256::from_u128(env, b);
    let max = u256_max(env);

    // a = q * d + r  =>  a * b / d = q * b + r * b / d
    let quotient = a.div(&d);
    let remainder = a.rem_euclid(&d);

    if b != 0 && quotient > max.div(&b_256) {
        return Err(PoolError::ArithmeticOverflow);
    }
    let high = quotient.mul(&b_256);

    // r < 2^128 and b < 2^128, so r * b fits
    let low_product = remainder.mul(&b_256);
    let mut low = low_product.div(&d);
    if round_up && low_product.rem_euclid(&d) > U256::from_u32(env, 0) {
        low = low.add(&U256::from_u32(env, 1));
    }

    if low > max.sub(&high) {
        return Err(PoolError::ArithmeticOverflow);
    }
    Ok(high.add(&low))
}

/// 256-bit division narrowed to u128
pub fn div_u256(
    env: &Env,
    numerator: &U256,
    denominator: &U256,
    round_up: bool,
) -> Result<u128, PoolError> {
    let zero = U256::from_u32(env, 0);
    if *denominator == zero {
        return Err(PoolError::DivisionByZero);
    }

    let quotient = u128_from_u256(&numerator.div(denominator))?;
    if round_up && numerator.rem_euclid(denominator) > zero {
        return quotient.checked_add(1).ok_or(PoolError::ArithmeticOverflow);
    }
    Ok(quotient)
}

/// Convert U256 to u128
pub fn u128_from_u256(value: &U256) -> Result<u128, PoolError> {
    value.to_u128().ok_or(PoolError::ArithmeticOverflow)
}

/// Convert an unsigned amount to the signed form used by token transfers
/// and liquidity deltas
pub fn to_i128(value: u128) -> Result<i128, PoolError> {
    i128::try_from(value).map_err(|_| PoolError::ArithmeticOverflow)
}

/// 2^256 - 1
pub fn u256_max(env: &Env) -> U256 {
    let high = U256::from_u128(env, u128::MAX);
    let q128 = U256::from_u128(env, 1u128 << 64).mul(&U256::from_u128(env, 1u128 << 64));
    high.mul(&q128).add(&U256::from_u128(env, u128::MAX))
}

/// Unsigned division with rounding up
pub fn div_rounding_up(a: u128, b: u128) -> Result<u128, PoolError> {
    if b == 0 {
        return Err(PoolError::DivisionByZero);
    }
    if a == 0 {
        return Ok(0);
    }
    Ok((a - 1) / b + 1)
}
