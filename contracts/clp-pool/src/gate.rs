use clp_math::{mul_div, to_i128};
use clp_types::{PoolConfig, PoolError, Q96};
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{contractclient, log, symbol_short, Address, Env, Symbol};

/// Swaps moving the sqrt price by at least this much consult the gate
pub const LARGE_SWAP_IMPACT_BPS: u128 = 100;

/// Oldest oracle observation accepted, in seconds
pub const MAX_PRICE_AGE_SECS: u64 = 300;

/// Largest accepted gap between the post-swap pool price and the oracle
pub const MAX_PRICE_DEVIATION_BPS: i128 = 500;

/// Fixed-point scale of oracle prices (7 decimals)
pub const PRICE_SCALE: i128 = 10_000_000;

const BPS: i128 = 10_000;

/// Oracle aggregator and circuit breaker
#[contractclient(name = "PriceGateClient")]
pub trait PriceGate {
    /// Latest price of `asset` in PRICE_SCALE units and its observation time
    fn get_price(env: Env, asset: Address) -> (i128, u64);

    fn is_circuit_open(env: Env, operation: Symbol) -> bool;
}

/// Refuse a large-impact swap when the gate reports an open circuit, a
/// stale price, or a price the post-swap pool price strays too far from.
pub fn check_swap(
    env: &Env,
    config: &PoolConfig,
    sqrt_price_before_x96: u128,
    sqrt_price_after_x96: u128,
) -> Result<(), PoolError> {
    let Some(gate) = config.price_gate.as_ref() else {
        return Ok(());
    };

    let impact_bps = mul_div(
        env,
        sqrt_price_before_x96.abs_diff(sqrt_price_after_x96),
        BPS as u128,
        sqrt_price_before_x96,
    )?;
    if impact_bps < LARGE_SWAP_IMPACT_BPS {
        return Ok(());
    }

    let client = PriceGateClient::new(env, gate);
    match client.try_is_circuit_open(&symbol_short!("swap")) {
        Ok(Ok(false)) => {}
        Ok(Ok(true)) => {
            log!(env, "swap rejected: circuit open");
            return Err(PoolError::CircuitOpen);
        }
        _ => return Err(PoolError::PriceGateUnavailable),
    }

    let price0 = fresh_price(env, &client, &config.token0)?;
    let price1 = fresh_price(env, &client, &config.token1)?;

    // token1 per token0
    let oracle_price = price0
        .fixed_div_floor(price1, PRICE_SCALE)
        .ok_or(PoolError::ArithmeticOverflow)?;
    if oracle_price <= 0 {
        return Err(PoolError::PriceGateUnavailable);
    }

    let pool_price = pool_price(env, sqrt_price_after_x96)?;
    let deviation_bps = (pool_price - oracle_price)
        .abs()
        .fixed_div_floor(oracle_price, BPS)
        .ok_or(PoolError::ArithmeticOverflow)?;

    if deviation_bps > MAX_PRICE_DEVIATION_BPS {
        log!(env, "swap rejected: deviation bps", deviation_bps);
        return Err(PoolError::PriceDeviation);
    }

    Ok(())
}

fn fresh_price(env: &Env, client: &PriceGateClient, asset: &Address) -> Result<i128, PoolError> {
    let (price, observed_at) = match client.try_get_price(asset) {
        Ok(Ok(observation)) => observation,
        _ => return Err(PoolError::PriceGateUnavailable),
    };

    if price <= 0 {
        return Err(PoolError::PriceGateUnavailable);
    }
    if env.ledger().timestamp().saturating_sub(observed_at) > MAX_PRICE_AGE_SECS {
        return Err(PoolError::StalePrice);
    }

    Ok(price)
}

/// sqrt_price^2 as token1 per token0 in PRICE_SCALE units.
/// Scaled before squaring so the intermediate stays in u128 up to MAX_SQRT_RATIO.
fn pool_price(env: &Env, sqrt_price_x96: u128) -> Result<i128, PoolError> {
    let scaled = mul_div(env, sqrt_price_x96, PRICE_SCALE as u128, Q96)?;
    to_i128(mul_div(env, scaled, sqrt_price_x96, Q96)?)
}
