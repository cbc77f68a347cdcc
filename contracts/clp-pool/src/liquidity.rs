use crate::guard::ReentrancyGuard;
use crate::storage::{
    get_config, get_position, get_state, get_tick, position_id_or_assign, set_position,
    set_state,
};
use crate::tick::{flip_tick, get_fee_growth_inside, update as update_tick};
use crate::token::settle;
use clp_math::{
    add_delta, get_amounts_for_liquidity, get_liquidity_for_amounts, get_sqrt_ratio_at_tick,
    mul_div, to_i128,
};
use clp_types::{
    MintResult, PoolConfig, PoolError, PoolState, PositionInfo, PositionKey, MAX_TICK, MIN_TICK,
    Q64,
};
use soroban_sdk::{log, symbol_short, token, Address, Env};

/// Mint `liquidity` into the owner's position over `[tick_lower, tick_upper)`
pub fn mint(
    env: &Env,
    owner: Address,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
    token0: Address,
    token1: Address,
) -> Result<MintResult, PoolError> {
    let _guard = ReentrancyGuard::acquire(env)?;
    let config = get_config(env)?;
    check_pair(&config, &token0, &token1)?;
    validate_ticks(tick_lower, tick_upper, config.tick_spacing)?;

    if liquidity == 0 {
        return Err(PoolError::ZeroLiquidity);
    }

    increase_position(env, &config, owner, tick_lower, tick_upper, liquidity)
}

/// Mint the largest liquidity that the desired token amounts can fund
#[allow(clippy::too_many_arguments)]
pub fn add_liquidity(
    env: &Env,
    owner: Address,
    tick_lower: i32,
    tick_upper: i32,
    amount0_desired: u128,
    amount1_desired: u128,
    token0: Address,
    token1: Address,
) -> Result<MintResult, PoolError> {
    let _guard = ReentrancyGuard::acquire(env)?;
    let config = get_config(env)?;
    check_pair(&config, &token0, &token1)?;
    validate_ticks(tick_lower, tick_upper, config.tick_spacing)?;

    let state = get_state(env)?;
    let liquidity = get_liquidity_for_amounts(
        env,
        state.sqrt_price_x96,
        get_sqrt_ratio_at_tick(env, tick_lower)?,
        get_sqrt_ratio_at_tick(env, tick_upper)?,
        amount0_desired,
        amount1_desired,
    )?;

    if liquidity == 0 {
        return Err(PoolError::ZeroLiquidity);
    }

    increase_position(env, &config, owner, tick_lower, tick_upper, liquidity)
}

fn increase_position(
    env: &Env,
    config: &PoolConfig,
    owner: Address,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
) -> Result<MintResult, PoolError> {
    let mut state = get_state(env)?;
    let liquidity_delta = to_i128(liquidity)?;

    // Owed to the pool, so rounded up
    let (amount0, amount1) = get_amounts_for_liquidity(
        env,
        state.sqrt_price_x96,
        get_sqrt_ratio_at_tick(env, tick_lower)?,
        get_sqrt_ratio_at_tick(env, tick_upper)?,
        liquidity,
        true,
    )?;

    let reserve0 = state
        .reserve0
        .checked_add(amount0)
        .ok_or(PoolError::ArithmeticOverflow)?;
    let reserve1 = state
        .reserve1
        .checked_add(amount1)
        .ok_or(PoolError::ArithmeticOverflow)?;
    let active_liquidity = if in_range(&state, tick_lower, tick_upper) {
        add_delta(state.liquidity, liquidity_delta)?
    } else {
        state.liquidity
    };
    // tick::update enforces the same cap, but only after the owner has paid
    check_tick_capacity(env, config, tick_lower, liquidity)?;
    check_tick_capacity(env, config, tick_upper, liquidity)?;

    // Collect from the owner before any pool state changes
    let pool = env.current_contract_address();
    settle(&token::Client::new(env, &config.token0), &owner, &pool, amount0)?;
    settle(&token::Client::new(env, &config.token1), &owner, &pool, amount1)?;

    update_ticks(env, config, &state, tick_lower, tick_upper, liquidity_delta)?;

    let key = PositionKey {
        owner: owner.clone(),
        tick_lower,
        tick_upper,
    };
    // Ticks exist now, so their outside snapshots are in place
    let (fee_growth_inside_0, fee_growth_inside_1) = get_fee_growth_inside(
        env,
        tick_lower,
        tick_upper,
        state.tick,
        state.fee_growth_global_0_x64,
        state.fee_growth_global_1_x64,
    );
    update_position(
        env,
        &key,
        liquidity_delta,
        fee_growth_inside_0,
        fee_growth_inside_1,
    )?;

    state.liquidity = active_liquidity;
    state.reserve0 = reserve0;
    state.reserve1 = reserve1;
    set_state(env, &state);

    let position_id = position_id_or_assign(env, &key);

    env.events().publish(
        (symbol_short!("mint"), owner),
        (position_id, tick_lower, tick_upper, liquidity, amount0, amount1),
    );

    Ok(MintResult {
        position_id,
        liquidity,
        amount0,
        amount1,
    })
}

/// Remove liquidity from a position and pay the principal to the owner.
///
/// Fees accrued up to now move into `tokens_owed` and wait for `collect`.
pub fn burn(
    env: &Env,
    owner: Address,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
) -> Result<(u128, u128), PoolError> {
    let _guard = ReentrancyGuard::acquire(env)?;
    let config = get_config(env)?;
    validate_ticks(tick_lower, tick_upper, config.tick_spacing)?;

    if liquidity == 0 {
        return Err(PoolError::ZeroLiquidity);
    }

    let mut state = get_state(env)?;
    let key = PositionKey {
        owner: owner.clone(),
        tick_lower,
        tick_upper,
    };
    if get_position(env, &key).liquidity < liquidity {
        return Err(PoolError::InsufficientLiquidity);
    }
    let liquidity_delta = -to_i128(liquidity)?;

    // Paid out, so rounded down
    let (amount0, amount1) = get_amounts_for_liquidity(
        env,
        state.sqrt_price_x96,
        get_sqrt_ratio_at_tick(env, tick_lower)?,
        get_sqrt_ratio_at_tick(env, tick_upper)?,
        liquidity,
        false,
    )?;

    let reserve0 = state
        .reserve0
        .checked_sub(amount0)
        .ok_or(PoolError::InsufficientLiquidity)?;
    let reserve1 = state
        .reserve1
        .checked_sub(amount1)
        .ok_or(PoolError::InsufficientLiquidity)?;

    // Read before the ticks are updated, since emptied ticks are deleted
    let (fee_growth_inside_0, fee_growth_inside_1) = get_fee_growth_inside(
        env,
        tick_lower,
        tick_upper,
        state.tick,
        state.fee_growth_global_0_x64,
        state.fee_growth_global_1_x64,
    );
    update_position(
        env,
        &key,
        liquidity_delta,
        fee_growth_inside_0,
        fee_growth_inside_1,
    )?;
    update_ticks(env, &config, &state, tick_lower, tick_upper, liquidity_delta)?;

    if in_range(&state, tick_lower, tick_upper) {
        state.liquidity = add_delta(state.liquidity, liquidity_delta)?;
    }
    state.reserve0 = reserve0;
    state.reserve1 = reserve1;
    set_state(env, &state);

    let pool = env.current_contract_address();
    settle(&token::Client::new(env, &config.token0), &pool, &owner, amount0)?;
    settle(&token::Client::new(env, &config.token1), &pool, &owner, amount1)?;

    env.events().publish(
        (symbol_short!("burn"), owner),
        (tick_lower, tick_upper, liquidity, amount0, amount1),
    );

    Ok((amount0, amount1))
}

/// Pay out all fees owed to a position
pub fn collect(
    env: &Env,
    owner: Address,
    tick_lower: i32,
    tick_upper: i32,
) -> Result<(u128, u128), PoolError> {
    let _guard = ReentrancyGuard::acquire(env)?;
    let config = get_config(env)?;
    validate_ticks(tick_lower, tick_upper, config.tick_spacing)?;

    let mut state = get_state(env)?;
    let key = PositionKey {
        owner: owner.clone(),
        tick_lower,
        tick_upper,
    };

    let mut position = get_position(env, &key);
    if position.liquidity > 0 {
        // Settle fees earned since the last touch
        let (fee_growth_inside_0, fee_growth_inside_1) = get_fee_growth_inside(
            env,
            tick_lower,
            tick_upper,
            state.tick,
            state.fee_growth_global_0_x64,
            state.fee_growth_global_1_x64,
        );
        position = update_position(env, &key, 0, fee_growth_inside_0, fee_growth_inside_1)?;
    }

    let amount0 = position.tokens_owed_0;
    let amount1 = position.tokens_owed_1;
    if amount0 == 0 && amount1 == 0 {
        return Ok((0, 0));
    }

    state.reserve0 = state
        .reserve0
        .checked_sub(amount0)
        .ok_or(PoolError::InsufficientLiquidity)?;
    state.reserve1 = state
        .reserve1
        .checked_sub(amount1)
        .ok_or(PoolError::InsufficientLiquidity)?;

    position.tokens_owed_0 = 0;
    position.tokens_owed_1 = 0;
    set_position(env, &key, &position);
    set_state(env, &state);

    let pool = env.current_contract_address();
    settle(&token::Client::new(env, &config.token0), &pool, &owner, amount0)?;
    settle(&token::Client::new(env, &config.token1), &pool, &owner, amount1)?;

    log!(env, "collected fees", amount0, amount1);
    env.events().publish(
        (symbol_short!("collect"), owner),
        (tick_lower, tick_upper, amount0, amount1),
    );

    Ok((amount0, amount1))
}

/// Settle fees against the position's current liquidity, then apply the delta
fn update_position(
    env: &Env,
    key: &PositionKey,
    liquidity_delta: i128,
    fee_growth_inside_0_x64: u128,
    fee_growth_inside_1_x64: u128,
) -> Result<PositionInfo, PoolError> {
    let mut position = get_position(env, key);

    if position.liquidity > 0 {
        let fee_delta_0 =
            fee_growth_inside_0_x64.wrapping_sub(position.fee_growth_inside_0_last_x64);
        let fee_delta_1 =
            fee_growth_inside_1_x64.wrapping_sub(position.fee_growth_inside_1_last_x64);

        let owed_0 = mul_div(env, fee_delta_0, position.liquidity, Q64)?;
        let owed_1 = mul_div(env, fee_delta_1, position.liquidity, Q64)?;

        position.tokens_owed_0 = position
            .tokens_owed_0
            .checked_add(owed_0)
            .ok_or(PoolError::ArithmeticOverflow)?;
        position.tokens_owed_1 = position
            .tokens_owed_1
            .checked_add(owed_1)
            .ok_or(PoolError::ArithmeticOverflow)?;
    }

    position.liquidity = add_delta(position.liquidity, liquidity_delta)?;
    position.fee_growth_inside_0_last_x64 = fee_growth_inside_0_x64;
    position.fee_growth_inside_1_last_x64 = fee_growth_inside_1_x64;

    set_position(env, key, &position);
    Ok(position)
}

/// Apply a liquidity delta at both boundaries and flip emptied or new ticks
fn update_ticks(
    env: &Env,
    config: &PoolConfig,
    state: &PoolState,
    tick_lower: i32,
    tick_upper: i32,
    liquidity_delta: i128,
) -> Result<(), PoolError> {
    let flipped_lower = update_tick(
        env,
        tick_lower,
        state.tick,
        liquidity_delta,
        state.fee_growth_global_0_x64,
        state.fee_growth_global_1_x64,
        false,
        config.max_liquidity_per_tick,
    )?;
    let flipped_upper = update_tick(
        env,
        tick_upper,
        state.tick,
        liquidity_delta,
        state.fee_growth_global_0_x64,
        state.fee_growth_global_1_x64,
        true,
        config.max_liquidity_per_tick,
    )?;

    if flipped_lower {
        flip_tick(env, tick_lower, config.tick_spacing)?;
    }
    if flipped_upper {
        flip_tick(env, tick_upper, config.tick_spacing)?;
    }

    Ok(())
}

fn check_tick_capacity(
    env: &Env,
    config: &PoolConfig,
    tick: i32,
    liquidity: u128,
) -> Result<(), PoolError> {
    let gross = get_tick(env, tick)
        .liquidity_gross
        .checked_add(liquidity)
        .ok_or(PoolError::ArithmeticOverflow)?;
    if gross > config.max_liquidity_per_tick {
        return Err(PoolError::TickLiquidityExceeded);
    }
    Ok(())
}

fn in_range(state: &PoolState, tick_lower: i32, tick_upper: i32) -> bool {
    state.tick >= tick_lower && state.tick < tick_upper
}

/// Token arguments must name the pool's pair in canonical order
pub(crate) fn check_pair(
    config: &PoolConfig,
    token0: &Address,
    token1: &Address,
) -> Result<(), PoolError> {
    if *token0 != config.token0 || *token1 != config.token1 {
        return Err(PoolError::TokenMismatch);
    }
    Ok(())
}

/// Position bounds must be ordered, in bounds and on the tick spacing
pub(crate) fn validate_ticks(
    tick_lower: i32,
    tick_upper: i32,
    tick_spacing: i32,
) -> Result<(), PoolError> {
    if tick_lower >= tick_upper
        || tick_lower < MIN_TICK
        || tick_upper > MAX_TICK
        || tick_lower % tick_spacing != 0
        || tick_upper % tick_spacing != 0
    {
        return Err(PoolError::InvalidRange);
    }
    Ok(())
}
