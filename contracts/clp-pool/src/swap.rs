use crate::gate;
use crate::guard::ReentrancyGuard;
use crate::invariants;
use crate::liquidity::check_pair;
use crate::storage::{get_config, get_state, get_tick, set_state, MAX_TICK_CROSSINGS_PER_SWAP};
use crate::tick::{cross, next_initialized_tick};
use crate::token::settle;
use clp_math::{
    add_delta, compute_swap_step, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, mul_div,
    to_i128,
};
use clp_types::{
    PoolConfig, PoolError, PoolState, SwapParams, SwapResult, TickCrossing, MAX_SQRT_RATIO,
    MIN_SQRT_RATIO, Q64,
};
use soroban_sdk::{log, symbol_short, token, Address, Env, Vec};

/// Output of the read-only swap computation.
///
/// Holds everything needed to commit the swap, so the pool can validate
/// the whole outcome before any storage write or token transfer.
#[derive(Clone, Debug)]
pub struct SwapComputation {
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_amount: u128,
    pub sqrt_price_x96: u128,
    pub tick: i32,
    pub liquidity: u128,
    pub fee_growth_global_0_x64: u128,
    pub fee_growth_global_1_x64: u128,
    pub crossings: Vec<TickCrossing>,
    pub exhausted: bool,
}

impl SwapComputation {
    pub fn to_result(&self) -> SwapResult {
        SwapResult {
            amount_in: self.amount_in,
            amount_out: self.amount_out,
            fee_amount: self.fee_amount,
            sqrt_price_x96: self.sqrt_price_x96,
            tick: self.tick,
            ticks_crossed: self.crossings.len(),
            exhausted: self.exhausted,
        }
    }
}

/// Execute a swap for `sender`, who pays the input and receives the output.
///
/// The whole outcome is computed and checked before anything is written:
/// fill, slippage, reserves and the price gate. The input is then collected,
/// state committed, and the output paid.
pub fn execute_swap(
    env: &Env,
    sender: Address,
    token0: Address,
    token1: Address,
    params: SwapParams,
) -> Result<SwapResult, PoolError> {
    let _guard = ReentrancyGuard::acquire(env)?;
    let config = get_config(env)?;
    check_pair(&config, &token0, &token1)?;
    let mut state = get_state(env)?;

    let computation = compute_swap(env, &config, &state, &params)?;
    check_fill(&params, &computation)?;

    if params.amount_specified > 0 {
        if computation.amount_out < params.amount_limit {
            return Err(PoolError::SlippageExceeded);
        }
    } else if computation.amount_in > params.amount_limit {
        return Err(PoolError::SlippageExceeded);
    }

    let zero_for_one = params.zero_for_one;
    let (reserve_in, reserve_out) = if zero_for_one {
        (state.reserve0, state.reserve1)
    } else {
        (state.reserve1, state.reserve0)
    };
    let reserve_in = reserve_in
        .checked_add(computation.amount_in)
        .ok_or(PoolError::ArithmeticOverflow)?;
    let reserve_out = reserve_out
        .checked_sub(computation.amount_out)
        .ok_or(PoolError::InsufficientLiquidity)?;

    gate::check_swap(env, &config, state.sqrt_price_x96, computation.sqrt_price_x96)?;

    let (token_in, token_out) = if zero_for_one {
        (&config.token0, &config.token1)
    } else {
        (&config.token1, &config.token0)
    };
    let pool = env.current_contract_address();
    settle(
        &token::Client::new(env, token_in),
        &sender,
        &pool,
        computation.amount_in,
    )?;

    for crossing in computation.crossings.iter() {
        cross(
            env,
            crossing.tick,
            crossing.fee_growth_global_0_x64,
            crossing.fee_growth_global_1_x64,
        );
    }

    let before = state.clone();
    state.sqrt_price_x96 = computation.sqrt_price_x96;
    state.tick = computation.tick;
    state.liquidity = computation.liquidity;
    state.fee_growth_global_0_x64 = computation.fee_growth_global_0_x64;
    state.fee_growth_global_1_x64 = computation.fee_growth_global_1_x64;
    if zero_for_one {
        state.reserve0 = reserve_in;
        state.reserve1 = reserve_out;
    } else {
        state.reserve1 = reserve_in;
        state.reserve0 = reserve_out;
    }

    debug_assert!(invariants::price_in_bounds(&state));
    debug_assert!(invariants::swap_direction_consistent(
        zero_for_one,
        before.sqrt_price_x96,
        state.sqrt_price_x96
    ));
    debug_assert!(invariants::tick_crossings_bounded(
        computation.crossings.len(),
        MAX_TICK_CROSSINGS_PER_SWAP
    ));
    debug_assert!(invariants::fee_growth_monotonic(&before, &state));
    debug_assert!(invariants::swap_reserves_conserved(
        &before,
        &state,
        zero_for_one,
        computation.amount_in,
        computation.amount_out
    ));
    set_state(env, &state);

    settle(
        &token::Client::new(env, token_out),
        &pool,
        &sender,
        computation.amount_out,
    )?;

    if computation.exhausted {
        log!(env, "swap partially filled", computation.amount_in);
    }
    env.events().publish(
        (symbol_short!("swap"), sender),
        (
            zero_for_one,
            computation.amount_in,
            computation.amount_out,
            computation.sqrt_price_x96,
            computation.tick,
        ),
    );

    Ok(computation.to_result())
}

/// Simulate a swap against current state without transfers or writes
pub fn quote(env: &Env, params: SwapParams) -> Result<SwapResult, PoolError> {
    let config = get_config(env)?;
    let state = get_state(env)?;

    let computation = compute_swap(env, &config, &state, &params)?;
    check_fill(&params, &computation)?;

    Ok(computation.to_result())
}

/// Walk the tick registry from the current price and accumulate the swap.
/// Reads storage but never writes it.
pub fn compute_swap(
    env: &Env,
    config: &PoolConfig,
    state: &PoolState,
    params: &SwapParams,
) -> Result<SwapComputation, PoolError> {
    if params.amount_specified == 0 {
        return Err(PoolError::ZeroAmount);
    }

    let zero_for_one = params.zero_for_one;
    let exact_input = params.amount_specified > 0;
    let sqrt_price_limit = resolve_price_limit(
        state.sqrt_price_x96,
        zero_for_one,
        params.sqrt_price_limit_x96,
    )?;

    let mut amount_remaining = params.amount_specified;
    let mut amount_in: u128 = 0;
    let mut amount_out: u128 = 0;
    let mut fee_amount: u128 = 0;
    let mut sqrt_price_x96 = state.sqrt_price_x96;
    let mut tick = state.tick;
    let mut liquidity = state.liquidity;
    let mut fee_growth_global_0_x64 = state.fee_growth_global_0_x64;
    let mut fee_growth_global_1_x64 = state.fee_growth_global_1_x64;
    let mut crossings: Vec<TickCrossing> = Vec::new(env);
    let mut exhausted = false;

    while amount_remaining != 0 && sqrt_price_x96 != sqrt_price_limit {
        if crossings.len() >= MAX_TICK_CROSSINGS_PER_SWAP {
            exhausted = true;
            break;
        }
        let Some(tick_next) = next_initialized_tick(env, tick, config.tick_spacing, zero_for_one)
        else {
            exhausted = true;
            break;
        };

        let sqrt_price_next_x96 = get_sqrt_ratio_at_tick(env, tick_next)?;
        let sqrt_ratio_target_x96 = if zero_for_one {
            sqrt_price_next_x96.max(sqrt_price_limit)
        } else {
            sqrt_price_next_x96.min(sqrt_price_limit)
        };

        let sqrt_price_start_x96 = sqrt_price_x96;
        let step = compute_swap_step(
            env,
            sqrt_price_x96,
            sqrt_ratio_target_x96,
            liquidity,
            amount_remaining,
            config.fee,
        )?;

        let step_in = step
            .amount_in
            .checked_add(step.fee_amount)
            .ok_or(PoolError::ArithmeticOverflow)?;
        amount_in = amount_in
            .checked_add(step_in)
            .ok_or(PoolError::ArithmeticOverflow)?;
        amount_out = amount_out
            .checked_add(step.amount_out)
            .ok_or(PoolError::ArithmeticOverflow)?;
        fee_amount = fee_amount
            .checked_add(step.fee_amount)
            .ok_or(PoolError::ArithmeticOverflow)?;

        amount_remaining = if exact_input {
            amount_remaining.checked_sub(to_i128(step_in)?)
        } else {
            amount_remaining.checked_add(to_i128(step.amount_out)?)
        }
        .ok_or(PoolError::ArithmeticOverflow)?;

        // Fees are distributed over the liquidity active during the step
        if liquidity > 0 && step.fee_amount > 0 {
            let growth = mul_div(env, step.fee_amount, Q64, liquidity)?;
            let accumulator = if zero_for_one {
                &mut fee_growth_global_0_x64
            } else {
                &mut fee_growth_global_1_x64
            };
            *accumulator = accumulator
                .checked_add(growth)
                .ok_or(PoolError::ArithmeticOverflow)?;
        }

        sqrt_price_x96 = step.sqrt_ratio_next_x96;

        if sqrt_price_x96 == sqrt_price_next_x96 {
            let liquidity_net = get_tick(env, tick_next).liquidity_net;
            crossings.push_back(TickCrossing {
                tick: tick_next,
                fee_growth_global_0_x64,
                fee_growth_global_1_x64,
            });

            // Moving left applies the net in reverse
            let liquidity_delta = if zero_for_one {
                liquidity_net
                    .checked_neg()
                    .ok_or(PoolError::ArithmeticOverflow)?
            } else {
                liquidity_net
            };
            liquidity = add_delta(liquidity, liquidity_delta)?;
            tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if sqrt_price_x96 != sqrt_price_start_x96 {
            tick = get_tick_at_sqrt_ratio(env, sqrt_price_x96)?;
        }
    }

    Ok(SwapComputation {
        amount_in,
        amount_out,
        fee_amount,
        sqrt_price_x96,
        tick,
        liquidity,
        fee_growth_global_0_x64,
        fee_growth_global_1_x64,
        crossings,
        exhausted,
    })
}

/// Exact output must be met in full, and some input must have been used
fn check_fill(params: &SwapParams, computation: &SwapComputation) -> Result<(), PoolError> {
    if params.amount_specified < 0
        && computation.amount_out < params.amount_specified.unsigned_abs()
    {
        return Err(PoolError::InsufficientLiquidity);
    }
    if computation.amount_in == 0 {
        return Err(PoolError::InsufficientLiquidity);
    }
    Ok(())
}

/// Zero selects the price-domain bound on the swap's side
fn resolve_price_limit(
    sqrt_price_x96: u128,
    zero_for_one: bool,
    sqrt_price_limit_x96: u128,
) -> Result<u128, PoolError> {
    if zero_for_one {
        let limit = if sqrt_price_limit_x96 == 0 {
            MIN_SQRT_RATIO
        } else {
            sqrt_price_limit_x96
        };
        if limit >= sqrt_price_x96 || limit < MIN_SQRT_RATIO {
            return Err(PoolError::InvalidPriceLimit);
        }
        Ok(limit)
    } else {
        let limit = if sqrt_price_limit_x96 == 0 {
            MAX_SQRT_RATIO - 1
        } else {
            sqrt_price_limit_x96
        };
        if limit <= sqrt_price_x96 || limit >= MAX_SQRT_RATIO {
            return Err(PoolError::InvalidPriceLimit);
        }
        Ok(limit)
    }
}
