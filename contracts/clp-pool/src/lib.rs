#![no_std]

#[cfg(test)]
extern crate std;

mod gate;
mod guard;
mod invariants;
mod liquidity;
mod storage;
mod swap;
mod tick;
mod token;


pub use gate::{PriceGate, PriceGateClient};

use clp_math::{get_tick_at_sqrt_ratio, mul_div_u256};
use clp_types::{
    fee_to_tick_spacing, max_liquidity_per_tick, MintResult, PoolConfig, PoolError, PoolState,
    PositionInfo, PositionKey, SwapParams, SwapResult, TickInfo, MAX_SQRT_RATIO, MIN_SQRT_RATIO,
    Q96,
};
use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, U256};
use storage::{
    extend_instance_ttl, get_config, get_position, get_position_key, get_state, get_tick,
    is_initialized, set_config, set_state,
};

#[contract]
pub struct ConcentratedPool;

#[contractimpl]
impl ConcentratedPool {
    /// Initialize the pool at a starting price.
    ///
    /// Tokens may be given in either order; they are stored sorted.
    /// `tick` must be the tick of `sqrt_price_x96`.
    pub fn initialize(
        env: Env,
        token_a: Address,
        token_b: Address,
        sqrt_price_x96: u128,
        tick: i32,
        fee: u32,
        price_gate: Option<Address>,
    ) -> Result<(), PoolError> {
        if is_initialized(&env) {
            return Err(PoolError::AlreadyInitialized);
        }
        if token_a == token_b {
            return Err(PoolError::IdenticalTokens);
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };

        let tick_spacing = fee_to_tick_spacing(fee)?;
        if !(MIN_SQRT_RATIO..MAX_SQRT_RATIO).contains(&sqrt_price_x96) {
            return Err(PoolError::InvalidSqrtPrice);
        }
        if get_tick_at_sqrt_ratio(&env, sqrt_price_x96)? != tick {
            return Err(PoolError::TickPriceMismatch);
        }

        let config = PoolConfig {
            token0: token0.clone(),
            token1: token1.clone(),
            fee,
            tick_spacing,
            max_liquidity_per_tick: max_liquidity_per_tick(tick_spacing),
            price_gate,
        };
        set_config(&env, &config);
        set_state(&env, &PoolState::new(sqrt_price_x96, tick));

        env.events().publish(
            (symbol_short!("init"),),
            (token0, token1, fee, sqrt_price_x96, tick),
        );
        Ok(())
    }

    /// Add `liquidity` to the owner's position over `[tick_lower, tick_upper)`.
    ///
    /// The owner pays the token amounts the liquidity requires at the
    /// current price, rounded up.
    pub fn mint(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
        token0: Address,
        token1: Address,
    ) -> Result<MintResult, PoolError> {
        owner.require_auth();
        liquidity::mint(&env, owner, tick_lower, tick_upper, liquidity, token0, token1)
    }

    /// Add as much liquidity as `amount0_desired` and `amount1_desired` can fund
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_desired: u128,
        amount1_desired: u128,
        token0: Address,
        token1: Address,
    ) -> Result<MintResult, PoolError> {
        owner.require_auth();
        liquidity::add_liquidity(
            &env,
            owner,
            tick_lower,
            tick_upper,
            amount0_desired,
            amount1_desired,
            token0,
            token1,
        )
    }

    /// Remove liquidity from a position
    ///
    /// # Returns
    /// (amount0, amount1) - Principal paid to the owner
    pub fn burn(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: u128,
    ) -> Result<(u128, u128), PoolError> {
        owner.require_auth();
        liquidity::burn(&env, owner, tick_lower, tick_upper, liquidity)
    }

    /// Collect all fees owed to a position
    ///
    /// # Returns
    /// (amount0, amount1) - Fee amounts paid to the owner
    pub fn collect(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<(u128, u128), PoolError> {
        owner.require_auth();
        liquidity::collect(&env, owner, tick_lower, tick_upper)
    }

    /// Execute a swap
    ///
    /// # Arguments
    /// * `sender` - Pays the input and receives the output
    /// * `token0`, `token1` - Must be the pool's pair in sorted order
    /// * `params` - Direction, exact input (positive) or output (negative),
    ///   slippage bound and optional price limit
    pub fn swap(
        env: Env,
        sender: Address,
        token0: Address,
        token1: Address,
        params: SwapParams,
    ) -> Result<SwapResult, PoolError> {
        sender.require_auth();
        swap::execute_swap(&env, sender, token0, token1, params)
    }

    /// Result `swap` would produce now, before slippage and gate checks
    pub fn quote(env: Env, params: SwapParams) -> Result<SwapResult, PoolError> {
        swap::quote(&env, params)
    }

    // === View Functions ===

    /// Tokens held on behalf of positions
    pub fn get_reserves(env: Env) -> Result<(u128, u128), PoolError> {
        let state = get_state(&env)?;
        Ok((state.reserve0, state.reserve1))
    }

    /// Position snapshot, with fees settled only up to the last touch
    pub fn get_position(
        env: Env,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<PositionInfo, PoolError> {
        get_config(&env)?;
        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        Ok(get_position(&env, &key))
    }

    /// Key of the position assigned `position_id` by its first mint
    pub fn position_key(env: Env, position_id: u64) -> Result<Option<PositionKey>, PoolError> {
        get_config(&env)?;
        Ok(get_position_key(&env, position_id))
    }

    pub fn get_state(env: Env) -> Result<PoolState, PoolError> {
        extend_instance_ttl(&env);
        get_state(&env)
    }

    pub fn get_config(env: Env) -> Result<PoolConfig, PoolError> {
        get_config(&env)
    }

    pub fn get_tick(env: Env, tick: i32) -> Result<TickInfo, PoolError> {
        get_config(&env)?;
        Ok(get_tick(&env, tick))
    }

    /// Next initialized tick at or below `tick` when `lte`, else strictly above
    pub fn next_initialized_tick(env: Env, tick: i32, lte: bool) -> Result<Option<i32>, PoolError> {
        let config = get_config(&env)?;
        Ok(tick::next_initialized_tick(
            &env,
            tick,
            config.tick_spacing,
            lte,
        ))
    }

    /// Current price of token0 in token1 as a Q64.96 value. Prices above
    /// 2^32 need more than 128 bits, so the result is a U256.
    pub fn price_x96(env: Env) -> Result<U256, PoolError> {
        let state = get_state(&env)?;
        let sqrt_price = U256::from_u128(&env, state.sqrt_price_x96);
        mul_div_u256(&env, &sqrt_price, state.sqrt_price_x96, Q96, false)
    }
}
