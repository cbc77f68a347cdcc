use soroban_sdk::{contracttype, Address};

/// Current pool state - stored in Instance storage for frequent access
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolState {
    /// Current sqrt(price) as Q64.96
    pub sqrt_price_x96: u128,
    /// Current tick index
    pub tick: i32,
    /// Total liquidity currently in range
    pub liquidity: u128,
    /// Fee growth per unit of liquidity for token0 (Q64.64)
    pub fee_growth_global_0_x64: u128,
    /// Fee growth per unit of liquidity for token1 (Q64.64)
    pub fee_growth_global_1_x64: u128,
    /// Token0 held on behalf of positions, principal plus uncollected fees
    pub reserve0: u128,
    /// Token1 held on behalf of positions, principal plus uncollected fees
    pub reserve1: u128,
}

impl PoolState {
    pub fn new(sqrt_price_x96: u128, tick: i32) -> Self {
        Self {
            sqrt_price_x96,
            tick,
            liquidity: 0,
            fee_growth_global_0_x64: 0,
            fee_growth_global_1_x64: 0,
            reserve0: 0,
            reserve1: 0,
        }
    }
}

/// Pool configuration - immutable after `initialize`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    /// Token0 address (lower address)
    pub token0: Address,
    /// Token1 address (higher address)
    pub token1: Address,
    /// Fee tier in hundredths of bps
    pub fee: u32,
    /// Tick spacing for this pool, derived from the fee tier
    pub tick_spacing: i32,
    /// Maximum liquidity per tick
    pub max_liquidity_per_tick: u128,
    /// Oracle and circuit breaker consulted before large swaps
    pub price_gate: Option<Address>,
}

/// Caller-supplied swap request
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapParams {
    /// True if swapping token0 for token1
    pub zero_for_one: bool,
    /// Positive for exact input, negative for exact output
    pub amount_specified: i128,
    /// Exact input: minimum output accepted. Exact output: maximum input accepted.
    pub amount_limit: u128,
    /// Price the swap may not move past; zero means no limit
    pub sqrt_price_limit_x96: u128,
}

/// Realized outcome of a swap
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapResult {
    /// Input taken from the caller, fee included
    pub amount_in: u128,
    /// Output paid to the caller
    pub amount_out: u128,
    /// Portion of `amount_in` retained as LP fees
    pub fee_amount: u128,
    /// Pool price after the swap
    pub sqrt_price_x96: u128,
    /// Pool tick after the swap
    pub tick: i32,
    pub ticks_crossed: u32,
    /// True when an exact-input swap stopped short of its full input, either
    /// past the last initialized tick or at the per-swap crossing cap
    pub exhausted: bool,
}

/// Fee growth snapshot taken when a swap crosses an initialized tick
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TickCrossing {
    pub tick: i32,
    pub fee_growth_global_0_x64: u128,
    pub fee_growth_global_1_x64: u128,
}
