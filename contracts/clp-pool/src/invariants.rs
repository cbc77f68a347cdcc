// ============================================================================
// INVARIANTS
// ============================================================================
//
// Pure predicates over pool state, checked with debug_assert! after each
// mutation and exercised directly by the tests.
//
// 1. PRICE      sqrt price stays inside the tick domain, swaps move it
//               only in their own direction
// 2. FEES       global fee growth never decreases
// 3. RESERVES   a swap adds exactly its input and removes exactly its output
// 4. CROSSINGS  a swap crosses at most MAX_TICK_CROSSINGS_PER_SWAP ticks
//
// ============================================================================

use clp_types::{PoolState, MAX_SQRT_RATIO, MIN_SQRT_RATIO};

// ============================================================================
// PRICE
// ============================================================================

/// MIN_SQRT_RATIO <= sqrt_price_x96 < MAX_SQRT_RATIO
pub fn price_in_bounds(state: &PoolState) -> bool {
    state.sqrt_price_x96 >= MIN_SQRT_RATIO && state.sqrt_price_x96 < MAX_SQRT_RATIO
}

/// Selling token0 never raises the price, selling token1 never lowers it
pub fn swap_direction_consistent(
    zero_for_one: bool,
    sqrt_price_before: u128,
    sqrt_price_after: u128,
) -> bool {
    if zero_for_one {
        sqrt_price_after <= sqrt_price_before
    } else {
        sqrt_price_after >= sqrt_price_before
    }
}

// ============================================================================
// FEES
// ============================================================================

/// Accumulators use checked addition, so any decrease is a bug
pub fn fee_growth_monotonic(before: &PoolState, after: &PoolState) -> bool {
    after.fee_growth_global_0_x64 >= before.fee_growth_global_0_x64
        && after.fee_growth_global_1_x64 >= before.fee_growth_global_1_x64
}

// ============================================================================
// RESERVES
// ============================================================================

pub fn swap_reserves_conserved(
    before: &PoolState,
    after: &PoolState,
    zero_for_one: bool,
    amount_in: u128,
    amount_out: u128,
) -> bool {
    let (in_before, in_after, out_before, out_after) = if zero_for_one {
        (before.reserve0, after.reserve0, before.reserve1, after.reserve1)
    } else {
        (before.reserve1, after.reserve1, before.reserve0, after.reserve0)
    };
    in_before.checked_add(amount_in) == Some(in_after)
        && out_before.checked_sub(amount_out) == Some(out_after)
}

// ============================================================================
// CROSSINGS
// ============================================================================

pub fn tick_crossings_bounded(ticks_crossed: u32, max_crossings: u32) -> bool {
    ticks_crossed <= max_crossings
}
