use crate::full_math::{mul_div, mul_div_rounding_up};
use crate::sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use clp_types::{PoolError, FEE_DENOMINATOR};
use soroban_sdk::Env;

/// Result of a single swap step computation
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapStepResult {
    /// The sqrt price after this step
    pub sqrt_ratio_next_x96: u128,
    /// Amount of input token consumed, fee excluded
    pub amount_in: u128,
    /// Amount of output token produced
    pub amount_out: u128,
    /// Fee amount taken on top of `amount_in`
    pub fee_amount: u128,
}

/// Compute the result of swapping within a single tick range
///
/// # Arguments
/// * `sqrt_ratio_current_x96` - Current sqrt price
/// * `sqrt_ratio_target_x96` - Target sqrt price (next tick boundary or price limit)
/// * `liquidity` - Available liquidity in this range
/// * `amount_remaining` - Remaining amount to swap (positive = exact input, negative = exact output)
/// * `fee_pips` - Fee in hundredths of a bip (e.g., 3000 = 0.3%)
///
/// Input and fee round up, output rounds down. For exact input the step never
/// consumes more than `amount_remaining`, fee included.
pub fn compute_swap_step(
    env: &Env,
    sqrt_ratio_current_x96: u128,
    sqrt_ratio_target_x96: u128,
    liquidity: u128,
    amount_remaining: i128,
    fee_pips: u32,
) -> Result<SwapStepResult, PoolError> {
    if fee_pips >= FEE_DENOMINATOR {
        return Err(PoolError::InvalidFeeTier);
    }

    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = amount_remaining >= 0;
    let amount_remaining_abs = amount_remaining.unsigned_abs();
    let fee_complement = (FEE_DENOMINATOR - fee_pips) as u128;

    let mut amount_in: u128 = 0;
    let mut amount_out: u128 = 0;

    let sqrt_ratio_next_x96 = if exact_in {
        let amount_remaining_less_fee = mul_div(
            env,
            amount_remaining_abs,
            fee_complement,
            FEE_DENOMINATOR as u128,
        )?;

        amount_in = if zero_for_one {
            get_amount0_delta(env, sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, true)?
        } else {
            get_amount1_delta(env, sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, true)?
        };

        if amount_remaining_less_fee >= amount_in {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_input(
                env,
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        }
    } else {
        amount_out = if zero_for_one {
            get_amount1_delta(env, sqrt_ratio_target_x96, sqrt_ratio_current_x96, liquidity, false)?
        } else {
            get_amount0_delta(env, sqrt_ratio_current_x96, sqrt_ratio_target_x96, liquidity, false)?
        };

        if amount_remaining_abs >= amount_out {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_output(
                env,
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_abs,
                zero_for_one,
            )?
        }
    };

    let reached_target = sqrt_ratio_target_x96 == sqrt_ratio_next_x96;

    // Recompute whichever side was not already computed for the final price
    if zero_for_one {
        if !(reached_target && exact_in) {
            amount_in =
                get_amount0_delta(env, sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out =
                get_amount1_delta(env, sqrt_ratio_next_x96, sqrt_ratio_current_x96, liquidity, false)?;
        }
    } else {
        if !(reached_target && exact_in) {
            amount_in =
                get_amount1_delta(env, sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out =
                get_amount0_delta(env, sqrt_ratio_current_x96, sqrt_ratio_next_x96, liquidity, false)?;
        }
    }

    // Never pay out more than requested
    if !exact_in && amount_out > amount_remaining_abs {
        amount_out = amount_remaining_abs;
    }

    let fee_amount = if exact_in && !reached_target {
        // Whatever input is left over after the price move is taken as fee
        amount_remaining_abs
            .checked_sub(amount_in)
            .ok_or(PoolError::ArithmeticOverflow)?
    } else {
        mul_div_rounding_up(env, amount_in, fee_pips as u128, fee_complement)?
    };

    Ok(SwapStepResult {
        sqrt_ratio_next_x96,
        amount_in,
        amount_out,
        fee_amount,
    })
}
