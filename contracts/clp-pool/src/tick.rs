use crate::storage::{
    get_tick, get_tick_bitmap_summary, get_tick_bitmap_word, set_tick, set_tick_bitmap_summary,
    set_tick_bitmap_word,
};
use clp_types::{PoolError, MAX_TICK, MIN_TICK};
use soroban_sdk::Env;

/// Update a tick with liquidity delta
/// Returns true if the tick was flipped (initialized or uninitialized)
#[allow(clippy::too_many_arguments)]
pub fn update(
    env: &Env,
    tick: i32,
    tick_current: i32,
    liquidity_delta: i128,
    fee_growth_global_0_x64: u128,
    fee_growth_global_1_x64: u128,
    upper: bool,
    max_liquidity: u128,
) -> Result<bool, PoolError> {
    let mut info = get_tick(env, tick);

    let liquidity_gross_before = info.liquidity_gross;
    let liquidity_gross_after = clp_math::add_delta(liquidity_gross_before, liquidity_delta)?;

    if liquidity_gross_after > max_liquidity {
        return Err(PoolError::TickLiquidityExceeded);
    }

    let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

    // By convention all growth before a tick is initialized happened below it
    if liquidity_gross_before == 0 && tick <= tick_current {
        info.fee_growth_outside_0_x64 = fee_growth_global_0_x64;
        info.fee_growth_outside_1_x64 = fee_growth_global_1_x64;
    }

    info.liquidity_gross = liquidity_gross_after;

    // Lower tick adds liquidity when crossed upward, upper tick removes it
    info.liquidity_net = if upper {
        info.liquidity_net.checked_sub(liquidity_delta)
    } else {
        info.liquidity_net.checked_add(liquidity_delta)
    }
    .ok_or(PoolError::ArithmeticOverflow)?;

    // Writing an entry with zero gross liquidity removes it
    set_tick(env, tick, &info);

    Ok(flipped)
}

/// Cross a tick during a swap
/// Returns the liquidity delta to apply when moving upward
pub fn cross(
    env: &Env,
    tick: i32,
    fee_growth_global_0_x64: u128,
    fee_growth_global_1_x64: u128,
) -> i128 {
    let mut info = get_tick(env, tick);

    info.fee_growth_outside_0_x64 =
        fee_growth_global_0_x64.wrapping_sub(info.fee_growth_outside_0_x64);
    info.fee_growth_outside_1_x64 =
        fee_growth_global_1_x64.wrapping_sub(info.fee_growth_outside_1_x64);

    set_tick(env, tick, &info);

    info.liquidity_net
}

/// Get fee growth inside a tick range.
///
/// Differences are taken modulo 2^128; only the change between two
/// snapshots of the result is meaningful.
pub fn get_fee_growth_inside(
    env: &Env,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global_0_x64: u128,
    fee_growth_global_1_x64: u128,
) -> (u128, u128) {
    let lower = get_tick(env, tick_lower);
    let upper = get_tick(env, tick_upper);

    let (fee_growth_below_0, fee_growth_below_1) = if tick_current >= tick_lower {
        (lower.fee_growth_outside_0_x64, lower.fee_growth_outside_1_x64)
    } else {
        (
            fee_growth_global_0_x64.wrapping_sub(lower.fee_growth_outside_0_x64),
            fee_growth_global_1_x64.wrapping_sub(lower.fee_growth_outside_1_x64),
        )
    };

    let (fee_growth_above_0, fee_growth_above_1) = if tick_current < tick_upper {
        (upper.fee_growth_outside_0_x64, upper.fee_growth_outside_1_x64)
    } else {
        (
            fee_growth_global_0_x64.wrapping_sub(upper.fee_growth_outside_0_x64),
            fee_growth_global_1_x64.wrapping_sub(upper.fee_growth_outside_1_x64),
        )
    };

    (
        fee_growth_global_0_x64
            .wrapping_sub(fee_growth_below_0)
            .wrapping_sub(fee_growth_above_0),
        fee_growth_global_1_x64
            .wrapping_sub(fee_growth_below_1)
            .wrapping_sub(fee_growth_above_1),
    )
}

// === Tick Bitmap Operations ===
// Level 0: one u128 word per 128 compressed ticks.
// Level 1: one u128 summary per 128 words, bit set while the word is non-empty.

/// (word, bit) of a compressed index
fn position(compressed: i32) -> (i32, u32) {
    (compressed >> 7, compressed.rem_euclid(128) as u32)
}

/// Bits at or below `bit`
fn mask_at_or_below(bit: u32) -> u128 {
    (1u128 << bit) - 1 + (1u128 << bit)
}

/// Bits at or above `bit`
fn mask_at_or_above(bit: u32) -> u128 {
    !((1u128 << bit) - 1)
}

/// Flip a tick in the bitmap
pub fn flip_tick(env: &Env, tick: i32, tick_spacing: i32) -> Result<(), PoolError> {
    if tick % tick_spacing != 0 {
        return Err(PoolError::InvalidTick);
    }

    let (word_pos, bit_pos) = position(tick / tick_spacing);
    let word = get_tick_bitmap_word(env, word_pos);
    let flipped = word ^ (1u128 << bit_pos);
    set_tick_bitmap_word(env, word_pos, flipped);

    // Keep the summary in step when the word becomes empty or non-empty
    if (word == 0) != (flipped == 0) {
        let (summary_pos, summary_bit) = position(word_pos);
        let summary = get_tick_bitmap_summary(env, summary_pos);
        set_tick_bitmap_summary(env, summary_pos, summary ^ (1u128 << summary_bit));
    }

    Ok(())
}

/// Find the next initialized tick within one word
/// Returns (tick, initialized)
pub fn next_initialized_tick_within_one_word(
    env: &Env,
    tick: i32,
    tick_spacing: i32,
    lte: bool, // less than or equal (searching left)
) -> (i32, bool) {
    let compressed = tick.div_euclid(tick_spacing);

    if lte {
        let (word_pos, bit_pos) = position(compressed);
        let masked = get_tick_bitmap_word(env, word_pos) & mask_at_or_below(bit_pos);

        let initialized = masked != 0;
        let next = if initialized {
            let msb = 127 - masked.leading_zeros() as i32;
            ((word_pos * 128) + msb) * tick_spacing
        } else {
            (word_pos * 128) * tick_spacing
        };

        (next, initialized)
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);
        let masked = get_tick_bitmap_word(env, word_pos) & mask_at_or_above(bit_pos);

        let initialized = masked != 0;
        let next = if initialized {
            let lsb = masked.trailing_zeros() as i32;
            ((word_pos * 128) + lsb) * tick_spacing
        } else {
            ((word_pos * 128) + 127) * tick_spacing
        };

        (next, initialized)
    }
}

/// Next initialized tick at or below `tick` (`lte`) or strictly above it.
///
/// Checks the current word, then walks the summary level, so the cost grows
/// with the number of summary words between ticks rather than the tick span.
pub fn next_initialized_tick(env: &Env, tick: i32, tick_spacing: i32, lte: bool) -> Option<i32> {
    let (next, initialized) = next_initialized_tick_within_one_word(env, tick, tick_spacing, lte);
    if initialized {
        return Some(next);
    }

    let compressed = tick.div_euclid(tick_spacing);
    let (word_pos, _) = if lte {
        position(compressed)
    } else {
        position(compressed + 1)
    };

    let word_pos = next_non_empty_word(env, word_pos, tick_spacing, lte)?;
    let word = get_tick_bitmap_word(env, word_pos);
    let bit = if lte {
        127 - word.leading_zeros() as i32
    } else {
        word.trailing_zeros() as i32
    };

    Some((word_pos * 128 + bit) * tick_spacing)
}

/// Nearest non-empty bitmap word strictly beyond `word_pos`
fn next_non_empty_word(env: &Env, word_pos: i32, tick_spacing: i32, lte: bool) -> Option<i32> {
    let (min_word, _) = position(MIN_TICK.div_euclid(tick_spacing));
    let (max_word, _) = position(MAX_TICK.div_euclid(tick_spacing));

    let mut target = if lte { word_pos - 1 } else { word_pos + 1 };
    while (min_word..=max_word).contains(&target) {
        let (summary_pos, bit_pos) = position(target);
        let summary = get_tick_bitmap_summary(env, summary_pos);

        let masked = if lte {
            summary & mask_at_or_below(bit_pos)
        } else {
            summary & mask_at_or_above(bit_pos)
        };
        if masked != 0 {
            let bit = if lte {
                127 - masked.leading_zeros() as i32
            } else {
                masked.trailing_zeros() as i32
            };
            return Some(summary_pos * 128 + bit);
        }

        target = if lte {
            summary_pos * 128 - 1
        } else {
            (summary_pos + 1) * 128
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::has_tick;
    use soroban_sdk::Env;

    /// Helper to run test code within a contract context
    fn with_contract<F, R>(env: &Env, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let contract_id = env.register(crate::ConcentratedPool, ());
        env.as_contract(&contract_id, f)
    }

    // === update tests ===

    #[test]
    fn test_update_initializes_tick() {
        let env = Env::default();
        with_contract(&env, || {
            let flipped = update(&env, 100, 0, 1000, 0, 0, false, u128::MAX).unwrap();
            assert!(flipped, "First liquidity addition should flip tick");

            let info = get_tick(&env, 100);
            assert!(info.is_initialized());
            assert_eq!(info.liquidity_gross, 1000);
            assert_eq!(info.liquidity_net, 1000);
        });
    }

    #[test]
    fn test_update_lower_and_upper() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, -100, 0, 1000, 0, 0, false, u128::MAX).unwrap();
            let flipped = update(&env, -100, 0, 500, 0, 0, false, u128::MAX).unwrap();
            assert!(!flipped, "Adding more liquidity should not flip");
            assert_eq!(get_tick(&env, -100).liquidity_net, 1500);

            update(&env, 100, 0, 1000, 0, 0, true, u128::MAX).unwrap();
            let info = get_tick(&env, 100);
            assert_eq!(info.liquidity_gross, 1000);
            assert_eq!(info.liquidity_net, -1000, "Upper tick subtracts from liquidity_net");
        });
    }

    #[test]
    fn test_update_remove_all_liquidity_deletes_entry() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, 0, 0, 1000, 0, 0, false, u128::MAX).unwrap();
            assert!(!update(&env, 0, 0, -400, 0, 0, false, u128::MAX).unwrap());
            assert!(has_tick(&env, 0));

            let flipped = update(&env, 0, 0, -600, 0, 0, false, u128::MAX).unwrap();
            assert!(flipped);
            assert!(!has_tick(&env, 0), "Empty ticks are not stored");
        });
    }

    #[test]
    fn test_update_remove_more_than_gross() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, 0, 0, 10, 0, 0, false, u128::MAX).unwrap();
            assert_eq!(
                update(&env, 0, 0, -11, 0, 0, false, u128::MAX),
                Err(PoolError::ArithmeticOverflow)
            );
        });
    }

    #[test]
    fn test_update_fee_growth_outside_initialization() {
        let env = Env::default();
        with_contract(&env, || {
            // At or below the current tick: all growth counted as outside
            update(&env, -60, 0, 1000, 111, 222, false, u128::MAX).unwrap();
            let below = get_tick(&env, -60);
            assert_eq!(below.fee_growth_outside_0_x64, 111);
            assert_eq!(below.fee_growth_outside_1_x64, 222);

            // Above the current tick: nothing outside yet
            update(&env, 60, 0, 1000, 111, 222, true, u128::MAX).unwrap();
            let above = get_tick(&env, 60);
            assert_eq!(above.fee_growth_outside_0_x64, 0);
            assert_eq!(above.fee_growth_outside_1_x64, 0);
        });
    }

    #[test]
    fn test_update_exceeds_max_liquidity() {
        let env = Env::default();
        with_contract(&env, || {
            assert_eq!(
                update(&env, 0, 0, 1001, 0, 0, false, 1000),
                Err(PoolError::TickLiquidityExceeded)
            );
            assert!(!has_tick(&env, 0));
        });
    }

    // === cross tests ===

    #[test]
    fn test_cross_flips_fee_growth() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, -60, 0, 1000, 100, 50, false, u128::MAX).unwrap();

            let net = cross(&env, -60, 300, 80);
            assert_eq!(net, 1000);

            let info = get_tick(&env, -60);
            assert_eq!(info.fee_growth_outside_0_x64, 200);
            assert_eq!(info.fee_growth_outside_1_x64, 30);
        });
    }

    // === get_fee_growth_inside tests ===

    #[test]
    fn test_fee_growth_inside_in_range() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, -60, 0, 1000, 10, 20, false, u128::MAX).unwrap();
            update(&env, 60, 0, 1000, 10, 20, true, u128::MAX).unwrap();

            // global grew from (10, 20) to (110, 70) while in range
            let (inside_0, inside_1) = get_fee_growth_inside(&env, -60, 60, 0, 110, 70);
            assert_eq!(inside_0, 100);
            assert_eq!(inside_1, 50);
        });
    }

    #[test]
    fn test_fee_growth_inside_below_range() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, -60, 0, 1000, 0, 0, false, u128::MAX).unwrap();
            update(&env, 60, 0, 1000, 0, 0, true, u128::MAX).unwrap();

            // 40 accrued in range, then price moves below -60 and 25 more accrue
            cross(&env, -60, 40, 0);
            let (inside_0, _) = get_fee_growth_inside(&env, -60, 60, -61, 65, 0);
            assert_eq!(inside_0, 40);
        });
    }

    #[test]
    fn test_fee_growth_inside_above_range() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, -60, 0, 1000, 0, 0, false, u128::MAX).unwrap();
            update(&env, 60, 0, 1000, 0, 0, true, u128::MAX).unwrap();

            cross(&env, 60, 0, 15);
            let (_, inside_1) = get_fee_growth_inside(&env, -60, 60, 60, 0, 90);
            assert_eq!(inside_1, 15);
        });
    }

    // === flip_tick tests ===

    #[test]
    fn test_flip_tick_sets_and_clears_bit() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, 60, 60).unwrap();
            assert_eq!(get_tick_bitmap_word(&env, 0), 1u128 << 1);
            assert_eq!(get_tick_bitmap_summary(&env, 0), 1);

            flip_tick(&env, 60, 60).unwrap();
            assert_eq!(get_tick_bitmap_word(&env, 0), 0);
            assert_eq!(get_tick_bitmap_summary(&env, 0), 0);
        });
    }

    #[test]
    fn test_flip_tick_negative() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, -60, 60).unwrap();
            // compressed -1 lives in bit 127 of word -1, which is bit 127 of summary -1
            assert_eq!(get_tick_bitmap_word(&env, -1), 1u128 << 127);
            assert_eq!(get_tick_bitmap_summary(&env, -1), 1u128 << 127);
        });
    }

    #[test]
    fn test_flip_tick_not_on_spacing() {
        let env = Env::default();
        with_contract(&env, || {
            assert_eq!(flip_tick(&env, 15, 10), Err(PoolError::InvalidTick));
        });
    }

    // === next_initialized_tick tests ===

    #[test]
    fn test_within_one_word() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, 50, 10).unwrap();

            assert_eq!(next_initialized_tick_within_one_word(&env, 100, 10, true), (50, true));
            assert_eq!(next_initialized_tick_within_one_word(&env, 50, 10, true), (50, true));
            assert_eq!(next_initialized_tick_within_one_word(&env, 0, 10, false), (50, true));
            // Strictly greater when searching right
            assert_eq!(
                next_initialized_tick_within_one_word(&env, 50, 10, false),
                (1270, false)
            );
            assert_eq!(next_initialized_tick_within_one_word(&env, 40, 10, true), (0, false));
        });
    }

    #[test]
    fn test_within_one_word_negative_tick_not_on_spacing() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, -120, 60).unwrap();
            // -61 compresses to -2 (floor), which is tick -120
            assert_eq!(next_initialized_tick_within_one_word(&env, -61, 60, true), (-120, true));
            assert_eq!(next_initialized_tick_within_one_word(&env, -180, 60, false), (-120, true));
        });
    }

    #[test]
    fn test_next_initialized_tick_across_words() {
        let env = Env::default();
        with_contract(&env, || {
            flip_tick(&env, -443580, 60).unwrap();
            flip_tick(&env, 443580, 60).unwrap();

            assert_eq!(next_initialized_tick(&env, 0, 60, true), Some(-443580));
            assert_eq!(next_initialized_tick(&env, 0, 60, false), Some(443580));
            assert_eq!(next_initialized_tick(&env, -443580, 60, true), Some(-443580));
            assert_eq!(next_initialized_tick(&env, -443581, 60, true), None);
            assert_eq!(next_initialized_tick(&env, 443580, 60, false), None);
        });
    }

    #[test]
    fn test_next_initialized_tick_picks_nearest() {
        let env = Env::default();
        with_contract(&env, || {
            for tick in [-19_980, -600, 600, 7_680, 90_000] {
                flip_tick(&env, tick, 60).unwrap();
            }

            assert_eq!(next_initialized_tick(&env, 0, 60, false), Some(600));
            assert_eq!(next_initialized_tick(&env, 600, 60, false), Some(7_680));
            assert_eq!(next_initialized_tick(&env, 7_680, 60, false), Some(90_000));
            assert_eq!(next_initialized_tick(&env, -1, 60, true), Some(-600));
            assert_eq!(next_initialized_tick(&env, -601, 60, true), Some(-19_980));
            assert_eq!(next_initialized_tick(&env, -19_981, 60, true), None);
        });
    }

    #[test]
    fn test_next_initialized_tick_empty() {
        let env = Env::default();
        with_contract(&env, || {
            assert_eq!(next_initialized_tick(&env, 0, 1, true), None);
            assert_eq!(next_initialized_tick(&env, 0, 1, false), None);
        });
    }
}
