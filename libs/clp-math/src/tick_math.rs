use crate::full_math::u256_max;
use clp_types::{PoolError, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use soroban_sdk::{Env, U256};

/// 1/sqrt(1.0001^(2^i)) as Q128, for i = 0..19
const INV_SQRT_POWERS_X128: [u128; 19] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
];

fn q128(env: &Env) -> U256 {
    U256::from_u128(env, 1u128 << 64).mul(&U256::from_u128(env, 1u128 << 64))
}

/// Calculate sqrt(1.0001^tick) * 2^96.
///
/// The ratio is built in Q128 from the powers table, inverted for positive
/// ticks and then scaled down to Q96, rounding up. Rounding up keeps
/// `get_tick_at_sqrt_ratio(get_sqrt_ratio_at_tick(t)) == t` for every tick.
pub fn get_sqrt_ratio_at_tick(env: &Env, tick: i32) -> Result<u128, PoolError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(PoolError::InvalidTick);
    }

    let abs_tick = tick.unsigned_abs();
    let mut ratio = q128(env);

    for (bit, factor) in INV_SQRT_POWERS_X128.iter().enumerate() {
        if abs_tick & (1u32 << bit) != 0 {
            ratio = mul_shift_128(env, &ratio, *factor);
        }
    }

    // The table is for negative ticks
    if tick > 0 {
        ratio = u256_max(env).div(&ratio);
    }

    // Q128 -> Q96
    let shift_32 = U256::from_u128(env, 1u128 << 32);
    let mut sqrt_price = ratio.div(&shift_32);
    if ratio.rem_euclid(&shift_32) > U256::from_u32(env, 0) {
        sqrt_price = sqrt_price.add(&U256::from_u32(env, 1));
    }

    sqrt_price.to_u128().ok_or(PoolError::ArithmeticOverflow)
}

/// Greatest tick whose sqrt ratio is at or below `sqrt_price_x96`.
///
/// Rounds toward the lower tick when the price sits between two ticks.
pub fn get_tick_at_sqrt_ratio(env: &Env, sqrt_price_x96: u128) -> Result<i32, PoolError> {
    if !(MIN_SQRT_RATIO..MAX_SQRT_RATIO).contains(&sqrt_price_x96) {
        return Err(PoolError::InvalidSqrtPrice);
    }

    let mut low = MIN_TICK;
    let mut high = MAX_TICK;

    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(env, mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Ok(low)
}

/// x * y / 2^128
fn mul_shift_128(env: &Env, x: &U256, y: u128) -> U256 {
    x.mul(&U256::from_u128(env, y)).div(&q128(env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clp_types::Q96;
    use proptest::prelude::*;
    use soroban_sdk::Env;

    // === get_sqrt_ratio_at_tick tests ===

    #[test]
    fn test_get_sqrt_ratio_at_tick_zero() {
        let env = Env::default();
        assert_eq!(get_sqrt_ratio_at_tick(&env, 0), Ok(Q96));
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_bounds() {
        let env = Env::default();
        assert_eq!(get_sqrt_ratio_at_tick(&env, MIN_TICK), Ok(MIN_SQRT_RATIO));
        assert_eq!(get_sqrt_ratio_at_tick(&env, MAX_TICK), Ok(MAX_SQRT_RATIO));
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_out_of_bounds() {
        let env = Env::default();
        assert_eq!(
            get_sqrt_ratio_at_tick(&env, MIN_TICK - 1),
            Err(PoolError::InvalidTick)
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(&env, MAX_TICK + 1),
            Err(PoolError::InvalidTick)
        );
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_direction() {
        let env = Env::default();
        let sqrt_100 = get_sqrt_ratio_at_tick(&env, 100).unwrap();
        let sqrt_neg_100 = get_sqrt_ratio_at_tick(&env, -100).unwrap();

        assert!(sqrt_100 > Q96);
        assert!(sqrt_neg_100 < Q96);

        // sqrt(1.0001^100) * sqrt(1.0001^-100) = 1
        let product = U256::from_u128(&env, sqrt_100)
            .mul(&U256::from_u128(&env, sqrt_neg_100))
            .div(&U256::from_u128(&env, Q96))
            .to_u128()
            .unwrap();
        let diff = product.abs_diff(Q96);
        assert!(diff < Q96 / 1_000_000);
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_known_value() {
        let env = Env::default();
        // sqrt(1.0001^60) * 2^96 = 79466191966197645195421774833 (rounded up)
        let sqrt_60 = get_sqrt_ratio_at_tick(&env, 60).unwrap();
        let expected = 79466191966197645195421774833u128;
        assert!(sqrt_60.abs_diff(expected) <= 1);
    }

    #[test]
    fn test_get_sqrt_ratio_at_tick_monotonic() {
        let env = Env::default();
        let mut prev = get_sqrt_ratio_at_tick(&env, -10000).unwrap();
        for tick in (-9900..=10000).step_by(100) {
            let sqrt = get_sqrt_ratio_at_tick(&env, tick).unwrap();
            assert!(sqrt > prev, "sqrt price should increase with tick");
            prev = sqrt;
        }
    }

    // === get_tick_at_sqrt_ratio tests ===

    #[test]
    fn test_get_tick_at_sqrt_ratio_q96() {
        let env = Env::default();
        assert_eq!(get_tick_at_sqrt_ratio(&env, Q96), Ok(0));
    }

    #[test]
    fn test_get_tick_at_sqrt_ratio_rounds_down() {
        let env = Env::default();
        let sqrt_1 = get_sqrt_ratio_at_tick(&env, 1).unwrap();
        assert_eq!(get_tick_at_sqrt_ratio(&env, sqrt_1 - 1), Ok(0));
        assert_eq!(get_tick_at_sqrt_ratio(&env, sqrt_1), Ok(1));

        let sqrt_neg_1 = get_sqrt_ratio_at_tick(&env, -1).unwrap();
        assert_eq!(get_tick_at_sqrt_ratio(&env, Q96 - 1), Ok(-1));
        assert_eq!(get_tick_at_sqrt_ratio(&env, sqrt_neg_1 - 1), Ok(-2));
    }

    #[test]
    fn test_get_tick_at_sqrt_ratio_bounds() {
        let env = Env::default();
        assert_eq!(get_tick_at_sqrt_ratio(&env, MIN_SQRT_RATIO), Ok(MIN_TICK));
        assert_eq!(
            get_tick_at_sqrt_ratio(&env, MAX_SQRT_RATIO - 1),
            Ok(MAX_TICK - 1)
        );
        assert_eq!(
            get_tick_at_sqrt_ratio(&env, MIN_SQRT_RATIO - 1),
            Err(PoolError::InvalidSqrtPrice)
        );
        assert_eq!(
            get_tick_at_sqrt_ratio(&env, MAX_SQRT_RATIO),
            Err(PoolError::InvalidSqrtPrice)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_tick_round_trip(tick in MIN_TICK..MAX_TICK) {
            let env = Env::default();
            env.cost_estimate().budget().reset_unlimited();
            let sqrt = get_sqrt_ratio_at_tick(&env, tick).unwrap();
            prop_assert_eq!(get_tick_at_sqrt_ratio(&env, sqrt).unwrap(), tick);
        }

        #[test]
        fn prop_sqrt_ratio_strictly_increasing(tick in MIN_TICK..MAX_TICK) {
            let env = Env::default();
            let lower = get_sqrt_ratio_at_tick(&env, tick).unwrap();
            let upper = get_sqrt_ratio_at_tick(&env, tick + 1).unwrap();
            prop_assert!(upper > lower);
        }
    }
}
