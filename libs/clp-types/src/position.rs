use soroban_sdk::{contracttype, Address};

/// Position key for pool-level tracking
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// Position info stored in pool contract
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PositionInfo {
    /// Liquidity in this position
    pub liquidity: u128,
    /// Fee growth inside at last update (token0)
    pub fee_growth_inside_0_last_x64: u128,
    /// Fee growth inside at last update (token1)
    pub fee_growth_inside_1_last_x64: u128,
    /// Uncollected token0 fees
    pub tokens_owed_0: u128,
    /// Uncollected token1 fees
    pub tokens_owed_1: u128,
}

impl PositionInfo {
    /// A position with no liquidity and nothing owed carries no state
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed_0 == 0 && self.tokens_owed_1 == 0
    }
}

/// Returned by `mint` and `add_liquidity`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MintResult {
    pub position_id: u64,
    pub liquidity: u128,
    /// Token0 debited from the owner
    pub amount0: u128,
    /// Token1 debited from the owner
    pub amount1: u128,
}
