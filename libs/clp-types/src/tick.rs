use soroban_sdk::contracttype;

/// Information stored for each initialized tick.
/// Ticks with no referencing liquidity are not stored at all.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickInfo {
    /// Total liquidity referencing this tick
    pub liquidity_gross: u128,
    /// Net liquidity change when tick is crossed (+ when moving right)
    pub liquidity_net: i128,
    /// Fee growth per unit liquidity on token0 side on the other side of this tick
    pub fee_growth_outside_0_x64: u128,
    /// Fee growth per unit liquidity on token1 side on the other side of this tick
    pub fee_growth_outside_1_x64: u128,
}

impl TickInfo {
    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross > 0
    }
}
