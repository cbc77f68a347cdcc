use soroban_sdk::contracterror;

/// Every failure the pool surfaces to callers.
///
/// Codes are grouped by kind: configuration (1..), input validation (100..),
/// economic (200..), collaborators (300..) and call guard (400).
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum PoolError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidFeeTier = 3,
    /// Token arguments do not match the pool's pair
    TokenMismatch = 4,
    IdenticalTokens = 5,
    /// Sqrt price outside `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)` or zero
    InvalidSqrtPrice = 6,
    /// Supplied tick does not correspond to the supplied sqrt price
    TickPriceMismatch = 7,

    /// Position bounds unordered, off the tick spacing, or out of bounds
    InvalidRange = 100,
    ZeroLiquidity = 101,
    ZeroAmount = 102,
    ArithmeticOverflow = 103,
    DivisionByZero = 104,
    InvalidPriceLimit = 105,
    TickLiquidityExceeded = 106,
    InvalidTick = 107,

    /// Not enough liquidity or reserves to satisfy the request
    InsufficientLiquidity = 200,
    SlippageExceeded = 201,

    InsufficientCallerBalance = 300,
    TransferFailed = 301,
    StalePrice = 302,
    PriceDeviation = 303,
    CircuitOpen = 304,
    PriceGateUnavailable = 305,

    /// A state-changing call is already in progress
    Reentrancy = 400,
}
