use clp_math::to_i128;
use clp_types::PoolError;
use soroban_sdk::{token, Address};

/// Fungible-token debit/credit used by the pool
pub trait TokenTransfer {
    fn transfer(&self, from: &Address, to: &Address, amount: i128) -> Result<(), PoolError>;
}

impl TokenTransfer for token::Client<'_> {
    fn transfer(&self, from: &Address, to: &Address, amount: i128) -> Result<(), PoolError> {
        if self.balance(from) < amount {
            return Err(PoolError::InsufficientCallerBalance);
        }
        match self.try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(PoolError::TransferFailed),
        }
    }
}

/// Move `amount` from `from` to `to`; zero amounts are skipped
pub fn settle<T: TokenTransfer>(
    token: &T,
    from: &Address,
    to: &Address,
    amount: u128,
) -> Result<(), PoolError> {
    if amount == 0 {
        return Ok(());
    }
    token.transfer(from, to, to_i128(amount)?)
}
