use crate::storage::{is_locked, set_locked};
use clp_types::PoolError;
use soroban_sdk::Env;

/// Marks a state-changing call as in progress for as long as it is alive.
///
/// Acquired at the top of every mutating entry point. Dropping the guard
/// releases the lock, so `?` early returns release it as well.
pub struct ReentrancyGuard<'a> {
    env: &'a Env,
}

impl<'a> ReentrancyGuard<'a> {
    pub fn acquire(env: &'a Env) -> Result<Self, PoolError> {
        if is_locked(env) {
            return Err(PoolError::Reentrancy);
        }
        set_locked(env, true);
        Ok(Self { env })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        set_locked(self.env, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::Env;

    fn with_contract<F, R>(env: &Env, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let contract_id = env.register(crate::ConcentratedPool, ());
        env.as_contract(&contract_id, f)
    }

    #[test]
    fn test_guard_blocks_nested_acquire() {
        let env = Env::default();
        with_contract(&env, || {
            let guard = ReentrancyGuard::acquire(&env).unwrap();
            assert!(is_locked(&env));
            assert!(matches!(
                ReentrancyGuard::acquire(&env),
                Err(PoolError::Reentrancy)
            ));
            drop(guard);
            assert!(!is_locked(&env));
        });
    }

    #[test]
    fn test_guard_released_on_error_path() {
        let env = Env::default();
        with_contract(&env, || {
            let failing = || -> Result<(), PoolError> {
                let _guard = ReentrancyGuard::acquire(&env)?;
                Err(PoolError::ZeroAmount)
            };
            assert_eq!(failing(), Err(PoolError::ZeroAmount));
            assert!(!is_locked(&env));
            assert!(ReentrancyGuard::acquire(&env).is_ok());
        });
    }
}
