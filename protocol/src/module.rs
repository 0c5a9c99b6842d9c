//! # Module Contract
//!
//! A module is the pluggable strategy that actually custodies the vault's
//! two tokens. The vault only ever talks to it through [`Module`]: it reads
//! balances, forwards deposit/withdraw requests, and replays opaque
//! initialization calldata when a module becomes active.
//!
//! Amounts are always computed by the module. The vault never does share
//! math of its own.

use std::fmt;

use alloy_primitives::{aliases::U160, Address, B256, U256};
use thiserror::Error;

/// A `(amount0, amount1)` pair.
pub type Amounts = (U256, U256);

/// Errors a module can raise while handling a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleCallError {
    /// The calldata selector is not handled by this module.
    #[error("unknown selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    /// The calldata could not be decoded.
    #[error("malformed calldata: {0}")]
    Malformed(String),

    /// The module refused the call.
    #[error("reverted: {0}")]
    Reverted(String),

    /// An amount computation overflowed.
    #[error("arithmetic overflow")]
    Overflow,
}

/// The interface every module exposes to the vault.
///
/// Implementations must be cheap enough to clone: the vault stages every
/// mutating call on a copy obtained from [`Module::clone_box`] and only
/// commits it when the whole vault call succeeds.
pub trait Module: Send + Sync + fmt::Debug {
    /// Token amounts currently attributable to the vault.
    fn total_underlying(&self) -> Amounts;

    /// Token amounts attributable to the vault at the given Q64.96 price.
    fn total_underlying_at_price(&self, price_x96: U160) -> Amounts;

    /// Amounts used to price the very first deposit.
    fn get_inits(&self) -> Amounts;

    /// Tag of the vault flavour this module serves.
    fn vault_type(&self) -> B256;

    /// Executes one low-level initialization call.
    fn call(&mut self, payload: &[u8]) -> Result<(), ModuleCallError>;

    /// Takes in `proportion / BASE` of a position and returns the amounts booked.
    fn deposit(&mut self, proportion: U256) -> Result<Amounts, ModuleCallError>;

    /// Releases `proportion / BASE` of the position to `receiver`.
    fn withdraw(&mut self, receiver: Address, proportion: U256)
        -> Result<Amounts, ModuleCallError>;

    /// Pays out and resets the manager's accrued balance.
    fn withdraw_manager_balance(&mut self) -> Result<Amounts, ModuleCallError>;

    /// Clones the module behind a fresh box.
    fn clone_box(&self) -> Box<dyn Module>;
}

impl Clone for Box<dyn Module> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
