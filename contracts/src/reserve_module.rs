//! # Reserve Module
//!
//! Reference custody module: holds two token reserves and the manager's
//! accrued fees, with no external market behind it. It is what the node and
//! the test suites deploy behind whitelisted addresses.
//!
//! ## Accounting
//!
//! - A deposit of `proportion` books `reserves * proportion / BASE`,
//!   rounded up. When the reserves are empty it scales `inits` instead,
//!   which is how the very first deposit is priced.
//! - A withdrawal of `proportion` releases `reserves * proportion / BASE`,
//!   rounded down, so the module never pays out more than it holds.
//! - Reserves are not exposed to any price, so
//!   `total_underlying_at_price` equals `total_underlying`.
//!
//! ## Initialization calls
//!
//! Payloads replayed by `setModule` are ABI-encoded `IReserveModule` calls:
//! `setInits(uint256,uint256)` and `accrueManagerFees(uint256,uint256)`.

use std::collections::BTreeMap;

use alloy_primitives::{aliases::U160, Address, B256, U256};
use alloy_sol_types::SolInterface;
use metavault_protocol::abi::IReserveModule::IReserveModuleCalls;
use metavault_protocol::config::{self, BASE};
use metavault_protocol::{Amounts, Module, ModuleCallError};
use serde::{Deserialize, Serialize};

/// Which vault flavour the module serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultKind {
    /// Shares are open to any depositor.
    #[default]
    Public,
    /// A single owner supplies all liquidity.
    Private,
}

impl VaultKind {
    /// The `vaultType()` tag for this flavour.
    pub fn vault_type(self) -> B256 {
        match self {
            VaultKind::Public => config::public_vault_type(),
            VaultKind::Private => config::private_vault_type(),
        }
    }
}

/// In-memory two-token custody module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveModule {
    #[serde(default)]
    kind: VaultKind,
    inits: Amounts,
    #[serde(default)]
    reserves: Amounts,
    #[serde(default)]
    manager_balance: Amounts,
    #[serde(default)]
    withdrawn: BTreeMap<Address, Amounts>,
}

impl ReserveModule {
    /// Creates an empty module with the given first-deposit amounts.
    pub fn new(kind: VaultKind, inits: Amounts) -> Self {
        Self {
            kind,
            inits,
            reserves: (U256::ZERO, U256::ZERO),
            manager_balance: (U256::ZERO, U256::ZERO),
            withdrawn: BTreeMap::new(),
        }
    }

    /// Seeds the reserves, e.g. to model a module that is still funded.
    pub fn with_reserves(mut self, reserves: Amounts) -> Self {
        self.reserves = reserves;
        self
    }

    /// Seeds the manager's accrued balance.
    pub fn with_manager_balance(mut self, balance: Amounts) -> Self {
        self.manager_balance = balance;
        self
    }

    pub fn kind(&self) -> VaultKind {
        self.kind
    }

    pub fn reserves(&self) -> Amounts {
        self.reserves
    }

    pub fn manager_balance(&self) -> Amounts {
        self.manager_balance
    }

    /// Total amounts paid out to `receiver` by withdrawals so far.
    pub fn withdrawn_by(&self, receiver: &Address) -> Amounts {
        self.withdrawn
            .get(receiver)
            .copied()
            .unwrap_or((U256::ZERO, U256::ZERO))
    }
}

impl Module for ReserveModule {
    fn total_underlying(&self) -> Amounts {
        self.reserves
    }

    fn total_underlying_at_price(&self, _price_x96: U160) -> Amounts {
        self.reserves
    }

    fn get_inits(&self) -> Amounts {
        self.inits
    }

    fn vault_type(&self) -> B256 {
        self.kind.vault_type()
    }

    fn call(&mut self, payload: &[u8]) -> Result<(), ModuleCallError> {
        let selector: [u8; 4] = payload
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ModuleCallError::Malformed("calldata shorter than a selector".into()))?;
        if !IReserveModuleCalls::valid_selector(selector) {
            return Err(ModuleCallError::UnknownSelector(selector));
        }
        let call = IReserveModuleCalls::abi_decode(payload, true)
            .map_err(|e| ModuleCallError::Malformed(e.to_string()))?;

        match call {
            IReserveModuleCalls::setInits(c) => {
                if c.init0.is_zero() && c.init1.is_zero() {
                    return Err(ModuleCallError::Reverted("inits are zero".into()));
                }
                self.inits = (c.init0, c.init1);
            }
            IReserveModuleCalls::accrueManagerFees(c) => {
                self.manager_balance = checked_add(self.manager_balance, (c.amount0, c.amount1))?;
            }
        }
        Ok(())
    }

    fn deposit(&mut self, proportion: U256) -> Result<Amounts, ModuleCallError> {
        if proportion.is_zero() {
            return Err(ModuleCallError::Reverted("proportion is zero".into()));
        }
        let basis = if is_empty(self.reserves) {
            self.inits
        } else {
            self.reserves
        };
        if is_empty(basis) {
            return Err(ModuleCallError::Reverted("inits are zero".into()));
        }

        let amounts = (
            mul_div(basis.0, proportion, Rounding::Up)?,
            mul_div(basis.1, proportion, Rounding::Up)?,
        );
        self.reserves = checked_add(self.reserves, amounts)?;
        Ok(amounts)
    }

    fn withdraw(&mut self, receiver: Address, proportion: U256) -> Result<Amounts, ModuleCallError> {
        if proportion > BASE {
            return Err(ModuleCallError::Reverted("proportion exceeds BASE".into()));
        }
        let amounts = (
            mul_div(self.reserves.0, proportion, Rounding::Down)?,
            mul_div(self.reserves.1, proportion, Rounding::Down)?,
        );
        // Rounding down keeps both amounts within the reserves.
        self.reserves = (self.reserves.0 - amounts.0, self.reserves.1 - amounts.1);

        let paid = self
            .withdrawn
            .entry(receiver)
            .or_insert((U256::ZERO, U256::ZERO));
        *paid = checked_add(*paid, amounts)?;
        Ok(amounts)
    }

    fn withdraw_manager_balance(&mut self) -> Result<Amounts, ModuleCallError> {
        Ok(std::mem::replace(
            &mut self.manager_balance,
            (U256::ZERO, U256::ZERO),
        ))
    }

    fn clone_box(&self) -> Box<dyn Module> {
        Box::new(self.clone())
    }
}

#[derive(Clone, Copy)]
enum Rounding {
    Up,
    Down,
}

fn mul_div(amount: U256, proportion: U256, rounding: Rounding) -> Result<U256, ModuleCallError> {
    let product = amount
        .checked_mul(proportion)
        .ok_or(ModuleCallError::Overflow)?;
    let quotient = product / BASE;
    match rounding {
        Rounding::Up if !(product % BASE).is_zero() => Ok(quotient + U256::from(1u64)),
        _ => Ok(quotient),
    }
}

fn checked_add(a: Amounts, b: Amounts) -> Result<Amounts, ModuleCallError> {
    Ok((
        a.0.checked_add(b.0).ok_or(ModuleCallError::Overflow)?,
        a.1.checked_add(b.1).ok_or(ModuleCallError::Overflow)?,
    ))
}

fn is_empty(amounts: Amounts) -> bool {
    amounts.0.is_zero() && amounts.1.is_zero()
}
