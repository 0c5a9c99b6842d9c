//! # Meta Vault
//!
//! Governance state of a two-token vault whose custody is delegated to a
//! pluggable module. The vault itself never moves funds or computes share
//! math; it enforces who may change what, and under which conditions.
//!
//! ## State
//!
//! - `token0` / `token1` and `owner` are fixed at construction.
//! - `manager` is replaced by the owner.
//! - The whitelist is curated by the owner.
//! - The active `module` is switched by the manager, only to a whitelisted
//!   module and only once the outgoing module is empty.
//!
//! ## Atomicity
//!
//! Every operation validates all of its preconditions before touching
//! state. Calls into modules run against a staged clone taken from the
//! [`ModuleRegistry`], which is committed only when the whole operation
//! succeeds; a failing call leaves the vault, its modules and its event log
//! exactly as they were.

use std::collections::HashSet;

use alloy_primitives::{aliases::U160, Address, Bytes, B256, U256};
use metavault_protocol::config::{property, BASE};
use metavault_protocol::{Amounts, Module, ModuleCallError, VaultError, VaultEvent};
use serde::{Deserialize, Serialize};

use crate::access::{self, Operation, Roles};
use crate::call::VaultCall;
use crate::registry::ModuleRegistry;

/// Construction parameters of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultInit {
    pub owner: Address,
    pub manager: Address,
    pub token0: Address,
    pub token1: Address,
    /// First active module. Whitelisted automatically.
    pub module: Address,
}

/// Point-in-time view of a vault, suitable for JSON responses.
///
/// Module-backed fields are `None` when no module is deployed at the
/// active address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSnapshot {
    pub token0: Address,
    pub token1: Address,
    pub owner: Address,
    pub manager: Address,
    pub module: Address,
    pub whitelisted_modules: Vec<Address>,
    pub vault_type: Option<B256>,
    pub inits: Option<Amounts>,
    pub total_underlying: Option<Amounts>,
    pub event_count: usize,
}

/// The vault governance state machine.
#[derive(Debug, Clone)]
pub struct MetaVault {
    token0: Address,
    token1: Address,
    owner: Address,
    manager: Address,
    module: Address,
    whitelisted: HashSet<Address>,
    modules: ModuleRegistry,
    events: Vec<VaultEvent>,
}

impl MetaVault {
    /// Creates a vault and activates its first module.
    ///
    /// Emits `LogWhitelistedModule(module)` then `LogSetFirstModule(module)`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Token0EqToken1`] / [`VaultError::Token0GtToken1`] if the
    ///   pair is not strictly ordered.
    /// - [`VaultError::AddressZero`] for a zero `token0`, `owner`, `manager`
    ///   or `module`, checked in that order.
    /// - [`VaultError::CallFailed`] if nothing is deployed at `module`.
    pub fn new(init: VaultInit, modules: ModuleRegistry) -> Result<Self, VaultError> {
        if init.token0 == init.token1 {
            return Err(VaultError::Token0EqToken1);
        }
        if init.token0 > init.token1 {
            return Err(VaultError::Token0GtToken1);
        }
        // token1 > token0 >= 0, so only token0 can be zero.
        if init.token0.is_zero() {
            return Err(VaultError::AddressZero(property::TOKEN0));
        }
        if init.owner.is_zero() {
            return Err(VaultError::AddressZero(property::OWNER));
        }
        if init.manager.is_zero() {
            return Err(VaultError::AddressZero(property::MANAGER));
        }
        if init.module.is_zero() {
            return Err(VaultError::AddressZero(property::MODULE));
        }
        modules.resolve(init.module)?;

        let mut vault = Self {
            token0: init.token0,
            token1: init.token1,
            owner: init.owner,
            manager: init.manager,
            module: init.module,
            whitelisted: HashSet::from([init.module]),
            modules,
            events: Vec::new(),
        };
        vault.emit(VaultEvent::LogWhitelistedModule {
            module: init.module,
        });
        vault.emit(VaultEvent::LogSetFirstModule {
            module: init.module,
        });

        tracing::info!(
            token0 = %vault.token0,
            token1 = %vault.token1,
            owner = %vault.owner,
            manager = %vault.manager,
            module = %vault.module,
            "vault created"
        );
        Ok(vault)
    }

    // -----------------------------------------------------------------------
    // Owner operations
    // -----------------------------------------------------------------------

    /// Replaces the manager. Owner only.
    ///
    /// # Errors
    ///
    /// [`VaultError::OnlyManager`], [`VaultError::AddressZero`],
    /// [`VaultError::SameManager`].
    pub fn set_manager(&mut self, caller: Address, new_manager: Address) -> Result<(), VaultError> {
        self.authorize(Operation::SetManager, caller)?;
        if new_manager.is_zero() {
            return Err(VaultError::AddressZero(property::MANAGER));
        }
        if new_manager == self.manager {
            return Err(VaultError::SameManager);
        }

        let old_manager = std::mem::replace(&mut self.manager, new_manager);
        self.emit(VaultEvent::LogSetManager {
            old_manager,
            new_manager,
        });
        Ok(())
    }

    /// Adds modules to the whitelist. Owner only; all or nothing.
    ///
    /// # Errors
    ///
    /// [`VaultError::OnlyManager`], [`VaultError::AddressZero`], or
    /// [`VaultError::AlreadyWhitelisted`] for a module that is already
    /// whitelisted or repeated within the batch.
    pub fn whitelist_modules(
        &mut self,
        caller: Address,
        modules: Vec<Address>,
    ) -> Result<(), VaultError> {
        self.authorize(Operation::WhitelistModules, caller)?;

        let mut staged = HashSet::with_capacity(modules.len());
        for module in &modules {
            if module.is_zero() {
                return Err(VaultError::AddressZero(property::MODULE));
            }
            if self.whitelisted.contains(module) || !staged.insert(*module) {
                return Err(VaultError::AlreadyWhitelisted(*module));
            }
        }

        self.whitelisted.extend(staged);
        self.emit(VaultEvent::LogWhiteListedModules { modules });
        Ok(())
    }

    /// Removes modules from the whitelist. Owner only; all or nothing.
    ///
    /// # Errors
    ///
    /// [`VaultError::OnlyManager`], [`VaultError::ActiveModule`] if the batch
    /// contains the active module, or [`VaultError::NotWhitelistedModule`]
    /// for a module that is not whitelisted or repeated within the batch.
    pub fn blacklist_modules(
        &mut self,
        caller: Address,
        modules: Vec<Address>,
    ) -> Result<(), VaultError> {
        self.authorize(Operation::BlacklistModules, caller)?;

        let mut staged = HashSet::with_capacity(modules.len());
        for module in &modules {
            if *module == self.module {
                return Err(VaultError::ActiveModule);
            }
            if !self.whitelisted.contains(module) || !staged.insert(*module) {
                return Err(VaultError::NotWhitelistedModule(*module));
            }
        }

        for module in &staged {
            self.whitelisted.remove(module);
        }
        self.emit(VaultEvent::LogBlackListedModules { modules });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Manager operations
    // -----------------------------------------------------------------------

    /// Switches the active module and replays `payloads` against it.
    /// Manager only.
    ///
    /// The outgoing module must be empty and the new one deployed. Payloads
    /// run in order against a staged copy of the new module; the switch
    /// happens only if all of them succeed.
    ///
    /// # Errors
    ///
    /// [`VaultError::OnlyManager`], [`VaultError::AddressZero`],
    /// [`VaultError::SameModule`], [`VaultError::NotWhitelistedModule`],
    /// [`VaultError::ModuleNotEmpty`], [`VaultError::CallFailed`].
    pub fn set_module(
        &mut self,
        caller: Address,
        new_module: Address,
        payloads: Vec<Bytes>,
    ) -> Result<(), VaultError> {
        self.authorize(Operation::SetModule, caller)?;
        if new_module.is_zero() {
            return Err(VaultError::AddressZero(property::MODULE));
        }
        if new_module == self.module {
            return Err(VaultError::SameModule);
        }
        if !self.whitelisted.contains(&new_module) {
            return Err(VaultError::NotWhitelistedModule(new_module));
        }

        let (amount0, amount1) = self.modules.resolve(self.module)?.total_underlying();
        if !amount0.is_zero() || !amount1.is_zero() {
            return Err(VaultError::ModuleNotEmpty { amount0, amount1 });
        }

        // The active module always has code.
        let mut staged = self.modules.stage(new_module)?;
        if !payloads.is_empty() {
            for (index, payload) in payloads.iter().enumerate() {
                staged
                    .call(payload)
                    .map_err(|e| call_failed(new_module, format!("payload {index}: {e}")))?;
            }
            self.modules.commit(new_module, staged);
        }

        let old_module = std::mem::replace(&mut self.module, new_module);
        tracing::debug!(from = %old_module, to = %new_module, "active module switched");
        self.emit(VaultEvent::LogSetModule {
            module: new_module,
            payloads,
        });
        Ok(())
    }

    /// Has the active module take in `proportion / BASE` of a position.
    /// Manager only. Returns the amounts the module booked.
    ///
    /// # Errors
    ///
    /// [`VaultError::OnlyManager`], [`VaultError::ProportionZero`],
    /// [`VaultError::CallFailed`].
    pub fn deposit(&mut self, caller: Address, proportion: U256) -> Result<Amounts, VaultError> {
        self.authorize(Operation::Deposit, caller)?;
        if proportion.is_zero() {
            return Err(VaultError::ProportionZero);
        }

        let (amount0, amount1) = self.with_staged_module(|m| m.deposit(proportion))?;
        self.emit(VaultEvent::LogDeposit {
            proportion,
            amount0,
            amount1,
        });
        Ok((amount0, amount1))
    }

    /// Has the active module release `proportion / BASE` of the position to
    /// `receiver`. Manager only. Returns the amounts released.
    ///
    /// # Errors
    ///
    /// [`VaultError::OnlyManager`], [`VaultError::ProportionZero`],
    /// [`VaultError::ProportionGtBase`], [`VaultError::AddressZero`],
    /// [`VaultError::CallFailed`].
    pub fn withdraw(
        &mut self,
        caller: Address,
        proportion: U256,
        receiver: Address,
    ) -> Result<Amounts, VaultError> {
        self.authorize(Operation::Withdraw, caller)?;
        if proportion.is_zero() {
            return Err(VaultError::ProportionZero);
        }
        if proportion > BASE {
            return Err(VaultError::ProportionGtBase);
        }
        if receiver.is_zero() {
            return Err(VaultError::AddressZero(property::RECEIVER));
        }

        let (amount0, amount1) = self.with_staged_module(|m| m.withdraw(receiver, proportion))?;
        self.emit(VaultEvent::LogWithdraw {
            proportion,
            amount0,
            amount1,
        });
        Ok((amount0, amount1))
    }

    /// Collects the manager's accrued balance from the active module.
    /// Manager only.
    pub fn withdraw_manager_balance(&mut self, caller: Address) -> Result<Amounts, VaultError> {
        self.authorize(Operation::WithdrawManagerBalance, caller)?;

        let (amount0, amount1) = self.with_staged_module(|m| m.withdraw_manager_balance())?;
        self.emit(VaultEvent::LogWithdrawManagerBalance { amount0, amount1 });
        Ok((amount0, amount1))
    }

    /// Runs a typed call and returns the events it emitted.
    ///
    /// Rejections are logged at `warn` with the ABI error name.
    pub fn execute(&mut self, caller: Address, call: VaultCall) -> Result<Vec<VaultEvent>, VaultError> {
        let operation = call.operation();
        let cursor = self.events.len();

        let result = match call {
            VaultCall::SetManager { new_manager } => self.set_manager(caller, new_manager),
            VaultCall::SetModule { module, payloads } => self.set_module(caller, module, payloads),
            VaultCall::WhitelistModules { modules } => self.whitelist_modules(caller, modules),
            VaultCall::BlacklistModules { modules } => self.blacklist_modules(caller, modules),
            VaultCall::Deposit { proportion } => self.deposit(caller, proportion).map(drop),
            VaultCall::Withdraw {
                proportion,
                receiver,
            } => self.withdraw(caller, proportion, receiver).map(drop),
            VaultCall::WithdrawManagerBalance => self.withdraw_manager_balance(caller).map(drop),
        };

        match result {
            Ok(()) => Ok(self.events_since(cursor).to_vec()),
            Err(err) => {
                tracing::warn!(
                    %caller,
                    operation = operation.name(),
                    error = err.name(),
                    reason = %err,
                    "vault call rejected"
                );
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    /// The active module.
    pub fn module(&self) -> Address {
        self.module
    }

    /// Whitelisted modules, sorted by address.
    pub fn whitelisted_modules(&self) -> Vec<Address> {
        let mut modules: Vec<Address> = self.whitelisted.iter().copied().collect();
        modules.sort();
        modules
    }

    pub fn is_whitelisted(&self, module: &Address) -> bool {
        self.whitelisted.contains(module)
    }

    /// Amounts held by the active module.
    pub fn total_underlying(&self) -> Result<Amounts, VaultError> {
        Ok(self.active_module()?.total_underlying())
    }

    /// Amounts held by the active module at a Q64.96 price.
    pub fn total_underlying_at_price(&self, price_x96: U160) -> Result<Amounts, VaultError> {
        Ok(self.active_module()?.total_underlying_at_price(price_x96))
    }

    /// First-deposit amounts of the active module.
    pub fn get_inits(&self) -> Result<Amounts, VaultError> {
        Ok(self.active_module()?.get_inits())
    }

    /// Vault type tag reported by the active module.
    pub fn vault_type(&self) -> Result<B256, VaultError> {
        Ok(self.active_module()?.vault_type())
    }

    /// Every event emitted since construction, oldest first.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Events emitted after the first `cursor` events.
    pub fn events_since(&self, cursor: usize) -> &[VaultEvent] {
        self.events.get(cursor..).unwrap_or(&[])
    }

    /// Deployed modules.
    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        let active = self.modules.get(&self.module);
        VaultSnapshot {
            token0: self.token0,
            token1: self.token1,
            owner: self.owner,
            manager: self.manager,
            module: self.module,
            whitelisted_modules: self.whitelisted_modules(),
            vault_type: active.map(|m| m.vault_type()),
            inits: active.map(|m| m.get_inits()),
            total_underlying: active.map(|m| m.total_underlying()),
            event_count: self.events.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn authorize(&self, operation: Operation, caller: Address) -> Result<(), VaultError> {
        let roles = Roles {
            owner: self.owner,
            manager: self.manager,
        };
        access::authorize(operation, caller, &roles)
    }

    fn active_module(&self) -> Result<&dyn Module, VaultError> {
        self.modules.resolve(self.module)
    }

    /// Runs `f` on a staged copy of the active module and commits it on success.
    fn with_staged_module<T>(
        &mut self,
        f: impl FnOnce(&mut dyn Module) -> Result<T, ModuleCallError>,
    ) -> Result<T, VaultError> {
        let module = self.module;
        let mut staged = self.modules.stage(module)?;
        let out = f(staged.as_mut()).map_err(|e| call_failed(module, e.to_string()))?;
        self.modules.commit(module, staged);
        Ok(out)
    }

    fn emit(&mut self, event: VaultEvent) {
        tracing::info!(event = event.name(), index = self.events.len(), "vault event");
        self.events.push(event);
    }
}

fn call_failed(module: Address, reason: String) -> VaultError {
    VaultError::CallFailed { module, reason }
}
