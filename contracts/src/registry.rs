//! # Module Registry
//!
//! Stands in for deployed contract code: maps a module address to the
//! [`Module`] implementation living there. Calling an address with nothing
//! deployed behaves like an EVM call to an account without code and fails
//! with `CallFailed`.
//!
//! Mutations go through [`stage`](ModuleRegistry::stage) /
//! [`commit`](ModuleRegistry::commit): the caller works on a clone and only
//! writes it back once its whole vault call has succeeded.

use std::collections::HashMap;

use alloy_primitives::Address;
use metavault_protocol::{Module, VaultError};
use thiserror::Error;

/// Errors raised while deploying modules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Modules cannot live at the zero address.
    #[error("cannot deploy a module at the zero address")]
    ZeroAddress,

    /// Something is already deployed at this address.
    #[error("a module is already deployed at {0}")]
    AlreadyDeployed(Address),
}

/// Deployed modules keyed by address.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<Address, Box<dyn Module>>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys `module` at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ZeroAddress`] for the zero address and
    /// [`RegistryError::AlreadyDeployed`] if the address is taken.
    pub fn deploy(&mut self, address: Address, module: Box<dyn Module>) -> Result<(), RegistryError> {
        if address.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if self.modules.contains_key(&address) {
            return Err(RegistryError::AlreadyDeployed(address));
        }
        self.modules.insert(address, module);
        Ok(())
    }

    /// Returns the module deployed at `address`, if any.
    pub fn get(&self, address: &Address) -> Option<&dyn Module> {
        self.modules.get(address).map(|m| m.as_ref())
    }

    /// Returns the module at `address` or fails the way a call to an empty
    /// account would.
    pub fn resolve(&self, address: Address) -> Result<&dyn Module, VaultError> {
        self.get(&address).ok_or_else(|| no_code(address))
    }

    /// Clones the module at `address` so it can be mutated speculatively.
    pub fn stage(&self, address: Address) -> Result<Box<dyn Module>, VaultError> {
        self.modules
            .get(&address)
            .map(|m| m.clone_box())
            .ok_or_else(|| no_code(address))
    }

    /// Replaces the module at `address` with a staged copy.
    pub fn commit(&mut self, address: Address, module: Box<dyn Module>) {
        self.modules.insert(address, module);
    }

    /// Number of deployed modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing is deployed.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn no_code(address: Address) -> VaultError {
    VaultError::CallFailed {
        module: address,
        reason: "no module deployed at address".into(),
    }
}
