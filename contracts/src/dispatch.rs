//! ABI entry point: raw `IArrakisMetaVault` calldata in, return data out.

use alloy_primitives::{aliases::U160, Address, Bytes};
use alloy_sol_types::{SolCall, SolInterface};
use metavault_protocol::abi::IArrakisMetaVault::{self, IArrakisMetaVaultCalls};
use metavault_protocol::VaultError;

use crate::call::VaultCall;
use crate::meta_vault::MetaVault;

/// Read-only functions of the interface.
#[derive(Debug, Clone, Copy)]
enum View {
    WhitelistedModules,
    TotalUnderlying,
    TotalUnderlyingAtPrice(U160),
    GetInits,
    VaultType,
    Token0,
    Token1,
    Manager,
    Module,
}

/// A decoded call, split by whether it may change state.
enum Routed {
    Mutate(VaultCall),
    View(View),
}

impl MetaVault {
    /// Decodes `calldata`, runs the call and returns its ABI-encoded return
    /// data.
    ///
    /// Mutating calls return empty data. On failure the error's
    /// [`revert_data`](VaultError::revert_data) is what an EVM caller would
    /// observe.
    ///
    /// # Errors
    ///
    /// [`VaultError::UnknownSelector`] if no function matches,
    /// [`VaultError::InvalidCalldata`] if the arguments do not decode, and
    /// any error of the routed operation.
    pub fn call_abi(&mut self, caller: Address, calldata: &[u8]) -> Result<Bytes, VaultError> {
        match route(decode(calldata)?) {
            Routed::Mutate(call) => {
                self.execute(caller, call)?;
                Ok(Bytes::new())
            }
            Routed::View(view) => self.view(view),
        }
    }

    /// Runs `calldata` if it is a well-formed call to a read-only function.
    ///
    /// Returns `Ok(None)` for mutating or undecodable calldata, which must go
    /// through [`call_abi`](Self::call_abi) instead.
    ///
    /// # Errors
    ///
    /// Any error of the view itself, typically [`VaultError::CallFailed`].
    pub fn view_abi(&self, calldata: &[u8]) -> Result<Option<Bytes>, VaultError> {
        match decode(calldata).map(route) {
            Ok(Routed::View(view)) => self.view(view).map(Some),
            Ok(Routed::Mutate(_)) | Err(_) => Ok(None),
        }
    }

    fn view(&self, view: View) -> Result<Bytes, VaultError> {
        let data = match view {
            View::WhitelistedModules => IArrakisMetaVault::whitelistedModulesCall::abi_encode_returns(
                &(self.whitelisted_modules(),),
            ),
            View::TotalUnderlying => {
                IArrakisMetaVault::totalUnderlyingCall::abi_encode_returns(&self.total_underlying()?)
            }
            View::TotalUnderlyingAtPrice(price_x96) => {
                IArrakisMetaVault::totalUnderlyingAtPriceCall::abi_encode_returns(
                    &self.total_underlying_at_price(price_x96)?,
                )
            }
            View::GetInits => IArrakisMetaVault::getInitsCall::abi_encode_returns(&self.get_inits()?),
            View::VaultType => {
                IArrakisMetaVault::vaultTypeCall::abi_encode_returns(&(self.vault_type()?,))
            }
            View::Token0 => IArrakisMetaVault::token0Call::abi_encode_returns(&(self.token0(),)),
            View::Token1 => IArrakisMetaVault::token1Call::abi_encode_returns(&(self.token1(),)),
            View::Manager => IArrakisMetaVault::managerCall::abi_encode_returns(&(self.manager(),)),
            View::Module => IArrakisMetaVault::moduleCall::abi_encode_returns(&(self.module(),)),
        };
        Ok(Bytes::from(data))
    }
}

fn route(call: IArrakisMetaVaultCalls) -> Routed {
    use IArrakisMetaVaultCalls as C;

    match call {
        C::setManager(c) => Routed::Mutate(VaultCall::SetManager { new_manager: c.newManager_ }),
        C::setModule(c) => Routed::Mutate(VaultCall::SetModule {
            module: c.module_,
            payloads: c.payloads_,
        }),
        C::whitelistModules(c) => Routed::Mutate(VaultCall::WhitelistModules { modules: c.modules_ }),
        C::blacklistModules(c) => Routed::Mutate(VaultCall::BlacklistModules { modules: c.modules_ }),
        C::deposit(c) => Routed::Mutate(VaultCall::Deposit { proportion: c.proportion_ }),
        C::withdraw(c) => Routed::Mutate(VaultCall::Withdraw {
            proportion: c.proportion_,
            receiver: c.receiver_,
        }),
        C::withdrawManagerBalance(_) => Routed::Mutate(VaultCall::WithdrawManagerBalance),

        C::whitelistedModules(_) => Routed::View(View::WhitelistedModules),
        C::totalUnderlying(_) => Routed::View(View::TotalUnderlying),
        C::totalUnderlyingAtPrice(c) => Routed::View(View::TotalUnderlyingAtPrice(c.priceX96)),
        C::getInits(_) => Routed::View(View::GetInits),
        C::vaultType(_) => Routed::View(View::VaultType),
        C::token0(_) => Routed::View(View::Token0),
        C::token1(_) => Routed::View(View::Token1),
        C::manager(_) => Routed::View(View::Manager),
        C::module(_) => Routed::View(View::Module),
    }
}

fn decode(calldata: &[u8]) -> Result<IArrakisMetaVaultCalls, VaultError> {
    let selector: [u8; 4] = calldata
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| VaultError::InvalidCalldata("calldata shorter than a selector".into()))?;
    if !IArrakisMetaVaultCalls::valid_selector(selector) {
        return Err(VaultError::UnknownSelector(selector));
    }
    IArrakisMetaVaultCalls::abi_decode(calldata, true)
        .map_err(|e| VaultError::InvalidCalldata(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModuleRegistry;
    use crate::meta_vault::VaultInit;
    use crate::reserve_module::{ReserveModule, VaultKind};
    use alloy_primitives::{address, U256};

    const OWNER: Address = address!("00000000000000000000000000000000000000a1");
    const MANAGER: Address = address!("00000000000000000000000000000000000000a2");

    const M0: Address = address!("0000000000000000000000000000000000000100");

    fn vault() -> MetaVault {
        let mut registry = ModuleRegistry::new();
        registry
            .deploy(
                M0,
                Box::new(ReserveModule::new(VaultKind::Public, (U256::from(1u64), U256::from(1u64)))),
            )
            .unwrap();
        MetaVault::new(
            VaultInit {
                owner: OWNER,
                manager: MANAGER,
                token0: address!("000000000000000000000000000000000000000a"),
                token1: address!("000000000000000000000000000000000000000b"),
                module: M0,
            },
            registry,
        )
        .unwrap()
    }

    #[test]
    fn short_calldata_is_invalid() {
        let err = vault().call_abi(OWNER, &[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, VaultError::InvalidCalldata(_)));
        assert!(err.revert_data().is_empty());
    }

    #[test]
    fn unknown_selector_is_reported() {
        let err = vault().call_abi(OWNER, &[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert_eq!(err, VaultError::UnknownSelector([0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn truncated_arguments_are_invalid() {
        let mut calldata = IArrakisMetaVault::setManagerCall::SELECTOR.to_vec();
        calldata.extend_from_slice(&[0u8; 8]);
        let err = vault().call_abi(OWNER, &calldata).unwrap_err();
        assert!(matches!(err, VaultError::InvalidCalldata(_)));
    }

    #[test]
    fn manager_getter_returns_abi_word() {
        let calldata = IArrakisMetaVault::managerCall {}.abi_encode();
        let data = vault().call_abi(OWNER, &calldata).unwrap();
        let decoded = IArrakisMetaVault::managerCall::abi_decode_returns(&data, true).unwrap();
        assert_eq!(decoded._0, MANAGER);
    }

    #[test]
    fn view_abi_answers_read_only_calls() {
        let vault = vault();
        let calldata = IArrakisMetaVault::moduleCall {}.abi_encode();
        let data = vault.view_abi(&calldata).unwrap().unwrap();
        let decoded = IArrakisMetaVault::moduleCall::abi_decode_returns(&data, true).unwrap();
        assert_eq!(decoded._0, M0);
    }

    #[test]
    fn view_abi_declines_mutating_and_malformed_calls() {
        let vault = vault();
        let set_manager = IArrakisMetaVault::setManagerCall {
            newManager_: OWNER,
        }
        .abi_encode();
        assert_eq!(vault.view_abi(&set_manager), Ok(None));
        assert_eq!(vault.view_abi(&[0xde, 0xad, 0xbe, 0xef]), Ok(None));
        assert_eq!(vault.view_abi(&[0x01]), Ok(None));
    }
}
