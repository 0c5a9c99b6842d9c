//! # ABI Surface
//!
//! Solidity-level declarations of the meta vault and of the reference
//! module's initialization calls. Selectors, event topics and error
//! selectors generated here are the wire contract: callers that encode
//! calldata or decode logs against the on-chain interface must interoperate
//! with this crate byte for byte.

use alloy_sol_types::sol;

sol! {
    /// Two-token vault delegating custody to a whitelisted module.
    #[derive(Debug, PartialEq, Eq)]
    interface IArrakisMetaVault {
        error AddressZero(string property);
        error OnlyManager(address caller, address manager);
        error CallFailed();
        error SameModule();
        error SameManager();
        error ModuleNotEmpty(uint256 amount0, uint256 amount1);
        error AlreadyWhitelisted(address module);
        error NotWhitelistedModule(address module);
        error ActiveModule();
        error Token0GtToken1();
        error Token0EqToken1();
        error ProportionZero();
        error ProportionGtBASE();

        event LogDeposit(uint256 proportion, uint256 amount0, uint256 amount1);
        event LogWithdraw(uint256 proportion, uint256 amount0, uint256 amount1);
        event LogWithdrawManagerBalance(uint256 amount0, uint256 amount1);
        event LogSetManager(address oldManager, address newManager);
        event LogSetModule(address module, bytes[] payloads);
        event LogSetFirstModule(address module);
        event LogWhiteListedModules(address[] modules);
        event LogWhitelistedModule(address module);
        event LogBlackListedModules(address[] modules);

        function setManager(address newManager_) external;
        function setModule(address module_, bytes[] calldata payloads_) external;
        function whitelistModules(address[] calldata modules_) external;
        function blacklistModules(address[] calldata modules_) external;
        function deposit(uint256 proportion_) external;
        function withdraw(uint256 proportion_, address receiver_) external;
        function withdrawManagerBalance() external;

        function whitelistedModules() external view returns (address[] memory modules);
        function totalUnderlying() external view returns (uint256 amount0, uint256 amount1);
        function totalUnderlyingAtPrice(uint160 priceX96) external view returns (uint256 amount0, uint256 amount1);
        function getInits() external view returns (uint256 init0, uint256 init1);
        function vaultType() external view returns (bytes32);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function manager() external view returns (address);
        function module() external view returns (address);
    }
}

sol! {
    /// Initialization calls accepted by the reserve module during `setModule`.
    #[derive(Debug, PartialEq, Eq)]
    interface IReserveModule {
        function setInits(uint256 init0, uint256 init1) external;
        function accrueManagerFees(uint256 amount0, uint256 amount1) external;
    }
}

#[cfg(test)]
mod tests {
    use super::IArrakisMetaVault::*;
    use super::IReserveModule::*;
    use alloy_primitives::keccak256;
    use alloy_sol_types::{SolCall, SolError, SolEvent};

    fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature);
        [hash[0], hash[1], hash[2], hash[3]]
    }

    #[test]
    fn function_selectors_match_canonical_signatures() {
        assert_eq!(setManagerCall::SELECTOR, selector("setManager(address)"));
        assert_eq!(
            setModuleCall::SELECTOR,
            selector("setModule(address,bytes[])")
        );
        assert_eq!(
            whitelistModulesCall::SELECTOR,
            selector("whitelistModules(address[])")
        );
        assert_eq!(
            blacklistModulesCall::SELECTOR,
            selector("blacklistModules(address[])")
        );
        assert_eq!(
            totalUnderlyingAtPriceCall::SELECTOR,
            selector("totalUnderlyingAtPrice(uint160)")
        );
        assert_eq!(moduleCall::SELECTOR, selector("module()"));
        assert_eq!(
            setInitsCall::SELECTOR,
            selector("setInits(uint256,uint256)")
        );
    }

    #[test]
    fn error_selectors_match_canonical_signatures() {
        assert_eq!(AddressZero::SELECTOR, selector("AddressZero(string)"));
        assert_eq!(
            OnlyManager::SELECTOR,
            selector("OnlyManager(address,address)")
        );
        assert_eq!(
            ModuleNotEmpty::SELECTOR,
            selector("ModuleNotEmpty(uint256,uint256)")
        );
        assert_eq!(CallFailed::SELECTOR, selector("CallFailed()"));
        assert_eq!(Token0GtToken1::SELECTOR, selector("Token0GtToken1()"));
    }

    #[test]
    fn event_topics_match_canonical_signatures() {
        assert_eq!(LogSetManager::SIGNATURE, "LogSetManager(address,address)");
        assert_eq!(
            LogSetModule::SIGNATURE_HASH,
            keccak256("LogSetModule(address,bytes[])")
        );
        assert_eq!(
            LogWhiteListedModules::SIGNATURE_HASH,
            keccak256("LogWhiteListedModules(address[])")
        );
        assert_eq!(
            LogWhitelistedModule::SIGNATURE_HASH,
            keccak256("LogWhitelistedModule(address)")
        );
        assert_eq!(
            LogDeposit::SIGNATURE_HASH,
            keccak256("LogDeposit(uint256,uint256,uint256)")
        );
    }
}
