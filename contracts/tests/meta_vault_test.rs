//! Integration tests for the meta vault governance state machine.
//!
//! These tests drive a vault through construction, manager replacement,
//! whitelist curation, module switches with initialization payloads, and
//! manager-driven deposits and withdrawals against reserve modules.

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use metavault_contracts::{
    MetaVault, ModuleRegistry, ReserveModule, VaultCall, VaultInit, VaultKind,
};
use metavault_protocol::abi::IReserveModule;
use metavault_protocol::config::BASE;
use metavault_protocol::{VaultError, VaultEvent};

const OWNER: Address = address!("00000000000000000000000000000000000000a1");
const MANAGER: Address = address!("00000000000000000000000000000000000000a2");
const NEW_MANAGER: Address = address!("00000000000000000000000000000000000000a3");
const STRANGER: Address = address!("00000000000000000000000000000000000000ff");
const RECEIVER: Address = address!("00000000000000000000000000000000000000e1");
const TOKEN0: Address = address!("000000000000000000000000000000000000000a");
const TOKEN1: Address = address!("000000000000000000000000000000000000000b");
const M0: Address = address!("0000000000000000000000000000000000000100");
const M1: Address = address!("0000000000000000000000000000000000000101");
const M2: Address = address!("0000000000000000000000000000000000000102");
const UNDEPLOYED: Address = address!("0000000000000000000000000000000000000999");

fn u(n: u64) -> U256 {
    U256::from(n)
}

fn init() -> VaultInit {
    VaultInit {
        owner: OWNER,
        manager: MANAGER,
        token0: TOKEN0,
        token1: TOKEN1,
        module: M0,
    }
}

/// Helper: deploys empty reserve modules at M0, M1 and M2.
fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for address in [M0, M1, M2] {
        registry
            .deploy(address, Box::new(ReserveModule::new(VaultKind::Public, (u(1_000), u(2_000)))))
            .unwrap();
    }
    registry
}

/// Helper: a vault whose active module M0 still holds funds.
fn funded_vault() -> MetaVault {
    let mut registry = ModuleRegistry::new();
    registry
        .deploy(
            M0,
            Box::new(ReserveModule::new(VaultKind::Public, (u(1), u(1))).with_reserves((u(5), u(0)))),
        )
        .unwrap();
    registry
        .deploy(M1, Box::new(ReserveModule::new(VaultKind::Public, (u(1), u(1)))))
        .unwrap();
    MetaVault::new(init(), registry).unwrap()
}

fn vault() -> MetaVault {
    MetaVault::new(init(), registry()).unwrap()
}

fn set_inits_payload(init0: u64, init1: u64) -> Bytes {
    IReserveModule::setInitsCall {
        init0: u(init0),
        init1: u(init1),
    }
    .abi_encode()
    .into()
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn construction_scenario() {
    let vault = vault();
    assert_eq!(vault.whitelisted_modules(), vec![M0]);
    assert_eq!(vault.module(), M0);
    assert_eq!(vault.token0(), TOKEN0);
    assert_eq!(vault.token1(), TOKEN1);
    assert_eq!(vault.owner(), OWNER);
    assert_eq!(vault.manager(), MANAGER);
}

#[test]
fn construction_rejects_unordered_tokens() {
    let mut swapped = init();
    swapped.token0 = TOKEN1;
    swapped.token1 = TOKEN0;
    assert_eq!(
        MetaVault::new(swapped, registry()).unwrap_err(),
        VaultError::Token0GtToken1
    );

    let mut same = init();
    same.token1 = TOKEN0;
    assert_eq!(
        MetaVault::new(same, registry()).unwrap_err(),
        VaultError::Token0EqToken1
    );
}

#[test]
fn construction_rejects_zero_manager_and_module() {
    let mut bad = init();
    bad.manager = Address::ZERO;
    assert_eq!(
        MetaVault::new(bad, registry()).unwrap_err(),
        VaultError::AddressZero("manager")
    );

    let mut bad = init();
    bad.module = Address::ZERO;
    assert_eq!(
        MetaVault::new(bad, registry()).unwrap_err(),
        VaultError::AddressZero("module")
    );
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

#[test]
fn set_manager_emits_exactly_once() {
    let mut vault = vault();
    let events = vault
        .execute(OWNER, VaultCall::SetManager { new_manager: NEW_MANAGER })
        .unwrap();

    assert_eq!(vault.manager(), NEW_MANAGER);
    assert_eq!(
        events,
        vec![VaultEvent::LogSetManager {
            old_manager: MANAGER,
            new_manager: NEW_MANAGER
        }]
    );
    let count = vault
        .events()
        .iter()
        .filter(|e| matches!(e, VaultEvent::LogSetManager { .. }))
        .count();
    assert_eq!(count, 1);
}

#[test]
fn set_manager_is_owner_only() {
    let mut vault = vault();
    assert_eq!(
        vault.set_manager(MANAGER, NEW_MANAGER).unwrap_err(),
        VaultError::OnlyManager {
            caller: MANAGER,
            expected: OWNER
        }
    );
    assert_eq!(vault.manager(), MANAGER);
}

#[test]
fn set_manager_rejects_zero_and_same() {
    let mut vault = vault();
    assert_eq!(
        vault.set_manager(OWNER, Address::ZERO).unwrap_err(),
        VaultError::AddressZero("manager")
    );
    assert_eq!(
        vault.set_manager(OWNER, MANAGER).unwrap_err(),
        VaultError::SameManager
    );
    assert_eq!(vault.events().len(), 2);
}

#[test]
fn replaced_manager_loses_its_powers() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    vault.set_manager(OWNER, NEW_MANAGER).unwrap();

    assert!(matches!(
        vault.set_module(MANAGER, M1, vec![]),
        Err(VaultError::OnlyManager { .. })
    ));
    vault.set_module(NEW_MANAGER, M1, vec![]).unwrap();
    assert_eq!(vault.module(), M1);
}

// ---------------------------------------------------------------------------
// Whitelist
// ---------------------------------------------------------------------------

#[test]
fn whitelist_then_switch_scenario() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1, M2]).unwrap();
    vault.set_module(MANAGER, M1, vec![]).unwrap();

    assert_eq!(vault.module(), M1);
    assert_eq!(vault.whitelisted_modules(), vec![M0, M1, M2]);
    assert_eq!(
        vault.events().last(),
        Some(&VaultEvent::LogSetModule {
            module: M1,
            payloads: vec![]
        })
    );
}

#[test]
fn whitelist_rejects_known_module_without_change() {
    let mut vault = vault();
    assert_eq!(
        vault.whitelist_modules(OWNER, vec![M1, M0]).unwrap_err(),
        VaultError::AlreadyWhitelisted(M0)
    );
    assert_eq!(vault.whitelisted_modules(), vec![M0]);
}

#[test]
fn whitelist_rejects_duplicates_within_batch() {
    let mut vault = vault();
    assert_eq!(
        vault.whitelist_modules(OWNER, vec![M1, M1]).unwrap_err(),
        VaultError::AlreadyWhitelisted(M1)
    );
    assert!(!vault.is_whitelisted(&M1));
}

#[test]
fn whitelist_rejects_zero_address() {
    let mut vault = vault();
    assert_eq!(
        vault
            .whitelist_modules(OWNER, vec![M1, Address::ZERO])
            .unwrap_err(),
        VaultError::AddressZero("module")
    );
    assert!(!vault.is_whitelisted(&M1));
}

#[test]
fn whitelist_is_owner_only() {
    let mut vault = vault();
    assert!(matches!(
        vault.whitelist_modules(STRANGER, vec![M1]),
        Err(VaultError::OnlyManager { caller: STRANGER, .. })
    ));
}

#[test]
fn blacklist_removes_modules() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1, M2]).unwrap();
    let events = vault
        .execute(OWNER, VaultCall::BlacklistModules { modules: vec![M2, M1] })
        .unwrap();

    assert_eq!(vault.whitelisted_modules(), vec![M0]);
    assert_eq!(
        events,
        vec![VaultEvent::LogBlackListedModules {
            modules: vec![M2, M1]
        }]
    );
}

#[test]
fn blacklisting_active_module_fails_first() {
    let mut vault = vault();
    assert_eq!(
        vault.blacklist_modules(OWNER, vec![M0]).unwrap_err(),
        VaultError::ActiveModule
    );
    // Even when another entry in the batch is not whitelisted.
    assert_eq!(
        vault.blacklist_modules(OWNER, vec![M0, M2]).unwrap_err(),
        VaultError::ActiveModule
    );
    assert!(vault.is_whitelisted(&M0));
}

#[test]
fn blacklist_rejects_unknown_module() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    assert_eq!(
        vault.blacklist_modules(OWNER, vec![M1, M2]).unwrap_err(),
        VaultError::NotWhitelistedModule(M2)
    );
    assert!(vault.is_whitelisted(&M1));
}

#[test]
fn blacklisted_module_cannot_be_activated() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    vault.blacklist_modules(OWNER, vec![M1]).unwrap();
    assert_eq!(
        vault.set_module(MANAGER, M1, vec![]).unwrap_err(),
        VaultError::NotWhitelistedModule(M1)
    );
}

// ---------------------------------------------------------------------------
// Module switches
// ---------------------------------------------------------------------------

#[test]
fn set_module_rejects_same_and_unlisted() {
    let mut vault = vault();
    assert_eq!(
        vault.set_module(MANAGER, M0, vec![]).unwrap_err(),
        VaultError::SameModule
    );
    assert_eq!(
        vault.set_module(MANAGER, M1, vec![]).unwrap_err(),
        VaultError::NotWhitelistedModule(M1)
    );
    assert_eq!(
        vault.set_module(MANAGER, Address::ZERO, vec![]).unwrap_err(),
        VaultError::AddressZero("module")
    );
}

#[test]
fn set_module_is_manager_only() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    assert_eq!(
        vault.set_module(OWNER, M1, vec![]).unwrap_err(),
        VaultError::OnlyManager {
            caller: OWNER,
            expected: MANAGER
        }
    );
    assert_eq!(vault.module(), M0);
}

#[test]
fn set_module_requires_empty_outgoing_module() {
    let mut vault = funded_vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    assert_eq!(
        vault.set_module(MANAGER, M1, vec![]).unwrap_err(),
        VaultError::ModuleNotEmpty {
            amount0: u(5),
            amount1: U256::ZERO
        }
    );
    assert_eq!(vault.module(), M0);
}

#[test]
fn draining_outgoing_module_unblocks_switch() {
    let mut vault = funded_vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    vault.withdraw(MANAGER, BASE, RECEIVER).unwrap();
    vault.set_module(MANAGER, M1, vec![]).unwrap();
    assert_eq!(vault.module(), M1);
}

#[test]
fn set_module_applies_payloads_in_order() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    let payloads = vec![set_inits_payload(1, 2), set_inits_payload(30, 40)];

    vault.set_module(MANAGER, M1, payloads.clone()).unwrap();

    assert_eq!(vault.get_inits().unwrap(), (u(30), u(40)));
    assert_eq!(
        vault.events().last(),
        Some(&VaultEvent::LogSetModule {
            module: M1,
            payloads
        })
    );
}

#[test]
fn failing_payload_reverts_whole_switch() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    let before = vault.events().len();

    let err = vault
        .set_module(
            MANAGER,
            M1,
            vec![set_inits_payload(7, 7), set_inits_payload(0, 0)],
        )
        .unwrap_err();

    assert!(matches!(err, VaultError::CallFailed { module, .. } if module == M1));
    assert_eq!(vault.module(), M0);
    assert_eq!(vault.modules().get(&M1).unwrap().get_inits(), (u(1_000), u(2_000)));
    assert_eq!(vault.events().len(), before);
}

#[test]
fn payloads_to_undeployed_module_fail() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![UNDEPLOYED]).unwrap();
    let err = vault
        .set_module(MANAGER, UNDEPLOYED, vec![set_inits_payload(1, 1)])
        .unwrap_err();
    assert_eq!(err.name(), "CallFailed");
    assert_eq!(vault.module(), M0);
}

#[test]
fn switching_to_undeployed_module_fails_and_vault_stays_usable() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![UNDEPLOYED, M1]).unwrap();
    let before = vault.events().len();

    let err = vault.set_module(MANAGER, UNDEPLOYED, vec![]).unwrap_err();
    assert!(matches!(err, VaultError::CallFailed { module, .. } if module == UNDEPLOYED));
    assert_eq!(vault.module(), M0);
    assert_eq!(vault.events().len(), before);

    // Views and later switches still work.
    assert_eq!(vault.total_underlying().unwrap(), (u(0), u(0)));
    vault.set_module(MANAGER, M1, vec![]).unwrap();
    assert_eq!(vault.module(), M1);
}

#[test]
fn construction_rejects_undeployed_first_module() {
    let err = MetaVault::new(
        VaultInit {
            module: UNDEPLOYED,
            ..init()
        },
        registry(),
    )
    .unwrap_err();
    assert!(matches!(err, VaultError::CallFailed { module, .. } if module == UNDEPLOYED));
}

// ---------------------------------------------------------------------------
// Deposits & withdrawals
// ---------------------------------------------------------------------------

#[test]
fn deposit_books_amounts_from_module() {
    let mut vault = vault();
    let proportion = BASE / u(4);
    let amounts = vault.deposit(MANAGER, proportion).unwrap();

    assert_eq!(amounts, (u(250), u(500)));
    assert_eq!(vault.total_underlying().unwrap(), (u(250), u(500)));
    assert_eq!(
        vault.events().last(),
        Some(&VaultEvent::LogDeposit {
            proportion,
            amount0: u(250),
            amount1: u(500)
        })
    );
}

#[test]
fn deposit_rejects_zero_proportion_and_non_manager() {
    let mut vault = vault();
    assert_eq!(
        vault.deposit(MANAGER, U256::ZERO).unwrap_err(),
        VaultError::ProportionZero
    );
    assert!(matches!(
        vault.deposit(OWNER, BASE),
        Err(VaultError::OnlyManager { .. })
    ));
}

#[test]
fn withdraw_validates_arguments() {
    let mut vault = funded_vault();
    assert_eq!(
        vault.withdraw(MANAGER, U256::ZERO, RECEIVER).unwrap_err(),
        VaultError::ProportionZero
    );
    assert_eq!(
        vault.withdraw(MANAGER, BASE + u(1), RECEIVER).unwrap_err(),
        VaultError::ProportionGtBase
    );
    assert_eq!(
        vault.withdraw(MANAGER, BASE, Address::ZERO).unwrap_err(),
        VaultError::AddressZero("receiver")
    );
    assert_eq!(vault.total_underlying().unwrap(), (u(5), U256::ZERO));
}

#[test]
fn withdraw_emits_released_amounts() {
    let mut vault = funded_vault();
    let amounts = vault.withdraw(MANAGER, BASE, RECEIVER).unwrap();
    assert_eq!(amounts, (u(5), U256::ZERO));
    assert_eq!(
        vault.events().last(),
        Some(&VaultEvent::LogWithdraw {
            proportion: BASE,
            amount0: u(5),
            amount1: U256::ZERO
        })
    );
}

#[test]
fn manager_balance_accrued_by_payload_is_withdrawn() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    let accrue: Bytes = IReserveModule::accrueManagerFeesCall {
        amount0: u(11),
        amount1: u(13),
    }
    .abi_encode()
    .into();
    vault.set_module(MANAGER, M1, vec![accrue]).unwrap();

    assert_eq!(vault.withdraw_manager_balance(MANAGER).unwrap(), (u(11), u(13)));
    assert_eq!(
        vault.events().last(),
        Some(&VaultEvent::LogWithdrawManagerBalance {
            amount0: u(11),
            amount1: u(13)
        })
    );
    assert_eq!(
        vault.withdraw_manager_balance(MANAGER).unwrap(),
        (U256::ZERO, U256::ZERO)
    );
}

#[test]
fn rejected_calls_leave_event_log_untouched() {
    let mut vault = vault();
    let before = vault.events().to_vec();
    let _ = vault.execute(STRANGER, VaultCall::WithdrawManagerBalance);
    let _ = vault.execute(OWNER, VaultCall::SetManager { new_manager: MANAGER });
    let _ = vault.execute(MANAGER, VaultCall::Deposit { proportion: U256::ZERO });
    assert_eq!(vault.events(), &before[..]);
}

#[test]
fn events_since_returns_suffix() {
    let mut vault = vault();
    vault.whitelist_modules(OWNER, vec![M1]).unwrap();
    assert_eq!(vault.events_since(2).len(), 1);
    assert!(vault.events_since(10).is_empty());
}
