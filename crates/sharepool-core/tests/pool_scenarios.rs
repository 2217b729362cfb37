//! End-to-end pool scenarios against the in-memory collaborators.

use sharepool_core::memory::{MemoryBank, MemoryIdentityOracle, MemoryRewardSource};
use sharepool_core::{CallContext, EligibilityState, Pool, PoolConfig, PoolError, PoolEvent, UnlockPolicy};
use sharepool_types::{Address, AssetId, RewardAccountId, Timestamp};

const START: Timestamp = 1_700_000_000;
const DAY: u64 = 86_400;

struct Fixture {
    pool: Pool,
    oracle: MemoryIdentityOracle,
    bank: MemoryBank,
    rewards: MemoryRewardSource,
    operator: Address,
    owner: Address,
}

fn fixture(cliff: u64, period: u64, unlock_percent: u8, policy: UnlockPolicy) -> Fixture {
    let operator = Address::from_label("operator");
    let owner = Address::from_label("minter");
    let config = PoolConfig {
        cliff_duration: cliff,
        period_duration: period,
        unlock_percent,
        team_split_percent: 10,
        operator,
        owner,
        pool_address: Address::from_label("pool"),
        unlock_policy: policy,
    };

    Fixture {
        pool: Pool::new(config, START).unwrap(),
        oracle: MemoryIdentityOracle::new(),
        bank: MemoryBank::new(),
        rewards: MemoryRewardSource::new(),
        operator,
        owner,
    }
}

/// Issue asset `asset` to `label` and register it.
fn join(f: &mut Fixture, label: &str, asset: u64) -> Address {
    let member = Address::from_label(label);
    f.oracle.issue(AssetId(asset), member, EligibilityState::Qualified);
    f.pool
        .register_member(CallContext::new(member, START), &f.oracle, AssetId(asset))
        .unwrap();
    member
}

#[test]
fn test_reference_scenario() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let payer = Address::from_label("payer");

    f.pool.deposit(CallContext::new(payer, START), 1000).unwrap();
    assert_eq!(f.pool.operator_reserve(), 100);
    assert_eq!(f.pool.locked_balance(), 900);

    let alice = join(&mut f, "alice", 1);
    assert_eq!(f.pool.member(&alice).unwrap().power, 1);
    assert_eq!(f.pool.total_power(), 1);

    let ctx = CallContext::new(alice, START);
    assert_eq!(f.pool.unlock(ctx).unwrap(), 450);
    assert_eq!(f.pool.locked_balance(), 450);
    assert_eq!(f.pool.unlocked_balance(), 450);
    assert_eq!(f.pool.available(&alice).unwrap(), 450);

    assert_eq!(f.pool.withdraw(ctx, &mut f.bank, 200, false).unwrap(), 200);
    assert_eq!(f.pool.withdrawn(&alice), 200);
    assert_eq!(f.pool.available(&alice).unwrap(), 250);
    assert_eq!(f.bank.balance_of(&alice), 200);

    let before = f.pool.snapshot();
    let result = f.pool.withdraw(ctx, &mut f.bank, 300, false);
    assert_eq!(result, Err(PoolError::InsufficientFunds { requested: 300, available: 250 }));
    assert_eq!(f.pool.snapshot(), before);
    assert_eq!(f.bank.balance_of(&alice), 200);

    f.pool.check_invariants().unwrap();
}

#[test]
fn test_events_follow_committed_operations() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let payer = Address::from_label("payer");

    f.pool.deposit(CallContext::new(payer, START), 1000).unwrap();
    let alice = join(&mut f, "alice", 1);
    let ctx = CallContext::new(alice, START);
    f.pool.unlock(ctx).unwrap();
    f.pool.withdraw(ctx, &mut f.bank, 0, true).unwrap();
    assert!(f.pool.withdraw(ctx, &mut f.bank, 1, false).is_err());

    assert_eq!(
        f.pool.events(),
        &[
            PoolEvent::ReceivedFunds { amount: 1000, sender: payer },
            PoolEvent::MemberRegistered { asset_id: AssetId(1), owner: alice, is_initial: true },
            PoolEvent::FundsUnlocked { amount: 450, sender: alice },
            PoolEvent::BalanceWithdrawn { amount: 450, sender: alice },
        ]
    );
}

#[test]
fn test_double_registration_is_rejected() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let alice = join(&mut f, "alice", 1);

    let result = f
        .pool
        .register_member(CallContext::new(alice, START), &f.oracle, AssetId(1));
    assert_eq!(result, Err(PoolError::AlreadyRegistered(AssetId(1))));
    assert_eq!(f.pool.total_power(), 1);
    assert_eq!(f.pool.member_count(), 1);
}

#[test]
fn test_asset_transfer_does_not_allow_reuse() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    join(&mut f, "alice", 1);

    // The asset changes hands; the new owner cannot consume it again
    let bob = Address::from_label("bob");
    f.oracle.issue(AssetId(1), bob, EligibilityState::Qualified);
    let result = f.pool.register_member(CallContext::new(bob, START), &f.oracle, AssetId(1));

    assert_eq!(result, Err(PoolError::AlreadyRegistered(AssetId(1))));
    assert!(f.pool.member(&bob).is_none());
}

#[test]
fn test_additional_assets_dilute_without_raising_power() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();

    let alice = join(&mut f, "alice", 1);
    let bob = join(&mut f, "bob", 2);
    // Bob consumes a second asset: total power 3, his own power stays 1
    f.oracle.issue(AssetId(3), bob, EligibilityState::Qualified);
    let is_initial = f
        .pool
        .register_member(CallContext::new(bob, START), &f.oracle, AssetId(3))
        .unwrap();
    assert!(!is_initial);
    assert_eq!(f.pool.total_power(), 3);
    assert_eq!(f.pool.member_count(), 2);

    f.pool.unlock(CallContext::new(alice, START)).unwrap();
    assert_eq!(f.pool.available(&alice).unwrap(), 150);
    assert_eq!(f.pool.available(&bob).unwrap(), 150);
}

#[test]
fn test_registration_cannot_dilute_below_withdrawn() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let payer = CallContext::new(Address::from_label("payer"), START);
    f.pool.deposit(payer, 1000).unwrap();
    let alice = join(&mut f, "alice", 1);
    let ctx = CallContext::new(alice, START);
    f.pool.unlock(ctx).unwrap();
    f.pool.withdraw(ctx, &mut f.bank, 0, true).unwrap();

    // Alice took all 450; a second member would cut her entitlement to 225
    let bob = Address::from_label("bob");
    f.oracle.issue(AssetId(2), bob, EligibilityState::Qualified);
    let result = f.pool.register_member(CallContext::new(bob, START), &f.oracle, AssetId(2));
    assert!(matches!(result, Err(PoolError::AccountingMismatch(_))));
    assert!(!f.pool.is_asset_registered(AssetId(2)));
    assert_eq!(f.pool.total_power(), 1);

    // Once enough is unlocked the same registration goes through
    f.pool.deposit(payer, 1000).unwrap();
    f.pool.unlock(ctx).unwrap();
    assert_eq!(f.pool.unlocked_balance(), 1125);
    assert!(f.pool.register_member(CallContext::new(bob, START), &f.oracle, AssetId(2)).unwrap());
    assert_eq!(f.pool.available(&alice).unwrap(), 112);
    assert_eq!(f.pool.available(&bob).unwrap(), 562);
    f.pool.check_invariants().unwrap();
}

#[test]
fn test_unlock_gates() {
    let mut f = fixture(30 * DAY, 7 * DAY, 10, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 10_000).unwrap();
    let alice = join(&mut f, "alice", 1);
    let ctx = CallContext::new(alice, START);

    let early = f.pool.unlock(ctx.at(START + 29 * DAY));
    assert!(matches!(early, Err(PoolError::CliffNotReached { .. })));
    assert_eq!(f.pool.locked_balance(), 9_000);
    assert_eq!(f.pool.unlocked_balance(), 0);

    assert_eq!(f.pool.unlock(ctx.at(START + 30 * DAY)).unwrap(), 900);
    assert_eq!(f.pool.last_unlock_time(), START + 30 * DAY);

    let soon = f.pool.unlock(ctx.at(START + 36 * DAY));
    assert!(matches!(soon, Err(PoolError::StillVesting { .. })));

    assert_eq!(f.pool.unlock(ctx.at(START + 37 * DAY)).unwrap(), 810);
    assert_eq!(f.pool.unlocked_balance(), 1_710);
}

#[test]
fn test_one_shot_policy() {
    let mut f = fixture(0, DAY, 50, UnlockPolicy::OneShot);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();
    let alice = join(&mut f, "alice", 1);
    let ctx = CallContext::new(alice, START);

    f.pool.unlock(ctx).unwrap();
    assert_eq!(f.pool.last_unlock_time(), 0);
    assert!(matches!(f.pool.unlock(ctx.at(START + 100 * DAY)), Err(PoolError::StillVesting { .. })));
    assert_eq!(f.pool.unlocked_balance(), 450);
}

#[test]
fn test_unlock_requires_membership() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();

    let stranger = CallContext::new(Address::from_label("stranger"), START);
    assert!(matches!(f.pool.unlock(stranger), Err(PoolError::Unauthorized(_))));
    assert_eq!(f.pool.locked_balance(), 900);
}

#[test]
fn test_withdraw_by_non_member() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    join(&mut f, "alice", 1);
    let stranger = Address::from_label("stranger");

    let result = f.pool.withdraw(CallContext::new(stranger, START), &mut f.bank, 1, false);
    assert_eq!(result, Err(PoolError::NotAMember(stranger)));
}

#[test]
fn test_rejected_transfer_rolls_back() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();
    let alice = join(&mut f, "alice", 1);
    let ctx = CallContext::new(alice, START);
    f.pool.unlock(ctx).unwrap();

    f.bank.reject_transfers_to(alice);
    assert!(matches!(
        f.pool.withdraw(ctx, &mut f.bank, 0, true),
        Err(PoolError::Collaborator(_))
    ));
    assert_eq!(f.pool.withdrawn(&alice), 0);

    f.bank.accept_transfers_to(&alice);
    assert_eq!(f.pool.withdraw(ctx, &mut f.bank, 0, true).unwrap(), 450);
    assert_eq!(f.bank.balance_of(&alice), 450);
}

#[test]
fn test_operator_withdrawals() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();
    let op = CallContext::new(f.operator, START);

    let over = f.pool.withdraw_operator_balance(op, &mut f.bank, 101, false);
    assert_eq!(over, Err(PoolError::InsufficientFunds { requested: 101, available: 100 }));
    assert_eq!(f.pool.operator_reserve(), 100);

    let intruder = CallContext::new(Address::from_label("intruder"), START);
    assert!(matches!(
        f.pool.withdraw_operator_balance(intruder, &mut f.bank, 1, false),
        Err(PoolError::Unauthorized(_))
    ));

    assert_eq!(f.pool.withdraw_operator_balance(op, &mut f.bank, 30, false).unwrap(), 30);
    assert_eq!(f.pool.withdraw_operator_balance(op, &mut f.bank, 0, true).unwrap(), 70);
    assert_eq!(f.pool.operator_reserve(), 0);
    assert_eq!(f.bank.balance_of(&f.operator), 100);
    // Beneficiary side untouched
    assert_eq!(f.pool.locked_balance(), 900);
}

#[test]
fn test_operator_transfer_failure_keeps_reserve() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();
    f.bank.reject_transfers_to(f.operator);

    let op = CallContext::new(f.operator, START);
    assert!(f.pool.withdraw_operator_balance(op, &mut f.bank, 0, true).is_err());
    assert_eq!(f.pool.operator_reserve(), 100);
}

#[test]
fn test_claim_from_own_reward_account() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let alice = join(&mut f, "alice", 1);

    let op = CallContext::new(f.operator, START);
    let account = f.pool.open_reward_account(op, &mut f.rewards).unwrap();
    assert_eq!(f.rewards.beneficiary(account), Some(Address::from_label("pool")));
    f.rewards.fund(account, 500);

    let ctx = CallContext::new(alice, START);
    assert_eq!(f.pool.claim(ctx, &mut f.rewards, account, 800).unwrap(), 500);
    assert_eq!(f.pool.locked_balance(), 500);
    assert_eq!(f.pool.operator_reserve(), 0);
    assert_eq!(
        f.pool.events().last(),
        Some(&PoolEvent::RewardsClaimed { reward_account_id: account, amount_withdrawn: 500, claimant: alice })
    );
}

#[test]
fn test_claim_from_recorded_account() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let alice = join(&mut f, "alice", 1);

    let account = f.rewards.open(f.owner);
    f.rewards.fund(account, 50);

    let ctx = CallContext::new(alice, START);
    assert_eq!(
        f.pool.claim(ctx, &mut f.rewards, account, 50),
        Err(PoolError::UnknownRewardAccount(account))
    );

    let intruder = CallContext::new(Address::from_label("intruder"), START);
    assert!(matches!(
        f.pool.record_reward_account(intruder, account),
        Err(PoolError::Unauthorized(_))
    ));

    f.pool.record_reward_account(CallContext::new(f.owner, START), account).unwrap();
    assert_eq!(f.pool.claim(ctx, &mut f.rewards, account, 50).unwrap(), 50);
    assert_eq!(f.pool.locked_balance(), 50);
}

#[test]
fn test_claim_mismatch_rolls_back() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();
    let alice = join(&mut f, "alice", 1);

    let account = f.pool.open_reward_account(CallContext::new(f.operator, START), &mut f.rewards).unwrap();
    f.rewards.fund(account, 500);
    f.rewards.misreport_by(account, 7);
    let events_before = f.pool.events().len();

    let result = f.pool.claim(CallContext::new(alice, START), &mut f.rewards, account, 200);
    assert!(matches!(result, Err(PoolError::AccountingMismatch(_))));
    assert_eq!(f.pool.locked_balance(), 900);
    assert_eq!(f.pool.events().len(), events_before);
}

#[test]
fn test_claim_requires_membership() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let account = f.pool.open_reward_account(CallContext::new(f.operator, START), &mut f.rewards).unwrap();

    let stranger = CallContext::new(Address::from_label("stranger"), START);
    assert!(matches!(
        f.pool.claim(stranger, &mut f.rewards, account, 1),
        Err(PoolError::Unauthorized(_))
    ));
}

#[test]
fn test_open_reward_account_is_operator_only() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    let stranger = CallContext::new(Address::from_label("stranger"), START);
    assert!(matches!(
        f.pool.open_reward_account(stranger, &mut f.rewards),
        Err(PoolError::Unauthorized(_))
    ));

    let op = CallContext::new(f.operator, START);
    let account = f.pool.open_reward_account(op, &mut f.rewards).unwrap();
    assert_eq!(
        f.pool.open_reward_account(op, &mut f.rewards),
        Err(PoolError::RewardAccountExists(account))
    );
    assert_eq!(f.pool.reward_accounts().own_account(), Some(account));
    assert!(!f.pool.reward_accounts().accepts(RewardAccountId(account.get() + 1)));
}

#[test]
fn test_snapshot_serializes() {
    let mut f = fixture(0, 0, 50, UnlockPolicy::Recurring);
    f.pool.deposit(CallContext::new(Address::from_label("payer"), START), 1000).unwrap();
    let alice = join(&mut f, "alice", 1);
    f.pool.unlock(CallContext::new(alice, START)).unwrap();

    let snapshot = f.pool.snapshot();
    assert_eq!(snapshot.members.len(), 1);
    assert_eq!(snapshot.members[0].available, 450);

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"unlocked_balance\":450"));
    assert!(json.contains("\"unlock_policy\":\"recurring\""));
}
