//! The pool aggregate.
//!
//! `Pool` owns every ledger and runs each public operation as a transaction:
//! the state is snapshotted, the operation runs, and either its events are
//! published or the snapshot is restored. Ledger effects are always applied
//! before the outbound transfer or reward call of the same operation, so a
//! failing collaborator leaves nothing behind.

use serde::{Deserialize, Serialize};
use sharepool_types::{Address, Amount, AssetId, RewardAccountId, Timestamp};

use crate::collaborators::{IdentityOracle, RewardSource, ValueTransfer};
use crate::config::{PoolConfig, UnlockPolicy};
use crate::context::CallContext;
use crate::error::{PoolError, Result};
use crate::events::PoolEvent;
use crate::locked_pool::LockedPool;
use crate::operator::OperatorLedger;
use crate::registry::{Member, PowerRegistry};
use crate::rewards::RewardPuller;
use crate::vesting::VestingScheduler;
use crate::withdrawal::{entitlement, WithdrawalLedger};

/// Mutable state of a pool. Cloned as the rollback snapshot of every operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    pub registry: PowerRegistry,
    pub funds: LockedPool,
    pub vesting: VestingScheduler,
    pub ledger: WithdrawalLedger,
    pub rewards: RewardPuller,
}

impl PoolState {
    /// Verify `withdrawn[m] <= floor(unlocked * power[m] / total_power)` for
    /// every member.
    pub fn check_entitlements(&self) -> Result<()> {
        let unlocked = self.funds.unlocked_balance();
        for member in self.registry.members() {
            let entitled = entitlement(unlocked, member.power, self.registry.total_power())?;
            let withdrawn = self.ledger.withdrawn(&member.address);
            if withdrawn > entitled {
                return Err(PoolError::AccountingMismatch(format!(
                    "{} withdrew {} above entitlement {}",
                    member.address, withdrawn, entitled
                )));
            }
        }
        Ok(())
    }
}

/// Per-member line of a [`PoolSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub address: Address,
    pub power: u64,
    pub withdrawn: Amount,
    pub available: Amount,
}

/// Serializable read-only view of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub start_time: Timestamp,
    pub last_unlock_time: Timestamp,
    pub cliff_duration: u64,
    pub period_duration: u64,
    pub unlock_percent: u8,
    pub team_split_percent: u8,
    pub unlock_policy: UnlockPolicy,
    pub unlock_count: u64,
    pub operator: Address,
    pub operator_reserve: Amount,
    pub locked_balance: Amount,
    pub unlocked_balance: Amount,
    pub member_count: u64,
    pub total_power: u64,
    pub members: Vec<MemberSnapshot>,
    pub own_reward_account: Option<RewardAccountId>,
    pub recorded_reward_account: Option<RewardAccountId>,
}

#[derive(Debug)]
pub struct Pool {
    config: PoolConfig,
    operator: OperatorLedger,
    state: PoolState,
    events: Vec<PoolEvent>,
}

/// Run `op` against `state`; publish its events on success, restore the
/// snapshot on failure.
fn transact<T, F>(state: &mut PoolState, events: &mut Vec<PoolEvent>, operation: &'static str, op: F) -> Result<T>
where
    F: FnOnce(&mut PoolState, &mut Vec<PoolEvent>) -> Result<T>,
{
    let snapshot = state.clone();
    let mut pending = Vec::new();

    match op(state, &mut pending) {
        Ok(value) => {
            for event in &pending {
                tracing::info!(operation, event = event.name(), ?event, "pool event");
            }
            events.extend(pending);
            Ok(value)
        }
        Err(e) => {
            *state = snapshot;
            tracing::warn!(operation, error = %e, "operation reverted");
            Err(e)
        }
    }
}

impl Pool {
    /// Create a pool whose vesting clock starts at `start_time`.
    pub fn new(config: PoolConfig, start_time: Timestamp) -> Result<Self> {
        config.validate()?;

        let state = PoolState {
            registry: PowerRegistry::new(),
            funds: LockedPool::new(),
            vesting: VestingScheduler::new(
                start_time,
                config.cliff_duration,
                config.period_duration,
                config.unlock_percent,
                config.unlock_policy,
            ),
            ledger: WithdrawalLedger::new(),
            rewards: RewardPuller::new(),
        };

        tracing::info!(
            operator = %config.operator,
            start_time,
            cliff = config.cliff_duration,
            period = config.period_duration,
            policy = ?config.unlock_policy,
            "pool created"
        );

        Ok(Self {
            operator: OperatorLedger::new(config.operator),
            config,
            state,
            events: Vec::new(),
        })
    }

    /// Receive a payment of `amount` from `ctx.caller`.
    ///
    /// A zero amount changes nothing and publishes no event.
    pub fn deposit(&mut self, ctx: CallContext, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }

        let team_split_percent = self.config.team_split_percent;
        transact(&mut self.state, &mut self.events, "deposit", |state, events| {
            let split = state.funds.deposit(amount, team_split_percent)?;
            tracing::debug!(operator_share = split.operator_share, locked_share = split.locked_share, "deposit split");
            events.push(PoolEvent::ReceivedFunds {
                amount,
                sender: ctx.caller,
            });
            Ok(())
        })
    }

    /// Consume `asset` held by `ctx.caller` for a power grant.
    ///
    /// Returns whether this registration created the member. Refused with
    /// `AccountingMismatch` when the added power would leave an existing member
    /// above its diluted entitlement.
    pub fn register_member(
        &mut self,
        ctx: CallContext,
        oracle: &dyn IdentityOracle,
        asset: AssetId,
    ) -> Result<bool> {
        transact(&mut self.state, &mut self.events, "register_member", |state, events| {
            let registration = state.registry.register(oracle, asset, ctx.caller)?;
            state.check_entitlements()?;
            events.push(PoolEvent::MemberRegistered {
                asset_id: registration.asset,
                owner: registration.owner,
                is_initial: registration.is_initial,
            });
            Ok(registration.is_initial)
        })
    }

    /// Release the next vesting tranche. Members only.
    pub fn unlock(&mut self, ctx: CallContext) -> Result<Amount> {
        transact(&mut self.state, &mut self.events, "unlock", |state, events| {
            if !state.registry.is_member(&ctx.caller) {
                return Err(PoolError::Unauthorized(format!("{} is not a member", ctx.caller)));
            }

            let amount = state.vesting.unlock(&mut state.funds, ctx.now)?;
            events.push(PoolEvent::FundsUnlocked {
                amount,
                sender: ctx.caller,
            });
            Ok(amount)
        })
    }

    /// Amount `member` may withdraw right now.
    pub fn available(&self, member: &Address) -> Result<Amount> {
        self.state
            .ledger
            .available(&self.state.registry, self.state.funds.unlocked_balance(), member)
    }

    /// Withdraw `amount` (or everything available with `use_all`) of the
    /// caller's share and pay it out through `bank`.
    ///
    /// The ledger is updated before the transfer; a rejected transfer reverts
    /// the whole call.
    pub fn withdraw(
        &mut self,
        ctx: CallContext,
        bank: &mut dyn ValueTransfer,
        amount: Amount,
        use_all: bool,
    ) -> Result<Amount> {
        transact(&mut self.state, &mut self.events, "withdraw", |state, events| {
            let unlocked = state.funds.unlocked_balance();
            let paid = state
                .ledger
                .debit(&state.registry, unlocked, &ctx.caller, amount, use_all)?;

            bank.transfer(ctx.caller, paid)?;

            events.push(PoolEvent::BalanceWithdrawn {
                amount: paid,
                sender: ctx.caller,
            });
            Ok(paid)
        })
    }

    /// Withdraw from the operator reserve. Operator only.
    pub fn withdraw_operator_balance(
        &mut self,
        ctx: CallContext,
        bank: &mut dyn ValueTransfer,
        amount: Amount,
        use_all: bool,
    ) -> Result<Amount> {
        let operator = self.operator;
        transact(&mut self.state, &mut self.events, "withdraw_operator_balance", |state, events| {
            let paid = operator.debit(ctx.caller, &mut state.funds, amount, use_all)?;

            bank.transfer(ctx.caller, paid)?;

            events.push(PoolEvent::BalanceWithdrawn {
                amount: paid,
                sender: ctx.caller,
            });
            Ok(paid)
        })
    }

    /// Pull `amount` from a reward account into the locked balance. Members
    /// only.
    pub fn claim(
        &mut self,
        ctx: CallContext,
        source: &mut dyn RewardSource,
        account: RewardAccountId,
        amount: Amount,
    ) -> Result<Amount> {
        let pool_address = self.config.pool_address;
        transact(&mut self.state, &mut self.events, "claim", |state, events| {
            if !state.registry.is_member(&ctx.caller) {
                return Err(PoolError::Unauthorized(format!("{} is not a member", ctx.caller)));
            }

            let withdrawn = state
                .rewards
                .claim(source, &mut state.funds, pool_address, account, amount)?;

            events.push(PoolEvent::RewardsClaimed {
                reward_account_id: account,
                amount_withdrawn: withdrawn,
                claimant: ctx.caller,
            });
            Ok(withdrawn)
        })
    }

    /// Open the pool's own account at the reward source. Operator only.
    pub fn open_reward_account(&mut self, ctx: CallContext, source: &mut dyn RewardSource) -> Result<RewardAccountId> {
        let operator = self.config.operator;
        let pool_address = self.config.pool_address;
        transact(&mut self.state, &mut self.events, "open_reward_account", |state, events| {
            if ctx.caller != operator {
                return Err(PoolError::Unauthorized(format!("{} is not the operator", ctx.caller)));
            }

            let account = state.rewards.open_account(source, pool_address)?;
            events.push(PoolEvent::RewardAccountOpened {
                reward_account_id: account,
            });
            Ok(account)
        })
    }

    /// Record the reward account opened for this pool by its owning minting
    /// system. Owner only.
    pub fn record_reward_account(&mut self, ctx: CallContext, account: RewardAccountId) -> Result<()> {
        let owner = self.config.owner;
        transact(&mut self.state, &mut self.events, "record_reward_account", |state, events| {
            state.rewards.record_account(ctx.caller, owner, account)?;
            events.push(PoolEvent::RewardAccountRecorded {
                reward_account_id: account,
                registrant: ctx.caller,
            });
            Ok(())
        })
    }

    /// Verify the withdrawal invariant for every member.
    pub fn check_invariants(&self) -> Result<()> {
        self.state.check_entitlements()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let mut members: Vec<MemberSnapshot> = self
            .state
            .registry
            .members()
            .map(|m| MemberSnapshot {
                address: m.address,
                power: m.power,
                withdrawn: self.state.ledger.withdrawn(&m.address),
                available: self.available(&m.address).unwrap_or(0),
            })
            .collect();
        members.sort_by(|a, b| a.address.cmp(&b.address));

        PoolSnapshot {
            start_time: self.start_time(),
            last_unlock_time: self.last_unlock_time(),
            cliff_duration: self.cliff_duration(),
            period_duration: self.period_duration(),
            unlock_percent: self.unlock_percent(),
            team_split_percent: self.team_split_percent(),
            unlock_policy: self.state.vesting.policy(),
            unlock_count: self.state.vesting.unlock_count(),
            operator: self.operator(),
            operator_reserve: self.operator_reserve(),
            locked_balance: self.locked_balance(),
            unlocked_balance: self.unlocked_balance(),
            member_count: self.member_count(),
            total_power: self.total_power(),
            members,
            own_reward_account: self.state.rewards.own_account(),
            recorded_reward_account: self.state.rewards.recorded_account(),
        }
    }

    // Read surface

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn start_time(&self) -> Timestamp {
        self.state.vesting.start_time()
    }

    pub fn last_unlock_time(&self) -> Timestamp {
        self.state.vesting.last_unlock_time()
    }

    pub fn cliff_duration(&self) -> u64 {
        self.state.vesting.cliff_duration()
    }

    pub fn period_duration(&self) -> u64 {
        self.state.vesting.period_duration()
    }

    pub fn unlock_percent(&self) -> u8 {
        self.state.vesting.unlock_percent()
    }

    pub fn team_split_percent(&self) -> u8 {
        self.config.team_split_percent
    }

    pub fn operator(&self) -> Address {
        self.operator.operator()
    }

    pub fn operator_reserve(&self) -> Amount {
        self.state.funds.operator_reserve()
    }

    pub fn locked_balance(&self) -> Amount {
        self.state.funds.locked_balance()
    }

    pub fn unlocked_balance(&self) -> Amount {
        self.state.funds.unlocked_balance()
    }

    pub fn member_count(&self) -> u64 {
        self.state.registry.member_count()
    }

    pub fn total_power(&self) -> u64 {
        self.state.registry.total_power()
    }

    pub fn member(&self, address: &Address) -> Option<&Member> {
        self.state.registry.member(address)
    }

    pub fn withdrawn(&self, address: &Address) -> Amount {
        self.state.ledger.withdrawn(address)
    }

    pub fn is_asset_registered(&self, asset: AssetId) -> bool {
        self.state.registry.is_asset_registered(asset)
    }

    pub fn reward_accounts(&self) -> &RewardPuller {
        &self.state.rewards
    }

    /// Events of every committed operation, oldest first.
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Take the committed events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }
}
