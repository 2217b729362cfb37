//! Scenario scripts and their replay.
//!
//! A scenario describes the outside world of a pool (which assets exist and
//! who holds them, pre-existing reward accounts, recipients that refuse
//! payments) and a list of timed steps. Actors are written either as an
//! address (`pool1...` or `0x...`) or as a free-form label that is hashed into
//! an address, so `"operator"` matches the default config's operator.

use serde::{Deserialize, Serialize};
use sharepool_core::memory::{MemoryBank, MemoryIdentityOracle, MemoryRewardSource};
use sharepool_core::{CallContext, EligibilityState, Pool, PoolConfig, PoolError, PoolEvent, PoolSnapshot};
use sharepool_types::{Address, Amount, AssetId, RewardAccountId, Timestamp};
use std::path::Path;

/// Resolve an actor written in a scenario.
pub fn resolve_actor(actor: &str) -> Address {
    actor
        .parse::<Address>()
        .unwrap_or_else(|_| Address::from_label(actor))
}

fn qualified() -> EligibilityState {
    EligibilityState::Qualified
}

/// An eligibility asset known to the identity system.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetSpec {
    pub id: u64,
    pub owner: String,
    #[serde(default = "qualified")]
    pub state: EligibilityState,
}

/// A reward account opened at the source before the scenario starts.
///
/// Accounts are numbered from 0 in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RewardAccountSpec {
    pub beneficiary: String,
    #[serde(default)]
    pub balance: u64,
    /// Extra amount the source reports on every withdrawal
    #[serde(default)]
    pub misreport: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Deposit {
        from: String,
        amount: u64,
    },
    Register {
        caller: String,
        asset: u64,
    },
    Unlock {
        caller: String,
    },
    Withdraw {
        caller: String,
        #[serde(default)]
        amount: u64,
        #[serde(default)]
        all: bool,
    },
    OperatorWithdraw {
        caller: String,
        #[serde(default)]
        amount: u64,
        #[serde(default)]
        all: bool,
    },
    Claim {
        caller: String,
        account: u64,
        amount: u64,
    },
    OpenRewardAccount {
        caller: String,
        /// Funds placed in the new account once it is open
        #[serde(default)]
        fund: u64,
    },
    RecordRewardAccount {
        caller: String,
        account: u64,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Deposit { .. } => "deposit",
            Action::Register { .. } => "register",
            Action::Unlock { .. } => "unlock",
            Action::Withdraw { .. } => "withdraw",
            Action::OperatorWithdraw { .. } => "operator_withdraw",
            Action::Claim { .. } => "claim",
            Action::OpenRewardAccount { .. } => "open_reward_account",
            Action::RecordRewardAccount { .. } => "record_reward_account",
        }
    }

    fn caller(&self) -> &str {
        match self {
            Action::Deposit { from, .. } => from,
            Action::Register { caller, .. }
            | Action::Unlock { caller }
            | Action::Withdraw { caller, .. }
            | Action::OperatorWithdraw { caller, .. }
            | Action::Claim { caller, .. }
            | Action::OpenRewardAccount { caller, .. }
            | Action::RecordRewardAccount { caller, .. } => caller,
        }
    }
}

/// One scripted call. Without `at` the step runs at the time of the previous
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at: Option<Timestamp>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    /// Pool creation time
    #[serde(default)]
    pub start_time: Timestamp,
    #[serde(default)]
    pub reject_transfers_to: Vec<String>,
    #[serde(default)]
    pub assets: Vec<AssetSpec>,
    #[serde(default)]
    pub reward_accounts: Vec<RewardAccountSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Step times must never go backwards.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut clock = self.start_time;
        for (index, step) in self.steps.iter().enumerate() {
            if let Some(at) = step.at {
                if at < clock {
                    anyhow::bail!("Step {} ({}) runs at {} which is before {}", index, step.action.name(), at, clock);
                }
                clock = at;
            }
        }
        Ok(())
    }
}

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    pub at: Timestamp,
    pub caller: Address,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything printed after a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
    pub snapshot: PoolSnapshot,
    pub events: Vec<PoolEvent>,
}

impl Report {
    pub fn rejected(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

/// A pool together with the in-memory world it talks to.
pub struct Simulator {
    pool: Pool,
    oracle: MemoryIdentityOracle,
    rewards: MemoryRewardSource,
    bank: MemoryBank,
    clock: Timestamp,
}

impl Simulator {
    pub fn new(config: PoolConfig, scenario: &Scenario) -> anyhow::Result<Self> {
        let pool = Pool::new(config, scenario.start_time)?;

        let mut oracle = MemoryIdentityOracle::new();
        for asset in &scenario.assets {
            oracle.issue(AssetId(asset.id), resolve_actor(&asset.owner), asset.state);
        }

        let mut rewards = MemoryRewardSource::new();
        for account in &scenario.reward_accounts {
            let id = rewards.open(resolve_actor(&account.beneficiary));
            rewards.fund(id, Amount::from(account.balance));
            if account.misreport > 0 {
                rewards.misreport_by(id, Amount::from(account.misreport));
            }
        }

        let mut bank = MemoryBank::new();
        for actor in &scenario.reject_transfers_to {
            bank.reject_transfers_to(resolve_actor(actor));
        }

        Ok(Self {
            pool,
            oracle,
            rewards,
            bank,
            clock: scenario.start_time,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Replay one step. Rejections by the pool are recorded, not returned.
    pub fn step(&mut self, index: usize, step: &Step) -> StepOutcome {
        if let Some(at) = step.at {
            self.clock = at;
        }
        let caller = resolve_actor(step.action.caller());
        let ctx = CallContext::new(caller, self.clock);

        let outcome = self.apply(ctx, &step.action);
        match &outcome {
            Ok(result) => tracing::info!(index, action = step.action.name(), %caller, result = %result, "step applied"),
            Err(e) => tracing::warn!(index, action = step.action.name(), %caller, error = %e, "step rejected"),
        }

        StepOutcome {
            index,
            action: step.action.name(),
            at: self.clock,
            caller,
            ok: outcome.is_ok(),
            result: outcome.as_ref().ok().cloned(),
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    fn apply(&mut self, ctx: CallContext, action: &Action) -> Result<String, PoolError> {
        match action {
            Action::Deposit { amount, .. } => {
                self.pool.deposit(ctx, Amount::from(*amount))?;
                Ok(format!("deposited {}", amount))
            }
            Action::Register { asset, .. } => {
                let is_initial = self.pool.register_member(ctx, &self.oracle, AssetId(*asset))?;
                Ok(if is_initial {
                    "new member".to_string()
                } else {
                    "power added".to_string()
                })
            }
            Action::Unlock { .. } => {
                let amount = self.pool.unlock(ctx)?;
                Ok(format!("unlocked {}", amount))
            }
            Action::Withdraw { amount, all, .. } => {
                let paid = self.pool.withdraw(ctx, &mut self.bank, Amount::from(*amount), *all)?;
                Ok(format!("withdrew {}", paid))
            }
            Action::OperatorWithdraw { amount, all, .. } => {
                let paid = self
                    .pool
                    .withdraw_operator_balance(ctx, &mut self.bank, Amount::from(*amount), *all)?;
                Ok(format!("withdrew {}", paid))
            }
            Action::Claim { account, amount, .. } => {
                let withdrawn = self
                    .pool
                    .claim(ctx, &mut self.rewards, RewardAccountId(*account), Amount::from(*amount))?;
                Ok(format!("claimed {}", withdrawn))
            }
            Action::OpenRewardAccount { fund, .. } => {
                let account = self.pool.open_reward_account(ctx, &mut self.rewards)?;
                self.rewards.fund(account, Amount::from(*fund));
                Ok(format!("opened {}", account))
            }
            Action::RecordRewardAccount { account, .. } => {
                self.pool.record_reward_account(ctx, RewardAccountId(*account))?;
                Ok(format!("recorded {}", RewardAccountId(*account)))
            }
        }
    }

    pub fn finish(self, steps: Vec<StepOutcome>) -> Report {
        Report {
            steps,
            snapshot: self.pool.snapshot(),
            events: self.pool.events().to_vec(),
        }
    }
}

/// Replay `scenario` against a fresh pool built from `config`.
pub fn run(config: PoolConfig, scenario: &Scenario) -> anyhow::Result<Report> {
    let mut simulator = Simulator::new(config, scenario)?;

    let outcomes = scenario
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| simulator.step(index, step))
        .collect();

    simulator.pool().check_invariants()?;
    Ok(simulator.finish(outcomes))
}
