// SPDX-License-Identifier: GPL-3.0
//! Shared test fixtures.
//!
//! A scripted executor that replays canned outcomes without a network, and
//! a fork session opened against a mock endpoint.

use crate::script::{CallStep, CallTarget, StepAction};
use async_trait::async_trait;
use deadbolt_fork::{
	BlockSelector, CallExecutor, CallStatus, ExecutionError, ExecutionOutcome, ForkSession,
	ForkSessionManager, LedgerClient, SimulatedCall, testing::MockLedger,
};
use sp_core::{H160, U256};
use std::{collections::VecDeque, sync::Mutex};

/// An executor replaying scripted outcomes in order, recording the calls it
/// receives. Panics when asked for more outcomes than were scripted, which
/// doubles as an assertion that no unexpected call was issued.
pub(crate) struct ScriptedExecutor {
	outcomes: Mutex<VecDeque<ExecutionOutcome>>,
	calls: Mutex<Vec<SimulatedCall>>,
}

impl ScriptedExecutor {
	pub(crate) fn new(outcomes: impl IntoIterator<Item = ExecutionOutcome>) -> Self {
		Self {
			outcomes: Mutex::new(outcomes.into_iter().collect()),
			calls: Mutex::new(Vec::new()),
		}
	}

	/// The simulated calls received so far, in order.
	pub(crate) fn calls(&self) -> Vec<SimulatedCall> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl CallExecutor for ScriptedExecutor {
	async fn execute(
		&self,
		_session: &ForkSession,
		call: &SimulatedCall,
	) -> Result<ExecutionOutcome, ExecutionError> {
		self.calls.lock().unwrap().push(call.clone());
		Ok(self
			.outcomes
			.lock()
			.unwrap()
			.pop_front()
			.expect("no outcome scripted for this call"))
	}
}

pub(crate) fn success_outcome() -> ExecutionOutcome {
	ExecutionOutcome {
		status: CallStatus::Succeeded,
		output: Vec::new(),
		gas_used: 21_000,
		created: None,
		changes: Vec::new(),
	}
}

pub(crate) fn reverted_outcome(reason: &str) -> ExecutionOutcome {
	ExecutionOutcome {
		status: CallStatus::Reverted { reason: reason.to_string() },
		..success_outcome()
	}
}

pub(crate) fn deploy_outcome(address: H160) -> ExecutionOutcome {
	ExecutionOutcome { created: Some(address), ..success_outcome() }
}

/// An invoke step directed at the probe target.
pub(crate) fn invoke_step(label: &str) -> CallStep {
	CallStep {
		label: label.to_string(),
		caller: H160::from_low_u64_be(1),
		action: StepAction::Invoke {
			target: CallTarget::Probe,
			data: vec![0xab, 0xcd, 0xef, 0x01],
		},
		value: U256::zero(),
		gas: None,
		continue_on_failure: false,
	}
}

/// A session opened against a fresh mock endpoint, pinned at block 100.
pub(crate) async fn open_test_session() -> (MockLedger, ForkSession) {
	let mut ledger = MockLedger::start().await;
	ledger.expect_session_open(1, 100).await;
	let client = LedgerClient::connect(&ledger.endpoint())
		.await
		.expect("mock endpoint refused connection");
	let session = ForkSessionManager::new(client)
		.open(BlockSelector::Latest)
		.await
		.expect("session should open against the mock endpoint");
	(ledger, session)
}
