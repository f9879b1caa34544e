// SPDX-License-Identifier: GPL-3.0
//! Ordered execution of call steps against one fork session.
//!
//! Steps run strictly in order. A failing step halts the sequence unless it
//! is marked continue-on-failure; effects of earlier successful steps stay
//! in the session's overlay either way, so a partial run remains
//! inspectable. Deploy steps may introduce a name later steps resolve to
//! the deployed address; names are valid only within their owning run.

use crate::{
	error::{SequencerError, StepFailedError},
	script::{CallStep, CallTarget, StepAction},
};
use deadbolt_fork::{CallExecutor, ForkSession, SimulatedCall};
use sp_core::H160;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Outcome of one executed call step.
#[derive(Clone, Debug)]
pub struct CallResult {
	pub success: bool,
	/// Decoded revert reason, for failed calls.
	pub revert_reason: Option<String>,
	/// Returned data.
	pub output: Vec<u8>,
	pub gas_used: u64,
	/// Deployed contract address, for successful deploys.
	pub address: Option<H160>,
}

/// One entry of a run's result log.
#[derive(Clone, Debug)]
pub struct StepRecord {
	/// Zero-based position in the run.
	pub index: usize,
	/// The step's label.
	pub label: String,
	pub result: CallResult,
}

/// Executes call steps in order against one session, keeping the result log
/// and the name→address table of the run.
pub struct Sequencer<'a, E> {
	session: &'a ForkSession,
	executor: &'a E,
	/// The probe's target contract, resolved for `"target"` step targets.
	target: Option<H160>,
	cancel: CancellationToken,
	deployments: HashMap<String, H160>,
	log: Vec<StepRecord>,
}

impl<'a, E: CallExecutor> Sequencer<'a, E> {
	pub fn new(
		session: &'a ForkSession,
		executor: &'a E,
		target: Option<H160>,
		cancel: CancellationToken,
	) -> Self {
		Self {
			session,
			executor,
			target,
			cancel,
			deployments: HashMap::new(),
			log: Vec::new(),
		}
	}

	/// The result log produced so far.
	pub fn log(&self) -> &[StepRecord] {
		&self.log
	}

	/// Consume the sequencer, yielding its result log.
	pub fn into_log(self) -> Vec<StepRecord> {
		self.log
	}

	/// The address a named deploy step produced, if it ran successfully.
	pub fn deployment(&self, name: &str) -> Option<H160> {
		self.deployments.get(name).copied()
	}

	/// Run `steps` in order. Halts with a [`StepFailedError`] at the first
	/// failed step not marked continue-on-failure; stops quietly between
	/// steps when cancellation is requested.
	pub async fn run(&mut self, steps: &[CallStep]) -> Result<(), SequencerError> {
		for step in steps {
			if self.cancel.is_cancelled() {
				log::info!("Cancellation requested, stopping after {} step(s)", self.log.len());
				return Ok(());
			}
			let record = self.execute_step(step).await?;
			if !record.result.success && !step.continue_on_failure {
				return Err(StepFailedError {
					step_index: record.index,
					label: record.label.clone(),
					reason: record
						.result
						.revert_reason
						.clone()
						.unwrap_or_else(|| "reverted without a reason".to_string()),
				}
				.into());
			}
		}
		Ok(())
	}

	/// Execute one step, record its result and fold its state changes into
	/// the session overlay. A revert is a recorded outcome, not an error;
	/// only executor plumbing failures surface as `Err`.
	pub async fn execute_step(&mut self, step: &CallStep) -> Result<&StepRecord, SequencerError> {
		let index = self.log.len();
		let call = self.build_call(step)?;
		let outcome =
			self.executor.execute(self.session, &call).await.map_err(|source| {
				SequencerError::Execution { step_index: index, label: step.label.clone(), source }
			})?;
		self.session.apply(&outcome.changes).map_err(|e| SequencerError::Execution {
			step_index: index,
			label: step.label.clone(),
			source: e.into(),
		})?;
		if outcome.is_success()
			&& let (StepAction::Deploy { name: Some(name), .. }, Some(address)) =
				(&step.action, outcome.created)
		{
			self.deployments.insert(name.clone(), address);
		}
		match outcome.revert_reason() {
			None => log::info!("Step {index} ({}): ok, gas {}", step.label, outcome.gas_used),
			Some(reason) => log::info!("Step {index} ({}): reverted: {reason}", step.label),
		}
		let result = CallResult {
			success: outcome.is_success(),
			revert_reason: outcome.revert_reason().map(str::to_string),
			output: outcome.output,
			gas_used: outcome.gas_used,
			address: outcome.created,
		};
		self.log.push(StepRecord { index, label: step.label.clone(), result });
		Ok(&self.log[index])
	}

	fn build_call(&self, step: &CallStep) -> Result<SimulatedCall, SequencerError> {
		let (callee, data) = match &step.action {
			StepAction::Deploy { code, .. } => (None, code.clone()),
			StepAction::Invoke { target, data } => {
				(Some(self.resolve_target(target)?), data.clone())
			},
		};
		Ok(SimulatedCall { caller: step.caller, callee, data, value: step.value, gas: step.gas })
	}

	fn resolve_target(&self, target: &CallTarget) -> Result<H160, SequencerError> {
		match target {
			CallTarget::Address(address) => Ok(*address),
			CallTarget::Probe => self.target.ok_or(SequencerError::MissingTarget),
			CallTarget::Deployed(name) => self
				.deployments
				.get(name)
				.copied()
				.ok_or_else(|| SequencerError::MissingDeployment(name.clone())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{
		ScriptedExecutor, deploy_outcome, invoke_step, open_test_session, reverted_outcome,
		success_outcome,
	};
	use deadbolt_fork::AccountChange;

	fn probe_target() -> H160 {
		H160::from_low_u64_be(0xdead)
	}

	#[tokio::test]
	async fn steps_execute_in_order() {
		let (_ledger, session) = open_test_session().await;
		let executor = ScriptedExecutor::new([success_outcome(), success_outcome()]);
		let mut sequencer =
			Sequencer::new(&session, &executor, Some(probe_target()), CancellationToken::new());
		let steps = vec![invoke_step("first()"), invoke_step("second()")];
		sequencer.run(&steps).await.unwrap();
		let log = sequencer.log();
		assert_eq!(log.len(), 2);
		assert_eq!((log[0].index, log[0].label.as_str()), (0, "first()"));
		assert_eq!((log[1].index, log[1].label.as_str()), (1, "second()"));
		assert!(log.iter().all(|record| record.result.success));
	}

	#[tokio::test]
	async fn first_failure_halts_the_run() {
		let (_ledger, session) = open_test_session().await;
		// Only one outcome is scripted: a second executed step would panic.
		let executor = ScriptedExecutor::new([reverted_outcome("already initialized")]);
		let mut sequencer =
			Sequencer::new(&session, &executor, Some(probe_target()), CancellationToken::new());
		let steps = vec![invoke_step("initialize()"), invoke_step("never()")];
		let result = sequencer.run(&steps).await;
		assert!(matches!(
			result,
			Err(SequencerError::Step(StepFailedError { step_index: 0, .. }))
		));
		assert_eq!(sequencer.log().len(), 1);
	}

	#[tokio::test]
	async fn continue_on_failure_keeps_sequencing() {
		let (_ledger, session) = open_test_session().await;
		let executor =
			ScriptedExecutor::new([reverted_outcome("nope"), success_outcome()]);
		let mut sequencer =
			Sequencer::new(&session, &executor, Some(probe_target()), CancellationToken::new());
		let mut tolerated = invoke_step("toggle()");
		tolerated.continue_on_failure = true;
		sequencer.run(&[tolerated, invoke_step("after()")]).await.unwrap();
		let log = sequencer.log();
		assert_eq!(log.len(), 2);
		assert!(!log[0].result.success);
		assert_eq!(log[0].result.revert_reason.as_deref(), Some("nope"));
		assert!(log[1].result.success);
	}

	#[tokio::test]
	async fn deploy_names_resolve_to_created_addresses() {
		let (_ledger, session) = open_test_session().await;
		let factory = H160::from_low_u64_be(0xfac);
		let executor = ScriptedExecutor::new([deploy_outcome(factory), success_outcome()]);
		let mut sequencer =
			Sequencer::new(&session, &executor, Some(probe_target()), CancellationToken::new());
		let deploy = CallStep {
			label: "factory".to_string(),
			caller: H160::from_low_u64_be(1),
			action: StepAction::Deploy { name: Some("factory".to_string()), code: vec![0x60] },
			value: sp_core::U256::zero(),
			gas: None,
			continue_on_failure: false,
		};
		let invoke = CallStep {
			action: StepAction::Invoke {
				target: CallTarget::Deployed("factory".to_string()),
				data: vec![0x01, 0x02, 0x03, 0x04],
			},
			..invoke_step("toggle()")
		};
		sequencer.run(&[deploy, invoke]).await.unwrap();
		assert_eq!(sequencer.deployment("factory"), Some(factory));
		assert_eq!(sequencer.log()[0].result.address, Some(factory));
		// The second simulated call was directed at the deployed address.
		assert_eq!(executor.calls()[1].callee, Some(factory));
	}

	#[tokio::test]
	async fn missing_probe_target_fails() {
		let (_ledger, session) = open_test_session().await;
		let executor = ScriptedExecutor::new([]);
		let mut sequencer =
			Sequencer::new(&session, &executor, None, CancellationToken::new());
		let result = sequencer.run(&[invoke_step("initialize()")]).await;
		assert!(matches!(result, Err(SequencerError::MissingTarget)));
		assert!(sequencer.log().is_empty());
	}

	#[tokio::test]
	async fn failed_deploy_does_not_register_its_name() {
		let (_ledger, session) = open_test_session().await;
		let executor = ScriptedExecutor::new([reverted_outcome("constructor reverted")]);
		let mut sequencer =
			Sequencer::new(&session, &executor, Some(probe_target()), CancellationToken::new());
		let mut deploy = CallStep {
			label: "factory".to_string(),
			caller: H160::from_low_u64_be(1),
			action: StepAction::Deploy { name: Some("factory".to_string()), code: vec![0x60] },
			value: sp_core::U256::zero(),
			gas: None,
			continue_on_failure: false,
		};
		deploy.continue_on_failure = true;
		let invoke = CallStep {
			action: StepAction::Invoke {
				target: CallTarget::Deployed("factory".to_string()),
				data: Vec::new(),
			},
			..invoke_step("toggle()")
		};
		let result = sequencer.run(&[deploy, invoke]).await;
		assert!(matches!(result, Err(SequencerError::MissingDeployment(name)) if name == "factory"));
	}

	#[tokio::test]
	async fn cancellation_stops_between_steps() {
		let (_ledger, session) = open_test_session().await;
		let executor = ScriptedExecutor::new([]);
		let cancel = CancellationToken::new();
		cancel.cancel();
		let mut sequencer = Sequencer::new(&session, &executor, Some(probe_target()), cancel);
		sequencer.run(&[invoke_step("never()")]).await.unwrap();
		assert!(sequencer.log().is_empty());
		assert!(executor.calls().is_empty());
	}

	#[tokio::test]
	async fn step_changes_land_in_the_overlay() {
		let (_ledger, session) = open_test_session().await;
		let rewritten = H160::from_low_u64_be(0xc0de);
		let mut outcome = success_outcome();
		outcome.changes = vec![AccountChange {
			address: rewritten,
			code: Some(vec![0xfe]),
			..Default::default()
		}];
		let executor = ScriptedExecutor::new([outcome]);
		let mut sequencer =
			Sequencer::new(&session, &executor, Some(probe_target()), CancellationToken::new());
		sequencer.run(&[invoke_step("mutate()")]).await.unwrap();
		assert_eq!(session.code(rewritten).await.unwrap(), vec![0xfe]);
	}
}
