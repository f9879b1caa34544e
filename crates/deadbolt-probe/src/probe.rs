// SPDX-License-Identifier: GPL-3.0
//! The initializer probe.
//!
//! Replays a call script against a fork session and classifies the outcome.
//! A reverting initializer is the expected, secure outcome
//! (`REINIT_BLOCKED`). An initializer that runs again only becomes a
//! reportable finding (`REINIT_SUCCEEDED`) when the follow-up marker call
//! succeeds and the target's code or a watched storage slot observably
//! changed from its baseline; everything else is `INCONCLUSIVE`. Requiring
//! leveraged, observable damage keeps a harmlessly repeatable initializer
//! from being reported as a finding.

use crate::{
	error::ProbeError,
	script::CallScript,
	sequencer::{Sequencer, StepRecord},
};
use deadbolt_fork::{CallExecutor, ForkSession};
use sp_core::{H160, H256};
use strum_macros::Display;
use tokio_util::sync::CancellationToken;

/// Probe outcome kinds.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Verdict {
	/// The initializer reverted on re-invocation: the guard held.
	#[strum(serialize = "REINIT_BLOCKED")]
	ReinitBlocked,
	/// The initializer ran again and the marker call caused observable state
	/// change.
	#[strum(serialize = "REINIT_SUCCEEDED")]
	ReinitSucceeded,
	/// No conclusion was possible.
	#[strum(serialize = "INCONCLUSIVE")]
	Inconclusive,
}

/// One observed divergence of the target from its baseline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Evidence {
	/// The target's code was removed.
	CodeRemoved { before: Vec<u8> },
	/// The target's code was replaced.
	CodeChanged { before: Vec<u8>, after: Vec<u8> },
	/// A watched storage slot changed.
	SlotChanged { slot: H256, before: H256, after: H256 },
}

/// A verdict with its supporting evidence.
#[derive(Clone, Debug)]
pub struct ProbeVerdict {
	pub verdict: Verdict,
	/// The initializer's revert reason (blocked), or why no conclusion was
	/// possible (inconclusive).
	pub reason: Option<String>,
	pub evidence: Vec<Evidence>,
}

impl ProbeVerdict {
	pub fn blocked(reason: String) -> Self {
		Self { verdict: Verdict::ReinitBlocked, reason: Some(reason), evidence: Vec::new() }
	}

	pub fn succeeded(evidence: Vec<Evidence>) -> Self {
		Self { verdict: Verdict::ReinitSucceeded, reason: None, evidence }
	}

	pub fn inconclusive(reason: String) -> Self {
		Self { verdict: Verdict::Inconclusive, reason: Some(reason), evidence: Vec::new() }
	}
}

/// Everything one probe run produced.
#[derive(Debug)]
pub struct ProbeOutcome {
	pub verdict: ProbeVerdict,
	/// Result log of every executed step, in order.
	pub log: Vec<StepRecord>,
}

/// Probe `target` for a reachable initializer by replaying `script` against
/// `session`.
///
/// Auxiliary steps run first; their failure aborts the probe with the step
/// error. The initializer and marker steps are driven directly, since their
/// failures are classifications rather than errors.
pub async fn run<E: CallExecutor>(
	session: &ForkSession,
	executor: &E,
	script: &CallScript,
	target: H160,
	cancel: CancellationToken,
) -> Result<ProbeOutcome, ProbeError> {
	let block = session.fork_block().number;
	let code_before = session.code(target).await?;
	if code_before.is_empty() {
		log::info!("Target {target:#x} has no code at block #{block}, nothing to probe");
		return Ok(ProbeOutcome {
			verdict: ProbeVerdict::inconclusive(format!(
				"target {target:#x} has no code at block #{block}"
			)),
			log: Vec::new(),
		});
	}

	let mut baseline = Vec::with_capacity(script.watch_slots.len());
	for slot in &script.watch_slots {
		baseline.push((*slot, session.storage_slot(target, *slot).await?));
	}

	let mut sequencer = Sequencer::new(session, executor, Some(target), cancel.clone());
	sequencer.run(&script.steps).await?;
	if cancel.is_cancelled() {
		return Err(ProbeError::Cancelled);
	}

	let record = sequencer.execute_step(&script.initializer).await?;
	if !record.result.success {
		let reason = record
			.result
			.revert_reason
			.clone()
			.unwrap_or_else(|| "reverted without a reason".to_string());
		log::info!("Initializer reverted ({reason}), reinitialization is blocked");
		return Ok(ProbeOutcome {
			verdict: ProbeVerdict::blocked(reason),
			log: sequencer.into_log(),
		});
	}
	log::info!("Initializer ran again at block #{block}, executing marker step");
	if cancel.is_cancelled() {
		return Err(ProbeError::Cancelled);
	}

	let record = sequencer.execute_step(&script.marker).await?;
	if !record.result.success {
		let reason = record
			.result
			.revert_reason
			.clone()
			.unwrap_or_else(|| "reverted without a reason".to_string());
		return Ok(ProbeOutcome {
			verdict: ProbeVerdict::inconclusive(format!("marker step failed: {reason}")),
			log: sequencer.into_log(),
		});
	}

	let mut evidence = Vec::new();
	let code_after = session.code(target).await?;
	if code_after != code_before {
		evidence.push(match code_after.is_empty() {
			true => Evidence::CodeRemoved { before: code_before },
			false => Evidence::CodeChanged { before: code_before, after: code_after },
		});
	}
	for (slot, before) in baseline {
		let after = session.storage_slot(target, slot).await?;
		if after != before {
			evidence.push(Evidence::SlotChanged { slot, before, after });
		}
	}

	let verdict = if evidence.is_empty() {
		ProbeVerdict::inconclusive(
			"initializer re-ran but no watched code or storage changed".to_string(),
		)
	} else {
		log::info!(
			"Reinitialization leveraged with {} piece(s) of evidence at block #{block}",
			evidence.len()
		);
		ProbeVerdict::succeeded(evidence)
	};
	Ok(ProbeOutcome { verdict, log: sequencer.into_log() })
}
