// SPDX-License-Identifier: GPL-3.0
//! Probe outcome rendering.
//!
//! Pure formatting: both renderers take the outcome and return a value, the
//! caller decides where to write it. The plain report carries enough per
//! step to diagnose a failed sequence without re-running it.

use crate::{
	probe::{Evidence, ProbeOutcome},
	sequencer::StepRecord,
};
use deadbolt_fork::BlockInfo;
use serde_json::{Value, json};
use sp_core::{H160, keccak_256};

/// Code longer than this renders abbreviated, with its length and digest.
const CODE_PREVIEW_BYTES: usize = 32;

/// Identification of the run a report describes.
#[derive(Clone, Debug)]
pub struct ReportContext {
	pub endpoint: String,
	pub chain_id: u64,
	pub target: H160,
	pub fork_block: BlockInfo,
}

/// Render the human-readable report.
pub fn render(outcome: &ProbeOutcome) -> String {
	let mut report = String::from("Steps:\n");
	if outcome.log.is_empty() {
		report.push_str("  (none)\n");
	}
	for record in &outcome.log {
		report.push_str(&render_step(record));
		report.push('\n');
	}
	report.push_str(&format!("Verdict: {}\n", outcome.verdict.verdict));
	if let Some(reason) = &outcome.verdict.reason {
		report.push_str(&format!("Reason: {reason}\n"));
	}
	if !outcome.verdict.evidence.is_empty() {
		report.push_str("Evidence:\n");
		for evidence in &outcome.verdict.evidence {
			report.push_str(&render_evidence(evidence));
			report.push('\n');
		}
	}
	report
}

fn render_step(record: &StepRecord) -> String {
	let mut line = format!("  #{} {}: ", record.index, record.label);
	match &record.result.revert_reason {
		None if record.result.success => line.push_str("ok"),
		None => line.push_str("failed"),
		Some(reason) => line.push_str(&format!("failed ({reason})")),
	}
	line.push_str(&format!(" (gas {})", record.result.gas_used));
	if let Some(address) = record.result.address {
		line.push_str(&format!(", deployed at {address:#x}"));
	}
	line
}

fn render_evidence(evidence: &Evidence) -> String {
	match evidence {
		Evidence::CodeRemoved { before } => {
			format!("  code removed: before {}, after 0x", format_code(before))
		},
		Evidence::CodeChanged { before, after } => {
			format!("  code changed: before {}, after {}", format_code(before), format_code(after))
		},
		Evidence::SlotChanged { slot, before, after } => {
			format!("  slot {slot:#x}: before {before:#x}, after {after:#x}")
		},
	}
}

/// Hex-render code, abbreviating past [`CODE_PREVIEW_BYTES`] with the length
/// and keccak-256 digest so long blobs stay comparable.
fn format_code(code: &[u8]) -> String {
	if code.len() <= CODE_PREVIEW_BYTES {
		return format!("0x{}", hex::encode(code));
	}
	format!(
		"0x{}.. ({} bytes, keccak256 0x{})",
		hex::encode(&code[..CODE_PREVIEW_BYTES]),
		code.len(),
		hex::encode(keccak_256(code))
	)
}

/// Render the machine-readable report for `--json`, with full, unabbreviated
/// values.
pub fn render_json(outcome: &ProbeOutcome, context: &ReportContext) -> Value {
	let steps: Vec<Value> = outcome.log.iter().map(render_step_json).collect();
	let evidence: Vec<Value> = outcome.verdict.evidence.iter().map(render_evidence_json).collect();
	json!({
		"endpoint": context.endpoint,
		"chainId": context.chain_id,
		"target": format!("{:#x}", context.target),
		"forkBlock": {
			"number": context.fork_block.number,
			"hash": format!("{:#x}", context.fork_block.hash),
			"timestamp": context.fork_block.timestamp,
		},
		"verdict": outcome.verdict.verdict.to_string(),
		"reason": outcome.verdict.reason.clone(),
		"steps": steps,
		"evidence": evidence,
	})
}

fn render_step_json(record: &StepRecord) -> Value {
	json!({
		"index": record.index,
		"label": record.label.clone(),
		"success": record.result.success,
		"revertReason": record.result.revert_reason.clone(),
		"output": format!("0x{}", hex::encode(&record.result.output)),
		"gasUsed": record.result.gas_used,
		"address": record.result.address.map(|address| format!("{address:#x}")),
	})
}

fn render_evidence_json(evidence: &Evidence) -> Value {
	match evidence {
		Evidence::CodeRemoved { before } => json!({
			"kind": "code_removed",
			"before": format!("0x{}", hex::encode(before)),
			"after": "0x",
		}),
		Evidence::CodeChanged { before, after } => json!({
			"kind": "code_changed",
			"before": format!("0x{}", hex::encode(before)),
			"after": format!("0x{}", hex::encode(after)),
		}),
		Evidence::SlotChanged { slot, before, after } => json!({
			"kind": "slot_changed",
			"slot": format!("{slot:#x}"),
			"before": format!("{before:#x}"),
			"after": format!("{after:#x}"),
		}),
	}
}
