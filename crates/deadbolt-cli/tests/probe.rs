// SPDX-License-Identifier: GPL-3.0

//! End-to-end runs of the `deadbolt probe` command against a mock ledger
//! endpoint.

use deadbolt_fork::testing::{MockLedger, block_object, methods};
use serde_json::{Value, json};
use std::{
	fs,
	path::{Path, PathBuf},
	process::Output,
};
use tempfile::tempdir;

const TARGET: &str = "0x868964b90589d1695c08cd54dcd44092929662f9";
const CALLER: &str = "0x1111111111111111111111111111111111111111";
const INITIALIZER: &str = "0xaaaaaaaa";
const MARKER: &str = "0xbbbbbbbb";

/// A minimal script: re-invoke the initializer on the probe target, then the
/// marker. Literal selectors keep the fixture independent of signature
/// hashing.
fn write_script(dir: &Path) -> PathBuf {
	let path = dir.join("script.json");
	fs::write(
		&path,
		json!({
			"caller": CALLER,
			"initializer": { "invoke": { "target": "target", "function": INITIALIZER } },
			"marker": { "invoke": { "target": "target", "function": MARKER } },
		})
		.to_string(),
	)
	.unwrap();
	path
}

fn probe_output(endpoint: &str, script: &Path, extra: &[&str]) -> Output {
	let mut command = assert_cmd::Command::cargo_bin("deadbolt").unwrap();
	command.args(["probe", "--endpoint", endpoint, "--target", TARGET, "--script"]).arg(script);
	command.args(extra);
	command.output().unwrap()
}

/// Match the `callTracer` request of the step with `selector` calldata.
fn call_trace_params(selector: &str) -> Value {
	json!([{ "data": selector }, "0x64", { "tracer": "callTracer" }])
}

/// Match the state-diff request of the step with `selector` calldata.
fn diff_trace_params(selector: &str) -> Value {
	json!([{ "data": selector }, "0x64", { "tracer": "prestateTracer" }])
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_reports_blocked_reinitialization() {
	let mut ledger = MockLedger::start().await;
	ledger.expect_session_open(1, 100).await;
	ledger.expect_params(methods::ETH_GET_CODE, json!([TARGET, "0x64"]), json!("0x6001")).await;
	let initializer = ledger
		.expect_params_exactly(
			methods::DEBUG_TRACE_CALL,
			call_trace_params(INITIALIZER),
			json!({
				"type": "CALL",
				"from": CALLER,
				"to": TARGET,
				"gasUsed": "0x5208",
				"output": "0x",
				"error": "execution reverted",
				"revertReason": "already initialized",
			}),
			1,
		)
		.await;

	let dir = tempdir().unwrap();
	let output = probe_output(&ledger.url(), &write_script(dir.path()), &[]);

	initializer.assert_async().await;
	assert_eq!(output.status.code(), Some(0));
	let stdout = String::from_utf8(output.stdout).unwrap();
	assert!(stdout.contains("Verdict: REINIT_BLOCKED"), "unexpected report:\n{stdout}");
	assert!(stdout.contains("already initialized"));
}

/// Register a full finding scenario: the initializer runs again without side
/// effects and the marker call wipes the target's code.
async fn expect_leveraged_reinit(ledger: &mut MockLedger) {
	ledger.expect_session_open(1, 100).await;
	ledger.expect_params(methods::ETH_GET_CODE, json!([TARGET, "0x64"]), json!("0x6001")).await;
	ledger
		.expect_params(
			methods::DEBUG_TRACE_CALL,
			call_trace_params(INITIALIZER),
			json!({ "type": "CALL", "from": CALLER, "to": TARGET, "gasUsed": "0x7530", "output": "0x" }),
		)
		.await;
	ledger
		.expect_params(
			methods::DEBUG_TRACE_CALL,
			diff_trace_params(INITIALIZER),
			json!({ "pre": {}, "post": {} }),
		)
		.await;
	ledger
		.expect_params(
			methods::DEBUG_TRACE_CALL,
			call_trace_params(MARKER),
			json!({ "type": "CALL", "from": CALLER, "to": TARGET, "gasUsed": "0x9c40", "output": "0x" }),
		)
		.await;
	ledger
		.expect_params(
			methods::DEBUG_TRACE_CALL,
			diff_trace_params(MARKER),
			json!({ "pre": { (TARGET): { "code": "0x6001" } }, "post": {} }),
		)
		.await;
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_reports_leveraged_reinitialization() {
	let mut ledger = MockLedger::start().await;
	expect_leveraged_reinit(&mut ledger).await;

	let dir = tempdir().unwrap();
	let output = probe_output(&ledger.url(), &write_script(dir.path()), &[]);

	assert_eq!(output.status.code(), Some(1));
	let stdout = String::from_utf8(output.stdout).unwrap();
	assert!(stdout.contains("Verdict: REINIT_SUCCEEDED"), "unexpected report:\n{stdout}");
	assert!(stdout.contains("code removed: before 0x6001, after 0x"));
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_emits_json_report() {
	let mut ledger = MockLedger::start().await;
	expect_leveraged_reinit(&mut ledger).await;

	let dir = tempdir().unwrap();
	let output = probe_output(&ledger.url(), &write_script(dir.path()), &["--json"]);

	assert_eq!(output.status.code(), Some(1));
	let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
	assert_eq!(report["verdict"], "REINIT_SUCCEEDED");
	assert_eq!(report["chainId"], 1);
	assert_eq!(report["target"], TARGET);
	assert_eq!(report["forkBlock"]["number"], 100);
	assert_eq!(report["evidence"][0]["kind"], "code_removed");
	assert_eq!(report["steps"].as_array().map(Vec::len), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_fails_when_fork_block_is_beyond_head() {
	let mut ledger = MockLedger::start().await;
	ledger.expect(methods::ETH_CHAIN_ID, json!("0x1")).await;
	ledger
		.expect_params(
			methods::ETH_GET_BLOCK_BY_NUMBER,
			json!(["latest"]),
			block_object(100, 1_700_000_000),
		)
		.await;

	let dir = tempdir().unwrap();
	let output = probe_output(&ledger.url(), &write_script(dir.path()), &["--block", "424242"]);

	assert_eq!(output.status.code(), Some(2));
	let stderr = String::from_utf8(output.stderr).unwrap();
	assert!(
		stderr.contains("Requested block #424242 is beyond the chain head #100"),
		"unexpected failure:\n{stderr}"
	);
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_rejects_missing_script_before_any_request() {
	let mut ledger = MockLedger::start().await;
	let untouched = ledger.server.mock("POST", "/").expect(0).create_async().await;

	let dir = tempdir().unwrap();
	let output = probe_output(&ledger.url(), &dir.path().join("absent.json"), &[]);

	assert_eq!(output.status.code(), Some(2));
	let stderr = String::from_utf8(output.stderr).unwrap();
	assert!(stderr.contains("Failed to read"), "unexpected failure:\n{stderr}");
	untouched.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_rejects_invalid_target_address() {
	let dir = tempdir().unwrap();
	let script = write_script(dir.path());
	let output = assert_cmd::Command::cargo_bin("deadbolt")
		.unwrap()
		.args(["probe", "--endpoint", "http://127.0.0.1:1/", "--target", "0x1234", "--script"])
		.arg(&script)
		.output()
		.unwrap();

	assert_eq!(output.status.code(), Some(2));
	let stderr = String::from_utf8(output.stderr).unwrap();
	assert!(stderr.contains("Invalid address `0x1234`"), "unexpected failure:\n{stderr}");
}
