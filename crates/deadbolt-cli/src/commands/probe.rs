// SPDX-License-Identifier: GPL-3.0

use crate::style::format_verdict;
use anyhow::{Result, anyhow};
use clap::Args;
use deadbolt_fork::{BlockSelector, EndpointExecutor, ForkSessionManager, LedgerClient};
use deadbolt_probe::{CallScript, ReportContext, Verdict, abi, probe, report};
use sp_core::H160;
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Exit code of a completed run that found a reachable initializer.
const FINDING: u8 = 1;
/// Default wall-clock ceiling of a probe run, in seconds.
const DEFAULT_DEADLINE_SECS: u64 = 300;

/// UI messages of the probe command.
mod messages {
	use super::{H160, Url};

	pub(super) const INTERRUPTED: &str = "Interrupt received, stopping between steps";

	/// Format the "probing target" progress message.
	pub(super) fn probing(target: &H160, endpoint: &Url, chain_id: u64, block: u64) -> String {
		format!("Probing {target:#x} on {endpoint} (chain {chain_id}), forked at block #{block}")
	}

	/// Format the deadline failure message.
	pub(super) fn deadline_exceeded(seconds: u64) -> String {
		format!("Probe did not finish within {seconds}s, fork session discarded")
	}
}

/// Arguments for the probe command.
#[derive(Args)]
pub(crate) struct ProbeArgs {
	/// JSON-RPC endpoint of the source ledger.
	#[arg(short = 'e', long = "endpoint")]
	pub endpoint: Url,

	/// Address of the contract to probe.
	#[arg(short, long)]
	pub target: String,

	/// Block to fork at: "latest" or a block height.
	#[arg(short, long, default_value = "latest")]
	pub block: BlockSelector,

	/// Path to the call script describing the probe sequence.
	#[arg(short, long)]
	pub script: PathBuf,

	/// Bearer token attached to every endpoint request.
	#[arg(long)]
	pub auth_token: Option<String>,

	/// Wall-clock ceiling of the whole run, in seconds.
	#[arg(long, default_value_t = DEFAULT_DEADLINE_SECS)]
	pub deadline_secs: u64,

	/// Emit the machine-readable JSON report instead of the plain one.
	#[arg(long)]
	pub json: bool,
}

pub(crate) struct Command;

impl Command {
	pub(crate) async fn execute(args: &ProbeArgs) -> Result<ExitCode> {
		// Local validation first, so a bad invocation never touches the
		// endpoint.
		let target = abi::parse_address(&args.target)?;
		let script = CallScript::load(&args.script)?;
		let endpoint = super::endpoint(&args.endpoint, args.auth_token.as_deref());

		let client = LedgerClient::connect(&endpoint).await?;
		let chain_id = client.chain_id().await?;
		let session = ForkSessionManager::new(client).open(args.block).await?;
		log::info!(
			"{}",
			messages::probing(&target, &args.endpoint, chain_id, session.fork_block().number)
		);

		let executor = EndpointExecutor::new();
		let cancel = CancellationToken::new();
		let run = probe::run(&session, &executor, &script, target, cancel.clone());
		tokio::pin!(run);
		let result = tokio::select! {
			result = &mut run => result,
			// Hard stop: the run future is dropped mid-flight.
			_ = tokio::time::sleep(Duration::from_secs(args.deadline_secs)) => {
				session.close();
				return Err(anyhow!(messages::deadline_exceeded(args.deadline_secs)));
			},
			// Soft stop: the sequencer notices the token between steps.
			_ = tokio::signal::ctrl_c() => {
				log::info!("{}", messages::INTERRUPTED);
				cancel.cancel();
				(&mut run).await
			},
		};
		session.close();
		let outcome = result?;

		let context = ReportContext {
			endpoint: args.endpoint.to_string(),
			chain_id,
			target,
			fork_block: session.fork_block().clone(),
		};
		if args.json {
			println!("{:#}", report::render_json(&outcome, &context));
		} else {
			print!("{}", report::render(&outcome));
		}
		eprintln!("{}", format_verdict(outcome.verdict.verdict));

		Ok(ExitCode::from(completion_code(outcome.verdict.verdict)))
	}
}

/// Exit code of a completed run. Only the finding is nonzero, so pipelines
/// can branch on it; an operational failure never reaches this mapping.
fn completion_code(verdict: Verdict) -> u8 {
	match verdict {
		Verdict::ReinitSucceeded => FINDING,
		Verdict::ReinitBlocked | Verdict::Inconclusive => 0,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn completion_code_flags_only_the_finding() {
		assert_eq!(completion_code(Verdict::ReinitSucceeded), 1);
		assert_eq!(completion_code(Verdict::ReinitBlocked), 0);
		assert_eq!(completion_code(Verdict::Inconclusive), 0);
	}

	#[test]
	fn deadline_message_names_the_ceiling() {
		assert_eq!(
			messages::deadline_exceeded(300),
			"Probe did not finish within 300s, fork session discarded"
		);
	}
}
