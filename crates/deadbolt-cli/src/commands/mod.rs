// SPDX-License-Identifier: GPL-3.0

use clap::Subcommand;
use deadbolt_fork::Endpoint;
use std::process::ExitCode;
use url::Url;

pub(crate) mod probe;
pub(crate) mod slots;

#[derive(Subcommand)]
#[command(subcommand_required = true)]
pub(crate) enum Command {
	/// Probe a contract for a reachable initializer on a forked ledger.
	#[clap(alias = "p")]
	Probe(probe::ProbeArgs),
	/// Read raw storage slots of a contract, straight from the ledger.
	#[clap(alias = "s")]
	Slots(slots::SlotsArgs),
}

impl Command {
	/// Executes the command, returning the process exit code.
	pub(crate) async fn execute(self) -> anyhow::Result<ExitCode> {
		match self {
			Self::Probe(args) => probe::Command::execute(&args).await,
			Self::Slots(args) => slots::Command::execute(&args).await,
		}
	}
}

/// The client endpoint the arguments describe.
fn endpoint(url: &Url, auth_token: Option<&str>) -> Endpoint {
	let endpoint = Endpoint::new(url.clone());
	match auth_token {
		Some(token) => endpoint.with_auth_token(token),
		None => endpoint,
	}
}
