// SPDX-License-Identifier: GPL-3.0

use anyhow::Result;
use clap::Args;
use deadbolt_fork::{BlockSelector, LedgerClient};
use deadbolt_probe::{SlotQuery, abi, survey};
use std::process::ExitCode;
use url::Url;

/// Arguments for the slots command.
#[derive(Args)]
pub(crate) struct SlotsArgs {
	/// JSON-RPC endpoint of the source ledger.
	#[arg(short = 'e', long = "endpoint")]
	pub endpoint: Url,

	/// Address whose storage to survey.
	#[arg(short, long)]
	pub address: String,

	/// Block to read at: "latest" or a block height.
	#[arg(short, long, default_value = "latest")]
	pub block: BlockSelector,

	/// First slot of the surveyed range (inclusive).
	#[arg(long)]
	pub from_slot: u64,

	/// Last slot of the surveyed range (inclusive).
	#[arg(long)]
	pub to_slot: u64,

	/// Append the well-known ERC-1967 proxy slots as named rows.
	#[arg(long)]
	pub proxy: bool,

	/// Bearer token attached to every endpoint request.
	#[arg(long)]
	pub auth_token: Option<String>,
}

pub(crate) struct Command;

impl Command {
	pub(crate) async fn execute(args: &SlotsArgs) -> Result<ExitCode> {
		let address = abi::parse_address(&args.address)?;
		let queries = slot_queries(args)?;
		let endpoint = super::endpoint(&args.endpoint, args.auth_token.as_deref());

		let client = LedgerClient::connect(&endpoint).await?;
		let survey = survey::run(&client, address, &queries, args.block).await?;
		print!("{}", survey::render(&survey));
		Ok(ExitCode::SUCCESS)
	}
}

/// The slots a survey with these arguments reads, in row order: the plain
/// range first, the named proxy slots after it.
fn slot_queries(args: &SlotsArgs) -> Result<Vec<SlotQuery>> {
	if args.from_slot > args.to_slot {
		anyhow::bail!(
			"--from-slot ({}) must not exceed --to-slot ({})",
			args.from_slot,
			args.to_slot
		);
	}
	let mut queries = survey::slot_range(args.from_slot, args.to_slot);
	if args.proxy {
		queries.extend(survey::proxy_slots());
	}
	Ok(queries)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(from_slot: u64, to_slot: u64, proxy: bool) -> SlotsArgs {
		SlotsArgs {
			endpoint: Url::parse("http://127.0.0.1:8545/").unwrap(),
			address: "0x868964b90589d1695c08cd54dcd44092929662f9".into(),
			block: BlockSelector::Latest,
			from_slot,
			to_slot,
			proxy,
			auth_token: None,
		}
	}

	#[test]
	fn range_is_inclusive_and_proxy_rows_are_appended() {
		let queries = slot_queries(&args(98, 100, false)).unwrap();
		assert_eq!(queries.len(), 3);
		assert!(queries.iter().all(|query| query.label.is_none()));

		let queries = slot_queries(&args(98, 100, true)).unwrap();
		assert_eq!(queries.len(), 6);
		assert_eq!(queries[3].label, Some("eip1967.proxy.implementation"));
		assert_eq!(queries[5].label, Some("eip1967.proxy.beacon"));
	}

	#[test]
	fn inverted_range_is_rejected() {
		let error = slot_queries(&args(5, 4, false)).unwrap_err();
		assert_eq!(error.to_string(), "--from-slot (5) must not exceed --to-slot (4)");
	}
}
