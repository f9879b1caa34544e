// SPDX-License-Identifier: GPL-3.0

mod commands;
mod style;

use clap::Parser;
use std::process::ExitCode;

/// Exit code of a run that failed outright, as opposed to one that completed
/// and reported a finding.
const OPERATIONAL_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(author, version, about, styles = style::get_styles())]
pub struct Cli {
	#[command(subcommand)]
	command: commands::Command,
}

#[tokio::main]
async fn main() -> ExitCode {
	env_logger::Builder::from_env(
		env_logger::Env::default()
			.default_filter_or("deadbolt=info,deadbolt_fork=info,deadbolt_probe=info"),
	)
	.init();

	let cli = Cli::parse();
	match cli.command.execute().await {
		Ok(code) => code,
		Err(error) => {
			eprintln!("{} {error:#}", style::style("error:").red().bold());
			ExitCode::from(OPERATIONAL_FAILURE)
		},
	}
}

#[test]
fn verify_cli() {
	// https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_4/index.html
	use clap::CommandFactory;
	Cli::command().debug_assert()
}
