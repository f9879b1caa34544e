// SPDX-License-Identifier: GPL-3.0

pub(crate) use console::style;
use deadbolt_probe::Verdict;

pub(crate) fn get_styles() -> clap::builder::Styles {
	use clap::builder::styling::{AnsiColor, Color, Style};
	clap::builder::Styles::styled()
		.usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))))
		.header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))))
		.literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightYellow))))
		.invalid(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
		.error(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
		.placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

/// Formats a verdict with its severity colour: the finding red, the secure
/// outcome green, an inconclusive run yellow.
pub(crate) fn format_verdict(verdict: Verdict) -> String {
	let styled = match verdict {
		Verdict::ReinitBlocked => style(verdict).green(),
		Verdict::ReinitSucceeded => style(verdict).red().bold(),
		Verdict::Inconclusive => style(verdict).yellow(),
	};
	format!("{styled}")
}
