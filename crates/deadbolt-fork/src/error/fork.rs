// SPDX-License-Identifier: GPL-3.0
//! Errors raised while opening a fork session.

use super::ledger::LedgerError;
use thiserror::Error;

/// Reasons a fork session cannot be opened at the requested block.
#[derive(Debug, Error)]
pub enum ForkUnavailableError {
	/// The requested height lies past the endpoint's current head.
	#[error("Requested block #{height} is beyond the chain head #{head}")]
	HeightBeyondHead {
		/// The requested fork height.
		height: u64,
		/// The endpoint's current head height.
		head: u64,
	},
	/// The endpoint returned no block at the requested height.
	#[error("Block not found at height {height}")]
	BlockMissing {
		/// The requested fork height.
		height: u64,
	},
	/// The endpoint does not expose the call tracing interface.
	#[error("Endpoint does not support `debug_traceCall` tracing")]
	TracingUnsupported,
	/// A ledger request failed while resolving the fork point.
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
}
