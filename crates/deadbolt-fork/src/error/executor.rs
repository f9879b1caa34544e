// SPDX-License-Identifier: GPL-3.0
//! Errors raised while simulating a call.

use super::{decode::DecodeError, ledger::LedgerError, session::SessionError};
use thiserror::Error;

/// Failures of the simulation plumbing, as opposed to a call that merely
/// reverted. A revert is a regular outcome, not an error.
#[derive(Debug, Error)]
pub enum ExecutionError {
	/// The trace request itself failed.
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
	/// The session refused the read or write.
	#[error("Session error: {0}")]
	Session(#[from] SessionError),
	/// The tracer returned a frame that could not be interpreted.
	#[error("Trace decode error: {0}")]
	Decode(#[from] DecodeError),
}
