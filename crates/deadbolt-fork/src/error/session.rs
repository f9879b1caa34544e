// SPDX-License-Identifier: GPL-3.0
//! Errors raised by an open fork session.

use super::ledger::LedgerError;
use thiserror::Error;

/// Lifecycle and state access failures of a fork session.
#[derive(Debug, Error)]
pub enum SessionError {
	/// The session has been closed; no further reads or writes are served.
	#[error("Session is closed")]
	Closed,
	/// Session state lock could not be acquired.
	#[error("Session state acquire error: {0}")]
	Lock(String),
	/// A read had to go to the ledger and the request failed.
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_display_closed() {
		assert_eq!(SessionError::Closed.to_string(), "Session is closed");
	}

	#[test]
	fn error_display_lock() {
		let error = SessionError::Lock("poisoned".to_string());
		assert_eq!(error.to_string(), "Session state acquire error: poisoned");
	}
}
