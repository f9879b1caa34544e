// SPDX-License-Identifier: GPL-3.0
//! Umbrella error for ledger client requests.

use super::{decode::DecodeError, transport::TransportError};
use thiserror::Error;

/// Everything a single ledger request can produce.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// The request never produced a usable response.
	#[error("Transport error: {0}")]
	Transport(#[from] TransportError),
	/// The response payload could not be interpreted.
	#[error("Decode error: {0}")]
	Decode(#[from] DecodeError),
	/// The endpoint answered with a JSON-RPC error object.
	#[error("RPC error from `{method}`: {message} (code {code})")]
	Rpc {
		/// The JSON-RPC method that was requested.
		method: &'static str,
		/// JSON-RPC error code.
		code: i64,
		/// JSON-RPC error message.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_display_rpc() {
		let error = LedgerError::Rpc {
			method: "debug_traceCall",
			code: -32601,
			message: "method not found".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"RPC error from `debug_traceCall`: method not found (code -32601)"
		);
	}

	#[test]
	fn error_display_wrapped_transport() {
		let error = LedgerError::from(TransportError::RequestFailed {
			method: "eth_chainId",
			message: "boom".to_string(),
		});
		assert_eq!(error.to_string(), "Transport error: RPC request `eth_chainId` failed: boom");
	}
}
