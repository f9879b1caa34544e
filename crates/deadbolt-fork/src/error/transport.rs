// SPDX-License-Identifier: GPL-3.0
//! Transport-level errors raised while talking to a ledger endpoint.

use thiserror::Error;

/// Errors occurring on the wire, before a response body can be interpreted.
///
/// Transient failures are retried internally with exponential backoff; a
/// [`TransportError::RequestFailed`] therefore carries the last underlying
/// cause after the retry budget is exhausted.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Failed to establish a connection to the endpoint.
	#[error("Failed to connect to {endpoint}: {message}")]
	ConnectionFailed {
		/// The endpoint URL that could not be reached.
		endpoint: String,
		/// The underlying error message.
		message: String,
	},
	/// A request failed after the retry budget was exhausted.
	#[error("RPC request `{method}` failed: {message}")]
	RequestFailed {
		/// The JSON-RPC method that was requested.
		method: &'static str,
		/// The last underlying error message.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_display_connection_failed() {
		let error = TransportError::ConnectionFailed {
			endpoint: "http://example.com/".to_string(),
			message: "connection refused".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Failed to connect to http://example.com/: connection refused"
		);
	}

	#[test]
	fn error_display_request_failed() {
		let error = TransportError::RequestFailed {
			method: "eth_getCode",
			message: "timed out".to_string(),
		};
		assert_eq!(error.to_string(), "RPC request `eth_getCode` failed: timed out");
	}
}
