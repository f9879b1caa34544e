// SPDX-License-Identifier: GPL-3.0
//! Errors raised while interpreting endpoint responses.

use thiserror::Error;

/// A response arrived but its payload could not be interpreted.
///
/// Decode failures are never retried: the endpoint answered, the answer is
/// simply not usable.
#[derive(Debug, Error)]
pub enum DecodeError {
	/// A required field was absent from the response.
	#[error("Missing `{field}` in RPC response")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
	/// A field did not contain valid hexadecimal data.
	#[error("Invalid hex in `{field}`: {value}")]
	InvalidHex {
		/// Name of the offending field.
		field: &'static str,
		/// The raw value as received.
		value: String,
	},
	/// A field decoded to an unexpected number of bytes.
	#[error("`{field}` must be {expected} bytes in length, got {actual}")]
	WrongLength {
		/// Name of the offending field.
		field: &'static str,
		/// Expected byte length.
		expected: usize,
		/// Actual byte length.
		actual: usize,
	},
}
