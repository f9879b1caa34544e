// SPDX-License-Identifier: GPL-3.0
//! JSON-RPC client wrapper for ledger endpoints.
//!
//! This module provides [`LedgerClient`], a typed wrapper around the small set
//! of read methods the fork machinery needs. Transient transport failures are
//! retried with exponential backoff up to a configurable budget; responses that
//! arrive but cannot be interpreted fail immediately with a
//! [`DecodeError`](crate::error::DecodeError) and are never retried.

use crate::{
	block::{BlockInfo, BlockTag},
	endpoint::Endpoint,
	error::{DecodeError, LedgerError, TransportError},
	strings::methods,
};
use reqwest::header::AUTHORIZATION;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde_json::{Value, json};
use sp_core::{H160, H256};
use std::time::Duration;

/// Retries attempted per request on transient transport failure.
const DEFAULT_RETRIES: u32 = 3;
/// Per-attempt request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Lower bound of the exponential retry backoff.
const RETRY_MIN_INTERVAL: Duration = Duration::from_millis(500);
/// Upper bound of the exponential retry backoff.
const RETRY_MAX_INTERVAL: Duration = Duration::from_secs(8);
/// JSON-RPC error code for a method the endpoint does not expose.
pub(crate) const METHOD_NOT_FOUND: i64 = -32601;

/// Transport behaviour of a [`LedgerClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Retries attempted per request on transient transport failure.
	pub retries: u32,
	/// Per-attempt request timeout.
	pub timeout: Duration,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self { retries: DEFAULT_RETRIES, timeout: DEFAULT_TIMEOUT }
	}
}

/// JSON-RPC client for a ledger endpoint.
#[derive(Clone, Debug)]
pub struct LedgerClient {
	http: ClientWithMiddleware,
	endpoint: Endpoint,
}

impl LedgerClient {
	/// Connect to the endpoint with the default [`ClientConfig`].
	///
	/// # Arguments
	/// * `endpoint` - The JSON-RPC endpoint to connect to.
	pub async fn connect(endpoint: &Endpoint) -> Result<Self, LedgerError> {
		Self::connect_with(endpoint, ClientConfig::default()).await
	}

	/// Connect to the endpoint, verifying it answers a chain id request.
	///
	/// # Arguments
	/// * `endpoint` - The JSON-RPC endpoint to connect to.
	/// * `config` - Transport behaviour (retry budget, timeout).
	pub async fn connect_with(
		endpoint: &Endpoint,
		config: ClientConfig,
	) -> Result<Self, LedgerError> {
		let inner = reqwest::Client::builder().timeout(config.timeout).build().map_err(|e| {
			TransportError::ConnectionFailed {
				endpoint: endpoint.to_string(),
				message: e.to_string(),
			}
		})?;
		let policy = ExponentialBackoff::builder()
			.retry_bounds(RETRY_MIN_INTERVAL, RETRY_MAX_INTERVAL)
			.build_with_max_retries(config.retries);
		let http = ClientBuilder::new(inner)
			.with(RetryTransientMiddleware::new_with_policy(policy))
			.build();
		let client = Self { http, endpoint: endpoint.clone() };
		client.chain_id().await.map_err(|e| TransportError::ConnectionFailed {
			endpoint: endpoint.to_string(),
			message: e.to_string(),
		})?;
		Ok(client)
	}

	/// The endpoint this client is connected to.
	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	/// The chain id reported by the endpoint.
	pub async fn chain_id(&self) -> Result<u64, LedgerError> {
		let result = self.raw_call(methods::ETH_CHAIN_ID, json!([])).await?;
		Ok(decode_quantity("chain id", &result)?)
	}

	/// A single storage word of `address` at the given block.
	///
	/// # Arguments
	/// * `address` - The account whose storage is read.
	/// * `slot` - The storage slot to read.
	/// * `at` - The block to read at.
	pub async fn storage_slot(
		&self,
		address: H160,
		slot: H256,
		at: BlockTag,
	) -> Result<H256, LedgerError> {
		let params = json!([format!("{address:#x}"), format!("{slot:#x}"), at.to_string()]);
		let result = self.raw_call(methods::ETH_GET_STORAGE_AT, params).await?;
		Ok(decode_word("storage value", &result)?)
	}

	/// The code deployed at `address` at the given block. Empty when the
	/// account carries no code.
	pub async fn code(&self, address: H160, at: BlockTag) -> Result<Vec<u8>, LedgerError> {
		let params = json!([format!("{address:#x}"), at.to_string()]);
		let result = self.raw_call(methods::ETH_GET_CODE, params).await?;
		Ok(decode_bytes("code", &result)?)
	}

	/// Identification of the block at the given tag, or `None` when the
	/// endpoint has no block there.
	pub async fn block(&self, at: BlockTag) -> Result<Option<BlockInfo>, LedgerError> {
		let result = self
			.raw_call(methods::ETH_GET_BLOCK_BY_NUMBER, json!([at.to_string(), false]))
			.await?;
		if result.is_null() {
			return Ok(None);
		}
		Ok(Some(decode_block(&result)?))
	}

	/// Issue a raw JSON-RPC request and return the `result` value.
	///
	/// Used by the call executor for trace requests whose parameter shapes are
	/// too irregular to type.
	pub(crate) async fn raw_call(
		&self,
		method: &'static str,
		params: Value,
	) -> Result<Value, LedgerError> {
		log::debug!("Requesting `{method}` from {}", self.endpoint);
		let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
		let mut request = self.http.post(self.endpoint.url().clone()).json(&body);
		if let Some(token) = self.endpoint.auth_token() {
			request = request.header(AUTHORIZATION, format!("Bearer {token}"));
		}
		let response = request.send().await.map_err(|e| {
			log::warn!("Request `{method}` failed: {e}");
			TransportError::RequestFailed { method, message: e.to_string() }
		})?;
		let response = response
			.error_for_status()
			.map_err(|e| TransportError::RequestFailed { method, message: e.to_string() })?;
		let body: Value = response
			.json()
			.await
			.map_err(|e| TransportError::RequestFailed { method, message: e.to_string() })?;
		if let Some(error) = body.get("error") {
			let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
			let message =
				error.get("message").and_then(Value::as_str).unwrap_or_default().to_string();
			return Err(LedgerError::Rpc { method, code, message });
		}
		body.get("result")
			.cloned()
			.ok_or_else(|| DecodeError::MissingField { field: "result" }.into())
	}
}

/// Extract a required field from a response object.
fn field<'a>(value: &'a Value, field: &'static str) -> Result<&'a Value, DecodeError> {
	value.get(field).ok_or(DecodeError::MissingField { field })
}

/// Decode a `0x`-prefixed hex quantity into a `u64`.
fn decode_quantity(name: &'static str, value: &Value) -> Result<u64, DecodeError> {
	let text = value.as_str().ok_or(DecodeError::MissingField { field: name })?;
	let digits = text.strip_prefix("0x").unwrap_or(text);
	u64::from_str_radix(digits, 16)
		.map_err(|_| DecodeError::InvalidHex { field: name, value: text.to_string() })
}

/// Decode `0x`-prefixed hex data into bytes. `"0x"` decodes to empty.
fn decode_bytes(name: &'static str, value: &Value) -> Result<Vec<u8>, DecodeError> {
	let text = value.as_str().ok_or(DecodeError::MissingField { field: name })?;
	let digits = text.strip_prefix("0x").unwrap_or(text);
	hex::decode(digits).map_err(|_| DecodeError::InvalidHex { field: name, value: text.to_string() })
}

/// Decode a full 32-byte storage word.
fn decode_word(name: &'static str, value: &Value) -> Result<H256, DecodeError> {
	let bytes = decode_bytes(name, value)?;
	if bytes.len() != 32 {
		return Err(DecodeError::WrongLength { field: name, expected: 32, actual: bytes.len() });
	}
	Ok(H256::from_slice(&bytes))
}

fn decode_block(value: &Value) -> Result<BlockInfo, DecodeError> {
	Ok(BlockInfo {
		number: decode_quantity("number", field(value, "number")?)?,
		hash: decode_word("hash", field(value, "hash")?)?,
		parent_hash: decode_word("parentHash", field(value, "parentHash")?)?,
		timestamp: decode_quantity("timestamp", field(value, "timestamp")?)?,
	})
}
