// SPDX-License-Identifier: GPL-3.0
//! Mock ledger endpoint for tests.
//!
//! Wraps a [`mockito`] server with helpers that register JSON-RPC
//! expectations by method name. Available to dependent crates behind the
//! `integration-tests` feature so their tests can stand up an endpoint
//! without talking to a live ledger.

use crate::{client::LedgerClient, endpoint::Endpoint};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{Value, json};
use url::Url;

pub use crate::strings::methods;

/// A mock ledger endpoint.
pub struct MockLedger {
	/// The underlying server, for expectations these helpers cannot express.
	pub server: ServerGuard,
}

impl MockLedger {
	/// Start a mock endpoint with no registered expectations.
	pub async fn start() -> Self {
		Self { server: Server::new_async().await }
	}

	/// Start a mock endpoint answering chain id `1` and connect a client to it.
	pub async fn with_client() -> (Self, LedgerClient) {
		let mut ledger = Self::start().await;
		ledger.expect(methods::ETH_CHAIN_ID, json!("0x1")).await;
		let client = LedgerClient::connect(&ledger.endpoint())
			.await
			.expect("mock endpoint refused connection");
		(ledger, client)
	}

	/// The endpoint URL as a string.
	pub fn url(&self) -> String {
		self.server.url()
	}

	/// The endpoint of the mock server.
	pub fn endpoint(&self) -> Endpoint {
		Endpoint::new(Url::parse(&self.server.url()).expect("mock server URL is valid"))
	}

	/// Answer any request for `method` with `result`.
	pub async fn expect(&mut self, method: &str, result: Value) -> Mock {
		self.mock(json!({ "method": method }), result_body(result), None).await
	}

	/// Answer requests for `method` with `result`, expecting exactly `hits`
	/// requests.
	pub async fn expect_exactly(&mut self, method: &str, result: Value, hits: usize) -> Mock {
		self.mock(json!({ "method": method }), result_body(result), Some(hits)).await
	}

	/// Answer requests for `method` whose params include `params` with `result`.
	pub async fn expect_params(&mut self, method: &str, params: Value, result: Value) -> Mock {
		self.mock(json!({ "method": method, "params": params }), result_body(result), None).await
	}

	/// As [`expect_params`](Self::expect_params), expecting exactly `hits`
	/// requests.
	pub async fn expect_params_exactly(
		&mut self,
		method: &str,
		params: Value,
		result: Value,
		hits: usize,
	) -> Mock {
		self.mock(json!({ "method": method, "params": params }), result_body(result), Some(hits))
			.await
	}

	/// Answer any request for `method` with a JSON-RPC error.
	pub async fn expect_rpc_error(&mut self, method: &str, code: i64, message: &str) -> Mock {
		let body = json!({
			"jsonrpc": "2.0",
			"id": 1,
			"error": { "code": code, "message": message },
		});
		self.mock(json!({ "method": method }), body, None).await
	}

	/// Answer the trivial trace a session issues on open to verify the
	/// endpoint supports tracing. Matched on the probe's sentinel callee so
	/// traces of real calls are not answered by this expectation.
	pub async fn expect_trace_support(&mut self) -> Mock {
		self.expect_params(
			methods::DEBUG_TRACE_CALL,
			json!([{ "to": "0x0000000000000000000000000000000000000001" }]),
			json!({ "type": "CALL", "gasUsed": "0x0" }),
		)
		.await
	}

	/// Register everything a session open needs: a chain id, a head block at
	/// `head`, and tracing support.
	pub async fn expect_session_open(&mut self, chain_id: u64, head: u64) {
		self.expect(methods::ETH_CHAIN_ID, json!(format!("{chain_id:#x}"))).await;
		self.expect_params(
			methods::ETH_GET_BLOCK_BY_NUMBER,
			json!(["latest"]),
			block_object(head, 1_700_000_000),
		)
		.await;
		self.expect_trace_support().await;
	}

	async fn mock(&mut self, body: Value, response: Value, hits: Option<usize>) -> Mock {
		let mut mock = self
			.server
			.mock("POST", "/")
			.match_header("content-type", "application/json")
			.match_body(Matcher::PartialJson(body))
			.with_status(200)
			.with_header("content-type", "application/json")
			.with_body(response.to_string());
		if let Some(hits) = hits {
			mock = mock.expect(hits);
		}
		mock.create_async().await
	}
}

/// A block object in the wire format of `eth_getBlockByNumber`, with
/// deterministic hashes derived from the block number.
pub fn block_object(number: u64, timestamp: u64) -> Value {
	json!({
		"number": format!("{number:#x}"),
		"hash": block_hash(number),
		"parentHash": block_hash(number.wrapping_sub(1)),
		"timestamp": format!("{timestamp:#x}"),
	})
}

fn block_hash(number: u64) -> String {
	let mut bytes = [0xab_u8; 32];
	bytes[24..].copy_from_slice(&number.to_be_bytes());
	format!("0x{}", hex::encode(bytes))
}
