// SPDX-License-Identifier: GPL-3.0
//! Centralized string constants for ledger requests.

/// JSON-RPC method names.
pub mod methods {
	pub const ETH_CHAIN_ID: &str = "eth_chainId";
	pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
	pub const ETH_GET_CODE: &str = "eth_getCode";
	pub const ETH_GET_STORAGE_AT: &str = "eth_getStorageAt";
	pub const DEBUG_TRACE_CALL: &str = "debug_traceCall";
}

/// Tracer names accepted by the tracing interface.
pub mod tracers {
	pub const CALL_TRACER: &str = "callTracer";
	pub const PRESTATE_TRACER: &str = "prestateTracer";
}
