// SPDX-License-Identifier: GPL-3.0

//! Fork functionality for replaying calls against live contract ledgers.
//!
//! This crate pins a block on a remote ledger endpoint and layers divergent
//! state on top of it, so call sequences can be simulated against real chain
//! state without mutating the source ledger and without a full state sync.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          CallExecutor                           │
//! │          (debug_traceCall simulation, state overrides)          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          ForkSession                            │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌───────────────────┐  │
//! │  │ StateOverlay │─▶│ Remote cache     │─▶│ LedgerClient      │  │
//! │  │(modifications)│ │ (pinned block)   │  │ (live JSON-RPC)   │  │
//! │  └──────────────┘  └──────────────────┘  └───────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod block;
mod client;
mod endpoint;
pub mod error;
mod executor;
mod overlay;
mod remote;
mod session;
mod strings;
#[cfg(any(test, feature = "integration-tests"))]
pub mod testing;

pub use block::{BlockInfo, BlockSelector, BlockTag, InvalidBlockSelector};
pub use client::{ClientConfig, LedgerClient};
pub use endpoint::Endpoint;
pub use error::{
	DecodeError, ExecutionError, ForkUnavailableError, LedgerError, SessionError, TransportError,
};
pub use executor::{
	AccountChange, CallExecutor, CallStatus, EndpointExecutor, ExecutionOutcome, SimulatedCall,
};
pub use session::{ForkSession, ForkSessionManager};
