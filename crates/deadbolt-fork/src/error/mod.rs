// SPDX-License-Identifier: GPL-3.0
//! Error types for fork operations.
//!
//! This module contains all error types used throughout the crate:
//! - [`transport::TransportError`]: Endpoint connectivity and request transport failures
//! - [`decode::DecodeError`]: Malformed or truncated endpoint responses
//! - [`ledger::LedgerError`]: Umbrella for everything a ledger request can produce
//! - [`fork::ForkUnavailableError`]: Reasons a fork session cannot be opened
//! - [`session::SessionError`]: Lifecycle and state access failures of an open session
//! - [`executor::ExecutionError`]: Failures while simulating a call

pub mod decode;
pub mod executor;
pub mod fork;
pub mod ledger;
pub mod session;
pub mod transport;

pub use decode::DecodeError;
pub use executor::ExecutionError;
pub use fork::ForkUnavailableError;
pub use ledger::LedgerError;
pub use session::SessionError;
pub use transport::TransportError;
