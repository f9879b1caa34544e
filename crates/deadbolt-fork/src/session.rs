// SPDX-License-Identifier: GPL-3.0
//! Fork session lifecycle and layered state reads.
//!
//! A [`ForkSession`] pins a block on a source ledger and layers divergent
//! state on top of it. Reads consult the local overlay first, then the
//! remote read-through cache, and only then the endpoint itself; writes only
//! ever touch the overlay. The source ledger is never mutated.

use crate::{
	block::{BlockInfo, BlockSelector, BlockTag},
	client::{LedgerClient, METHOD_NOT_FOUND},
	error::{DecodeError, ForkUnavailableError, LedgerError, SessionError},
	executor::AccountChange,
	overlay::StateOverlay,
	remote::RemoteStateLayer,
	strings::{methods, tracers},
};
use serde_json::{Value, json};
use sp_core::{H160, H256, U256};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(0);

/// Opens fork sessions against one ledger endpoint.
pub struct ForkSessionManager {
	client: LedgerClient,
}

impl ForkSessionManager {
	pub fn new(client: LedgerClient) -> Self {
		Self { client }
	}

	/// Open a session pinned at the selected block.
	///
	/// Resolves `latest` to a concrete height, validates an explicit height
	/// against the current head, and verifies once that the endpoint exposes
	/// the tracing interface.
	pub async fn open(&self, selector: BlockSelector) -> Result<ForkSession, ForkUnavailableError> {
		let head = self
			.client
			.block(BlockTag::Latest)
			.await?
			.ok_or(LedgerError::Decode(DecodeError::MissingField { field: "latest block" }))?;
		let fork_block = match selector {
			BlockSelector::Latest => head,
			BlockSelector::Height(height) => {
				if height > head.number {
					return Err(ForkUnavailableError::HeightBeyondHead {
						height,
						head: head.number,
					});
				}
				self.client
					.block(BlockTag::Number(height))
					.await?
					.ok_or(ForkUnavailableError::BlockMissing { height })?
			},
		};
		check_tracing(&self.client, fork_block.number).await?;
		let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
		log::info!(
			"Opened fork session {id} at block #{} ({:#x})",
			fork_block.number,
			fork_block.hash
		);
		Ok(ForkSession {
			id,
			remote: RemoteStateLayer::new(self.client.clone(), fork_block.number),
			client: self.client.clone(),
			fork_block,
			overlay: StateOverlay::new(),
			closed: AtomicBool::new(false),
		})
	}
}

/// Verify the endpoint exposes `debug_traceCall` by tracing a trivial call.
async fn check_tracing(client: &LedgerClient, block_number: u64) -> Result<(), ForkUnavailableError> {
	let call = json!({
		"from": format!("{:#x}", H160::zero()),
		"to": format!("{:#x}", H160::from_low_u64_be(1)),
		"data": "0x",
	});
	let params = json!([
		call,
		BlockTag::Number(block_number).to_string(),
		{ "tracer": tracers::CALL_TRACER },
	]);
	match client.raw_call(methods::DEBUG_TRACE_CALL, params).await {
		Ok(_) => Ok(()),
		Err(LedgerError::Rpc { code, ref message, .. })
			if code == METHOD_NOT_FOUND || message.to_lowercase().contains("method not found") =>
			Err(ForkUnavailableError::TracingUnsupported),
		Err(e) => Err(e.into()),
	}
}

/// An open fork of the source ledger at a pinned block.
pub struct ForkSession {
	id: u64,
	client: LedgerClient,
	fork_block: BlockInfo,
	remote: RemoteStateLayer,
	overlay: StateOverlay,
	closed: AtomicBool,
}

impl ForkSession {
	/// Identifier of this session, unique within the process.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// The block this session is pinned to.
	pub fn fork_block(&self) -> &BlockInfo {
		&self.fork_block
	}

	/// Whether [`close`](Self::close) has been called.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	pub(crate) fn client(&self) -> &LedgerClient {
		&self.client
	}

	pub(crate) fn overlay(&self) -> &StateOverlay {
		&self.overlay
	}

	/// Code of `address` as seen by this fork.
	pub async fn code(&self, address: H160) -> Result<Vec<u8>, SessionError> {
		self.ensure_open()?;
		if let Some(code) = self.overlay.code(&address)? {
			return Ok(code);
		}
		Ok(self.remote.code(address).await?.as_ref().clone())
	}

	/// One storage word of `address` as seen by this fork.
	pub async fn storage_slot(&self, address: H160, slot: H256) -> Result<H256, SessionError> {
		self.ensure_open()?;
		if let Some(value) = self.overlay.storage_slot(&address, &slot)? {
			return Ok(value);
		}
		self.remote.storage_slot(address, slot).await
	}

	/// Balance override of `address`, if any. Absent overrides defer to the
	/// on-ledger balance during simulation.
	pub fn balance(&self, address: H160) -> Result<Option<U256>, SessionError> {
		self.ensure_open()?;
		self.overlay.balance(&address)
	}

	/// Nonce override of `address`, if any.
	pub fn nonce(&self, address: H160) -> Result<Option<u64>, SessionError> {
		self.ensure_open()?;
		self.overlay.nonce(&address)
	}

	/// Grant `address` a balance in the overlay.
	pub fn set_balance(&self, address: H160, balance: U256) -> Result<(), SessionError> {
		self.ensure_open()?;
		self.overlay.set_balance(address, balance)
	}

	/// Replace the code of `address` in the overlay.
	pub fn set_code(&self, address: H160, code: Vec<u8>) -> Result<(), SessionError> {
		self.ensure_open()?;
		self.overlay.set_code(address, code)
	}

	/// Write one storage word of `address` in the overlay.
	pub fn set_storage_slot(
		&self,
		address: H160,
		slot: H256,
		value: H256,
	) -> Result<(), SessionError> {
		self.ensure_open()?;
		self.overlay.set_storage_slot(address, slot, value)
	}

	/// The state override object describing all divergences, in the wire
	/// format trace requests expect.
	pub fn overrides(&self) -> Result<Value, SessionError> {
		self.ensure_open()?;
		self.overlay.overrides()
	}

	/// Fold executor-reported state changes into the overlay.
	pub fn apply(&self, changes: &[AccountChange]) -> Result<(), SessionError> {
		self.ensure_open()?;
		self.overlay.apply(changes)
	}

	/// Close the session. Idempotent; subsequent reads and writes fail with
	/// [`SessionError::Closed`].
	pub fn close(&self) {
		if !self.closed.swap(true, Ordering::SeqCst) {
			log::info!("Closed fork session {}", self.id);
		}
	}

	fn ensure_open(&self) -> Result<(), SessionError> {
		if self.is_closed() { Err(SessionError::Closed) } else { Ok(()) }
	}
}

impl Drop for ForkSession {
	fn drop(&mut self) {
		self.close();
	}
}
