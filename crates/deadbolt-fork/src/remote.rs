// SPDX-License-Identifier: GPL-3.0
//! Read-through cache over the source ledger, pinned at the fork block.
//!
//! Every value is fetched at most once per session; repeated reads of the same
//! code blob or storage slot are served from memory. Empty values (an account
//! without code, a zero storage word) are cached like any other so a miss is
//! not re-fetched either.

use crate::{block::BlockTag, client::LedgerClient, error::SessionError};
use sp_core::{H160, H256};
use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
};

type SharedCode = Arc<Vec<u8>>;

/// Cached remote reads at a fixed block.
#[derive(Clone, Debug)]
pub(crate) struct RemoteStateLayer {
	client: LedgerClient,
	block: BlockTag,
	code: Arc<RwLock<HashMap<H160, SharedCode>>>,
	slots: Arc<RwLock<HashMap<(H160, H256), H256>>>,
}

impl RemoteStateLayer {
	pub(crate) fn new(client: LedgerClient, block_number: u64) -> Self {
		Self {
			client,
			block: BlockTag::Number(block_number),
			code: Arc::new(RwLock::new(HashMap::new())),
			slots: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Code of `address` at the fork block.
	pub(crate) async fn code(&self, address: H160) -> Result<SharedCode, SessionError> {
		{
			let cache = self.code.try_read().map_err(|e| SessionError::Lock(e.to_string()))?;
			if let Some(cached) = cache.get(&address) {
				return Ok(cached.clone());
			}
		}
		let fetched = Arc::new(self.client.code(address, self.block).await?);
		log::debug!("Caching code of {address:#x} ({} bytes)", fetched.len());
		self.code
			.try_write()
			.map_err(|e| SessionError::Lock(e.to_string()))?
			.insert(address, fetched.clone());
		Ok(fetched)
	}

	/// One storage word of `address` at the fork block.
	pub(crate) async fn storage_slot(
		&self,
		address: H160,
		slot: H256,
	) -> Result<H256, SessionError> {
		{
			let cache = self.slots.try_read().map_err(|e| SessionError::Lock(e.to_string()))?;
			if let Some(cached) = cache.get(&(address, slot)) {
				return Ok(*cached);
			}
		}
		let fetched = self.client.storage_slot(address, slot, self.block).await?;
		self.slots
			.try_write()
			.map_err(|e| SessionError::Lock(e.to_string()))?
			.insert((address, slot), fetched);
		Ok(fetched)
	}
}
