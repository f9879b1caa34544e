// SPDX-License-Identifier: GPL-3.0
//! Local state overlay holding per-account divergences from the source ledger.

use crate::{error::SessionError, executor::AccountChange};
use serde_json::{Map, Value};
use sp_core::{H160, H256, U256};
use std::{
	collections::HashMap,
	sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

type Accounts = HashMap<H160, AccountOverlay>;

/// Per-account divergences. Absent fields defer to the source ledger.
#[derive(Clone, Debug, Default)]
pub struct AccountOverlay {
	pub balance: Option<U256>,
	pub nonce: Option<u64>,
	/// Replacement code; an empty value models removed code.
	pub code: Option<Vec<u8>>,
	pub storage: HashMap<H256, H256>,
	/// Storage replaced wholesale rather than merged; slots not present in
	/// `storage` read as zero.
	pub storage_cleared: bool,
}

/// Thread-safe collection of account overlays.
///
/// Locks are held only across map operations, never across await points.
#[derive(Clone, Debug, Default)]
pub struct StateOverlay {
	accounts: Arc<RwLock<Accounts>>,
}

impl StateOverlay {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn balance(&self, address: &H160) -> Result<Option<U256>, SessionError> {
		Ok(self.read()?.get(address).and_then(|account| account.balance))
	}

	pub fn nonce(&self, address: &H160) -> Result<Option<u64>, SessionError> {
		Ok(self.read()?.get(address).and_then(|account| account.nonce))
	}

	pub fn code(&self, address: &H160) -> Result<Option<Vec<u8>>, SessionError> {
		Ok(self.read()?.get(address).and_then(|account| account.code.clone()))
	}

	pub fn storage_slot(&self, address: &H160, slot: &H256) -> Result<Option<H256>, SessionError> {
		Ok(self.read()?.get(address).and_then(|account| match account.storage.get(slot) {
			Some(value) => Some(*value),
			None if account.storage_cleared => Some(H256::zero()),
			None => None,
		}))
	}

	pub fn set_balance(&self, address: H160, balance: U256) -> Result<(), SessionError> {
		self.write()?.entry(address).or_default().balance = Some(balance);
		Ok(())
	}

	pub fn set_nonce(&self, address: H160, nonce: u64) -> Result<(), SessionError> {
		self.write()?.entry(address).or_default().nonce = Some(nonce);
		Ok(())
	}

	pub fn set_code(&self, address: H160, code: Vec<u8>) -> Result<(), SessionError> {
		self.write()?.entry(address).or_default().code = Some(code);
		Ok(())
	}

	pub fn set_storage_slot(
		&self,
		address: H160,
		slot: H256,
		value: H256,
	) -> Result<(), SessionError> {
		self.write()?.entry(address).or_default().storage.insert(slot, value);
		Ok(())
	}

	/// Increment the account's nonce, starting from zero when no override
	/// exists yet. Returns the new value.
	pub fn bump_nonce(&self, address: H160) -> Result<u64, SessionError> {
		let mut accounts = self.write()?;
		let account = accounts.entry(address).or_default();
		let next = account.nonce.unwrap_or(0) + 1;
		account.nonce = Some(next);
		Ok(next)
	}

	/// Render all overlays as the state override object attached to trace
	/// requests. Merged storage renders as `stateDiff`, cleared storage as
	/// `state`.
	pub fn overrides(&self) -> Result<Value, SessionError> {
		let accounts = self.read()?;
		let mut overrides = Map::new();
		for (address, account) in accounts.iter() {
			let mut entry = Map::new();
			if let Some(balance) = account.balance {
				entry.insert("balance".to_string(), Value::String(format!("{balance:#x}")));
			}
			if let Some(nonce) = account.nonce {
				entry.insert("nonce".to_string(), Value::String(format!("{nonce:#x}")));
			}
			if let Some(code) = &account.code {
				entry.insert("code".to_string(), Value::String(format!("0x{}", hex::encode(code))));
			}
			if !account.storage.is_empty() || account.storage_cleared {
				let mut slots = Map::new();
				for (slot, value) in &account.storage {
					slots.insert(format!("{slot:#x}"), Value::String(format!("{value:#x}")));
				}
				let key = if account.storage_cleared { "state" } else { "stateDiff" };
				entry.insert(key.to_string(), Value::Object(slots));
			}
			if !entry.is_empty() {
				overrides.insert(format!("{address:#x}"), Value::Object(entry));
			}
		}
		Ok(Value::Object(overrides))
	}

	/// Fold executor-reported changes back in. An account reported as removed
	/// has its code emptied, its storage cleared and its balance zeroed.
	pub fn apply(&self, changes: &[AccountChange]) -> Result<(), SessionError> {
		let mut accounts = self.write()?;
		for change in changes {
			let account = accounts.entry(change.address).or_default();
			if change.removed {
				account.balance = Some(U256::zero());
				account.code = Some(Vec::new());
				account.storage.clear();
				account.storage_cleared = true;
				continue;
			}
			if let Some(balance) = change.balance {
				account.balance = Some(balance);
			}
			if let Some(nonce) = change.nonce {
				account.nonce = Some(nonce);
			}
			if let Some(code) = &change.code {
				account.code = Some(code.clone());
			}
			account.storage.extend(change.storage.iter().map(|(slot, value)| (*slot, *value)));
		}
		Ok(())
	}

	fn read(&self) -> Result<RwLockReadGuard<'_, Accounts>, SessionError> {
		self.accounts.try_read().map_err(|e| SessionError::Lock(e.to_string()))
	}

	fn write(&self) -> Result<RwLockWriteGuard<'_, Accounts>, SessionError> {
		self.accounts.try_write().map_err(|e| SessionError::Lock(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn address(byte: u8) -> H160 {
		H160::from_low_u64_be(byte as u64)
	}

	#[test]
	fn absent_account_reads_none() {
		let overlay = StateOverlay::new();
		assert!(overlay.code(&address(1)).unwrap().is_none());
		assert!(overlay.storage_slot(&address(1), &H256::zero()).unwrap().is_none());
	}

	#[test]
	fn set_code_shadows() {
		let overlay = StateOverlay::new();
		overlay.set_code(address(1), vec![0x60, 0x01]).unwrap();
		assert_eq!(overlay.code(&address(1)).unwrap(), Some(vec![0x60, 0x01]));
	}

	#[test]
	fn cleared_storage_reads_zero() {
		let overlay = StateOverlay::new();
		let changes = [AccountChange { address: address(1), removed: true, ..Default::default() }];
		overlay.apply(&changes).unwrap();
		assert_eq!(
			overlay.storage_slot(&address(1), &H256::from_low_u64_be(5)).unwrap(),
			Some(H256::zero())
		);
		assert_eq!(overlay.code(&address(1)).unwrap(), Some(Vec::new()));
	}

	#[test]
	fn bump_nonce_counts_from_zero() {
		let overlay = StateOverlay::new();
		assert_eq!(overlay.bump_nonce(address(1)).unwrap(), 1);
		assert_eq!(overlay.bump_nonce(address(1)).unwrap(), 2);
		assert_eq!(overlay.nonce(&address(1)).unwrap(), Some(2));
	}

	#[test]
	fn overrides_render_state_diff() {
		let overlay = StateOverlay::new();
		overlay.set_balance(address(1), U256::from(1_000_000u64)).unwrap();
		overlay.set_nonce(address(1), 2).unwrap();
		overlay
			.set_storage_slot(address(1), H256::from_low_u64_be(1), H256::from_low_u64_be(42))
			.unwrap();
		let overrides = overlay.overrides().unwrap();
		let account = &overrides["0x0000000000000000000000000000000000000001"];
		assert_eq!(account["balance"], "0xf4240");
		assert_eq!(account["nonce"], "0x2");
		let slot_key = format!("0x{}{}", "00".repeat(31), "01");
		let word = format!("0x{}{}", "00".repeat(31), "2a");
		assert_eq!(account["stateDiff"][slot_key.as_str()], json!(word));
	}

	#[test]
	fn overrides_render_cleared_storage_as_state() {
		let overlay = StateOverlay::new();
		let changes = [AccountChange { address: address(1), removed: true, ..Default::default() }];
		overlay.apply(&changes).unwrap();
		let overrides = overlay.overrides().unwrap();
		let account = &overrides["0x0000000000000000000000000000000000000001"];
		assert_eq!(account["code"], "0x");
		assert_eq!(account["state"], json!({}));
		assert!(account.get("stateDiff").is_none());
	}

	#[test]
	fn apply_merges_changes() {
		let overlay = StateOverlay::new();
		let mut storage = HashMap::new();
		storage.insert(H256::from_low_u64_be(98), H256::from_low_u64_be(7));
		let changes = [AccountChange {
			address: address(1),
			nonce: Some(3),
			code: Some(vec![0xfe]),
			storage,
			..Default::default()
		}];
		overlay.apply(&changes).unwrap();
		assert_eq!(overlay.nonce(&address(1)).unwrap(), Some(3));
		assert_eq!(overlay.code(&address(1)).unwrap(), Some(vec![0xfe]));
		assert_eq!(
			overlay.storage_slot(&address(1), &H256::from_low_u64_be(98)).unwrap(),
			Some(H256::from_low_u64_be(7))
		);
		// Untouched slots still defer to the parent layer.
		assert!(overlay.storage_slot(&address(1), &H256::from_low_u64_be(99)).unwrap().is_none());
	}
}
