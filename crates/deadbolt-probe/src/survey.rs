// SPDX-License-Identifier: GPL-3.0

//! Raw storage surveys.
//!
//! Reads a set of storage slots of one contract at a pinned block, straight
//! from the ledger endpoint with no fork session in between. This is the
//! reconnaissance half of a probe: watching which slots an initializer
//! populates tells you which slots the probe script should watch.

use crate::error::SurveyError;
use deadbolt_fork::{BlockInfo, BlockSelector, BlockTag, LedgerClient};
use sp_core::{H160, H256, U256, keccak_256};

/// One slot to read, optionally carrying a well-known name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlotQuery {
	pub slot: H256,
	pub label: Option<&'static str>,
}

/// One surveyed slot and the value it held.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlotRow {
	pub slot: H256,
	pub label: Option<&'static str>,
	pub value: H256,
}

impl SlotRow {
	/// Display name of the row: its well-known label when it has one, the
	/// slot index otherwise.
	fn name(&self) -> String {
		if let Some(label) = self.label {
			return label.to_string();
		}
		let index = U256::from_big_endian(self.slot.as_bytes());
		if index.bits() <= 64 { format!("slot {index}") } else { format!("slot {:#x}", self.slot) }
	}
}

/// The values a set of slots held at one block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlotSurvey {
	/// The surveyed contract.
	pub address: H160,
	/// The block every row was read at.
	pub block: BlockInfo,
	/// One row per requested slot, in request order.
	pub rows: Vec<SlotRow>,
}

/// The slots of an inclusive index range, unnamed.
pub fn slot_range(from: u64, to: u64) -> Vec<SlotQuery> {
	(from..=to)
		.map(|index| SlotQuery { slot: H256::from_low_u64_be(index), label: None })
		.collect()
}

/// The three well-known proxy administration slots of ERC-1967, named.
///
/// An upgradeable proxy keeps its implementation address, admin and beacon
/// out of the way of regular storage, at `keccak-256(label) - 1`. Reading
/// them alongside a plain range shows at a glance whether a contract is a
/// proxy and where its logic lives.
pub fn proxy_slots() -> [SlotQuery; 3] {
	[
		SlotQuery {
			slot: erc1967_slot("eip1967.proxy.implementation"),
			label: Some("eip1967.proxy.implementation"),
		},
		SlotQuery { slot: erc1967_slot("eip1967.proxy.admin"), label: Some("eip1967.proxy.admin") },
		SlotQuery {
			slot: erc1967_slot("eip1967.proxy.beacon"),
			label: Some("eip1967.proxy.beacon"),
		},
	]
}

/// The ERC-1967 slot for `label`: keccak-256 of the label, minus one.
fn erc1967_slot(label: &str) -> H256 {
	let digest = U256::from_big_endian(&keccak_256(label.as_bytes()));
	H256::from((digest - 1u64).to_big_endian())
}

/// Read every requested slot of `address` at the selected block.
///
/// `latest` is resolved to a concrete height first so all rows come from the
/// same block even while the chain advances.
pub async fn run(
	client: &LedgerClient,
	address: H160,
	slots: &[SlotQuery],
	selector: BlockSelector,
) -> Result<SlotSurvey, SurveyError> {
	let block = client
		.block(selector.into())
		.await?
		.ok_or(SurveyError::BlockMissing { selector })?;
	let at = BlockTag::Number(block.number);
	let mut rows = Vec::with_capacity(slots.len());
	for query in slots {
		let value = client.storage_slot(address, query.slot, at).await?;
		rows.push(SlotRow { slot: query.slot, label: query.label, value });
	}
	log::info!("Surveyed {} slot(s) of {address:#x} at block #{}", rows.len(), block.number);
	Ok(SlotSurvey { address, block, rows })
}

/// Render a survey as text, one row per slot. Zero-valued slots are marked
/// so populated ones stand out.
pub fn render(survey: &SlotSurvey) -> String {
	let mut out = format!(
		"Storage of {:#x} at block #{} (timestamp {})\n",
		survey.address, survey.block.number, survey.block.timestamp
	);
	for row in &survey.rows {
		let marker = if row.value.is_zero() { " (zero)" } else { "" };
		out.push_str(&format!("  {:<28}  {:#x}{marker}\n", row.name(), row.value));
	}
	out
}
