// SPDX-License-Identifier: GPL-3.0
//! Block selection and identification.

use sp_core::H256;
use std::{
	fmt::{self, Display, Formatter},
	str::FromStr,
};
use thiserror::Error;

/// Which block to fork at, as requested by the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockSelector {
	/// The endpoint's current head, resolved to a concrete height at open time.
	Latest,
	/// An explicit block height.
	Height(u64),
}

/// A block selector that is neither `latest` nor a height.
#[derive(Debug, Error)]
#[error("Invalid block selector `{0}`: expected \"latest\" or a block height")]
pub struct InvalidBlockSelector(pub String);

impl FromStr for BlockSelector {
	type Err = InvalidBlockSelector;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if trimmed.eq_ignore_ascii_case("latest") {
			return Ok(Self::Latest);
		}
		trimmed
			.parse::<u64>()
			.map(Self::Height)
			.map_err(|_| InvalidBlockSelector(s.to_string()))
	}
}

impl From<u64> for BlockSelector {
	fn from(height: u64) -> Self {
		Self::Height(height)
	}
}

impl Display for BlockSelector {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Latest => f.write_str("latest"),
			Self::Height(height) => write!(f, "{height}"),
		}
	}
}

/// Block parameter in the wire format the endpoint expects.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockTag {
	Latest,
	Number(u64),
}

impl From<BlockSelector> for BlockTag {
	fn from(selector: BlockSelector) -> Self {
		match selector {
			BlockSelector::Latest => Self::Latest,
			BlockSelector::Height(height) => Self::Number(height),
		}
	}
}

impl From<u64> for BlockTag {
	fn from(number: u64) -> Self {
		Self::Number(number)
	}
}

impl Display for BlockTag {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Latest => f.write_str("latest"),
			Self::Number(number) => write!(f, "{number:#x}"),
		}
	}
}

/// Identification of the block a session is pinned to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockInfo {
	pub number: u64,
	pub hash: H256,
	pub parent_hash: H256,
	pub timestamp: u64,
}
