// SPDX-License-Identifier: GPL-3.0
//! Function selectors and contract ABI argument encoding.
//!
//! Calldata is the 4-byte selector (keccak-256 of the normalized signature)
//! followed by head/tail encoded arguments: static values inline as 32-byte
//! words, dynamic values (`bytes`, `string`) behind 32-byte offsets into a
//! tail of length-prefixed, zero-padded data.

use crate::error::ConfigError;
use sp_core::{H160, H256, U256, keccak_256};

/// An explicitly typed argument value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AbiValue {
	Address(H160),
	Uint(U256),
	Bool(bool),
	/// A `bytes32` word.
	FixedBytes(H256),
	Bytes(Vec<u8>),
	Str(String),
	/// A pre-encoded argument blob, spliced in unchanged. Must be the only
	/// argument.
	Raw(Vec<u8>),
}

impl AbiValue {
	/// The tag this value was declared with in a script.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Address(_) => "address",
			Self::Uint(_) => "uint256",
			Self::Bool(_) => "bool",
			Self::FixedBytes(_) => "bytes32",
			Self::Bytes(_) => "bytes",
			Self::Str(_) => "string",
			Self::Raw(_) => "raw",
		}
	}

	fn is_dynamic(&self) -> bool {
		matches!(self, Self::Bytes(_) | Self::Str(_))
	}
}

/// The 4-byte selector of `function`: either a literal `0x`-prefixed
/// selector, or keccak-256 of the normalized `name(type,…)` signature.
pub fn selector(function: &str) -> Result<[u8; 4], ConfigError> {
	if let Some(digits) = function.strip_prefix("0x") {
		let bytes = hex::decode(digits)
			.map_err(|_| ConfigError::InvalidSelector { value: function.to_string() })?;
		if bytes.len() != 4 {
			return Err(ConfigError::InvalidSelector { value: function.to_string() });
		}
		let mut selector = [0u8; 4];
		selector.copy_from_slice(&bytes);
		return Ok(selector);
	}
	let digest = keccak_256(normalize(function)?.as_bytes());
	Ok([digest[0], digest[1], digest[2], digest[3]])
}

/// Full calldata for invoking `function` with `args`.
pub fn encode_call(function: &str, args: &[AbiValue]) -> Result<Vec<u8>, ConfigError> {
	check_signature(function, args)?;
	let mut data = selector(function)?.to_vec();
	data.extend(encode_args(args)?);
	Ok(data)
}

/// Head/tail encode `args` without a selector, as used for constructor
/// arguments appended to creation bytecode.
pub fn encode_args(args: &[AbiValue]) -> Result<Vec<u8>, ConfigError> {
	if let [AbiValue::Raw(blob)] = args {
		return Ok(blob.clone());
	}
	let head_size = 32 * args.len();
	let mut head = Vec::with_capacity(head_size);
	let mut tail = Vec::new();
	for arg in args {
		match arg {
			AbiValue::Raw(_) => {
				return Err(ConfigError::InvalidArgument {
					message: "a `raw` argument must be the only argument".to_string(),
				});
			},
			AbiValue::Address(address) => {
				let mut word = [0u8; 32];
				word[12..].copy_from_slice(address.as_bytes());
				head.extend_from_slice(&word);
			},
			AbiValue::Uint(value) => head.extend_from_slice(H256::from(value.to_big_endian()).as_bytes()),
			AbiValue::Bool(value) => {
				let mut word = [0u8; 32];
				word[31] = u8::from(*value);
				head.extend_from_slice(&word);
			},
			AbiValue::FixedBytes(word) => head.extend_from_slice(word.as_bytes()),
			AbiValue::Bytes(bytes) => {
				head.extend_from_slice(H256::from(U256::from(head_size + tail.len()).to_big_endian()).as_bytes());
				extend_length_prefixed(&mut tail, bytes);
			},
			AbiValue::Str(text) => {
				head.extend_from_slice(H256::from(U256::from(head_size + tail.len()).to_big_endian()).as_bytes());
				extend_length_prefixed(&mut tail, text.as_bytes());
			},
		}
	}
	head.extend(tail);
	Ok(head)
}

/// Append a length word followed by `bytes` zero-padded to a word boundary.
fn extend_length_prefixed(tail: &mut Vec<u8>, bytes: &[u8]) {
	tail.extend_from_slice(H256::from(U256::from(bytes.len()).to_big_endian()).as_bytes());
	tail.extend_from_slice(bytes);
	tail.resize(tail.len() + (bytes.len().div_ceil(32) * 32 - bytes.len()), 0);
}

/// Verify `args` fit the declared signature in number and type. Literal
/// selectors carry no type information and a single `raw` blob is already
/// encoded, so neither is checked.
fn check_signature(function: &str, args: &[AbiValue]) -> Result<(), ConfigError> {
	if function.starts_with("0x") || matches!(args, [AbiValue::Raw(_)]) {
		return Ok(());
	}
	let params = signature_params(function)?;
	if params.len() != args.len() {
		return Err(ConfigError::ArityMismatch {
			function: function.to_string(),
			expected: params.len(),
			actual: args.len(),
		});
	}
	for (index, (param, arg)) in params.iter().zip(args).enumerate() {
		if !matches_tag(param, arg) {
			return Err(ConfigError::TypeMismatch {
				function: function.to_string(),
				index,
				expected: param.clone(),
				actual: arg.type_name(),
			});
		}
	}
	Ok(())
}

/// Whether a declared parameter type accepts an argument tag. Any width of
/// unsigned integer accepts a `uint256` tag.
fn matches_tag(param: &str, arg: &AbiValue) -> bool {
	if param == arg.type_name() {
		return true;
	}
	matches!(arg, AbiValue::Uint(_))
		&& param.strip_prefix("uint").is_some_and(|width| width.chars().all(|c| c.is_ascii_digit()))
}

/// The declared parameter types of a full signature.
fn signature_params(function: &str) -> Result<Vec<String>, ConfigError> {
	let normalized = normalize(function)?;
	let open = normalized.find('(').unwrap_or_default();
	let params = &normalized[open + 1..normalized.len() - 1];
	if params.is_empty() {
		return Ok(Vec::new());
	}
	Ok(params.split(',').map(str::to_string).collect())
}

/// Normalize a `name(type,…)` signature by stripping whitespace, validating
/// its shape on the way.
fn normalize(function: &str) -> Result<String, ConfigError> {
	let invalid = || ConfigError::InvalidSignature(function.to_string());
	let trimmed = function.trim();
	let open = trimmed.find('(').ok_or_else(invalid)?;
	let (name, params) = trimmed.split_at(open);
	if name.is_empty()
		|| !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
		|| !params.ends_with(')')
		|| params[1..params.len() - 1].contains(['(', ')'])
	{
		return Err(invalid());
	}
	let params: String = params.chars().filter(|c| !c.is_whitespace()).collect();
	if params[1..params.len() - 1].split(',').any(|param| param.is_empty()) && params != "()" {
		return Err(invalid());
	}
	Ok(format!("{name}{params}"))
}

/// Parse a `0x`-prefixed 20-byte address literal.
pub fn parse_address(value: &str) -> Result<H160, ConfigError> {
	let invalid = |message: &str| ConfigError::InvalidAddress {
		value: value.to_string(),
		message: message.to_string(),
	};
	let digits = value.strip_prefix("0x").ok_or_else(|| invalid("missing `0x` prefix"))?;
	let bytes = hex::decode(digits).map_err(|_| invalid("not hex"))?;
	if bytes.len() != 20 {
		return Err(invalid(&format!("expected 20 bytes, got {}", bytes.len())));
	}
	Ok(H160::from_slice(&bytes))
}

/// Parse a `0x`-prefixed hex blob.
pub fn parse_bytes(value: &str) -> Result<Vec<u8>, ConfigError> {
	let invalid = || ConfigError::InvalidArgument {
		message: format!("`{value}` is not `0x`-prefixed hex"),
	};
	let digits = value.strip_prefix("0x").ok_or_else(invalid)?;
	hex::decode(digits).map_err(|_| invalid())
}

/// Parse a `0x`-prefixed 32-byte word literal.
pub fn parse_word(value: &str) -> Result<H256, ConfigError> {
	let bytes = parse_bytes(value)?;
	if bytes.len() != 32 {
		return Err(ConfigError::InvalidArgument {
			message: format!("`{value}` must be 32 bytes, got {}", bytes.len()),
		});
	}
	Ok(H256::from_slice(&bytes))
}

/// Parse an unsigned integer literal, decimal or `0x`-prefixed hex.
pub fn parse_uint(value: &str) -> Result<U256, ConfigError> {
	let invalid = || ConfigError::InvalidArgument {
		message: format!("`{value}` is not an unsigned integer"),
	};
	match value.strip_prefix("0x") {
		Some(digits) => {
			let padded =
				if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
			let bytes = hex::decode(&padded).map_err(|_| invalid())?;
			if bytes.len() > 32 {
				return Err(ConfigError::InvalidArgument {
					message: format!("`{value}` exceeds 32 bytes"),
				});
			}
			Ok(U256::from_big_endian(&bytes))
		},
		None => U256::from_dec_str(value).map_err(|_| invalid()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selector_matches_known_vectors() {
		assert_eq!(hex::encode(selector("transfer(address,uint256)").unwrap()), "a9059cbb");
		assert_eq!(hex::encode(selector("baz(uint32,bool)").unwrap()), "cdcd77c0");
	}

	#[test]
	fn signature_whitespace_is_normalized() {
		assert_eq!(
			selector("transfer(address, uint256)").unwrap(),
			selector("transfer(address,uint256)").unwrap()
		);
	}

	#[test]
	fn literal_selector_is_used_verbatim() {
		assert_eq!(selector("0xa9059cbb").unwrap(), [0xa9, 0x05, 0x9c, 0xbb]);
		assert!(matches!(selector("0xa9059c"), Err(ConfigError::InvalidSelector { .. })));
		assert!(matches!(selector("0xzzzzzzzz"), Err(ConfigError::InvalidSelector { .. })));
	}

	#[test]
	fn malformed_signatures_fail() {
		for function in ["", "noparens", "(address)", "bad name(address)", "f(address"] {
			assert!(
				matches!(selector(function), Err(ConfigError::InvalidSignature(_))),
				"`{function}` should not parse"
			);
		}
	}

	#[test]
	fn static_arguments_encode_inline() {
		let target = parse_address("0x868964b90589d1695c08cd54dcd44092929662f9").unwrap();
		let data = encode_call(
			"transfer(address,uint256)",
			&[AbiValue::Address(target), AbiValue::Uint(U256::from(42u64))],
		)
		.unwrap();
		assert_eq!(
			hex::encode(data),
			format!(
				"a9059cbb{}868964b90589d1695c08cd54dcd44092929662f9{}2a",
				"00".repeat(12),
				"00".repeat(31)
			)
		);
	}

	#[test]
	fn dynamic_string_follows_head_tail_layout() {
		let data =
			encode_args(&[AbiValue::Uint(U256::from(2u64)), AbiValue::Str("Symbol_1".into())])
				.unwrap();
		let expected = format!(
			"{}02{}40{}08{}{}",
			"00".repeat(31),
			"00".repeat(31),
			"00".repeat(31),
			hex::encode("Symbol_1"),
			"00".repeat(24)
		);
		assert_eq!(hex::encode(data), expected);
	}

	#[test]
	fn empty_bytes_encode_as_lone_length_word() {
		let data = encode_args(&[AbiValue::Bytes(Vec::new())]).unwrap();
		assert_eq!(hex::encode(data), format!("{}20{}", "00".repeat(31), "00".repeat(32)));
	}

	#[test]
	fn raw_argument_passes_through() {
		let data = encode_args(&[AbiValue::Raw(vec![0xde, 0xad])]).unwrap();
		assert_eq!(data, vec![0xde, 0xad]);
	}

	#[test]
	fn raw_argument_must_stand_alone() {
		let result = encode_args(&[AbiValue::Raw(vec![0x00]), AbiValue::Bool(true)]);
		assert!(matches!(result, Err(ConfigError::InvalidArgument { .. })));
	}

	#[test]
	fn arity_mismatch_fails() {
		let result = encode_call("initialize(address)", &[]);
		assert!(matches!(
			result,
			Err(ConfigError::ArityMismatch { expected: 1, actual: 0, .. })
		));
	}

	#[test]
	fn type_mismatch_fails() {
		let result =
			encode_call("initialize(address)", &[AbiValue::Str("not an address".into())]);
		assert!(matches!(result, Err(ConfigError::TypeMismatch { index: 0, .. })));
	}

	#[test]
	fn narrow_uint_parameters_accept_uint_arguments() {
		assert!(encode_call("baz(uint32,bool)", &[
			AbiValue::Uint(U256::from(69u64)),
			AbiValue::Bool(true)
		])
		.is_ok());
	}

	#[test]
	fn literal_selector_skips_signature_checks() {
		assert!(encode_call("0xcdcd77c0", &[AbiValue::Bool(true)]).is_ok());
	}

	#[test]
	fn uint_literals_parse_decimal_and_hex() {
		assert_eq!(parse_uint("42").unwrap(), U256::from(42u64));
		assert_eq!(parse_uint("0x2a").unwrap(), U256::from(42u64));
		assert_eq!(parse_uint("0x2").unwrap(), U256::from(2u64));
		assert!(parse_uint("forty-two").is_err());
		assert!(parse_uint(&format!("0x{}", "ff".repeat(33))).is_err());
	}

	#[test]
	fn address_literals_are_strict() {
		assert!(parse_address("868964b90589d1695c08cd54dcd44092929662f9").is_err());
		assert!(parse_address("0x8689").is_err());
		assert!(parse_address("0xzz8964b90589d1695c08cd54dcd44092929662f9").is_err());
	}

	#[test]
	fn word_literals_must_be_full_width() {
		assert!(parse_word(&format!("0x{}", "11".repeat(32))).is_ok());
		assert!(parse_word("0x11").is_err());
	}
}
