// SPDX-License-Identifier: GPL-3.0
//! Call simulation against a fork session.
//!
//! Every call is simulated on the endpoint through `debug_traceCall` with the
//! session's overlay attached as state overrides; the source ledger is never
//! mutated. A call runs two traces: the call tracer yields the outcome
//! (success, revert reason, created address, gas), and, only when the call
//! succeeded, the prestate tracer in diff mode yields the state changes the
//! call would have made.

use crate::{
	block::BlockTag,
	error::{DecodeError, ExecutionError},
	session::ForkSession,
	strings::{methods, tracers},
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sp_core::{H160, H256, U256};
use std::collections::HashMap;

/// Selector of the standard `Error(string)` revert payload.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Outcome of a simulated call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallStatus {
	Succeeded,
	Reverted {
		/// Human-readable revert reason, decoded on a best-effort basis.
		reason: String,
	},
}

/// A call to simulate against a session.
#[derive(Clone, Debug)]
pub struct SimulatedCall {
	pub caller: H160,
	/// `None` deploys the code carried in `data`.
	pub callee: Option<H160>,
	/// Calldata, or creation code for deploys.
	pub data: Vec<u8>,
	pub value: U256,
	pub gas: Option<u64>,
}

/// State changes of one account as reported by the prestate tracer.
#[derive(Clone, Debug, Default)]
pub struct AccountChange {
	pub address: H160,
	pub balance: Option<U256>,
	pub nonce: Option<u64>,
	pub code: Option<Vec<u8>>,
	/// Written slots with their post-call values.
	pub storage: HashMap<H256, H256>,
	/// Present before the call, absent after it (self-destructed).
	pub removed: bool,
}

/// Everything observed about one simulated call.
#[derive(Clone, Debug)]
pub struct ExecutionOutcome {
	pub status: CallStatus,
	/// Return data, or raw revert data when no reason could be decoded.
	pub output: Vec<u8>,
	pub gas_used: u64,
	/// Address of the deployed contract, for successful deploys.
	pub created: Option<H160>,
	/// Reported state changes; always empty for reverted calls.
	pub changes: Vec<AccountChange>,
}

impl ExecutionOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self.status, CallStatus::Succeeded)
	}

	pub fn revert_reason(&self) -> Option<&str> {
		match &self.status {
			CallStatus::Reverted { reason } => Some(reason),
			CallStatus::Succeeded => None,
		}
	}
}

/// Executes simulated calls. The seam exists so call sequences can be driven
/// without a live endpoint.
#[async_trait]
pub trait CallExecutor: Send + Sync {
	async fn execute(
		&self,
		session: &ForkSession,
		call: &SimulatedCall,
	) -> Result<ExecutionOutcome, ExecutionError>;
}

/// The endpoint-backed executor used in production.
#[derive(Clone, Debug, Default)]
pub struct EndpointExecutor;

impl EndpointExecutor {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl CallExecutor for EndpointExecutor {
	async fn execute(
		&self,
		session: &ForkSession,
		call: &SimulatedCall,
	) -> Result<ExecutionOutcome, ExecutionError> {
		let overrides = session.overrides()?;
		let call_object = render_call(call);
		let block = BlockTag::Number(session.fork_block().number).to_string();

		let params = json!([
			call_object,
			block,
			{ "tracer": tracers::CALL_TRACER, "stateOverrides": overrides },
		]);
		let frame = session.client().raw_call(methods::DEBUG_TRACE_CALL, params).await?;
		let status = decode_status(&frame);
		let output = decode_frame_bytes(&frame, "output")?;
		let gas_used = decode_frame_quantity(&frame, "gasUsed")?;
		let created = match (&status, call.callee) {
			(CallStatus::Succeeded, None) => Some(decode_created(&frame)?),
			_ => None,
		};

		let changes = if matches!(status, CallStatus::Succeeded) {
			let params = json!([
				render_call(call),
				block,
				{
					"tracer": tracers::PRESTATE_TRACER,
					"tracerConfig": { "diffMode": true },
					"stateOverrides": overrides,
				},
			]);
			let diff = session.client().raw_call(methods::DEBUG_TRACE_CALL, params).await?;
			decode_changes(&diff)?
		} else {
			Vec::new()
		};

		if matches!(status, CallStatus::Succeeded) {
			// Keeps consecutive deploys from the same caller at distinct
			// addresses even when the tracer omits the nonce change.
			session.overlay().bump_nonce(call.caller)?;
		}
		log::debug!(
			"Simulated call from {:#x}: {}, gas {gas_used}, {} account(s) changed",
			call.caller,
			match &status {
				CallStatus::Succeeded => "succeeded".to_string(),
				CallStatus::Reverted { reason } => format!("reverted ({reason})"),
			},
			changes.len()
		);
		Ok(ExecutionOutcome { status, output, gas_used, created, changes })
	}
}

/// Render the call object in the wire format trace requests expect. Zero
/// values and absent gas limits are omitted.
fn render_call(call: &SimulatedCall) -> Value {
	let mut object = Map::new();
	object.insert("from".to_string(), Value::String(format!("{:#x}", call.caller)));
	if let Some(callee) = call.callee {
		object.insert("to".to_string(), Value::String(format!("{callee:#x}")));
	}
	object.insert("data".to_string(), Value::String(format!("0x{}", hex::encode(&call.data))));
	if !call.value.is_zero() {
		object.insert("value".to_string(), Value::String(format!("{:#x}", call.value)));
	}
	if let Some(gas) = call.gas {
		object.insert("gas".to_string(), Value::String(format!("{gas:#x}")));
	}
	Value::Object(object)
}

/// Classify the top frame. The revert reason is taken from the tracer's
/// `revertReason` field when present, decoded from an `Error(string)` payload
/// otherwise, and falls back to the raw error text.
fn decode_status(frame: &Value) -> CallStatus {
	match frame.get("error").and_then(Value::as_str) {
		None => CallStatus::Succeeded,
		Some(error) => {
			let reason = frame
				.get("revertReason")
				.and_then(Value::as_str)
				.map(str::to_string)
				.or_else(|| decode_error_string(frame))
				.unwrap_or_else(|| error.to_string());
			CallStatus::Reverted { reason }
		},
	}
}

/// Decode an ABI-encoded `Error(string)` payload from the frame output.
fn decode_error_string(frame: &Value) -> Option<String> {
	let text = frame.get("output").and_then(Value::as_str)?;
	let bytes = hex::decode(text.strip_prefix("0x").unwrap_or(text)).ok()?;
	if bytes.len() < 68 || bytes[..4] != ERROR_STRING_SELECTOR {
		return None;
	}
	// Selector, then offset word, then length word, then the string data.
	let length = U256::from_big_endian(&bytes[36..68]);
	if length > U256::from(u32::MAX) {
		return None;
	}
	let length = length.low_u64() as usize;
	let end = 68usize.checked_add(length)?;
	if end > bytes.len() {
		return None;
	}
	String::from_utf8(bytes[68..end].to_vec()).ok()
}

fn decode_frame_bytes(frame: &Value, name: &'static str) -> Result<Vec<u8>, DecodeError> {
	match frame.get(name).and_then(Value::as_str) {
		None => Ok(Vec::new()),
		Some(text) => {
			let digits = text.strip_prefix("0x").unwrap_or(text);
			hex::decode(digits)
				.map_err(|_| DecodeError::InvalidHex { field: name, value: text.to_string() })
		},
	}
}

fn decode_frame_quantity(frame: &Value, name: &'static str) -> Result<u64, DecodeError> {
	match frame.get(name).and_then(Value::as_str) {
		None => Ok(0),
		Some(text) => {
			let digits = text.strip_prefix("0x").unwrap_or(text);
			u64::from_str_radix(digits, 16)
				.map_err(|_| DecodeError::InvalidHex { field: name, value: text.to_string() })
		},
	}
}

/// The created address of a deploy frame, reported by the call tracer in the
/// `to` field.
fn decode_created(frame: &Value) -> Result<H160, DecodeError> {
	let text = frame
		.get("to")
		.and_then(Value::as_str)
		.ok_or(DecodeError::MissingField { field: "to" })?;
	decode_address("to", text)
}

fn decode_address(name: &'static str, text: &str) -> Result<H160, DecodeError> {
	let bytes = hex::decode(text.strip_prefix("0x").unwrap_or(text))
		.map_err(|_| DecodeError::InvalidHex { field: name, value: text.to_string() })?;
	if bytes.len() != 20 {
		return Err(DecodeError::WrongLength { field: name, expected: 20, actual: bytes.len() });
	}
	Ok(H160::from_slice(&bytes))
}

/// A storage word in tracer output, tolerating left-trimmed values.
fn decode_word_text(name: &'static str, text: &str) -> Result<H256, DecodeError> {
	let digits = text.strip_prefix("0x").unwrap_or(text);
	let padded =
		if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
	let bytes = hex::decode(&padded)
		.map_err(|_| DecodeError::InvalidHex { field: name, value: text.to_string() })?;
	if bytes.len() > 32 {
		return Err(DecodeError::WrongLength { field: name, expected: 32, actual: bytes.len() });
	}
	Ok(H256::from(U256::from_big_endian(&bytes).to_big_endian()))
}

/// Account nonces appear as JSON numbers in prestate output, but some
/// endpoints emit hex strings.
fn decode_account_nonce(account: &Value) -> Result<Option<u64>, DecodeError> {
	match account.get("nonce") {
		None => Ok(None),
		Some(value) => {
			if let Some(nonce) = value.as_u64() {
				return Ok(Some(nonce));
			}
			let text = value
				.as_str()
				.ok_or(DecodeError::MissingField { field: "nonce" })?;
			let digits = text.strip_prefix("0x").unwrap_or(text);
			u64::from_str_radix(digits, 16)
				.map(Some)
				.map_err(|_| DecodeError::InvalidHex { field: "nonce", value: text.to_string() })
		},
	}
}

/// Turn a prestate diff into per-account changes. Accounts present in `pre`
/// but absent from `post` were removed by the call.
fn decode_changes(diff: &Value) -> Result<Vec<AccountChange>, DecodeError> {
	let empty = Map::new();
	let pre = diff.get("pre").and_then(Value::as_object).unwrap_or(&empty);
	let post = diff.get("post").and_then(Value::as_object).unwrap_or(&empty);
	let mut changes = Vec::with_capacity(post.len());
	for (address, account) in post {
		let mut change =
			AccountChange { address: decode_address("account", address)?, ..Default::default() };
		if let Some(text) = account.get("balance").and_then(Value::as_str) {
			let word = decode_word_text("balance", text)?;
			change.balance = Some(U256::from_big_endian(word.as_bytes()));
		}
		change.nonce = decode_account_nonce(account)?;
		if let Some(text) = account.get("code").and_then(Value::as_str) {
			let digits = text.strip_prefix("0x").unwrap_or(text);
			change.code = Some(hex::decode(digits).map_err(|_| DecodeError::InvalidHex {
				field: "code",
				value: text.to_string(),
			})?);
		}
		if let Some(storage) = account.get("storage").and_then(Value::as_object) {
			for (slot, value) in storage {
				let value = value
					.as_str()
					.ok_or(DecodeError::MissingField { field: "storage value" })?;
				change.storage.insert(
					decode_word_text("storage slot", slot)?,
					decode_word_text("storage value", value)?,
				);
			}
		}
		changes.push(change);
	}
	for address in pre.keys() {
		if !post.contains_key(address) {
			changes.push(AccountChange {
				address: decode_address("account", address)?,
				removed: true,
				..Default::default()
			});
		}
	}
	Ok(changes)
}
