// SPDX-License-Identifier: GPL-3.0
//! Declarative call scripts.
//!
//! A script describes the scenario a probe replays: the caller identity,
//! compiled artifacts by name, storage slots to watch, auxiliary preparation
//! steps, and the initializer and marker calls. Loading validates addresses,
//! signatures, artifact bytecode and name references up front, so a
//! malformed script fails before any network call is issued.

use crate::{
	abi::{self, AbiValue},
	artifact,
	error::ConfigError,
};
use serde::Deserialize;
use sp_core::{H160, H256, U256};
use std::{
	collections::{HashMap, HashSet},
	fs,
	path::{Path, PathBuf},
};

/// A validated call script.
#[derive(Clone, Debug)]
pub struct CallScript {
	/// Identity all calls are issued from unless a step overrides it.
	pub caller: H160,
	/// Storage slots of the probe target whose drift is evidence.
	pub watch_slots: Vec<H256>,
	/// Auxiliary steps run before the initializer.
	pub steps: Vec<CallStep>,
	/// The reinitialization attempt.
	pub initializer: CallStep,
	/// The follow-up call proving control was established.
	pub marker: CallStep,
}

/// One validated step of a call script.
#[derive(Clone, Debug)]
pub struct CallStep {
	/// Human-readable label used in logs and reports.
	pub label: String,
	pub caller: H160,
	pub action: StepAction,
	/// Value transferred with the call.
	pub value: U256,
	/// Gas limit, endpoint default when absent.
	pub gas: Option<u64>,
	/// Keep sequencing past a failure of this step.
	pub continue_on_failure: bool,
}

/// What a step does.
#[derive(Clone, Debug)]
pub enum StepAction {
	Deploy {
		/// Name later steps may reference the deployed address by.
		name: Option<String>,
		/// Creation bytecode with encoded constructor arguments appended.
		code: Vec<u8>,
	},
	Invoke {
		target: CallTarget,
		/// Full calldata, selector included.
		data: Vec<u8>,
	},
}

/// Where an invoke step is directed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallTarget {
	/// A literal address.
	Address(H160),
	/// The probe's target contract.
	Probe,
	/// The address produced by an earlier named deploy step.
	Deployed(String),
}

impl CallScript {
	/// Load and validate the script at `path`. Artifact paths are resolved
	/// relative to the script's directory.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			message: e.to_string(),
		})?;
		let raw: RawScript = serde_json::from_str(&text).map_err(|e| ConfigError::Json {
			path: path.to_path_buf(),
			message: e.to_string(),
		})?;
		let base = path.parent().unwrap_or_else(|| Path::new(""));
		validate(raw, base)
	}
}

fn validate(raw: RawScript, base: &Path) -> Result<CallScript, ConfigError> {
	let caller = abi::parse_address(&raw.caller)?;
	let watch_slots = raw
		.watch
		.slots
		.iter()
		.map(|slot| Ok(H256::from(uint_value(slot)?.to_big_endian())))
		.collect::<Result<Vec<_>, ConfigError>>()?;

	let mut deployments = HashSet::new();
	let steps = raw
		.steps
		.into_iter()
		.map(|step| validate_step(step, caller, &raw.artifacts, base, &mut deployments))
		.collect::<Result<Vec<_>, _>>()?;

	let initializer =
		validate_probe_step(raw.initializer, "initializer", caller, &deployments)?;
	let marker = validate_probe_step(raw.marker, "marker", caller, &deployments)?;
	Ok(CallScript { caller, watch_slots, steps, initializer, marker })
}

/// Validate one auxiliary step, recording the name a deploy introduces for
/// later steps to reference.
fn validate_step(
	raw: RawStep,
	default_caller: H160,
	artifacts: &HashMap<String, PathBuf>,
	base: &Path,
	deployments: &mut HashSet<String>,
) -> Result<CallStep, ConfigError> {
	let caller = step_caller(&raw, default_caller)?;
	let value = step_value(&raw)?;
	match (raw.deploy, raw.invoke) {
		(Some(deploy), None) => {
			let path = artifacts.get(&deploy.artifact).ok_or_else(|| {
				ConfigError::UnknownArtifact { name: deploy.artifact.clone() }
			})?;
			let mut code = artifact::load_bytecode(&base.join(path))?;
			code.extend(abi::encode_args(&arg_values(&deploy.args)?)?);
			if let Some(name) = &raw.name {
				if !deployments.insert(name.clone()) {
					return Err(ConfigError::DuplicateDeployment { name: name.clone() });
				}
			}
			let label =
				raw.name.clone().unwrap_or_else(|| format!("deploy {}", deploy.artifact));
			Ok(CallStep {
				label,
				caller,
				action: StepAction::Deploy { name: raw.name, code },
				value,
				gas: raw.gas,
				continue_on_failure: raw.continue_on_failure,
			})
		},
		(None, Some(invoke)) => {
			if raw.name.is_some() {
				return Err(ConfigError::InvalidStep {
					message: "only deploy steps may be named".to_string(),
				});
			}
			let target = resolve_target(invoke.target, deployments)?;
			let data = abi::encode_call(&invoke.function, &arg_values(&invoke.args)?)?;
			Ok(CallStep {
				label: invoke.function,
				caller,
				action: StepAction::Invoke { target, data },
				value,
				gas: raw.gas,
				continue_on_failure: raw.continue_on_failure,
			})
		},
		_ => Err(ConfigError::InvalidStep {
			message: "a step must have exactly one of `deploy` or `invoke`".to_string(),
		}),
	}
}

/// Validate the initializer or marker step, which must invoke.
fn validate_probe_step(
	raw: RawStep,
	role: &str,
	default_caller: H160,
	deployments: &HashSet<String>,
) -> Result<CallStep, ConfigError> {
	let caller = step_caller(&raw, default_caller)?;
	let value = step_value(&raw)?;
	let Some(invoke) = raw.invoke else {
		return Err(ConfigError::InvalidStep {
			message: format!("the {role} must be an invoke step"),
		});
	};
	if raw.deploy.is_some() || raw.name.is_some() {
		return Err(ConfigError::InvalidStep {
			message: format!("the {role} must be an invoke step"),
		});
	}
	let target = resolve_target(invoke.target, deployments)?;
	let data = abi::encode_call(&invoke.function, &arg_values(&invoke.args)?)?;
	Ok(CallStep {
		label: format!("{role} {}", invoke.function),
		caller,
		action: StepAction::Invoke { target, data },
		value,
		gas: raw.gas,
		continue_on_failure: raw.continue_on_failure,
	})
}

fn resolve_target(
	raw: RawTarget,
	deployments: &HashSet<String>,
) -> Result<CallTarget, ConfigError> {
	match raw {
		RawTarget::Literal(text) if text == "target" => Ok(CallTarget::Probe),
		RawTarget::Literal(text) => Ok(CallTarget::Address(abi::parse_address(&text)?)),
		RawTarget::Deployed { deployed } => {
			if !deployments.contains(&deployed) {
				return Err(ConfigError::UnknownDeployment { name: deployed });
			}
			Ok(CallTarget::Deployed(deployed))
		},
	}
}

fn step_caller(raw: &RawStep, default_caller: H160) -> Result<H160, ConfigError> {
	match &raw.caller {
		Some(text) => abi::parse_address(text),
		None => Ok(default_caller),
	}
}

fn step_value(raw: &RawStep) -> Result<U256, ConfigError> {
	match &raw.value {
		Some(value) => uint_value(value),
		None => Ok(U256::zero()),
	}
}

fn arg_values(args: &[RawArg]) -> Result<Vec<AbiValue>, ConfigError> {
	args.iter().map(arg_value).collect()
}

fn arg_value(arg: &RawArg) -> Result<AbiValue, ConfigError> {
	Ok(match arg {
		RawArg::Address(text) => AbiValue::Address(abi::parse_address(text)?),
		RawArg::Uint256(value) => AbiValue::Uint(uint_value(value)?),
		RawArg::Bool(value) => AbiValue::Bool(*value),
		RawArg::Bytes32(text) => AbiValue::FixedBytes(abi::parse_word(text)?),
		RawArg::Bytes(text) => AbiValue::Bytes(abi::parse_bytes(text)?),
		RawArg::String(text) => AbiValue::Str(text.clone()),
		RawArg::Raw(text) => AbiValue::Raw(abi::parse_bytes(text)?),
	})
}

fn uint_value(value: &RawUint) -> Result<U256, ConfigError> {
	match value {
		RawUint::Number(value) => Ok(U256::from(*value)),
		RawUint::Text(text) => abi::parse_uint(text),
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScript {
	caller: String,
	#[serde(default)]
	artifacts: HashMap<String, PathBuf>,
	#[serde(default)]
	watch: RawWatch,
	#[serde(default)]
	steps: Vec<RawStep>,
	initializer: RawStep,
	marker: RawStep,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWatch {
	#[serde(default)]
	slots: Vec<RawUint>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	deploy: Option<RawDeploy>,
	#[serde(default)]
	invoke: Option<RawInvoke>,
	#[serde(default)]
	caller: Option<String>,
	#[serde(default)]
	value: Option<RawUint>,
	#[serde(default)]
	gas: Option<u64>,
	#[serde(default)]
	continue_on_failure: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeploy {
	artifact: String,
	#[serde(default)]
	args: Vec<RawArg>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInvoke {
	target: RawTarget,
	function: String,
	#[serde(default)]
	args: Vec<RawArg>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTarget {
	Literal(String),
	Deployed { deployed: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawArg {
	Address(String),
	Uint256(RawUint),
	Bool(bool),
	Bytes32(String),
	Bytes(String),
	String(String),
	Raw(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUint {
	Number(u64),
	Text(String),
}
