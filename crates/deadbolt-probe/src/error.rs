// SPDX-License-Identifier: GPL-3.0
//! Errors surfaced by script loading, call sequencing and probing.

use deadbolt_fork::{BlockSelector, ExecutionError, LedgerError, SessionError};
use std::path::PathBuf;
use thiserror::Error;

/// A malformed call script or artifact. Raised during loading and
/// validation, before any network call is issued.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// A script or artifact file could not be read.
	#[error("Failed to read `{}`: {message}", .path.display())]
	Io {
		/// Path of the unreadable file.
		path: PathBuf,
		/// Underlying I/O failure.
		message: String,
	},
	/// A script or artifact file is not valid JSON.
	#[error("Failed to parse `{}`: {message}", .path.display())]
	Json {
		/// Path of the malformed file.
		path: PathBuf,
		/// Underlying parse failure.
		message: String,
	},
	/// A deploy step names an artifact absent from the `artifacts` table.
	#[error("Unknown artifact `{name}`")]
	UnknownArtifact {
		/// The artifact name used by the step.
		name: String,
	},
	/// A step target references a name no earlier deploy step introduced.
	#[error("Step target `{name}` does not refer to an earlier deploy step")]
	UnknownDeployment {
		/// The referenced name.
		name: String,
	},
	/// Two deploy steps introduce the same name.
	#[error("Deploy step name `{name}` is used more than once")]
	DuplicateDeployment {
		/// The reused name.
		name: String,
	},
	/// An address literal is not 20 bytes of `0x`-prefixed hex.
	#[error("Invalid address `{value}`: {message}")]
	InvalidAddress {
		/// The offending literal.
		value: String,
		/// What was wrong with it.
		message: String,
	},
	/// An argument literal cannot be encoded.
	#[error("Invalid argument: {message}")]
	InvalidArgument {
		/// What was wrong with it.
		message: String,
	},
	/// A function signature cannot be parsed as `name(type,…)`.
	#[error("Invalid function signature `{0}`")]
	InvalidSignature(String),
	/// A literal selector is not 4 bytes of `0x`-prefixed hex.
	#[error("Invalid function selector `{value}`: expected 4 bytes of hex")]
	InvalidSelector {
		/// The offending literal.
		value: String,
	},
	/// A signature declares a different number of parameters than the step
	/// provides arguments.
	#[error("`{function}` declares {expected} parameter(s) but {actual} argument(s) were given")]
	ArityMismatch {
		/// The function signature.
		function: String,
		/// Parameters declared by the signature.
		expected: usize,
		/// Arguments provided by the step.
		actual: usize,
	},
	/// An argument tag does not match the type the signature declares at its
	/// position.
	#[error("Parameter {index} of `{function}` is `{expected}` but the argument is `{actual}`")]
	TypeMismatch {
		/// The function signature.
		function: String,
		/// Zero-based parameter position.
		index: usize,
		/// Type declared by the signature.
		expected: String,
		/// Tag of the provided argument.
		actual: &'static str,
	},
	/// An artifact file carries no bytecode.
	#[error("No bytecode found in `{}`", .path.display())]
	MissingBytecode {
		/// Path of the artifact.
		path: PathBuf,
	},
	/// An artifact's bytecode is not valid hex.
	#[error("Invalid bytecode in `{}`: {message}", .path.display())]
	InvalidBytecode {
		/// Path of the artifact.
		path: PathBuf,
		/// What was wrong with it.
		message: String,
	},
	/// A step is structurally invalid.
	#[error("Invalid step: {message}")]
	InvalidStep {
		/// What was wrong with it.
		message: String,
	},
}

/// A call step whose simulated call failed. Expected in the
/// REINIT_BLOCKED path, so it carries everything needed to report without
/// re-running.
#[derive(Debug, Error)]
#[error("Step {step_index} (`{label}`) failed: {reason}")]
pub struct StepFailedError {
	/// Zero-based position of the step in its run.
	pub step_index: usize,
	/// Human-readable step label.
	pub label: String,
	/// Revert reason or failure description.
	pub reason: String,
}

/// A call sequence that could not run to completion.
#[derive(Debug, Error)]
pub enum SequencerError {
	/// A step's simulated call reverted and the step does not continue on
	/// failure.
	#[error(transparent)]
	Step(#[from] StepFailedError),
	/// A step could not be simulated at all.
	#[error("Step {step_index} (`{label}`) could not be executed: {source}")]
	Execution {
		/// Zero-based position of the step in its run.
		step_index: usize,
		/// Human-readable step label.
		label: String,
		/// Underlying executor failure.
		#[source]
		source: ExecutionError,
	},
	/// A step references a deployment name this run never produced.
	#[error("No deployment named `{0}` exists in this run")]
	MissingDeployment(String),
	/// A step references the probe target but the run has none.
	#[error("Step references the probe target but none was provided")]
	MissingTarget,
}

/// A storage survey that could not be taken.
#[derive(Debug, Error)]
pub enum SurveyError {
	/// The endpoint has no block at the requested selector.
	#[error("Block not found at `{selector}`")]
	BlockMissing {
		/// The selector that resolved to nothing.
		selector: BlockSelector,
	},
	/// A ledger read failed.
	#[error(transparent)]
	Ledger(#[from] LedgerError),
}

/// A probe run that could not produce a verdict.
#[derive(Debug, Error)]
pub enum ProbeError {
	/// The fork session refused a read or write.
	#[error("Session error: {0}")]
	Session(#[from] SessionError),
	/// An auxiliary step failed or could not be executed.
	#[error(transparent)]
	Sequencer(#[from] SequencerError),
	/// The run was cancelled before a verdict was reached.
	#[error("Probe cancelled")]
	Cancelled,
}
