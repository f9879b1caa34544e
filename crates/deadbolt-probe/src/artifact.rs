// SPDX-License-Identifier: GPL-3.0
//! Compiled contract artifacts.
//!
//! Artifacts are JSON files produced by an external compiler. Only the
//! creation bytecode is consumed here; both the flat `{"bytecode": "0x…"}`
//! shape and the nested `{"bytecode": {"object": "0x…"}}` shape are
//! accepted.

use crate::error::ConfigError;
use serde_json::Value;
use std::{fs, path::Path};

/// Load the creation bytecode of the artifact at `path`.
pub fn load_bytecode(path: &Path) -> Result<Vec<u8>, ConfigError> {
	let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
		path: path.to_path_buf(),
		message: e.to_string(),
	})?;
	let document: Value = serde_json::from_str(&text).map_err(|e| ConfigError::Json {
		path: path.to_path_buf(),
		message: e.to_string(),
	})?;
	let missing = || ConfigError::MissingBytecode { path: path.to_path_buf() };
	let bytecode = match document.get("bytecode").ok_or_else(missing)? {
		Value::String(text) => text.as_str(),
		Value::Object(object) => object.get("object").and_then(Value::as_str).ok_or_else(missing)?,
		_ => return Err(missing()),
	};
	let invalid = |message: String| ConfigError::InvalidBytecode {
		path: path.to_path_buf(),
		message,
	};
	let digits = bytecode.strip_prefix("0x").unwrap_or(bytecode);
	let bytes = hex::decode(digits).map_err(|e| invalid(e.to_string()))?;
	if bytes.is_empty() {
		return Err(invalid("bytecode is empty".to_string()));
	}
	Ok(bytes)
}
