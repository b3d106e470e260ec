// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bootstrap payload parsing.
//!
//! A bootstrap payload lets a client start with known flag values before the
//! delivery backend has answered. It is a JSON object of `flag key -> value`.
//! Keys beginning with `$` carry metadata rather than flags; `$flagsState`
//! may supply per-flag `version`, `variation` and `trackEvents`:
//!
//! ```json
//! {
//!   "checkout.new_flow": true,
//!   "ui.theme": "dark",
//!   "$flagsState": {
//!     "checkout.new_flow": { "version": 12, "variation": 0 }
//!   },
//!   "$valid": true
//! }
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{FlagStoreError, Result};
use crate::record::{EvaluatedFlag, FlagMap, FlagRecord};

const METADATA_PREFIX: char = '$';
const FLAGS_STATE_KEY: &str = "$flagsState";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlagMetadata {
	#[serde(default)]
	version: Option<u64>,
	#[serde(default)]
	variation: Option<u32>,
	#[serde(default)]
	track_events: bool,
}

/// Parses a bootstrap payload into a flag map suitable for `set_flags`.
pub fn parse_bootstrap(payload: &Value) -> Result<FlagMap> {
	let object = payload.as_object().ok_or_else(|| {
		FlagStoreError::InvalidBootstrap(format!(
			"expected a JSON object, found {}",
			json_kind(payload)
		))
	})?;

	let metadata = match object.get(FLAGS_STATE_KEY) {
		Some(state) => serde_json::from_value::<HashMap<String, FlagMetadata>>(state.clone())
			.map_err(|e| FlagStoreError::InvalidBootstrap(format!("{FLAGS_STATE_KEY}: {e}")))?,
		None => Default::default(),
	};

	let flags: FlagMap = object
		.iter()
		.filter(|(key, _)| !key.starts_with(METADATA_PREFIX))
		.map(|(key, value)| {
			let meta = metadata.get(key);
			let flag = EvaluatedFlag {
				value: value.clone(),
				version: meta.and_then(|m| m.version),
				variation: meta.and_then(|m| m.variation),
				track_events: meta.is_some_and(|m| m.track_events),
			};
			(key.clone(), FlagRecord::Present(flag))
		})
		.collect();

	debug!(flags = flags.len(), "Parsed bootstrap payload");
	Ok(flags)
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
