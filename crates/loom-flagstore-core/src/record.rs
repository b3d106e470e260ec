// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flag and override records held by the flag store.
//!
//! A [`FlagRecord`] is either a live evaluation result or a tombstone. On the
//! wire a tombstone is an ordinary record carrying `"deleted": true`; inside the
//! store the two states are distinct enum variants so that a deleted flag can
//! never be mistaken for a present one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Real flag records keyed by flag key.
pub type FlagMap = HashMap<String, FlagRecord>;

/// Local override records keyed by flag key.
pub type OverrideMap = HashMap<String, OverrideRecord>;

/// Override-aware view of every flag that currently resolves.
pub type ResolvedFlags = HashMap<String, EvaluatedFlag>;

/// A pre-evaluated flag as delivered by the evaluation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedFlag {
	/// The evaluated value. Any JSON value, including `null` and `false`.
	#[serde(default, skip_serializing_if = "Value::is_null")]
	pub value: Value,
	/// Monotonic version assigned by the backend.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<u64>,
	/// Index of the variation that produced `value`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub variation: Option<u32>,
	/// Whether evaluations of this flag should be reported.
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub track_events: bool,
}

impl EvaluatedFlag {
	/// Creates a flag carrying only a value.
	pub fn new(value: impl Into<Value>) -> Self {
		Self {
			value: value.into(),
			version: None,
			variation: None,
			track_events: false,
		}
	}

	pub fn with_version(mut self, version: u64) -> Self {
		self.version = Some(version);
		self
	}

	pub fn with_variation(mut self, variation: u32) -> Self {
		self.variation = Some(variation);
		self
	}

	pub fn with_track_events(mut self, track_events: bool) -> Self {
		self.track_events = track_events;
		self
	}
}

/// Stored state of a real flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireRecord", into = "WireRecord")]
pub enum FlagRecord {
	/// The flag exists and resolves to the contained evaluation.
	Present(EvaluatedFlag),
	/// The flag was removed server-side. Kept so that later, older updates
	/// cannot resurrect it.
	Deleted { version: Option<u64> },
}

impl FlagRecord {
	/// Creates a present record with only a value.
	pub fn present(value: impl Into<Value>) -> Self {
		FlagRecord::Present(EvaluatedFlag::new(value))
	}

	/// Creates a tombstone at the given version.
	pub fn deleted(version: u64) -> Self {
		FlagRecord::Deleted {
			version: Some(version),
		}
	}

	/// Creates a tombstone that carries no version.
	pub fn deleted_unversioned() -> Self {
		FlagRecord::Deleted { version: None }
	}

	pub fn is_deleted(&self) -> bool {
		matches!(self, FlagRecord::Deleted { .. })
	}

	/// Returns the evaluation if the record is not a tombstone.
	pub fn as_present(&self) -> Option<&EvaluatedFlag> {
		match self {
			FlagRecord::Present(flag) => Some(flag),
			FlagRecord::Deleted { .. } => None,
		}
	}

	/// Returns the record version, if one is known.
	pub fn version(&self) -> Option<u64> {
		match self {
			FlagRecord::Present(flag) => flag.version,
			FlagRecord::Deleted { version } => *version,
		}
	}
}

impl From<EvaluatedFlag> for FlagRecord {
	fn from(flag: EvaluatedFlag) -> Self {
		FlagRecord::Present(flag)
	}
}

/// Wire shape shared by live records and tombstones.
#[derive(Serialize, Deserialize)]
struct WireRecord {
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	deleted: bool,
	#[serde(flatten)]
	flag: EvaluatedFlag,
}

impl From<WireRecord> for FlagRecord {
	fn from(wire: WireRecord) -> Self {
		if wire.deleted {
			FlagRecord::Deleted {
				version: wire.flag.version,
			}
		} else {
			FlagRecord::Present(wire.flag)
		}
	}
}

impl From<FlagRecord> for WireRecord {
	fn from(record: FlagRecord) -> Self {
		match record {
			FlagRecord::Present(flag) => WireRecord {
				deleted: false,
				flag,
			},
			FlagRecord::Deleted { version } => WireRecord {
				deleted: true,
				flag: EvaluatedFlag {
					value: Value::Null,
					version,
					variation: None,
					track_events: false,
				},
			},
		}
	}
}

/// A local debug override. The store never inspects the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
	pub value: Value,
}

impl OverrideRecord {
	pub fn new(value: impl Into<Value>) -> Self {
		Self {
			value: value.into(),
		}
	}
}

impl From<&OverrideRecord> for EvaluatedFlag {
	fn from(record: &OverrideRecord) -> Self {
		EvaluatedFlag::new(record.value.clone())
	}
}
