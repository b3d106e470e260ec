// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery stream events and the upstream merge onto a full flag map.
//!
//! The store only accepts wholesale replacement, so incremental updates are
//! folded into a copy of the current map here before being handed over.
//!
//! # Events
//!
//! - `put` - Full flag set, replaces everything
//! - `patch` - One flag changed
//! - `delete` - One flag removed (stored as a tombstone)
//! - `heartbeat` - Keep-alive, nothing to merge
//!
//! # Example
//!
//! ```
//! use loom_flagstore_core::{EvaluatedFlag, FlagMap, FlagStreamEvent};
//!
//! let event = FlagStreamEvent::patch("feature.new_flow", EvaluatedFlag::new(true).with_version(2));
//! let merged = event.merge_into(&FlagMap::new()).expect("patch onto empty map applies");
//! assert!(merged.contains_key("feature.new_flow"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::record::{EvaluatedFlag, FlagMap, FlagRecord};

/// Stream event types for flag delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum FlagStreamEvent {
	/// Complete flag set.
	#[serde(rename = "put")]
	Put(PutData),

	/// A single flag was added or changed.
	#[serde(rename = "patch")]
	Patch(PatchData),

	/// A single flag was deleted.
	#[serde(rename = "delete")]
	Delete(DeleteData),

	/// Heartbeat for connection keep-alive.
	#[serde(rename = "heartbeat")]
	Heartbeat(HeartbeatData),
}

impl FlagStreamEvent {
	/// Returns the event type name as a string.
	pub fn event_type(&self) -> &'static str {
		match self {
			FlagStreamEvent::Put(_) => "put",
			FlagStreamEvent::Patch(_) => "patch",
			FlagStreamEvent::Delete(_) => "delete",
			FlagStreamEvent::Heartbeat(_) => "heartbeat",
		}
	}

	/// Decodes an event from its JSON encoding.
	pub fn decode(data: &str) -> Result<Self> {
		Ok(serde_json::from_str(data)?)
	}

	pub fn put(flags: FlagMap) -> Self {
		FlagStreamEvent::Put(PutData {
			flags,
			timestamp: Utc::now(),
		})
	}

	pub fn patch(key: impl Into<String>, flag: EvaluatedFlag) -> Self {
		FlagStreamEvent::Patch(PatchData {
			key: key.into(),
			flag,
			timestamp: Utc::now(),
		})
	}

	pub fn delete(key: impl Into<String>, version: u64) -> Self {
		FlagStreamEvent::Delete(DeleteData {
			key: key.into(),
			version,
			timestamp: Utc::now(),
		})
	}

	pub fn heartbeat() -> Self {
		FlagStreamEvent::Heartbeat(HeartbeatData {
			timestamp: Utc::now(),
		})
	}

	/// Computes the full flag map that results from applying this event to
	/// `current`.
	///
	/// Returns `None` when there is nothing to replace: heartbeats, and
	/// patches or deletes that are not newer than the stored record.
	pub fn merge_into(&self, current: &FlagMap) -> Option<FlagMap> {
		match self {
			FlagStreamEvent::Put(data) => Some(data.flags.clone()),
			FlagStreamEvent::Patch(data) => {
				merge_record(current, &data.key, FlagRecord::Present(data.flag.clone()))
			}
			FlagStreamEvent::Delete(data) => {
				merge_record(current, &data.key, FlagRecord::deleted(data.version))
			}
			FlagStreamEvent::Heartbeat(_) => None,
		}
	}
}

fn merge_record(current: &FlagMap, key: &str, incoming: FlagRecord) -> Option<FlagMap> {
	if let Some(existing) = current.get(key) {
		if !supersedes(&incoming, existing) {
			warn!(
				flag_key = %key,
				incoming_version = ?incoming.version(),
				stored_version = ?existing.version(),
				"Ignoring stale flag update"
			);
			return None;
		}
	}

	let mut merged = current.clone();
	merged.insert(key.to_string(), incoming);
	Some(merged)
}

/// Versions are only compared when both sides carry one.
fn supersedes(incoming: &FlagRecord, existing: &FlagRecord) -> bool {
	match (incoming.version(), existing.version()) {
		(Some(new), Some(old)) => new > old,
		_ => true,
	}
}

/// Full flag set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PutData {
	pub flags: FlagMap,
	pub timestamp: DateTime<Utc>,
}

/// Single flag update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchData {
	pub key: String,
	pub flag: EvaluatedFlag,
	pub timestamp: DateTime<Utc>,
}

/// Single flag deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteData {
	pub key: String,
	/// Version of the deletion; the tombstone keeps it.
	pub version: u64,
	pub timestamp: DateTime<Utc>,
}

/// Heartbeat event data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeartbeatData {
	pub timestamp: DateTime<Utc>,
}
