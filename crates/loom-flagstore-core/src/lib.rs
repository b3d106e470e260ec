// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom flag store.
//!
//! This crate provides the records held by the client-side flag store
//! (`loom-flagstore`) and the boundary types that feed it: bootstrap
//! payloads and delivery stream events.
//!
//! # Overview
//!
//! - [`FlagRecord`]: a pre-evaluated flag, either present or a tombstone
//! - [`OverrideRecord`]: a local debug override value
//! - [`parse_bootstrap`]: seed flags from a bootstrap JSON payload
//! - [`FlagStreamEvent`]: incremental delivery updates, merged upstream into
//!   full flag maps
//!
//! # Example
//!
//! ```
//! use loom_flagstore_core::{parse_bootstrap, FlagRecord};
//!
//! let flags = parse_bootstrap(&serde_json::json!({
//!     "feature.new_flow": true,
//!     "$valid": true,
//! }))
//! .unwrap();
//!
//! assert_eq!(flags["feature.new_flow"], FlagRecord::present(true));
//! ```

pub mod bootstrap;
pub mod error;
pub mod record;
pub mod stream;

pub use bootstrap::parse_bootstrap;
pub use error::{FlagStoreError, Result};
pub use record::{EvaluatedFlag, FlagMap, FlagRecord, OverrideMap, OverrideRecord, ResolvedFlags};
pub use stream::{DeleteData, FlagStreamEvent, HeartbeatData, PatchData, PutData};

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn json_scalar() -> impl Strategy<Value = serde_json::Value> {
		prop_oneof![
			Just(serde_json::Value::Null),
			any::<bool>().prop_map(serde_json::Value::from),
			any::<i64>().prop_map(serde_json::Value::from),
			"[a-zA-Z0-9 ]{0,20}".prop_map(serde_json::Value::from),
		]
	}

	// Property-based tests for record wire encoding
	proptest! {
		#[test]
		fn present_record_roundtrip(
			value in json_scalar(),
			version in prop::option::of(0u64..1_000_000),
			variation in prop::option::of(0u32..16),
			track_events in proptest::bool::ANY,
		) {
			let record = FlagRecord::Present(EvaluatedFlag {
				value,
				version,
				variation,
				track_events,
			});

			let json = serde_json::to_string(&record).unwrap();
			let parsed: FlagRecord = serde_json::from_str(&json).unwrap();
			prop_assert_eq!(parsed, record);
		}

		#[test]
		fn deleted_marker_always_yields_tombstone(
			value in json_scalar(),
			version in 0u64..1_000_000,
		) {
			let wire = serde_json::json!({"value": value, "version": version, "deleted": true});
			let parsed: FlagRecord = serde_json::from_value(wire).unwrap();
			prop_assert_eq!(parsed, FlagRecord::deleted(version));
		}
	}

	// Property-based tests for bootstrap parsing
	proptest! {
		#[test]
		fn bootstrap_keeps_every_non_metadata_key(
			flags in prop::collection::hash_map("[a-z][a-z0-9_.]{0,20}", json_scalar(), 0..10),
		) {
			let mut payload = serde_json::Map::new();
			for (key, value) in &flags {
				payload.insert(key.clone(), value.clone());
			}
			payload.insert("$valid".to_string(), serde_json::Value::Bool(true));

			let parsed = parse_bootstrap(&serde_json::Value::Object(payload)).unwrap();
			prop_assert_eq!(parsed.len(), flags.len());
			for (key, value) in &flags {
				prop_assert_eq!(parsed.get(key), Some(&FlagRecord::present(value.clone())));
			}
		}
	}

	// Property-based tests for stream merges
	proptest! {
		#[test]
		fn patch_applies_iff_newer(old in 0u64..100, new in 0u64..100) {
			let mut current = FlagMap::new();
			current.insert(
				"flag".to_string(),
				FlagRecord::Present(EvaluatedFlag::new("old").with_version(old)),
			);

			let event = FlagStreamEvent::patch("flag", EvaluatedFlag::new("new").with_version(new));
			let merged = event.merge_into(&current);
			prop_assert_eq!(merged.is_some(), new > old);
		}

		#[test]
		fn merge_never_touches_other_keys(
			others in prop::collection::hash_map("[a-z]{1,8}", json_scalar(), 0..8),
			version in 0u64..100,
		) {
			let mut current = FlagMap::new();
			for (key, value) in &others {
				current.insert(key.clone(), FlagRecord::present(value.clone()));
			}

			let key = "target.flag";
			let merged = FlagStreamEvent::delete(key, version).merge_into(&current).unwrap();

			prop_assert_eq!(merged.len(), current.len() + 1);
			for (key, record) in &current {
				prop_assert_eq!(merged.get(key), Some(record));
			}
		}

		#[test]
		fn event_type_matches_serialized_tag(version in 0u64..100) {
			let events = vec![
				FlagStreamEvent::put(FlagMap::new()),
				FlagStreamEvent::patch("test", EvaluatedFlag::new(true).with_version(version)),
				FlagStreamEvent::delete("test", version),
				FlagStreamEvent::heartbeat(),
			];

			for event in events {
				let event_type = event.event_type();
				let json = serde_json::to_string(&event).unwrap();
				let tag = format!(r#""event":"{}""#, event_type);
				prop_assert!(json.contains(&tag), "missing tag {} in {}", tag, json);
			}
		}
	}
}
