// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The two-layer flag store.
//!
//! The real layer holds the last complete flag set from the delivery backend
//! and is only ever replaced wholesale. The override layer holds local debug
//! values and always wins on reads. The two layers have independent
//! lifecycles: replacing flags never touches overrides and clearing overrides
//! never touches flags.

use loom_flagstore_core::{
	EvaluatedFlag, FlagMap, FlagRecord, OverrideMap, OverrideRecord, ResolvedFlags,
};
use serde_json::Value;
use tracing::{debug, info};

/// Override-aware store of pre-evaluated flags.
///
/// The store performs no locking. Wrap it in
/// [`SharedFlagStore`](crate::SharedFlagStore) to share it between tasks.
#[derive(Debug, Clone, Default)]
pub struct FlagStore {
	flags: FlagMap,
	overrides: OverrideMap,
}

impl FlagStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store whose real layer starts as `flags`.
	pub fn with_flags(flags: FlagMap) -> Self {
		Self {
			flags,
			overrides: OverrideMap::new(),
		}
	}

	/// Resolves a single flag.
	///
	/// An override wins whenever one exists for `key`, whatever its value.
	/// Otherwise the real record is returned unless it is missing or a
	/// tombstone.
	pub fn get(&self, key: &str) -> Option<EvaluatedFlag> {
		if let Some(record) = self.overrides.get(key) {
			return Some(EvaluatedFlag::from(record));
		}

		self.flags.get(key).and_then(FlagRecord::as_present).cloned()
	}

	/// Resolves every flag that currently has a value.
	///
	/// Tombstoned real flags are left out unless an override forces them
	/// present. Override-only keys are included. The returned map is a fresh
	/// copy.
	pub fn get_all_resolved(&self) -> ResolvedFlags {
		let mut resolved = ResolvedFlags::with_capacity(self.flags.len() + self.overrides.len());

		for (key, record) in &self.flags {
			if record.is_deleted() {
				continue;
			}
			if let Some(flag) = self.get(key) {
				resolved.insert(key.clone(), flag);
			}
		}

		for key in self.overrides.keys() {
			if resolved.contains_key(key) {
				continue;
			}
			if let Some(flag) = self.get(key) {
				resolved.insert(key.clone(), flag);
			}
		}

		resolved
	}

	/// Replaces the entire real layer.
	///
	/// Keys absent from `flags` stop resolving through the real layer but may
	/// still resolve through an override.
	pub fn set_flags(&mut self, flags: FlagMap) {
		let previous = std::mem::replace(&mut self.flags, flags);
		info!(
			flags = self.flags.len(),
			previous_flags = previous.len(),
			"Replaced real flags"
		);
	}

	/// Installs or overwrites the override for `key`.
	pub fn set_override(&mut self, key: impl Into<String>, value: Value) {
		let key = key.into();
		debug!(flag_key = %key, "Override set");
		self.overrides.insert(key, OverrideRecord::new(value));
	}

	/// Removes the override for `key`, returning it if there was one.
	///
	/// Removing the last override releases the override map's allocation.
	pub fn remove_override(&mut self, key: &str) -> Option<OverrideRecord> {
		let removed = self.overrides.remove(key);
		if removed.is_some() {
			debug!(flag_key = %key, "Override removed");
			if self.overrides.is_empty() {
				self.overrides = OverrideMap::new();
			}
		}
		removed
	}

	/// Removes every override and returns what was cleared.
	pub fn clear_all_overrides(&mut self) -> OverrideMap {
		let cleared = std::mem::take(&mut self.overrides);
		if !cleared.is_empty() {
			debug!(overrides = cleared.len(), "Cleared all overrides");
		}
		cleared
	}

	/// The raw real layer, before overrides are applied.
	pub fn real_flags(&self) -> &FlagMap {
		&self.flags
	}

	/// A copy of the current overrides.
	pub fn overrides(&self) -> OverrideMap {
		self.overrides.clone()
	}

	pub fn has_overrides(&self) -> bool {
		!self.overrides.is_empty()
	}
}


#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	fn record() -> impl Strategy<Value = FlagRecord> {
		prop_oneof![
			3 => any::<i64>().prop_map(FlagRecord::present),
			1 => (0u64..100).prop_map(FlagRecord::deleted),
		]
	}

	fn flag_map() -> impl Strategy<Value = FlagMap> {
		prop::collection::hash_map("[a-e]", record(), 0..5)
	}

	fn override_map() -> impl Strategy<Value = Vec<(String, i64)>> {
		prop::collection::vec(("[a-g]", any::<i64>()), 0..5)
	}

	proptest! {
		#[test]
		fn get_follows_precedence(flags in flag_map(), overrides in override_map(), key in "[a-g]") {
			let mut store = FlagStore::with_flags(flags.clone());
			for (k, v) in &overrides {
				store.set_override(k.clone(), Value::from(*v));
			}

			let expected_override = overrides.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| *v);
			let expected = match expected_override {
				Some(v) => Some(EvaluatedFlag::new(v)),
				None => flags.get(&key).and_then(FlagRecord::as_present).cloned(),
			};

			prop_assert_eq!(store.get(&key), expected);
		}

		#[test]
		fn get_all_resolved_agrees_with_get(flags in flag_map(), overrides in override_map()) {
			let mut store = FlagStore::with_flags(flags);
			for (k, v) in &overrides {
				store.set_override(k.clone(), Value::from(*v));
			}

			let resolved = store.get_all_resolved();
			for key in ["a", "b", "c", "d", "e", "f", "g"] {
				prop_assert_eq!(resolved.get(key).cloned(), store.get(key));
			}
		}

		#[test]
		fn set_flags_forgets_missing_keys(before in flag_map(), after in flag_map()) {
			let mut store = FlagStore::with_flags(before);
			store.set_flags(after.clone());

			prop_assert_eq!(store.real_flags(), &after);
			for key in ["a", "b", "c", "d", "e"] {
				if !after.contains_key(key) {
					prop_assert!(store.get(key).is_none());
				}
			}
		}

		#[test]
		fn override_round_trip_restores_value(flags in flag_map(), key in "[a-g]", value: i64) {
			let mut store = FlagStore::with_flags(flags);
			let before = store.get(&key);

			store.set_override(key.clone(), Value::from(value));
			prop_assert_eq!(store.get(&key), Some(EvaluatedFlag::new(value)));

			store.remove_override(&key);
			prop_assert_eq!(store.get(&key), before);
		}

		#[test]
		fn clear_returns_exactly_previous_overrides(flags in flag_map(), overrides in override_map()) {
			let mut store = FlagStore::with_flags(flags.clone());
			for (k, v) in &overrides {
				store.set_override(k.clone(), Value::from(*v));
			}
			let before = store.overrides();

			let cleared = store.clear_all_overrides();

			prop_assert_eq!(&cleared, &before);
			prop_assert!(store.overrides().is_empty());
			for key in cleared.keys() {
				prop_assert_eq!(
					store.get(key),
					flags.get(key).and_then(FlagRecord::as_present).cloned()
				);
			}
		}
	}
}
