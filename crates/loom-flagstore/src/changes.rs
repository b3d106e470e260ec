// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Change detection between two resolved flag views.

use loom_flagstore_core::ResolvedFlags;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A flag whose resolved value differs between two views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagChange {
	pub key: String,
	/// `None` when the flag did not resolve before.
	pub previous: Option<Value>,
	/// `None` when the flag no longer resolves.
	pub current: Option<Value>,
}

impl FlagChange {
	pub fn is_addition(&self) -> bool {
		self.previous.is_none() && self.current.is_some()
	}

	pub fn is_removal(&self) -> bool {
		self.previous.is_some() && self.current.is_none()
	}
}

/// Lists every key whose resolved value changed, sorted by key.
///
/// Only values are compared; a new version carrying the same value is not a
/// change.
pub fn diff_resolved(before: &ResolvedFlags, after: &ResolvedFlags) -> Vec<FlagChange> {
	let mut changes: Vec<FlagChange> = before
		.keys()
		.chain(after.keys().filter(|k| !before.contains_key(*k)))
		.filter_map(|key| {
			let previous = before.get(key).map(|f| &f.value);
			let current = after.get(key).map(|f| &f.value);
			(previous != current).then(|| FlagChange {
				key: key.clone(),
				previous: previous.cloned(),
				current: current.cloned(),
			})
		})
		.collect();

	changes.sort_by(|a, b| a.key.cmp(&b.key));
	changes
}
