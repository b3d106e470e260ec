// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared, change-notifying handle over a [`FlagStore`].
//!
//! [`FlagStore`] does no locking of its own. This handle serializes all access
//! behind one async lock so the delivery side and the debugging side of a
//! client can hold clones of the same store. Every mutation is diffed against
//! the resolved view it replaced and the resulting [`FlagChange`]s are
//! broadcast to subscribers.

use std::sync::Arc;

use loom_flagstore_core::{
	EvaluatedFlag, FlagMap, FlagStoreError, FlagStreamEvent, OverrideMap, OverrideRecord,
	ResolvedFlags, Result,
};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::changes::{diff_resolved, FlagChange};
use crate::config::FlagStoreConfig;
use crate::store::FlagStore;

/// Cloneable handle to a flag store shared between tasks.
#[derive(Clone)]
pub struct SharedFlagStore {
	inner: Arc<SharedInner>,
}

struct SharedInner {
	store: RwLock<FlagStore>,
	overrides_enabled: bool,
	/// Broadcast channel for change notifications.
	sender: broadcast::Sender<FlagChange>,
}

impl SharedFlagStore {
	/// Creates an empty shared store with default configuration.
	pub fn new() -> Self {
		Self::from_config(FlagStoreConfig::default())
	}

	/// Creates a shared store seeded from the configured bootstrap flags.
	pub fn from_config(config: FlagStoreConfig) -> Self {
		let (sender, _) = broadcast::channel(config.change_channel_capacity.max(1));
		debug!(
			bootstrap_flags = config.bootstrap.len(),
			overrides_enabled = config.overrides_enabled,
			"Creating shared flag store"
		);
		Self {
			inner: Arc::new(SharedInner {
				store: RwLock::new(FlagStore::with_flags(config.bootstrap)),
				overrides_enabled: config.overrides_enabled,
				sender,
			}),
		}
	}

	/// Subscribe to flag changes.
	///
	/// Returns a broadcast receiver that sees every change made after this
	/// call, in mutation order.
	pub fn subscribe(&self) -> broadcast::Receiver<FlagChange> {
		self.inner.sender.subscribe()
	}

	pub fn overrides_enabled(&self) -> bool {
		self.inner.overrides_enabled
	}

	/// Resolves a single flag, overrides first.
	pub async fn get(&self, key: &str) -> Option<EvaluatedFlag> {
		self.inner.store.read().await.get(key)
	}

	/// Resolves every flag that currently has a value.
	pub async fn get_all_resolved(&self) -> ResolvedFlags {
		self.inner.store.read().await.get_all_resolved()
	}

	/// A copy of the real flags, before overrides are applied.
	pub async fn real_flags(&self) -> FlagMap {
		self.inner.store.read().await.real_flags().clone()
	}

	/// A copy of the current overrides.
	pub async fn overrides(&self) -> OverrideMap {
		self.inner.store.read().await.overrides()
	}

	/// Replaces the real flags and returns the resulting changes.
	pub async fn set_flags(&self, flags: FlagMap) -> Vec<FlagChange> {
		let ((), changes) = self.mutate(|store| store.set_flags(flags)).await;
		changes
	}

	/// Merges a delivery event into the real flags.
	///
	/// Heartbeats and stale updates leave the store untouched.
	pub async fn apply_event(&self, event: &FlagStreamEvent) -> Vec<FlagChange> {
		let (applied, changes) = self
			.mutate(|store| match event.merge_into(store.real_flags()) {
				Some(merged) => {
					store.set_flags(merged);
					true
				}
				None => false,
			})
			.await;

		debug!(
			event_type = %event.event_type(),
			applied,
			changes = changes.len(),
			"Processed flag stream event"
		);
		changes
	}

	/// Decodes a JSON-encoded delivery event and merges it.
	///
	/// Empty data, as sent for keep-alive comments, is ignored.
	pub async fn apply_event_data(&self, data: &str) -> Result<Vec<FlagChange>> {
		if data.trim().is_empty() {
			return Ok(Vec::new());
		}

		let event = FlagStreamEvent::decode(data).map_err(|e| {
			warn!(error = %e, "Failed to parse flag stream event");
			e
		})?;
		Ok(self.apply_event(&event).await)
	}

	/// Installs or overwrites a local override.
	pub async fn set_override(&self, key: impl Into<String>, value: Value) -> Result<()> {
		if !self.inner.overrides_enabled {
			return Err(FlagStoreError::OverridesDisabled);
		}

		let key = key.into();
		self.mutate(|store| store.set_override(key, value)).await;
		Ok(())
	}

	/// Removes a local override, returning it if there was one.
	pub async fn remove_override(&self, key: &str) -> Option<OverrideRecord> {
		let (removed, _) = self.mutate(|store| store.remove_override(key)).await;
		removed
	}

	/// Removes every local override and returns what was cleared.
	pub async fn clear_all_overrides(&self) -> OverrideMap {
		let (cleared, _) = self.mutate(FlagStore::clear_all_overrides).await;
		cleared
	}

	/// Runs a mutation under the write lock and publishes what it changed.
	///
	/// Changes are published before the lock is released so subscribers see
	/// them in mutation order.
	async fn mutate<T>(&self, f: impl FnOnce(&mut FlagStore) -> T) -> (T, Vec<FlagChange>) {
		let mut store = self.inner.store.write().await;
		let before = store.get_all_resolved();
		let output = f(&mut *store);
		let changes = diff_resolved(&before, &store.get_all_resolved());

		for change in &changes {
			// No receivers is not an error
			if self.inner.sender.send(change.clone()).is_err() {
				break;
			}
		}

		(output, changes)
	}
}

impl Default for SharedFlagStore {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for SharedFlagStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SharedFlagStore")
			.field("overrides_enabled", &self.inner.overrides_enabled)
			.field("subscribers", &self.inner.sender.receiver_count())
			.finish()
	}
}
