// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Override-aware flag store for the Loom feature flags SDK.
//!
//! The store keeps two layers: the real flags last delivered by the
//! evaluation backend (or a bootstrap payload), and local debug overrides.
//! Reads always prefer an override. The store never fetches or evaluates
//! flags; it only holds records handed to it.
//!
//! # Features
//!
//! - **Override precedence**: an override wins whenever it exists, whatever its value
//! - **Tombstones**: deleted flags are kept but never resolve
//! - **Wholesale replacement**: the real layer is replaced, never merged
//! - **Shared access**: [`SharedFlagStore`] serializes access and broadcasts changes
//!
//! # Example
//!
//! ```
//! use loom_flagstore::{FlagMap, FlagRecord, FlagStore};
//! use serde_json::json;
//!
//! let mut store = FlagStore::new();
//!
//! let mut flags = FlagMap::new();
//! flags.insert("checkout.new_flow".to_string(), FlagRecord::present(false));
//! flags.insert("retired.flag".to_string(), FlagRecord::deleted(7));
//! store.set_flags(flags);
//!
//! store.set_override("checkout.new_flow", json!(true));
//!
//! assert_eq!(store.get("checkout.new_flow").map(|f| f.value), Some(json!(true)));
//! assert!(store.get("retired.flag").is_none());
//!
//! let cleared = store.clear_all_overrides();
//! assert!(cleared.contains_key("checkout.new_flow"));
//! assert_eq!(store.get("checkout.new_flow").map(|f| f.value), Some(json!(false)));
//! ```

mod changes;
mod config;
mod shared;
mod store;

pub use changes::{diff_resolved, FlagChange};
pub use config::{FlagStoreConfig, FlagStoreConfigLayer, DEFAULT_CHANGE_CHANNEL_CAPACITY};
pub use shared::SharedFlagStore;
pub use store::FlagStore;

// Re-export core types for convenience
pub use loom_flagstore_core::{
	parse_bootstrap, EvaluatedFlag, FlagMap, FlagRecord, FlagStoreError, FlagStreamEvent,
	OverrideMap, OverrideRecord, ResolvedFlags, Result,
};
