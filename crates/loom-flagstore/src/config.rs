// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flag store configuration.
//!
//! Configuration arrives as a layer of optional fields (from TOML or built in
//! code), layers merge with later values winning, and a resolved
//! [`FlagStoreConfig`] is produced with defaults filled in.
//!
//! ```toml
//! overrides_enabled = true
//! change_channel_capacity = 512
//!
//! [bootstrap]
//! "checkout.new_flow" = true
//! "ui.theme" = "dark"
//! ```

use loom_flagstore_core::{parse_bootstrap, FlagMap, FlagStoreError, Result};
use serde::{Deserialize, Serialize};

/// Default capacity of the change notification channel.
pub const DEFAULT_CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Flag store configuration layer (for merging).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagStoreConfigLayer {
	pub overrides_enabled: Option<bool>,
	pub change_channel_capacity: Option<usize>,
	/// Bootstrap payload used to seed the real flags.
	pub bootstrap: Option<serde_json::Value>,
}

impl FlagStoreConfigLayer {
	/// Parses a layer from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		toml::from_str(text).map_err(|e| FlagStoreError::InvalidConfig(e.to_string()))
	}

	/// Merges another layer on top of this one.
	pub fn merge(&mut self, other: FlagStoreConfigLayer) {
		if other.overrides_enabled.is_some() {
			self.overrides_enabled = other.overrides_enabled;
		}
		if other.change_channel_capacity.is_some() {
			self.change_channel_capacity = other.change_channel_capacity;
		}
		if other.bootstrap.is_some() {
			self.bootstrap = other.bootstrap;
		}
	}

	/// Resolves this layer into a runtime configuration.
	pub fn resolve(self) -> Result<FlagStoreConfig> {
		let change_channel_capacity = self
			.change_channel_capacity
			.unwrap_or(DEFAULT_CHANGE_CHANNEL_CAPACITY);
		if change_channel_capacity == 0 {
			return Err(FlagStoreError::InvalidConfig(
				"change_channel_capacity must be greater than zero".to_string(),
			));
		}

		let bootstrap = match self.bootstrap {
			Some(payload) => parse_bootstrap(&payload)?,
			None => FlagMap::new(),
		};

		Ok(FlagStoreConfig {
			overrides_enabled: self.overrides_enabled.unwrap_or(true),
			change_channel_capacity,
			bootstrap,
		})
	}
}

/// Flag store configuration (runtime, resolved).
#[derive(Debug, Clone)]
pub struct FlagStoreConfig {
	/// Whether local overrides may be set through the shared store.
	pub overrides_enabled: bool,
	/// Capacity of the change notification channel.
	pub change_channel_capacity: usize,
	/// Flags the store starts with.
	pub bootstrap: FlagMap,
}

impl Default for FlagStoreConfig {
	fn default() -> Self {
		Self {
			overrides_enabled: true,
			change_channel_capacity: DEFAULT_CHANGE_CHANNEL_CAPACITY,
			bootstrap: FlagMap::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_flagstore_core::FlagRecord;

	#[test]
	fn resolve_uses_defaults() {
		let config = FlagStoreConfigLayer::default().resolve().unwrap();
		assert!(config.overrides_enabled);
		assert_eq!(config.change_channel_capacity, DEFAULT_CHANGE_CHANNEL_CAPACITY);
		assert!(config.bootstrap.is_empty());
	}

	#[test]
	fn parse_toml_with_bootstrap() {
		let layer = FlagStoreConfigLayer::from_toml_str(
			r#"
overrides_enabled = false
change_channel_capacity = 16

[bootstrap]
"checkout.new_flow" = true
"ui.theme" = "dark"
"#,
		)
		.unwrap();

		let config = layer.resolve().unwrap();
		assert!(!config.overrides_enabled);
		assert_eq!(config.change_channel_capacity, 16);
		assert_eq!(config.bootstrap.len(), 2);
		assert_eq!(config.bootstrap["checkout.new_flow"], FlagRecord::present(true));
		assert_eq!(config.bootstrap["ui.theme"], FlagRecord::present("dark"));
	}

	#[test]
	fn parse_invalid_toml() {
		let err = FlagStoreConfigLayer::from_toml_str("overrides_enabled = [").unwrap_err();
		assert!(matches!(err, FlagStoreError::InvalidConfig(_)));
	}

	#[test]
	fn resolve_rejects_zero_capacity() {
		let layer = FlagStoreConfigLayer {
			change_channel_capacity: Some(0),
			..Default::default()
		};
		assert!(matches!(
			layer.resolve(),
			Err(FlagStoreError::InvalidConfig(_))
		));
	}

	#[test]
	fn resolve_rejects_non_object_bootstrap() {
		let layer = FlagStoreConfigLayer {
			bootstrap: Some(serde_json::json!("nope")),
			..Default::default()
		};
		assert!(matches!(
			layer.resolve(),
			Err(FlagStoreError::InvalidBootstrap(_))
		));
	}

	#[test]
	fn merge_preserves_base_when_overlay_is_none() {
		let mut base = FlagStoreConfigLayer {
			overrides_enabled: Some(false),
			change_channel_capacity: Some(8),
			bootstrap: None,
		};
		base.merge(FlagStoreConfigLayer {
			change_channel_capacity: Some(32),
			..Default::default()
		});

		assert_eq!(base.overrides_enabled, Some(false));
		assert_eq!(base.change_channel_capacity, Some(32));
		assert!(base.bootstrap.is_none());
	}
}
