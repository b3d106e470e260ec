// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the flag store boundary layers.
//!
//! Reads and writes against the store itself never fail. These errors only
//! surface where outside data enters: bootstrap payloads, configuration text,
//! stream event decoding, and override mutations on a store that disallows them.

use thiserror::Error;

/// Flag store errors.
#[derive(Debug, Error)]
pub enum FlagStoreError {
	/// Bootstrap payload could not be turned into a flag map.
	#[error("invalid bootstrap payload: {0}")]
	InvalidBootstrap(String),

	/// Configuration text could not be parsed.
	#[error("invalid flag store configuration: {0}")]
	InvalidConfig(String),

	/// Override mutation attempted while overrides are disabled.
	#[error("flag overrides are disabled for this store")]
	OverridesDisabled,

	/// Serialization error.
	#[error("serialization error: {0}")]
	Serialization(String),
}

impl From<serde_json::Error> for FlagStoreError {
	fn from(err: serde_json::Error) -> Self {
		FlagStoreError::Serialization(err.to_string())
	}
}

/// Result type alias for flag store operations.
pub type Result<T> = std::result::Result<T, FlagStoreError>;
