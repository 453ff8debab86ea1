// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tagstore_type::temporal;

use crate::Payload;

/// A typed key-value configuration entry.
///
/// Entries follow the same append-plus-close temporal discipline as object
/// definitions, and are the only rows in the store that can be soft-deleted:
/// a delete writes a new version with `is_deleted` set and (usually) an
/// empty payload. A later version can resurrect the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
	pub config_class: String,
	pub config_key: String,
	pub config_version: u32,
	pub config_timestamp: DateTime<Utc>,
	pub is_latest: bool,
	pub is_deleted: bool,
	pub payload: Payload,
}

impl ConfigEntry {
	pub fn new(class: impl Into<String>, key: impl Into<String>, version: u32, payload: Payload) -> Self {
		Self {
			config_class: class.into(),
			config_key: key.into(),
			config_version: version,
			config_timestamp: temporal::now(),
			is_latest: true,
			is_deleted: false,
			payload,
		}
	}

	/// A soft-delete marker for the given version of a key.
	pub fn delete_marker(class: impl Into<String>, key: impl Into<String>, version: u32) -> Self {
		Self {
			is_deleted: true,
			..Self::new(class, key, version, Payload::empty())
		}
	}
}

/// Selects one config entry: class and key plus one or more version
/// criteria, all of which must agree on the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigKey {
	pub config_class: String,
	pub config_key: String,
	pub version: Option<u32>,
	pub as_of: Option<DateTime<Utc>>,
	pub latest: bool,
}

impl ConfigKey {
	/// The latest version of a key.
	pub fn latest(class: impl Into<String>, key: impl Into<String>) -> Self {
		Self {
			config_class: class.into(),
			config_key: key.into(),
			version: None,
			as_of: None,
			latest: true,
		}
	}

	/// An explicit version of a key.
	pub fn version(class: impl Into<String>, key: impl Into<String>, version: u32) -> Self {
		Self {
			config_class: class.into(),
			config_key: key.into(),
			version: Some(version),
			as_of: None,
			latest: false,
		}
	}

	/// The version in effect at the given instant.
	pub fn as_of(class: impl Into<String>, key: impl Into<String>, instant: DateTime<Utc>) -> Self {
		Self {
			config_class: class.into(),
			config_key: key.into(),
			version: None,
			as_of: Some(instant),
			latest: false,
		}
	}

	/// Add a further criterion to an existing key. All supplied criteria
	/// must select the same row or the lookup fails.
	pub fn and_version(mut self, version: u32) -> Self {
		self.version = Some(version);
		self
	}

	pub fn and_as_of(mut self, instant: DateTime<Utc>) -> Self {
		self.as_of = Some(instant);
		self
	}

	/// Whether at least one criterion was supplied. A key without any is
	/// rejected rather than silently matching an arbitrary row.
	pub fn has_criterion(&self) -> bool {
		self.latest || self.version.is_some() || self.as_of.is_some()
	}
}
