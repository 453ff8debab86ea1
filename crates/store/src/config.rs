// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::path::PathBuf;

use serde::Deserialize;

use crate::DialectKind;

/// Where the backing database lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum StoreLocation {
	/// A process-private in-memory database. Single-connection: the pool
	/// size is forced to one because a second connection would see a
	/// different database.
	Memory,
	/// A database file on disk.
	File(PathBuf),
}

/// Configuration of a [`crate::MetadataStore`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
	pub dialect: DialectKind,
	pub location: StoreLocation,
	/// Number of pooled connections; each public operation checks one out
	/// for the duration of its transaction.
	pub pool_size: usize,
	/// Applied as the driver busy timeout, bounding how long a writer
	/// waits on a contended database before failing.
	pub busy_timeout_ms: u64,
	/// Cap on the number of tags a search returns.
	pub search_result_limit: usize,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			dialect: DialectKind::Sqlite,
			location: StoreLocation::Memory,
			pool_size: 4,
			busy_timeout_ms: 10_000,
			search_result_limit: 100,
		}
	}
}

impl StoreConfig {
	pub fn in_memory() -> Self {
		Self::default()
	}

	pub fn file(path: impl Into<PathBuf>) -> Self {
		Self {
			location: StoreLocation::File(path.into()),
			..Self::default()
		}
	}

	pub(crate) fn effective_pool_size(&self) -> usize {
		match self.location {
			StoreLocation::Memory => 1,
			StoreLocation::File(_) => self.pool_size.max(1),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = StoreConfig::default();
		assert_eq!(config.dialect, DialectKind::Sqlite);
		assert_eq!(config.search_result_limit, 100);
		assert_eq!(config.effective_pool_size(), 1);
	}

	#[test]
	fn file_store_keeps_pool_size() {
		let config = StoreConfig::file("/tmp/meta.db");
		assert_eq!(config.effective_pool_size(), 4);
	}

	#[test]
	fn deserializes_from_json() {
		let config: StoreConfig = serde_json::from_str(
			r#"{"dialect":"Sqlite","location":{"File":"/var/lib/meta.db"},"pool_size":8}"#,
		)
		.unwrap();
		assert_eq!(config.pool_size, 8);
		assert_eq!(config.location, StoreLocation::File("/var/lib/meta.db".into()));
		assert_eq!(config.search_result_limit, 100);
	}
}
