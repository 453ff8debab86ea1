// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use super::{Dialect, DialectKind, MAPPING_TABLE_COLUMNS, SqlErrorCode};

// SQLite extended result codes, per the C API reference.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;

/// The embedded dialect. A temp table shadows the main namespace for the
/// scratch relation, and generated keys come back through the driver's
/// last-rowid mechanism.
#[derive(Debug)]
pub struct SqliteDialect {
	generated_keys: bool,
}

impl SqliteDialect {
	pub fn new() -> Self {
		Self {
			generated_keys: true,
		}
	}

	/// Variant that recovers keys by scratch re-lookup instead of the
	/// driver's rowid mechanism. Exists to exercise the re-lookup path the
	/// non-embedded dialects depend on against a real database.
	pub fn without_generated_keys() -> Self {
		Self {
			generated_keys: false,
		}
	}
}

impl Default for SqliteDialect {
	fn default() -> Self {
		Self::new()
	}
}

impl Dialect for SqliteDialect {
	fn kind(&self) -> DialectKind {
		DialectKind::Sqlite
	}

	fn supports_generated_keys(&self) -> bool {
		self.generated_keys
	}

	fn mapping_table_name(&self) -> &'static str {
		"key_mapping"
	}

	fn prepare_mapping_sql(&self) -> Vec<String> {
		vec![
			"DROP TABLE IF EXISTS key_mapping".to_string(),
			format!("CREATE TEMPORARY TABLE key_mapping {MAPPING_TABLE_COLUMNS}"),
		]
	}

	fn boolean_type(&self) -> &'static str {
		"INTEGER"
	}

	fn binary_type(&self) -> &'static str {
		"BLOB"
	}

	fn identity_column(&self, name: &str) -> String {
		format!("{name} INTEGER PRIMARY KEY")
	}

	fn map_error_code(&self, native_code: i32, _sql_state: Option<&str>) -> SqlErrorCode {
		match native_code {
			SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY => SqlErrorCode::InsertDuplicate,
			SQLITE_CONSTRAINT_FOREIGNKEY => SqlErrorCode::InsertMissingFk,
			_ => SqlErrorCode::Unknown,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_constraint_codes() {
		let dialect = SqliteDialect::new();
		assert_eq!(dialect.map_error_code(2067, None), SqlErrorCode::InsertDuplicate);
		assert_eq!(dialect.map_error_code(1555, None), SqlErrorCode::InsertDuplicate);
		assert_eq!(dialect.map_error_code(787, None), SqlErrorCode::InsertMissingFk);
		assert_eq!(dialect.map_error_code(1, None), SqlErrorCode::Unknown);
	}

	#[test]
	fn prepare_drops_then_creates() {
		let sql = SqliteDialect::new().prepare_mapping_sql();
		assert_eq!(sql.len(), 2);
		assert!(sql[0].starts_with("DROP TABLE IF EXISTS"));
		assert!(sql[1].contains("CREATE TEMPORARY TABLE key_mapping"));
	}
}
