// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use super::{Dialect, DialectKind, MAPPING_TABLE_COLUMNS, SqlErrorCode};

// PostgreSQL reports five-character SQLSTATE classes rather than numeric
// vendor codes.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
	fn kind(&self) -> DialectKind {
		DialectKind::Postgres
	}

	fn supports_generated_keys(&self) -> bool {
		true
	}

	fn mapping_table_name(&self) -> &'static str {
		"key_mapping"
	}

	fn prepare_mapping_sql(&self) -> Vec<String> {
		vec![
			"DROP TABLE IF EXISTS key_mapping".to_string(),
			format!("CREATE TEMPORARY TABLE key_mapping {MAPPING_TABLE_COLUMNS} ON COMMIT DROP"),
		]
	}

	fn boolean_type(&self) -> &'static str {
		"BOOLEAN"
	}

	fn binary_type(&self) -> &'static str {
		"BYTEA"
	}

	fn identity_column(&self, name: &str) -> String {
		format!("{name} BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY")
	}

	fn map_error_code(&self, _native_code: i32, sql_state: Option<&str>) -> SqlErrorCode {
		match sql_state {
			Some(UNIQUE_VIOLATION) => SqlErrorCode::InsertDuplicate,
			Some(FOREIGN_KEY_VIOLATION) => SqlErrorCode::InsertMissingFk,
			_ => SqlErrorCode::Unknown,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_sqlstate_not_native_code() {
		assert_eq!(PostgresDialect.map_error_code(0, Some("23505")), SqlErrorCode::InsertDuplicate);
		assert_eq!(PostgresDialect.map_error_code(0, Some("23503")), SqlErrorCode::InsertMissingFk);
		assert_eq!(PostgresDialect.map_error_code(23505, None), SqlErrorCode::Unknown);
	}

	#[test]
	fn mapping_table_drops_on_commit() {
		let sql = PostgresDialect.prepare_mapping_sql();
		assert!(sql[1].ends_with("ON COMMIT DROP"));
	}
}
