// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use super::{Dialect, DialectKind, MAPPING_TABLE_COLUMNS, SqlErrorCode};

// SQL Server engine error numbers.
const UNIQUE_CONSTRAINT: i32 = 2627;
const UNIQUE_INDEX: i32 = 2601;
const CONSTRAINT_CONFLICT: i32 = 547;

/// SQL Server: the scratch relation is a session-local `#` temp table, and
/// batch inserts do not reliably report generated keys, so inserted primary
/// keys are recovered by re-lookup through the scratch.
#[derive(Debug)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
	fn kind(&self) -> DialectKind {
		DialectKind::SqlServer
	}

	fn supports_generated_keys(&self) -> bool {
		false
	}

	fn mapping_table_name(&self) -> &'static str {
		"#key_mapping"
	}

	fn prepare_mapping_sql(&self) -> Vec<String> {
		vec![
			"DROP TABLE IF EXISTS #key_mapping".to_string(),
			format!("CREATE TABLE #key_mapping {MAPPING_TABLE_COLUMNS}"),
		]
	}

	fn boolean_type(&self) -> &'static str {
		"BIT"
	}

	fn binary_type(&self) -> &'static str {
		"VARBINARY(MAX)"
	}

	fn identity_column(&self, name: &str) -> String {
		format!("{name} BIGINT IDENTITY PRIMARY KEY")
	}

	fn map_error_code(&self, native_code: i32, _sql_state: Option<&str>) -> SqlErrorCode {
		match native_code {
			UNIQUE_CONSTRAINT | UNIQUE_INDEX => SqlErrorCode::InsertDuplicate,
			CONSTRAINT_CONFLICT => SqlErrorCode::InsertMissingFk,
			_ => SqlErrorCode::Unknown,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn both_unique_codes_map_to_duplicate() {
		assert_eq!(SqlServerDialect.map_error_code(2627, None), SqlErrorCode::InsertDuplicate);
		assert_eq!(SqlServerDialect.map_error_code(2601, None), SqlErrorCode::InsertDuplicate);
		assert_eq!(SqlServerDialect.map_error_code(547, None), SqlErrorCode::InsertMissingFk);
	}

	#[test]
	fn temp_table_uses_local_prefix() {
		assert_eq!(SqlServerDialect.mapping_table_name(), "#key_mapping");
	}
}
