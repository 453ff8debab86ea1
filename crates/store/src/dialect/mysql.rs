// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use super::{Dialect, DialectKind, MAPPING_TABLE_COLUMNS, SqlErrorCode};

// MySQL server error numbers.
const ER_DUP_ENTRY: i32 = 1062;
const ER_NO_REFERENCED_ROW: i32 = 1216;
const ER_NO_REFERENCED_ROW_2: i32 = 1452;

fn map_mysql_code(native_code: i32) -> SqlErrorCode {
	match native_code {
		ER_DUP_ENTRY => SqlErrorCode::InsertDuplicate,
		ER_NO_REFERENCED_ROW | ER_NO_REFERENCED_ROW_2 => SqlErrorCode::InsertMissingFk,
		_ => SqlErrorCode::Unknown,
	}
}

fn mysql_mapping_ddl() -> Vec<String> {
	vec![
		"DROP TEMPORARY TABLE IF EXISTS key_mapping".to_string(),
		format!("CREATE TEMPORARY TABLE key_mapping {MAPPING_TABLE_COLUMNS}"),
	]
}

#[derive(Debug)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
	fn kind(&self) -> DialectKind {
		DialectKind::Mysql
	}

	fn supports_generated_keys(&self) -> bool {
		true
	}

	fn mapping_table_name(&self) -> &'static str {
		"key_mapping"
	}

	fn prepare_mapping_sql(&self) -> Vec<String> {
		mysql_mapping_ddl()
	}

	fn boolean_type(&self) -> &'static str {
		"BOOLEAN"
	}

	fn binary_type(&self) -> &'static str {
		"LONGBLOB"
	}

	fn identity_column(&self, name: &str) -> String {
		format!("{name} BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY")
	}

	fn map_error_code(&self, native_code: i32, _sql_state: Option<&str>) -> SqlErrorCode {
		map_mysql_code(native_code)
	}
}

/// MariaDB shares MySQL's wire protocol and error numbers but is tracked as
/// its own dialect because temp-table and identity semantics have diverged
/// between the two servers in the past.
#[derive(Debug)]
pub struct MariadbDialect;

impl Dialect for MariadbDialect {
	fn kind(&self) -> DialectKind {
		DialectKind::Mariadb
	}

	fn supports_generated_keys(&self) -> bool {
		true
	}

	fn mapping_table_name(&self) -> &'static str {
		"key_mapping"
	}

	fn prepare_mapping_sql(&self) -> Vec<String> {
		mysql_mapping_ddl()
	}

	fn boolean_type(&self) -> &'static str {
		"BOOLEAN"
	}

	fn binary_type(&self) -> &'static str {
		"LONGBLOB"
	}

	fn identity_column(&self, name: &str) -> String {
		format!("{name} BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY")
	}

	fn map_error_code(&self, native_code: i32, _sql_state: Option<&str>) -> SqlErrorCode {
		map_mysql_code(native_code)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn duplicate_and_fk_codes() {
		assert_eq!(MysqlDialect.map_error_code(1062, None), SqlErrorCode::InsertDuplicate);
		assert_eq!(MysqlDialect.map_error_code(1452, None), SqlErrorCode::InsertMissingFk);
		assert_eq!(MariadbDialect.map_error_code(1062, None), SqlErrorCode::InsertDuplicate);
		assert_eq!(MysqlDialect.map_error_code(1064, None), SqlErrorCode::Unknown);
	}
}
