// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Per-database variation, isolated behind a narrow capability set.
//!
//! A dialect knows how to create the per-transaction key-mapping relation,
//! which SQL types stand in for booleans and binary payloads, whether the
//! driver hands back generated keys, and how to translate driver-native
//! error codes into the closed [`SqlErrorCode`] set. Everything above this
//! module is dialect-agnostic.

use std::{fmt, sync::Arc};

use serde::Deserialize;
use tagstore_type::{Error, ErrorKind};

pub use mysql::{MariadbDialect, MysqlDialect};
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

/// The supported database dialects.
///
/// SQLITE is the embedded dialect and the one the bundled driver executes;
/// the others are complete at the SQL, DDL and error-mapping level and run
/// against their native drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DialectKind {
	Sqlite,
	Mysql,
	Mariadb,
	Postgres,
	SqlServer,
	Oracle,
}

impl fmt::Display for DialectKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			DialectKind::Sqlite => "SQLITE",
			DialectKind::Mysql => "MYSQL",
			DialectKind::Mariadb => "MARIADB",
			DialectKind::Postgres => "POSTGRESQL",
			DialectKind::SqlServer => "SQLSERVER",
			DialectKind::Oracle => "ORACLE",
		};
		f.write_str(name)
	}
}

/// The closed set of SQL error conditions the storage layer reacts to.
///
/// Driver-reported codes map into the first three members; the remaining
/// members are synthetic, raised by internal count and decode assertions,
/// and flow through the same classification path as driver codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlErrorCode {
	Unknown,
	InsertDuplicate,
	InsertMissingFk,
	NoData,
	TooManyRows,
	WrongObjectType,
	InvalidObjectDefinition,
	InvalidConfigEntry,
}

impl SqlErrorCode {
	/// Synthetic codes never come from the driver.
	pub fn is_synthetic(&self) -> bool {
		matches!(
			self,
			SqlErrorCode::NoData
				| SqlErrorCode::TooManyRows
				| SqlErrorCode::WrongObjectType
				| SqlErrorCode::InvalidObjectDefinition
				| SqlErrorCode::InvalidConfigEntry
		)
	}
}

/// Column list of the key-mapping scratch relation, shared by every dialect.
pub(crate) const MAPPING_TABLE_COLUMNS: &str = "(\
	mapping_stage INTEGER NOT NULL, \
	ordering INTEGER NOT NULL, \
	id_hi BIGINT, \
	id_lo BIGINT, \
	fk BIGINT, \
	ver INTEGER, \
	pk BIGINT)";

/// Narrow capability set a backing database must provide.
pub trait Dialect: Send + Sync + fmt::Debug {
	fn kind(&self) -> DialectKind;

	/// Whether the driver returns generated keys on insert. When `false`
	/// the batch writer recovers inserted primary keys by re-lookup
	/// through the scratch relation on the just-inserted natural keys.
	fn supports_generated_keys(&self) -> bool;

	/// Exact identifier of the key-mapping relation in SQL text. Dialects
	/// with session-local temp-table prefixes bake the prefix in here.
	fn mapping_table_name(&self) -> &'static str;

	/// Statements run before the scratch relation's first use in a
	/// transaction: drop any prior relation and create a fresh one.
	/// Empty on a dialect whose mapping relation is globally deployed.
	fn prepare_mapping_sql(&self) -> Vec<String>;

	/// SQL type used for boolean columns.
	fn boolean_type(&self) -> &'static str;

	/// SQL type used for opaque payload columns.
	fn binary_type(&self) -> &'static str;

	/// Column definition for a generated 64-bit identity primary key.
	fn identity_column(&self, name: &str) -> String;

	/// Translate a driver-native error code (and SQLSTATE where the
	/// driver reports one) into the closed error-code set.
	fn map_error_code(&self, native_code: i32, sql_state: Option<&str>) -> SqlErrorCode;

	/// Translate an embedded-driver error. Only the embedded dialect sees
	/// real traffic here; the default extracts the extended result code.
	fn map_error(&self, err: &rusqlite::Error) -> SqlErrorCode {
		match err {
			rusqlite::Error::SqliteFailure(failure, _) => self.map_error_code(failure.extended_code, None),
			_ => SqlErrorCode::Unknown,
		}
	}
}

/// The dialect implementation for a dialect code.
pub fn dialect_for(kind: DialectKind) -> Arc<dyn Dialect> {
	match kind {
		DialectKind::Sqlite => Arc::new(SqliteDialect::new()),
		DialectKind::Mysql => Arc::new(MysqlDialect),
		DialectKind::Mariadb => Arc::new(MariadbDialect),
		DialectKind::Postgres => Arc::new(PostgresDialect),
		DialectKind::SqlServer => Arc::new(SqlServerDialect),
		DialectKind::Oracle => Arc::new(OracleDialect),
	}
}

/// Wrap an unexpected driver error with enough context to be actionable:
/// the query label and the native message travel with the error.
pub(crate) fn internal_sql(label: &str, err: rusqlite::Error) -> Error {
	Error::with_source(ErrorKind::Internal, format!("unexpected database error in {label}"), err)
}

/// Raise a synthetic error code from an internal count or decode
/// assertion. Synthetic codes classify through the same closed set as
/// driver codes but always surface as internal errors: they mark invariant
/// violations, not caller mistakes.
pub(crate) fn synthetic_error(code: SqlErrorCode, label: &str, detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::Internal, format!("{label}: {} ({code:?})", detail.into()))
}

/// Classify a driver error raised by an insert, mapping constraint
/// violations to the domain kinds the current operation prescribes and
/// anything else to an internal error.
pub(crate) fn classify_insert_error(
	dialect: &dyn Dialect,
	label: &str,
	err: rusqlite::Error,
	on_duplicate: ErrorKind,
	on_missing_fk: ErrorKind,
) -> Error {
	match dialect.map_error(&err) {
		SqlErrorCode::InsertDuplicate => {
			Error::new(on_duplicate, format!("duplicate key while executing {label}"))
		}
		SqlErrorCode::InsertMissingFk => {
			Error::new(on_missing_fk, format!("missing referenced row while executing {label}"))
		}
		_ => internal_sql(label, err),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_kind_has_an_implementation() {
		for kind in [
			DialectKind::Sqlite,
			DialectKind::Mysql,
			DialectKind::Mariadb,
			DialectKind::Postgres,
			DialectKind::SqlServer,
			DialectKind::Oracle,
		] {
			assert_eq!(dialect_for(kind).kind(), kind);
		}
	}

	#[test]
	fn synthetic_codes_are_flagged() {
		assert!(SqlErrorCode::NoData.is_synthetic());
		assert!(SqlErrorCode::TooManyRows.is_synthetic());
		assert!(!SqlErrorCode::InsertDuplicate.is_synthetic());
		assert!(!SqlErrorCode::Unknown.is_synthetic());
	}

	#[test]
	fn only_the_relookup_dialects_withhold_generated_keys() {
		assert!(dialect_for(DialectKind::Sqlite).supports_generated_keys());
		assert!(dialect_for(DialectKind::Mysql).supports_generated_keys());
		assert!(dialect_for(DialectKind::Mariadb).supports_generated_keys());
		assert!(dialect_for(DialectKind::Postgres).supports_generated_keys());
		assert!(!dialect_for(DialectKind::SqlServer).supports_generated_keys());
		assert!(!dialect_for(DialectKind::Oracle).supports_generated_keys());
	}
}
