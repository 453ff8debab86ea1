// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Persisted schema of the metadata layer.
//!
//! Six tables: `tenant`, `object_id`, `object_definition`, `tag`,
//! `tag_attr`, `config_entry`. Timestamps are fixed-width UTC text columns
//! so range predicates behave identically on every dialect; UUIDs are
//! persisted as two 64-bit halves. The dialect supplies identity, boolean
//! and binary column types.

use rusqlite::Connection;
use tagstore_type::diagnostic::startup;

use crate::{Dialect, Result};

/// DDL for the full schema on the given dialect, in dependency order.
pub fn ddl(dialect: &dyn Dialect) -> Vec<String> {
	let boolean = dialect.boolean_type();
	let binary = dialect.binary_type();

	vec![
		"CREATE TABLE tenant (\
			tenant_id SMALLINT NOT NULL PRIMARY KEY, \
			tenant_code VARCHAR(64) NOT NULL, \
			description VARCHAR(512) NOT NULL, \
			CONSTRAINT tenant_code_uq UNIQUE (tenant_code))"
			.to_string(),
		format!(
			"CREATE TABLE object_id (\
			{identity}, \
			tenant_id SMALLINT NOT NULL, \
			object_type VARCHAR(16) NOT NULL, \
			id_hi BIGINT NOT NULL, \
			id_lo BIGINT NOT NULL, \
			CONSTRAINT object_id_uq UNIQUE (tenant_id, id_hi, id_lo), \
			CONSTRAINT object_id_tenant_fk FOREIGN KEY (tenant_id) REFERENCES tenant (tenant_id))",
			identity = dialect.identity_column("object_pk"),
		),
		format!(
			"CREATE TABLE object_definition (\
			{identity}, \
			tenant_id SMALLINT NOT NULL, \
			object_fk BIGINT NOT NULL, \
			object_version INTEGER NOT NULL, \
			object_timestamp VARCHAR(26) NOT NULL, \
			object_superseded VARCHAR(26), \
			object_is_latest {boolean} NOT NULL, \
			meta_format INTEGER NOT NULL, \
			meta_version INTEGER NOT NULL, \
			definition {binary} NOT NULL, \
			CONSTRAINT object_definition_uq UNIQUE (tenant_id, object_fk, object_version), \
			CONSTRAINT object_definition_object_fk FOREIGN KEY (object_fk) REFERENCES object_id (object_pk))",
			identity = dialect.identity_column("definition_pk"),
		),
		"CREATE INDEX object_definition_latest_idx \
			ON object_definition (tenant_id, object_fk, object_is_latest)"
			.to_string(),
		"CREATE INDEX object_definition_asof_idx \
			ON object_definition (tenant_id, object_fk, object_timestamp, object_superseded)"
			.to_string(),
		format!(
			"CREATE TABLE tag (\
			{identity}, \
			tenant_id SMALLINT NOT NULL, \
			definition_fk BIGINT NOT NULL, \
			tag_version INTEGER NOT NULL, \
			tag_timestamp VARCHAR(26) NOT NULL, \
			tag_superseded VARCHAR(26), \
			tag_is_latest {boolean} NOT NULL, \
			object_type VARCHAR(16) NOT NULL, \
			CONSTRAINT tag_uq UNIQUE (tenant_id, definition_fk, tag_version), \
			CONSTRAINT tag_definition_fk FOREIGN KEY (definition_fk) REFERENCES object_definition (definition_pk))",
			identity = dialect.identity_column("tag_pk"),
		),
		"CREATE INDEX tag_latest_idx ON tag (tenant_id, definition_fk, tag_is_latest)".to_string(),
		"CREATE INDEX tag_asof_idx ON tag (tenant_id, definition_fk, tag_timestamp, tag_superseded)".to_string(),
		format!(
			"CREATE TABLE tag_attr (\
			tenant_id SMALLINT NOT NULL, \
			tag_fk BIGINT NOT NULL, \
			attr_name VARCHAR(256) NOT NULL, \
			attr_type VARCHAR(16) NOT NULL, \
			attr_index INTEGER NOT NULL, \
			attr_value_boolean {boolean}, \
			attr_value_integer BIGINT, \
			attr_value_float DOUBLE PRECISION, \
			attr_value_string VARCHAR(4096), \
			attr_value_decimal VARCHAR(128), \
			attr_value_date VARCHAR(10), \
			attr_value_datetime VARCHAR(26), \
			CONSTRAINT tag_attr_uq UNIQUE (tenant_id, tag_fk, attr_name, attr_index), \
			CONSTRAINT tag_attr_tag_fk FOREIGN KEY (tag_fk) REFERENCES tag (tag_pk))",
		),
		format!(
			"CREATE TABLE config_entry (\
			{identity}, \
			tenant_id SMALLINT NOT NULL, \
			config_class VARCHAR(256) NOT NULL, \
			config_key VARCHAR(256) NOT NULL, \
			config_version INTEGER NOT NULL, \
			config_timestamp VARCHAR(26) NOT NULL, \
			config_superseded VARCHAR(26), \
			config_is_latest {boolean} NOT NULL, \
			config_deleted {boolean} NOT NULL, \
			meta_format INTEGER NOT NULL, \
			meta_version INTEGER NOT NULL, \
			details {binary} NOT NULL, \
			CONSTRAINT config_entry_uq UNIQUE (tenant_id, config_class, config_key, config_version), \
			CONSTRAINT config_entry_tenant_fk FOREIGN KEY (tenant_id) REFERENCES tenant (tenant_id))",
			identity = dialect.identity_column("config_pk"),
		),
		"CREATE INDEX config_entry_latest_idx \
			ON config_entry (tenant_id, config_class, config_is_latest)"
			.to_string(),
	]
}

/// Deploy the schema on an embedded database. Intended for fresh databases;
/// deployment of the server dialects is an administrative task that runs the
/// same DDL through the server's own tooling.
pub fn deploy(conn: &Connection, dialect: &dyn Dialect) -> Result<()> {
	for statement in ddl(dialect) {
		conn.execute(&statement, []).map_err(|err| startup(format!("schema deployment failed: {err}")))?;
	}
	Ok(())
}
