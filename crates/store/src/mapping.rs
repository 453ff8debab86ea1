// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Per-transaction key-mapping scratch relation.
//!
//! The scratch is an ordered parameter vector in table form: a batch of N
//! client-supplied keys is inserted with `ordering = 0..N`, resolved to
//! backing primary keys with one set-based update joining the backing table,
//! and read back in insertion order. Every batched read and the writer's
//! key re-lookup path ride on it, so N-key requests cost O(1) round trips.
//!
//! Multiple uses within one transaction are discriminated by a
//! monotonically increasing `mapping_stage`, scoped to this instance; the
//! relation itself is session-local and prepared by the dialect before
//! first use.

use std::cell::Cell;

use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
	Dialect, Result,
	dialect::internal_sql,
	model::uuid_halves,
};

pub(crate) struct KeyMapping<'a> {
	conn: &'a Connection,
	table: &'static str,
	stage: Cell<i64>,
}

impl<'a> KeyMapping<'a> {
	pub fn new(conn: &'a Connection, dialect: &dyn Dialect) -> Self {
		Self {
			conn,
			table: dialect.mapping_table_name(),
			stage: Cell::new(0),
		}
	}

	fn next_stage(&self) -> i64 {
		let stage = self.stage.get() + 1;
		self.stage.set(stage);
		stage
	}

	/// One row per UUID, as two 64-bit halves.
	pub fn insert_ids(&self, ids: &[Uuid]) -> Result<i64> {
		let stage = self.next_stage();
		let sql = format!("INSERT INTO {} (mapping_stage, ordering, id_hi, id_lo) VALUES (?1, ?2, ?3, ?4)", self.table);
		let mut statement = self.conn.prepare_cached(&sql).map_err(|err| internal_sql("mapping insert ids", err))?;
		for (ordering, id) in ids.iter().enumerate() {
			let (hi, lo) = uuid_halves(id);
			statement
				.execute(params![stage, ordering as i64, hi, lo])
				.map_err(|err| internal_sql("mapping insert ids", err))?;
		}
		Ok(stage)
	}

	/// One row per foreign key.
	pub fn insert_fks(&self, fks: &[i64]) -> Result<i64> {
		self.insert_key_column("fk", fks)
	}

	/// One row per already-resolved primary key.
	pub fn insert_pks(&self, pks: &[i64]) -> Result<i64> {
		self.insert_key_column("pk", pks)
	}

	fn insert_key_column(&self, column: &str, keys: &[i64]) -> Result<i64> {
		let stage = self.next_stage();
		let sql = format!("INSERT INTO {} (mapping_stage, ordering, {column}) VALUES (?1, ?2, ?3)", self.table);
		let mut statement = self.conn.prepare_cached(&sql).map_err(|err| internal_sql("mapping insert keys", err))?;
		for (ordering, key) in keys.iter().enumerate() {
			statement
				.execute(params![stage, ordering as i64, key])
				.map_err(|err| internal_sql("mapping insert keys", err))?;
		}
		Ok(stage)
	}

	/// Paired rows for version lookups.
	pub fn insert_fk_versions(&self, pairs: &[(i64, u32)]) -> Result<i64> {
		let stage = self.next_stage();
		let sql = format!("INSERT INTO {} (mapping_stage, ordering, fk, ver) VALUES (?1, ?2, ?3, ?4)", self.table);
		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal_sql("mapping insert fk+version", err))?;
		for (ordering, (fk, version)) in pairs.iter().enumerate() {
			statement
				.execute(params![stage, ordering as i64, fk, version])
				.map_err(|err| internal_sql("mapping insert fk+version", err))?;
		}
		Ok(stage)
	}

	/// Resolve `object_id` primary keys for the UUIDs of a stage.
	pub fn resolve_object_ids(&self, stage: i64, tenant_id: i16) -> Result<Vec<Option<i64>>> {
		let sql = format!(
			"UPDATE {t} SET pk = (\
			SELECT o.object_pk FROM object_id o \
			WHERE o.tenant_id = ?1 AND o.id_hi = {t}.id_hi AND o.id_lo = {t}.id_lo) \
			WHERE mapping_stage = ?2",
			t = self.table,
		);
		self.conn
			.execute(&sql, params![tenant_id, stage])
			.map_err(|err| internal_sql("mapping resolve object ids", err))?;
		self.read_back(stage)
	}

	/// Resolve definition primary keys for `(object_fk, object_version)`
	/// pairs of a stage.
	pub fn resolve_definitions_by_version(&self, stage: i64, tenant_id: i16) -> Result<Vec<Option<i64>>> {
		let sql = format!(
			"UPDATE {t} SET pk = (\
			SELECT d.definition_pk FROM object_definition d \
			WHERE d.tenant_id = ?1 AND d.object_fk = {t}.fk AND d.object_version = {t}.ver) \
			WHERE mapping_stage = ?2",
			t = self.table,
		);
		self.conn
			.execute(&sql, params![tenant_id, stage])
			.map_err(|err| internal_sql("mapping resolve definitions by version", err))?;
		self.read_back(stage)
	}

	/// Resolve the latest definition per object foreign key of a stage.
	pub fn resolve_definitions_by_latest(&self, stage: i64, tenant_id: i16) -> Result<Vec<Option<i64>>> {
		let sql = format!(
			"UPDATE {t} SET pk = (\
			SELECT d.definition_pk FROM object_definition d \
			WHERE d.tenant_id = ?1 AND d.object_fk = {t}.fk AND d.object_is_latest = ?2) \
			WHERE mapping_stage = ?3",
			t = self.table,
		);
		self.conn
			.execute(&sql, params![tenant_id, true, stage])
			.map_err(|err| internal_sql("mapping resolve definitions by latest", err))?;
		self.read_back(stage)
	}

	/// Resolve the definition in effect at an instant per object foreign
	/// key of a stage.
	pub fn resolve_definitions_as_of(&self, stage: i64, tenant_id: i16, as_of: &str) -> Result<Vec<Option<i64>>> {
		let sql = format!(
			"UPDATE {t} SET pk = (\
			SELECT d.definition_pk FROM object_definition d \
			WHERE d.tenant_id = ?1 AND d.object_fk = {t}.fk \
			AND d.object_timestamp <= ?2 \
			AND (d.object_superseded IS NULL OR d.object_superseded > ?2)) \
			WHERE mapping_stage = ?3",
			t = self.table,
		);
		self.conn
			.execute(&sql, params![tenant_id, as_of, stage])
			.map_err(|err| internal_sql("mapping resolve definitions as-of", err))?;
		self.read_back(stage)
	}

	/// Resolve tag primary keys for `(definition_fk, tag_version)` pairs
	/// of a stage.
	pub fn resolve_tags_by_version(&self, stage: i64, tenant_id: i16) -> Result<Vec<Option<i64>>> {
		let sql = format!(
			"UPDATE {t} SET pk = (\
			SELECT g.tag_pk FROM tag g \
			WHERE g.tenant_id = ?1 AND g.definition_fk = {t}.fk AND g.tag_version = {t}.ver) \
			WHERE mapping_stage = ?2",
			t = self.table,
		);
		self.conn
			.execute(&sql, params![tenant_id, stage])
			.map_err(|err| internal_sql("mapping resolve tags by version", err))?;
		self.read_back(stage)
	}

	/// Resolve the latest tag per definition foreign key of a stage.
	pub fn resolve_tags_by_latest(&self, stage: i64, tenant_id: i16) -> Result<Vec<Option<i64>>> {
		let sql = format!(
			"UPDATE {t} SET pk = (\
			SELECT g.tag_pk FROM tag g \
			WHERE g.tenant_id = ?1 AND g.definition_fk = {t}.fk AND g.tag_is_latest = ?2) \
			WHERE mapping_stage = ?3",
			t = self.table,
		);
		self.conn
			.execute(&sql, params![tenant_id, true, stage])
			.map_err(|err| internal_sql("mapping resolve tags by latest", err))?;
		self.read_back(stage)
	}

	/// Resolve the tag in effect at an instant per definition foreign key
	/// of a stage.
	pub fn resolve_tags_as_of(&self, stage: i64, tenant_id: i16, as_of: &str) -> Result<Vec<Option<i64>>> {
		let sql = format!(
			"UPDATE {t} SET pk = (\
			SELECT g.tag_pk FROM tag g \
			WHERE g.tenant_id = ?1 AND g.definition_fk = {t}.fk \
			AND g.tag_timestamp <= ?2 \
			AND (g.tag_superseded IS NULL OR g.tag_superseded > ?2)) \
			WHERE mapping_stage = ?3",
			t = self.table,
		);
		self.conn
			.execute(&sql, params![tenant_id, as_of, stage])
			.map_err(|err| internal_sql("mapping resolve tags as-of", err))?;
		self.read_back(stage)
	}

	/// Resolved primary keys of a stage, in insertion order. Unresolved
	/// rows come back as `None`; the caller decides whether that is a
	/// missing-ID case or an invariant violation.
	pub fn read_back(&self, stage: i64) -> Result<Vec<Option<i64>>> {
		let sql = format!("SELECT pk FROM {} WHERE mapping_stage = ?1 ORDER BY ordering", self.table);
		let mut statement = self.conn.prepare_cached(&sql).map_err(|err| internal_sql("mapping read back", err))?;
		let rows = statement
			.query_map(params![stage], |row| row.get::<_, Option<i64>>(0))
			.map_err(|err| internal_sql("mapping read back", err))?;
		let mut pks = Vec::new();
		for row in rows {
			pks.push(row.map_err(|err| internal_sql("mapping read back", err))?);
		}
		Ok(pks)
	}

	pub fn table(&self) -> &'static str {
		self.table
	}
}
