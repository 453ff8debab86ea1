// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Batch writer: inserts object, definition, tag, attribute and config rows
//! and closes prior "latest" rows. Every close-prior-latest update must
//! affect exactly one row; zero rows means the append invariant is violated
//! and the miss is classified before anything else can go wrong.

use rusqlite::{Connection, params};
use tagstore_core::{ConfigEntry, PreallocatedId, Tag};
use tagstore_type::{
	ErrorKind, TagValue,
	diagnostic::{
		duplicate_config, id_not_preallocated, internal, object_not_found, prior_config_missing,
		prior_tag_missing, prior_version_missing, tag_superseded, version_superseded, wrong_object_type,
	},
	temporal,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
	Dialect, Result,
	dialect::{SqlErrorCode, classify_insert_error, internal_sql, synthetic_error},
	mapping::KeyMapping,
	model::{AttrColumns, uuid_halves},
	read::{BatchReader, SCALAR_ATTR_INDEX},
	tenant::TenantId,
};

pub(crate) struct BatchWriter<'a> {
	conn: &'a Connection,
	dialect: &'a dyn Dialect,
	mapping: &'a KeyMapping<'a>,
}

impl<'a> BatchWriter<'a> {
	pub fn new(conn: &'a Connection, dialect: &'a dyn Dialect, mapping: &'a KeyMapping<'a>) -> Self {
		Self {
			conn,
			dialect,
			mapping,
		}
	}

	fn reader(&self) -> BatchReader<'_> {
		BatchReader::new(self.conn, self.mapping)
	}

	/// Reserve object identities ahead of their first definition.
	#[instrument(name = "store::write::prealloc_ids", level = "trace", skip(self, ids), fields(count = ids.len()))]
	pub fn save_preallocated_ids(&self, tenant_id: TenantId, ids: &[PreallocatedId]) -> Result<()> {
		let items: Vec<(tagstore_core::ObjectType, Uuid)> =
			ids.iter().map(|id| (id.object_type, id.object_id)).collect();
		self.write_object_ids(tenant_id, &items, ErrorKind::DuplicateObjectId)?;
		Ok(())
	}

	/// First definition and tag for identities reserved earlier.
	#[instrument(name = "store::write::prealloc_objects", level = "trace", skip(self, tags), fields(count = tags.len()))]
	pub fn save_preallocated_objects(&self, tenant_id: TenantId, tags: &[Tag]) -> Result<()> {
		require_first_versions(tags, "save_preallocated_objects")?;

		let ids: Vec<Uuid> = tags.iter().map(|t| t.header.object_id).collect();
		let records = self.reader().read_object_records_with(tenant_id, &ids, |_, id| {
			id_not_preallocated(format!("object id {id} was never reserved"))
		})?;
		for (record, tag) in records.iter().zip(tags) {
			if record.object_type != tag.header.object_type {
				return Err(wrong_object_type(tag.header.object_type.code(), record.object_type.code()));
			}
		}

		let timestamp = temporal::encode_timestamp(&temporal::now());
		let object_pks: Vec<i64> = records.iter().map(|r| r.pk).collect();
		let definition_pks =
			self.write_definitions(tenant_id, &object_pks, tags, &timestamp, ErrorKind::IdAlreadyInUse)?;
		let tag_pks = self.write_tags(tenant_id, &definition_pks, tags, &timestamp, ErrorKind::IdAlreadyInUse)?;
		self.write_attrs(tenant_id, &tag_pks, tags)
	}

	/// Fresh objects: identity, first definition, first tag, attributes.
	#[instrument(name = "store::write::new_objects", level = "trace", skip(self, tags), fields(count = tags.len()))]
	pub fn save_new_objects(&self, tenant_id: TenantId, tags: &[Tag]) -> Result<()> {
		require_first_versions(tags, "save_new_objects")?;

		let items: Vec<(tagstore_core::ObjectType, Uuid)> =
			tags.iter().map(|t| (t.header.object_type, t.header.object_id)).collect();
		let object_pks = self.write_object_ids(tenant_id, &items, ErrorKind::DuplicateObjectId)?;

		let timestamp = temporal::encode_timestamp(&temporal::now());
		let definition_pks =
			self.write_definitions(tenant_id, &object_pks, tags, &timestamp, ErrorKind::DuplicateObjectId)?;
		let tag_pks =
			self.write_tags(tenant_id, &definition_pks, tags, &timestamp, ErrorKind::DuplicateObjectId)?;
		self.write_attrs(tenant_id, &tag_pks, tags)
	}

	/// Append a new object version: close the prior latest definition, then
	/// insert the new definition, its first tag and the attributes.
	#[instrument(name = "store::write::new_versions", level = "trace", skip(self, tags), fields(count = tags.len()))]
	pub fn save_new_versions(&self, tenant_id: TenantId, tags: &[Tag]) -> Result<()> {
		for tag in tags {
			if tag.header.object_version < 2 {
				return Err(prior_version_missing(format!(
					"object {} version {} has no prior version to supersede",
					tag.header.object_id, tag.header.object_version
				)));
			}
			if tag.header.tag_version != 1 {
				return Err(internal("a new object version must start at tag version 1"));
			}
		}

		let ids: Vec<Uuid> = tags.iter().map(|t| t.header.object_id).collect();
		let records = self.reader().read_object_records(tenant_id, &ids)?;
		for (record, tag) in records.iter().zip(tags) {
			if record.object_type != tag.header.object_type {
				return Err(wrong_object_type(tag.header.object_type.code(), record.object_type.code()));
			}
		}

		let timestamp = temporal::encode_timestamp(&temporal::now());
		let object_pks: Vec<i64> = records.iter().map(|r| r.pk).collect();
		self.close_prior_definitions(tenant_id, &object_pks, tags, &timestamp)?;

		let definition_pks =
			self.write_definitions(tenant_id, &object_pks, tags, &timestamp, ErrorKind::VersionSuperseded)?;
		let tag_pks =
			self.write_tags(tenant_id, &definition_pks, tags, &timestamp, ErrorKind::VersionSuperseded)?;
		self.write_attrs(tenant_id, &tag_pks, tags)
	}

	/// Append a new tag to an existing object version: close the prior
	/// latest tag, then insert the new tag and its attributes.
	#[instrument(name = "store::write::new_tags", level = "trace", skip(self, tags), fields(count = tags.len()))]
	pub fn save_new_tags(&self, tenant_id: TenantId, tags: &[Tag]) -> Result<()> {
		for tag in tags {
			if tag.header.tag_version < 2 {
				return Err(prior_tag_missing(format!(
					"object {} tag version {} has no prior tag to supersede",
					tag.header.object_id, tag.header.tag_version
				)));
			}
		}

		let ids: Vec<Uuid> = tags.iter().map(|t| t.header.object_id).collect();
		let records = self.reader().read_object_records(tenant_id, &ids)?;
		for (record, tag) in records.iter().zip(tags) {
			if record.object_type != tag.header.object_type {
				return Err(wrong_object_type(tag.header.object_type.code(), record.object_type.code()));
			}
		}

		// The tag's object version must already exist.
		let pairs: Vec<(i64, u32)> =
			records.iter().zip(tags).map(|(r, t)| (r.pk, t.header.object_version)).collect();
		let stage = self.mapping.insert_fk_versions(&pairs)?;
		let resolved = self.mapping.resolve_definitions_by_version(stage, tenant_id)?;
		let mut definition_pks = Vec::with_capacity(tags.len());
		for (index, pk) in resolved.into_iter().enumerate() {
			definition_pks.push(pk.ok_or_else(|| {
				object_not_found(format!(
					"object {} has no version {}",
					tags[index].header.object_id, tags[index].header.object_version
				))
			})?);
		}

		let timestamp = temporal::encode_timestamp(&temporal::now());
		self.close_prior_tags(tenant_id, &definition_pks, tags, &timestamp)?;

		let tag_pks =
			self.write_tags(tenant_id, &definition_pks, tags, &timestamp, ErrorKind::TagSuperseded)?;
		self.write_attrs(tenant_id, &tag_pks, tags)
	}

	/// Save config entries: close each prior latest version, then insert
	/// the new rows (delete markers included).
	#[instrument(name = "store::write::config", level = "trace", skip(self, entries), fields(count = entries.len()))]
	pub fn save_config_entries(&self, tenant_id: TenantId, entries: &[ConfigEntry]) -> Result<()> {
		for entry in entries {
			if entry.config_version < 1 {
				return Err(internal("config versions are positive"));
			}
		}

		// 1. Resolve prior-version keys in one batched lookup, deleted
		// entries included: a delete marker is a real prior version.
		let mut prior_pks = Vec::new();
		{
			let mut statement = self
				.conn
				.prepare_cached(
					"SELECT config_pk FROM config_entry \
					WHERE tenant_id = ?1 AND config_class = ?2 AND config_key = ?3 \
					AND config_version = ?4",
				)
				.map_err(|err| internal_sql("config prior lookup", err))?;
			for entry in entries.iter().filter(|e| e.config_version > 1) {
				let prior_version = entry.config_version - 1;
				let pk: Option<i64> = statement
					.query_row(
						params![tenant_id, entry.config_class, entry.config_key, prior_version],
						|row| row.get(0),
					)
					.map(Some)
					.or_else(|err| match err {
						rusqlite::Error::QueryReturnedNoRows => Ok(None),
						other => Err(internal_sql("config prior lookup", other)),
					})?;
				let pk = pk.ok_or_else(|| {
					prior_config_missing(format!(
						"config entry {}/{} version {} does not exist",
						entry.config_class, entry.config_key, prior_version
					))
				})?;
				prior_pks.push((pk, entry));
			}
		}

		// 2. Close prior-latest rows; exactly one row each.
		let timestamp = temporal::encode_timestamp(&temporal::now());
		{
			let mut statement = self
				.conn
				.prepare_cached(
					"UPDATE config_entry SET config_is_latest = ?1, config_superseded = ?2 \
					WHERE config_pk = ?3 AND config_is_latest = ?4",
				)
				.map_err(|err| internal_sql("config close prior", err))?;
			for (pk, entry) in &prior_pks {
				let affected = statement
					.execute(params![false, timestamp, pk, true])
					.map_err(|err| internal_sql("config close prior", err))?;
				if affected != 1 {
					return Err(prior_config_missing(format!(
						"config entry {}/{} version {} is not the latest version",
						entry.config_class,
						entry.config_key,
						entry.config_version - 1
					)));
				}
			}
		}

		// 3. Insert the new rows.
		let mut statement = self
			.conn
			.prepare_cached(
				"INSERT INTO config_entry (tenant_id, config_class, config_key, config_version, \
				config_timestamp, config_superseded, config_is_latest, config_deleted, \
				meta_format, meta_version, details) \
				VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, ?8, ?9, ?10)",
			)
			.map_err(|err| internal_sql("config insert", err))?;
		for entry in entries {
			statement
				.execute(params![
					tenant_id,
					entry.config_class,
					entry.config_key,
					entry.config_version,
					timestamp,
					true,
					entry.is_deleted,
					entry.payload.format,
					entry.payload.version,
					entry.payload.bytes,
				])
				.map_err(|err| {
					classify_insert_error(
						self.dialect,
						"config insert",
						err,
						ErrorKind::DuplicateConfig,
						ErrorKind::Internal,
					)
				})
				.map_err(|err| match err.kind() {
					ErrorKind::DuplicateConfig => duplicate_config(format!(
						"config entry {}/{} version {} already exists",
						entry.config_class, entry.config_key, entry.config_version
					)),
					_ => err,
				})?;
		}
		Ok(())
	}

	/// Insert `object_id` rows and return their primary keys in insert
	/// order, through the driver's key mechanism or scratch re-lookup.
	fn write_object_ids(
		&self,
		tenant_id: TenantId,
		items: &[(tagstore_core::ObjectType, Uuid)],
		on_duplicate: ErrorKind,
	) -> Result<Vec<i64>> {
		let mut statement = self
			.conn
			.prepare_cached(
				"INSERT INTO object_id (tenant_id, object_type, id_hi, id_lo) VALUES (?1, ?2, ?3, ?4)",
			)
			.map_err(|err| internal_sql("object id insert", err))?;

		let mut pks = Vec::with_capacity(items.len());
		for (object_type, id) in items {
			let (hi, lo) = uuid_halves(id);
			statement.execute(params![tenant_id, object_type.code(), hi, lo]).map_err(|err| {
				classify_insert_error(self.dialect, "object id insert", err, on_duplicate, ErrorKind::Internal)
			})?;
			if self.dialect.supports_generated_keys() {
				pks.push(self.conn.last_insert_rowid());
			}
		}

		if self.dialect.supports_generated_keys() {
			return Ok(pks);
		}
		let ids: Vec<Uuid> = items.iter().map(|(_, id)| *id).collect();
		let stage = self.mapping.insert_ids(&ids)?;
		self.require_resolved(self.mapping.resolve_object_ids(stage, tenant_id)?, "object id re-lookup")
	}

	/// Insert one definition row per tag (always `is_latest`, never
	/// superseded) and return definition primary keys in insert order.
	fn write_definitions(
		&self,
		tenant_id: TenantId,
		object_pks: &[i64],
		tags: &[Tag],
		timestamp: &str,
		on_duplicate: ErrorKind,
	) -> Result<Vec<i64>> {
		let mut statement = self
			.conn
			.prepare_cached(
				"INSERT INTO object_definition (tenant_id, object_fk, object_version, \
				object_timestamp, object_superseded, object_is_latest, meta_format, meta_version, \
				definition) \
				VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?8)",
			)
			.map_err(|err| internal_sql("definition insert", err))?;

		let mut pks = Vec::with_capacity(tags.len());
		for (object_pk, tag) in object_pks.iter().zip(tags) {
			statement
				.execute(params![
					tenant_id,
					object_pk,
					tag.header.object_version,
					timestamp,
					true,
					tag.payload.format,
					tag.payload.version,
					tag.payload.bytes,
				])
				.map_err(|err| {
					classify_insert_error(
						self.dialect,
						"definition insert",
						err,
						on_duplicate,
						ErrorKind::Internal,
					)
				})?;
			if self.dialect.supports_generated_keys() {
				pks.push(self.conn.last_insert_rowid());
			}
		}

		if self.dialect.supports_generated_keys() {
			return Ok(pks);
		}
		let pairs: Vec<(i64, u32)> =
			object_pks.iter().zip(tags).map(|(pk, t)| (*pk, t.header.object_version)).collect();
		let stage = self.mapping.insert_fk_versions(&pairs)?;
		self.require_resolved(self.mapping.resolve_definitions_by_version(stage, tenant_id)?, "definition re-lookup")
	}

	/// Insert one tag row per tag and return tag primary keys in insert
	/// order.
	fn write_tags(
		&self,
		tenant_id: TenantId,
		definition_pks: &[i64],
		tags: &[Tag],
		timestamp: &str,
		on_duplicate: ErrorKind,
	) -> Result<Vec<i64>> {
		let mut statement = self
			.conn
			.prepare_cached(
				"INSERT INTO tag (tenant_id, definition_fk, tag_version, tag_timestamp, \
				tag_superseded, tag_is_latest, object_type) \
				VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)",
			)
			.map_err(|err| internal_sql("tag insert", err))?;

		let mut pks = Vec::with_capacity(tags.len());
		for (definition_pk, tag) in definition_pks.iter().zip(tags) {
			statement
				.execute(params![
					tenant_id,
					definition_pk,
					tag.header.tag_version,
					timestamp,
					true,
					tag.header.object_type.code(),
				])
				.map_err(|err| {
					classify_insert_error(self.dialect, "tag insert", err, on_duplicate, ErrorKind::Internal)
				})?;
			if self.dialect.supports_generated_keys() {
				pks.push(self.conn.last_insert_rowid());
			}
		}

		if self.dialect.supports_generated_keys() {
			return Ok(pks);
		}
		let pairs: Vec<(i64, u32)> =
			definition_pks.iter().zip(tags).map(|(pk, t)| (*pk, t.header.tag_version)).collect();
		let stage = self.mapping.insert_fk_versions(&pairs)?;
		self.require_resolved(self.mapping.resolve_tags_by_version(stage, tenant_id)?, "tag re-lookup")
	}

	/// Write all attributes of each tag: scalars as one row with the
	/// scalar index, arrays as one row per element in element order.
	fn write_attrs(&self, tenant_id: TenantId, tag_pks: &[i64], tags: &[Tag]) -> Result<()> {
		let mut statement = self
			.conn
			.prepare_cached(
				"INSERT INTO tag_attr (tenant_id, tag_fk, attr_name, attr_type, attr_index, \
				attr_value_boolean, attr_value_integer, attr_value_float, attr_value_string, \
				attr_value_decimal, attr_value_date, attr_value_datetime) \
				VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
			)
			.map_err(|err| internal_sql("attr insert", err))?;

		for (tag_pk, tag) in tag_pks.iter().zip(tags) {
			for (name, value) in &tag.attrs {
				if matches!(value, TagValue::Array(vs) if vs.is_empty()) {
					return Err(internal(format!("attribute '{name}' is an empty array")));
				}
				let element_type = value.element_type().ok_or_else(|| {
					internal(format!("attribute '{name}' is not a uniform primitive array"))
				})?;
				let elements: Vec<(i32, &tagstore_type::AttrValue)> = match value {
					TagValue::Scalar(v) => vec![(SCALAR_ATTR_INDEX, v)],
					TagValue::Array(vs) => {
						vs.iter().enumerate().map(|(i, v)| (i as i32, v)).collect()
					}
				};
				for (index, element) in elements {
					let columns = AttrColumns::encode(element);
					statement
						.execute(params![
							tenant_id,
							tag_pk,
							name,
							element_type.code(),
							index,
							columns.boolean,
							columns.integer,
							columns.float,
							columns.string,
							columns.decimal,
							columns.date,
							columns.datetime,
						])
						.map_err(|err| internal_sql("attr insert", err))?;
				}
			}
		}
		Ok(())
	}

	/// Close the previous-latest definition for each object. Exactly one
	/// row per object; a miss is diagnosed against the stored version set.
	fn close_prior_definitions(
		&self,
		tenant_id: TenantId,
		object_pks: &[i64],
		tags: &[Tag],
		timestamp: &str,
	) -> Result<()> {
		let mut statement = self
			.conn
			.prepare_cached(
				"UPDATE object_definition SET object_is_latest = ?1, object_superseded = ?2 \
				WHERE tenant_id = ?3 AND object_fk = ?4 AND object_version = ?5 \
				AND object_is_latest = ?6",
			)
			.map_err(|err| internal_sql("definition close prior", err))?;

		for (object_pk, tag) in object_pks.iter().zip(tags) {
			let prior_version = tag.header.object_version - 1;
			let affected = statement
				.execute(params![false, timestamp, tenant_id, object_pk, prior_version, true])
				.map_err(|err| internal_sql("definition close prior", err))?;
			match affected {
				1 => {}
				0 => {
					let max_version: Option<u32> = self
						.conn
						.query_row(
							"SELECT MAX(object_version) FROM object_definition \
							WHERE tenant_id = ?1 AND object_fk = ?2",
							params![tenant_id, object_pk],
							|row| row.get(0),
						)
						.map_err(|err| internal_sql("definition close prior", err))?;
					return Err(match max_version {
						Some(max) if max >= prior_version => version_superseded(format!(
							"object {} version {} is already superseded",
							tag.header.object_id, prior_version
						)),
						_ => prior_version_missing(format!(
							"object {} version {} does not exist",
							tag.header.object_id, prior_version
						)),
					});
				}
				n => {
					return Err(synthetic_error(
						SqlErrorCode::TooManyRows,
						"definition close prior",
						format!("closed {n} rows where exactly one was expected"),
					));
				}
			}
		}
		Ok(())
	}

	/// Close the previous-latest tag for each definition.
	fn close_prior_tags(&self, tenant_id: TenantId, definition_pks: &[i64], tags: &[Tag], timestamp: &str) -> Result<()> {
		let mut statement = self
			.conn
			.prepare_cached(
				"UPDATE tag SET tag_is_latest = ?1, tag_superseded = ?2 \
				WHERE tenant_id = ?3 AND definition_fk = ?4 AND tag_version = ?5 \
				AND tag_is_latest = ?6",
			)
			.map_err(|err| internal_sql("tag close prior", err))?;

		for (definition_pk, tag) in definition_pks.iter().zip(tags) {
			let prior_version = tag.header.tag_version - 1;
			let affected = statement
				.execute(params![false, timestamp, tenant_id, definition_pk, prior_version, true])
				.map_err(|err| internal_sql("tag close prior", err))?;
			match affected {
				1 => {}
				0 => {
					let max_version: Option<u32> = self
						.conn
						.query_row(
							"SELECT MAX(tag_version) FROM tag \
							WHERE tenant_id = ?1 AND definition_fk = ?2",
							params![tenant_id, definition_pk],
							|row| row.get(0),
						)
						.map_err(|err| internal_sql("tag close prior", err))?;
					return Err(match max_version {
						Some(max) if max >= prior_version => tag_superseded(format!(
							"object {} tag version {} is already superseded",
							tag.header.object_id, prior_version
						)),
						_ => prior_tag_missing(format!(
							"object {} tag version {} does not exist",
							tag.header.object_id, prior_version
						)),
					});
				}
				n => {
					return Err(synthetic_error(
						SqlErrorCode::TooManyRows,
						"tag close prior",
						format!("closed {n} rows where exactly one was expected"),
					));
				}
			}
		}
		Ok(())
	}

	/// Every re-looked-up key must resolve; the rows were inserted in this
	/// transaction.
	fn require_resolved(&self, pks: Vec<Option<i64>>, label: &str) -> Result<Vec<i64>> {
		pks.into_iter()
			.map(|pk| {
				pk.ok_or_else(|| {
					synthetic_error(SqlErrorCode::NoData, label, "a just-inserted row did not resolve")
				})
			})
			.collect()
	}
}

/// New-object writes start both version counters at one.
fn require_first_versions(tags: &[Tag], operation: &str) -> Result<()> {
	for tag in tags {
		if tag.header.object_version != 1 || tag.header.tag_version != 1 {
			return Err(internal(format!("{operation} requires object and tag versions of 1")));
		}
	}
	Ok(())
}
