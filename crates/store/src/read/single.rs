// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Optimized low-latency path for loading one object, tag or config entry:
//! direct parameterized queries, no scratch relation.

use std::collections::BTreeMap;

use rusqlite::{Connection, params, params_from_iter, types::Value};
use tagstore_core::{ConfigEntry, ConfigKey, Tag, TagHeader, TagSelector, VersionCriterion};
use tagstore_type::{
	Error, ErrorKind, TagValue,
	diagnostic::{config_not_found, internal, object_not_found, wrong_object_type},
	temporal,
};
use tracing::instrument;
use uuid::Uuid;

use super::{AttrRow, assemble_attrs};
use crate::{
	Result,
	model::{DefinitionRecord, ObjectRecord, TagRow, decode_attr_value, decode_object_type, decode_payload, uuid_halves},
	tenant::TenantId,
};

pub(crate) struct SingleReader<'a> {
	conn: &'a Connection,
}

impl<'a> SingleReader<'a> {
	pub fn new(conn: &'a Connection) -> Self {
		Self {
			conn,
		}
	}

	/// Load one tag: object identity, definition and tag rows selected by
	/// the selector's criteria, then the tag's attributes.
	#[instrument(name = "store::read::tag", level = "trace", skip(self, selector))]
	pub fn read_tag(&self, tenant_id: TenantId, selector: &TagSelector) -> Result<Tag> {
		let object = self.read_object_record(tenant_id, &selector.object_id)?;
		if object.object_type != selector.object_type {
			return Err(wrong_object_type(selector.object_type.code(), object.object_type.code()));
		}

		let definition = self.read_definition(tenant_id, object.pk, &selector.object_criterion)?;
		let tag_row = self.read_tag_row(tenant_id, definition.pk, &selector.tag_criterion)?;
		let attrs = self.read_attrs(tenant_id, tag_row.pk)?;

		Ok(Tag {
			header: TagHeader {
				object_type: object.object_type,
				object_id: selector.object_id,
				object_version: definition.object_version,
				object_timestamp: definition.timestamp,
				object_is_latest: definition.is_latest,
				tag_version: tag_row.tag_version,
				tag_timestamp: tag_row.timestamp,
				tag_is_latest: tag_row.is_latest,
			},
			attrs,
			payload: definition.payload,
		})
	}

	pub fn read_object_record(&self, tenant_id: TenantId, object_id: &Uuid) -> Result<ObjectRecord> {
		let (hi, lo) = uuid_halves(object_id);
		let mut statement = self
			.conn
			.prepare_cached(
				"SELECT object_pk, object_type FROM object_id \
				WHERE tenant_id = ?1 AND id_hi = ?2 AND id_lo = ?3",
			)
			.map_err(|err| internal(format!("object lookup failed: {err}")))?;

		let mut rows = Vec::new();
		let mut raw =
			statement.query(params![tenant_id, hi, lo]).map_err(|err| internal(format!("object lookup failed: {err}")))?;
		while let Some(row) = raw.next().map_err(|err| internal(format!("object lookup failed: {err}")))? {
			let pk: i64 = row.get(0).map_err(|err| internal(format!("object lookup failed: {err}")))?;
			let type_code: String = row.get(1).map_err(|err| internal(format!("object lookup failed: {err}")))?;
			rows.push((pk, type_code));
		}

		let (pk, type_code) =
			one(rows, object_not_found(format!("object {object_id} does not exist")), "object lookup")?;
		Ok(ObjectRecord {
			pk,
			object_type: decode_object_type(&type_code)?,
		})
	}

	pub fn read_definition(
		&self,
		tenant_id: TenantId,
		object_pk: i64,
		criterion: &VersionCriterion,
	) -> Result<DefinitionRecord> {
		let base = "SELECT definition_pk, object_version, object_timestamp, object_is_latest, \
			meta_format, meta_version, definition \
			FROM object_definition WHERE tenant_id = ?1 AND object_fk = ?2";
		let (sql, extra) = criterion_predicate(base, "object", criterion);

		let mut bind: Vec<Value> = vec![Value::from(tenant_id as i64), Value::from(object_pk)];
		bind.extend(extra);

		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal(format!("definition lookup failed: {err}")))?;
		let mut rows = Vec::new();
		let mut raw = statement
			.query(params_from_iter(bind))
			.map_err(|err| internal(format!("definition lookup failed: {err}")))?;
		while let Some(row) = raw.next().map_err(|err| internal(format!("definition lookup failed: {err}")))? {
			rows.push(DefinitionRecord::from_row(row, 0)?);
		}

		one(rows, object_not_found("no object definition matches the requested criterion"), "definition lookup")
	}

	pub fn read_tag_row(&self, tenant_id: TenantId, definition_pk: i64, criterion: &VersionCriterion) -> Result<TagRow> {
		let base = "SELECT tag_pk, tag_version, tag_timestamp, tag_is_latest \
			FROM tag WHERE tenant_id = ?1 AND definition_fk = ?2";
		let (sql, extra) = criterion_predicate(base, "tag", criterion);

		let mut bind: Vec<Value> = vec![Value::from(tenant_id as i64), Value::from(definition_pk)];
		bind.extend(extra);

		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal(format!("tag lookup failed: {err}")))?;
		let mut rows = Vec::new();
		let mut raw =
			statement.query(params_from_iter(bind)).map_err(|err| internal(format!("tag lookup failed: {err}")))?;
		while let Some(row) = raw.next().map_err(|err| internal(format!("tag lookup failed: {err}")))? {
			rows.push(TagRow::from_row(row, 0)?);
		}

		one(rows, object_not_found("no tag matches the requested criterion"), "tag lookup")
	}

	pub fn read_attrs(&self, tenant_id: TenantId, tag_pk: i64) -> Result<BTreeMap<String, TagValue>> {
		let mut statement = self
			.conn
			.prepare_cached(
				"SELECT attr_name, attr_type, attr_index, attr_value_boolean, attr_value_integer, \
				attr_value_float, attr_value_string, attr_value_decimal, attr_value_date, \
				attr_value_datetime \
				FROM tag_attr WHERE tenant_id = ?1 AND tag_fk = ?2 \
				ORDER BY attr_name, attr_index",
			)
			.map_err(|err| internal(format!("attr lookup failed: {err}")))?;

		let mut rows = Vec::new();
		let mut raw = statement
			.query(params![tenant_id, tag_pk])
			.map_err(|err| internal(format!("attr lookup failed: {err}")))?;
		while let Some(row) = raw.next().map_err(|err| internal(format!("attr lookup failed: {err}")))? {
			let name: String = row.get(0).map_err(|err| internal(format!("attr lookup failed: {err}")))?;
			let type_code: String = row.get(1).map_err(|err| internal(format!("attr lookup failed: {err}")))?;
			let index: i32 = row.get(2).map_err(|err| internal(format!("attr lookup failed: {err}")))?;
			rows.push(AttrRow {
				name,
				index,
				value: decode_attr_value(row, 3, &type_code)?,
			});
		}
		Ok(assemble_attrs(rows))
	}

	/// Load one config entry. The key must carry at least one criterion;
	/// all supplied criteria must agree on the same row.
	#[instrument(name = "store::read::config", level = "trace", skip(self, key), fields(class = %key.config_class, key = %key.config_key))]
	pub fn read_config_entry(
		&self,
		tenant_id: TenantId,
		key: &ConfigKey,
		include_deleted: bool,
	) -> Result<(i64, ConfigEntry)> {
		if !key.has_criterion() {
			return Err(config_not_found(&key.config_class, &key.config_key));
		}

		let mut sql = String::from(
			"SELECT config_pk, config_version, config_timestamp, config_is_latest, config_deleted, \
			meta_format, meta_version, details \
			FROM config_entry WHERE tenant_id = ? AND config_class = ? AND config_key = ?",
		);
		let mut bind: Vec<Value> = vec![
			Value::from(tenant_id as i64),
			Value::from(key.config_class.clone()),
			Value::from(key.config_key.clone()),
		];

		if let Some(version) = key.version {
			sql.push_str(" AND config_version = ?");
			bind.push(Value::from(version as i64));
		}
		if let Some(as_of) = key.as_of {
			let encoded = temporal::encode_timestamp(&as_of);
			sql.push_str(" AND config_timestamp <= ? AND (config_superseded IS NULL OR config_superseded > ?)");
			bind.push(Value::from(encoded.clone()));
			bind.push(Value::from(encoded));
		}
		if key.latest {
			sql.push_str(" AND config_is_latest = ?");
			bind.push(Value::from(true));
		}
		if !include_deleted {
			sql.push_str(" AND config_deleted = ?");
			bind.push(Value::from(false));
		}

		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal(format!("config lookup failed: {err}")))?;
		let mut rows = Vec::new();
		let mut raw = statement
			.query(params_from_iter(bind))
			.map_err(|err| internal(format!("config lookup failed: {err}")))?;
		while let Some(row) = raw.next().map_err(|err| internal(format!("config lookup failed: {err}")))? {
			rows.push(decode_config_row(row, &key.config_class, &key.config_key)?);
		}

		one(rows, config_not_found(&key.config_class, &key.config_key), "config lookup")
	}
}

/// Append the version-criterion predicate for a definition or tag query.
/// Returns the completed SQL and the extra parameters it binds.
fn criterion_predicate(base: &str, prefix: &str, criterion: &VersionCriterion) -> (String, Vec<Value>) {
	match criterion {
		VersionCriterion::Version(version) => {
			(format!("{base} AND {prefix}_version = ?3"), vec![Value::from(*version as i64)])
		}
		VersionCriterion::Latest => (format!("{base} AND {prefix}_is_latest = ?3"), vec![Value::from(true)]),
		VersionCriterion::AsOf(instant) => {
			let encoded = temporal::encode_timestamp(instant);
			(
				format!(
					"{base} AND {prefix}_timestamp <= ?3 \
					AND ({prefix}_superseded IS NULL OR {prefix}_superseded > ?3)"
				),
				vec![Value::from(encoded)],
			)
		}
	}
}

/// Decode one `config_entry` row from the columns selected above.
pub(crate) fn decode_config_row(row: &rusqlite::Row, class: &str, key: &str) -> Result<(i64, ConfigEntry)> {
	let pk: i64 = row.get(0).map_err(|err| internal(format!("cannot read config_pk: {err}")))?;
	let version: u32 = row.get(1).map_err(|err| internal(format!("cannot read config_version: {err}")))?;
	let timestamp_text: String =
		row.get(2).map_err(|err| internal(format!("cannot read config_timestamp: {err}")))?;
	let is_latest: bool = row.get(3).map_err(|err| internal(format!("cannot read config_is_latest: {err}")))?;
	let is_deleted: bool = row.get(4).map_err(|err| internal(format!("cannot read config_deleted: {err}")))?;
	let format: i32 = row.get(5).map_err(|err| internal(format!("cannot read meta_format: {err}")))?;
	let meta_version: i32 = row.get(6).map_err(|err| internal(format!("cannot read meta_version: {err}")))?;
	let bytes: Vec<u8> = row.get(7).map_err(|err| internal(format!("cannot read details: {err}")))?;

	Ok((
		pk,
		ConfigEntry {
			config_class: class.to_string(),
			config_key: key.to_string(),
			config_version: version,
			config_timestamp: temporal::decode_timestamp(&timestamp_text)?,
			is_latest,
			is_deleted,
			payload: decode_payload(format, meta_version, bytes, ErrorKind::InvalidConfigEntry)?,
		},
	))
}

/// Exactly one row: zero rows is the caller's miss error, more than one is
/// an invariant violation.
fn one<T>(mut rows: Vec<T>, miss: Error, label: &str) -> Result<T> {
	if rows.len() > 1 {
		return Err(internal(format!("{label} matched {} rows where exactly one was expected", rows.len())));
	}
	rows.pop().ok_or(miss)
}
