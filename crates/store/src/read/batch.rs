// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Batch reader: every entry point accepts arrays and returns arrays of the
//! same length, positionally aligned with the input. Key resolution rides on
//! the key-mapping scratch, so round trips stay constant regardless of batch
//! size.

use std::collections::BTreeMap;

use rusqlite::{Connection, params};
use tagstore_core::{ConfigEntry, Tag, TagHeader, TagSelector, VersionCriterion};
use tagstore_type::{
	Error, TagValue,
	diagnostic::{object_not_found, wrong_object_type},
	temporal,
};
use tracing::instrument;
use uuid::Uuid;

use super::{AttrRow, assemble_attrs, single::decode_config_row};
use crate::{
	Result,
	dialect::{SqlErrorCode, internal_sql, synthetic_error},
	mapping::KeyMapping,
	model::{DefinitionRecord, ObjectRecord, TagRow, decode_attr_value, decode_object_type, uuid_from_halves},
	tenant::TenantId,
};

/// Which versioned table a criterion batch resolves against.
#[derive(Clone, Copy)]
enum Versioned {
	Definition,
	Tag,
}

pub(crate) struct BatchReader<'a> {
	conn: &'a Connection,
	mapping: &'a KeyMapping<'a>,
}

impl<'a> BatchReader<'a> {
	pub fn new(conn: &'a Connection, mapping: &'a KeyMapping<'a>) -> Self {
		Self {
			conn,
			mapping,
		}
	}

	/// Load a batch of tags, one per selector, in selector order.
	#[instrument(name = "store::read::tags", level = "trace", skip(self, selectors), fields(count = selectors.len()))]
	pub fn read_tags_for_selectors(&self, tenant_id: TenantId, selectors: &[TagSelector]) -> Result<Vec<Tag>> {
		if selectors.is_empty() {
			return Ok(Vec::new());
		}

		// 1. Object identities; callers must state the recorded type.
		let ids: Vec<Uuid> = selectors.iter().map(|s| s.object_id).collect();
		let objects = self.read_object_records(tenant_id, &ids)?;
		for (object, selector) in objects.iter().zip(selectors) {
			if object.object_type != selector.object_type {
				return Err(wrong_object_type(selector.object_type.code(), object.object_type.code()));
			}
		}

		// 2. Definitions per object criterion.
		let object_pks: Vec<i64> = objects.iter().map(|o| o.pk).collect();
		let object_criteria: Vec<VersionCriterion> = selectors.iter().map(|s| s.object_criterion).collect();
		let definitions = self.read_definitions(tenant_id, &object_pks, &object_criteria)?;

		// 3. Tags per tag criterion.
		let definition_pks: Vec<i64> = definitions.iter().map(|d| d.pk).collect();
		let tag_criteria: Vec<VersionCriterion> = selectors.iter().map(|s| s.tag_criterion).collect();
		let tag_rows = self.read_tag_rows(tenant_id, &definition_pks, &tag_criteria)?;

		// 4. Attributes for all tags in one pass.
		let tag_pks: Vec<i64> = tag_rows.iter().map(|t| t.pk).collect();
		let attrs = self.read_attrs(tenant_id, &tag_pks)?;

		let mut tags = Vec::with_capacity(selectors.len());
		for (index, ((definition, tag_row), attr_map)) in
			definitions.into_iter().zip(tag_rows).zip(attrs).enumerate()
		{
			tags.push(Tag {
				header: TagHeader {
					object_type: objects[index].object_type,
					object_id: ids[index],
					object_version: definition.object_version,
					object_timestamp: definition.timestamp,
					object_is_latest: definition.is_latest,
					tag_version: tag_row.tag_version,
					tag_timestamp: tag_row.timestamp,
					tag_is_latest: tag_row.is_latest,
				},
				attrs: attr_map,
				payload: definition.payload,
			});
		}
		Ok(tags)
	}

	/// Resolve object UUIDs to `(pk, object_type)`, in input order. A UUID
	/// with no row is a real missing-ID case and maps to the domain error.
	pub fn read_object_records(&self, tenant_id: TenantId, ids: &[Uuid]) -> Result<Vec<ObjectRecord>> {
		self.read_object_records_with(tenant_id, ids, |_, id| {
			object_not_found(format!("object {id} does not exist"))
		})
	}

	/// As [`read_object_records`](Self::read_object_records), with the
	/// missing-ID error chosen by the caller: a miss means different
	/// things to different write operations.
	pub fn read_object_records_with(
		&self,
		tenant_id: TenantId,
		ids: &[Uuid],
		miss: impl Fn(usize, &Uuid) -> Error,
	) -> Result<Vec<ObjectRecord>> {
		let stage = self.mapping.insert_ids(ids)?;
		let pks = self.mapping.resolve_object_ids(stage, tenant_id)?;
		expect_exact("object id resolution", ids.len(), pks.len())?;
		for (index, pk) in pks.iter().enumerate() {
			if pk.is_none() {
				return Err(miss(index, &ids[index]));
			}
		}

		// The stage rows now hold resolved pks; fetch types off the same
		// stage in insertion order.
		let sql = format!(
			"SELECT o.object_pk, o.object_type FROM {t} km \
			JOIN object_id o ON o.object_pk = km.pk \
			WHERE km.mapping_stage = ?1 AND o.tenant_id = ?2 \
			ORDER BY km.ordering",
			t = self.mapping.table(),
		);
		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal_sql("batch object fetch", err))?;
		let mut records = Vec::new();
		let mut raw = statement
			.query(params![stage, tenant_id])
			.map_err(|err| internal_sql("batch object fetch", err))?;
		while let Some(row) = raw.next().map_err(|err| internal_sql("batch object fetch", err))? {
			let pk: i64 = row.get(0).map_err(|err| internal_sql("batch object fetch", err))?;
			let type_code: String = row.get(1).map_err(|err| internal_sql("batch object fetch", err))?;
			records.push(ObjectRecord {
				pk,
				object_type: decode_object_type(&type_code)?,
			});
		}
		expect_exact("batch object fetch", ids.len(), records.len())?;
		Ok(records)
	}

	/// Resolve and fetch one definition row per `(object_pk, criterion)`
	/// pair, in input order.
	pub fn read_definitions(
		&self,
		tenant_id: TenantId,
		object_pks: &[i64],
		criteria: &[VersionCriterion],
	) -> Result<Vec<DefinitionRecord>> {
		let definition_pks = self.resolve_versioned(tenant_id, object_pks, criteria, Versioned::Definition, |i| {
			object_not_found(format!("no object definition matches the criterion at position {i}"))
		})?;

		let stage = self.mapping.insert_pks(&definition_pks)?;
		let sql = format!(
			"SELECT d.definition_pk, d.object_version, d.object_timestamp, d.object_is_latest, \
			d.meta_format, d.meta_version, d.definition \
			FROM {t} km JOIN object_definition d ON d.definition_pk = km.pk \
			WHERE km.mapping_stage = ?1 AND d.tenant_id = ?2 \
			ORDER BY km.ordering",
			t = self.mapping.table(),
		);
		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal_sql("batch definition fetch", err))?;
		let mut records = Vec::new();
		let mut raw = statement
			.query(params![stage, tenant_id])
			.map_err(|err| internal_sql("batch definition fetch", err))?;
		while let Some(row) = raw.next().map_err(|err| internal_sql("batch definition fetch", err))? {
			records.push(DefinitionRecord::from_row(row, 0)?);
		}
		expect_exact("batch definition fetch", object_pks.len(), records.len())?;
		Ok(records)
	}

	/// Resolve and fetch one tag row per `(definition_pk, criterion)`
	/// pair, in input order.
	pub fn read_tag_rows(
		&self,
		tenant_id: TenantId,
		definition_pks: &[i64],
		criteria: &[VersionCriterion],
	) -> Result<Vec<TagRow>> {
		let tag_pks = self.resolve_versioned(tenant_id, definition_pks, criteria, Versioned::Tag, |i| {
			object_not_found(format!("no tag matches the criterion at position {i}"))
		})?;

		let stage = self.mapping.insert_pks(&tag_pks)?;
		let sql = format!(
			"SELECT g.tag_pk, g.tag_version, g.tag_timestamp, g.tag_is_latest \
			FROM {t} km JOIN tag g ON g.tag_pk = km.pk \
			WHERE km.mapping_stage = ?1 AND g.tenant_id = ?2 \
			ORDER BY km.ordering",
			t = self.mapping.table(),
		);
		let mut statement = self.conn.prepare_cached(&sql).map_err(|err| internal_sql("batch tag fetch", err))?;
		let mut records = Vec::new();
		let mut raw =
			statement.query(params![stage, tenant_id]).map_err(|err| internal_sql("batch tag fetch", err))?;
		while let Some(row) = raw.next().map_err(|err| internal_sql("batch tag fetch", err))? {
			records.push(TagRow::from_row(row, 0)?);
		}
		expect_exact("batch tag fetch", definition_pks.len(), records.len())?;
		Ok(records)
	}

	/// All attribute rows for all tags in one query, assembled per tag in
	/// input order. Tags without attributes get an empty map.
	pub fn read_attrs(&self, tenant_id: TenantId, tag_pks: &[i64]) -> Result<Vec<BTreeMap<String, TagValue>>> {
		let stage = self.mapping.insert_pks(tag_pks)?;
		let sql = format!(
			"SELECT km.ordering, a.attr_name, a.attr_type, a.attr_index, a.attr_value_boolean, \
			a.attr_value_integer, a.attr_value_float, a.attr_value_string, a.attr_value_decimal, \
			a.attr_value_date, a.attr_value_datetime \
			FROM {t} km JOIN tag_attr a ON a.tag_fk = km.pk \
			WHERE km.mapping_stage = ?1 AND a.tenant_id = ?2 \
			ORDER BY km.ordering, a.attr_name, a.attr_index",
			t = self.mapping.table(),
		);
		let mut statement = self.conn.prepare_cached(&sql).map_err(|err| internal_sql("batch attr fetch", err))?;
		let mut per_tag: Vec<Vec<AttrRow>> = (0..tag_pks.len()).map(|_| Vec::new()).collect();
		let mut raw =
			statement.query(params![stage, tenant_id]).map_err(|err| internal_sql("batch attr fetch", err))?;
		while let Some(row) = raw.next().map_err(|err| internal_sql("batch attr fetch", err))? {
			let ordering: i64 = row.get(0).map_err(|err| internal_sql("batch attr fetch", err))?;
			let slot = per_tag.get_mut(ordering as usize).ok_or_else(|| {
				synthetic_error(SqlErrorCode::TooManyRows, "batch attr fetch", "attr row outside the requested batch")
			})?;
			let name: String = row.get(1).map_err(|err| internal_sql("batch attr fetch", err))?;
			let type_code: String = row.get(2).map_err(|err| internal_sql("batch attr fetch", err))?;
			let index: i32 = row.get(3).map_err(|err| internal_sql("batch attr fetch", err))?;
			slot.push(AttrRow {
				name,
				index,
				value: decode_attr_value(row, 4, &type_code)?,
			});
		}
		Ok(per_tag.into_iter().map(assemble_attrs).collect())
	}

	/// Materialize full tags for already-known tag primary keys, in input
	/// order. Used to fan search results out into domain tags.
	pub fn read_tags_by_pk(&self, tenant_id: TenantId, tag_pks: &[i64]) -> Result<Vec<Tag>> {
		if tag_pks.is_empty() {
			return Ok(Vec::new());
		}

		let stage = self.mapping.insert_pks(tag_pks)?;
		let sql = format!(
			"SELECT g.tag_pk, g.tag_version, g.tag_timestamp, g.tag_is_latest, \
			d.definition_pk, d.object_version, d.object_timestamp, d.object_is_latest, \
			d.meta_format, d.meta_version, d.definition, \
			o.object_type, o.id_hi, o.id_lo \
			FROM {t} km \
			JOIN tag g ON g.tag_pk = km.pk \
			JOIN object_definition d ON d.definition_pk = g.definition_fk \
			JOIN object_id o ON o.object_pk = d.object_fk \
			WHERE km.mapping_stage = ?1 AND g.tenant_id = ?2 \
			ORDER BY km.ordering",
			t = self.mapping.table(),
		);
		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal_sql("batch tag materialization", err))?;
		let mut partial = Vec::new();
		let mut raw = statement
			.query(params![stage, tenant_id])
			.map_err(|err| internal_sql("batch tag materialization", err))?;
		while let Some(row) = raw.next().map_err(|err| internal_sql("batch tag materialization", err))? {
			let tag_row = TagRow::from_row(row, 0)?;
			let definition = DefinitionRecord::from_row(row, 4)?;
			let type_code: String = row.get(11).map_err(|err| internal_sql("batch tag materialization", err))?;
			let id_hi: i64 = row.get(12).map_err(|err| internal_sql("batch tag materialization", err))?;
			let id_lo: i64 = row.get(13).map_err(|err| internal_sql("batch tag materialization", err))?;
			partial.push((tag_row, definition, decode_object_type(&type_code)?, uuid_from_halves(id_hi, id_lo)));
		}
		expect_exact("batch tag materialization", tag_pks.len(), partial.len())?;

		let attrs = self.read_attrs(tenant_id, tag_pks)?;
		let mut tags = Vec::with_capacity(partial.len());
		for ((tag_row, definition, object_type, object_id), attr_map) in partial.into_iter().zip(attrs) {
			tags.push(Tag {
				header: TagHeader {
					object_type,
					object_id,
					object_version: definition.object_version,
					object_timestamp: definition.timestamp,
					object_is_latest: definition.is_latest,
					tag_version: tag_row.tag_version,
					tag_timestamp: tag_row.timestamp,
					tag_is_latest: tag_row.is_latest,
				},
				attrs: attr_map,
				payload: definition.payload,
			});
		}
		Ok(tags)
	}

	/// Fetch config entries for already-known primary keys, in input order.
	pub fn read_config_entries_by_pk(&self, tenant_id: TenantId, pks: &[i64]) -> Result<Vec<ConfigEntry>> {
		if pks.is_empty() {
			return Ok(Vec::new());
		}

		let stage = self.mapping.insert_pks(pks)?;
		let sql = format!(
			"SELECT c.config_pk, c.config_version, c.config_timestamp, c.config_is_latest, \
			c.config_deleted, c.meta_format, c.meta_version, c.details, c.config_class, c.config_key \
			FROM {t} km JOIN config_entry c ON c.config_pk = km.pk \
			WHERE km.mapping_stage = ?1 AND c.tenant_id = ?2 \
			ORDER BY km.ordering",
			t = self.mapping.table(),
		);
		let mut statement =
			self.conn.prepare_cached(&sql).map_err(|err| internal_sql("batch config fetch", err))?;
		let mut entries = Vec::new();
		let mut raw = statement
			.query(params![stage, tenant_id])
			.map_err(|err| internal_sql("batch config fetch", err))?;
		while let Some(row) = raw.next().map_err(|err| internal_sql("batch config fetch", err))? {
			let class: String = row.get(8).map_err(|err| internal_sql("batch config fetch", err))?;
			let key: String = row.get(9).map_err(|err| internal_sql("batch config fetch", err))?;
			let (_, entry) = decode_config_row(row, &class, &key)?;
			entries.push(entry);
		}
		expect_exact("batch config fetch", pks.len(), entries.len())?;
		Ok(entries)
	}

	/// Resolve one versioned-row pk per `(fk, criterion)` pair. Criteria
	/// dispatch to the three mapping patterns; as-of batches group by
	/// instant since the scratch carries no timestamp column.
	fn resolve_versioned(
		&self,
		tenant_id: TenantId,
		fks: &[i64],
		criteria: &[VersionCriterion],
		versioned: Versioned,
		miss: impl Fn(usize) -> Error,
	) -> Result<Vec<i64>> {
		debug_assert_eq!(fks.len(), criteria.len());
		let mut resolved: Vec<Option<i64>> = vec![None; fks.len()];

		let mut version_indexes = Vec::new();
		let mut version_pairs = Vec::new();
		let mut latest_indexes = Vec::new();
		let mut latest_fks = Vec::new();
		let mut as_of_groups: BTreeMap<String, (Vec<usize>, Vec<i64>)> = BTreeMap::new();

		for (index, criterion) in criteria.iter().enumerate() {
			match criterion {
				VersionCriterion::Version(version) => {
					version_indexes.push(index);
					version_pairs.push((fks[index], *version));
				}
				VersionCriterion::Latest => {
					latest_indexes.push(index);
					latest_fks.push(fks[index]);
				}
				VersionCriterion::AsOf(instant) => {
					let group = as_of_groups.entry(temporal::encode_timestamp(instant)).or_default();
					group.0.push(index);
					group.1.push(fks[index]);
				}
			}
		}

		if !version_pairs.is_empty() {
			let stage = self.mapping.insert_fk_versions(&version_pairs)?;
			let pks = match versioned {
				Versioned::Definition => self.mapping.resolve_definitions_by_version(stage, tenant_id)?,
				Versioned::Tag => self.mapping.resolve_tags_by_version(stage, tenant_id)?,
			};
			scatter("version resolution", &mut resolved, &version_indexes, pks)?;
		}
		if !latest_fks.is_empty() {
			let stage = self.mapping.insert_fks(&latest_fks)?;
			let pks = match versioned {
				Versioned::Definition => self.mapping.resolve_definitions_by_latest(stage, tenant_id)?,
				Versioned::Tag => self.mapping.resolve_tags_by_latest(stage, tenant_id)?,
			};
			scatter("latest resolution", &mut resolved, &latest_indexes, pks)?;
		}
		for (as_of, (indexes, group_fks)) in &as_of_groups {
			let stage = self.mapping.insert_fks(group_fks)?;
			let pks = match versioned {
				Versioned::Definition => self.mapping.resolve_definitions_as_of(stage, tenant_id, as_of)?,
				Versioned::Tag => self.mapping.resolve_tags_as_of(stage, tenant_id, as_of)?,
			};
			scatter("as-of resolution", &mut resolved, indexes, pks)?;
		}

		resolved.into_iter().enumerate().map(|(index, pk)| pk.ok_or_else(|| miss(index))).collect()
	}
}

/// Scatter a resolved group back into the full batch by original position.
fn scatter(label: &str, resolved: &mut [Option<i64>], indexes: &[usize], pks: Vec<Option<i64>>) -> Result<()> {
	expect_exact(label, indexes.len(), pks.len())?;
	for (index, pk) in indexes.iter().zip(pks) {
		resolved[*index] = pk;
	}
	Ok(())
}

/// Exact count assertion: short results are `NoData`, overlong results
/// `TooManyRows`; both are invariant violations.
fn expect_exact(label: &str, expected: usize, actual: usize) -> Result<()> {
	if actual < expected {
		return Err(synthetic_error(
			SqlErrorCode::NoData,
			label,
			format!("returned {actual} rows for {expected} keys"),
		));
	}
	if actual > expected {
		return Err(synthetic_error(
			SqlErrorCode::TooManyRows,
			label,
			format!("returned {actual} rows for {expected} keys"),
		));
	}
	Ok(())
}
