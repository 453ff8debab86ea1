// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Search executor. The query text comes pre-built from an external search
//! query builder; this module only binds parameters, executes, and caps the
//! result set. Matched tag primary keys come back in arrival order and the
//! facade materializes them through the batch reader.

use rusqlite::{Connection, params, params_from_iter, types::Value};
use tagstore_type::{AttrValue, diagnostic::internal, temporal};
use tracing::instrument;

use crate::{Result, tenant::TenantId};

/// Bind an attribute value as a SQL parameter.
fn bind_param(value: &AttrValue) -> Value {
	match value {
		AttrValue::Boolean(v) => Value::from(*v),
		AttrValue::Integer(v) => Value::from(*v),
		AttrValue::Float(v) => Value::from(*v),
		AttrValue::String(v) => Value::from(v.clone()),
		AttrValue::Decimal(v) => Value::from(v.to_string()),
		AttrValue::Date(v) => Value::from(temporal::encode_date(v)),
		AttrValue::DateTime(v) => Value::from(temporal::encode_timestamp(v)),
	}
}

/// Execute a pre-built tag search and return matched tag primary keys, in
/// arrival order, capped at `limit`. The query's first parameter slot is
/// reserved for the tenant id so a search can never cross tenants;
/// caller-supplied parameters bind after it.
#[instrument(name = "store::search::tags", level = "debug", skip(conn, sql, search_params), fields(params = search_params.len()))]
pub(crate) fn execute_search(
	conn: &Connection,
	tenant_id: TenantId,
	sql: &str,
	search_params: &[AttrValue],
	limit: usize,
) -> Result<Vec<i64>> {
	let mut statement = conn.prepare(sql).map_err(|err| internal(format!("search query failed: {err}")))?;
	let mut bind: Vec<Value> = Vec::with_capacity(search_params.len() + 1);
	bind.push(Value::from(tenant_id as i64));
	bind.extend(search_params.iter().map(bind_param));

	let mut pks = Vec::new();
	let mut raw =
		statement.query(params_from_iter(bind)).map_err(|err| internal(format!("search query failed: {err}")))?;
	while let Some(row) = raw.next().map_err(|err| internal(format!("search query failed: {err}")))? {
		if pks.len() >= limit {
			break;
		}
		pks.push(row.get::<_, i64>(0).map_err(|err| internal(format!("search query failed: {err}")))?);
	}
	Ok(pks)
}

/// Latest-version config primary keys for a class, ordered by key. Delete
/// markers are filtered out unless requested.
pub(crate) fn search_config_keys(
	conn: &Connection,
	tenant_id: TenantId,
	config_class: &str,
	include_deleted: bool,
) -> Result<Vec<i64>> {
	let mut sql = String::from(
		"SELECT config_pk FROM config_entry \
		WHERE tenant_id = ?1 AND config_class = ?2 AND config_is_latest = ?3",
	);
	if !include_deleted {
		sql.push_str(" AND config_deleted = ?4");
	}
	sql.push_str(" ORDER BY config_key");

	let mut statement =
		conn.prepare_cached(&sql).map_err(|err| internal(format!("config class listing failed: {err}")))?;
	let mut pks = Vec::new();
	let mut bind: Vec<Value> =
		vec![Value::from(tenant_id as i64), Value::from(config_class.to_string()), Value::from(true)];
	if !include_deleted {
		bind.push(Value::from(false));
	}
	let mut raw = statement
		.query(params_from_iter(bind))
		.map_err(|err| internal(format!("config class listing failed: {err}")))?;
	while let Some(row) = raw.next().map_err(|err| internal(format!("config class listing failed: {err}")))? {
		pks.push(row.get::<_, i64>(0).map_err(|err| internal(format!("config class listing failed: {err}")))?);
	}
	Ok(pks)
}

/// Whether a config class has any entries at all, deleted or live.
pub(crate) fn config_class_exists(conn: &Connection, tenant_id: TenantId, config_class: &str) -> Result<bool> {
	let count: i64 = conn
		.query_row(
			"SELECT COUNT(*) FROM config_entry WHERE tenant_id = ?1 AND config_class = ?2",
			params![tenant_id, config_class],
			|row| row.get(0),
		)
		.map_err(|err| internal(format!("config class probe failed: {err}")))?;
	Ok(count > 0)
}
