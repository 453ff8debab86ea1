// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Row-level encoding between domain values and their persisted shapes:
//! UUIDs as 64-bit halves, instants as fixed-width text, attribute values
//! spread over one typed column each, payload format markers validated on
//! the way out.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rusqlite::Row;
use tagstore_core::{ObjectType, Payload};
use tagstore_type::{AttrType, AttrValue, Error, ErrorKind, temporal};
use uuid::Uuid;

use crate::Result;

/// Split a UUID into the two signed 64-bit halves it is persisted as.
pub(crate) fn uuid_halves(id: &Uuid) -> (i64, i64) {
	let value = id.as_u128();
	(((value >> 64) as u64) as i64, (value as u64) as i64)
}

pub(crate) fn uuid_from_halves(hi: i64, lo: i64) -> Uuid {
	Uuid::from_u128((((hi as u64) as u128) << 64) | ((lo as u64) as u128))
}

/// Validate persisted format markers and materialize the payload bytes
/// unchanged. `kind` names the decode-failure error for the row's entity.
pub(crate) fn decode_payload(format: i32, version: i32, bytes: Vec<u8>, kind: ErrorKind) -> Result<Payload> {
	let payload = Payload {
		format,
		version,
		bytes,
	};
	if !payload.is_known_format() {
		return Err(Error::new(kind, format!("stored payload has unknown format {format} version {version}")));
	}
	Ok(payload)
}

/// One `object_id` row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectRecord {
	pub pk: i64,
	pub object_type: ObjectType,
}

pub(crate) fn decode_object_type(code: &str) -> Result<ObjectType> {
	ObjectType::from_code(code)
		.ok_or_else(|| Error::new(ErrorKind::Internal, format!("unknown stored object type '{code}'")))
}

/// One `object_definition` row, minus foreign keys.
#[derive(Debug, Clone)]
pub(crate) struct DefinitionRecord {
	pub pk: i64,
	pub object_version: u32,
	pub timestamp: DateTime<Utc>,
	pub is_latest: bool,
	pub payload: Payload,
}

impl DefinitionRecord {
	/// Decode from columns `(definition_pk, object_version,
	/// object_timestamp, object_is_latest, meta_format, meta_version,
	/// definition)` starting at `base`.
	pub fn from_row(row: &Row, base: usize) -> Result<Self> {
		let pk: i64 = get(row, base, "definition_pk")?;
		let object_version: u32 = get(row, base + 1, "object_version")?;
		let timestamp = temporal::decode_timestamp(&get::<String>(row, base + 2, "object_timestamp")?)?;
		let is_latest: bool = get(row, base + 3, "object_is_latest")?;
		let format: i32 = get(row, base + 4, "meta_format")?;
		let version: i32 = get(row, base + 5, "meta_version")?;
		let bytes: Vec<u8> = get(row, base + 6, "definition")?;
		Ok(Self {
			pk,
			object_version,
			timestamp,
			is_latest,
			payload: decode_payload(format, version, bytes, ErrorKind::InvalidObjectDefinition)?,
		})
	}
}

/// One `tag` row, minus foreign keys and attrs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TagRow {
	pub pk: i64,
	pub tag_version: u32,
	pub timestamp: DateTime<Utc>,
	pub is_latest: bool,
}

impl TagRow {
	/// Decode from columns `(tag_pk, tag_version, tag_timestamp,
	/// tag_is_latest)` starting at `base`.
	pub fn from_row(row: &Row, base: usize) -> Result<Self> {
		Ok(Self {
			pk: get(row, base, "tag_pk")?,
			tag_version: get(row, base + 1, "tag_version")?,
			timestamp: temporal::decode_timestamp(&get::<String>(row, base + 2, "tag_timestamp")?)?,
			is_latest: get(row, base + 3, "tag_is_latest")?,
		})
	}
}

/// Attribute value columns for one `tag_attr` row; exactly one is set.
#[derive(Debug, Default)]
pub(crate) struct AttrColumns {
	pub boolean: Option<bool>,
	pub integer: Option<i64>,
	pub float: Option<f64>,
	pub string: Option<String>,
	pub decimal: Option<String>,
	pub date: Option<String>,
	pub datetime: Option<String>,
}

impl AttrColumns {
	pub fn encode(value: &AttrValue) -> Self {
		let mut columns = Self::default();
		match value {
			AttrValue::Boolean(v) => columns.boolean = Some(*v),
			AttrValue::Integer(v) => columns.integer = Some(*v),
			AttrValue::Float(v) => columns.float = Some(*v),
			AttrValue::String(v) => columns.string = Some(v.clone()),
			AttrValue::Decimal(v) => columns.decimal = Some(v.to_string()),
			AttrValue::Date(v) => columns.date = Some(temporal::encode_date(v)),
			AttrValue::DateTime(v) => columns.datetime = Some(temporal::encode_timestamp(v)),
		}
		columns
	}
}

/// Decode one attribute value from columns `(attr_value_boolean,
/// attr_value_integer, attr_value_float, attr_value_string,
/// attr_value_decimal, attr_value_date, attr_value_datetime)` starting at
/// `base`, selected by the row's recorded type code.
pub(crate) fn decode_attr_value(row: &Row, base: usize, type_code: &str) -> Result<AttrValue> {
	let attr_type = AttrType::from_code(type_code)
		.ok_or_else(|| Error::new(ErrorKind::Internal, format!("unknown stored attr type '{type_code}'")))?;

	let value = match attr_type {
		AttrType::Boolean => AttrValue::Boolean(require(row, base, "attr_value_boolean")?),
		AttrType::Integer => AttrValue::Integer(require(row, base + 1, "attr_value_integer")?),
		AttrType::Float => AttrValue::Float(require(row, base + 2, "attr_value_float")?),
		AttrType::String => AttrValue::String(require(row, base + 3, "attr_value_string")?),
		AttrType::Decimal => {
			let text: String = require(row, base + 4, "attr_value_decimal")?;
			AttrValue::Decimal(text.parse::<BigDecimal>().map_err(|err| {
				Error::new(ErrorKind::Internal, format!("unreadable stored decimal '{text}': {err}"))
			})?)
		}
		AttrType::Date => AttrValue::Date(temporal::decode_date(&require::<String>(row, base + 5, "attr_value_date")?)?),
		AttrType::DateTime => {
			AttrValue::DateTime(temporal::decode_timestamp(&require::<String>(row, base + 6, "attr_value_datetime")?)?)
		}
	};
	Ok(value)
}

fn get<T: rusqlite::types::FromSql>(row: &Row, index: usize, column: &str) -> Result<T> {
	row.get(index).map_err(|err| Error::new(ErrorKind::Internal, format!("cannot read column {column}: {err}")))
}

fn require<T: rusqlite::types::FromSql>(row: &Row, index: usize, column: &str) -> Result<T> {
	let value: Option<T> = get(row, index, column)?;
	value.ok_or_else(|| Error::new(ErrorKind::Internal, format!("column {column} is null for its recorded attr type")))
}
