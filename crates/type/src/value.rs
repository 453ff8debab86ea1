// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{Display, Formatter};

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Primitive types a tag attribute can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
	Boolean,
	Integer,
	Float,
	String,
	Decimal,
	Date,
	DateTime,
}

impl AttrType {
	/// Stable storage code, persisted in the `attr_type` column.
	pub fn code(&self) -> &'static str {
		match self {
			AttrType::Boolean => "BOOLEAN",
			AttrType::Integer => "INTEGER",
			AttrType::Float => "FLOAT",
			AttrType::String => "STRING",
			AttrType::Decimal => "DECIMAL",
			AttrType::Date => "DATE",
			AttrType::DateTime => "DATETIME",
		}
	}

	pub fn from_code(code: &str) -> Option<AttrType> {
		match code {
			"BOOLEAN" => Some(AttrType::Boolean),
			"INTEGER" => Some(AttrType::Integer),
			"FLOAT" => Some(AttrType::Float),
			"STRING" => Some(AttrType::String),
			"DECIMAL" => Some(AttrType::Decimal),
			"DATE" => Some(AttrType::Date),
			"DATETIME" => Some(AttrType::DateTime),
			_ => None,
		}
	}
}

impl Display for AttrType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.code())
	}
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
	Boolean(bool),
	Integer(i64),
	Float(f64),
	String(String),
	Decimal(BigDecimal),
	Date(NaiveDate),
	DateTime(DateTime<Utc>),
}

impl AttrValue {
	pub fn attr_type(&self) -> AttrType {
		match self {
			AttrValue::Boolean(_) => AttrType::Boolean,
			AttrValue::Integer(_) => AttrType::Integer,
			AttrValue::Float(_) => AttrType::Float,
			AttrValue::String(_) => AttrType::String,
			AttrValue::Decimal(_) => AttrType::Decimal,
			AttrValue::Date(_) => AttrType::Date,
			AttrValue::DateTime(_) => AttrType::DateTime,
		}
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Boolean(value)
	}
}

impl From<i64> for AttrValue {
	fn from(value: i64) -> Self {
		AttrValue::Integer(value)
	}
}

impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		AttrValue::Float(value)
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		AttrValue::String(value.to_string())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		AttrValue::String(value)
	}
}

/// A tag attribute: either a scalar or a uniformly typed array.
///
/// Array elements are persisted one row per element with an explicit index;
/// the element type must be the same for every member of the array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
	Scalar(AttrValue),
	Array(Vec<AttrValue>),
}

impl TagValue {
	/// Element type of the value, or `None` for an empty array.
	///
	/// A mixed-type array has no single element type and also yields `None`;
	/// writers treat that as an invariant violation.
	pub fn element_type(&self) -> Option<AttrType> {
		match self {
			TagValue::Scalar(value) => Some(value.attr_type()),
			TagValue::Array(values) => {
				let mut types = values.iter().map(AttrValue::attr_type);
				let first = types.next()?;
				if types.all(|t| t == first) {
					Some(first)
				} else {
					None
				}
			}
		}
	}

	pub fn is_array(&self) -> bool {
		matches!(self, TagValue::Array(_))
	}
}

impl From<AttrValue> for TagValue {
	fn from(value: AttrValue) -> Self {
		TagValue::Scalar(value)
	}
}

impl From<bool> for TagValue {
	fn from(value: bool) -> Self {
		TagValue::Scalar(value.into())
	}
}

impl From<i64> for TagValue {
	fn from(value: i64) -> Self {
		TagValue::Scalar(value.into())
	}
}

impl From<f64> for TagValue {
	fn from(value: f64) -> Self {
		TagValue::Scalar(value.into())
	}
}

impl From<&str> for TagValue {
	fn from(value: &str) -> Self {
		TagValue::Scalar(value.into())
	}
}

impl From<String> for TagValue {
	fn from(value: String) -> Self {
		TagValue::Scalar(value.into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn attr_type_codes_round_trip() {
		for ty in [
			AttrType::Boolean,
			AttrType::Integer,
			AttrType::Float,
			AttrType::String,
			AttrType::Decimal,
			AttrType::Date,
			AttrType::DateTime,
		] {
			assert_eq!(AttrType::from_code(ty.code()), Some(ty));
		}
		assert_eq!(AttrType::from_code("BLOB"), None);
	}

	#[test]
	fn uniform_array_has_element_type() {
		let value = TagValue::Array(vec![AttrValue::from("a"), AttrValue::from("b")]);
		assert_eq!(value.element_type(), Some(AttrType::String));
	}

	#[test]
	fn mixed_array_has_no_element_type() {
		let value = TagValue::Array(vec![AttrValue::from("a"), AttrValue::from(1i64)]);
		assert_eq!(value.element_type(), None);
	}

	#[test]
	fn empty_array_has_no_element_type() {
		let value = TagValue::Array(vec![]);
		assert_eq!(value.element_type(), None);
	}
}
