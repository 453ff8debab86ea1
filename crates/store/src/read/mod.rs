// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Read paths: a low-latency single-item reader with direct queries and a
//! batch reader that resolves list-valued requests through the key-mapping
//! scratch, preserving input order.

use std::collections::BTreeMap;

use tagstore_type::{AttrValue, TagValue};

pub(crate) use batch::BatchReader;
pub(crate) use single::SingleReader;

mod batch;
mod single;

/// Index marking a scalar attribute row; array elements count up from zero.
pub(crate) const SCALAR_ATTR_INDEX: i32 = -1;

/// One decoded `tag_attr` row, ready for assembly.
pub(crate) struct AttrRow {
	pub name: String,
	pub index: i32,
	pub value: AttrValue,
}

/// Collapse attribute rows (pre-ordered by name then index) into the
/// attribute map of one tag. Rows with a non-negative index accumulate into
/// arrays in encounter order; scalar rows store directly.
pub(crate) fn assemble_attrs(rows: Vec<AttrRow>) -> BTreeMap<String, TagValue> {
	let mut attrs = BTreeMap::new();
	for row in rows {
		if row.index == SCALAR_ATTR_INDEX {
			attrs.insert(row.name, TagValue::Scalar(row.value));
		} else {
			match attrs.entry(row.name).or_insert_with(|| TagValue::Array(Vec::new())) {
				TagValue::Array(values) => values.push(row.value),
				// A scalar and array row under one name cannot both
				// exist; the unique key on (name, index) forbids it.
				TagValue::Scalar(_) => {}
			}
		}
	}
	attrs
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scalars_and_arrays_assemble() {
		let rows = vec![
			AttrRow {
				name: "count".into(),
				index: SCALAR_ATTR_INDEX,
				value: AttrValue::Integer(7),
			},
			AttrRow {
				name: "xs".into(),
				index: 0,
				value: AttrValue::from("a"),
			},
			AttrRow {
				name: "xs".into(),
				index: 1,
				value: AttrValue::from("b"),
			},
			AttrRow {
				name: "xs".into(),
				index: 2,
				value: AttrValue::from("a"),
			},
		];
		let attrs = assemble_attrs(rows);
		assert_eq!(attrs.get("count"), Some(&TagValue::Scalar(AttrValue::Integer(7))));
		assert_eq!(
			attrs.get("xs"),
			Some(&TagValue::Array(vec![AttrValue::from("a"), AttrValue::from("b"), AttrValue::from("a")]))
		);
	}

	#[test]
	fn empty_rows_give_empty_map() {
		assert!(assemble_attrs(Vec::new()).is_empty());
	}
}
