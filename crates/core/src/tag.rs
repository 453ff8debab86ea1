// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tagstore_type::{TagValue, temporal};
use uuid::Uuid;

use crate::{ObjectType, Payload};

/// Identity and temporal position of a tag within a tenant.
///
/// Timestamps and latest flags are server-assigned on save; values supplied
/// by callers are echoed back only after a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagHeader {
	pub object_type: ObjectType,
	pub object_id: Uuid,
	pub object_version: u32,
	pub object_timestamp: DateTime<Utc>,
	pub object_is_latest: bool,
	pub tag_version: u32,
	pub tag_timestamp: DateTime<Utc>,
	pub tag_is_latest: bool,
}

impl TagHeader {
	pub fn new(object_type: ObjectType, object_id: Uuid, object_version: u32, tag_version: u32) -> Self {
		let now = temporal::now();
		Self {
			object_type,
			object_id,
			object_version,
			object_timestamp: now,
			object_is_latest: true,
			tag_version,
			tag_timestamp: now,
			tag_is_latest: true,
		}
	}

	/// Header for the first version of a fresh object.
	pub fn first(object_type: ObjectType) -> Self {
		Self::new(object_type, Uuid::new_v4(), 1, 1)
	}
}

/// A versioned envelope around one object definition: header, typed
/// attributes, and the opaque serialized payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
	pub header: TagHeader,
	pub attrs: BTreeMap<String, TagValue>,
	pub payload: Payload,
}

impl Tag {
	pub fn new(header: TagHeader, payload: Payload) -> Self {
		Self {
			header,
			attrs: BTreeMap::new(),
			payload,
		}
	}

	pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<TagValue>) -> Self {
		self.attrs.insert(name.into(), value.into());
		self
	}

	pub fn attr(&self, name: &str) -> Option<&TagValue> {
		self.attrs.get(name)
	}

	/// Header for the next object version of this tag's object, carrying
	/// the same identity and type.
	pub fn next_object_version(&self) -> TagHeader {
		TagHeader::new(self.header.object_type, self.header.object_id, self.header.object_version + 1, 1)
	}

	/// Header for the next tag version of this object version.
	pub fn next_tag_version(&self) -> TagHeader {
		TagHeader::new(
			self.header.object_type,
			self.header.object_id,
			self.header.object_version,
			self.header.tag_version + 1,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_header_starts_at_version_one() {
		let header = TagHeader::first(ObjectType::Custom);
		assert_eq!(header.object_version, 1);
		assert_eq!(header.tag_version, 1);
		assert!(header.object_is_latest);
		assert!(header.tag_is_latest);
	}

	#[test]
	fn next_object_version_resets_tag_version() {
		let tag = Tag::new(TagHeader::first(ObjectType::Data), Payload::empty()).with_attr("owner", "alice");
		let next = tag.next_object_version();
		assert_eq!(next.object_id, tag.header.object_id);
		assert_eq!(next.object_version, 2);
		assert_eq!(next.tag_version, 1);
	}

	#[test]
	fn next_tag_version_keeps_object_version() {
		let tag = Tag::new(TagHeader::new(ObjectType::Data, Uuid::new_v4(), 3, 2), Payload::empty());
		let next = tag.next_tag_version();
		assert_eq!(next.object_version, 3);
		assert_eq!(next.tag_version, 3);
	}
}
