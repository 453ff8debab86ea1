// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ConfigEntry, ObjectType, Tag};

/// An object identity reserved ahead of its first definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreallocatedId {
	pub object_type: ObjectType,
	pub object_id: Uuid,
}

impl PreallocatedId {
	pub fn new(object_type: ObjectType, object_id: Uuid) -> Self {
		Self {
			object_type,
			object_id,
		}
	}

	pub fn random(object_type: ObjectType) -> Self {
		Self::new(object_type, Uuid::new_v4())
	}
}

/// A composite write executed as one transaction: every sublist is applied
/// in full or the whole batch has no effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdate {
	pub prealloc_ids: Vec<PreallocatedId>,
	pub prealloc_objects: Vec<Tag>,
	pub new_objects: Vec<Tag>,
	pub new_versions: Vec<Tag>,
	pub new_tags: Vec<Tag>,
	pub config_entries: Vec<ConfigEntry>,
}

impl BatchUpdate {
	pub fn is_empty(&self) -> bool {
		self.prealloc_ids.is_empty()
			&& self.prealloc_objects.is_empty()
			&& self.new_objects.is_empty()
			&& self.new_versions.is_empty()
			&& self.new_tags.is_empty()
			&& self.config_entries.is_empty()
	}
}
