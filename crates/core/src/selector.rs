// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ObjectType;

/// How a selector picks one version out of a versioned group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VersionCriterion {
	/// An explicit positive version number.
	Version(u32),
	/// The version whose `[timestamp, superseded_at)` interval contains the
	/// given instant.
	AsOf(DateTime<Utc>),
	/// The version currently flagged latest.
	Latest,
}

/// Selects one tag of one object: the object by UUID, the object version by
/// one criterion, and the tag version by another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSelector {
	pub object_type: ObjectType,
	pub object_id: Uuid,
	pub object_criterion: VersionCriterion,
	pub tag_criterion: VersionCriterion,
}

impl TagSelector {
	pub fn new(
		object_type: ObjectType,
		object_id: Uuid,
		object_criterion: VersionCriterion,
		tag_criterion: VersionCriterion,
	) -> Self {
		Self {
			object_type,
			object_id,
			object_criterion,
			tag_criterion,
		}
	}

	/// Latest object version, latest tag.
	pub fn latest(object_type: ObjectType, object_id: Uuid) -> Self {
		Self::new(object_type, object_id, VersionCriterion::Latest, VersionCriterion::Latest)
	}

	/// Explicit object and tag versions.
	pub fn exact(object_type: ObjectType, object_id: Uuid, object_version: u32, tag_version: u32) -> Self {
		Self::new(
			object_type,
			object_id,
			VersionCriterion::Version(object_version),
			VersionCriterion::Version(tag_version),
		)
	}

	/// Object and tag as they stood at the given instant.
	pub fn as_of(object_type: ObjectType, object_id: Uuid, instant: DateTime<Utc>) -> Self {
		Self::new(object_type, object_id, VersionCriterion::AsOf(instant), VersionCriterion::AsOf(instant))
	}
}
