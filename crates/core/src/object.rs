// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Enumerated kind of a stored object.
///
/// The kind is fixed when the object identity is first written and every
/// later version and tag must state the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
	Data,
	Model,
	Flow,
	Job,
	File,
	Schema,
	Storage,
	Result,
	Config,
	Custom,
}

impl ObjectType {
	/// Stable storage code, persisted in the `object_type` columns.
	pub fn code(&self) -> &'static str {
		match self {
			ObjectType::Data => "DATA",
			ObjectType::Model => "MODEL",
			ObjectType::Flow => "FLOW",
			ObjectType::Job => "JOB",
			ObjectType::File => "FILE",
			ObjectType::Schema => "SCHEMA",
			ObjectType::Storage => "STORAGE",
			ObjectType::Result => "RESULT",
			ObjectType::Config => "CONFIG",
			ObjectType::Custom => "CUSTOM",
		}
	}

	pub fn from_code(code: &str) -> Option<ObjectType> {
		match code {
			"DATA" => Some(ObjectType::Data),
			"MODEL" => Some(ObjectType::Model),
			"FLOW" => Some(ObjectType::Flow),
			"JOB" => Some(ObjectType::Job),
			"FILE" => Some(ObjectType::File),
			"SCHEMA" => Some(ObjectType::Schema),
			"STORAGE" => Some(ObjectType::Storage),
			"RESULT" => Some(ObjectType::Result),
			"CONFIG" => Some(ObjectType::Config),
			"CUSTOM" => Some(ObjectType::Custom),
			_ => None,
		}
	}
}

impl Display for ObjectType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.code())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_round_trip() {
		for ty in [
			ObjectType::Data,
			ObjectType::Model,
			ObjectType::Flow,
			ObjectType::Job,
			ObjectType::File,
			ObjectType::Schema,
			ObjectType::Storage,
			ObjectType::Result,
			ObjectType::Config,
			ObjectType::Custom,
		] {
			assert_eq!(ObjectType::from_code(ty.code()), Some(ty));
		}
		assert_eq!(ObjectType::from_code("TABLE"), None);
	}
}
