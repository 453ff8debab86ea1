// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};

/// Serialized payloads are protobuf-encoded by the current producers.
pub const FORMAT_PROTO: i32 = 1;

/// Current payload schema version.
pub const VERSION_CURRENT: i32 = 1;

/// An opaque serialized payload together with the format markers recorded
/// beside it.
///
/// The storage layer preserves the bytes unchanged; the format and version
/// columns record how they were encoded so readers can reject combinations
/// they do not understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
	pub format: i32,
	pub version: i32,
	pub bytes: Vec<u8>,
}

impl Payload {
	/// A payload in the current proto format.
	pub fn proto(bytes: impl Into<Vec<u8>>) -> Self {
		Self {
			format: FORMAT_PROTO,
			version: VERSION_CURRENT,
			bytes: bytes.into(),
		}
	}

	/// An empty payload, as written by config delete markers.
	pub fn empty() -> Self {
		Self::proto(Vec::new())
	}

	/// Whether the recorded format markers name a combination this build
	/// can materialize.
	pub fn is_known_format(&self) -> bool {
		self.format == FORMAT_PROTO && self.version <= VERSION_CURRENT && self.version >= 1
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn proto_payload_is_known() {
		assert!(Payload::proto(vec![1, 2, 3]).is_known_format());
	}

	#[test]
	fn unknown_format_is_rejected() {
		let payload = Payload {
			format: 99,
			version: 1,
			bytes: vec![],
		};
		assert!(!payload.is_known_format());
	}
}
