// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{Display, Formatter};

/// The closed set of error kinds the metadata layer exposes to callers.
///
/// Domain kinds describe a recoverable condition the caller can act on;
/// `Internal` covers unexpected driver errors and invariant violations and
/// carries enough context to be actionable but no recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	TenantNotFound,
	ObjectNotFound,
	WrongObjectType,
	DuplicateObjectId,
	IdAlreadyInUse,
	IdNotPreallocated,
	PriorVersionMissing,
	VersionSuperseded,
	PriorTagMissing,
	TagSuperseded,
	PriorConfigMissing,
	DuplicateConfig,
	ConfigNotFound,
	ConfigClassNotFound,
	InvalidObjectDefinition,
	InvalidConfigEntry,
	Startup,
	Internal,
}

impl ErrorKind {
	pub fn code(&self) -> &'static str {
		match self {
			ErrorKind::TenantNotFound => "TENANT_NOT_FOUND",
			ErrorKind::ObjectNotFound => "OBJECT_NOT_FOUND",
			ErrorKind::WrongObjectType => "WRONG_OBJECT_TYPE",
			ErrorKind::DuplicateObjectId => "DUPLICATE_OBJECT_ID",
			ErrorKind::IdAlreadyInUse => "ID_ALREADY_IN_USE",
			ErrorKind::IdNotPreallocated => "ID_NOT_PREALLOCATED",
			ErrorKind::PriorVersionMissing => "PRIOR_VERSION_MISSING",
			ErrorKind::VersionSuperseded => "VERSION_SUPERSEDED",
			ErrorKind::PriorTagMissing => "PRIOR_TAG_MISSING",
			ErrorKind::TagSuperseded => "TAG_SUPERSEDED",
			ErrorKind::PriorConfigMissing => "PRIOR_CONFIG_MISSING",
			ErrorKind::DuplicateConfig => "DUPLICATE_CONFIG",
			ErrorKind::ConfigNotFound => "CONFIG_NOT_FOUND",
			ErrorKind::ConfigClassNotFound => "CONFIG_CLASS_NOT_FOUND",
			ErrorKind::InvalidObjectDefinition => "INVALID_OBJECT_DEFINITION",
			ErrorKind::InvalidConfigEntry => "INVALID_CONFIG_ENTRY",
			ErrorKind::Startup => "STARTUP",
			ErrorKind::Internal => "INTERNAL",
		}
	}

	/// Whether this kind describes a condition the caller can recover from.
	pub fn is_domain(&self) -> bool {
		!matches!(self, ErrorKind::Startup | ErrorKind::Internal)
	}
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.code())
	}
}

/// Error type surfaced by every public metadata-layer operation.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
	kind: ErrorKind,
	message: String,
	#[source]
	source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			source: None,
		}
	}

	pub fn with_source(
		kind: ErrorKind,
		message: impl Into<String>,
		source: impl std::error::Error + Send + Sync + 'static,
	) -> Self {
		Self {
			kind,
			message: message.into(),
			source: Some(Box::new(source)),
		}
	}

	pub fn kind(&self) -> ErrorKind {
		self.kind
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn is_domain(&self) -> bool {
		self.kind.is_domain()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_prefixes_kind_code() {
		let err = Error::new(ErrorKind::ObjectNotFound, "no such object");
		assert_eq!(err.to_string(), "OBJECT_NOT_FOUND: no such object");
	}

	#[test]
	fn domain_classification() {
		assert!(ErrorKind::VersionSuperseded.is_domain());
		assert!(ErrorKind::TenantNotFound.is_domain());
		assert!(!ErrorKind::Internal.is_domain());
		assert!(!ErrorKind::Startup.is_domain());
	}

	#[test]
	fn source_is_preserved() {
		let io = std::io::Error::other("boom");
		let err = Error::with_source(ErrorKind::Internal, "driver failure", io);
		assert!(std::error::Error::source(&err).is_some());
	}
}
