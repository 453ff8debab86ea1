// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Constructor functions for every member of the error taxonomy.
//!
//! Readers and writers build errors through these helpers so that messages
//! stay uniform across the storage layer.

use crate::{Error, ErrorKind};

pub fn tenant_not_found(code: &str) -> Error {
	Error::new(ErrorKind::TenantNotFound, format!("tenant '{code}' is not registered"))
}

pub fn object_not_found(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::ObjectNotFound, detail)
}

pub fn wrong_object_type(expected: &str, actual: &str) -> Error {
	Error::new(
		ErrorKind::WrongObjectType,
		format!("object is recorded as type {actual}, request stated {expected}"),
	)
}

pub fn duplicate_object_id(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::DuplicateObjectId, detail)
}

pub fn id_already_in_use(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::IdAlreadyInUse, detail)
}

pub fn id_not_preallocated(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::IdNotPreallocated, detail)
}

pub fn prior_version_missing(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::PriorVersionMissing, detail)
}

pub fn version_superseded(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::VersionSuperseded, detail)
}

pub fn prior_tag_missing(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::PriorTagMissing, detail)
}

pub fn tag_superseded(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::TagSuperseded, detail)
}

pub fn prior_config_missing(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::PriorConfigMissing, detail)
}

pub fn duplicate_config(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::DuplicateConfig, detail)
}

pub fn config_not_found(class: &str, key: &str) -> Error {
	Error::new(ErrorKind::ConfigNotFound, format!("config entry '{class}/{key}' does not match any row"))
}

pub fn config_class_not_found(class: &str) -> Error {
	Error::new(ErrorKind::ConfigClassNotFound, format!("config class '{class}' has no entries"))
}

pub fn invalid_object_definition(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::InvalidObjectDefinition, detail)
}

pub fn invalid_config_entry(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::InvalidConfigEntry, detail)
}

pub fn startup(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::Startup, detail)
}

pub fn internal(detail: impl Into<String>) -> Error {
	Error::new(ErrorKind::Internal, detail)
}
