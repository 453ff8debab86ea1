// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Shared fixtures for tagstore tests: ready-to-use stores with deployed
//! schema and seeded tenants, plus tag and config builders.

use tagstore_core::{ObjectType, Payload, Tag, TagHeader};
use tagstore_store::{MetadataStore, StoreConfig};
use uuid::Uuid;

/// The tenant every fixture store registers.
pub const TENANT: &str = "ACME";

/// A second tenant for isolation tests.
pub const OTHER_TENANT: &str = "EMCA";

/// An in-memory store with deployed schema and two registered tenants,
/// started and ready for use.
pub fn test_store() -> MetadataStore {
	store_with_config(StoreConfig::in_memory())
}

/// As [`test_store`], with a caller-supplied configuration. The location
/// must point at a fresh database.
pub fn store_with_config(config: StoreConfig) -> MetadataStore {
	let store = MetadataStore::open(config).expect("store should open");
	store.deploy_schema().expect("schema should deploy");
	store.deploy_tenant(TENANT, "Acme Corp").expect("tenant should deploy");
	store.deploy_tenant(OTHER_TENANT, "Emca Ltd").expect("tenant should deploy");
	store.start().expect("store should start");
	store
}

/// A fresh version-1 tag with a distinct payload, no attributes.
pub fn sample_tag(object_type: ObjectType) -> Tag {
	let header = TagHeader::first(object_type);
	let payload = Payload::proto(header.object_id.as_bytes().to_vec());
	Tag::new(header, payload)
}

/// A fresh version-1 tag with the given id.
pub fn sample_tag_with_id(object_type: ObjectType, object_id: Uuid) -> Tag {
	let header = TagHeader::new(object_type, object_id, 1, 1);
	let payload = Payload::proto(object_id.as_bytes().to_vec());
	Tag::new(header, payload)
}

/// The next object version of an existing tag, with fresh payload bytes.
pub fn next_version_tag(tag: &Tag, payload: impl Into<Vec<u8>>) -> Tag {
	Tag {
		header: tag.next_object_version(),
		attrs: tag.attrs.clone(),
		payload: Payload::proto(payload),
	}
}

/// The next tag version of an existing tag, keeping its payload.
pub fn next_tag_version(tag: &Tag) -> Tag {
	Tag {
		header: tag.next_tag_version(),
		attrs: tag.attrs.clone(),
		payload: tag.payload.clone(),
	}
}
