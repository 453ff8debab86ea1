// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Composite batch updates: every sublist applies in full or nothing does.

use tagstore_core::{BatchUpdate, ConfigEntry, ConfigKey, ObjectType, Payload, PreallocatedId, TagSelector};
use tagstore_testing::{TENANT, next_version_tag, sample_tag, test_store};
use tagstore_type::ErrorKind;

#[test]
fn batch_applies_every_sublist() {
	let store = test_store();
	let v1 = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();

	let reserved = PreallocatedId::random(ObjectType::Model);
	let fresh = sample_tag(ObjectType::Custom).with_attr("owner", "alice");
	let v2 = next_version_tag(&v1, b"v2".to_vec());
	let batch = BatchUpdate {
		prealloc_ids: vec![reserved],
		new_objects: vec![fresh.clone()],
		new_versions: vec![v2.clone()],
		config_entries: vec![ConfigEntry::new("batch", "key", 1, Payload::proto(b"v".to_vec()))],
		..BatchUpdate::default()
	};
	store.save_batch_update(TENANT, &batch).unwrap();

	let loaded = store.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, fresh.header.object_id)).unwrap();
	assert_eq!(loaded.attrs, fresh.attrs);
	let latest = store.load_object(TENANT, &TagSelector::latest(ObjectType::Data, v1.header.object_id)).unwrap();
	assert_eq!(latest.header.object_version, 2);
	let config = store.load_config_entry(TENANT, &ConfigKey::latest("batch", "key"), false).unwrap();
	assert_eq!(config.payload.bytes, b"v");
}

#[test]
fn failing_sublist_rolls_back_the_whole_batch() {
	let store = test_store();
	let existing = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[existing.clone()]).unwrap();

	let reserved = PreallocatedId::random(ObjectType::Model);
	let fresh = sample_tag(ObjectType::Custom);
	// The duplicate UUID forces a failure after the first two sublists
	// have already executed inside the transaction.
	let batch = BatchUpdate {
		prealloc_ids: vec![reserved],
		new_objects: vec![fresh.clone(), existing.clone()],
		..BatchUpdate::default()
	};
	let err = store.save_batch_update(TENANT, &batch).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::DuplicateObjectId);

	// Nothing from the batch persisted.
	let err = store.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, fresh.header.object_id)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
	// The id reserves cleanly now, proving the batch never kept it.
	store.save_preallocated_ids(TENANT, &[reserved]).unwrap();
}

#[test]
fn empty_batch_is_a_no_op() {
	let store = test_store();
	let batch = BatchUpdate::default();
	assert!(batch.is_empty());
	store.save_batch_update(TENANT, &batch).unwrap();
}
