// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Temporal discipline: version appends, supersession, latest flags, as-of
//! selection and the prior-load helpers.

use std::{thread::sleep, time::Duration};

use tagstore_core::{ObjectType, TagSelector};
use tagstore_testing::{TENANT, next_tag_version, next_version_tag, sample_tag, test_store};
use tagstore_type::ErrorKind;

#[test]
fn new_version_supersedes_the_prior_latest() {
	let store = test_store();
	let v1 = sample_tag(ObjectType::Custom).with_attr("owner", "alice");
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();
	sleep(Duration::from_millis(2));

	let v2 = next_version_tag(&v1, b"second".to_vec());
	store.save_new_versions(TENANT, &[v2.clone()]).unwrap();

	let latest = store.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, v1.header.object_id)).unwrap();
	assert_eq!(latest.header.object_version, 2);
	assert!(latest.header.object_is_latest);
	assert_eq!(latest.payload.bytes, b"second");

	let first = store
		.load_object(TENANT, &TagSelector::exact(ObjectType::Custom, v1.header.object_id, 1, 1))
		.unwrap();
	assert_eq!(first.header.object_version, 1);
	assert!(!first.header.object_is_latest);
}

#[test]
fn as_of_selects_the_version_in_effect() {
	let store = test_store();
	let v1 = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();
	sleep(Duration::from_millis(2));

	let v2 = next_version_tag(&v1, b"v2".to_vec());
	store.save_new_versions(TENANT, &[v2.clone()]).unwrap();
	sleep(Duration::from_millis(2));

	let v3 = next_version_tag(&v2, b"v3".to_vec());
	store.save_new_versions(TENANT, &[v3.clone()]).unwrap();

	// Stored timestamps are server-assigned; read them back.
	let id = v1.header.object_id;
	let t1 = store.load_object(TENANT, &TagSelector::exact(ObjectType::Data, id, 1, 1)).unwrap();
	let t2 = store.load_object(TENANT, &TagSelector::exact(ObjectType::Data, id, 2, 1)).unwrap();
	let t3 = store.load_object(TENANT, &TagSelector::exact(ObjectType::Data, id, 3, 1)).unwrap();
	assert!(t1.header.object_timestamp < t2.header.object_timestamp);
	assert!(t2.header.object_timestamp < t3.header.object_timestamp);

	for (instant, expected_version) in [
		(t1.header.object_timestamp, 1),
		(t2.header.object_timestamp, 2),
		(t3.header.object_timestamp, 3),
		(t3.header.object_timestamp + chrono::Duration::hours(1), 3),
	] {
		let loaded = store.load_object(TENANT, &TagSelector::as_of(ObjectType::Data, id, instant)).unwrap();
		assert_eq!(loaded.header.object_version, expected_version, "as-of {instant}");
	}

	// The batch path resolves the same intervals.
	let selectors = vec![
		TagSelector::as_of(ObjectType::Data, id, t2.header.object_timestamp),
		TagSelector::as_of(ObjectType::Data, id, t1.header.object_timestamp),
	];
	let loaded = store.load_objects(TENANT, &selectors).unwrap();
	assert_eq!(loaded[0].header.object_version, 2);
	assert_eq!(loaded[1].header.object_version, 1);
}

#[test]
fn version_gap_is_rejected() {
	let store = test_store();
	let v1 = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();

	// Skipping version 2 leaves no prior latest at version 2.
	let mut v3 = next_version_tag(&v1, b"v3".to_vec());
	v3.header.object_version = 3;
	let err = store.save_new_versions(TENANT, &[v3]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PriorVersionMissing);
}

#[test]
fn re_saving_an_existing_version_is_superseded() {
	let store = test_store();
	let v1 = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();
	let v2 = next_version_tag(&v1, b"v2".to_vec());
	store.save_new_versions(TENANT, &[v2.clone()]).unwrap();

	// A second append of version 2 finds version 1 already closed.
	let err = store.save_new_versions(TENANT, &[v2]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::VersionSuperseded);
}

#[test]
fn new_version_of_unknown_object_is_not_found() {
	let store = test_store();
	let orphan = {
		let mut tag = sample_tag(ObjectType::Data);
		tag.header.object_version = 2;
		tag
	};
	let err = store.save_new_versions(TENANT, &[orphan]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
}

#[test]
fn wrong_type_on_new_version_changes_nothing() {
	let store = test_store();
	let v1 = sample_tag(ObjectType::Custom);
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();

	let mut v2 = next_version_tag(&v1, b"v2".to_vec());
	v2.header.object_type = ObjectType::Data;
	let err = store.save_new_versions(TENANT, &[v2]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::WrongObjectType);

	// No rows changed: version 1 is still the latest.
	let latest = store.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, v1.header.object_id)).unwrap();
	assert_eq!(latest.header.object_version, 1);
	assert!(latest.header.object_is_latest);
}

#[test]
fn new_tag_supersedes_the_prior_tag() {
	let store = test_store();
	let t1 = sample_tag(ObjectType::Custom).with_attr("state", "draft");
	store.save_new_objects(TENANT, &[t1.clone()]).unwrap();
	sleep(Duration::from_millis(2));

	let mut t2 = next_tag_version(&t1);
	t2.attrs.insert("state".to_string(), "published".into());
	store.save_new_tags(TENANT, &[t2]).unwrap();

	let latest = store.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, t1.header.object_id)).unwrap();
	assert_eq!(latest.header.tag_version, 2);
	assert_eq!(latest.attr("state"), Some(&"published".into()));
	assert!(latest.header.tag_is_latest);

	let first = store
		.load_object(TENANT, &TagSelector::exact(ObjectType::Custom, t1.header.object_id, 1, 1))
		.unwrap();
	assert_eq!(first.attr("state"), Some(&"draft".into()));
	assert!(!first.header.tag_is_latest);
}

#[test]
fn tag_version_gap_is_rejected() {
	let store = test_store();
	let t1 = sample_tag(ObjectType::Custom);
	store.save_new_objects(TENANT, &[t1.clone()]).unwrap();

	let mut t3 = next_tag_version(&t1);
	t3.header.tag_version = 3;
	let err = store.save_new_tags(TENANT, &[t3]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::PriorTagMissing);
}

#[test]
fn load_prior_objects_returns_the_superseded_version() {
	let store = test_store();
	let v1 = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();
	let v2 = next_version_tag(&v1, b"v2".to_vec());
	store.save_new_versions(TENANT, &[v2.clone()]).unwrap();

	let v3_header = v2.next_object_version();
	let prior = store.load_prior_objects(TENANT, &[v3_header]).unwrap();
	assert_eq!(prior.len(), 1);
	assert_eq!(prior[0].header.object_version, 2);

	// A first version has nothing to supersede.
	let err = store.load_prior_objects(TENANT, &[v1.header.clone()]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
}

#[test]
fn load_prior_tags_returns_the_superseded_tag() {
	let store = test_store();
	let t1 = sample_tag(ObjectType::Custom).with_attr("n", 1i64);
	store.save_new_objects(TENANT, &[t1.clone()]).unwrap();
	let t2 = next_tag_version(&t1);
	store.save_new_tags(TENANT, &[t2.clone()]).unwrap();

	let t3_header = t2.next_tag_version();
	let prior = store.load_prior_tags(TENANT, &[t3_header]).unwrap();
	assert_eq!(prior.len(), 1);
	assert_eq!(prior[0].header.tag_version, 2);
}
