// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Concurrent writers race at the close-prior-latest step: exactly one
//! append commits and the loser fails deterministically.

use std::thread;

use tagstore_core::{ObjectType, TagSelector};
use tagstore_store::StoreConfig;
use tagstore_testing::{TENANT, next_version_tag, sample_tag, store_with_config};
use tagstore_type::ErrorKind;

#[test]
fn concurrent_version_appends_commit_exactly_once() {
	let dir = tempfile::tempdir().unwrap();
	let store = store_with_config(StoreConfig {
		pool_size: 2,
		..StoreConfig::file(dir.path().join("meta.db"))
	});

	let v1 = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[v1.clone()]).unwrap();

	let results: Vec<_> = thread::scope(|scope| {
		let handles: Vec<_> = (0..2)
			.map(|writer| {
				let store = store.clone();
				let v2 = next_version_tag(&v1, format!("writer-{writer}").into_bytes());
				scope.spawn(move || store.save_new_versions(TENANT, &[v2]))
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	let committed = results.iter().filter(|r| r.is_ok()).count();
	assert_eq!(committed, 1, "exactly one append must commit");
	let lost = results.into_iter().find_map(Result::err).unwrap();
	assert_eq!(lost.kind(), ErrorKind::VersionSuperseded);

	// The loser had no effect: one version 2, flagged latest.
	let latest = store.load_object(TENANT, &TagSelector::latest(ObjectType::Data, v1.header.object_id)).unwrap();
	assert_eq!(latest.header.object_version, 2);
	assert!(latest.header.object_is_latest);
}

#[test]
fn concurrent_tag_appends_commit_exactly_once() {
	let dir = tempfile::tempdir().unwrap();
	let store = store_with_config(StoreConfig {
		pool_size: 2,
		..StoreConfig::file(dir.path().join("meta.db"))
	});

	let t1 = sample_tag(ObjectType::Custom);
	store.save_new_objects(TENANT, &[t1.clone()]).unwrap();

	let results: Vec<_> = thread::scope(|scope| {
		let handles: Vec<_> = (0..2)
			.map(|_| {
				let store = store.clone();
				let t2 = tagstore_testing::next_tag_version(&t1);
				scope.spawn(move || store.save_new_tags(TENANT, &[t2]))
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
	let lost = results.into_iter().find_map(Result::err).unwrap();
	assert_eq!(lost.kind(), ErrorKind::TagSuperseded);
}
