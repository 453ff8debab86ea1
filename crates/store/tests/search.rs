// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Search execution: a pre-built query yields tag primary keys, the store
//! materializes full tags and caps the result set.

use tagstore_core::{ObjectType, SearchQuery};
use tagstore_store::StoreConfig;
use tagstore_testing::{OTHER_TENANT, TENANT, sample_tag, store_with_config, test_store};
use tagstore_type::AttrValue;

/// The external query builder's contract: select tag primary keys, with the
/// first parameter reserved for the tenant id.
fn owner_query(owner: &str) -> SearchQuery {
	SearchQuery::new(
		"SELECT t.tag_pk FROM tag t \
		JOIN tag_attr a ON a.tag_fk = t.tag_pk AND a.tenant_id = t.tenant_id \
		WHERE t.tenant_id = ?1 AND t.tag_is_latest = 1 \
		AND a.attr_name = 'owner' AND a.attr_value_string = ?2 \
		ORDER BY t.tag_pk",
		vec![AttrValue::from(owner)],
	)
}

#[test]
fn search_materializes_matching_tags() {
	let store = test_store();
	let alice = sample_tag(ObjectType::Data).with_attr("owner", "alice");
	let bob = sample_tag(ObjectType::Data).with_attr("owner", "bob");
	store.save_new_objects(TENANT, &[alice.clone(), bob]).unwrap();

	let results = store.search(TENANT, &owner_query("alice")).unwrap();
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].header.object_id, alice.header.object_id);
	assert_eq!(results[0].attr("owner"), Some(&"alice".into()));
}

#[test]
fn search_is_tenant_scoped() {
	let store = test_store();
	let mine = sample_tag(ObjectType::Data).with_attr("owner", "alice");
	let theirs = sample_tag(ObjectType::Data).with_attr("owner", "alice");
	store.save_new_objects(TENANT, &[mine.clone()]).unwrap();
	store.save_new_objects(OTHER_TENANT, &[theirs]).unwrap();

	let results = store.search(TENANT, &owner_query("alice")).unwrap();
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].header.object_id, mine.header.object_id);
}

#[test]
fn search_caps_results_at_the_configured_limit() {
	let store = test_store();
	let tags: Vec<_> = (0..7).map(|_| sample_tag(ObjectType::Data).with_attr("owner", "alice")).collect();
	store.save_new_objects(TENANT, &tags).unwrap();

	assert_eq!(store.search_result_limit(), 100);
	let results = store.search(TENANT, &owner_query("alice")).unwrap();
	assert_eq!(results.len(), 7);

	let capped = store_with_config(StoreConfig {
		search_result_limit: 3,
		..StoreConfig::in_memory()
	});
	capped.save_new_objects(TENANT, &tags).unwrap();
	let results = capped.search(TENANT, &owner_query("alice")).unwrap();
	assert_eq!(results.len(), 3);
}

#[test]
fn empty_search_returns_no_tags() {
	let store = test_store();
	let results = store.search(TENANT, &owner_query("nobody")).unwrap();
	assert!(results.is_empty());
}
