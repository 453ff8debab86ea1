// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Save-and-load behavior of the object/tag surface: round trips, selector
//! criteria, order preservation and type checks.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tagstore_core::{ObjectType, Payload, Tag, TagSelector};
use tagstore_testing::{TENANT, sample_tag, test_store};
use tagstore_type::{AttrValue, ErrorKind, TagValue, temporal};
use uuid::Uuid;

#[test]
fn save_and_load_round_trip() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Custom)
		.with_attr("owner", "alice")
		.with_attr("count", 7i64)
		.with_attr("ratio", 0.25f64)
		.with_attr("flag", true);
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let loaded = store
		.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, tag.header.object_id))
		.unwrap();

	assert_eq!(loaded.header.object_id, tag.header.object_id);
	assert_eq!(loaded.header.object_type, ObjectType::Custom);
	assert_eq!(loaded.header.object_version, 1);
	assert_eq!(loaded.header.tag_version, 1);
	assert!(loaded.header.object_is_latest);
	assert!(loaded.header.tag_is_latest);
	assert_eq!(loaded.attrs, tag.attrs);
	assert_eq!(loaded.payload, tag.payload);
}

#[test]
fn payload_bytes_are_preserved_bit_exactly() {
	let store = test_store();
	let bytes = vec![0x0A, 0x04, 0x00, 0xFF, 0x80, 0x7F];
	let mut tag = sample_tag(ObjectType::Data);
	tag.payload = Payload::proto(bytes.clone());
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let loaded = store.load_object(TENANT, &TagSelector::latest(ObjectType::Data, tag.header.object_id)).unwrap();
	assert_eq!(loaded.payload.bytes, bytes);
	assert_eq!(loaded.payload.format, tagstore_core::FORMAT_PROTO);
	assert_eq!(loaded.payload.version, tagstore_core::VERSION_CURRENT);
}

#[test]
fn every_attr_type_round_trips() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Custom)
		.with_attr("bool", AttrValue::Boolean(false))
		.with_attr("int", AttrValue::Integer(-42))
		.with_attr("float", AttrValue::Float(1.5))
		.with_attr("string", AttrValue::from("text"))
		.with_attr("decimal", AttrValue::Decimal("123.456000001".parse::<BigDecimal>().unwrap()))
		.with_attr("date", AttrValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
		.with_attr("datetime", AttrValue::DateTime(temporal::now()));
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let loaded = store
		.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, tag.header.object_id))
		.unwrap();
	assert_eq!(loaded.attrs, tag.attrs);
}

#[test]
fn array_attr_round_trips_in_element_order() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Custom).with_attr(
		"xs",
		TagValue::Array(vec![AttrValue::from("a"), AttrValue::from("b"), AttrValue::from("a")]),
	);
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let loaded = store
		.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, tag.header.object_id))
		.unwrap();
	assert_eq!(
		loaded.attr("xs"),
		Some(&TagValue::Array(vec![AttrValue::from("a"), AttrValue::from("b"), AttrValue::from("a")]))
	);
}

#[test]
fn load_objects_preserves_input_order() {
	let store = test_store();
	let tags: Vec<Tag> = (0..5).map(|_| sample_tag(ObjectType::Data)).collect();
	store.save_new_objects(TENANT, &tags).unwrap();

	// Request in reverse save order; results must align positionally.
	let selectors: Vec<TagSelector> = tags
		.iter()
		.rev()
		.map(|t| TagSelector::latest(ObjectType::Data, t.header.object_id))
		.collect();
	let loaded = store.load_objects(TENANT, &selectors).unwrap();
	assert_eq!(loaded.len(), selectors.len());
	for (loaded, selector) in loaded.iter().zip(&selectors) {
		assert_eq!(loaded.header.object_id, selector.object_id);
	}
}

#[test]
fn explicit_version_selector_matches_latest_for_fresh_objects() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Model);
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let loaded = store
		.load_object(TENANT, &TagSelector::exact(ObjectType::Model, tag.header.object_id, 1, 1))
		.unwrap();
	assert_eq!(loaded.header.object_version, 1);
	assert!(loaded.header.object_is_latest);
}

#[test]
fn missing_object_is_not_found() {
	let store = test_store();
	let err = store.load_object(TENANT, &TagSelector::latest(ObjectType::Data, Uuid::new_v4())).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
}

#[test]
fn missing_version_is_not_found() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let err = store
		.load_object(TENANT, &TagSelector::exact(ObjectType::Data, tag.header.object_id, 5, 1))
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
}

#[test]
fn selector_with_wrong_type_is_rejected() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Custom);
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let err = store.load_object(TENANT, &TagSelector::latest(ObjectType::Data, tag.header.object_id)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::WrongObjectType);

	// Batch path applies the same check.
	let err = store
		.load_objects(TENANT, &[TagSelector::latest(ObjectType::Data, tag.header.object_id)])
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::WrongObjectType);
}

#[test]
fn duplicate_object_id_is_rejected() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let err = store.save_new_objects(TENANT, &[tag]).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::DuplicateObjectId);
}

#[test]
fn unknown_payload_format_fails_to_decode() {
	let store = test_store();
	let mut tag = sample_tag(ObjectType::Custom);
	tag.payload = Payload {
		format: 99,
		version: 1,
		bytes: vec![1, 2, 3],
	};
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let err = store
		.load_object(TENANT, &TagSelector::latest(ObjectType::Custom, tag.header.object_id))
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidObjectDefinition);
}

#[test]
fn batch_load_with_one_unknown_id_fails_whole_batch() {
	let store = test_store();
	let tag = sample_tag(ObjectType::Data);
	store.save_new_objects(TENANT, &[tag.clone()]).unwrap();

	let selectors = vec![
		TagSelector::latest(ObjectType::Data, tag.header.object_id),
		TagSelector::latest(ObjectType::Data, Uuid::new_v4()),
	];
	let err = store.load_objects(TENANT, &selectors).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
}
