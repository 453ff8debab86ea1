// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Write paths. All writers run inside a transaction opened by the facade;
//! the five save primitives and the config-entry writer are distinct
//! operations with distinct error taxonomies and are never merged into a
//! generic upsert.

pub(crate) use batch::BatchWriter;

mod batch;
