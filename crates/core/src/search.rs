// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};
use tagstore_type::AttrValue;

/// A pre-built tag search issued by an external query builder.
///
/// The SQL text selects tag primary keys. The first parameter slot is
/// reserved for the numeric tenant id and bound by the executor, which keeps
/// every search tenant-scoped; `params` bind after it in order. The storage
/// layer executes the query verbatim and materializes the matched tags, so
/// the builder owns the shape of the projection but never pagination: the
/// result cap is applied by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
	pub sql: String,
	pub params: Vec<AttrValue>,
}

impl SearchQuery {
	pub fn new(sql: impl Into<String>, params: Vec<AttrValue>) -> Self {
		Self {
			sql: sql.into(),
			params,
		}
	}
}
