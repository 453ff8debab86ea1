// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use serde::{Deserialize, Serialize};

/// Administrative description of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantInfo {
	pub code: String,
	pub description: String,
}

impl TenantInfo {
	pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			description: description.into(),
		}
	}
}
