// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Tenant code resolution.
//!
//! The full `code -> tenant_id` map is loaded synchronously at startup and
//! kept in memory; every public operation resolves its tenant here before
//! touching tenant-scoped rows. Refresh swaps the whole map under a short
//! critical section so readers observe either the old or the new map, never
//! a mix.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use rusqlite::Connection;
use tagstore_core::TenantInfo;
use tagstore_type::diagnostic::{internal, tenant_not_found};
use tracing::debug;

use crate::Result;

pub(crate) type TenantId = i16;

#[derive(Debug, Default)]
pub(crate) struct TenantRegistry {
	tenants: RwLock<Arc<HashMap<String, TenantId>>>,
	infos: RwLock<Arc<Vec<TenantInfo>>>,
}

impl TenantRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Load the full tenant map. Called synchronously at startup and again
	/// on refresh; the previous map stays visible until the new one is
	/// complete.
	pub fn load(&self, conn: &Connection) -> Result<()> {
		let mut statement = conn
			.prepare("SELECT tenant_id, tenant_code, description FROM tenant ORDER BY tenant_code")
			.map_err(|err| internal(format!("tenant load failed: {err}")))?;

		let mut map = HashMap::new();
		let mut infos = Vec::new();
		let rows = statement
			.query_map([], |row| {
				Ok((row.get::<_, TenantId>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
			})
			.map_err(|err| internal(format!("tenant load failed: {err}")))?;
		for row in rows {
			let (tenant_id, code, description) =
				row.map_err(|err| internal(format!("tenant load failed: {err}")))?;
			map.insert(code.clone(), tenant_id);
			infos.push(TenantInfo::new(code, description));
		}
		debug!(tenants = infos.len(), "tenant registry loaded");

		*self.tenants.write() = Arc::new(map);
		*self.infos.write() = Arc::new(infos);
		Ok(())
	}

	/// Numeric tenant id for a tenant code.
	pub fn tenant_id(&self, code: &str) -> Result<TenantId> {
		self.tenants.read().get(code).copied().ok_or_else(|| tenant_not_found(code))
	}

	/// All registered tenants, ordered by code.
	pub fn list(&self) -> Vec<TenantInfo> {
		self.infos.read().as_ref().clone()
	}
}
