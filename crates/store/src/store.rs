// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The metadata store facade: transactional boundary and error surface.
//!
//! Every public operation resolves the tenant, opens one transaction on a
//! pooled connection, prepares the key-mapping scratch when the operation
//! uses it, delegates to the readers/writers, and commits. Any error rolls
//! the transaction back; domain errors pass through unchanged and driver
//! errors are classified at the write sites or wrapped as internal.

use std::{fmt, sync::Arc};

use rusqlite::{Connection, TransactionBehavior, params};
use tagstore_core::{
	BatchUpdate, ConfigEntry, ConfigKey, PreallocatedId, SearchQuery, Tag, TagHeader, TagSelector, TenantInfo,
	VersionCriterion,
};
use tagstore_type::diagnostic::{config_class_not_found, internal, object_not_found, startup};
use tracing::{debug, instrument};

use crate::{
	Dialect, DialectKind, Result, StoreConfig,
	dialect::dialect_for,
	mapping::KeyMapping,
	pool::ConnectionPool,
	read::{BatchReader, SingleReader},
	schema, search,
	tenant::{TenantId, TenantRegistry},
	write::BatchWriter,
};

/// The public entry point of the metadata storage layer.
///
/// Cheap to clone; clones share the connection pool and tenant registry.
#[derive(Clone)]
pub struct MetadataStore {
	config: StoreConfig,
	dialect: Arc<dyn Dialect>,
	pool: ConnectionPool,
	tenants: Arc<TenantRegistry>,
}

impl fmt::Debug for MetadataStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MetadataStore").field("dialect", &self.dialect.kind()).finish_non_exhaustive()
	}
}

impl MetadataStore {
	/// Open the store. The schema must already be deployed (see
	/// [`Self::deploy_schema`] for embedded databases); tenants load on
	/// [`Self::start`].
	pub fn open(config: StoreConfig) -> Result<Self> {
		if config.dialect != DialectKind::Sqlite {
			return Err(startup(format!(
				"dialect {} has no bundled driver; this build executes the SQLITE dialect",
				config.dialect
			)));
		}
		let dialect = dialect_for(config.dialect);
		Self::open_with_dialect(config, dialect)
	}

	/// Open with a caller-supplied dialect implementation. The dialect
	/// must match the database the configured location opens; exists for
	/// embedded variants such as a SQLite dialect that recovers generated
	/// keys by scratch re-lookup.
	pub fn open_with_dialect(config: StoreConfig, dialect: Arc<dyn Dialect>) -> Result<Self> {
		let pool = ConnectionPool::open(&config)?;
		Ok(Self {
			config,
			dialect,
			pool,
			tenants: Arc::new(TenantRegistry::new()),
		})
	}

	/// Load the tenant registry synchronously. Must be called before any
	/// tenant-scoped operation; schema or connectivity problems surface as
	/// `STARTUP`.
	#[instrument(name = "store::start", level = "debug", skip(self))]
	pub fn start(&self) -> Result<()> {
		let conn = self.pool.checkout()?;
		self.tenants
			.load(&conn)
			.map_err(|err| startup(format!("tenant registry failed to load: {err}")))?;
		debug!("metadata store started");
		Ok(())
	}

	/// Release pooled connections. Operations after stop fail on checkout.
	#[instrument(name = "store::stop", level = "debug", skip(self))]
	pub fn stop(&self) {
		self.pool.close();
	}

	/// Deploy the persisted schema on an embedded database.
	pub fn deploy_schema(&self) -> Result<()> {
		let conn = self.pool.checkout()?;
		schema::deploy(&conn, self.dialect.as_ref())
	}

	/// Register a tenant. Administrative: tenant creation is not part of
	/// the metadata write surface.
	#[instrument(name = "store::deploy_tenant", level = "debug", skip(self, description))]
	pub fn deploy_tenant(&self, code: &str, description: &str) -> Result<()> {
		let mut conn = self.pool.checkout()?;
		let tx = conn
			.transaction_with_behavior(TransactionBehavior::Immediate)
			.map_err(|err| internal(format!("cannot begin transaction: {err}")))?;
		let next_id: i64 = tx
			.query_row("SELECT COALESCE(MAX(tenant_id), 0) + 1 FROM tenant", [], |row| row.get(0))
			.map_err(|err| internal(format!("tenant allocation failed: {err}")))?;
		tx.execute(
			"INSERT INTO tenant (tenant_id, tenant_code, description) VALUES (?1, ?2, ?3)",
			params![next_id, code, description],
		)
		.map_err(|err| internal(format!("tenant insert failed: {err}")))?;
		tx.commit().map_err(|err| internal(format!("tenant commit failed: {err}")))?;

		self.tenants.load(&conn)
	}

	/// All registered tenants, ordered by code.
	pub fn list_tenants(&self) -> Result<Vec<TenantInfo>> {
		Ok(self.tenants.list())
	}

	/// Re-read the tenant map. Readers observe the old or new map, never a
	/// mix.
	pub fn refresh_tenants(&self) -> Result<()> {
		let conn = self.pool.checkout()?;
		self.tenants.load(&conn)
	}

	/// Search limit currently in force.
	pub fn search_result_limit(&self) -> usize {
		self.config.search_result_limit
	}

	// --- write surface -------------------------------------------------

	/// Apply a composite update atomically: every sublist in full, or no
	/// effect at all.
	#[instrument(name = "store::save_batch_update", level = "debug", skip(self, batch))]
	pub fn save_batch_update(&self, tenant: &str, batch: &BatchUpdate) -> Result<()> {
		self.write_op(tenant, |writer, tenant_id| {
			if !batch.prealloc_ids.is_empty() {
				writer.save_preallocated_ids(tenant_id, &batch.prealloc_ids)?;
			}
			if !batch.prealloc_objects.is_empty() {
				writer.save_preallocated_objects(tenant_id, &batch.prealloc_objects)?;
			}
			if !batch.new_objects.is_empty() {
				writer.save_new_objects(tenant_id, &batch.new_objects)?;
			}
			if !batch.new_versions.is_empty() {
				writer.save_new_versions(tenant_id, &batch.new_versions)?;
			}
			if !batch.new_tags.is_empty() {
				writer.save_new_tags(tenant_id, &batch.new_tags)?;
			}
			if !batch.config_entries.is_empty() {
				writer.save_config_entries(tenant_id, &batch.config_entries)?;
			}
			Ok(())
		})
	}

	#[instrument(name = "store::save_preallocated_ids", level = "debug", skip(self, ids))]
	pub fn save_preallocated_ids(&self, tenant: &str, ids: &[PreallocatedId]) -> Result<()> {
		self.write_op(tenant, |writer, tenant_id| writer.save_preallocated_ids(tenant_id, ids))
	}

	#[instrument(name = "store::save_preallocated_objects", level = "debug", skip(self, tags))]
	pub fn save_preallocated_objects(&self, tenant: &str, tags: &[Tag]) -> Result<()> {
		self.write_op(tenant, |writer, tenant_id| writer.save_preallocated_objects(tenant_id, tags))
	}

	#[instrument(name = "store::save_new_objects", level = "debug", skip(self, tags))]
	pub fn save_new_objects(&self, tenant: &str, tags: &[Tag]) -> Result<()> {
		self.write_op(tenant, |writer, tenant_id| writer.save_new_objects(tenant_id, tags))
	}

	#[instrument(name = "store::save_new_versions", level = "debug", skip(self, tags))]
	pub fn save_new_versions(&self, tenant: &str, tags: &[Tag]) -> Result<()> {
		self.write_op(tenant, |writer, tenant_id| writer.save_new_versions(tenant_id, tags))
	}

	#[instrument(name = "store::save_new_tags", level = "debug", skip(self, tags))]
	pub fn save_new_tags(&self, tenant: &str, tags: &[Tag]) -> Result<()> {
		self.write_op(tenant, |writer, tenant_id| writer.save_new_tags(tenant_id, tags))
	}

	#[instrument(name = "store::save_config_entries", level = "debug", skip(self, entries))]
	pub fn save_config_entries(&self, tenant: &str, entries: &[ConfigEntry]) -> Result<()> {
		self.write_op(tenant, |writer, tenant_id| writer.save_config_entries(tenant_id, entries))
	}

	// --- read surface --------------------------------------------------

	/// Load one tag through the low-latency single-item path.
	#[instrument(name = "store::load_object", level = "debug", skip(self, selector))]
	pub fn load_object(&self, tenant: &str, selector: &TagSelector) -> Result<Tag> {
		self.read_op(tenant, |conn, tenant_id| SingleReader::new(conn).read_tag(tenant_id, selector))
	}

	/// Load a batch of tags, positionally aligned with the selectors.
	#[instrument(name = "store::load_objects", level = "debug", skip(self, selectors), fields(count = selectors.len()))]
	pub fn load_objects(&self, tenant: &str, selectors: &[TagSelector]) -> Result<Vec<Tag>> {
		self.read_op_with_mapping(tenant, |conn, mapping, tenant_id| {
			BatchReader::new(conn, mapping).read_tags_for_selectors(tenant_id, selectors)
		})
	}

	/// For each header of a version about to be written, load the object
	/// version it supersedes, with that version's latest tag.
	#[instrument(name = "store::load_prior_objects", level = "debug", skip(self, headers), fields(count = headers.len()))]
	pub fn load_prior_objects(&self, tenant: &str, headers: &[TagHeader]) -> Result<Vec<Tag>> {
		let selectors = headers
			.iter()
			.map(|header| {
				if header.object_version < 2 {
					return Err(object_not_found(format!(
						"object {} version 1 has no prior version",
						header.object_id
					)));
				}
				Ok(TagSelector::new(
					header.object_type,
					header.object_id,
					VersionCriterion::Version(header.object_version - 1),
					VersionCriterion::Latest,
				))
			})
			.collect::<Result<Vec<_>>>()?;
		self.load_objects(tenant, &selectors)
	}

	/// For each header of a tag about to be written, load the tag it
	/// supersedes.
	#[instrument(name = "store::load_prior_tags", level = "debug", skip(self, headers), fields(count = headers.len()))]
	pub fn load_prior_tags(&self, tenant: &str, headers: &[TagHeader]) -> Result<Vec<Tag>> {
		let selectors = headers
			.iter()
			.map(|header| {
				if header.tag_version < 2 {
					return Err(object_not_found(format!(
						"object {} tag version 1 has no prior tag",
						header.object_id
					)));
				}
				Ok(TagSelector::new(
					header.object_type,
					header.object_id,
					VersionCriterion::Version(header.object_version),
					VersionCriterion::Version(header.tag_version - 1),
				))
			})
			.collect::<Result<Vec<_>>>()?;
		self.load_objects(tenant, &selectors)
	}

	/// Execute an externally built search and materialize the matched tags.
	/// Results are capped at the configured limit and carry no defined
	/// order beyond what the query produces.
	#[instrument(name = "store::search", level = "debug", skip(self, query))]
	pub fn search(&self, tenant: &str, query: &SearchQuery) -> Result<Vec<Tag>> {
		let limit = self.config.search_result_limit;
		self.read_op_with_mapping(tenant, |conn, mapping, tenant_id| {
			let pks = search::execute_search(conn, tenant_id, &query.sql, &query.params, limit)?;
			BatchReader::new(conn, mapping).read_tags_by_pk(tenant_id, &pks)
		})
	}

	/// Load one config entry.
	#[instrument(name = "store::load_config_entry", level = "debug", skip(self, key))]
	pub fn load_config_entry(&self, tenant: &str, key: &ConfigKey, include_deleted: bool) -> Result<ConfigEntry> {
		self.read_op(tenant, |conn, tenant_id| {
			SingleReader::new(conn).read_config_entry(tenant_id, key, include_deleted).map(|(_, entry)| entry)
		})
	}

	/// Load a batch of config entries, positionally aligned with the keys.
	#[instrument(name = "store::load_config_entries", level = "debug", skip(self, keys), fields(count = keys.len()))]
	pub fn load_config_entries(&self, tenant: &str, keys: &[ConfigKey], include_deleted: bool) -> Result<Vec<ConfigEntry>> {
		self.read_op_with_mapping(tenant, |conn, mapping, tenant_id| {
			let single = SingleReader::new(conn);
			let mut pks = Vec::with_capacity(keys.len());
			for key in keys {
				let (pk, _) = single.read_config_entry(tenant_id, key, include_deleted)?;
				pks.push(pk);
			}
			BatchReader::new(conn, mapping).read_config_entries_by_pk(tenant_id, &pks)
		})
	}

	/// All latest config entries of a class, alphabetical by key. A class
	/// with no entries at all is an error; a class whose keys are all
	/// delete markers lists empty unless deleted entries are requested.
	#[instrument(name = "store::list_config_entries", level = "debug", skip(self))]
	pub fn list_config_entries(&self, tenant: &str, config_class: &str, include_deleted: bool) -> Result<Vec<ConfigEntry>> {
		self.read_op_with_mapping(tenant, |conn, mapping, tenant_id| {
			let pks = search::search_config_keys(conn, tenant_id, config_class, include_deleted)?;
			if pks.is_empty() && !search::config_class_exists(conn, tenant_id, config_class)? {
				return Err(config_class_not_found(config_class));
			}
			BatchReader::new(conn, mapping).read_config_entries_by_pk(tenant_id, &pks)
		})
	}

	// --- transaction plumbing ------------------------------------------

	fn write_op<T>(&self, tenant: &str, f: impl FnOnce(&BatchWriter<'_>, TenantId) -> Result<T>) -> Result<T> {
		let tenant_id = self.tenants.tenant_id(tenant)?;
		let mut conn = self.pool.checkout()?;
		let tx = conn
			.transaction_with_behavior(TransactionBehavior::Immediate)
			.map_err(|err| internal(format!("cannot begin transaction: {err}")))?;

		let result = {
			prepare_mapping(&tx, self.dialect.as_ref())?;
			let mapping = KeyMapping::new(&tx, self.dialect.as_ref());
			let writer = BatchWriter::new(&tx, self.dialect.as_ref(), &mapping);
			f(&writer, tenant_id)
		};

		finish(tx, result)
	}

	fn read_op<T>(&self, tenant: &str, f: impl FnOnce(&Connection, TenantId) -> Result<T>) -> Result<T> {
		let tenant_id = self.tenants.tenant_id(tenant)?;
		let mut conn = self.pool.checkout()?;
		let tx = conn
			.transaction_with_behavior(TransactionBehavior::Deferred)
			.map_err(|err| internal(format!("cannot begin transaction: {err}")))?;

		let result = f(&tx, tenant_id);
		finish(tx, result)
	}

	fn read_op_with_mapping<T>(
		&self,
		tenant: &str,
		f: impl FnOnce(&Connection, &KeyMapping<'_>, TenantId) -> Result<T>,
	) -> Result<T> {
		let tenant_id = self.tenants.tenant_id(tenant)?;
		let mut conn = self.pool.checkout()?;
		let tx = conn
			.transaction_with_behavior(TransactionBehavior::Deferred)
			.map_err(|err| internal(format!("cannot begin transaction: {err}")))?;

		let result = {
			prepare_mapping(&tx, self.dialect.as_ref())?;
			let mapping = KeyMapping::new(&tx, self.dialect.as_ref());
			f(&tx, &mapping, tenant_id)
		};

		finish(tx, result)
	}
}

/// Drop and recreate the scratch relation for this transaction.
fn prepare_mapping(conn: &Connection, dialect: &dyn Dialect) -> Result<()> {
	for statement in dialect.prepare_mapping_sql() {
		conn.execute(&statement, [])
			.map_err(|err| internal(format!("cannot prepare key-mapping relation: {err}")))?;
	}
	Ok(())
}

/// Commit on success, roll back on any error.
fn finish<T>(tx: rusqlite::Transaction<'_>, result: Result<T>) -> Result<T> {
	match result {
		Ok(value) => {
			tx.commit().map_err(|err| internal(format!("commit failed: {err}")))?;
			Ok(value)
		}
		Err(err) => {
			if let Err(rollback) = tx.rollback() {
				debug!(error = %rollback, "rollback after failed operation also failed");
			}
			Err(err)
		}
	}
}
