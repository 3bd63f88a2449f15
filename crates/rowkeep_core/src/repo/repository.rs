//! Generic CRUD engine over one schema-backed table.
//!
//! # Responsibility
//! - Execute point lookups, filtered scans, inserts, updates and deletes
//!   through one entity mapping.
//! - Fire lifecycle hooks so assembled repositories can cascade to child
//!   tables.
//! - Provide the atomic bulk-replace and child-replacement operations.
//!
//! # Invariants
//! - Every write wraps its work in a `TxnScope`; nested repository calls
//!   share the outermost physical transaction.
//! - The only caller-owned state the engine mutates is the entity id,
//!   adopted on first insert.

use crate::repo::mapping::{EntityHooks, EntityMapping, NoHooks};
use crate::repo::txn::TxnScope;
use crate::repo::{RepoError, RepoResult};
use log::trace;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// SQLite-backed repository for one entity type.
///
/// Assembled from a connection, a mapping and an optional hook set;
/// cheap to construct, so cascading hooks typically build one on the fly
/// for the child table.
pub struct SqliteRepository<'conn, M, H = NoHooks>
where
    M: EntityMapping,
    H: EntityHooks<M::Entity>,
{
    conn: &'conn Connection,
    mapping: M,
    hooks: H,
}

impl<'conn, M> SqliteRepository<'conn, M, NoHooks>
where
    M: EntityMapping,
{
    pub fn new(conn: &'conn Connection, mapping: M) -> Self {
        Self::with_hooks(conn, mapping, NoHooks)
    }
}

impl<'conn, M, H> SqliteRepository<'conn, M, H>
where
    M: EntityMapping,
    H: EntityHooks<M::Entity>,
{
    pub fn with_hooks(conn: &'conn Connection, mapping: M, hooks: H) -> Self {
        Self {
            conn,
            mapping,
            hooks,
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.mapping.table().name()
    }

    /// Create statement handed to the schema owner at provisioning time.
    pub fn create_table_sql(&self) -> String {
        self.mapping.table().create_table_sql()
    }

    /// Upgrade statements handed to the schema owner on version change.
    pub fn upgrade_sql(&self) -> Vec<String> {
        self.mapping.table().upgrade_sql()
    }

    /// Point lookup by id. Runs the load hook on hit.
    pub fn get(&self, id: i64) -> RepoResult<Option<M::Entity>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1;",
            self.projection_sql(),
            self.table_name(),
            self.mapping.id_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut entity = self.mapping.from_row(row)?;
            self.hooks.after_load(self.conn, &mut entity)?;
            trace!(
                "event=entity_get module=repo table={} id={id} hit=true",
                self.table_name()
            );
            return Ok(Some(entity));
        }
        trace!(
            "event=entity_get module=repo table={} id={id} hit=false",
            self.table_name()
        );
        Ok(None)
    }

    /// Filtered scan: `field IN (values…)` when both are present,
    /// unconditional otherwise. Applies the mapping's default sort and
    /// runs the load hook per row. The result is fully materialized.
    pub fn find_by_field(
        &self,
        field: Option<&str>,
        values: &[Value],
    ) -> RepoResult<Vec<M::Entity>> {
        let mut sql = format!("SELECT {} FROM {}", self.projection_sql(), self.table_name());
        let mut bind_values: Vec<Value> = Vec::new();

        let predicate_field = match field {
            Some(name) if !name.is_empty() && !values.is_empty() => Some(name),
            _ => None,
        };
        if let Some(name) = predicate_field {
            sql.push_str(" WHERE ");
            sql.push_str(name);
            sql.push_str(" IN (");
            for index in 0..values.len() {
                if index > 0 {
                    sql.push(',');
                }
                sql.push('?');
            }
            sql.push(')');
            bind_values.extend(values.iter().cloned());
        }

        if let Some(sort) = self.mapping.default_sort() {
            sql.push_str(" ORDER BY ");
            sql.push_str(sort);
        }
        sql.push(';');

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            let mut entity = self.mapping.from_row(row)?;
            self.hooks.after_load(self.conn, &mut entity)?;
            entities.push(entity);
        }
        trace!(
            "event=entity_find module=repo table={} field={} rows={}",
            self.table_name(),
            predicate_field.unwrap_or("<all>"),
            entities.len()
        );
        Ok(entities)
    }

    pub fn get_all(&self) -> RepoResult<Vec<M::Entity>> {
        self.find_by_field(None, &[])
    }

    /// Lookup by id list. An empty list degenerates to a full scan.
    pub fn get_all_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<M::Entity>> {
        let values: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
        self.find_by_field(Some(self.mapping.id_column()), &values)
    }

    pub fn size(&self) -> RepoResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {};", self.table_name());
        let count = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.size()? == 0)
    }

    /// Inserts one entity.
    ///
    /// When the entity's id is unset the store-assigned id is adopted
    /// back onto it; this is the only repository-initiated mutation of
    /// caller state. Unique conflicts on a non-replacing path surface as
    /// `RepoError::UniqueViolation`; the declared `ON CONFLICT REPLACE`
    /// set replaces silently instead.
    pub fn add(&self, entity: &mut M::Entity) -> RepoResult<()> {
        let scope = TxnScope::begin_if_needed(self.conn)?;
        self.hooks.before_store(self.conn, entity)?;

        let row = self.mapping.to_row(entity);
        let mut columns = String::new();
        let mut placeholders = String::new();
        for (index, (name, _)) in row.iter().enumerate() {
            if index > 0 {
                columns.push_str(", ");
                placeholders.push_str(", ");
            }
            columns.push_str(name);
            placeholders.push('?');
        }
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders});",
            self.table_name()
        );
        let values: Vec<Value> = row.into_iter().map(|(_, value)| value).collect();
        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(|err| RepoError::from_write(self.table_name(), err))?;

        if self.mapping.id(entity).is_none() {
            self.mapping.adopt_id(entity, self.conn.last_insert_rowid());
        }
        self.hooks.after_store(self.conn, entity)?;
        trace!(
            "event=entity_add module=repo table={} id={:?}",
            self.table_name(),
            self.mapping.id(entity)
        );
        scope.commit_if_owned()
    }

    /// Inserts every entity inside one shared transaction; a failure
    /// anywhere rolls back the whole batch.
    pub fn add_all(&self, entities: &mut [M::Entity]) -> RepoResult<()> {
        let scope = TxnScope::begin_if_needed(self.conn)?;
        for entity in entities.iter_mut() {
            self.add(entity)?;
        }
        trace!(
            "event=entity_add_all module=repo table={} count={}",
            self.table_name(),
            entities.len()
        );
        scope.commit_if_owned()
    }

    /// Updates the row matching the entity's id, then runs the update
    /// hook. An id-less entity is rejected; a missing row updates
    /// nothing but still fires the hook.
    pub fn update(&self, entity: &mut M::Entity) -> RepoResult<()> {
        let id = self.mapping.id(entity).ok_or(RepoError::MissingId {
            table: self.table_name(),
        })?;
        let scope = TxnScope::begin_if_needed(self.conn)?;

        let row = self.mapping.to_row(entity);
        let mut assignments = String::new();
        for (index, (name, _)) in row.iter().enumerate() {
            if index > 0 {
                assignments.push_str(", ");
            }
            assignments.push_str(name);
            assignments.push_str(" = ?");
            assignments.push_str(&(index + 1).to_string());
        }
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?{};",
            self.table_name(),
            self.mapping.id_column(),
            row.len() + 1
        );
        let mut values: Vec<Value> = row.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Integer(id));
        let changed = self
            .conn
            .execute(&sql, params_from_iter(values))
            .map_err(|err| RepoError::from_write(self.table_name(), err))?;

        self.hooks.after_update(self.conn, entity)?;
        trace!(
            "event=entity_update module=repo table={} id={id} rows={changed}",
            self.table_name()
        );
        scope.commit_if_owned()
    }

    /// Replaces the full table content with the given entities,
    /// atomically. The intermediate empty state is never observable
    /// outside the transaction.
    pub fn replace_all(&self, entities: &mut [M::Entity]) -> RepoResult<()> {
        let scope = TxnScope::begin_if_needed(self.conn)?;
        self.remove_all()?;
        for entity in entities.iter_mut() {
            self.add(entity)?;
        }
        trace!(
            "event=entity_replace_all module=repo table={} count={}",
            self.table_name(),
            entities.len()
        );
        scope.commit_if_owned()
    }

    pub fn remove(&self, entity: &M::Entity) -> RepoResult<()> {
        let id = self.mapping.id(entity).ok_or(RepoError::MissingId {
            table: self.table_name(),
        })?;
        self.remove_by_id(id)
    }

    /// Deletes the row with the given id and runs the remove hook with
    /// the pre-deletion snapshot. A missing row is a no-op, but the hook
    /// still fires with no snapshot.
    pub fn remove_by_id(&self, id: i64) -> RepoResult<()> {
        let scope = TxnScope::begin_if_needed(self.conn)?;
        let pre_image = self.get(id)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1;",
            self.table_name(),
            self.mapping.id_column()
        );
        self.conn.execute(&sql, [id])?;
        self.hooks.after_remove(self.conn, pre_image.as_ref())?;
        trace!(
            "event=entity_remove module=repo table={} id={id} existed={}",
            self.table_name(),
            pre_image.is_some()
        );
        scope.commit_if_owned()
    }

    /// Deletes every row, firing the remove hook once per removed
    /// entity.
    pub fn remove_all(&self) -> RepoResult<()> {
        let scope = TxnScope::begin_if_needed(self.conn)?;
        let all = self.get_all()?;
        let sql = format!("DELETE FROM {};", self.table_name());
        self.conn.execute(&sql, [])?;
        for entity in &all {
            self.hooks.after_remove(self.conn, Some(entity))?;
        }
        trace!(
            "event=entity_remove_all module=repo table={} rows={}",
            self.table_name(),
            all.len()
        );
        scope.commit_if_owned()
    }

    /// Removes the given entities inside one shared transaction.
    pub fn remove_entities(&self, entities: &[M::Entity]) -> RepoResult<()> {
        let scope = TxnScope::begin_if_needed(self.conn)?;
        for entity in entities {
            self.remove(entity)?;
        }
        scope.commit_if_owned()
    }

    /// Returns the sole row of a singleton table, `None` when empty.
    ///
    /// With more than one row an arbitrary one is returned; keeping the
    /// table at one row is the caller's contract.
    pub fn get_unique_instance(&self) -> RepoResult<Option<M::Entity>> {
        Ok(self.get_all()?.into_iter().next())
    }

    /// Atomically swaps the full child set of one parent key.
    ///
    /// Every supplied child is stamped with `parent_id` first; inside
    /// one transaction the existing children are deleted and the new set
    /// inserted, so after success the persisted set equals exactly the
    /// supplied one.
    pub fn replace_children(
        &self,
        children: &mut [M::Entity],
        parent_id: i64,
    ) -> RepoResult<()> {
        for child in children.iter_mut() {
            self.mapping.set_parent_id(child, parent_id);
        }
        let scope = TxnScope::begin_if_needed(self.conn)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1;",
            self.table_name(),
            self.mapping.parent_id_column()
        );
        self.conn.execute(&sql, [parent_id])?;
        self.add_all(children)?;
        trace!(
            "event=children_replace module=repo table={} parent_id={parent_id} count={}",
            self.table_name(),
            children.len()
        );
        scope.commit_if_owned()
    }

    fn projection_sql(&self) -> String {
        self.mapping.table().projection().join(", ")
    }
}
