//! Explicit repository registry.
//!
//! # Responsibility
//! - Resolve the repository for an entity type for the child-replacement
//!   convenience path.
//! - Collect every registered table schema for database provisioning.
//!
//! # Invariants
//! - One registration per entity type.
//! - The registry is an explicit value passed by the caller, never
//!   process-global state.

use crate::db::DatabaseSchema;
use crate::repo::mapping::{EntityHooks, EntityMapping};
use crate::repo::repository::SqliteRepository;
use crate::repo::{RepoError, RepoResult};
use crate::schema::table::TableSchema;
use rusqlite::Connection;
use std::any::{type_name, Any, TypeId};
use std::collections::BTreeMap;

trait ChildReplacer<T> {
    fn replace_children(
        &self,
        conn: &Connection,
        children: &mut [T],
        parent_id: i64,
    ) -> RepoResult<()>;
}

struct Registered<M, H> {
    mapping: M,
    hooks: H,
}

impl<M, H> ChildReplacer<M::Entity> for Registered<M, H>
where
    M: EntityMapping,
    H: EntityHooks<M::Entity>,
{
    fn replace_children(
        &self,
        conn: &Connection,
        children: &mut [M::Entity],
        parent_id: i64,
    ) -> RepoResult<()> {
        SqliteRepository::with_hooks(conn, &self.mapping, &self.hooks)
            .replace_children(children, parent_id)
    }
}

struct RegistryEntry {
    entity: &'static str,
    table: TableSchema,
    replacer: Box<dyn Any>,
}

/// Maps entity types to their registered mapping and hook set.
#[derive(Default)]
pub struct RepositoryRegistry {
    entries: BTreeMap<TypeId, RegistryEntry>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the mapping and hooks for one entity type.
    pub fn register<M, H>(&mut self, mapping: M, hooks: H) -> RepoResult<()>
    where
        M: EntityMapping + 'static,
        M::Entity: 'static,
        H: EntityHooks<M::Entity> + 'static,
    {
        let key = TypeId::of::<M::Entity>();
        if self.entries.contains_key(&key) {
            return Err(RepoError::DuplicateRepository {
                entity: type_name::<M::Entity>(),
            });
        }
        let table = mapping.table().clone();
        let replacer: Box<dyn ChildReplacer<M::Entity>> = Box::new(Registered { mapping, hooks });
        self.entries.insert(
            key,
            RegistryEntry {
                entity: type_name::<M::Entity>(),
                table,
                replacer: Box::new(replacer),
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the registered entity type names, sorted by key.
    pub fn entity_names(&self) -> Vec<&'static str> {
        self.entries.values().map(|entry| entry.entity).collect()
    }

    /// Builds the versioned schema set from every registered table.
    pub fn collect_schema(&self, version: u32) -> DatabaseSchema {
        let mut schema = DatabaseSchema::new(version);
        for entry in self.entries.values() {
            schema.add_table(entry.table.clone());
        }
        schema
    }

    /// Child-replacement convenience path: resolves the repository for
    /// the entity type, then delegates.
    pub fn replace_children<T: 'static>(
        &self,
        conn: &Connection,
        children: &mut [T],
        parent_id: i64,
    ) -> RepoResult<()> {
        let entry = self
            .entries
            .get(&TypeId::of::<T>())
            .ok_or(RepoError::NoRepository {
                entity: type_name::<T>(),
            })?;
        let replacer = entry
            .replacer
            .downcast_ref::<Box<dyn ChildReplacer<T>>>()
            .ok_or(RepoError::NoRepository {
                entity: type_name::<T>(),
            })?;
        replacer.replace_children(conn, children, parent_id)
    }
}
