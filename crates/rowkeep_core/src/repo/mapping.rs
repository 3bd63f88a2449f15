//! Entity/row mapping contract and lifecycle hooks.
//!
//! # Responsibility
//! - Define the statically-typed conversion between entities and rows.
//! - Define the lifecycle capability set repositories are assembled with.
//!
//! # Invariants
//! - Mappings are pure: `to_row`/`from_row` must not touch the store.
//! - Hooks receive the live connection so cascaded persistence joins the
//!   caller's transaction.

use crate::repo::RepoResult;
use crate::schema::column::{ID_COLUMN, PARENT_ID_COLUMN};
use crate::schema::table::TableSchema;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

/// Statically-typed entity/row conversion, bound at repository
/// construction time.
pub trait EntityMapping {
    type Entity;

    /// Table schema backing this mapping.
    fn table(&self) -> &TableSchema;

    /// Projects one entity into column/value pairs, in schema column order.
    fn to_row(&self, entity: &Self::Entity) -> Vec<(&'static str, Value)>;

    /// Materializes one entity from a fetched row.
    fn from_row(&self, row: &Row<'_>) -> RepoResult<Self::Entity>;

    /// Returns the entity id; `None` before first persist.
    fn id(&self, entity: &Self::Entity) -> Option<i64>;

    /// Writes the store-assigned id back onto a freshly inserted entity.
    fn adopt_id(&self, entity: &mut Self::Entity, id: i64);

    /// Stamps the owning parent key onto a child entity.
    fn set_parent_id(&self, entity: &mut Self::Entity, parent_id: i64);

    fn id_column(&self) -> &'static str {
        ID_COLUMN
    }

    fn parent_id_column(&self) -> &'static str {
        PARENT_ID_COLUMN
    }

    /// Default ORDER BY clause body; `None` keeps storage order.
    fn default_sort(&self) -> Option<&str> {
        None
    }
}

impl<M: EntityMapping> EntityMapping for &M {
    type Entity = M::Entity;

    fn table(&self) -> &TableSchema {
        (**self).table()
    }

    fn to_row(&self, entity: &Self::Entity) -> Vec<(&'static str, Value)> {
        (**self).to_row(entity)
    }

    fn from_row(&self, row: &Row<'_>) -> RepoResult<Self::Entity> {
        (**self).from_row(row)
    }

    fn id(&self, entity: &Self::Entity) -> Option<i64> {
        (**self).id(entity)
    }

    fn adopt_id(&self, entity: &mut Self::Entity, id: i64) {
        (**self).adopt_id(entity, id);
    }

    fn set_parent_id(&self, entity: &mut Self::Entity, parent_id: i64) {
        (**self).set_parent_id(entity, parent_id);
    }

    fn id_column(&self) -> &'static str {
        (**self).id_column()
    }

    fn parent_id_column(&self) -> &'static str {
        (**self).parent_id_column()
    }

    fn default_sort(&self) -> Option<&str> {
        (**self).default_sort()
    }
}

/// Lifecycle capability set, all no-ops by default.
///
/// Concrete repositories are assembled with a hooks value to cascade
/// persistence, loading and removal of child entities. Hook failures
/// abort the surrounding transaction.
#[allow(unused_variables)]
pub trait EntityHooks<T> {
    /// Runs before the entity row is written.
    fn before_store(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        Ok(())
    }

    /// Runs after the entity row is written and its id adopted.
    fn after_store(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        Ok(())
    }

    /// Runs after the entity row is updated.
    fn after_update(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        Ok(())
    }

    /// Runs after the entity is materialized from storage.
    fn after_load(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        Ok(())
    }

    /// Runs after the entity row is deleted.
    ///
    /// `entity` is the pre-deletion snapshot, or `None` when the removal
    /// targeted an id with no matching row.
    fn after_remove(&self, conn: &Connection, entity: Option<&T>) -> RepoResult<()> {
        Ok(())
    }
}

/// Hook set for repositories without cascaded children.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl<T> EntityHooks<T> for NoHooks {}

impl<T, H: EntityHooks<T>> EntityHooks<T> for &H {
    fn before_store(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        (**self).before_store(conn, entity)
    }

    fn after_store(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        (**self).after_store(conn, entity)
    }

    fn after_update(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        (**self).after_update(conn, entity)
    }

    fn after_load(&self, conn: &Connection, entity: &mut T) -> RepoResult<()> {
        (**self).after_load(conn, entity)
    }

    fn after_remove(&self, conn: &Connection, entity: Option<&T>) -> RepoResult<()> {
        (**self).after_remove(conn, entity)
    }
}
