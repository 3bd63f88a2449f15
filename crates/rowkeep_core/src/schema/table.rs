//! Table schema and CREATE TABLE generation.
//!
//! # Responsibility
//! - Hold one table's name plus its ordered column descriptors.
//! - Emit the CREATE TABLE statement and the default upgrade statements.
//!
//! # Invariants
//! - Emission preserves declared column order everywhere (columns,
//!   foreign keys, unique set).
//! - The same descriptor list always yields byte-identical SQL text.

use crate::schema::column::Column;

/// One table's name plus ordered column descriptors.
///
/// Derived data only; nothing here is persisted. Callers must declare at
/// least one unique column (typically the id), otherwise the trailing
/// unique clause degenerates and table creation fails at the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: &'static str,
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: &'static str, columns: Vec<Column>) -> Self {
        Self { name, columns }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns all column names in declared order.
    pub fn projection(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Builds the CREATE TABLE statement for this schema.
    ///
    /// Column fragments keep the historical spacing of the emission rules:
    /// `<name> <type> `, then ` NULL ` / ` NOT NULL ` when nullability is
    /// specified, then ` <qualifier> ` when present. Foreign keys cascade
    /// on delete and the unique set closes the statement with
    /// `ON CONFLICT REPLACE`.
    pub fn create_table_sql(&self) -> String {
        let mut sql = String::new();
        sql.push_str("CREATE TABLE ");
        sql.push_str(self.name);
        sql.push('(');

        for column in &self.columns {
            sql.push_str(column.name());
            sql.push(' ');
            sql.push_str(column.column_type().as_sql());
            sql.push(' ');
            if let Some(nullable) = column.is_nullable() {
                sql.push_str(if nullable { " NULL " } else { " NOT NULL " });
            }
            if let Some(qualifier) = column.extra_qualifier() {
                sql.push(' ');
                sql.push_str(qualifier);
                sql.push(' ');
            }
            sql.push_str(", ");
        }

        for column in &self.columns {
            if let Some(reference) = column.reference() {
                sql.push_str("FOREIGN KEY(");
                sql.push_str(column.name());
                sql.push_str(") REFERENCES ");
                sql.push_str(reference.table);
                sql.push('(');
                sql.push_str(reference.column);
                sql.push_str(") ON DELETE CASCADE, ");
            }
        }

        sql.push_str("UNIQUE (");
        let mut first = true;
        for column in &self.columns {
            if column.is_unique() {
                if !first {
                    sql.push_str(", ");
                }
                first = false;
                sql.push_str(column.name());
            }
        }
        sql.push_str(") ON CONFLICT REPLACE");
        sql.push_str(");");
        sql
    }

    /// Returns the statements run when the schema version changes.
    ///
    /// The default upgrade policy is recreate: the provisioner drops the
    /// table first and these statements rebuild it.
    pub fn upgrade_sql(&self) -> Vec<String> {
        vec![self.create_table_sql()]
    }
}
