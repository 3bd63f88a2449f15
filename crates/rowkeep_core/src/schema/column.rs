//! Column descriptor metadata.
//!
//! # Responsibility
//! - Declare per-column name, storage type, nullability, uniqueness and
//!   foreign-key references.
//! - Stay a pure data holder; DDL assembly lives in `schema::table`.
//!
//! # Invariants
//! - Exactly one column per table is the id column (by convention `ID`).
//! - Descriptors are immutable once constructed.

/// Conventional name of the id column.
pub const ID_COLUMN: &str = "ID";

/// Conventional name of the parent-id column in hierarchical tables.
pub const PARENT_ID_COLUMN: &str = "PARENT_ID";

/// Storage class tag for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Blob,
}

impl ColumnType {
    /// Returns the type tag emitted into DDL.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Real => "real",
            Self::Blob => "blob",
        }
    }
}

/// Foreign-key target: a column in another table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnReference {
    pub table: &'static str,
    pub column: &'static str,
}

/// Declarative metadata for one persisted column.
///
/// Construction validates nothing beyond the required name and storage
/// type; malformed descriptor sets surface as store-level DDL errors at
/// table-creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: &'static str,
    column_type: ColumnType,
    nullable: Option<bool>,
    unique: bool,
    extra_qualifier: Option<&'static str>,
    reference: Option<ColumnReference>,
}

impl Column {
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: None,
            unique: false,
            extra_qualifier: None,
            reference: None,
        }
    }

    /// Emits an explicit `NULL` constraint for this column.
    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    /// Emits an explicit `NOT NULL` constraint for this column.
    pub fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    /// Adds this column to the table's unique-constraint set.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Appends a free-text DDL qualifier after the constraints.
    pub fn qualifier(mut self, qualifier: &'static str) -> Self {
        self.extra_qualifier = Some(qualifier);
        self
    }

    /// Declares a foreign-key reference to `table(column)`.
    pub fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.reference = Some(ColumnReference { table, column });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// `None` means the nullability constraint is omitted from DDL.
    pub fn is_nullable(&self) -> Option<bool> {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn extra_qualifier(&self) -> Option<&'static str> {
        self.extra_qualifier
    }

    pub fn reference(&self) -> Option<ColumnReference> {
        self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, ColumnType};

    #[test]
    fn new_column_leaves_constraints_unspecified() {
        let column = Column::new("TITLE", ColumnType::Text);
        assert_eq!(column.name(), "TITLE");
        assert_eq!(column.column_type(), ColumnType::Text);
        assert_eq!(column.is_nullable(), None);
        assert!(!column.is_unique());
        assert_eq!(column.extra_qualifier(), None);
        assert!(column.reference().is_none());
    }

    #[test]
    fn builders_set_each_flag() {
        let column = Column::new("PARENT_ID", ColumnType::Integer)
            .not_null()
            .unique()
            .qualifier("DEFAULT 0")
            .references("parents", "ID");
        assert_eq!(column.is_nullable(), Some(false));
        assert!(column.is_unique());
        assert_eq!(column.extra_qualifier(), Some("DEFAULT 0"));
        let reference = column.reference().unwrap();
        assert_eq!(reference.table, "parents");
        assert_eq!(reference.column, "ID");
    }

    #[test]
    fn type_tags_are_lowercase() {
        assert_eq!(ColumnType::Integer.as_sql(), "integer");
        assert_eq!(ColumnType::Text.as_sql(), "text");
        assert_eq!(ColumnType::Real.as_sql(), "real");
        assert_eq!(ColumnType::Blob.as_sql(), "blob");
    }
}
