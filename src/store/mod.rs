//! Chado-style relational store used by the importer.
//!
//! - [`schema`] - the closed set of tables and columns the importer may touch
//! - [`types`] - lookup/insert value sets, including nested references
//! - [`upsert`] - keyed lookup-or-insert and property upserts

pub mod schema;
pub mod types;
pub mod upsert;

use thiserror::Error;

pub use schema::Table;
pub use types::{FieldValue, Record};
pub use upsert::{
    clear_feature_property, clear_featurepos_property, ensure_term, lookup_id, save_datapoint,
    save_feature_property, save_featurepos_property,
};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while resolving, looking up or writing records
#[derive(Debug, Error)]
pub enum StoreError {
    /// A value set named a column the table does not have
    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn { table: Table, column: String },

    /// A nested record was given for a column that is not a foreign key
    #[error("Column '{table}.{column}' does not reference another table")]
    NotAReference { table: Table, column: String },

    /// A nested record did not match any row of the referenced table
    #[error("Nested value for '{table}.{column}' does not match an existing record")]
    UnresolvedReference { table: Table, column: String },

    /// The lookup values identify more than one row
    #[error("Lookup values match more than one row in '{table}'")]
    AmbiguousMatch { table: Table },

    /// A lookup was attempted without any values to match on
    #[error("Lookup against '{table}' needs at least one value")]
    EmptyLookup { table: Table },

    /// The underlying database rejected a statement
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}
