//! Loading QTL tables into the store.
//!
//! An [`Importer`] moves through [`ImportState`]: its files are prepared,
//! its arguments validated, then every row is loaded. Any failure along the
//! way is logged and returned as an [`ImportError`].

pub mod qtl;
pub mod types;
pub mod validate;

use std::path::PathBuf;
use thiserror::Error;

use crate::parsers::ParseError;
use crate::store::StoreError;

pub use qtl::QtlImporter;
pub use types::{FieldKind, Form, FormField, ImportArgs, ImportState, ImportSummary, MapRef};
pub use validate::{validate_args, ValidatedArgs};

/// Errors that fail an import run
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No genetic map was specified")]
    MissingMap,

    #[error("No trait vocabulary was specified")]
    MissingTraitVocabulary,

    #[error("Genetic map '{0}' does not exist")]
    UnknownMap(MapRef),

    #[error("Trait vocabulary {0} does not exist")]
    UnknownTraitVocabulary(i64),

    #[error("Genetic map '{0}' is not associated with an organism")]
    MapWithoutOrganism(String),

    #[error("Trait '{name}' is not in trait vocabulary {cv_id}")]
    UnknownTrait { name: String, cv_id: i64 },

    #[error("Files have not been prepared for this import")]
    FilesNotPrepared,

    #[error(transparent)]
    File(#[from] ParseError),

    #[error("Rejected row at line {line}: {reason}")]
    RowRejected { line: u64, reason: String },

    #[error("No usable QTL rows were found in {0}")]
    NoUsableRows(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// An importer that can describe its inputs and load a file
pub trait Importer {
    type Summary;

    /// Describe the arguments this importer takes.
    fn form(&self) -> Result<Form, ImportError>;

    /// Locate and open the input file.
    fn prepare_files(&mut self) -> Result<(), ImportError>;

    /// Check that the arguments resolve to existing records. Writes nothing.
    fn validate(&self) -> Result<ValidatedArgs, ImportError>;

    /// Load the prepared file.
    fn run(&mut self) -> Result<Self::Summary, ImportError>;
}
