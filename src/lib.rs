//! QTL Importer - loads Quantitative Trait Locus tables into a Chado database
//!
//! This library reads QTL tables, validates the genetic map and trait
//! vocabulary they are loaded against, and writes QTL features, their map
//! positions and properties.
//!
//! ## Module Structure
//!
//! - [`importer`] - Argument validation and the import run itself
//! - [`parsers`] - Delimited QTL table reader
//! - [`store`] - Chado tables and the keyed upsert helpers
//! - [`settings`] - Importer settings persistence

pub mod importer;
pub mod parsers;
pub mod settings;
pub mod store;
