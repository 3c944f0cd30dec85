//! Table definitions for the subset of Chado the importer writes to.
//!
//! Every table and column name that ends up in SQL comes from this module,
//! never from caller-supplied strings.

use rusqlite::Connection;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Vocabulary holding the feature types the importer creates
pub const SEQUENCE_CV: &str = "sequence";

/// Feature type of an imported QTL
pub const QTL_TYPE: &str = "QTL";

/// Feature type of the map feature a QTL is positioned on
pub const LINKAGE_GROUP_TYPE: &str = "linkage_group";

/// Terms a Chado instance ships with that the importer relies on
const CORE_TERMS: &[(&str, &str)] = &[(SEQUENCE_CV, QTL_TYPE), (SEQUENCE_CV, LINKAGE_GROUP_TYPE)];

/// Tables the importer knows about
#[derive(AsRefStr, Clone, Copy, Debug, Display, EnumIter, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Organism,
    Cv,
    Cvterm,
    Feature,
    Featuremap,
    FeaturemapOrganism,
    Featurepos,
    Featureposprop,
    Featureprop,
    FeatureCvterm,
}

impl Table {
    /// Name of the integer primary key column
    pub fn id_column(&self) -> &'static str {
        match self {
            Table::Organism => "organism_id",
            Table::Cv => "cv_id",
            Table::Cvterm => "cvterm_id",
            Table::Feature => "feature_id",
            Table::Featuremap => "featuremap_id",
            Table::FeaturemapOrganism => "featuremap_organism_id",
            Table::Featurepos => "featurepos_id",
            Table::Featureposprop => "featureposprop_id",
            Table::Featureprop => "featureprop_id",
            Table::FeatureCvterm => "feature_cvterm_id",
        }
    }

    /// Data columns, excluding the primary key
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Organism => &["genus", "species", "common_name", "abbreviation"],
            Table::Cv => &["name", "definition"],
            Table::Cvterm => &["cv_id", "name", "definition"],
            Table::Feature => &["organism_id", "name", "uniquename", "type_id"],
            Table::Featuremap => &["name", "description", "unittype_id"],
            Table::FeaturemapOrganism => &["featuremap_id", "organism_id"],
            Table::Featurepos => &["featuremap_id", "feature_id", "map_feature_id", "mappos"],
            Table::Featureposprop => &["featurepos_id", "type_id", "value", "rank"],
            Table::Featureprop => &["feature_id", "type_id", "value", "rank"],
            Table::FeatureCvterm => &["feature_id", "cvterm_id"],
        }
    }

    /// Columns that identify a row independently of its primary key
    pub fn natural_key(&self) -> &'static [&'static str] {
        match self {
            Table::Organism => &["genus", "species"],
            Table::Cv => &["name"],
            Table::Cvterm => &["cv_id", "name"],
            Table::Feature => &["organism_id", "uniquename", "type_id"],
            Table::Featuremap => &["name"],
            Table::FeaturemapOrganism => &["featuremap_id", "organism_id"],
            Table::Featurepos => &["featuremap_id", "feature_id"],
            Table::Featureposprop => &["featurepos_id", "type_id", "rank"],
            Table::Featureprop => &["feature_id", "type_id", "rank"],
            Table::FeatureCvterm => &["feature_id", "cvterm_id"],
        }
    }

    /// Returns the static column name if the table has this column
    pub fn column(&self, name: &str) -> Option<&'static str> {
        if name == self.id_column() {
            return Some(self.id_column());
        }
        self.columns().iter().copied().find(|c| *c == name)
    }

    /// Table referenced by a foreign key column, if the column is one
    pub fn references(&self, column: &str) -> Option<Table> {
        if self.column(column).is_none() || column == self.id_column() {
            return None;
        }
        match column {
            "organism_id" => Some(Table::Organism),
            "cv_id" => Some(Table::Cv),
            "type_id" | "unittype_id" | "cvterm_id" => Some(Table::Cvterm),
            "feature_id" | "map_feature_id" => Some(Table::Feature),
            "featuremap_id" => Some(Table::Featuremap),
            "featurepos_id" => Some(Table::Featurepos),
            _ => None,
        }
    }
}

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS organism (
    organism_id INTEGER PRIMARY KEY AUTOINCREMENT,
    genus TEXT NOT NULL,
    species TEXT NOT NULL,
    common_name TEXT,
    abbreviation TEXT,
    UNIQUE (genus, species)
);
CREATE TABLE IF NOT EXISTS cv (
    cv_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    definition TEXT
);
CREATE TABLE IF NOT EXISTS cvterm (
    cvterm_id INTEGER PRIMARY KEY AUTOINCREMENT,
    cv_id INTEGER NOT NULL REFERENCES cv (cv_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    definition TEXT,
    UNIQUE (cv_id, name)
);
CREATE TABLE IF NOT EXISTS feature (
    feature_id INTEGER PRIMARY KEY AUTOINCREMENT,
    organism_id INTEGER NOT NULL REFERENCES organism (organism_id) ON DELETE CASCADE,
    name TEXT,
    uniquename TEXT NOT NULL,
    type_id INTEGER NOT NULL REFERENCES cvterm (cvterm_id) ON DELETE CASCADE,
    UNIQUE (organism_id, uniquename, type_id)
);
CREATE TABLE IF NOT EXISTS featuremap (
    featuremap_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE,
    description TEXT,
    unittype_id INTEGER REFERENCES cvterm (cvterm_id) ON DELETE SET NULL
);
CREATE TABLE IF NOT EXISTS featuremap_organism (
    featuremap_organism_id INTEGER PRIMARY KEY AUTOINCREMENT,
    featuremap_id INTEGER NOT NULL REFERENCES featuremap (featuremap_id) ON DELETE CASCADE,
    organism_id INTEGER NOT NULL REFERENCES organism (organism_id) ON DELETE CASCADE,
    UNIQUE (featuremap_id, organism_id)
);
CREATE TABLE IF NOT EXISTS featurepos (
    featurepos_id INTEGER PRIMARY KEY AUTOINCREMENT,
    featuremap_id INTEGER NOT NULL REFERENCES featuremap (featuremap_id) ON DELETE CASCADE,
    feature_id INTEGER NOT NULL REFERENCES feature (feature_id) ON DELETE CASCADE,
    map_feature_id INTEGER NOT NULL REFERENCES feature (feature_id) ON DELETE CASCADE,
    mappos REAL,
    UNIQUE (featuremap_id, feature_id)
);
CREATE TABLE IF NOT EXISTS featureposprop (
    featureposprop_id INTEGER PRIMARY KEY AUTOINCREMENT,
    featurepos_id INTEGER NOT NULL REFERENCES featurepos (featurepos_id) ON DELETE CASCADE,
    type_id INTEGER NOT NULL REFERENCES cvterm (cvterm_id) ON DELETE CASCADE,
    value TEXT,
    rank INTEGER NOT NULL DEFAULT 0,
    UNIQUE (featurepos_id, type_id, rank)
);
CREATE TABLE IF NOT EXISTS featureprop (
    featureprop_id INTEGER PRIMARY KEY AUTOINCREMENT,
    feature_id INTEGER NOT NULL REFERENCES feature (feature_id) ON DELETE CASCADE,
    type_id INTEGER NOT NULL REFERENCES cvterm (cvterm_id) ON DELETE CASCADE,
    value TEXT,
    rank INTEGER NOT NULL DEFAULT 0,
    UNIQUE (feature_id, type_id, rank)
);
CREATE TABLE IF NOT EXISTS feature_cvterm (
    feature_cvterm_id INTEGER PRIMARY KEY AUTOINCREMENT,
    feature_id INTEGER NOT NULL REFERENCES feature (feature_id) ON DELETE CASCADE,
    cvterm_id INTEGER NOT NULL REFERENCES cvterm (cvterm_id) ON DELETE CASCADE,
    UNIQUE (feature_id, cvterm_id)
);
"#;

/// Create the tables (if missing) and load the core vocabulary terms.
///
/// Safe to call on a database that is already initialized.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(CREATE_TABLES)?;

    for (cv, term) in CORE_TERMS {
        conn.execute("INSERT OR IGNORE INTO cv (name) VALUES (?1)", [cv])?;
        conn.execute(
            "INSERT OR IGNORE INTO cvterm (cv_id, name)
             SELECT cv_id, ?2 FROM cv WHERE name = ?1",
            [cv, term],
        )?;
    }

    tracing::debug!("Initialized {} tables", Table::iter().count());
    Ok(())
}
