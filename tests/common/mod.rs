//! Common test utilities shared across all test modules
//!
//! This module provides database fixtures, seeders for genetic maps and
//! trait vocabularies, and helpers for writing throwaway QTL tables.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use qtl_importer::store::{save_datapoint, schema, Record, Table};
use rusqlite::Connection;

static UNIQUE: AtomicUsize = AtomicUsize::new(0);

/// Suffix that differs on every call, for names under unique constraints
pub fn unique_suffix() -> usize {
    UNIQUE.fetch_add(1, Ordering::Relaxed)
}

/// Fresh in-memory database with the schema and core terms loaded
pub fn open_database() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    schema::initialize(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an organism with a unique species name
pub fn create_organism(conn: &Connection) -> i64 {
    save_datapoint(
        conn,
        Table::Organism,
        &Record::new()
            .with("genus", "Lens")
            .with("species", format!("culinaris-{}", unique_suffix())),
    )
    .expect("Failed to create organism")
}

/// Create a term in a new vocabulary, returning `(cvterm_id, cv_id)`
pub fn create_trait_term(conn: &Connection, name: &str) -> (i64, i64) {
    let cv_id = save_datapoint(
        conn,
        Table::Cv,
        &Record::new().with("name", format!("trait_vocabulary_{}", unique_suffix())),
    )
    .expect("Failed to create trait vocabulary");
    let cvterm_id = save_datapoint(
        conn,
        Table::Cvterm,
        &Record::new().with("cv_id", cv_id).with("name", name),
    )
    .expect("Failed to create trait term");
    (cvterm_id, cv_id)
}

/// Identifiers of a seeded genetic map
#[derive(Clone, Debug)]
pub struct MapDetails {
    pub featuremap_id: i64,
    pub organism_id: i64,
    pub name: String,
}

/// Seeds a genetic map attached to its own organism
pub struct GeneticMapSeeder;

impl GeneticMapSeeder {
    pub fn seed(conn: &Connection) -> MapDetails {
        let organism_id = create_organism(conn);
        let name = format!("LR-{:02} Eston x PI320937", unique_suffix());
        let featuremap_id = save_datapoint(
            conn,
            Table::Featuremap,
            &Record::new()
                .with("name", name.as_str())
                .with("description", "Recombinant inbred population"),
        )
        .expect("Failed to create featuremap");
        save_datapoint(
            conn,
            Table::FeaturemapOrganism,
            &Record::new()
                .with("featuremap_id", featuremap_id)
                .with("organism_id", organism_id),
        )
        .expect("Failed to attach organism to featuremap");

        MapDetails {
            featuremap_id,
            organism_id,
            name,
        }
    }
}

/// Write `contents` to a temporary `.tsv` file that lives as long as the handle
pub fn write_temp_tsv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".tsv")
        .tempfile()
        .expect("Failed to create temporary file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temporary file");
    file
}

/// Example QTL tables
pub mod example_files {
    pub const QTL_SINGLE_TRAIT: &str = "example_files/qtl.singletrait.tsv";

    /// A path that never exists
    pub const MISSING_FILE: &str = "fake/file/mcfakerson.tsv";

    /// QTL labels in [`QTL_SINGLE_TRAIT`]
    pub const SINGLE_TRAIT_LABELS: [&str; 4] = [
        "LcC23363p108-DTF-SPG2011",
        "LcC06044p758-DTF-Preston2009",
        "Yc-DTF-Preston2011",
        "Yc-DTF-Preston2009",
    ];

    /// Trait every row of [`QTL_SINGLE_TRAIT`] measures
    pub const SINGLE_TRAIT_NAME: &str = "Days to Flowering";
}

/// Row counts and lookups against the store
pub mod queries {
    use rusqlite::Connection;

    /// Names of QTL features belonging to an organism
    pub fn qtl_names(conn: &Connection, organism_id: i64) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT f.name FROM feature f
                 JOIN cvterm t ON t.cvterm_id = f.type_id
                 WHERE t.name = 'QTL' AND f.organism_id = ?1
                 ORDER BY f.feature_id",
            )
            .unwrap();
        stmt.query_map([organism_id], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    /// Number of rows in a table
    pub fn count_rows(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    /// Featuremap ids of every position held by QTL of an organism
    pub fn qtl_position_maps(conn: &Connection, organism_id: i64) -> Vec<i64> {
        let mut stmt = conn
            .prepare(
                "SELECT p.featuremap_id FROM featurepos p
                 JOIN feature f ON f.feature_id = p.feature_id
                 JOIN cvterm t ON t.cvterm_id = f.type_id
                 WHERE t.name = 'QTL' AND f.organism_id = ?1",
            )
            .unwrap();
        stmt.query_map([organism_id], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<i64>, _>>()
            .unwrap()
    }

    /// Value of a named feature property, if set
    pub fn feature_property(
        conn: &Connection,
        feature_name: &str,
        property: &str,
    ) -> Option<String> {
        conn.query_row(
            "SELECT fp.value FROM featureprop fp
             JOIN feature f ON f.feature_id = fp.feature_id
             JOIN cvterm t ON t.cvterm_id = fp.type_id
             WHERE f.name = ?1 AND t.name = ?2",
            [feature_name, property],
            |row| row.get(0),
        )
        .ok()
    }
}

/// Float comparison helpers for testing
pub mod float_cmp {
    /// Check if two floats are approximately equal within a tolerance
    pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    /// Assert that two floats are approximately equal
    pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!(
            approx_eq(a, b, tolerance),
            "Values not approximately equal: {} vs {} (tolerance: {})",
            a,
            b,
            tolerance
        );
    }

    /// Default tolerance for float comparisons (0.0001)
    pub const DEFAULT_TOLERANCE: f64 = 0.0001;
}
