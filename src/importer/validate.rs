use rusqlite::{Connection, OptionalExtension};

use super::types::{ImportArgs, MapRef};
use super::ImportError;
use crate::store::{self, Record, Table};

/// Import arguments resolved against the database
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedArgs {
    pub featuremap_id: i64,
    pub featuremap_name: String,
    /// Organism the map belongs to; imported QTL are created for it
    pub organism_id: i64,
    pub trait_cv_id: i64,
}

fn find_map(conn: &Connection, map: &MapRef) -> Result<Option<i64>, ImportError> {
    let found = match map {
        MapRef::Id(id) => {
            let by_id = Record::new().with("featuremap_id", *id);
            match store::lookup_id(conn, Table::Featuremap, &by_id)? {
                Some(found) => Some(found),
                // Maps may be named with digits only
                None => {
                    let by_name = Record::new().with("name", id.to_string());
                    store::lookup_id(conn, Table::Featuremap, &by_name)?
                }
            }
        }
        MapRef::Name(name) => {
            let by_name = Record::new().with("name", name.as_str());
            store::lookup_id(conn, Table::Featuremap, &by_name)?
        }
    };
    Ok(found)
}

/// Check that the map and trait vocabulary are given and exist.
///
/// Reads only; nothing is written whether or not validation passes.
pub fn validate_args(conn: &Connection, args: &ImportArgs) -> Result<ValidatedArgs, ImportError> {
    let map = args.featuremap_name.as_ref().ok_or(ImportError::MissingMap)?;
    let trait_cv_id = args
        .trait_cv_id
        .ok_or(ImportError::MissingTraitVocabulary)?;

    let featuremap_id =
        find_map(conn, map)?.ok_or_else(|| ImportError::UnknownMap(map.clone()))?;

    store::lookup_id(conn, Table::Cv, &Record::new().with("cv_id", trait_cv_id))?
        .ok_or(ImportError::UnknownTraitVocabulary(trait_cv_id))?;

    let featuremap_name: Option<String> = conn.query_row(
        "SELECT name FROM featuremap WHERE featuremap_id = ?1",
        [featuremap_id],
        |row| row.get(0),
    )?;
    let featuremap_name = featuremap_name.unwrap_or_else(|| featuremap_id.to_string());

    let organism_id: Option<i64> = conn
        .query_row(
            "SELECT organism_id FROM featuremap_organism
             WHERE featuremap_id = ?1 ORDER BY organism_id LIMIT 1",
            [featuremap_id],
            |row| row.get(0),
        )
        .optional()?;
    let organism_id =
        organism_id.ok_or_else(|| ImportError::MapWithoutOrganism(featuremap_name.clone()))?;

    Ok(ValidatedArgs {
        featuremap_id,
        featuremap_name,
        organism_id,
        trait_cv_id,
    })
}
