use rusqlite::Connection;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::types::{FieldKind, Form, FormField, ImportArgs, ImportState, ImportSummary};
use super::validate::{validate_args, ValidatedArgs};
use super::{ImportError, Importer};
use crate::parsers::{QtlRow, QtlTsv};
use crate::settings::{ImportSettings, RowPolicy};
use crate::store::schema::{LINKAGE_GROUP_TYPE, QTL_TYPE, SEQUENCE_CV};
use crate::store::{self, Record, Table};

/// Imports a QTL table onto a genetic map
///
/// ```no_run
/// use qtl_importer::importer::{ImportArgs, Importer, MapRef, QtlImporter};
/// use rusqlite::Connection;
///
/// let mut conn = Connection::open("chado.sqlite").unwrap();
/// let args = ImportArgs {
///     featuremap_name: Some(MapRef::from("LR-01 Eston x PI320937")),
///     trait_cv_id: Some(4),
/// };
/// let mut importer = QtlImporter::create(&mut conn, args, "qtl.singletrait.tsv");
/// importer.prepare_files().unwrap();
/// let summary = importer.run().unwrap();
/// println!("loaded {} QTL", summary.qtl_loaded());
/// ```
pub struct QtlImporter<'conn> {
    conn: &'conn mut Connection,
    args: ImportArgs,
    file_path: PathBuf,
    settings: ImportSettings,
    source: Option<QtlTsv>,
    state: ImportState,
}

impl<'conn> QtlImporter<'conn> {
    pub fn create(
        conn: &'conn mut Connection,
        args: ImportArgs,
        file_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            conn,
            args,
            file_path: file_path.as_ref().to_path_buf(),
            settings: ImportSettings::default(),
            source: None,
            state: ImportState::Created,
        }
    }

    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    pub fn args(&self) -> &ImportArgs {
        &self.args
    }

    /// See [`store::lookup_id`]
    pub fn lookup_id(&self, table: Table, values: &Record) -> Result<Option<i64>, ImportError> {
        Ok(store::lookup_id(&*self.conn, table, values)?)
    }

    /// See [`store::save_datapoint`]
    pub fn save_datapoint(&self, table: Table, values: &Record) -> Result<i64, ImportError> {
        Ok(store::save_datapoint(&*self.conn, table, values)?)
    }

    /// See [`store::save_feature_property`]
    pub fn save_feature_property(
        &self,
        feature_id: i64,
        context: &str,
        property_type: &str,
        value: &str,
    ) -> Result<i64, ImportError> {
        store::save_feature_property(&*self.conn, feature_id, context, property_type, value)
            .map_err(|e| {
                tracing::warn!("Failed to save {} on feature {}: {}", property_type, feature_id, e);
                e.into()
            })
    }

    fn fail(&mut self, err: ImportError) -> ImportError {
        self.state = ImportState::Failed;
        tracing::error!("QTL import of {:?} failed: {}", self.file_path, err);
        err
    }

    /// Load every row inside one transaction, each row in its own savepoint.
    fn load_file(
        &mut self,
        source: &QtlTsv,
        target: &ValidatedArgs,
    ) -> Result<ImportSummary, ImportError> {
        let rows = source.rows()?;
        let policy = self.settings.row_policy;
        let context = self.settings.property_context.as_str();
        let mut summary = ImportSummary {
            featuremap_id: target.featuremap_id,
            organism_id: target.organism_id,
            ..Default::default()
        };

        let mut loaded = HashSet::new();

        let mut tx = self.conn.transaction()?;
        for row in rows {
            summary.rows_read += 1;
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    reject(policy, &mut summary, err.line, err.message)?;
                    continue;
                }
            };

            let savepoint = tx.savepoint()?;
            match load_row(&savepoint, target, context, &row) {
                Ok(feature_id) => {
                    savepoint.commit()?;
                    if loaded.insert(feature_id) {
                        summary.feature_ids.push(feature_id);
                    } else {
                        tracing::warn!(
                            "QTL '{}' appears more than once; line {} replaces earlier values",
                            row.label,
                            row.line
                        );
                    }
                }
                Err(err) => {
                    drop(savepoint);
                    reject(policy, &mut summary, row.line, err.to_string())?;
                }
            }
        }
        self.state = ImportState::RowsProcessed;

        if summary.feature_ids.is_empty() {
            return Err(ImportError::NoUsableRows(source.path().to_path_buf()));
        }
        tx.commit()?;
        Ok(summary)
    }
}

impl Importer for QtlImporter<'_> {
    type Summary = ImportSummary;

    fn form(&self) -> Result<Form, ImportError> {
        let maps = select_options(
            &*self.conn,
            "SELECT featuremap_id, COALESCE(name, CAST(featuremap_id AS TEXT))
             FROM featuremap ORDER BY name",
        )?;
        let vocabularies =
            select_options(&*self.conn, "SELECT cv_id, name FROM cv ORDER BY name")?;

        Ok(Form {
            fields: vec![
                FormField {
                    key: "featuremap_name",
                    title: "Genetic Map",
                    description: "The genetic map the QTL are positioned on.",
                    required: true,
                    kind: FieldKind::Select(maps),
                },
                FormField {
                    key: "trait_cv_id",
                    title: "Trait Vocabulary",
                    description: "The controlled vocabulary containing the traits named in the file.",
                    required: true,
                    kind: FieldKind::Select(vocabularies),
                },
                FormField {
                    key: "file",
                    title: "QTL File",
                    description: "Tab-separated table with a header row and one QTL per row.",
                    required: true,
                    kind: FieldKind::File,
                },
            ],
        })
    }

    fn prepare_files(&mut self) -> Result<(), ImportError> {
        match QtlTsv::open(&self.file_path) {
            Ok(source) => {
                self.source = Some(source.with_delimiter(self.settings.delimiter_byte()));
                self.state = ImportState::FilesPrepared;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    fn validate(&self) -> Result<ValidatedArgs, ImportError> {
        validate_args(&*self.conn, &self.args)
            .inspect_err(|e| tracing::error!("Invalid QTL import arguments: {}", e))
    }

    fn run(&mut self) -> Result<ImportSummary, ImportError> {
        let Some(source) = self.source.clone() else {
            return Err(self.fail(ImportError::FilesNotPrepared));
        };

        // validate() has already logged the failure
        let target = match self.validate() {
            Ok(target) => target,
            Err(err) => {
                self.state = ImportState::Failed;
                return Err(err);
            }
        };
        self.state = ImportState::Validated;
        tracing::info!(
            "Importing QTL from {:?} onto map '{}' (featuremap_id={})",
            source.path(),
            target.featuremap_name,
            target.featuremap_id
        );

        match self.load_file(&source, &target) {
            Ok(summary) => {
                self.state = ImportState::Completed;
                tracing::info!(
                    "Loaded {} QTL from {} rows ({} skipped)",
                    summary.qtl_loaded(),
                    summary.rows_read,
                    summary.rows_skipped
                );
                Ok(summary)
            }
            Err(err) => Err(self.fail(err)),
        }
    }
}

fn sequence_term(name: &str) -> Record {
    Record::new()
        .with("name", name)
        .with("cv_id", Record::new().with("name", SEQUENCE_CV))
}

/// Write one QTL, its linkage group, map position, properties and trait link.
fn load_row(
    conn: &Connection,
    target: &ValidatedArgs,
    context: &str,
    row: &QtlRow,
) -> Result<i64, ImportError> {
    let trait_id = store::lookup_id(
        conn,
        Table::Cvterm,
        &Record::new()
            .with("cv_id", target.trait_cv_id)
            .with("name", row.trait_name.as_str()),
    )?
    .ok_or_else(|| ImportError::UnknownTrait {
        name: row.trait_name.clone(),
        cv_id: target.trait_cv_id,
    })?;

    let feature_id = store::save_datapoint(
        conn,
        Table::Feature,
        &Record::new()
            .with("organism_id", target.organism_id)
            .with("uniquename", row.label.as_str())
            .with("name", row.label.as_str())
            .with("type_id", sequence_term(QTL_TYPE)),
    )?;

    // Linkage group names repeat between maps
    let linkage_group_id = store::save_datapoint(
        conn,
        Table::Feature,
        &Record::new()
            .with("organism_id", target.organism_id)
            .with(
                "uniquename",
                format!("{} {}", target.featuremap_name, row.linkage_group),
            )
            .with("name", row.linkage_group.as_str())
            .with("type_id", sequence_term(LINKAGE_GROUP_TYPE)),
    )?;

    let featurepos_id = store::save_datapoint(
        conn,
        Table::Featurepos,
        &Record::new()
            .with("featuremap_id", target.featuremap_id)
            .with("feature_id", feature_id)
            .with("map_feature_id", linkage_group_id)
            .with("mappos", row.map_position()),
    )?;

    // Absent optional values clear what an earlier row or import stored
    let interval = [
        ("start", Some(row.start_position)),
        ("end", Some(row.end_position)),
        ("peak", row.peak_position),
    ];
    for (property, value) in interval {
        match value {
            Some(value) => {
                let value = value.to_string();
                store::save_featurepos_property(conn, featurepos_id, context, property, &value)?;
            }
            None => {
                store::clear_featurepos_property(conn, featurepos_id, context, property)?;
            }
        }
    }

    let properties = [
        ("published_symbol", row.published_symbol.clone()),
        ("experiment", row.experiment.clone()),
        ("lod", row.lod.map(|v| v.to_string())),
        ("r2", row.r2.map(|v| v.to_string())),
        ("additive_effect", row.additive_effect.map(|v| v.to_string())),
    ];
    for (property, value) in properties {
        match value {
            Some(value) => {
                store::save_feature_property(conn, feature_id, context, property, &value)?;
            }
            None => {
                store::clear_feature_property(conn, feature_id, context, property)?;
            }
        }
    }

    store::save_datapoint(
        conn,
        Table::FeatureCvterm,
        &Record::new()
            .with("feature_id", feature_id)
            .with("cvterm_id", trait_id),
    )?;

    tracing::debug!("Loaded QTL '{}' as feature {}", row.label, feature_id);
    Ok(feature_id)
}

fn reject(
    policy: RowPolicy,
    summary: &mut ImportSummary,
    line: u64,
    reason: String,
) -> Result<(), ImportError> {
    match policy {
        RowPolicy::Skip => {
            tracing::warn!("Skipping QTL row at line {}: {}", line, reason);
            summary.rows_skipped += 1;
            Ok(())
        }
        RowPolicy::Abort => Err(ImportError::RowRejected { line, reason }),
    }
}

fn select_options(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(sql)?;
    let options = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?.to_string(), row.get::<_, String>(1)?))
    })?;
    options.collect()
}
