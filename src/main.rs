//! qtl_import - load a QTL table into a Chado SQLite database
//!
//! Usage: `qtl_import <database> <qtl-file> <map id or name> <trait cv id>`

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

use qtl_importer::importer::{ImportArgs, Importer, MapRef, QtlImporter};
use qtl_importer::settings::ImportSettings;
use qtl_importer::store::schema;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        bail!(
            "Usage: {} <database> <qtl-file> <map id or name> <trait cv id>",
            args.first().map(String::as_str).unwrap_or("qtl_import")
        );
    }

    let trait_cv_id: i64 = args[4]
        .parse()
        .with_context(|| format!("Trait vocabulary id '{}' is not a number", args[4]))?;
    let import_args = ImportArgs {
        featuremap_name: Some(MapRef::from(args[3].as_str())),
        trait_cv_id: Some(trait_cv_id),
    };

    let mut conn = Connection::open(&args[1])
        .with_context(|| format!("Failed to open database {}", args[1]))?;
    schema::initialize(&conn).context("Failed to initialize database schema")?;

    let mut importer = QtlImporter::create(&mut conn, import_args, &args[2])
        .with_settings(ImportSettings::load());
    importer.prepare_files()?;
    let summary = importer.run()?;

    println!(
        "Loaded {} QTL onto featuremap {} ({} of {} rows skipped)",
        summary.qtl_loaded(),
        summary.featuremap_id,
        summary.rows_skipped,
        summary.rows_read
    );
    Ok(())
}
