use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::types::{ParseError, QtlRow, RowError};

/// Columns every QTL table must provide
pub const REQUIRED_COLUMNS: &[&str] = &[
    "qtl_label",
    "trait_name",
    "linkage_group",
    "start_position",
    "end_position",
];

/// Columns read into a [`QtlRow`]; any other column is ignored
const KNOWN_COLUMNS: &[&str] = &[
    "qtl_label",
    "published_symbol",
    "trait_name",
    "experiment",
    "linkage_group",
    "peak_position",
    "start_position",
    "end_position",
    "lod",
    "r2",
    "additive_effect",
];

/// Alternative header spellings seen in QTL tables, after normalization
const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("qtl", "qtl_label"),
    ("qtl_name", "qtl_label"),
    ("label", "qtl_label"),
    ("published_label", "published_symbol"),
    ("published_qtl_label", "published_symbol"),
    ("symbol", "published_symbol"),
    ("trait", "trait_name"),
    ("experiment_name", "experiment"),
    ("lg", "linkage_group"),
    ("peak", "peak_position"),
    ("start", "start_position"),
    ("end", "end_position"),
    ("stop", "end_position"),
    ("lod_score", "lod"),
    ("r", "r2"),
    ("r_2", "r2"),
    ("r_squared", "r2"),
    ("additive", "additive_effect"),
];

static HEADER_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile regex"));

/// Normalize a header cell to its canonical column name.
///
/// `"Start Position (cM)"` becomes `"start_position_cm"`, `"LG"` becomes
/// `"linkage_group"`.
pub fn normalize_column(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let replaced = HEADER_SEPARATORS.replace_all(&lowered, "_");
    let normalized = replaced.trim_matches('_');

    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| normalized.to_string())
}

/// Known columns that more than one header cell normalizes to
fn duplicate_columns(headers: &StringRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for header in headers.iter().filter(|h| KNOWN_COLUMNS.contains(h)) {
        if !seen.insert(header) && !duplicates.iter().any(|d| d == header) {
            duplicates.push(header.to_string());
        }
    }
    duplicates
}

/// A delimited QTL table on disk
///
/// Opening only checks that the file is there and readable. Rows are read
/// lazily by [`QtlTsv::rows`], which starts from the top of the file on
/// every call.
#[derive(Clone, Debug)]
pub struct QtlTsv {
    path: PathBuf,
    delimiter: u8,
}

impl QtlTsv {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(ParseError::NotFound(path));
        }
        File::open(&path).map_err(|source| ParseError::Unreadable {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            delimiter: b'\t',
        })
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the header and return an iterator over the data rows.
    pub fn rows(&self) -> Result<QtlRows, ParseError> {
        let file = File::open(&self.path).map_err(|source| ParseError::Unreadable {
            path: self.path.clone(),
            source,
        })?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);

        let raw = reader
            .headers()
            .map_err(|source| ParseError::BadHeader {
                path: self.path.clone(),
                source,
            })?
            .clone();
        if raw.iter().all(|cell| cell.trim().is_empty()) {
            return Err(ParseError::EmptyFile(self.path.clone()));
        }

        let headers: StringRecord = raw.iter().map(normalize_column).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns {
                path: self.path.clone(),
                columns: missing,
            });
        }

        let duplicates = duplicate_columns(&headers);
        if !duplicates.is_empty() {
            return Err(ParseError::DuplicateColumns {
                path: self.path.clone(),
                columns: duplicates,
            });
        }

        tracing::debug!("QTL file {:?} columns: {:?}", self.path, headers);
        reader.set_headers(headers.clone());

        Ok(QtlRows {
            records: reader.into_records(),
            headers,
        })
    }
}

/// Iterator over the rows of a [`QtlTsv`]
pub struct QtlRows {
    records: StringRecordsIntoIter<File>,
    headers: StringRecord,
}

impl QtlRows {
    fn read_row(&self, record: csv::Result<StringRecord>) -> Result<QtlRow, RowError> {
        let record = record.map_err(|e| RowError {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let mut row: QtlRow = record
            .deserialize(Some(&self.headers))
            .map_err(|e| RowError {
                line,
                message: e.to_string(),
            })?;
        row.check().map_err(|message| RowError { line, message })?;
        row.line = line;
        Ok(row)
    }
}

impl Iterator for QtlRows {
    type Item = Result<QtlRow, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(self.read_row(record))
    }
}
