use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use strum::{AsRefStr, Display};

/// Reference to a genetic map, either by id or by name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapRef {
    Id(i64),
    Name(String),
}

impl FromStr for MapRef {
    type Err = Infallible;

    /// All-digit input is taken as an id, anything else as a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(id) => MapRef::Id(id),
            Err(_) => MapRef::Name(s.to_string()),
        })
    }
}

impl From<i64> for MapRef {
    fn from(id: i64) -> Self {
        MapRef::Id(id)
    }
}

impl From<&str> for MapRef {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(map) => map,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapRef::Id(id) => write!(f, "{}", id),
            MapRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Arguments supplied when creating an import
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportArgs {
    /// Genetic map the QTL are positioned on
    #[serde(default)]
    pub featuremap_name: Option<MapRef>,
    /// Vocabulary holding the trait terms named in the file
    #[serde(default)]
    pub trait_cv_id: Option<i64>,
}

/// Lifecycle of a single import run
#[derive(AsRefStr, Clone, Copy, Debug, Display, Default, PartialEq, Eq)]
pub enum ImportState {
    #[default]
    Created,
    FilesPrepared,
    Validated,
    RowsProcessed,
    Completed,
    Failed,
}

/// Outcome of a successful run
#[derive(Clone, Debug, Default, Serialize)]
pub struct ImportSummary {
    pub featuremap_id: i64,
    pub organism_id: i64,
    /// Data rows seen in the file, including skipped ones
    pub rows_read: usize,
    pub rows_skipped: usize,
    /// QTL feature ids in file order
    pub feature_ids: Vec<i64>,
}

impl ImportSummary {
    pub fn qtl_loaded(&self) -> usize {
        self.feature_ids.len()
    }
}

/// Input widget kind for a form field
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FieldKind {
    /// Pick one of `(value, label)` pairs
    Select(Vec<(String, String)>),
    File,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormField {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

/// Fields an importer needs from the user
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Form {
    pub fields: Vec<FormField>,
}

impl Form {
    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.field(key).is_some()
    }
}
