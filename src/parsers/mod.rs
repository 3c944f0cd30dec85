pub mod qtl_tsv;
pub mod types;

pub use qtl_tsv::{QtlRows, QtlTsv};
pub use types::{ParseError, QtlRow, RowError};
