//! Tests for the delimited QTL table reader

use crate::common::example_files::{MISSING_FILE, QTL_SINGLE_TRAIT, SINGLE_TRAIT_LABELS};
use crate::common::float_cmp::{assert_approx_eq, DEFAULT_TOLERANCE};
use crate::common::write_temp_tsv;
use qtl_importer::parsers::{ParseError, QtlRow, QtlTsv};

fn read_all(source: &QtlTsv) -> Vec<QtlRow> {
    source
        .rows()
        .expect("Failed to read header")
        .map(|row| row.expect("Row should parse"))
        .collect()
}

// ============================================
// Example File Tests
// ============================================

#[test]
fn test_single_trait_example_parses() {
    let source = QtlTsv::open(QTL_SINGLE_TRAIT).unwrap();
    let rows = read_all(&source);

    assert_eq!(rows.len(), SINGLE_TRAIT_LABELS.len());
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, SINGLE_TRAIT_LABELS);
    assert!(rows.iter().all(|r| r.trait_name == "Days to Flowering"));
}

#[test]
fn test_single_trait_example_values() {
    let rows = read_all(&QtlTsv::open(QTL_SINGLE_TRAIT).unwrap());
    let first = &rows[0];

    assert_eq!(first.line, 2);
    assert_eq!(first.published_symbol.as_deref(), Some("qDTF-LG1-1"));
    assert_eq!(first.experiment.as_deref(), Some("SPG2011"));
    assert_eq!(first.linkage_group, "LG1");
    assert_approx_eq(first.start_position, 30.1, DEFAULT_TOLERANCE);
    assert_approx_eq(first.end_position, 38.7, DEFAULT_TOLERANCE);
    assert_approx_eq(first.map_position(), 34.2, DEFAULT_TOLERANCE);
    assert_eq!(first.lod, Some(4.1));
    assert_eq!(first.additive_effect, Some(-1.3));
}

#[test]
fn test_single_trait_example_intervals_are_valid() {
    for row in read_all(&QtlTsv::open(QTL_SINGLE_TRAIT).unwrap()) {
        assert!(row.check().is_ok(), "{} should be valid", row.label);
    }
}

// ============================================
// File Errors
// ============================================

#[test]
fn test_missing_file() {
    match QtlTsv::open(MISSING_FILE) {
        Err(ParseError::NotFound(path)) => assert!(path.ends_with("mcfakerson.tsv")),
        other => panic!(
            "expected NotFound, got {:?}",
            other.map(|s| s.path().to_path_buf())
        ),
    }
}

#[test]
fn test_directory_is_not_a_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        QtlTsv::open(dir.path()),
        Err(ParseError::NotFound(_))
    ));
}

#[test]
fn test_header_only_file_has_no_rows() {
    let file =
        write_temp_tsv("qtl_label\ttrait_name\tlinkage_group\tstart_position\tend_position\n");
    let rows: Vec<_> = QtlTsv::open(file.path()).unwrap().rows().unwrap().collect();
    assert!(rows.is_empty());
}

#[test]
fn test_missing_columns_names_each_column() {
    let file = write_temp_tsv("QTL Label\tTrait Name\tStart\tEnd\nq1\tDTF\t1\t2\n");
    let err = QtlTsv::open(file.path()).unwrap().rows().err().unwrap();
    assert!(err.to_string().contains("linkage_group"));
}

// ============================================
// Header Handling
// ============================================

#[test]
fn test_headers_normalizing_to_same_column_are_rejected() {
    let file = write_temp_tsv(
        "QTL Label\tTrait\tLG\tStart\tStart Position\tEnd\n\
         q1\tDTF\tLG1\t1.0\t1.0\t2.0\n",
    );
    match QtlTsv::open(file.path()).unwrap().rows() {
        Err(ParseError::DuplicateColumns { columns, .. }) => {
            assert_eq!(columns, vec!["start_position".to_string()]);
        }
        Err(other) => panic!("expected DuplicateColumns, got {}", other),
        Ok(_) => panic!("expected DuplicateColumns, got rows"),
    }
}

#[test]
fn test_headers_are_case_and_punctuation_insensitive() {
    let file = write_temp_tsv(
        "qtl-label\tTRAIT NAME\tLinkage_Group\tStart Position\tEnd  Position\tR-squared\n\
         q1\tDTF\tLG2\t1.5\t2.5\t0.3\n",
    );
    let rows = read_all(&QtlTsv::open(file.path()).unwrap());
    assert_eq!(rows[0].linkage_group, "LG2");
    assert_eq!(rows[0].r2, Some(0.3));
}

#[test]
fn test_unknown_columns_are_ignored() {
    let file = write_temp_tsv(
        "qtl_label\ttrait_name\tlinkage_group\tstart_position\tend_position\tnotes\n\
         q1\tDTF\tLG2\t1.5\t2.5\tremeasured in 2012\n",
    );
    let rows = read_all(&QtlTsv::open(file.path()).unwrap());
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_blank_optional_cells_are_absent() {
    let file = write_temp_tsv(
        "qtl_label\tpublished_symbol\ttrait_name\tlinkage_group\t\
         peak_position\tstart_position\tend_position\n\
         q1\t\tDTF\tLG2\t\t1.5\t2.5\n",
    );
    let row = &read_all(&QtlTsv::open(file.path()).unwrap())[0];
    assert_eq!(row.published_symbol, None);
    assert_eq!(row.peak_position, None);
    assert_approx_eq(row.map_position(), 1.5, DEFAULT_TOLERANCE);
}

// ============================================
// Row Errors
// ============================================

#[test]
fn test_bad_rows_do_not_stop_iteration() {
    let file = write_temp_tsv(
        "qtl_label\ttrait_name\tlinkage_group\tstart_position\tend_position\n\
         q1\tDTF\tLG1\t1.0\t2.0\n\
         q2\tDTF\tLG1\tfar\t2.0\n\
         q3\t\tLG1\t1.0\t2.0\n\
         q4\tDTF\tLG1\t5.0\t2.0\n\
         q5\tDTF\tLG1\t3.0\t4.0\n",
    );
    let rows: Vec<_> = QtlTsv::open(file.path()).unwrap().rows().unwrap().collect();
    assert_eq!(rows.len(), 5);

    let lines: Vec<u64> = rows
        .iter()
        .filter_map(|row| row.as_ref().err())
        .map(|err| err.line)
        .collect();
    assert_eq!(lines, vec![3, 4, 5]);
    assert_eq!(rows[4].as_ref().unwrap().label, "q5");
}

#[test]
fn test_short_row_is_an_error() {
    let file = write_temp_tsv(
        "qtl_label\ttrait_name\tlinkage_group\tstart_position\tend_position\n\
         q1\tDTF\tLG1\n",
    );
    let rows: Vec<_> = QtlTsv::open(file.path()).unwrap().rows().unwrap().collect();
    assert!(rows[0].is_err());
}
