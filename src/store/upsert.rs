//! Keyed lookup-or-insert against the store.
//!
//! Value sets may carry nested references (`type_id => {name, cv_id => {name}}`).
//! These are resolved to foreign-key ids first, then the flat lookup or insert
//! runs against the outer table.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};

use super::schema::Table;
use super::types::{FieldValue, Record};
use super::{StoreError, StoreResult};

/// Column values after nested references have been replaced by ids
type Columns = Vec<(&'static str, SqlValue)>;

enum Resolution {
    Resolved(Columns),
    /// A nested reference matched no row; carries the outer column name
    Unmatched(&'static str),
}

/// Validate column names and replace nested references with foreign-key ids.
fn resolve(conn: &Connection, table: Table, values: &Record) -> StoreResult<Resolution> {
    let mut columns = Vec::with_capacity(values.len());

    for (name, value) in values.iter() {
        let column = table.column(name).ok_or_else(|| StoreError::UnknownColumn {
            table,
            column: name.to_string(),
        })?;

        let sql_value = match value {
            FieldValue::Ref(nested) => {
                let target = table
                    .references(column)
                    .ok_or_else(|| StoreError::NotAReference {
                        table,
                        column: column.to_string(),
                    })?;
                match lookup_id(conn, target, nested)? {
                    Some(id) => SqlValue::Integer(id),
                    None => return Ok(Resolution::Unmatched(column)),
                }
            }
            // Every non-reference variant has a SQL form
            flat => flat.to_sql().unwrap_or(SqlValue::Null),
        };
        columns.push((column, sql_value));
    }

    Ok(Resolution::Resolved(columns))
}

/// Find the id of the single row matching every column.
fn find_id(
    conn: &Connection,
    table: Table,
    columns: &[(&'static str, SqlValue)],
) -> StoreResult<Option<i64>> {
    if columns.is_empty() {
        return Err(StoreError::EmptyLookup { table });
    }

    let conditions: Vec<String> = columns
        .iter()
        .map(|(column, value)| match value {
            SqlValue::Null => format!("{} IS NULL", column),
            _ => format!("{} = ?", column),
        })
        .collect();
    let sql = format!(
        "SELECT {} FROM {} WHERE {} LIMIT 2",
        table.id_column(),
        table.as_ref(),
        conditions.join(" AND ")
    );
    let params = columns
        .iter()
        .map(|(_, value)| value)
        .filter(|value| !matches!(value, SqlValue::Null));

    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    match ids.as_slice() {
        [] => Ok(None),
        [id] => Ok(Some(*id)),
        _ => Err(StoreError::AmbiguousMatch { table }),
    }
}

/// Look up the id of the row matching all given values.
///
/// Returns `Ok(None)` when nothing matches, including when a nested reference
/// matches nothing. More than one matching row is an error.
pub fn lookup_id(conn: &Connection, table: Table, values: &Record) -> StoreResult<Option<i64>> {
    match resolve(conn, table, values)? {
        Resolution::Resolved(columns) => find_id(conn, table, &columns),
        Resolution::Unmatched(_) => Ok(None),
    }
}

/// Return the id of the row identified by `values`, inserting it if missing.
///
/// When every natural-key column of the table is supplied, the lookup uses
/// only those and the remaining supplied columns are updated in place on an
/// existing row. Otherwise all supplied columns must match.
pub fn save_datapoint(conn: &Connection, table: Table, values: &Record) -> StoreResult<i64> {
    let columns = match resolve(conn, table, values)? {
        Resolution::Resolved(columns) => columns,
        Resolution::Unmatched(column) => {
            return Err(StoreError::UnresolvedReference {
                table,
                column: column.to_string(),
            })
        }
    };

    let natural_key = table.natural_key();
    let (key, rest): (Columns, Columns) = columns
        .iter()
        .cloned()
        .partition(|(column, _)| natural_key.contains(column));
    let keyed = key.len() == natural_key.len();
    let lookup = if keyed { &key } else { &columns };

    if let Some(id) = find_id(conn, table, lookup)? {
        if keyed && !rest.is_empty() {
            update_row(conn, table, id, &rest)?;
        }
        tracing::debug!("Found existing {} {}", table, id);
        return Ok(id);
    }

    let names: Vec<&str> = columns.iter().map(|(column, _)| *column).collect();
    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.as_ref(),
        names.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(columns.iter().map(|(_, value)| value)))?;

    let id = conn.last_insert_rowid();
    tracing::debug!("Inserted {} {}", table, id);
    Ok(id)
}

fn update_row(
    conn: &Connection,
    table: Table,
    id: i64,
    columns: &[(&'static str, SqlValue)],
) -> StoreResult<()> {
    let assignments: Vec<String> = columns
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table.as_ref(),
        assignments.join(", "),
        table.id_column()
    );
    let params = columns
        .iter()
        .map(|(_, value)| value.clone())
        .chain(std::iter::once(SqlValue::Integer(id)));
    conn.execute(&sql, params_from_iter(params))?;
    Ok(())
}

/// Id of the term `term` in vocabulary `cv`, creating either if missing.
pub fn ensure_term(conn: &Connection, cv: &str, term: &str) -> StoreResult<i64> {
    let cv_id = save_datapoint(conn, Table::Cv, &Record::new().with("name", cv))?;
    save_datapoint(
        conn,
        Table::Cvterm,
        &Record::new().with("cv_id", cv_id).with("name", term),
    )
}

/// Insert or overwrite the rank-0 property of `subject_id` in a property table.
fn save_property(
    conn: &Connection,
    table: Table,
    subject_column: &str,
    subject_id: i64,
    context: &str,
    property_type: &str,
    value: &str,
) -> StoreResult<i64> {
    let type_id = ensure_term(conn, context, property_type)?;
    save_datapoint(
        conn,
        table,
        &Record::new()
            .with(subject_column, subject_id)
            .with("type_id", type_id)
            .with("rank", 0i64)
            .with("value", value),
    )
}

/// Delete the rank-0 property of `subject_id`, if one is stored.
///
/// Never creates the context vocabulary or property type. Returns whether a
/// row was removed.
fn clear_property(
    conn: &Connection,
    table: Table,
    subject_column: &str,
    subject_id: i64,
    context: &str,
    property_type: &str,
) -> StoreResult<bool> {
    let term = Record::new()
        .with("name", property_type)
        .with("cv_id", Record::new().with("name", context));
    let Some(type_id) = lookup_id(conn, Table::Cvterm, &term)? else {
        return Ok(false);
    };

    let key = Record::new()
        .with(subject_column, subject_id)
        .with("type_id", type_id)
        .with("rank", 0i64);
    let Some(id) = lookup_id(conn, table, &key)? else {
        return Ok(false);
    };

    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        table.as_ref(),
        table.id_column()
    );
    conn.execute(&sql, [id])?;
    tracing::debug!(
        "Cleared {} {} of {} {}",
        property_type,
        table,
        subject_column,
        subject_id
    );
    Ok(true)
}

/// Save a property on a feature.
///
/// `context` names the vocabulary holding `property_type` (usually `MAIN`).
/// At most one row exists per (feature, context, property type): a second
/// call replaces the stored value. Returns the property row id.
pub fn save_feature_property(
    conn: &Connection,
    feature_id: i64,
    context: &str,
    property_type: &str,
    value: &str,
) -> StoreResult<i64> {
    save_property(
        conn,
        Table::Featureprop,
        "feature_id",
        feature_id,
        context,
        property_type,
        value,
    )
}

/// Save a property on a feature position; same rules as [`save_feature_property`].
pub fn save_featurepos_property(
    conn: &Connection,
    featurepos_id: i64,
    context: &str,
    property_type: &str,
    value: &str,
) -> StoreResult<i64> {
    save_property(
        conn,
        Table::Featureposprop,
        "featurepos_id",
        featurepos_id,
        context,
        property_type,
        value,
    )
}

/// Remove a property from a feature; the counterpart of [`save_feature_property`].
pub fn clear_feature_property(
    conn: &Connection,
    feature_id: i64,
    context: &str,
    property_type: &str,
) -> StoreResult<bool> {
    clear_property(
        conn,
        Table::Featureprop,
        "feature_id",
        feature_id,
        context,
        property_type,
    )
}

/// Remove a property from a feature position.
pub fn clear_featurepos_property(
    conn: &Connection,
    featurepos_id: i64,
    context: &str,
    property_type: &str,
) -> StoreResult<bool> {
    clear_property(
        conn,
        Table::Featureposprop,
        "featurepos_id",
        featurepos_id,
        context,
        property_type,
    )
}
