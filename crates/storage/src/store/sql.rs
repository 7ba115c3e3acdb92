#![forbid(unsafe_code)]

use super::{FOLD_CASE_FN, StoreError};
use adv_core::{FilterSpec, Predicate, SortSpec};
use rusqlite::types::Value as SqlValue;

/// Renders `filter` as a WHERE clause over `advisors`, pushing bound values
/// onto `params` in placeholder order. An empty conjunction renders nothing.
pub(super) fn push_where_clause(
    sql: &mut String,
    params: &mut Vec<SqlValue>,
    filter: &FilterSpec,
) -> Result<(), StoreError> {
    let predicates = match filter {
        FilterSpec::Nothing => {
            sql.push_str(" WHERE 0");
            return Ok(());
        }
        FilterSpec::Match(predicates) => predicates,
    };

    for (idx, predicate) in predicates.iter().enumerate() {
        sql.push_str(if idx == 0 { " WHERE " } else { " AND " });
        push_predicate(sql, params, predicate)?;
    }
    Ok(())
}

fn push_predicate(
    sql: &mut String,
    params: &mut Vec<SqlValue>,
    predicate: &Predicate,
) -> Result<(), StoreError> {
    match predicate {
        Predicate::NameContains(needle) => {
            sql.push_str(&format!(
                "(instr({FOLD_CASE_FN}(COALESCE(first_name, '')), ?) > 0 \
                 OR instr({FOLD_CASE_FN}(COALESCE(last_name, '')), ?) > 0)"
            ));
            let folded = needle.to_lowercase();
            params.push(SqlValue::Text(folded.clone()));
            params.push(SqlValue::Text(folded));
        }
        Predicate::ColumnIn { column, values } => {
            if values.is_empty() {
                sql.push('0');
                return Ok(());
            }
            sql.push_str(column.as_sql_name());
            sql.push_str(" IN (");
            for (idx, value) in values.iter().enumerate() {
                if idx > 0 {
                    sql.push_str(", ");
                }
                sql.push('?');
                params.push(SqlValue::Text(value.clone()));
            }
            sql.push(')');
        }
        Predicate::IdIn(ids) => {
            let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
            sql.push_str("id IN (SELECT value FROM json_each(?))");
            params.push(SqlValue::Text(serde_json::to_string(&ids)?));
        }
    }
    Ok(())
}

/// Absent values sort last ascending and first descending; ties break on id.
pub(super) fn push_order_by(sql: &mut String, sort: &SortSpec) {
    let column = sort.field.as_sql_name();
    let direction = sort.direction.as_sql();
    sql.push_str(&format!(
        " ORDER BY ({column} IS NULL) {direction}, {column} {direction}, id ASC"
    ));
}
