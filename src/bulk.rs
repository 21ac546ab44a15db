//! Batched multi-row INSERT.
//!
//! Rows are packed into `INSERT … VALUES (…),(…),…` statements sized so
//! that `rows_per_batch * columns` stays within the engine's parameter
//! limit (and its VALUES-row cap, where one exists).

use crate::connection::Connection;
use crate::error::Error;
use crate::value::Value;

/// Inserts `rows` into `table` in as few statements as the engine allows,
/// returning the total number of rows affected. Empty input returns 0.
pub async fn bulk_insert<C: Connection>(
    conn: &mut C,
    table: &str,
    columns: &[&str],
    rows: &[Vec<Value>],
) -> Result<u64, Error> {
    if rows.is_empty() || columns.is_empty() {
        return Ok(0);
    }

    let per_batch = rows_per_batch(
        columns.len(),
        conn.bulk_batch_limit(),
        conn.bulk_row_limit(),
    );

    let mut affected = 0;
    for batch in rows.chunks(per_batch) {
        let sql = build_insert(table, columns, batch.len());

        let mut binds = Vec::with_capacity(batch.len() * columns.len());
        for row in batch {
            for i in 0..columns.len() {
                binds.push(row.get(i).cloned().unwrap_or(Value::Null));
            }
        }

        affected += conn.execute(&sql, &binds).await?;
    }

    Ok(affected)
}

/// Like [`bulk_insert`], with the column order derived from the first row;
/// later rows may list their pairs in any order, and missing columns are
/// padded with `null`.
pub async fn bulk_insert_maps<C: Connection>(
    conn: &mut C,
    table: &str,
    rows: &[Vec<(String, Value)>],
) -> Result<u64, Error> {
    let first = match rows.first() {
        Some(first) => first,
        None => return Ok(0),
    };

    let columns: Vec<&str> = first.iter().map(|(name, _)| name.as_str()).collect();

    let ordered: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|name| {
                    row.iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(name))
                        .map_or(Value::Null, |(_, value)| value.clone())
                })
                .collect()
        })
        .collect();

    bulk_insert(conn, table, &columns, &ordered).await
}

fn rows_per_batch(columns: usize, param_limit: usize, row_limit: usize) -> usize {
    (param_limit / columns).clamp(1, row_limit.max(1))
}

fn build_insert(table: &str, columns: &[&str], rows: usize) -> String {
    let mut sql = String::with_capacity(64 + rows * columns.len() * 6);

    sql.push_str("INSERT INTO ");
    sql.push_str(table);
    sql.push_str(" (");
    sql.push_str(&columns.join(", "));
    sql.push_str(") VALUES ");

    let mut p = 1;
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }

        sql.push('(');
        for col in 0..columns.len() {
            if col > 0 {
                sql.push_str(", ");
            }
            sql.push_str("@p");
            sql.push_str(&p.to_string());
            p += 1;
        }
        sql.push(')');
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_respect_the_parameter_limit() {
        assert_eq!(rows_per_batch(3, 60_000, usize::MAX), 20_000);
        assert_eq!(rows_per_batch(7, 60_000, usize::MAX), 8571);
        // wide rows still make progress
        assert_eq!(rows_per_batch(100_000, 60_000, usize::MAX), 1);
    }

    #[test]
    fn batches_respect_the_values_row_cap() {
        // sp_executesql allows 2100 parameters but VALUES caps at 1000 rows
        assert_eq!(rows_per_batch(2, 2100, 1000), 1000);
        assert_eq!(rows_per_batch(3, 2100, 1000), 700);
    }

    #[test]
    fn insert_statement_shape() {
        assert_eq!(
            build_insert("departments", &["name", "budget"], 2),
            "INSERT INTO departments (name, budget) VALUES (@p1, @p2), (@p3, @p4)"
        );
    }
}
