//! Arbitrary SQL execution inside a bounded transaction.
//!
//! The statement is always attempted as a row query first; statements
//! that produce no column metadata fall back to a plain execute so DDL
//! and data-modifying commands still report their affected-row count.

use crate::db::types::{CellValue, QueryResult};
use crate::error::{EditorError, EditorResult, ExecPhase};
use futures::{TryStreamExt, pin_mut};
use rust_decimal::Decimal;
use tokio_postgres::Client;
use tokio_postgres::types::{ToSql, Type};

/// Run one SQL statement and return its result envelope.
///
/// The row query runs inside a transaction that commits only when every
/// row arrived and scanned cleanly; a failure while streaming rolls the
/// transaction back and reports the failure in the envelope's `error`
/// field ("Error iterating result rows" for server-reported errors,
/// "Failed to scan row" for client-side decode failures). Errors before
/// any result scaffolding exists (a statement that fails to prepare)
/// surface as [`EditorError::ExecutionFailed`] instead.
pub async fn run_query(client: &mut Client, sql: &str) -> EditorResult<QueryResult> {
    let mut result = QueryResult::default();

    let tx = client
        .transaction()
        .await
        .map_err(|e| EditorError::execution(ExecPhase::Query, e))?;

    let stmt = tx
        .prepare(sql)
        .await
        .map_err(|e| EditorError::execution(ExecPhase::Query, e))?;
    result.columns = stmt.columns().iter().map(|c| c.name().to_string()).collect();

    if result.columns.is_empty() {
        // Not a row-returning statement. Drop the transaction and run
        // the statement for real via execute, reporting affected rows.
        drop(tx);
        match client.execute(sql, &[]).await {
            Ok(affected) => {
                result.message =
                    format!("Command executed successfully. Rows affected: {}", affected);
            }
            Err(e) => {
                log::warn!("query failed during {}: {}", ExecPhase::Exec, e);
                result.error = e.to_string();
            }
        }
        return Ok(result);
    }

    {
        let params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let stream = tx
            .query_raw(&stmt, params)
            .await
            .map_err(|e| EditorError::execution(ExecPhase::Query, e))?;
        pin_mut!(stream);

        loop {
            match stream.try_next().await {
                Ok(Some(row)) => result.rows.push(materialize_row(&row)),
                Ok(None) => break,
                Err(e) => {
                    // Server-reported errors (a statement that blows up
                    // mid-evaluation) are iteration failures; anything
                    // client-side is a row decode failure
                    let (phase, message) = if e.as_db_error().is_some() {
                        (
                            ExecPhase::Iteration,
                            format!("Error iterating result rows: {}", e),
                        )
                    } else {
                        (ExecPhase::Scan, format!("Failed to scan row: {}", e))
                    };
                    log::warn!("query failed during {}: {}", phase, e);
                    result.error = message;
                    // Dropping the transaction rolls it back
                    return Ok(result);
                }
            }
        }
    }

    tx.commit()
        .await
        .map_err(|e| EditorError::execution(ExecPhase::Iteration, e))?;

    result.message = format!(
        "Query executed successfully, {} rows returned.",
        result.rows.len()
    );
    Ok(result)
}

/// Fill the pagination echo fields for a single-page result.
pub fn apply_pagination(result: &mut QueryResult, page: u64, page_size: u64) {
    let total_rows = result.rows.len() as u64;
    result.total_rows = Some(total_rows);
    result.total_pages = Some(if page_size == 0 {
        1
    } else {
        total_rows.div_ceil(page_size).max(1)
    });
    result.current_page = Some(page.max(1));
    result.page_size = Some(page_size);
}

fn materialize_row(row: &tokio_postgres::Row) -> Vec<CellValue> {
    (0..row.len()).map(|idx| extract_cell(row, idx)).collect()
}

/// Extract one cell as a typed value, driven by the column's postgres
/// type, with a string fallback for anything unmapped.
fn extract_cell(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match *row.columns()[idx].type_() {
        Type::INT2 => match row.try_get::<_, Option<i16>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v as i64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::INT4 => match row.try_get::<_, Option<i32>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v as i64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::INT8 => match row.try_get::<_, Option<i64>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::FLOAT4 => match row.try_get::<_, Option<f32>>(idx) {
            Ok(Some(v)) => CellValue::Float(v as f64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::FLOAT8 => match row.try_get::<_, Option<f64>>(idx) {
            Ok(Some(v)) => CellValue::Float(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::NUMERIC => match row.try_get::<_, Option<Decimal>>(idx) {
            Ok(Some(v)) => CellValue::Text(v.to_string()),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::BOOL => match row.try_get::<_, Option<bool>>(idx) {
            Ok(Some(v)) => CellValue::Boolean(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::JSON | Type::JSONB => match row.try_get::<_, Option<serde_json::Value>>(idx) {
            Ok(Some(v)) => CellValue::Json(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::BYTEA => match row.try_get::<_, Option<Vec<u8>>>(idx) {
            Ok(Some(v)) => CellValue::Binary(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::UUID => match row.try_get::<_, Option<uuid::Uuid>>(idx) {
            Ok(Some(v)) => CellValue::Uuid(v.to_string()),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE | Type::TIME | Type::INTERVAL => {
            extract_temporal(row, idx)
        }
        Type::BOOL_ARRAY => extract_array(row, idx, CellValue::Boolean),
        Type::INT2_ARRAY => extract_array(row, idx, |v: i16| CellValue::Integer(v as i64)),
        Type::INT4_ARRAY => extract_array(row, idx, |v: i32| CellValue::Integer(v as i64)),
        Type::INT8_ARRAY => extract_array(row, idx, CellValue::Integer),
        Type::FLOAT4_ARRAY => extract_array(row, idx, |v: f32| CellValue::Float(v as f64)),
        Type::FLOAT8_ARRAY => extract_array(row, idx, CellValue::Float),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::NAME_ARRAY => {
            extract_array(row, idx, CellValue::Text)
        }
        Type::UUID_ARRAY => {
            extract_array(row, idx, |v: uuid::Uuid| CellValue::Uuid(v.to_string()))
        }
        Type::NUMERIC_ARRAY => {
            extract_array(row, idx, |v: Decimal| CellValue::Text(v.to_string()))
        }
        Type::JSON_ARRAY | Type::JSONB_ARRAY => extract_array(row, idx, CellValue::Json),
        // Text types and anything without a direct mapping
        _ => try_as_string(row, idx),
    }
}

fn extract_temporal(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::DateTime(v),
        Ok(None) => CellValue::Null,
        Err(_) => {
            if let Ok(Some(v)) = row.try_get::<_, Option<chrono::NaiveDateTime>>(idx) {
                return CellValue::DateTime(v.to_string());
            }
            if let Ok(Some(v)) = row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx) {
                return CellValue::DateTime(v.to_string());
            }
            if let Ok(Some(v)) = row.try_get::<_, Option<chrono::NaiveDate>>(idx) {
                return CellValue::DateTime(v.to_string());
            }
            if let Ok(Some(v)) = row.try_get::<_, Option<chrono::NaiveTime>>(idx) {
                return CellValue::DateTime(v.to_string());
            }
            try_as_string(row, idx)
        }
    }
}

fn extract_array<'a, T, F>(row: &'a tokio_postgres::Row, idx: usize, wrap: F) -> CellValue
where
    T: tokio_postgres::types::FromSql<'a>,
    F: Fn(T) -> CellValue,
{
    match row.try_get::<_, Option<Vec<T>>>(idx) {
        Ok(Some(v)) => CellValue::Array(v.into_iter().map(wrap).collect()),
        Ok(None) => CellValue::Null,
        Err(_) => try_as_string(row, idx),
    }
}

/// String fallback for type mismatches. When even that fails, the cell
/// names the postgres type it could not display.
fn try_as_string(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::Text(v),
        Ok(None) => CellValue::Null,
        Err(_) => {
            let type_name = row
                .columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name());
            CellValue::Text(format!("<unable to display: {}>", type_name))
        }
    }
}
