//! Query execution against a live database.

use crate::common::{connect_editor, run_setup};
use sqldesk::db::types::CellValue;
use sqldesk::editor::{ExecuteQueryRequest, ResourceEditor};

async fn run(editor: &ResourceEditor, sql: &str) -> sqldesk::db::types::QueryResult {
    editor
        .execute_query(&ExecuteQueryRequest {
            schema_name: "public".to_string(),
            query: sql.to_string(),
            page: 1,
            page_size: 100,
        })
        .await
        .expect("execute_query")
        .result
}

#[tokio::test]
async fn select_literal_returns_typed_row() {
    let Some(editor) = connect_editor().await else {
        return;
    };

    let result = run(&editor, "SELECT 1 AS n").await;
    assert_eq!(result.columns, ["n"]);
    assert_eq!(result.rows, [[CellValue::Integer(1)]]);
    assert_eq!(result.message, "Query executed successfully, 1 rows returned.");
    assert_eq!(result.error, "");
    assert_eq!(result.total_rows, Some(1));
    assert_eq!(result.current_page, Some(1));
}

#[tokio::test]
async fn select_mixed_types_materializes_cells() {
    let Some(editor) = connect_editor().await else {
        return;
    };

    let result = run(
        &editor,
        "SELECT 42::bigint AS big, 'hello'::text AS msg, true AS flag, \
         1.5::float8 AS ratio, NULL::text AS missing, \
         '{\"a\":1}'::jsonb AS doc, ARRAY[1,2,3]::int[] AS nums",
    )
    .await;
    assert_eq!(
        result.columns,
        ["big", "msg", "flag", "ratio", "missing", "doc", "nums"]
    );
    let row = &result.rows[0];
    assert_eq!(row[0], CellValue::Integer(42));
    assert_eq!(row[1], CellValue::Text("hello".to_string()));
    assert_eq!(row[2], CellValue::Boolean(true));
    assert_eq!(row[3], CellValue::Float(1.5));
    assert_eq!(row[4], CellValue::Null);
    assert_eq!(row[5], CellValue::Json(serde_json::json!({"a": 1})));
    assert_eq!(
        row[6],
        CellValue::Array(vec![
            CellValue::Integer(1),
            CellValue::Integer(2),
            CellValue::Integer(3)
        ])
    );
}

#[tokio::test]
async fn select_with_no_rows_reports_zero() {
    let Some(editor) = connect_editor().await else {
        return;
    };

    let result = run(&editor, "SELECT 1 AS n WHERE false").await;
    assert_eq!(result.columns, ["n"]);
    assert!(result.rows.is_empty());
    assert_eq!(result.message, "Query executed successfully, 0 rows returned.");
}

#[tokio::test]
async fn non_row_statement_reports_affected_rows() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(
        &editor,
        &[
            "DROP TABLE IF EXISTS sqldesk_exec_t",
            "CREATE TABLE sqldesk_exec_t (id int)",
        ],
    )
    .await;

    let result = run(&editor, "DELETE FROM sqldesk_exec_t WHERE false").await;
    assert!(result.columns.is_empty());
    assert!(result.rows.is_empty());
    assert_eq!(
        result.message,
        "Command executed successfully. Rows affected: 0"
    );

    let result = run(
        &editor,
        "INSERT INTO sqldesk_exec_t VALUES (1), (2), (3)",
    )
    .await;
    assert_eq!(
        result.message,
        "Command executed successfully. Rows affected: 3"
    );

    run_setup(&editor, &["DROP TABLE IF EXISTS sqldesk_exec_t"]).await;
}

#[tokio::test]
async fn mid_stream_failure_rides_in_the_envelope() {
    let Some(editor) = connect_editor().await else {
        return;
    };

    // Plans fine, blows up during evaluation
    let result = run(&editor, "SELECT 1/0 AS boom").await;
    assert_eq!(result.columns, ["boom"]);
    assert!(result.rows.is_empty());
    assert!(
        result.error.starts_with("Error iterating result rows:"),
        "{}",
        result.error
    );
    assert!(result.error.contains("division by zero"), "{}", result.error);
    assert_eq!(result.message, "");

    // The transaction rolled back and the connection is still usable
    let after = run(&editor, "SELECT 1 AS n").await;
    assert_eq!(after.rows, [[CellValue::Integer(1)]]);
}

#[tokio::test]
async fn invalid_sql_is_an_execution_error() {
    let Some(editor) = connect_editor().await else {
        return;
    };

    let err = editor
        .execute_query(&ExecuteQueryRequest {
            schema_name: "public".to_string(),
            query: "SELEC 1".to_string(),
            page: 1,
            page_size: 100,
        })
        .await
        .expect_err("syntax error should fail the call");
    assert!(err.to_string().contains("syntax"), "{err}");
}

#[tokio::test]
async fn search_path_scopes_unqualified_names() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(
        &editor,
        &[
            "CREATE SCHEMA IF NOT EXISTS sqldesk_alt",
            "DROP TABLE IF EXISTS sqldesk_alt.scoped",
            "CREATE TABLE sqldesk_alt.scoped (v int)",
            "INSERT INTO sqldesk_alt.scoped VALUES (7)",
        ],
    )
    .await;

    let result = editor
        .execute_query(&ExecuteQueryRequest {
            schema_name: "sqldesk_alt".to_string(),
            query: "SELECT v FROM scoped".to_string(),
            page: 1,
            page_size: 100,
        })
        .await
        .expect("execute_query")
        .result;
    assert_eq!(result.rows, [[CellValue::Integer(7)]]);

    run_setup(
        &editor,
        &[
            "DROP TABLE IF EXISTS sqldesk_alt.scoped",
            "DROP SCHEMA IF EXISTS sqldesk_alt",
        ],
    )
    .await;
}
