//! Autocomplete against a live database.

use crate::common::{connect_editor, run_setup};
use sqldesk::editor::{AutocompleteRequest, ResourceEditor};
use sqldesk::sql::SuggestionKind;

const SETUP: &[&str] = &[
    "DROP TABLE IF EXISTS sqldesk_ac_orders",
    "DROP TABLE IF EXISTS sqldesk_ac_users",
    "CREATE TABLE sqldesk_ac_users (
        id serial PRIMARY KEY,
        name text NOT NULL,
        created_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE TABLE sqldesk_ac_orders (
        id serial PRIMARY KEY,
        user_id integer NOT NULL,
        created_at timestamptz NOT NULL DEFAULT now()
    )",
];

const TEARDOWN: &[&str] = &[
    "DROP TABLE IF EXISTS sqldesk_ac_orders",
    "DROP TABLE IF EXISTS sqldesk_ac_users",
];

async fn complete(editor: &ResourceEditor, query: &str, prefix: &str) -> Vec<sqldesk::sql::AutocompleteSuggestion> {
    editor
        .get_autocomplete(&AutocompleteRequest {
            schema_name: "public".to_string(),
            table_name: None,
            current_query: query.to_string(),
            prefix: prefix.to_string(),
        })
        .await
        .expect("get_autocomplete")
        .suggestions
}

fn assert_ranked(suggestions: &[sqldesk::sql::AutocompleteSuggestion]) {
    for pair in suggestions.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].value < pair[1].value),
            "out of order: {:?} then {:?}",
            pair[0],
            pair[1]
        );
    }
    let mut values: Vec<&str> = suggestions.iter().map(|s| s.value.as_str()).collect();
    values.sort_unstable();
    values.dedup();
    assert_eq!(values.len(), suggestions.len(), "duplicate values present");
}

#[tokio::test]
async fn alias_dot_prefix_suggests_that_tables_columns() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(&editor, SETUP).await;

    let suggestions = complete(
        &editor,
        "SELECT u. FROM public.sqldesk_ac_users u",
        "u.",
    )
    .await;
    assert_ranked(&suggestions);

    let id = suggestions
        .iter()
        .find(|s| s.value == "id")
        .expect("id suggested");
    assert_eq!(id.meta, SuggestionKind::Column);
    assert_eq!(id.caption, "id (integer)");

    let name = suggestions
        .iter()
        .find(|s| s.value == "name")
        .expect("name suggested");
    assert_eq!(name.caption, "name (text)");

    // Columns outrank every keyword
    let top_keyword_rank = suggestions
        .iter()
        .position(|s| s.meta == SuggestionKind::Keyword);
    let id_rank = suggestions.iter().position(|s| s.value == "id").unwrap();
    if let Some(kw_rank) = top_keyword_rank {
        assert!(id_rank < kw_rank);
    }

    run_setup(&editor, TEARDOWN).await;
}

#[tokio::test]
async fn from_context_ranks_tables_first() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(&editor, SETUP).await;

    let suggestions = complete(&editor, "SELECT * FROM ", "").await;
    assert_ranked(&suggestions);

    let users = suggestions
        .iter()
        .find(|s| s.value == "sqldesk_ac_users")
        .expect("table suggested");
    assert_eq!(users.meta, SuggestionKind::Table);
    assert_eq!(users.score, 120);

    run_setup(&editor, TEARDOWN).await;
}

#[tokio::test]
async fn select_list_ranks_columns_over_tables() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(&editor, SETUP).await;

    let suggestions = complete(&editor, "SELECT  FROM sqldesk_ac_users", "").await;
    assert_ranked(&suggestions);

    let name = suggestions
        .iter()
        .find(|s| s.value == "name")
        .expect("column suggested");
    assert_eq!(name.score, 130);

    let table = suggestions
        .iter()
        .find(|s| s.value == "sqldesk_ac_orders")
        .expect("table still suggested");
    assert_eq!(table.score, 70);

    let name_rank = suggestions.iter().position(|s| s.value == "name").unwrap();
    let table_rank = suggestions
        .iter()
        .position(|s| s.value == "sqldesk_ac_orders")
        .unwrap();
    assert!(name_rank < table_rank);

    run_setup(&editor, TEARDOWN).await;
}

#[tokio::test]
async fn shared_column_appears_once() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(&editor, SETUP).await;

    // Both aliased tables expose created_at
    let suggestions = complete(
        &editor,
        "SELECT  FROM sqldesk_ac_users u JOIN sqldesk_ac_orders o ON o.user_id = u.id",
        "",
    )
    .await;
    assert_ranked(&suggestions);

    let created: Vec<_> = suggestions
        .iter()
        .filter(|s| s.value == "created_at")
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0].caption,
        "created_at (timestamp with time zone)"
    );

    run_setup(&editor, TEARDOWN).await;
}

#[tokio::test]
async fn unknown_alias_still_yields_other_passes() {
    let Some(editor) = connect_editor().await else {
        return;
    };

    let suggestions = complete(&editor, "SELECT x. FROM sqldesk_ac_users u", "x.").await;
    // No dotted columns, and the non-dotted passes find nothing that
    // starts with "x." either
    assert!(suggestions.iter().all(|s| s.meta != SuggestionKind::Column));
}

#[tokio::test]
async fn prefix_filters_every_non_keyword_value() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(&editor, SETUP).await;

    let suggestions = complete(&editor, "SELECT * FROM sqldesk_ac", "sqldesk_ac").await;
    assert_ranked(&suggestions);
    for s in &suggestions {
        if s.meta != SuggestionKind::Keyword {
            assert!(
                s.value.to_lowercase().starts_with("sqldesk_ac"),
                "unfiltered suggestion {:?}",
                s
            );
        }
    }
    assert!(suggestions.iter().any(|s| s.value == "sqldesk_ac_users"));

    run_setup(&editor, TEARDOWN).await;
}

#[tokio::test]
async fn identical_requests_yield_identical_sequences() {
    let Some(editor) = connect_editor().await else {
        return;
    };
    run_setup(&editor, SETUP).await;

    let first = complete(&editor, "SELECT * FROM ", "").await;
    let second = complete(&editor, "SELECT * FROM ", "").await;
    assert_eq!(first, second);

    run_setup(&editor, TEARDOWN).await;
}
