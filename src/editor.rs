//! The resource editor facade.
//!
//! Ties the introspector, the context analyzer, the suggestion engine,
//! and the executor together behind the three operations a hosting
//! service calls: schema retrieval, autocomplete, and query execution.

use crate::config::ConnectionConfig;
use crate::db::schema::SchemaInformation;
use crate::db::types::QueryResult;
use crate::db::{Backend, executor, introspect};
use crate::error::EditorResult;
use crate::sql::context::QueryContext;
use crate::sql::keywords::SqlKeyword;
use crate::sql::suggest::{AutocompleteSuggestion, ScoreSet, SuggestionSet, split_dotted_prefix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Autocomplete input: where the operator is typing and what around it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteRequest {
    pub schema_name: String,
    /// Explicit table the editor is scoped to, when known.
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub current_query: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutocompleteResponse {
    pub suggestions: Vec<AutocompleteSuggestion>,
}

/// A SQL statement to run, with pagination echo parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteQueryRequest {
    pub schema_name: String,
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteQueryResponse {
    pub result: QueryResult,
}

/// Interactive SQL editor core bound to one database backend.
pub struct ResourceEditor {
    backend: Backend,
}

impl ResourceEditor {
    pub fn new(backend: Backend) -> Self {
        ResourceEditor { backend }
    }

    /// Connect to the configured database and wrap it in an editor.
    pub async fn connect(config: &ConnectionConfig) -> EditorResult<Self> {
        Ok(ResourceEditor::new(Backend::connect(config).await?))
    }

    /// Cancel whatever statement is currently in flight.
    pub async fn cancel_query(&self) -> EditorResult<()> {
        self.backend.cancel_query().await
    }

    /// Live structure of one schema: tables with columns, indexes, and
    /// constraints. Never returns a partial schema.
    pub async fn get_schema(&self, schema_name: &str) -> EditorResult<SchemaInformation> {
        let conn = self.backend.acquire().await?;
        introspect::table_schema(&conn, schema_name).await
    }

    /// Ranked, deduplicated suggestions for the cursor position
    /// described by the request. Best-effort: individual lookup
    /// failures degrade the list instead of failing the call.
    pub async fn get_autocomplete(
        &self,
        req: &AutocompleteRequest,
    ) -> EditorResult<AutocompleteResponse> {
        let conn = self.backend.acquire().await?;
        let ctx = QueryContext::analyze(&req.current_query, &req.prefix);
        let scores = ScoreSet::for_context(&ctx);
        let mut set = SuggestionSet::new();

        // Dot-notation pass: alias.partial resolves to that table's columns
        if let Some((alias, column_prefix)) = split_dotted_prefix(&req.prefix) {
            if let Some(target) = ctx.alias_map.get(alias) {
                let schema = target.schema.as_deref().unwrap_or(&req.schema_name);
                match introspect::columns_for_table(&conn, schema, &target.table).await {
                    Ok(columns) => {
                        for col in &columns {
                            set.push_dotted_column(
                                &col.column_name,
                                &col.data_type,
                                column_prefix,
                                scores.column,
                            );
                        }
                    }
                    Err(e) => log::warn!(
                        "autocomplete: columns for {}.{} unavailable: {}",
                        schema,
                        target.table,
                        e
                    ),
                }
            }
        }

        set.push_keywords(&req.prefix);
        set.push_schema(&req.schema_name, &req.prefix);

        // Contextual pass: what the last keyword says the user is typing
        let table_focused = ctx.last_keyword.is_some_and(SqlKeyword::is_table_focused);
        let column_focused = ctx.last_keyword.is_some_and(SqlKeyword::is_column_focused);
        let want_tables = !column_focused || (table_focused && !ctx.in_select_list);

        if want_tables {
            match introspect::tables_matching(&conn, &req.schema_name, &req.prefix).await {
                Ok(tables) => {
                    let table_score = scores.table_score(&ctx);
                    for table in &tables {
                        set.push_table(table, table_score);
                    }
                }
                Err(e) => log::warn!("autocomplete: table lookup failed: {}", e),
            }
        }

        // Columns from every distinct aliased table plus the explicit
        // table, in a deterministic order
        let mut targets: BTreeSet<(String, String)> = ctx
            .alias_map
            .values()
            .map(|t| {
                (
                    t.schema
                        .clone()
                        .unwrap_or_else(|| req.schema_name.clone()),
                    t.table.clone(),
                )
            })
            .collect();
        if let Some(table) = req.table_name.as_deref().filter(|t| !t.is_empty()) {
            targets.insert((req.schema_name.clone(), table.to_string()));
        }
        for (schema, table) in &targets {
            match introspect::columns_for_table(&conn, schema, table).await {
                Ok(columns) => {
                    for col in &columns {
                        set.push_column(&col.column_name, &col.data_type, &req.prefix, scores.column);
                    }
                }
                Err(e) => log::warn!(
                    "autocomplete: columns for {}.{} unavailable: {}",
                    schema,
                    table,
                    e
                ),
            }
        }

        Ok(AutocompleteResponse {
            suggestions: set.finish(),
        })
    }

    /// Run an arbitrary SQL statement and return its result envelope.
    pub async fn execute_query(
        &self,
        req: &ExecuteQueryRequest,
    ) -> EditorResult<ExecuteQueryResponse> {
        let mut conn = self.backend.acquire().await?;

        // Scope unqualified names in the statement to the request schema
        if !req.schema_name.is_empty() {
            let search_path = format!("{}, public", req.schema_name);
            if let Err(e) = conn
                .execute(
                    "SELECT set_config('search_path', $1, false)",
                    &[&search_path],
                )
                .await
            {
                log::warn!("failed to set search_path to {}: {}", req.schema_name, e);
            }
        }

        let mut result = executor::run_query(&mut conn, &req.query).await?;
        executor::apply_pagination(&mut result, req.page, req.page_size);
        Ok(ExecuteQueryResponse { result })
    }
}
