//! Shared helpers for the integration suite.

use sqldesk::config::{ConnectionConfig, SslMode};
use sqldesk::editor::ResourceEditor;

/// Test database connection config, overridable via TEST_DB_* env vars.
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig {
        host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: std::env::var("TEST_DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5433),
        database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "test_db".to_string()),
        username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "test_user".to_string()),
        password: Some(
            std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "test_password".to_string()),
        ),
        ssl_mode: SslMode::Disable,
    }
}

/// Connect an editor to the test database, or `None` (with a skip
/// message) when it is not reachable.
pub async fn connect_editor() -> Option<ResourceEditor> {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = test_config();
    match ResourceEditor::connect(&config).await {
        Ok(editor) => Some(editor),
        Err(e) => {
            eprintln!(
                "Skipping test: database not available at {}:{} - {}",
                config.host, config.port, e
            );
            None
        }
    }
}

/// Run DDL/DML setup statements, ignoring individual failures so a
/// leftover table from an aborted run does not wedge the suite.
pub async fn run_setup(editor: &ResourceEditor, statements: &[&str]) {
    for sql in statements {
        let req = sqldesk::editor::ExecuteQueryRequest {
            schema_name: String::new(),
            query: (*sql).to_string(),
            page: 1,
            page_size: 100,
        };
        if let Err(e) = editor.execute_query(&req).await {
            eprintln!("setup statement failed ({sql}): {e}");
        }
    }
}
