//! Query context analysis
//!
//! Scans the partial query the operator is typing and produces the alias
//! map, the last significant keyword, and whether the cursor sits inside a
//! SELECT list. Pure string work; performs no I/O.

use crate::sql::keywords::SqlKeyword;
use std::collections::HashMap;

/// A table referenced in a FROM/JOIN clause, possibly schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Schema when the query wrote `schema.table`; empty means the
    /// request schema applies.
    pub schema: Option<String>,
    pub table: String,
}

/// Analyzer output for one `{current_query, prefix}` pair.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Alias (and bare table name) to table reference. Every FROM/JOIN
    /// table registers both its alias and its unqualified name, so `u.`
    /// and `users.` resolve alike.
    pub alias_map: HashMap<String, TableRef>,
    pub last_keyword: Option<SqlKeyword>,
    pub in_select_list: bool,
}

impl QueryContext {
    /// Analyze a partial query against the prefix currently being typed.
    pub fn analyze(current_query: &str, prefix: &str) -> Self {
        let cursor = cursor_position(current_query, prefix);
        let text_before = &current_query[..cursor];
        QueryContext {
            alias_map: parse_table_aliases(current_query),
            last_keyword: last_significant_keyword(text_before),
            in_select_list: is_in_select_list(current_query, cursor),
        }
    }
}

/// Locate the cursor: the last case-insensitive occurrence of `prefix`
/// in the query, falling back to the end of the query when absent. An
/// empty prefix also resolves to the end of the query.
fn cursor_position(query: &str, prefix: &str) -> usize {
    query
        .to_ascii_lowercase()
        .rfind(&prefix.to_ascii_lowercase())
        .unwrap_or(query.len())
}

/// Scan FROM/JOIN clauses for table references and their aliases.
///
/// Intentionally approximate: a token walk, not a SQL parse. Handles
/// `schema.table`, optional `AS`, omitted aliases, and trailing
/// punctuation. Keywords are never taken as aliases, so
/// `JOIN orders ON ...` registers `orders` without inventing an alias.
pub fn parse_table_aliases(query: &str) -> HashMap<String, TableRef> {
    let mut alias_map = HashMap::new();
    let tokens: Vec<&str> = query.split_whitespace().collect();

    let mut i = 0;
    while i < tokens.len() {
        let clause = tokens[i].eq_ignore_ascii_case("from") || tokens[i].eq_ignore_ascii_case("join");
        if !clause {
            i += 1;
            continue;
        }

        // Consume the table list that follows the clause. Each entry is
        // a table, optionally followed by AS and an alias; a trailing
        // comma continues the list.
        let mut pos = i + 1;
        while let Some(&raw_table) = tokens.get(pos) {
            let mut list_continues = raw_table.ends_with(',');
            let full_table = raw_table.trim_matches(|c| matches!(c, ',' | ';' | '(' | ')'));
            if full_table.is_empty() || SqlKeyword::from_token(full_table).is_some() {
                // A subquery or stray keyword, not a table name
                break;
            }
            pos += 1;

            let (schema, table) = match full_table.rsplit_once('.') {
                Some((schema, table)) => (Some(schema.to_string()), table.to_string()),
                None => (None, full_table.to_string()),
            };

            // Optional alias: skip AS, then accept the next token when
            // it looks like a plain identifier and is not a keyword.
            let mut alias = None;
            if !list_continues {
                if tokens
                    .get(pos)
                    .is_some_and(|t| t.eq_ignore_ascii_case("as"))
                {
                    pos += 1;
                }
                if let Some(&raw_alias) = tokens.get(pos) {
                    let candidate =
                        raw_alias.trim_matches(|c| matches!(c, ',' | ';' | '(' | ')'));
                    if is_identifier(candidate) && SqlKeyword::from_token(candidate).is_none() {
                        alias = Some(candidate);
                        list_continues = raw_alias.ends_with(',');
                        pos += 1;
                    }
                }
            }

            let target = TableRef {
                schema,
                table: table.clone(),
            };
            alias_map.insert(alias.unwrap_or(&table).to_string(), target.clone());
            // The unqualified table name always resolves too
            alias_map.insert(table, target);

            if !list_continues {
                break;
            }
        }

        i += 1;
    }

    alias_map
}

fn is_identifier(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Decide whether the cursor sits inside a SELECT list.
///
/// Heuristics, in order:
/// 1. The last non-whitespace character before the cursor is a comma.
/// 2. A SELECT appears before the cursor and the first FROM after it is
///    absent or past the cursor.
/// 3. The segment between that SELECT and its FROM is blank (the user
///    wrote FROM first and is now filling in the column list).
/// 4. A comma appears after that FROM but before the cursor (adding a
///    column after a subquery).
fn is_in_select_list(query: &str, cursor: usize) -> bool {
    let bytes = query.as_bytes();

    // Rule 1: trailing comma before cursor
    if cursor > 0 {
        let mut i = cursor;
        while i > 0 && bytes[i - 1].is_ascii_whitespace() {
            i -= 1;
        }
        if i > 0 && bytes[i - 1] == b',' {
            return true;
        }
    }

    let upper = query.to_ascii_uppercase();
    let Some(select_idx) = upper.find("SELECT") else {
        return false;
    };
    let list_start = select_idx + "SELECT".len();

    // Rule 2: no FROM yet, or FROM past the cursor
    let Some(from_rel) = upper[list_start..].find("FROM") else {
        return true;
    };
    let from_abs = list_start + from_rel;
    if from_abs > cursor {
        return true;
    }

    // Rule 3: empty select list between SELECT and FROM
    if upper[list_start..from_abs].trim().is_empty() {
        return true;
    }

    // Rule 4: comma between that FROM and the cursor
    match upper[list_start..cursor].rfind(',') {
        Some(comma_rel) => list_start + comma_rel > from_abs,
        None => false,
    }
}

/// Walk tokens backwards over the text before the cursor and return the
/// first significant recognized keyword, if any.
fn last_significant_keyword(text_before: &str) -> Option<SqlKeyword> {
    text_before
        .split_whitespace()
        .rev()
        .find_map(|token| SqlKeyword::from_token(token).filter(|kw| kw.is_significant()))
}
