//! Suggestion assembly, scoring, and deduplication.

use crate::sql::context::QueryContext;
use crate::sql::keywords::{ALL_KEYWORDS, SqlKeyword};
use serde::Serialize;
use std::collections::HashSet;

/// Base score for keyword suggestions.
pub const KEYWORD_SCORE: i32 = 40;
/// Base score for the schema-name suggestion.
pub const SCHEMA_SCORE: i32 = 90;

/// What a suggestion completes to. The wire spelling is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Keyword,
    Schema,
    Table,
    Column,
}

/// One autocomplete candidate, ready for the caller's UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocompleteSuggestion {
    /// Text inserted on acceptance.
    pub value: String,
    /// Display label; columns carry their data type.
    pub caption: String,
    pub meta: SuggestionKind,
    pub score: i32,
}

/// Context-dependent base scores for columns and tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSet {
    pub column: i32,
    pub table: i32,
}

impl ScoreSet {
    /// Inside a SELECT list columns dominate; elsewhere tables do.
    pub fn for_context(ctx: &QueryContext) -> Self {
        if ctx.in_select_list {
            ScoreSet {
                column: 130,
                table: 70,
            }
        } else {
            ScoreSet {
                column: 115,
                table: 120,
            }
        }
    }

    /// Table score, boosted back to 120 when the last keyword puts the
    /// cursor in table position (FROM, JOIN, UPDATE, INTO) outside a
    /// SELECT list.
    pub fn table_score(&self, ctx: &QueryContext) -> i32 {
        if !ctx.in_select_list
            && ctx
                .last_keyword
                .is_some_and(SqlKeyword::is_table_focused)
        {
            120
        } else {
            self.table
        }
    }
}

/// Char-wise prefix match; identifiers can contain multibyte characters,
/// so no byte slicing.
fn starts_with_ci(value: &str, prefix: &str) -> bool {
    let mut value_chars = value.chars();
    prefix
        .chars()
        .all(|p| value_chars.next().is_some_and(|v| v.eq_ignore_ascii_case(&p)))
}

/// Split `alias.partial` at the last dot. Returns `None` when the
/// prefix has no dot.
pub fn split_dotted_prefix(prefix: &str) -> Option<(&str, &str)> {
    prefix.rsplit_once('.')
}

/// Accumulates candidates, then sorts and deduplicates on [`finish`].
///
/// [`finish`]: SuggestionSet::finish
#[derive(Debug, Default)]
pub struct SuggestionSet {
    items: Vec<AutocompleteSuggestion>,
    seen_columns: HashSet<String>,
}

impl SuggestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keywords matching the prefix, uppercase, at the keyword score.
    pub fn push_keywords(&mut self, prefix: &str) {
        for kw in ALL_KEYWORDS {
            let spelling = kw.as_str();
            if starts_with_ci(spelling, prefix) {
                self.items.push(AutocompleteSuggestion {
                    value: spelling.to_string(),
                    caption: spelling.to_string(),
                    meta: SuggestionKind::Keyword,
                    score: KEYWORD_SCORE,
                });
            }
        }
    }

    /// The request's schema name, when it matches the prefix.
    pub fn push_schema(&mut self, schema_name: &str, prefix: &str) {
        if !schema_name.is_empty() && starts_with_ci(schema_name, prefix) {
            self.items.push(AutocompleteSuggestion {
                value: schema_name.to_string(),
                caption: schema_name.to_string(),
                meta: SuggestionKind::Schema,
                score: SCHEMA_SCORE,
            });
        }
    }

    /// A table candidate. Prefix filtering happens at the database
    /// lookup, so none is applied here.
    pub fn push_table(&mut self, table_name: &str, score: i32) {
        self.items.push(AutocompleteSuggestion {
            value: table_name.to_string(),
            caption: table_name.to_string(),
            meta: SuggestionKind::Table,
            score,
        });
    }

    /// A column candidate, filtered against the prefix and collapsed
    /// across tables by name.
    pub fn push_column(&mut self, column_name: &str, data_type: &str, prefix: &str, score: i32) {
        if !starts_with_ci(column_name, prefix) {
            return;
        }
        if !self.seen_columns.insert(column_name.to_string()) {
            return;
        }
        self.items.push(AutocompleteSuggestion {
            value: column_name.to_string(),
            caption: format!("{} ({})", column_name, data_type),
            meta: SuggestionKind::Column,
            score,
        });
    }

    /// A column candidate for a dotted prefix (`alias.partial`),
    /// filtered against the partial column name alone.
    pub fn push_dotted_column(
        &mut self,
        column_name: &str,
        data_type: &str,
        column_prefix: &str,
        score: i32,
    ) {
        self.push_column(column_name, data_type, column_prefix, score);
    }

    /// Sort by score descending then value ascending, and keep one
    /// entry per value, the highest-scoring one.
    pub fn finish(mut self) -> Vec<AutocompleteSuggestion> {
        self.items
            .sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.value.cmp(&b.value)));
        let mut seen = HashSet::new();
        self.items.retain(|s| seen.insert(s.value.clone()));
        self.items
    }
}
