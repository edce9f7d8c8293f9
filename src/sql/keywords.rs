//! Recognized SQL keywords
//!
//! A closed enumeration: the keyword pass suggests from this list, the
//! context analyzer extracts the last significant keyword from it, and the
//! semantic buckets (table-focused vs. column-focused) are subsets of it.

/// A recognized SQL keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlKeyword {
    Select,
    From,
    Join,
    Where,
    On,
    GroupBy,
    OrderBy,
    Update,
    InsertInto,
    Into,
    DeleteFrom,
    Set,
    And,
    Or,
}

/// Every recognized keyword, in suggestion order.
pub const ALL_KEYWORDS: [SqlKeyword; 14] = [
    SqlKeyword::Select,
    SqlKeyword::From,
    SqlKeyword::Join,
    SqlKeyword::Where,
    SqlKeyword::On,
    SqlKeyword::GroupBy,
    SqlKeyword::OrderBy,
    SqlKeyword::Update,
    SqlKeyword::InsertInto,
    SqlKeyword::Into,
    SqlKeyword::DeleteFrom,
    SqlKeyword::Set,
    SqlKeyword::And,
    SqlKeyword::Or,
];

impl SqlKeyword {
    /// Canonical upper-case spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SqlKeyword::Select => "SELECT",
            SqlKeyword::From => "FROM",
            SqlKeyword::Join => "JOIN",
            SqlKeyword::Where => "WHERE",
            SqlKeyword::On => "ON",
            SqlKeyword::GroupBy => "GROUP BY",
            SqlKeyword::OrderBy => "ORDER BY",
            SqlKeyword::Update => "UPDATE",
            SqlKeyword::InsertInto => "INSERT INTO",
            SqlKeyword::Into => "INTO",
            SqlKeyword::DeleteFrom => "DELETE FROM",
            SqlKeyword::Set => "SET",
            SqlKeyword::And => "AND",
            SqlKeyword::Or => "OR",
        }
    }

    /// Match a single whitespace-delimited token, case-insensitively.
    ///
    /// Anything containing whitespace is not a token and never matches,
    /// so the two-word spellings stay out of reach here; their
    /// single-token forms (FROM, INTO) catch those clauses instead.
    pub fn from_token(token: &str) -> Option<Self> {
        if token.contains(char::is_whitespace) {
            return None;
        }
        let upper = token.to_uppercase();
        ALL_KEYWORDS.into_iter().find(|kw| kw.as_str() == upper)
    }

    /// Whether this keyword participates in last-keyword extraction.
    ///
    /// AND/OR are suggested and bucketed but never reported as the last
    /// significant keyword, so a `WHERE x = 1 AND ` context still reads
    /// as WHERE.
    pub fn is_significant(self) -> bool {
        !matches!(self, SqlKeyword::And | SqlKeyword::Or)
    }

    /// Contexts where the user is most likely typing a table name.
    pub fn is_table_focused(self) -> bool {
        matches!(
            self,
            SqlKeyword::From | SqlKeyword::Join | SqlKeyword::Update | SqlKeyword::Into
        )
    }

    /// Contexts where the user is most likely typing a column name.
    pub fn is_column_focused(self) -> bool {
        matches!(
            self,
            SqlKeyword::Select
                | SqlKeyword::Where
                | SqlKeyword::On
                | SqlKeyword::GroupBy
                | SqlKeyword::OrderBy
                | SqlKeyword::Set
                | SqlKeyword::And
                | SqlKeyword::Or
        )
    }
}
