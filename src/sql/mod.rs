//! SQL analysis
//!
//! Lightweight lexical analysis of partial queries and the suggestion
//! engine built on top of it. No full SQL parse happens here: the
//! analyzer only recognizes enough structure (aliases, the last
//! significant keyword, SELECT-list position) to rank completions.

pub mod context;
pub mod keywords;
pub mod suggest;

pub use context::QueryContext;
pub use keywords::SqlKeyword;
pub use suggest::{AutocompleteSuggestion, SuggestionKind};
