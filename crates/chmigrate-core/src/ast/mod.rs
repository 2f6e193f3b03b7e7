//! Parsed-DDL AST types and the equality predicates over them (§4.1).
//!
//! `chmigrate-core` never parses SQL text itself — see
//! [`crate::interfaces::SchemaParser`]. This module only defines the shape
//! of the tree a parser hands back, plus the structural/semantic equality
//! used by the comparator.

pub mod equality;
pub mod expr;
pub mod statement;
pub mod types;

pub use equality::*;
pub use expr::{BinaryOp, Expr, IntervalUnit, Literal, UnaryOp};
pub use statement::*;
pub use types::DataType;

/// Strips a single layer of surrounding backticks from an identifier.
///
/// `` `foo` `` becomes `foo`; `foo` is returned unchanged. Does not touch
/// case, since object names are keyed case-sensitively (§3.2) even though
/// identifiers *inside expressions* compare case-insensitively (§4.1).
#[must_use]
pub fn normalize_ident(raw: &str) -> String {
    raw.strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(raw)
        .to_string()
}

/// Joins a possibly-empty database qualifier and a name into `db.name` or
/// just `name`.
#[must_use]
pub fn qualify(database: Option<&str>, name: &str) -> String {
    match database {
        Some(db) if !db.is_empty() => format!("{db}.{name}"),
        _ => name.to_string(),
    }
}
