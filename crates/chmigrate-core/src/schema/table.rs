use std::collections::{BTreeMap, BTreeSet};

use crate::ast::statement::ColumnDef;
use crate::ast::{comment_eq, data_type_eq, engine_eq, expr_eq, EngineClause, Expr};
use crate::rename::Renamable;

/// A `CREATE TABLE` (§3.1). Keyed by `database.name`.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: String,
    pub database: String,
    pub cluster: Option<String>,
    pub engine: Option<EngineClause>,
    pub comment: Option<String>,
    pub order_by: Option<Expr>,
    pub partition_by: Option<Expr>,
    pub primary_key: Option<Expr>,
    pub sample_by: Option<Expr>,
    pub ttl: Option<Expr>,
    pub settings: BTreeMap<String, Expr>,
    pub columns: Vec<ColumnDef>,
    pub or_replace: bool,
    pub if_not_exists: bool,
    /// `AS other_table`, resolved to a qualified name.
    pub as_source: Option<String>,
    /// Reverse of `as_source`: every table that names this one as its
    /// `AS` source, so column-level ALTERs can propagate (§3.2, §4.5).
    pub dependents: BTreeSet<String>,
}

impl TableInfo {
    #[must_use]
    pub fn qualified(&self) -> String {
        crate::ast::qualify(Some(&self.database), &self.name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

fn settings_eq(a: &BTreeMap<String, Expr>, b: &BTreeMap<String, Expr>) -> bool {
    a.len() == b.len()
        && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| expr_eq(v, bv)))
}

/// Column comparison ignoring name, used both by [`Renamable`] and by the
/// per-column ALTER diff (§4.5): data type, default expression, codec, and
/// TTL via AST equality; comments case-insensitively.
#[must_use]
pub fn column_properties_match(a: &ColumnDef, b: &ColumnDef) -> bool {
    data_type_eq(&a.data_type, &b.data_type)
        && a.default_kind == b.default_kind
        && match (&a.default_expr, &b.default_expr) {
            (None, None) => true,
            (Some(x), Some(y)) => expr_eq(x, y),
            _ => false,
        }
        && a.codec == b.codec
        && match (&a.ttl, &b.ttl) {
            (None, None) => true,
            (Some(x), Some(y)) => expr_eq(x, y),
            _ => false,
        }
        && comment_eq(a.comment.as_deref(), b.comment.as_deref())
}

impl Renamable for TableInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && self.database == other.database
            && engine_eq(self.engine.as_ref(), other.engine.as_ref())
            && comment_eq(self.comment.as_deref(), other.comment.as_deref())
            && opt_expr_match(&self.order_by, &other.order_by)
            && opt_expr_match(&self.partition_by, &other.partition_by)
            && opt_expr_match(&self.primary_key, &other.primary_key)
            && opt_expr_match(&self.sample_by, &other.sample_by)
            && opt_expr_match(&self.ttl, &other.ttl)
            && settings_eq(&self.settings, &other.settings)
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(x, y)| x.name.eq_ignore_ascii_case(&y.name) && column_properties_match(x, y))
    }
}

fn opt_expr_match(a: &Option<Expr>, b: &Option<Expr>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => expr_eq(x, y),
        _ => false,
    }
}
