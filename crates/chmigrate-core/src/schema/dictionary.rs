use std::collections::BTreeMap;

use crate::ast::statement::{ColumnDef, LifetimeClause, NamedParams};
use crate::ast::{comment_eq, lifetime_eq, named_params_eq, Expr};
use crate::rename::Renamable;
use crate::schema::table::column_properties_match;

/// A `CREATE DICTIONARY` (§3.1). Keyed by `database.name`.
#[derive(Debug, Clone)]
pub struct DictionaryInfo {
    pub name: String,
    pub database: String,
    pub cluster: Option<String>,
    pub comment: Option<String>,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
    pub source: NamedParams,
    pub layout: NamedParams,
    pub lifetime: LifetimeClause,
    pub settings: BTreeMap<String, Expr>,
}

impl DictionaryInfo {
    #[must_use]
    pub fn qualified(&self) -> String {
        crate::ast::qualify(Some(&self.database), &self.name)
    }
}

impl Renamable for DictionaryInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && self.database == other.database
            && comment_eq(self.comment.as_deref(), other.comment.as_deref())
            && self.primary_key.len() == other.primary_key.len()
            && self
                .primary_key
                .iter()
                .zip(&other.primary_key)
                .all(|(x, y)| x.eq_ignore_ascii_case(y))
            && named_params_eq(&self.source, &other.source, false)
            && named_params_eq(&self.layout, &other.layout, true)
            && lifetime_eq(self.lifetime, other.lifetime)
            && settings_eq(&self.settings, &other.settings)
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(x, y)| x.name.eq_ignore_ascii_case(&y.name) && column_properties_match(x, y))
    }
}

fn settings_eq(a: &BTreeMap<String, Expr>, b: &BTreeMap<String, Expr>) -> bool {
    a.len() == b.len()
        && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| crate::ast::expr_eq(v, bv)))
}
