use crate::ast::{expr_eq, Expr};
use crate::rename::Renamable;

/// A `CREATE FUNCTION` (§3.1). Keyed by `name` (functions are not
/// database-scoped in this dialect).
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    pub cluster: Option<String>,
}

impl Renamable for FunctionInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && self.params.len() == other.params.len()
            && self.params.iter().zip(&other.params).all(|(a, b)| a.eq_ignore_ascii_case(b))
            && expr_eq(&self.body, &other.body)
    }
}
