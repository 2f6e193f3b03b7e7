use crate::ast::statement::NamedCollectionParam;
use crate::ast::{comment_eq, expr_eq};
use crate::rename::Renamable;

/// A `CREATE NAMED COLLECTION` (§3.1). Keyed by `name`.
#[derive(Debug, Clone)]
pub struct NamedCollectionInfo {
    pub name: String,
    pub cluster: Option<String>,
    pub comment: Option<String>,
    pub overridable: bool,
    pub parameters: Vec<NamedCollectionParam>,
}

impl Renamable for NamedCollectionInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && self.overridable == other.overridable
            && comment_eq(self.comment.as_deref(), other.comment.as_deref())
            && self.parameters.len() == other.parameters.len()
            && self.parameters.iter().zip(&other.parameters).all(|(a, b)| {
                a.key.eq_ignore_ascii_case(&b.key)
                    && expr_eq(&a.value, &b.value)
                    && a.overridable == b.overridable
            })
    }
}
