use crate::ast::{comment_eq, engine_eq, EngineClause};
use crate::rename::Renamable;

/// A `CREATE DATABASE` (§3.1). Keyed by `name`.
#[derive(Debug, Clone)]
pub struct DatabaseInfo {
    pub name: String,
    pub engine: Option<EngineClause>,
    pub cluster: Option<String>,
    pub comment: Option<String>,
}

impl Renamable for DatabaseInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && engine_eq(self.engine.as_ref(), other.engine.as_ref())
            && comment_eq(self.comment.as_deref(), other.comment.as_deref())
    }
}
