use crate::ast::statement::{EngineClause, RefreshClause, SelectStatement};
use crate::ast::{comment_eq, engine_eq, refresh_eq, select_eq};
use crate::rename::Renamable;

/// A `CREATE [MATERIALIZED] VIEW` (§3.1). Keyed by `database.name`.
#[derive(Debug, Clone)]
pub struct ViewInfo {
    pub name: String,
    pub database: String,
    pub cluster: Option<String>,
    pub materialized: bool,
    pub or_replace: bool,
    pub refresh: Option<RefreshClause>,
    pub append: bool,
    pub to_target: Option<String>,
    pub engine: Option<EngineClause>,
    /// Stored for round-trip completeness; never read by equality/diffing
    /// (§9 open questions — POPULATE is ignored on both sides).
    pub populate: bool,
    pub select: SelectStatement,
    pub comment: Option<String>,
}

impl ViewInfo {
    #[must_use]
    pub fn qualified(&self) -> String {
        crate::ast::qualify(Some(&self.database), &self.name)
    }
}

/// View equality (§4.1): content-only — cluster is deliberately excluded
/// (ignored for views, per spec), ENGINE differences are tolerated when
/// either side omits it, and POPULATE/OR REPLACE/IF NOT EXISTS are
/// creation-time directives that never affect equality.
impl Renamable for ViewInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.database == other.database
            && self.materialized == other.materialized
            && select_eq(&self.select, &other.select)
            && refresh_eq(self.refresh.as_ref(), other.refresh.as_ref())
            && self.append == other.append
            && self.to_target.as_deref().map(str::to_ascii_lowercase)
                == other.to_target.as_deref().map(str::to_ascii_lowercase)
            && engine_tolerant_eq(self.engine.as_ref(), other.engine.as_ref())
            && comment_eq(self.comment.as_deref(), other.comment.as_deref())
    }
}

fn engine_tolerant_eq(a: Option<&EngineClause>, b: Option<&EngineClause>) -> bool {
    match (a, b) {
        (None, _) | (_, None) => true,
        (Some(_), Some(_)) => engine_eq(a, b),
    }
}
