use std::collections::BTreeMap;

use crate::ast::statement::{GrantTarget, PrivilegeSpec};
use crate::ast::expr_eq;
use crate::rename::Renamable;

/// A `CREATE ROLE` (§3.1). Keyed by `name`.
#[derive(Debug, Clone)]
pub struct RoleInfo {
    pub name: String,
    pub settings: BTreeMap<String, crate::ast::Expr>,
    pub cluster: Option<String>,
}

impl Renamable for RoleInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && self.settings.len() == other.settings.len()
            && self
                .settings
                .iter()
                .all(|(k, v)| other.settings.get(k).is_some_and(|ov| expr_eq(v, ov)))
    }
}

/// A single `GRANT` (§3.1). The grant-key triple `(grantee, privileges,
/// target)` is what makes two grants "the same grant" across schemas
/// (§4.5, glossary "Grant key").
#[derive(Debug, Clone)]
pub struct GrantInfo {
    pub grantee: String,
    pub privileges: Vec<PrivilegeSpec>,
    pub target: GrantTarget,
    pub with_grant_option: bool,
    pub with_admin_option: bool,
    pub cluster: Option<String>,
}

impl GrantInfo {
    /// The `(grantee, sorted privileges, target)` key used to detect
    /// identical grants across schemas.
    #[must_use]
    pub fn key(&self) -> String {
        let mut privs: Vec<String> = self.privileges.iter().map(PrivilegeSpec::to_sql).collect();
        privs.sort();
        format!("{}|{}|{}", self.grantee, privs.join(","), self.target.to_sql())
    }
}
