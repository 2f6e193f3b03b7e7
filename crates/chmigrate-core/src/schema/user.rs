use crate::ast::statement::{HostRestriction, IdentificationMethod};
use crate::rename::Renamable;

/// A `CREATE USER` (§3.1). Keyed by `name`.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub name: String,
    pub cluster: Option<String>,
    pub identified_by: Option<IdentificationMethod>,
    pub host: HostRestriction,
    pub valid_until: Option<String>,
    pub storage: Option<String>,
    pub default_roles: Vec<String>,
    pub default_database: Option<String>,
    pub grantees: Vec<String>,
}

impl Renamable for UserInfo {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn properties_match(&self, other: &Self) -> bool {
        self.cluster == other.cluster
            && self.identified_by == other.identified_by
            && self.host == other.host
            && self.valid_until == other.valid_until
            && self.storage == other.storage
            && sorted_eq(&self.default_roles, &other.default_roles)
            && self.default_database == other.default_database
            && sorted_eq(&self.grantees, &other.grantees)
    }
}

fn sorted_eq(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}
