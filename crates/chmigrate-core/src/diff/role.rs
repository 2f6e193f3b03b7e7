use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::rename::detect_renames;
use crate::schema::{GrantInfo, RoleInfo, Schema};

/// Roles get the full CREATE/ALTER/DROP/RENAME set (§4.5); grants are
/// diffed separately as a set keyed by their grant-key triple.
pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    out.extend(diff_roles(current, target));
    out.extend(diff_grants(current, target));
    out
}

fn diff_roles(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.roles, &target.roles);

    for (from, to) in &result.renames {
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::Role,
            change: ChangeKind::Rename,
            up_sql: format!("ALTER ROLE {from} RENAME TO {to}"),
            down_sql: format!("ALTER ROLE {to} RENAME TO {from}"),
        });
    }

    for (name, role) in &result.remaining_target {
        out.push(create(name, role));
    }

    for (name, role) in &result.remaining_current {
        out.push(drop(name, role));
    }

    for (name, current_role) in &current.roles {
        let Some(target_role) = target.roles.get(name) else { continue };
        if result.renames.iter().any(|(_, to)| to == name) {
            continue;
        }
        use crate::rename::Renamable;
        if current_role.properties_match(target_role) {
            continue;
        }
        // §9 open question: `RoleDiffAlter` re-emits the full settings map
        // rather than a per-setting delta.
        out.push(Diff {
            object: name.clone(),
            kind: ObjectKind::Role,
            change: ChangeKind::Alter,
            up_sql: alter_settings(name, target_role),
            down_sql: alter_settings(name, current_role),
        });
    }

    out
}

fn create(name: &str, role: &RoleInfo) -> Diff {
    Diff {
        object: name.to_string(),
        kind: ObjectKind::Role,
        change: ChangeKind::Create,
        up_sql: format!("CREATE ROLE {name}{}{}", cluster_clause(role.cluster.as_deref()), settings_clause(role)),
        down_sql: format!("DROP ROLE {name}{}", cluster_clause(role.cluster.as_deref())),
    }
}

fn drop(name: &str, role: &RoleInfo) -> Diff {
    let created = create(name, role);
    Diff {
        object: name.to_string(),
        kind: ObjectKind::Role,
        change: ChangeKind::Drop,
        up_sql: format!("DROP ROLE {name}{}", cluster_clause(role.cluster.as_deref())),
        down_sql: created.up_sql,
    }
}

fn alter_settings(name: &str, role: &RoleInfo) -> String {
    format!("ALTER ROLE {name}{}{}", cluster_clause(role.cluster.as_deref()), settings_clause(role))
}

fn settings_clause(role: &RoleInfo) -> String {
    if role.settings.is_empty() {
        return String::new();
    }
    let items = role
        .settings
        .iter()
        .map(|(k, v)| format!("{k} = {}", v.to_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" SETTINGS {items}")
}

/// Grants diffed as a set keyed by the `(grantee, privileges, target)`
/// triple (glossary "Grant key"): missing pairs produce GRANT, extras
/// produce REVOKE.
fn diff_grants(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();

    for (key, grant) in &target.grants {
        if !current.grants.contains_key(key) {
            out.push(grant_diff(grant));
        }
    }

    for (key, grant) in &current.grants {
        if !target.grants.contains_key(key) {
            out.push(revoke_diff(grant));
        }
    }

    out
}

fn grant_diff(grant: &GrantInfo) -> Diff {
    Diff {
        object: grant.key(),
        kind: ObjectKind::Grant,
        change: ChangeKind::Create,
        up_sql: grant_sql(grant),
        down_sql: revoke_sql(grant),
    }
}

fn revoke_diff(grant: &GrantInfo) -> Diff {
    Diff {
        object: grant.key(),
        kind: ObjectKind::Grant,
        change: ChangeKind::Drop,
        up_sql: revoke_sql(grant),
        down_sql: grant_sql(grant),
    }
}

fn grant_sql(grant: &GrantInfo) -> String {
    let mut privs: Vec<String> = grant.privileges.iter().map(crate::ast::statement::PrivilegeSpec::to_sql).collect();
    privs.sort();
    let mut s = format!(
        "GRANT{} {} ON {} TO {}",
        cluster_clause(grant.cluster.as_deref()),
        privs.join(", "),
        grant.target.to_sql(),
        grant.grantee,
    );
    if grant.with_grant_option {
        s.push_str(" WITH GRANT OPTION");
    }
    if grant.with_admin_option {
        s.push_str(" WITH ADMIN OPTION");
    }
    s
}

fn revoke_sql(grant: &GrantInfo) -> String {
    let mut privs: Vec<String> = grant.privileges.iter().map(crate::ast::statement::PrivilegeSpec::to_sql).collect();
    privs.sort();
    format!(
        "REVOKE{} {} ON {} FROM {}",
        cluster_clause(grant.cluster.as_deref()),
        privs.join(", "),
        grant.target.to_sql(),
        grant.grantee,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::{GrantTarget, PrivilegeSpec};
    use std::collections::BTreeMap;

    fn role(name: &str) -> RoleInfo {
        RoleInfo { name: name.to_string(), settings: BTreeMap::new(), cluster: None }
    }

    fn grant(grantee: &str) -> GrantInfo {
        GrantInfo {
            grantee: grantee.to_string(),
            privileges: vec![PrivilegeSpec { name: "SELECT".into(), columns: vec![] }],
            target: GrantTarget::Database("analytics".into()),
            with_grant_option: false,
            with_admin_option: false,
            cluster: None,
        }
    }

    #[test]
    fn new_role_is_a_plain_create() {
        let current = Schema::default();
        let mut target = Schema::default();
        target.roles.insert("analyst".into(), role("analyst"));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("CREATE ROLE analyst"));
    }

    #[test]
    fn missing_grant_emits_a_grant_and_reverse_revoke() {
        let current = Schema::default();
        let mut target = Schema::default();
        let g = grant("alice");
        target.grants.insert(g.key(), g);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("GRANT SELECT"));
        assert!(diffs[0].down_sql.starts_with("REVOKE SELECT"));
    }

    #[test]
    fn extra_grant_emits_a_revoke() {
        let mut current = Schema::default();
        let g = grant("alice");
        current.grants.insert(g.key(), g);
        let target = Schema::default();

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("REVOKE SELECT"));
    }
}
