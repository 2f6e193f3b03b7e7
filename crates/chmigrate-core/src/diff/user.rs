use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::rename::detect_renames;
use crate::schema::{Schema, UserInfo};

/// Users have no "rename" primitive exposed by this dialect beyond
/// create/drop; a property change becomes `CREATE USER OR REPLACE`
/// (`ALTER USER` is considered too complex to synthesize reliably, §4.5).
pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.users, &target.users);

    for (from, to) in &result.renames {
        let to_user = &target.users[to];
        let from_user = &current.users[from];
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::User,
            change: ChangeKind::Replace,
            up_sql: format!("{}\n\n{}", drop(from, from_user).up_sql, create(to_user, false).up_sql),
            down_sql: format!("{}\n\n{}", drop(to, to_user).up_sql, create(from_user, false).up_sql),
        });
    }

    for (_, user) in &result.remaining_target {
        out.push(Diff {
            object: user.name.clone(),
            kind: ObjectKind::User,
            change: ChangeKind::Create,
            up_sql: create(user, false).up_sql,
            down_sql: create(user, false).down_sql,
        });
    }

    for (name, user) in &result.remaining_current {
        out.push(drop(name, user));
    }

    for (name, current_user) in &current.users {
        let Some(target_user) = target.users.get(name) else { continue };
        if result.renames.iter().any(|(_, to)| to == name) {
            continue;
        }
        use crate::rename::Renamable;
        if current_user.properties_match(target_user) {
            continue;
        }
        out.push(Diff {
            object: name.clone(),
            kind: ObjectKind::User,
            change: ChangeKind::Replace,
            up_sql: create(target_user, true).up_sql,
            down_sql: create(current_user, true).up_sql,
        });
    }

    out
}

fn create(user: &UserInfo, or_replace: bool) -> Diff {
    let keyword = if or_replace { "CREATE USER OR REPLACE" } else { "CREATE USER" };
    let mut s = format!("{keyword} {}{}", user.name, cluster_clause(user.cluster.as_deref()));
    if let Some(method) = &user.identified_by {
        s.push_str(&format!(" {}", method.to_sql()));
    }
    s.push_str(&format!(" {}", user.host.to_sql()));
    if let Some(valid_until) = &user.valid_until {
        s.push_str(&format!(" VALID UNTIL '{valid_until}'"));
    }
    if let Some(storage) = &user.storage {
        s.push_str(&format!(" IN {storage}"));
    }
    if !user.default_roles.is_empty() {
        s.push_str(&format!(" DEFAULT ROLE {}", user.default_roles.join(", ")));
    }
    if let Some(db) = &user.default_database {
        s.push_str(&format!(" DEFAULT DATABASE {db}"));
    }
    if !user.grantees.is_empty() {
        s.push_str(&format!(" GRANTEES {}", user.grantees.join(", ")));
    }

    Diff {
        object: user.name.clone(),
        kind: ObjectKind::User,
        change: ChangeKind::Create,
        up_sql: s,
        down_sql: format!("DROP USER IF EXISTS {}{}", user.name, cluster_clause(user.cluster.as_deref())),
    }
}

fn drop(name: &str, user: &UserInfo) -> Diff {
    let created = create(user, false);
    Diff {
        object: name.to_string(),
        kind: ObjectKind::User,
        change: ChangeKind::Drop,
        up_sql: format!("DROP USER IF EXISTS {name}{}", cluster_clause(user.cluster.as_deref())),
        down_sql: created.up_sql,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::HostRestriction;

    fn user(name: &str) -> UserInfo {
        UserInfo {
            name: name.to_string(),
            cluster: None,
            identified_by: None,
            host: HostRestriction::Any,
            valid_until: None,
            storage: None,
            default_roles: vec![],
            default_database: None,
            grantees: vec![],
        }
    }

    #[test]
    fn new_user_is_a_plain_create() {
        let current = Schema::default();
        let mut target = Schema::default();
        target.users.insert("alice".into(), user("alice"));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Create);
        assert!(diffs[0].up_sql.starts_with("CREATE USER alice"));
    }

    #[test]
    fn property_change_is_create_user_or_replace() {
        let mut current = Schema::default();
        current.users.insert("alice".into(), user("alice"));
        let mut target = Schema::default();
        let mut u = user("alice");
        u.default_database = Some("analytics".into());
        target.users.insert("alice".into(), u);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Replace);
        assert!(diffs[0].up_sql.starts_with("CREATE USER OR REPLACE alice"));
    }
}
