use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::ast::statement::NamedCollectionParam;
use crate::rename::{detect_renames, Renamable};
use crate::schema::{NamedCollectionInfo, Schema};

/// Named collections have no rename primitive in the dialect; a rename is
/// effectively a replace-with-new-name followed by a drop of the old name
/// (§4.5).
pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.named_collections, &target.named_collections);

    for (from, to) in &result.renames {
        let from_nc = &current.named_collections[from];
        let to_nc = &target.named_collections[to];
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::NamedCollection,
            change: ChangeKind::Replace,
            up_sql: format!("{}\n\n{}", create(to_nc, false).up_sql, drop(from, from_nc).up_sql),
            down_sql: format!("{}\n\n{}", create(from_nc, false).up_sql, drop(to, to_nc).up_sql),
        });
    }

    for (_, nc) in &result.remaining_target {
        out.push(create(nc, false));
    }

    for (name, nc) in &result.remaining_current {
        out.push(drop(name, nc));
    }

    for (name, current_nc) in &current.named_collections {
        let Some(target_nc) = target.named_collections.get(name) else { continue };
        if result.renames.iter().any(|(_, to)| to == name) {
            continue;
        }
        if current_nc.properties_match(target_nc) {
            continue;
        }
        out.push(Diff {
            object: name.clone(),
            kind: ObjectKind::NamedCollection,
            change: ChangeKind::Replace,
            up_sql: create(target_nc, true).up_sql,
            down_sql: create(current_nc, true).up_sql,
        });
    }

    out
}

fn create(nc: &NamedCollectionInfo, or_replace: bool) -> Diff {
    let keyword = if or_replace { "CREATE OR REPLACE NAMED COLLECTION" } else { "CREATE NAMED COLLECTION" };
    let overridable = if nc.overridable { "" } else { " NOT OVERRIDABLE" };
    let comment = nc.comment.as_deref().map(|c| format!(" COMMENT '{}'", c.replace('\'', "''"))).unwrap_or_default();
    let params = if nc.parameters.is_empty() {
        String::new()
    } else {
        format!(" AS {}", nc.parameters.iter().map(param_sql).collect::<Vec<_>>().join(", "))
    };

    Diff {
        object: nc.name.clone(),
        kind: ObjectKind::NamedCollection,
        change: ChangeKind::Create,
        up_sql: format!("{keyword} {}{}{overridable}{comment}{params}", nc.name, cluster_clause(nc.cluster.as_deref())),
        down_sql: format!("DROP NAMED COLLECTION IF EXISTS {}{}", nc.name, cluster_clause(nc.cluster.as_deref())),
    }
}

fn drop(name: &str, nc: &NamedCollectionInfo) -> Diff {
    let created = create(nc, false);
    Diff {
        object: name.to_string(),
        kind: ObjectKind::NamedCollection,
        change: ChangeKind::Drop,
        up_sql: format!("DROP NAMED COLLECTION IF EXISTS {name}{}", cluster_clause(nc.cluster.as_deref())),
        down_sql: created.up_sql,
    }
}

fn param_sql(param: &NamedCollectionParam) -> String {
    let mut s = format!("{} = {}", param.key, param.value.to_sql());
    if let Some(overridable) = param.overridable {
        s.push_str(if overridable { " OVERRIDABLE" } else { " NOT OVERRIDABLE" });
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn nc(name: &str) -> NamedCollectionInfo {
        NamedCollectionInfo {
            name: name.to_string(),
            cluster: None,
            comment: None,
            overridable: true,
            parameters: vec![NamedCollectionParam { key: "url".into(), value: Expr::string("http://x"), overridable: None }],
        }
    }

    #[test]
    fn new_named_collection_is_a_plain_create() {
        let current = Schema::default();
        let mut target = Schema::default();
        target.named_collections.insert("s3_conn".into(), nc("s3_conn"));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("CREATE NAMED COLLECTION s3_conn"));
    }

    #[test]
    fn parameter_change_is_create_or_replace() {
        let mut current = Schema::default();
        current.named_collections.insert("s3_conn".into(), nc("s3_conn"));
        let mut target = Schema::default();
        let mut n = nc("s3_conn");
        n.parameters[0].value = Expr::string("http://y");
        target.named_collections.insert("s3_conn".into(), n);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("CREATE OR REPLACE NAMED COLLECTION"));
    }
}
