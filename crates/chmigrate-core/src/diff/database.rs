use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::ast::comment_eq;
use crate::rename::detect_renames;
use crate::schema::{DatabaseInfo, Schema};

pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.databases, &target.databases);

    for (from, to) in &result.renames {
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::Database,
            change: ChangeKind::Rename,
            up_sql: format!("RENAME DATABASE {from} TO {to}"),
            down_sql: format!("RENAME DATABASE {to} TO {from}"),
        });
    }

    for (name, db) in &result.remaining_target {
        out.push(create(name, db));
    }

    for (name, db) in &result.remaining_current {
        out.push(drop(name, db));
    }

    for (name, current_db) in &current.databases {
        if let Some(target_db) = target.databases.get(name) {
            if !comment_eq(current_db.comment.as_deref(), target_db.comment.as_deref()) {
                out.push(Diff {
                    object: name.clone(),
                    kind: ObjectKind::Database,
                    change: ChangeKind::Alter,
                    up_sql: alter_comment(name, current_db, target_db.comment.as_deref()),
                    down_sql: alter_comment(name, target_db, current_db.comment.as_deref()),
                });
            }
        }
    }

    out
}

fn create(name: &str, db: &DatabaseInfo) -> Diff {
    let engine = db.engine.as_ref().map(|e| format!(" ENGINE = {}", e.to_sql())).unwrap_or_default();
    let comment = db.comment.as_deref().map(|c| format!(" COMMENT '{}'", c.replace('\'', "''"))).unwrap_or_default();
    Diff {
        object: name.to_string(),
        kind: ObjectKind::Database,
        change: ChangeKind::Create,
        up_sql: format!("CREATE DATABASE {name}{}{engine}{comment}", cluster_clause(db.cluster.as_deref())),
        down_sql: format!("DROP DATABASE {name}{}", cluster_clause(db.cluster.as_deref())),
    }
}

fn drop(name: &str, db: &DatabaseInfo) -> Diff {
    let created = create(name, db);
    Diff {
        object: name.to_string(),
        kind: ObjectKind::Database,
        change: ChangeKind::Drop,
        up_sql: format!("DROP DATABASE {name}{}", cluster_clause(db.cluster.as_deref())),
        down_sql: created.up_sql,
    }
}

fn alter_comment(name: &str, db: &DatabaseInfo, comment: Option<&str>) -> String {
    let comment = comment.map(|c| format!("'{}'", c.replace('\'', "''"))).unwrap_or_else(|| "''".to_string());
    format!("ALTER DATABASE {name}{} MODIFY COMMENT {comment}", cluster_clause(db.cluster.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::EngineClause;

    fn db(name: &str, comment: Option<&str>) -> DatabaseInfo {
        DatabaseInfo {
            name: name.to_string(),
            engine: Some(EngineClause::new("Atomic", vec![])),
            cluster: None,
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn new_database_produces_a_create_and_reverse_drop() {
        let current = Schema::default();
        let mut target = Schema::default();
        target.databases.insert("analytics".into(), db("analytics", None));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("CREATE DATABASE analytics"));
        assert!(diffs[0].down_sql.starts_with("DROP DATABASE analytics"));
    }

    #[test]
    fn comment_change_is_an_alter() {
        let mut current = Schema::default();
        current.databases.insert("analytics".into(), db("analytics", None));
        let mut target = Schema::default();
        target.databases.insert("analytics".into(), db("analytics", Some("hi")));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Alter);
        assert!(diffs[0].up_sql.contains("MODIFY COMMENT 'hi'"));
    }
}
