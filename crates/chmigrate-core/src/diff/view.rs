use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::rename::{detect_renames, Renamable};
use crate::schema::{Schema, ViewInfo};

/// Regular views have a `CREATE OR REPLACE VIEW` form; materialized views
/// do not, so any change to one is a DROP+CREATE (§4.5).
pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.views, &target.views);

    for (from, to) in &result.renames {
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::View,
            change: ChangeKind::Rename,
            up_sql: format!("RENAME TABLE {from} TO {to}"),
            down_sql: format!("RENAME TABLE {to} TO {from}"),
        });
    }

    for (key, view) in &result.remaining_target {
        out.push(create(key, view, false));
    }

    for (key, view) in &result.remaining_current {
        out.push(drop(key, view));
    }

    for (key, current_view) in &current.views {
        let Some(target_view) = target.views.get(key) else { continue };
        if result.renames.iter().any(|(_, to)| to == key) {
            continue;
        }
        if current_view.properties_match(target_view) {
            continue;
        }

        if target_view.materialized {
            out.push(Diff {
                object: key.clone(),
                kind: ObjectKind::View,
                change: ChangeKind::Replace,
                up_sql: format!("{}\n\n{}", drop(key, current_view).up_sql, create(key, target_view, false).up_sql),
                down_sql: format!("{}\n\n{}", drop(key, target_view).up_sql, create(key, current_view, false).up_sql),
            });
        } else {
            out.push(Diff {
                object: key.clone(),
                kind: ObjectKind::View,
                change: ChangeKind::Replace,
                up_sql: create(key, target_view, true).up_sql,
                down_sql: create(key, current_view, true).up_sql,
            });
        }
    }

    out
}

fn create(key: &str, view: &ViewInfo, or_replace: bool) -> Diff {
    let kind = if view.materialized { "MATERIALIZED VIEW" } else { "VIEW" };
    let keyword = if or_replace { format!("CREATE OR REPLACE {kind}") } else { format!("CREATE {kind}") };
    let refresh = view
        .refresh
        .as_ref()
        .map(|r| {
            let kw = match r.kind {
                crate::ast::statement::RefreshKind::Every => "EVERY",
                crate::ast::statement::RefreshKind::After => "AFTER",
            };
            format!(" REFRESH {kw} {} {}", r.value.to_sql(), r.unit.keyword())
        })
        .unwrap_or_default();
    let to_target = view.to_target.as_deref().map(|t| format!(" TO {t}")).unwrap_or_default();
    let engine = view.engine.as_ref().map(|e| format!(" ENGINE = {}", e.to_sql())).unwrap_or_default();
    let comment = view.comment.as_deref().map(|c| format!(" COMMENT '{}'", c.replace('\'', "''"))).unwrap_or_default();

    Diff {
        object: key.to_string(),
        kind: ObjectKind::View,
        change: ChangeKind::Create,
        up_sql: format!(
            "{keyword} {key}{}{refresh}{to_target}{engine} AS {}{comment}",
            cluster_clause(view.cluster.as_deref()),
            view.select.to_sql(),
        ),
        down_sql: drop_sql(key, view),
    }
}

fn drop(key: &str, view: &ViewInfo) -> Diff {
    let created = create(key, view, false);
    Diff {
        object: key.to_string(),
        kind: ObjectKind::View,
        change: ChangeKind::Drop,
        up_sql: drop_sql(key, view),
        down_sql: created.up_sql,
    }
}

fn drop_sql(key: &str, view: &ViewInfo) -> String {
    let keyword = if view.materialized { "DROP TABLE" } else { "DROP VIEW" };
    format!("{keyword} {key}{}", cluster_clause(view.cluster.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::{FromClause, SelectItem, SelectStatement};
    use crate::ast::Expr;

    fn view(materialized: bool, limit: Option<i64>) -> ViewInfo {
        ViewInfo {
            name: "v".into(),
            database: "d".into(),
            cluster: None,
            materialized,
            or_replace: false,
            refresh: None,
            append: false,
            to_target: None,
            engine: None,
            populate: false,
            select: SelectStatement {
                columns: vec![SelectItem { expr: Expr::Wildcard { table: None }, alias: None }],
                from: Some(FromClause::Table { database: Some("d".into()), name: "t".into(), alias: None }),
                limit: limit.map(|n| Expr::number(n.to_string())),
                ..Default::default()
            },
            comment: None,
        }
    }

    #[test]
    fn regular_view_query_change_is_create_or_replace() {
        let mut current = Schema::default();
        current.views.insert("d.v".into(), view(false, None));
        let mut target = Schema::default();
        target.views.insert("d.v".into(), view(false, Some(10)));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("CREATE OR REPLACE VIEW"));
    }

    #[test]
    fn materialized_view_query_change_is_drop_and_create_s3() {
        let mut current = Schema::default();
        current.views.insert("d.v".into(), view(true, None));
        let mut target = Schema::default();
        target.views.insert("d.v".into(), view(true, Some(10)));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("DROP TABLE d.v"));
        assert!(diffs[0].up_sql.contains("CREATE MATERIALIZED VIEW"));
    }
}
