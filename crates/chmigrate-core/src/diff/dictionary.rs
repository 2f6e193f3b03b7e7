use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::rename::{detect_renames, Renamable};
use crate::schema::{DictionaryInfo, Schema};

/// Dictionaries have no ALTER form (§4.5): any property change beyond a
/// pure rename is emitted as `CREATE OR REPLACE DICTIONARY`.
pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.dictionaries, &target.dictionaries);

    for (from, to) in &result.renames {
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::Dictionary,
            change: ChangeKind::Rename,
            up_sql: format!("RENAME DICTIONARY {from} TO {to}"),
            down_sql: format!("RENAME DICTIONARY {to} TO {from}"),
        });
    }

    for (key, dict) in &result.remaining_target {
        out.push(create(key, dict, false));
    }

    for (key, dict) in &result.remaining_current {
        out.push(drop(key, dict));
    }

    for (key, current_dict) in &current.dictionaries {
        let Some(target_dict) = target.dictionaries.get(key) else { continue };
        if result.renames.iter().any(|(_, to)| to == key) {
            continue;
        }
        if current_dict.properties_match(target_dict) {
            continue;
        }
        out.push(Diff {
            object: key.clone(),
            kind: ObjectKind::Dictionary,
            change: ChangeKind::Replace,
            up_sql: create(key, target_dict, true).up_sql,
            down_sql: create(key, current_dict, true).up_sql,
        });
    }

    out
}

fn create(key: &str, dict: &DictionaryInfo, or_replace: bool) -> Diff {
    let keyword = if or_replace { "CREATE OR REPLACE DICTIONARY" } else { "CREATE DICTIONARY" };
    let columns = dict.columns.iter().map(column_sql).collect::<Vec<_>>().join(", ");
    let primary_key = if dict.primary_key.is_empty() {
        String::new()
    } else {
        format!(" PRIMARY KEY {}", dict.primary_key.join(", "))
    };
    let comment = dict.comment.as_deref().map(|c| format!(" COMMENT '{}'", c.replace('\'', "''"))).unwrap_or_default();
    let settings = if dict.settings.is_empty() {
        String::new()
    } else {
        let inner = dict.settings.iter().map(|(k, v)| format!("{k} = {}", v.to_sql())).collect::<Vec<_>>().join(", ");
        format!(" SETTINGS({inner})")
    };

    Diff {
        object: key.to_string(),
        kind: ObjectKind::Dictionary,
        change: ChangeKind::Create,
        up_sql: format!(
            "{keyword} {key}{} ({columns}){primary_key} SOURCE({}) LAYOUT({}) LIFETIME(MIN {} MAX {}){settings}{comment}",
            cluster_clause(dict.cluster.as_deref()),
            named_params_sql(&dict.source),
            named_params_sql(&dict.layout),
            dict.lifetime.min,
            dict.lifetime.max,
        ),
        down_sql: format!("DROP DICTIONARY IF EXISTS {key}{}", cluster_clause(dict.cluster.as_deref())),
    }
}

fn drop(key: &str, dict: &DictionaryInfo) -> Diff {
    let created = create(key, dict, false);
    Diff {
        object: key.to_string(),
        kind: ObjectKind::Dictionary,
        change: ChangeKind::Drop,
        up_sql: format!("DROP DICTIONARY IF EXISTS {key}{}", cluster_clause(dict.cluster.as_deref())),
        down_sql: created.up_sql,
    }
}

fn column_sql(column: &crate::ast::statement::ColumnDef) -> String {
    let mut s = format!("{} {}", column.name, column.data_type.to_sql());
    if let Some(comment) = &column.comment {
        s.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
    }
    s
}

fn named_params_sql(params: &crate::ast::statement::NamedParams) -> String {
    let inner = params.params.iter().map(|(k, v)| format!("{k} {}", v.to_sql())).collect::<Vec<_>>().join(" ");
    format!("{}({inner})", params.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::{ColumnDef, LifetimeClause, NamedParams};
    use crate::ast::DataType;
    use crate::ast::Expr;

    fn dict(layout_name: &str) -> DictionaryInfo {
        DictionaryInfo {
            name: "d".into(),
            database: "db".into(),
            cluster: None,
            comment: None,
            columns: vec![ColumnDef::new("id", DataType::UInt64)],
            primary_key: vec!["id".into()],
            source: NamedParams { name: "HTTP".into(), params: vec![("url".into(), Expr::string("x"))] },
            layout: NamedParams { name: layout_name.into(), params: vec![] },
            lifetime: LifetimeClause { min: 0, max: 300 },
            settings: Default::default(),
        }
    }

    #[test]
    fn hashed_layout_equivalence_produces_no_diff_s4() {
        let mut current = Schema::default();
        current.dictionaries.insert("db.d".into(), dict("HASHED"));
        let mut target = Schema::default();
        target.dictionaries.insert("db.d".into(), dict("COMPLEX_KEY_HASHED"));
        let diffs = diff(&current, &target);
        assert!(diffs.is_empty());
    }

    #[test]
    fn lifetime_change_is_a_replace() {
        let mut current = Schema::default();
        current.dictionaries.insert("db.d".into(), dict("HASHED"));
        let mut target = Schema::default();
        let mut d = dict("HASHED");
        d.lifetime = LifetimeClause { min: 0, max: 900 };
        target.dictionaries.insert("db.d".into(), d);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].up_sql.starts_with("CREATE OR REPLACE DICTIONARY"));
    }

    #[test]
    fn settings_change_is_a_replace_and_settings_are_emitted() {
        let mut current = Schema::default();
        current.dictionaries.insert("db.d".into(), dict("HASHED"));
        let mut target = Schema::default();
        let mut d = dict("HASHED");
        d.settings.insert("max_threads".into(), Expr::number("4"));
        target.dictionaries.insert("db.d".into(), d);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Replace);
        assert!(diffs[0].up_sql.contains("SETTINGS(max_threads = 4)"));
    }
}
