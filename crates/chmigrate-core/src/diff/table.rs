use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::ast::equality::{comment_eq, engine_eq, expr_eq};
use crate::ast::statement::{ColumnDef, DefaultKind};
use crate::flatten::flatten_columns;
use crate::rename::detect_renames;
use crate::schema::{column_properties_match, Schema, TableInfo};
use crate::validate::{is_integration_engine, restricted_clauses};

/// Engines that never store data themselves (§4.3 clause restrictions):
/// any change at all requires dropping and recreating the table, because
/// there is no ALTER form for their defining clauses.
fn is_view_like(engine: &str) -> bool {
    !restricted_clauses(engine).is_empty() && !engine.eq_ignore_ascii_case("Memory")
}

pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.tables, &target.tables);

    for (from, to) in &result.renames {
        let from_table = &current.tables[from];
        let to_table = &target.tables[to];
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::Table,
            change: ChangeKind::Rename,
            up_sql: rename_sql(from_table, to_table),
            down_sql: rename_sql(to_table, from_table),
        });
    }

    for (key, table) in &result.remaining_target {
        out.push(create(key, table));
    }

    for (key, table) in &result.remaining_current {
        out.push(drop(key, table));
    }

    for (key, current_table) in &current.tables {
        let Some(target_table) = target.tables.get(key) else { continue };
        if result.renames.iter().any(|(_, to)| to == key) {
            continue;
        }

        let engine_name = target_table.engine.as_ref().map(|e| e.name.as_str()).unwrap_or_default();
        let current_engine_name = current_table.engine.as_ref().map(|e| e.name.as_str()).unwrap_or_default();
        // §4.5: integration engines (Kafka, MySQL, S3, ...) have no ALTER
        // form for their underlying data either, so any real difference
        // between current and target is resolved as a DROP+CREATE rather
        // than column-level ALTERs.
        let needs_replace = !engine_eq(current_table.engine.as_ref(), target_table.engine.as_ref())
            || !opt_eq(&current_table.order_by, &target_table.order_by)
            || !opt_eq(&current_table.partition_by, &target_table.partition_by)
            || !opt_eq(&current_table.primary_key, &target_table.primary_key)
            || !opt_eq(&current_table.sample_by, &target_table.sample_by)
            || !opt_eq(&current_table.ttl, &target_table.ttl)
            || current_table.settings != target_table.settings
            || is_view_like(engine_name)
            || is_integration_engine(engine_name)
            || is_integration_engine(current_engine_name);

        if needs_replace {
            use crate::rename::Renamable;
            if current_table.properties_match(target_table) {
                continue;
            }
            out.push(Diff {
                object: key.clone(),
                kind: ObjectKind::Table,
                change: ChangeKind::Replace,
                up_sql: format!("{}\n\n{}", drop(key, current_table).up_sql, create(key, target_table).up_sql),
                down_sql: format!("{}\n\n{}", drop(key, target_table).up_sql, create(key, current_table).up_sql),
            });
            continue;
        }

        let column_changes = column_diffs(key, current_table, target_table);
        if !column_changes.is_empty() {
            out.extend(propagate_to_dependents(current, target, current_table, &column_changes));
        }
        out.extend(column_changes);

        if !comment_eq(current_table.comment.as_deref(), target_table.comment.as_deref()) {
            out.push(Diff {
                object: key.clone(),
                kind: ObjectKind::Table,
                change: ChangeKind::Alter,
                up_sql: alter_comment(key, target_table.comment.as_deref()),
                down_sql: alter_comment(key, current_table.comment.as_deref()),
            });
        }
    }

    out
}

/// Storage engines that propagate a source's column changes directly
/// rather than storing data of their own (§4.5 "AS-dependency
/// propagation"): these dependents are dropped and recreated instead of
/// ALTERed.
fn is_view_like_dependent(engine: &str) -> bool {
    matches!(
        engine.to_ascii_lowercase().as_str(),
        "distributed" | "merge" | "buffer" | "dictionary" | "view" | "liveview" | "memory"
    )
}

/// §3.2/§4.5: when a table that other tables reference via `AS` changes
/// columns, each dependent gets a companion diff carrying the same
/// change — an ALTER for data-storing engines, a DROP+CREATE for
/// view-like ones (`Distributed, Merge, Buffer, Dictionary, View,
/// LiveView, Memory`). Reverse SQL mirrors the source's own reversal.
fn propagate_to_dependents(current: &Schema, target: &Schema, source: &TableInfo, column_changes: &[Diff]) -> Vec<Diff> {
    let mut out = Vec::new();

    for dep_key in &source.dependents {
        let Some(current_dep) = current.tables.get(dep_key) else { continue };
        let Some(target_dep) = target.tables.get(dep_key) else { continue };

        let engine_name = current_dep.engine.as_ref().map(|e| e.name.as_str()).unwrap_or_default();

        if is_view_like_dependent(engine_name) {
            out.push(Diff {
                object: dep_key.clone(),
                kind: ObjectKind::Table,
                change: ChangeKind::Replace,
                up_sql: format!("{}\n\n{}", drop(dep_key, current_dep).up_sql, create(dep_key, target_dep).up_sql),
                down_sql: format!("{}\n\n{}", drop(dep_key, target_dep).up_sql, create(dep_key, current_dep).up_sql),
            });
        } else {
            for change in column_changes {
                out.push(Diff {
                    object: dep_key.clone(),
                    kind: ObjectKind::Table,
                    change: ChangeKind::Alter,
                    up_sql: change.up_sql.replacen(&format!("ALTER TABLE {}", source_key(source)), &format!("ALTER TABLE {dep_key}"), 1),
                    down_sql: change.down_sql.replacen(&format!("ALTER TABLE {}", source_key(source)), &format!("ALTER TABLE {dep_key}"), 1),
                });
            }
        }
    }

    out
}

fn source_key(source: &TableInfo) -> String {
    source.qualified()
}

fn opt_eq(a: &Option<crate::ast::Expr>, b: &Option<crate::ast::Expr>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => expr_eq(x, y),
        _ => false,
    }
}

/// Column-level `ALTER TABLE` ops (§4.5): add/drop/modify driven off a
/// name-keyed comparison of the flattened (`Nested` expanded) target
/// columns against the flattened current columns.
fn column_diffs(key: &str, current: &TableInfo, target: &TableInfo) -> Vec<Diff> {
    let current_cols = flatten_columns(&current.columns);
    let target_cols = flatten_columns(&target.columns);

    let mut out = Vec::new();

    for target_col in &target_cols {
        match current_cols.iter().find(|c| c.name.eq_ignore_ascii_case(&target_col.name)) {
            None => out.push(Diff {
                object: key.to_string(),
                kind: ObjectKind::Table,
                change: ChangeKind::Alter,
                up_sql: format!("ALTER TABLE {key} ADD COLUMN {}", column_sql(target_col)),
                down_sql: format!("ALTER TABLE {key} DROP COLUMN {}", target_col.name),
            }),
            Some(current_col) if !column_properties_match(current_col, target_col) => out.push(Diff {
                object: key.to_string(),
                kind: ObjectKind::Table,
                change: ChangeKind::Alter,
                up_sql: format!("ALTER TABLE {key} MODIFY COLUMN {}", column_sql(target_col)),
                down_sql: format!("ALTER TABLE {key} MODIFY COLUMN {}", column_sql(current_col)),
            }),
            Some(_) => {}
        }
    }

    for current_col in &current_cols {
        if !target_cols.iter().any(|c| c.name.eq_ignore_ascii_case(&current_col.name)) {
            out.push(Diff {
                object: key.to_string(),
                kind: ObjectKind::Table,
                change: ChangeKind::Alter,
                up_sql: format!("ALTER TABLE {key} DROP COLUMN {}", current_col.name),
                down_sql: format!("ALTER TABLE {key} ADD COLUMN {}", column_sql(current_col)),
            });
        }
    }

    out
}

fn column_sql(column: &ColumnDef) -> String {
    let mut s = format!("{} {}", column.name, column.data_type.to_sql());
    if let Some(expr) = &column.default_expr {
        s.push_str(&format!(" {} {}", column.default_kind.keyword(), expr.to_sql()));
    } else if column.default_kind != DefaultKind::Default {
        s.push_str(&format!(" {}", column.default_kind.keyword()));
    }
    if let Some(codec) = &column.codec {
        s.push_str(&format!(" CODEC({codec})"));
    }
    if let Some(ttl) = &column.ttl {
        s.push_str(&format!(" TTL {}", ttl.to_sql()));
    }
    if let Some(comment) = &column.comment {
        s.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
    }
    s
}

fn create(key: &str, table: &TableInfo) -> Diff {
    let columns = table.columns.iter().map(column_sql).collect::<Vec<_>>().join(", ");
    let engine = table.engine.as_ref().map(|e| format!(" ENGINE = {}", e.to_sql())).unwrap_or_default();
    let order_by = table.order_by.as_ref().map(|e| format!(" ORDER BY {}", e.to_sql())).unwrap_or_default();
    let partition_by = table.partition_by.as_ref().map(|e| format!(" PARTITION BY {}", e.to_sql())).unwrap_or_default();
    let primary_key = table.primary_key.as_ref().map(|e| format!(" PRIMARY KEY {}", e.to_sql())).unwrap_or_default();
    let sample_by = table.sample_by.as_ref().map(|e| format!(" SAMPLE BY {}", e.to_sql())).unwrap_or_default();
    let ttl = table.ttl.as_ref().map(|e| format!(" TTL {}", e.to_sql())).unwrap_or_default();
    let settings = if table.settings.is_empty() {
        String::new()
    } else {
        let items = table.settings.iter().map(|(k, v)| format!("{k} = {}", v.to_sql())).collect::<Vec<_>>().join(", ");
        format!(" SETTINGS {items}")
    };
    let comment = table.comment.as_deref().map(|c| format!(" COMMENT '{}'", c.replace('\'', "''"))).unwrap_or_default();

    Diff {
        object: key.to_string(),
        kind: ObjectKind::Table,
        change: ChangeKind::Create,
        up_sql: format!(
            "CREATE TABLE {key}{} ({columns}){engine}{order_by}{partition_by}{primary_key}{sample_by}{ttl}{settings}{comment}",
            cluster_clause(table.cluster.as_deref()),
        ),
        down_sql: format!("DROP TABLE {key}{}", cluster_clause(table.cluster.as_deref())),
    }
}

fn drop(key: &str, table: &TableInfo) -> Diff {
    let created = create(key, table);
    Diff {
        object: key.to_string(),
        kind: ObjectKind::Table,
        change: ChangeKind::Drop,
        up_sql: format!("DROP TABLE {key}{}", cluster_clause(table.cluster.as_deref())),
        down_sql: created.up_sql,
    }
}

fn alter_comment(key: &str, comment: Option<&str>) -> String {
    let comment = comment.map(|c| format!("'{}'", c.replace('\'', "''"))).unwrap_or_else(|| "''".to_string());
    format!("ALTER TABLE {key} MODIFY COMMENT {comment}")
}

fn rename_sql(from: &TableInfo, to: &TableInfo) -> String {
    format!("RENAME TABLE {} TO {}", from.qualified(), to.qualified())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::EngineClause;
    use crate::ast::{DataType, Expr};
    use std::collections::BTreeMap;

    fn base_table(name: &str) -> TableInfo {
        TableInfo {
            name: name.to_string(),
            database: "d".to_string(),
            cluster: None,
            engine: Some(EngineClause::new("MergeTree", vec![])),
            comment: None,
            order_by: Some(Expr::ident("id")),
            partition_by: None,
            primary_key: None,
            sample_by: None,
            ttl: None,
            settings: BTreeMap::new(),
            columns: vec![ColumnDef::new("id", DataType::UInt64)],
            or_replace: false,
            if_not_exists: false,
            as_source: None,
            dependents: Default::default(),
        }
    }

    #[test]
    fn adding_a_column_is_an_alter_add_column() {
        let mut current = Schema::default();
        current.tables.insert("d.t".into(), base_table("t"));
        let mut target = Schema::default();
        let mut t = base_table("t");
        t.columns.push(ColumnDef::new("name", DataType::String));
        target.tables.insert("d.t".into(), t);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Alter);
        assert!(diffs[0].up_sql.contains("ADD COLUMN name String"));
    }

    #[test]
    fn order_by_change_forces_a_replace() {
        let mut current = Schema::default();
        current.tables.insert("d.t".into(), base_table("t"));
        let mut target = Schema::default();
        let mut t = base_table("t");
        t.order_by = Some(Expr::ident("ts"));
        target.tables.insert("d.t".into(), t);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Replace);
        assert!(diffs[0].up_sql.starts_with("DROP TABLE"));
    }

    #[test]
    fn column_change_propagates_to_as_dependents() {
        let mut source = base_table("events");
        source.dependents.insert("d.events_mem".into());
        let dependent = base_table("events_mem");

        let mut current = Schema::default();
        current.tables.insert("d.events".into(), source.clone());
        current.tables.insert("d.events_mem".into(), dependent.clone());

        let mut target_source = source.clone();
        target_source.columns.push(ColumnDef::new("ts", DataType::DateTime(None)));
        let mut target = Schema::default();
        target.tables.insert("d.events".into(), target_source);
        target.tables.insert("d.events_mem".into(), dependent);

        let diffs = diff(&current, &target);
        let dependent_diffs: Vec<_> = diffs.iter().filter(|d| d.object == "d.events_mem").collect();
        assert_eq!(dependent_diffs.len(), 1);
        assert!(dependent_diffs[0].up_sql.contains("ALTER TABLE d.events_mem ADD COLUMN ts"));
    }

    #[test]
    fn column_change_propagates_as_drop_create_to_view_like_dependents() {
        let mut source = base_table("events");
        source.dependents.insert("d.events_mem".into());
        let mut dependent = base_table("events_mem");
        dependent.engine = Some(EngineClause::new("Memory", vec![]));

        let mut current = Schema::default();
        current.tables.insert("d.events".into(), source.clone());
        current.tables.insert("d.events_mem".into(), dependent.clone());

        let mut target_source = source.clone();
        target_source.columns.push(ColumnDef::new("ts", DataType::DateTime(None)));
        let mut target = Schema::default();
        target.tables.insert("d.events".into(), target_source);
        target.tables.insert("d.events_mem".into(), dependent);

        let diffs = diff(&current, &target);
        let dependent_diffs: Vec<_> = diffs.iter().filter(|d| d.object == "d.events_mem").collect();
        assert_eq!(dependent_diffs.len(), 1);
        assert_eq!(dependent_diffs[0].change, ChangeKind::Replace);
        assert!(dependent_diffs[0].up_sql.starts_with("DROP TABLE"));
    }

    #[test]
    fn integration_engine_column_change_is_a_replace() {
        let mut current = Schema::default();
        let mut kafka = base_table("ingest");
        kafka.engine = Some(EngineClause::new("Kafka", vec![]));
        kafka.order_by = None;
        current.tables.insert("d.ingest".into(), kafka.clone());

        let mut target = Schema::default();
        let mut target_kafka = kafka;
        target_kafka.columns.push(ColumnDef::new("raw", DataType::String));
        target.tables.insert("d.ingest".into(), target_kafka);

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Replace);
        assert!(diffs[0].up_sql.starts_with("DROP TABLE"));
    }
}
