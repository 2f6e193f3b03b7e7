use super::{cluster_clause, ChangeKind, Diff, ObjectKind};
use crate::rename::{detect_renames, Renamable};
use crate::schema::{FunctionInfo, Schema};

/// Functions have no ALTER form (§4.5): both modifications and renames
/// become DROP+CREATE.
pub fn diff(current: &Schema, target: &Schema) -> Vec<Diff> {
    let mut out = Vec::new();
    let result = detect_renames(&current.functions, &target.functions);

    for (from, to) in &result.renames {
        let from_fn = &current.functions[from];
        let to_fn = &target.functions[to];
        out.push(Diff {
            object: to.clone(),
            kind: ObjectKind::Function,
            change: ChangeKind::Replace,
            up_sql: format!("{}\n\n{}", drop(from, from_fn).up_sql, create(to, to_fn, false).up_sql),
            down_sql: format!("{}\n\n{}", drop(to, to_fn).up_sql, create(from, from_fn, false).up_sql),
        });
    }

    for (name, function) in &result.remaining_target {
        out.push(create(name, function, false));
    }

    for (name, function) in &result.remaining_current {
        out.push(drop(name, function));
    }

    for (name, current_fn) in &current.functions {
        let Some(target_fn) = target.functions.get(name) else { continue };
        if result.renames.iter().any(|(_, to)| to == name) {
            continue;
        }
        if current_fn.properties_match(target_fn) {
            continue;
        }
        out.push(Diff {
            object: name.clone(),
            kind: ObjectKind::Function,
            change: ChangeKind::Replace,
            up_sql: format!("{}\n\n{}", drop(name, current_fn).up_sql, create(name, target_fn, false).up_sql),
            down_sql: format!("{}\n\n{}", drop(name, target_fn).up_sql, create(name, current_fn, false).up_sql),
        });
    }

    out
}

fn create(name: &str, function: &FunctionInfo, or_replace: bool) -> Diff {
    let keyword = if or_replace { "CREATE OR REPLACE FUNCTION" } else { "CREATE FUNCTION" };
    let params = function.params.join(", ");
    Diff {
        object: name.to_string(),
        kind: ObjectKind::Function,
        change: ChangeKind::Create,
        up_sql: format!(
            "{keyword} {name}{} AS ({params}) -> {}",
            cluster_clause(function.cluster.as_deref()),
            function.body.to_sql(),
        ),
        down_sql: format!("DROP FUNCTION IF EXISTS {name}{}", cluster_clause(function.cluster.as_deref())),
    }
}

fn drop(name: &str, function: &FunctionInfo) -> Diff {
    let created = create(name, function, false);
    Diff {
        object: name.to_string(),
        kind: ObjectKind::Function,
        change: ChangeKind::Drop,
        up_sql: format!("DROP FUNCTION IF EXISTS {name}{}", cluster_clause(function.cluster.as_deref())),
        down_sql: created.up_sql,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn func(name: &str, body: Expr) -> FunctionInfo {
        FunctionInfo { name: name.to_string(), params: vec!["x".into()], body, cluster: None }
    }

    #[test]
    fn new_function_is_a_plain_create() {
        let current = Schema::default();
        let mut target = Schema::default();
        target.functions.insert("double".into(), func("double", Expr::ident("x").binary(crate::ast::BinaryOp::Mul, Expr::number("2"))));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Create);
        assert!(diffs[0].up_sql.starts_with("CREATE FUNCTION double"));
    }

    #[test]
    fn body_change_is_drop_and_create() {
        let mut current = Schema::default();
        current.functions.insert("double".into(), func("double", Expr::ident("x")));
        let mut target = Schema::default();
        target.functions.insert("double".into(), func("double", Expr::ident("x").binary(crate::ast::BinaryOp::Mul, Expr::number("2"))));

        let diffs = diff(&current, &target);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].change, ChangeKind::Replace);
        assert!(diffs[0].up_sql.starts_with("DROP FUNCTION"));
        assert!(diffs[0].up_sql.contains("CREATE FUNCTION double"));
    }
}
