//! `Nested(...)` column flattening (§3.2, §9): a `Nested(a T1, b T2)`
//! column compares and diffs as if it had been written `a Array(T1), b
//! Array(T2)` with dotted names. Flattening is applied only to the
//! *target* side, only at comparison time — [`crate::schema::TableInfo`]
//! keeps the original `Nested` column so emission round-trips it verbatim.

use crate::ast::statement::ColumnDef;
use crate::ast::DataType;
use crate::ast::types::TypeField;

/// Expands every `Nested` column in `columns` into its dotted `Array(...)`
/// members, recursively (a `Nested` field inside a `Nested` column keeps
/// expanding). DEFAULT/TTL/CODEC/COMMENT on the parent column propagate to
/// every column the parent expands into.
#[must_use]
pub fn flatten_columns(columns: &[ColumnDef]) -> Vec<ColumnDef> {
    let mut out = Vec::with_capacity(columns.len());
    for column in columns {
        match &column.data_type {
            DataType::Nested(fields) => flatten_into(&column.name, fields, column, &mut out),
            _ => out.push(column.clone()),
        }
    }
    out
}

fn flatten_into(prefix: &str, fields: &[TypeField], parent: &ColumnDef, out: &mut Vec<ColumnDef>) {
    for field in fields {
        let name = match &field.name {
            Some(n) => format!("{prefix}.{n}"),
            None => prefix.to_string(),
        };
        match &field.data_type {
            DataType::Nested(inner) => flatten_into(&name, inner, parent, out),
            other => out.push(ColumnDef {
                name,
                data_type: DataType::Array(Box::new(other.clone())),
                default_kind: parent.default_kind,
                default_expr: parent.default_expr.clone(),
                codec: parent.codec.clone(),
                ttl: parent.ttl.clone(),
                comment: parent.comment.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_column_expands_to_dotted_arrays() {
        let nested = ColumnDef::new(
            "tags",
            DataType::Nested(vec![
                TypeField { name: Some("key".into()), data_type: DataType::String },
                TypeField { name: Some("value".into()), data_type: DataType::UInt64 },
            ]),
        )
        .with_comment("k/v pairs");

        let flattened = flatten_columns(&[nested]);

        assert_eq!(flattened.len(), 2);
        assert_eq!(flattened[0].name, "tags.key");
        assert_eq!(flattened[0].data_type, DataType::Array(Box::new(DataType::String)));
        assert_eq!(flattened[0].comment.as_deref(), Some("k/v pairs"));
        assert_eq!(flattened[1].name, "tags.value");
    }

    #[test]
    fn non_nested_columns_pass_through_unchanged() {
        let plain = ColumnDef::new("id", DataType::UInt64);
        let flattened = flatten_columns(&[plain.clone()]);
        assert_eq!(flattened, vec![plain]);
    }
}
