//! The plan assembler (§4.6): orders the unordered diff list into the
//! global sequence the live database can safely apply, splits compound
//! statements, and hands back both the forward and reverse SQL text.

use tracing::{debug, info};

use crate::diff::Diff;
use crate::error::{DiffError, Result};
use crate::interfaces::SchemaParser;

/// A fully assembled migration plan: an ordered, immutable list of
/// [`Diff`]s (§3.3 "The diff list itself is immutable once assembled").
#[derive(Debug, Clone)]
pub struct Plan {
    diffs: Vec<Diff>,
}

impl Plan {
    /// The diffs in forward (current -> target) order.
    #[must_use]
    pub fn diffs(&self) -> &[Diff] {
        &self.diffs
    }

    /// Forward statements (§4.6): each diff's `up_sql`, split on its
    /// internal blank-line separators (used by DROP+CREATE-style diffs),
    /// each ensured to end in a semicolon.
    #[must_use]
    pub fn forward_statements(&self) -> Vec<String> {
        self.diffs.iter().flat_map(|d| split_statements(&d.up_sql)).collect()
    }

    /// The reverse plan (§4.6): diffs concatenated in *reverse* global
    /// order, each contributing its `down_sql` (already polarity-reversed
    /// by the generator that produced it — ADD<->DROP, MODIFY swapped).
    #[must_use]
    pub fn reverse_statements(&self) -> Vec<String> {
        self.diffs.iter().rev().flat_map(|d| split_statements(&d.down_sql)).collect()
    }

    /// The forward plan rendered as one statement-list string, blank-line
    /// separated — the shape `make-migration` writes to a `.sql` file.
    #[must_use]
    pub fn forward_sql(&self) -> String {
        self.forward_statements().join("\n\n")
    }

    /// The reverse plan rendered the same way.
    #[must_use]
    pub fn reverse_sql(&self) -> String {
        self.reverse_statements().join("\n\n")
    }

    /// The §4.6 "re-parse the composite result as a final validation"
    /// self-check. Any failure here means emission produced text its own
    /// parser cannot read back — a bug in this crate, not a user error
    /// (§7), so the generated text is attached to the error.
    pub fn verify(&self, parser: &dyn SchemaParser) -> Result<()> {
        let sql = self.forward_sql();
        parser.parse(&sql).map(|_| ()).map_err(|message| DiffError::ParseFailure { generated: sql, message })
    }
}

/// Splits `sql` on blank-line boundaries (the separator
/// `diff::*::diff` uses to join a DROP+CREATE pair into one `up_sql`/
/// `down_sql` string) and ensures each resulting statement ends in `;`.
fn split_statements(sql: &str) -> Vec<String> {
    sql.split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| if s.ends_with(';') { s.to_string() } else { format!("{s};") })
        .collect()
}

/// Sorts the unordered diff list into the global order (§4.6): databases,
/// then tables, then dictionaries, then views, then functions/roles/
/// grants/users/named collections; within each kind, creates before
/// alters/replaces before renames before drops. Each per-type generator
/// already emits its own diffs name-sorted (its input maps are
/// `BTreeMap`s), so a stable sort here only needs to reorder *across*
/// kinds and change-kinds, never within an already-sorted group (§8 law 4
/// determinism).
///
/// An empty diff list is the §4.6/§7 "nothing to do" sentinel, returned
/// as [`DiffError::NoDifferences`] rather than an empty, successful plan.
pub fn build_plan(mut diffs: Vec<Diff>) -> Result<Plan> {
    if diffs.is_empty() {
        debug!("no differences between current and target schema");
        return Err(DiffError::NoDifferences);
    }
    diffs.sort_by(|a, b| (a.kind, a.change).cmp(&(b.kind, b.change)));
    info!(statements = diffs.len(), "assembled migration plan");
    Ok(Plan { diffs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ChangeKind, ObjectKind};

    fn diff(kind: ObjectKind, change: ChangeKind, object: &str) -> Diff {
        Diff {
            object: object.to_string(),
            kind,
            change,
            up_sql: format!("-- up {object}"),
            down_sql: format!("-- down {object}"),
        }
    }

    #[test]
    fn empty_diff_list_is_the_no_differences_sentinel() {
        let err = build_plan(vec![]).unwrap_err();
        assert!(matches!(err, DiffError::NoDifferences));
    }

    #[test]
    fn diffs_are_globally_ordered_by_kind_then_change_kind() {
        let diffs = vec![
            diff(ObjectKind::View, ChangeKind::Create, "v"),
            diff(ObjectKind::Table, ChangeKind::Drop, "t1"),
            diff(ObjectKind::Table, ChangeKind::Create, "t2"),
            diff(ObjectKind::Database, ChangeKind::Create, "db"),
        ];
        let plan = build_plan(diffs).unwrap();
        let order: Vec<&str> = plan.diffs().iter().map(|d| d.object.as_str()).collect();
        assert_eq!(order, vec!["db", "t2", "t1", "v"]);
    }

    #[test]
    fn reverse_plan_concatenates_down_sql_in_reverse_order() {
        let diffs = vec![diff(ObjectKind::Database, ChangeKind::Create, "a"), diff(ObjectKind::Table, ChangeKind::Create, "b")];
        let plan = build_plan(diffs).unwrap();
        assert_eq!(plan.reverse_statements(), vec!["-- down b;", "-- down a;"]);
    }

    #[test]
    fn multi_statement_diffs_split_on_blank_lines() {
        let mut d = diff(ObjectKind::Table, ChangeKind::Replace, "t");
        d.up_sql = "DROP TABLE t\n\nCREATE TABLE t (id UInt64)".to_string();
        let plan = build_plan(vec![d]).unwrap();
        assert_eq!(plan.forward_statements(), vec!["DROP TABLE t;", "CREATE TABLE t (id UInt64);"]);
    }
}
