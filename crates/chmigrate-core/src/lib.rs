//! `chmigrate-core`: the schema-migration diff engine for a
//! ClickHouse-dialect column store (see `SPEC_FULL.md` §1-9).
//!
//! The crate is a pure, synchronous comparator (§5): it never parses SQL
//! text, never formats output, and never touches the network. Callers
//! hand it two already-parsed statement lists (current and target),
//! [`extract::extract_schema`] turns each into a [`schema::Schema`],
//! [`validate::validate`] rejects unsupported transitions, [`diff::diff_schemas`]
//! produces the typed change list, and [`plan::build_plan`] orders it into
//! forward/reverse SQL. The external collaborators this crate does not
//! own (a real SQL parser, a pretty-printer, a project loader, a live
//! database driver) are named as traits in [`interfaces`].

pub mod ast;
pub mod diff;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod interfaces;
pub mod plan;
pub mod rename;
pub mod schema;
pub mod sumfile;
pub mod validate;

use tracing::{debug, info};

pub use error::{DiffError, Result, Unsupported};
pub use plan::{build_plan, Plan};
pub use schema::Schema;

/// Runs the full pipeline (§2) over two already-parsed statement lists:
/// extract both sides, validate the pairing, diff, and assemble the plan.
///
/// This is the single entry point most callers need; [`extract::extract_schema`],
/// [`validate::validate`], [`diff::diff_schemas`] and [`plan::build_plan`]
/// remain available individually for callers that need to inspect an
/// intermediate stage (the CLI's `diff` subcommand does, to print the raw
/// diff list before assembly).
pub fn diff(current: &[ast::Statement], target: &[ast::Statement]) -> error::Result<Plan> {
    let current_schema = extract::extract_schema(current);
    let target_schema = extract::extract_schema(target);
    debug!(
        current_objects = current_schema.object_count(),
        target_objects = target_schema.object_count(),
        "extracted schemas"
    );

    validate::validate(&current_schema, &target_schema)?;
    debug!("validation passed");

    let diffs = diff::diff_schemas(&current_schema, &target_schema);
    info!(diff_count = diffs.len(), "computed schema diff");

    plan::build_plan(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::{CreateDatabaseStatement, EngineClause};
    use crate::ast::Statement;

    fn database(name: &str) -> Statement {
        Statement::CreateDatabase(CreateDatabaseStatement {
            name: name.to_string(),
            engine: Some(EngineClause::new("Atomic", vec![])),
            cluster: None,
            comment: None,
            if_not_exists: false,
        })
    }

    #[test]
    fn identical_schemas_yield_no_differences_law_1() {
        let statements = [database("analytics")];
        let err = diff(&statements, &statements).unwrap_err();
        assert!(matches!(err, DiffError::NoDifferences));
    }

    #[test]
    fn a_new_database_produces_a_one_statement_plan() {
        let current: Vec<Statement> = vec![];
        let target = vec![database("analytics")];
        let plan = diff(&current, &target).unwrap();
        assert_eq!(plan.forward_statements().len(), 1);
        assert!(plan.forward_sql().contains("CREATE DATABASE analytics"));
    }
}
