//! External collaborators (§1, §6): everything the engine treats as a
//! black box is named here as a trait rather than implemented. No
//! `chmigrate-core` type depends on a concrete implementation of any of
//! these — `chmigrate-cli` wires real ones in at the boundary.

use crate::ast::Statement;

/// Converts DDL text into the typed statement list §6 describes as
/// "Input — parsed schema". The reference CLI ships a minimal fallback
/// sufficient to round-trip the CREATE-statement subset this crate itself
/// emits; a production deployment supplies a real SQL parser.
pub trait SchemaParser {
    /// Parses `sql` into an ordered statement list, or an error message on
    /// malformed input.
    fn parse(&self, sql: &str) -> Result<Vec<Statement>, String>;
}

/// Renders a statement list back into deterministic SQL text (§2 item 1,
/// "a small SQL-string builder"). The plan assembler's own `up_sql`/
/// `down_sql` strings are already deterministic text produced without this
/// trait; `StatementPrinter` exists for callers that parse arbitrary input
/// DDL and need to re-emit it (e.g. a formatter pass over the live
/// database's stored definitions) rather than a generated plan.
pub trait StatementPrinter {
    /// Writes `statements` to `sink` as semicolon-terminated SQL text.
    fn print(&self, statements: &[Statement], sink: &mut dyn std::fmt::Write) -> std::fmt::Result;
}

/// Reads the on-disk project shape described in §6: a YAML config listing
/// environments, each with an entrypoint DDL file (itself subject to the
/// `-- housekeeper:import <path>` preprocessor) and a migrations
/// directory.
pub trait ProjectLoader {
    /// Reads and fully resolves the entrypoint file for `environment`
    /// (imports inlined), returning the flattened DDL text.
    fn load_entrypoint(&self, environment: &str) -> crate::error::Result<String>;
}

/// The live-database driver (§6 "Bookkeeping table", §1 "out of scope").
/// No concrete network implementation ships in this workspace; a real one
/// would read the current schema via `SHOW CREATE` (or similar) and
/// execute generated DDL against a live server.
pub trait SchemaDriver {
    /// Reads the live schema as a parsed statement list.
    fn current_schema(&self) -> crate::error::Result<Vec<Statement>>;

    /// Executes a single DDL statement against the live database.
    fn execute(&self, statement: &str) -> crate::error::Result<()>;
}

/// The keyword this input format uses for the import directive (§6,
/// kept verbatim — it is a textual convention of the files this crate
/// consumes, not a name chosen here).
const IMPORT_DIRECTIVE: &str = "-- housekeeper:import";

/// Resolves `-- housekeeper:import <path>` directives in `text` by
/// replacing each matching line in place with the content of `<path>`,
/// resolved relative to `base_dir`. Nested imports are supported: the
/// imported content is itself scanned for further directives.
///
/// This is the textual half of [`ProjectLoader`] — pure string
/// manipulation with no parser dependency, so it lives here rather than
/// behind the trait, and `chmigrate-cli`'s default loader calls it
/// directly.
pub fn resolve_imports(text: &str, base_dir: &std::path::Path, read_file: &dyn Fn(&std::path::Path) -> std::io::Result<String>) -> std::io::Result<String> {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if let Some(rest) = line.trim_start().strip_prefix(IMPORT_DIRECTIVE) {
            let path = base_dir.join(rest.trim());
            let imported = read_file(&path)?;
            let parent = path.parent().unwrap_or(base_dir);
            let resolved = resolve_imports(&imported, parent, read_file)?;
            out.push_str(&resolved);
            if !resolved.ends_with('\n') {
                out.push('\n');
            }
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn fake_fs(files: &HashMap<PathBuf, String>) -> impl Fn(&Path) -> std::io::Result<String> + '_ {
        move |path: &Path| {
            files
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()))
        }
    }

    #[test]
    fn import_directive_is_replaced_with_file_content() {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("/schema/tables.sql"), "CREATE TABLE x.t (id UInt64) ENGINE = MergeTree ORDER BY id;\n".to_string());

        let entrypoint = "-- housekeeper:import tables.sql\n";
        let resolved = resolve_imports(entrypoint, Path::new("/schema"), &fake_fs(&files)).unwrap();
        assert!(resolved.contains("CREATE TABLE x.t"));
    }

    #[test]
    fn nested_imports_are_resolved_relative_to_their_own_file() {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("/schema/root.sql"), "-- housekeeper:import nested/inner.sql\n".to_string());
        files.insert(PathBuf::from("/schema/nested/inner.sql"), "CREATE DATABASE x;\n".to_string());

        let entrypoint = "-- housekeeper:import root.sql\n";
        let resolved = resolve_imports(entrypoint, Path::new("/schema"), &fake_fs(&files)).unwrap();
        assert!(resolved.contains("CREATE DATABASE x;"));
    }

    #[test]
    fn lines_without_the_directive_pass_through_unchanged() {
        let resolved = resolve_imports("CREATE DATABASE x;\n", Path::new("/schema"), &fake_fs(&HashMap::new())).unwrap();
        assert_eq!(resolved, "CREATE DATABASE x;\n");
    }
}
