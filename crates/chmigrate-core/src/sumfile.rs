//! The migration-set hasher (§4.7, glossary "Sum file"): content-addressed
//! tamper detection over an ordered migration directory.
//!
//! All I/O here is synchronous `std::fs`, scoped exactly as §5 requires:
//! every file opened by [`hash_directory`]/[`read_sum_file`] is fully read
//! and closed before the function returns.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Case-insensitive, fixed well-known sum-file name (§6).
pub const SUM_FILE_NAME: &str = "housekeeper.sum";

/// One migration file's content hash, in `h1:<base64-sha256>` form (§6
/// "Sum file layout").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHash {
    pub filename: String,
    pub hash: String,
}

/// The full content of a sum file: one hash line per migration file plus
/// the aggregate total hash over their concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SumFile {
    pub files: Vec<FileHash>,
    pub total: String,
}

impl SumFile {
    /// Renders the sum file back to its on-disk text form.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for f in &self.files {
            out.push_str(&format!("{}  {}\n", f.hash, f.filename));
        }
        if !self.total.is_empty() {
            out.push_str(&format!("{}\n", self.total));
        }
        out
    }

    /// Parses a sum file's on-disk text. Any line that is neither a valid
    /// `h1:<hash>  <filename>` per-file line nor a trailing `h1:<hash>`
    /// total line is a malformed sum file (§7 "sum file malformed").
    pub fn parse(text: &str) -> Result<Self, String> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return Ok(Self::default());
        }

        let (total_line, file_lines) = lines.split_last().expect("checked non-empty above");

        let mut files = Vec::with_capacity(file_lines.len());
        for line in file_lines {
            let (hash, filename) = line
                .split_once("  ")
                .ok_or_else(|| format!("malformed sum-file line: {line:?}"))?;
            if !hash.starts_with("h1:") {
                return Err(format!("malformed sum-file hash: {hash:?}"));
            }
            files.push(FileHash { filename: filename.to_string(), hash: hash.to_string() });
        }

        let total = total_line.trim().to_string();
        if !total.starts_with("h1:") {
            return Err(format!("malformed sum-file total line: {total:?}"));
        }

        Ok(Self { files, total })
    }
}

fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("h1:{}", BASE64.encode(digest))
}

/// Lists `.sql` files in `dir` (non-recursive, lexicographic filename
/// order, case-insensitive `housekeeper.sum` excluded) and computes a
/// [`SumFile`] over their current content.
///
/// An empty set (no `.sql` files present) hashes to the empty total, per
/// §4.7.
pub fn hash_directory(dir: &Path) -> std::io::Result<SumFile> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.to_ascii_lowercase().ends_with(".sql") && !name.eq_ignore_ascii_case(SUM_FILE_NAME)
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut files = Vec::with_capacity(entries.len());
    let mut concatenated = Vec::new();
    for entry in entries {
        let content = fs::read(entry.path())?;
        let hash = hash_bytes(&content);
        let filename = entry.file_name().to_string_lossy().into_owned();
        let line = format!("{hash}  {filename}\n");
        concatenated.extend_from_slice(line.as_bytes());
        files.push(FileHash { filename, hash });
    }

    let total = if files.is_empty() { String::new() } else { hash_bytes(&concatenated) };
    Ok(SumFile { files, total })
}

/// Finds `housekeeper.sum` in `dir` case-insensitively and parses it, if
/// present.
pub fn read_sum_file(dir: &Path) -> std::io::Result<Option<SumFile>> {
    let found = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .find(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(SUM_FILE_NAME));

    let Some(entry) = found else { return Ok(None) };
    let text = fs::read_to_string(entry.path())?;
    SumFile::parse(&text)
        .map(Some)
        .map_err(|message| std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// Writes a freshly computed [`SumFile`] for `dir` to `housekeeper.sum`.
pub fn write_sum_file(dir: &Path, sum: &SumFile) -> std::io::Result<()> {
    fs::write(dir.join(SUM_FILE_NAME), sum.to_text())
}

/// The outcome of validating a migration directory's current content
/// against its sum file (§7): absent, mismatching, and malformed are kept
/// as distinct, non-error outcomes except malformed, which the caller
/// surfaces as an `Err` from [`read_sum_file`] before this function is
/// even reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// No sum file was present.
    Absent,
    /// The sum file matches the directory's current content.
    Valid,
    /// The sum file exists but does not match.
    Mismatch,
}

/// Recomputes hashes for the files currently present in `dir` and
/// compares them against its sum file, if any.
pub fn validate_directory(dir: &Path) -> std::io::Result<ValidationOutcome> {
    let Some(recorded) = read_sum_file(dir)? else { return Ok(ValidationOutcome::Absent) };
    let current = hash_directory(dir)?;
    Ok(if recorded == current { ValidationOutcome::Valid } else { ValidationOutcome::Mismatch })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_hashes_to_an_empty_total() {
        let dir = tempfile::tempdir().unwrap();
        let sum = hash_directory(dir.path()).unwrap();
        assert!(sum.files.is_empty());
        assert_eq!(sum.total, "");
    }

    #[test]
    fn sum_file_round_trips_through_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240101000000.sql"), "CREATE DATABASE x;\n").unwrap();
        fs::write(dir.path().join("20240102000000.sql"), "CREATE TABLE x.t (id UInt64) ENGINE = MergeTree ORDER BY id;\n").unwrap();

        let sum = hash_directory(dir.path()).unwrap();
        assert_eq!(sum.files.len(), 2);
        assert!(!sum.total.is_empty());

        let reparsed = SumFile::parse(&sum.to_text()).unwrap();
        assert_eq!(reparsed, sum);
    }

    #[test]
    fn non_sql_files_and_the_sum_file_itself_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240101000000.sql"), "CREATE DATABASE x;\n").unwrap();
        fs::write(dir.path().join("README.md"), "notes").unwrap();
        fs::write(dir.path().join(SUM_FILE_NAME), "stale").unwrap();

        let sum = hash_directory(dir.path()).unwrap();
        assert_eq!(sum.files.len(), 1);
    }

    #[test]
    fn validation_distinguishes_absent_from_mismatching() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240101000000.sql"), "CREATE DATABASE x;\n").unwrap();

        assert_eq!(validate_directory(dir.path()).unwrap(), ValidationOutcome::Absent);

        let sum = hash_directory(dir.path()).unwrap();
        write_sum_file(dir.path(), &sum).unwrap();
        assert_eq!(validate_directory(dir.path()).unwrap(), ValidationOutcome::Valid);

        fs::write(dir.path().join("20240101000000.sql"), "CREATE DATABASE y;\n").unwrap();
        assert_eq!(validate_directory(dir.path()).unwrap(), ValidationOutcome::Mismatch);
    }

    #[test]
    fn malformed_sum_file_is_an_error() {
        let err = SumFile::parse("not a valid line\n").unwrap_err();
        assert!(err.contains("malformed"));
    }
}
