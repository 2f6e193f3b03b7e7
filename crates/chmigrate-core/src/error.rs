//! Error types for the diff engine.

/// The reason an unsupported schema transition was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// `current.cluster != target.cluster` outside the bookkeeping database.
    ClusterChange {
        /// Qualified name of the object.
        object: String,
        /// Cluster currently in place (if any).
        current: Option<String>,
        /// Cluster requested by the target schema (if any).
        target: Option<String>,
    },

    /// The engine name itself changed for a table or database.
    EngineChange {
        /// Qualified name of the object.
        object: String,
        /// Current engine name.
        current: String,
        /// Target engine name.
        target: String,
    },

    /// A clause was specified that the object's engine does not accept.
    InvalidClause {
        /// Qualified name of the object.
        object: String,
        /// The rejected clause (`"PRIMARY KEY"`, `"PARTITION BY"`, ...).
        clause: String,
        /// The engine name that rejects it.
        engine: String,
    },

    /// The object lives in a protected system database.
    SystemObject {
        /// Qualified name of the object.
        object: String,
    },
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClusterChange {
                object,
                current,
                target,
            } => write!(
                f,
                "'{object}' cannot change cluster from {current:?} to {target:?}"
            ),
            Self::EngineChange {
                object,
                current,
                target,
            } => write!(f, "'{object}' cannot change engine from {current} to {target}"),
            Self::InvalidClause {
                object,
                clause,
                engine,
            } => write!(f, "'{object}' engine {engine} does not accept {clause}"),
            Self::SystemObject { object } => write!(f, "'{object}' is a protected system object"),
        }
    }
}

/// Errors surfaced by the diff engine.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Sentinel returned when current and target schemas are identical.
    ///
    /// Not a failure: callers should match on this variant to distinguish
    /// "nothing to do" from a genuine error.
    #[error("no differences between current and target schema")]
    NoDifferences,

    /// A pairing failed validation before any diff could be emitted.
    #[error("unsupported transition: {0}")]
    Unsupported(Unsupported),

    /// Re-parsing the generated plan failed; this indicates a bug in
    /// emission rather than a problem with the input schemas.
    #[error("generated plan failed to re-parse: {message}\n--- generated SQL ---\n{generated}")]
    ParseFailure {
        /// The SQL that was generated and failed to parse back.
        generated: String,
        /// The parser's error message.
        message: String,
    },

    /// I/O failure from the project loader or the migration-set hasher.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The migration-set sum file exists but could not be parsed.
    #[error("malformed sum file: {0}")]
    SumFile(String),
}

/// Result type used throughout the diff engine.
pub type Result<T> = std::result::Result<T, DiffError>;
