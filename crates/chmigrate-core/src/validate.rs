//! Transition validation (§4.3): rejects unsupported current->target
//! pairings before any diff is emitted. The plan is all-or-nothing — a
//! single validation failure aborts the whole run (§7).

use tracing::warn;

use crate::ast::engine_name_eq;
use crate::error::{DiffError, Unsupported};
use crate::schema::Schema;

/// Names that cannot be created or modified through the engine (§4.3 rule
/// 3). Comparison is case-sensitive, matching the literal spellings used
/// by the live database's own system catalog.
pub const SYSTEM_DATABASES: &[&str] = &["system", "INFORMATION_SCHEMA", "information_schema"];

/// The database whose objects are exempt from the cluster-change rule
/// (§4.3 rule 1, glossary "Bookkeeping database"). Named after the
/// `housekeeper:import`/`housekeeper.sum` convention this crate's input
/// formats already use (§6) rather than invented independently.
pub const BOOKKEEPING_DATABASE: &str = "housekeeper";

/// Storage engines whose data lives outside the database; schema
/// mutations are unsupported for these (glossary "Integration engine").
pub const INTEGRATION_ENGINES: &[&str] = &[
    "Kafka",
    "MySQL",
    "PostgreSQL",
    "MongoDB",
    "S3",
    "S3Queue",
    "HDFS",
    "URL",
    "JDBC",
    "ODBC",
    "RabbitMQ",
    "NATS",
    "Redis",
    "Iceberg",
    "DeltaLake",
    "Hudi",
    "ExternalDistributed",
];

#[must_use]
pub fn is_integration_engine(engine: &str) -> bool {
    INTEGRATION_ENGINES.iter().any(|e| e.eq_ignore_ascii_case(engine))
}

/// Clauses a given engine name rejects (§4.3 rule 4). `Distributed`,
/// `Buffer`, `Dictionary`, `View`, `LiveView` reject all four; `Memory`
/// rejects only PARTITION BY / SAMPLE BY.
#[must_use]
pub fn restricted_clauses(engine: &str) -> &'static [&'static str] {
    match engine.to_ascii_lowercase().as_str() {
        "distributed" | "buffer" | "dictionary" | "view" | "liveview" => {
            &["PRIMARY KEY", "PARTITION BY", "SAMPLE BY", "ORDER BY"]
        }
        "memory" => &["PARTITION BY", "SAMPLE BY"],
        _ => &[],
    }
}

fn is_bookkeeping(database: &str) -> bool {
    database.eq_ignore_ascii_case(BOOKKEEPING_DATABASE)
}

fn check_cluster(object: &str, database: &str, current: Option<&str>, target: Option<&str>) -> crate::error::Result<()> {
    if is_bookkeeping(database) {
        return Ok(());
    }
    if current != target {
        warn!(object, ?current, ?target, "rejected: cluster change");
        return Err(DiffError::Unsupported(Unsupported::ClusterChange {
            object: object.to_string(),
            current: current.map(str::to_string),
            target: target.map(str::to_string),
        }));
    }
    Ok(())
}

/// Runs every §4.3 rule over a `(current, target)` schema pairing. The
/// first violation aborts validation; callers never see a partial result.
pub fn validate(current: &Schema, target: &Schema) -> crate::error::Result<()> {
    for (name, db) in &target.databases {
        if SYSTEM_DATABASES.iter().any(|s| s == name) && current.databases.get(name).is_none_or(|c| c.engine != db.engine || c.comment != db.comment) {
            warn!(database = %name, "rejected: system database");
            return Err(DiffError::Unsupported(Unsupported::SystemObject { object: name.clone() }));
        }
    }

    for (name, target_db) in &target.databases {
        if let Some(current_db) = current.databases.get(name) {
            check_cluster(name, name, current_db.cluster.as_deref(), target_db.cluster.as_deref())?;
            if let (Some(c), Some(t)) = (&current_db.engine, &target_db.engine) {
                if !engine_name_eq(&c.name, &t.name) {
                    warn!(database = %name, current = %c.name, target = %t.name, "rejected: engine change");
                    return Err(DiffError::Unsupported(Unsupported::EngineChange {
                        object: name.clone(),
                        current: c.name.clone(),
                        target: t.name.clone(),
                    }));
                }
            }
        }
    }

    for (key, target_table) in &target.tables {
        if let Some(current_table) = current.tables.get(key) {
            check_cluster(key, &target_table.database, current_table.cluster.as_deref(), target_table.cluster.as_deref())?;
            if let (Some(c), Some(t)) = (&current_table.engine, &target_table.engine) {
                let replicated_empty_params = t.name.eq_ignore_ascii_case("ReplicatedMergeTree") && t.params.is_empty();
                if !engine_name_eq(&c.name, &t.name) && !replicated_empty_params {
                    warn!(table = %key, current = %c.name, target = %t.name, "rejected: engine change");
                    return Err(DiffError::Unsupported(Unsupported::EngineChange {
                        object: key.clone(),
                        current: c.name.clone(),
                        target: t.name.clone(),
                    }));
                }
            }
        }

        if let Some(engine) = &target_table.engine {
            let restricted = restricted_clauses(&engine.name);
            let present = [
                ("PRIMARY KEY", target_table.primary_key.is_some()),
                ("PARTITION BY", target_table.partition_by.is_some()),
                ("SAMPLE BY", target_table.sample_by.is_some()),
                ("ORDER BY", target_table.order_by.is_some()),
            ];
            for (clause, is_present) in present {
                if is_present && restricted.contains(&clause) {
                    warn!(table = %key, clause, engine = %engine.name, "rejected: invalid clause for engine");
                    return Err(DiffError::Unsupported(Unsupported::InvalidClause {
                        object: key.clone(),
                        clause: clause.to_string(),
                        engine: engine.name.clone(),
                    }));
                }
            }
        }
    }

    for (key, target_dict) in &target.dictionaries {
        if let Some(current_dict) = current.dictionaries.get(key) {
            check_cluster(key, &target_dict.database, current_dict.cluster.as_deref(), target_dict.cluster.as_deref())?;
        }
    }

    for (key, target_view) in &target.views {
        if let Some(current_view) = current.views.get(key) {
            check_cluster(key, &target_view.database, current_view.cluster.as_deref(), target_view.cluster.as_deref())?;
        }
    }

    for (name, target_role) in &target.roles {
        if let Some(current_role) = current.roles.get(name) {
            check_cluster(name, "", current_role.cluster.as_deref(), target_role.cluster.as_deref())?;
        }
    }

    for (name, target_user) in &target.users {
        if let Some(current_user) = current.users.get(name) {
            check_cluster(name, "", current_user.cluster.as_deref(), target_user.cluster.as_deref())?;
        }
    }

    for (name, target_fn) in &target.functions {
        if let Some(current_fn) = current.functions.get(name) {
            check_cluster(name, "", current_fn.cluster.as_deref(), target_fn.cluster.as_deref())?;
        }
    }

    for (name, target_nc) in &target.named_collections {
        if let Some(current_nc) = current.named_collections.get(name) {
            check_cluster(name, "", current_nc.cluster.as_deref(), target_nc.cluster.as_deref())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::EngineClause;
    use crate::schema::DatabaseInfo;

    fn db(name: &str, cluster: Option<&str>) -> DatabaseInfo {
        DatabaseInfo {
            name: name.to_string(),
            engine: Some(EngineClause::new("Atomic", vec![])),
            cluster: cluster.map(str::to_string),
            comment: None,
        }
    }

    #[test]
    fn cluster_change_is_rejected_s6() {
        let mut current = Schema::default();
        current.databases.insert("x".into(), db("x", None));
        let mut target = Schema::default();
        target.databases.insert("x".into(), db("x", Some("prod")));

        let err = validate(&current, &target).unwrap_err();
        assert!(matches!(err, DiffError::Unsupported(Unsupported::ClusterChange { .. })));
    }

    #[test]
    fn bookkeeping_database_ignores_cluster_changes() {
        let mut current = Schema::default();
        current.databases.insert(BOOKKEEPING_DATABASE.into(), db(BOOKKEEPING_DATABASE, None));
        let mut target = Schema::default();
        target
            .databases
            .insert(BOOKKEEPING_DATABASE.into(), db(BOOKKEEPING_DATABASE, Some("prod")));

        assert!(validate(&current, &target).is_ok());
    }
}
