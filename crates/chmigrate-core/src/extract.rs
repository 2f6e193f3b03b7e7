//! Per-statement-kind extraction (§4.2): turns a flat parsed statement list
//! into a [`Schema`] snapshot. Extraction is total — a statement kind this
//! crate does not model (there is none left unhandled today, but the match
//! is written so a future addition fails to compile rather than silently
//! dropping rows) is never a reason to abort; only [`crate::validate`] and
//! [`crate::diff`] can fail.

use std::collections::BTreeMap;

use crate::ast::statement::{
    CreateDatabaseStatement, CreateDictionaryStatement, CreateFunctionStatement, CreateNamedCollectionStatement,
    CreateRoleStatement, CreateTableStatement, CreateUserStatement, CreateViewStatement, GrantStatement, Statement,
};
use crate::ast::qualify;
use crate::schema::{DatabaseInfo, DictionaryInfo, FunctionInfo, GrantInfo, NamedCollectionInfo, RoleInfo, Schema, TableInfo, UserInfo};
use crate::validate::restricted_clauses;

/// Builds a [`Schema`] from a parsed statement list. Keys match §3.2
/// exactly: single-name objects by `name`, database-scoped objects by
/// `database.name`, grants by their grant-key triple.
#[must_use]
pub fn extract_schema(statements: &[Statement]) -> Schema {
    let mut schema = Schema::default();

    for stmt in statements {
        match stmt {
            Statement::CreateDatabase(s) => extract_database(&mut schema, s),
            Statement::CreateTable(s) => extract_table(&mut schema, s),
            Statement::CreateDictionary(s) => extract_dictionary(&mut schema, s),
            Statement::CreateView(s) => extract_view(&mut schema, s),
            Statement::CreateFunction(s) => extract_function(&mut schema, s),
            Statement::CreateRole(s) => extract_role(&mut schema, s),
            Statement::Grant(s) => extract_grant(&mut schema, s),
            Statement::CreateUser(s) => extract_user(&mut schema, s),
            Statement::CreateNamedCollection(s) => extract_named_collection(&mut schema, s),
            Statement::Select(_) => {}
        }
    }

    resolve_as_table_sources(&mut schema);
    schema
}

fn extract_database(schema: &mut Schema, s: &CreateDatabaseStatement) {
    schema.databases.insert(
        s.name.clone(),
        DatabaseInfo {
            name: s.name.clone(),
            engine: s.engine.clone(),
            cluster: s.cluster.clone(),
            comment: s.comment.clone(),
        },
    );
}

fn extract_table(schema: &mut Schema, s: &CreateTableStatement) {
    let database = s.database.clone().unwrap_or_default();
    let key = qualify(s.database.as_deref(), &s.name);

    let mut settings = BTreeMap::new();
    for (k, v) in &s.settings {
        settings.insert(k.clone(), v.clone());
    }

    schema.tables.insert(
        key,
        TableInfo {
            name: s.name.clone(),
            database,
            cluster: s.cluster.clone(),
            engine: s.engine.clone(),
            comment: s.comment.clone(),
            order_by: s.order_by.clone(),
            partition_by: s.partition_by.clone(),
            primary_key: s.primary_key.clone(),
            sample_by: s.sample_by.clone(),
            ttl: s.ttl.clone(),
            settings,
            columns: s.columns().cloned().collect(),
            or_replace: s.or_replace,
            if_not_exists: s.if_not_exists,
            as_source: s.as_table.clone(),
            dependents: Default::default(),
        },
    );
}

fn extract_dictionary(schema: &mut Schema, s: &CreateDictionaryStatement) {
    let database = s.database.clone().unwrap_or_default();
    let key = qualify(s.database.as_deref(), &s.name);

    let mut settings = BTreeMap::new();
    for (k, v) in &s.settings {
        settings.insert(k.clone(), v.clone());
    }

    schema.dictionaries.insert(
        key,
        DictionaryInfo {
            name: s.name.clone(),
            database,
            cluster: s.cluster.clone(),
            comment: s.comment.clone(),
            columns: s.columns.clone(),
            primary_key: s.primary_key.clone(),
            source: s.source.clone(),
            layout: s.layout.clone(),
            lifetime: s.lifetime,
            settings,
        },
    );
}

fn extract_view(schema: &mut Schema, s: &CreateViewStatement) {
    let database = s.database.clone().unwrap_or_default();
    let key = qualify(s.database.as_deref(), &s.name);

    schema.views.insert(
        key,
        crate::schema::ViewInfo {
            name: s.name.clone(),
            database,
            cluster: s.cluster.clone(),
            materialized: s.materialized,
            or_replace: s.or_replace,
            refresh: s.refresh.clone(),
            append: s.append,
            to_target: s.to_target.clone(),
            engine: s.engine.clone(),
            populate: s.populate,
            select: s.select.clone(),
            comment: s.comment.clone(),
        },
    );
}

fn extract_function(schema: &mut Schema, s: &CreateFunctionStatement) {
    schema.functions.insert(
        s.name.clone(),
        FunctionInfo {
            name: s.name.clone(),
            params: s.params.clone(),
            body: s.body.clone(),
            cluster: s.cluster.clone(),
        },
    );
}

fn extract_role(schema: &mut Schema, s: &CreateRoleStatement) {
    let mut settings = BTreeMap::new();
    for (k, v) in &s.settings {
        settings.insert(k.clone(), v.clone());
    }

    schema.roles.insert(
        s.name.clone(),
        RoleInfo {
            name: s.name.clone(),
            settings,
            cluster: s.cluster.clone(),
        },
    );
}

fn extract_grant(schema: &mut Schema, s: &GrantStatement) {
    let info = GrantInfo {
        grantee: s.grantee.clone(),
        privileges: s.privileges.clone(),
        target: s.target.clone(),
        with_grant_option: s.with_grant_option,
        with_admin_option: s.with_admin_option,
        cluster: s.cluster.clone(),
    };
    schema.grants.insert(info.key(), info);
}

fn extract_user(schema: &mut Schema, s: &CreateUserStatement) {
    schema.users.insert(
        s.name.clone(),
        UserInfo {
            name: s.name.clone(),
            cluster: s.cluster.clone(),
            identified_by: s.identified_by.clone(),
            host: s.host.clone(),
            valid_until: s.valid_until.clone(),
            storage: s.storage.clone(),
            default_roles: s.default_roles.clone(),
            default_database: s.default_database.clone(),
            grantees: s.grantees.clone(),
        },
    );
}

fn extract_named_collection(schema: &mut Schema, s: &CreateNamedCollectionStatement) {
    schema.named_collections.insert(
        s.name.clone(),
        NamedCollectionInfo {
            name: s.name.clone(),
            cluster: s.cluster.clone(),
            comment: s.comment.clone(),
            overridable: s.overridable,
            parameters: s.parameters.clone(),
        },
    );
}

/// Resolves `CREATE TABLE t AS other_table` (§3.2, §4.3): copies columns
/// and any of ORDER BY/PARTITION BY/PRIMARY KEY/SAMPLE BY the dependent
/// table left unset, subject to the source's own engine clause
/// restrictions, then records the reverse edge on the source's
/// `dependents` set so later ALTERs can propagate (§4.5).
fn resolve_as_table_sources(schema: &mut Schema) {
    let snapshot = schema.tables.clone();

    for (key, source_key) in snapshot
        .iter()
        .filter_map(|(k, t)| t.as_source.as_ref().map(|src| (k.clone(), src.clone())))
    {
        let Some(source) = snapshot.get(&source_key) else { continue };

        if let Some(dependent) = schema.tables.get_mut(&key) {
            if dependent.columns.is_empty() {
                dependent.columns = source.columns.clone();
            }

            let restricted = dependent
                .engine
                .as_ref()
                .map(|e| restricted_clauses(&e.name))
                .unwrap_or_default();

            if dependent.order_by.is_none() && !restricted.contains(&"ORDER BY") {
                dependent.order_by = source.order_by.clone();
            }
            if dependent.partition_by.is_none() && !restricted.contains(&"PARTITION BY") {
                dependent.partition_by = source.partition_by.clone();
            }
            if dependent.primary_key.is_none() && !restricted.contains(&"PRIMARY KEY") {
                dependent.primary_key = source.primary_key.clone();
            }
            if dependent.sample_by.is_none() && !restricted.contains(&"SAMPLE BY") {
                dependent.sample_by = source.sample_by.clone();
            }
        }

        if let Some(source) = schema.tables.get_mut(&source_key) {
            source.dependents.insert(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::statement::{ColumnDef, EngineClause, TableElement};
    use crate::ast::DataType;

    fn table(name: &str, database: &str, as_table: Option<&str>) -> CreateTableStatement {
        CreateTableStatement {
            name: name.to_string(),
            database: Some(database.to_string()),
            cluster: None,
            or_replace: false,
            if_not_exists: false,
            elements: vec![],
            engine: Some(EngineClause::new("MergeTree", vec![])),
            order_by: None,
            partition_by: None,
            primary_key: None,
            sample_by: None,
            ttl: None,
            settings: vec![],
            comment: None,
            as_table: as_table.map(str::to_string),
        }
    }

    #[test]
    fn as_table_copies_columns_and_clauses_from_its_source() {
        let mut source = table("events", "analytics", None);
        source.elements.push(TableElement::Column(ColumnDef::new("id", DataType::UInt64)));
        source.order_by = Some(crate::ast::Expr::ident("id"));

        let dependent = table("events_copy", "analytics", Some("analytics.events"));

        let schema = extract_schema(&[Statement::CreateTable(source), Statement::CreateTable(dependent)]);

        let copy = schema.tables.get("analytics.events_copy").unwrap();
        assert_eq!(copy.columns.len(), 1);
        assert!(copy.order_by.is_some());

        let src = schema.tables.get("analytics.events").unwrap();
        assert!(src.dependents.contains("analytics.events_copy"));
    }

    #[test]
    fn grant_is_keyed_by_its_grant_key_triple() {
        use crate::ast::statement::{GrantTarget, PrivilegeSpec};

        let grant = GrantStatement {
            grantee: "alice".into(),
            privileges: vec![PrivilegeSpec { name: "SELECT".into(), columns: vec![] }],
            target: GrantTarget::Database("analytics".into()),
            with_grant_option: false,
            with_admin_option: false,
            cluster: None,
        };
        let schema = extract_schema(&[Statement::Grant(grant)]);
        assert_eq!(schema.grants.len(), 1);
    }
}
