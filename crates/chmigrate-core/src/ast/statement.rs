//! The parsed-statement tree: the shape `SchemaParser` implementations hand
//! back (§6 "Input — parsed schema"). Table/dictionary/view/etc. statements
//! carry every field the extractors (§4.2) and comparator need; this module
//! has no comparison logic of its own (see [`super::equality`]).

use super::expr::{Expr, IntervalUnit};
use super::types::DataType;

/// `ENGINE = Name(params...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineClause {
    pub name: String,
    pub params: Vec<Expr>,
}

impl EngineClause {
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<Expr>) -> Self {
        Self { name: name.into(), params }
    }

    #[must_use]
    pub fn to_sql(&self) -> String {
        if self.params.is_empty() {
            self.name.clone()
        } else {
            let params = self.params.iter().map(Expr::to_sql).collect::<Vec<_>>().join(", ");
            format!("{}({params})", self.name)
        }
    }
}

/// How a column's value is produced: a stored value, a computed one, or a
/// query-time alias. `DEFAULT` is the implicit kind when none is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultKind {
    #[default]
    Default,
    Materialized,
    Alias,
    Ephemeral,
}

impl DefaultKind {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Materialized => "MATERIALIZED",
            Self::Alias => "ALIAS",
            Self::Ephemeral => "EPHEMERAL",
        }
    }
}

/// A single `CREATE TABLE`/`CREATE DICTIONARY` column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub default_kind: DefaultKind,
    pub default_expr: Option<Expr>,
    pub codec: Option<String>,
    pub ttl: Option<Expr>,
    pub comment: Option<String>,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            default_kind: DefaultKind::Default,
            default_expr: None,
            codec: None,
            ttl: None,
            comment: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, kind: DefaultKind, expr: Expr) -> Self {
        self.default_kind = kind;
        self.default_expr = Some(expr);
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Expr) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Skip-index declared in a `CREATE TABLE` element list. Extraction does
/// not index these in any qualified-name map (§3.1 lists no such key) but
/// the statement still carries them so emission round-trips.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub name: String,
    pub expr: Expr,
    pub index_type: String,
    pub granularity: Option<Expr>,
}

/// A `CONSTRAINT ... CHECK (...)` table element.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    pub expr: Expr,
}

/// One element inside a `CREATE TABLE (...)` list.
#[derive(Debug, Clone, PartialEq)]
pub enum TableElement {
    Column(ColumnDef),
    Index(IndexDef),
    Constraint(ConstraintDef),
}

/// `CREATE DATABASE`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDatabaseStatement {
    pub name: String,
    pub engine: Option<EngineClause>,
    pub cluster: Option<String>,
    pub comment: Option<String>,
    pub if_not_exists: bool,
}

/// `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: String,
    pub database: Option<String>,
    pub cluster: Option<String>,
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub elements: Vec<TableElement>,
    pub engine: Option<EngineClause>,
    pub order_by: Option<Expr>,
    pub partition_by: Option<Expr>,
    pub primary_key: Option<Expr>,
    pub sample_by: Option<Expr>,
    pub ttl: Option<Expr>,
    pub settings: Vec<(String, Expr)>,
    pub comment: Option<String>,
    /// `CREATE TABLE t AS other_table` — qualified name of the source.
    pub as_table: Option<String>,
}

impl CreateTableStatement {
    #[must_use]
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.elements.iter().filter_map(|e| match e {
            TableElement::Column(c) => Some(c),
            _ => None,
        })
    }
}

/// Named key-value clause shared by `SOURCE(...)`/`LAYOUT(...)` in
/// `CREATE DICTIONARY`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParams {
    pub name: String,
    pub params: Vec<(String, Expr)>,
}

/// `LIFETIME(n)` normalizes to `min = 0, max = n`; `LIFETIME(MIN a MAX b)`
/// keeps both bounds (§4.1 dictionary parameter equality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifetimeClause {
    pub min: u64,
    pub max: u64,
}

/// `CREATE DICTIONARY`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDictionaryStatement {
    pub name: String,
    pub database: Option<String>,
    pub cluster: Option<String>,
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
    pub source: NamedParams,
    pub layout: NamedParams,
    pub lifetime: LifetimeClause,
    pub settings: Vec<(String, Expr)>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Every,
    After,
}

/// `REFRESH EVERY n UNIT` / `REFRESH AFTER n UNIT`, optionally with a
/// randomization offset, for refreshable materialized views.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshClause {
    pub kind: RefreshKind,
    pub value: Expr,
    pub unit: IntervalUnit,
}

/// `CREATE [MATERIALIZED] VIEW`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewStatement {
    pub name: String,
    pub database: Option<String>,
    pub cluster: Option<String>,
    pub materialized: bool,
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub refresh: Option<RefreshClause>,
    pub append: bool,
    pub to_target: Option<String>,
    pub engine: Option<EngineClause>,
    pub populate: bool,
    pub select: SelectStatement,
    pub comment: Option<String>,
}

/// `CREATE FUNCTION name AS (params) -> body`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateFunctionStatement {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    pub cluster: Option<String>,
    pub or_replace: bool,
}

/// `CREATE ROLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoleStatement {
    pub name: String,
    pub settings: Vec<(String, Expr)>,
    pub cluster: Option<String>,
}

/// The object a `GRANT`/`REVOKE` applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GrantTarget {
    Global,
    Database(String),
    Table { database: String, table: String },
}

impl GrantTarget {
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Global => "*.*".to_string(),
            Self::Database(db) => format!("{db}.*"),
            Self::Table { database, table } => format!("{database}.{table}"),
        }
    }
}

/// A single privilege, optionally scoped to specific columns
/// (`SELECT(col1, col2)`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrivilegeSpec {
    pub name: String,
    pub columns: Vec<String>,
}

impl PrivilegeSpec {
    #[must_use]
    pub fn to_sql(&self) -> String {
        if self.columns.is_empty() {
            self.name.clone()
        } else {
            format!("{}({})", self.name, self.columns.join(", "))
        }
    }
}

/// `GRANT ... TO grantee [ON CLUSTER ...] [WITH GRANT OPTION]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantStatement {
    pub grantee: String,
    pub privileges: Vec<PrivilegeSpec>,
    pub target: GrantTarget,
    pub with_grant_option: bool,
    pub with_admin_option: bool,
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentificationMethod {
    Plaintext(String),
    Sha256Hash(String),
    NoPassword,
    Other(String),
}

impl IdentificationMethod {
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Plaintext(pw) => format!("IDENTIFIED WITH plaintext_password BY '{}'", pw.replace('\'', "''")),
            Self::Sha256Hash(hash) => format!("IDENTIFIED WITH sha256_hash BY '{hash}'"),
            Self::NoPassword => "IDENTIFIED WITH no_password".to_string(),
            Self::Other(raw) => format!("IDENTIFIED WITH {raw}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRestriction {
    Any,
    Local,
    Names(Vec<String>),
    Ip(Vec<String>),
}

impl HostRestriction {
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Any => "HOST ANY".to_string(),
            Self::Local => "HOST LOCAL".to_string(),
            Self::Names(names) => format!("HOST NAME {}", names.join(", ")),
            Self::Ip(ips) => format!("HOST IP {}", ips.join(", ")),
        }
    }
}

/// `CREATE USER`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserStatement {
    pub name: String,
    pub cluster: Option<String>,
    pub or_replace: bool,
    pub identified_by: Option<IdentificationMethod>,
    pub host: HostRestriction,
    pub valid_until: Option<String>,
    pub storage: Option<String>,
    pub default_roles: Vec<String>,
    pub default_database: Option<String>,
    pub grantees: Vec<String>,
}

/// One `key = value [NOT OVERRIDABLE]` entry of a named collection.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCollectionParam {
    pub key: String,
    pub value: Expr,
    /// `None` inherits the statement-level override flag.
    pub overridable: Option<bool>,
}

/// `CREATE NAMED COLLECTION`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateNamedCollectionStatement {
    pub name: String,
    pub cluster: Option<String>,
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub comment: Option<String>,
    pub overridable: bool,
    pub parameters: Vec<NamedCollectionParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CteDef {
    pub name: String,
    pub query: Box<SelectStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FromClause {
    Table {
        database: Option<String>,
        name: String,
        alias: Option<String>,
    },
    Subquery {
        stmt: Box<SelectStatement>,
        alias: Option<String>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
        alias: Option<String>,
    },
}

impl FromClause {
    /// A discriminant used by the "structural similarity" fallback (§4.1):
    /// table vs. subquery vs. function-source.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Table { .. } => "table",
            Self::Subquery { .. } => "subquery",
            Self::Function { .. } => "function",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub source: FromClause,
    pub on: Option<Expr>,
    pub using: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    Union,
    UnionAll,
    UnionDistinct,
    Intersect,
    Except,
}

/// A `SELECT` statement, including the clauses needed by the §4.1 equality
/// rules: WITH, columns, FROM/JOIN, WHERE, GROUP BY, HAVING, ORDER BY,
/// LIMIT/OFFSET, SETTINGS, and a UNION/INTERSECT/EXCEPT tail.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub with: Vec<CteDef>,
    pub columns: Vec<SelectItem>,
    pub from: Option<FromClause>,
    pub joins: Vec<JoinClause>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
    pub settings: Vec<(String, Expr)>,
    pub unions: Vec<(UnionKind, Box<SelectStatement>)>,
}

impl SelectStatement {
    /// Renders the statement back into SQL text (the deterministic builder
    /// named in §2 item 1). Used when emitting `CREATE VIEW ... AS SELECT`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut s = String::new();
        if !self.with.is_empty() {
            let ctes = self
                .with
                .iter()
                .map(|c| format!("{} AS ({})", c.name, c.query.to_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            s.push_str(&format!("WITH {ctes} "));
        }
        s.push_str("SELECT ");
        s.push_str(
            &self
                .columns
                .iter()
                .map(|c| match &c.alias {
                    Some(a) => format!("{} AS {a}", c.expr.to_sql()),
                    None => c.expr.to_sql(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        );
        if let Some(from) = &self.from {
            s.push_str(" FROM ");
            s.push_str(&from_to_sql(from));
        }
        for join in &self.joins {
            s.push_str(&format!(" {}", join_to_sql(join)));
        }
        if let Some(w) = &self.where_clause {
            s.push_str(&format!(" WHERE {}", w.to_sql()));
        }
        if !self.group_by.is_empty() {
            s.push_str(&format!(
                " GROUP BY {}",
                self.group_by.iter().map(Expr::to_sql).collect::<Vec<_>>().join(", ")
            ));
        }
        if let Some(h) = &self.having {
            s.push_str(&format!(" HAVING {}", h.to_sql()));
        }
        if !self.order_by.is_empty() {
            let items = self
                .order_by
                .iter()
                .map(order_item_to_sql)
                .collect::<Vec<_>>()
                .join(", ");
            s.push_str(&format!(" ORDER BY {items}"));
        }
        if let Some(limit) = &self.limit {
            s.push_str(&format!(" LIMIT {}", limit.to_sql()));
            if let Some(offset) = &self.offset {
                s.push_str(&format!(" OFFSET {}", offset.to_sql()));
            }
        }
        if !self.settings.is_empty() {
            let items = self
                .settings
                .iter()
                .map(|(k, v)| format!("{k} = {}", v.to_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            s.push_str(&format!(" SETTINGS {items}"));
        }
        for (kind, query) in &self.unions {
            s.push_str(&format!(" {} {}", union_kw(*kind), query.to_sql()));
        }
        s
    }
}

fn from_to_sql(from: &FromClause) -> String {
    match from {
        FromClause::Table { database, name, alias } => {
            let qualified = super::qualify(database.as_deref(), name);
            match alias {
                Some(a) => format!("{qualified} AS {a}"),
                None => qualified,
            }
        }
        FromClause::Subquery { stmt, alias } => {
            let inner = format!("({})", stmt.to_sql());
            match alias {
                Some(a) => format!("{inner} AS {a}"),
                None => inner,
            }
        }
        FromClause::Function { name, args, alias } => {
            let args = args.iter().map(Expr::to_sql).collect::<Vec<_>>().join(", ");
            let call = format!("{name}({args})");
            match alias {
                Some(a) => format!("{call} AS {a}"),
                None => call,
            }
        }
    }
}

fn join_to_sql(join: &JoinClause) -> String {
    let kw = match join.kind {
        JoinKind::Inner => "INNER JOIN",
        JoinKind::Left => "LEFT JOIN",
        JoinKind::Right => "RIGHT JOIN",
        JoinKind::Full => "FULL JOIN",
        JoinKind::Cross => "CROSS JOIN",
    };
    let mut s = format!("{kw} {}", from_to_sql(&join.source));
    if let Some(on) = &join.on {
        s.push_str(&format!(" ON {}", on.to_sql()));
    } else if !join.using.is_empty() {
        s.push_str(&format!(" USING ({})", join.using.join(", ")));
    }
    s
}

fn order_item_to_sql(item: &OrderByItem) -> String {
    let mut s = item.expr.to_sql();
    if item.direction == OrderDirection::Desc {
        s.push_str(" DESC");
    }
    match item.nulls {
        Some(NullsOrder::First) => s.push_str(" NULLS FIRST"),
        Some(NullsOrder::Last) => s.push_str(" NULLS LAST"),
        None => {}
    }
    s
}

const fn union_kw(kind: UnionKind) -> &'static str {
    match kind {
        UnionKind::Union => "UNION",
        UnionKind::UnionAll => "UNION ALL",
        UnionKind::UnionDistinct => "UNION DISTINCT",
        UnionKind::Intersect => "INTERSECT",
        UnionKind::Except => "EXCEPT",
    }
}

/// A top-level parsed statement, the unit the §4.2 extractors walk over.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateDatabase(CreateDatabaseStatement),
    CreateTable(CreateTableStatement),
    CreateDictionary(CreateDictionaryStatement),
    CreateView(CreateViewStatement),
    CreateFunction(CreateFunctionStatement),
    CreateRole(CreateRoleStatement),
    Grant(GrantStatement),
    CreateUser(CreateUserStatement),
    CreateNamedCollection(CreateNamedCollectionStatement),
    Select(SelectStatement),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_to_sql_covers_the_common_clauses() {
        let stmt = SelectStatement {
            columns: vec![SelectItem { expr: Expr::ident("id"), alias: None }],
            from: Some(FromClause::Table { database: Some("x".into()), name: "e".into(), alias: None }),
            where_clause: Some(Expr::ident("id").binary(super::super::expr::BinaryOp::Gt, Expr::number("0"))),
            ..Default::default()
        };
        assert_eq!(stmt.to_sql(), "SELECT id FROM x.e WHERE id > 0");
    }
}
