//! Expression AST: the precedence tree named in §4.1 (OR -> AND -> NOT ->
//! comparison -> addition -> multiplication -> unary -> primary).

use super::types::DataType;
use super::statement::SelectStatement;

/// A literal value. Numbers are kept as the source text (post-trim) rather
/// than parsed into `f64`/`i64` so equality can follow §4.1's "numbers
/// compared as strings post-trim" rule without re-deriving formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer or floating-point literal, stored as written.
    Number(String),
    /// A quoted string literal, unquoted.
    String(String),
    /// `TRUE` / `FALSE`.
    Boolean(bool),
    /// `NULL`.
    Null,
}

/// Binary operators covering the precedence levels named in §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Like,
    NotLike,
}

impl BinaryOp {
    /// Precedence level; higher binds tighter. Mirrors the fixed tree
    /// OR(1) -> AND(2) -> comparison(3) -> addition(4) -> multiplication(5).
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq
            | Self::NotEq
            | Self::Lt
            | Self::LtEq
            | Self::Gt
            | Self::GtEq
            | Self::Like
            | Self::NotLike => 3,
            Self::Add | Self::Sub | Self::Concat => 4,
            Self::Mul | Self::Div | Self::Mod => 5,
        }
    }

    /// SQL spelling of the operator, used by the deterministic SQL builder.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Concat => "||",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

/// Unary operators: NOT, unary minus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT",
        }
    }
}

/// The seven calendar units `INTERVAL n UNIT` accepts (§4.1); singular and
/// plural spellings (`DAY`/`DAYS`) parse to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    /// Parses a unit keyword, tolerating a trailing `S` and any case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.to_ascii_uppercase();
        let singular = upper.strip_suffix('S').unwrap_or(&upper);
        match singular {
            "SECOND" => Some(Self::Second),
            "MINUTE" => Some(Self::Minute),
            "HOUR" => Some(Self::Hour),
            "DAY" => Some(Self::Day),
            "WEEK" => Some(Self::Week),
            "MONTH" => Some(Self::Month),
            "YEAR" => Some(Self::Year),
            _ => None,
        }
    }

    /// The name of the `toInterval<Unit>` function equivalent to this unit.
    #[must_use]
    pub fn to_interval_fn(self) -> &'static str {
        match self {
            Self::Second => "toIntervalSecond",
            Self::Minute => "toIntervalMinute",
            Self::Hour => "toIntervalHour",
            Self::Day => "toIntervalDay",
            Self::Week => "toIntervalWeek",
            Self::Month => "toIntervalMonth",
            Self::Year => "toIntervalYear",
        }
    }

    /// Number of seconds represented by one unit, used to normalize
    /// REFRESH EVERY/AFTER clauses for view equality (§4.1).
    #[must_use]
    pub const fn seconds(self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3600,
            Self::Day => 86_400,
            Self::Week => 604_800,
            Self::Month => 2_592_000,
            Self::Year => 31_536_000,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Second => "SECOND",
            Self::Minute => "MINUTE",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        }
    }
}

/// A function-call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

/// An SQL expression, represented as a tagged sum type per variant rather
/// than virtual dispatch (§9 "Deep inheritance in the expression AST").
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),

    /// A (possibly qualified) identifier: `col`, `t.col`, `` `db`.`t`.`col` ``.
    Identifier(Vec<String>),

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Function(FunctionCall),

    Paren(Box<Expr>),

    Tuple(Vec<Expr>),

    Array(Vec<Expr>),

    Cast {
        expr: Box<Expr>,
        data_type: DataType,
    },

    Extract {
        part: String,
        expr: Box<Expr>,
    },

    /// `INTERVAL n UNIT`, kept distinct from the `toIntervalUnit(n)`
    /// function-call form so the equality layer can bridge the two (§4.1).
    Interval {
        value: Box<Expr>,
        unit: IntervalUnit,
    },

    Case {
        operand: Option<Box<Expr>>,
        when_then: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    Subquery(Box<SelectStatement>),

    Wildcard {
        table: Option<String>,
    },
}

impl Expr {
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier(vec![name.into()])
    }

    #[must_use]
    pub fn qualified_ident(parts: Vec<String>) -> Self {
        Self::Identifier(parts)
    }

    #[must_use]
    pub fn number(value: impl Into<String>) -> Self {
        Self::Literal(Literal::Number(value.into()))
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(Literal::Null)
    }

    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Function(FunctionCall {
            name: name.into(),
            args,
            distinct: false,
        })
    }

    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn interval(value: Self, unit: IntervalUnit) -> Self {
        Self::Interval {
            value: Box::new(value),
            unit,
        }
    }

    /// Renders the expression back into deterministic SQL text. This is the
    /// "small SQL-string builder" named in §2 item 1 — used for emission of
    /// the statements this crate itself generates, not a general formatter
    /// for arbitrary input DDL (that is [`crate::interfaces::StatementPrinter`]'s job).
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Literal(Literal::Number(n)) => n.clone(),
            Self::Literal(Literal::String(s)) => format!("'{}'", s.replace('\'', "''")),
            Self::Literal(Literal::Boolean(b)) => if *b { "true" } else { "false" }.to_string(),
            Self::Literal(Literal::Null) => "NULL".to_string(),
            Self::Identifier(parts) => parts.join("."),
            Self::Binary { left, op, right } => {
                format!("{} {} {}", left.to_sql(), op.as_str(), right.to_sql())
            }
            Self::Unary { op: UnaryOp::Neg, operand } => format!("-{}", operand.to_sql()),
            Self::Unary { op: UnaryOp::Not, operand } => format!("NOT {}", operand.to_sql()),
            Self::Function(f) => {
                let distinct = if f.distinct { "DISTINCT " } else { "" };
                let args = f.args.iter().map(Self::to_sql).collect::<Vec<_>>().join(", ");
                format!("{}({distinct}{args})", f.name)
            }
            Self::Paren(inner) => format!("({})", inner.to_sql()),
            Self::Tuple(items) => {
                format!("({})", items.iter().map(Self::to_sql).collect::<Vec<_>>().join(", "))
            }
            Self::Array(items) => {
                format!("[{}]", items.iter().map(Self::to_sql).collect::<Vec<_>>().join(", "))
            }
            Self::Cast { expr, data_type } => {
                format!("CAST({} AS {})", expr.to_sql(), data_type.to_sql())
            }
            Self::Extract { part, expr } => format!("EXTRACT({part} FROM {})", expr.to_sql()),
            Self::Interval { value, unit } => format!("INTERVAL {} {}", value.to_sql(), unit.keyword()),
            Self::Case { operand, when_then, else_clause } => {
                let mut s = String::from("CASE");
                if let Some(op) = operand {
                    s.push_str(&format!(" {}", op.to_sql()));
                }
                for (when, then) in when_then {
                    s.push_str(&format!(" WHEN {} THEN {}", when.to_sql(), then.to_sql()));
                }
                if let Some(e) = else_clause {
                    s.push_str(&format!(" ELSE {}", e.to_sql()));
                }
                s.push_str(" END");
                s
            }
            Self::In { expr, list, negated } => {
                let kw = if *negated { "NOT IN" } else { "IN" };
                let items = list.iter().map(Self::to_sql).collect::<Vec<_>>().join(", ");
                format!("{} {kw} ({items})", expr.to_sql())
            }
            Self::Between { expr, low, high, negated } => {
                let kw = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {kw} {} AND {}", expr.to_sql(), low.to_sql(), high.to_sql())
            }
            Self::Subquery(stmt) => format!("({})", stmt.to_sql()),
            Self::Wildcard { table } => match table {
                Some(t) => format!("{t}.*"),
                None => "*".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_unit_parses_singular_and_plural() {
        assert_eq!(IntervalUnit::parse("DAY"), Some(IntervalUnit::Day));
        assert_eq!(IntervalUnit::parse("DAYS"), Some(IntervalUnit::Day));
        assert_eq!(IntervalUnit::parse("days"), Some(IntervalUnit::Day));
        assert_eq!(IntervalUnit::parse("fortnight"), None);
    }

    #[test]
    fn binary_precedence_matches_the_fixed_tree() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Eq.precedence());
        assert!(BinaryOp::Eq.precedence() > BinaryOp::And.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
    }

    #[test]
    fn to_sql_round_trips_a_simple_predicate() {
        let expr = Expr::ident("age")
            .binary(BinaryOp::GtEq, Expr::number("18"))
            .binary(BinaryOp::And, Expr::ident("status").binary(BinaryOp::Eq, Expr::string("active")));
        assert_eq!(expr.to_sql(), "age >= 18 AND status = 'active'");
    }
}
