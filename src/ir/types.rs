//! Query IR node set.
//!
//! This module defines the dialect-neutral tree produced by a front-end and
//! consumed by the rewrite passes and SQL generators. The tree is:
//! - Closed (every consumer matches every node kind)
//! - Immutable once built (passes take a tree by value and return a new one)
//! - Plain data (behavior lives in visitors and generators)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A SELECT query unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectExpression {
    pub distinct: bool,
    /// Output list. Empty means "no columns requested" and emits `1`.
    pub projection: Vec<SelectItem>,
    /// First entry is the source, further entries are joins.
    pub from: Vec<TableExpression>,
    pub predicate: Option<SqlExpression>,
    pub group_by: Vec<SqlExpression>,
    pub having: Option<SqlExpression>,
    pub order_by: Vec<Ordering>,
    pub offset: Option<SqlExpression>,
    pub limit: Option<SqlExpression>,
}

/// A single item in the SELECT projection list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    /// `table.*`. `columns` lists what the star stands for.
    Wildcard { table: String, columns: Vec<String> },
    /// An expression, optionally aliased: `expr AS alias`.
    Expression {
        expr: SqlExpression,
        alias: Option<String>,
    },
}

/// FROM clause entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableExpression {
    /// Base table: `schema.name AS alias`.
    Table {
        schema: Option<String>,
        name: String,
        alias: String,
    },
    /// Derived table: `(SELECT ...) AS alias`.
    Subquery {
        query: Box<SelectExpression>,
        alias: String,
    },
    InnerJoin {
        table: Box<TableExpression>,
        on: SqlExpression,
    },
    LeftJoin {
        table: Box<TableExpression>,
        on: SqlExpression,
    },
    CrossJoin { table: Box<TableExpression> },
    /// Right side may reference columns of the tables to its left.
    CrossJoinLateral { table: Box<TableExpression> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderingDirection {
    #[default]
    Asc,
    Desc,
}

/// ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub expression: SqlExpression,
    #[serde(default)]
    pub direction: OrderingDirection,
}

/// Column of a table or subquery alias in the current scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnReference {
    pub table: String,
    pub name: String,
}

/// Declared store-independent result types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SqlType {
    Boolean,
    Int32,
    Int64,
    Float,
    Decimal,
    String,
    DateTime,
    #[default]
    Unknown,
}

impl SqlType {
    pub fn is_integer(self) -> bool {
        matches!(self, SqlType::Int32 | SqlType::Int64)
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Negate,
}

/// Named function application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlFunctionCall {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Vec<SqlExpression>,
    #[serde(default)]
    pub result_type: SqlType,
    /// Emit the bare name with no argument list (`CURRENT_TIMESTAMP`).
    #[serde(default)]
    pub niladic: bool,
}

/// `ROW_NUMBER() OVER(ORDER BY ...)`. Only legal in a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowNumberExpression {
    pub orderings: Vec<Ordering>,
}

/// `EXISTS (subquery)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistsExpression {
    pub subquery: Box<SelectExpression>,
}

/// Core expression type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlExpression {
    Column(ColumnReference),
    Literal(Literal),
    /// Placeholder bound at execution time.
    Parameter { name: String, ty: SqlType },
    /// Verbatim SQL text.
    Fragment(String),
    /// Names an expression so an enclosing scope or ORDER BY can refer to it.
    Alias {
        alias: String,
        expr: Box<SqlExpression>,
    },
    Binary {
        left: Box<SqlExpression>,
        op: BinaryOperator,
        right: Box<SqlExpression>,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<SqlExpression>,
    },
    IsNull {
        expr: Box<SqlExpression>,
        negated: bool,
    },
    Like {
        expr: Box<SqlExpression>,
        pattern: Box<SqlExpression>,
    },
    InList {
        expr: Box<SqlExpression>,
        values: Vec<SqlExpression>,
        negated: bool,
    },
    InSubquery {
        expr: Box<SqlExpression>,
        subquery: Box<SelectExpression>,
        negated: bool,
    },
    Case {
        operand: Option<Box<SqlExpression>>,
        when_then: Vec<(SqlExpression, SqlExpression)>,
        else_result: Option<Box<SqlExpression>>,
    },
    /// `CAST(expr AS store_type)`.
    Cast {
        expr: Box<SqlExpression>,
        store_type: String,
    },
    /// Type coercion with no textual representation.
    Convert {
        expr: Box<SqlExpression>,
        ty: SqlType,
    },
    Function(SqlFunctionCall),
    RowNumber(RowNumberExpression),
    Exists(ExistsExpression),
    /// Scalar subquery `(SELECT ...)`.
    Scalar(Box<SelectExpression>),
}

impl SqlExpression {
    /// Stable node kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlExpression::Column(_) => "Column",
            SqlExpression::Literal(_) => "Literal",
            SqlExpression::Parameter { .. } => "Parameter",
            SqlExpression::Fragment(_) => "Fragment",
            SqlExpression::Alias { .. } => "Alias",
            SqlExpression::Binary { .. } => "Binary",
            SqlExpression::Unary { .. } => "Unary",
            SqlExpression::IsNull { .. } => "IsNull",
            SqlExpression::Like { .. } => "Like",
            SqlExpression::InList { .. } => "InList",
            SqlExpression::InSubquery { .. } => "InSubquery",
            SqlExpression::Case { .. } => "Case",
            SqlExpression::Cast { .. } => "Cast",
            SqlExpression::Convert { .. } => "Convert",
            SqlExpression::Function(_) => "Function",
            SqlExpression::RowNumber(_) => "RowNumber",
            SqlExpression::Exists(_) => "Exists",
            SqlExpression::Scalar(_) => "Scalar",
        }
    }

    /// Literals, parameters and fragments: values that cannot vary per row.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            SqlExpression::Literal(_) | SqlExpression::Parameter { .. } | SqlExpression::Fragment(_)
        )
    }

    /// Best-effort result type, used for coercions during rewriting.
    pub fn sql_type(&self) -> SqlType {
        match self {
            SqlExpression::Literal(Literal::Integer(_)) => SqlType::Int64,
            SqlExpression::Literal(Literal::Boolean(_)) => SqlType::Boolean,
            SqlExpression::Literal(Literal::Float(_)) => SqlType::Float,
            SqlExpression::Literal(Literal::String(_)) => SqlType::String,
            SqlExpression::Literal(Literal::DateTime(_)) => SqlType::DateTime,
            SqlExpression::Parameter { ty, .. } | SqlExpression::Convert { ty, .. } => *ty,
            SqlExpression::Function(f) => f.result_type,
            SqlExpression::RowNumber(_) => SqlType::Int64,
            SqlExpression::Alias { expr, .. } => expr.sql_type(),
            SqlExpression::Binary { left, op, right } => {
                if op.is_comparison() || matches!(op, BinaryOperator::And | BinaryOperator::Or) {
                    SqlType::Boolean
                } else {
                    match (left.sql_type(), right.sql_type()) {
                        (SqlType::Unknown, other) | (other, SqlType::Unknown) => other,
                        (SqlType::Int64, _) | (_, SqlType::Int64) => SqlType::Int64,
                        (l, _) => l,
                    }
                }
            }
            SqlExpression::IsNull { .. }
            | SqlExpression::Like { .. }
            | SqlExpression::InList { .. }
            | SqlExpression::InSubquery { .. }
            | SqlExpression::Exists(_) => SqlType::Boolean,
            _ => SqlType::Unknown,
        }
    }
}

impl TableExpression {
    pub fn kind(&self) -> &'static str {
        match self {
            TableExpression::Table { .. } => "Table",
            TableExpression::Subquery { .. } => "Subquery",
            TableExpression::InnerJoin { .. } => "InnerJoin",
            TableExpression::LeftJoin { .. } => "LeftJoin",
            TableExpression::CrossJoin { .. } => "CrossJoin",
            TableExpression::CrossJoinLateral { .. } => "CrossJoinLateral",
        }
    }

    /// Alias of the source this entry introduces, looking through joins.
    pub fn alias(&self) -> &str {
        match self {
            TableExpression::Table { alias, .. } | TableExpression::Subquery { alias, .. } => alias,
            TableExpression::InnerJoin { table, .. }
            | TableExpression::LeftJoin { table, .. }
            | TableExpression::CrossJoin { table }
            | TableExpression::CrossJoinLateral { table } => table.alias(),
        }
    }

    pub fn is_join(&self) -> bool {
        !matches!(
            self,
            TableExpression::Table { .. } | TableExpression::Subquery { .. }
        )
    }
}

impl SelectItem {
    /// Output column name as seen by an enclosing scope.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            SelectItem::Wildcard { .. } => None,
            SelectItem::Expression {
                alias: Some(alias), ..
            } => Some(alias),
            SelectItem::Expression { expr, alias: None } => match expr {
                SqlExpression::Column(c) => Some(&c.name),
                SqlExpression::Alias { alias, .. } => Some(alias),
                _ => None,
            },
        }
    }

    pub fn is_row_number(&self) -> bool {
        match self {
            SelectItem::Expression { expr, .. } => match expr {
                SqlExpression::RowNumber(_) => true,
                SqlExpression::Alias { expr, .. } => {
                    matches!(expr.as_ref(), SqlExpression::RowNumber(_))
                }
                _ => false,
            },
            SelectItem::Wildcard { .. } => false,
        }
    }
}

impl SelectExpression {
    pub fn has_paging(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}
