//! Construction helpers for IR trees.
//!
//! Front-ends and tests build trees through these instead of spelling out
//! every `Box::new`. `SelectExpression::add_to_projection` is the checked
//! entry point that rejects duplicate aliases at construction time.

use chrono::NaiveDateTime;

use super::types::*;
use crate::error::IrError;

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Integer(v.into())
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Boolean(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::String(v)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(v: NaiveDateTime) -> Self {
        Literal::DateTime(v)
    }
}

pub fn column(table: impl Into<String>, name: impl Into<String>) -> SqlExpression {
    SqlExpression::Column(ColumnReference {
        table: table.into(),
        name: name.into(),
    })
}

pub fn literal(value: impl Into<Literal>) -> SqlExpression {
    SqlExpression::Literal(value.into())
}

pub fn null() -> SqlExpression {
    SqlExpression::Literal(Literal::Null)
}

pub fn param(name: impl Into<String>, ty: SqlType) -> SqlExpression {
    SqlExpression::Parameter {
        name: name.into(),
        ty,
    }
}

pub fn fragment(sql: impl Into<String>) -> SqlExpression {
    SqlExpression::Fragment(sql.into())
}

pub fn alias(alias: impl Into<String>, expr: SqlExpression) -> SqlExpression {
    SqlExpression::Alias {
        alias: alias.into(),
        expr: Box::new(expr),
    }
}

pub fn binary(left: SqlExpression, op: BinaryOperator, right: SqlExpression) -> SqlExpression {
    SqlExpression::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

pub fn eq(left: SqlExpression, right: SqlExpression) -> SqlExpression {
    binary(left, BinaryOperator::Eq, right)
}

pub fn gt(left: SqlExpression, right: SqlExpression) -> SqlExpression {
    binary(left, BinaryOperator::Gt, right)
}

pub fn lt_eq(left: SqlExpression, right: SqlExpression) -> SqlExpression {
    binary(left, BinaryOperator::LtEq, right)
}

pub fn and(left: SqlExpression, right: SqlExpression) -> SqlExpression {
    binary(left, BinaryOperator::And, right)
}

pub fn plus(left: SqlExpression, right: SqlExpression) -> SqlExpression {
    binary(left, BinaryOperator::Plus, right)
}

pub fn not(expr: SqlExpression) -> SqlExpression {
    SqlExpression::Unary {
        op: UnaryOperator::Not,
        expr: Box::new(expr),
    }
}

pub fn is_null(expr: SqlExpression) -> SqlExpression {
    SqlExpression::IsNull {
        expr: Box::new(expr),
        negated: false,
    }
}

pub fn function(
    name: impl Into<String>,
    args: Vec<SqlExpression>,
    result_type: SqlType,
) -> SqlExpression {
    SqlExpression::Function(SqlFunctionCall {
        schema: None,
        name: name.into(),
        args,
        result_type,
        niladic: false,
    })
}

/// `COUNT(arg)` with a declared result width.
pub fn count(arg: SqlExpression, result_type: SqlType) -> SqlExpression {
    function("COUNT", vec![arg], result_type)
}

pub fn exists(subquery: SelectExpression) -> SqlExpression {
    SqlExpression::Exists(ExistsExpression {
        subquery: Box::new(subquery),
    })
}

pub fn scalar(subquery: SelectExpression) -> SqlExpression {
    SqlExpression::Scalar(Box::new(subquery))
}

pub fn row_number(orderings: Vec<Ordering>) -> SqlExpression {
    SqlExpression::RowNumber(RowNumberExpression { orderings })
}

pub fn asc(expression: SqlExpression) -> Ordering {
    Ordering {
        expression,
        direction: OrderingDirection::Asc,
    }
}

pub fn desc(expression: SqlExpression) -> Ordering {
    Ordering {
        expression,
        direction: OrderingDirection::Desc,
    }
}

pub fn table(name: impl Into<String>, alias: impl Into<String>) -> TableExpression {
    TableExpression::Table {
        schema: None,
        name: name.into(),
        alias: alias.into(),
    }
}

pub fn subquery(query: SelectExpression, alias: impl Into<String>) -> TableExpression {
    TableExpression::Subquery {
        query: Box::new(query),
        alias: alias.into(),
    }
}

pub fn inner_join(table: TableExpression, on: SqlExpression) -> TableExpression {
    TableExpression::InnerJoin {
        table: Box::new(table),
        on,
    }
}

pub fn left_join(table: TableExpression, on: SqlExpression) -> TableExpression {
    TableExpression::LeftJoin {
        table: Box::new(table),
        on,
    }
}

pub fn cross_join_lateral(query: SelectExpression, alias: impl Into<String>) -> TableExpression {
    TableExpression::CrossJoinLateral {
        table: Box::new(subquery(query, alias)),
    }
}

impl SelectExpression {
    pub fn from_table(source: TableExpression) -> Self {
        Self {
            from: vec![source],
            ..Default::default()
        }
    }

    pub fn project(mut self, expr: SqlExpression) -> Self {
        self.projection.push(SelectItem::Expression { expr, alias: None });
        self
    }

    pub fn project_as(mut self, expr: SqlExpression, alias: impl Into<String>) -> Self {
        self.projection.push(SelectItem::Expression {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    pub fn project_star(mut self, table: impl Into<String>, columns: &[&str]) -> Self {
        self.projection.push(SelectItem::Wildcard {
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn join(mut self, join: TableExpression) -> Self {
        self.from.push(join);
        self
    }

    pub fn filter(mut self, predicate: SqlExpression) -> Self {
        self.add_to_predicate(predicate);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.order_by.push(ordering);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_offset(mut self, offset: SqlExpression) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: SqlExpression) -> Self {
        self.limit = Some(limit);
        self
    }

    /// AND a condition into the WHERE clause.
    pub fn add_to_predicate(&mut self, predicate: SqlExpression) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => and(existing, predicate),
            None => predicate,
        });
    }

    /// Append a projection item, rejecting an output name already in use.
    /// Returns the ordinal of the new item.
    pub fn add_to_projection(&mut self, item: SelectItem) -> Result<usize, IrError> {
        if let Some(name) = item.output_name() {
            if self.projection.iter().any(|p| p.output_name() == Some(name)) {
                return Err(IrError::DuplicateProjectionAlias {
                    alias: name.to_string(),
                    location: "select/projection".into(),
                });
            }
        }
        self.projection.push(item);
        Ok(self.projection.len() - 1)
    }
}
