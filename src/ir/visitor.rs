/// Traversal infrastructure for the query IR.
///
/// Two traits cover the two ways passes touch a tree:
///
/// - `ExpressionVisitor` borrows the tree and reports through `Result<()>`.
/// - `ExpressionRewriter` takes each node by value and returns its
///   replacement. Untouched nodes are moved through, never copied.
///
/// Every trait method defaults to the matching free function (`walk_*` for
/// visitors, `fold_*` for rewriters) which recurses into the children. An
/// override that still wants the default recursion calls the free function
/// itself, before or after its own work.
use crate::error::Result;

use super::types::*;

pub trait ExpressionVisitor {
    fn visit_select(&mut self, select: &SelectExpression) -> Result<()> {
        walk_select(self, select)
    }

    fn visit_table(&mut self, table: &TableExpression) -> Result<()> {
        walk_table(self, table)
    }

    fn visit_expression(&mut self, expr: &SqlExpression) -> Result<()> {
        walk_expression(self, expr)
    }
}

pub fn walk_select<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    select: &SelectExpression,
) -> Result<()> {
    for item in &select.projection {
        if let SelectItem::Expression { expr, .. } = item {
            visitor.visit_expression(expr)?;
        }
    }
    for table in &select.from {
        visitor.visit_table(table)?;
    }
    if let Some(predicate) = &select.predicate {
        visitor.visit_expression(predicate)?;
    }
    for expr in &select.group_by {
        visitor.visit_expression(expr)?;
    }
    if let Some(having) = &select.having {
        visitor.visit_expression(having)?;
    }
    for ordering in &select.order_by {
        visitor.visit_expression(&ordering.expression)?;
    }
    if let Some(offset) = &select.offset {
        visitor.visit_expression(offset)?;
    }
    if let Some(limit) = &select.limit {
        visitor.visit_expression(limit)?;
    }
    Ok(())
}

pub fn walk_table<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    table: &TableExpression,
) -> Result<()> {
    match table {
        TableExpression::Table { .. } => Ok(()),
        TableExpression::Subquery { query, .. } => visitor.visit_select(query),
        TableExpression::InnerJoin { table, on } | TableExpression::LeftJoin { table, on } => {
            visitor.visit_table(table)?;
            visitor.visit_expression(on)
        }
        TableExpression::CrossJoin { table } | TableExpression::CrossJoinLateral { table } => {
            visitor.visit_table(table)
        }
    }
}

pub fn walk_expression<V: ExpressionVisitor + ?Sized>(
    visitor: &mut V,
    expr: &SqlExpression,
) -> Result<()> {
    match expr {
        SqlExpression::Column(_)
        | SqlExpression::Literal(_)
        | SqlExpression::Parameter { .. }
        | SqlExpression::Fragment(_) => Ok(()),
        SqlExpression::Alias { expr, .. }
        | SqlExpression::Unary { expr, .. }
        | SqlExpression::IsNull { expr, .. }
        | SqlExpression::Cast { expr, .. }
        | SqlExpression::Convert { expr, .. } => visitor.visit_expression(expr),
        SqlExpression::Binary { left, right, .. } => {
            visitor.visit_expression(left)?;
            visitor.visit_expression(right)
        }
        SqlExpression::Like { expr, pattern } => {
            visitor.visit_expression(expr)?;
            visitor.visit_expression(pattern)
        }
        SqlExpression::InList { expr, values, .. } => {
            visitor.visit_expression(expr)?;
            for value in values {
                visitor.visit_expression(value)?;
            }
            Ok(())
        }
        SqlExpression::InSubquery { expr, subquery, .. } => {
            visitor.visit_expression(expr)?;
            visitor.visit_select(subquery)
        }
        SqlExpression::Case {
            operand,
            when_then,
            else_result,
        } => {
            if let Some(operand) = operand {
                visitor.visit_expression(operand)?;
            }
            for (when, then) in when_then {
                visitor.visit_expression(when)?;
                visitor.visit_expression(then)?;
            }
            if let Some(else_result) = else_result {
                visitor.visit_expression(else_result)?;
            }
            Ok(())
        }
        SqlExpression::Function(call) => {
            for arg in &call.args {
                visitor.visit_expression(arg)?;
            }
            Ok(())
        }
        SqlExpression::RowNumber(row_number) => {
            for ordering in &row_number.orderings {
                visitor.visit_expression(&ordering.expression)?;
            }
            Ok(())
        }
        SqlExpression::Exists(exists) => visitor.visit_select(&exists.subquery),
        SqlExpression::Scalar(subquery) => visitor.visit_select(subquery),
    }
}

pub trait ExpressionRewriter {
    fn rewrite_select(&mut self, select: SelectExpression) -> Result<SelectExpression> {
        fold_select(self, select)
    }

    fn rewrite_table(&mut self, table: TableExpression) -> Result<TableExpression> {
        fold_table(self, table)
    }

    fn rewrite_expression(&mut self, expr: SqlExpression) -> Result<SqlExpression> {
        fold_expression(self, expr)
    }
}

fn fold_boxed<R: ExpressionRewriter + ?Sized>(
    rewriter: &mut R,
    expr: Box<SqlExpression>,
) -> Result<Box<SqlExpression>> {
    Ok(Box::new(rewriter.rewrite_expression(*expr)?))
}

fn fold_option<R: ExpressionRewriter + ?Sized>(
    rewriter: &mut R,
    expr: Option<SqlExpression>,
) -> Result<Option<SqlExpression>> {
    expr.map(|e| rewriter.rewrite_expression(e)).transpose()
}

fn fold_orderings<R: ExpressionRewriter + ?Sized>(
    rewriter: &mut R,
    orderings: Vec<Ordering>,
) -> Result<Vec<Ordering>> {
    orderings
        .into_iter()
        .map(|o| {
            Ok(Ordering {
                expression: rewriter.rewrite_expression(o.expression)?,
                direction: o.direction,
            })
        })
        .collect()
}

pub fn fold_select<R: ExpressionRewriter + ?Sized>(
    rewriter: &mut R,
    select: SelectExpression,
) -> Result<SelectExpression> {
    let projection = select
        .projection
        .into_iter()
        .map(|item| match item {
            SelectItem::Expression { expr, alias } => Ok(SelectItem::Expression {
                expr: rewriter.rewrite_expression(expr)?,
                alias,
            }),
            wildcard => Ok(wildcard),
        })
        .collect::<Result<Vec<_>>>()?;
    let from = select
        .from
        .into_iter()
        .map(|t| rewriter.rewrite_table(t))
        .collect::<Result<Vec<_>>>()?;
    let predicate = fold_option(rewriter, select.predicate)?;
    let group_by = select
        .group_by
        .into_iter()
        .map(|e| rewriter.rewrite_expression(e))
        .collect::<Result<Vec<_>>>()?;
    let having = fold_option(rewriter, select.having)?;
    let order_by = fold_orderings(rewriter, select.order_by)?;
    let offset = fold_option(rewriter, select.offset)?;
    let limit = fold_option(rewriter, select.limit)?;

    Ok(SelectExpression {
        distinct: select.distinct,
        projection,
        from,
        predicate,
        group_by,
        having,
        order_by,
        offset,
        limit,
    })
}

pub fn fold_table<R: ExpressionRewriter + ?Sized>(
    rewriter: &mut R,
    table: TableExpression,
) -> Result<TableExpression> {
    Ok(match table {
        t @ TableExpression::Table { .. } => t,
        TableExpression::Subquery { query, alias } => TableExpression::Subquery {
            query: Box::new(rewriter.rewrite_select(*query)?),
            alias,
        },
        TableExpression::InnerJoin { table, on } => TableExpression::InnerJoin {
            table: Box::new(rewriter.rewrite_table(*table)?),
            on: rewriter.rewrite_expression(on)?,
        },
        TableExpression::LeftJoin { table, on } => TableExpression::LeftJoin {
            table: Box::new(rewriter.rewrite_table(*table)?),
            on: rewriter.rewrite_expression(on)?,
        },
        TableExpression::CrossJoin { table } => TableExpression::CrossJoin {
            table: Box::new(rewriter.rewrite_table(*table)?),
        },
        TableExpression::CrossJoinLateral { table } => TableExpression::CrossJoinLateral {
            table: Box::new(rewriter.rewrite_table(*table)?),
        },
    })
}

pub fn fold_expression<R: ExpressionRewriter + ?Sized>(
    rewriter: &mut R,
    expr: SqlExpression,
) -> Result<SqlExpression> {
    Ok(match expr {
        leaf @ (SqlExpression::Column(_)
        | SqlExpression::Literal(_)
        | SqlExpression::Parameter { .. }
        | SqlExpression::Fragment(_)) => leaf,
        SqlExpression::Alias { alias, expr } => SqlExpression::Alias {
            alias,
            expr: fold_boxed(rewriter, expr)?,
        },
        SqlExpression::Binary { left, op, right } => SqlExpression::Binary {
            left: fold_boxed(rewriter, left)?,
            op,
            right: fold_boxed(rewriter, right)?,
        },
        SqlExpression::Unary { op, expr } => SqlExpression::Unary {
            op,
            expr: fold_boxed(rewriter, expr)?,
        },
        SqlExpression::IsNull { expr, negated } => SqlExpression::IsNull {
            expr: fold_boxed(rewriter, expr)?,
            negated,
        },
        SqlExpression::Like { expr, pattern } => SqlExpression::Like {
            expr: fold_boxed(rewriter, expr)?,
            pattern: fold_boxed(rewriter, pattern)?,
        },
        SqlExpression::InList {
            expr,
            values,
            negated,
        } => SqlExpression::InList {
            expr: fold_boxed(rewriter, expr)?,
            values: values
                .into_iter()
                .map(|v| rewriter.rewrite_expression(v))
                .collect::<Result<Vec<_>>>()?,
            negated,
        },
        SqlExpression::InSubquery {
            expr,
            subquery,
            negated,
        } => SqlExpression::InSubquery {
            expr: fold_boxed(rewriter, expr)?,
            subquery: Box::new(rewriter.rewrite_select(*subquery)?),
            negated,
        },
        SqlExpression::Case {
            operand,
            when_then,
            else_result,
        } => SqlExpression::Case {
            operand: operand.map(|o| fold_boxed(rewriter, o)).transpose()?,
            when_then: when_then
                .into_iter()
                .map(|(w, t)| Ok((rewriter.rewrite_expression(w)?, rewriter.rewrite_expression(t)?)))
                .collect::<Result<Vec<_>>>()?,
            else_result: else_result.map(|e| fold_boxed(rewriter, e)).transpose()?,
        },
        SqlExpression::Cast { expr, store_type } => SqlExpression::Cast {
            expr: fold_boxed(rewriter, expr)?,
            store_type,
        },
        SqlExpression::Convert { expr, ty } => SqlExpression::Convert {
            expr: fold_boxed(rewriter, expr)?,
            ty,
        },
        SqlExpression::Function(call) => SqlExpression::Function(SqlFunctionCall {
            args: call
                .args
                .into_iter()
                .map(|a| rewriter.rewrite_expression(a))
                .collect::<Result<Vec<_>>>()?,
            ..call
        }),
        SqlExpression::RowNumber(row_number) => SqlExpression::RowNumber(RowNumberExpression {
            orderings: fold_orderings(rewriter, row_number.orderings)?,
        }),
        SqlExpression::Exists(exists) => SqlExpression::Exists(ExistsExpression {
            subquery: Box::new(rewriter.rewrite_select(*exists.subquery)?),
        }),
        SqlExpression::Scalar(subquery) => {
            SqlExpression::Scalar(Box::new(rewriter.rewrite_select(*subquery)?))
        }
    })
}
