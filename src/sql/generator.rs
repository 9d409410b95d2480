/// Base SQL generator.
///
/// `QuerySqlGenerator` is the dialect seam. Each hook defaults to a `walk_*`
/// free function that implements the SQL-92-ish core; a dialect overrides
/// only the hooks whose output differs and can still call the `walk_*`
/// function for the cases it does not special-case.
///
/// Emission layout: one clause per line, nested selects indented inside
/// their parentheses.
use serde::{Deserialize, Serialize};

use super::builder::{CommandBuilder, GeneratedSql, ParameterValues};
use crate::error::{CompileError, Result};
use crate::ir::*;

/// How a dialect spells row limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagingSyntax {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    OffsetFetch,
    /// `TOP(n)` for a bare limit, `OFFSET ... FETCH` otherwise.
    TopOffsetFetch,
    /// No native paging; limits and offsets must be rewritten away.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectCapabilities {
    pub paging: PagingSyntax,
    pub window_functions: bool,
    pub lateral_joins: bool,
}

impl DialectCapabilities {
    pub fn has_native_paging(&self) -> bool {
        self.paging != PagingSyntax::None
    }

    /// OFFSET is only legal after an ORDER BY.
    pub fn offset_requires_ordering(&self) -> bool {
        matches!(
            self.paging,
            PagingSyntax::OffsetFetch | PagingSyntax::TopOffsetFetch
        )
    }
}

pub trait QuerySqlGenerator: Send + Sync {
    /// Dialect name used in diagnostics.
    fn name(&self) -> &str;

    fn capabilities(&self) -> &DialectCapabilities;

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Placeholder text for a parameter. `ordinal` is 1-based.
    fn placeholder(&self, _name: &str, _ordinal: usize) -> String {
        "?".to_string()
    }

    /// Whether a repeated parameter name reuses its first placeholder.
    /// Purely positional placeholders cannot.
    fn reuses_placeholders(&self) -> bool {
        false
    }

    fn format_literal(&self, literal: &Literal) -> String {
        format_literal(literal)
    }

    fn generate(&self, select: &SelectExpression, values: &ParameterValues) -> Result<GeneratedSql> {
        let mut builder = CommandBuilder::new();
        self.generate_select(&mut builder, select)?;
        Ok(builder.finish(values))
    }

    fn generate_select(&self, b: &mut CommandBuilder, select: &SelectExpression) -> Result<()> {
        walk_select(self, b, select)
    }

    /// Emitted between `SELECT [DISTINCT]` and the projection.
    fn generate_top(&self, b: &mut CommandBuilder, select: &SelectExpression) -> Result<()> {
        walk_top(self, b, select)
    }

    fn generate_table(&self, b: &mut CommandBuilder, table: &TableExpression) -> Result<()> {
        walk_table(self, b, table)
    }

    /// `table` is the right-hand side of a lateral join.
    fn generate_lateral_join(&self, b: &mut CommandBuilder, table: &TableExpression) -> Result<()> {
        walk_lateral_join(self, b, table)
    }

    fn generate_order_by(&self, b: &mut CommandBuilder, select: &SelectExpression) -> Result<()> {
        walk_order_by(self, b, select)
    }

    fn generate_limit_offset(
        &self,
        b: &mut CommandBuilder,
        select: &SelectExpression,
    ) -> Result<()> {
        walk_limit_offset(self, b, select)
    }

    fn generate_expression(&self, b: &mut CommandBuilder, expr: &SqlExpression) -> Result<()> {
        walk_expression(self, b, expr)
    }

    /// An expression in search-condition position: WHERE, HAVING, ON,
    /// operands of AND/OR/NOT and searched CASE conditions.
    fn generate_condition(&self, b: &mut CommandBuilder, expr: &SqlExpression) -> Result<()> {
        self.generate_expression(b, expr)
    }

    fn generate_binary(
        &self,
        b: &mut CommandBuilder,
        left: &SqlExpression,
        op: BinaryOperator,
        right: &SqlExpression,
    ) -> Result<()> {
        walk_binary(self, b, left, op, right)
    }

    fn generate_function(&self, b: &mut CommandBuilder, call: &SqlFunctionCall) -> Result<()> {
        walk_function(self, b, call)
    }

    fn generate_row_number(
        &self,
        b: &mut CommandBuilder,
        row_number: &RowNumberExpression,
    ) -> Result<()> {
        walk_row_number(self, b, row_number)
    }
}

pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn format_literal(literal: &Literal) -> String {
    match literal {
        Literal::Null => "NULL".to_string(),
        Literal::Boolean(true) => "TRUE".to_string(),
        Literal::Boolean(false) => "FALSE".to_string(),
        Literal::Integer(v) => v.to_string(),
        Literal::Float(v) => format!("{v:?}"),
        Literal::String(s) => quote_string(s),
        Literal::DateTime(dt) => format!("TIMESTAMP '{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
    }
}

pub fn binary_operator(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Eq => "=",
        BinaryOperator::NotEq => "<>",
        BinaryOperator::Lt => "<",
        BinaryOperator::LtEq => "<=",
        BinaryOperator::Gt => ">",
        BinaryOperator::GtEq => ">=",
        BinaryOperator::And => "AND",
        BinaryOperator::Or => "OR",
        BinaryOperator::Plus => "+",
        BinaryOperator::Minus => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::Modulo => "%",
    }
}

pub fn walk_select<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    select: &SelectExpression,
) -> Result<()> {
    b.append("SELECT ");
    if select.distinct {
        b.append("DISTINCT ");
    }
    g.generate_top(b, select)?;

    if select.projection.is_empty() {
        b.append("1");
    } else {
        for (i, item) in select.projection.iter().enumerate() {
            if i > 0 {
                b.append(", ");
            }
            b.enter(format!("projection[{i}]"));
            walk_select_item(g, b, item)?;
            b.leave();
        }
    }

    for (i, table) in select.from.iter().enumerate() {
        b.append_line("");
        if i == 0 {
            b.append("FROM ");
        }
        b.enter(format!("from[{i}]"));
        g.generate_table(b, table)?;
        b.leave();
    }

    if let Some(predicate) = &select.predicate {
        b.append_line("").append("WHERE ");
        b.enter("predicate");
        g.generate_condition(b, predicate)?;
        b.leave();
    }

    if !select.group_by.is_empty() {
        b.append_line("").append("GROUP BY ");
        for (i, expr) in select.group_by.iter().enumerate() {
            if i > 0 {
                b.append(", ");
            }
            g.generate_expression(b, expr)?;
        }
    }

    if let Some(having) = &select.having {
        b.append_line("").append("HAVING ");
        g.generate_condition(b, having)?;
    }

    g.generate_order_by(b, select)?;
    g.generate_limit_offset(b, select)
}

fn walk_select_item<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    item: &SelectItem,
) -> Result<()> {
    let (expr, alias) = match item {
        SelectItem::Wildcard { table, .. } => {
            b.append(&g.quote_identifier(table)).append(".*");
            return Ok(());
        }
        SelectItem::Expression { expr, alias } => match (expr, alias) {
            (SqlExpression::Alias { alias: inner, expr }, None) => (expr.as_ref(), Some(inner)),
            (SqlExpression::Alias { expr, .. }, Some(alias)) => (expr.as_ref(), Some(alias)),
            (expr, alias) => (expr, alias.as_ref()),
        },
    };

    g.generate_expression(b, expr)?;
    if let Some(alias) = alias {
        let same_name = matches!(expr, SqlExpression::Column(c) if &c.name == alias);
        if !same_name {
            b.append(" AS ").append(&g.quote_identifier(alias));
        }
    }
    Ok(())
}

pub fn walk_top<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    select: &SelectExpression,
) -> Result<()> {
    if g.capabilities().paging != PagingSyntax::TopOffsetFetch || select.offset.is_some() {
        return Ok(());
    }
    if let Some(limit) = &select.limit {
        b.append("TOP(");
        g.generate_expression(b, limit)?;
        b.append(") ");
    }
    Ok(())
}

fn walk_nested_select<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    select: &SelectExpression,
    segment: &str,
) -> Result<()> {
    b.append_line("(");
    b.indent();
    b.enter(segment);
    g.generate_select(b, select)?;
    b.leave();
    b.dedent();
    Ok(())
}

pub fn walk_table<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    table: &TableExpression,
) -> Result<()> {
    match table {
        TableExpression::Table {
            schema,
            name,
            alias,
        } => {
            if let Some(schema) = schema {
                b.append(&g.quote_identifier(schema)).append(".");
            }
            b.append(&g.quote_identifier(name))
                .append(" AS ")
                .append(&g.quote_identifier(alias));
        }
        TableExpression::Subquery { query, alias } => {
            walk_nested_select(g, b, query, "subquery")?;
            b.append_line("")
                .append(") AS ")
                .append(&g.quote_identifier(alias));
        }
        TableExpression::InnerJoin { table, on } => {
            b.append("INNER JOIN ");
            g.generate_table(b, table)?;
            b.append(" ON ");
            g.generate_condition(b, on)?;
        }
        TableExpression::LeftJoin { table, on } => {
            b.append("LEFT JOIN ");
            g.generate_table(b, table)?;
            b.append(" ON ");
            g.generate_condition(b, on)?;
        }
        TableExpression::CrossJoin { table } => {
            b.append("CROSS JOIN ");
            g.generate_table(b, table)?;
        }
        TableExpression::CrossJoinLateral { table } => {
            g.generate_lateral_join(b, table)?;
        }
    }
    Ok(())
}

pub fn walk_lateral_join<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    table: &TableExpression,
) -> Result<()> {
    if !g.capabilities().lateral_joins {
        return Err(CompileError::UnsupportedExpression {
            kind: "CrossJoinLateral",
            location: b.location(),
        });
    }
    b.append("CROSS JOIN LATERAL ");
    g.generate_table(b, table)
}

fn walk_ordering<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    ordering: &Ordering,
) -> Result<()> {
    match &ordering.expression {
        SqlExpression::Alias { alias, .. } => {
            b.append(&g.quote_identifier(alias));
        }
        expr => g.generate_expression(b, expr)?,
    }
    if ordering.direction == OrderingDirection::Desc {
        b.append(" DESC");
    }
    Ok(())
}

pub fn walk_order_by<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    select: &SelectExpression,
) -> Result<()> {
    // Constant orderings only matter as a tie-breaker for paging.
    let paged = select.has_paging();
    let orderings: Vec<&Ordering> = select
        .order_by
        .iter()
        .filter(|o| paged || !o.expression.is_constant())
        .collect();

    if orderings.is_empty() {
        if select.offset.is_some() && g.capabilities().offset_requires_ordering() {
            b.append_line("").append("ORDER BY (SELECT 1)");
        }
        return Ok(());
    }

    b.append_line("").append("ORDER BY ");
    for (i, ordering) in orderings.into_iter().enumerate() {
        if i > 0 {
            b.append(", ");
        }
        walk_ordering(g, b, ordering)?;
    }
    Ok(())
}

pub fn walk_limit_offset<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    select: &SelectExpression,
) -> Result<()> {
    let (limit, offset) = (select.limit.as_ref(), select.offset.as_ref());
    if limit.is_none() && offset.is_none() {
        return Ok(());
    }

    match g.capabilities().paging {
        PagingSyntax::LimitOffset => {
            b.append_line("");
            if let Some(limit) = limit {
                b.append("LIMIT ");
                g.generate_expression(b, limit)?;
                if offset.is_some() {
                    b.append(" ");
                }
            }
            if let Some(offset) = offset {
                b.append("OFFSET ");
                g.generate_expression(b, offset)?;
            }
        }
        PagingSyntax::OffsetFetch => {
            b.append_line("");
            match (limit, offset) {
                (Some(limit), None) => {
                    b.append("FETCH FIRST ");
                    g.generate_expression(b, limit)?;
                    b.append(" ROWS ONLY");
                }
                (limit, Some(offset)) => walk_offset_fetch(g, b, offset, limit)?,
                (None, None) => {}
            }
        }
        PagingSyntax::TopOffsetFetch => {
            if let Some(offset) = offset {
                b.append_line("");
                walk_offset_fetch(g, b, offset, limit)?;
            }
        }
        PagingSyntax::None => {
            return Err(CompileError::DialectCapabilityMismatch {
                dialect: g.name().to_string(),
                feature: "native paging",
            });
        }
    }
    Ok(())
}

fn walk_offset_fetch<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    offset: &SqlExpression,
    limit: Option<&SqlExpression>,
) -> Result<()> {
    b.append("OFFSET ");
    g.generate_expression(b, offset)?;
    b.append(" ROWS");
    if let Some(limit) = limit {
        b.append(" FETCH NEXT ");
        g.generate_expression(b, limit)?;
        b.append(" ROWS ONLY");
    }
    Ok(())
}

/// `Convert` and `Alias` emit only their operand, so precedence is decided
/// by what they wrap.
fn is_binary(expr: &SqlExpression) -> bool {
    match expr {
        SqlExpression::Binary { .. } => true,
        SqlExpression::Convert { expr, .. } | SqlExpression::Alias { expr, .. } => is_binary(expr),
        _ => false,
    }
}

/// Emit an operand, parenthesized when it is itself a binary expression.
fn walk_operand<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    expr: &SqlExpression,
) -> Result<()> {
    if is_binary(expr) {
        b.append("(");
        g.generate_expression(b, expr)?;
        b.append(")");
        Ok(())
    } else {
        g.generate_expression(b, expr)
    }
}

fn walk_condition_operand<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    expr: &SqlExpression,
) -> Result<()> {
    if is_binary(expr) {
        walk_operand(g, b, expr)
    } else {
        g.generate_condition(b, expr)
    }
}

pub fn walk_binary<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    left: &SqlExpression,
    op: BinaryOperator,
    right: &SqlExpression,
) -> Result<()> {
    if matches!(op, BinaryOperator::And | BinaryOperator::Or) {
        walk_condition_operand(g, b, left)?;
        b.append(" ").append(binary_operator(op)).append(" ");
        return walk_condition_operand(g, b, right);
    }
    walk_operand(g, b, left)?;
    b.append(" ").append(binary_operator(op)).append(" ");
    walk_operand(g, b, right)
}

pub fn walk_function<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    call: &SqlFunctionCall,
) -> Result<()> {
    if let Some(schema) = &call.schema {
        b.append(&g.quote_identifier(schema)).append(".");
    }
    b.append(&call.name);
    if call.niladic {
        return Ok(());
    }
    b.append("(");
    for (i, arg) in call.args.iter().enumerate() {
        if i > 0 {
            b.append(", ");
        }
        g.generate_expression(b, arg)?;
    }
    b.append(")");
    Ok(())
}

pub fn walk_row_number<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    row_number: &RowNumberExpression,
) -> Result<()> {
    if !g.capabilities().window_functions {
        return Err(CompileError::DialectCapabilityMismatch {
            dialect: g.name().to_string(),
            feature: "window functions",
        });
    }
    b.append("ROW_NUMBER() OVER(ORDER BY ");
    for (i, ordering) in row_number.orderings.iter().enumerate() {
        if i > 0 {
            b.append(", ");
        }
        // Aliases are not in scope inside OVER(), so emit the aliased expression.
        g.generate_expression(b, &ordering.expression)?;
        if ordering.direction == OrderingDirection::Desc {
            b.append(" DESC");
        }
    }
    b.append(")");
    Ok(())
}

fn walk_exists<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    subquery: &SelectExpression,
    negated: bool,
) -> Result<()> {
    if negated {
        b.append("NOT ");
    }
    b.append("EXISTS ");
    walk_nested_select(g, b, subquery, "exists")?;
    b.append(")");
    Ok(())
}

pub fn walk_expression<G: QuerySqlGenerator + ?Sized>(
    g: &G,
    b: &mut CommandBuilder,
    expr: &SqlExpression,
) -> Result<()> {
    match expr {
        SqlExpression::Column(column) => {
            b.append(&g.quote_identifier(&column.table))
                .append(".")
                .append(&g.quote_identifier(&column.name));
        }
        SqlExpression::Literal(literal) => {
            b.append(&g.format_literal(literal));
        }
        SqlExpression::Parameter { name, ty } => {
            let text =
                b.register_parameter(name, *ty, g.reuses_placeholders(), |n| g.placeholder(name, n));
            b.append(&text);
        }
        SqlExpression::Fragment(sql) => {
            b.append(sql);
        }
        SqlExpression::Alias { expr, .. } | SqlExpression::Convert { expr, .. } => {
            g.generate_expression(b, expr)?;
        }
        SqlExpression::Binary { left, op, right } => {
            g.generate_binary(b, left, *op, right)?;
        }
        SqlExpression::Unary { op, expr } => match (op, expr.as_ref()) {
            (UnaryOperator::Not, SqlExpression::Exists(exists)) => {
                walk_exists(g, b, &exists.subquery, true)?;
            }
            (UnaryOperator::Not, inner) => {
                let bare = matches!(
                    inner,
                    SqlExpression::Column(_)
                        | SqlExpression::Parameter { .. }
                        | SqlExpression::Literal(_)
                        | SqlExpression::Function(_)
                );
                if bare {
                    b.append("NOT ");
                    g.generate_condition(b, inner)?;
                } else {
                    b.append("NOT (");
                    g.generate_expression(b, inner)?;
                    b.append(")");
                }
            }
            (UnaryOperator::Negate, inner) => {
                b.append("-");
                walk_operand(g, b, inner)?;
            }
        },
        SqlExpression::IsNull { expr, negated } => {
            walk_operand(g, b, expr)?;
            b.append(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        SqlExpression::Like { expr, pattern } => {
            walk_operand(g, b, expr)?;
            b.append(" LIKE ");
            walk_operand(g, b, pattern)?;
        }
        SqlExpression::InList {
            expr,
            values,
            negated,
        } => {
            walk_operand(g, b, expr)?;
            b.append(if *negated { " NOT IN (" } else { " IN (" });
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    b.append(", ");
                }
                g.generate_expression(b, value)?;
            }
            b.append(")");
        }
        SqlExpression::InSubquery {
            expr,
            subquery,
            negated,
        } => {
            walk_operand(g, b, expr)?;
            b.append(if *negated { " NOT IN " } else { " IN " });
            walk_nested_select(g, b, subquery, "in")?;
            b.append(")");
        }
        SqlExpression::Case {
            operand,
            when_then,
            else_result,
        } => {
            b.append("CASE");
            if let Some(operand) = operand {
                b.append(" ");
                g.generate_expression(b, operand)?;
            }
            for (when, then) in when_then {
                b.append(" WHEN ");
                if operand.is_some() {
                    g.generate_expression(b, when)?;
                } else {
                    g.generate_condition(b, when)?;
                }
                b.append(" THEN ");
                g.generate_expression(b, then)?;
            }
            if let Some(else_result) = else_result {
                b.append(" ELSE ");
                g.generate_expression(b, else_result)?;
            }
            b.append(" END");
        }
        SqlExpression::Cast { expr, store_type } => {
            b.append("CAST(");
            g.generate_expression(b, expr)?;
            b.append(" AS ").append(store_type).append(")");
        }
        SqlExpression::Function(call) => g.generate_function(b, call)?,
        SqlExpression::RowNumber(row_number) => g.generate_row_number(b, row_number)?,
        SqlExpression::Exists(exists) => walk_exists(g, b, &exists.subquery, false)?,
        SqlExpression::Scalar(subquery) => {
            walk_nested_select(g, b, subquery, "scalar")?;
            b.append(")");
        }
    }
    Ok(())
}
