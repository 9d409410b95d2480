//! Eager malformed-IR detection.
//!
//! Runs once at the compiler entry so that rewrite passes and generators
//! can assume a well-formed tree. Errors carry a slash-separated location
//! such as `select/from[1]/subquery/predicate`.
//!
//! Column scope: a select sees every table of its own FROM plus the scopes
//! enclosing it. A derived table in FROM sees the enclosing scopes of its
//! parent but not its siblings; a lateral subquery additionally sees the
//! tables to its left.

use std::collections::HashSet;

use super::types::*;
use crate::error::IrError;

pub fn validate_select(select: &SelectExpression) -> Result<(), IrError> {
    Validator { scopes: Vec::new() }.select(select, "select")
}

struct Validator {
    scopes: Vec<Vec<String>>,
}

impl Validator {
    fn select(&mut self, select: &SelectExpression, location: &str) -> Result<(), IrError> {
        let mut frame: Vec<String> = Vec::new();
        for (i, entry) in select.from.iter().enumerate() {
            let location = format!("{location}/from[{i}]");
            if i == 0 && entry.is_join() {
                return Err(IrError::JoinAsSource { location });
            }
            if i > 0 && !entry.is_join() {
                return Err(IrError::UnjoinedSource { location });
            }
            self.table(entry, &location, &frame)?;
            frame.push(entry.alias().to_string());
        }

        self.scopes.push(frame);
        let result = self.body(select, location);
        self.scopes.pop();
        result
    }

    fn body(&mut self, select: &SelectExpression, location: &str) -> Result<(), IrError> {
        let mut names = HashSet::new();
        for (i, item) in select.projection.iter().enumerate() {
            let location = format!("{location}/projection[{i}]");
            match item {
                SelectItem::Wildcard { table, .. } => {
                    let in_frame = self
                        .scopes
                        .last()
                        .is_some_and(|frame| frame.iter().any(|a| a == table));
                    if !in_frame {
                        return Err(IrError::UnresolvedColumn {
                            table: table.clone(),
                            column: "*".into(),
                            location,
                        });
                    }
                }
                SelectItem::Expression { expr, .. } => match expr {
                    SqlExpression::RowNumber(row_number) => {
                        self.row_number(row_number, &location)?
                    }
                    SqlExpression::Alias { expr: inner, .. } => match inner.as_ref() {
                        SqlExpression::RowNumber(row_number) => {
                            self.row_number(row_number, &location)?
                        }
                        other => self.expression(other, &location)?,
                    },
                    other => self.expression(other, &location)?,
                },
            }
            if let Some(name) = item.output_name() {
                if !names.insert(name) {
                    return Err(IrError::DuplicateProjectionAlias {
                        alias: name.to_string(),
                        location,
                    });
                }
            }
        }

        if let Some(predicate) = &select.predicate {
            self.expression(predicate, &format!("{location}/predicate"))?;
        }
        for (i, expr) in select.group_by.iter().enumerate() {
            self.expression(expr, &format!("{location}/group_by[{i}]"))?;
        }
        if let Some(having) = &select.having {
            self.expression(having, &format!("{location}/having"))?;
        }
        for (i, ordering) in select.order_by.iter().enumerate() {
            self.expression(&ordering.expression, &format!("{location}/order_by[{i}]"))?;
        }
        if let Some(offset) = &select.offset {
            self.expression(offset, &format!("{location}/offset"))?;
        }
        if let Some(limit) = &select.limit {
            self.expression(limit, &format!("{location}/limit"))?;
        }
        Ok(())
    }

    fn row_number(&mut self, row_number: &RowNumberExpression, location: &str) -> Result<(), IrError> {
        for (i, ordering) in row_number.orderings.iter().enumerate() {
            self.expression(&ordering.expression, &format!("{location}/over[{i}]"))?;
        }
        Ok(())
    }

    /// `left` holds the aliases introduced by earlier FROM entries of the
    /// same select.
    fn table(&mut self, table: &TableExpression, location: &str, left: &[String]) -> Result<(), IrError> {
        match table {
            TableExpression::Table { .. } => Ok(()),
            TableExpression::Subquery { query, .. } => {
                self.select(query, &format!("{location}/subquery"))
            }
            TableExpression::InnerJoin { table: inner, on }
            | TableExpression::LeftJoin { table: inner, on } => {
                self.join_target(inner, location)?;
                self.table(inner, location, left)?;
                let mut visible = left.to_vec();
                visible.push(inner.alias().to_string());
                self.scopes.push(visible);
                let result = self.expression(on, &format!("{location}/on"));
                self.scopes.pop();
                result
            }
            TableExpression::CrossJoin { table: inner } => {
                self.join_target(inner, location)?;
                self.table(inner, location, left)
            }
            TableExpression::CrossJoinLateral { table: inner } => match inner.as_ref() {
                TableExpression::Subquery { query, .. } => {
                    self.scopes.push(left.to_vec());
                    let result = self.select(query, &format!("{location}/lateral"));
                    self.scopes.pop();
                    result
                }
                _ => Err(IrError::InvalidLateralJoin {
                    location: location.to_string(),
                }),
            },
        }
    }

    fn join_target(&self, inner: &TableExpression, location: &str) -> Result<(), IrError> {
        if inner.is_join() {
            return Err(IrError::JoinAsSource {
                location: format!("{location}/join"),
            });
        }
        Ok(())
    }

    fn resolves(&self, table: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .any(|frame| frame.iter().any(|alias| alias == table))
    }

    fn expression(&mut self, expr: &SqlExpression, location: &str) -> Result<(), IrError> {
        match expr {
            SqlExpression::Column(column) => {
                if self.resolves(&column.table) {
                    Ok(())
                } else {
                    Err(IrError::UnresolvedColumn {
                        table: column.table.clone(),
                        column: column.name.clone(),
                        location: location.to_string(),
                    })
                }
            }
            SqlExpression::Literal(_)
            | SqlExpression::Parameter { .. }
            | SqlExpression::Fragment(_) => Ok(()),
            SqlExpression::RowNumber(_) => Err(IrError::MisplacedRowNumber {
                location: location.to_string(),
            }),
            SqlExpression::Alias { expr, .. }
            | SqlExpression::Unary { expr, .. }
            | SqlExpression::IsNull { expr, .. }
            | SqlExpression::Cast { expr, .. }
            | SqlExpression::Convert { expr, .. } => self.expression(expr, location),
            SqlExpression::Binary { left, right, .. } => {
                self.expression(left, location)?;
                self.expression(right, location)
            }
            SqlExpression::Like { expr, pattern } => {
                self.expression(expr, location)?;
                self.expression(pattern, location)
            }
            SqlExpression::InList { expr, values, .. } => {
                self.expression(expr, location)?;
                values.iter().try_for_each(|v| self.expression(v, location))
            }
            SqlExpression::InSubquery { expr, subquery, .. } => {
                self.expression(expr, location)?;
                self.select(subquery, &format!("{location}/in"))
            }
            SqlExpression::Case {
                operand,
                when_then,
                else_result,
            } => {
                if let Some(operand) = operand {
                    self.expression(operand, location)?;
                }
                for (when, then) in when_then {
                    self.expression(when, location)?;
                    self.expression(then, location)?;
                }
                if let Some(else_result) = else_result {
                    self.expression(else_result, location)?;
                }
                Ok(())
            }
            SqlExpression::Function(call) => call
                .args
                .iter()
                .try_for_each(|arg| self.expression(arg, location)),
            SqlExpression::Exists(exists) => {
                self.select(&exists.subquery, &format!("{location}/exists"))
            }
            SqlExpression::Scalar(subquery) => {
                self.select(subquery, &format!("{location}/scalar"))
            }
        }
    }
}
