/// Drops ORDER BY from EXISTS subqueries that have no LIMIT or OFFSET.
///
/// Ordering cannot change whether a row exists, and several dialects reject
/// `ORDER BY` in a subquery without a paging clause.
use super::RewritePass;
use crate::error::Result;
use crate::ir::visitor::{fold_expression, ExpressionRewriter};
use crate::ir::{SelectExpression, SqlExpression};

pub struct ExistsOrderingCleanup;

impl RewritePass for ExistsOrderingCleanup {
    fn name(&self) -> &str {
        "exists_ordering_cleanup"
    }

    fn description(&self) -> &str {
        "Remove ordering from unpaged EXISTS subqueries"
    }

    fn transform(&self, select: SelectExpression) -> Result<SelectExpression> {
        ExistsOrderingStripper.rewrite_select(select)
    }
}

pub(crate) fn strip_unpaged_ordering(select: &mut SelectExpression) {
    if !select.has_paging() {
        select.order_by.clear();
    }
}

struct ExistsOrderingStripper;

impl ExpressionRewriter for ExistsOrderingStripper {
    fn rewrite_expression(&mut self, expr: SqlExpression) -> Result<SqlExpression> {
        match fold_expression(self, expr)? {
            SqlExpression::Exists(mut exists) => {
                strip_unpaged_ordering(&mut exists.subquery);
                Ok(SqlExpression::Exists(exists))
            }
            other => Ok(other),
        }
    }
}
