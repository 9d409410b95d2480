//! OFFSET/LIMIT emulation with a synthesized `ROW_NUMBER()` column.
//!
//! A paged select is pushed down into a derived table that also projects
//! `ROW_NUMBER() OVER(ORDER BY <original ordering>)`. The new outer shell
//! keeps the original output columns and filters on the row number:
//!
//! ```text
//! SELECT t.Name                         SELECT t.Name
//! FROM T AS t            ==>            FROM (
//! ORDER BY t.Name                           SELECT t.Name, ROW_NUMBER() OVER(ORDER BY t.Name) AS __RowNumber__
//! OFFSET 5                                  FROM T AS t
//!                                       ) AS t0
//!                                       WHERE t0.__RowNumber__ > 5
//! ```
//!
//! Selects are rewritten children first. Row-number aliases come from one
//! counter per statement (`__RowNumber__`, `__RowNumber__1`, ...) and
//! derived-table aliases avoid every alias already used in the statement.
//!
//! A select without ordering ranks by `(SELECT 1)`. Page boundaries are
//! then not stable across executions, same as an unordered native OFFSET.

use std::collections::HashSet;

use tracing::debug;

use super::exists_ordering::strip_unpaged_ordering;
use super::RewritePass;
use crate::error::{IrError, Result};
use crate::ir::builders::{asc, column, fragment, gt, lt_eq, plus, subquery};
use crate::ir::visitor::{
    fold_expression, fold_select, fold_table, walk_table, ExpressionRewriter, ExpressionVisitor,
};
use crate::ir::*;

const ROW_NUMBER_ALIAS: &str = "__RowNumber__";
const SUBQUERY_ALIAS: &str = "t";
const UNNAMED_COLUMN: &str = "c";
const PLACEHOLDER_ORDERING: &str = "(SELECT 1)";

pub struct RowNumberPagingPass {
    rewrite_limits: bool,
}

impl RowNumberPagingPass {
    /// Rewrites selects with an OFFSET. A bare LIMIT is left to the
    /// dialect's native syntax.
    pub fn new() -> Self {
        Self {
            rewrite_limits: false,
        }
    }

    /// Rewrites every OFFSET and LIMIT, for targets with no paging syntax.
    pub fn without_native_paging() -> Self {
        Self {
            rewrite_limits: true,
        }
    }
}

impl Default for RowNumberPagingPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RewritePass for RowNumberPagingPass {
    fn name(&self) -> &str {
        "row_number_paging"
    }

    fn description(&self) -> &str {
        "Emulate OFFSET/LIMIT with a ROW_NUMBER() column"
    }

    fn transform(&self, select: SelectExpression) -> Result<SelectExpression> {
        let mut collector = TableAliasCollector::default();
        collector.visit_select(&select)?;

        let mut rewriter = PagingRewriter {
            rewrite_limits: self.rewrite_limits,
            table_aliases: collector.aliases,
            row_numbers: 0,
            path: vec!["select"],
        };
        rewriter.rewrite_select(select)
    }
}

#[derive(Default)]
struct TableAliasCollector {
    aliases: HashSet<String>,
}

impl ExpressionVisitor for TableAliasCollector {
    fn visit_table(&mut self, table: &TableExpression) -> Result<()> {
        if let TableExpression::Table { alias, .. } | TableExpression::Subquery { alias, .. } = table {
            self.aliases.insert(alias.clone());
        }
        walk_table(self, table)
    }
}

struct PagingRewriter {
    rewrite_limits: bool,
    table_aliases: HashSet<String>,
    row_numbers: usize,
    path: Vec<&'static str>,
}

impl ExpressionRewriter for PagingRewriter {
    fn rewrite_select(&mut self, select: SelectExpression) -> Result<SelectExpression> {
        let is_root = self.path.len() == 1;
        let select = fold_select(self, select)?;
        self.rewrite_paging(select, is_root)
    }

    fn rewrite_table(&mut self, table: TableExpression) -> Result<TableExpression> {
        let segment = match &table {
            TableExpression::Subquery { .. } => Some("subquery"),
            TableExpression::CrossJoinLateral { .. } => Some("lateral"),
            _ => None,
        };
        if let Some(segment) = segment {
            self.path.push(segment);
        }
        let result = fold_table(self, table);
        if segment.is_some() {
            self.path.pop();
        }
        result
    }

    fn rewrite_expression(&mut self, expr: SqlExpression) -> Result<SqlExpression> {
        let segment = match &expr {
            SqlExpression::Exists(_) => Some("exists"),
            SqlExpression::InSubquery { .. } => Some("in"),
            SqlExpression::Scalar(_) => Some("scalar"),
            _ => None,
        };
        if let Some(segment) = segment {
            self.path.push(segment);
        }
        let result = fold_expression(self, expr);
        if segment.is_some() {
            self.path.pop();
        }

        match result? {
            SqlExpression::Exists(mut exists) => {
                strip_unpaged_ordering(&mut exists.subquery);
                Ok(SqlExpression::Exists(exists))
            }
            other => Ok(other),
        }
    }
}

impl PagingRewriter {
    fn location(&self) -> String {
        self.path.join("/")
    }

    fn needs_rewrite(&self, select: &SelectExpression) -> bool {
        let paged = select.offset.is_some() || (self.rewrite_limits && select.limit.is_some());
        paged && !select.projection.iter().any(SelectItem::is_row_number)
    }

    fn fresh_table_alias(&mut self) -> String {
        let mut candidate = SUBQUERY_ALIAS.to_string();
        let mut n = 0;
        while self.table_aliases.contains(&candidate) {
            candidate = format!("{SUBQUERY_ALIAS}{n}");
            n += 1;
        }
        self.table_aliases.insert(candidate.clone());
        candidate
    }

    fn fresh_row_number_alias(&mut self, taken: &HashSet<String>) -> String {
        loop {
            let candidate = match self.row_numbers {
                0 => ROW_NUMBER_ALIAS.to_string(),
                n => format!("{ROW_NUMBER_ALIAS}{n}"),
            };
            self.row_numbers += 1;
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn rewrite_paging(&mut self, mut select: SelectExpression, is_root: bool) -> Result<SelectExpression> {
        if !self.needs_rewrite(&select) {
            return Ok(select);
        }

        let location = self.location();
        let offset = select.offset.take();
        let limit = select.limit.take();

        // Rank distinct rows, not the rows feeding DISTINCT.
        if select.distinct {
            select = self.push_down_distinct(select, &location)?;
        }

        let alias = self.fresh_table_alias();
        let split = SplitProjection::build(select.projection, &alias, &location)?;

        // Constants do not rank rows and are rejected inside OVER().
        let mut orderings: Vec<Ordering> = select
            .order_by
            .into_iter()
            .map(|o| Ordering {
                expression: unwrap_alias(o.expression),
                direction: o.direction,
            })
            .filter(|o| !o.expression.is_constant())
            .collect();
        let explicitly_ordered = !orderings.is_empty();
        if orderings.is_empty() {
            orderings.push(asc(fragment(PLACEHOLDER_ORDERING)));
        }

        let row_number_alias = self.fresh_row_number_alias(&split.names);
        let mut inner = SelectExpression {
            distinct: false,
            projection: split.inner,
            from: select.from,
            predicate: select.predicate,
            group_by: select.group_by,
            having: select.having,
            order_by: Vec::new(),
            offset: None,
            limit: None,
        };
        inner.add_to_projection(SelectItem::Expression {
            expr: SqlExpression::RowNumber(RowNumberExpression { orderings }),
            alias: Some(row_number_alias.clone()),
        })?;

        let row_number = column(alias.clone(), row_number_alias.clone());
        let mut outer = SelectExpression {
            projection: split.outer,
            from: vec![subquery(inner, alias.clone())],
            ..Default::default()
        };
        if let Some(offset) = &offset {
            outer.add_to_predicate(gt(row_number.clone(), as_row_number_type(offset.clone())));
        }
        if let Some(limit) = limit {
            outer.add_to_predicate(lt_eq(row_number.clone(), upper_bound(offset, limit)));
        }
        if is_root && explicitly_ordered {
            outer.order_by.push(asc(row_number));
        }

        debug!(
            location = %location,
            subquery = %alias,
            row_number = %row_number_alias,
            "emulated paging with ROW_NUMBER()"
        );
        Ok(outer)
    }

    /// Wrap a DISTINCT select so that paging applies to its distinct rows.
    /// Orderings are remapped onto the derived table's columns.
    fn push_down_distinct(
        &mut self,
        select: SelectExpression,
        location: &str,
    ) -> Result<SelectExpression> {
        let alias = self.fresh_table_alias();
        let split = SplitProjection::build(select.projection, &alias, location)?;

        let mut order_by = Vec::with_capacity(select.order_by.len());
        for (i, ordering) in select.order_by.into_iter().enumerate() {
            let expression = unwrap_alias(ordering.expression);
            let expression = if expression.is_constant() {
                expression
            } else {
                let name = split
                    .mapping
                    .iter()
                    .find(|(projected, _)| *projected == expression)
                    .map(|(_, name)| name.clone())
                    .ok_or_else(|| IrError::DistinctOrderingNotProjected {
                        location: format!("{location}/order_by[{i}]"),
                    })?;
                column(alias.clone(), name)
            };
            order_by.push(Ordering {
                expression,
                direction: ordering.direction,
            });
        }

        let inner = SelectExpression {
            distinct: true,
            projection: split.inner,
            from: select.from,
            predicate: select.predicate,
            group_by: select.group_by,
            having: select.having,
            ..Default::default()
        };
        Ok(SelectExpression {
            projection: split.outer,
            from: vec![subquery(inner, alias)],
            order_by,
            ..Default::default()
        })
    }
}

fn unwrap_alias(expr: SqlExpression) -> SqlExpression {
    match expr {
        SqlExpression::Alias { expr, .. } => unwrap_alias(*expr),
        other => other,
    }
}

fn as_row_number_type(expr: SqlExpression) -> SqlExpression {
    if expr.sql_type() == SqlType::Int64 {
        expr
    } else {
        SqlExpression::Convert {
            expr: Box::new(expr),
            ty: SqlType::Int64,
        }
    }
}

/// `offset + limit`, folded when both are integer literals.
fn upper_bound(offset: Option<SqlExpression>, limit: SqlExpression) -> SqlExpression {
    let Some(offset) = offset else {
        return as_row_number_type(limit);
    };
    if let (
        SqlExpression::Literal(Literal::Integer(o)),
        SqlExpression::Literal(Literal::Integer(l)),
    ) = (&offset, &limit)
    {
        if let Some(sum) = o.checked_add(*l) {
            return SqlExpression::Literal(Literal::Integer(sum));
        }
    }
    plus(as_row_number_type(offset), as_row_number_type(limit))
}

/// A projection split across a pushed-down select and its outer shell.
#[derive(Default)]
struct SplitProjection {
    inner: Vec<SelectItem>,
    outer: Vec<SelectItem>,
    /// Inner expression and the unique name it is projected under.
    mapping: Vec<(SqlExpression, String)>,
    names: HashSet<String>,
}

impl SplitProjection {
    fn build(
        projection: Vec<SelectItem>,
        subquery_alias: &str,
        location: &str,
    ) -> Result<Self, IrError> {
        let mut split = Self::default();
        for (i, item) in projection.into_iter().enumerate() {
            match item {
                SelectItem::Wildcard { table, columns } => {
                    if columns.is_empty() {
                        return Err(IrError::UnexpandableWildcard {
                            table,
                            location: format!("{location}/projection[{i}]"),
                        });
                    }
                    for name in columns {
                        let expr = column(table.clone(), name.clone());
                        split.push(expr, Some(name), false, subquery_alias);
                    }
                }
                SelectItem::Expression { expr, alias: item_alias } => {
                    let name = match (item_alias, &expr) {
                        (Some(a), _) => Some(a),
                        (None, SqlExpression::Column(c)) => Some(c.name.clone()),
                        (None, SqlExpression::Alias { alias, .. }) => Some(alias.clone()),
                        (None, _) => None,
                    };
                    split.push(unwrap_alias(expr), name, true, subquery_alias);
                }
            }
        }
        Ok(split)
    }

    /// `restore_name` re-applies the original output name in the outer
    /// shell when the inner name had to be made unique.
    fn push(
        &mut self,
        expr: SqlExpression,
        name: Option<String>,
        restore_name: bool,
        subquery_alias: &str,
    ) {
        let unique = self.unique_name(name.as_deref().unwrap_or(UNNAMED_COLUMN));
        let inner_alias = match &expr {
            SqlExpression::Column(c) if c.name == unique => None,
            _ => Some(unique.clone()),
        };
        let outer_alias = name.filter(|n| restore_name && *n != unique);

        self.mapping.push((expr.clone(), unique.clone()));
        self.inner.push(SelectItem::Expression {
            expr,
            alias: inner_alias,
        });
        self.outer.push(SelectItem::Expression {
            expr: column(subquery_alias, unique),
            alias: outer_alias,
        });
    }

    fn unique_name(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 0;
        while self.names.contains(&candidate) {
            candidate = format!("{base}{n}");
            n += 1;
        }
        self.names.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builders::*;

    fn emulate(select: SelectExpression) -> SelectExpression {
        RowNumberPagingPass::without_native_paging()
            .transform(select)
            .unwrap()
    }

    fn from_subquery(select: &SelectExpression) -> (&SelectExpression, &str) {
        match &select.from[0] {
            TableExpression::Subquery { query, alias } => (query, alias),
            other => panic!("expected derived table, got {:?}", other),
        }
    }

    fn row_number_aliases(select: &SelectExpression, out: &mut Vec<String>) {
        struct Collector<'a>(&'a mut Vec<String>);
        impl ExpressionVisitor for Collector<'_> {
            fn visit_select(&mut self, select: &SelectExpression) -> Result<()> {
                for item in &select.projection {
                    if let SelectItem::Expression {
                        expr: SqlExpression::RowNumber(_),
                        alias: Some(alias),
                    } = item
                    {
                        self.0.push(alias.clone());
                    }
                }
                crate::ir::visitor::walk_select(self, select)
            }
        }
        Collector(out).visit_select(select).unwrap();
    }

    #[test]
    fn test_offset_only_rewrite() {
        let q = SelectExpression::from_table(table("T", "t"))
            .project(column("t", "Name"))
            .order_by(asc(column("t", "Name")))
            .with_offset(literal(5));

        let inner = SelectExpression::from_table(table("T", "t"))
            .project(column("t", "Name"))
            .project_as(row_number(vec![asc(column("t", "Name"))]), "__RowNumber__");
        let expected = SelectExpression::from_table(subquery(inner, "t0"))
            .project(column("t0", "Name"))
            .filter(gt(column("t0", "__RowNumber__"), literal(5)))
            .order_by(asc(column("t0", "__RowNumber__")));

        assert_eq!(emulate(q), expected);
    }

    #[test]
    fn test_offset_and_limit_fold_into_one_literal() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project(column("x", "Name"))
            .order_by(asc(column("x", "Name")))
            .with_offset(literal(5))
            .with_limit(literal(10));
        let out = emulate(q);
        assert_eq!(
            out.predicate,
            Some(and(
                gt(column("t", "__RowNumber__"), literal(5)),
                lt_eq(column("t", "__RowNumber__"), literal(15)),
            ))
        );
        assert!(out.offset.is_none() && out.limit.is_none());
    }

    #[test]
    fn test_parameter_bounds_are_coerced_and_added() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project(column("x", "Name"))
            .with_offset(param("skip", SqlType::Int32))
            .with_limit(param("take", SqlType::Int32));
        let out = emulate(q);
        let convert = |name: &str| SqlExpression::Convert {
            expr: Box::new(param(name, SqlType::Int32)),
            ty: SqlType::Int64,
        };
        assert_eq!(
            out.predicate,
            Some(and(
                gt(column("t", "__RowNumber__"), convert("skip")),
                lt_eq(
                    column("t", "__RowNumber__"),
                    plus(convert("skip"), convert("take"))
                ),
            ))
        );
    }

    #[test]
    fn test_limit_only_without_offset() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project(column("x", "Name"))
            .with_limit(literal(3));

        let untouched = RowNumberPagingPass::new().transform(q.clone()).unwrap();
        assert_eq!(untouched, q);

        let out = emulate(q);
        assert_eq!(
            out.predicate,
            Some(lt_eq(column("t", "__RowNumber__"), literal(3)))
        );
    }

    #[test]
    fn test_unordered_paging_uses_placeholder_order() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project(column("x", "Name"))
            .with_offset(literal(1));
        let out = emulate(q);
        let (inner, _) = from_subquery(&out);
        assert_eq!(
            inner.projection[1],
            SelectItem::Expression {
                expr: row_number(vec![asc(fragment("(SELECT 1)"))]),
                alias: Some("__RowNumber__".into()),
            }
        );
        // No explicit order to preserve.
        assert!(out.order_by.is_empty());
    }

    #[test]
    fn test_constant_orderings_fall_back_to_placeholder() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project(column("x", "Name"))
            .order_by(asc(literal(1)))
            .order_by(desc(param("dir", SqlType::Int32)))
            .with_offset(literal(1));
        let out = emulate(q);
        let (inner, _) = from_subquery(&out);
        assert_eq!(
            inner.projection[1],
            SelectItem::Expression {
                expr: row_number(vec![asc(fragment("(SELECT 1)"))]),
                alias: Some("__RowNumber__".into()),
            }
        );
        assert!(out.order_by.is_empty());
    }

    #[test]
    fn test_constant_orderings_dropped_beside_real_ones() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project(column("x", "Name"))
            .order_by(asc(literal(1)))
            .order_by(desc(column("x", "Name")))
            .with_offset(literal(1));
        let out = emulate(q);
        let (inner, _) = from_subquery(&out);
        assert_eq!(
            inner.projection[1],
            SelectItem::Expression {
                expr: row_number(vec![desc(column("x", "Name"))]),
                alias: Some("__RowNumber__".into()),
            }
        );
        assert_eq!(out.order_by, vec![asc(column("t", "__RowNumber__"))]);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project(column("x", "Name"))
            .order_by(desc(column("x", "Name")))
            .with_offset(literal(5))
            .with_limit(literal(10));
        let once = emulate(q);
        let twice = emulate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_outer_projection_matches_original_columns() {
        let q = SelectExpression::from_table(table("Customers", "c"))
            .project_star("c", &["Id", "Name"])
            .project_as(plus(column("c", "A"), literal(1)), "Next")
            .project(function("NOW", vec![], SqlType::DateTime))
            .order_by(asc(column("c", "Id")))
            .with_offset(literal(2));
        let out = emulate(q);

        let outer: Vec<_> = out.projection.iter().map(|p| p.output_name()).collect();
        assert_eq!(outer, [Some("Id"), Some("Name"), Some("Next"), Some("c")]);
        for item in &out.projection {
            match item {
                SelectItem::Expression {
                    expr: SqlExpression::Column(c),
                    ..
                } => assert_eq!(c.table, "t"),
                other => panic!("unexpected outer item {:?}", other),
            }
        }

        let (inner, _) = from_subquery(&out);
        assert_eq!(inner.projection.len(), 5);
        assert!(inner.projection[4].is_row_number());
        assert!(inner.order_by.is_empty());
    }

    #[test]
    fn test_duplicate_wildcard_columns_get_unique_names() {
        let q = SelectExpression::from_table(table("Customers", "c"))
            .join(inner_join(
                table("Orders", "o"),
                eq(column("o", "CustomerId"), column("c", "Id")),
            ))
            .project_star("c", &["Id"])
            .project_star("o", &["Id"])
            .with_offset(literal(1));
        let out = emulate(q);
        let (inner, _) = from_subquery(&out);
        let names: Vec<_> = inner.projection.iter().map(|p| p.output_name()).collect();
        assert_eq!(names, [Some("Id"), Some("Id0"), Some("__RowNumber__")]);
        let outer: Vec<_> = out.projection.iter().map(|p| p.output_name()).collect();
        assert_eq!(outer, [Some("Id"), Some("Id0")]);
    }

    #[test]
    fn test_wildcard_without_columns_is_rejected() {
        let q = SelectExpression::from_table(table("T", "x"))
            .project_star("x", &[])
            .with_offset(literal(1));
        let err = RowNumberPagingPass::new().transform(q).unwrap_err();
        assert_eq!(
            err,
            IrError::UnexpandableWildcard {
                table: "x".into(),
                location: "select/projection[0]".into(),
            }
            .into()
        );
    }

    #[test]
    fn test_nested_paged_queries_get_distinct_aliases() {
        let inner = SelectExpression::from_table(table("Orders", "o"))
            .project(column("o", "Id"))
            .order_by(asc(column("o", "Id")))
            .with_offset(literal(1));
        let q = SelectExpression::from_table(subquery(inner, "t"))
            .project(column("t", "Id"))
            .order_by(asc(column("t", "Id")))
            .with_offset(literal(2));
        let out = emulate(q);

        let mut aliases = Vec::new();
        row_number_aliases(&out, &mut aliases);
        aliases.sort();
        assert_eq!(aliases, ["__RowNumber__", "__RowNumber__1"]);

        let (root_inner, root_alias) = from_subquery(&out);
        assert_ne!(root_alias, "t");
        let (derived, derived_alias) = from_subquery(root_inner);
        assert_eq!(derived_alias, "t");
        let (_, pushed_alias) = from_subquery(derived);
        assert_ne!(pushed_alias, root_alias);
        assert_ne!(pushed_alias, "t");
    }

    #[test]
    fn test_only_root_keeps_row_number_ordering() {
        let inner = SelectExpression::from_table(table("Orders", "o"))
            .project(column("o", "Id"))
            .order_by(asc(column("o", "Id")))
            .with_offset(literal(1));
        let q = SelectExpression::from_table(subquery(inner, "d")).project(column("d", "Id"));
        let out = emulate(q);
        let (derived, _) = from_subquery(&out);
        assert!(derived.order_by.is_empty());
    }

    #[test]
    fn test_exists_subquery_rewritten_and_stripped() {
        let paged = SelectExpression::from_table(table("Orders", "o"))
            .filter(eq(column("o", "CustomerId"), column("c", "Id")))
            .order_by(asc(column("o", "Date")))
            .with_offset(literal(1));
        let unpaged = SelectExpression::from_table(table("Orders", "o2"))
            .order_by(asc(column("o2", "Date")));
        let q = SelectExpression::from_table(table("Customers", "c"))
            .filter(exists(paged))
            .filter(exists(unpaged));
        let out = emulate(q);

        let Some(SqlExpression::Binary { left, right, .. }) = &out.predicate else {
            panic!("expected conjunction");
        };
        let SqlExpression::Exists(first) = left.as_ref() else {
            panic!("expected EXISTS");
        };
        assert!(first.subquery.order_by.is_empty());
        assert!(first.subquery.offset.is_none());
        assert!(first.subquery.predicate.is_some());

        let SqlExpression::Exists(second) = right.as_ref() else {
            panic!("expected EXISTS");
        };
        assert!(second.subquery.order_by.is_empty());
    }

    #[test]
    fn test_distinct_is_ranked_after_deduplication() {
        let q = SelectExpression::from_table(table("Customers", "c"))
            .distinct()
            .project(column("c", "City"))
            .order_by(desc(column("c", "City")))
            .with_offset(literal(3));
        let out = emulate(q);

        assert!(!out.distinct);
        let (ranked, ranked_alias) = from_subquery(&out);
        assert!(!ranked.distinct);
        let (deduped, deduped_alias) = from_subquery(ranked);
        assert!(deduped.distinct);
        assert_eq!(deduped_alias, "t");
        assert_eq!(ranked_alias, "t0");

        let rn = ranked.projection.last().unwrap();
        assert_eq!(
            *rn,
            SelectItem::Expression {
                expr: row_number(vec![desc(column("t", "City"))]),
                alias: Some("__RowNumber__".into()),
            }
        );
    }

    #[test]
    fn test_distinct_ordering_must_be_projected() {
        let q = SelectExpression::from_table(table("Customers", "c"))
            .distinct()
            .project(column("c", "City"))
            .order_by(asc(column("c", "Name")))
            .with_offset(literal(3));
        let err = RowNumberPagingPass::new().transform(q).unwrap_err();
        assert_eq!(
            err,
            IrError::DistinctOrderingNotProjected {
                location: "select/order_by[0]".into(),
            }
            .into()
        );
    }

    #[test]
    fn test_alias_ordering_unwrapped_for_row_number() {
        let total = plus(column("c", "A"), column("c", "B"));
        let q = SelectExpression::from_table(table("Customers", "c"))
            .project(alias("Total", total.clone()))
            .order_by(asc(alias("Total", total.clone())))
            .with_offset(literal(1));
        let out = emulate(q);
        let (inner, _) = from_subquery(&out);
        assert_eq!(
            inner.projection[0],
            SelectItem::Expression {
                expr: total.clone(),
                alias: Some("Total".into()),
            }
        );
        assert_eq!(
            inner.projection[1],
            SelectItem::Expression {
                expr: row_number(vec![asc(total)]),
                alias: Some("__RowNumber__".into()),
            }
        );
    }
}
