//! SQL Server (T-SQL) generator.
//!
//! Differs from the base generator in:
//! - `[x]` identifiers and `@name` parameters
//! - `CROSS APPLY` for lateral joins
//! - `COUNT_BIG` for counts declared as 64-bit
//! - `@@` system functions emitted verbatim
//! - full-text predicates compared `= true` emit the bare predicate
//! - boolean literals in search-condition position become `1 = 1` / `1 = 0`
//! - `TOP(n)` for a bare limit, `OFFSET ... FETCH` otherwise

use chrono::Timelike;

use crate::error::Result;
use crate::ir::{BinaryOperator, Literal, SqlExpression, SqlFunctionCall, SqlType, TableExpression};
use crate::sql::builder::CommandBuilder;
use crate::sql::generator::{
    format_literal, quote_string, walk_binary, walk_function, DialectCapabilities, PagingSyntax,
    QuerySqlGenerator,
};

const FULL_TEXT_PREDICATES: [&str; 2] = ["FREETEXT", "CONTAINS"];

pub struct SqlServerSqlGenerator {
    capabilities: DialectCapabilities,
}

impl SqlServerSqlGenerator {
    pub fn new() -> Self {
        Self::with_capabilities(Self::default_capabilities())
    }

    pub fn with_capabilities(capabilities: DialectCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn default_capabilities() -> DialectCapabilities {
        DialectCapabilities {
            paging: PagingSyntax::TopOffsetFetch,
            window_functions: true,
            lateral_joins: true,
        }
    }
}

impl Default for SqlServerSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_full_text_predicate(expr: &SqlExpression) -> bool {
    match expr {
        SqlExpression::Function(call) => FULL_TEXT_PREDICATES
            .iter()
            .any(|name| call.name.eq_ignore_ascii_case(name)),
        _ => false,
    }
}

impl QuerySqlGenerator for SqlServerSqlGenerator {
    fn name(&self) -> &str {
        "sqlserver"
    }

    fn capabilities(&self) -> &DialectCapabilities {
        &self.capabilities
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn placeholder(&self, name: &str, _ordinal: usize) -> String {
        format!("@{name}")
    }

    fn reuses_placeholders(&self) -> bool {
        true
    }

    fn format_literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Boolean(v) => format!("CAST({} AS bit)", if *v { 1 } else { 0 }),
            Literal::String(s) => format!("N{}", quote_string(s)),
            Literal::DateTime(dt) => format!(
                "'{}.{:07}'",
                dt.format("%Y-%m-%dT%H:%M:%S"),
                dt.nanosecond() / 100
            ),
            other => format_literal(other),
        }
    }

    // `bit` values are not predicates in T-SQL.
    fn generate_condition(&self, b: &mut CommandBuilder, expr: &SqlExpression) -> Result<()> {
        match expr {
            SqlExpression::Literal(Literal::Boolean(v)) => {
                b.append(if *v { "1 = 1" } else { "1 = 0" });
                Ok(())
            }
            _ => self.generate_expression(b, expr),
        }
    }

    fn generate_lateral_join(&self, b: &mut CommandBuilder, table: &TableExpression) -> Result<()> {
        b.append("CROSS APPLY ");
        self.generate_table(b, table)
    }

    fn generate_binary(
        &self,
        b: &mut CommandBuilder,
        left: &SqlExpression,
        op: BinaryOperator,
        right: &SqlExpression,
    ) -> Result<()> {
        let against_true = matches!(right, SqlExpression::Literal(Literal::Boolean(true)));
        if op == BinaryOperator::Eq && against_true && is_full_text_predicate(left) {
            return self.generate_expression(b, left);
        }
        walk_binary(self, b, left, op, right)
    }

    fn generate_function(&self, b: &mut CommandBuilder, call: &SqlFunctionCall) -> Result<()> {
        if call.name.starts_with("@@") {
            b.append(&call.name);
            return Ok(());
        }
        if call.schema.is_none()
            && call.name.eq_ignore_ascii_case("COUNT")
            && call.result_type == SqlType::Int64
        {
            let wide = SqlFunctionCall {
                name: "COUNT_BIG".to_string(),
                ..call.clone()
            };
            return walk_function(self, b, &wide);
        }
        walk_function(self, b, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builders::*;
    use crate::ir::SelectExpression;
    use crate::sql::ParameterValues;

    fn generate(q: &SelectExpression) -> String {
        SqlServerSqlGenerator::new()
            .generate(q, &ParameterValues::new())
            .unwrap()
            .sql
    }

    fn customers() -> SelectExpression {
        SelectExpression::from_table(table("Customers", "c"))
    }

    #[test]
    fn test_bracket_quoting() {
        let q = customers().project(column("c", "Weird]Name"));
        assert!(generate(&q).starts_with("SELECT [c].[Weird]]Name]\nFROM [Customers] AS [c]"));
    }

    #[test]
    fn test_top_for_limit_only() {
        let q = customers()
            .distinct()
            .project(column("c", "Id"))
            .with_limit(param("take", SqlType::Int32));
        assert_eq!(
            generate(&q),
            "SELECT DISTINCT TOP(@take) [c].[Id]\nFROM [Customers] AS [c]"
        );
    }

    #[test]
    fn test_offset_fetch_with_placeholder_order() {
        let q = customers()
            .project(column("c", "Id"))
            .with_offset(literal(10))
            .with_limit(literal(5));
        assert_eq!(
            generate(&q),
            "SELECT [c].[Id]\n\
             FROM [Customers] AS [c]\n\
             ORDER BY (SELECT 1)\n\
             OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }

    #[test]
    fn test_wide_count_uses_count_big() {
        let q = customers()
            .project_as(count(fragment("*"), SqlType::Int64), "n")
            .project_as(count(fragment("*"), SqlType::Int32), "m");
        assert!(generate(&q).starts_with("SELECT COUNT_BIG(*) AS [n], COUNT(*) AS [m]"));
    }

    #[test]
    fn test_system_function_verbatim() {
        let q = customers().project_as(function("@@ROWCOUNT", vec![], SqlType::Int32), "rc");
        assert!(generate(&q).starts_with("SELECT @@ROWCOUNT AS [rc]"));
    }

    #[test]
    fn test_full_text_predicate_drops_boolean_comparison() {
        let predicate = function(
            "FREETEXT",
            vec![column("c", "Bio"), literal("rust")],
            SqlType::Boolean,
        );
        let q = customers().filter(eq(predicate, literal(true)));
        assert!(generate(&q).ends_with("WHERE FREETEXT([c].[Bio], N'rust')"));
    }

    #[test]
    fn test_full_text_predicate_only_collapses_equality_with_true() {
        let predicate = || {
            function(
                "FREETEXT",
                vec![column("c", "Bio"), literal("rust")],
                SqlType::Boolean,
            )
        };
        let q = customers().filter(binary(predicate(), BinaryOperator::NotEq, literal(true)));
        assert!(generate(&q).ends_with("WHERE FREETEXT([c].[Bio], N'rust') <> CAST(1 AS bit)"));

        let q = customers().filter(eq(predicate(), literal(false)));
        assert!(generate(&q).ends_with("WHERE FREETEXT([c].[Bio], N'rust') = CAST(0 AS bit)"));
    }

    #[test]
    fn test_boolean_literal_in_condition_position() {
        let orders = table("Orders", "o");
        let q = customers()
            .project_as(literal(true), "Flag")
            .join(inner_join(orders, literal(true)))
            .filter(and(eq(column("c", "Id"), literal(1)), literal(false)));
        let sql = generate(&q);
        assert!(sql.starts_with("SELECT CAST(1 AS bit) AS [Flag]
"));
        assert!(sql.contains("INNER JOIN [Orders] AS [o] ON 1 = 1"));
        assert!(sql.ends_with("WHERE ([c].[Id] = 1) AND 1 = 0"));

        let q = customers().filter(not(literal(true)));
        assert!(generate(&q).ends_with("WHERE NOT 1 = 1"));
    }

    #[test]
    fn test_cross_apply() {
        let orders = SelectExpression::from_table(table("Orders", "o"))
            .filter(eq(column("o", "CustomerId"), column("c", "Id")));
        let q = customers().join(cross_join_lateral(orders, "o0"));
        assert!(generate(&q).contains("\nCROSS APPLY (\n    SELECT 1\n"));
    }

    #[test]
    fn test_literals() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 123_456)
            .unwrap();
        let gen = SqlServerSqlGenerator::new();
        assert_eq!(gen.format_literal(&Literal::Boolean(true)), "CAST(1 AS bit)");
        assert_eq!(gen.format_literal(&Literal::String("it's".into())), "N'it''s'");
        assert_eq!(
            gen.format_literal(&Literal::DateTime(dt)),
            "'2024-01-02T03:04:05.1234560'"
        );
    }
}
