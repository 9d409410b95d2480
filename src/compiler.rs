/// Compiler entry point: validate → rewrite → generate.
///
/// A `QueryCompiler` is built once per configuration and can compile any
/// number of trees. It holds no per-compilation state, so one instance can
/// be shared across threads.
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::ir::{validate_select, SelectExpression};
use crate::rewrite::RewritePipeline;
use crate::sql::{
    create_generator, create_generator_with, DialectCapabilities, ParameterValues,
    QuerySqlGenerator, SqlParameter,
};

/// SQL text plus the ordered parameters it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub parameters: Vec<SqlParameter>,
    /// The tree the SQL was generated from, after all rewrites.
    #[serde(skip)]
    pub rewritten: SelectExpression,
}

pub struct QueryCompiler {
    config: CompilerConfig,
    generator: Box<dyn QuerySqlGenerator>,
    pipeline: RewritePipeline,
}

impl QueryCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        let generator = create_generator(config.dialect);
        Self::with_generator(config, generator)
    }

    /// Use the configured dialect's syntax but report custom capabilities.
    pub fn with_dialect(config: CompilerConfig, capabilities: DialectCapabilities) -> Self {
        let generator = create_generator_with(config.dialect, capabilities);
        Self::with_generator(config, generator)
    }

    pub fn with_generator(config: CompilerConfig, generator: Box<dyn QuerySqlGenerator>) -> Self {
        let pipeline = RewritePipeline::for_config(&config, generator.capabilities());
        Self {
            config,
            generator,
            pipeline,
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &DialectCapabilities {
        self.generator.capabilities()
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.pipeline.pass_names()
    }

    /// Whether OFFSET/LIMIT will be rewritten into ROW_NUMBER() filters.
    pub fn emulates_paging(&self) -> bool {
        self.config.row_number_paging || !self.capabilities().has_native_paging()
    }

    pub fn compile(
        &self,
        select: SelectExpression,
        values: &ParameterValues,
    ) -> Result<CompiledQuery> {
        validate_select(&select)?;

        if self.emulates_paging() && !self.capabilities().window_functions {
            return Err(CompileError::DialectCapabilityMismatch {
                dialect: self.generator.name().to_string(),
                feature: "window functions",
            });
        }

        let rewritten = self.pipeline.run(select)?;
        let generated = self.generator.generate(&rewritten, values)?;
        debug!(
            dialect = self.generator.name(),
            parameters = generated.parameters.len(),
            "compiled query"
        );
        trace!(sql = %generated.sql, "generated SQL");

        Ok(CompiledQuery {
            sql: generated.sql,
            parameters: generated.parameters,
            rewritten,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrError;
    use crate::ir::builders::*;
    use crate::ir::SqlType;
    use crate::sql::{DialectKind, PagingSyntax, ParameterValue};
    use sqlparser::dialect::{MsSqlDialect, PostgreSqlDialect};
    use sqlparser::parser::Parser as SqlParser;

    fn compiler(dialect: DialectKind, row_number_paging: bool) -> QueryCompiler {
        QueryCompiler::new(CompilerConfig::new(dialect).with_row_number_paging(row_number_paging))
    }

    fn no_paging_compiler() -> QueryCompiler {
        QueryCompiler::with_dialect(
            CompilerConfig::new(DialectKind::Generic),
            DialectCapabilities {
                paging: PagingSyntax::None,
                window_functions: true,
                lateral_joins: true,
            },
        )
    }

    fn names_by_offset(offset: i64, limit: Option<i64>) -> SelectExpression {
        let q = SelectExpression::from_table(table("T", "t"))
            .project(column("t", "Name"))
            .order_by(asc(column("t", "Name")))
            .with_offset(literal(offset));
        match limit {
            Some(limit) => q.with_limit(literal(limit)),
            None => q,
        }
    }

    #[test]
    fn test_offset_only_on_dialect_without_paging() {
        let out = no_paging_compiler()
            .compile(names_by_offset(5, None), &ParameterValues::new())
            .unwrap();
        assert_eq!(
            out.sql,
            "SELECT \"t0\".\"Name\"\n\
             FROM (\n    \
             SELECT \"t\".\"Name\", ROW_NUMBER() OVER(ORDER BY \"t\".\"Name\") AS \"__RowNumber__\"\n    \
             FROM \"T\" AS \"t\"\n\
             ) AS \"t0\"\n\
             WHERE \"t0\".\"__RowNumber__\" > 5\n\
             ORDER BY \"t0\".\"__RowNumber__\""
        );
    }

    #[test]
    fn test_offset_and_limit_are_folded() {
        let out = no_paging_compiler()
            .compile(names_by_offset(5, Some(10)), &ParameterValues::new())
            .unwrap();
        assert!(out.sql.contains(
            "WHERE (\"t0\".\"__RowNumber__\" > 5) AND (\"t0\".\"__RowNumber__\" <= 15)"
        ));
        assert!(!out.sql.contains("5 + 10"));
        assert!(!out.sql.contains("OFFSET"));
    }

    #[test]
    fn test_no_order_paging_compiles() {
        let q = SelectExpression::from_table(table("T", "t"))
            .project(column("t", "Name"))
            .with_offset(literal(5));
        let out = no_paging_compiler().compile(q, &ParameterValues::new()).unwrap();
        assert!(out
            .sql
            .contains("ROW_NUMBER() OVER(ORDER BY (SELECT 1)) AS \"__RowNumber__\""));
    }

    #[test]
    fn test_sql_server_emulation_with_parameters() {
        let q = SelectExpression::from_table(table("Customers", "c"))
            .project_star("c", &["Id", "Name"])
            .order_by(asc(column("c", "Name")))
            .with_offset(param("skip", SqlType::Int32))
            .with_limit(param("take", SqlType::Int32));
        let values = ParameterValues::new().with("skip", 20).with("take", 10);
        let out = compiler(DialectKind::SqlServer, true).compile(q, &values).unwrap();

        assert_eq!(
            out.sql,
            "SELECT [t].[Id], [t].[Name]\n\
             FROM (\n    \
             SELECT [c].[Id], [c].[Name], ROW_NUMBER() OVER(ORDER BY [c].[Name]) AS [__RowNumber__]\n    \
             FROM [Customers] AS [c]\n\
             ) AS [t]\n\
             WHERE ([t].[__RowNumber__] > @skip) AND ([t].[__RowNumber__] <= (@skip + @take))\n\
             ORDER BY [t].[__RowNumber__]"
        );
        let placeholders: Vec<_> = out.parameters.iter().map(|p| p.placeholder.as_str()).collect();
        assert_eq!(placeholders, ["@skip", "@take"]);
        assert!(out
            .parameters
            .iter()
            .all(|p| matches!(p.value, ParameterValue::Resolved(_))));

        let reparsed = SqlParser::parse_sql(&MsSqlDialect {}, &out.sql);
        assert!(reparsed.is_ok(), "{} -> {:?}", out.sql, reparsed.err());
    }

    #[test]
    fn test_sql_server_native_paging_without_emulation() {
        let out = compiler(DialectKind::SqlServer, false)
            .compile(names_by_offset(5, Some(10)), &ParameterValues::new())
            .unwrap();
        assert!(out
            .sql
            .ends_with("ORDER BY [t].[Name]\nOFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"));
        assert!(!out.sql.contains("ROW_NUMBER"));
    }

    #[test]
    fn test_limit_only_stays_native_when_emulating() {
        let q = SelectExpression::from_table(table("T", "t"))
            .project(column("t", "Name"))
            .with_limit(literal(3));
        let out = compiler(DialectKind::SqlServer, true)
            .compile(q, &ParameterValues::new())
            .unwrap();
        assert!(out.sql.starts_with("SELECT TOP(3) [t].[Name]"));
    }

    #[test]
    fn test_exists_ordering_removed_from_text() {
        let orders = SelectExpression::from_table(table("Orders", "o"))
            .filter(eq(column("o", "CustomerId"), column("c", "Id")))
            .order_by(asc(column("o", "Date")));
        let q = SelectExpression::from_table(table("Customers", "c"))
            .project(column("c", "Id"))
            .filter(exists(orders));
        for dialect in [DialectKind::Generic, DialectKind::SqlServer] {
            let out = compiler(dialect, false)
                .compile(q.clone(), &ParameterValues::new())
                .unwrap();
            assert!(!out.sql.contains("ORDER BY"), "{}", out.sql);
        }
    }

    #[test]
    fn test_wide_count_on_sql_server() {
        let q = SelectExpression::from_table(table("Orders", "o"))
            .project_as(count(fragment("*"), SqlType::Int64), "Total");
        let out = compiler(DialectKind::SqlServer, false)
            .compile(q, &ParameterValues::new())
            .unwrap();
        assert!(out.sql.contains("COUNT_BIG(*)"));
        assert!(!out.sql.contains("COUNT(*)"));
    }

    #[test]
    fn test_nested_paging_uses_distinct_row_number_aliases() {
        let inner = SelectExpression::from_table(table("Orders", "o"))
            .project(column("o", "Id"))
            .order_by(asc(column("o", "Id")))
            .with_offset(literal(1));
        let q = SelectExpression::from_table(subquery(inner, "d"))
            .project(column("d", "Id"))
            .order_by(asc(column("d", "Id")))
            .with_offset(literal(2));
        let out = compiler(DialectKind::Postgres, true)
            .compile(q, &ParameterValues::new())
            .unwrap();
        assert_eq!(out.sql.matches("AS \"__RowNumber__\"").count(), 1);
        assert_eq!(out.sql.matches("AS \"__RowNumber__1\"").count(), 1);

        let reparsed = SqlParser::parse_sql(&PostgreSqlDialect {}, &out.sql);
        assert!(reparsed.is_ok(), "{} -> {:?}", out.sql, reparsed.err());
    }

    #[test]
    fn test_postgres_output_reparses() {
        let orders = SelectExpression::from_table(table("Orders", "o"))
            .project(column("o", "Total"))
            .filter(eq(column("o", "CustomerId"), column("c", "Id")))
            .order_by(desc(column("o", "Total")))
            .with_limit(literal(1));
        let q = SelectExpression::from_table(table("Customers", "c"))
            .join(cross_join_lateral(orders, "o0"))
            .project(column("c", "Name"))
            .project(column("o0", "Total"))
            .filter(eq(column("c", "City"), param("city", SqlType::String)))
            .order_by(asc(column("c", "Name")))
            .with_offset(literal(10))
            .with_limit(literal(10));
        let out = compiler(DialectKind::Postgres, false)
            .compile(q, &ParameterValues::new())
            .unwrap();
        assert!(out.sql.contains("CROSS JOIN LATERAL ("));
        assert!(out.sql.ends_with("LIMIT 10 OFFSET 10"));
        let reparsed = SqlParser::parse_sql(&PostgreSqlDialect {}, &out.sql);
        assert!(reparsed.is_ok(), "{} -> {:?}", out.sql, reparsed.err());
    }

    #[test]
    fn test_invalid_tree_is_rejected_before_rewrite() {
        let q = SelectExpression::from_table(table("T", "t"))
            .project(column("t", "Name"))
            .project_as(literal(1), "Name");
        let err = compiler(DialectKind::Generic, false)
            .compile(q, &ParameterValues::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidIr(IrError::DuplicateProjectionAlias { .. })
        ));
    }

    #[test]
    fn test_emulation_without_window_functions_is_a_mismatch() {
        let compiler = QueryCompiler::with_dialect(
            CompilerConfig::new(DialectKind::Sqlite).with_row_number_paging(true),
            DialectCapabilities {
                window_functions: false,
                ..DialectKind::Sqlite.default_capabilities()
            },
        );
        let err = compiler
            .compile(names_by_offset(1, None), &ParameterValues::new())
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::DialectCapabilityMismatch {
                dialect: "sqlite".into(),
                feature: "window functions",
            }
        );
    }

    #[test]
    fn test_compiler_is_shareable_across_threads() {
        let compiler = std::sync::Arc::new(compiler(DialectKind::SqlServer, true));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let compiler = compiler.clone();
                std::thread::spawn(move || {
                    compiler
                        .compile(names_by_offset(i, Some(5)), &ParameterValues::new())
                        .map(|out| out.sql)
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let sql = handle.join().unwrap().unwrap();
            assert!(sql.contains(&format!("<= {}", i + 5)));
        }
    }
}
