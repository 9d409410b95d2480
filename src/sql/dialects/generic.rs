//! ANSI SQL generator: `"x"` identifiers, positional `?` parameters and
//! `OFFSET ... FETCH` paging. Every hook uses the base implementation.

use crate::sql::generator::{DialectCapabilities, PagingSyntax, QuerySqlGenerator};

pub struct AnsiSqlGenerator {
    capabilities: DialectCapabilities,
}

impl AnsiSqlGenerator {
    pub fn new() -> Self {
        Self::with_capabilities(Self::default_capabilities())
    }

    pub fn with_capabilities(capabilities: DialectCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn default_capabilities() -> DialectCapabilities {
        DialectCapabilities {
            paging: PagingSyntax::OffsetFetch,
            window_functions: true,
            lateral_joins: true,
        }
    }
}

impl Default for AnsiSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySqlGenerator for AnsiSqlGenerator {
    fn name(&self) -> &str {
        "generic"
    }

    fn capabilities(&self) -> &DialectCapabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::ir::builders::*;
    use crate::ir::SelectExpression;
    use crate::sql::ParameterValues;

    #[test]
    fn test_lateral_join() {
        let orders = SelectExpression::from_table(table("Orders", "o"))
            .filter(eq(column("o", "CustomerId"), column("c", "Id")));
        let q = SelectExpression::from_table(table("Customers", "c"))
            .join(cross_join_lateral(orders, "o0"))
            .project_star("o0", &[]);
        let sql = AnsiSqlGenerator::new()
            .generate(&q, &ParameterValues::new())
            .unwrap()
            .sql;
        assert!(sql.contains("\nCROSS JOIN LATERAL (\n    SELECT 1\n"));
        assert!(sql.ends_with(") AS \"o0\""));
    }

    #[test]
    fn test_without_native_paging_rejects_leftover_limit() {
        let generator = AnsiSqlGenerator::with_capabilities(DialectCapabilities {
            paging: PagingSyntax::None,
            window_functions: true,
            lateral_joins: true,
        });
        let q = SelectExpression::from_table(table("T", "t")).with_limit(literal(1));
        let err = generator.generate(&q, &ParameterValues::new()).unwrap_err();
        assert_eq!(
            err,
            CompileError::DialectCapabilityMismatch {
                dialect: "generic".into(),
                feature: "native paging",
            }
        );
    }

    #[test]
    fn test_row_number_requires_window_functions() {
        let generator = AnsiSqlGenerator::with_capabilities(DialectCapabilities {
            window_functions: false,
            ..AnsiSqlGenerator::default_capabilities()
        });
        let q = SelectExpression::from_table(table("T", "t"))
            .project_as(row_number(vec![asc(column("t", "Id"))]), "rn");
        assert!(matches!(
            generator.generate(&q, &ParameterValues::new()),
            Err(CompileError::DialectCapabilityMismatch { feature: "window functions", .. })
        ));
    }
}
