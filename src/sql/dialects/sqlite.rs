//! SQLite generator.
//!
//! Named `@name` parameters, integer booleans, plain-text datetimes and
//! `LIMIT -1 OFFSET m` for an offset without a limit. SQLite has no
//! lateral joins.

use crate::error::Result;
use crate::ir::{Literal, SelectExpression};
use crate::sql::builder::CommandBuilder;
use crate::sql::generator::{
    format_literal, quote_string, walk_limit_offset, DialectCapabilities, PagingSyntax,
    QuerySqlGenerator,
};

pub struct SqliteSqlGenerator {
    capabilities: DialectCapabilities,
}

impl SqliteSqlGenerator {
    pub fn new() -> Self {
        Self::with_capabilities(Self::default_capabilities())
    }

    pub fn with_capabilities(capabilities: DialectCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn default_capabilities() -> DialectCapabilities {
        DialectCapabilities {
            paging: PagingSyntax::LimitOffset,
            // window functions since 3.25
            window_functions: true,
            lateral_joins: false,
        }
    }
}

impl Default for SqliteSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySqlGenerator for SqliteSqlGenerator {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn capabilities(&self) -> &DialectCapabilities {
        &self.capabilities
    }

    fn placeholder(&self, name: &str, _ordinal: usize) -> String {
        format!("@{name}")
    }

    fn reuses_placeholders(&self) -> bool {
        true
    }

    fn format_literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Boolean(v) => if *v { "1" } else { "0" }.to_string(),
            Literal::DateTime(dt) => quote_string(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            other => format_literal(other),
        }
    }

    fn generate_limit_offset(
        &self,
        b: &mut CommandBuilder,
        select: &SelectExpression,
    ) -> Result<()> {
        match (&select.limit, &select.offset) {
            (None, Some(offset)) => {
                b.append_line("").append("LIMIT -1 OFFSET ");
                self.generate_expression(b, offset)
            }
            _ => walk_limit_offset(self, b, select),
        }
    }
}
