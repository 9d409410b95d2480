//! PostgreSQL generator.
//!
//! Numbered `$n` placeholders (a repeated name reuses its number) and
//! `LIMIT n OFFSET m` paging.

use crate::sql::generator::{DialectCapabilities, PagingSyntax, QuerySqlGenerator};

pub struct PostgresSqlGenerator {
    capabilities: DialectCapabilities,
}

impl PostgresSqlGenerator {
    pub fn new() -> Self {
        Self::with_capabilities(Self::default_capabilities())
    }

    pub fn with_capabilities(capabilities: DialectCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn default_capabilities() -> DialectCapabilities {
        DialectCapabilities {
            paging: PagingSyntax::LimitOffset,
            window_functions: true,
            lateral_joins: true,
        }
    }
}

impl Default for PostgresSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySqlGenerator for PostgresSqlGenerator {
    fn name(&self) -> &str {
        "postgres"
    }

    fn capabilities(&self) -> &DialectCapabilities {
        &self.capabilities
    }

    fn placeholder(&self, _name: &str, ordinal: usize) -> String {
        format!("${ordinal}")
    }

    fn reuses_placeholders(&self) -> bool {
        true
    }
}
