/// Dialect generators and the registry that picks one by kind.
pub mod generic;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use generic::AnsiSqlGenerator;
pub use postgres::PostgresSqlGenerator;
pub use sqlite::SqliteSqlGenerator;
pub use sqlserver::SqlServerSqlGenerator;

use super::generator::{DialectCapabilities, QuerySqlGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Generic,
    Postgres,
    Sqlite,
    SqlServer,
}

impl DialectKind {
    pub fn default_capabilities(self) -> DialectCapabilities {
        match self {
            DialectKind::Generic => AnsiSqlGenerator::default_capabilities(),
            DialectKind::Postgres => PostgresSqlGenerator::default_capabilities(),
            DialectKind::Sqlite => SqliteSqlGenerator::default_capabilities(),
            DialectKind::SqlServer => SqlServerSqlGenerator::default_capabilities(),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialectKind::Generic => "generic",
            DialectKind::Postgres => "postgres",
            DialectKind::Sqlite => "sqlite",
            DialectKind::SqlServer => "sqlserver",
        };
        f.write_str(name)
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(DialectKind::Generic),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "sqlite" => Ok(DialectKind::Sqlite),
            "sqlserver" | "mssql" | "tsql" => Ok(DialectKind::SqlServer),
            other => Err(format!(
                "unknown dialect `{other}` (expected generic, postgres, sqlite or sqlserver)"
            )),
        }
    }
}

/// Generator for `kind` with its stock capabilities.
pub fn create_generator(kind: DialectKind) -> Box<dyn QuerySqlGenerator> {
    create_generator_with(kind, kind.default_capabilities())
}

/// Generator for `kind` reporting custom capabilities.
pub fn create_generator_with(
    kind: DialectKind,
    capabilities: DialectCapabilities,
) -> Box<dyn QuerySqlGenerator> {
    match kind {
        DialectKind::Generic => Box::new(AnsiSqlGenerator::with_capabilities(capabilities)),
        DialectKind::Postgres => Box::new(PostgresSqlGenerator::with_capabilities(capabilities)),
        DialectKind::Sqlite => Box::new(SqliteSqlGenerator::with_capabilities(capabilities)),
        DialectKind::SqlServer => Box::new(SqlServerSqlGenerator::with_capabilities(capabilities)),
    }
}
