/// Dialect-aware SQL text generation.
///
/// ```text
/// SelectExpression
///       ↓
/// QuerySqlGenerator   (generator.rs, overridden per dialect in dialects/)
///       ↓
/// CommandBuilder      (builder.rs)
///       ↓
/// GeneratedSql { sql, parameters }
/// ```
pub mod builder;
pub mod dialects;
pub mod generator;

pub use builder::{CommandBuilder, GeneratedSql, ParameterValue, ParameterValues, SqlParameter};
pub use dialects::{create_generator, create_generator_with, DialectKind};
pub use generator::{DialectCapabilities, PagingSyntax, QuerySqlGenerator};
