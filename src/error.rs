/// Error types for IR validation, rewriting and SQL generation.
///
/// All compiler faults are programming or configuration errors: the
/// compiler is a pure function of its input, so nothing here is retried.
/// Each variant keeps the node kind and tree location so a caller can turn
/// it into an actionable message.
use thiserror::Error;

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// A node kind reached a generator or pass that has no rule for it.
    #[error("unsupported expression `{kind}` at {location}")]
    UnsupportedExpression {
        kind: &'static str,
        location: String,
    },

    #[error("invalid query tree: {0}")]
    InvalidIr(#[from] IrError),

    /// The configuration asks for something the target dialect cannot emit.
    #[error("dialect `{dialect}` does not support {feature}")]
    DialectCapabilityMismatch {
        dialect: String,
        feature: &'static str,
    },
}

/// Malformed-IR invariant violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrError {
    #[error("duplicate projection alias `{alias}` at {location}")]
    DuplicateProjectionAlias { alias: String, location: String },

    #[error("ROW_NUMBER() outside a projection at {location}")]
    MisplacedRowNumber { location: String },

    #[error("column `{table}`.`{column}` does not resolve in scope at {location}")]
    UnresolvedColumn {
        table: String,
        column: String,
        location: String,
    },

    #[error("lateral join must wrap an aliased subquery at {location}")]
    InvalidLateralJoin { location: String },

    #[error("join used as the first FROM source at {location}")]
    JoinAsSource { location: String },

    #[error("FROM entry at {location} follows the source but is not a join")]
    UnjoinedSource { location: String },

    #[error("wildcard over `{table}` has no known columns and cannot be expanded at {location}")]
    UnexpandableWildcard { table: String, location: String },

    #[error("ORDER BY expression is not in the DISTINCT projection at {location}")]
    DistinctOrderingNotProjected { location: String },
}

/// Faults raised while pulling or shaping rows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("query was cancelled")]
    Cancelled,

    #[error("failed to shape row: {0}")]
    Shaping(String),

    #[error("cursor error: {0}")]
    Cursor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display_names_kind() {
        let err = CompileError::UnsupportedExpression {
            kind: "CrossJoinLateral",
            location: "select/from[1]".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("CrossJoinLateral"));
        assert!(msg.contains("select/from[1]"));
    }

    #[test]
    fn test_ir_error_converts() {
        let err: CompileError = IrError::MisplacedRowNumber {
            location: "select/predicate".into(),
        }
        .into();
        assert!(matches!(err, CompileError::InvalidIr(_)));
        assert!(err.to_string().starts_with("invalid query tree"));
    }

    #[test]
    fn test_execution_error_display() {
        assert_eq!(ExecutionError::Cancelled.to_string(), "query was cancelled");
        assert_eq!(
            ExecutionError::Shaping("missing column `Id`".into()).to_string(),
            "failed to shape row: missing column `Id`"
        );
    }
}
