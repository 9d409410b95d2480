/// Dialect-neutral query representation.
///
/// ```text
/// Front-end (external)
///       ↓
/// Query IR               (types.rs, builders.rs)
///       ↓
/// Validation             (validate.rs)
///       ↓
/// Rewrite passes         (crate::rewrite, via visitor.rs)
///       ↓
/// Dialect SQL generator  (crate::sql)
/// ```
pub mod builders;
pub mod types;
pub mod validate;
pub mod visitor;

pub use types::*;
pub use validate::validate_select;
pub use visitor::{ExpressionRewriter, ExpressionVisitor};
