/// Execution boundary: cursors over generated SQL and row shaping.
///
/// The compiler stops at `CompiledQuery`. Whatever runs the text plugs in
/// through `QueryExecutor` (blocking pull) or `AsyncQueryExecutor`
/// (cancellation-aware pull); results reach the caller lazily through
/// `ShapedQuery` or `shaped_stream`.
///
/// ```text
/// CompiledQuery ──► QueryExecutor ──► RowCursor ──► Shaper<T> ──► T
/// ```
pub mod memory;
pub mod shaped;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::compiler::CompiledQuery;
use crate::error::ExecutionError;
use crate::ir::Literal;

pub use memory::InMemoryExecutor;
pub use shaped::{shaped_stream, ShapedQuery};

pub type ExecResult<T> = std::result::Result<T, ExecutionError>;

/// One result row. Values line up with the generated projection by
/// ordinal; `columns` carries the output names.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Literal>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Literal>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Literal] {
        &self.values
    }

    pub fn get(&self, ordinal: usize) -> ExecResult<&Literal> {
        self.values
            .get(ordinal)
            .ok_or_else(|| ExecutionError::Shaping(format!("no column at ordinal {ordinal}")))
    }

    pub fn get_by_name(&self, name: &str) -> ExecResult<&Literal> {
        let ordinal = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ExecutionError::Shaping(format!("missing column `{name}`")))?;
        self.get(ordinal)
    }
}

/// Forward-only blocking cursor.
pub trait RowCursor {
    /// Advance to the next row. `false` once the cursor is exhausted.
    fn move_next(&mut self) -> ExecResult<bool>;

    fn current(&self) -> Option<&Row>;
}

/// Forward-only cursor pulled asynchronously.
pub trait AsyncRowCursor {
    /// Advance to the next row. A cancelled token yields
    /// `ExecutionError::Cancelled`.
    fn move_next_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ExecResult<bool>> + Send;

    fn current(&self) -> Option<&Row>;
}

pub trait QueryExecutor {
    type Cursor: RowCursor;

    fn execute(&self, query: &CompiledQuery) -> ExecResult<Self::Cursor>;
}

pub trait AsyncQueryExecutor {
    type Cursor: AsyncRowCursor + Send;

    fn execute_async(
        &self,
        query: &CompiledQuery,
    ) -> impl Future<Output = ExecResult<Self::Cursor>> + Send;
}

/// Maps a raw row into a typed result. Invoked once per row.
pub trait Shaper<T> {
    fn shape(&self, row: &Row) -> ExecResult<T>;
}

impl<T, F> Shaper<T> for F
where
    F: Fn(&Row) -> ExecResult<T>,
{
    fn shape(&self, row: &Row) -> ExecResult<T> {
        self(row)
    }
}
