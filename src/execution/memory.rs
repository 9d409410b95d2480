/// Executor serving canned rows keyed by SQL text.
///
/// Used by tests and the CLI to exercise the lazy execution contract
/// without a database: it counts executions and open cursors so callers can
/// observe when a query actually runs and when its cursor is released.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{AsyncQueryExecutor, AsyncRowCursor, ExecResult, QueryExecutor, Row, RowCursor};
use crate::compiler::CompiledQuery;
use crate::error::ExecutionError;
use crate::ir::Literal;
use crate::sql::ParameterValue;

struct CannedResult {
    columns: Arc<[String]>,
    rows: Vec<Vec<Literal>>,
}

#[derive(Default)]
pub struct InMemoryExecutor {
    results: HashMap<String, CannedResult>,
    executions: AtomicUsize,
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rows returned for an exact SQL text.
    pub fn with_result(
        mut self,
        sql: impl Into<String>,
        columns: &[&str],
        rows: Vec<Vec<Literal>>,
    ) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.results.insert(
            sql.into(),
            CannedResult {
                columns: Arc::from(columns),
                rows,
            },
        );
        self
    }

    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn open(&self, query: &CompiledQuery) -> ExecResult<MemoryCursor> {
        if let Some(p) = query
            .parameters
            .iter()
            .find(|p| p.value == ParameterValue::Deferred)
        {
            return Err(ExecutionError::Cursor(format!(
                "parameter `{}` has no value",
                p.name
            )));
        }

        let result = self.results.get(&query.sql).ok_or_else(|| {
            ExecutionError::Cursor("no result registered for query".to_string())
        })?;

        self.executions.fetch_add(1, Ordering::SeqCst);
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        debug!(rows = result.rows.len(), "opened in-memory cursor");

        let rows: Vec<Row> = result
            .rows
            .iter()
            .map(|values| Row::new(result.columns.clone(), values.clone()))
            .collect();
        Ok(MemoryCursor {
            rows: rows.into_iter(),
            current: None,
            open_cursors: self.open_cursors.clone(),
        })
    }
}

impl QueryExecutor for InMemoryExecutor {
    type Cursor = MemoryCursor;

    fn execute(&self, query: &CompiledQuery) -> ExecResult<MemoryCursor> {
        self.open(query)
    }
}

impl AsyncQueryExecutor for InMemoryExecutor {
    type Cursor = MemoryCursor;

    async fn execute_async(&self, query: &CompiledQuery) -> ExecResult<MemoryCursor> {
        self.open(query)
    }
}

pub struct MemoryCursor {
    rows: std::vec::IntoIter<Row>,
    current: Option<Row>,
    open_cursors: Arc<AtomicUsize>,
}

impl RowCursor for MemoryCursor {
    fn move_next(&mut self) -> ExecResult<bool> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }
}

impl AsyncRowCursor for MemoryCursor {
    async fn move_next_async(&mut self, cancel: &CancellationToken) -> ExecResult<bool> {
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        self.move_next()
    }

    fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
