/// Lazy shaped results.
///
/// Nothing runs until the first pull. Each later pull advances the cursor
/// by one row and shapes it. The cursor is released when the results are
/// exhausted, after the first error, or when the iterator or stream is
/// dropped early.
use std::marker::PhantomData;

use futures::stream::{self, Stream};
use tokio_util::sync::CancellationToken;

use super::{AsyncQueryExecutor, AsyncRowCursor, ExecResult, QueryExecutor, RowCursor, Shaper};
use crate::compiler::CompiledQuery;
use crate::error::ExecutionError;

enum CursorState<C> {
    NotStarted,
    Open(C),
    Finished,
}

pub struct ShapedQuery<'a, E: QueryExecutor, S, T> {
    executor: &'a E,
    query: &'a CompiledQuery,
    shaper: S,
    state: CursorState<E::Cursor>,
    _output: PhantomData<fn() -> T>,
}

impl<'a, E, S, T> ShapedQuery<'a, E, S, T>
where
    E: QueryExecutor,
    S: Shaper<T>,
{
    pub fn new(executor: &'a E, query: &'a CompiledQuery, shaper: S) -> Self {
        Self {
            executor,
            query,
            shaper,
            state: CursorState::NotStarted,
            _output: PhantomData,
        }
    }

    fn pull(&mut self) -> Option<ExecResult<T>> {
        if let CursorState::NotStarted = self.state {
            match self.executor.execute(self.query) {
                Ok(cursor) => self.state = CursorState::Open(cursor),
                Err(e) => return Some(Err(e)),
            }
        }

        let CursorState::Open(cursor) = &mut self.state else {
            return None;
        };
        match cursor.move_next() {
            Ok(true) => Some(shape_current(cursor.current(), &self.shaper)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a, E, S, T> Iterator for ShapedQuery<'a, E, S, T>
where
    E: QueryExecutor,
    S: Shaper<T>,
{
    type Item = ExecResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.pull();
        if !matches!(item, Some(Ok(_))) {
            self.state = CursorState::Finished;
        }
        item
    }
}

fn shape_current<T, S: Shaper<T>>(row: Option<&super::Row>, shaper: &S) -> ExecResult<T> {
    let row = row.ok_or_else(|| {
        ExecutionError::Cursor("cursor advanced but has no current row".to_string())
    })?;
    shaper.shape(row)
}

struct StreamState<'a, E: AsyncQueryExecutor, S> {
    executor: &'a E,
    query: &'a CompiledQuery,
    shaper: S,
    cancel: CancellationToken,
    state: CursorState<E::Cursor>,
}

impl<'a, E, S> StreamState<'a, E, S>
where
    E: AsyncQueryExecutor,
{
    async fn pull<T>(&mut self) -> Option<ExecResult<T>>
    where
        S: Shaper<T>,
    {
        if let CursorState::NotStarted = self.state {
            if self.cancel.is_cancelled() {
                return Some(Err(ExecutionError::Cancelled));
            }
            match self.executor.execute_async(self.query).await {
                Ok(cursor) => self.state = CursorState::Open(cursor),
                Err(e) => return Some(Err(e)),
            }
        }

        let CursorState::Open(cursor) = &mut self.state else {
            return None;
        };
        match cursor.move_next_async(&self.cancel).await {
            Ok(true) => Some(shape_current(cursor.current(), &self.shaper)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Async counterpart of `ShapedQuery`.
///
/// Cancelling `cancel` makes the next pull yield `ExecutionError::Cancelled`
/// and ends the stream.
pub fn shaped_stream<'a, E, S, T>(
    executor: &'a E,
    query: &'a CompiledQuery,
    shaper: S,
    cancel: CancellationToken,
) -> impl Stream<Item = ExecResult<T>> + 'a
where
    E: AsyncQueryExecutor,
    S: Shaper<T> + 'a,
    T: 'a,
{
    let state = StreamState {
        executor,
        query,
        shaper,
        cancel,
        state: CursorState::NotStarted,
    };
    stream::unfold(state, |mut st| async move {
        if let CursorState::Finished = st.state {
            return None;
        }
        let item = st.pull::<T>().await;
        match item {
            Some(Ok(value)) => Some((Ok(value), st)),
            Some(Err(e)) => {
                st.state = CursorState::Finished;
                Some((Err(e), st))
            }
            None => None,
        }
    })
}
