//! Evaluation context and the random-access tuple buffer seam.

use std::fmt;
use std::sync::Arc;

use fedq_result::{Error, Result};
use fedq_storage::LobStore;
use fedq_types::Value;

use crate::config::AggregateConfig;

/// Per-evaluation services handed to every accumulator call.
///
/// Supplies the spill-capable large-object store, configuration, and (for
/// window evaluation) the frame visible at the current row.
#[derive(Debug, Default)]
pub struct EvalContext {
    config: AggregateConfig,
    store: LobStore,
    frame: Option<WindowFrame>,
}

impl EvalContext {
    pub fn new(config: AggregateConfig) -> Self {
        let store = LobStore::new(config.spill.clone());
        Self {
            config,
            store,
            frame: None,
        }
    }

    /// Build a context that shares an existing store (and its statistics).
    pub fn with_store(config: AggregateConfig, store: LobStore) -> Self {
        Self {
            config,
            store,
            frame: None,
        }
    }

    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    pub fn store(&self) -> &LobStore {
        &self.store
    }

    /// Install the frame of the row about to be evaluated.
    pub fn set_window_frame(&mut self, frame: WindowFrame) {
        self.frame = Some(frame);
    }

    pub fn clear_window_frame(&mut self) {
        self.frame = None;
    }

    pub fn window_frame(&self) -> Option<&WindowFrame> {
        self.frame.as_ref()
    }
}

/// A batch of consecutive materialized tuples starting at `begin_row`.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleBatch {
    begin_row: u64,
    rows: Vec<Vec<Value>>,
}

impl TupleBatch {
    pub fn new(begin_row: u64, rows: Vec<Vec<Value>>) -> Self {
        Self { begin_row, rows }
    }

    pub fn begin_row(&self) -> u64 {
        self.begin_row
    }

    /// One past the last row held by this batch.
    pub fn end_row(&self) -> u64 {
        self.begin_row + self.rows.len() as u64
    }

    /// Tuple at absolute row `row`, if this batch holds it.
    pub fn tuple(&self, row: u64) -> Option<&[Value]> {
        let offset = row.checked_sub(self.begin_row)?;
        self.rows
            .get(usize::try_from(offset).ok()?)
            .map(Vec::as_slice)
    }
}

/// Read-only, random-access store of a materialized partition.
///
/// Locking and spill discipline belong to the implementation; accumulators
/// only issue indexed reads.
pub trait TupleBuffer: Send + Sync + fmt::Debug {
    /// Number of rows held.
    fn row_count(&self) -> u64;

    /// The batch containing absolute row `row`.
    fn batch(&self, row: u64) -> Result<Arc<TupleBatch>>;
}

/// In-memory [`TupleBuffer`] split into fixed-size batches.
#[derive(Debug, Clone)]
pub struct MemTupleBuffer {
    batch_size: usize,
    batches: Vec<Arc<TupleBatch>>,
    rows: u64,
}

impl MemTupleBuffer {
    pub fn from_rows(rows: Vec<Vec<Value>>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let total = rows.len() as u64;
        let mut batches = Vec::with_capacity(rows.len().div_ceil(batch_size));
        let mut begin = 0u64;
        let mut iter = rows.into_iter().peekable();
        while iter.peek().is_some() {
            let chunk: Vec<Vec<Value>> = iter.by_ref().take(batch_size).collect();
            let len = chunk.len() as u64;
            batches.push(Arc::new(TupleBatch::new(begin, chunk)));
            begin += len;
        }
        Self {
            batch_size,
            batches,
            rows: total,
        }
    }
}

impl TupleBuffer for MemTupleBuffer {
    fn row_count(&self) -> u64 {
        self.rows
    }

    fn batch(&self, row: u64) -> Result<Arc<TupleBatch>> {
        let outside = || {
            Error::Internal(format!(
                "row {row} outside tuple buffer of {} rows",
                self.rows
            ))
        };
        if row >= self.rows {
            return Err(outside());
        }
        let idx = usize::try_from(row / self.batch_size as u64).map_err(|_| outside())?;
        self.batches.get(idx).cloned().ok_or_else(outside)
    }
}

/// Frame of a partition visible to a window function at the current row.
///
/// Bounds are absolute row indexes into `buffer`; `end` is exclusive.
#[derive(Debug, Clone)]
pub struct WindowFrame {
    buffer: Arc<dyn TupleBuffer>,
    start: u64,
    end: u64,
}

impl WindowFrame {
    pub fn new(buffer: Arc<dyn TupleBuffer>, start: u64, end: u64) -> Result<Self> {
        if start > end || end > buffer.row_count() {
            return Err(Error::Internal(format!(
                "window frame [{start}, {end}) outside buffer of {} rows",
                buffer.row_count()
            )));
        }
        Ok(Self { buffer, start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Column `column` of the frame's `offset`-th row (0-based), or `None`
    /// when the offset falls outside the frame.
    pub fn value_at(&self, offset: u64, column: usize) -> Result<Option<Value>> {
        if offset >= self.len() {
            return Ok(None);
        }
        let row = self.start + offset;
        let batch = self.buffer.batch(row)?;
        let tuple = batch.tuple(row).ok_or_else(|| {
            Error::Internal(format!("tuple buffer returned a batch without row {row}"))
        })?;
        tuple.get(column).cloned().map(Some).ok_or_else(|| {
            Error::Internal(format!(
                "column {column} outside buffered tuple of width {}",
                tuple.len()
            ))
        })
    }
}
