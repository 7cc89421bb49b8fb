/// Batch factorial engine.
///
/// All requested values share one multiplicative scan over `[1, max]`. The
/// domain is cut into spans scanned in parallel; each scan snapshots its
/// running product whenever it reaches a requested value, and a prefix merge
/// over span totals turns those partial products into exact factorials.
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, trace};

use super::span::{Span, partition_spans};

/// Below this maximum value the scan runs as a single span.
pub const DEFAULT_PARALLEL_THRESHOLD: u64 = 2000;

/// Scan steps between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Batches larger than this are sorted with rayon.
const PARALLEL_SORT_THRESHOLD: usize = 10_000;

/// One requested value tagged with its position in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryValue {
    pub position: usize,
    pub value: u64,
}

/// Outcome of scanning one span: the product of every integer in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanResult {
    pub span: Span,
    pub total_product: BigUint,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("computation cancelled")]
    Cancelled,

    /// 0 is outside the engine's domain of positive integers.
    #[error("value at position {position} is 0; factorials are computed for values >= 1")]
    ZeroValue { position: usize },
}

/// Shared flag that aborts a running computation between scan steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of spans and worker threads.
    pub parallelism: usize,
    /// Maximum values below this are computed as one span.
    pub parallel_threshold: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            parallelism,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Tag each value with its index in the request.
pub fn build_query_values(values: &[u64]) -> Vec<QueryValue> {
    values
        .iter()
        .enumerate()
        .map(|(position, &value)| QueryValue { position, value })
        .collect()
}

/// Sort ascending by value. Order among equal values is irrelevant: results
/// are placed back by position at the end.
pub fn sort_by_value(queries: &mut [QueryValue]) {
    if queries.len() > PARALLEL_SORT_THRESHOLD {
        queries.par_sort_unstable_by_key(|q| q.value);
    } else {
        queries.sort_unstable_by_key(|q| q.value);
    }
}

/// For each span, the range of sorted queries whose value falls inside it.
///
/// Ranges are consecutive and together cover every query, since the spans
/// cover `[1, max]`.
pub fn span_bounds(queries: &[QueryValue], spans: &[Span]) -> Vec<Range<usize>> {
    let mut bounds = Vec::with_capacity(spans.len());
    let mut start = 0;
    for span in spans {
        let end = start + queries[start..].partition_point(|q| q.value <= span.high);
        bounds.push(start..end);
        start = end;
    }
    bounds
}

/// Cut the result arena into one disjoint mutable slice per span.
fn split_cells<'a>(mut cells: &'a mut [BigUint], bounds: &[Range<usize>]) -> Vec<&'a mut [BigUint]> {
    let mut chunks = Vec::with_capacity(bounds.len());
    for range in bounds {
        let (head, tail) = std::mem::take(&mut cells).split_at_mut(range.len());
        chunks.push(head);
        cells = tail;
    }
    chunks
}

/// Multiply through one span, snapshotting the running product into the
/// cell of every query whose value is reached.
///
/// `queries` and `cells` are parallel slices; `queries` must be sorted by value.
/// An empty span returns a total product of 1 and writes nothing.
pub fn scan_span(
    span: &Span,
    queries: &[QueryValue],
    cells: &mut [BigUint],
    cancel: Option<&CancelToken>,
) -> Result<SpanResult, EngineError> {
    debug_assert_eq!(queries.len(), cells.len());

    let mut running = BigUint::one();
    let mut pos = 0;
    while pos < queries.len() && queries[pos].value < span.low {
        pos += 1;
    }

    for head in span.low..=span.high {
        if let Some(token) = cancel
            && (head - span.low) % CANCEL_CHECK_INTERVAL == 0
            && token.is_cancelled()
        {
            return Err(EngineError::Cancelled);
        }
        running *= head;
        while pos < queries.len() && queries[pos].value == head {
            cells[pos] = running.clone();
            pos += 1;
        }
    }

    Ok(SpanResult {
        span: *span,
        total_product: running,
    })
}

/// `prefix[j]` is the product of the totals of every span before span `j`.
pub fn prefix_products(span_results: &[SpanResult]) -> Vec<BigUint> {
    let mut prefix = Vec::with_capacity(span_results.len());
    let mut acc = BigUint::one();
    for (i, result) in span_results.iter().enumerate() {
        prefix.push(acc.clone());
        // The product of all spans is never needed.
        if i + 1 < span_results.len() {
            acc *= &result.total_product;
        }
    }
    prefix
}

/// Turn within-span partial products into full factorials.
///
/// Must run inside the engine's pool so the per-cell multiplications spread
/// across its workers.
pub fn merge_spans(span_results: &[SpanResult], bounds: &[Range<usize>], cells: &mut [BigUint]) {
    let prefix = prefix_products(span_results);
    split_cells(cells, bounds)
        .into_par_iter()
        .zip(prefix.par_iter())
        .for_each(|(chunk, factor)| {
            if factor.is_one() {
                return;
            }
            chunk.par_iter_mut().for_each(|cell| *cell *= factor);
        });
}

/// Place each result at its query's original position.
pub fn restore_positions(queries: &[QueryValue], cells: Vec<BigUint>) -> Vec<BigUint> {
    let mut out = vec![BigUint::zero(); queries.len()];
    for (query, cell) in queries.iter().zip(cells) {
        out[query.position] = cell;
    }
    out
}

/// Computes batches of factorials on a dedicated worker pool.
pub struct FactorialEngine {
    config: EngineConfig,
    pool: rayon::ThreadPool,
}

impl FactorialEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let config = config.with_parallelism(config.parallelism);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .thread_name(|i| format!("ffactorial-span-{}", i))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `values[i]!` for every `i`, in input order.
    ///
    /// A 0 anywhere in `values` rejects the whole batch with
    /// [`EngineError::ZeroValue`] before any work starts.
    pub fn compute(&self, values: &[u64]) -> Result<Vec<BigUint>, EngineError> {
        self.run(values, None)
    }

    /// Like [`compute`](Self::compute), but gives up with
    /// [`EngineError::Cancelled`] once `cancel` is set.
    pub fn compute_cancellable(
        &self,
        values: &[u64],
        cancel: &CancelToken,
    ) -> Result<Vec<BigUint>, EngineError> {
        self.run(values, Some(cancel))
    }

    fn run(&self, values: &[u64], cancel: Option<&CancelToken>) -> Result<Vec<BigUint>, EngineError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(position) = values.iter().position(|&v| v == 0) {
            return Err(EngineError::ZeroValue { position });
        }

        let started = Instant::now();
        let mut queries = build_query_values(values);

        let (results, span_count) = self.pool.install(|| {
            sort_by_value(&mut queries);
            let max = queries[queries.len() - 1].value;
            let spans = partition_spans(max, self.config.parallelism, self.config.parallel_threshold);
            debug!(
                targets = queries.len(),
                max,
                spans = spans.len(),
                "partitioned value domain"
            );

            let bounds = span_bounds(&queries, &spans);
            let mut cells = vec![BigUint::zero(); queries.len()];

            let tasks: Vec<_> = spans
                .iter()
                .zip(split_cells(&mut cells, &bounds))
                .zip(bounds.iter())
                .map(|((span, chunk), range)| (span, &queries[range.clone()], chunk))
                .collect();

            // Fork/join: every span total is in hand before merging starts.
            let span_results = tasks
                .into_par_iter()
                .map(|(span, span_queries, chunk)| {
                    let span_started = Instant::now();
                    let result = scan_span(span, span_queries, chunk, cancel);
                    trace!(
                        span = span.index,
                        low = span.low,
                        high = span.high,
                        targets = span_queries.len(),
                        elapsed_us = span_started.elapsed().as_micros() as u64,
                        "span scanned"
                    );
                    result
                })
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

            if cancel.is_some_and(|token| token.is_cancelled()) {
                return Err(EngineError::Cancelled);
            }

            merge_spans(&span_results, &bounds, &mut cells);
            Ok((restore_positions(&queries, cells), spans.len()))
        })?;

        debug!(
            targets = results.len(),
            spans = span_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "factorials computed"
        );
        Ok(results)
    }
}

/// One-shot convenience: build an engine for `config` and compute `values`.
pub fn compute_factorials(values: &[u64], config: EngineConfig) -> Result<Vec<BigUint>, EngineError> {
    FactorialEngine::new(config)?.compute(values)
}
