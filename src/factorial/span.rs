/// Contiguous sub-range `[low, high]` of the integer domain handled by one worker.
///
/// A span with `low > high` is empty: it does no work and its total product is 1.
/// Empty spans appear when the maximum value is smaller than the worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub index: usize,
    pub low: u64,
    pub high: u64,
}

impl Span {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    /// Number of integers in the span.
    #[inline]
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.high - self.low + 1
        }
    }

    #[inline]
    pub fn contains(&self, value: u64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// Split `[1, max]` into `parallelism` gap-free spans.
///
/// Below `threshold` the whole domain collapses into a single span, since
/// dispatching workers for a short scan costs more than the scan itself.
/// Otherwise span `i` ends at `max * (i + 1) / parallelism`, so the last span
/// always ends exactly at `max`.
pub fn partition_spans(max: u64, parallelism: usize, threshold: u64) -> Vec<Span> {
    let parts = parallelism.max(1);
    if max < threshold || parts == 1 {
        return vec![Span {
            index: 0,
            low: 1,
            high: max,
        }];
    }

    let mut spans = Vec::with_capacity(parts);
    let mut low = 1u64;
    for i in 0..parts {
        // u128 intermediate: max * parts overflows u64 for large max
        let high = ((max as u128) * (i as u128 + 1) / parts as u128) as u64;
        spans.push(Span {
            index: i,
            low,
            high,
        });
        // highs never decrease, so an empty span still chains: its low is one past
        // the previous high.
        low = high.saturating_add(1);
    }
    spans
}

/// Index of the span containing `value`, by binary search over span upper bounds.
///
/// Empty spans are skipped naturally: their `high` equals the previous span's
/// `high`, so the first span whose `high >= value` is always non-empty.
pub fn span_index_of(spans: &[Span], value: u64) -> Option<usize> {
    let idx = spans.partition_point(|s| s.high < value);
    match spans.get(idx) {
        Some(span) if span.contains(value) => Some(idx),
        _ => None,
    }
}
