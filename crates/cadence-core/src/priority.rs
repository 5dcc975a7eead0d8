//! Priority lanes for the dispatch queue.

/// Priority class for work submitted to the dispatch queue.
///
/// The queue keeps one FIFO lane per class and executes all pending
/// [`Normal`](DispatchPriority::Normal) items before any pending
/// [`Low`](DispatchPriority::Low) item in the same drain batch. Within
/// a class, items run in submission order.
///
/// `Low` is used exclusively for tick resubmission. If the dispatch
/// thread is shared with an input source, queued input callbacks
/// (`Normal`) are always drained first, so a self-resubmitting tick
/// loop can never starve externally submitted work. This is a fairness
/// contract, not an incidental detail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchPriority {
    /// Externally submitted work (input events, one-off callbacks).
    Normal,
    /// Recurring tick submissions.
    Low,
}

impl DispatchPriority {
    /// True if this is the tick lane.
    pub fn is_low(self) -> bool {
        matches!(self, Self::Low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_query() {
        assert!(DispatchPriority::Low.is_low());
        assert!(!DispatchPriority::Normal.is_low());
    }
}
