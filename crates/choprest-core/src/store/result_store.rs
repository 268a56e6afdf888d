// ── Result store ──
//
// Three watch channels: the raw search results, the filter, and the filtered
// view derived from both. Every write recomputes the view and publishes it,
// so subscribers only ever watch `filtered`. A derived view (radius hits)
// replaces `filtered` alone; the raw results stay the search pool.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::model::{EntityId, Restaurant};
use crate::stream::{ResultFilter, ResultStream, Snapshot, unique_regions};

/// Reactive store for one results view.
pub struct ResultStore {
    results: watch::Sender<Snapshot>,
    filter: watch::Sender<ResultFilter>,
    filtered: watch::Sender<Snapshot>,
}

impl ResultStore {
    pub fn new() -> Self {
        let (results, _) = watch::channel(Arc::new(Vec::new()));
        let (filter, _) = watch::channel(ResultFilter::default());
        let (filtered, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            results,
            filter,
            filtered,
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the search results and republish the filtered view.
    pub fn publish(&self, results: Vec<Restaurant>) {
        self.publish_shared(results.into_iter().map(Arc::new).collect());
    }

    /// Like [`publish`](Self::publish) for already-shared records.
    pub fn publish_shared(&self, results: Vec<Arc<Restaurant>>) {
        debug!(count = results.len(), "publishing results");
        self.results.send_replace(Arc::new(results));
        self.recompute();
    }

    /// Show a list derived from the results (e.g. radius hits) as the view,
    /// bypassing the filter. The filter is reset so the view is exactly the
    /// given list; the raw results are left alone.
    pub fn publish_view(&self, view: Vec<Arc<Restaurant>>) {
        debug!(count = view.len(), "publishing derived view");
        self.filter.send_modify(ResultFilter::clear);
        self.filtered.send_replace(Arc::new(view));
    }

    pub fn set_filter(&self, filter: ResultFilter) {
        self.filter.send_replace(filter);
        self.recompute();
    }

    pub fn set_region(&self, region: Option<String>) {
        self.filter.send_modify(|f| f.set_region(region));
        self.recompute();
    }

    fn recompute(&self) {
        let results = self.results.borrow().clone();
        let view = self.filter.borrow().apply(results.as_slice());
        self.filtered.send_replace(Arc::new(view));
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Unfiltered search results.
    pub fn results_snapshot(&self) -> Snapshot {
        self.results.borrow().clone()
    }

    /// The list the map should mirror.
    pub fn filtered_snapshot(&self) -> Snapshot {
        self.filtered.borrow().clone()
    }

    pub fn filter(&self) -> ResultFilter {
        self.filter.borrow().clone()
    }

    /// Regions present in the unfiltered results, sorted.
    pub fn regions(&self) -> Vec<String> {
        unique_regions(self.results.borrow().as_slice())
    }

    /// Look up a record in the unfiltered results.
    pub fn find(&self, id: EntityId) -> Option<Arc<Restaurant>> {
        self.results.borrow().iter().find(|r| r.id == id).cloned()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_filtered(&self) -> ResultStream {
        ResultStream::new(self.filtered.subscribe())
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
