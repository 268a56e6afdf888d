// ── Reactive result store ──
//
// Holds the search results and their filtered view, pushing every change to
// subscribers through `watch` channels.

mod result_store;

pub use result_store::ResultStore;
