// ── Reactive result streams ──
//
// Subscription types for consuming result-list changes from the ResultStore.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Restaurant;

pub use filter::{ResultFilter, unique_regions};

/// A shared, immutable result list.
pub type Snapshot = Arc<Vec<Arc<Restaurant>>>;

/// A subscription to a result list.
///
/// Offers the snapshot seen at subscription time and change notification
/// via [`changed`](Self::changed) or as a `Stream`.
pub struct ResultStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl ResultStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// Wait for the next change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> ResultWatchStream {
        ResultWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding every new snapshot, starting with the current one.
pub struct ResultWatchStream {
    inner: WatchStream<Snapshot>,
}

impl Stream for ResultWatchStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
