//! Bounded work queue between the page scanner and the download workers.
//!
//! One producer, many consumers. The producer pushes with
//! [`WorkSender::send`], which suspends while the queue is full. Workers pull
//! with [`WorkQueue::next`]; the shared receiver sits behind an async mutex so
//! every item is handed to exactly one worker.
//!
//! Closing is the only stop signal: once the [`WorkSender`] is closed (or
//! dropped), workers keep receiving the buffered items and then see `None`.
//!
//! # Example
//!
//! ```
//! use pdfgrab_core::scanner::WorkItem;
//! use pdfgrab_core::work_queue::work_queue;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (sender, queue) = work_queue(8);
//! sender.send(WorkItem::new(Url::parse("http://example.com/a.pdf")?)).await?;
//! sender.close();
//!
//! assert!(queue.next().await.is_some());
//! assert!(queue.next().await.is_none());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;

use crate::scanner::WorkItem;

/// Errors raised while pushing work.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Every consumer has gone away; the item could not be delivered.
    #[error("work queue has no consumers left; dropped {url}")]
    NoConsumers {
        /// URL of the undelivered item.
        url: String,
    },
}

/// Creates a bounded queue holding at most `capacity` undispatched items.
///
/// A zero capacity is raised to one.
#[must_use]
pub fn work_queue(capacity: usize) -> (WorkSender, WorkQueue) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    (
        WorkSender { tx, capacity },
        WorkQueue {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer half of the work queue.
#[derive(Debug)]
pub struct WorkSender {
    tx: mpsc::Sender<WorkItem>,
    capacity: usize,
}

impl WorkSender {
    /// Pushes an item, waiting for a free slot when the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NoConsumers`] if every [`WorkQueue`] handle was dropped.
    pub async fn send(&self, item: WorkItem) -> Result<(), QueueError> {
        self.tx
            .send(item)
            .await
            .map_err(|mpsc::error::SendError(item)| QueueError::NoConsumers {
                url: item.to_string(),
            })?;
        trace!(depth = self.depth(), "item queued");
        Ok(())
    }

    /// Number of items waiting to be picked up by a worker.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.capacity.saturating_sub(self.tx.capacity())
    }

    /// Maximum number of undispatched items.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Closes the queue. Buffered items are still delivered.
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer half of the work queue, cloned into every worker.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
}

impl WorkQueue {
    /// Waits for the next item.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<WorkItem> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use url::Url;

    fn item(n: usize) -> WorkItem {
        WorkItem::new(Url::parse(&format!("http://example.com/{n}.pdf")).unwrap())
    }

    #[tokio::test]
    async fn test_closed_queue_drains_buffered_items_first() {
        let (sender, queue) = work_queue(4);
        sender.send(item(1)).await.unwrap();
        sender.send(item(2)).await.unwrap();
        sender.close();

        assert_eq!(queue.next().await, Some(item(1)));
        assert_eq!(queue.next().await, Some(item(2)));
        assert_eq!(queue.next().await, None);
        assert_eq!(queue.next().await, None);
    }

    #[tokio::test]
    async fn test_send_suspends_when_full() {
        let (sender, queue) = work_queue(1);
        sender.send(item(1)).await.unwrap();
        assert_eq!(sender.depth(), 1);

        let blocked = tokio::time::timeout(Duration::from_millis(50), sender.send(item(2))).await;
        assert!(blocked.is_err(), "send should wait while the queue is full");

        assert_eq!(queue.next().await, Some(item(1)));
        sender.send(item(3)).await.unwrap();
        assert_eq!(queue.next().await, Some(item(3)));
    }

    #[tokio::test]
    async fn test_send_without_consumers_fails() {
        let (sender, queue) = work_queue(2);
        drop(queue);

        let result = sender.send(item(7)).await;
        assert!(matches!(result, Err(QueueError::NoConsumers { url }) if url.ends_with("7.pdf")));
    }

    #[tokio::test]
    async fn test_each_item_delivered_to_exactly_one_consumer() {
        let (sender, queue) = work_queue(3);
        let mut consumers = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            consumers.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(item) = queue.next().await {
                    got.push(item);
                    tokio::task::yield_now().await;
                }
                got
            }));
        }
        drop(queue);

        for n in 0..25 {
            sender.send(item(n)).await.unwrap();
        }
        sender.close();

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 25);
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let (sender, _queue) = work_queue(0);
        assert_eq!(sender.capacity(), 1);
    }
}
