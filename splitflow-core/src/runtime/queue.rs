//! Bounded per-partition queues.
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Create the queue for one partition.
///
/// A capacity of zero makes the queue a rendezvous channel: every push waits
/// until the worker takes the item.
pub(crate) fn partition_queue<T>(partition: usize, capacity: usize) -> (Sender<T>, PartitionReceiver<T>) {
    let (tx, rx) = flume::bounded(capacity);
    (
        tx,
        PartitionReceiver {
            partition,
            receiver: rx,
        },
    )
}

/// Consuming end of a partition queue, handed to exactly one worker.
///
/// Items arrive in the order they were enqueued. Once the dispatcher is dropped
/// or shut down, the remaining items can still be received, after that every
/// receive returns `None`.
#[derive(Debug)]
pub struct PartitionReceiver<T> {
    partition: usize,
    receiver: Receiver<T>,
}

impl<T> PartitionReceiver<T> {
    /// Index of the partition this queue belongs to
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Wait for the next item. Returns `None` once the queue is closed and empty.
    pub fn recv(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Take the next item if one is queued right now
    pub fn try_recv(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(x) => Some(x),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait at most `timeout` for the next item.
    ///
    /// Returns `Ok(None)` on timeout and `Err(Closed)` once the queue is closed
    /// and empty.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, Closed> {
        match self.receiver.recv_timeout(timeout) {
            Ok(x) => Ok(Some(x)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Closed),
        }
    }

    /// Asynchronously wait for the next item.
    /// Returns `None` once the queue is closed and empty.
    pub async fn recv_async(&self) -> Option<T> {
        self.receiver.recv_async().await.ok()
    }

    /// Blocking iterator over all items until the queue is closed
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.receiver.iter()
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True if no items are queued right now
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T> IntoIterator for PartitionReceiver<T> {
    type Item = T;

    type IntoIter = flume::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.receiver.into_iter()
    }
}

/// The partition queue was closed and holds no more items
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("partition queue is closed")]
pub struct Closed;
