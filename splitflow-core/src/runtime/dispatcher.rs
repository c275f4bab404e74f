use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use bon::bon;
use flume::{SendError, SendTimeoutError, Sender};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::{
    config::SplitConfig,
    errorhandling::BuildError,
    keyed::{legacy_md5_hash, HashFn, PartitionMap, Router, SlotReduction},
};

use super::{
    queue::{partition_queue, PartitionReceiver},
    worker::{PendingWorker, WorkerFn, WorkerHandle},
};

/// Splits keyed items across partitions and hands each partition's items to a
/// dedicated worker thread through a bounded queue.
///
/// Pushing into a full queue blocks the producer until the worker catches up,
/// items are never dropped. Items pushed into the same partition are received by
/// its worker in the order they were enqueued.
///
/// Dropping the dispatcher closes all queues, workers then drain what is left
/// and return. Use [Dispatcher::shutdown] to also wait for them.
///
/// # Example
/// ```rust
/// use splitflow::runtime::{Dispatcher, PartitionReceiver};
///
/// let dispatcher = Dispatcher::<String>::builder()
///     .weights([30, 70])
///     .queue_capacity(128)
///     .worker(|rx: PartitionReceiver<String>| {
///         let partition = rx.partition();
///         for order in rx {
///             println!("partition {partition} got {order}");
///         }
///     })
///     .build()
///     .unwrap();
///
/// dispatcher.push("customer-17", "order #1".to_string()).unwrap();
/// dispatcher.shutdown().unwrap();
/// ```
pub struct Dispatcher<T> {
    router: Router,
    queues: Vec<Sender<T>>,
    queue_capacity: usize,
    started: AtomicBool,
    pending: Mutex<Option<Vec<PendingWorker<T>>>>,
    running: Mutex<Vec<WorkerHandle>>,
}

#[bon]
impl<T> Dispatcher<T>
where
    T: Send + 'static,
{
    /// Create a dispatcher and launch its workers.
    ///
    /// There is one queue and one worker per partition. If fewer worker functions
    /// than partitions are given, the first one drains the remaining partitions.
    #[builder]
    pub fn new(
        /// Worker functions in partition order, see [DispatcherBuilder::worker]
        #[builder(field)]
        workers: Vec<WorkerFn<T>>,
        /// Percentage of traffic per partition, defaults to `[100]`
        #[builder(into, default = vec![100])]
        weights: Vec<u32>,
        /// Function hashing keys, defaults to [legacy_md5_hash]
        #[builder(default = legacy_md5_hash as HashFn)]
        hasher: HashFn,
        #[builder(default)] reduction: SlotReduction,
        /// Capacity of every partition queue. Zero, the default, means a push
        /// only completes once a worker takes the item.
        #[builder(default)]
        queue_capacity: usize,
        /// Spread a single partition evenly over this many workers.
        /// Ignored if the weights define more than one partition.
        worker_buckets: Option<usize>,
    ) -> Result<Self, BuildError> {
        if workers.is_empty() {
            return Err(BuildError::MissingConsumer);
        }
        let map = PartitionMap::build(&weights, worker_buckets)?;
        let router = Router::from_parts(map, hasher, reduction);

        let (queues, receivers): (Vec<_>, Vec<_>) = (0..router.partitions())
            .map(|partition| partition_queue(partition, queue_capacity))
            .unzip();
        info!(
            partitions = router.partitions(),
            queue_capacity,
            worker_functions = workers.len(),
            "Building dispatcher"
        );

        let dispatcher = Self {
            router,
            queues,
            queue_capacity,
            started: AtomicBool::new(false),
            pending: Mutex::new(Some(PendingWorker::assign(receivers, &workers))),
            running: Mutex::new(Vec::new()),
        };
        dispatcher.start()?;
        Ok(dispatcher)
    }
}

impl<T, S: dispatcher_builder::State> DispatcherBuilder<T, S>
where
    T: Send + 'static,
{
    /// Add a worker function. The n-th function added drains partition n.
    pub fn worker(mut self, func: impl Fn(PartitionReceiver<T>) + Send + Sync + 'static) -> Self {
        self.workers.push(Arc::new(func));
        self
    }

    /// Add several worker functions at once, in partition order
    pub fn workers(mut self, funcs: impl IntoIterator<Item = WorkerFn<T>>) -> Self {
        self.workers.extend(funcs);
        self
    }
}

impl<T> Dispatcher<T>
where
    T: Send + 'static,
{
    /// Build a dispatcher from plain configuration and the given worker functions
    pub fn from_config(
        config: &SplitConfig,
        workers: impl IntoIterator<Item = WorkerFn<T>>,
    ) -> Result<Self, BuildError> {
        Self::builder()
            .workers(workers)
            .weights(config.weights.clone())
            .hasher(config.hash.function())
            .reduction(config.reduction)
            .queue_capacity(config.queue_capacity)
            .maybe_worker_buckets(config.worker_buckets)
            .build()
    }

    /// Launch all workers.
    ///
    /// Construction already does this, calling it again, from any number of
    /// threads, has no effect. Every worker is launched exactly once.
    pub fn start(&self) -> Result<(), BuildError> {
        if self.started.load(Ordering::Acquire) {
            return Ok(());
        }
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(workers) = pending.take() else {
            return Ok(());
        };
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        for worker in workers {
            running.push(worker.spawn()?);
        }
        self.started.store(true, Ordering::Release);
        info!(workers = running.len(), "Launched workers");
        Ok(())
    }

    /// True once the workers were launched
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

impl<T> Dispatcher<T> {
    /// Partition the key belongs to. Never blocks.
    #[inline]
    pub fn forward(&self, key: &str) -> usize {
        self.router.forward(key)
    }

    /// Enqueue `payload` on the partition of `key`, blocking while that
    /// partition's queue is full.
    ///
    /// Returns the queue length right after enqueueing. Workers drain
    /// concurrently, so this is only an indication of load.
    ///
    /// Fails only if the partition's worker has exited, in which case the
    /// payload is handed back.
    pub fn push(&self, key: &str, payload: T) -> Result<usize, PushError<T>> {
        let partition = self.forward(key);
        let queue = &self.queues[partition];
        queue
            .send(payload)
            .map_err(|SendError(payload)| PushError::Disconnected { partition, payload })?;
        trace!(partition, "Enqueued payload");
        Ok(queue.len())
    }

    /// Like [Dispatcher::push], but gives up after `timeout` if the queue stays
    /// full.
    pub fn push_timeout(
        &self,
        key: &str,
        payload: T,
        timeout: Duration,
    ) -> Result<usize, PushError<T>> {
        let partition = self.forward(key);
        let queue = &self.queues[partition];
        queue.send_timeout(payload, timeout).map_err(|e| match e {
            SendTimeoutError::Timeout(payload) => PushError::Timeout { partition, payload },
            SendTimeoutError::Disconnected(payload) => {
                PushError::Disconnected { partition, payload }
            }
        })?;
        trace!(partition, "Enqueued payload");
        Ok(queue.len())
    }

    /// Like [Dispatcher::push], but waits for queue capacity asynchronously
    /// instead of blocking the thread.
    pub async fn push_async(&self, key: &str, payload: T) -> Result<usize, PushError<T>> {
        let partition = self.forward(key);
        let queue = &self.queues[partition];
        queue
            .send_async(payload)
            .await
            .map_err(|SendError(payload)| PushError::Disconnected { partition, payload })?;
        trace!(partition, "Enqueued payload");
        Ok(queue.len())
    }

    /// Items currently waiting in the given partition's queue, `None` if there is
    /// no such partition
    pub fn queue_len(&self, partition: usize) -> Option<usize> {
        self.queues.get(partition).map(Sender::len)
    }

    /// Capacity of every partition queue
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Number of partitions, which equals the number of queues and workers
    pub fn partitions(&self) -> usize {
        self.queues.len()
    }

    /// The router resolving keys for this dispatcher
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Close all queues and wait until every worker has drained its queue and
    /// returned.
    ///
    /// This blocks forever if a worker does not return once its queue is
    /// closed.
    pub fn shutdown(self) -> Result<(), ShutdownError> {
        let Dispatcher {
            queues,
            pending,
            running,
            ..
        } = self;
        drop(queues);
        drop(pending);
        let handles = running.into_inner().unwrap_or_else(PoisonError::into_inner);
        info!(workers = handles.len(), "Shutting down dispatcher");

        let panicked: Vec<usize> = handles
            .into_iter()
            .filter_map(|handle| {
                let partition = handle.partition;
                (!handle.join()).then_some(partition)
            })
            .collect();
        if panicked.is_empty() {
            Ok(())
        } else {
            warn!(?panicked, "Workers panicked");
            Err(ShutdownError::WorkerPanicked {
                partitions: panicked,
            })
        }
    }
}

impl<T: Send + 'static> Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("queue_capacity", &self.queue_capacity)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

/// Error returned if a payload could not be enqueued.
/// The payload can be recovered with [PushError::into_payload].
#[derive(Error)]
pub enum PushError<T> {
    /// The worker draining this partition has exited, most likely it panicked
    #[error("worker for partition {partition} has exited")]
    Disconnected {
        /// Partition the payload was routed to
        partition: usize,
        /// The payload which was not enqueued
        payload: T,
    },
    /// The partition queue stayed full until the timeout elapsed
    #[error("partition {partition} queue stayed full until the timeout elapsed")]
    Timeout {
        /// Partition the payload was routed to
        partition: usize,
        /// The payload which was not enqueued
        payload: T,
    },
}

impl<T> PushError<T> {
    /// Partition the payload was routed to
    pub fn partition(&self) -> usize {
        match self {
            PushError::Disconnected { partition, .. } => *partition,
            PushError::Timeout { partition, .. } => *partition,
        }
    }

    /// Take back the payload which was not enqueued
    pub fn into_payload(self) -> T {
        match self {
            PushError::Disconnected { payload, .. } => payload,
            PushError::Timeout { payload, .. } => payload,
        }
    }
}

impl<T> Debug for PushError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushError::Disconnected { partition, .. } => f
                .debug_struct("Disconnected")
                .field("partition", partition)
                .finish_non_exhaustive(),
            PushError::Timeout { partition, .. } => f
                .debug_struct("Timeout")
                .field("partition", partition)
                .finish_non_exhaustive(),
        }
    }
}

/// Error returned by [Dispatcher::shutdown]
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// These workers panicked instead of returning
    #[error("workers for partitions {partitions:?} panicked")]
    WorkerPanicked {
        /// Partitions whose workers panicked
        partitions: Vec<usize>,
    },
}
