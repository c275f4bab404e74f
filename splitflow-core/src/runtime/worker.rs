//! Worker: a long running consumer draining exactly one partition queue on its own
//! OS thread.
use std::{sync::Arc, thread::JoinHandle};

use tracing::{info, span, Level};

use crate::errorhandling::BuildError;

use super::queue::PartitionReceiver;

/// Function consuming one partition's queue.
///
/// It should keep receiving until the queue is closed. A worker which stops
/// consuming makes its partition back up and eventually blocks producers.
pub type WorkerFn<T> = Arc<dyn Fn(PartitionReceiver<T>) + Send + Sync>;

/// A worker which was assigned its queue but has not been launched yet
pub(crate) struct PendingWorker<T> {
    pub(crate) receiver: PartitionReceiver<T>,
    pub(crate) func: WorkerFn<T>,
}

impl<T> PendingWorker<T>
where
    T: Send + 'static,
{
    /// Pair each queue with a worker function. If there are fewer functions
    /// than queues, the first function drains the remaining queues.
    ///
    /// **PANIC:** if `funcs` is empty
    pub(crate) fn assign(
        receivers: Vec<PartitionReceiver<T>>,
        funcs: &[WorkerFn<T>],
    ) -> Vec<PendingWorker<T>> {
        receivers
            .into_iter()
            .enumerate()
            .map(|(i, receiver)| PendingWorker {
                receiver,
                func: Arc::clone(funcs.get(i).unwrap_or(&funcs[0])),
            })
            .collect()
    }

    /// Launch this worker on a dedicated thread
    pub(crate) fn spawn(self) -> Result<WorkerHandle, BuildError> {
        let partition = self.receiver.partition();
        let PendingWorker { receiver, func } = self;
        let thread = std::thread::Builder::new()
            .name(format!("splitflow-worker-{partition}"))
            .spawn(move || {
                let _span = span!(Level::INFO, "worker", partition);
                let _span_guard = _span.enter();
                info!("Worker started");
                func(receiver);
                info!("Worker finished");
            })
            .map_err(|source| BuildError::SpawnWorker { partition, source })?;
        Ok(WorkerHandle { partition, thread })
    }
}

/// Handle to a running worker thread
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    pub(crate) partition: usize,
    pub(crate) thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Wait for the worker to return. Returns `false` if it panicked.
    pub(crate) fn join(self) -> bool {
        self.thread.join().is_ok()
    }
}
