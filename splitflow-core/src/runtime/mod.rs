//! Runtimes own partition queues and the worker threads draining them.
mod dispatcher;
mod queue;
mod worker;

pub use dispatcher::{Dispatcher, DispatcherBuilder, PushError, ShutdownError};
pub use queue::{Closed, PartitionReceiver};
pub use worker::WorkerFn;
