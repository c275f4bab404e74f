//! Error types shared by routers and dispatchers, plus a fail-fast escape hatch for
//! configuration errors.
use thiserror::Error;

/// Errors returned while constructing a [Router](crate::keyed::Router) or a
/// [Dispatcher](crate::runtime::Dispatcher).
///
/// All of these are configuration errors. Construction never hands out a partially
/// usable value when one of them occurs.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configured weights add up to more than 100 percent
    #[error("weights sum to {sum}, which exceeds 100")]
    InvalidWeightSum {
        /// Sum of all configured weights
        sum: u64,
    },
    /// Consumption was requested but no worker function was given
    #[error("dispatcher needs at least one worker function")]
    MissingConsumer,
    /// Worker bucket mode was requested with zero buckets
    #[error("worker bucket count must be at least 1")]
    ZeroWorkerBuckets,
    /// The OS refused to start a worker thread
    #[error("failed to spawn worker thread for partition {partition}")]
    SpawnWorker {
        /// Partition the worker was meant to drain
        partition: usize,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
    /// Loading configuration from the environment failed
    #[error("failed to load configuration from environment")]
    Config(#[from] envconfig::Error),
}

/// Abort the process on non-recoverable configuration errors.
///
/// Routers are usually built once at startup, where the only sensible reaction to
/// a broken traffic split is to stop.
pub trait SplitflowFatal<T, E>: Sized + sealed::Sealed {
    /// Unwrap the value or panic with a full error report.
    fn splitflow_fatal(self) -> T;
}

impl<T, E> SplitflowFatal<T, E> for Result<T, E>
where
    E: std::fmt::Debug + std::error::Error + Send + Sync + 'static,
{
    fn splitflow_fatal(self) -> T {
        match self {
            Ok(x) => x,
            Err(e) => {
                let report = eyre::Report::new(e);
                panic!("{report:?}")
            }
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}
