//! Helpers for testing routers and dispatchers
use std::time::{Duration, Instant};

use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};

use crate::runtime::PartitionReceiver;

mod vec_sink;

pub(crate) use vec_sink::VecSink;

/// Generate `count` random alphanumeric keys. The same seed always yields the
/// same keys.
pub(crate) fn random_keys(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.gen_range(4..24);
            (&mut rng)
                .sample_iter(Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        })
        .collect()
}

/// Worker putting every item it receives into the sink
pub(crate) fn collecting_worker<T: Send + 'static>(
    sink: VecSink<T>,
) -> impl Fn(PartitionReceiver<T>) + Send + Sync + 'static {
    move |rx: PartitionReceiver<T>| {
        for item in rx {
            sink.give(item)
        }
    }
}

/// Worker putting every item it receives into the sink, together with its
/// partition
pub(crate) fn tagging_worker<T: Send + 'static>(
    sink: VecSink<(usize, T)>,
) -> impl Fn(PartitionReceiver<T>) + Send + Sync + 'static {
    move |rx: PartitionReceiver<T>| {
        let partition = rx.partition();
        for item in rx {
            sink.give((partition, item))
        }
    }
}

/// Worker which takes one item off its queue for every message on `gate`.
/// It returns once `gate` or the queue is closed.
pub(crate) fn gated_worker<T: Send + 'static>(
    gate: flume::Receiver<()>,
    sink: VecSink<T>,
) -> impl Fn(PartitionReceiver<T>) + Send + Sync + 'static {
    move |rx: PartitionReceiver<T>| {
        while gate.recv().is_ok() {
            match rx.recv() {
                Some(item) => sink.give(item),
                None => break,
            }
        }
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub(crate) fn wait_until(condition: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_collector() {
        let col = VecSink::new();
        let col_a = col.clone();

        for i in 0..5 {
            col.give(i)
        }

        // the cloned one should return these values
        let collected = col_a.drain_vec(..);
        assert_eq!(collected, (0..5).collect::<Vec<_>>());
        assert!(col.is_empty());
    }

    #[test]
    fn random_keys_are_reproducible() {
        assert_eq!(random_keys(50, 7), random_keys(50, 7));
        assert_ne!(random_keys(50, 7), random_keys(50, 8));
    }
}
