//! Splitflow deterministically splits keyed traffic into weighted partitions and
//! optionally hands every partition to its own worker through a bounded queue.
//!
//! Use a [Router](keyed::Router) for pure routing decisions (A/B assignment,
//! canary rollouts, sampling) and a [Dispatcher](runtime::Dispatcher) to fan work
//! out to parallel consumers.
pub mod config;
pub mod errorhandling;
pub mod keyed;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testing;
