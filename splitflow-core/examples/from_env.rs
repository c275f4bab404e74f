//! Configure the split via environment variables, e.g.
//! `SPLITFLOW_WEIGHTS=10,90 SPLITFLOW_QUEUE_CAPACITY=32 cargo run --example from_env`
use std::sync::Arc;

use splitflow::config::SplitConfig;
use splitflow::errorhandling::SplitflowFatal as _;
use splitflow::runtime::{Dispatcher, PartitionReceiver, WorkerFn};

fn main() {
    tracing_subscriber::fmt::init();

    let config = SplitConfig::from_env().splitflow_fatal();
    println!("{config:?}");

    let worker: WorkerFn<u64> = Arc::new(|rx: PartitionReceiver<u64>| {
        let partition = rx.partition();
        let total: u64 = rx.into_iter().sum();
        println!("partition {partition} total {total}");
    });
    let dispatcher = Dispatcher::from_config(&config, [worker]).splitflow_fatal();
    for i in 0..1000u64 {
        dispatcher.push(&format!("request-{i}"), i).unwrap();
    }
    dispatcher.shutdown().unwrap();
}
