//! Spread a stream of events over 4 workers. Events with the same key always
//! land on the same worker, in the order they were pushed.
use splitflow::runtime::{Dispatcher, PartitionReceiver};

fn main() {
    tracing_subscriber::fmt::init();

    let dispatcher = Dispatcher::<(String, u32)>::builder()
        .worker_buckets(4)
        .queue_capacity(16)
        .worker(|rx: PartitionReceiver<(String, u32)>| {
            let partition = rx.partition();
            for (account, amount) in rx {
                println!("worker {partition}: {account} += {amount}");
            }
        })
        .build()
        .unwrap();

    for i in 0..40u32 {
        let account = format!("account-{}", i % 7);
        let depth = dispatcher.push(&account, (account.clone(), i)).unwrap();
        if depth > 8 {
            println!("queue for {account} is filling up: {depth}");
        }
    }
    dispatcher.shutdown().unwrap();
}
