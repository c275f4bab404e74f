//! Send 5% of users to a canary deployment and keep them there.
use splitflow::keyed::Router;

fn main() {
    tracing_subscriber::fmt::init();

    let canary = Router::ratio(5).unwrap();
    let users = (0..1000).map(|i| format!("user-{i}"));
    let on_canary = users.filter(|u| canary.admits(u)).count();
    println!("{on_canary} of 1000 users are on the canary");

    // an A/B/C test with a 20% control group
    let experiment = Router::builder().weights([20, 40, 40]).build().unwrap();
    for user in ["alice", "bob", "carol", "dave"] {
        println!("{user} -> variant {}", experiment.forward(user));
    }
}
