use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::memory::MemoryCredentialStore;

/// Spawn the periodic expiry sweep. Runs independently of request
/// handling for the life of the process.
pub fn spawn_sweeper(store: MemoryCredentialStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let (codes, links) = store.sweep();
            if codes + links > 0 {
                tracing::debug!(codes, links, "swept expired credentials");
            }
        }
    })
}
