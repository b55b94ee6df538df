use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::{Scheduler, Trigger};

/// Runs every trigger on its own wall-clock schedule.
///
/// Each trigger gets a tokio task that sleeps until the next fire time,
/// runs the tick and logs its report. A failed tick is logged and the
/// loop waits for the next slot; missed slots are not replayed.
pub struct SchedulerService {
    scheduler: Arc<Scheduler>,
}

impl SchedulerService {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    /// Spawns one task per trigger and returns immediately.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        Trigger::ALL
            .into_iter()
            .map(|trigger| {
                let scheduler = Arc::clone(&self.scheduler);
                tokio::spawn(async move {
                    Self::run_trigger_loop(scheduler, trigger).await;
                })
            })
            .collect()
    }

    async fn run_trigger_loop(scheduler: Arc<Scheduler>, trigger: Trigger) {
        let mut last_fired = None;
        loop {
            let now = Utc::now();
            let next = next_slot(trigger, now, last_fired);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!("Next {} run at {}", trigger.name(), next);

            tokio::time::sleep(wait).await;
            last_fired = Some(next);

            if let Err(e) = scheduler.run(trigger).await {
                tracing::error!("Job '{}' failed: {}", trigger.name(), e);
            }
        }
    }
}

/// Next fire time after `now`, never at or before the slot that already ran.
///
/// The sleep is measured on the monotonic clock, so on wake-up the wall
/// clock can still read a moment before the slot it just fired.
fn next_slot(
    trigger: Trigger,
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let after = match last_fired {
        Some(last) => now.max(last),
        None => now,
    };
    trigger.next_fire(after)
}
