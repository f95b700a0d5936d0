//! Sequential batches of concurrent tasks with per-task panic isolation.

use futures_util::FutureExt;
use futures_util::future::join_all;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<R> {
    Completed(R),
    /// The task panicked; siblings were unaffected.
    Panicked(String),
}

impl<R> TaskOutcome<R> {
    pub fn completed(self) -> Option<R> {
        match self {
            TaskOutcome::Completed(value) => Some(value),
            TaskOutcome::Panicked(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    batch_size: usize,
    delay: Duration,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay,
        }
    }

    /// Runs `task` over `items`, `batch_size` at a time.
    ///
    /// A batch starts only after the previous one fully settled, with `delay`
    /// in between. Outcomes are returned in input order.
    pub async fn run<I, F, Fut, R>(&self, items: Vec<I>, task: F) -> Vec<TaskOutcome<R>>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = R>,
    {
        let total_batches = items.len().div_ceil(self.batch_size);
        let mut outcomes = Vec::with_capacity(items.len());

        for (index, batch) in items.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            debug!(
                "BatchScheduler: Batch {}/{} ({} tasks)",
                index + 1,
                total_batches,
                batch.len()
            );

            let futures = batch
                .iter()
                .cloned()
                .map(|item| AssertUnwindSafe(task(item)).catch_unwind());

            for result in join_all(futures).await {
                outcomes.push(match result {
                    Ok(value) => TaskOutcome::Completed(value),
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!("BatchScheduler: Task panicked: {}", message);
                        TaskOutcome::Panicked(message)
                    }
                });
            }
        }

        outcomes
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_outcomes_in_input_order() {
        let scheduler = BatchScheduler::new(3, Duration::ZERO);
        let outcomes = scheduler
            .run((1..=7).collect(), |n: u32| async move { n * 10 })
            .await;

        let values: Vec<u32> = outcomes.into_iter().filter_map(TaskOutcome::completed).collect();
        assert_eq!(values, vec![10, 20, 30, 40, 50, 60, 70]);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_abort_siblings() {
        let scheduler = BatchScheduler::new(4, Duration::ZERO);
        let outcomes = scheduler
            .run(vec![1, 2, 3, 4], |n: u32| async move {
                if n == 2 {
                    panic!("boom on {}", n);
                }
                n
            })
            .await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0], TaskOutcome::Completed(1));
        assert_eq!(outcomes[1], TaskOutcome::Panicked("boom on 2".to_string()));
        assert_eq!(outcomes[2], TaskOutcome::Completed(3));
        assert_eq!(outcomes[3], TaskOutcome::Completed(4));
    }

    #[tokio::test]
    async fn test_batches_are_bounded_and_sequential() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let scheduler = BatchScheduler::new(2, Duration::ZERO);

        scheduler
            .run((0..6).collect::<Vec<u32>>(), |_| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_batches() {
        let scheduler = BatchScheduler::new(2, Duration::from_millis(200));
        let started = Instant::now();

        scheduler.run(vec![1, 2, 3, 4, 5], |n: u32| async move { n }).await;

        // Three batches, two gaps
        assert_eq!(started.elapsed(), Duration::from_millis(400));
    }
}
