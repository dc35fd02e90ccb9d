//! Fixed-interval polling loop shared by both watchers.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// A unit of periodic work.
///
/// `tick` must handle its own errors; the loop never stops because a
/// tick failed.
pub trait PeriodicTask: Send {
    /// Name used in log lines.
    fn name(&self) -> &'static str;

    /// Performs one poll.
    fn tick(&mut self) -> impl Future<Output = ()> + Send;
}

/// Runs `task` every `every` until `shutdown` turns `true` or its sender
/// is dropped.
///
/// The first tick fires immediately. Ticks never overlap: a slow tick
/// delays the next one instead of queueing extra ticks behind it.
pub async fn run_periodic<T: PeriodicTask>(
    mut task: T,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(task = task.name(), every_secs = every.as_secs_f64(), "watcher started");

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = interval.tick() => task.tick().await,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!(task = task.name(), "watcher stopped");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counter {
        ticks: Arc<AtomicUsize>,
        stop_after: usize,
        shutdown: watch::Sender<bool>,
    }

    impl PeriodicTask for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn tick(&mut self) {
            let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                let _ = self.shutdown.send(true);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_until_shutdown() {
        let (tx, rx) = watch::channel(false);
        let ticks = Arc::new(AtomicUsize::new(0));
        let task = Counter {
            ticks: Arc::clone(&ticks),
            stop_after: 3,
            shutdown: tx,
        };

        run_periodic(task, Duration::from_secs(1), rx).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        let (inner_tx, _inner_rx) = watch::channel(false);
        let ticks = Arc::new(AtomicUsize::new(0));
        let task = Counter {
            ticks: Arc::clone(&ticks),
            stop_after: usize::MAX,
            shutdown: inner_tx,
        };

        let handle = tokio::spawn(run_periodic(task, Duration::from_secs(60), rx));
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(tx);
        let Ok(()) = handle.await else {
            panic!("loop task panicked");
        };
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_signalled_shutdown_skips_ticks() {
        let (tx, rx) = watch::channel(true);
        let ticks = Arc::new(AtomicUsize::new(0));
        let task = Counter {
            ticks: Arc::clone(&ticks),
            stop_after: usize::MAX,
            shutdown: tx,
        };
        run_periodic(task, Duration::from_millis(10), rx).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
