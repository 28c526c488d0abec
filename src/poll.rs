//! Cancellable interval polling.
//!
//! A poller runs one tick immediately and then one per period until its
//! [`PollHandle`] is cancelled or dropped. Views own the handle for as long
//! as they are shown, so leaving a view or switching twins always stops the
//! old poller.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default period between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Handle to a running poller.
///
/// Cancelling is idempotent, and dropping the handle cancels the poller.
/// A tick in flight when the handle is cancelled is aborted at its next
/// await point.
#[derive(Debug)]
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop the poller. Calling this more than once has no further effect.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Returns true until the poller has been cancelled.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a poller calling `tick` now and then once every `period`.
///
/// Ticks run one at a time; a slow tick delays the next one rather than
/// piling up. Must be called from within a tokio runtime.
pub fn spawn_poll<F, Fut>(period: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            tick().await;
        }
    });

    PollHandle { task: Some(task) }
}

/// A poller tied to the key it was started for (e.g. a twin id).
#[derive(Debug)]
pub struct KeyedPoll {
    key: String,
    handle: PollHandle,
}

impl KeyedPoll {
    pub fn new(key: impl Into<String>, handle: PollHandle) -> Self {
        Self {
            key: key.into(),
            handle,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_poll(period: Duration) -> (PollHandle, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = spawn_poll(period, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (handle, count)
    }

    /// Let spawned tasks run without moving the paused clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_immediate_then_one_per_period() {
        let (handle, count) = counting_poll(DEFAULT_POLL_INTERVAL);

        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(4999)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        drop(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_cancel() {
        let (mut handle, count) = counting_poll(DEFAULT_POLL_INTERVAL);
        settle().await;
        assert!(handle.is_active());

        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());

        tokio::time::advance(DEFAULT_POLL_INTERVAL * 3).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (handle, count) = counting_poll(Duration::from_secs(1));
        settle().await;
        drop(handle);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keyed_poll_remembers_its_key() {
        let (handle, _) = counting_poll(Duration::from_secs(1));
        let poll = KeyedPoll::new("dtA", handle);
        assert_eq!(poll.key(), "dtA");
        assert!(poll.is_active());
    }
}
