//! Throttled, fail-open result cache.

use super::{ScanError, report};
use crate::source::Clock;
use crate::throttle::Throttle;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::trace;

#[derive(Debug)]
struct State<T> {
    throttle: Throttle,
    succeeded: bool,
    results: T,
}

/// Owns the last good result of some refresh operation and decides when to
/// run that operation again.
///
/// The lock is held from the staleness check until the new result is stored,
/// so concurrent callers either wait for a running refresh or see the state it
/// left behind. They never start a second refresh inside the same window.
pub struct ThrottledScanner<T> {
    name: &'static str,
    clock: Arc<dyn Clock>,
    state: Mutex<State<T>>,
}

impl<T: Clone + Send> ThrottledScanner<T> {
    /// Create a cache holding `initial` until the first successful refresh.
    ///
    /// `name` identifies the source in log messages.
    pub fn new(
        name: &'static str,
        min_interval: Duration,
        clock: Arc<dyn Clock>,
        initial: T,
    ) -> Self {
        Self {
            name,
            clock,
            state: Mutex::new(State {
                throttle: Throttle::new(min_interval),
                succeeded: false,
                results: initial,
            }),
        }
    }

    /// Run `op` if the throttle window has passed.
    ///
    /// `op` receives a copy of the current results and returns the
    /// replacement. On error the current results stay in place and the error is
    /// logged. Returns whether the most recent refresh succeeded; inside the
    /// window that is the status of the previous refresh.
    pub async fn refresh<F, Fut>(&self, op: F) -> bool
    where
        F: FnOnce(T) -> Fut + Send,
        Fut: Future<Output = Result<T, ScanError>> + Send,
    {
        let mut state = self.state.lock().await;

        if !state.throttle.should_refresh(self.clock.now()) {
            trace!("{} refreshed recently, using cached results", self.name);
            return state.succeeded;
        }

        match op(state.results.clone()).await {
            Ok(results) => {
                state.results = results;
                state.succeeded = true;
            }
            Err(err) => {
                report(self.name, &err);
                state.succeeded = false;
            }
        }
        state.succeeded
    }

    /// A copy of the cached results.
    pub async fn results(&self) -> T {
        self.state.lock().await.results.clone()
    }

    /// Read the cached results without copying them.
    pub async fn with_results<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.lock().await.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scanner(clock: Arc<ManualClock>) -> ThrottledScanner<Vec<u32>> {
        ThrottledScanner::new("test", Duration::from_secs(5), clock, Vec::new())
    }

    #[tokio::test]
    async fn test_refresh_stores_results() {
        let clock = Arc::new(ManualClock::new());
        let cache = scanner(clock);

        assert!(cache.refresh(|_| async { Ok(vec![1, 2]) }).await);
        assert_eq!(cache.results().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_refresh_inside_window_is_skipped() {
        let clock = Arc::new(ManualClock::new());
        let cache = scanner(clock.clone());
        let runs = AtomicUsize::new(0);

        let op = |_prev: Vec<u32>| {
            runs.fetch_add(1, Ordering::SeqCst);
            async { Ok(vec![1]) }
        };

        assert!(cache.refresh(op).await);
        clock.advance(Duration::from_secs(1));
        assert!(cache.refresh(op).await);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(5));
        assert!(cache.refresh(op).await);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_results() {
        let clock = Arc::new(ManualClock::new());
        let cache = scanner(clock.clone());

        assert!(cache.refresh(|_| async { Ok(vec![1, 2]) }).await);
        clock.advance(Duration::from_secs(6));

        let failed = cache
            .refresh(|_| async { Err(ScanError::Transport("request timed out".into())) })
            .await;
        assert!(!failed);
        assert_eq!(cache.results().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_window_reports_last_status() {
        let clock = Arc::new(ManualClock::new());
        let cache = scanner(clock.clone());

        assert!(!cache.refresh(|_| async { Err(ScanError::Auth) }).await);
        clock.advance(Duration::from_secs(1));
        // Skipped, but still reports the failure of the refresh that ran.
        assert!(!cache.refresh(|_| async { Ok(vec![9]) }).await);
        assert!(cache.results().await.is_empty());
    }

    #[tokio::test]
    async fn test_op_receives_previous_results() {
        let clock = Arc::new(ManualClock::new());
        let cache = scanner(clock.clone());

        cache.refresh(|_| async { Ok(vec![1]) }).await;
        clock.advance(Duration::from_secs(5));
        cache
            .refresh(|mut prev| async move {
                prev.push(2);
                Ok(prev)
            })
            .await;

        assert_eq!(cache.results().await, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_run_once() {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(scanner(clock));
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let runs = runs.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .refresh(|_| async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(vec![7])
                    })
                    .await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cache.results().await, vec![7]);
    }

    #[tokio::test]
    async fn test_with_results_reads_in_place() {
        let clock = Arc::new(ManualClock::new());
        let cache = scanner(clock);
        cache.refresh(|_| async { Ok(vec![3, 4, 5]) }).await;
        assert_eq!(cache.with_results(|r| r.len()).await, 3);
    }
}
