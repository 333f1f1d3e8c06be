//! Runtime abstraction
//!
//! TigerStyle: All task spawning and time operations go through one explicit
//! seam so timer-driven code stays testable.
//!
//! Aggregation sessions and forwarders are timer-heavy: every session arms a
//! fixed deadline at start, every forwarder a fixed lifetime. Routing those
//! through a `Runtime` trait keeps the business logic independent of how the
//! clock is driven (wall clock in production, tokio's paused clock in tests).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// JoinHandle for spawned tasks
pub type JoinHandle<T> = Pin<Box<dyn Future<Output = Result<T, JoinError>> + Send>>;

/// Error from joining a task
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("task panicked")]
    Panicked,
    #[error("task cancelled")]
    Cancelled,
}

/// Instant in time, in milliseconds since the epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant {
    /// Milliseconds since epoch
    pub millis: u64,
}

impl Instant {
    /// Create a new instant from milliseconds
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Get duration elapsed since this instant
    pub fn elapsed(&self, now: Instant) -> Duration {
        assert!(now.millis >= self.millis, "now must be >= self for elapsed");
        Duration::from_millis(now.millis - self.millis)
    }
}

/// Runtime abstraction trait
///
/// Implementations must schedule spawned tasks concurrently and resume
/// sleepers once their duration has elapsed. The trait is not dyn-safe
/// (spawn is generic); use concrete types as type parameters.
#[async_trait::async_trait]
pub trait Runtime: Send + Sync + Clone {
    /// Get the current instant
    fn now(&self) -> Instant;

    /// Sleep for a duration
    ///
    /// Preconditions:
    /// - duration must be < 1 hour (safety limit)
    async fn sleep(&self, duration: Duration);

    /// Yield control to the scheduler
    async fn yield_now(&self);

    /// Spawn a new task running concurrently with the current one
    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static;
}

// =============================================================================
// TokioRuntime (Production)
// =============================================================================

/// Production runtime backed by tokio
#[derive(Debug, Clone)]
pub struct TokioRuntime;

#[async_trait::async_trait]
impl Runtime for TokioRuntime {
    fn now(&self) -> Instant {
        let since_epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Instant::from_millis(since_epoch.as_millis() as u64)
    }

    async fn sleep(&self, duration: Duration) {
        assert!(
            duration < Duration::from_secs(3600),
            "sleep duration too long (>1 hour)"
        );
        tokio::time::sleep(duration).await;
    }

    async fn yield_now(&self) {
        tokio::task::yield_now().await;
    }

    fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = tokio::spawn(future);
        Box::pin(async move {
            handle.await.map_err(|e| {
                if e.is_panic() {
                    JoinError::Panicked
                } else {
                    JoinError::Cancelled
                }
            })
        })
    }
}

/// Type alias for the runtime used when none is chosen explicitly
pub type CurrentRuntime = TokioRuntime;

/// Get the current runtime instance
pub fn current_runtime() -> TokioRuntime {
    TokioRuntime
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tokio_runtime_sleep() {
        let runtime = TokioRuntime;
        let start = runtime.now();

        runtime.sleep(Duration::from_millis(10)).await;

        let elapsed = start.elapsed(runtime.now());
        assert!(
            elapsed >= Duration::from_millis(10),
            "Should sleep for at least 10ms"
        );
    }

    #[tokio::test]
    async fn test_tokio_runtime_spawn() {
        let runtime = TokioRuntime;

        let handle = runtime.spawn(async { 42 });

        let result = handle.await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_tokio_runtime_yield() {
        let runtime = TokioRuntime;
        // Must not deadlock or panic.
        runtime.yield_now().await;
    }
}
