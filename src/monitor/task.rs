//! Work unit contract for the polling loop.

use std::future::Future;

use async_trait::async_trait;

use crate::error::Result;
use crate::ratelimit::RateFeedback;

/// One unit of remote work, invoked once per loop iteration.
///
/// Implementations perform a single API call and hand back the quota
/// feedback from the response. Retry policy belongs to the monitor
/// (fail-fast, no retry); tasks must not retry internally.
#[async_trait]
pub trait MonitorTask: Send + Sync {
    async fn run(&self) -> Result<RateFeedback>;
}

/// Adapter so plain async closures can serve as monitor tasks.
pub struct TaskFn<F>(pub F);

#[async_trait]
impl<F, Fut> MonitorTask for TaskFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<RateFeedback>> + Send,
{
    async fn run(&self) -> Result<RateFeedback> {
        (self.0)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_as_task() {
        let task = TaskFn(|| async {
            Ok(RateFeedback {
                used: 1,
                remaining: 99,
                reset_seconds: 60,
            })
        });

        let feedback = task.run().await.unwrap();
        assert_eq!(feedback.remaining, 99);
    }
}
