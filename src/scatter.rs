//! Fan-out of independent tasks with fail-fast joining.

use std::future::Future;

use futures::future::try_join_all;

use crate::error::Result;

/// Spawn every task, wait for all of them and return their outputs in order.
///
/// The first error observed is returned immediately. Tasks still running at that point are
/// detached rather than cancelled and finish on their own.
pub async fn scatter_gather<I, F, T>(tasks: I) -> Result<Vec<T>>
where
  I: IntoIterator<Item = F>,
  F: Future<Output = Result<T>> + Send + 'static,
  T: Send + 'static,
{
  let handles: Vec<_> = tasks.into_iter().map(tokio::spawn).collect();
  try_join_all(handles.into_iter().map(|handle| async move { handle.await? })).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::BundleError;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::time::Duration;

  #[tokio::test]
  async fn preserves_task_order() {
    let tasks = (0..5u64).map(|index| async move {
      tokio::time::sleep(Duration::from_millis(10 * (5 - index))).await;
      Ok(index)
    });
    assert_eq!(scatter_gather(tasks).await.unwrap(), vec![0, 1, 2, 3, 4]);
  }

  #[tokio::test]
  async fn empty_work_list_succeeds() {
    let tasks: Vec<std::future::Ready<Result<()>>> = Vec::new();
    assert!(scatter_gather(tasks).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn one_failure_fails_the_whole_group() {
    let tasks = (0..4).map(|index| async move {
      if index == 2 {
        Err(BundleError::config("shard 2 failed"))
      } else {
        Ok(index)
      }
    });
    let err = scatter_gather(tasks).await.unwrap_err();
    assert!(err.to_string().contains("shard 2 failed"));
  }

  #[tokio::test]
  async fn siblings_keep_running_after_a_failure() {
    let finished = Arc::new(AtomicBool::new(false));
    let slow_flag = Arc::clone(&finished);

    let slow = Box::pin(async move {
      tokio::time::sleep(Duration::from_millis(50)).await;
      slow_flag.store(true, Ordering::SeqCst);
      Ok(())
    }) as std::pin::Pin<Box<dyn Future<Output = Result<()>> + Send>>;
    let failing = Box::pin(async { Err(BundleError::config("boom")) })
      as std::pin::Pin<Box<dyn Future<Output = Result<()>> + Send>>;

    assert!(scatter_gather(vec![slow, failing]).await.is_err());
    assert!(!finished.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(finished.load(Ordering::SeqCst));
  }
}
