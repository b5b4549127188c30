//! Task spawning and timers for the single-threaded event loop.

use futures::future::{AbortHandle, LocalBoxFuture, abortable};
use std::future::Future;
use std::time::Duration;

/// Runs `'static` non-`Send` futures on the local event loop.
pub trait Executor {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Owned handle to a background task. The task is cancelled by [`TaskHandle::cancel`],
/// not by dropping the handle.
#[derive(Debug, Clone)]
pub struct TaskHandle(AbortHandle);

impl TaskHandle {
    pub fn cancel(&self) {
        self.0.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_aborted()
    }
}

pub fn spawn_task<F>(executor: &dyn Executor, future: F) -> TaskHandle
where
    F: Future<Output = ()> + 'static,
{
    let (task, handle) = abortable(future);
    executor.spawn_local(Box::pin(async move {
        let _ = task.await;
    }));
    TaskHandle(handle)
}

/// Executor for a tokio `LocalSet`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioExecutor;

#[cfg(not(target_arch = "wasm32"))]
impl Executor for TokioExecutor {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(future);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}
