use futures::future::LocalBoxFuture;
use huddle_client::Executor;
use std::time::Duration;
use wasm_bindgen_futures::JsFuture;

/// Runs tasks on the browser microtask queue; timers use `setTimeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmExecutor;

impl Executor for WasmExecutor {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
            }
        });
        Box::pin(async move {
            let _ = JsFuture::from(promise).await;
        })
    }
}
