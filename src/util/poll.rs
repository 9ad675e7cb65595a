use std::future::Future;

use tokio::runtime::Handle;

/// Drives `future` to completion on the calling thread.
///
/// The runtime behind `handle` provides the reactor and timers the SDK needs,
/// while the calling thread parks until the future is ready. This works from
/// plain threads as well as from inside another runtime's blocking pool.
pub fn poll_until_ready<Fut>(handle: &Handle, future: Fut) -> Fut::Output
where
    Fut: Future,
{
    let _guard = handle.enter();
    futures::executor::block_on(future)
}
