//! Cooperative scheduling checkpoints.

use std::future::Future;
use std::task::Poll;

use futures::future;

/// Returns a future that is pending exactly once before completing.
///
/// Awaiting it hands control back to the executor, the same way a test page awaits a resolved
/// promise between cases to let the frame settle.
pub fn yield_now() -> impl Future<Output = ()> {
    let mut yielded = false;
    future::poll_fn(move |cx| {
        if yielded {
            return Poll::Ready(());
        }

        yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    })
}
