//! Fuses of various kind.
//!
//! A fuse is a boolean flag that can only be set once, but checked any number of times.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::Notify;

/// A one-time settable boolean flag.
pub trait Fuse {
    /// Trigger the fuse.
    fn set(&self);
}

/// A shared fuse that can be observed for change.
///
/// It is similar to a condition var, except it can only bet set once and will immediately return
/// if it was previously set. Long-running waits take one as their cancellation token.
#[derive(Clone, Debug, Default)]
pub struct ObservableFuse(Arc<ObservableFuseInner>);

impl ObservableFuse {
    /// Creates a new sticky fuse.
    ///
    /// The fuse will start out as not set.
    pub fn new() -> Self {
        ObservableFuse::default()
    }

    /// Creates a new sticky fuse drop switch.
    pub fn drop_switch(&self) -> ObservableFuseDropSwitch {
        ObservableFuseDropSwitch(self.clone())
    }

    /// Checks whether the fuse is set.
    pub fn is_set(&self) -> bool {
        self.0.fuse.load(Ordering::SeqCst)
    }

    /// Waits for the fuse to be triggered.
    ///
    /// If the fuse is already set, returns immediately, otherwise waits for the notification.
    ///
    /// The future returned by this function is safe to cancel.
    pub async fn wait(&self) {
        // Note: We will catch all notifications from the point on where `notified()` is called, so
        //       we first construct the future, then check the fuse. Any notification sent while we
        //       were loading will be caught in the `notified.await`.
        let notified = self.0.notify.notified();

        if self.is_set() {
            return;
        }

        notified.await;
    }
}

/// Inner implementation of the `ObservableFuse`.
#[derive(Debug, Default)]
struct ObservableFuseInner {
    /// The fuse to trigger.
    fuse: AtomicBool,
    /// Notification that the fuse has been triggered.
    notify: Notify,
}

impl Fuse for ObservableFuse {
    fn set(&self) {
        self.0.fuse.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }
}

/// A wrapper for an observable fuse that will cause it to be set when dropped.
#[derive(Debug)]
pub struct ObservableFuseDropSwitch(ObservableFuse);

impl Drop for ObservableFuseDropSwitch {
    fn drop(&mut self) {
        self.0.set()
    }
}
