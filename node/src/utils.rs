//! Various functions that are not limited to a particular module, but are too small to warrant
//! being factored out into standalone crates.

mod fuse;
pub mod gossip_list;

pub use fuse::{Fuse, ObservableFuse, ObservableFuseDropSwitch};
pub use gossip_list::{Advance, Element, GossipList};

/// Unregisters a metric from the Prometheus registry.
#[macro_export]
macro_rules! unregister_metric {
    ($registry:expr, $metric:expr) => {
        $registry
            .unregister(Box::new($metric.clone()))
            .unwrap_or_else(|_| {
                tracing::error!(
                    "unregistering {} failed: was not registered",
                    stringify!($metric)
                )
            });
    };
}
