/// Helper module - per-pipeline pool, transient views and the attachment API

pub mod binding_pool;
pub mod view_tracker;
pub mod bind_helper;

pub use binding_pool::BindingPool;
pub use view_tracker::{ViewTracker, TransientView, TransientHandle};
pub use bind_helper::{BindHelper, HelperState};
