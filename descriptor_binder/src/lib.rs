/*!
# Descriptor Binder

Per-pipeline binding table helper for explicit GPU APIs.

A `BindHelper` sizes one binding pool exactly from a pipeline's reflected
bindings, allocates one binding table per set on first use, creates the
transient image and buffer views its attachments need, publishes the tables
to a command stream, and releases the pool and every view when dropped.

## Architecture

- **BindingDevice**: Device surface the binder drives (pools, tables, views, writes, binds)
- **PipelineLayout**: Declared set layouts plus the reflection they were built from
- **Image / Buffer**: Caller-owned resources attached to slots
- **BindingPool**: Exactly-sized pool with lazy per-set tables
- **ViewTracker**: Ordered record of transient views
- **BindHelper**: Attachment API and commit protocol

Backend implementations (Vulkan) provide concrete types for these traits.
*/

// Internal modules
mod error;
mod diagnostics;
pub mod log;
pub mod device;
pub mod helper;

// Main binder namespace module
pub mod binder {
    // Error types
    pub use crate::error::{Error, Result};

    // Global logger access
    pub use crate::diagnostics::Binder;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device sub-module with handles, resource traits and the device trait
    pub mod device {
        pub use crate::device::*;
    }

    // Helper sub-module
    pub mod helper {
        pub use crate::helper::*;
    }
}
