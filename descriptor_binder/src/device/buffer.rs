/// Buffer trait

use crate::device::BufferHandle;

/// Range value meaning "from offset to the end of the buffer"
pub const WHOLE_SIZE: u64 = u64::MAX;

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., VulkanBuffer).
/// Buffers are owned by the caller and must outlive any command stream
/// their bindings are published to.
pub trait Buffer: Send + Sync {
    /// Native buffer handle
    fn handle(&self) -> BufferHandle;

    /// Size in bytes
    fn size(&self) -> u64;
}
