/// BindingDevice trait - the device/dispatch surface the binder drives
///
/// The binder never owns the device. Many helpers share one device through
/// `Arc<dyn BindingDevice>`; each helper owns only the pool and views it
/// creates through it.

use crate::device::{
    BindingKind, PoolSize, BindPoint, Format, ImageLayout, ImageViewType, SubresourceRange,
    PoolHandle, TableHandle, SetLayoutHandle, PipelineLayoutHandle, ImageHandle,
    ImageViewHandle, BufferHandle, BufferViewHandle, SamplerHandle, CommandStreamHandle,
};
use crate::error::Result;

// ============================================================================
// Descriptors
// ============================================================================

/// Descriptor for creating a binding pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPoolDesc {
    /// Maximum number of tables the pool can hand out
    pub max_tables: u32,
    /// Descriptor capacity per kind
    pub sizes: Vec<PoolSize>,
}

/// Descriptor for creating an image view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageViewDesc {
    /// Image the view refers to
    pub image: ImageHandle,
    /// View shape
    pub view_type: ImageViewType,
    /// View format (the image's own format)
    pub format: Format,
    /// Mip levels and layers addressed by the view
    pub subresource_range: SubresourceRange,
}

/// Descriptor for creating a texel buffer view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferViewDesc {
    /// Buffer the view refers to
    pub buffer: BufferHandle,
    /// Texel format
    pub format: Format,
    /// Offset in bytes
    pub offset: u64,
    /// Range in bytes (or `WHOLE_SIZE`)
    pub range: u64,
}

/// Kind-specific content of one slot write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPayload {
    /// Image (storage, sampled, or combined with a sampler)
    Image {
        /// View created for this binding
        view: ImageViewHandle,
        /// Layout the image will be in when accessed
        layout: ImageLayout,
        /// Sampler for combined image samplers
        sampler: Option<SamplerHandle>,
    },
    /// Standalone sampler
    Sampler(SamplerHandle),
    /// Uniform or storage buffer range
    Buffer {
        /// Buffer
        buffer: BufferHandle,
        /// Offset in bytes
        offset: u64,
        /// Range in bytes (or `WHOLE_SIZE`)
        range: u64,
    },
    /// Texel buffer view
    TexelBuffer(BufferViewHandle),
}

/// A single-descriptor write into one slot of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingWrite {
    /// Destination table
    pub table: TableHandle,
    /// Destination binding index
    pub binding: u32,
    /// Descriptor kind
    pub kind: BindingKind,
    /// Kind-specific content
    pub payload: BindingPayload,
}

// ============================================================================
// BindingDevice trait
// ============================================================================

/// Device entry points used by the binder
///
/// Implemented by backends (e.g., VulkanContext). Every fallible call reports
/// device failures through the crate `Error`; the binder propagates them
/// without retrying.
pub trait BindingDevice: Send + Sync {
    /// Create a pool able to serve `desc.max_tables` tables and every size in `desc.sizes`
    fn create_binding_pool(&self, desc: &BindingPoolDesc) -> Result<PoolHandle>;

    /// Destroy a pool, implicitly freeing every table allocated from it
    fn destroy_binding_pool(&self, pool: PoolHandle);

    /// Allocate one table shaped by `layout` from `pool`
    fn allocate_binding_table(&self, pool: PoolHandle, layout: SetLayoutHandle) -> Result<TableHandle>;

    /// Create an image view
    fn create_image_view(&self, desc: &ImageViewDesc) -> Result<ImageViewHandle>;

    /// Destroy an image view
    fn destroy_image_view(&self, view: ImageViewHandle);

    /// Create a texel buffer view
    fn create_buffer_view(&self, desc: &BufferViewDesc) -> Result<BufferViewHandle>;

    /// Destroy a texel buffer view
    fn destroy_buffer_view(&self, view: BufferViewHandle);

    /// Write one slot of one table
    fn write_binding(&self, write: &BindingWrite);

    /// Record a bind of `table` at `set` into `stream`
    fn bind_binding_table(
        &self,
        stream: CommandStreamHandle,
        bind_point: BindPoint,
        layout: PipelineLayoutHandle,
        set: u32,
        table: TableHandle,
    );
}
