/// Opaque backend handles
///
/// Backend objects (descriptor pools, descriptor sets, image views, ...) cross
/// the backend-agnostic layer as `u64` newtypes. The Vulkan backend converts
/// them with `ash::vk::Handle::{as_raw, from_raw}`.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u64);

        impl $name {
            /// The null handle
            pub const NULL: Self = Self(0);

            /// Wrap a raw backend handle
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw backend handle
            pub const fn as_raw(self) -> u64 {
                self.0
            }

            /// True for the null handle
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

define_handle!(
    /// Pool from which binding tables are allocated (VkDescriptorPool)
    PoolHandle
);
define_handle!(
    /// One allocated binding table (VkDescriptorSet)
    TableHandle
);
define_handle!(
    /// Shape of a binding table (VkDescriptorSetLayout)
    SetLayoutHandle
);
define_handle!(
    /// Pipeline layout the tables are bound against (VkPipelineLayout)
    PipelineLayoutHandle
);
define_handle!(
    /// Image (VkImage)
    ImageHandle
);
define_handle!(
    /// Image view (VkImageView)
    ImageViewHandle
);
define_handle!(
    /// Buffer (VkBuffer)
    BufferHandle
);
define_handle!(
    /// Texel buffer view (VkBufferView)
    BufferViewHandle
);
define_handle!(
    /// Sampler (VkSampler)
    SamplerHandle
);
define_handle!(
    /// Command stream the bindings are published to (VkCommandBuffer)
    CommandStreamHandle
);
