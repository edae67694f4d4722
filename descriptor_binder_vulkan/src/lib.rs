/*!
# Descriptor Binder - Vulkan Backend

Vulkan implementation of the descriptor binder device surface.

This crate implements the `descriptor_binder` traits using the Ash library for
Vulkan bindings, gpu-allocator for memory management and spirq for SPIR-V
reflection. The context is headless: no window, surface or swapchain.

# Example

```no_run
use std::sync::Arc;
use descriptor_binder::binder::device::{BindPoint, Config, Format, ShaderStageFlags};
use descriptor_binder::binder::helper::BindHelper;
use descriptor_binder_vulkan::{
    reflect_spirv, CommandStream, ImageDesc, VulkanContext, VulkanImage, VulkanPipelineLayout,
};

# fn run(spirv: &[u32]) -> descriptor_binder::binder::Result<()> {
let ctx = VulkanContext::new(Config::default())?;
let reflection = reflect_spirv(spirv, ShaderStageFlags::COMPUTE)?;
let layout = Arc::new(VulkanPipelineLayout::new(ctx.clone(), reflection, BindPoint::Compute)?);
let target = VulkanImage::new(ctx.clone(), ImageDesc::storage_2d(256, 256, Format::R8G8B8A8_UNORM))?;

let mut stream = CommandStream::new(ctx.clone())?;
stream.begin()?;
let mut helper = BindHelper::new(ctx.clone(), layout)?;
helper.set_storage_image(0, 0, &target, None, None)?;
helper.commit(stream.handle());
stream.end()?;
stream.submit_and_wait()?;
# Ok(())
# }
```
*/

mod vulkan_context;
mod vulkan_format;
mod vulkan_image;
mod vulkan_buffer;
mod vulkan_sampler;
mod vulkan_reflection;
mod vulkan_pipeline_layout;
mod vulkan_command_stream;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_context::VulkanContext;
pub use vulkan_image::{VulkanImage, ExternalImage, ImageDesc, ImageUsage};
pub use vulkan_buffer::{VulkanBuffer, BufferUsage};
pub use vulkan_sampler::{SamplerCache, SamplerType};
pub use vulkan_reflection::{reflect_spirv, reflect_spirv_bytes, spirv_words};
pub use vulkan_pipeline_layout::VulkanPipelineLayout;
pub use vulkan_command_stream::CommandStream;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report};
