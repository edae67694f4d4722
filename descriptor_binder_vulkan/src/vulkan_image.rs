/// VulkanImage - gpu-allocator backed image implementing the Image trait

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use descriptor_binder::binder::{Error, Result};
use descriptor_binder::binder::device::{Format, Image, ImageHandle, ImageType};
use descriptor_binder::{binder_err, binder_error};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{format_to_vk, image_type_from_vk, image_type_to_vk};

const SOURCE: &str = "binder::vulkan";

/// How an image will be accessed through bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageUsage {
    /// Storage image (read/write from shaders)
    Storage,
    /// Sampled image
    Sampled,
    /// Both
    StorageAndSampled,
}

impl ImageUsage {
    fn to_vk(self) -> vk::ImageUsageFlags {
        let base = vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::TRANSFER_SRC;
        match self {
            ImageUsage::Storage => base | vk::ImageUsageFlags::STORAGE,
            ImageUsage::Sampled => base | vk::ImageUsageFlags::SAMPLED,
            ImageUsage::StorageAndSampled => {
                base | vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::SAMPLED
            }
        }
    }
}

/// Image creation descriptor
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    /// Depth for 3D images (1 otherwise)
    pub depth: u32,
    pub format: Format,
    pub image_type: ImageType,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub usage: ImageUsage,
}

impl ImageDesc {
    /// Single-level, single-layer 2D storage image
    pub fn storage_2d(width: u32, height: u32, format: Format) -> Self {
        Self {
            width,
            height,
            depth: 1,
            format,
            image_type: ImageType::Type2D,
            mip_levels: 1,
            array_layers: 1,
            usage: ImageUsage::Storage,
        }
    }
}

/// Vulkan image implementation
pub struct VulkanImage {
    ctx: Arc<VulkanContext>,
    image: vk::Image,
    allocation: Option<Allocation>,
    desc: ImageDesc,
}

impl VulkanImage {
    /// Create an image in device-local memory
    ///
    /// Square 2D images with at least six layers are created cube compatible.
    pub fn new(ctx: Arc<VulkanContext>, desc: ImageDesc) -> Result<Self> {
        let mip_levels = desc.mip_levels.max(1);
        let array_layers = desc.array_layers.max(1);
        let desc = ImageDesc { mip_levels, array_layers, ..desc };

        let mut flags = vk::ImageCreateFlags::empty();
        if desc.image_type == ImageType::Type2D && array_layers >= 6 && desc.width == desc.height {
            flags |= vk::ImageCreateFlags::CUBE_COMPATIBLE;
        }

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .flags(flags)
                .image_type(image_type_to_vk(desc.image_type))
                .format(format_to_vk(desc.format))
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: desc.depth.max(1),
                })
                .mip_levels(mip_levels)
                .array_layers(array_layers)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(desc.usage.to_vk())
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| binder_err!(SOURCE, "Failed to create image: {:?}", e))?;

            // Allocate memory
            let requirements = ctx.device.get_image_memory_requirements(image);

            let allocated = match ctx.allocator.lock() {
                Ok(mut allocator) => allocator
                    .allocate(&AllocationCreateDesc {
                        name: "binder image",
                        requirements,
                        location: MemoryLocation::GpuOnly,
                        linear: false,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        binder_error!(
                            SOURCE,
                            "Out of GPU memory for image (size: {}x{}x{}, layers: {}, {:.2} MB)",
                            desc.width, desc.height, desc.depth, array_layers, size_mb
                        );
                        Error::OutOfMemory
                    }),
                Err(_) => Err(binder_err!(SOURCE, "Allocator mutex poisoned")),
            };

            let allocation = match allocated {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                ctx.device.destroy_image(image, None);
                return Err(binder_err!(SOURCE, "Failed to bind image memory: {:?}", e));
            }

            Ok(Self {
                ctx,
                image,
                allocation: Some(allocation),
                desc,
            })
        }
    }

    /// Native Vulkan image
    pub fn vk_image(&self) -> vk::Image {
        self.image
    }

    /// Descriptor the image was created with
    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }
}

impl Image for VulkanImage {
    fn handle(&self) -> ImageHandle {
        ImageHandle::from_raw(self.image.as_raw())
    }

    fn format(&self) -> Format {
        self.desc.format
    }

    fn image_type(&self) -> ImageType {
        self.desc.image_type
    }

    fn mip_levels(&self) -> u32 {
        self.desc.mip_levels
    }

    fn array_layers(&self) -> u32 {
        self.desc.array_layers
    }
}

/// Image owned elsewhere (another allocator, an interop layer)
///
/// Only describes the image for view creation; never destroys it.
#[derive(Debug, Clone, Copy)]
pub struct ExternalImage {
    image: vk::Image,
    format: Format,
    image_type: ImageType,
    mip_levels: u32,
    array_layers: u32,
}

impl ExternalImage {
    /// Describe a native image. Unknown `image_type` values are kept raw, so
    /// attaching the image without an explicit view type fails.
    pub fn new(
        image: vk::Image,
        format: Format,
        image_type: vk::ImageType,
        mip_levels: u32,
        array_layers: u32,
    ) -> Self {
        Self {
            image,
            format,
            image_type: image_type_from_vk(image_type),
            mip_levels,
            array_layers,
        }
    }
}

impl Image for ExternalImage {
    fn handle(&self) -> ImageHandle {
        ImageHandle::from_raw(self.image.as_raw())
    }

    fn format(&self) -> Format {
        self.format
    }

    fn image_type(&self) -> ImageType {
        self.image_type
    }

    fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    fn array_layers(&self) -> u32 {
        self.array_layers
    }
}

impl Drop for VulkanImage {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the image
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_image(self.image, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_image_tests.rs"]
mod tests;
