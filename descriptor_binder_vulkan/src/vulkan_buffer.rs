/// VulkanBuffer - gpu-allocator backed buffer implementing the Buffer trait

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use descriptor_binder::binder::{Error, Result};
use descriptor_binder::binder::device::{Buffer, BufferHandle};
use descriptor_binder::{binder_err, binder_error};

use crate::vulkan_context::VulkanContext;

const SOURCE: &str = "binder::vulkan";

/// How a buffer will be accessed through bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Uniform,
    Storage,
    UniformTexel,
    StorageTexel,
}

impl BufferUsage {
    fn to_vk(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
            BufferUsage::UniformTexel => vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER,
            BufferUsage::StorageTexel => vk::BufferUsageFlags::STORAGE_TEXEL_BUFFER,
        }
    }
}

/// Vulkan buffer implementation (host visible)
pub struct VulkanBuffer {
    ctx: Arc<VulkanContext>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl VulkanBuffer {
    /// Create a CPU-writable buffer of `size` bytes
    pub fn new(ctx: Arc<VulkanContext>, size: u64, usage: BufferUsage) -> Result<Self> {
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage.to_vk() | vk::BufferUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&buffer_create_info, None)
                .map_err(|e| binder_err!(SOURCE, "Failed to create buffer of size {} bytes: {:?}", size, e))?;

            // Allocate memory
            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocated = match ctx.allocator.lock() {
                Ok(mut allocator) => allocator
                    .allocate(&AllocationCreateDesc {
                        name: "binder buffer",
                        requirements,
                        location: MemoryLocation::CpuToGpu,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_e| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        binder_error!(SOURCE, "Out of GPU memory for buffer (required: {:.2} MB)", size_mb);
                        Error::OutOfMemory
                    }),
                Err(_) => Err(binder_err!(SOURCE, "Allocator mutex poisoned")),
            };

            let allocation = match allocated {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            // Bind memory
            if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                ctx.device.destroy_buffer(buffer, None);
                return Err(binder_err!(SOURCE, "Failed to bind buffer memory: {:?}", e));
            }

            Ok(Self {
                ctx,
                buffer,
                allocation: Some(allocation),
                size,
            })
        }
    }

    /// Copy `data` into the buffer at `offset`
    pub fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(Error::InvalidRange {
                offset,
                range: data.len() as u64,
                size: self.size,
            });
        }

        let allocation = match &self.allocation {
            Some(allocation) => allocation,
            None => {
                binder_error!(SOURCE, "Buffer update failed: no GPU allocation");
                return Err(Error::BackendError("Buffer has no allocation".to_string()));
            }
        };

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    /// Read `len` bytes back from the buffer at `offset`
    pub fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let end = offset.checked_add(len as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(Error::InvalidRange { offset, range: len as u64, size: self.size });
        }

        let slice = self
            .allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_slice())
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?;

        Ok(slice[offset as usize..offset as usize + len].to_vec())
    }

    /// Native Vulkan buffer
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.buffer
    }
}

impl Buffer for VulkanBuffer {
    fn handle(&self) -> BufferHandle {
        BufferHandle::from_raw(self.buffer.as_raw())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
