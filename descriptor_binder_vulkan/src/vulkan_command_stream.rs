/// CommandStream - primary command buffer that binding tables are published to

use ash::vk;
use ash::vk::Handle;
use std::sync::Arc;

use descriptor_binder::binder::{Error, Result};
use descriptor_binder::binder::device::CommandStreamHandle;
use descriptor_binder::binder_error;

use crate::vulkan_context::VulkanContext;

const SOURCE: &str = "binder::vulkan";

/// Vulkan command stream
///
/// Owns one command pool and one primary command buffer. Record between
/// `begin` and `end`, then `submit_and_wait`.
pub struct CommandStream {
    ctx: Arc<VulkanContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
}

impl CommandStream {
    pub fn new(ctx: Arc<VulkanContext>) -> Result<Self> {
        unsafe {
            // Create command pool
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.queue_family())
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| {
                    binder_error!(SOURCE, "Failed to create command pool: {:?}", e);
                    Error::BackendError(format!("Failed to create command pool: {:?}", e))
                })?;

            // Allocate command buffer
            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                result => {
                    binder_error!(SOURCE, "Failed to allocate command buffer: {:?}", result.err());
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(Error::BackendError("Failed to allocate command buffer".to_string()));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer,
                is_recording: false,
            })
        }
    }

    /// Handle the binder records binds into
    pub fn handle(&self) -> CommandStreamHandle {
        CommandStreamHandle::from_raw(self.command_buffer.as_raw())
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Reset and start recording
    pub fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command stream already recording".to_string()));
        }

        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;
        }

        self.is_recording = true;
        Ok(())
    }

    pub fn end(&mut self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command stream not recording".to_string()));
        }

        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;
        }

        self.is_recording = false;
        Ok(())
    }

    /// Submit the recorded commands and block until the GPU is done
    pub fn submit_and_wait(&self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command stream still recording".to_string()));
        }
        self.ctx.submit_and_wait(self.command_buffer)
    }
}

impl Drop for CommandStream {
    fn drop(&mut self) {
        unsafe {
            // Freeing the pool frees its command buffer
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
