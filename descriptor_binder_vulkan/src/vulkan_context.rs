/// VulkanContext - headless Vulkan device implementing BindingDevice
///
/// Owns the instance, the logical device, one compute-capable queue, the GPU
/// memory allocator and the optional debug messenger. Images, buffers,
/// samplers, pipeline layouts and command streams keep an `Arc` to it, so the
/// device is only destroyed once every object created from it is gone.

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use descriptor_binder::binder::{Error, Result};
use descriptor_binder::binder::device::{
    BindingDevice, BindingPoolDesc, BindingPayload, BindingWrite, BufferViewDesc, ImageViewDesc,
    BindPoint, Config, PoolHandle, TableHandle, SetLayoutHandle, PipelineLayoutHandle,
    ImageViewHandle, BufferViewHandle, CommandStreamHandle,
};
use descriptor_binder::{binder_debug, binder_err, binder_error, binder_info, binder_warn};

use crate::vulkan_format::{
    binding_kind_to_vk, bind_point_to_vk, format_to_vk, image_layout_to_vk, pool_size_to_vk,
    subresource_range_to_vk, view_type_to_vk,
};

const SOURCE: &str = "binder::vulkan";

/// Headless Vulkan context
pub struct VulkanContext {
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Queue used for submissions (externally synchronized)
    queue: Mutex<vk::Queue>,
    queue_family: u32,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is released BEFORE the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Largest sampler anisotropy, None when the feature is unavailable
    pub(crate) max_anisotropy: Option<f32>,

    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanContext {
    /// Create a headless context
    ///
    /// No surface or swapchain is involved. Validation layers are enabled when
    /// `config.enable_validation` is set and the crate was built with the
    /// `vulkan-validation` feature.
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` when the Vulkan library, instance, device
    /// or allocator cannot be created.
    pub fn new(config: Config) -> Result<Arc<Self>> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    binder_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let validation = config.enable_validation && cfg!(feature = "vulkan-validation");
            if config.enable_validation && !validation {
                binder_warn!(SOURCE, "Validation requested but the vulkan-validation feature is disabled");
            }

            // Application Info
            let app_name = CString::new(config.app_name.clone())
                .unwrap_or_else(|_| CString::from(c"Descriptor Binder Application"));
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"DescriptorBinder")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let mut extension_names = Vec::new();
            let mut layer_names = Vec::new();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    binder_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) = if validation {
                match create_debug_messenger(&entry, &instance, &config) {
                    Ok(pair) => pair,
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                (None, None)
            };

            // Pick the first physical device with a compute-capable queue family
            let physical_devices = match instance.enumerate_physical_devices() {
                Ok(devices) => devices,
                Err(e) => {
                    binder_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
                    destroy_debug_messenger(&debug_utils_loader, &debug_messenger);
                    instance.destroy_instance(None);
                    return Err(Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e)));
                }
            };

            let selected = physical_devices.into_iter().find_map(|physical_device| {
                let families = instance.get_physical_device_queue_family_properties(physical_device);
                find_queue_family(&families).map(|family| (physical_device, family))
            });

            let (physical_device, queue_family) = match selected {
                Some(pair) => pair,
                None => {
                    binder_error!(SOURCE, "No Vulkan-capable GPU with a compute queue found");
                    destroy_debug_messenger(&debug_utils_loader, &debug_messenger);
                    instance.destroy_instance(None);
                    return Err(Error::InitializationFailed(
                        "No Vulkan-capable GPU with a compute queue found".to_string(),
                    ));
                }
            };

            let properties = instance.get_physical_device_properties(physical_device);
            let supported = instance.get_physical_device_features(physical_device);
            let anisotropy = supported.sampler_anisotropy == vk::TRUE;

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];

            let device_features = vk::PhysicalDeviceFeatures::default()
                .sampler_anisotropy(anisotropy);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_features(&device_features);

            let device = match instance.create_device(physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    binder_error!(SOURCE, "Failed to create logical device: {:?}", e);
                    destroy_debug_messenger(&debug_utils_loader, &debug_messenger);
                    instance.destroy_instance(None);
                    return Err(Error::InitializationFailed(format!("Failed to create device: {:?}", e)));
                }
            };

            let queue = device.get_device_queue(queue_family, 0);

            // Create GPU allocator
            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    binder_error!(SOURCE, "Failed to create GPU allocator: {:?}", e);
                    device.destroy_device(None);
                    destroy_debug_messenger(&debug_utils_loader, &debug_messenger);
                    instance.destroy_instance(None);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            binder_info!(
                SOURCE,
                "Vulkan context ready on {:?} (queue family {}, validation {})",
                properties.device_name_as_c_str().unwrap_or(c"unknown"),
                queue_family,
                validation
            );

            Ok(Arc::new(Self {
                _entry: entry,
                instance,
                physical_device,
                device,
                queue: Mutex::new(queue),
                queue_family,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                max_anisotropy: anisotropy.then_some(properties.limits.max_sampler_anisotropy),
                debug_utils_loader,
                debug_messenger,
            }))
        }
    }

    /// Physical device the context runs on
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Queue family of the submission queue
    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    /// Wait until the device is idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| binder_err!(SOURCE, "Failed to wait for device idle: {:?}", e))
        }
    }

    /// Submit one command buffer and block until it completes
    pub(crate) fn submit_and_wait(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        unsafe {
            let fence = self
                .device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| binder_err!(SOURCE, "Failed to create submit fence: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let submitted = match self.queue.lock() {
                Ok(queue) => self
                    .device
                    .queue_submit(*queue, &[submit_info], fence)
                    .map_err(|e| binder_err!(SOURCE, "Failed to submit commands to GPU queue: {:?}", e)),
                Err(_) => Err(binder_err!(SOURCE, "Queue mutex poisoned")),
            };

            let result = submitted.and_then(|()| {
                self.device
                    .wait_for_fences(&[fence], true, u64::MAX)
                    .map_err(|e| binder_err!(SOURCE, "Failed to wait for submit fence: {:?}", e))
            });

            self.device.destroy_fence(fence, None);
            result
        }
    }
}

/// First family that supports compute, preferring one that also does graphics
fn find_queue_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    let graphics_compute = vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE;
    families
        .iter()
        .position(|qf| qf.queue_flags.contains(graphics_compute))
        .or_else(|| families.iter().position(|qf| qf.queue_flags.contains(vk::QueueFlags::COMPUTE)))
        .map(|index| index as u32)
}

#[cfg(feature = "vulkan-validation")]
unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    config: &Config,
) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

    crate::debug::init_debug_config(crate::debug::Config {
        severity: config.debug_severity,
        panic_on_error: config.panic_on_error,
        enable_stats: config.enable_validation_stats,
    });

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(crate::debug::severity_flags(config.debug_severity))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

    let messenger = debug_utils
        .create_debug_utils_messenger(&debug_info, None)
        .map_err(|e| {
            binder_error!(SOURCE, "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;

    Ok((Some(debug_utils), Some(messenger)))
}

#[cfg(not(feature = "vulkan-validation"))]
unsafe fn create_debug_messenger(
    _entry: &ash::Entry,
    _instance: &ash::Instance,
    _config: &Config,
) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
    Ok((None, None))
}

unsafe fn destroy_debug_messenger(
    loader: &Option<ash::ext::debug_utils::Instance>,
    messenger: &Option<vk::DebugUtilsMessengerEXT>,
) {
    #[cfg(feature = "vulkan-validation")]
    crate::debug::cleanup_debug_config();

    if let (Some(debug_utils), Some(messenger)) = (loader, messenger) {
        debug_utils.destroy_debug_utils_messenger(*messenger, None);
    }
}

/// Map a failed pool/table/view creation to the binder error
fn creation_error(what: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_POOL_MEMORY
        | vk::Result::ERROR_FRAGMENTED_POOL
        | vk::Result::ERROR_OUT_OF_HOST_MEMORY
        | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            binder_debug!(SOURCE, "{} failed: {:?}", what, result);
            Error::OutOfMemory
        }
        other => binder_err!(SOURCE, "{} failed: {:?}", what, other),
    }
}

/// Write targeting one slot, without its payload
fn write_base<'a>(write: &BindingWrite) -> vk::WriteDescriptorSet<'a> {
    vk::WriteDescriptorSet::default()
        .dst_set(vk::DescriptorSet::from_raw(write.table.as_raw()))
        .dst_binding(write.binding)
        .dst_array_element(0)
        .descriptor_type(binding_kind_to_vk(write.kind))
}

impl BindingDevice for VulkanContext {
    fn create_binding_pool(&self, desc: &BindingPoolDesc) -> Result<PoolHandle> {
        let pool_sizes: Vec<vk::DescriptorPoolSize> =
            desc.sizes.iter().copied().map(pool_size_to_vk).collect();

        // FREE_DESCRIPTOR_SET lets layers track each table individually
        let info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .pool_sizes(&pool_sizes)
            .max_sets(desc.max_tables);

        unsafe {
            self.device
                .create_descriptor_pool(&info, None)
                .map(|pool| PoolHandle::from_raw(pool.as_raw()))
                .map_err(|e| creation_error("vkCreateDescriptorPool", e))
        }
    }

    fn destroy_binding_pool(&self, pool: PoolHandle) {
        unsafe {
            self.device
                .destroy_descriptor_pool(vk::DescriptorPool::from_raw(pool.as_raw()), None);
        }
    }

    fn allocate_binding_table(&self, pool: PoolHandle, layout: SetLayoutHandle) -> Result<TableHandle> {
        let layouts = [vk::DescriptorSetLayout::from_raw(layout.as_raw())];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(vk::DescriptorPool::from_raw(pool.as_raw()))
            .set_layouts(&layouts);

        let sets = unsafe {
            self.device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|e| creation_error("vkAllocateDescriptorSets", e))?
        };

        sets.first()
            .map(|set| TableHandle::from_raw(set.as_raw()))
            .ok_or_else(|| binder_err!(SOURCE, "vkAllocateDescriptorSets returned no set"))
    }

    fn create_image_view(&self, desc: &ImageViewDesc) -> Result<ImageViewHandle> {
        let info = vk::ImageViewCreateInfo::default()
            .image(vk::Image::from_raw(desc.image.as_raw()))
            .view_type(view_type_to_vk(desc.view_type))
            .format(format_to_vk(desc.format))
            .subresource_range(subresource_range_to_vk(desc.subresource_range));

        unsafe {
            self.device
                .create_image_view(&info, None)
                .map(|view| ImageViewHandle::from_raw(view.as_raw()))
                .map_err(|e| creation_error("vkCreateImageView", e))
        }
    }

    fn destroy_image_view(&self, view: ImageViewHandle) {
        unsafe {
            self.device
                .destroy_image_view(vk::ImageView::from_raw(view.as_raw()), None);
        }
    }

    fn create_buffer_view(&self, desc: &BufferViewDesc) -> Result<BufferViewHandle> {
        let info = vk::BufferViewCreateInfo::default()
            .buffer(vk::Buffer::from_raw(desc.buffer.as_raw()))
            .format(format_to_vk(desc.format))
            .offset(desc.offset)
            .range(desc.range);

        unsafe {
            self.device
                .create_buffer_view(&info, None)
                .map(|view| BufferViewHandle::from_raw(view.as_raw()))
                .map_err(|e| creation_error("vkCreateBufferView", e))
        }
    }

    fn destroy_buffer_view(&self, view: BufferViewHandle) {
        unsafe {
            self.device
                .destroy_buffer_view(vk::BufferView::from_raw(view.as_raw()), None);
        }
    }

    fn write_binding(&self, write: &BindingWrite) {
        unsafe {
            match write.payload {
                BindingPayload::Image { view, layout, sampler } => {
                    let image_info = [vk::DescriptorImageInfo::default()
                        .image_view(vk::ImageView::from_raw(view.as_raw()))
                        .image_layout(image_layout_to_vk(layout))
                        .sampler(sampler.map_or(vk::Sampler::null(), |s| vk::Sampler::from_raw(s.as_raw())))];
                    self.device
                        .update_descriptor_sets(&[write_base(write).image_info(&image_info)], &[]);
                }
                BindingPayload::Sampler(sampler) => {
                    let image_info = [vk::DescriptorImageInfo::default()
                        .sampler(vk::Sampler::from_raw(sampler.as_raw()))];
                    self.device
                        .update_descriptor_sets(&[write_base(write).image_info(&image_info)], &[]);
                }
                BindingPayload::Buffer { buffer, offset, range } => {
                    let buffer_info = [vk::DescriptorBufferInfo::default()
                        .buffer(vk::Buffer::from_raw(buffer.as_raw()))
                        .offset(offset)
                        .range(range)];
                    self.device
                        .update_descriptor_sets(&[write_base(write).buffer_info(&buffer_info)], &[]);
                }
                BindingPayload::TexelBuffer(view) => {
                    let views = [vk::BufferView::from_raw(view.as_raw())];
                    self.device
                        .update_descriptor_sets(&[write_base(write).texel_buffer_view(&views)], &[]);
                }
            }
        }
    }

    fn bind_binding_table(
        &self,
        stream: CommandStreamHandle,
        bind_point: BindPoint,
        layout: PipelineLayoutHandle,
        set: u32,
        table: TableHandle,
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                vk::CommandBuffer::from_raw(stream.as_raw()),
                bind_point_to_vk(bind_point),
                vk::PipelineLayout::from_raw(layout.as_raw()),
                set,
                &[vk::DescriptorSet::from_raw(table.as_raw())],
                &[],
            );
        }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.device_wait_idle().ok();

            // 1. Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Destroy debug messenger BEFORE device and instance
            destroy_debug_messenger(&self.debug_utils_loader, &self.debug_messenger);

            // 3. Destroy device and instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
