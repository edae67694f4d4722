/// SamplerCache - VkSampler management for combined image samplers
///
/// Creates and caches VkSampler objects on first use. Helpers only need the
/// handle, so the cache hands out `SamplerHandle`s and keeps ownership.

use ash::vk;
use ash::vk::Handle;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

use descriptor_binder::binder::Result;
use descriptor_binder::binder::device::SamplerHandle;
use descriptor_binder::binder_err;

use crate::vulkan_context::VulkanContext;

const SOURCE: &str = "binder::vulkan";

/// Predefined sampler configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    LinearRepeat,
    LinearClamp,
    NearestRepeat,
    NearestClamp,
    /// Depth comparison sampler
    Shadow,
}

/// Sampler cache - creates VkSampler on first use, destroys on drop
pub struct SamplerCache {
    ctx: Arc<VulkanContext>,
    cache: Mutex<FxHashMap<SamplerType, vk::Sampler>>,
}

impl SamplerCache {
    pub fn new(ctx: Arc<VulkanContext>) -> Self {
        Self {
            ctx,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Get or create the sampler for the given type
    pub fn get(&self, sampler_type: SamplerType) -> Result<SamplerHandle> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| binder_err!(SOURCE, "Sampler cache mutex poisoned"))?;

        if let Some(&sampler) = cache.get(&sampler_type) {
            return Ok(SamplerHandle::from_raw(sampler.as_raw()));
        }

        let sampler = self.create_vk_sampler(sampler_type)?;
        cache.insert(sampler_type, sampler);
        Ok(SamplerHandle::from_raw(sampler.as_raw()))
    }

    /// Number of samplers created so far
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn create_vk_sampler(&self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        let (filter, mipmap, address, border, compare) = match sampler_type {
            SamplerType::LinearRepeat => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::REPEAT,
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::LinearClamp => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::NearestRepeat => (
                vk::Filter::NEAREST,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::REPEAT,
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::NearestClamp => (
                vk::Filter::NEAREST,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::Shadow => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::CLAMP_TO_BORDER,
                vk::BorderColor::FLOAT_OPAQUE_WHITE,
                true,
            ),
        };

        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(mipmap)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(border)
            .unnormalized_coordinates(false);

        if compare {
            create_info = create_info
                .compare_enable(true)
                .compare_op(vk::CompareOp::LESS_OR_EQUAL);
        }

        // Anisotropy only for linear filtering, capped by the device limit
        match self.ctx.max_anisotropy {
            Some(max_aniso) if filter == vk::Filter::LINEAR && !compare => {
                create_info = create_info
                    .anisotropy_enable(true)
                    .max_anisotropy(max_aniso.min(16.0));
            }
            _ => {
                create_info = create_info
                    .anisotropy_enable(false)
                    .max_anisotropy(1.0);
            }
        }

        unsafe {
            self.ctx.device.create_sampler(&create_info, None)
                .map_err(|e| binder_err!(SOURCE, "Failed to create {:?} sampler: {:?}", sampler_type, e))
        }
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        if let Ok(cache) = self.cache.get_mut() {
            for (_, sampler) in cache.drain() {
                unsafe { self.ctx.device.destroy_sampler(sampler, None); }
            }
        }
    }
}
