/// VulkanPipelineLayout - descriptor set layouts + pipeline layout built from reflection

use ash::vk;
use ash::vk::Handle;
use std::sync::Arc;

use descriptor_binder::binder::Result;
use descriptor_binder::binder::device::{
    BindPoint, PipelineLayout, PipelineLayoutHandle, PipelineReflection, ReflectedBinding,
    SetLayoutHandle,
};
use descriptor_binder::{binder_debug, binder_err};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{binding_kind_to_vk, stage_flags_to_vk};

const SOURCE: &str = "binder::vulkan";

/// Vulkan pipeline layout implementation
///
/// Declares one set layout per set index `0..=max_set` of the reflection.
/// Sets no shader references become empty layouts.
pub struct VulkanPipelineLayout {
    ctx: Arc<VulkanContext>,
    layout: vk::PipelineLayout,
    descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
    set_layouts: Vec<SetLayoutHandle>,
    bind_point: BindPoint,
    reflection: PipelineReflection,
}

impl VulkanPipelineLayout {
    pub fn new(ctx: Arc<VulkanContext>, reflection: PipelineReflection, bind_point: BindPoint) -> Result<Self> {
        let set_count = reflection.max_set().map_or(0, |max| max + 1);
        Self::with_set_count(ctx, reflection, bind_point, set_count)
    }

    /// Declare `set_count` sets, padding with empty layouts past the reflected ones
    ///
    /// `set_count` is raised to cover every reflected set.
    pub fn with_set_count(
        ctx: Arc<VulkanContext>,
        reflection: PipelineReflection,
        bind_point: BindPoint,
        set_count: u32,
    ) -> Result<Self> {
        let set_count = set_count.max(reflection.max_set().map_or(0, |max| max + 1));

        let mut descriptor_set_layouts = Vec::with_capacity(set_count as usize);
        for set in 0..set_count {
            match create_set_layout(&ctx, reflection.set_bindings(set), bind_point) {
                Ok(layout) => descriptor_set_layouts.push(layout),
                Err(e) => {
                    destroy_set_layouts(&ctx, &descriptor_set_layouts);
                    return Err(e);
                }
            }
        }

        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&descriptor_set_layouts);

        let layout = unsafe {
            match ctx.device.create_pipeline_layout(&create_info, None) {
                Ok(layout) => layout,
                Err(e) => {
                    destroy_set_layouts(&ctx, &descriptor_set_layouts);
                    return Err(binder_err!(SOURCE, "Failed to create pipeline layout: {:?}", e));
                }
            }
        };

        binder_debug!(
            SOURCE,
            "Created {:?} pipeline layout with {} set layouts ({} reflected)",
            bind_point, set_count, reflection.set_count()
        );

        let set_layouts = descriptor_set_layouts
            .iter()
            .map(|layout| SetLayoutHandle::from_raw(layout.as_raw()))
            .collect();

        Ok(Self {
            ctx,
            layout,
            descriptor_set_layouts,
            set_layouts,
            bind_point,
            reflection,
        })
    }

    /// Native Vulkan pipeline layout (for pipeline creation)
    pub fn vk_layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

/// Stages used when reflection recorded none
fn default_stages(bind_point: BindPoint) -> vk::ShaderStageFlags {
    match bind_point {
        BindPoint::Compute => vk::ShaderStageFlags::COMPUTE,
        BindPoint::Graphics => vk::ShaderStageFlags::ALL_GRAPHICS,
    }
}

fn layout_binding<'a>(binding: &ReflectedBinding, bind_point: BindPoint) -> vk::DescriptorSetLayoutBinding<'a> {
    let stages = stage_flags_to_vk(binding.stages);
    vk::DescriptorSetLayoutBinding::default()
        .binding(binding.binding)
        .descriptor_type(binding_kind_to_vk(binding.kind))
        .descriptor_count(binding.count)
        .stage_flags(if stages.is_empty() { default_stages(bind_point) } else { stages })
}

fn create_set_layout(
    ctx: &VulkanContext,
    bindings: &[ReflectedBinding],
    bind_point: BindPoint,
) -> Result<vk::DescriptorSetLayout> {
    let vk_bindings: Vec<vk::DescriptorSetLayoutBinding> = bindings
        .iter()
        .map(|binding| layout_binding(binding, bind_point))
        .collect();

    let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);

    unsafe {
        ctx.device
            .create_descriptor_set_layout(&create_info, None)
            .map_err(|e| binder_err!(SOURCE, "Failed to create descriptor set layout: {:?}", e))
    }
}

fn destroy_set_layouts(ctx: &VulkanContext, layouts: &[vk::DescriptorSetLayout]) {
    for &layout in layouts {
        unsafe { ctx.device.destroy_descriptor_set_layout(layout, None); }
    }
}

impl PipelineLayout for VulkanPipelineLayout {
    fn handle(&self) -> PipelineLayoutHandle {
        PipelineLayoutHandle::from_raw(self.layout.as_raw())
    }

    fn bind_point(&self) -> BindPoint {
        self.bind_point
    }

    fn set_layouts(&self) -> &[SetLayoutHandle] {
        &self.set_layouts
    }

    fn reflection(&self) -> &PipelineReflection {
        &self.reflection
    }
}

impl Drop for VulkanPipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
        destroy_set_layouts(&self.ctx, &self.descriptor_set_layouts);
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_layout_tests.rs"]
mod tests;
