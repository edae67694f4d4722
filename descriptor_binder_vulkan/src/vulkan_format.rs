/// Conversions between backend-agnostic binder types and Vulkan enums
///
/// Pure functions, unit tested without a GPU.

use ash::vk;
use descriptor_binder::binder::device::{
    BindingKind, BindPoint, Format, ImageAspects, ImageLayout, ImageType, ImageViewType,
    PoolSize, ShaderStageFlags, SubresourceRange,
};

/// Convert a binder Format to a Vulkan format
pub(crate) fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        Format::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        Format::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        Format::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        Format::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        Format::R32_SFLOAT => vk::Format::R32_SFLOAT,
        Format::R32_UINT => vk::Format::R32_UINT,
        Format::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        Format::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        Format::D16_UNORM => vk::Format::D16_UNORM,
        Format::D32_FLOAT => vk::Format::D32_SFLOAT,
        Format::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        Format::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// Convert a native image type to the binder's dimensionality
///
/// Values with no portable counterpart are kept raw in `ImageType::Other`.
pub(crate) fn image_type_from_vk(image_type: vk::ImageType) -> ImageType {
    match image_type {
        vk::ImageType::TYPE_1D => ImageType::Type1D,
        vk::ImageType::TYPE_2D => ImageType::Type2D,
        vk::ImageType::TYPE_3D => ImageType::Type3D,
        other => ImageType::Other(other.as_raw()),
    }
}

pub(crate) fn image_type_to_vk(image_type: ImageType) -> vk::ImageType {
    match image_type {
        ImageType::Type1D => vk::ImageType::TYPE_1D,
        ImageType::Type2D => vk::ImageType::TYPE_2D,
        ImageType::Type3D => vk::ImageType::TYPE_3D,
        ImageType::Other(raw) => vk::ImageType::from_raw(raw),
    }
}

pub(crate) fn view_type_to_vk(view_type: ImageViewType) -> vk::ImageViewType {
    match view_type {
        ImageViewType::Type1D => vk::ImageViewType::TYPE_1D,
        ImageViewType::Type2D => vk::ImageViewType::TYPE_2D,
        ImageViewType::Type3D => vk::ImageViewType::TYPE_3D,
        ImageViewType::Cube => vk::ImageViewType::CUBE,
        ImageViewType::Type1DArray => vk::ImageViewType::TYPE_1D_ARRAY,
        ImageViewType::Type2DArray => vk::ImageViewType::TYPE_2D_ARRAY,
        ImageViewType::CubeArray => vk::ImageViewType::CUBE_ARRAY,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ShaderReadOnlyOptimal => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    }
}

pub(crate) fn aspects_to_vk(aspects: ImageAspects) -> vk::ImageAspectFlags {
    let mut flags = vk::ImageAspectFlags::empty();
    if aspects.contains(ImageAspects::COLOR) {
        flags |= vk::ImageAspectFlags::COLOR;
    }
    if aspects.contains(ImageAspects::DEPTH) {
        flags |= vk::ImageAspectFlags::DEPTH;
    }
    if aspects.contains(ImageAspects::STENCIL) {
        flags |= vk::ImageAspectFlags::STENCIL;
    }
    flags
}

pub(crate) fn subresource_range_to_vk(range: SubresourceRange) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: aspects_to_vk(range.aspects),
        base_mip_level: range.base_mip_level,
        level_count: range.level_count,
        base_array_layer: range.base_array_layer,
        layer_count: range.layer_count,
    }
}

/// Convert a binding kind to its Vulkan descriptor type
pub(crate) fn binding_kind_to_vk(kind: BindingKind) -> vk::DescriptorType {
    match kind {
        BindingKind::Sampler => vk::DescriptorType::SAMPLER,
        BindingKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        BindingKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        BindingKind::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        BindingKind::UniformTexelBuffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
        BindingKind::StorageTexelBuffer => vk::DescriptorType::STORAGE_TEXEL_BUFFER,
        BindingKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
    }
}

pub(crate) fn stage_flags_to_vk(flags: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut vk_flags = vk::ShaderStageFlags::empty();
    if flags.contains(ShaderStageFlags::VERTEX) {
        vk_flags |= vk::ShaderStageFlags::VERTEX;
    }
    if flags.contains(ShaderStageFlags::FRAGMENT) {
        vk_flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    if flags.contains(ShaderStageFlags::COMPUTE) {
        vk_flags |= vk::ShaderStageFlags::COMPUTE;
    }
    vk_flags
}

pub(crate) fn bind_point_to_vk(bind_point: BindPoint) -> vk::PipelineBindPoint {
    match bind_point {
        BindPoint::Graphics => vk::PipelineBindPoint::GRAPHICS,
        BindPoint::Compute => vk::PipelineBindPoint::COMPUTE,
    }
}

pub(crate) fn pool_size_to_vk(size: PoolSize) -> vk::DescriptorPoolSize {
    vk::DescriptorPoolSize {
        ty: binding_kind_to_vk(size.kind),
        descriptor_count: size.count,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
