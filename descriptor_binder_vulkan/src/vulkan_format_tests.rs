//! Unit tests for Vulkan conversion functions
//!
//! Tests pure conversion functions without requiring a GPU.

use super::*;

// ============================================================================
// FORMAT CONVERSION TESTS
// ============================================================================

#[test]
fn test_color_formats_to_vk() {
    assert_eq!(format_to_vk(Format::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(Format::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(format_to_vk(Format::R16G16B16A16_SFLOAT), vk::Format::R16G16B16A16_SFLOAT);
    assert_eq!(format_to_vk(Format::R32_UINT), vk::Format::R32_UINT);
}

#[test]
fn test_depth_formats_to_vk() {
    // Binder names drop the S of SFLOAT
    assert_eq!(format_to_vk(Format::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(format_to_vk(Format::D32_FLOAT_S8_UINT), vk::Format::D32_SFLOAT_S8_UINT);
    assert_eq!(format_to_vk(Format::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
}

// ============================================================================
// IMAGE TYPE CONVERSION TESTS
// ============================================================================

#[test]
fn test_image_type_from_vk() {
    assert_eq!(image_type_from_vk(vk::ImageType::TYPE_1D), ImageType::Type1D);
    assert_eq!(image_type_from_vk(vk::ImageType::TYPE_2D), ImageType::Type2D);
    assert_eq!(image_type_from_vk(vk::ImageType::TYPE_3D), ImageType::Type3D);
}

#[test]
fn test_unknown_image_type_is_kept_raw() {
    let converted = image_type_from_vk(vk::ImageType::from_raw(7));
    assert_eq!(converted, ImageType::Other(7));
    assert_eq!(image_type_to_vk(converted), vk::ImageType::from_raw(7));

    // No default view exists for it
    assert!(ImageViewType::default_for(converted).is_err());
}

#[test]
fn test_view_types_to_vk() {
    assert_eq!(view_type_to_vk(ImageViewType::Type2D), vk::ImageViewType::TYPE_2D);
    assert_eq!(view_type_to_vk(ImageViewType::Type2DArray), vk::ImageViewType::TYPE_2D_ARRAY);
    assert_eq!(view_type_to_vk(ImageViewType::Cube), vk::ImageViewType::CUBE);
    assert_eq!(view_type_to_vk(ImageViewType::CubeArray), vk::ImageViewType::CUBE_ARRAY);
}

#[test]
fn test_layouts_to_vk() {
    assert_eq!(image_layout_to_vk(ImageLayout::General), vk::ImageLayout::GENERAL);
    assert_eq!(
        image_layout_to_vk(ImageLayout::ShaderReadOnlyOptimal),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    );
}

// ============================================================================
// SUBRESOURCE CONVERSION TESTS
// ============================================================================

#[test]
fn test_aspects_to_vk() {
    assert_eq!(aspects_to_vk(ImageAspects::COLOR), vk::ImageAspectFlags::COLOR);
    assert_eq!(
        aspects_to_vk(ImageAspects::DEPTH | ImageAspects::STENCIL),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
    assert_eq!(aspects_to_vk(ImageAspects::empty()), vk::ImageAspectFlags::empty());
}

#[test]
fn test_subresource_range_to_vk() {
    let range = SubresourceRange {
        aspects: ImageAspects::COLOR,
        base_mip_level: 1,
        level_count: 2,
        base_array_layer: 3,
        layer_count: 4,
    };
    let vk_range = subresource_range_to_vk(range);

    assert_eq!(vk_range.aspect_mask, vk::ImageAspectFlags::COLOR);
    assert_eq!(vk_range.base_mip_level, 1);
    assert_eq!(vk_range.level_count, 2);
    assert_eq!(vk_range.base_array_layer, 3);
    assert_eq!(vk_range.layer_count, 4);
}

// ============================================================================
// BINDING CONVERSION TESTS
// ============================================================================

#[test]
fn test_every_binding_kind_maps_to_a_distinct_descriptor_type() {
    let mut types: Vec<i32> = BindingKind::ALL
        .iter()
        .map(|&kind| binding_kind_to_vk(kind).as_raw())
        .collect();
    types.sort();
    types.dedup();
    assert_eq!(types.len(), BindingKind::ALL.len());

    assert_eq!(binding_kind_to_vk(BindingKind::StorageImage), vk::DescriptorType::STORAGE_IMAGE);
    assert_eq!(
        binding_kind_to_vk(BindingKind::StorageTexelBuffer),
        vk::DescriptorType::STORAGE_TEXEL_BUFFER
    );
}

#[test]
fn test_stage_flags_to_vk() {
    assert_eq!(stage_flags_to_vk(ShaderStageFlags::COMPUTE), vk::ShaderStageFlags::COMPUTE);
    assert_eq!(
        stage_flags_to_vk(ShaderStageFlags::VERTEX_FRAGMENT),
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    );
    assert_eq!(stage_flags_to_vk(ShaderStageFlags::empty()), vk::ShaderStageFlags::empty());
}

#[test]
fn test_bind_point_and_pool_size_to_vk() {
    assert_eq!(bind_point_to_vk(BindPoint::Compute), vk::PipelineBindPoint::COMPUTE);
    assert_eq!(bind_point_to_vk(BindPoint::Graphics), vk::PipelineBindPoint::GRAPHICS);

    let size = pool_size_to_vk(PoolSize { kind: BindingKind::UniformBuffer, count: 6 });
    assert_eq!(size.ty, vk::DescriptorType::UNIFORM_BUFFER);
    assert_eq!(size.descriptor_count, 6);
}
