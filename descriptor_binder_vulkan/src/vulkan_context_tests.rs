//! Unit tests for the pure parts of vulkan_context.rs (no GPU)

use super::*;
use descriptor_binder::binder::device::BindingKind;

fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count: 1,
        ..Default::default()
    }
}

// ============================================================================
// QUEUE FAMILY SELECTION
// ============================================================================

#[test]
fn test_queue_family_prefers_graphics_and_compute() {
    let families = [
        family(vk::QueueFlags::TRANSFER),
        family(vk::QueueFlags::COMPUTE),
        family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
    ];
    assert_eq!(find_queue_family(&families), Some(2));
}

#[test]
fn test_queue_family_falls_back_to_compute_only() {
    let families = [family(vk::QueueFlags::TRANSFER), family(vk::QueueFlags::COMPUTE)];
    assert_eq!(find_queue_family(&families), Some(1));
}

#[test]
fn test_queue_family_none_without_compute() {
    let families = [family(vk::QueueFlags::GRAPHICS), family(vk::QueueFlags::TRANSFER)];
    assert_eq!(find_queue_family(&families), None);
    assert_eq!(find_queue_family(&[]), None);
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

#[test]
fn test_pool_exhaustion_results_map_to_out_of_memory() {
    for result in [
        vk::Result::ERROR_OUT_OF_POOL_MEMORY,
        vk::Result::ERROR_FRAGMENTED_POOL,
        vk::Result::ERROR_OUT_OF_HOST_MEMORY,
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
    ] {
        assert_eq!(creation_error("vkAllocateDescriptorSets", result), Error::OutOfMemory);
    }
}

#[test]
fn test_other_results_map_to_backend_error() {
    match creation_error("vkCreateImageView", vk::Result::ERROR_FORMAT_NOT_SUPPORTED) {
        Error::BackendError(message) => {
            assert!(message.contains("vkCreateImageView"));
            assert!(message.contains("ERROR_FORMAT_NOT_SUPPORTED"));
        }
        other => panic!("expected BackendError, got {:?}", other),
    }
}

// ============================================================================
// DESCRIPTOR WRITES
// ============================================================================

#[test]
fn test_write_base_targets_slot() {
    let write = BindingWrite {
        table: TableHandle::from_raw(0x1234),
        binding: 3,
        kind: BindingKind::UniformBuffer,
        payload: BindingPayload::Buffer {
            buffer: descriptor_binder::binder::device::BufferHandle::from_raw(7),
            offset: 0,
            range: 64,
        },
    };
    let base = write_base(&write);

    assert_eq!(base.dst_set, vk::DescriptorSet::from_raw(0x1234));
    assert_eq!(base.dst_binding, 3);
    assert_eq!(base.dst_array_element, 0);
    assert_eq!(base.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
}
