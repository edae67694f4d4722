/// Tests for ViewTracker

use super::*;
use crate::device::mock_device::{DeviceCall, MockDevice};

fn image_view(raw: u64, binding: u32) -> TransientView {
    TransientView {
        handle: TransientHandle::ImageView(ImageViewHandle::from_raw(raw)),
        set: 0,
        binding,
    }
}

#[test]
fn test_new_tracker_is_empty() {
    let tracker = ViewTracker::new();
    assert!(tracker.is_empty());
    assert_eq!(tracker.len(), 0);
}

#[test]
fn test_release_in_registration_order() {
    let device = MockDevice::new();
    let mut tracker = ViewTracker::new();
    tracker.register(image_view(30, 0));
    tracker.register(TransientView {
        handle: TransientHandle::BufferView(BufferViewHandle::from_raw(10)),
        set: 1,
        binding: 2,
    });
    tracker.register(image_view(20, 1));
    assert_eq!(tracker.len(), 3);

    tracker.release_all(&device);

    assert_eq!(
        device.calls(),
        vec![
            DeviceCall::DestroyImageView(ImageViewHandle::from_raw(30)),
            DeviceCall::DestroyBufferView(BufferViewHandle::from_raw(10)),
            DeviceCall::DestroyImageView(ImageViewHandle::from_raw(20)),
        ]
    );
    assert!(tracker.is_empty());
}

#[test]
fn test_second_release_is_noop() {
    let device = MockDevice::new();
    let mut tracker = ViewTracker::new();
    tracker.register(image_view(1, 0));

    tracker.release_all(&device);
    tracker.release_all(&device);

    assert_eq!(device.view_destructions(), 1);
}

#[test]
fn test_iter_exposes_slots() {
    let mut tracker = ViewTracker::new();
    tracker.register(image_view(1, 4));
    tracker.register(image_view(2, 5));

    let bindings: Vec<u32> = tracker.iter().map(|v| v.binding).collect();
    assert_eq!(bindings, vec![4, 5]);
}
