/// ViewTracker - ordered record of transient views owned by a helper
///
/// Every view the helper creates is registered right after creation and
/// released exactly once when the helper is destroyed, after the pool.

use crate::device::{BindingDevice, BufferViewHandle, ImageViewHandle};

/// Handle of a transient view, tagged by the destruction routine it needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientHandle {
    ImageView(ImageViewHandle),
    BufferView(BufferViewHandle),
}

/// One created view and the slot it was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransientView {
    pub handle: TransientHandle,
    pub set: u32,
    pub binding: u32,
}

#[derive(Debug, Default)]
pub struct ViewTracker {
    views: Vec<TransientView>,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created view
    pub fn register(&mut self, view: TransientView) {
        self.views.push(view);
    }

    /// Destroy every recorded view in registration order
    ///
    /// The record list is drained, so a second call does nothing.
    pub fn release_all(&mut self, device: &dyn BindingDevice) {
        for view in self.views.drain(..) {
            match view.handle {
                TransientHandle::ImageView(handle) => device.destroy_image_view(handle),
                TransientHandle::BufferView(handle) => device.destroy_buffer_view(handle),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransientView> {
        self.views.iter()
    }
}

#[cfg(test)]
#[path = "view_tracker_tests.rs"]
mod tests;
