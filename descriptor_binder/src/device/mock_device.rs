/// Mock BindingDevice for unit tests (no GPU required)
///
/// Records every device call in order so tests can check allocation counts,
/// publish loops and destruction order. Failures can be injected per entry
/// point to exercise the error paths.

use std::sync::Mutex;
use rustc_hash::FxHashSet;

use crate::device::{
    BindingDevice, BindingPoolDesc, ImageViewDesc, BufferViewDesc, BindingWrite,
    Image, Buffer, PipelineLayout, PipelineReflection, BindPoint,
    Format, ImageType,
    PoolHandle, TableHandle, SetLayoutHandle, PipelineLayoutHandle, ImageHandle,
    ImageViewHandle, BufferHandle, BufferViewHandle, CommandStreamHandle,
};
use crate::error::{Error, Result};

// ============================================================================
// Recorded calls
// ============================================================================

/// One recorded device call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    CreatePool { desc: BindingPoolDesc, pool: PoolHandle },
    DestroyPool(PoolHandle),
    AllocateTable { pool: PoolHandle, layout: SetLayoutHandle, table: TableHandle },
    CreateImageView { desc: ImageViewDesc, view: ImageViewHandle },
    DestroyImageView(ImageViewHandle),
    CreateBufferView { desc: BufferViewDesc, view: BufferViewHandle },
    DestroyBufferView(BufferViewHandle),
    Write(BindingWrite),
    Bind {
        stream: CommandStreamHandle,
        bind_point: BindPoint,
        layout: PipelineLayoutHandle,
        set: u32,
        table: TableHandle,
    },
}

// ============================================================================
// Mock device
// ============================================================================

#[derive(Default)]
struct MockState {
    calls: Vec<DeviceCall>,
    next_handle: u64,
    pool_capacity: Vec<(PoolHandle, u32)>,
    live_pools: FxHashSet<PoolHandle>,
    live_image_views: FxHashSet<ImageViewHandle>,
    live_buffer_views: FxHashSet<BufferViewHandle>,
    fail_pool_creation: bool,
    fail_table_allocation: bool,
    fail_view_creation: bool,
}

impl MockState {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Instrumented device recording every call
pub struct MockDevice {
    state: Mutex<MockState>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Forget recorded calls (live-object tracking is kept)
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn pool_creations(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::CreatePool { .. }))
    }

    pub fn table_allocations(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::AllocateTable { .. }))
    }

    pub fn view_creations(&self) -> usize {
        self.count(|c| {
            matches!(c, DeviceCall::CreateImageView { .. } | DeviceCall::CreateBufferView { .. })
        })
    }

    pub fn view_destructions(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::DestroyImageView(_) | DeviceCall::DestroyBufferView(_)))
    }

    pub fn writes(&self) -> Vec<BindingWrite> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::Write(write) => Some(write),
                _ => None,
            })
            .collect()
    }

    /// (set, table) of every recorded bind, in order
    pub fn binds(&self) -> Vec<(u32, TableHandle)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::Bind { set, table, .. } => Some((set, table)),
                _ => None,
            })
            .collect()
    }

    /// Pools, image views and buffer views not yet destroyed
    pub fn live_object_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.live_pools.len() + state.live_image_views.len() + state.live_buffer_views.len()
    }

    pub fn fail_pool_creation(&self, fail: bool) {
        self.state.lock().unwrap().fail_pool_creation = fail;
    }

    pub fn fail_table_allocation(&self, fail: bool) {
        self.state.lock().unwrap().fail_table_allocation = fail;
    }

    pub fn fail_view_creation(&self, fail: bool) {
        self.state.lock().unwrap().fail_view_creation = fail;
    }
}

impl BindingDevice for MockDevice {
    fn create_binding_pool(&self, desc: &BindingPoolDesc) -> Result<PoolHandle> {
        let mut state = self.state.lock().unwrap();
        if state.fail_pool_creation {
            return Err(Error::OutOfMemory);
        }
        let pool = PoolHandle::from_raw(state.next());
        state.pool_capacity.push((pool, desc.max_tables));
        state.live_pools.insert(pool);
        state.calls.push(DeviceCall::CreatePool { desc: desc.clone(), pool });
        Ok(pool)
    }

    fn destroy_binding_pool(&self, pool: PoolHandle) {
        let mut state = self.state.lock().unwrap();
        state.live_pools.remove(&pool);
        state.calls.push(DeviceCall::DestroyPool(pool));
    }

    fn allocate_binding_table(&self, pool: PoolHandle, layout: SetLayoutHandle) -> Result<TableHandle> {
        let mut state = self.state.lock().unwrap();
        if state.fail_table_allocation || !state.live_pools.contains(&pool) {
            return Err(Error::OutOfMemory);
        }
        // Enforce the pool's table capacity like a real descriptor pool
        let capacity = state
            .pool_capacity
            .iter_mut()
            .find(|(handle, _)| *handle == pool)
            .map(|(_, remaining)| remaining);
        match capacity {
            Some(remaining) if *remaining > 0 => *remaining -= 1,
            _ => return Err(Error::OutOfMemory),
        }
        let table = TableHandle::from_raw(state.next());
        state.calls.push(DeviceCall::AllocateTable { pool, layout, table });
        Ok(table)
    }

    fn create_image_view(&self, desc: &ImageViewDesc) -> Result<ImageViewHandle> {
        let mut state = self.state.lock().unwrap();
        if state.fail_view_creation {
            return Err(Error::OutOfMemory);
        }
        let view = ImageViewHandle::from_raw(state.next());
        state.live_image_views.insert(view);
        state.calls.push(DeviceCall::CreateImageView { desc: *desc, view });
        Ok(view)
    }

    fn destroy_image_view(&self, view: ImageViewHandle) {
        let mut state = self.state.lock().unwrap();
        state.live_image_views.remove(&view);
        state.calls.push(DeviceCall::DestroyImageView(view));
    }

    fn create_buffer_view(&self, desc: &BufferViewDesc) -> Result<BufferViewHandle> {
        let mut state = self.state.lock().unwrap();
        if state.fail_view_creation {
            return Err(Error::OutOfMemory);
        }
        let view = BufferViewHandle::from_raw(state.next());
        state.live_buffer_views.insert(view);
        state.calls.push(DeviceCall::CreateBufferView { desc: *desc, view });
        Ok(view)
    }

    fn destroy_buffer_view(&self, view: BufferViewHandle) {
        let mut state = self.state.lock().unwrap();
        state.live_buffer_views.remove(&view);
        state.calls.push(DeviceCall::DestroyBufferView(view));
    }

    fn write_binding(&self, write: &BindingWrite) {
        self.state.lock().unwrap().calls.push(DeviceCall::Write(*write));
    }

    fn bind_binding_table(
        &self,
        stream: CommandStreamHandle,
        bind_point: BindPoint,
        layout: PipelineLayoutHandle,
        set: u32,
        table: TableHandle,
    ) {
        self.state.lock().unwrap().calls.push(DeviceCall::Bind {
            stream,
            bind_point,
            layout,
            set,
            table,
        });
    }
}

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug)]
pub struct MockImage {
    pub handle: ImageHandle,
    pub format: Format,
    pub image_type: ImageType,
    pub mip_levels: u32,
    pub array_layers: u32,
}

impl MockImage {
    pub fn new(raw: u64, image_type: ImageType) -> Self {
        Self {
            handle: ImageHandle::from_raw(raw),
            format: Format::R8G8B8A8_UNORM,
            image_type,
            mip_levels: 1,
            array_layers: 1,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_levels(mut self, mip_levels: u32, array_layers: u32) -> Self {
        self.mip_levels = mip_levels;
        self.array_layers = array_layers;
        self
    }
}

impl Image for MockImage {
    fn handle(&self) -> ImageHandle { self.handle }
    fn format(&self) -> Format { self.format }
    fn image_type(&self) -> ImageType { self.image_type }
    fn mip_levels(&self) -> u32 { self.mip_levels }
    fn array_layers(&self) -> u32 { self.array_layers }
}

#[derive(Debug)]
pub struct MockBuffer {
    pub handle: BufferHandle,
    pub size: u64,
}

impl MockBuffer {
    pub fn new(raw: u64, size: u64) -> Self {
        Self {
            handle: BufferHandle::from_raw(raw),
            size,
        }
    }
}

impl Buffer for MockBuffer {
    fn handle(&self) -> BufferHandle { self.handle }
    fn size(&self) -> u64 { self.size }
}

/// Pipeline layout with `declared_sets` set layouts (handles 1000, 1001, ...)
#[derive(Debug)]
pub struct MockPipelineLayout {
    pub handle: PipelineLayoutHandle,
    pub bind_point: BindPoint,
    pub set_layouts: Vec<SetLayoutHandle>,
    pub reflection: PipelineReflection,
}

impl MockPipelineLayout {
    pub fn new(reflection: PipelineReflection, declared_sets: u32) -> Self {
        Self {
            handle: PipelineLayoutHandle::from_raw(500),
            bind_point: BindPoint::Compute,
            set_layouts: (0..declared_sets)
                .map(|set| SetLayoutHandle::from_raw(1000 + set as u64))
                .collect(),
            reflection,
        }
    }

    /// Declares exactly the sets `0..=max_set` referenced by reflection
    pub fn from_reflection(reflection: PipelineReflection) -> Self {
        let declared = reflection.max_set().map(|set| set + 1).unwrap_or(0);
        Self::new(reflection, declared)
    }
}

impl PipelineLayout for MockPipelineLayout {
    fn handle(&self) -> PipelineLayoutHandle { self.handle }
    fn bind_point(&self) -> BindPoint { self.bind_point }
    fn set_layouts(&self) -> &[SetLayoutHandle] { &self.set_layouts }
    fn reflection(&self) -> &PipelineReflection { &self.reflection }
}

#[path = "mock_device_tests.rs"]
mod tests;
