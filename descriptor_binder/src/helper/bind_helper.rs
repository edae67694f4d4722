/// BindHelper - per-pipeline binding table helper
///
/// A helper owns one exactly-sized pool and the transient views it creates.
/// Resources are attached slot by slot while the helper is Open; `commit`
/// publishes every allocated table to a command stream once and closes the
/// helper. `publish_frame` repeats the publication for later frames.
///
/// Dropping the helper releases the pool first, then every transient view in
/// creation order. The caller must keep attached resources alive while any
/// command stream the tables were published to may still execute.

use std::sync::Arc;
use rustc_hash::FxHashSet;

use crate::device::{
    BindingDevice, PipelineLayout, Image, Buffer, WHOLE_SIZE,
    BindingKind, BindingHistogram, BindingPayload, BindingWrite,
    ImageViewDesc, BufferViewDesc, ImageViewType, ImageLayout, SubresourceRange, Format,
    TableHandle, SamplerHandle, CommandStreamHandle,
};
use crate::error::{Error, Result};
use crate::helper::binding_pool::BindingPool;
use crate::helper::view_tracker::{TransientHandle, TransientView, ViewTracker};
use crate::{binder_debug, binder_error, binder_trace};

const SOURCE: &str = "binder::BindHelper";

/// Lifecycle state of a helper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperState {
    /// Attachments accepted
    Open,
    /// Published once, attachments rejected
    Committed,
}

/// Per-pipeline binding table helper
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use descriptor_binder::binder::Result;
/// # use descriptor_binder::binder::device::{BindingDevice, PipelineLayout, Image, CommandStreamHandle};
/// # use descriptor_binder::binder::helper::BindHelper;
/// # fn record(device: Arc<dyn BindingDevice>, pipeline: Arc<dyn PipelineLayout>,
/// #           target: &dyn Image, stream: CommandStreamHandle) -> Result<()> {
/// let mut helper = BindHelper::new(device, pipeline)?;
/// helper.set_storage_image(0, 0, target, None, None)?;
/// helper.commit(stream);
/// # Ok(())
/// # }
/// ```
pub struct BindHelper {
    device: Arc<dyn BindingDevice>,
    pipeline: Arc<dyn PipelineLayout>,
    pool: BindingPool,
    views: ViewTracker,
    written: FxHashSet<(u32, u32)>,
    state: HelperState,
}

impl BindHelper {
    /// Create a helper for one pipeline
    ///
    /// Sizes and creates the pool from the pipeline's reflection. No table is
    /// allocated until a slot of its set is written.
    ///
    /// # Errors
    ///
    /// Propagates the device error if the pool cannot be created.
    pub fn new(device: Arc<dyn BindingDevice>, pipeline: Arc<dyn PipelineLayout>) -> Result<Self> {
        let pool = BindingPool::new(device.clone(), pipeline.reflection(), pipeline.set_layouts())?;

        binder_debug!(
            SOURCE,
            "Created helper for pipeline layout {:?} ({} declared sets, {} reflected)",
            pipeline.handle(), pipeline.declared_set_count(), pipeline.reflection().set_count()
        );

        Ok(Self {
            device,
            pipeline,
            pool,
            views: ViewTracker::new(),
            written: FxHashSet::default(),
            state: HelperState::Open,
        })
    }

    // ===== ATTACHMENTS =====

    /// Attach a storage image (layout `General`)
    ///
    /// `range` defaults to every mip level and layer of the image, `view_type`
    /// to the image's own dimensionality.
    pub fn set_storage_image(
        &mut self,
        set: u32,
        binding: u32,
        image: &dyn Image,
        range: Option<SubresourceRange>,
        view_type: Option<ImageViewType>,
    ) -> Result<()> {
        self.assert_open("set_storage_image");
        self.validate_slot(set, binding, BindingKind::StorageImage)?;
        let desc = image_view_desc(image, range, view_type)?;
        self.attach_image(set, binding, BindingKind::StorageImage, desc, ImageLayout::General, None)
    }

    /// Attach an image together with a sampler
    ///
    /// The view is always a 2D array over mip 0 of every layer, so a plain 2D
    /// image and a texture array bind the same way.
    pub fn set_combined_image_sampler(
        &mut self,
        set: u32,
        binding: u32,
        image: &dyn Image,
        sampler: SamplerHandle,
    ) -> Result<()> {
        self.assert_open("set_combined_image_sampler");
        self.validate_slot(set, binding, BindingKind::CombinedImageSampler)?;
        let desc = ImageViewDesc {
            image: image.handle(),
            view_type: ImageViewType::Type2DArray,
            format: image.format(),
            subresource_range: SubresourceRange {
                aspects: image.format().view_aspects(),
                ..SubresourceRange::first_mip_color(image.array_layers())
            },
        };
        self.attach_image(
            set,
            binding,
            BindingKind::CombinedImageSampler,
            desc,
            ImageLayout::ShaderReadOnlyOptimal,
            Some(sampler),
        )
    }

    /// Attach a sampled image without a sampler
    pub fn set_sampled_image(
        &mut self,
        set: u32,
        binding: u32,
        image: &dyn Image,
        range: Option<SubresourceRange>,
        view_type: Option<ImageViewType>,
    ) -> Result<()> {
        self.assert_open("set_sampled_image");
        self.validate_slot(set, binding, BindingKind::SampledImage)?;
        let desc = image_view_desc(image, range, view_type)?;
        self.attach_image(
            set,
            binding,
            BindingKind::SampledImage,
            desc,
            ImageLayout::ShaderReadOnlyOptimal,
            None,
        )
    }

    /// Attach a standalone sampler
    pub fn set_sampler(&mut self, set: u32, binding: u32, sampler: SamplerHandle) -> Result<()> {
        self.assert_open("set_sampler");
        self.validate_slot(set, binding, BindingKind::Sampler)?;
        self.write_slot(set, binding, BindingKind::Sampler, BindingPayload::Sampler(sampler))
    }

    /// Attach a uniform buffer range (`range` may be `WHOLE_SIZE`)
    pub fn set_uniform_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &dyn Buffer,
        offset: u64,
        range: u64,
    ) -> Result<()> {
        self.assert_open("set_uniform_buffer");
        self.attach_buffer(set, binding, BindingKind::UniformBuffer, buffer, offset, range)
    }

    /// Attach a storage buffer range (`range` may be `WHOLE_SIZE`)
    pub fn set_storage_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &dyn Buffer,
        offset: u64,
        range: u64,
    ) -> Result<()> {
        self.assert_open("set_storage_buffer");
        self.attach_buffer(set, binding, BindingKind::StorageBuffer, buffer, offset, range)
    }

    /// Attach a read-only texel buffer, creating a buffer view
    pub fn set_uniform_texel_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &dyn Buffer,
        format: Format,
        offset: u64,
        range: u64,
    ) -> Result<()> {
        self.assert_open("set_uniform_texel_buffer");
        self.attach_texel_buffer(set, binding, BindingKind::UniformTexelBuffer, buffer, format, offset, range)
    }

    /// Attach a read/write texel buffer, creating a buffer view
    pub fn set_storage_texel_buffer(
        &mut self,
        set: u32,
        binding: u32,
        buffer: &dyn Buffer,
        format: Format,
        offset: u64,
        range: u64,
    ) -> Result<()> {
        self.assert_open("set_storage_texel_buffer");
        self.attach_texel_buffer(set, binding, BindingKind::StorageTexelBuffer, buffer, format, offset, range)
    }

    // ===== PUBLICATION =====

    /// Publish every allocated table to `stream` and close the helper
    ///
    /// Returns the number of tables published.
    ///
    /// # Panics
    ///
    /// If the helper was already committed.
    pub fn commit(&mut self, stream: CommandStreamHandle) -> usize {
        self.assert_open("commit");
        let published = self.publish(stream);
        self.state = HelperState::Committed;
        binder_trace!(SOURCE, "Committed {} tables to {:?}", published, stream);
        published
    }

    /// Publish every allocated table to `stream` again
    ///
    /// Independent of the commit state; callable any number of times.
    pub fn publish_frame(&self, stream: CommandStreamHandle) -> usize {
        self.publish(stream)
    }

    // ===== QUERIES =====

    pub fn state(&self) -> HelperState {
        self.state
    }

    pub fn is_committed(&self) -> bool {
        self.state == HelperState::Committed
    }

    /// Table allocated for `set`, if any slot of it was written
    pub fn table(&self, set: u32) -> Option<TableHandle> {
        self.pool.table(set)
    }

    pub fn allocated_table_count(&self) -> usize {
        self.pool.allocated_count()
    }

    /// Number of views the helper will release on drop
    pub fn transient_view_count(&self) -> usize {
        self.views.len()
    }

    /// True if (set, binding) was written by an earlier attachment
    pub fn is_slot_written(&self, set: u32, binding: u32) -> bool {
        self.written.contains(&(set, binding))
    }

    /// Descriptor counts the pool was sized with
    pub fn histogram(&self) -> &BindingHistogram {
        self.pool.histogram()
    }

    pub fn pipeline(&self) -> &Arc<dyn PipelineLayout> {
        &self.pipeline
    }

    // ===== INTERNALS =====

    fn assert_open(&self, operation: &str) {
        if self.state != HelperState::Open {
            binder_error!(SOURCE, "BindHelper::{} called after commit", operation);
            panic!("BindHelper::{} called after commit", operation);
        }
    }

    fn validate_slot(&self, set: u32, binding: u32, kind: BindingKind) -> Result<()> {
        let declared = self.pipeline.declared_set_count();
        if set >= declared {
            return Err(Error::InvalidSetIndex { set, declared });
        }

        let reflected = self
            .pipeline
            .reflection()
            .binding(set, binding)
            .ok_or(Error::UnknownBinding { set, binding })?;
        if reflected.kind != kind {
            return Err(Error::BindingKindMismatch {
                set,
                binding,
                expected: reflected.kind,
                found: kind,
            });
        }

        if self.written.contains(&(set, binding)) {
            return Err(Error::SlotAlreadyWritten { set, binding });
        }
        Ok(())
    }

    fn attach_image(
        &mut self,
        set: u32,
        binding: u32,
        kind: BindingKind,
        desc: ImageViewDesc,
        layout: ImageLayout,
        sampler: Option<SamplerHandle>,
    ) -> Result<()> {
        let view = self.device.create_image_view(&desc)?;
        self.views.register(TransientView {
            handle: TransientHandle::ImageView(view),
            set,
            binding,
        });
        self.write_slot(set, binding, kind, BindingPayload::Image { view, layout, sampler })
    }

    fn attach_buffer(
        &mut self,
        set: u32,
        binding: u32,
        kind: BindingKind,
        buffer: &dyn Buffer,
        offset: u64,
        range: u64,
    ) -> Result<()> {
        self.validate_slot(set, binding, kind)?;
        check_range(buffer, offset, range)?;
        let payload = BindingPayload::Buffer {
            buffer: buffer.handle(),
            offset,
            range,
        };
        self.write_slot(set, binding, kind, payload)
    }

    #[allow(clippy::too_many_arguments)]
    fn attach_texel_buffer(
        &mut self,
        set: u32,
        binding: u32,
        kind: BindingKind,
        buffer: &dyn Buffer,
        format: Format,
        offset: u64,
        range: u64,
    ) -> Result<()> {
        self.validate_slot(set, binding, kind)?;
        check_range(buffer, offset, range)?;

        let view = self.device.create_buffer_view(&BufferViewDesc {
            buffer: buffer.handle(),
            format,
            offset,
            range,
        })?;
        self.views.register(TransientView {
            handle: TransientHandle::BufferView(view),
            set,
            binding,
        });
        self.write_slot(set, binding, kind, BindingPayload::TexelBuffer(view))
    }

    fn write_slot(&mut self, set: u32, binding: u32, kind: BindingKind, payload: BindingPayload) -> Result<()> {
        let table = self.pool.get_or_create(set)?;
        self.device.write_binding(&BindingWrite {
            table,
            binding,
            kind,
            payload,
        });
        self.written.insert((set, binding));
        binder_trace!(SOURCE, "Wrote {:?} at set {} binding {}", kind, set, binding);
        Ok(())
    }

    fn publish(&self, stream: CommandStreamHandle) -> usize {
        let bind_point = self.pipeline.bind_point();
        let layout = self.pipeline.handle();
        let mut published = 0;
        for set in 0..self.pipeline.declared_set_count() {
            if let Some(table) = self.pool.table(set) {
                self.device.bind_binding_table(stream, bind_point, layout, set, table);
                published += 1;
            }
        }
        published
    }
}

impl Drop for BindHelper {
    fn drop(&mut self) {
        // Pool before views
        self.pool.destroy();
        self.views.release_all(self.device.as_ref());
    }
}

/// Resolve the view of an image, defaulting range and view type from the image
fn image_view_desc(
    image: &dyn Image,
    range: Option<SubresourceRange>,
    view_type: Option<ImageViewType>,
) -> Result<ImageViewDesc> {
    let view_type = match view_type {
        Some(view_type) => view_type,
        None => ImageViewType::default_for(image.image_type())?,
    };
    Ok(ImageViewDesc {
        image: image.handle(),
        view_type,
        format: image.format(),
        subresource_range: range.unwrap_or_else(|| image.default_view_range()),
    })
}

fn check_range(buffer: &dyn Buffer, offset: u64, range: u64) -> Result<()> {
    let size = buffer.size();
    let fits = if range == WHOLE_SIZE {
        offset < size
    } else {
        range > 0 && offset.checked_add(range).is_some_and(|end| end <= size)
    };
    if fits {
        Ok(())
    } else {
        Err(Error::InvalidRange { offset, range, size })
    }
}

#[cfg(test)]
#[path = "bind_helper_tests.rs"]
mod tests;
