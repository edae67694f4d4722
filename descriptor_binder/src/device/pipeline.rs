/// Pipeline layout trait
///
/// The binder consumes a pipeline's declared layout (one set layout per
/// declared set index) together with the reflection it was built from.

use crate::device::{PipelineLayoutHandle, SetLayoutHandle, PipelineReflection};

/// Pipeline kind the tables are bound for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindPoint {
    /// Graphics pipeline
    Graphics,
    /// Compute pipeline
    Compute,
}

/// Pipeline layout trait
///
/// Implemented by backend-specific pipeline layouts (e.g., VulkanPipelineLayout).
/// Must stay immutable for as long as any helper built from it is alive.
pub trait PipelineLayout: Send + Sync {
    /// Native pipeline layout handle
    fn handle(&self) -> PipelineLayoutHandle;

    /// Graphics or compute
    fn bind_point(&self) -> BindPoint;

    /// One table shape per declared set index
    ///
    /// The length is the declared set count, which may exceed the number of
    /// sets referenced by reflection.
    fn set_layouts(&self) -> &[SetLayoutHandle];

    /// Reflected bindings the layout was built from
    fn reflection(&self) -> &PipelineReflection;

    /// Number of declared sets
    fn declared_set_count(&self) -> u32 {
        self.set_layouts().len() as u32
    }
}
