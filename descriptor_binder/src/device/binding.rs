/// Reflected binding layout of a pipeline
///
/// Reflection produces, per set index, the ordered list of bindings a
/// pipeline declares. The binder reads it once to size its pool and to
/// validate attachments; it never decides what a pipeline needs.

use std::collections::BTreeMap;
use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

// ============================================================================
// Binding kinds and stage flags
// ============================================================================

/// Type of resource bound at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    /// Standalone sampler
    Sampler,
    /// Combined image sampler (texture + sampler in one binding)
    CombinedImageSampler,
    /// Sampled image without a sampler
    SampledImage,
    /// Storage image (read/write, general layout)
    StorageImage,
    /// Read-only texel buffer
    UniformTexelBuffer,
    /// Read/write texel buffer
    StorageTexelBuffer,
    /// Uniform buffer (read-only structured data)
    UniformBuffer,
    /// Storage buffer (read/write structured data)
    StorageBuffer,
}

impl BindingKind {
    /// Every kind, in declaration order
    pub const ALL: [BindingKind; 8] = [
        BindingKind::Sampler,
        BindingKind::CombinedImageSampler,
        BindingKind::SampledImage,
        BindingKind::StorageImage,
        BindingKind::UniformTexelBuffer,
        BindingKind::StorageTexelBuffer,
        BindingKind::UniformBuffer,
        BindingKind::StorageBuffer,
    ];

    /// Attaching this kind creates an image view
    pub fn requires_image_view(&self) -> bool {
        matches!(
            self,
            BindingKind::CombinedImageSampler | BindingKind::SampledImage | BindingKind::StorageImage
        )
    }

    /// Attaching this kind creates a buffer view
    pub fn requires_buffer_view(&self) -> bool {
        matches!(self, BindingKind::UniformTexelBuffer | BindingKind::StorageTexelBuffer)
    }

    /// Attaching this kind creates a transient view of any sort
    pub fn requires_view(&self) -> bool {
        self.requires_image_view() || self.requires_buffer_view()
    }
}

bitflags! {
    /// Shader stages that access a binding
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x01;
        const FRAGMENT = 0x02;
        const COMPUTE = 0x04;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

// ============================================================================
// Reflected bindings
// ============================================================================

/// One reflected binding slot (one per set/binding pair)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedBinding {
    /// Binding number (corresponds to `layout(binding = N)` in GLSL)
    pub binding: u32,
    /// Type of resource at this binding
    pub kind: BindingKind,
    /// Number of descriptors at this binding (>1 for arrays)
    pub count: u32,
    /// Shader stages that access this binding
    pub stages: ShaderStageFlags,
    /// Variable name from the shader (empty when stripped)
    pub name: String,
}

impl ReflectedBinding {
    /// Create a binding with an empty name
    pub fn new(binding: u32, kind: BindingKind, count: u32, stages: ShaderStageFlags) -> Self {
        Self {
            binding,
            kind,
            count,
            stages,
            name: String::new(),
        }
    }

    /// Builder-style name setter
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Reflected layout of a whole pipeline: set index -> ordered bindings
///
/// Sets that no shader references are simply absent; the pipeline layout may
/// still declare them (see `PipelineLayout::set_layouts`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReflection {
    sets: BTreeMap<u32, Vec<ReflectedBinding>>,
}

impl PipelineReflection {
    /// Create an empty reflection
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of `new`, reads better at call sites that mean "no bindings"
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a binding to `set`, keeping each set ordered by binding index
    ///
    /// Adding the same (set, binding) twice merges stage flags when the kinds
    /// agree (vertex + fragment sharing a uniform buffer), and fails otherwise.
    /// The descriptor count keeps the larger of the two declarations.
    pub fn add_binding(&mut self, set: u32, binding: ReflectedBinding) -> Result<()> {
        let bindings = self.sets.entry(set).or_default();
        match bindings.binary_search_by_key(&binding.binding, |b| b.binding) {
            Ok(index) => {
                let existing = &mut bindings[index];
                if existing.kind != binding.kind {
                    return Err(Error::BindingKindMismatch {
                        set,
                        binding: binding.binding,
                        expected: existing.kind,
                        found: binding.kind,
                    });
                }
                existing.stages |= binding.stages;
                existing.count = existing.count.max(binding.count);
                if existing.name.is_empty() {
                    existing.name = binding.name;
                }
            }
            Err(index) => bindings.insert(index, binding),
        }
        Ok(())
    }

    /// Builder-style variant of `add_binding`
    pub fn with_binding(mut self, set: u32, binding: ReflectedBinding) -> Result<Self> {
        self.add_binding(set, binding)?;
        Ok(self)
    }

    /// Merge another reflection (e.g. the fragment stage) into this one
    pub fn merge(&mut self, other: &PipelineReflection) -> Result<()> {
        for (&set, bindings) in &other.sets {
            for binding in bindings {
                self.add_binding(set, binding.clone())?;
            }
        }
        Ok(())
    }

    /// Bindings of `set` ordered by binding index (empty if the set is unused)
    pub fn set_bindings(&self, set: u32) -> &[ReflectedBinding] {
        self.sets.get(&set).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a single binding
    pub fn binding(&self, set: u32, binding: u32) -> Option<&ReflectedBinding> {
        let bindings = self.sets.get(&set)?;
        bindings
            .binary_search_by_key(&binding, |b| b.binding)
            .ok()
            .map(|index| &bindings[index])
    }

    /// Iterate referenced sets in ascending set order
    pub fn sets(&self) -> impl Iterator<Item = (u32, &[ReflectedBinding])> {
        self.sets.iter().map(|(&set, bindings)| (set, bindings.as_slice()))
    }

    /// Number of referenced sets
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Highest referenced set index, if any
    pub fn max_set(&self) -> Option<u32> {
        self.sets.keys().next_back().copied()
    }

    /// True when no set is referenced
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Histogram of descriptor counts per kind across every set
    pub fn binding_histogram(&self) -> BindingHistogram {
        BindingHistogram::from_reflection(self)
    }
}

// ============================================================================
// Histogram and pool sizes
// ============================================================================

/// Number of descriptors of one kind a pool must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSize {
    /// Descriptor kind
    pub kind: BindingKind,
    /// Descriptor count
    pub count: u32,
}

/// Resource kind -> total descriptor count
///
/// Zero-count bindings contribute nothing, so every entry is non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingHistogram {
    counts: FxHashMap<BindingKind, u32>,
}

impl BindingHistogram {
    /// Sum `count` per kind over every binding of every set
    pub fn from_reflection(reflection: &PipelineReflection) -> Self {
        let mut histogram = Self::default();
        for (_, bindings) in reflection.sets() {
            for binding in bindings {
                histogram.add(binding.kind, binding.count);
            }
        }
        histogram
    }

    /// Add `count` descriptors of `kind`
    ///
    /// Counts saturate at `u32::MAX`; the device then refuses the pool
    /// instead of getting an undersized one.
    pub fn add(&mut self, kind: BindingKind, count: u32) {
        if count == 0 {
            return;
        }
        let entry = self.counts.entry(kind).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Descriptor count for `kind` (0 if absent)
    pub fn get(&self, kind: BindingKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total descriptors over all kinds
    pub fn total(&self) -> u32 {
        self.counts.values().fold(0, |total, &count| total.saturating_add(count))
    }

    /// Number of distinct kinds
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when no descriptor is declared
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Pool sizes sorted by kind
    pub fn pool_sizes(&self) -> Vec<PoolSize> {
        let mut sizes: Vec<PoolSize> = self
            .counts
            .iter()
            .map(|(&kind, &count)| PoolSize { kind, count })
            .collect();
        sizes.sort_by_key(|size| size.kind);
        sizes
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
