/// SPIR-V reflection with spirq
///
/// Produces the `PipelineReflection` a binder pool is sized from. Each shader
/// stage is reflected on its own; graphics pipelines merge their stages with
/// `PipelineReflection::merge`.

use spirq::ty::DescriptorType;
use spirq::var::Variable;

use descriptor_binder::binder::Result;
use descriptor_binder::binder::device::{
    BindingKind, PipelineReflection, ReflectedBinding, ShaderStageFlags,
};
use descriptor_binder::{binder_bail, binder_err, binder_trace};

const SOURCE: &str = "binder::vulkan";

/// Reflect one SPIR-V module
///
/// Every descriptor variable of every entry point is recorded with `stages`,
/// including resources the entry point never touches.
pub fn reflect_spirv(code: &[u32], stages: ShaderStageFlags) -> Result<PipelineReflection> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| binder_err!(SOURCE, "SPIR-V reflection failed: {:?}", e))?;

    let mut reflection = PipelineReflection::new();

    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let Variable::Descriptor { name, desc_bind, desc_ty, nbind, .. } = var {
                let kind = descriptor_type_to_kind(desc_ty)?;
                let binding = ReflectedBinding::new(desc_bind.bind(), kind, (*nbind).max(1), stages)
                    .with_name(name.clone().unwrap_or_default());

                binder_trace!(
                    SOURCE,
                    "Reflected {:?} at set {} binding {} ({})",
                    kind, desc_bind.set(), desc_bind.bind(), entry_point.name
                );
                reflection.add_binding(desc_bind.set(), binding)?;
            }
        }
    }

    Ok(reflection)
}

/// Reflect SPIR-V given as raw bytes (e.g. read from a .spv file)
pub fn reflect_spirv_bytes(bytes: &[u8], stages: ShaderStageFlags) -> Result<PipelineReflection> {
    reflect_spirv(&spirv_words(bytes)?, stages)
}

/// Reinterpret little-endian SPIR-V bytes as words
pub fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        binder_bail!(SOURCE, "SPIR-V byte length {} is not a multiple of 4", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Convert a spirq descriptor type to a binding kind
fn descriptor_type_to_kind(desc_ty: &DescriptorType) -> Result<BindingKind> {
    match desc_ty {
        DescriptorType::Sampler() => Ok(BindingKind::Sampler),
        DescriptorType::CombinedImageSampler() => Ok(BindingKind::CombinedImageSampler),
        DescriptorType::SampledImage() => Ok(BindingKind::SampledImage),
        DescriptorType::StorageImage(..) => Ok(BindingKind::StorageImage),
        DescriptorType::UniformTexelBuffer() => Ok(BindingKind::UniformTexelBuffer),
        DescriptorType::StorageTexelBuffer(..) => Ok(BindingKind::StorageTexelBuffer),
        DescriptorType::UniformBuffer() => Ok(BindingKind::UniformBuffer),
        DescriptorType::StorageBuffer(..) => Ok(BindingKind::StorageBuffer),
        other => {
            binder_bail!(SOURCE, "Unsupported descriptor type in shader: {:?}", other);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_reflection_tests.rs"]
mod tests;
