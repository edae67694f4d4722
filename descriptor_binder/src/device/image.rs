/// Image trait, image formats, view types and sub-resource ranges
///
/// Images are owned by the caller. The binder only reads their handle,
/// format, dimensionality and extent to create transient views.

use bitflags::bitflags;

use crate::device::ImageHandle;
use crate::error::{Error, Result};

// ===== FORMATS =====

/// Image and texel buffer format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Format {
    // Color formats
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    R32_UINT,
    R32G32_SFLOAT,
    R32G32B32A32_SFLOAT,

    // Depth/stencil formats
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl Format {
    /// Aspects present in this format
    pub fn aspects(&self) -> ImageAspects {
        match self {
            Format::D16_UNORM | Format::D32_FLOAT => ImageAspects::DEPTH,
            Format::D24_UNORM_S8_UINT | Format::D32_FLOAT_S8_UINT => {
                ImageAspects::DEPTH | ImageAspects::STENCIL
            }
            _ => ImageAspects::COLOR,
        }
    }

    /// Aspects a binding view of this format may address
    ///
    /// A descriptor view must not select depth and stencil together, so
    /// depth/stencil formats are viewed through their depth aspect.
    pub fn view_aspects(&self) -> ImageAspects {
        let aspects = self.aspects();
        if aspects.contains(ImageAspects::DEPTH) {
            ImageAspects::DEPTH
        } else {
            aspects
        }
    }

    /// True for depth and depth/stencil formats
    pub fn is_depth(&self) -> bool {
        self.aspects().contains(ImageAspects::DEPTH)
    }
}

bitflags! {
    /// Image aspects addressed by a view
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspects: u32 {
        const COLOR = 0x01;
        const DEPTH = 0x02;
        const STENCIL = 0x04;
    }
}

// ===== DIMENSIONALITY =====

/// Native dimensionality of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    /// 1D image
    Type1D,
    /// 2D image
    Type2D,
    /// 3D image
    Type3D,
    /// Backend value with no portable meaning (raw backend enum value)
    Other(i32),
}

/// Shape of an image view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageViewType {
    Type1D,
    Type2D,
    Type3D,
    Cube,
    Type1DArray,
    Type2DArray,
    CubeArray,
}

impl ImageViewType {
    /// Default view type for an image of the given dimensionality
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedImageType` when the image type has no view counterpart.
    pub fn default_for(image_type: ImageType) -> Result<Self> {
        match image_type {
            ImageType::Type1D => Ok(ImageViewType::Type1D),
            ImageType::Type2D => Ok(ImageViewType::Type2D),
            ImageType::Type3D => Ok(ImageViewType::Type3D),
            ImageType::Other(_) => Err(Error::UnsupportedImageType(image_type)),
        }
    }

    /// True for the array and cube view types
    pub fn is_layered(&self) -> bool {
        matches!(
            self,
            ImageViewType::Cube
                | ImageViewType::Type1DArray
                | ImageViewType::Type2DArray
                | ImageViewType::CubeArray
        )
    }
}

/// Layout an image is expected to be in when accessed through a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// General layout (storage images)
    General,
    /// Read-only layout for sampling
    ShaderReadOnlyOptimal,
}

// ===== SUB-RESOURCES =====

/// Range of mip levels and array layers addressed by a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceRange {
    /// Aspects
    pub aspects: ImageAspects,
    /// First mip level
    pub base_mip_level: u32,
    /// Number of mip levels
    pub level_count: u32,
    /// First array layer
    pub base_array_layer: u32,
    /// Number of array layers
    pub layer_count: u32,
}

impl SubresourceRange {
    /// Single mip level 0, all of `layer_count` layers, color aspect
    pub fn first_mip_color(layer_count: u32) -> Self {
        Self {
            aspects: ImageAspects::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count,
        }
    }
}

// ===== IMAGE TRAIT =====

/// Image resource trait
///
/// Implemented by backend-specific image types (e.g., VulkanImage) and by
/// anything else that can hand out a native image handle.
pub trait Image: Send + Sync {
    /// Native image handle
    fn handle(&self) -> ImageHandle;

    /// Pixel format
    fn format(&self) -> Format;

    /// Native dimensionality
    fn image_type(&self) -> ImageType;

    /// Number of mip levels
    fn mip_levels(&self) -> u32;

    /// Number of array layers
    fn array_layers(&self) -> u32;

    /// Range covering every mip level and layer of the image
    fn whole_subresource_range(&self) -> SubresourceRange {
        SubresourceRange {
            aspects: self.format().aspects(),
            base_mip_level: 0,
            level_count: self.mip_levels(),
            base_array_layer: 0,
            layer_count: self.array_layers(),
        }
    }

    /// Whole-image range usable by a binding view
    fn default_view_range(&self) -> SubresourceRange {
        SubresourceRange {
            aspects: self.format().view_aspects(),
            ..self.whole_subresource_range()
        }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
