/// Device module - backend-agnostic handles, resources and the device surface

// Module declarations
pub mod handles;
pub mod binding;
pub mod image;
pub mod buffer;
pub mod pipeline;
pub mod binding_device;
pub mod config;

// Re-export everything
pub use handles::*;
pub use binding::*;
pub use image::*;
pub use buffer::*;
pub use pipeline::*;
pub use binding_device::*;
pub use config::*;

// Mock binding device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
