//! Error types for the descriptor binder
//!
//! This module defines the error type used throughout the crate, covering
//! device failures, pool exhaustion, and invalid attachment requests.
//!
//! Protocol violations (attaching after commit, committing twice) are not
//! represented here: they are programmer errors and panic at the call site.

use std::fmt;

use crate::device::{BindingKind, ImageType};

/// Result type for descriptor binder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Descriptor binder errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock device, etc.)
    BackendError(String),

    /// The device ran out of memory while creating a pool, table or view
    OutOfMemory,

    /// A binding table could not be allocated from a pool sized from reflection
    PoolExhausted {
        /// Set index whose table allocation failed
        set: u32,
    },

    /// Initialization failed (context, pool, subsystems)
    InitializationFailed(String),

    /// Invalid resource (image, buffer, sampler, etc.)
    InvalidResource(String),

    /// The image dimensionality has no default view type
    UnsupportedImageType(ImageType),

    /// The set index is not declared by the pipeline layout
    InvalidSetIndex {
        /// Requested set index
        set: u32,
        /// Number of sets declared by the pipeline layout
        declared: u32,
    },

    /// The (set, binding) pair does not appear in the reflected layout
    UnknownBinding {
        /// Set index
        set: u32,
        /// Binding index
        binding: u32,
    },

    /// The reflected kind of a slot differs from the kind being attached
    BindingKindMismatch {
        /// Set index
        set: u32,
        /// Binding index
        binding: u32,
        /// Kind declared by reflection
        expected: BindingKind,
        /// Kind of the attachment call
        found: BindingKind,
    },

    /// The slot has already been written by an earlier attachment
    SlotAlreadyWritten {
        /// Set index
        set: u32,
        /// Binding index
        binding: u32,
    },

    /// A buffer range does not fit inside the buffer
    InvalidRange {
        /// Offset in bytes
        offset: u64,
        /// Range in bytes
        range: u64,
        /// Buffer size in bytes
        size: u64,
    },
}

impl Error {
    /// Returns true for device-level resource exhaustion
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Error::OutOfMemory | Error::PoolExhausted { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::PoolExhausted { set } => {
                write!(f, "Binding pool exhausted while allocating the table for set {}", set)
            }
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::UnsupportedImageType(ty) => {
                write!(f, "Unsupported image type: {:?} has no default view type", ty)
            }
            Error::InvalidSetIndex { set, declared } => {
                write!(f, "Invalid set index {} (pipeline layout declares {} sets)", set, declared)
            }
            Error::UnknownBinding { set, binding } => {
                write!(f, "Unknown binding: set {} binding {} is not in the reflected layout", set, binding)
            }
            Error::BindingKindMismatch { set, binding, expected, found } => write!(
                f,
                "Binding kind mismatch at set {} binding {}: reflected {:?}, attached {:?}",
                set, binding, expected, found
            ),
            Error::SlotAlreadyWritten { set, binding } => {
                write!(f, "Slot already written: set {} binding {}", set, binding)
            }
            Error::InvalidRange { offset, range, size } => write!(
                f,
                "Invalid buffer range: offset {} + range {} exceeds buffer size {}",
                offset, range, size
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
