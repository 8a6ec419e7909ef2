//! CUDA device discovery and visibility selection
//!
//! This crate decides which GPU ordinals later-initialized compute
//! frameworks are allowed to see. It does no work on a device itself:
//!
//! - Driver binding: loads the platform CUDA driver library once per
//!   process and exposes `init` / `device_count` over its C ABI
//! - Visibility selector: validates requested ordinals against the
//!   enumerated device count and publishes the result through
//!   `CUDA_DEVICE_ORDER` / `CUDA_VISIBLE_DEVICES`
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> mlutils_gpu::Result<()> {
//! // Expose GPUs 0 and 2 to whatever initializes CUDA next.
//! mlutils_gpu::select_gpus(vec![0, 2])?;
//!
//! // Or run on CPU only.
//! mlutils_gpu::select_cpu_only();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod driver;
pub mod visibility;

pub use driver::{library_name, CudaDriver, DeviceEnumerator};
pub use visibility::{
    select_cpu_only, select_cpu_only_with, select_gpus, select_gpus_with, EnvSink, GpuRequest,
    VisibilitySink, CPU_ONLY_SENTINEL, DEVICE_ORDER_VAR, PCI_BUS_ID, VISIBLE_DEVICES_VAR,
};

/// Result type for GPU discovery and selection
pub type Result<T> = std::result::Result<T, Error>;

/// GPU discovery and selection errors
///
/// `Clone` because the outcome of the once-per-process driver open is
/// cached and handed out to every later caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Host platform has no known CUDA driver library name
    #[error("no known CUDA driver library for platform `{platform}`")]
    UnsupportedPlatform {
        /// Unrecognized platform identifier
        platform: String,
    },

    /// The driver library could not be loaded at all
    #[error("CUDA is not available on this device: {message}")]
    DriverUnavailable {
        /// Loader error text
        message: String,
    },

    /// A driver entry point returned a non-zero status
    #[error("{call} failed with error code {code}: {message}")]
    DriverCallFailed {
        /// Name of the originating driver call
        call: &'static str,
        /// Raw status code, the only locale-independent signal
        code: i32,
        /// Message decoded via cuGetErrorString
        message: String,
    },

    /// The driver enumerated zero devices
    #[error("GPU is not available")]
    NoDeviceAvailable,

    /// Every requested ordinal was rejected during validation
    #[error("GPU(s) {requested:?} not available, valid ordinals are 0..{count}")]
    NoRequestedDeviceAvailable {
        /// Ordinals the caller asked for
        requested: Vec<u32>,
        /// Device count at validation time; valid ordinals are `[0, count)`
        count: u32,
    },
}
