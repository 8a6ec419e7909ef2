//! Dynamic binding to the CUDA driver library
//!
//! Loads `libcuda` at runtime and wraps the three entry points this crate
//! needs: `cuInit`, `cuDeviceGetCount`, and `cuGetErrorString`. No CUDA
//! headers or link-time dependency, so builds succeed on machines without
//! the driver installed; only [`CudaDriver::open`] requires it.

use crate::{Error, Result};
use libloading::Library;
use std::ffi::{c_char, c_int, c_uint, CStr};
use std::sync::OnceLock;
use tracing::debug;

type CuInitFn = unsafe extern "C" fn(c_uint) -> c_int;
type CuDeviceGetCountFn = unsafe extern "C" fn(*mut c_int) -> c_int;
type CuGetErrorStringFn = unsafe extern "C" fn(c_int, *mut *const c_char) -> c_int;

/// Resolve the CUDA driver library filename for a platform identifier
///
/// Pure function of the platform string so it stays testable on any host.
/// Accepts both Rust (`macos`, `windows`) and Python-style (`darwin`,
/// `win32`) identifiers.
///
/// # Errors
/// Returns [`Error::UnsupportedPlatform`] for any unrecognized platform.
pub fn library_name(os: &str) -> Result<&'static str> {
    // "darwin" contains "win", so the mac check must come first.
    if os.contains("linux") {
        Ok("libcuda.so")
    } else if os.contains("darwin") || os.contains("mac") {
        Ok("libcuda.dylib")
    } else if os.contains("win") {
        Ok("cuda.dll")
    } else {
        Err(Error::UnsupportedPlatform {
            platform: os.to_string(),
        })
    }
}

/// Anything that can report how many compute devices are present
///
/// The visibility selector depends on this seam instead of [`CudaDriver`]
/// directly, so it can be exercised without real hardware.
pub trait DeviceEnumerator {
    /// Number of physically present devices, queried fresh
    fn device_count(&self) -> Result<u32>;
}

/// A loaded, initialized CUDA driver library
///
/// Holds the library handle for the lifetime of the value; the resolved
/// function pointers stay valid only while the handle is alive.
pub struct CudaDriver {
    _library: Library,
    cu_device_get_count: CuDeviceGetCountFn,
    cu_get_error_string: CuGetErrorStringFn,
}

impl CudaDriver {
    /// Load the platform driver library and initialize it
    ///
    /// # Errors
    /// - [`Error::UnsupportedPlatform`] if the host OS is unknown
    /// - [`Error::DriverUnavailable`] if the library cannot be loaded or
    ///   lacks the expected symbols (no driver on this machine)
    /// - [`Error::DriverCallFailed`] if `cuInit` returns non-zero
    pub fn open() -> Result<Self> {
        let name = library_name(std::env::consts::OS)?;
        debug!(library = name, "loading CUDA driver");

        let library = unsafe { Library::new(name) }.map_err(|e| Error::DriverUnavailable {
            message: e.to_string(),
        })?;

        let cu_init: CuInitFn = Self::symbol(&library, b"cuInit\0")?;
        let cu_device_get_count = Self::symbol(&library, b"cuDeviceGetCount\0")?;
        let cu_get_error_string = Self::symbol(&library, b"cuGetErrorString\0")?;

        let driver = Self {
            _library: library,
            cu_device_get_count,
            cu_get_error_string,
        };
        driver.initialize(cu_init)?;
        Ok(driver)
    }

    /// The process-wide driver instance, opened and initialized lazily
    ///
    /// The first call performs the open/init sequence; every later call
    /// (from any thread) observes that first outcome. The driver is never
    /// re-initialized within a process.
    ///
    /// # Errors
    /// Whatever [`CudaDriver::open`] returned on first use.
    pub fn global() -> Result<&'static CudaDriver> {
        static DRIVER: OnceLock<Result<CudaDriver>> = OnceLock::new();
        DRIVER.get_or_init(CudaDriver::open).as_ref().map_err(Error::clone)
    }

    /// Query how many CUDA devices are physically present
    ///
    /// Not cached: topology is whatever the driver reports right now.
    ///
    /// # Errors
    /// [`Error::DriverCallFailed`] if `cuDeviceGetCount` returns non-zero.
    pub fn device_count(&self) -> Result<u32> {
        let mut count: c_int = 0;
        let status = unsafe { (self.cu_device_get_count)(&mut count) };
        if status != 0 {
            return Err(self.call_failed(status, "cuDeviceGetCount"));
        }
        Ok(count.max(0) as u32)
    }

    fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T> {
        let sym = unsafe { library.get::<T>(name) }.map_err(|e| Error::DriverUnavailable {
            message: e.to_string(),
        })?;
        Ok(*sym)
    }

    fn initialize(&self, cu_init: CuInitFn) -> Result<()> {
        let status = unsafe { cu_init(0) };
        if status != 0 {
            return Err(self.call_failed(status, "cuInit"));
        }
        debug!("CUDA driver initialized");
        Ok(())
    }

    /// Translate a non-zero status into a structured failure, decoding the
    /// message through `cuGetErrorString`. The lookup itself is treated as
    /// infallible; a null message degrades to a placeholder.
    fn call_failed(&self, code: c_int, call: &'static str) -> Error {
        let mut text: *const c_char = std::ptr::null();
        let _ = unsafe { (self.cu_get_error_string)(code, &mut text) };
        let message = if text.is_null() {
            "unknown error".to_string()
        } else {
            unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
        };
        Error::DriverCallFailed { call, code, message }
    }
}

impl DeviceEnumerator for CudaDriver {
    fn device_count(&self) -> Result<u32> {
        CudaDriver::device_count(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_name_linux() {
        assert_eq!(library_name("linux").unwrap(), "libcuda.so");
    }

    #[test]
    fn library_name_mac() {
        assert_eq!(library_name("darwin").unwrap(), "libcuda.dylib");
        assert_eq!(library_name("macos").unwrap(), "libcuda.dylib");
    }

    #[test]
    fn library_name_windows() {
        assert_eq!(library_name("windows").unwrap(), "cuda.dll");
        assert_eq!(library_name("win32").unwrap(), "cuda.dll");
    }

    #[test]
    fn library_name_unknown_platform() {
        let err = library_name("plan9").unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedPlatform { ref platform } if platform == "plan9"
        ));
    }

    #[test]
    fn global_outcome_is_sticky() {
        // Whatever the first call decided (driver present or not), the
        // second call must agree; the open sequence runs at most once.
        let first = CudaDriver::global().is_ok();
        let second = CudaDriver::global().is_ok();
        assert_eq!(first, second);
    }
}
