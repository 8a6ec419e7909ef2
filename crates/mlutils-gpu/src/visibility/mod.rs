//! Visibility selection over enumerated devices
//!
//! Validates a caller's requested ordinals against the device count and
//! publishes the accepted set through the two environment variables that
//! downstream compute frameworks read at their own initialization time.

#[cfg(test)]
mod tests;

use crate::driver::{CudaDriver, DeviceEnumerator};
use crate::{Error, Result};
use parking_lot::Mutex;
use tracing::warn;

/// Environment variable fixing ordinal-to-bus-address ordering
pub const DEVICE_ORDER_VAR: &str = "CUDA_DEVICE_ORDER";

/// Value of [`DEVICE_ORDER_VAR`]: ordinal 0 always means the same physical
/// device across runs
pub const PCI_BUS_ID: &str = "PCI_BUS_ID";

/// Environment variable listing the visible device ordinals
pub const VISIBLE_DEVICES_VAR: &str = "CUDA_VISIBLE_DEVICES";

/// Sentinel value of [`VISIBLE_DEVICES_VAR`] advertising zero visible devices
pub const CPU_ONLY_SENTINEL: &str = "-1";

/// A caller's desired set of device ordinals
///
/// A bare ordinal normalizes to a one-element sequence; order is preserved
/// through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuRequest(Vec<u32>);

impl GpuRequest {
    /// Requested ordinals, in request order
    pub fn ordinals(&self) -> &[u32] {
        &self.0
    }
}

impl From<u32> for GpuRequest {
    fn from(ordinal: u32) -> Self {
        Self(vec![ordinal])
    }
}

impl From<Vec<u32>> for GpuRequest {
    fn from(ordinals: Vec<u32>) -> Self {
        Self(ordinals)
    }
}

impl From<&[u32]> for GpuRequest {
    fn from(ordinals: &[u32]) -> Self {
        Self(ordinals.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for GpuRequest {
    fn from(ordinals: [u32; N]) -> Self {
        Self(ordinals.to_vec())
    }
}

/// Destination for validated visibility state
///
/// `publish` receives the full visible-device list (comma-joined ordinals
/// or [`CPU_ONLY_SENTINEL`]) and must apply it together with the ordering
/// key as one observable update. Implementations are only ever invoked
/// after validation succeeds, so a failed selection leaves the previous
/// state untouched.
pub trait VisibilitySink {
    /// Publish the device-order key and the visible-device list together
    fn publish(&self, devices: &str);
}

/// Publishes visibility state into the process environment
///
/// Both variables are written under one process-wide lock so a concurrently
/// initializing framework can never observe the pair half-updated.
#[derive(Debug, Default)]
pub struct EnvSink;

static ENV_LOCK: Mutex<()> = Mutex::new(());

impl VisibilitySink for EnvSink {
    fn publish(&self, devices: &str) {
        let _guard = ENV_LOCK.lock();
        std::env::set_var(DEVICE_ORDER_VAR, PCI_BUS_ID);
        std::env::set_var(VISIBLE_DEVICES_VAR, devices);
    }
}

/// Expose the requested GPU ordinals to downstream compute frameworks
///
/// Enumerates physically present devices through the process-wide driver,
/// keeps the requested ordinals that fall inside `[0, count)` in request
/// order, and publishes them as `CUDA_VISIBLE_DEVICES` (with
/// `CUDA_DEVICE_ORDER=PCI_BUS_ID`). Out-of-range ordinals are warned about
/// and skipped, not fatal on their own.
///
/// # Errors
/// - driver errors from the lazy open/init propagate unchanged
/// - [`Error::NoDeviceAvailable`] if the driver reports zero devices
/// - [`Error::NoRequestedDeviceAvailable`] if every ordinal was rejected
///
/// On any error the environment is left exactly as it was.
pub fn select_gpus(request: impl Into<GpuRequest>) -> Result<()> {
    select_gpus_with(CudaDriver::global()?, &EnvSink, request)
}

/// [`select_gpus`] against an injected enumerator and sink
pub fn select_gpus_with(
    enumerator: &dyn DeviceEnumerator,
    sink: &dyn VisibilitySink,
    request: impl Into<GpuRequest>,
) -> Result<()> {
    let request = request.into();
    let count = enumerator.device_count()?;
    if count == 0 {
        return Err(Error::NoDeviceAvailable);
    }

    let mut accepted: Vec<u32> = Vec::with_capacity(request.ordinals().len());
    for &ordinal in request.ordinals() {
        if ordinal < count {
            accepted.push(ordinal);
        } else {
            warn!(ordinal, count, "GPU {ordinal} is not available");
        }
    }

    if accepted.is_empty() {
        return Err(Error::NoRequestedDeviceAvailable {
            requested: request.ordinals().to_vec(),
            count,
        });
    }

    let devices = accepted
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    sink.publish(&devices);
    Ok(())
}

/// Hide every GPU from downstream compute frameworks
///
/// Publishes the [`CPU_ONLY_SENTINEL`] unconditionally. Touches no driver
/// state and never fails; disabling visibility needs no hardware query.
pub fn select_cpu_only() {
    select_cpu_only_with(&EnvSink);
}

/// [`select_cpu_only`] against an injected sink
pub fn select_cpu_only_with(sink: &dyn VisibilitySink) {
    sink.publish(CPU_ONLY_SENTINEL);
}
