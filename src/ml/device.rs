//! Device selection for ML inference
//!
//! Picks the best compute device compiled into this build: CUDA, then Metal,
//! then CPU.

use candle_core::Device;
use serde::{Deserialize, Serialize};

/// Device types supported for ML inference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference
    Cpu,
    /// CUDA GPU inference
    Cuda(usize),
    /// Metal GPU inference (macOS)
    Metal,
}

impl DeviceType {
    /// Detect the best available device type
    pub fn detect() -> Self {
        if candle_core::utils::cuda_is_available() {
            DeviceType::Cuda(0)
        } else if candle_core::utils::metal_is_available() {
            DeviceType::Metal
        } else {
            DeviceType::Cpu
        }
    }

    /// Instantiate the candle device, falling back to CPU on failure
    pub fn to_device(self) -> Device {
        let device = match self {
            DeviceType::Cpu => return Device::Cpu,
            DeviceType::Cuda(ordinal) => Device::new_cuda(ordinal),
            DeviceType::Metal => Device::new_metal(0),
        };
        match device {
            Ok(device) => device,
            Err(e) => {
                log::warn!("Failed to initialize {:?}, falling back to CPU: {}", self, e);
                Device::Cpu
            }
        }
    }
}

/// Best available candle device
pub fn best_device() -> Device {
    let device_type = DeviceType::detect();
    log::info!("Using ML device: {:?}", device_type);
    device_type.to_device()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_device() {
        assert!(matches!(DeviceType::Cpu.to_device(), Device::Cpu));
    }

    #[test]
    fn test_detect_without_accelerators() {
        if !cfg!(feature = "cuda") && !cfg!(feature = "metal") {
            assert_eq!(DeviceType::detect(), DeviceType::Cpu);
        }
    }
}
