// ============================================================
// Layer 5 — Compute Device Selection
// ============================================================
// Burn picks the device through the backend TYPE, so choosing
// CPU vs GPU at runtime means matching on this enum and calling
// a generic function with the matching backend:
//
//   Cpu  → NdArray<f32>                (always available)
//   Wgpu → Wgpu (Vulkan/Metal/DX12)    (first adapter found)
//
// Training wraps either one in Autodiff<…>.

use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu};
use serde::{Deserialize, Serialize};

pub type CpuBackend = NdArray<f32>;
pub type GpuBackend = Wgpu;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    #[default]
    Cpu,
    Wgpu,
}

pub fn cpu_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

pub fn gpu_device() -> WgpuDevice {
    WgpuDevice::default()
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Cpu  => f.write_str("cpu"),
            ComputeDevice::Wgpu => f.write_str("wgpu"),
        }
    }
}
