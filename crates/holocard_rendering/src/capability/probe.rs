//! Graphics probes.
//!
//! A probe answers one question: which adapter would the renderer get? The
//! profiler classifies the answer; probes never decide tiers themselves.

use crate::error::ProbeError;

/// Graphics API family behind an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsBackend {
    /// Vulkan
    Vulkan,
    /// Metal
    Metal,
    /// Direct3D 12
    Dx12,
    /// Browser WebGPU
    WebGpu,
    /// OpenGL / GLES / WebGL2
    Gl,
    /// Anything the renderer cannot drive.
    Other,
}

impl GraphicsBackend {
    /// Coarse API generation: 2 for explicit modern APIs, 1 for GL, 0 for
    /// unsupported.
    #[must_use]
    pub const fn api_version(self) -> u32 {
        match self {
            Self::Vulkan | Self::Metal | Self::Dx12 | Self::WebGpu => 2,
            Self::Gl => 1,
            Self::Other => 0,
        }
    }
}

/// Physical class of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Dedicated GPU
    Discrete,
    /// GPU sharing memory with the CPU
    Integrated,
    /// Virtualized GPU
    Virtual,
    /// Software rasterizer
    Cpu,
    /// Unknown
    Other,
}

/// What a probe found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterReport {
    /// Adapter name as reported by the driver.
    pub name: String,
    /// API family.
    pub backend: GraphicsBackend,
    /// Physical class.
    pub device_class: DeviceClass,
    /// Largest supported 2D texture edge.
    pub max_texture_dimension: u32,
}

/// Source of an [`AdapterReport`].
pub trait GraphicsProbe {
    /// Looks for a usable adapter.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::NoAdapter` when nothing usable exists.
    fn probe(&self) -> Result<AdapterReport, ProbeError>;
}

/// Probe that asks wgpu for a real adapter.
#[derive(Debug, Clone, Copy)]
pub struct WgpuProbe {
    /// Backends to try.
    pub backends: wgpu::Backends,
    /// Adapter preference.
    pub power_preference: wgpu::PowerPreference,
}

impl Default for WgpuProbe {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl WgpuProbe {
    /// Maps wgpu's adapter info into a report.
    #[must_use]
    pub fn report_from_info(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> AdapterReport {
        let backend = match info.backend {
            wgpu::Backend::Vulkan => GraphicsBackend::Vulkan,
            wgpu::Backend::Metal => GraphicsBackend::Metal,
            wgpu::Backend::Dx12 => GraphicsBackend::Dx12,
            wgpu::Backend::BrowserWebGpu => GraphicsBackend::WebGpu,
            wgpu::Backend::Gl => GraphicsBackend::Gl,
            _ => GraphicsBackend::Other,
        };
        let device_class = match info.device_type {
            wgpu::DeviceType::DiscreteGpu => DeviceClass::Discrete,
            wgpu::DeviceType::IntegratedGpu => DeviceClass::Integrated,
            wgpu::DeviceType::VirtualGpu => DeviceClass::Virtual,
            wgpu::DeviceType::Cpu => DeviceClass::Cpu,
            wgpu::DeviceType::Other => DeviceClass::Other,
        };
        AdapterReport {
            name: info.name.clone(),
            backend,
            device_class,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }
}

impl GraphicsProbe for WgpuProbe {
    fn probe(&self) -> Result<AdapterReport, ProbeError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: self.backends,
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: self.power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(ProbeError::NoAdapter)?;

        let report = Self::report_from_info(&adapter.get_info(), &adapter.limits());
        tracing::debug!(adapter = %report.name, backend = ?report.backend, "graphics adapter found");
        Ok(report)
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProbe {
    result: Result<AdapterReport, ProbeError>,
}

impl StaticProbe {
    /// Always reports `report`.
    #[must_use]
    pub fn new(report: AdapterReport) -> Self {
        Self { result: Ok(report) }
    }

    /// Always fails with `error`.
    #[must_use]
    pub fn failing(error: ProbeError) -> Self {
        Self { result: Err(error) }
    }

    /// A mid-range integrated GPU on Vulkan.
    #[must_use]
    pub fn integrated() -> Self {
        Self::new(AdapterReport {
            name: "integrated".to_string(),
            backend: GraphicsBackend::Vulkan,
            device_class: DeviceClass::Integrated,
            max_texture_dimension: 8192,
        })
    }

    /// A discrete GPU on Vulkan.
    #[must_use]
    pub fn discrete() -> Self {
        Self::new(AdapterReport {
            name: "discrete".to_string(),
            backend: GraphicsBackend::Vulkan,
            device_class: DeviceClass::Discrete,
            max_texture_dimension: 16384,
        })
    }
}

impl GraphicsProbe for StaticProbe {
    fn probe(&self) -> Result<AdapterReport, ProbeError> {
        self.result.clone()
    }
}
