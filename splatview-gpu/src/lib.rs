//! Splatview GPU Crate
//!
//! Owns the wgpu device, the splat vertex layout, the splat render pipeline and
//! the per-frame draw.

mod builder;
mod frame;
mod pipeline;
mod shader;
pub mod shaders;
mod splat_buffer;
mod splat_pipeline;
mod surface;
mod types;

pub use builder::{BufferBuildError, BufferBuilder, BufferUsage};
pub use frame::{FrameOutcome, FrameRenderer, ViewProjection};
pub use pipeline::{PipelineBuildError, RenderPipelineBuilder};
pub use shader::compile_shader;
pub use splat_buffer::{SplatBuffer, pack_splats};
pub use splat_pipeline::{DEPTH_FORMAT, SplatPipeline, falloff_alpha, point_size};
pub use surface::SurfaceWrapper;
pub use types::{SplatVertex, Uniforms};

pub use wgpu;

use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Request Adapter Error: {0}")]
    RequestAdapterError(#[from] wgpu::RequestAdapterError),
    #[error("Request Device Error: {0}")]
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
    #[error("Create surface error: {0}")]
    CreateSurfaceError(#[from] wgpu::CreateSurfaceError),
    #[error("Surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// GPU device and queue shared by every splatview component.
///
/// Constructed explicitly and owned by the window state it renders into.
pub struct Renderer {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Renderer {
    pub async fn new() -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await?;

        let info = adapter.get_info();
        info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Splatview Device"),
                ..Default::default()
            })
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Start building a buffer on this device.
    pub fn create_buffer(&self) -> BufferBuilder<'_> {
        BufferBuilder::new(&self.device)
    }

    /// Configure a window surface for presentation, preferring an sRGB format.
    pub fn create_surface(
        &self,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<SurfaceWrapper, RendererError> {
        let caps = surface.get_capabilities(&self.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RendererError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&self.device, &config);
        info!("Surface configured: {:?} {}x{}", format, config.width, config.height);

        Ok(SurfaceWrapper::new(surface, config))
    }
}
