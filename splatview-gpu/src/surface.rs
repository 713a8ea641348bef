use wgpu::{Surface, SurfaceConfiguration, SurfaceTexture, TextureFormat};

/// Wrapper around wgpu::Surface with configuration management
pub struct SurfaceWrapper {
    pub surface: Surface<'static>,
    pub config: SurfaceConfiguration,
}

impl SurfaceWrapper {
    pub fn new(surface: Surface<'static>, config: SurfaceConfiguration) -> Self {
        Self { surface, config }
    }

    pub fn format(&self) -> TextureFormat {
        self.config.format
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn config(&self) -> &SurfaceConfiguration {
        &self.config
    }

    /// Reconfigure for a new drawable size. Zero-sized requests are ignored
    /// (minimised windows report them).
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
    }

    /// Get the current surface texture for rendering
    /// Returns an error if the surface is lost or needs to be recreated
    pub fn get_current_texture(&self) -> Result<SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}
