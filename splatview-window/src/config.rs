use crate::camera::DEFAULT_DRAG_SENSITIVITY;
use std::path::PathBuf;

/// Settings for one viewer window.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Linear RGBA.
    pub clear_color: [f64; 4],
    /// Scene loaded as soon as the window opens.
    pub initial_scene: Option<PathBuf>,
    pub drag_sensitivity: f32,
    /// Magnification per mouse-wheel line.
    pub zoom_step: f32,
    /// Length of the animated camera reset, in seconds.
    pub reset_duration: f32,
}

impl ViewerConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_clear_color(mut self, clear_color: [f64; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_initial_scene(mut self, path: Option<PathBuf>) -> Self {
        self.initial_scene = path;
        self
    }

    pub fn with_drag_sensitivity(mut self, sensitivity: f32) -> Self {
        self.drag_sensitivity = sensitivity;
        self
    }

    pub fn with_zoom_step(mut self, step: f32) -> Self {
        self.zoom_step = step;
        self
    }

    pub fn with_reset_duration(mut self, seconds: f32) -> Self {
        self.reset_duration = seconds;
        self
    }

    pub(crate) fn wgpu_clear_color(&self) -> splatview_gpu::wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        splatview_gpu::wgpu::Color { r, g, b, a }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "splatview".to_string(),
            width: 1280,
            height: 720,
            clear_color: [0.02, 0.02, 0.025, 1.0],
            initial_scene: None,
            drag_sensitivity: DEFAULT_DRAG_SENSITIVITY,
            zoom_step: 1.1,
            reset_duration: 0.35,
        }
    }
}
