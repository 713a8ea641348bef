use glam::Mat4;
use splatview_data::Splat;

/// Packed per-splat record read by `splat.wgsl`, one per instance.
///
/// Layout is position(3) + color(4) + scale(1) + padding(3) floats.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SplatVertex {
    pub position: [f32; 3],
    /// rgb color and alpha with opacity already folded in.
    pub color: [f32; 4],
    /// Isotropic world-space scale.
    pub scale: f32,
    pub _padding: [f32; 3],
}

impl SplatVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4, 2 => Float32];

    /// Vertex buffer layout; the buffer advances once per drawn instance.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SplatVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&Splat> for SplatVertex {
    fn from(splat: &Splat) -> Self {
        Self {
            position: splat.position.to_array(),
            color: [
                splat.color.x,
                splat.color.y,
                splat.color.z,
                splat.effective_alpha(),
            ],
            scale: splat.scale.x,
            _padding: [0.0; 3],
        }
    }
}

/// Per-frame uniform record shared between host and shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub view_projection: [[f32; 4]; 4],
    /// Drawable size in pixels.
    pub screen_size: [f32; 2],
    pub _padding: [f32; 2],
}

impl Uniforms {
    pub fn new(view_projection: Mat4, width: u32, height: u32) -> Self {
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            screen_size: [width as f32, height as f32],
            _padding: [0.0; 2],
        }
    }
}
