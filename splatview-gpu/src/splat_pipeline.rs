//! Splat render pipeline.
//!
//! Each splat is drawn as a screen-aligned quad whose pixel size follows the
//! perspective-correct footprint `max(1, scale * screen_height / w * 0.5)`.
//! Fragments fade with `exp(-4 * dist^2)` from the sprite center. This is an
//! isotropic approximation: no covariance projection, no view-dependent color.
//!
//! Blending is plain "over" compositing in draw order with depth testing.
//! Splats are not sorted back to front, so overlapping translucent splats can
//! composite in the wrong order depending on file order and view direction.

use crate::{PipelineBuildError, RenderPipelineBuilder, SplatVertex, Uniforms, compile_shader, shaders};
use tracing::info;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Triangle-strip vertices per splat quad.
pub(crate) const QUAD_VERTICES: u32 = 4;

/// The compiled splat shader, pipeline, and uniform bind group layout.
pub struct SplatPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
}

impl SplatPipeline {
    /// Build the pipeline for a given color target format.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, PipelineBuildError> {
        Self::with_source(device, surface_format, shaders::SPLAT)
    }

    /// Build the pipeline from alternative WGSL with the same entry points and bindings.
    #[tracing::instrument(skip_all, fields(format = ?surface_format))]
    pub fn with_source(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<Self, PipelineBuildError> {
        let shader = compile_shader(device, Some("splat_shader"), source)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Splat Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<Uniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Splat Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = RenderPipelineBuilder::new(device)
            .with_label("Splat Pipeline")
            .with_vertex_shader(&shader)
            .with_fragment_shader(&shader)
            .with_layout(layout)
            .with_vertex_buffer(SplatVertex::desc())
            .with_primitive(wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            })
            .with_fragment_target(Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            }))
            .with_depth_stencil(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            })
            .build()?;

        info!("Splat pipeline ready");
        Ok(Self {
            pipeline,
            uniform_layout,
        })
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Bind a uniform buffer holding one [`Uniforms`] record.
    pub fn create_uniform_bind_group(
        &self,
        device: &wgpu::Device,
        uniform_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Splat Uniform Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        })
    }
}

/// Host mirror of the vertex stage's sprite size in pixels.
pub fn point_size(scale: f32, screen_height: f32, clip_w: f32) -> f32 {
    (scale * screen_height / clip_w * 0.5).max(1.0)
}

/// Host mirror of the fragment stage's alpha at normalized distance `dist`
/// from the sprite center.
pub fn falloff_alpha(dist: f32, alpha: f32) -> f32 {
    (-4.0 * dist * dist).exp() * alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falloff_is_color_alpha_at_center() {
        assert_eq!(falloff_alpha(0.0, 0.8), 0.8);
        assert_eq!(falloff_alpha(0.0, 1.0), 1.0);
    }

    #[test]
    fn test_falloff_is_monotonically_decreasing() {
        let mut previous = falloff_alpha(0.0, 1.0);
        for step in 1..=100 {
            let current = falloff_alpha(step as f32 / 100.0, 1.0);
            assert!(current < previous, "falloff rose at step {step}");
            previous = current;
        }
    }

    #[test]
    fn test_falloff_nearly_vanishes_at_edge() {
        let edge = falloff_alpha(1.0, 1.0);
        assert!(edge < 0.02);
        assert!((edge - (-4.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_point_size_has_one_pixel_floor() {
        assert_eq!(point_size(0.0001, 720.0, 50.0), 1.0);
        assert_eq!(point_size(0.0, 720.0, 3.0), 1.0);
    }

    #[test]
    fn test_point_size_shrinks_with_distance() {
        let near = point_size(0.05, 720.0, 1.0);
        let far = point_size(0.05, 720.0, 4.0);
        assert!((near - 18.0).abs() < 1e-4);
        assert!((far - 4.5).abs() < 1e-4);
    }

    #[test]
    fn test_pipeline_builds_on_available_adapter() {
        let Ok(renderer) = pollster::block_on(crate::Renderer::new()) else {
            return;
        };
        let pipeline = SplatPipeline::new(renderer.device(), wgpu::TextureFormat::Bgra8UnormSrgb);
        assert!(pipeline.is_ok(), "{:?}", pipeline.err());
    }

    #[test]
    fn test_broken_shader_is_a_distinct_error() {
        let Ok(renderer) = pollster::block_on(crate::Renderer::new()) else {
            return;
        };
        let result = SplatPipeline::with_source(
            renderer.device(),
            wgpu::TextureFormat::Bgra8UnormSrgb,
            "@vertex fn vs_main() -> not_a_type {}",
        );
        assert!(matches!(result, Err(PipelineBuildError::Validation(_))));
    }
}
