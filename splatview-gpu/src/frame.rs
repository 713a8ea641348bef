//! Per-frame clear and splat draw.

use crate::shaders;
use crate::splat_pipeline::QUAD_VERTICES;
use crate::{
    BufferBuildError, BufferUsage, DEPTH_FORMAT, PipelineBuildError, Renderer, SplatBuffer,
    SplatPipeline, SurfaceWrapper, Uniforms,
};
use glam::Mat4;
use tracing::{debug, error};

/// Anything that can produce a combined view-projection matrix for a drawable size.
pub trait ViewProjection {
    fn view_projection(&self, width: u32, height: u32) -> Mat4;
}

/// What a call to [`FrameRenderer::render`] or [`FrameRenderer::render_to`] drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Splats were drawn over the clear color.
    Drawn { splats: u32 },
    /// Only the clear color was presented.
    ClearOnly,
}

struct DepthTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Splat Depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            width,
            height,
        }
    }
}

/// Owns everything drawn each frame: the pipeline, the uniform buffer, the
/// current splat buffer and the depth target.
///
/// The splat buffer is swapped as a whole, so a frame always draws either the
/// previous batch or the new one, never a mix.
pub struct FrameRenderer {
    clear_color: wgpu::Color,
    pipeline: Option<SplatPipeline>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: Option<wgpu::BindGroup>,
    splats: Option<SplatBuffer>,
    depth: Option<DepthTarget>,
}

impl FrameRenderer {
    pub fn new(renderer: &Renderer, clear_color: wgpu::Color) -> Result<Self, BufferBuildError> {
        let uniform_buffer = renderer
            .create_buffer()
            .label("Splat Uniforms")
            .size(std::mem::size_of::<Uniforms>() as u64)
            .usage(BufferUsage::Uniform)
            .build()?;

        Ok(Self {
            clear_color,
            pipeline: None,
            uniform_buffer,
            uniform_bind_group: None,
            splats: None,
            depth: None,
        })
    }

    /// Build the splat pipeline for the surface format.
    ///
    /// On failure no pipeline is installed and frames keep presenting the
    /// clear color.
    pub fn install_pipeline(
        &mut self,
        renderer: &Renderer,
        format: wgpu::TextureFormat,
    ) -> Result<(), PipelineBuildError> {
        self.install_pipeline_from(renderer, format, shaders::SPLAT)
    }

    fn install_pipeline_from(
        &mut self,
        renderer: &Renderer,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<(), PipelineBuildError> {
        match SplatPipeline::with_source(renderer.device(), format, source) {
            Ok(pipeline) => {
                let bind_group =
                    pipeline.create_uniform_bind_group(renderer.device(), &self.uniform_buffer);
                self.uniform_bind_group = Some(bind_group);
                self.pipeline = Some(pipeline);
                Ok(())
            }
            Err(err) => {
                error!("Splat pipeline failed to build: {err}");
                self.pipeline = None;
                self.uniform_bind_group = None;
                Err(err)
            }
        }
    }

    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Swap in a new splat buffer and hand back the previous one.
    pub fn replace_splats(&mut self, splats: Option<SplatBuffer>) -> Option<SplatBuffer> {
        std::mem::replace(&mut self.splats, splats)
    }

    pub fn splat_count(&self) -> u32 {
        self.splats.as_ref().map_or(0, SplatBuffer::count)
    }

    /// Render and present one frame to the surface.
    pub fn render(
        &mut self,
        renderer: &Renderer,
        surface: &SurfaceWrapper,
        camera: &impl ViewProjection,
    ) -> Result<FrameOutcome, wgpu::SurfaceError> {
        let output = surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let outcome = self.render_to(renderer, &view, surface.width(), surface.height(), camera);
        output.present();
        Ok(outcome)
    }

    /// Clear `target` and draw the current splats into it, then submit.
    ///
    /// The uniforms are written from `width` and `height`, so the aspect ratio
    /// always matches the drawable. The target must have the format the
    /// pipeline was installed for.
    pub fn render_to(
        &mut self,
        renderer: &Renderer,
        target: &wgpu::TextureView,
        width: u32,
        height: u32,
        camera: &impl ViewProjection,
    ) -> FrameOutcome {
        let _span = tracing::info_span!("frame", width, height).entered();

        let device = renderer.device();
        let queue = renderer.queue();

        let uniforms = Uniforms::new(camera.view_projection(width, height), width, height);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let depth_stale = self
            .depth
            .as_ref()
            .is_none_or(|depth| depth.width != width || depth.height != height);
        if depth_stale {
            debug!("Rebuilding depth target at {width}x{height}");
            self.depth = Some(DepthTarget::new(device, width, height));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Splat Frame Encoder"),
        });

        let mut outcome = FrameOutcome::ClearOnly;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Splat Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: self.depth.as_ref().map(|depth| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view: &depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Some(pipeline), Some(bind_group), Some(splats)) =
                (&self.pipeline, &self.uniform_bind_group, &self.splats)
            {
                render_pass.set_pipeline(pipeline.pipeline());
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.set_vertex_buffer(0, splats.buffer().slice(..));
                render_pass.draw(0..QUAD_VERTICES, 0..splats.count());
                outcome = FrameOutcome::Drawn {
                    splats: splats.count(),
                };
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        outcome
    }
}
