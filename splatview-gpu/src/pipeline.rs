/// Render pipeline assembled from WGSL modules with `vs_main`/`fs_main` entry points.
///
/// Unset primitive state falls back to wgpu's defaults (triangle list, no culling).
pub struct RenderPipelineBuilder<'a> {
    device: &'a wgpu::Device,
    vertex_shader: Option<&'a wgpu::ShaderModule>,
    fragment_shader: Option<&'a wgpu::ShaderModule>,
    label: Option<String>,
    layout: Option<wgpu::PipelineLayout>,
    vertex_buffers: Vec<wgpu::VertexBufferLayout<'static>>,
    primitive: Option<wgpu::PrimitiveState>,
    depth_stencil: Option<wgpu::DepthStencilState>,
    fragment_targets: Vec<Option<wgpu::ColorTargetState>>,
}

impl<'a> RenderPipelineBuilder<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            vertex_shader: None,
            fragment_shader: None,
            label: None,
            layout: None,
            vertex_buffers: Vec::new(),
            primitive: None,
            depth_stencil: None,
            fragment_targets: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_vertex_shader(mut self, shader: &'a wgpu::ShaderModule) -> Self {
        self.vertex_shader = Some(shader);
        self
    }

    pub fn with_fragment_shader(mut self, shader: &'a wgpu::ShaderModule) -> Self {
        self.fragment_shader = Some(shader);
        self
    }

    pub fn with_layout(mut self, layout: wgpu::PipelineLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_vertex_buffer(mut self, buffer: wgpu::VertexBufferLayout<'static>) -> Self {
        self.vertex_buffers.push(buffer);
        self
    }

    pub fn with_primitive(mut self, primitive: wgpu::PrimitiveState) -> Self {
        self.primitive = Some(primitive);
        self
    }

    pub fn with_depth_stencil(mut self, depth_stencil: wgpu::DepthStencilState) -> Self {
        self.depth_stencil = Some(depth_stencil);
        self
    }

    pub fn with_fragment_target(mut self, target: Option<wgpu::ColorTargetState>) -> Self {
        self.fragment_targets.push(target);
        self
    }

    /// Build the render pipeline.
    ///
    /// Creation runs inside a validation error scope; a rejected pipeline is
    /// returned as [`PipelineBuildError::Validation`].
    pub fn build(self) -> Result<wgpu::RenderPipeline, PipelineBuildError> {
        let vertex_shader = self
            .vertex_shader
            .ok_or(PipelineBuildError::MissingVertexShader)?;
        let device = self.device;

        let pipeline_layout = self.layout.unwrap_or_else(|| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            })
        });

        validation_scope(device, || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: self.label.as_deref(),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex_shader,
                    entry_point: Some("vs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &self.vertex_buffers,
                },
                primitive: self.primitive.unwrap_or_default(),
                depth_stencil: self.depth_stencil.clone(),
                multisample: wgpu::MultisampleState::default(),
                fragment: self.fragment_shader.map(|shader| wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &self.fragment_targets,
                }),
                multiview: None,
                cache: None,
            })
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineBuildError {
    #[error("Vertex shader is required")]
    MissingVertexShader,
    #[error("GPU validation failed: {0}")]
    Validation(String),
}

/// Run `create` inside a validation error scope and surface any captured error.
pub(crate) fn validation_scope<T>(
    device: &wgpu::Device,
    create: impl FnOnce() -> T,
) -> Result<T, PipelineBuildError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(PipelineBuildError::Validation(err.to_string())),
        None => Ok(value),
    }
}
