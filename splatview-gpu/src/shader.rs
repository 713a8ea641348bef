use crate::pipeline::{PipelineBuildError, validation_scope};

/// Compile a WGSL shader module.
///
/// Compilation runs inside a validation error scope so a bad shader comes back
/// as [`PipelineBuildError::Validation`] instead of reaching the device's
/// uncaptured-error handler.
pub fn compile_shader(
    device: &wgpu::Device,
    label: Option<&str>,
    source: &str,
) -> Result<wgpu::ShaderModule, PipelineBuildError> {
    validation_scope(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
}
