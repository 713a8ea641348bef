use crate::loader::LoadError;
use splatview_gpu::{BufferBuildError, PipelineBuildError, RendererError};

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
    #[error(transparent)]
    Buffer(#[from] BufferBuildError),
    #[error("Splat pipeline unavailable: {0}")]
    Pipeline(#[from] PipelineBuildError),
    #[error(transparent)]
    Load(#[from] LoadError),
}
