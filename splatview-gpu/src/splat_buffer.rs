//! GPU-resident copy of one splat batch.

use crate::{BufferBuildError, BufferUsage, Renderer, SplatVertex};
use splatview_data::{Splat, SplatBatch};
use tracing::debug;

/// Immutable vertex buffer holding one packed [`SplatVertex`] per splat.
///
/// A new batch always produces a new `SplatBuffer`; existing buffers are never
/// written after creation.
pub struct SplatBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl SplatBuffer {
    /// Pack and upload a batch. An empty batch produces no buffer.
    #[tracing::instrument(skip_all, fields(splats = batch.len()))]
    pub fn build(renderer: &Renderer, batch: &SplatBatch) -> Result<Option<Self>, BufferBuildError> {
        if batch.is_empty() {
            debug!("Empty batch, no splat buffer created");
            return Ok(None);
        }

        let count =
            u32::try_from(batch.len()).map_err(|_| BufferBuildError::TooManySplats(batch.len()))?;
        let vertices = pack_splats(batch.as_slice());

        let buffer = renderer
            .create_buffer()
            .label("Splat Buffer")
            .with_pod_data(&vertices)
            .usage(BufferUsage::Vertex)
            .build()?;

        debug!("Uploaded {} bytes of splat data", buffer.size());
        Ok(Some(Self { buffer, count }))
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of splats, which is also the instance count of the draw.
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Pack splats into the GPU vertex layout, preserving order.
pub fn pack_splats(splats: &[Splat]) -> Vec<SplatVertex> {
    splats.iter().map(SplatVertex::from).collect()
}
