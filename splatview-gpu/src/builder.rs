//! Builder API for GPU buffers
//!
//! A thinner, more ergonomic front for wgpu buffer descriptors.

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer (also used for per-instance data)
    Vertex,
    /// Uniform buffer, writable from the queue every frame
    Uniform,
}

impl BufferUsage {
    fn to_wgpu(self) -> wgpu::BufferUsages {
        match self {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }
    }
}

/// Builder for creating GPU buffers
pub struct BufferBuilder<'a> {
    device: &'a wgpu::Device,
    label: Option<String>,
    size: Option<u64>,
    data: Option<&'a [u8]>,
    usage: BufferUsage,
}

impl<'a> BufferBuilder<'a> {
    pub(crate) fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            label: None,
            size: None,
            data: None,
            usage: BufferUsage::Vertex,
        }
    }

    /// Set the buffer label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set buffer size (for buffers filled later through the queue)
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set buffer data from a slice of Pod types
    pub fn with_pod_data<T: bytemuck::Pod>(mut self, data: &'a [T]) -> Self {
        self.data = Some(bytemuck::cast_slice(data));
        self
    }

    /// Set buffer usage
    pub fn usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Create the buffer. Initial data, when given, is fully written before
    /// the buffer is returned.
    pub fn build(self) -> Result<wgpu::Buffer, BufferBuildError> {
        use wgpu::util::DeviceExt;

        let buffer = if let Some(data) = self.data {
            if data.is_empty() {
                return Err(BufferBuildError::EmptyData);
            }
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: self.label.as_deref(),
                    contents: data,
                    usage: self.usage.to_wgpu(),
                })
        } else if let Some(size) = self.size {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: self.label.as_deref(),
                size,
                usage: self.usage.to_wgpu(),
                mapped_at_creation: false,
            })
        } else {
            return Err(BufferBuildError::MissingSizeOrData);
        };

        Ok(buffer)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BufferBuildError {
    #[error("Buffer must have either size or data")]
    MissingSizeOrData,
    #[error("Buffer data is empty")]
    EmptyData,
    #[error("{0} splats exceed the drawable instance range")]
    TooManySplats(usize),
}
