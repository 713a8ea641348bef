//! Shader source code embedded at compile time.

/// Isotropic splat shader: sprite expansion in `vs_main`, Gaussian-like
/// radial falloff in `fs_main`.
pub const SPLAT: &str = include_str!("../shaders/splat.wgsl");
