//! Frame runtime
//!
//! - [`core`]: backend interface and shared descriptors
//! - [`graph`]: render frame, passes and pooled resources
//! - [`mask`]: counter-plane masking protocols
//! - [`settings`]: frame and post-processing configuration

pub mod core;
pub mod graph;
pub mod mask;
pub mod settings;

/// Color format of every post-processing intermediate.
pub const HDR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
