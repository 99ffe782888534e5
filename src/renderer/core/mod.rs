//! Backend-facing core types.
//!
//! - [`backend`]: the [`Renderer`] trait and opaque GPU handles
//! - [`attachment`]: attachment / texture descriptors, clear and store actions
//! - [`uniforms`]: global uniform table and camera

pub mod attachment;
pub mod backend;
pub mod uniforms;

pub use attachment::{
    AttachmentDescriptor, AttachmentKey, AttachmentSet, ClearAction, DepthBits, StoreAction,
    TextureDescriptor,
};
pub use backend::{
    AttachmentId, Capabilities, CounterNamespace, CounterTest, FullscreenDraw, FullscreenShader,
    GeometryId, MaterialId, MeshDraw, Renderer, TextureId, Viewport,
};
pub use uniforms::{Camera, GlobalUniforms, UniformValue};
