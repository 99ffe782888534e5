#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod renderer;

pub use errors::{Capability, FxError, Result};
pub use renderer::HDR_TEXTURE_FORMAT;
pub use renderer::core::{
    AttachmentDescriptor, AttachmentId, Camera, Capabilities, ClearAction, DepthBits, GlobalUniforms,
    Renderer, TextureDescriptor, UniformValue,
};
pub use renderer::graph::{
    Drawable, DrawableId, FilterConfig, MeshDrawable, PassBand, PassTextureCache, RenderFrame,
    RenderPass, RenderTargetPool, SampledTexture,
};
pub use renderer::mask::{ClipStack, MaskProcessor};
pub use renderer::settings::{FrameSettings, PostProcessSettings};
