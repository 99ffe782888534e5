//! Frame Render Graph
//!
//! Provides:
//! - [`RenderFrame`]: per-context pass list, drawables, uniforms and shared resources
//! - [`RenderPass`] / [`PassNode`]: one ordered unit of GPU work and its behavior
//! - [`RenderTargetPool`]: reusable short-lived attachments
//! - [`PassTextureCache`]: reference-counted shared sampled textures
//! - [`PassContext`] / [`ExecuteContext`]: phase-separated pass contexts
//! - [`PassBand`]: priority bands

pub mod context;
pub mod drawable;
pub mod frame;
pub mod pass;
pub mod passes;
pub mod render_target_pool;
pub mod stage;
pub mod texture_cache;

pub use context::{ExecuteContext, FrameBlackboard, PassContext, PassSlot, SceneColorTargets};
pub use drawable::{Drawable, DrawableId, DrawableStore, MeshDrawable, OrderedDrawables, draw_item};
pub use frame::{FrameStats, RenderFrame};
pub use pass::{ColorBinding, ColorIo, PassNode, PassState, RenderPass};
pub use passes::{FilterConfig, ObjectPass, ObjectTarget};
pub use render_target_pool::{DEFAULT_MAX_UNUSED_FRAMES, PooledAttachment, RenderTargetPool};
pub use stage::PassBand;
pub use texture_cache::{PassTextureCache, SampledTexture, TextureOrigin};
