//! Built-in Pass Nodes
//!
//! - [`ObjectPass`]: draws an ordered drawable list (default scene pass and
//!   extra off-screen scene passes)
//! - [`FilterPass`]: user full-screen filter ping-ponging the scene color
//! - [`ThresholdPass`] / [`BlurPass`] / [`UpsamplePass`]: bloom pyramid
//! - [`ToneMapPass`]: final composite into the backbuffer

mod bloom;
mod filter;
mod object;
mod tone_mapping;

pub use bloom::{BlurDirection, BlurPass, ThresholdPass, UpsamplePass, bloom_output_slot};
pub use filter::{FilterConfig, FilterPass};
pub use object::{ObjectPass, ObjectTarget};
pub use tone_mapping::ToneMapPass;

use crate::errors::Result;
use crate::renderer::core::{AttachmentDescriptor, AttachmentId, AttachmentSet};
use crate::renderer::graph::context::{ExecuteContext, PassContext, PassSlot};
use crate::renderer::graph::pass::PassState;

/// Acquires a pooled attachment, publishes it under `slot` and binds it as the
/// pass target.
fn render_to_pooled(
    pass: &mut PassState,
    ctx: &mut PassContext,
    desc: &AttachmentDescriptor,
    slot: PassSlot,
) -> Result<AttachmentId> {
    let id = pass.acquire(ctx, desc)?;
    ctx.blackboard.publish(slot, id);
    pass.bind(Some(AttachmentSet::single(id, desc.width, desc.height)));
    Ok(id)
}

/// The scene color attachment this pass was assigned to read.
fn scene_color_input(pass: &PassState, ctx: &ExecuteContext) -> Option<AttachmentId> {
    let resolved = ctx
        .scene_color
        .zip(pass.color_binding().read)
        .map(|(scene, index)| scene.get(index));
    if resolved.is_none() {
        log::error!("Pass '{}' has no scene color to read", pass.name());
    }
    resolved
}

/// Binds the scene color attachment this pass was assigned to write, or the
/// backbuffer when it writes the final image.
fn bind_scene_color_output(pass: &mut PassState, ctx: &PassContext) {
    let target = ctx
        .scene_color
        .zip(pass.color_binding().write)
        .map(|(scene, index)| scene.attachment_set(index));
    pass.bind(target);
}

/// Size of blur level `level` (level 0 is half resolution).
fn level_size(width: u32, height: u32, level: u8) -> (u32, u32) {
    let shift = u32::from(level) + 1;
    (
        width.checked_shr(shift).unwrap_or(0).max(1),
        height.checked_shr(shift).unwrap_or(0).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::level_size;

    #[test]
    fn levels_halve_and_clamp() {
        assert_eq!(level_size(800, 600, 0), (400, 300));
        assert_eq!(level_size(800, 600, 2), (100, 75));
        assert_eq!(level_size(4, 4, 5), (1, 1));
        assert_eq!(level_size(4, 4, 40), (1, 1));
    }
}
