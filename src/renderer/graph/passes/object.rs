//! Object Pass
//!
//! Draws the pass's drawables in list order. The default pass of every frame
//! is an object pass targeting [`ObjectTarget::Frame`]: the scene color when
//! the frame has a color chain, the backbuffer otherwise.
//!
//! Off-screen object passes render into pooled attachments and publish each
//! color attachment as [`PassSlot::Offscreen`] for later passes to sample.

use smallvec::SmallVec;

use crate::errors::Result;
use crate::renderer::core::{AttachmentDescriptor, AttachmentSet, DepthBits};
use crate::renderer::graph::context::{ExecuteContext, PassContext, PassSlot};
use crate::renderer::graph::drawable::draw_item;
use crate::renderer::graph::pass::{ColorIo, PassNode, PassState};
use crate::renderer::graph::passes::bind_scene_color_output;

/// Where an object pass renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectTarget {
    /// The frame's logical scene color (or the backbuffer without one).
    Frame,
    /// Pooled full-viewport attachments, one per color attachment of the pass.
    Offscreen {
        format: wgpu::TextureFormat,
        depth: DepthBits,
    },
}

pub struct ObjectPass {
    target: ObjectTarget,
}

impl ObjectPass {
    #[must_use]
    pub fn new(target: ObjectTarget) -> Self {
        Self { target }
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> ObjectTarget {
        self.target
    }
}

impl PassNode for ObjectPass {
    fn kind(&self) -> &'static str {
        "object"
    }

    fn color_io(&self) -> ColorIo {
        match self.target {
            ObjectTarget::Frame => ColorIo::Write,
            ObjectTarget::Offscreen { .. } => ColorIo::None,
        }
    }

    fn configure(&mut self, pass: &mut PassState, ctx: &mut PassContext) -> Result<()> {
        match self.target {
            ObjectTarget::Frame => bind_scene_color_output(pass, ctx),
            ObjectTarget::Offscreen { format, depth } => {
                let (width, height) = (ctx.viewport.width, ctx.viewport.height);
                let mut colors = SmallVec::new();
                for index in 0..pass.color_attachments() {
                    // Depth/counter storage rides on the first attachment only.
                    let depth = if index == 0 { depth } else { DepthBits::None };
                    let desc = AttachmentDescriptor::new(width, height, format)
                        .with_depth(depth)
                        .with_label("offscreen_color");
                    let id = pass.acquire(ctx, &desc)?;
                    ctx.blackboard.publish(
                        PassSlot::Offscreen {
                            pass: pass.serial(),
                            index: u8::try_from(index).unwrap_or(u8::MAX),
                        },
                        id,
                    );
                    colors.push(id);
                }
                pass.bind(Some(AttachmentSet {
                    colors,
                    width,
                    height,
                }));
            }
        }
        Ok(())
    }

    fn execute(&self, pass: &PassState, ctx: &mut ExecuteContext) {
        for id in pass.drawables().iter() {
            draw_item(&mut *ctx.renderer, ctx.drawables, id);
        }
    }
}
