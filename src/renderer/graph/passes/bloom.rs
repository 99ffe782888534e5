//! Bloom Pyramid Passes
//!
//! # Algorithm
//!
//! 1. **Threshold**: bright-pass extraction of the scene color into a
//!    full-resolution HDR attachment.
//! 2. **Blur down** (`K` steps): each step halves resolution and runs a
//!    separable gaussian, horizontal then vertical, as two passes.
//! 3. **Up-sample** (`K − 1` steps): each step doubles resolution, combining
//!    the running result with the matching blur-down level.
//!
//! # Data Flow
//!
//! ```text
//! scene color ─► BloomThreshold (w, h)
//!                  │
//!                  ▼ H / V
//!                BlurDown(0) (w/2) ─► BlurDown(1) (w/4) ─► … ─► BlurDown(K−1)
//!                  ▲                    ▲                          │
//!                  │                    └──── BlurUp(K−3) ◄────────┤
//!                  └─────────────────── BlurUp(K−2) ◄──── BlurUp(0)┘
//!                                           │
//!                                           ▼
//!                                     ToneMapPass
//! ```
//!
//! Every intermediate lives in the render target pool and is returned at the
//! end of the frame, so a steady-state frame allocates nothing.

use crate::errors::Result;
use crate::renderer::HDR_TEXTURE_FORMAT;
use crate::renderer::core::{AttachmentDescriptor, FullscreenDraw, FullscreenShader, UniformValue};
use crate::renderer::graph::context::{ExecuteContext, PassContext, PassSlot};
use crate::renderer::graph::pass::{ColorIo, PassNode, PassState};
use crate::renderer::graph::passes::{level_size, render_to_pooled, scene_color_input};
use crate::renderer::settings::{BlurConfig, ThresholdConfig};

/// Slot holding the finished bloom image for a pyramid of `steps` levels.
#[must_use]
pub fn bloom_output_slot(steps: u8) -> PassSlot {
    if steps <= 1 {
        PassSlot::BlurDown(0)
    } else {
        PassSlot::BlurUp(steps - 2)
    }
}

// ─── Threshold ────────────────────────────────────────────────────────────────

pub struct ThresholdPass {
    config: ThresholdConfig,
    shader: FullscreenShader,
}

impl ThresholdPass {
    #[must_use]
    pub fn new(config: ThresholdConfig) -> Self {
        Self {
            config,
            shader: FullscreenShader::BloomThreshold,
        }
    }
}

impl PassNode for ThresholdPass {
    fn kind(&self) -> &'static str {
        "bloom_threshold"
    }

    fn color_io(&self) -> ColorIo {
        ColorIo::Read
    }

    fn configure(&mut self, pass: &mut PassState, ctx: &mut PassContext) -> Result<()> {
        let desc = AttachmentDescriptor::new(ctx.viewport.width, ctx.viewport.height, HDR_TEXTURE_FORMAT)
            .with_label("bloom_threshold");
        render_to_pooled(pass, ctx, &desc, PassSlot::BloomThreshold)?;
        Ok(())
    }

    fn execute(&self, pass: &PassState, ctx: &mut ExecuteContext) {
        let Some(scene) = scene_color_input(pass, ctx) else {
            return;
        };
        ctx.renderer.draw_fullscreen(&FullscreenDraw {
            shader: &self.shader,
            inputs: &[("scene", scene)],
            textures: &[],
            params: &[
                ("threshold", UniformValue::Float(self.config.threshold)),
                ("knee", UniformValue::Float(self.config.knee)),
            ],
        });
    }
}

// ─── Blur down ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurDirection {
    Horizontal,
    Vertical,
}

/// One direction of blur-down step `step`.
pub struct BlurPass {
    step: u8,
    direction: BlurDirection,
    radius: f32,
    shader: FullscreenShader,
}

impl BlurPass {
    #[must_use]
    pub fn new(step: u8, direction: BlurDirection, config: &BlurConfig) -> Self {
        let shader = match direction {
            BlurDirection::Horizontal => FullscreenShader::BlurHorizontal,
            BlurDirection::Vertical => FullscreenShader::BlurVertical,
        };
        Self {
            step,
            direction,
            radius: config.radius,
            shader,
        }
    }

    fn input_slot(&self) -> PassSlot {
        match (self.direction, self.step) {
            (BlurDirection::Horizontal, 0) => PassSlot::BloomThreshold,
            (BlurDirection::Horizontal, step) => PassSlot::BlurDown(step - 1),
            (BlurDirection::Vertical, step) => PassSlot::BlurHorizontal(step),
        }
    }

    fn output_slot(&self) -> PassSlot {
        match self.direction {
            BlurDirection::Horizontal => PassSlot::BlurHorizontal(self.step),
            BlurDirection::Vertical => PassSlot::BlurDown(self.step),
        }
    }
}

impl PassNode for BlurPass {
    fn kind(&self) -> &'static str {
        match self.direction {
            BlurDirection::Horizontal => "blur_horizontal",
            BlurDirection::Vertical => "blur_vertical",
        }
    }

    fn configure(&mut self, pass: &mut PassState, ctx: &mut PassContext) -> Result<()> {
        let (width, height) = level_size(ctx.viewport.width, ctx.viewport.height, self.step);
        let desc = AttachmentDescriptor::new(width, height, HDR_TEXTURE_FORMAT).with_label("bloom_blur");
        render_to_pooled(pass, ctx, &desc, self.output_slot())?;
        Ok(())
    }

    fn execute(&self, pass: &PassState, ctx: &mut ExecuteContext) {
        let Some(input) = ctx.input(self.input_slot()) else {
            return;
        };
        let texel = pass.target().map_or(glam::Vec2::ONE, |set| {
            glam::Vec2::new(1.0 / set.width as f32, 1.0 / set.height as f32)
        });
        ctx.renderer.draw_fullscreen(&FullscreenDraw {
            shader: &self.shader,
            inputs: &[("source", input)],
            textures: &[],
            params: &[
                ("radius", UniformValue::Float(self.radius)),
                ("texel_size", UniformValue::Vec2(texel)),
            ],
        });
    }
}

// ─── Up-sample ────────────────────────────────────────────────────────────────

/// Up-sample step `index` of a pyramid with `steps` levels.
pub struct UpsamplePass {
    index: u8,
    steps: u8,
    radius: f32,
    shader: FullscreenShader,
}

impl UpsamplePass {
    #[must_use]
    pub fn new(index: u8, config: &BlurConfig) -> Self {
        debug_assert!(index + 2 <= config.steps);
        Self {
            index,
            steps: config.steps,
            radius: config.radius,
            shader: FullscreenShader::BlurUpsample,
        }
    }

    /// Blur-down level this step combines with (and whose size it outputs).
    fn skip_level(&self) -> u8 {
        self.steps - 2 - self.index
    }

    fn previous_slot(&self) -> PassSlot {
        if self.index == 0 {
            PassSlot::BlurDown(self.steps - 1)
        } else {
            PassSlot::BlurUp(self.index - 1)
        }
    }
}

impl PassNode for UpsamplePass {
    fn kind(&self) -> &'static str {
        "blur_upsample"
    }

    fn configure(&mut self, pass: &mut PassState, ctx: &mut PassContext) -> Result<()> {
        let (width, height) = level_size(ctx.viewport.width, ctx.viewport.height, self.skip_level());
        let desc =
            AttachmentDescriptor::new(width, height, HDR_TEXTURE_FORMAT).with_label("bloom_upsample");
        render_to_pooled(pass, ctx, &desc, PassSlot::BlurUp(self.index))?;
        Ok(())
    }

    fn execute(&self, _pass: &PassState, ctx: &mut ExecuteContext) {
        let (Some(previous), Some(skip)) = (
            ctx.input(self.previous_slot()),
            ctx.input(PassSlot::BlurDown(self.skip_level())),
        ) else {
            return;
        };
        ctx.renderer.draw_fullscreen(&FullscreenDraw {
            shader: &self.shader,
            inputs: &[("source", previous), ("skip", skip)],
            textures: &[],
            params: &[("radius", UniformValue::Float(self.radius))],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_slot_of_single_level_pyramid() {
        assert_eq!(bloom_output_slot(1), PassSlot::BlurDown(0));
        assert_eq!(bloom_output_slot(4), PassSlot::BlurUp(2));
    }

    #[test]
    fn blur_slots_chain_levels() {
        let config = BlurConfig::default();
        let h0 = BlurPass::new(0, BlurDirection::Horizontal, &config);
        let v0 = BlurPass::new(0, BlurDirection::Vertical, &config);
        let h1 = BlurPass::new(1, BlurDirection::Horizontal, &config);
        assert_eq!(h0.input_slot(), PassSlot::BloomThreshold);
        assert_eq!(v0.input_slot(), h0.output_slot());
        assert_eq!(h1.input_slot(), v0.output_slot());
    }

    #[test]
    fn upsample_walks_back_up_the_pyramid() {
        let config = BlurConfig {
            steps: 3,
            ..BlurConfig::default()
        };
        let up0 = UpsamplePass::new(0, &config);
        let up1 = UpsamplePass::new(1, &config);
        assert_eq!(up0.previous_slot(), PassSlot::BlurDown(2));
        assert_eq!(up0.skip_level(), 1);
        assert_eq!(up1.previous_slot(), PassSlot::BlurUp(0));
        assert_eq!(up1.skip_level(), 0);
    }
}
