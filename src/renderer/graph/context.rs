//! Render Graph Context System
//!
//! Provides two phase-separated contexts for the frame graph:
//!
//! - [`PassContext`]: Mutable context for the **configure** and **cleanup**
//!   phases. Owns exclusive access to the render target pool, the texture
//!   cache and the frame blackboard. Passes acquire and publish attachments here.
//!
//! - [`ExecuteContext`]: Context for the **execute** phase. Only the backend is
//!   mutable; pools, drawables and the blackboard are read-only.
//!
//! Both contexts hold individual references to disjoint fields of the
//! [`RenderFrame`](super::RenderFrame), so the borrow checker splits them
//! without any interior mutability.

use rustc_hash::FxHashMap;

use crate::renderer::core::{AttachmentId, AttachmentSet, Renderer, Viewport};
use crate::renderer::graph::drawable::DrawableStore;
use crate::renderer::graph::render_target_pool::RenderTargetPool;
use crate::renderer::graph::texture_cache::PassTextureCache;

// ─── Pass Slots ───────────────────────────────────────────────────────────────

/// Logical identifier of an attachment produced during the frame.
///
/// Passes publish their output under a slot during configure and
/// later passes resolve their inputs by slot at execute time, independent of
/// which physical pooled attachment backs it this frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PassSlot {
    /// Bright-pass output of the bloom threshold.
    BloomThreshold,
    /// Horizontal half of blur-down step `n`.
    BlurHorizontal(u8),
    /// Result of blur-down step `n` (after the vertical pass).
    BlurDown(u8),
    /// Result of up-sample step `n`.
    BlurUp(u8),
    /// Color attachment `index` of an off-screen scene pass.
    Offscreen { pass: u32, index: u8 },
}

/// Cross-pass registry of attachments produced this frame. Reset every frame.
#[derive(Debug, Default)]
pub struct FrameBlackboard {
    slots: FxHashMap<PassSlot, AttachmentId>,
}

impl FrameBlackboard {
    pub fn publish(&mut self, slot: PassSlot, attachment: AttachmentId) {
        if let Some(previous) = self.slots.insert(slot, attachment) {
            log::warn!("Slot {:?} republished ({:?} replaced)", slot, previous);
        }
    }

    #[must_use]
    pub fn resolve(&self, slot: PassSlot) -> Option<AttachmentId> {
        self.slots.get(&slot).copied()
    }

    pub fn reset(&mut self) {
        self.slots.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ─── Scene Color ──────────────────────────────────────────────────────────────

/// The two persistent scene color attachments (`color_a` / `color_b`).
///
/// The object pass renders into one; filter passes ping-pong between them so
/// no pass ever samples the image it is writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneColorTargets {
    pub targets: [AttachmentId; 2],
    pub width: u32,
    pub height: u32,
}

impl SceneColorTargets {
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> AttachmentId {
        self.targets[index & 1]
    }

    #[must_use]
    pub fn attachment_set(&self, index: usize) -> AttachmentSet {
        AttachmentSet::single(self.get(index), self.width, self.height)
    }
}

// ─── Pass Context ─────────────────────────────────────────────────────────────

/// Mutable context available during **configure** and **cleanup**.
pub struct PassContext<'a> {
    /// Graphics backend
    pub renderer: &'a mut dyn Renderer,
    /// Temporary attachments (released after the last pass)
    pub pool: &'a mut RenderTargetPool,
    /// Shared sampled textures
    pub texture_cache: &'a mut PassTextureCache,
    /// Attachments published this frame
    pub blackboard: &'a mut FrameBlackboard,
    /// Persistent scene color pair, present when post-processing or a filter needs it
    pub scene_color: Option<&'a SceneColorTargets>,
    /// Full frame viewport
    pub viewport: Viewport,
}

// ─── Execute Context ──────────────────────────────────────────────────────────

/// Context available during **execute**.
pub struct ExecuteContext<'a> {
    /// Graphics backend
    pub renderer: &'a mut dyn Renderer,
    /// Every registered drawable (pass lists and masks reference into it)
    pub drawables: &'a DrawableStore,
    /// Attachments published so far this frame
    pub blackboard: &'a FrameBlackboard,
    /// Persistent scene color pair, present when post-processing or a filter needs it
    pub scene_color: Option<&'a SceneColorTargets>,
    /// Full frame viewport
    pub viewport: Viewport,
}

impl ExecuteContext<'_> {
    /// Resolves an input slot, logging when an upstream pass did not publish it.
    #[must_use]
    pub fn input(&self, slot: PassSlot) -> Option<AttachmentId> {
        let resolved = self.blackboard.resolve(slot);
        if resolved.is_none() {
            log::error!("Pass input {:?} was never published this frame", slot);
        }
        resolved
    }
}
