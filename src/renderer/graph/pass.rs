//! Render Pass
//!
//! A [`RenderPass`] is one ordered unit of GPU work: a priority, an ordered
//! drawable list, an optional attachment set, clear/store actions and the
//! three lifecycle callbacks.
//!
//! ```text
//! configure  → bind / acquire attachments (may pull from the pool)
//! execute    → bind target, clear, issue draws
//! cleanup    → return pooled attachments (after every pass has executed)
//! ```
//!
//! The common state lives in [`PassState`]; per-type behavior is a
//! [`PassNode`] (object pass, bloom steps, tone mapping, filters).

use smallvec::SmallVec;

use crate::errors::{Capability, FxError, Result};
use crate::renderer::core::{
    AttachmentDescriptor, AttachmentId, AttachmentSet, Capabilities, ClearAction, Renderer,
    StoreAction, Viewport,
};
use crate::renderer::graph::context::{ExecuteContext, PassContext};
use crate::renderer::graph::drawable::{DrawableId, OrderedDrawables};
use crate::renderer::graph::texture_cache::PassTextureCache;

// ─── Scene color I/O ──────────────────────────────────────────────────────────

/// How a pass uses the logical scene color buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorIo {
    /// Does not touch the scene color.
    #[default]
    None,
    /// Renders the scene color from scratch (object pass).
    Write,
    /// Samples the scene color and writes a new version of it (filters).
    ReadWrite,
    /// Samples the scene color only (threshold, tone mapping).
    Read,
}

/// Which of `color_a` / `color_b` a pass reads and writes this frame.
///
/// Assigned by [`RenderFrame::rewire_color_attachments`](super::RenderFrame::rewire_color_attachments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorBinding {
    pub read: Option<usize>,
    pub write: Option<usize>,
}

// ─── Pass Node ────────────────────────────────────────────────────────────────

/// Per-type pass behavior.
///
/// # Design principles
/// - `configure` owns every mutation: pool acquisition, slot publication,
///   texture-cache requests.
/// - `execute` only records backend calls.
/// - Pooled attachments acquired through [`PassState::acquire`] are released by
///   the pass itself; `cleanup` only handles node-specific resources.
pub trait PassNode {
    /// Short type name, for logs.
    fn kind(&self) -> &'static str;

    fn color_io(&self) -> ColorIo {
        ColorIo::None
    }

    fn configure(&mut self, _pass: &mut PassState, _ctx: &mut PassContext) -> Result<()> {
        Ok(())
    }

    fn execute(&self, pass: &PassState, ctx: &mut ExecuteContext);

    fn cleanup(&mut self, _ctx: &mut PassContext) {}

    /// Releases long-lived resources when the pass is removed from the frame.
    fn dispose(&mut self, _renderer: &mut dyn Renderer, _texture_cache: &mut PassTextureCache) {}
}

// ─── Pass State ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Configured,
}

/// State shared by every pass type.
pub struct PassState {
    name: String,
    priority: i32,
    serial: u32,
    drawables: OrderedDrawables,
    target: Option<AttachmentSet>,
    color_attachments: u32,
    color: ColorBinding,
    acquired: SmallVec<[AttachmentId; 4]>,
    lifecycle: Lifecycle,
    pub clear_action: ClearAction,
    pub store_action: StoreAction,
}

impl PassState {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Frame-unique identifier assigned at insertion.
    #[inline]
    #[must_use]
    pub fn serial(&self) -> u32 {
        self.serial
    }

    #[inline]
    #[must_use]
    pub fn drawables(&self) -> &OrderedDrawables {
        &self.drawables
    }

    /// Attachment set bound for this frame; `None` means the backbuffer.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&AttachmentSet> {
        self.target.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn color_attachments(&self) -> u32 {
        self.color_attachments
    }

    #[inline]
    #[must_use]
    pub fn color_binding(&self) -> ColorBinding {
        self.color
    }

    /// Pooled attachments currently held by this pass.
    #[must_use]
    pub fn acquired(&self) -> &[AttachmentId] {
        &self.acquired
    }

    /// Binds the attachment set the pass renders into.
    pub fn bind(&mut self, target: Option<AttachmentSet>) {
        self.target = target;
    }

    /// Acquires a pooled attachment owned by this pass until cleanup.
    pub fn acquire(
        &mut self,
        ctx: &mut PassContext,
        desc: &AttachmentDescriptor,
    ) -> Result<AttachmentId> {
        let id = ctx.pool.get(&mut *ctx.renderer, desc)?;
        self.acquired.push(id);
        Ok(id)
    }
}

// ─── Render Pass ──────────────────────────────────────────────────────────────

pub struct RenderPass {
    state: PassState,
    node: Box<dyn PassNode>,
}

impl RenderPass {
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32, node: Box<dyn PassNode>) -> Self {
        Self {
            state: PassState {
                name: name.into(),
                priority,
                serial: 0,
                drawables: OrderedDrawables::new(),
                target: None,
                color_attachments: 1,
                color: ColorBinding::default(),
                acquired: SmallVec::new(),
                lifecycle: Lifecycle::Idle,
                clear_action: ClearAction::default(),
                store_action: StoreAction::default(),
            },
            node,
        }
    }

    /// Requests `count` color attachments, failing fast when the backend
    /// cannot bind that many.
    pub fn with_color_attachments(mut self, count: u32, caps: &Capabilities) -> Result<Self> {
        if count == 0 {
            return Err(FxError::InvalidSettings(format!(
                "pass '{}' needs at least one color attachment",
                self.state.name
            )));
        }
        if count > caps.max_color_attachments {
            return Err(FxError::unsupported(
                Capability::MultipleColorAttachments,
                format!(
                    "pass '{}' needs {} color attachments, backend supports {}",
                    self.state.name, count, caps.max_color_attachments
                ),
            ));
        }
        self.state.color_attachments = count;
        Ok(self)
    }

    #[must_use]
    pub fn with_clear_action(mut self, clear_action: ClearAction) -> Self {
        self.state.clear_action = clear_action;
        self
    }

    #[must_use]
    pub fn with_store_action(mut self, store_action: StoreAction) -> Self {
        self.state.store_action = store_action;
        self
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &PassState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.state.name
    }

    #[inline]
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.state.priority
    }

    #[inline]
    #[must_use]
    pub fn serial(&self) -> u32 {
        self.state.serial
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    #[inline]
    #[must_use]
    pub fn color_io(&self) -> ColorIo {
        self.node.color_io()
    }

    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.state.lifecycle == Lifecycle::Configured
    }

    pub(crate) fn set_serial(&mut self, serial: u32) {
        self.state.serial = serial;
    }

    pub(crate) fn set_color_binding(&mut self, binding: ColorBinding) {
        self.state.color = binding;
    }

    // ── Drawables ──────────────────────────────────────────────────────────

    /// Inserts a drawable ordered by ascending `priority`; no-op if present.
    pub fn add_drawable(&mut self, id: DrawableId, priority: i32) -> bool {
        self.state.drawables.insert(id, priority)
    }

    /// Removes a drawable; no-op if absent.
    pub fn remove_drawable(&mut self, id: DrawableId) -> bool {
        self.state.drawables.remove(id)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    pub fn configure(&mut self, ctx: &mut PassContext) -> Result<()> {
        if self.is_configured() {
            log::error!("Pass '{}' configured twice without cleanup", self.state.name);
            self.cleanup(ctx);
        }
        // Marked before the node runs so a failing configure still gets its
        // partial acquisitions returned by cleanup.
        self.state.lifecycle = Lifecycle::Configured;
        self.state.target = None;
        self.node.configure(&mut self.state, ctx)
    }

    pub fn execute(&self, ctx: &mut ExecuteContext) {
        log::trace!("Executing pass '{}' ({})", self.state.name, self.node.kind());

        let viewport = match &self.state.target {
            Some(set) => Viewport::new(set.width, set.height),
            None => ctx.viewport,
        };
        ctx.renderer.set_attachment(self.state.target.as_ref());
        ctx.renderer.set_viewport(viewport);
        if !self.state.clear_action.is_load() {
            ctx.renderer.clear(&self.state.clear_action);
        }

        self.node.execute(&self.state, ctx);
    }

    /// Returns pooled attachments. Idempotent: a second call, or a call
    /// without a prior configure, is logged and ignored.
    pub fn cleanup(&mut self, ctx: &mut PassContext) {
        if self.state.lifecycle == Lifecycle::Idle {
            log::error!("Pass '{}' cleaned up without being configured", self.state.name);
            return;
        }

        for id in self.state.acquired.drain(..) {
            ctx.pool.release(id);
        }
        self.node.cleanup(ctx);
        self.state.target = None;
        self.state.lifecycle = Lifecycle::Idle;
    }

    pub(crate) fn dispose(&mut self, renderer: &mut dyn Renderer, texture_cache: &mut PassTextureCache) {
        self.node.dispose(renderer, texture_cache);
    }
}

impl std::fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("name", &self.state.name)
            .field("kind", &self.node.kind())
            .field("priority", &self.state.priority)
            .field("drawables", &self.state.drawables.len())
            .finish_non_exhaustive()
    }
}
