//! Render Frame
//!
//! Owns every [`RenderPass`] of a rendering context together with the
//! resources they share: drawables, global uniforms, the render target pool,
//! the texture cache and the persistent scene color pair.
//!
//! # Graph
//!
//! ```text
//! ┌ Scene band (0) ───────────────────────────────────────────────┐
//! │ default object pass ─► scene color (or backbuffer)            │
//! │ extra off-screen scene passes                                 │
//! ├ Filter band (2500) ───────────────────────────────────────────┤
//! │ user filters (color_a ⇄ color_b)                              │
//! ├ PostProcess band (5000) ──────────────────────────────────────┤
//! │ threshold ─► blur H/V ×K ─► up-sample ×(K−1) ─► tone map      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Per-frame flow
//!
//! ```text
//! render()
//!  ├─ reset blackboard, ensure color_a / color_b, upload global uniforms
//!  ├─ rewire color_a / color_b (passes are kept sorted by priority)
//!  ├─ for each pass: configure → execute
//!  ├─ cleanup every configured pass (also when a pass failed)
//!  └─ flush the render target pool
//! ```

use glam::Vec2;

use crate::errors::{Capability, FxError, Result};
use crate::renderer::HDR_TEXTURE_FORMAT;
use crate::renderer::core::{
    AttachmentDescriptor, Camera, Capabilities, ClearAction, GlobalUniforms, Renderer, Viewport,
};
use crate::renderer::graph::context::{ExecuteContext, FrameBlackboard, PassContext, SceneColorTargets};
use crate::renderer::graph::drawable::{Drawable, DrawableId, DrawableStore};
use crate::renderer::graph::pass::{ColorBinding, ColorIo, PassNode, RenderPass};
use crate::renderer::graph::passes::{
    BlurDirection, BlurPass, FilterConfig, FilterPass, ObjectPass, ObjectTarget, ThresholdPass,
    ToneMapPass, UpsamplePass, bloom_output_slot,
};
use crate::renderer::graph::render_target_pool::RenderTargetPool;
use crate::renderer::graph::stage::PassBand;
use crate::renderer::graph::texture_cache::PassTextureCache;
use crate::renderer::settings::{FrameSettings, PostProcessSettings};

/// Format of the scene color pair when no post-processing runs.
const LDR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Resource counters of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub passes: usize,
    pub drawables: usize,
    pub pooled_attachments: usize,
    pub occupied_attachments: usize,
    pub cached_textures: usize,
    pub frames_rendered: u64,
}

pub struct RenderFrame {
    settings: FrameSettings,
    capabilities: Capabilities,

    // === Graph ===
    passes: Vec<RenderPass>,
    next_serial: u32,
    default_serial: u32,
    /// Passes with a serial below this are built-in and cannot be removed.
    first_user_serial: u32,
    filter_count: i32,
    scene_pass_count: i32,

    // === Frame data ===
    drawables: DrawableStore,
    uniforms: GlobalUniforms,
    camera: Camera,
    time: f32,
    frames_rendered: u64,

    // === Resources ===
    pool: RenderTargetPool,
    texture_cache: PassTextureCache,
    blackboard: FrameBlackboard,
    scene_color: Option<SceneColorTargets>,
}

impl RenderFrame {
    /// Assembles the frame graph.
    ///
    /// # Errors
    /// - [`FxError::CapabilityUnsupported`] when post-processing is requested on
    ///   a backend without half-float color targets.
    /// - [`FxError::InvalidSettings`] when a pass config fails validation.
    pub fn new(settings: FrameSettings, capabilities: Capabilities) -> Result<Self> {
        settings.validate()?;
        if settings.post_processing_enabled() && !capabilities.half_float_color_targets {
            return Err(FxError::unsupported(
                Capability::HalfFloatColorTargets,
                format!("post-processing needs {HDR_TEXTURE_FORMAT:?} render targets"),
            ));
        }

        let mut frame = Self {
            settings,
            capabilities,
            passes: Vec::new(),
            next_serial: 0,
            default_serial: 0,
            first_user_serial: 0,
            filter_count: 0,
            scene_pass_count: 0,
            drawables: DrawableStore::with_key(),
            uniforms: GlobalUniforms::new(),
            camera: Camera::orthographic(settings.width, settings.height),
            time: 0.0,
            frames_rendered: 0,
            pool: RenderTargetPool::with_max_unused_frames(settings.max_unused_frames),
            texture_cache: PassTextureCache::new(),
            blackboard: FrameBlackboard::default(),
            scene_color: None,
        };

        let default_pass = RenderPass::new(
            "default",
            PassBand::Scene.base(),
            Box::new(ObjectPass::new(ObjectTarget::Frame)),
        )
        .with_clear_action(ClearAction::all(settings.clear_color));
        frame.default_serial = frame.add_pass(default_pass);

        if let Some(post) = &settings.post_process {
            frame.build_post_process(post);
        }
        frame.first_user_serial = frame.next_serial;

        log::debug!(
            "Frame graph assembled: {} passes, post-processing {}",
            frame.passes.len(),
            if settings.post_processing_enabled() { "on" } else { "off" }
        );
        Ok(frame)
    }

    /// Threshold → blur H/V ×K → up-sample ×(K−1) → tone map, each one step
    /// further into the post-process band.
    fn build_post_process(&mut self, post: &PostProcessSettings) {
        let steps = post.blur.steps;
        let mut offset = 0;

        self.push_post_pass(&mut offset, "bloom_threshold".into(), Box::new(ThresholdPass::new(post.threshold)));
        for step in 0..steps {
            for (direction, suffix) in [(BlurDirection::Horizontal, 'h'), (BlurDirection::Vertical, 'v')] {
                self.push_post_pass(
                    &mut offset,
                    format!("blur_down_{step}_{suffix}"),
                    Box::new(BlurPass::new(step, direction, &post.blur)),
                );
            }
        }
        for index in 0..steps.saturating_sub(1) {
            self.push_post_pass(
                &mut offset,
                format!("blur_up_{index}"),
                Box::new(UpsamplePass::new(index, &post.blur)),
            );
        }
        self.push_post_pass(
            &mut offset,
            "tone_map".into(),
            Box::new(ToneMapPass::new(post.tone_map, bloom_output_slot(steps))),
        );
    }

    fn push_post_pass(&mut self, offset: &mut i32, name: String, node: Box<dyn PassNode>) {
        let pass = RenderPass::new(name, PassBand::PostProcess.priority(*offset), node)
            .with_clear_action(ClearAction::LOAD);
        self.add_pass(pass);
        *offset += 1;
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Passes in execution order.
    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    #[must_use]
    pub fn pass(&self, serial: u32) -> Option<&RenderPass> {
        self.passes.iter().find(|p| p.serial() == serial)
    }

    pub fn pass_mut(&mut self, serial: u32) -> Option<&mut RenderPass> {
        self.passes.iter_mut().find(|p| p.serial() == serial)
    }

    #[must_use]
    pub fn default_pass(&self) -> Option<&RenderPass> {
        self.pass(self.default_serial)
    }

    #[inline]
    #[must_use]
    pub fn pool(&self) -> &RenderTargetPool {
        &self.pool
    }

    #[inline]
    #[must_use]
    pub fn texture_cache(&self) -> &PassTextureCache {
        &self.texture_cache
    }

    /// The persistent `color_a` / `color_b` pair, once allocated.
    #[inline]
    #[must_use]
    pub fn scene_color(&self) -> Option<&SceneColorTargets> {
        self.scene_color.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn uniforms(&self) -> &GlobalUniforms {
        &self.uniforms
    }

    /// User uniforms; `time`, `resolution` and the camera matrices are
    /// overwritten every frame.
    pub fn uniforms_mut(&mut self) -> &mut GlobalUniforms {
        &mut self.uniforms
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Sets the playback time uploaded as the `time` uniform.
    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds;
    }

    #[must_use]
    pub fn stats(&self) -> FrameStats {
        FrameStats {
            passes: self.passes.len(),
            drawables: self.drawables.len(),
            pooled_attachments: self.pool.len(),
            occupied_attachments: self.pool.occupied_count(),
            cached_textures: self.texture_cache.len(),
            frames_rendered: self.frames_rendered,
        }
    }

    // ── Drawables ──────────────────────────────────────────────────────────

    pub fn insert_drawable(&mut self, drawable: Box<dyn Drawable>) -> DrawableId {
        self.drawables.insert(drawable)
    }

    /// Unregisters a drawable and removes it from every pass.
    ///
    /// Mask references to it elsewhere are skipped from then on.
    pub fn remove_drawable(&mut self, id: DrawableId) -> Option<Box<dyn Drawable>> {
        let drawable = self.drawables.remove(id)?;
        for pass in &mut self.passes {
            pass.remove_drawable(id);
        }
        Some(drawable)
    }

    #[must_use]
    pub fn drawable(&self, id: DrawableId) -> Option<&dyn Drawable> {
        self.drawables.get(id).map(AsRef::as_ref)
    }

    pub fn drawable_mut(&mut self, id: DrawableId) -> Option<&mut Box<dyn Drawable>> {
        self.drawables.get_mut(id)
    }

    pub fn add_drawable_to_default_pass(&mut self, id: DrawableId) -> bool {
        self.add_drawable_to_pass(self.default_serial, id)
    }

    pub fn remove_drawable_from_default_pass(&mut self, id: DrawableId) -> bool {
        self.remove_drawable_from_pass(self.default_serial, id)
    }

    /// Adds a registered drawable to a pass, ordered by its priority.
    pub fn add_drawable_to_pass(&mut self, serial: u32, id: DrawableId) -> bool {
        let Some(priority) = self.drawables.get(id).map(|d| d.priority()) else {
            log::warn!("Drawable {:?} is not registered with this frame", id);
            return false;
        };
        match self.pass_mut(serial) {
            Some(pass) => pass.add_drawable(id, priority),
            None => {
                log::warn!("No pass with serial {}", serial);
                false
            }
        }
    }

    pub fn remove_drawable_from_pass(&mut self, serial: u32, id: DrawableId) -> bool {
        self.pass_mut(serial).is_some_and(|pass| pass.remove_drawable(id))
    }

    // ── Passes ─────────────────────────────────────────────────────────────

    /// Inserts a pass and returns its serial.
    ///
    /// Equal priorities keep insertion order.
    pub fn add_pass(&mut self, mut pass: RenderPass) -> u32 {
        let serial = self.next_serial;
        self.next_serial += 1;
        pass.set_serial(serial);

        let at = self.passes.partition_point(|p| p.priority() <= pass.priority());
        self.passes.insert(at, pass);
        serial
    }

    /// Adds an off-screen scene pass rendering into `color_attachments` pooled
    /// attachments, published as [`PassSlot::Offscreen`](super::PassSlot::Offscreen).
    ///
    /// # Errors
    /// [`FxError::CapabilityUnsupported`] when the backend cannot bind
    /// `color_attachments` targets at once; [`FxError::InvalidSettings`] when
    /// the scene band is full.
    pub fn add_scene_pass(
        &mut self,
        name: impl Into<String>,
        color_attachments: u32,
        format: wgpu::TextureFormat,
    ) -> Result<u32> {
        // Offset 0 is the default pass.
        let offset = self.scene_pass_count + 1;
        let priority = band_priority(PassBand::Scene, offset)?;
        let node = ObjectPass::new(ObjectTarget::Offscreen {
            format,
            depth: self.settings.depth,
        });
        let pass = RenderPass::new(name, priority, Box::new(node))
            .with_color_attachments(color_attachments, &self.capabilities)?
            .with_clear_action(ClearAction::all(wgpu::Color::TRANSPARENT));
        self.scene_pass_count = offset;
        Ok(self.add_pass(pass))
    }

    /// Adds a full-screen filter over the scene color, after every filter
    /// added before it.
    ///
    /// # Errors
    /// [`FxError::InvalidSettings`] for an empty shader name or a full filter
    /// band.
    pub fn add_filter_pass(&mut self, name: impl Into<String>, config: FilterConfig) -> Result<u32> {
        let priority = band_priority(PassBand::Filter, self.filter_count)?;
        let node = FilterPass::new(config)?;
        let pass = RenderPass::new(name, priority, Box::new(node))
            .with_clear_action(ClearAction::LOAD);
        self.filter_count += 1;
        Ok(self.add_pass(pass))
    }

    /// Removes a user pass, releasing its long-lived resources.
    ///
    /// Built-in passes (default and post-processing) cannot be removed.
    pub fn remove_pass(&mut self, renderer: &mut dyn Renderer, serial: u32) -> bool {
        if serial < self.first_user_serial {
            log::warn!("Pass {} is built in and cannot be removed", serial);
            return false;
        }
        let Some(index) = self.passes.iter().position(|p| p.serial() == serial) else {
            return false;
        };
        let mut pass = self.passes.remove(index);
        pass.dispose(renderer, &mut self.texture_cache);
        true
    }

    /// Whether the frame renders through the `color_a` / `color_b` pair.
    fn uses_scene_color(&self) -> bool {
        self.settings.post_processing_enabled()
            || self.passes.iter().any(|p| p.color_io() == ColorIo::ReadWrite)
    }

    /// Reassigns `color_a` / `color_b` to the passes from position
    /// `start_index` of the execution order onwards. Earlier passes keep their
    /// bindings; the chain continues from the buffer the last of them left
    /// current (`color_a` when none did).
    ///
    /// Writers render into the current buffer; each read-write pass reads the
    /// current buffer and writes the other one, which then becomes current;
    /// readers sample the current buffer. Without a scene color chain the
    /// writer (and a trailing filter) render to the backbuffer.
    pub fn rewire_color_attachments(&mut self, start_index: usize) {
        let chained = self.uses_scene_color();
        let post = self.settings.post_processing_enabled();
        let last_color_pass = self
            .passes
            .iter()
            .rposition(|p| p.color_io() != ColorIo::None);

        let start_index = start_index.min(self.passes.len());
        let mut current = self.passes[..start_index]
            .iter()
            .rev()
            .find_map(|p| {
                let binding = p.state().color_binding();
                binding.write.or(binding.read)
            })
            .unwrap_or(0);

        for (index, pass) in self.passes.iter_mut().enumerate().skip(start_index) {
            let binding = match pass.color_io() {
                ColorIo::None => ColorBinding::default(),
                ColorIo::Write => ColorBinding {
                    read: None,
                    write: chained.then_some(current),
                },
                ColorIo::ReadWrite => {
                    let read = current;
                    let write = 1 - current;
                    current = write;
                    let writes_backbuffer = !post && Some(index) == last_color_pass;
                    ColorBinding {
                        read: Some(read),
                        write: (!writes_backbuffer).then_some(write),
                    }
                }
                ColorIo::Read => ColorBinding {
                    read: Some(current),
                    write: None,
                },
            };
            pass.set_color_binding(binding);
        }
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    fn ensure_scene_color(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let (width, height) = (self.settings.width, self.settings.height);
        if !self.uses_scene_color() {
            self.release_scene_color(renderer);
            return Ok(());
        }
        if let Some(scene) = &self.scene_color
            && scene.width == width
            && scene.height == height
        {
            return Ok(());
        }
        self.release_scene_color(renderer);

        let format = if self.settings.post_processing_enabled() {
            HDR_TEXTURE_FORMAT
        } else {
            LDR_TEXTURE_FORMAT
        };
        let desc = AttachmentDescriptor::new(width, height, format).with_depth(self.settings.depth);
        let color_a = renderer.create_attachment(&desc.with_label("color_a"))?;
        let color_b = match renderer.create_attachment(&desc.with_label("color_b")) {
            Ok(id) => id,
            Err(err) => {
                renderer.dispose_attachment(color_a);
                return Err(err);
            }
        };
        log::debug!("Scene color pair allocated at {}x{}", width, height);
        self.scene_color = Some(SceneColorTargets {
            targets: [color_a, color_b],
            width,
            height,
        });
        Ok(())
    }

    fn release_scene_color(&mut self, renderer: &mut dyn Renderer) {
        if let Some(scene) = self.scene_color.take() {
            for id in scene.targets {
                renderer.dispose_attachment(id);
            }
        }
    }

    fn upload_uniforms(&mut self, renderer: &mut dyn Renderer) {
        self.uniforms.set("time", self.time);
        self.uniforms.set(
            "resolution",
            Vec2::new(self.settings.width as f32, self.settings.height as f32),
        );
        self.camera.write_uniforms(&mut self.uniforms);
        renderer.set_global_uniforms(&self.uniforms);
    }

    /// Renders one frame.
    ///
    /// Pooled attachments acquired by any pass are returned to the pool before
    /// this returns, whether or not a pass failed.
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        self.blackboard.reset();
        self.ensure_scene_color(renderer)?;
        self.rewire_color_attachments(0);
        self.upload_uniforms(renderer);

        let viewport = Viewport::new(self.settings.width, self.settings.height);
        let result = self.run_passes(renderer, viewport);

        let mut ctx = PassContext {
            renderer: &mut *renderer,
            pool: &mut self.pool,
            texture_cache: &mut self.texture_cache,
            blackboard: &mut self.blackboard,
            scene_color: self.scene_color.as_ref(),
            viewport,
        };
        for pass in self.passes.iter_mut().filter(|p| p.is_configured()) {
            pass.cleanup(&mut ctx);
        }

        self.pool.flush(renderer, false, None);
        self.frames_rendered += 1;

        if let Err(err) = &result {
            log::error!("Frame {} aborted: {}", self.frames_rendered, err);
        }
        result
    }

    fn run_passes(&mut self, renderer: &mut dyn Renderer, viewport: Viewport) -> Result<()> {
        let Self {
            passes,
            drawables,
            pool,
            texture_cache,
            blackboard,
            scene_color,
            ..
        } = self;

        for pass in passes.iter_mut() {
            let mut ctx = PassContext {
                renderer: &mut *renderer,
                pool: &mut *pool,
                texture_cache: &mut *texture_cache,
                blackboard: &mut *blackboard,
                scene_color: scene_color.as_ref(),
                viewport,
            };
            pass.configure(&mut ctx)?;

            let mut ctx = ExecuteContext {
                renderer: &mut *renderer,
                drawables: &*drawables,
                blackboard: &*blackboard,
                scene_color: scene_color.as_ref(),
                viewport,
            };
            pass.execute(&mut ctx);
        }
        Ok(())
    }

    /// Changes the viewport size. The scene color pair is reallocated on the
    /// next frame, every idle pooled attachment is evicted and the camera is
    /// reset to the pixel-space projection of the new size.
    pub fn resize(&mut self, renderer: &mut dyn Renderer, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(FxError::InvalidSettings(format!(
                "viewport must be non-empty, got {width}x{height}"
            )));
        }
        if (width, height) == (self.settings.width, self.settings.height) {
            return Ok(());
        }
        self.settings.width = width;
        self.settings.height = height;
        self.camera = Camera::orthographic(width, height);
        self.release_scene_color(renderer);
        self.pool.flush(renderer, true, None);
        Ok(())
    }

    /// Releases every GPU resource held by the frame (shutdown).
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        for pass in &mut self.passes {
            pass.dispose(renderer, &mut self.texture_cache);
        }
        self.release_scene_color(renderer);
        self.pool.dispose(renderer);
        self.texture_cache.dispose(renderer);
    }
}

/// Priority of the `offset`-th pass of `band`, refusing offsets that would
/// spill into the next band.
fn band_priority(band: PassBand, offset: i32) -> Result<i32> {
    band.checked_priority(offset).ok_or_else(|| {
        FxError::InvalidSettings(format!(
            "{} band is full: at most {} passes",
            band.name(),
            PassBand::SPAN
        ))
    })
}

impl std::fmt::Debug for RenderFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderFrame")
            .field("settings", &self.settings)
            .field("passes", &self.passes)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
