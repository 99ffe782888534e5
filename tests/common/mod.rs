//! Software backend shared by the integration tests.
//!
//! `SoftwareRenderer` keeps a small pixel grid with one color plane (the last
//! geometry drawn at each pixel) and one 8-bit counter plane per
//! [`CounterNamespace`], so masking protocols can be checked pixel by pixel.
//! Every backend call is also recorded as an [`Event`].

#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::Once;

use rustc_hash::FxHashMap;
use vfx_frame::errors::{FxError, Result};
use vfx_frame::renderer::core::backend::apply_counter_op;
use vfx_frame::renderer::core::{
    AttachmentDescriptor, AttachmentId, AttachmentSet, Capabilities, ClearAction, CounterNamespace,
    CounterTest, FullscreenDraw, GeometryId, GlobalUniforms, MaterialId, MeshDraw, Renderer,
    TextureDescriptor, TextureId, UniformValue, Viewport,
};
use vfx_frame::renderer::graph::{Drawable, MeshDrawable};

// ============================================================================
// Logging
// ============================================================================

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static CAPTURE_LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Installs a logger recording every message per test thread.
pub fn init_logging() {
    INIT.call_once(|| {
        if log::set_logger(&CAPTURE_LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        } else {
            let _ = env_logger::builder().is_test(true).try_init();
        }
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
}

/// Messages logged on this thread at `level` since [`init_logging`].
pub fn logged(level: log::Level) -> Vec<String> {
    CAPTURED.with(|c| {
        c.borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    })
}

// ============================================================================
// Geometry
// ============================================================================

/// Axis-aligned pixel rectangle, `x1` / `y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FullscreenRecord {
    pub shader: String,
    pub inputs: Vec<(&'static str, AttachmentId)>,
    pub textures: Vec<(&'static str, TextureId)>,
    pub params: Vec<(&'static str, UniformValue)>,
    /// Attachments bound when the draw was issued; `None` is the backbuffer.
    pub target: Option<Vec<AttachmentId>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateAttachment(AttachmentId),
    DisposeAttachment(AttachmentId),
    CreateTexture(TextureId),
    DisposeTexture(TextureId),
    SetAttachment(Option<Vec<AttachmentId>>),
    SetViewport(Viewport),
    Clear(ClearAction),
    SetGlobalUniforms(usize),
    ClearCounter(CounterNamespace, u8),
    SetCounterTest(CounterNamespace, Option<CounterTest>),
    SetCounterOp(CounterNamespace, wgpu::StencilOperation),
    SetColorWrite(wgpu::ColorWrites),
    DrawMesh(GeometryId),
    DrawFullscreen(FullscreenRecord),
}

// ============================================================================
// SoftwareRenderer
// ============================================================================

pub struct SoftwareRenderer {
    pub capabilities: Capabilities,
    width: u32,
    height: u32,
    next_handle: u64,

    pub live_attachments: FxHashMap<AttachmentId, AttachmentDescriptor>,
    pub live_textures: FxHashMap<TextureId, TextureDescriptor>,
    pub attachments_created: usize,
    pub textures_created: usize,
    /// Fail `create_attachment` once this many attachments have been created.
    pub attachment_budget: Option<usize>,

    shapes: FxHashMap<GeometryId, Rect>,
    target: Option<Vec<AttachmentId>>,
    color: Vec<Option<GeometryId>>,
    counters: [Vec<u8>; 2],
    tests: [Option<CounterTest>; 2],
    ops: [wgpu::StencilOperation; 2],
    color_write: wgpu::ColorWrites,
    pub uniforms: GlobalUniforms,

    pub events: Vec<Event>,
}

fn plane(namespace: CounterNamespace) -> usize {
    match namespace {
        CounterNamespace::Intersection => 0,
        CounterNamespace::Clip => 1,
    }
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        Self {
            capabilities: Capabilities::default(),
            width,
            height,
            next_handle: 1,
            live_attachments: FxHashMap::default(),
            live_textures: FxHashMap::default(),
            attachments_created: 0,
            textures_created: 0,
            attachment_budget: None,
            shapes: FxHashMap::default(),
            target: None,
            color: vec![None; size],
            counters: [vec![0; size], vec![0; size]],
            tests: [None; 2],
            ops: [wgpu::StencilOperation::Keep; 2],
            color_write: wgpu::ColorWrites::ALL,
            uniforms: GlobalUniforms::new(),
            events: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Registers a geometry covering `rect` and returns a drawable for it.
    pub fn shape(&mut self, name: &str, id: u64, rect: Rect) -> MeshDrawable {
        let geometry = GeometryId(id);
        self.shapes.insert(geometry, rect);
        MeshDrawable::new(name, geometry, MaterialId(0))
    }

    /// Geometry visible at a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<GeometryId> {
        self.color[self.index(x, y)]
    }

    pub fn counter(&self, namespace: CounterNamespace, x: u32, y: u32) -> u8 {
        self.counters[plane(namespace)][self.index(x, y)]
    }

    pub fn fullscreen_draws(&self) -> Vec<&FullscreenRecord> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::DrawFullscreen(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn mesh_draws(&self) -> Vec<GeometryId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::DrawMesh(geometry) => Some(*geometry),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    fn allocate_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn rasterize(&mut self, geometry: GeometryId) {
        let Some(rect) = self.shapes.get(&geometry).copied() else {
            return;
        };
        for y in rect.y0..rect.y1.min(self.height) {
            for x in rect.x0..rect.x1.min(self.width) {
                let i = self.index(x, y);
                let passes = (0..2).all(|p| self.tests[p].is_none_or(|t| t.passes(self.counters[p][i])));
                if !passes {
                    continue;
                }
                for p in 0..2 {
                    if let Some(test) = self.tests[p] {
                        self.counters[p][i] = apply_counter_op(self.ops[p], test.reference, self.counters[p][i]);
                    }
                }
                if !self.color_write.is_empty() {
                    self.color[i] = Some(geometry);
                }
            }
        }
    }
}

impl Renderer for SoftwareRenderer {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn create_attachment(&mut self, desc: &AttachmentDescriptor) -> Result<AttachmentId> {
        if self
            .attachment_budget
            .is_some_and(|budget| self.attachments_created >= budget)
        {
            return Err(FxError::Backend(format!("out of memory allocating {}", desc.key())));
        }
        let id = AttachmentId(self.allocate_handle());
        self.attachments_created += 1;
        self.live_attachments.insert(id, *desc);
        self.events.push(Event::CreateAttachment(id));
        Ok(id)
    }

    fn dispose_attachment(&mut self, id: AttachmentId) {
        assert!(
            self.live_attachments.remove(&id).is_some(),
            "attachment {id:?} disposed twice or never created"
        );
        self.events.push(Event::DisposeAttachment(id));
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId> {
        let id = TextureId(self.allocate_handle());
        self.textures_created += 1;
        self.live_textures.insert(id, desc.clone());
        self.events.push(Event::CreateTexture(id));
        Ok(id)
    }

    fn dispose_texture(&mut self, id: TextureId) {
        assert!(
            self.live_textures.remove(&id).is_some(),
            "texture {id:?} disposed twice or never created"
        );
        self.events.push(Event::DisposeTexture(id));
    }

    fn set_attachment(&mut self, target: Option<&AttachmentSet>) {
        self.target = target.map(|set| set.colors.to_vec());
        self.events.push(Event::SetAttachment(self.target.clone()));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.events.push(Event::SetViewport(viewport));
    }

    fn clear(&mut self, action: &ClearAction) {
        if action.color.is_some() {
            self.color.fill(None);
        }
        if let Some(value) = action.counter {
            for plane in &mut self.counters {
                plane.fill(value);
            }
        }
        self.events.push(Event::Clear(*action));
    }

    fn set_global_uniforms(&mut self, uniforms: &GlobalUniforms) {
        self.uniforms = uniforms.clone();
        self.events.push(Event::SetGlobalUniforms(uniforms.len()));
    }

    fn clear_counter(&mut self, namespace: CounterNamespace, value: u8) {
        self.counters[plane(namespace)].fill(value);
        self.events.push(Event::ClearCounter(namespace, value));
    }

    fn set_counter_test(&mut self, namespace: CounterNamespace, test: Option<CounterTest>) {
        self.tests[plane(namespace)] = test;
        self.events.push(Event::SetCounterTest(namespace, test));
    }

    fn set_counter_write_on_pass(&mut self, namespace: CounterNamespace, op: wgpu::StencilOperation) {
        self.ops[plane(namespace)] = op;
        self.events.push(Event::SetCounterOp(namespace, op));
    }

    fn set_color_write(&mut self, mask: wgpu::ColorWrites) {
        self.color_write = mask;
        self.events.push(Event::SetColorWrite(mask));
    }

    fn draw_mesh(&mut self, draw: &MeshDraw) {
        self.events.push(Event::DrawMesh(draw.geometry));
        self.rasterize(draw.geometry);
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) {
        self.events.push(Event::DrawFullscreen(FullscreenRecord {
            shader: draw.shader.name().to_string(),
            inputs: draw.inputs.to_vec(),
            textures: draw.textures.to_vec(),
            params: draw.params.to_vec(),
            target: self.target.clone(),
        }));
    }
}

/// Boxes a drawable for [`RenderFrame::insert_drawable`](vfx_frame::RenderFrame::insert_drawable).
pub fn boxed(drawable: MeshDrawable) -> Box<dyn Drawable> {
    Box::new(drawable)
}
