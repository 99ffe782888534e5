//! Backend Interface
//!
//! The frame graph never talks to a graphics API directly. It orders passes,
//! manages attachment lifetimes and drives the masking protocols through the
//! [`Renderer`] trait; a concrete backend (wgpu, WebGL, a software rasterizer
//! in tests) implements it.
//!
//! GPU constants are the immutable `wgpu` enums (`TextureFormat`,
//! `CompareFunction`, `StencilOperation`, `ColorWrites`, ...), passed by value
//! into the backend.

use glam::{Mat4, Vec4};

use crate::errors::Result;
use crate::renderer::core::attachment::{AttachmentDescriptor, AttachmentSet, ClearAction, TextureDescriptor};
use crate::renderer::core::uniforms::{GlobalUniforms, UniformValue};

// ─── Handles ──────────────────────────────────────────────────────────────────

/// Opaque handle to a backend render-target attachment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct AttachmentId(pub u64);

/// Opaque handle to a backend sampled texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Opaque handle to uploaded geometry (owned by the backend / asset layer).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GeometryId(pub u64);

/// Opaque handle to a compiled material (owned by the backend / asset layer).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MaterialId(pub u64);

// ─── Capabilities ─────────────────────────────────────────────────────────────

/// What the active backend can do.
///
/// Checked once when the frame graph is assembled; missing capabilities
/// surface as [`FxError::CapabilityUnsupported`](crate::errors::FxError).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Maximum color attachments bound to one pass.
    pub max_color_attachments: u32,
    /// Half-float (`Rgba16Float`) color targets are renderable.
    pub half_float_color_targets: bool,
}

impl Capabilities {
    /// A WebGL1-class device: one color attachment, no float targets.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            max_color_attachments: 1,
            half_float_color_targets: false,
        }
    }

    /// Capabilities of a wgpu device created with `limits`.
    ///
    /// `Rgba16Float` is a renderable format in every wgpu backend.
    #[must_use]
    pub fn from_wgpu_limits(limits: &wgpu::Limits) -> Self {
        Self {
            max_color_attachments: limits.max_color_attachments,
            half_float_color_targets: true,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_color_attachments: 4,
            half_float_color_targets: true,
        }
    }
}

// ─── Per-pass State ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Which 8-bit counter plane a state change applies to.
///
/// The intersection protocol ([`MaskProcessor`](crate::renderer::mask::MaskProcessor))
/// and hierarchical clipping ([`ClipStack`](crate::renderer::mask::ClipStack))
/// never share values: each owns its plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterNamespace {
    Intersection,
    Clip,
}

/// Per-pixel counter test: the fragment passes when `reference <compare> counter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterTest {
    pub compare: wgpu::CompareFunction,
    pub reference: u8,
}

impl CounterTest {
    #[must_use]
    pub const fn equal(reference: u8) -> Self {
        Self {
            compare: wgpu::CompareFunction::Equal,
            reference,
        }
    }

    #[must_use]
    pub const fn always(reference: u8) -> Self {
        Self {
            compare: wgpu::CompareFunction::Always,
            reference,
        }
    }

    /// Evaluates the test against a stored counter value.
    #[must_use]
    pub fn passes(&self, counter: u8) -> bool {
        use wgpu::CompareFunction as C;
        match self.compare {
            C::Never => false,
            C::Less => self.reference < counter,
            C::Equal => self.reference == counter,
            C::LessEqual => self.reference <= counter,
            C::Greater => self.reference > counter,
            C::NotEqual => self.reference != counter,
            C::GreaterEqual => self.reference >= counter,
            C::Always => true,
        }
    }
}

/// Applies a counter operation to a stored value.
#[must_use]
pub fn apply_counter_op(op: wgpu::StencilOperation, reference: u8, counter: u8) -> u8 {
    use wgpu::StencilOperation as S;
    match op {
        S::Keep => counter,
        S::Zero => 0,
        S::Replace => reference,
        S::Invert => !counter,
        S::IncrementClamp => counter.saturating_add(1),
        S::DecrementClamp => counter.saturating_sub(1),
        S::IncrementWrap => counter.wrapping_add(1),
        S::DecrementWrap => counter.wrapping_sub(1),
    }
}

// ─── Draw Descriptions ────────────────────────────────────────────────────────

/// One geometry draw issued by a drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDraw {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Mat4,
    pub tint: Vec4,
}

/// Shader programs used by full-screen passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FullscreenShader {
    BloomThreshold,
    BlurHorizontal,
    BlurVertical,
    BlurUpsample,
    ToneMap,
    /// A user filter, resolved by name in the backend's shader library.
    Custom(String),
}

impl FullscreenShader {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::BloomThreshold => "bloom_threshold",
            Self::BlurHorizontal => "blur_horizontal",
            Self::BlurVertical => "blur_vertical",
            Self::BlurUpsample => "blur_upsample",
            Self::ToneMap => "tone_map",
            Self::Custom(name) => name,
        }
    }
}

/// A full-screen quad drawn with a parameterized material.
#[derive(Debug, Clone, Copy)]
pub struct FullscreenDraw<'a> {
    pub shader: &'a FullscreenShader,
    /// Sampled attachments, by binding name.
    pub inputs: &'a [(&'static str, AttachmentId)],
    /// Extra sampled textures, by binding name.
    pub textures: &'a [(&'static str, TextureId)],
    pub params: &'a [(&'static str, UniformValue)],
}

// ─── Renderer ─────────────────────────────────────────────────────────────────

/// Graphics backend consumed by the frame graph.
///
/// All calls happen on the rendering thread, strictly in frame order.
pub trait Renderer {
    fn capabilities(&self) -> Capabilities;

    // === Resource lifecycle ===
    fn create_attachment(&mut self, desc: &AttachmentDescriptor) -> Result<AttachmentId>;
    fn dispose_attachment(&mut self, id: AttachmentId);
    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId>;
    fn dispose_texture(&mut self, id: TextureId);

    // === Pass state ===
    /// Binds an off-screen attachment set, or the backbuffer for `None`.
    fn set_attachment(&mut self, target: Option<&AttachmentSet>);
    fn set_viewport(&mut self, viewport: Viewport);
    fn clear(&mut self, action: &ClearAction);
    fn set_global_uniforms(&mut self, uniforms: &GlobalUniforms);

    // === Counter (stencil) state ===
    fn clear_counter(&mut self, namespace: CounterNamespace, value: u8);
    /// `None` disables the test (and with it any counter writes).
    fn set_counter_test(&mut self, namespace: CounterNamespace, test: Option<CounterTest>);
    fn set_counter_write_on_pass(&mut self, namespace: CounterNamespace, op: wgpu::StencilOperation);
    fn set_color_write(&mut self, mask: wgpu::ColorWrites);

    // === Draws ===
    fn draw_mesh(&mut self, draw: &MeshDraw);
    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_test_equal_and_always() {
        assert!(CounterTest::equal(3).passes(3));
        assert!(!CounterTest::equal(3).passes(2));
        assert!(CounterTest::always(0).passes(200));
    }

    #[test]
    fn increment_clamp_saturates() {
        assert_eq!(apply_counter_op(wgpu::StencilOperation::IncrementClamp, 0, 255), 255);
        assert_eq!(apply_counter_op(wgpu::StencilOperation::IncrementWrap, 0, 255), 0);
        assert_eq!(apply_counter_op(wgpu::StencilOperation::Replace, 7, 1), 7);
        assert_eq!(apply_counter_op(wgpu::StencilOperation::Keep, 7, 1), 1);
    }

    #[test]
    fn capabilities_from_default_limits() {
        let caps = Capabilities::from_wgpu_limits(&wgpu::Limits::default());
        assert!(caps.max_color_attachments >= 4);
        assert!(caps.half_float_color_targets);
    }
}
