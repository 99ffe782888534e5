//! Attachment and Sampled-Texture Descriptors
//!
//! Shared small types describing GPU images, how passes bind them, and what
//! happens to their contents at the start and end of a pass.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::backend::AttachmentId;

// ─── Depth ────────────────────────────────────────────────────────────────────

/// Depth (and counter) storage attached alongside a color image.
///
/// `D24` is backed by a packed depth/stencil format and therefore carries the
/// 8-bit per-pixel counter used by the masking protocols. `D16` is depth only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthBits {
    #[default]
    None,
    D16,
    D24,
}

impl DepthBits {
    /// Numeric bit count as used in pool keys (`0`, `16` or `24`).
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::D16 => 16,
            Self::D24 => 24,
        }
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::None),
            16 => Some(Self::D16),
            24 => Some(Self::D24),
            _ => None,
        }
    }

    /// The depth texture format backing this configuration.
    #[must_use]
    pub const fn format(self) -> Option<wgpu::TextureFormat> {
        match self {
            Self::None => None,
            Self::D16 => Some(wgpu::TextureFormat::Depth16Unorm),
            Self::D24 => Some(wgpu::TextureFormat::Depth24PlusStencil8),
        }
    }

    /// Returns `true` when the attachment carries an 8-bit counter plane.
    #[inline]
    #[must_use]
    pub const fn has_counter(self) -> bool {
        matches!(self, Self::D24)
    }
}

// ─── Attachment Descriptor ────────────────────────────────────────────────────

/// Descriptor of a render-target attachment.
///
/// Immutable once an attachment has been created from it; the render target
/// pool keys reuse on every field except `label`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDescriptor {
    pub width: u32,
    pub height: u32,
    pub depth: DepthBits,
    pub filter: wgpu::FilterMode,
    pub format: wgpu::TextureFormat,
    pub label: &'static str,
}

impl AttachmentDescriptor {
    #[must_use]
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            depth: DepthBits::None,
            filter: wgpu::FilterMode::Linear,
            format,
            label: "attachment",
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: DepthBits) -> Self {
        self.depth = depth;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: wgpu::FilterMode) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Same descriptor at half resolution (clamped to 1×1).
    #[must_use]
    pub fn half(&self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
            ..*self
        }
    }

    /// Structural key used by [`RenderTargetPool`](crate::renderer::graph::RenderTargetPool).
    #[must_use]
    pub fn key(&self) -> AttachmentKey {
        AttachmentKey {
            width: self.width,
            height: self.height,
            depth_bits: self.depth.bits(),
            filter: self.filter,
            format: self.format,
        }
    }
}

/// Structural hash key of an attachment.
///
/// Renders as `"{w}_{h}_{depth}_{filter}_{format}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    width: u32,
    height: u32,
    depth_bits: u32,
    filter: wgpu::FilterMode,
    format: wgpu::TextureFormat,
}

impl fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{:?}_{:?}",
            self.width, self.height, self.depth_bits, self.filter, self.format
        )
    }
}

// ─── Attachment Set ───────────────────────────────────────────────────────────

/// The off-screen targets a pass renders into.
///
/// A pass with no attachment set renders to the backbuffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSet {
    pub colors: SmallVec<[AttachmentId; 4]>,
    pub width: u32,
    pub height: u32,
}

impl AttachmentSet {
    #[must_use]
    pub fn single(color: AttachmentId, width: u32, height: u32) -> Self {
        Self {
            colors: smallvec::smallvec![color],
            width,
            height,
        }
    }
}

// ─── Load / Store Actions ─────────────────────────────────────────────────────

/// What to clear when a pass begins. `None` fields keep previous contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearAction {
    pub color: Option<wgpu::Color>,
    pub depth: Option<f32>,
    pub counter: Option<u8>,
}

impl ClearAction {
    /// Keep everything (load).
    pub const LOAD: Self = Self {
        color: None,
        depth: None,
        counter: None,
    };

    /// Clear color to `color`, depth to 1.0 and the counter plane to 0.
    #[must_use]
    pub const fn all(color: wgpu::Color) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
            counter: Some(0),
        }
    }

    #[must_use]
    pub const fn color_only(color: wgpu::Color) -> Self {
        Self {
            color: Some(color),
            depth: None,
            counter: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_load(&self) -> bool {
        self.color.is_none() && self.depth.is_none() && self.counter.is_none()
    }
}

impl Default for ClearAction {
    fn default() -> Self {
        Self::all(wgpu::Color::BLACK)
    }
}

/// What to keep once a pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreAction {
    pub color: wgpu::StoreOp,
    pub depth: wgpu::StoreOp,
}

impl Default for StoreAction {
    fn default() -> Self {
        Self {
            color: wgpu::StoreOp::Store,
            depth: wgpu::StoreOp::Discard,
        }
    }
}

// ─── Sampled Texture Descriptor ───────────────────────────────────────────────

/// Descriptor of a named sampled texture managed by the
/// [`PassTextureCache`](crate::renderer::graph::PassTextureCache).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub filter: wgpu::FilterMode,
    pub address_mode: wgpu::AddressMode,
    pub generate_mipmaps: bool,
}

impl TextureDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width: width.max(1),
            height: height.max(1),
            format: wgpu::TextureFormat::Rgba8Unorm,
            filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::ClampToEdge,
            generate_mipmaps: false,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: wgpu::FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Cache key built from the name and every descriptor field, defaulted ones included.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}_{}_{:?}_{:?}_{:?}_{}",
            self.name,
            self.width,
            self.height,
            self.format,
            self.filter,
            self.address_mode,
            u8::from(self.generate_mipmaps),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_key_format() {
        let desc = AttachmentDescriptor::new(256, 256, wgpu::TextureFormat::Rgba8Unorm)
            .with_depth(DepthBits::D16);
        assert_eq!(desc.key().to_string(), "256_256_16_Linear_Rgba8Unorm");
    }

    #[test]
    fn label_does_not_change_key() {
        let a = AttachmentDescriptor::new(64, 32, wgpu::TextureFormat::Rgba16Float);
        let b = a.with_label("other");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn half_clamps_to_one() {
        let desc = AttachmentDescriptor::new(3, 1, wgpu::TextureFormat::Rgba8Unorm);
        let half = desc.half();
        assert_eq!((half.width, half.height), (1, 1));
        assert_eq!(half.half().width, 1);
    }

    #[test]
    fn depth_bits_round_trip_and_counter() {
        for depth in [DepthBits::None, DepthBits::D16, DepthBits::D24] {
            assert_eq!(DepthBits::from_bits(depth.bits()), Some(depth));
        }
        assert_eq!(DepthBits::from_bits(32), None);
        assert!(DepthBits::D24.has_counter());
        assert!(!DepthBits::D16.has_counter());
    }

    #[test]
    fn cache_key_includes_defaulted_fields() {
        let a = TextureDescriptor::new("scene", 128, 128);
        let b = a.clone().with_filter(wgpu::FilterMode::Nearest);
        assert_ne!(a.cache_key(), b.cache_key());
        assert!(a.cache_key().starts_with("scene_128_128_"));
    }
}
