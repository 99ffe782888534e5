//! Frame Settings & Post-Processing Configuration
//!
//! [`FrameSettings`] decides the topology of the frame graph:
//!
//! | `post_process` | Passes                                                    |
//! |----------------|-----------------------------------------------------------|
//! | `None`         | Object pass → backbuffer                                  |
//! | `Some(..)`     | Object pass → threshold → blur ×K → up-sample ×(K−1) → tone map |
//!
//! Each post pass is configured by its own tagged struct, validated once when
//! the frame is assembled.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vfx_frame::renderer::settings::{FrameSettings, PostProcessSettings};
//!
//! let settings = FrameSettings {
//!     post_process: Some(PostProcessSettings::default()),
//!     ..FrameSettings::new(1280, 720)
//! };
//! let frame = RenderFrame::new(settings, renderer.capabilities())?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{FxError, Result};
use crate::renderer::core::DepthBits;
use crate::renderer::graph::render_target_pool::DEFAULT_MAX_UNUSED_FRAMES;

// ---------------------------------------------------------------------------
// Threshold
// ---------------------------------------------------------------------------

/// Bright-pass extraction feeding the blur pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Luminance above which pixels contribute to bloom.
    pub threshold: f32,
    /// Soft-knee width around the threshold (0 = hard cut).
    pub knee: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            knee: 0.5,
        }
    }
}

impl ThresholdConfig {
    fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(FxError::InvalidSettings(format!(
                "bloom threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if !self.knee.is_finite() || self.knee < 0.0 {
            return Err(FxError::InvalidSettings(format!(
                "bloom knee must be a non-negative number, got {}",
                self.knee
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blur
// ---------------------------------------------------------------------------

/// Gaussian blur pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Number of down-sample steps `K` (each halves resolution). At least 1.
    pub steps: u8,
    /// Kernel radius in texels at each level.
    pub radius: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            steps: 4,
            radius: 1.0,
        }
    }
}

impl BlurConfig {
    /// Upper bound on `steps`; a 1×1 level is reached long before on any
    /// realistic viewport.
    pub const MAX_STEPS: u8 = 16;

    fn validate(&self) -> Result<()> {
        if self.steps == 0 || self.steps > Self::MAX_STEPS {
            return Err(FxError::InvalidSettings(format!(
                "blur steps must be in 1..={}, got {}",
                Self::MAX_STEPS,
                self.steps
            )));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(FxError::InvalidSettings(format!(
                "blur radius must be positive, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tone mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteConfig {
    /// Darkening at the corners (0 = none, 1 = black).
    pub intensity: f32,
    /// Normalized distance from the center where darkening starts.
    pub smoothness: f32,
}

impl Default for VignetteConfig {
    fn default() -> Self {
        Self {
            intensity: 0.3,
            smoothness: 0.5,
        }
    }
}

/// Final composite of scene color and bloom into the backbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMapConfig {
    pub exposure: f32,
    pub saturation: f32,
    pub contrast: f32,
    /// Bloom contribution added to the scene color.
    pub bloom_intensity: f32,
    pub vignette: Option<VignetteConfig>,
}

impl Default for ToneMapConfig {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            saturation: 1.0,
            contrast: 1.0,
            bloom_intensity: 1.0,
            vignette: None,
        }
    }
}

impl ToneMapConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("exposure", self.exposure),
            ("saturation", self.saturation),
            ("contrast", self.contrast),
            ("bloom intensity", self.bloom_intensity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FxError::InvalidSettings(format!(
                    "tone map {name} must be a non-negative number, got {value}"
                )));
            }
        }
        if let Some(vignette) = &self.vignette
            && !(0.0..=1.0).contains(&vignette.intensity)
        {
            return Err(FxError::InvalidSettings(format!(
                "vignette intensity must be in 0..=1, got {}",
                vignette.intensity
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PostProcessSettings
// ---------------------------------------------------------------------------

/// Post-processing chain configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessSettings {
    pub threshold: ThresholdConfig,
    pub blur: BlurConfig,
    pub tone_map: ToneMapConfig,
}

impl PostProcessSettings {
    /// Validates every per-pass config.
    pub fn validate(&self) -> Result<()> {
        self.threshold.validate()?;
        self.blur.validate()?;
        self.tone_map.validate()
    }
}

// ---------------------------------------------------------------------------
// FrameSettings
// ---------------------------------------------------------------------------

/// Configuration consumed by [`RenderFrame::new`](crate::renderer::graph::RenderFrame::new).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Clear color of the default object pass.
    pub clear_color: wgpu::Color,
    /// Depth/counter storage of the scene color targets. Masking needs
    /// [`DepthBits::D24`].
    pub depth: DepthBits,
    /// Post-processing chain; `None` renders straight to the backbuffer.
    pub post_process: Option<PostProcessSettings>,
    /// Frames an unused pooled attachment survives before eviction.
    pub max_unused_frames: u64,
}

impl FrameSettings {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Returns `true` when the post-processing sub-graph is assembled.
    #[inline]
    #[must_use]
    pub fn post_processing_enabled(&self) -> bool {
        self.post_process.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FxError::InvalidSettings(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if let Some(post) = &self.post_process {
            post.validate()?;
        }
        Ok(())
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            clear_color: wgpu::Color::TRANSPARENT,
            depth: DepthBits::D24,
            post_process: None,
            max_unused_frames: DEFAULT_MAX_UNUSED_FRAMES,
        }
    }
}
