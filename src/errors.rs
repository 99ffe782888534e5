//! Error Types
//!
//! This module defines the error types used throughout the frame runtime.
//!
//! # Overview
//!
//! The main error type [`FxError`] only covers failures that are surfaced to
//! the caller:
//! - Capability errors detected while assembling the frame graph
//! - Invalid pass configuration
//! - Backend allocation failures
//!
//! Per-frame resource anomalies (double release, refcount underflow, mask
//! capacity overflow) are *not* errors. They are logged and skipped so that a
//! single misbehaving effect cannot take the whole player down.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vfx_frame::errors::{FxError, Result};
//!
//! fn build() -> Result<()> {
//!     Err(FxError::InvalidSettings("blur steps must be at least 1".into()))
//! }
//! ```

use thiserror::Error;

/// A backend feature the frame graph cannot work without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// More than one color attachment bound to a single pass.
    MultipleColorAttachments,
    /// Renderable half-float color targets (needed by the post-processing chain).
    HalfFloatColorTargets,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleColorAttachments => f.write_str("multiple color attachments"),
            Self::HalfFloatColorTargets => f.write_str("half-float color targets"),
        }
    }
}

/// The main error type for the frame runtime.
#[derive(Error, Debug)]
pub enum FxError {
    // ========================================================================
    // Construction-time errors
    // ========================================================================
    /// The active backend lacks a capability the requested graph needs.
    #[error("Capability unsupported: {capability} ({detail})")]
    CapabilityUnsupported {
        /// Missing capability
        capability: Capability,
        /// What asked for it
        detail: String,
    },

    /// A pass configuration failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // ========================================================================
    // Backend errors
    // ========================================================================
    /// The backend failed to allocate a GPU resource.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl FxError {
    pub(crate) fn unsupported(capability: Capability, detail: impl Into<String>) -> Self {
        Self::CapabilityUnsupported {
            capability,
            detail: detail.into(),
        }
    }
}

/// Alias for `Result<T, FxError>`.
pub type Result<T> = std::result::Result<T, FxError>;
