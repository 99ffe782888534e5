//! Masking protocols built on 8-bit counter planes.
//!
//! - [`MaskProcessor`]: intersection of forward masks minus reverse masks
//! - [`ClipStack`]: nested hierarchical clipping

pub mod clip;
pub mod processor;

pub use clip::ClipStack;
pub use processor::{MAX_MASK_REFERENCES, MaskProcessor, MaskReference};
