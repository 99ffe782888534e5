//! Render Target Pool
//!
//! Provides a pool of short-lived render-target attachments. Passes acquire
//! attachments during **configure** and use them during **execute**; the frame
//! returns them during **cleanup**, after every pass has run.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 RenderTargetPool                    │
//! │                                                     │
//! │  entries: [PooledAttachment]  (key, occupied, age)  │
//! │                                                     │
//! │  get(desc)      → AttachmentId   (configure)        │
//! │  release(id)                      (cleanup)         │
//! │  flush()        age-based eviction (end of frame)   │
//! │  dispose()      shutdown                            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Memory Strategy
//!
//! - Entries are matched by a structural key (size, depth, filter, format).
//! - An occupied entry is never handed out twice; a miss allocates a new one.
//! - Entries idle for more than `max_unused_frames` flushes are destroyed, which
//!   bounds peak memory when effect complexity drops between frames.
//!
//! The live pool is bounded by the number of concurrently active passes, so
//! lookups are a linear scan.

use crate::errors::Result;
use crate::renderer::core::{AttachmentDescriptor, AttachmentId, AttachmentKey, Renderer};

/// Default eviction age, in flushes.
pub const DEFAULT_MAX_UNUSED_FRAMES: u64 = 4;

/// A pooled attachment owned by the pool, never by a pass.
#[derive(Debug, Clone)]
pub struct PooledAttachment {
    id: AttachmentId,
    key: AttachmentKey,
    descriptor: AttachmentDescriptor,
    occupied: bool,
    last_frame_released: u64,
}

impl PooledAttachment {
    #[inline]
    #[must_use]
    pub fn id(&self) -> AttachmentId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> AttachmentKey {
        self.key
    }

    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &AttachmentDescriptor {
        &self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    #[inline]
    #[must_use]
    pub fn last_frame_released(&self) -> u64 {
        self.last_frame_released
    }
}

/// Pool of temporary render-target attachments.
///
/// # Thread Safety
///
/// Not `Sync`-safe by contract: one pool per rendering context, mutated only
/// from the rendering thread. Multi-threaded recording would have to serialize
/// every `get` / `release` / `flush`.
#[derive(Debug)]
pub struct RenderTargetPool {
    entries: Vec<PooledAttachment>,
    current_frame: u64,
    max_unused_frames: u64,
}

impl RenderTargetPool {
    /// Creates an empty pool with the default eviction age.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_unused_frames(DEFAULT_MAX_UNUSED_FRAMES)
    }

    #[must_use]
    pub fn with_max_unused_frames(max_unused_frames: u64) -> Self {
        Self {
            entries: Vec::new(),
            current_frame: 0,
            max_unused_frames,
        }
    }

    // ── Configure phase ────────────────────────────────────────────────────

    /// Acquire an attachment matching `desc`.
    ///
    /// Reuses an unoccupied entry with the same structural key, otherwise asks
    /// the backend for a new attachment. The returned entry is always marked
    /// occupied.
    pub fn get(
        &mut self,
        renderer: &mut dyn Renderer,
        desc: &AttachmentDescriptor,
    ) -> Result<AttachmentId> {
        let key = desc.key();

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| !e.occupied && e.key == key)
        {
            entry.occupied = true;
            return Ok(entry.id);
        }

        let id = renderer.create_attachment(desc)?;
        log::debug!("Render target pool miss: allocated {:?} ({key})", id);
        self.entries.push(PooledAttachment {
            id,
            key,
            descriptor: *desc,
            occupied: true,
            last_frame_released: self.current_frame,
        });
        Ok(id)
    }

    // ── Cleanup phase ──────────────────────────────────────────────────────

    /// Return an attachment to the pool.
    ///
    /// Releasing an attachment the pool does not own, or one that is already
    /// free, is logged and ignored. Returns `true` when the entry was freed.
    pub fn release(&mut self, id: AttachmentId) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            log::error!("Render target pool: release of unknown attachment {:?}", id);
            return false;
        };

        if !entry.occupied {
            log::error!("Render target pool: attachment {:?} released twice", id);
            return false;
        }

        entry.occupied = false;
        entry.last_frame_released = self.current_frame;
        true
    }

    // ── Frame boundary ─────────────────────────────────────────────────────

    /// Advance the frame counter and evict stale entries.
    ///
    /// An unoccupied entry is destroyed when its age exceeds `frames_offset`
    /// (or the pool's `max_unused_frames` when `None`), or unconditionally when
    /// `force` is set. Occupied entries are never destroyed.
    pub fn flush(&mut self, renderer: &mut dyn Renderer, force: bool, frames_offset: Option<u64>) {
        self.current_frame += 1;
        let threshold = frames_offset.unwrap_or(self.max_unused_frames);
        let current_frame = self.current_frame;

        self.entries.retain(|entry| {
            if entry.occupied {
                return true;
            }
            let age = current_frame - entry.last_frame_released;
            if force || age > threshold {
                log::debug!(
                    "Render target pool: evicting {:?} ({}) after {} frames",
                    entry.id,
                    entry.key,
                    age
                );
                renderer.dispose_attachment(entry.id);
                false
            } else {
                true
            }
        });
    }

    /// Destroy every entry, occupied or not.
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        for entry in self.entries.drain(..) {
            if entry.occupied {
                log::warn!(
                    "Render target pool: disposing attachment {:?} that is still occupied",
                    entry.id
                );
            }
            renderer.dispose_attachment(entry.id);
        }
    }

    // ── Introspection ──────────────────────────────────────────────────────

    /// Total number of attachments managed by the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.entries.iter().filter(|e| e.occupied).count()
    }

    #[must_use]
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    #[must_use]
    pub fn max_unused_frames(&self) -> u64 {
        self.max_unused_frames
    }

    #[must_use]
    pub fn entry(&self, id: AttachmentId) -> Option<&PooledAttachment> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PooledAttachment> {
        self.entries.iter()
    }
}

impl Default for RenderTargetPool {
    fn default() -> Self {
        Self::new()
    }
}
