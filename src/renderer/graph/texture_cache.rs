//! Pass Texture Cache
//!
//! Reference-counted cache of named sampled textures. Several unrelated passes
//! in the same frame may ask for the same texture with identical parameters;
//! they share one GPU resource and each disposes its handle independently.
//!
//! Handles carry their origin explicitly ([`TextureOrigin`]) instead of
//! intercepting the backend's dispose call: disposing a cache-managed
//! [`SampledTexture`] decrements the shared refcount, disposing an owned one
//! frees the GPU texture directly.

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::renderer::core::{Renderer, TextureDescriptor, TextureId};

#[derive(Debug)]
struct CachedTexture {
    texture: TextureId,
    ref_count: u32,
}

/// Where a [`SampledTexture`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureOrigin {
    /// Shared through a [`PassTextureCache`] under `key`.
    Cached { key: String },
    /// Exclusively owned by the holder.
    Owned,
}

/// Handle to a sampled texture.
///
/// Consumed by [`dispose`](Self::dispose), so one handle releases its
/// reference at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "sampled textures must be disposed to release their reference"]
pub struct SampledTexture {
    texture: TextureId,
    origin: TextureOrigin,
}

impl SampledTexture {
    /// Wraps a texture that is not managed by any cache.
    pub fn owned(texture: TextureId) -> Self {
        Self {
            texture,
            origin: TextureOrigin::Owned,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TextureId {
        self.texture
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> &TextureOrigin {
        &self.origin
    }

    #[inline]
    #[must_use]
    pub fn is_cache_managed(&self) -> bool {
        matches!(self.origin, TextureOrigin::Cached { .. })
    }

    /// Releases this handle's reference.
    pub fn dispose(self, renderer: &mut dyn Renderer, cache: &mut PassTextureCache) {
        match self.origin {
            TextureOrigin::Cached { key } => cache.remove_texture(renderer, &key),
            TextureOrigin::Owned => renderer.dispose_texture(self.texture),
        }
    }
}

/// Reference-counted texture cache, one per rendering context.
#[derive(Debug, Default)]
pub struct PassTextureCache {
    entries: FxHashMap<String, CachedTexture>,
}

impl PassTextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a shared texture.
    ///
    /// On hit the entry's refcount is incremented; on miss the backend creates
    /// the texture and the entry starts with a refcount of 1.
    pub fn request(
        &mut self,
        renderer: &mut dyn Renderer,
        desc: &TextureDescriptor,
    ) -> Result<SampledTexture> {
        let key = desc.cache_key();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.ref_count += 1;
            return Ok(SampledTexture {
                texture: entry.texture,
                origin: TextureOrigin::Cached { key },
            });
        }

        let texture = renderer.create_texture(desc)?;
        log::debug!("Texture cache miss: created {:?} for '{}'", texture, key);
        self.entries.insert(
            key.clone(),
            CachedTexture {
                texture,
                ref_count: 1,
            },
        );
        Ok(SampledTexture {
            texture,
            origin: TextureOrigin::Cached { key },
        })
    }

    /// Drop one reference to `key`; the last reference frees the GPU texture.
    ///
    /// Removing a key with no live entry means a reference was released more
    /// times than it was acquired: this is logged and ignored.
    pub fn remove_texture(&mut self, renderer: &mut dyn Renderer, key: &str) {
        let Some(entry) = self.entries.get_mut(key) else {
            log::error!("Texture cache: reference count for '{}' would go negative", key);
            return;
        };

        if entry.ref_count <= 1 {
            let texture = entry.texture;
            self.entries.remove(key);
            renderer.dispose_texture(texture);
        } else {
            entry.ref_count -= 1;
        }
    }

    /// Force-dispose every entry (shutdown).
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        for (_, entry) in self.entries.drain() {
            renderer.dispose_texture(entry.texture);
        }
    }

    #[must_use]
    pub fn ref_count(&self, key: &str) -> Option<u32> {
        self.entries.get(key).map(|e| e.ref_count)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
