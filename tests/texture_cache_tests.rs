//! Pass Texture Cache Tests
//!
//! Tests for:
//! - Cache hits sharing one GPU texture
//! - Exactly-once disposal on the last reference, for any interleaving
//! - Keys covering every descriptor field
//! - Owned vs cache-managed handles
//! - Underflow logged, not fatal

mod common;

use common::{Event, SoftwareRenderer, init_logging, logged};
use vfx_frame::renderer::core::{Renderer, TextureDescriptor, TextureId};
use vfx_frame::renderer::graph::{PassTextureCache, SampledTexture, TextureOrigin};

fn lut() -> TextureDescriptor {
    TextureDescriptor::new("color_lut", 64, 64)
}

fn disposals(renderer: &SoftwareRenderer, id: TextureId) -> usize {
    renderer
        .events
        .iter()
        .filter(|e| **e == Event::DisposeTexture(id))
        .count()
}

#[test]
fn hits_share_one_texture() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut cache = PassTextureCache::new();

    let a = cache.request(&mut renderer, &lut()).unwrap();
    let b = cache.request(&mut renderer, &lut()).unwrap();

    assert_eq!(a.id(), b.id());
    assert!(a.is_cache_managed());
    assert_eq!(renderer.textures_created, 1);
    assert_eq!(cache.ref_count(&lut().cache_key()), Some(2));

    a.dispose(&mut renderer, &mut cache);
    b.dispose(&mut renderer, &mut cache);
}

#[test]
fn last_dispose_frees_exactly_once() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut cache = PassTextureCache::new();
    let key = lut().cache_key();

    let handles: Vec<SampledTexture> = (0..3)
        .map(|_| cache.request(&mut renderer, &lut()).unwrap())
        .collect();
    let id = handles[0].id();

    let mut remaining = handles.len();
    for handle in handles.into_iter().rev() {
        handle.dispose(&mut renderer, &mut cache);
        remaining -= 1;
        if remaining > 0 {
            assert_eq!(disposals(&renderer, id), 0);
            assert_eq!(cache.ref_count(&key), Some(remaining as u32));
        }
    }

    assert_eq!(disposals(&renderer, id), 1);
    assert!(cache.is_empty());
    assert!(renderer.live_textures.is_empty());
}

#[test]
fn interleaved_request_and_dispose() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut cache = PassTextureCache::new();

    let first = cache.request(&mut renderer, &lut()).unwrap();
    let first_id = first.id();
    first.dispose(&mut renderer, &mut cache);
    assert_eq!(disposals(&renderer, first_id), 1);

    // A fresh request after the entry died allocates again.
    let a = cache.request(&mut renderer, &lut()).unwrap();
    let b = cache.request(&mut renderer, &lut()).unwrap();
    let second_id = a.id();
    assert_ne!(first_id, second_id);

    b.dispose(&mut renderer, &mut cache);
    let c = cache.request(&mut renderer, &lut()).unwrap();
    a.dispose(&mut renderer, &mut cache);
    assert_eq!(disposals(&renderer, second_id), 0);
    c.dispose(&mut renderer, &mut cache);

    assert_eq!(disposals(&renderer, second_id), 1);
    assert_eq!(renderer.textures_created, 2);
    assert!(logged(log::Level::Error).is_empty());
}

#[test]
fn key_covers_defaulted_fields() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut cache = PassTextureCache::new();

    let linear = cache.request(&mut renderer, &lut()).unwrap();
    let nearest = cache
        .request(&mut renderer, &lut().with_filter(wgpu::FilterMode::Nearest))
        .unwrap();
    let float = cache
        .request(&mut renderer, &lut().with_format(wgpu::TextureFormat::Rgba16Float))
        .unwrap();

    assert_ne!(linear.id(), nearest.id());
    assert_ne!(linear.id(), float.id());
    assert_eq!(cache.len(), 3);

    for handle in [linear, nearest, float] {
        handle.dispose(&mut renderer, &mut cache);
    }
    assert!(cache.is_empty());
}

#[test]
fn owned_handle_frees_directly() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut cache = PassTextureCache::new();
    let id = renderer.create_texture(&lut()).unwrap();

    let owned = SampledTexture::owned(id);
    assert_eq!(owned.origin(), &TextureOrigin::Owned);
    owned.dispose(&mut renderer, &mut cache);

    assert!(renderer.live_textures.is_empty());
    assert!(logged(log::Level::Error).is_empty());
}

#[test]
fn removing_unknown_key_logs_underflow() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut cache = PassTextureCache::new();

    cache.remove_texture(&mut renderer, "never_requested");

    let errors = logged(log::Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("would go negative"));
    assert!(renderer.events.is_empty());
}

#[test]
fn dispose_frees_all_entries() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut cache = PassTextureCache::new();
    let _a = cache.request(&mut renderer, &lut()).unwrap();
    let _b = cache.request(&mut renderer, &lut().with_filter(wgpu::FilterMode::Nearest)).unwrap();

    cache.dispose(&mut renderer);

    assert!(cache.is_empty());
    assert!(renderer.live_textures.is_empty());
}
