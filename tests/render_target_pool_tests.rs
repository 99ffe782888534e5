//! Render Target Pool Tests
//!
//! Tests for:
//! - Structural-key reuse and occupancy (a held attachment is never handed out twice)
//! - Age-based eviction in `flush`, forced flush and per-call thresholds
//! - Release anomalies (unknown / double release) logged, not fatal
//! - Shutdown disposal

mod common;

use common::{SoftwareRenderer, init_logging, logged};
use rustc_hash::FxHashSet;
use vfx_frame::renderer::core::{AttachmentDescriptor, AttachmentId, DepthBits};
use vfx_frame::renderer::graph::RenderTargetPool;

fn scenario_desc() -> AttachmentDescriptor {
    AttachmentDescriptor::new(256, 256, wgpu::TextureFormat::Rgba32Float)
        .with_depth(DepthBits::D16)
        .with_filter(wgpu::FilterMode::Linear)
}

// ============================================================================
// Acquisition
// ============================================================================

#[test]
fn get_without_release_allocates_distinct_attachment() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();

    let first = pool.get(&mut renderer, &scenario_desc()).unwrap();
    let second = pool.get(&mut renderer, &scenario_desc()).unwrap();

    assert_ne!(first, second);
    assert_eq!(renderer.attachments_created, 2);
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.occupied_count(), 2);
}

#[test]
fn released_attachment_is_reused() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();

    let first = pool.get(&mut renderer, &scenario_desc()).unwrap();
    assert!(pool.release(first));
    let again = pool.get(&mut renderer, &scenario_desc()).unwrap();

    assert_eq!(first, again);
    assert_eq!(renderer.attachments_created, 1);
    assert!(pool.entry(first).unwrap().is_occupied());
}

#[test]
fn different_keys_never_share() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();

    let a = pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.release(a);
    let b = pool
        .get(&mut renderer, &scenario_desc().with_filter(wgpu::FilterMode::Nearest))
        .unwrap();
    let c = pool.get(&mut renderer, &scenario_desc().with_depth(DepthBits::None)).unwrap();

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(pool.len(), 3);
    assert!(!pool.entry(a).unwrap().is_occupied());
}

#[test]
fn get_never_returns_an_occupied_entry() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();
    let descs = [
        scenario_desc(),
        scenario_desc().half(),
        AttachmentDescriptor::new(64, 64, wgpu::TextureFormat::Rgba8Unorm),
    ];

    let mut held: Vec<AttachmentId> = Vec::new();
    let mut seed: u32 = 0x2545_f491;
    for step in 0..500 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let roll = (seed >> 16) as usize;

        if roll % 3 == 0 && !held.is_empty() {
            let id = held.swap_remove(roll % held.len());
            assert!(pool.release(id));
        } else {
            let id = pool.get(&mut renderer, &descs[roll % descs.len()]).unwrap();
            assert!(!held.contains(&id), "step {step}: {id:?} handed out while held");
            held.push(id);
        }

        if step % 50 == 49 {
            pool.flush(&mut renderer, false, None);
        }

        let unique: FxHashSet<_> = held.iter().copied().collect();
        assert_eq!(unique.len(), held.len());
        assert_eq!(pool.occupied_count(), held.len());
    }
}

// ============================================================================
// Eviction
// ============================================================================

#[test]
fn idle_entry_evicted_after_max_unused_frames_plus_one_flushes() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();
    let id = pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.release(id);

    for _ in 0..pool.max_unused_frames() {
        pool.flush(&mut renderer, false, None);
        assert!(pool.entry(id).is_some());
    }
    pool.flush(&mut renderer, false, None);

    assert!(pool.entry(id).is_none());
    assert!(pool.is_empty());
    assert!(renderer.live_attachments.is_empty());
}

#[test]
fn reacquired_entry_is_never_evicted() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();
    let id = pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.release(id);

    for _ in 0..3 {
        pool.flush(&mut renderer, false, None);
    }
    assert_eq!(pool.get(&mut renderer, &scenario_desc()).unwrap(), id);

    for _ in 0..20 {
        pool.flush(&mut renderer, false, None);
    }
    assert!(pool.entry(id).is_some());

    // Released again: the age restarts from the new release.
    pool.release(id);
    for _ in 0..4 {
        pool.flush(&mut renderer, false, None);
    }
    assert!(pool.entry(id).is_some());
}

#[test]
fn forced_flush_spares_occupied_entries() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();
    let held = pool.get(&mut renderer, &scenario_desc()).unwrap();
    let idle = pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.release(idle);

    pool.flush(&mut renderer, true, None);

    assert!(pool.entry(held).is_some());
    assert!(pool.entry(idle).is_none());
    assert_eq!(renderer.live_attachments.len(), 1);
}

#[test]
fn frames_offset_overrides_default_threshold() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();
    let id = pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.release(id);

    pool.flush(&mut renderer, false, Some(1));
    assert!(pool.entry(id).is_some());
    pool.flush(&mut renderer, false, Some(1));
    assert!(pool.entry(id).is_none());
}

#[test]
fn flush_advances_frame_counter() {
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::with_max_unused_frames(2);
    let id = pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.flush(&mut renderer, false, None);
    pool.flush(&mut renderer, false, None);
    pool.release(id);

    assert_eq!(pool.current_frame(), 2);
    assert_eq!(pool.entry(id).unwrap().last_frame_released(), 2);
}

// ============================================================================
// Anomalies & Shutdown
// ============================================================================

#[test]
fn unknown_and_double_release_are_logged_noops() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();
    let id = pool.get(&mut renderer, &scenario_desc()).unwrap();

    assert!(!pool.release(AttachmentId(9_999)));
    assert!(pool.release(id));
    assert!(!pool.release(id));

    let errors = logged(log::Level::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("unknown"));
    assert!(errors[1].contains("released twice"));
    assert_eq!(pool.len(), 1);
}

#[test]
fn dispose_destroys_every_entry() {
    init_logging();
    let mut renderer = SoftwareRenderer::new(4, 4);
    let mut pool = RenderTargetPool::new();
    let a = pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.get(&mut renderer, &scenario_desc()).unwrap();
    pool.release(a);

    pool.dispose(&mut renderer);

    assert!(pool.is_empty());
    assert!(renderer.live_attachments.is_empty());
}
