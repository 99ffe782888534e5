//! Stencil-Counter Mask Processor
//!
//! Composites an arbitrary set of mask references against one masked drawable
//! using the 8-bit counter plane of the [`Intersection`](CounterNamespace::Intersection)
//! namespace.
//!
//! # Protocol
//!
//! ```text
//! clear counter = 0                         (once per masked group)
//! color writes off, write-on-pass = +1
//! forward[i]  : test counter == i           (incremental AND)
//! reverse[j]  : test counter == N           (pushes covered pixels past N)
//! color writes on, write-on-pass = keep
//! masked item : test counter == N
//! ```
//!
//! `N` is the number of forward (non-inverted) masks. A pixel inside every
//! forward region and outside every reverse region ends at exactly `N`; a pixel
//! missing a forward region stays below `N`; a pixel under any reverse region
//! ends above `N`.
//!
//! The counter is cleared by the processor at the start of every masked group,
//! never between the masks of one group.

use smallvec::SmallVec;

use crate::renderer::core::{CounterNamespace, CounterTest, Renderer};
use crate::renderer::graph::drawable::{DrawableId, DrawableStore};

/// Counter planes are 8 bits wide.
pub const MAX_MASK_REFERENCES: usize = 255;

const NS: CounterNamespace = CounterNamespace::Intersection;

/// One mask applied to a masked drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskReference {
    pub drawable: DrawableId,
    /// Exclusion mask: the masked drawable is hidden where this one covers.
    pub inverted: bool,
}

/// Per-drawable mask state.
#[derive(Debug, Clone, Default)]
pub struct MaskProcessor {
    references: Vec<MaskReference>,
}

impl MaskProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mask reference.
    ///
    /// Forward masks are applied in insertion order. A drawable already
    /// referenced is not added twice. Past [`MAX_MASK_REFERENCES`] the
    /// reference is dropped with a warning; existing masks keep working.
    pub fn add_mask_reference(&mut self, drawable: DrawableId, inverted: bool) -> bool {
        if self.references.iter().any(|r| r.drawable == drawable) {
            return false;
        }
        if self.references.len() >= MAX_MASK_REFERENCES {
            log::warn!(
                "Mask reference {:?} dropped: at most {} masks per drawable",
                drawable,
                MAX_MASK_REFERENCES
            );
            return false;
        }
        self.references.push(MaskReference { drawable, inverted });
        true
    }

    pub fn remove_mask_reference(&mut self, drawable: DrawableId) -> bool {
        let before = self.references.len();
        self.references.retain(|r| r.drawable != drawable);
        self.references.len() != before
    }

    pub fn clear(&mut self) {
        self.references.clear();
    }

    #[must_use]
    pub fn references(&self) -> &[MaskReference] {
        &self.references
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.references.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Counter value a pixel must hold for the masked drawable to show.
    #[must_use]
    pub fn forward_count(&self) -> usize {
        self.references.iter().filter(|r| !r.inverted).count()
    }

    /// Runs the two-phase protocol, then `draw` for the masked geometry.
    ///
    /// References whose drawable is no longer registered are skipped with a
    /// warning, as if they had been removed.
    pub fn draw_masked(
        &self,
        renderer: &mut dyn Renderer,
        drawables: &DrawableStore,
        draw: impl FnOnce(&mut dyn Renderer),
    ) {
        let live = |r: &&MaskReference| {
            let present = drawables.contains_key(r.drawable);
            if !present {
                log::warn!("Mask drawable {:?} is no longer registered; skipped", r.drawable);
            }
            present
        };

        let forward: SmallVec<[DrawableId; 8]> = self
            .references
            .iter()
            .filter(|r| !r.inverted)
            .filter(live)
            .map(|r| r.drawable)
            .collect();
        let reverse: SmallVec<[DrawableId; 8]> = self
            .references
            .iter()
            .filter(|r| r.inverted)
            .filter(live)
            .map(|r| r.drawable)
            .collect();

        if forward.is_empty() && reverse.is_empty() {
            renderer.set_counter_test(NS, None);
            draw(renderer);
            return;
        }

        let target = forward.len() as u8;

        renderer.clear_counter(NS, 0);
        renderer.set_color_write(wgpu::ColorWrites::empty());
        renderer.set_counter_write_on_pass(NS, wgpu::StencilOperation::IncrementClamp);

        // Phase 1: incremental AND.
        for (i, id) in forward.iter().enumerate() {
            renderer.set_counter_test(NS, Some(CounterTest::equal(i as u8)));
            drawables[*id].draw_mask(renderer);
        }

        // Phase 2: exclusions.
        renderer.set_counter_test(NS, Some(CounterTest::equal(target)));
        for id in &reverse {
            drawables[*id].draw_mask(renderer);
        }

        renderer.set_color_write(wgpu::ColorWrites::ALL);
        renderer.set_counter_write_on_pass(NS, wgpu::StencilOperation::Keep);
        renderer.set_counter_test(NS, Some(CounterTest::equal(target)));
        draw(&mut *renderer);

        renderer.set_counter_test(NS, None);
    }
}
