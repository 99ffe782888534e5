//! Hierarchical clip masks.
//!
//! The [`Clip`](CounterNamespace::Clip) counter plane holds the clip nesting
//! depth of every pixel. Opening a scope increments the pixels of its geometry
//! that sit at the current depth, so a child region never reaches past its
//! parent; closing the scope decrements the same pixels back. Content is drawn
//! where the plane equals the current depth.
//!
//! ```text
//! push(parent)   test == 0, +1   → parent region at 1
//! push(child)    test == 1, +1   → child ∩ parent at 2
//! content        test == 2
//! pop(child)     test == 2, −1   → parent region at 1 again
//! content        test == 1
//! pop(parent)    test == 1, −1   → plane back to 0, test off
//! ```
//!
//! The intersection plane is never touched.

use crate::renderer::core::{CounterNamespace, CounterTest, Renderer};

const NS: CounterNamespace = CounterNamespace::Clip;

/// Nested clip scopes of one render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClipStack {
    depth: u8,
}

impl ClipStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open scopes.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Opens a scope restricted to `geometry` inside the current one.
    ///
    /// The outermost push clears the plane. Past 255 nested scopes the push is
    /// dropped with a warning and draws stay restricted to the innermost scope.
    pub fn push(
        &mut self,
        renderer: &mut dyn Renderer,
        geometry: impl FnOnce(&mut dyn Renderer),
    ) -> bool {
        if self.depth == u8::MAX {
            log::warn!("Clip scope dropped: at most {} nested clips", u8::MAX);
            return false;
        }
        if self.depth == 0 {
            renderer.clear_counter(NS, 0);
        }
        Self::write(renderer, self.depth, wgpu::StencilOperation::IncrementClamp, geometry);
        self.depth += 1;
        self.apply(renderer);
        true
    }

    /// Closes the innermost scope. `geometry` must cover what the matching
    /// [`push`](Self::push) drew.
    pub fn pop(&mut self, renderer: &mut dyn Renderer, geometry: impl FnOnce(&mut dyn Renderer)) {
        if self.depth == 0 {
            log::error!("Clip stack popped while empty");
            return;
        }
        Self::write(renderer, self.depth, wgpu::StencilOperation::DecrementClamp, geometry);
        self.depth -= 1;
        self.apply(renderer);
    }

    /// Restricts subsequent draws to the innermost scope, or lifts the
    /// restriction when no scope is open.
    pub fn apply(&self, renderer: &mut dyn Renderer) {
        let test = (self.depth > 0).then(|| CounterTest::equal(self.depth));
        renderer.set_counter_test(NS, test);
    }

    /// Opens a scope for `geometry`, draws `content` inside it and closes it.
    ///
    /// `content` receives the stack so it can open nested scopes.
    pub fn scope(
        &mut self,
        renderer: &mut dyn Renderer,
        geometry: impl Fn(&mut dyn Renderer),
        content: impl FnOnce(&mut dyn Renderer, &mut Self),
    ) {
        let opened = self.push(renderer, &geometry);
        content(&mut *renderer, self);
        if opened {
            self.pop(renderer, &geometry);
        }
    }

    fn write(
        renderer: &mut dyn Renderer,
        depth: u8,
        op: wgpu::StencilOperation,
        geometry: impl FnOnce(&mut dyn Renderer),
    ) {
        renderer.set_color_write(wgpu::ColorWrites::empty());
        renderer.set_counter_write_on_pass(NS, op);
        renderer.set_counter_test(NS, Some(CounterTest::equal(depth)));
        geometry(&mut *renderer);
        renderer.set_counter_write_on_pass(NS, wgpu::StencilOperation::Keep);
        renderer.set_color_write(wgpu::ColorWrites::ALL);
    }
}
