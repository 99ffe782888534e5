//! Drawables and ordered drawable lists.
//!
//! Drawables are registered once in a [`DrawableStore`] and referenced by
//! [`DrawableId`] everywhere else (pass lists, mask references), so "already in
//! the list" is a key comparison rather than an object-identity check.

use glam::{Mat4, Vec4};
use rustc_hash::FxHashSet;
use slotmap::{SlotMap, new_key_type};

use crate::renderer::core::{GeometryId, MaterialId, MeshDraw, Renderer};
use crate::renderer::mask::MaskProcessor;

new_key_type! {
    /// Stable handle to a registered drawable.
    pub struct DrawableId;
}

/// Storage of every drawable known to a frame.
pub type DrawableStore = SlotMap<DrawableId, Box<dyn Drawable>>;

/// An item drawn by a pass.
///
/// Upstream producers (particle systems, shapes, text) update their per-frame
/// transform and color; the frame only orders and gates the draw calls.
pub trait Drawable {
    fn name(&self) -> &str {
        "drawable"
    }

    /// Sort key within a pass; lower draws first.
    fn priority(&self) -> i32 {
        0
    }

    /// Issue this item's draw call(s).
    fn draw(&self, renderer: &mut dyn Renderer);

    /// Issue the coverage of this item when it is used as a mask.
    ///
    /// Only counter writes are enabled at that point, so an item hidden from
    /// color rendering must still draw its geometry here.
    fn draw_mask(&self, renderer: &mut dyn Renderer) {
        self.draw(renderer);
    }

    /// Masks gating this drawable, if any.
    fn mask(&self) -> Option<&MaskProcessor> {
        None
    }
}

// ─── Ordered list ─────────────────────────────────────────────────────────────

/// Drawable list kept sorted by ascending priority.
///
/// Insertion is stable: equal priorities keep their insertion order.
/// Membership is O(1).
#[derive(Debug, Clone, Default)]
pub struct OrderedDrawables {
    entries: Vec<(i32, DrawableId)>,
    members: FxHashSet<DrawableId>,
}

impl OrderedDrawables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `id` after every entry with a priority `<= priority`.
    /// Returns `false` when it was already present.
    pub fn insert(&mut self, id: DrawableId, priority: i32) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        let at = self.entries.partition_point(|(p, _)| *p <= priority);
        self.entries.insert(at, (priority, id));
        true
    }

    /// Returns `false` when `id` was not present.
    pub fn remove(&mut self, id: DrawableId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.entries.retain(|(_, e)| *e != id);
        true
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: DrawableId) -> bool {
        self.members.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = DrawableId> + '_ {
        self.entries.iter().map(|(_, id)| *id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.members.clear();
    }
}

/// Draws one drawable, routing it through its mask processor when it has one.
pub fn draw_item(renderer: &mut dyn Renderer, drawables: &DrawableStore, id: DrawableId) {
    let Some(drawable) = drawables.get(id) else {
        log::warn!("Drawable {:?} missing during pass execution", id);
        return;
    };

    match drawable.mask() {
        Some(mask) => mask.draw_masked(renderer, drawables, |r| drawable.draw(r)),
        None => drawable.draw(renderer),
    }
}

// ─── Mesh drawable ────────────────────────────────────────────────────────────

/// The standard drawable: one geometry with one material.
#[derive(Debug, Clone)]
pub struct MeshDrawable {
    pub name: String,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Mat4,
    pub tint: Vec4,
    pub priority: i32,
    /// Hidden items draw no color but still cover when used as a mask.
    pub visible: bool,
    mask: MaskProcessor,
}

impl MeshDrawable {
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Mat4::IDENTITY,
            tint: Vec4::ONE,
            priority: 0,
            visible: true,
            mask: MaskProcessor::new(),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Mask references gating this drawable.
    pub fn mask_mut(&mut self) -> &mut MaskProcessor {
        &mut self.mask
    }

    fn mesh_draw(&self) -> MeshDraw {
        MeshDraw {
            geometry: self.geometry,
            material: self.material,
            transform: self.transform,
            tint: self.tint,
        }
    }
}

impl Drawable for MeshDrawable {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn draw(&self, renderer: &mut dyn Renderer) {
        if self.visible {
            renderer.draw_mesh(&self.mesh_draw());
        }
    }

    fn draw_mask(&self, renderer: &mut dyn Renderer) {
        renderer.draw_mesh(&self.mesh_draw());
    }

    fn mask(&self) -> Option<&MaskProcessor> {
        if self.mask.is_empty() {
            None
        } else {
            Some(&self.mask)
        }
    }
}
