//! Global uniform table and camera.

use glam::{Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

/// A single uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

/// Frame-wide uniforms shared by every pass (time, resolution, camera).
#[derive(Debug, Clone, Default)]
pub struct GlobalUniforms {
    values: FxHashMap<String, UniformValue>,
}

impl GlobalUniforms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.values.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<UniformValue> {
        self.values.remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// View and projection of the active camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    /// Pixel-space orthographic camera with the origin at the top-left corner.
    #[must_use]
    pub fn orthographic(width: u32, height: u32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::orthographic_rh(0.0, width as f32, height as f32, 0.0, -1000.0, 1000.0),
        }
    }

    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Writes the camera matrices into the uniform table.
    pub fn write_uniforms(&self, uniforms: &mut GlobalUniforms) {
        uniforms.set("view", self.view);
        uniforms.set("projection", self.projection);
        uniforms.set("view_projection", self.view_projection());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_writes_matrices() {
        let mut uniforms = GlobalUniforms::new();
        let camera = Camera::orthographic(100, 50);
        camera.write_uniforms(&mut uniforms);
        assert_eq!(uniforms.len(), 3);
        assert_eq!(
            uniforms.get("view_projection"),
            Some(UniformValue::Mat4(camera.projection))
        );
    }

    #[test]
    fn set_overwrites() {
        let mut uniforms = GlobalUniforms::new();
        uniforms.set("time", 1.0_f32);
        uniforms.set("time", 2.0_f32);
        assert_eq!(uniforms.get("time"), Some(UniformValue::Float(2.0)));
    }
}
