//! User Full-Screen Filter Pass
//!
//! Samples the logical scene color and writes a new version of it. The frame
//! assigns `color_a` / `color_b` so input and output are never the same image.
//!
//! Extra sampled textures (lookup tables, noise) are shared through the
//! [`PassTextureCache`]: requested on the first configure, released when the
//! pass is removed from the frame.

use smallvec::SmallVec;

use crate::errors::{FxError, Result};
use crate::renderer::core::{
    FullscreenDraw, FullscreenShader, Renderer, TextureDescriptor, TextureId, UniformValue,
};
use crate::renderer::graph::context::{ExecuteContext, PassContext};
use crate::renderer::graph::pass::{ColorIo, PassNode, PassState};
use crate::renderer::graph::passes::{bind_scene_color_output, scene_color_input};
use crate::renderer::graph::texture_cache::{PassTextureCache, SampledTexture};

/// Tagged configuration of a filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Shader name, resolved by the backend.
    pub shader: String,
    pub params: Vec<(&'static str, UniformValue)>,
    /// Sampled textures, by binding name.
    pub textures: Vec<(&'static str, TextureDescriptor)>,
}

impl FilterConfig {
    #[must_use]
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            params: Vec::new(),
            textures: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: &'static str, value: impl Into<UniformValue>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    #[must_use]
    pub fn with_texture(mut self, binding: &'static str, desc: TextureDescriptor) -> Self {
        self.textures.push((binding, desc));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.shader.trim().is_empty() {
            return Err(FxError::InvalidSettings("filter shader name is empty".into()));
        }
        Ok(())
    }
}

pub struct FilterPass {
    shader: FullscreenShader,
    params: Vec<(&'static str, UniformValue)>,
    pending: Vec<(&'static str, TextureDescriptor)>,
    textures: Vec<(&'static str, SampledTexture)>,
}

impl FilterPass {
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shader: FullscreenShader::Custom(config.shader),
            params: config.params,
            pending: config.textures,
            textures: Vec::new(),
        })
    }

    /// Sampled textures currently held by this pass.
    pub fn textures(&self) -> impl Iterator<Item = &SampledTexture> {
        self.textures.iter().map(|(_, texture)| texture)
    }
}

impl PassNode for FilterPass {
    fn kind(&self) -> &'static str {
        "filter"
    }

    fn color_io(&self) -> ColorIo {
        ColorIo::ReadWrite
    }

    fn configure(&mut self, pass: &mut PassState, ctx: &mut PassContext) -> Result<()> {
        while let Some((binding, desc)) = self.pending.first() {
            let texture = ctx.texture_cache.request(&mut *ctx.renderer, desc)?;
            self.textures.push((*binding, texture));
            self.pending.remove(0);
        }
        bind_scene_color_output(pass, ctx);
        Ok(())
    }

    fn execute(&self, pass: &PassState, ctx: &mut ExecuteContext) {
        let Some(scene) = scene_color_input(pass, ctx) else {
            return;
        };
        let textures: SmallVec<[(&'static str, TextureId); 4]> = self
            .textures
            .iter()
            .map(|(binding, texture)| (*binding, texture.id()))
            .collect();
        ctx.renderer.draw_fullscreen(&FullscreenDraw {
            shader: &self.shader,
            inputs: &[("scene", scene)],
            textures: &textures,
            params: &self.params,
        });
    }

    fn dispose(&mut self, renderer: &mut dyn Renderer, texture_cache: &mut PassTextureCache) {
        for (_, texture) in self.textures.drain(..) {
            texture.dispose(renderer, texture_cache);
        }
    }
}
