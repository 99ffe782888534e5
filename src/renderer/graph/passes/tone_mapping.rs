use crate::errors::Result;
use crate::renderer::core::{FullscreenDraw, FullscreenShader, UniformValue};
use crate::renderer::graph::context::{ExecuteContext, PassContext, PassSlot};
use crate::renderer::graph::pass::{ColorIo, PassNode, PassState};
use crate::renderer::graph::passes::scene_color_input;
use crate::renderer::settings::ToneMapConfig;

/// Composites the scene color with the bloom result, applies exposure,
/// saturation, contrast and vignette, and writes the backbuffer.
pub struct ToneMapPass {
    config: ToneMapConfig,
    bloom: PassSlot,
    shader: FullscreenShader,
}

impl ToneMapPass {
    #[must_use]
    pub fn new(config: ToneMapConfig, bloom: PassSlot) -> Self {
        Self {
            config,
            bloom,
            shader: FullscreenShader::ToneMap,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ToneMapConfig {
        &self.config
    }

    fn params(&self) -> [(&'static str, UniformValue); 6] {
        let (intensity, smoothness) = self
            .config
            .vignette
            .map_or((0.0, 0.0), |v| (v.intensity, v.smoothness));
        [
            ("exposure", UniformValue::Float(self.config.exposure)),
            ("saturation", UniformValue::Float(self.config.saturation)),
            ("contrast", UniformValue::Float(self.config.contrast)),
            ("bloom_intensity", UniformValue::Float(self.config.bloom_intensity)),
            ("vignette_intensity", UniformValue::Float(intensity)),
            ("vignette_smoothness", UniformValue::Float(smoothness)),
        ]
    }
}

impl PassNode for ToneMapPass {
    fn kind(&self) -> &'static str {
        "tone_map"
    }

    fn color_io(&self) -> ColorIo {
        ColorIo::Read
    }

    fn configure(&mut self, pass: &mut PassState, _ctx: &mut PassContext) -> Result<()> {
        pass.bind(None);
        Ok(())
    }

    fn execute(&self, pass: &PassState, ctx: &mut ExecuteContext) {
        let (Some(scene), Some(bloom)) = (scene_color_input(pass, ctx), ctx.input(self.bloom)) else {
            return;
        };
        let params = self.params();
        ctx.renderer.draw_fullscreen(&FullscreenDraw {
            shader: &self.shader,
            inputs: &[("scene", scene), ("bloom", bloom)],
            textures: &[],
            params: &params,
        });
    }
}
