//! Lights: directional/omni/spot parameters mirrored into uniforms a
//! shader can read, submitted once per frame like any other uniform
//! write.
//!
//! Grounded on `src/lua/lua_render_world.cpp`'s light bindings
//! (`create_light`/`destroy_light`/`light_type`/`set_light_type`/
//! `light_color`/`set_light_color`/`light_range`/`set_light_range`/
//! `light_intensity`/`set_light_intensity`/`light_spot_angle`/
//! `set_light_spot_angle`) and the `LightDesc` defaults it constructs
//! (`type = DIRECTIONAL`, `range = 1.0`, `intensity = 1.0`,
//! `spot_angle = 20.0`, `color = (1,1,1)`). This crate has no shading
//! pipeline of its own (that's a backend concern), so a `Light`
//! here is just parameters plus the four uniform handles a shader would
//! bind them through.

use crate::handle::UniformHandle;
use crate::renderer::Renderer;
use crate::uniform::UniformType;
use crate::backend::Backend;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LightType {
    Directional,
    Omni,
    Spot,
}

/// One light's parameters and the uniforms they're mirrored into.
/// `position`/`direction` are supplied by the caller each frame (this
/// crate has no scene graph to derive them from a unit transform, unlike
/// the original's `RenderWorld`).
pub struct Light {
    light_type: LightType,
    color: [f32; 3],
    range: f32,
    intensity: f32,
    spot_angle: f32,
    position: [f32; 3],
    direction: [f32; 3],
    uniform_color: UniformHandle,
    uniform_position: UniformHandle,
    uniform_direction: UniformHandle,
    uniform_params: UniformHandle,
}

impl Light {
    /// Registers the four backing uniforms under `name_prefix` and
    /// returns a light with the original's `LightDesc` defaults.
    pub fn new<B: Backend + Send + 'static>(renderer: &mut Renderer<B>, name_prefix: &str) -> Self {
        let uniform_color = renderer.create_uniform(&format!("{}_color", name_prefix), UniformType::Float3, 1);
        let uniform_position = renderer.create_uniform(&format!("{}_position", name_prefix), UniformType::Float3, 1);
        let uniform_direction = renderer.create_uniform(&format!("{}_direction", name_prefix), UniformType::Float3, 1);
        let uniform_params = renderer.create_uniform(&format!("{}_params", name_prefix), UniformType::Float4, 1);
        Light {
            light_type: LightType::Directional,
            color: [1.0, 1.0, 1.0],
            range: 1.0,
            intensity: 1.0,
            spot_angle: 20.0,
            position: [0.0, 0.0, 0.0],
            direction: [0.0, -1.0, 0.0],
            uniform_color,
            uniform_position,
            uniform_direction,
            uniform_params,
        }
    }

    pub fn light_type(&self) -> LightType {
        self.light_type
    }

    pub fn set_light_type(&mut self, light_type: LightType) {
        self.light_type = light_type;
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn set_color(&mut self, color: [f32; 3]) {
        self.color = color;
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn set_range(&mut self, range: f32) {
        self.range = range;
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    pub fn spot_angle(&self) -> f32 {
        self.spot_angle
    }

    pub fn set_spot_angle(&mut self, spot_angle: f32) {
        self.spot_angle = spot_angle;
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    pub fn set_direction(&mut self, direction: [f32; 3]) {
        self.direction = direction;
    }

    /// Writes this light's current parameters into its backing uniforms.
    /// `type` is packed as the params uniform's 4th component
    /// (0=directional, 1=omni, 2=spot) since there is no integer uniform
    /// type in this core's closed set.
    pub fn submit<B: Backend + Send + 'static>(&self, renderer: &mut Renderer<B>) {
        renderer.set_uniform(self.uniform_color, UniformType::Float3, &f32_bytes(&self.color));
        renderer.set_uniform(self.uniform_position, UniformType::Float3, &f32_bytes(&self.position));
        renderer.set_uniform(self.uniform_direction, UniformType::Float3, &f32_bytes(&self.direction));
        let type_tag = match self.light_type {
            LightType::Directional => 0.0,
            LightType::Omni => 1.0,
            LightType::Spot => 2.0,
        };
        renderer.set_uniform(
            self.uniform_params,
            UniformType::Float4,
            &f32_bytes(&[self.range, self.intensity, self.spot_angle, type_tag]),
        );
    }

    /// Destroys the backing uniforms, mirroring `destroy_light`.
    pub fn destroy<B: Backend + Send + 'static>(self, renderer: &mut Renderer<B>) {
        renderer.destroy_uniform(self.uniform_color);
        renderer.destroy_uniform(self.uniform_position);
        renderer.destroy_uniform(self.uniform_direction);
        renderer.destroy_uniform(self.uniform_params);
    }
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::config::RendererConfig;

    #[test]
    fn defaults_match_the_original_light_desc() {
        let mut renderer = Renderer::new(RendererConfig::default(), NullBackend::default(), false);
        renderer.init();
        let light = Light::new(&mut renderer, "sun");
        assert_eq!(light.light_type(), LightType::Directional);
        assert_eq!(light.range(), 1.0);
        assert_eq!(light.intensity(), 1.0);
        assert_eq!(light.spot_angle(), 20.0);
        assert_eq!(light.color(), [1.0, 1.0, 1.0]);
        light.destroy(&mut renderer);
        renderer.commit(0);
        renderer.frame();
        renderer.shutdown();
    }

    #[test]
    fn setters_roundtrip() {
        let mut renderer = Renderer::new(RendererConfig::default(), NullBackend::default(), false);
        renderer.init();
        let mut light = Light::new(&mut renderer, "point");
        light.set_light_type(LightType::Spot);
        light.set_spot_angle(45.0);
        light.set_color([1.0, 0.5, 0.2]);
        assert_eq!(light.light_type(), LightType::Spot);
        assert_eq!(light.spot_angle(), 45.0);
        light.submit(&mut renderer);
        light.destroy(&mut renderer);
        renderer.commit(0);
        renderer.frame();
        renderer.shutdown();
    }
}
