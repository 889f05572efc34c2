//! 2D sprites: a textured quad built from an atlas frame each submit.
//!
//! Grounded on `src/lua/lua_render_world.cpp`'s `create_sprite`/
//! `destroy_sprite`/`set_sprite_visible`/`set_sprite_frame` and
//! `src/lua/lua_sprite.cpp`'s `set_frame`/`set_depth`. `set_depth` there
//! picks the sprite's draw-order bucket; this crate has no separate
//! depth concept inside a layer (only the layer itself sorts), so it's
//! mapped onto the layer a sprite submits on.

use crate::context::{TextureSource, VertexSource};
use crate::handle::{ProgramHandle, UniformHandle};
use crate::math::{identity, Mat4};
use crate::renderer::Renderer;
use crate::state::{RenderState, SamplerState};
use crate::vertex::VertexFormat;
use crate::backend::Backend;

/// A texture-atlas frame: a UV sub-rectangle, `(u0, v0, u1, v1)`.
#[derive(Debug, Copy, Clone)]
pub struct SpriteFrame {
    pub uv: [f32; 4],
}

/// A 2D sprite instance: one atlas texture, a list of frames, and the
/// quad's local-space half-size. `visible` and `depth` (the layer it
/// commits to) mirror `set_sprite_visible`/`set_depth`.
pub struct Sprite {
    pub texture: TextureSource,
    pub sampler_uniform: UniformHandle,
    pub sampler_state: SamplerState,
    pub program: ProgramHandle,
    pub frames: Vec<SpriteFrame>,
    pub frame: usize,
    pub half_size: [f32; 2],
    pub pose: Mat4,
    pub state: RenderState,
    pub visible: bool,
    pub depth: u8,
}

impl Sprite {
    pub fn new(
        texture: TextureSource,
        sampler_uniform: UniformHandle,
        program: ProgramHandle,
        frames: Vec<SpriteFrame>,
        half_size: [f32; 2],
    ) -> Self {
        Sprite {
            texture,
            sampler_uniform,
            sampler_state: SamplerState::default(),
            program,
            frames,
            frame: 0,
            half_size,
            pose: identity(),
            state: RenderState::default(),
            visible: true,
            depth: 0,
        }
    }

    pub fn set_frame(&mut self, frame: usize) {
        assert!(frame < self.frames.len(), "sprite frame {} out of range ({} frames)", frame, self.frames.len());
        self.frame = frame;
    }

    pub fn set_depth(&mut self, depth: u8) {
        self.depth = depth;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Builds a two-triangle quad for the current frame in a transient
    /// vertex buffer (`P3T2`) and records one draw on `self.depth`.
    pub fn submit<B: Backend + Send + 'static>(&self, renderer: &mut Renderer<B>) {
        if !self.visible {
            return;
        }
        let uv = self.frames[self.frame].uv;
        let (hx, hy) = (self.half_size[0], self.half_size[1]);

        #[rustfmt::skip]
        let quad: [[f32; 5]; 6] = [
            [-hx, -hy, 0.0, uv[0], uv[3]],
            [ hx, -hy, 0.0, uv[2], uv[3]],
            [ hx,  hy, 0.0, uv[2], uv[1]],
            [-hx, -hy, 0.0, uv[0], uv[3]],
            [ hx,  hy, 0.0, uv[2], uv[1]],
            [-hx,  hy, 0.0, uv[0], uv[1]],
        ];
        let mut bytes = Vec::with_capacity(quad.len() * 20);
        for vertex in &quad {
            for component in vertex {
                bytes.extend_from_slice(&component.to_le_bytes());
            }
        }

        let source = renderer.reserve_transient_vertex_buffer(6, VertexFormat::P3T2);
        let reservation = match source {
            VertexSource::Transient(r) => r,
            VertexSource::Static(_) => unreachable!("reserve_transient_vertex_buffer always returns Transient"),
        };
        renderer.update_vertex_buffer(reservation.buffer, reservation.byte_offset, &bytes);

        renderer.set_state(self.state);
        renderer.set_pose(self.pose);
        renderer.set_program(self.program);
        renderer.set_texture(0, self.sampler_uniform, self.texture, self.sampler_state);
        renderer.set_vertex_buffer(VertexSource::Transient(reservation), 6);
        renderer.commit(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::config::RendererConfig;
    use crate::handle::UniformHandle;

    #[test]
    fn frame_out_of_range_panics() {
        let frames = vec![SpriteFrame { uv: [0.0, 0.0, 1.0, 1.0] }];
        let mut sprite = Sprite::new(
            TextureSource::Texture(crate::handle::TextureHandle::invalid()),
            UniformHandle::invalid(),
            ProgramHandle::invalid(),
            frames,
            [0.5, 0.5],
        );
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sprite.set_frame(5)));
        assert!(result.is_err());
    }

    #[test]
    fn hidden_sprite_records_no_draw() {
        let mut renderer = Renderer::new(RendererConfig::default(), NullBackend::default(), false);
        renderer.init();
        let texture = renderer.create_texture(4, 4, crate::pixel::PixelFormat::R8G8B8A8, None);
        let sampler_uniform = renderer.create_uniform("u_atlas", crate::uniform::UniformType::Integer1, 1);
        let vs = renderer.create_shader(crate::command::ShaderStage::Vertex, b"vs");
        let fs = renderer.create_shader(crate::command::ShaderStage::Fragment, b"fs");
        let program = renderer.create_program(vs, fs);
        let frames = vec![SpriteFrame { uv: [0.0, 0.0, 1.0, 1.0] }];
        let mut sprite = Sprite::new(TextureSource::Texture(texture), sampler_uniform, program, frames, [0.5, 0.5]);
        sprite.set_visible(false);
        sprite.submit(&mut renderer);
        renderer.commit(0);
        renderer.frame();
        renderer.shutdown();
    }
}
