//! Static mesh rendering: the thinnest possible producer wrapping a
//! vertex/index buffer pair, a program, and a pose, as one commit per
//! frame.
//!
//! Grounded on `src/lua/lua_render_world.cpp`'s `create_mesh`/
//! `set_mesh_visible`/`destroy_mesh` (`MeshRendererDesc` holding a mesh
//! resource, material resource, and visibility flag). Asset compilation
//! and resource-file loading are out of scope, so a "mesh" in this crate
//! is just the already-uploaded vertex/index buffers plus the program
//! to draw them with.

use crate::context::{IndexSource, VertexSource};
use crate::handle::{IndexBufferHandle, ProgramHandle, VertexBufferHandle};
use crate::math::{identity, Mat4};
use crate::renderer::Renderer;
use crate::state::RenderState;
use crate::vertex::VertexFormat;
use crate::backend::Backend;

/// One static mesh instance: geometry plus the program and pose it's
/// drawn with. `visible` mirrors the original's `MeshRendererDesc::visible`
/// flag — a hidden mesh instance is kept alive (handles stay live) but
/// `submit` skips recording a draw for it.
pub struct Mesh {
    pub vertex_buffer: VertexBufferHandle,
    pub vertex_format: VertexFormat,
    pub vertex_count: u32,
    pub index_buffer: Option<IndexBufferHandle>,
    pub index_count: u32,
    pub program: ProgramHandle,
    pub pose: Mat4,
    pub state: RenderState,
    pub visible: bool,
}

impl Mesh {
    pub fn new(vertex_buffer: VertexBufferHandle, vertex_format: VertexFormat, vertex_count: u32, program: ProgramHandle) -> Self {
        Mesh {
            vertex_buffer,
            vertex_format,
            vertex_count,
            index_buffer: None,
            index_count: 0,
            program,
            pose: identity(),
            state: RenderState::default(),
            visible: true,
        }
    }

    pub fn with_index_buffer(mut self, index_buffer: IndexBufferHandle, index_count: u32) -> Self {
        self.index_buffer = Some(index_buffer);
        self.index_count = index_count;
        self
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Records one draw for this mesh on `layer`, if visible. A no-op
    /// (not a hidden zero-size draw) when `visible` is false, matching
    /// the original's `set_mesh_visible` semantics of skipping the mesh
    /// entirely rather than drawing it transparently.
    pub fn submit<B: Backend + Send + 'static>(&self, renderer: &mut Renderer<B>, layer: u8) {
        if !self.visible {
            return;
        }
        renderer.set_state(self.state);
        renderer.set_pose(self.pose);
        renderer.set_program(self.program);
        renderer.set_vertex_buffer(VertexSource::Static(self.vertex_buffer), self.vertex_count);
        if let Some(ib) = self.index_buffer {
            renderer.set_index_buffer(IndexSource::Static(ib), 0, self.index_count);
        }
        renderer.commit(layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::config::RendererConfig;

    #[test]
    fn hidden_mesh_records_no_draw() {
        let mut renderer = Renderer::new(RendererConfig::default(), NullBackend::default(), false);
        renderer.init();
        let vb = renderer.create_vertex_buffer(&[0u8; 36], VertexFormat::P3);
        let program = {
            let vs = renderer.create_shader(crate::command::ShaderStage::Vertex, b"vs");
            let fs = renderer.create_shader(crate::command::ShaderStage::Fragment, b"fs");
            renderer.create_program(vs, fs)
        };
        let mut mesh = Mesh::new(vb, VertexFormat::P3, 3, program);
        mesh.set_visible(false);
        mesh.submit(&mut renderer, 0);
        renderer.commit(0);
        renderer.frame();
        renderer.shutdown();
    }
}
