//! The backend interface: the small set of operations a concrete
//! graphics backend (OpenGL/DirectX/Vulkan) must implement.
//!
//! Deliberately narrow: no arena/swapchain/descriptor-set machinery,
//! just resource create/update/destroy per class plus one `render_frame`
//! entry point for the sorted draw list. All calls occur on the render
//! thread; implementations may assume single-threaded access.

use crate::command::ShaderStage;
use crate::context::{DrawState, LayerState};
use crate::error::BackendResult;
use crate::handle::{
    IndexBufferHandle, ProgramHandle, RenderTargetHandle, ShaderHandle, TextureHandle, UniformHandle,
    VertexBufferHandle,
};
use crate::pixel::PixelFormat;
use crate::uniform::UniformType;
use crate::vertex::VertexFormat;

pub trait Backend {
    fn init(&mut self) -> BackendResult<()>;
    fn shutdown(&mut self);

    /// Issues one frame's sorted draws and per-layer setup. Called once
    /// per frame by the render thread loop, after commands and uniforms
    /// have been applied.
    fn render_frame(&mut self, layers: &[LayerState], draws: &[(DrawState, u8)]);

    fn create_vertex_buffer(&mut self, handle: VertexBufferHandle, data: Option<&[u8]>, format: VertexFormat) -> BackendResult<()>;
    fn create_dynamic_vertex_buffer(&mut self, handle: VertexBufferHandle, size: u32, format: VertexFormat) -> BackendResult<()>;
    fn update_vertex_buffer(&mut self, handle: VertexBufferHandle, offset: u32, data: &[u8]);
    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle);

    fn create_index_buffer(&mut self, handle: IndexBufferHandle, data: Option<&[u8]>) -> BackendResult<()>;
    fn create_dynamic_index_buffer(&mut self, handle: IndexBufferHandle, size: u32) -> BackendResult<()>;
    fn update_index_buffer(&mut self, handle: IndexBufferHandle, offset: u32, data: &[u8]);
    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle);

    fn create_texture(&mut self, handle: TextureHandle, width: u32, height: u32, format: PixelFormat, data: Option<&[u8]>) -> BackendResult<()>;
    fn update_texture(&mut self, handle: TextureHandle, data: &[u8]);
    fn destroy_texture(&mut self, handle: TextureHandle);

    fn create_shader(&mut self, handle: ShaderHandle, stage: ShaderStage, source: &[u8]) -> BackendResult<()>;
    fn destroy_shader(&mut self, handle: ShaderHandle);

    fn create_program(&mut self, handle: ProgramHandle, vertex_shader: ShaderHandle, fragment_shader: ShaderHandle) -> BackendResult<()>;
    fn destroy_program(&mut self, handle: ProgramHandle);

    fn create_uniform(&mut self, handle: UniformHandle, name: &str, ty: UniformType, count: u32) -> BackendResult<()>;
    fn destroy_uniform(&mut self, handle: UniformHandle);
    fn update_uniform(&mut self, handle: UniformHandle, data: &[u8]);

    fn create_render_target(&mut self, handle: RenderTargetHandle, width: u32, height: u32, format: PixelFormat) -> BackendResult<()>;
    fn destroy_render_target(&mut self, handle: RenderTargetHandle);
}

/// A backend that does nothing, for headless use or as a base to copy
/// from when writing a real one.
#[derive(Default)]
pub struct NullBackend;

impl Backend for NullBackend {
    fn init(&mut self) -> BackendResult<()> {
        Ok(())
    }
    fn shutdown(&mut self) {}
    fn render_frame(&mut self, _layers: &[LayerState], _draws: &[(DrawState, u8)]) {}

    fn create_vertex_buffer(&mut self, _handle: VertexBufferHandle, _data: Option<&[u8]>, _format: VertexFormat) -> BackendResult<()> {
        Ok(())
    }
    fn create_dynamic_vertex_buffer(&mut self, _handle: VertexBufferHandle, _size: u32, _format: VertexFormat) -> BackendResult<()> {
        Ok(())
    }
    fn update_vertex_buffer(&mut self, _handle: VertexBufferHandle, _offset: u32, _data: &[u8]) {}
    fn destroy_vertex_buffer(&mut self, _handle: VertexBufferHandle) {}

    fn create_index_buffer(&mut self, _handle: IndexBufferHandle, _data: Option<&[u8]>) -> BackendResult<()> {
        Ok(())
    }
    fn create_dynamic_index_buffer(&mut self, _handle: IndexBufferHandle, _size: u32) -> BackendResult<()> {
        Ok(())
    }
    fn update_index_buffer(&mut self, _handle: IndexBufferHandle, _offset: u32, _data: &[u8]) {}
    fn destroy_index_buffer(&mut self, _handle: IndexBufferHandle) {}

    fn create_texture(&mut self, _handle: TextureHandle, _width: u32, _height: u32, _format: PixelFormat, _data: Option<&[u8]>) -> BackendResult<()> {
        Ok(())
    }
    fn update_texture(&mut self, _handle: TextureHandle, _data: &[u8]) {}
    fn destroy_texture(&mut self, _handle: TextureHandle) {}

    fn create_shader(&mut self, _handle: ShaderHandle, _stage: ShaderStage, _source: &[u8]) -> BackendResult<()> {
        Ok(())
    }
    fn destroy_shader(&mut self, _handle: ShaderHandle) {}

    fn create_program(&mut self, _handle: ProgramHandle, _vertex_shader: ShaderHandle, _fragment_shader: ShaderHandle) -> BackendResult<()> {
        Ok(())
    }
    fn destroy_program(&mut self, _handle: ProgramHandle) {}

    fn create_uniform(&mut self, _handle: UniformHandle, _name: &str, _ty: UniformType, _count: u32) -> BackendResult<()> {
        Ok(())
    }
    fn destroy_uniform(&mut self, _handle: UniformHandle) {}
    fn update_uniform(&mut self, _handle: UniformHandle, _data: &[u8]) {}

    fn create_render_target(&mut self, _handle: RenderTargetHandle, _width: u32, _height: u32, _format: PixelFormat) -> BackendResult<()> {
        Ok(())
    }
    fn destroy_render_target(&mut self, _handle: RenderTargetHandle) {}
}
