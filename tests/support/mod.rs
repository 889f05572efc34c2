//! A backend that records every call it receives, for scenario tests
//! that assert on the trace a frame produces. A recording implementation
//! of `Backend` narrow enough to drive from a plain `#[test]` function,
//! with no real GPU context behind it.

use render_core::backend::Backend;
use render_core::context::{DrawState, LayerState};
use render_core::error::BackendResult;
use render_core::handle::{
    IndexBufferHandle, ProgramHandle, RenderTargetHandle, ShaderHandle, TextureHandle, UniformHandle,
    VertexBufferHandle,
};
use render_core::pixel::PixelFormat;
use render_core::uniform::UniformType;
use render_core::vertex::VertexFormat;
use render_core::command::ShaderStage;

#[derive(Debug, Clone)]
pub enum MockCall {
    Init,
    Shutdown,
    CreateVertexBuffer(VertexBufferHandle),
    CreateDynamicVertexBuffer(VertexBufferHandle),
    UpdateVertexBuffer(VertexBufferHandle),
    DestroyVertexBuffer(VertexBufferHandle),
    CreateIndexBuffer(IndexBufferHandle),
    CreateDynamicIndexBuffer(IndexBufferHandle),
    UpdateIndexBuffer(IndexBufferHandle),
    DestroyIndexBuffer(IndexBufferHandle),
    CreateTexture(TextureHandle),
    UpdateTexture(TextureHandle),
    DestroyTexture(TextureHandle),
    CreateShader(ShaderHandle),
    DestroyShader(ShaderHandle),
    CreateProgram(ProgramHandle),
    DestroyProgram(ProgramHandle),
    CreateUniform(UniformHandle, String, UniformType, u32),
    DestroyUniform(UniformHandle),
    UpdateUniform(UniformHandle, Vec<u8>),
    CreateRenderTarget(RenderTargetHandle),
    DestroyRenderTarget(RenderTargetHandle),
    /// One entry per `render_frame` call: the number of touched layers
    /// and the draws dispatched, each paired with its layer index.
    RenderFrame { touched_layers: usize, draws: Vec<(DrawState, u8)> },
}

#[derive(Default)]
pub struct MockBackend {
    pub calls: Vec<MockCall>,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend::default()
    }

    /// The draws and touched-layer count of the most recent
    /// `render_frame` call, or panics if none was recorded.
    pub fn last_render_frame(&self) -> (usize, Vec<(DrawState, u8)>) {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                MockCall::RenderFrame { touched_layers, draws } => Some((*touched_layers, draws.clone())),
                _ => None,
            })
            .expect("no render_frame call recorded")
    }

    pub fn uniform_updates(&self, handle: UniformHandle) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MockCall::UpdateUniform(h, data) if *h == handle => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Backend for MockBackend {
    fn init(&mut self) -> BackendResult<()> {
        self.calls.push(MockCall::Init);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.calls.push(MockCall::Shutdown);
    }

    fn render_frame(&mut self, layers: &[LayerState], draws: &[(DrawState, u8)]) {
        let touched_layers = layers.iter().filter(|l| l.touched).count();
        self.calls.push(MockCall::RenderFrame { touched_layers, draws: draws.to_vec() });
    }

    fn create_vertex_buffer(&mut self, handle: VertexBufferHandle, _data: Option<&[u8]>, _format: VertexFormat) -> BackendResult<()> {
        self.calls.push(MockCall::CreateVertexBuffer(handle));
        Ok(())
    }
    fn create_dynamic_vertex_buffer(&mut self, handle: VertexBufferHandle, _size: u32, _format: VertexFormat) -> BackendResult<()> {
        self.calls.push(MockCall::CreateDynamicVertexBuffer(handle));
        Ok(())
    }
    fn update_vertex_buffer(&mut self, handle: VertexBufferHandle, _offset: u32, _data: &[u8]) {
        self.calls.push(MockCall::UpdateVertexBuffer(handle));
    }
    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        self.calls.push(MockCall::DestroyVertexBuffer(handle));
    }

    fn create_index_buffer(&mut self, handle: IndexBufferHandle, _data: Option<&[u8]>) -> BackendResult<()> {
        self.calls.push(MockCall::CreateIndexBuffer(handle));
        Ok(())
    }
    fn create_dynamic_index_buffer(&mut self, handle: IndexBufferHandle, _size: u32) -> BackendResult<()> {
        self.calls.push(MockCall::CreateDynamicIndexBuffer(handle));
        Ok(())
    }
    fn update_index_buffer(&mut self, handle: IndexBufferHandle, _offset: u32, _data: &[u8]) {
        self.calls.push(MockCall::UpdateIndexBuffer(handle));
    }
    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        self.calls.push(MockCall::DestroyIndexBuffer(handle));
    }

    fn create_texture(&mut self, handle: TextureHandle, _width: u32, _height: u32, _format: PixelFormat, _data: Option<&[u8]>) -> BackendResult<()> {
        self.calls.push(MockCall::CreateTexture(handle));
        Ok(())
    }
    fn update_texture(&mut self, handle: TextureHandle, _data: &[u8]) {
        self.calls.push(MockCall::UpdateTexture(handle));
    }
    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.calls.push(MockCall::DestroyTexture(handle));
    }

    fn create_shader(&mut self, handle: ShaderHandle, _stage: ShaderStage, _source: &[u8]) -> BackendResult<()> {
        self.calls.push(MockCall::CreateShader(handle));
        Ok(())
    }
    fn destroy_shader(&mut self, handle: ShaderHandle) {
        self.calls.push(MockCall::DestroyShader(handle));
    }

    fn create_program(&mut self, handle: ProgramHandle, _vertex_shader: ShaderHandle, _fragment_shader: ShaderHandle) -> BackendResult<()> {
        self.calls.push(MockCall::CreateProgram(handle));
        Ok(())
    }
    fn destroy_program(&mut self, handle: ProgramHandle) {
        self.calls.push(MockCall::DestroyProgram(handle));
    }

    fn create_uniform(&mut self, handle: UniformHandle, name: &str, ty: UniformType, count: u32) -> BackendResult<()> {
        self.calls.push(MockCall::CreateUniform(handle, name.to_string(), ty, count));
        Ok(())
    }
    fn destroy_uniform(&mut self, handle: UniformHandle) {
        self.calls.push(MockCall::DestroyUniform(handle));
    }
    fn update_uniform(&mut self, handle: UniformHandle, data: &[u8]) {
        self.calls.push(MockCall::UpdateUniform(handle, data.to_vec()));
    }

    fn create_render_target(&mut self, handle: RenderTargetHandle, _width: u32, _height: u32, _format: PixelFormat) -> BackendResult<()> {
        self.calls.push(MockCall::CreateRenderTarget(handle));
        Ok(())
    }
    fn destroy_render_target(&mut self, handle: RenderTargetHandle) {
        self.calls.push(MockCall::DestroyRenderTarget(handle));
    }
}
