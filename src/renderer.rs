//! The frame protocol and render thread loop, and the producer-facing
//! API that sits on top of them.
//!
//! Grounded on `engine/renderers/Renderer.h`: `init()`/`shutdown()`
//! writing tags and flushing a frame, per-resource `create_*`/`update_*`
//! /`destroy_*` methods that both mint/free a handle and enqueue a
//! command, `execute_commands`/`update_uniforms`/`render_all`, and the
//! `render_thread()` loop. The two-semaphore rendezvous
//! (`m_render_wait`/`m_main_wait`) is re-architected per the Design
//! Notes as a zero-capacity `std::sync::mpsc` channel pair: sending the
//! just-filled context blocks until the render thread is ready to
//! receive it (mirroring `render_wait.post()`/`.wait()`), and the
//! render thread hands the drained context back over a second channel,
//! which the main thread's `frame()` blocks on (mirroring
//! `main_wait.post()`/`.wait()`). Only one `RenderContext` value is ever
//! in flight, ping-ponging by ownership transfer; since the two
//! threads never hold it at the same time, this is observably identical
//! to the original's pointer-swap of two coexisting contexts.

use crate::backend::Backend;
use crate::command::{Command, ShaderStage};
use crate::config::RendererConfig;
use crate::constant::ConstantBuffer;
use crate::context::{IndexSource, LayerState, RenderContext, TextureSource, VertexSource};
use crate::error::fatal_name_collision;
use crate::handle::{
    HandleTable, IndexBufferHandle, ProgramHandle, RenderTargetHandle, ShaderHandle, TextureHandle,
    UniformHandle, VertexBufferHandle,
};
use crate::math::Mat4;
use crate::pixel::PixelFormat;
use crate::state::{RenderState, SamplerState};
use crate::uniform::{name_to_stock_uniform, StockUniform, UniformType, MAX_UNIFORM_NAME_LENGTH};
use crate::vertex::VertexFormat;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::JoinHandle;
use std::time::Instant;

/// Handles for the five stock uniforms, minted once at `init()` and
/// registered with the backend under their well-known names. A real
/// backend recognizes these handles (by the name it was given in the
/// matching `create_uniform` call) and binds them per draw from the pose
/// and layer view/projection matrices already carried in
/// [`crate::context::DrawState`]/[`crate::context::LayerState`] — the
/// core's job is only to reserve and register them, not to re-derive
/// per-draw GPU state that the backend already receives wholesale via
/// `Backend::render_frame`. `TIME_SINCE_START` is the exception: it has
/// no per-draw source, so the core itself refreshes it once a frame (see
/// `Renderer::frame`).
#[derive(Debug, Copy, Clone)]
pub struct StockUniformHandles {
    pub view: UniformHandle,
    pub model: UniformHandle,
    pub model_view: UniformHandle,
    pub model_view_projection: UniformHandle,
    pub time_since_start: UniformHandle,
}

impl StockUniformHandles {
    pub fn get(&self, which: StockUniform) -> UniformHandle {
        match which {
            StockUniform::View => self.view,
            StockUniform::Model => self.model,
            StockUniform::ModelView => self.model_view,
            StockUniform::ModelViewProjection => self.model_view_projection,
            StockUniform::TimeSinceStart => self.time_since_start,
        }
    }
}

/// Reads tags from `commands` until the end-of-frame tag, invoking the
/// matching backend method for each. Unknown tags are fatal inside
/// `CommandBuffer::read_command` itself.
fn execute_commands(commands: &mut crate::command::CommandBuffer, backend: &mut dyn Backend) {
    let mut count = 0u32;
    while let Some(command) = commands.read_command() {
        count += 1;
        match command {
            Command::Init => backend.init().expect("backend init failed"),
            Command::Shutdown => backend.shutdown(),
            Command::CreateVertexBuffer { handle, format, data } => {
                backend
                    .create_vertex_buffer(handle, data.as_deref(), format)
                    .expect("backend failed to create vertex buffer");
            }
            Command::CreateDynamicVertexBuffer { handle, size, format } => {
                backend
                    .create_dynamic_vertex_buffer(handle, size, format)
                    .expect("backend failed to create dynamic vertex buffer");
            }
            Command::UpdateVertexBuffer { handle, offset, data } => backend.update_vertex_buffer(handle, offset, &data),
            Command::DestroyVertexBuffer { handle } => backend.destroy_vertex_buffer(handle),
            Command::CreateIndexBuffer { handle, data } => {
                backend.create_index_buffer(handle, data.as_deref()).expect("backend failed to create index buffer");
            }
            Command::CreateDynamicIndexBuffer { handle, size } => {
                backend
                    .create_dynamic_index_buffer(handle, size)
                    .expect("backend failed to create dynamic index buffer");
            }
            Command::UpdateIndexBuffer { handle, offset, data } => backend.update_index_buffer(handle, offset, &data),
            Command::DestroyIndexBuffer { handle } => backend.destroy_index_buffer(handle),
            Command::CreateTexture { handle, width, height, format, data } => {
                backend
                    .create_texture(handle, width, height, format, data.as_deref())
                    .expect("backend failed to create texture");
            }
            Command::UpdateTexture { handle, data } => backend.update_texture(handle, &data),
            Command::DestroyTexture { handle } => backend.destroy_texture(handle),
            Command::CreateShader { handle, stage, source } => {
                backend.create_shader(handle, stage, &source).expect("backend failed to create shader");
            }
            Command::DestroyShader { handle } => backend.destroy_shader(handle),
            Command::CreateProgram { handle, vertex_shader, fragment_shader } => {
                backend
                    .create_program(handle, vertex_shader, fragment_shader)
                    .expect("backend failed to create program");
            }
            Command::DestroyProgram { handle } => backend.destroy_program(handle),
            Command::CreateUniform { handle, name, ty, count } => {
                backend.create_uniform(handle, &name, ty, count).expect("backend failed to create uniform");
            }
            Command::DestroyUniform { handle } => backend.destroy_uniform(handle),
            Command::CreateRenderTarget { handle, width, height, format } => {
                backend
                    .create_render_target(handle, width, height, format)
                    .expect("backend failed to create render target");
            }
            Command::DestroyRenderTarget { handle } => backend.destroy_render_target(handle),
        }
    }
    log::trace!("executed {} commands", count);
}

/// Reads (type, id, size, bytes) tuples until the end tag and invokes
/// `update_uniform` on the backend for each. Must be called exactly
/// once per frame, before `clear()` — `ConstantBuffer::drain` consumes
/// the buffer as it reads, so a second call in the same frame sees an
/// empty stream rather than replaying stale data.
fn update_uniforms(constants: &mut ConstantBuffer, backend: &mut dyn Backend) {
    for write in constants.drain() {
        backend.update_uniform(write.handle, &write.bytes);
    }
}

/// Sorts draws by key and issues one frame's backend calls: layer setup
/// for every touched layer, then draws in sorted order.
fn render(ctx: &mut RenderContext, backend: &mut dyn Backend) {
    ctx.sort();
    let layers: Vec<LayerState> = ctx.layers().to_vec();
    let draws_with_layer: Vec<_> = ctx.draws().iter().cloned().zip(ctx.keys().iter().map(|k| k.layer())).collect();
    log::debug!("rendering {} draws across {} layers", draws_with_layer.len(), layers.iter().filter(|l| l.touched).count());
    backend.render_frame(&layers, &draws_with_layer);
}

/// The full per-frame sequence a drained context goes through on the
/// render thread: drain commands, replay uniforms, sort and dispatch
/// draws, then reset the context for its next turn as submit context.
fn process_frame(ctx: &mut RenderContext, backend: &mut dyn Backend) {
    execute_commands(&mut ctx.commands, backend);
    update_uniforms(&mut ctx.constants, backend);
    render(ctx, backend);
    ctx.clear();
}

enum FrameExecutor<B> {
    Threaded { submit_tx: Option<SyncSender<RenderContext>>, reply_rx: Receiver<RenderContext>, join_handle: Option<JoinHandle<()>> },
    SingleThreaded { backend: B },
}

/// Owns the handle tables, the (single, ping-ponging) render context,
/// and the frame-protocol executor. This is the one entry point
/// producers call into.
pub struct Renderer<B: Backend + Send + 'static> {
    vertex_buffers: HandleTable<crate::handle::VertexBufferClass>,
    index_buffers: HandleTable<crate::handle::IndexBufferClass>,
    textures: HandleTable<crate::handle::TextureClass>,
    shaders: HandleTable<crate::handle::ShaderClass>,
    programs: HandleTable<crate::handle::ProgramClass>,
    uniforms: HandleTable<crate::handle::UniformClass>,
    render_targets: HandleTable<crate::handle::RenderTargetClass>,

    transient_vertex_buffer: VertexBufferHandle,
    transient_index_buffer: IndexBufferHandle,
    transient_vertex_buffer_size: u32,
    transient_index_buffer_size: u32,

    stock_uniforms: StockUniformHandles,
    start_instant: Instant,

    submit: Option<RenderContext>,
    executor: FrameExecutor<B>,
}

impl<B: Backend + Send + 'static> Renderer<B> {
    /// Builds a renderer. `threaded` selects the frame-protocol
    /// executor: `true` spawns a dedicated render thread and the
    /// rendezvous channel pair; `false` is the single-threaded fallback,
    /// where `frame()` calls straight through to `process_frame`
    /// inline and the backend is owned on the caller's thread.
    pub fn new(config: RendererConfig, backend: B, threaded: bool) -> Self {
        let mut vertex_buffers = HandleTable::new("vertex_buffer", config.max_vertex_buffers);
        let mut index_buffers = HandleTable::new("index_buffer", config.max_index_buffers);
        let textures = HandleTable::new("texture", config.max_textures);
        let shaders = HandleTable::new("shader", config.max_shaders);
        let programs = HandleTable::new("program", config.max_programs);
        let mut uniforms = HandleTable::new("uniform", config.max_uniforms);
        let render_targets = HandleTable::new("render_target", config.max_render_targets);

        let transient_vb_handle = vertex_buffers.create();
        let transient_ib_handle = index_buffers.create();

        let stock_uniforms = StockUniformHandles {
            view: uniforms.create(),
            model: uniforms.create(),
            model_view: uniforms.create(),
            model_view_projection: uniforms.create(),
            time_since_start: uniforms.create(),
        };

        let ctx = RenderContext::new(
            config.command_buffer_size,
            config.constant_buffer_size,
            config.max_draws_per_frame,
            transient_vb_handle,
            config.transient_vertex_buffer_size,
            transient_ib_handle,
            config.transient_index_buffer_size,
        );

        let executor = if threaded {
            let (submit_tx, submit_rx) = sync_channel::<RenderContext>(0);
            let (reply_tx, reply_rx) = sync_channel::<RenderContext>(0);
            let join_handle = std::thread::Builder::new()
                .name("render".to_string())
                .spawn(move || {
                    for mut received in submit_rx.iter() {
                        process_frame(&mut received, &mut backend);
                        if reply_tx.send(received).is_err() {
                            break;
                        }
                    }
                    log::info!("render thread exiting");
                })
                .expect("failed to spawn render thread");
            FrameExecutor::Threaded { submit_tx: Some(submit_tx), reply_rx, join_handle: Some(join_handle) }
        } else {
            FrameExecutor::SingleThreaded { backend }
        };

        Renderer {
            vertex_buffers,
            index_buffers,
            textures,
            shaders,
            programs,
            uniforms,
            render_targets,
            transient_vertex_buffer: transient_vb_handle,
            transient_index_buffer: transient_ib_handle,
            transient_vertex_buffer_size: config.transient_vertex_buffer_size as u32,
            transient_index_buffer_size: config.transient_index_buffer_size as u32,
            stock_uniforms,
            start_instant: Instant::now(),
            submit: Some(ctx),
            executor,
        }
    }

    fn ctx(&mut self) -> &mut RenderContext {
        self.submit.as_mut().expect("submit context is mid-frame")
    }

    /// The backend, when running single-threaded (`threaded: false`).
    /// `None` when a dedicated render thread owns it. Mainly useful for
    /// scenario tests that want to inspect a recording backend's calls
    /// after a frame.
    pub fn backend(&self) -> Option<&B> {
        match &self.executor {
            FrameExecutor::SingleThreaded { backend } => Some(backend),
            FrameExecutor::Threaded { .. } => None,
        }
    }

    /// The handles minted for the five stock uniforms, registered
    /// with the backend under their well-known names during `init()`.
    pub fn stock_uniforms(&self) -> StockUniformHandles {
        self.stock_uniforms
    }

    /// Writes the init tag, enqueues creation of the two shared
    /// transient buffers and the five stock uniforms, and flushes it all
    /// through one frame so the backend's `init()` runs before any other
    /// command — matching the original's `init()` writing
    /// `INIT_RENDERER` then calling `frame()`.
    pub fn init(&mut self) {
        let (vb, ib) = (self.transient_vertex_buffer, self.transient_index_buffer);
        let (vb_size, ib_size) = (self.transient_vertex_buffer_size, self.transient_index_buffer_size);
        self.ctx().commands.write_command(&Command::Init);
        self.ctx().commands.write_command(&Command::CreateDynamicVertexBuffer { handle: vb, size: vb_size, format: VertexFormat::P3 });
        self.ctx().commands.write_command(&Command::CreateDynamicIndexBuffer { handle: ib, size: ib_size });
        for which in StockUniform::ALL {
            let handle = self.stock_uniforms.get(which);
            self.ctx().commands.write_command(&Command::CreateUniform {
                handle,
                name: which.name().to_string(),
                ty: which.ty(),
                count: 1,
            });
        }
        self.frame();
        log::info!("renderer initialized");
    }

    /// Writes the shutdown tag, flushes it through one final frame, and
    /// joins the render thread (if threaded).
    pub fn shutdown(mut self) {
        self.ctx().commands.write_command(&Command::Shutdown);
        self.frame();
        log::info!("renderer shutting down");
        if let FrameExecutor::Threaded { submit_tx, join_handle, .. } = &mut self.executor {
            submit_tx.take();
            if let Some(handle) = join_handle.take() {
                let _ = handle.join();
            }
        }
    }

    // ---- resource creation ----------------------------------------------

    pub fn create_vertex_buffer(&mut self, data: &[u8], format: VertexFormat) -> VertexBufferHandle {
        let handle = self.vertex_buffers.create();
        self.ctx().commands.write_command(&Command::CreateVertexBuffer { handle, format, data: Some(data.to_vec()) });
        handle
    }

    pub fn create_dynamic_vertex_buffer(&mut self, size: u32, format: VertexFormat) -> VertexBufferHandle {
        let handle = self.vertex_buffers.create();
        self.ctx().commands.write_command(&Command::CreateDynamicVertexBuffer { handle, size, format });
        handle
    }

    pub fn update_vertex_buffer(&mut self, handle: VertexBufferHandle, offset: u32, data: &[u8]) {
        self.vertex_buffers.assert_live(handle);
        self.ctx().commands.write_command(&Command::UpdateVertexBuffer { handle, offset, data: data.to_vec() });
    }

    pub fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        self.vertex_buffers.destroy(handle);
        self.ctx().commands.write_command(&Command::DestroyVertexBuffer { handle });
    }

    pub fn create_index_buffer(&mut self, data: &[u8]) -> IndexBufferHandle {
        let handle = self.index_buffers.create();
        self.ctx().commands.write_command(&Command::CreateIndexBuffer { handle, data: Some(data.to_vec()) });
        handle
    }

    pub fn create_dynamic_index_buffer(&mut self, size: u32) -> IndexBufferHandle {
        let handle = self.index_buffers.create();
        self.ctx().commands.write_command(&Command::CreateDynamicIndexBuffer { handle, size });
        handle
    }

    pub fn update_index_buffer(&mut self, handle: IndexBufferHandle, offset: u32, data: &[u8]) {
        self.index_buffers.assert_live(handle);
        self.ctx().commands.write_command(&Command::UpdateIndexBuffer { handle, offset, data: data.to_vec() });
    }

    pub fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        self.index_buffers.destroy(handle);
        self.ctx().commands.write_command(&Command::DestroyIndexBuffer { handle });
    }

    pub fn create_texture(&mut self, width: u32, height: u32, format: PixelFormat, data: Option<&[u8]>) -> TextureHandle {
        let handle = self.textures.create();
        self.ctx().commands.write_command(&Command::CreateTexture { handle, width, height, format, data: data.map(|d| d.to_vec()) });
        handle
    }

    pub fn update_texture(&mut self, handle: TextureHandle, data: &[u8]) {
        self.textures.assert_live(handle);
        self.ctx().commands.write_command(&Command::UpdateTexture { handle, data: data.to_vec() });
    }

    pub fn destroy_texture(&mut self, handle: TextureHandle) {
        self.textures.destroy(handle);
        self.ctx().commands.write_command(&Command::DestroyTexture { handle });
    }

    pub fn create_shader(&mut self, stage: ShaderStage, source: &[u8]) -> ShaderHandle {
        let handle = self.shaders.create();
        self.ctx().commands.write_command(&Command::CreateShader { handle, stage, source: source.to_vec() });
        handle
    }

    pub fn destroy_shader(&mut self, handle: ShaderHandle) {
        self.shaders.destroy(handle);
        self.ctx().commands.write_command(&Command::DestroyShader { handle });
    }

    pub fn create_program(&mut self, vertex_shader: ShaderHandle, fragment_shader: ShaderHandle) -> ProgramHandle {
        self.shaders.assert_live(vertex_shader);
        self.shaders.assert_live(fragment_shader);
        let handle = self.programs.create();
        self.ctx().commands.write_command(&Command::CreateProgram { handle, vertex_shader, fragment_shader });
        handle
    }

    pub fn destroy_program(&mut self, handle: ProgramHandle) {
        self.programs.destroy(handle);
        self.ctx().commands.write_command(&Command::DestroyProgram { handle });
    }

    /// Mints a uniform handle, rejecting names that collide with a
    /// stock uniform and names over 64 bytes.
    pub fn create_uniform(&mut self, name: &str, ty: UniformType, count: u32) -> UniformHandle {
        if name.len() > MAX_UNIFORM_NAME_LENGTH {
            panic!("uniform name \"{}\" is {} bytes, exceeding the {}-byte limit", name, name.len(), MAX_UNIFORM_NAME_LENGTH);
        }
        if name_to_stock_uniform(name).is_some() {
            fatal_name_collision(name);
        }
        let handle = self.uniforms.create();
        self.ctx().commands.write_command(&Command::CreateUniform { handle, name: name.to_string(), ty, count });
        handle
    }

    pub fn destroy_uniform(&mut self, handle: UniformHandle) {
        self.uniforms.destroy(handle);
        self.ctx().commands.write_command(&Command::DestroyUniform { handle });
    }

    pub fn create_render_target(&mut self, width: u32, height: u32, format: PixelFormat) -> RenderTargetHandle {
        let handle = self.render_targets.create();
        self.ctx().commands.write_command(&Command::CreateRenderTarget { handle, width, height, format });
        handle
    }

    pub fn destroy_render_target(&mut self, handle: RenderTargetHandle) {
        self.render_targets.destroy(handle);
        self.ctx().commands.write_command(&Command::DestroyRenderTarget { handle });
    }

    // ---- transient buffers ----------------------------------------------

    pub fn reserve_transient_vertex_buffer(&mut self, count: u32, format: VertexFormat) -> VertexSource {
        VertexSource::Transient(self.ctx().transient_vertices.reserve(count, format))
    }

    pub fn reserve_transient_index_buffer(&mut self, count: u32) -> IndexSource {
        IndexSource::Transient(self.ctx().transient_indices.reserve(count))
    }

    // ---- per-draw / per-layer recording -----------------------------------

    pub fn set_state(&mut self, state: RenderState) {
        self.ctx().set_state(state);
    }

    pub fn set_pose(&mut self, pose: Mat4) {
        self.ctx().set_pose(pose);
    }

    pub fn set_program(&mut self, program: ProgramHandle) {
        self.programs.assert_live(program);
        self.ctx().set_program(program);
    }

    pub fn set_vertex_buffer(&mut self, source: VertexSource, num_vertices: u32) {
        if let VertexSource::Static(handle) = source {
            self.vertex_buffers.assert_live(handle);
        }
        self.ctx().set_vertex_buffer(source, 0, num_vertices);
    }

    pub fn set_index_buffer(&mut self, source: IndexSource, start_index: u32, num_indices: u32) {
        if let IndexSource::Static(handle) = source {
            self.index_buffers.assert_live(handle);
        }
        self.ctx().set_index_buffer(source, start_index, num_indices);
    }

    pub fn set_uniform(&mut self, id: UniformHandle, ty: UniformType, data: &[u8]) {
        self.uniforms.assert_live(id);
        self.ctx().set_uniform(id, ty, data);
    }

    pub fn set_texture(&mut self, unit: usize, sampler_uniform: UniformHandle, source: TextureSource, flags: SamplerState) {
        self.uniforms.assert_live(sampler_uniform);
        match source {
            TextureSource::Texture(h) => self.textures.assert_live(h),
            TextureSource::RenderTarget(h) => self.render_targets.assert_live(h),
        }
        self.ctx().set_texture(unit, sampler_uniform, source, flags);
    }

    pub fn set_layer_render_target(&mut self, layer: u8, target: Option<RenderTargetHandle>) {
        if let Some(h) = target {
            self.render_targets.assert_live(h);
        }
        self.ctx().set_layer_render_target(layer, target);
    }

    pub fn set_layer_clear(&mut self, layer: u8, clear_color: bool, clear_depth: bool, color: [f32; 4], depth: f32) {
        self.ctx().set_layer_clear(layer, clear_color, clear_depth, color, depth);
    }

    pub fn set_layer_view(&mut self, layer: u8, view: Mat4) {
        self.ctx().set_layer_view(layer, view);
    }

    pub fn set_layer_projection(&mut self, layer: u8, projection: Mat4) {
        self.ctx().set_layer_projection(layer, projection);
    }

    pub fn set_layer_viewport(&mut self, layer: u8, rect: crate::context::Rect) {
        self.ctx().set_layer_viewport(layer, rect);
    }

    pub fn set_layer_scissor(&mut self, layer: u8, rect: crate::context::Rect) {
        self.ctx().set_layer_scissor(layer, rect);
    }

    pub fn commit(&mut self, layer: u8) {
        self.ctx().commit(layer);
    }

    // ---- frame boundary ----------------------------------------------------

    /// Flushes the submit context and blocks until the render thread
    /// (or, in single-threaded mode, this same call) has finished
    /// rendering it. See module docs for the rendezvous design.
    pub fn frame(&mut self) {
        let elapsed = self.start_instant.elapsed().as_secs_f32();
        let mut ctx = self.submit.take().expect("submit context missing");
        // TIME_SINCE_START has no per-draw source, unlike the pose/view/
        // projection-derived stock uniforms a backend binds directly from
        // `DrawState`/`LayerState` — the core refreshes it itself, once a
        // frame, through the ordinary constant-buffer path.
        ctx.constants.write_constant(self.stock_uniforms.time_since_start, UniformType::Float1, &elapsed.to_le_bytes());
        ctx.push();

        match &mut self.executor {
            FrameExecutor::Threaded { submit_tx, reply_rx, .. } => {
                let tx = submit_tx.as_ref().expect("render thread already shut down");
                tx.send(ctx).expect("render thread gone");
                let returned = reply_rx.recv().expect("render thread gone");
                self.submit = Some(returned);
            }
            FrameExecutor::SingleThreaded { backend } => {
                process_frame(&mut ctx, backend);
                self.submit = Some(ctx);
            }
        }
    }
}

