//! The render context: the recording surface producers write to, and
//! the structure the render thread reads from after a swap.
//!
//! Grounded on `engine/renderers/RenderContext.h`'s `RenderContext`
//! struct (per-draw `RenderState`, parallel `m_states`/`m_keys` arrays,
//! per-layer `m_targets`/`m_view_matrices`/... arrays, `commit`/`clear`).
//! Two deliberate departures from the original: the layer count is 8,
//! not Crown's `MAX_RENDER_LAYERS` of 32; and transient buffers are
//! full-fledged rings (`transient.rs`) rather than raw counters folded
//! into this struct.

use crate::command::CommandBuffer;
use crate::constant::ConstantBuffer;
use crate::error::fatal_layer_out_of_range;
use crate::handle::{ProgramHandle, RenderTargetHandle, TextureHandle, UniformHandle, VertexBufferHandle, IndexBufferHandle};
use crate::math::{identity, Mat4};
use crate::state::{RenderState, SamplerState, TextureEnableMask, MAX_TEXTURE_UNITS};
use crate::transient::{TransientIndexReservation, TransientIndexRing, TransientVertexReservation, TransientVertexRing};
use crate::uniform::UniformType;
use crate::vertex::VertexFormat;

pub const MAX_LAYERS: usize = 8;
/// Sentinel meaning "use every remaining element from the bound offset."
pub const COUNT_ALL: u32 = u32::max_value();

/// The 64-bit sort key. Only the top byte (the layer) is ever populated
/// by this core; the remaining 56 bits are reserved for callers who
/// want to define their own sub-key ordering (view, program, depth) —
/// this core never calls `with_subkey` itself, only `for_layer`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey(pub u64);

impl SortKey {
    pub fn for_layer(layer: u8) -> SortKey {
        SortKey((layer as u64) << 56)
    }

    pub fn with_subkey(self, subkey: u64) -> SortKey {
        SortKey((self.0 & (0xFFu64 << 56)) | (subkey & !(0xFFu64 << 56)))
    }

    pub fn layer(self) -> u8 {
        (self.0 >> 56) as u8
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexSource {
    Static(VertexBufferHandle),
    Transient(TransientVertexReservation),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexSource {
    Static(IndexBufferHandle),
    Transient(TransientIndexReservation),
}

#[derive(Debug, Copy, Clone)]
pub enum TextureSource {
    Texture(TextureHandle),
    RenderTarget(RenderTargetHandle),
}

#[derive(Debug, Copy, Clone)]
pub struct SamplerSlot {
    pub source: Option<TextureSource>,
    pub sampler_uniform: UniformHandle,
    pub state: SamplerState,
}

impl Default for SamplerSlot {
    fn default() -> Self {
        SamplerSlot { source: None, sampler_uniform: UniformHandle::invalid(), state: SamplerState::default() }
    }
}

/// A single committed draw: everything captured by `commit(layer)`.
#[derive(Debug, Clone)]
pub struct DrawState {
    pub render_state: RenderState,
    pub pose: Mat4,
    pub program: ProgramHandle,
    pub vertex_source: Option<VertexSource>,
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub index_source: Option<IndexSource>,
    pub first_index: u32,
    pub index_count: u32,
    pub vertex_format: VertexFormat,
    pub samplers: [SamplerSlot; MAX_TEXTURE_UNITS],
}

impl Default for DrawState {
    fn default() -> Self {
        DrawState {
            render_state: RenderState::default(),
            pose: identity(),
            program: ProgramHandle::invalid(),
            vertex_source: None,
            first_vertex: 0,
            vertex_count: COUNT_ALL,
            index_source: None,
            first_index: 0,
            index_count: COUNT_ALL,
            vertex_format: VertexFormat::P3,
            samplers: Default::default(),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ClearState {
    pub clear_color: bool,
    pub clear_depth: bool,
    /// Defaults to opaque gray, matching the original's
    /// `ClearState::clear()` (`m_color = Color4::GRAY`).
    pub color: [f32; 4],
    pub depth: f32,
}

impl Default for ClearState {
    fn default() -> Self {
        ClearState { clear_color: true, clear_depth: true, color: [0.5, 0.5, 0.5, 1.0], depth: 1.0 }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Per-layer state: persists across draws and across frames until a
/// producer overwrites it.
#[derive(Debug, Clone)]
pub struct LayerState {
    pub render_target: Option<RenderTargetHandle>,
    pub clear: ClearState,
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Rect,
    pub scissor: Rect,
    /// Set whenever a producer writes any field of this layer, or a
    /// draw commits into it. Consulted by the render thread so layer
    /// setup is only issued for layers actually used this frame.
    pub touched: bool,
}

impl Default for LayerState {
    fn default() -> Self {
        LayerState {
            render_target: None,
            clear: ClearState::default(),
            view: identity(),
            projection: identity(),
            viewport: Rect::default(),
            scissor: Rect::default(),
            touched: false,
        }
    }
}

/// The recording surface: one instance is "submit" and one is "draw" at
/// any moment (see `renderer.rs`), exchanging roles at every frame
/// boundary.
pub struct RenderContext {
    pub commands: CommandBuffer,
    pub constants: ConstantBuffer,
    draws: Vec<DrawState>,
    keys: Vec<SortKey>,
    max_draws: usize,
    current: DrawState,
    layers: [LayerState; MAX_LAYERS],
    pub transient_vertices: TransientVertexRing,
    pub transient_indices: TransientIndexRing,
}

impl RenderContext {
    pub fn new(
        command_buffer_size: usize,
        constant_buffer_size: usize,
        max_draws: usize,
        transient_vertex_buffer: VertexBufferHandle,
        transient_vertex_buffer_size: usize,
        transient_index_buffer: IndexBufferHandle,
        transient_index_buffer_size: usize,
    ) -> Self {
        RenderContext {
            commands: CommandBuffer::new(command_buffer_size),
            constants: ConstantBuffer::new(constant_buffer_size),
            draws: Vec::with_capacity(max_draws),
            keys: Vec::with_capacity(max_draws),
            max_draws,
            current: DrawState::default(),
            layers: Default::default(),
            transient_vertices: TransientVertexRing::new(transient_vertex_buffer, transient_vertex_buffer_size as u32),
            transient_indices: TransientIndexRing::new(transient_index_buffer, transient_index_buffer_size as u32),
        }
    }

    // ---- per-draw recording ------------------------------------------------

    pub fn set_state(&mut self, state: RenderState) {
        self.current.render_state = state;
    }

    pub fn set_pose(&mut self, pose: Mat4) {
        self.current.pose = pose;
    }

    pub fn set_program(&mut self, program: ProgramHandle) {
        self.current.program = program;
    }

    pub fn set_vertex_buffer(&mut self, source: VertexSource, first_vertex: u32, num_vertices: u32) {
        self.current.vertex_source = Some(source);
        self.current.first_vertex = first_vertex;
        self.current.vertex_count = num_vertices;
    }

    pub fn set_index_buffer(&mut self, source: IndexSource, start_index: u32, num_indices: u32) {
        self.current.index_source = Some(source);
        self.current.first_index = start_index;
        self.current.index_count = num_indices;
    }

    /// Writes an immediate uniform value into the constant buffer. This
    /// is independent of the per-draw snapshot array: it is replayed by
    /// the render thread once per frame via `update_uniforms`, not
    /// re-issued per draw.
    pub fn set_uniform(&mut self, id: UniformHandle, ty: UniformType, data: &[u8]) {
        self.constants.write_constant(id, ty, data);
    }

    pub fn set_texture(&mut self, unit: usize, sampler_uniform: UniformHandle, source: TextureSource, state: SamplerState) {
        assert!(unit < MAX_TEXTURE_UNITS, "texture unit {} out of range", unit);
        self.current.samplers[unit] = SamplerSlot { source: Some(source), sampler_uniform, state };
        let enable_bit = match unit {
            0 => TextureEnableMask::UNIT_0,
            1 => TextureEnableMask::UNIT_1,
            2 => TextureEnableMask::UNIT_2,
            _ => TextureEnableMask::UNIT_3,
        };
        let mask = self.current.render_state.texture_enable_mask() | enable_bit;
        self.current.render_state = self.current.render_state.with_texture_enable_mask(mask);
    }

    /// Snapshots the current draw state into the committed arrays under
    /// `layer`'s sort key, then resets the current draw state to
    /// defaults — a fresh `DrawState::default()`, not whatever was last
    /// committed, so no field leaks from one draw into the next.
    pub fn commit(&mut self, layer: u8) {
        if layer as usize >= MAX_LAYERS {
            fatal_layer_out_of_range(layer as u32, MAX_LAYERS as u32);
        }
        if self.draws.len() >= self.max_draws {
            crate::error::fatal_exhausted("draws per frame", self.max_draws);
        }
        self.layers[layer as usize].touched = true;
        self.draws.push(std::mem::take(&mut self.current));
        self.current = DrawState::default();
        self.keys.push(SortKey::for_layer(layer));
        log::trace!("commit draw on layer {} ({} draws so far)", layer, self.draws.len());
    }

    // ---- per-layer recording ------------------------------------------------

    fn layer_mut(&mut self, layer: u8) -> &mut LayerState {
        if layer as usize >= MAX_LAYERS {
            fatal_layer_out_of_range(layer as u32, MAX_LAYERS as u32);
        }
        let l = &mut self.layers[layer as usize];
        l.touched = true;
        l
    }

    pub fn set_layer_render_target(&mut self, layer: u8, target: Option<RenderTargetHandle>) {
        self.layer_mut(layer).render_target = target;
    }

    pub fn set_layer_clear(&mut self, layer: u8, clear_color: bool, clear_depth: bool, color: [f32; 4], depth: f32) {
        let l = self.layer_mut(layer);
        l.clear = ClearState { clear_color, clear_depth, color, depth };
    }

    pub fn set_layer_view(&mut self, layer: u8, view: Mat4) {
        self.layer_mut(layer).view = view;
    }

    pub fn set_layer_projection(&mut self, layer: u8, projection: Mat4) {
        self.layer_mut(layer).projection = projection;
    }

    pub fn set_layer_viewport(&mut self, layer: u8, rect: Rect) {
        self.layer_mut(layer).viewport = rect;
    }

    pub fn set_layer_scissor(&mut self, layer: u8, rect: Rect) {
        self.layer_mut(layer).scissor = rect;
    }

    pub fn layers(&self) -> &[LayerState; MAX_LAYERS] {
        &self.layers
    }

    // ---- frame-boundary operations ------------------------------------------

    /// Appends terminal tags to the command and constant buffers.
    /// Called once, at the end of the submit thread's frame, before the
    /// context swap.
    pub fn push(&mut self) {
        self.commands.commit();
        self.constants.commit();
    }

    /// Stable-sorts the (key, draw) parallel arrays ascending by key.
    /// Keys with an identical layer preserve recording order.
    pub fn sort(&mut self) {
        let mut indices: Vec<usize> = (0..self.keys.len()).collect();
        indices.sort_by_key(|&i| self.keys[i]);
        let sorted_keys: Vec<SortKey> = indices.iter().map(|&i| self.keys[i]).collect();
        let mut sorted_draws = Vec::with_capacity(self.draws.len());
        let mut remaining: Vec<Option<DrawState>> = self.draws.drain(..).map(Some).collect();
        for &i in &indices {
            sorted_draws.push(remaining[i].take().unwrap());
        }
        self.keys = sorted_keys;
        self.draws = sorted_draws;
    }

    pub fn draws(&self) -> &[DrawState] {
        &self.draws
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    /// Returns the draw count to 0 and both transient ring cursors to
    /// 0. Does NOT reset per-layer state, which persists until
    /// overwritten. Called after the render thread has consumed
    /// the context.
    pub fn clear(&mut self) {
        self.draws.clear();
        self.keys.clear();
        self.current = DrawState::default();
        self.transient_vertices.reset();
        self.transient_indices.reset();
        self.commands.clear();
        self.constants.clear();
        log::trace!("context cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RawHandle;

    fn ctx() -> RenderContext {
        RenderContext::new(
            4096,
            4096,
            64,
            VertexBufferHandle::new(RawHandle { index: 0, generation: 0 }),
            1024,
            IndexBufferHandle::new(RawHandle { index: 0, generation: 0 }),
            1024,
        )
    }

    #[test]
    fn commit_resets_current_draw_to_default() {
        let mut c = ctx();
        c.set_program(ProgramHandle::new(RawHandle { index: 1, generation: 0 }));
        c.commit(0);
        assert_eq!(c.draw_count(), 1);
        // current draw state (not yet committed) is back to defaults
        c.commit(0);
        assert_eq!(c.draws()[1].program, ProgramHandle::invalid());
    }

    #[test]
    #[should_panic(expected = "<LayerOutOfRange>")]
    fn commit_out_of_range_layer_panics() {
        let mut c = ctx();
        c.commit(8);
    }

    #[test]
    fn sort_is_stable_and_ascending() {
        let mut c = ctx();
        c.set_program(ProgramHandle::new(RawHandle { index: 1, generation: 0 }));
        c.commit(2);
        c.set_program(ProgramHandle::new(RawHandle { index: 2, generation: 0 }));
        c.commit(0);
        c.set_program(ProgramHandle::new(RawHandle { index: 3, generation: 0 }));
        c.commit(0);
        c.sort();
        assert_eq!(c.keys()[0].layer(), 0);
        assert_eq!(c.keys()[1].layer(), 0);
        assert_eq!(c.keys()[2].layer(), 2);
        // draws on layer 0 keep their relative commit order
        assert_eq!(c.draws()[0].program, ProgramHandle::new(RawHandle { index: 2, generation: 0 }));
        assert_eq!(c.draws()[1].program, ProgramHandle::new(RawHandle { index: 3, generation: 0 }));
    }

    #[test]
    fn clear_resets_draws_and_transients_but_not_layers() {
        let mut c = ctx();
        c.set_layer_view(1, identity());
        c.commit(1);
        c.transient_vertices.reserve(3, VertexFormat::P3);
        c.clear();
        assert_eq!(c.draw_count(), 0);
        assert_eq!(c.transient_vertices.cursor(), 0);
        assert!(c.layers()[1].touched);
    }
}
