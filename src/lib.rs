//! Renderer manifesto:
//! * Thread-decoupled: producers on the submit (main) thread never touch
//!   the GPU directly, and the render thread never touches game state.
//! * Two buffered `RenderContext`s swap ownership once a frame; the
//!   producer API only ever sees the one it currently owns.
//! * Based on global command reordering with sort keys, not immediate-mode
//!   GPU calls. Submission order is fully independent from execution
//!   order; layers and (eventually) subkeys decide the latter.
//! * Handles, not pointers. Every GPU resource is a generational handle
//!   into a table owned by the submit thread; the render thread never
//!   allocates or frees one.
//!
//! This crate is the core: handle tables, typed command/constant buffers,
//! bit-packed render state, the `RenderContext` producers record into,
//! and the frame protocol that hands a filled context to a render thread
//! and gets a drained one back. It does not talk to any actual GPU API —
//! that's [`backend::Backend`]'s job, implemented once per platform.

pub mod backend;
pub mod command;
pub mod config;
pub mod constant;
pub mod context;
pub mod debug_line;
pub mod error;
pub mod handle;
pub mod light;
pub mod math;
pub mod mesh;
pub mod pixel;
pub mod renderer;
pub mod sprite;
pub mod state;
pub mod transient;
pub mod uniform;
pub mod vertex;

#[cfg(feature = "glm-types")]
pub use nalgebra_glm as glm;

pub use crate::backend::{Backend, NullBackend};
pub use crate::config::RendererConfig;
pub use crate::context::{RenderContext, SortKey};
pub use crate::error::{BackendError, BackendResult};
pub use crate::handle::{
    IndexBufferHandle, ProgramHandle, RawHandle, RenderTargetHandle, ShaderHandle, TextureHandle,
    UniformHandle, VertexBufferHandle,
};
pub use crate::renderer::{Renderer, StockUniformHandles};
