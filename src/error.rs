//! Error taxonomy for the render core.
//!
//! Programming errors (invalid handle, exhausted pool, out-of-range
//! layer, unknown command tag, stock-uniform name collision) indicate a
//! broken invariant in the calling code and are reported as panics —
//! there is no user-visible `Result`-based failure path for them,
//! mirroring the original engine's `CE_ASSERT` / `CE_FATAL` calls. The
//! one recoverable tier is a backend failure, which crosses into
//! implementation-defined GPU driver territory and is modeled as a
//! proper error type.

use crate::handle::RawHandle;
use thiserror::Error;

/// Error reported by a [`crate::backend::Backend`] implementation.
///
/// This is the only error type producers ever see returned from the
/// submission API. Everything else that can go wrong is a programming
/// error and panics immediately at the call site that detected it.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend initialization failed: {0}")]
    InitFailed(String),
    #[error("backend failed to create resource: {0}")]
    ResourceCreationFailed(String),
    #[error("backend reported a device error: {0}")]
    DeviceError(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Panics with a message identifying the programming-error class,
/// matching the core's error taxonomy (`<InvalidHandle>` etc.).
#[track_caller]
pub fn fatal_invalid_handle(class: &str, handle: RawHandle) -> ! {
    log::error!("invalid handle: class={} handle={:?}", class, handle);
    panic!(
        "<InvalidHandle>: {} handle {:?} is not live (destroyed or never created)",
        class, handle
    );
}

#[track_caller]
pub fn fatal_exhausted(class: &str, capacity: usize) -> ! {
    log::error!("pool exhausted: class={} capacity={}", class, capacity);
    panic!("<Exhausted>: {} pool has no free slots (capacity {})", class, capacity);
}

#[track_caller]
pub fn fatal_layer_out_of_range(layer: u32, bound: u32) -> ! {
    log::error!("layer out of range: layer={} bound={}", layer, bound);
    panic!("<LayerOutOfRange>: layer {} is not < {}", layer, bound);
}

#[track_caller]
pub fn fatal_unknown_command(tag: u8) -> ! {
    log::error!("unknown command tag: {}", tag);
    panic!("<UnknownCommand>: tag {} is not a known command (memory corruption or version skew)", tag);
}

#[track_caller]
pub fn fatal_name_collision(name: &str) -> ! {
    log::error!("stock uniform name collision: {}", name);
    panic!("<NameCollision>: \"{}\" collides with a stock uniform name", name);
}

#[track_caller]
pub fn fatal_capacity_overflow(what: &str, capacity: usize) -> ! {
    log::error!("capacity overflow: {} capacity={}", what, capacity);
    panic!("<Exhausted>: {} capacity ({} bytes) exceeded", what, capacity);
}
